use glam::{Vec2, Vec3};

/// Cubemap face in storage order (+X, -X, +Y, -Y, +Z, -Z)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

/// Edge of a face in its own uv space (u grows right, v grows down)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FaceEdge {
    Left = 0,
    Right = 1,
    Top = 2,
    Bottom = 3,
}

/// Face across an edge, and which of its edges is shared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbour {
    pub face: CubeFace,
    pub edge: FaceEdge,
}

const fn link(face: CubeFace, edge: FaceEdge) -> Neighbour {
    Neighbour { face, edge }
}

/// Adjacent face for each face, indexed by [face][edge]
static NEIGHBOURS: [[Neighbour; 4]; 6] = {
    use CubeFace::*;
    use FaceEdge::*;
    [
        // +X
        [link(PosZ, Right), link(NegZ, Left), link(PosY, Right), link(NegY, Right)],
        // -X
        [link(NegZ, Right), link(PosZ, Left), link(PosY, Left), link(NegY, Left)],
        // +Y
        [link(NegX, Top), link(PosX, Top), link(NegZ, Top), link(PosZ, Top)],
        // -Y
        [link(NegX, Bottom), link(PosX, Bottom), link(PosZ, Bottom), link(NegZ, Bottom)],
        // +Z
        [link(NegX, Right), link(PosX, Left), link(PosY, Bottom), link(NegY, Top)],
        // -Z
        [link(PosX, Right), link(NegX, Left), link(PosY, Top), link(NegY, Bottom)],
    ]
};

impl CubeFace {
    /// All six faces in storage order
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PosX,
        CubeFace::NegX,
        CubeFace::PosY,
        CubeFace::NegY,
        CubeFace::PosZ,
        CubeFace::NegZ,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Outward normal of the face
    #[inline]
    pub fn normal(self) -> Vec3 {
        match self {
            CubeFace::PosX => Vec3::X,
            CubeFace::NegX => -Vec3::X,
            CubeFace::PosY => Vec3::Y,
            CubeFace::NegY => -Vec3::Y,
            CubeFace::PosZ => Vec3::Z,
            CubeFace::NegZ => -Vec3::Z,
        }
    }

    /// World direction of increasing u
    #[inline]
    pub fn u_axis(self) -> Vec3 {
        match self {
            CubeFace::PosX => -Vec3::Z,
            CubeFace::NegX => Vec3::Z,
            CubeFace::PosY | CubeFace::NegY | CubeFace::PosZ => Vec3::X,
            CubeFace::NegZ => -Vec3::X,
        }
    }

    /// World direction of increasing v (rows run top to bottom)
    #[inline]
    pub fn v_axis(self) -> Vec3 {
        match self {
            CubeFace::PosY => Vec3::Z,
            CubeFace::NegY => -Vec3::Z,
            _ => -Vec3::Y,
        }
    }

    /// Face sharing the given edge
    #[inline]
    pub fn neighbour(self, edge: FaceEdge) -> Neighbour {
        NEIGHBOURS[self.index()][edge as usize]
    }
}

impl FaceEdge {
    pub const ALL: [FaceEdge; 4] = [
        FaceEdge::Left,
        FaceEdge::Right,
        FaceEdge::Top,
        FaceEdge::Bottom,
    ];

    pub fn opposite(self) -> Self {
        match self {
            FaceEdge::Left => FaceEdge::Right,
            FaceEdge::Right => FaceEdge::Left,
            FaceEdge::Top => FaceEdge::Bottom,
            FaceEdge::Bottom => FaceEdge::Top,
        }
    }

    /// Edges running along v (the seam coordinate is v)
    #[inline]
    pub fn is_vertical(self) -> bool {
        matches!(self, FaceEdge::Left | FaceEdge::Right)
    }

    /// Whether the seam coordinate is mirrored when crossing from `self` onto `other`
    #[inline]
    pub fn flips_with(self, other: FaceEdge) -> bool {
        let (a, b) = (self as u8, other as u8);
        a == b || a + b == 3
    }
}

/// Project a direction onto the cube: face and uv in [0,1]²
///
/// Ties between components resolve toward x, then y.
pub fn direction_to_face_uv(dir: Vec3) -> (CubeFace, Vec2) {
    let abs = dir.abs();
    let max = abs.max_element();

    let face = if max == abs.x {
        if dir.x >= 0.0 { CubeFace::PosX } else { CubeFace::NegX }
    } else if max == abs.y {
        if dir.y >= 0.0 { CubeFace::PosY } else { CubeFace::NegY }
    } else if dir.z >= 0.0 {
        CubeFace::PosZ
    } else {
        CubeFace::NegZ
    };

    let on_face = dir / max;
    let uv = Vec2::new(
        (face.u_axis().dot(on_face) + 1.0) * 0.5,
        (face.v_axis().dot(on_face) + 1.0) * 0.5,
    );
    (face, uv)
}

/// Unit direction through a point on a face, uv in [0,1]²
pub fn face_uv_to_direction(face: CubeFace, uv: Vec2) -> Vec3 {
    let st = uv * 2.0 - Vec2::ONE;
    (face.u_axis() * st.x + face.v_axis() * st.y + face.normal()).normalize()
}
