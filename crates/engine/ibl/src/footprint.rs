//! Footprint tracking across cube faces
//!
//! A filter tap covers a square of half-width `filter_size` around its hit point
//! in the hit face's uv space. Whatever spills past an edge is carried onto the
//! neighbouring face (and, for very wide filters, onto the face beyond it),
//! mirroring the seam coordinate where the two faces' axes run opposite.

use crate::face::{direction_to_face_uv, CubeFace, FaceEdge};
use glam::{Vec2, Vec3};

/// A third hop would land back on the hit face
const MAX_HOPS: usize = 2;

/// Rectangle in normalised [0,1]² face space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl FaceRect {
    /// Nothing merged yet
    pub const EMPTY: FaceRect = FaceRect {
        min: Vec2::splat(f32::INFINITY),
        max: Vec2::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    #[inline]
    pub fn add_point(&mut self, p: Vec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn merge(&mut self, other: &FaceRect) {
        if !other.is_empty() {
            self.add_point(other.min);
            self.add_point(other.max);
        }
    }

    /// Inclusive texel bounds `(min_x, min_y, max_x, max_y)` covered at a face size
    pub fn texel_range(&self, face_size: u32) -> Option<(u32, u32, u32, u32)> {
        if self.is_empty() || face_size == 0 {
            return None;
        }
        let last = (face_size - 1) as f32;
        let n = face_size as f32;
        let to_texel = |t: f32| (t * n).floor().clamp(0.0, last) as u32;
        Some((
            to_texel(self.min.x),
            to_texel(self.min.y),
            to_texel(self.max.x),
            to_texel(self.max.y),
        ))
    }

    /// Band of `depth` along an edge, spanning `along` in the seam coordinate
    fn edge_band(edge: FaceEdge, along: (f32, f32), depth: f32) -> FaceRect {
        let (a0, a1) = along;
        match edge {
            FaceEdge::Left => FaceRect::new(Vec2::new(0.0, a0), Vec2::new(depth, a1)),
            FaceEdge::Right => FaceRect::new(Vec2::new(1.0 - depth, a0), Vec2::new(1.0, a1)),
            FaceEdge::Top => FaceRect::new(Vec2::new(a0, 0.0), Vec2::new(a1, depth)),
            FaceEdge::Bottom => FaceRect::new(Vec2::new(a0, 1.0 - depth), Vec2::new(a1, 1.0)),
        }
    }

    /// Extent along the seam coordinate of an edge
    fn along(&self, edge: FaceEdge) -> (f32, f32) {
        if edge.is_vertical() {
            (self.min.y, self.max.y)
        } else {
            (self.min.x, self.max.x)
        }
    }
}

impl Default for FaceRect {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Per-face rectangles touched by one filter tap, indexed by face
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Footprint(pub [FaceRect; 6]);

impl Footprint {
    pub fn empty() -> Self {
        Self([FaceRect::EMPTY; 6])
    }

    #[inline]
    pub fn rect(&self, face: CubeFace) -> &FaceRect {
        &self.0[face.index()]
    }

    fn rect_mut(&mut self, face: CubeFace) -> &mut FaceRect {
        &mut self.0[face.index()]
    }

    /// Faces with a non-empty rectangle
    pub fn faces(&self) -> impl Iterator<Item = (CubeFace, &FaceRect)> {
        CubeFace::ALL
            .into_iter()
            .zip(self.0.iter())
            .filter(|(_, rect)| !rect.is_empty())
    }
}

/// Map a seam range across an edge, mirroring when the two faces' axes oppose
#[inline]
pub fn cross_seam(side: FaceEdge, edge: FaceEdge, along: (f32, f32)) -> (f32, f32) {
    if side.flips_with(edge) {
        (1.0 - along.1, 1.0 - along.0)
    } else {
        along
    }
}

/// Collect the source area a tap of half-width `filter_size` (face-space units) reads
pub fn determine_filter_area(tap: Vec3, filter_size: f32) -> Footprint {
    let mut area = Footprint::empty();

    let (hit_face, uv) = direction_to_face_uv(tap);
    let lo = uv - Vec2::splat(filter_size);
    let hi = uv + Vec2::splat(filter_size);

    let hit = FaceRect::new(lo.clamp(Vec2::ZERO, Vec2::ONE), hi.clamp(Vec2::ZERO, Vec2::ONE));
    area.rect_mut(hit_face).merge(&hit);

    let bleeds = [-lo.x, hi.x - 1.0, -lo.y, hi.y - 1.0];

    for side in FaceEdge::ALL {
        let mut bleed = bleeds[side as usize];
        if bleed <= 0.0 {
            continue;
        }

        let mut along = hit.along(side);
        let mut exit = side;
        let mut current = hit_face;

        for _ in 0..MAX_HOPS {
            let next = current.neighbour(exit);
            along = cross_seam(exit, next.edge, along);

            let band = FaceRect::edge_band(next.edge, along, bleed.min(1.0));
            area.rect_mut(next.face).merge(&band);

            bleed -= 1.0;
            if bleed <= 0.0 {
                break;
            }
            current = next.face;
            exit = next.edge.opposite();
        }
    }

    area
}
