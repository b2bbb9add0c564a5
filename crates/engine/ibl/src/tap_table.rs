//! Per-texel tap directions and solid angles for a cubemap face size

use crate::face::CubeFace;
use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Seam correction applied to texel directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeFixup {
    #[default]
    None,
    /// Push texel centres toward face edges so edge texels of adjacent faces coincide
    Warp,
}

impl FromStr for EdgeFixup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(EdgeFixup::None),
            "warp" => Ok(EdgeFixup::Warp),
            other => Err(format!("unknown edge fixup '{other}' (expected none or warp)")),
        }
    }
}

impl fmt::Display for EdgeFixup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EdgeFixup::None => "none",
            EdgeFixup::Warp => "warp",
        })
    }
}

/// Warp strength for a face size
pub fn warp_fixup_factor(face_size: u32) -> f32 {
    if face_size <= 1 {
        return 1.0;
    }
    let n = face_size as f32;
    (n * n) / ((n - 1.0) * (n - 1.0) * (n - 1.0))
}

#[inline]
fn area_element(x: f32, y: f32) -> f32 {
    (x * y).atan2((x * x + y * y + 1.0).sqrt())
}

/// Solid angle of the texel centred at (u, v) in [-1,1]² face coordinates
pub fn texel_solid_angle(u: f32, v: f32, inv_face_size: f32) -> f32 {
    let x0 = u - inv_face_size;
    let x1 = u + inv_face_size;
    let y0 = v - inv_face_size;
    let y1 = v + inv_face_size;
    area_element(x1, y1) - area_element(x0, y1) - area_element(x1, y0) + area_element(x0, y0)
}

/// Texel centre in [-1,1] face coordinates
#[inline]
fn texel_coord(i: u32, inv_face_size: f32) -> f32 {
    (2 * i + 1) as f32 * inv_face_size - 1.0
}

fn direction_at(face: CubeFace, u: f32, v: f32) -> Vec3 {
    (face.u_axis() * u + face.v_axis() * v + face.normal()).normalize()
}

/// Direction a destination texel looks toward
pub fn texel_direction(face: CubeFace, x: u32, y: u32, face_size: u32, fixup: EdgeFixup) -> Vec3 {
    let inv = 1.0 / face_size as f32;
    let (u, v) = (texel_coord(x, inv), texel_coord(y, inv));
    match fixup {
        EdgeFixup::None => direction_at(face, u, v),
        EdgeFixup::Warp => {
            let warp = warp_fixup_factor(face_size);
            direction_at(face, warp * u * u * u + u, warp * v * v * v + v)
        }
    }
}

/// Dense table of (direction, solid angle) per texel, row-major per face
#[derive(Debug, Clone)]
pub struct TapTable {
    face_size: u32,
    taps: Vec<Vec4>,
}

impl TapTable {
    pub fn build(face_size: u32, fixup: EdgeFixup) -> Self {
        let inv = 1.0 / face_size as f32;
        let per_face = (face_size * face_size) as usize;
        let mut taps = Vec::with_capacity(per_face * 6);

        for face in CubeFace::ALL {
            for y in 0..face_size {
                let v = texel_coord(y, inv);
                for x in 0..face_size {
                    let u = texel_coord(x, inv);
                    let dir = texel_direction(face, x, y, face_size, fixup);
                    taps.push(dir.extend(texel_solid_angle(u, v, inv)));
                }
            }
        }

        Self { face_size, taps }
    }

    pub fn face_size(&self) -> u32 {
        self.face_size
    }

    /// Taps of one face
    pub fn face(&self, face: CubeFace) -> &[Vec4] {
        let per_face = (self.face_size * self.face_size) as usize;
        let start = face.index() * per_face;
        &self.taps[start..start + per_face]
    }

    #[inline]
    pub fn tap(&self, face: CubeFace, x: u32, y: u32) -> Vec4 {
        self.face(face)[(y * self.face_size + x) as usize]
    }

    pub fn taps(&self) -> &[Vec4] {
        &self.taps
    }

    /// Sum of all texel solid angles; analytically 4π
    pub fn total_solid_angle(&self) -> f64 {
        self.taps.iter().map(|tap| tap.w as f64).sum()
    }
}
