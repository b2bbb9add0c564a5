//! Cosine-power radiance convolution for one destination texel

use crate::cubemap::Image;
use crate::face::{direction_to_face_uv, CubeFace};
use crate::footprint::determine_filter_area;
use crate::tap_table::{texel_direction, EdgeFixup, TapTable};
use glam::{Vec3, Vec4};

/// Filter parameters shared by every texel of one mip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MipFilter {
    /// Exponent of the cosine lobe
    pub specular_power: f32,
    /// Angular radius of the lobe's effective support, radians
    pub filter_angle: f32,
    /// Half-width of the footprint in normalised face units
    pub filter_size: f32,
    /// Samples below this cosine are outside the support
    pub cos_threshold: f32,
}

/// Read-only inputs every filter task samples from
#[derive(Debug, Clone, Copy)]
pub struct FilterSource<'a> {
    pub image: &'a Image,
    /// Directions and solid angles at the source face size
    pub taps: &'a TapTable,
    /// Fixup applied to destination tap directions
    pub fixup: EdgeFixup,
}

impl<'a> FilterSource<'a> {
    pub fn new(image: &'a Image, taps: &'a TapTable, fixup: EdgeFixup) -> Self {
        Self { image, taps, fixup }
    }
}

/// Source texel under a direction, without filtering
pub fn nearest_sample(image: &Image, dir: Vec3) -> Vec4 {
    let (face, uv) = direction_to_face_uv(dir);
    let size = image.face_size();
    let to_texel = |t: f32| ((t * size as f32) as u32).min(size - 1);
    image.texel(face, 0, to_texel(uv.x), to_texel(uv.y))
}

/// Cosine-power weighted average of the source around `tap`
pub fn filter_texel(source: &FilterSource<'_>, tap: Vec3, params: &MipFilter) -> Vec4 {
    let area = determine_filter_area(tap, params.filter_size);
    let face_size = source.taps.face_size();

    let mut color = Vec4::ZERO;
    let mut weight_sum = 0.0_f32;

    for (face, rect) in area.faces() {
        let Some((min_x, min_y, max_x, max_y)) = rect.texel_range(face_size) else {
            continue;
        };
        let taps = source.taps.face(face);
        let texels = source.image.face(face, 0);

        for y in min_y..=max_y {
            let row = (y * face_size) as usize;
            for x in min_x..=max_x {
                let idx = row + x as usize;
                let normal = taps[idx];
                let dot = normal.truncate().dot(tap);
                if dot < params.cos_threshold {
                    continue;
                }
                let weight = normal.w * dot.powf(params.specular_power);
                color += texels[idx] * weight;
                weight_sum += weight;
            }
        }
    }

    if weight_sum != 0.0 {
        color / weight_sum
    } else {
        nearest_sample(source.image, tap)
    }
}

/// Filter every texel of one destination face
pub fn filter_face(
    dst: &mut [Vec4],
    face: CubeFace,
    face_size: u32,
    source: &FilterSource<'_>,
    params: &MipFilter,
) {
    for y in 0..face_size {
        for x in 0..face_size {
            let tap = texel_direction(face, x, y, face_size, source.fixup);
            dst[(y * face_size + x) as usize] = filter_texel(source, tap, params);
        }
    }
}

/// Box-resample the source's top mip into one destination face
///
/// Each destination texel averages the source block it covers; when the
/// destination is larger, blocks shrink to the single nearest source texel.
pub fn box_downsample(dst: &mut [Vec4], face: CubeFace, dst_size: u32, source: &Image) {
    let src_size = source.face_size() as u64;
    let dst_size64 = dst_size as u64;
    let texels = source.face(face, 0);
    let block = |i: u32| {
        let start = i as u64 * src_size / dst_size64;
        let end = ((i as u64 + 1) * src_size / dst_size64).max(start + 1);
        start as usize..end as usize
    };

    for y in 0..dst_size {
        let rows = block(y);
        for x in 0..dst_size {
            let cols = block(x);
            let mut sum = Vec4::ZERO;
            for sy in rows.clone() {
                let row = sy * src_size as usize;
                for sx in cols.clone() {
                    sum += texels[row + sx];
                }
            }
            let count = (rows.len() * cols.len()) as f32;
            dst[(y * dst_size + x) as usize] = sum / count;
        }
    }
}
