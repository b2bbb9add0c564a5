//! Spherical-harmonics irradiance (bands 0–4, 25 coefficients)
//!
//! Radiance is projected onto the real SH basis using analytic texel solid
//! angles, then convolved with a clamped cosine lobe by scaling each band.

use crate::cubemap::Image;
use crate::error::{Error, Result};
use crate::face::CubeFace;
use crate::tap_table::{EdgeFixup, TapTable};
use glam::{DVec3, Vec4};
use std::f64::consts::PI;

/// Number of basis functions for bands 0–4
pub const SH_COEFF_COUNT: usize = 25;

/// Cosine-lobe convolution weight per band (radiance-to-irradiance over π)
const BAND_WEIGHTS: [f64; 5] = [1.0, 2.0 / 3.0, 1.0 / 4.0, 0.0, -1.0 / 24.0];

/// Coefficient index ranges per band
const BANDS: [std::ops::Range<usize>; 5] = [0..1, 1..4, 4..9, 9..16, 16..25];

/// Real SH basis for bands 0–4 at a unit direction
pub fn eval_sh_basis5(dir: DVec3) -> [f64; SH_COEFF_COUNT] {
    let DVec3 { x, y, z } = dir;
    let (x2, y2, z2) = (x * x, y * y, z * z);
    let (x4, y4, z4) = (x2 * x2, y2 * y2, z2 * z2);
    let sqrt_pi = PI.sqrt();

    [
        // band 0
        1.0 / (2.0 * sqrt_pi),
        // band 1
        -(3.0 / PI).sqrt() * y / 2.0,
        (3.0 / PI).sqrt() * z / 2.0,
        -(3.0 / PI).sqrt() * x / 2.0,
        // band 2
        (15.0 / PI).sqrt() * x * y / 2.0,
        -(15.0 / PI).sqrt() * y * z / 2.0,
        (5.0 / PI).sqrt() * (3.0 * z2 - 1.0) / 4.0,
        -(15.0 / PI).sqrt() * x * z / 2.0,
        (15.0 / PI).sqrt() * (x2 - y2) / 4.0,
        // band 3
        -(70.0 / PI).sqrt() * y * (3.0 * x2 - y2) / 8.0,
        (105.0 / PI).sqrt() * x * y * z / 2.0,
        -(42.0 / PI).sqrt() * y * (5.0 * z2 - 1.0) / 8.0,
        (7.0 / PI).sqrt() * z * (5.0 * z2 - 3.0) / 4.0,
        -(42.0 / PI).sqrt() * x * (5.0 * z2 - 1.0) / 8.0,
        (105.0 / PI).sqrt() * (x2 - y2) * z / 4.0,
        -(70.0 / PI).sqrt() * x * (x2 - 3.0 * y2) / 8.0,
        // band 4
        3.0 * (35.0 / PI).sqrt() * x * y * (x2 - y2) / 4.0,
        -3.0 * (70.0 / PI).sqrt() * y * z * (3.0 * x2 - y2) / 8.0,
        3.0 * (5.0 / PI).sqrt() * x * y * (7.0 * z2 - 1.0) / 4.0,
        -3.0 * (10.0 / PI).sqrt() * y * z * (7.0 * z2 - 3.0) / 8.0,
        (105.0 * z4 - 90.0 * z2 + 9.0) / (16.0 * sqrt_pi),
        -3.0 * (10.0 / PI).sqrt() * x * z * (7.0 * z2 - 3.0) / 8.0,
        3.0 * (5.0 / PI).sqrt() * (x2 - y2) * (7.0 * z2 - 1.0) / 8.0,
        -3.0 * (70.0 / PI).sqrt() * x * z * (x2 - 3.0 * y2) / 8.0,
        3.0 * (35.0 / PI).sqrt() * (x4 - 6.0 * x2 * y2 + y4) / 16.0,
    ]
}

/// Projected radiance, one RGB triple per basis function
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShCoefficients {
    pub rgb: [[f64; 3]; SH_COEFF_COUNT],
    /// Factor applied to correct the summed solid angle to exactly 4π
    pub rescale_factor: f64,
}

impl Default for ShCoefficients {
    fn default() -> Self {
        Self {
            rgb: [[0.0; 3]; SH_COEFF_COUNT],
            rescale_factor: 1.0,
        }
    }
}

impl ShCoefficients {
    /// Cosine-convolved radiance in a direction, divided by π
    pub fn eval_irradiance(&self, dir: DVec3) -> DVec3 {
        let basis = eval_sh_basis5(dir);
        let mut rgb = DVec3::ZERO;

        for (band, range) in BANDS.iter().enumerate() {
            // band 3 is identically zero under the cosine lobe
            if band == 3 {
                continue;
            }
            let weight = BAND_WEIGHTS[band];
            for i in range.clone() {
                rgb += DVec3::from_array(self.rgb[i]) * (basis[i] * weight);
            }
        }
        rgb
    }
}

/// Project the top mip of a cubemap onto bands 0–4
pub fn project_to_sh(image: &Image) -> Result<ShCoefficients> {
    image.ensure_cubemap()?;

    let face_size = image.face_size();
    let taps = TapTable::build(face_size, EdgeFixup::None);
    let mut coeffs = ShCoefficients::default();
    let mut weight_sum = 0.0_f64;

    for face in CubeFace::ALL {
        let texels = image.face(face, 0);
        for (tap, sample) in taps.face(face).iter().zip(texels) {
            let solid_angle = tap.w as f64;
            let basis = eval_sh_basis5(tap.truncate().as_dvec3());
            let sample = sample.truncate().as_dvec3();

            for (coeff, b) in coeffs.rgb.iter_mut().zip(basis) {
                let w = b * solid_angle;
                coeff[0] += sample.x * w;
                coeff[1] += sample.y * w;
                coeff[2] += sample.z * w;
            }
            weight_sum += solid_angle;
        }
    }

    let rescale = 4.0 * PI / weight_sum;
    tracing::trace!(face_size, weight_sum, rescale, "SH projection normalised");
    for coeff in coeffs.rgb.iter_mut() {
        for c in coeff.iter_mut() {
            *c *= rescale;
        }
    }
    coeffs.rescale_factor = rescale;

    Ok(coeffs)
}

/// Rebuild a single-mip irradiance cubemap from SH coefficients
pub fn reconstruct_irradiance(coeffs: &ShCoefficients, dst_face_size: u32) -> Result<Image> {
    if dst_face_size == 0 {
        return Err(Error::InvalidFaceSize(dst_face_size));
    }

    let taps = TapTable::build(dst_face_size, EdgeFixup::None);
    let mut image = Image::new_cubemap(dst_face_size, 1)?;

    for face in CubeFace::ALL {
        let dst = image.face_mut(face, 0);
        for (texel, tap) in dst.iter_mut().zip(taps.face(face)) {
            let rgb = coeffs.eval_irradiance(tap.truncate().as_dvec3());
            *texel = rgb.as_vec3().extend(1.0);
        }
    }

    Ok(image)
}

/// Diffuse irradiance cubemap of `src` at `dst_face_size`
pub fn compute_irradiance(src: &Image, dst_face_size: u32) -> Result<Image> {
    src.ensure_cubemap()?;
    if dst_face_size == 0 {
        return Err(Error::InvalidFaceSize(dst_face_size));
    }

    let start = std::time::Instant::now();
    let coeffs = project_to_sh(src)?;
    let image = reconstruct_irradiance(&coeffs, dst_face_size)?;

    tracing::info!(
        src_face_size = src.face_size(),
        dst_face_size,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Irradiance filter complete"
    );
    Ok(image)
}

/// Average radiance over the sphere, from the band-0 coefficient
pub fn average_radiance(coeffs: &ShCoefficients) -> Vec4 {
    // c0 = avg · Y0 · 4π, and Y0 · 4π = 1 / Y0
    let scale = 1.0 / (2.0 * PI.sqrt());
    let [r, g, b] = coeffs.rgb[0];
    Vec4::new((r * scale) as f32, (g * scale) as f32, (b * scale) as f32, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basis_is_orthonormal_under_table_quadrature() {
        let taps = TapTable::build(64, EdgeFixup::None);
        let mut gram = [[0.0_f64; SH_COEFF_COUNT]; SH_COEFF_COUNT];
        for tap in taps.taps() {
            let basis = eval_sh_basis5(tap.truncate().as_dvec3());
            for i in 0..SH_COEFF_COUNT {
                for j in 0..SH_COEFF_COUNT {
                    gram[i][j] += basis[i] * basis[j] * tap.w as f64;
                }
            }
        }
        for (i, row) in gram.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((value - expected).abs() < 1e-2, "gram[{i}][{j}] = {value}");
            }
        }
    }

    #[test]
    fn test_projection_rescale_is_near_unity() {
        let image = Image::solid_cubemap(16, Vec4::ONE).unwrap();
        let coeffs = project_to_sh(&image).unwrap();
        assert!((coeffs.rescale_factor - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_constant_environment_projects_onto_band0() {
        let image = Image::solid_cubemap(8, Vec4::new(0.5, 1.0, 2.0, 1.0)).unwrap();
        let coeffs = project_to_sh(&image).unwrap();
        let expected = 2.0 * PI.sqrt();
        assert!((coeffs.rgb[0][0] - 0.5 * expected).abs() < 1e-4);
        assert!((coeffs.rgb[0][2] - 2.0 * expected).abs() < 1e-4);
        // bands 1–3 have no cube-invariant component, so quadrature leaves them at zero
        for coeff in &coeffs.rgb[1..16] {
            assert!(coeff.iter().all(|c| c.abs() < 1e-4));
        }
        let avg = average_radiance(&coeffs);
        assert!((avg.y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_directional_light_brightens_facing_side() {
        let image = Image::cubemap_from_fn(8, |face, _, _| {
            if face == CubeFace::PosY { Vec4::ONE } else { Vec4::ZERO }
        })
        .unwrap();
        let coeffs = project_to_sh(&image).unwrap();
        let up = coeffs.eval_irradiance(DVec3::Y);
        let down = coeffs.eval_irradiance(-DVec3::Y);
        let side = coeffs.eval_irradiance(DVec3::X);
        assert!(up.x > side.x && side.x > down.x);
    }

    #[test]
    fn test_rejects_non_cubemap() {
        let flat = Image::new(8, 8, 1, 1).unwrap();
        assert!(matches!(project_to_sh(&flat), Err(Error::NotACubemap { faces: 1, .. })));
        assert!(matches!(
            compute_irradiance(&flat, 4),
            Err(Error::NotACubemap { .. })
        ));
    }

    #[test]
    fn test_zero_face_size_is_rejected() {
        let image = Image::solid_cubemap(2, Vec4::ONE).unwrap();
        assert!(matches!(
            compute_irradiance(&image, 0),
            Err(Error::InvalidFaceSize(0))
        ));
    }
}
