//! Irradiance path tests
//!
//! Verifies that:
//! 1. A constant environment reconstructs to the same constant at any size
//! 2. The tap table integrates to the full sphere
//! 3. Irradiance follows the light direction

use ibl::glam::{DVec3, Vec4};
use ibl::sh::average_radiance;
use ibl::{compute_irradiance, project_to_sh, CubeFace, EdgeFixup, Error, Image, TapTable};
use std::f64::consts::PI;

#[test]
fn test_constant_environment_roundtrip() {
    let color = Vec4::new(0.25, 0.5, 1.5, 1.0);
    let src = Image::solid_cubemap(16, color).unwrap();

    for dst_size in [1, 4, 7, 32] {
        let out = compute_irradiance(&src, dst_size).unwrap();
        assert_eq!(out.face_size(), dst_size);
        assert_eq!(out.mip_count(), 1);
        for &texel in out.texels() {
            assert!(
                (texel.truncate() - color.truncate()).abs().max_element() < 1e-3,
                "size {dst_size}: {texel:?}"
            );
            assert_eq!(texel.w, 1.0);
        }
    }
}

#[test]
fn test_white_environment_gives_white_irradiance() {
    let src = Image::solid_cubemap(8, Vec4::ONE).unwrap();
    let out = compute_irradiance(&src, 8).unwrap();
    for face in CubeFace::ALL {
        for &texel in out.face(face, 0) {
            assert!((texel - Vec4::ONE).length() < 1e-3);
        }
    }
}

#[test]
fn test_solid_angles_cover_sphere() {
    for size in [1, 2, 3, 16, 64] {
        let taps = TapTable::build(size, EdgeFixup::None);
        let total = taps.total_solid_angle();
        assert!((total - 4.0 * PI).abs() < 1e-3, "size {size}: {total}");
    }
}

#[test]
fn test_rescale_factor_near_one() {
    for size in [4, 16, 32] {
        let src = Image::solid_cubemap(size, Vec4::ONE).unwrap();
        let coeffs = project_to_sh(&src).unwrap();
        assert!((coeffs.rescale_factor - 1.0).abs() < 1e-3);
        assert!((average_radiance(&coeffs).x - 1.0).abs() < 1e-3);
    }
}

#[test]
fn test_sky_lights_upward_normals() {
    // Bright upper hemisphere, dark lower
    let src = Image::cubemap_from_fn(16, |face, _, y| match face {
        CubeFace::PosY => Vec4::ONE,
        CubeFace::NegY => Vec4::ZERO,
        _ if y < 8 => Vec4::ONE,
        _ => Vec4::ZERO,
    })
    .unwrap();
    let coeffs = project_to_sh(&src).unwrap();

    let up = coeffs.eval_irradiance(DVec3::Y);
    let horizon = coeffs.eval_irradiance(DVec3::Z);
    let down = coeffs.eval_irradiance(-DVec3::Y);
    assert!(up.x > horizon.x);
    assert!(horizon.x > down.x);
    assert!((horizon.x - 0.5).abs() < 0.05);
}

#[test]
fn test_irradiance_rejects_bad_input() {
    let not_square = Image::new(8, 4, 6, 1).unwrap();
    assert!(matches!(
        compute_irradiance(&not_square, 8),
        Err(Error::NotACubemap { width: 8, height: 4, faces: 6 })
    ));

    let src = Image::solid_cubemap(4, Vec4::ONE).unwrap();
    assert!(matches!(compute_irradiance(&src, 0), Err(Error::InvalidFaceSize(0))));
}
