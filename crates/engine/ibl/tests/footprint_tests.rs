//! Cross-face footprint tests
//!
//! Verifies that:
//! 1. The neighbour table walks back to where it started for all 24 edges
//! 2. A footprint spilling over a seam lands where the same 3D direction lands
//! 3. A footprint at a face centre is symmetric
//! 4. Every mip's footprint holds every source texel inside its lobe support
//! 5. Filtering over the footprint equals filtering over the whole sphere

use ibl::face::{direction_to_face_uv, face_uv_to_direction};
use ibl::footprint::{cross_seam, determine_filter_area, FaceRect};
use ibl::glam::{Vec2, Vec3, Vec4};
use ibl::kernel::{filter_texel, nearest_sample, FilterSource, MipFilter};
use ibl::tap_table::texel_direction;
use ibl::{mip_extent, CubeFace, EdgeFixup, FaceEdge, Image, LightingModel, RadianceOptions, TapTable};

const BASE_SIZE: u32 = 16;
const MIPS: u32 = 5;

fn near_edge(edge: FaceEdge, t: f32, offset: f32) -> Vec2 {
    match edge {
        FaceEdge::Left => Vec2::new(offset, t),
        FaceEdge::Right => Vec2::new(1.0 - offset, t),
        FaceEdge::Top => Vec2::new(t, offset),
        FaceEdge::Bottom => Vec2::new(t, 1.0 - offset),
    }
}

fn contains(rect: &FaceRect, p: Vec2, eps: f32) -> bool {
    p.x >= rect.min.x - eps
        && p.x <= rect.max.x + eps
        && p.y >= rect.min.y - eps
        && p.y <= rect.max.y + eps
}

#[test]
fn test_neighbour_walk_back() {
    for face in CubeFace::ALL {
        for edge in FaceEdge::ALL {
            let across = face.neighbour(edge);
            let back = across.face.neighbour(across.edge);
            assert_eq!((back.face, back.edge), (face, edge), "{face:?} {edge:?}");

            let range = (0.25, 0.5);
            let there = cross_seam(edge, across.edge, range);
            assert_eq!(cross_seam(across.edge, edge, there), range);
        }
    }
}

#[test]
fn test_spill_matches_geometry_on_every_seam() {
    let filter_size = 0.05;

    for face in CubeFace::ALL {
        for edge in FaceEdge::ALL {
            // off-centre so a missing mirror would miss by a wide margin
            for t in [0.25, 0.6] {
                let tap = face_uv_to_direction(face, near_edge(edge, t, 0.01));
                let area = determine_filter_area(tap, filter_size);

                let beyond = face_uv_to_direction(face, near_edge(edge, t, -0.01));
                let (landed, uv) = direction_to_face_uv(beyond);
                let expected = face.neighbour(edge).face;
                assert_eq!(landed, expected, "{face:?} {edge:?}");

                let rect = area.rect(expected);
                assert!(!rect.is_empty(), "{face:?} {edge:?} t={t}: nothing spilled");
                assert!(
                    contains(rect, uv, 1e-4),
                    "{face:?} {edge:?} t={t}: {uv:?} outside {rect:?}"
                );
            }
        }
    }
}

#[test]
fn test_centre_footprint_is_symmetric() {
    for face in CubeFace::ALL {
        let area = determine_filter_area(face.normal(), 0.2);
        let rect = area.rect(face);
        let centre = (rect.min + rect.max) * 0.5;
        assert!((centre - Vec2::splat(0.5)).length() < 1e-6);
        assert!(((rect.max - rect.min) - Vec2::splat(0.4)).length() < 1e-6);
        for other in CubeFace::ALL.into_iter().filter(|&f| f != face) {
            assert!(area.rect(other).is_empty());
        }
    }
}

#[test]
fn test_footprint_grows_with_filter_size() {
    let tap = face_uv_to_direction(CubeFace::NegY, Vec2::new(0.3, 0.8));
    let narrow = determine_filter_area(tap, 0.05);
    let wide = determine_filter_area(tap, 0.5);
    assert!(wide.faces().count() > narrow.faces().count());
    for (face, rect) in narrow.faces() {
        let outer = wide.rect(face);
        assert!(contains(outer, rect.min, 1e-6) && contains(outer, rect.max, 1e-6));
    }
}

/// Destination taps at the corners, edge midpoints and centre of every face
fn lobe_taps(face_size: u32) -> Vec<Vec3> {
    let last = face_size - 1;
    let mid = face_size / 2;
    let spots = [
        (0, 0),
        (last, 0),
        (0, last),
        (last, last),
        (mid, 0),
        (0, mid),
        (last, mid),
        (mid, last),
        (mid, mid),
    ];
    CubeFace::ALL
        .into_iter()
        .flat_map(|face| {
            spots
                .into_iter()
                .map(move |(x, y)| texel_direction(face, x, y, face_size, EdgeFixup::None))
        })
        .collect()
}

/// Every mip of a chain under the given lighting models
fn chain_filters() -> Vec<(u32, MipFilter)> {
    [LightingModel::Phong, LightingModel::BlinnBrdf]
        .into_iter()
        .flat_map(|lighting_model| {
            let options = RadianceOptions {
                face_size: BASE_SIZE,
                lighting_model,
                ..Default::default()
            };
            (0..MIPS).map(move |mip| (mip, MipFilter::for_mip(mip, MIPS, BASE_SIZE, &options)))
        })
        .collect()
}

#[test]
fn test_footprint_holds_lobe_support_on_every_mip() {
    let taps = TapTable::build(BASE_SIZE, EdgeFixup::None);

    for (mip, params) in chain_filters() {
        for tap in lobe_taps(mip_extent(BASE_SIZE, mip)) {
            let area = determine_filter_area(tap, params.filter_size);

            for face in CubeFace::ALL {
                let range = area.rect(face).texel_range(BASE_SIZE);
                for y in 0..BASE_SIZE {
                    for x in 0..BASE_SIZE {
                        let dot = taps.tap(face, x, y).truncate().dot(tap);
                        if dot < params.cos_threshold {
                            continue;
                        }
                        let inside = range.is_some_and(|(x0, y0, x1, y1)| {
                            (x0..=x1).contains(&x) && (y0..=y1).contains(&y)
                        });
                        assert!(
                            inside,
                            "mip {mip} {params:?}: {face:?} texel ({x}, {y}) at dot {dot} \
                             outside {range:?} for tap {tap:?}"
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn test_filter_texel_matches_full_sphere_sum() {
    let image = Image::cubemap_from_fn(BASE_SIZE, |face, x, y| {
        Vec4::new(face.index() as f32 + 1.0, x as f32 * 0.5, (y * y) as f32 * 0.1, 1.0)
    })
    .unwrap();
    let taps = TapTable::build(BASE_SIZE, EdgeFixup::None);
    let source = FilterSource::new(&image, &taps, EdgeFixup::None);

    for (mip, params) in chain_filters() {
        for tap in lobe_taps(mip_extent(BASE_SIZE, mip)) {
            let mut color = Vec4::ZERO;
            let mut weight_sum = 0.0_f32;
            for face in CubeFace::ALL {
                let texels = image.face(face, 0);
                for (normal, texel) in taps.face(face).iter().zip(texels) {
                    let dot = normal.truncate().dot(tap);
                    if dot < params.cos_threshold {
                        continue;
                    }
                    let weight = normal.w * dot.powf(params.specular_power);
                    color += *texel * weight;
                    weight_sum += weight;
                }
            }
            let expected = if weight_sum != 0.0 {
                color / weight_sum
            } else {
                nearest_sample(&image, tap)
            };

            let out = filter_texel(&source, tap, &params);
            assert!(
                (out - expected).length() <= 1e-4 * expected.length(),
                "mip {mip} {params:?} tap {tap:?}: {out:?} != {expected:?}"
            );
        }
    }
}
