//! Benchmarks for the prefilter
//!
//! Measures tap table construction, SH irradiance, and radiance mip chains at a
//! few thread counts.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ibl::glam::Vec4;
use ibl::{compute_irradiance, compute_radiance, EdgeFixup, Image, RadianceOptions, TapTable};
use std::hint::black_box;

/// Procedural sky: bright zenith fading to a dark floor
fn create_test_environment(face_size: u32) -> Image {
    Image::cubemap_from_fn(face_size, |face, x, y| {
        let dir = ibl::tap_table::texel_direction(face, x, y, face_size, EdgeFixup::None);
        let sky = (dir.y * 0.5 + 0.5).powf(2.0);
        Vec4::new(sky * 4.0, sky * 5.0, sky * 6.0 + 0.1, 1.0)
    })
    .expect("Failed to allocate test environment")
}

fn bench_tap_table(c: &mut Criterion) {
    c.bench_function("tap_table_128", |b| {
        b.iter(|| TapTable::build(black_box(128), EdgeFixup::Warp))
    });
}

fn bench_irradiance(c: &mut Criterion) {
    let src = create_test_environment(64);
    c.bench_function("irradiance_64_to_32", |b| {
        b.iter(|| compute_irradiance(black_box(&src), 32).expect("irradiance failed"))
    });
}

fn bench_radiance(c: &mut Criterion) {
    let src = create_test_environment(32);
    let mut group = c.benchmark_group("radiance_32");
    group.sample_size(10);

    for threads in [1, 4, 8] {
        let options = RadianceOptions {
            face_size: 32,
            mip_count: 6,
            thread_count: threads,
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(threads), &options, |b, options| {
            b.iter(|| compute_radiance(black_box(&src), options).expect("radiance failed"))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_tap_table, bench_irradiance, bench_radiance);
criterion_main!(benches);
