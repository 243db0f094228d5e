//! Benchmarks for rendering strategies and PNG encoding.
//!
//! Run with: cargo bench --package smlm-renderer --bench render_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use smlm_renderer::png::encode_png;
use smlm_renderer::{
    render, ColorMapping, ColormapRegistry, GaussianParams, OutlineParams, PointCloud, PointSource,
    RenderRequest, Rgb, RgbImage, Strategy, Target,
};
use test_utils::{clustered_cloud, uniform_cloud};

const EXTENT_UM: f64 = 10.0;

fn target_for(pixel_size: f64) -> Target {
    let n = (EXTENT_UM * 1000.0 / pixel_size).round() as usize;
    Target::new(n, n, pixel_size, (0.0, EXTENT_UM), (0.0, EXTENT_UM)).unwrap()
}

/// Random-noise image with continuous colors (truecolor PNG path).
fn noise_image(width: usize, height: usize) -> RgbImage {
    let mut rng = rand::thread_rng();
    let pixels = (0..width * height)
        .map(|_| Rgb::new(rng.gen(), rng.gen(), rng.gen()))
        .collect();
    RgbImage::from_pixels(width, height, pixels).unwrap()
}

// =============================================================================
// HISTOGRAM BENCHMARKS
// =============================================================================

fn bench_histogram(c: &mut Criterion) {
    let mut group = c.benchmark_group("histogram");
    let registry = ColormapRegistry::builtin();
    let target = target_for(20.0);

    for n in [10_000usize, 100_000, 1_000_000] {
        let cloud = uniform_cloud(n, EXTENT_UM, 1);
        let request = RenderRequest::new(
            target.clone(),
            Strategy::Histogram,
            ColorMapping::intensity("inferno", 0.99).unwrap(),
        );
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("intensity", n), &cloud, |b, cloud| {
            b.iter(|| render(black_box(cloud), &request, &registry).unwrap())
        });
    }

    group.finish();
}

// =============================================================================
// GAUSSIAN BENCHMARKS
// =============================================================================

fn bench_gaussian(c: &mut Criterion) {
    let mut group = c.benchmark_group("gaussian");
    group.sample_size(20);
    let registry = ColormapRegistry::builtin();
    let cloud = clustered_cloud(50, 1000, EXTENT_UM, 0.1, 3);
    group.throughput(Throughput::Elements(cloud.len() as u64));

    let cases: [(&str, ColorMapping); 3] = [
        ("intensity", ColorMapping::intensity("hot", 0.99).unwrap()),
        ("field", ColorMapping::field("z", "turbo")),
        ("categorical", ColorMapping::categorical("cluster", "tab10")),
    ];

    for pixel_size in [20.0, 10.0] {
        let target = target_for(pixel_size);
        for (name, color) in &cases {
            let request = RenderRequest::new(
                target.clone(),
                Strategy::Gaussian(GaussianParams::default()),
                color.clone(),
            );
            let id = BenchmarkId::new(*name, format!("{}nm", pixel_size));
            group.bench_function(id, |b| b.iter(|| render(black_box(&cloud), &request, &registry).unwrap()));
        }
    }

    group.finish();
}

// =============================================================================
// OUTLINE BENCHMARKS
// =============================================================================

fn bench_outlines(c: &mut Criterion) {
    let mut group = c.benchmark_group("outlines");
    group.sample_size(20);
    let registry = ColormapRegistry::builtin();
    let cloud = clustered_cloud(20, 500, EXTENT_UM, 0.1, 5);
    let target = target_for(5.0);

    let strategies = [
        ("circle", Strategy::circle(OutlineParams::default()).unwrap()),
        ("ellipse", Strategy::ellipse(OutlineParams::default()).unwrap()),
        (
            "circle_wide",
            Strategy::circle(OutlineParams::default().with_line_width(3.0)).unwrap(),
        ),
    ];

    for (name, strategy) in strategies {
        let request = RenderRequest::new(
            target.clone(),
            strategy,
            ColorMapping::categorical("cluster", "tab10"),
        );
        group.bench_function(name, |b| b.iter(|| render(black_box(&cloud), &request, &registry).unwrap()));
    }

    group.finish();
}

// =============================================================================
// PNG ENCODING BENCHMARKS
// =============================================================================

fn bench_png_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("png_encoding");
    let registry = ColormapRegistry::builtin();

    for size in [256usize, 512, 1024] {
        let pixel_size = EXTENT_UM * 1000.0 / size as f64;
        let cloud: PointCloud = uniform_cloud(size * size / 4, EXTENT_UM, 7);
        let request = RenderRequest::new(
            target_for(pixel_size),
            Strategy::Histogram,
            ColorMapping::Grayscale,
        );
        let indexed = render(&cloud, &request, &registry).unwrap().image;
        let truecolor = noise_image(size, size);

        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::new("indexed", size), &indexed, |b, image| {
            b.iter(|| encode_png(black_box(image)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("truecolor", size), &truecolor, |b, image| {
            b.iter(|| encode_png(black_box(image)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_histogram,
    bench_gaussian,
    bench_outlines,
    bench_png_encoding,
);
criterion_main!(benches);
