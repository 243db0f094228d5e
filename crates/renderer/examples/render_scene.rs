//! Render a synthetic clustered scene with every strategy and write PNGs.
//!
//! Run with: cargo run --package smlm-renderer --example render_scene -- [out_dir]

use anyhow::Context;
use smlm_renderer::png::write_png;
use smlm_renderer::{
    render, render_overlay, ColorMapping, ColormapRegistry, GaussianParams, OutlineParams,
    OverlayChannel, PointSource, RenderRequest, Rgb, Strategy, Target,
};
use test_utils::clustered_cloud;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let out_dir = std::env::args()
        .nth(1)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("smlm-render"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let cloud = clustered_cloud(12, 400, 5.0, 0.08, 42);
    let registry = ColormapRegistry::builtin();
    let target = Target::from_points(&cloud, 10.0, 0.05)?;
    println!(
        "{} localizations on {}x{} pixels of {} nm",
        cloud.len(),
        target.width(),
        target.height(),
        target.pixel_size()
    );

    let scenes = [
        (
            "histogram_hot",
            Strategy::Histogram,
            ColorMapping::intensity("hot", 0.99)?,
        ),
        (
            "gaussian_z",
            Strategy::Gaussian(GaussianParams::default()),
            ColorMapping::field("z", "turbo"),
        ),
        (
            "gaussian_clusters",
            Strategy::Gaussian(GaussianParams::default()),
            ColorMapping::categorical("cluster", "tab10"),
        ),
        (
            "circle_clusters",
            Strategy::circle(OutlineParams::default())?,
            ColorMapping::categorical("cluster", "set1"),
        ),
        (
            "ellipse_z",
            Strategy::ellipse(OutlineParams::default())?,
            ColorMapping::field("z", "viridis"),
        ),
    ];

    for (name, strategy, color) in scenes {
        let request = RenderRequest::new(target.clone(), strategy, color);
        let output = render(&cloud, &request, &registry)
            .with_context(|| format!("rendering {}", name))?;
        let path = out_dir.join(format!("{}.png", name));
        write_png(&output.image, &path)?;
        println!(
            "{:>18}: {:>8.1?}  skipped={} fallbacks={} -> {}",
            name,
            output.info.elapsed,
            output.info.skipped_points,
            output.info.covariance_fallbacks,
            path.display()
        );
    }

    let second = clustered_cloud(6, 300, 5.0, 0.15, 7);
    let channels = [
        OverlayChannel::new(&cloud, Rgb::new(1.0, 0.0, 1.0)),
        OverlayChannel::new(&second, Rgb::new(0.0, 1.0, 0.0)),
    ];
    let overlay = render_overlay(
        &channels,
        &target,
        &Strategy::Gaussian(GaussianParams::default()),
        true,
        Some(0.99),
    )?;
    let path = out_dir.join("overlay.png");
    write_png(&overlay.image, &path)?;
    println!("{:>18}: {:>8.1?}  -> {}", "overlay", overlay.info.elapsed, path.display());

    Ok(())
}
