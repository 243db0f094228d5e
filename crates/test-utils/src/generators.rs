//! Generators for synthetic localization data.
//!
//! Random generators take an explicit seed so every test run sees the same
//! points.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smlm_common::PointCloud;

/// Points on a regular lattice, one per `spacing` μm, starting at `origin`.
///
/// Points are emitted row by row (y outer, x inner).
///
/// # Example
///
/// ```
/// use smlm_common::PointSource;
/// use test_utils::lattice_cloud;
///
/// let cloud = lattice_cloud(3, 2, 0.5, (1.0, 1.0));
/// assert_eq!(cloud.len(), 6);
/// assert_eq!(cloud.x()[1], 1.5);
/// assert_eq!(cloud.y()[3], 1.5);
/// ```
pub fn lattice_cloud(nx: usize, ny: usize, spacing: f64, origin: (f64, f64)) -> PointCloud {
    let mut xs = Vec::with_capacity(nx * ny);
    let mut ys = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            xs.push(origin.0 + i as f64 * spacing);
            ys.push(origin.1 + j as f64 * spacing);
        }
    }
    cloud_from_columns(xs, ys)
}

/// `n` points uniformly distributed over `[0, extent)` μm on both axes.
pub fn uniform_cloud(n: usize, extent: f64, seed: u64) -> PointCloud {
    let mut rng = StdRng::seed_from_u64(seed);
    let xs = (0..n).map(|_| rng.gen_range(0.0..extent)).collect();
    let ys = (0..n).map(|_| rng.gen_range(0.0..extent)).collect();
    cloud_from_columns(xs, ys)
}

/// Clustered localizations with precision, covariance, photons and a
/// `cluster` attribute (1-based cluster id).
///
/// Cluster centers are uniform over `[0, extent)` μm; members are spread
/// uniformly within ±`spread` μm of their center. Precisions are drawn from
/// 10–30 nm and covariances stay well inside positive definiteness.
pub fn clustered_cloud(
    n_clusters: usize,
    per_cluster: usize,
    extent: f64,
    spread: f64,
    seed: u64,
) -> PointCloud {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = n_clusters * per_cluster;
    let mut xs = Vec::with_capacity(n);
    let mut ys = Vec::with_capacity(n);
    let mut sigma_x = Vec::with_capacity(n);
    let mut sigma_y = Vec::with_capacity(n);
    let mut sigma_xy = Vec::with_capacity(n);
    let mut photons = Vec::with_capacity(n);
    let mut cluster = Vec::with_capacity(n);
    let mut z = Vec::with_capacity(n);

    for c in 0..n_clusters {
        let cx = rng.gen_range(0.0..extent);
        let cy = rng.gen_range(0.0..extent);
        let depth = rng.gen_range(-500.0..500.0);
        for _ in 0..per_cluster {
            xs.push(cx + rng.gen_range(-spread..=spread));
            ys.push(cy + rng.gen_range(-spread..=spread));
            let sx: f64 = rng.gen_range(0.010..0.030);
            let sy: f64 = rng.gen_range(0.010..0.030);
            let rho: f64 = rng.gen_range(-0.5..0.5);
            sigma_x.push(sx);
            sigma_y.push(sy);
            sigma_xy.push(rho * sx * sy);
            photons.push(rng.gen_range(500.0..5000.0));
            cluster.push((c + 1) as f64);
            z.push(depth + rng.gen_range(-50.0..50.0));
        }
    }

    PointCloud::new(xs, ys)
        .and_then(|p| p.with_precision(sigma_x, sigma_y))
        .and_then(|p| p.with_covariance(sigma_xy))
        .and_then(|p| p.with_photons(photons))
        .and_then(|p| p.with_attribute("cluster", cluster))
        .and_then(|p| p.with_attribute("z", z))
        .unwrap_or_else(|e| panic!("generated columns must line up: {}", e))
}

fn cloud_from_columns(xs: Vec<f64>, ys: Vec<f64>) -> PointCloud {
    PointCloud::new(xs, ys).unwrap_or_else(|e| panic!("generated columns must line up: {}", e))
}
