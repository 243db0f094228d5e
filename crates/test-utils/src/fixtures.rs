//! Common test fixtures for rendering tests.
//!
//! Pre-built point sets and grids for the scenarios the render tests check
//! over and over.

use smlm_common::{PointCloud, ReferenceGrid};

/// Common physical extents (μm) as (x_min, x_max, y_min, y_max).
pub mod extent {
    /// 2 × 2 μm field; at 100 nm pixels whole-micrometer positions sit on
    /// pixel centers.
    pub const SCENE: (f64, f64, f64, f64) = (0.45, 2.45, 0.45, 2.45);

    /// Unit square at the origin
    pub const UNIT: (f64, f64, f64, f64) = (0.0, 1.0, 0.0, 1.0);
}

/// Two points at (1.0, 1.0) μm and one at (2.0, 2.0) μm.
pub fn three_point_cloud() -> PointCloud {
    cloud(vec![1.0, 1.0, 2.0], vec![1.0, 1.0, 2.0])
}

/// Three points in distinct pixels carrying a `z` attribute of 0, 10, 20.
pub fn field_cloud() -> PointCloud {
    cloud(vec![0.15, 0.45, 0.75], vec![0.15, 0.45, 0.75])
        .with_attribute("z", vec![0.0, 10.0, 20.0])
        .unwrap_or_else(|e| panic!("fixture: {}", e))
}

/// One point per category 1..=n along a row, attribute `label`.
pub fn labelled_cloud(n: usize) -> PointCloud {
    let xs: Vec<f64> = (0..n).map(|i| 0.05 + 0.1 * i as f64).collect();
    let ys = vec![0.05; n];
    let labels = (1..=n).map(|v| v as f64).collect();
    cloud(xs, ys)
        .with_attribute("label", labels)
        .unwrap_or_else(|e| panic!("fixture: {}", e))
}

/// A 64 × 64 camera grid of 100 nm pixels at the origin.
pub fn camera_grid() -> ReferenceGrid {
    ReferenceGrid::uniform(64, 64, 100.0, (0.0, 0.0)).unwrap_or_else(|e| panic!("fixture: {}", e))
}

fn cloud(xs: Vec<f64>, ys: Vec<f64>) -> PointCloud {
    PointCloud::new(xs, ys).unwrap_or_else(|e| panic!("fixture: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use smlm_common::PointSource;

    #[test]
    fn test_fixture_sizes() {
        assert_eq!(three_point_cloud().len(), 3);
        assert_eq!(field_cloud().attribute("z").unwrap(), &[0.0, 10.0, 20.0]);
        assert_eq!(labelled_cloud(5).attribute("label").unwrap()[4], 5.0);
        assert_eq!(camera_grid().nx(), 64);
    }
}
