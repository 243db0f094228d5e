//! Point clouds and assertions for the renderer's tests and benches.
//!
//! [`fixtures`] holds small hand-placed clouds whose rendered pixels can be
//! predicted exactly (the three-point scene, a `z` field, labelled
//! categories) plus a 100 nm camera grid. [`generators`] builds larger
//! seeded clouds: a regular lattice, uniform noise and clusters carrying
//! precision, covariance, photons and a `cluster` label. The same seed
//! always gives the same cloud.
//!
//! Colors are floats, so pixel checks go through [`assert_approx_eq!`] or
//! [`assert_rgb_approx_eq!`] rather than `assert_eq!` whenever a value
//! comes out of a kernel or a colormap.

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;

/// Fail unless two numbers differ by at most `epsilon`.
///
/// Both sides are widened to `f64`, so kernel weights, pixel channels and
/// nanometer sizes compare the same way.
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(target.pixel_size(), 50.0, 1e-9);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// [`assert_approx_eq!`] applied to each channel of two `Rgb` colors.
///
/// ```ignore
/// use test_utils::assert_rgb_approx_eq;
///
/// assert_rgb_approx_eq!(Rgb::new(0.5, 0.0, 1.0), Rgb::new(0.5001, 0.0, 1.0), 0.001);
/// ```
#[macro_export]
macro_rules! assert_rgb_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left = $left;
        let right = $right;
        $crate::assert_approx_eq!(left.r, right.r, $epsilon);
        $crate::assert_approx_eq!(left.g, right.g, $epsilon);
        $crate::assert_approx_eq!(left.b, right.b, $epsilon);
    }};
}
