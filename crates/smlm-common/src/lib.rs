//! Common types shared across the localization rendering workspace.

pub mod color;
pub mod error;
pub mod grid;
pub mod point;

pub use color::{parse_hex_color, Rgb};
pub use error::{RenderError, RenderResult};
pub use grid::{PixelWindow, ReferenceGrid};
pub use point::{check_column_len, Localization, PointCloud, PointSource};
