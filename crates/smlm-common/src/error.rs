//! Error types for rendering.

use thiserror::Error;

/// Result type alias using RenderError.
pub type RenderResult<T> = Result<T, RenderError>;

/// Primary error type for render setup.
///
/// Every variant is raised before any accumulator is allocated. Per-point
/// problems (degenerate sigma, bad covariance) never surface here.
#[derive(Debug, Error)]
pub enum RenderError {
    // === Configuration Errors ===
    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Missing required selection: {0}")]
    MissingSelection(String),

    #[error("Conflicting selections: {0}")]
    ConflictingSelection(String),

    #[error("Unsupported combination: {strategy} rendering cannot be used with {color} coloring")]
    UnsupportedCombination { strategy: String, color: String },

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Invalid reference grid: {0}")]
    InvalidGrid(String),

    #[error("Failed to load configuration: {0}")]
    ConfigError(String),

    // === Lookup Errors ===
    #[error("Unknown colormap: {0}")]
    UnknownColormap(String),

    #[error("Unknown palette: {0}")]
    UnknownPalette(String),

    #[error("Point attribute not found: {0}")]
    MissingAttribute(String),

    #[error("Per-point precision requested but points carry no {0}")]
    MissingPrecision(&'static str),

    #[error("Cannot derive bounds from an empty point set")]
    EmptyPointSet,

    // === Output Errors ===
    #[error("Encoding failed: {0}")]
    EncodeError(String),
}

impl RenderError {
    /// Create an InvalidParameter error.
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create an UnsupportedCombination error.
    pub fn unsupported(strategy: impl Into<String>, color: impl Into<String>) -> Self {
        Self::UnsupportedCombination {
            strategy: strategy.into(),
            color: color.into(),
        }
    }

    /// True for errors caused by how the caller configured the render,
    /// as opposed to failed lookups against the point data or colormaps.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            RenderError::InvalidParameter { .. }
                | RenderError::MissingSelection(_)
                | RenderError::ConflictingSelection(_)
                | RenderError::UnsupportedCombination { .. }
                | RenderError::InvalidTarget(_)
                | RenderError::InvalidGrid(_)
                | RenderError::ConfigError(_)
        )
    }
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::ConfigError(format!("JSON error: {}", err))
    }
}
