//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Screen must be at least 1x1 pixels, got {width}x{height}")]
    EmptyScreen { width: u32, height: u32 },

    #[error("Max iterations must be positive")]
    NoIterations,

    #[error("Palette needs at least 2 colors, got {0}")]
    TooFewColors(u32),

    #[error("Integer power must be at least 2, got {0}")]
    PowerTooSmall(u32),

    #[error("Magnitude limit must be finite and positive, got {0}")]
    InvalidMagnitudeLimit(f64),

    #[error("Plane extents are degenerate: x {x_min}..{x_max}, y {y_min}..{y_max}")]
    DegenerateExtents {
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    },

    #[error("Fixed-point bit shift must be in 8..=30, got {0}")]
    BitShiftOutOfRange(u32),

    #[error("Poll interval must be positive")]
    ZeroPollInterval,

    #[error("Julibrot needs at least one depth slice")]
    NoDepthSlices,

    #[error("Julibrot geometry is invalid: {0}")]
    InvalidJulibrot(&'static str),

    #[error("Unknown fractal preset: {0}")]
    UnknownPreset(String),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}
