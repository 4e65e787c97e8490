pub mod bailout;
pub mod complex;
pub mod compute_data;
pub mod config;
pub mod error;
pub mod fixed;
pub mod numeric;
pub mod pixel_rect;

pub use bailout::{Bailout, BailoutTest, OrbitState};
pub use complex::Complex;
pub use compute_data::{ColorMap, OrbitOutcome};
pub use config::{
    get_fractal_preset, EngineConfig, FillColor, FractalKind, FractalPreset, JulibrotConfig,
    PlaneExtents, StereoMode, FRACTAL_PRESETS,
};
pub use error::ConfigError;
pub use fixed::Fixed;
pub use numeric::{Arithmetic, NumericContext, Scalar};
pub use pixel_rect::PixelRect;
