//! Engine configuration and named fractal presets.
//!
//! The surrounding application builds an [`EngineConfig`] (directly, from a
//! preset, or from JSON) before a run and hands it to the engine. The config
//! is read-only while an image is being calculated.

use crate::{Arithmetic, BailoutTest, ColorMap, ConfigError};
use serde::{Deserialize, Serialize};

/// Built-in orbit function families.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FractalKind {
    /// z² + c, z starts at the parameter, c is the pixel.
    #[default]
    Mandelbrot,
    /// z² + c, z starts at the pixel, c is the parameter.
    Julia,
    /// λ·z·(1 − z), z starts at the pixel, λ is the parameter.
    Lambda,
    /// zⁿ + c with Mandelbrot seeding.
    MandelbrotPower { power: u32 },
    /// zⁿ + c with Julia seeding.
    JuliaPower { power: u32 },
}

/// Region of the complex plane mapped onto the screen.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaneExtents {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl PlaneExtents {
    pub const fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x_max + self.x_min) / 2.0, (self.y_max + self.y_min) / 2.0)
    }

    fn is_valid(&self) -> bool {
        let all_finite = [self.x_min, self.x_max, self.y_min, self.y_max]
            .iter()
            .all(|v| v.is_finite());
        all_finite && self.x_max != self.x_min && self.y_max != self.y_min
    }
}

impl Default for PlaneExtents {
    fn default() -> Self {
        Self::new(-2.5, 1.5, -1.5, 1.5)
    }
}

/// Color used to fill a coherent tesseral box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "color", rename_all = "snake_case")]
pub enum FillColor {
    /// Fill with the shared border color.
    #[default]
    BoxColor,
    /// Fill with a fixed color, reduced modulo the palette size.
    Override(u32),
    /// Leave box interiors untouched.
    Skip,
}

/// Eye arrangement for Julibrot rendering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StereoMode {
    /// Single centered eye.
    #[default]
    Monocular,
    /// Left eye only.
    LeftEye,
    /// Right eye only.
    RightEye,
    /// Alternate eyes by pixel parity for red/blue glasses.
    RedBlue,
}

/// Julibrot viewing geometry. Lengths are in "inches" of a virtual screen.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JulibrotConfig {
    /// Distance from the eye plane to the middle of the fractal volume.
    pub origin: f64,
    /// Depth of the fractal volume.
    pub depth: f64,
    pub width: f64,
    pub height: f64,
    /// Distance from the eyes to the screen.
    pub distance: f64,
    pub eye_separation: f64,
    /// Number of depth slices ("z dots").
    pub z_dots: u32,
    pub stereo: StereoMode,
    /// Brightness of the right eye relative to the left in red/blue mode.
    pub brightness_ratio: f64,
    /// Parameter-plane real range swept across the depth slices.
    pub slice_x: (f64, f64),
    /// Parameter-plane imaginary range swept across the depth slices.
    pub slice_y: (f64, f64),
}

impl Default for JulibrotConfig {
    fn default() -> Self {
        Self {
            origin: 8.0,
            depth: 8.0,
            width: 10.0,
            height: 7.0,
            distance: 24.0,
            eye_separation: 2.5,
            z_dots: 128,
            stereo: StereoMode::Monocular,
            brightness_ratio: 1.0,
            slice_x: (-0.83, -0.83),
            slice_y: (-0.25, 0.25),
        }
    }
}

impl JulibrotConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.z_dots == 0 {
            return Err(ConfigError::NoDepthSlices);
        }
        let lengths = [self.origin, self.depth, self.width, self.height, self.distance];
        if lengths.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::InvalidJulibrot("lengths must be finite"));
        }
        if self.distance <= 0.0 {
            return Err(ConfigError::InvalidJulibrot("distance must be positive"));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(ConfigError::InvalidJulibrot("width and height must be positive"));
        }
        if !self.brightness_ratio.is_finite() || self.brightness_ratio < 0.0 {
            return Err(ConfigError::InvalidJulibrot(
                "brightness ratio must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

/// Everything the engine needs to calculate one image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub arithmetic: Arithmetic,
    pub fractal: FractalKind,
    /// Julia c, Mandelbrot starting z, or Lambda λ depending on `fractal`.
    pub param: (f64, f64),
    pub extents: PlaneExtents,
    pub screen_width: u32,
    pub screen_height: u32,
    pub bailout: BailoutTest,
    pub magnitude_limit: f64,
    pub max_iterations: u32,
    pub colors: u32,
    pub inside_color: u32,
    pub fill_color: FillColor,
    /// Orbit iterations between interrupt polls.
    pub poll_interval: u32,
    /// Cycle detection for pixel orbits. The closeness tolerance is the
    /// finer pixel step halved this many times; 0 turns detection off.
    pub periodicity: u32,
    pub julibrot: JulibrotConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            arithmetic: Arithmetic::Float,
            fractal: FractalKind::Mandelbrot,
            param: (0.0, 0.0),
            extents: PlaneExtents::default(),
            screen_width: 640,
            screen_height: 480,
            bailout: BailoutTest::Modulus,
            magnitude_limit: 4.0,
            max_iterations: 150,
            colors: 256,
            inside_color: 0,
            fill_color: FillColor::BoxColor,
            poll_interval: 2048,
            periodicity: 1,
            julibrot: JulibrotConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Start from a named preset with default everything else.
    pub fn from_preset(id: &str) -> Result<Self, ConfigError> {
        let preset = get_fractal_preset(id).ok_or_else(|| ConfigError::UnknownPreset(id.into()))?;
        Ok(preset.config())
    }

    /// Parse and validate. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.screen_width == 0 || self.screen_height == 0 {
            return Err(ConfigError::EmptyScreen {
                width: self.screen_width,
                height: self.screen_height,
            });
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::NoIterations);
        }
        if self.colors < 2 {
            return Err(ConfigError::TooFewColors(self.colors));
        }
        if let FractalKind::MandelbrotPower { power } | FractalKind::JuliaPower { power } =
            self.fractal
        {
            if power < 2 {
                return Err(ConfigError::PowerTooSmall(power));
            }
        }
        if !self.magnitude_limit.is_finite() || self.magnitude_limit <= 0.0 {
            return Err(ConfigError::InvalidMagnitudeLimit(self.magnitude_limit));
        }
        if !self.extents.is_valid() {
            let e = self.extents;
            return Err(ConfigError::DegenerateExtents {
                x_min: e.x_min,
                x_max: e.x_max,
                y_min: e.y_min,
                y_max: e.y_max,
            });
        }
        if let Arithmetic::Fixed { bit_shift } = self.arithmetic {
            if !(8..=30).contains(&bit_shift) {
                return Err(ConfigError::BitShiftOutOfRange(bit_shift));
            }
        }
        if self.poll_interval == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        self.julibrot.validate()
    }

    pub fn color_map(&self) -> Result<ColorMap, ConfigError> {
        ColorMap::new(self.colors, self.inside_color)
    }

    /// Switch to fixed-point with the preset's bit shift, or 24 when the
    /// fractal has no preset.
    pub fn with_fixed_point(mut self) -> Self {
        let bit_shift = FRACTAL_PRESETS
            .iter()
            .find(|p| p.kind == self.fractal)
            .map_or(24, |p| p.bit_shift);
        self.arithmetic = Arithmetic::Fixed { bit_shift };
        self
    }
}

/// A named starting point for a fractal type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractalPreset {
    /// Unique identifier
    pub id: &'static str,
    /// Human-readable name
    pub display_name: &'static str,
    pub kind: FractalKind,
    pub extents: PlaneExtents,
    pub param: (f64, f64),
    /// Fixed-point bit shift that keeps this fractal's orbits in range.
    pub bit_shift: u32,
}

impl FractalPreset {
    pub fn config(&self) -> EngineConfig {
        EngineConfig {
            fractal: self.kind,
            extents: self.extents,
            param: self.param,
            ..EngineConfig::default()
        }
    }
}

pub static FRACTAL_PRESETS: &[FractalPreset] = &[
    FractalPreset {
        id: "mandelbrot",
        display_name: "Mandelbrot Set",
        kind: FractalKind::Mandelbrot,
        extents: PlaneExtents::new(-2.5, 1.5, -1.5, 1.5),
        param: (0.0, 0.0),
        bit_shift: 29,
    },
    FractalPreset {
        id: "julia",
        display_name: "Julia Set",
        kind: FractalKind::Julia,
        extents: PlaneExtents::new(-2.0, 2.0, -1.5, 1.5),
        param: (0.3, 0.6),
        bit_shift: 29,
    },
    FractalPreset {
        id: "lambda",
        display_name: "Lambda",
        kind: FractalKind::Lambda,
        extents: PlaneExtents::new(-1.5, 2.5, -1.5, 1.5),
        param: (0.85, 0.6),
        bit_shift: 24,
    },
    FractalPreset {
        id: "mandelbrot_cubed",
        display_name: "Mandelbrot z³ + c",
        kind: FractalKind::MandelbrotPower { power: 3 },
        extents: PlaneExtents::new(-2.0, 2.0, -1.5, 1.5),
        param: (0.0, 0.0),
        bit_shift: 24,
    },
    FractalPreset {
        id: "julia_cubed",
        display_name: "Julia z³ + c",
        kind: FractalKind::JuliaPower { power: 3 },
        extents: PlaneExtents::new(-2.0, 2.0, -1.5, 1.5),
        param: (0.4, 0.0),
        bit_shift: 24,
    },
];

/// Look up a fractal preset by ID.
pub fn get_fractal_preset(id: &str) -> Option<&'static FractalPreset> {
    FRACTAL_PRESETS.iter().find(|p| p.id == id)
}
