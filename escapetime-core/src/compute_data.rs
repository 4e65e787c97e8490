// escapetime-core/src/compute_data.rs

use crate::ConfigError;
use serde::{Deserialize, Serialize};

/// Result of iterating one orbit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrbitOutcome {
    /// The bailout fired on this step (1-based).
    Escaped { iterations: u32 },
    /// The iteration budget ran out without an escape.
    Bounded,
    /// An external interrupt was observed at a poll point.
    Interrupted,
}

impl OrbitOutcome {
    pub fn escaped(&self) -> bool {
        matches!(self, OrbitOutcome::Escaped { .. })
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, OrbitOutcome::Interrupted)
    }
}

/// Maps orbit outcomes to palette indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorMap {
    /// Palette size. At least 2.
    pub colors: u32,
    /// Color of orbits that never escape.
    pub inside_color: u32,
}

impl ColorMap {
    /// Fails with fewer than 2 colors: escapes wrap over colors 1..colors,
    /// which leaves them nowhere to go.
    pub fn new(colors: u32, inside_color: u32) -> Result<Self, ConfigError> {
        if colors < 2 {
            return Err(ConfigError::TooFewColors(colors));
        }
        Ok(Self {
            colors,
            inside_color,
        })
    }

    /// Palette index for an escape after `iterations` steps.
    ///
    /// Counts past the palette wrap around the colors 1..colors, so color 0
    /// is reserved for inside/outside overrides.
    #[inline]
    pub fn escape_color(&self, iterations: u32) -> u32 {
        let iterations = iterations.max(1);
        if iterations < self.colors {
            iterations
        } else {
            (iterations - 1) % (self.colors - 1) + 1
        }
    }

    /// Palette index for an outcome, `None` when the orbit was interrupted.
    #[inline]
    pub fn color(&self, outcome: OrbitOutcome) -> Option<u32> {
        match outcome {
            OrbitOutcome::Escaped { iterations } => Some(self.escape_color(iterations)),
            OrbitOutcome::Bounded => Some(self.inside_color),
            OrbitOutcome::Interrupted => None,
        }
    }
}

impl Default for ColorMap {
    fn default() -> Self {
        Self {
            colors: 256,
            inside_color: 0,
        }
    }
}
