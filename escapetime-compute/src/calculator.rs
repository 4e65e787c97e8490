//! Per-pixel escape-time calculation for one configured image.

use crate::{
    create_orbit_function, CancellationChecker, OrbitFunction, OrbitIterator, Periodicity,
};
use escapetime_core::{
    Bailout, ColorMap, Complex, ConfigError, EngineConfig, NumericContext, OrbitOutcome,
    PlaneExtents, Scalar,
};

/// Maps screen pixels to plane coordinates.
///
/// Column 0 is `x_min`, the last column `x_max`. Row 0 is `y_max`, so the
/// imaginary axis points up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneMapping {
    pub origin: (f64, f64),
    pub step: (f64, f64),
}

impl PlaneMapping {
    pub fn new(extents: &PlaneExtents, width: u32, height: u32) -> Self {
        let span = |dots: u32| dots.saturating_sub(1).max(1) as f64;
        Self {
            origin: (extents.x_min, extents.y_max),
            step: (
                (extents.x_max - extents.x_min) / span(width),
                (extents.y_max - extents.y_min) / span(height),
            ),
        }
    }

    #[inline]
    pub fn point(&self, x: u32, y: u32) -> (f64, f64) {
        (
            self.origin.0 + x as f64 * self.step.0,
            self.origin.1 - y as f64 * self.step.1,
        )
    }

    /// The finer of the two pixel steps.
    pub fn min_step(&self) -> f64 {
        self.step.0.abs().min(self.step.1.abs())
    }
}

/// Everything needed to turn a pixel into a palette index.
///
/// Read-only during a run; the mutable per-calculation state lives in the
/// [`NumericContext`] passed to each call. Pixels are iterated with cycle
/// detection when the config asks for it, explicit orbits never are.
#[derive(Clone)]
pub struct Calculator<T: Scalar> {
    function: Box<dyn OrbitFunction<T>>,
    bailout: Bailout<T>,
    iterator: OrbitIterator,
    param: Complex<T>,
    color_map: ColorMap,
    mapping: PlaneMapping,
}

impl<T: Scalar> Calculator<T> {
    /// Validates `config` and builds its orbit function.
    pub fn new(config: &EngineConfig, ctx: &NumericContext) -> Result<Self, ConfigError> {
        Self::with_function(config, create_orbit_function(config.fractal), ctx)
    }

    /// Use a custom orbit function instead of the configured kind.
    pub fn with_function(
        config: &EngineConfig,
        function: Box<dyn OrbitFunction<T>>,
        ctx: &NumericContext,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mapping = PlaneMapping::new(&config.extents, config.screen_width, config.screen_height);
        let periodicity =
            Periodicity::new(config.periodicity, mapping.min_step(), config.max_iterations);
        Ok(Self {
            function,
            bailout: Bailout::new(config.bailout, config.magnitude_limit, ctx),
            iterator: OrbitIterator::new(config.max_iterations, config.poll_interval)
                .with_periodicity(periodicity),
            param: Complex::from_f64_pair(config.param.0, config.param.1, ctx),
            color_map: config.color_map()?,
            mapping,
        })
    }

    /// Name of the representation this calculator iterates in.
    pub fn arithmetic_name(&self) -> &'static str {
        T::ARITHMETIC_NAME
    }

    pub fn color_map(&self) -> ColorMap {
        self.color_map
    }

    pub fn function_name(&self) -> &'static str {
        self.function.name()
    }

    /// Plane coordinate of a pixel in this image's representation.
    pub fn plane_point(&self, x: u32, y: u32, ctx: &NumericContext) -> Complex<T> {
        let (re, im) = self.mapping.point(x, y);
        Complex::from_f64_pair(re, im, ctx)
    }

    /// Iterate from explicit seeds.
    pub fn orbit<C: CancellationChecker>(
        &self,
        z0: Complex<T>,
        c: Complex<T>,
        ctx: &mut NumericContext,
        cancel: &C,
    ) -> OrbitOutcome {
        let iterator = OrbitIterator {
            periodicity: None,
            ..self.iterator
        };
        iterator.iterate(self.function.as_ref(), z0, &c, &self.bailout, ctx, cancel)
    }

    pub fn pixel_outcome<C: CancellationChecker>(
        &self,
        x: u32,
        y: u32,
        ctx: &mut NumericContext,
        cancel: &C,
    ) -> OrbitOutcome {
        let pixel = self.plane_point(x, y, ctx);
        let (z0, c) = self.function.seed(pixel, self.param);
        self.iterator
            .iterate(self.function.as_ref(), z0, &c, &self.bailout, ctx, cancel)
    }

    /// Palette index of a pixel, `None` when interrupted.
    pub fn pixel_color<C: CancellationChecker>(
        &self,
        x: u32,
        y: u32,
        ctx: &mut NumericContext,
        cancel: &C,
    ) -> Option<u32> {
        self.color_map.color(self.pixel_outcome(x, y, ctx, cancel))
    }
}
