//! Entry points for the surrounding application.
//!
//! An [`Engine`] is built once per image from a validated [`EngineConfig`].
//! The configured arithmetic picks one of two calculator backends; every run
//! method dispatches to it, so the hot loops are monomorphized per scalar.

use crate::{
    Calculator, CancellationChecker, CompletionStatus, JulibrotProjector, JulibrotRun, PixelSource,
    Plotter, ResumeToken, TesseralAccelerator, TesseralRun, WorkItem, Worklist,
};
use escapetime_core::{
    Arithmetic, ConfigError, EngineConfig, Fixed, NumericContext, PixelRect, Scalar,
};

#[derive(Clone)]
enum Backend {
    Float(Calculator<f64>),
    Fixed(Calculator<Fixed>),
}

/// One image's calculation state.
///
/// Not reentrant: the numeric context is owned by the run in progress, so
/// calls must be serialized by the caller.
#[derive(Clone)]
pub struct Engine {
    config: EngineConfig,
    ctx: NumericContext,
    backend: Backend,
    julibrot: JulibrotProjector,
    tesseral: TesseralAccelerator,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        let ctx = NumericContext::for_arithmetic(config.arithmetic);
        let backend = match config.arithmetic {
            Arithmetic::Float => Backend::Float(Calculator::new(&config, &ctx)?),
            Arithmetic::Fixed { .. } => Backend::Fixed(Calculator::new(&config, &ctx)?),
        };
        Ok(Self {
            julibrot: JulibrotProjector::new(&config),
            tesseral: TesseralAccelerator::new(config.fill_color, config.colors),
            config,
            ctx,
            backend,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn function_name(&self) -> &'static str {
        match &self.backend {
            Backend::Float(calc) => calc.function_name(),
            Backend::Fixed(calc) => calc.function_name(),
        }
    }

    /// `"float"` or `"fixed"`.
    pub fn arithmetic_name(&self) -> &'static str {
        match &self.backend {
            Backend::Float(calc) => calc.arithmetic_name(),
            Backend::Fixed(calc) => calc.arithmetic_name(),
        }
    }

    /// Replace the tesseral fill polling cadence.
    pub fn with_fill_poll_intervals(mut self, rows: u32, pixels: u32) -> Self {
        self.tesseral = self.tesseral.with_poll_intervals(rows, pixels);
        self
    }

    /// Palette index for one pixel, `None` if interrupted mid-orbit.
    pub fn run_pixel<C: CancellationChecker>(&mut self, x: u32, y: u32, cancel: &C) -> Option<u32> {
        let ctx = &mut self.ctx;
        match &self.backend {
            Backend::Float(calc) => calc.pixel_color(x, y, ctx, cancel),
            Backend::Fixed(calc) => calc.pixel_color(x, y, ctx, cancel),
        }
    }

    /// Render the whole Julibrot plane.
    pub fn run_julibrot_plane<P, C>(&mut self, plotter: &mut P, cancel: &C) -> JulibrotRun
    where
        P: Plotter + ?Sized,
        C: CancellationChecker,
    {
        self.julibrot_from(None, plotter, cancel)
    }

    /// Calculate `rect` with the tesseral method.
    pub fn run_tesseral<P, C>(&mut self, rect: PixelRect, plotter: &mut P, cancel: &C) -> TesseralRun
    where
        P: Plotter + ?Sized,
        C: CancellationChecker,
    {
        self.tesseral_from(rect, None, plotter, cancel)
    }

    /// Continue an interrupted item. `plotter` must still hold the pixels
    /// written before the interruption.
    pub fn resume<P, C>(&mut self, item: &WorkItem, plotter: &mut P, cancel: &C) -> CompletionStatus
    where
        P: Plotter + ?Sized,
        C: CancellationChecker,
    {
        match item {
            WorkItem::Tesseral { rect, resume } => {
                self.tesseral_from(*rect, resume.as_ref(), plotter, cancel)
                    .status
            }
            WorkItem::JulibrotPlane { row } => self.julibrot_from(Some(*row), plotter, cancel).status,
        }
    }

    /// Drain `worklist` in order. On interruption the remainder of the
    /// current item goes back to the front and the run stops.
    pub fn run_worklist<P, C>(
        &mut self,
        worklist: &mut Worklist,
        plotter: &mut P,
        cancel: &C,
    ) -> CompletionStatus
    where
        P: Plotter + ?Sized,
        C: CancellationChecker,
    {
        while let Some(item) = worklist.pop() {
            let status = self.resume(&item, plotter, cancel);
            if let CompletionStatus::Interrupted(rest) = status {
                worklist.push_front(rest);
                log::info!("worklist interrupted, {} items pending", worklist.len());
                return status;
            }
        }
        CompletionStatus::Complete
    }

    fn tesseral_from<P, C>(
        &mut self,
        rect: PixelRect,
        resume: Option<&ResumeToken>,
        plotter: &mut P,
        cancel: &C,
    ) -> TesseralRun
    where
        P: Plotter + ?Sized,
        C: CancellationChecker,
    {
        let (width, height) = (self.config.screen_width, self.config.screen_height);
        if !PixelRect::screen(width, height).encloses(&rect) {
            log::warn!("tesseral {rect:?} reaches past the {width}x{height} screen");
        }
        log::info!(
            "tesseral {}x{} at ({}, {}) in {}{}",
            rect.width,
            rect.height,
            rect.x,
            rect.y,
            self.arithmetic_name(),
            if resume.is_some() { ", resuming" } else { "" }
        );
        let Self {
            ctx,
            backend,
            tesseral,
            ..
        } = self;
        let run = match backend {
            Backend::Float(calc) => tesseral_with(tesseral, calc, ctx, rect, resume, plotter, cancel),
            Backend::Fixed(calc) => tesseral_with(tesseral, calc, ctx, rect, resume, plotter, cancel),
        };
        match &run.status {
            CompletionStatus::Complete => log::info!(
                "tesseral complete: {} computed, {} fills, {} splits",
                run.stats.computed_pixels,
                run.stats.fills,
                run.stats.splits
            ),
            CompletionStatus::Interrupted(item) => log::info!("tesseral interrupted: {item:?}"),
        }
        run
    }

    fn julibrot_from<P, C>(&mut self, start_row: Option<u32>, plotter: &mut P, cancel: &C) -> JulibrotRun
    where
        P: Plotter + ?Sized,
        C: CancellationChecker,
    {
        let jb = &self.config.julibrot;
        log::info!(
            "julibrot {}x{} in {}{}",
            self.config.screen_width,
            self.config.screen_height,
            self.arithmetic_name(),
            start_row.map_or(String::new(), |r| format!(", resuming at row {r}"))
        );
        log::debug!(
            "julibrot eyes {:?}/{:?}, {} slices, origin {} depth {} distance {}",
            self.julibrot.left,
            self.julibrot.right,
            self.julibrot.z_dots(),
            jb.origin,
            jb.depth,
            jb.distance
        );
        let Self {
            ctx,
            backend,
            julibrot,
            ..
        } = self;
        let run = match backend {
            Backend::Float(calc) => julibrot.run_plane(calc, start_row, plotter, ctx, cancel),
            Backend::Fixed(calc) => julibrot.run_plane(calc, start_row, plotter, ctx, cancel),
        };
        match &run.status {
            CompletionStatus::Complete => log::info!(
                "julibrot complete: {} rows, {} of {} rays plotted",
                run.stats.rows,
                run.stats.plotted,
                run.stats.zlines
            ),
            CompletionStatus::Interrupted(item) => log::info!("julibrot interrupted: {item:?}"),
        }
        run
    }
}

#[allow(clippy::too_many_arguments)]
fn tesseral_with<T, P, C>(
    accelerator: &TesseralAccelerator,
    calc: &Calculator<T>,
    ctx: &mut NumericContext,
    rect: PixelRect,
    resume: Option<&ResumeToken>,
    plotter: &mut P,
    cancel: &C,
) -> TesseralRun
where
    T: Scalar,
    P: Plotter + ?Sized,
    C: CancellationChecker,
{
    let source = CalculatorPixels { calc, ctx, cancel };
    accelerator.run_source(rect, resume, source, plotter, cancel)
}

/// Pixel colors from a calculator. Cycle detection restarts with every
/// scanned line, as a line's first pixel has no neighbor to learn from.
struct CalculatorPixels<'a, T: Scalar, C> {
    calc: &'a Calculator<T>,
    ctx: &'a mut NumericContext,
    cancel: &'a C,
}

impl<T: Scalar, C: CancellationChecker> PixelSource for CalculatorPixels<'_, T, C> {
    fn color(&mut self, x: u32, y: u32) -> Option<u32> {
        self.calc.pixel_color(x, y, self.ctx, self.cancel)
    }

    fn start_line(&mut self) {
        self.ctx.reset_periodicity();
    }
}
