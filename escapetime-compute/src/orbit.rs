use crate::{CancellationChecker, OrbitFunction};
use escapetime_core::{Bailout, Complex, NumericContext, OrbitOutcome, OrbitState, Scalar};

/// Smallest save mask: the orbit is saved every fourth iteration at first.
const MIN_SAVE_MASK: u32 = 3;

/// Cycle detection settings for orbits caught in an attracting cycle.
///
/// The orbit value is saved every so often and each later value is compared
/// with it. Coming back within `tolerance` on both axes proves the orbit
/// bounded, so the rest of its budget is skipped. The save interval doubles
/// after every `saves_per_interval` saves, which lets long cycles fit
/// between two saves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Periodicity {
    /// Closeness on each axis, in plane units.
    pub tolerance: f64,
    pub saves_per_interval: u32,
}

impl Periodicity {
    /// Tolerance is `min_step` halved `check` times; a `check` of 0 turns
    /// detection off.
    pub fn new(check: u32, min_step: f64, max_iterations: u32) -> Option<Self> {
        if check == 0 {
            return None;
        }
        Some(Self {
            tolerance: min_step.abs() * 0.5_f64.powi(check.min(1074) as i32),
            saves_per_interval: max_iterations.max(1).ilog10().max(4),
        })
    }
}

/// Saved value and save cadence for one orbit.
struct CycleTracker<T> {
    tolerance: T,
    saved: Option<Complex<T>>,
    mask: u32,
    saves_left: u32,
    saves_per_interval: u32,
    from: u32,
}

impl<T: Scalar> CycleTracker<T> {
    fn new(settings: &Periodicity, ctx: &NumericContext) -> Self {
        Self {
            tolerance: T::from_f64(settings.tolerance, ctx),
            saved: None,
            mask: MIN_SAVE_MASK,
            saves_left: 1,
            saves_per_interval: settings.saves_per_interval,
            from: ctx.cycle_check_from().max(MIN_SAVE_MASK),
        }
    }

    /// True once `z`, the value after iteration `n`, repeats a saved value.
    fn closes_cycle(&mut self, n: u32, z: &Complex<T>) -> bool {
        if n <= self.from {
            return false;
        }
        if n & self.mask == 0 {
            self.saved = Some(*z);
            self.saves_left -= 1;
            if self.saves_left == 0 {
                self.mask = (self.mask << 1) | 1;
                self.saves_left = self.saves_per_interval;
            }
            return false;
        }
        self.saved.is_some_and(|saved| {
            z.re.sub(saved.re).abs() < self.tolerance && z.im.sub(saved.im).abs() < self.tolerance
        })
    }
}

/// Applies an orbit function until escape or the iteration budget runs out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitIterator {
    pub max_iterations: u32,
    /// Iterations between cancellation polls.
    pub poll_interval: u32,
    pub periodicity: Option<Periodicity>,
}

impl OrbitIterator {
    pub fn new(max_iterations: u32, poll_interval: u32) -> Self {
        Self {
            max_iterations,
            poll_interval: poll_interval.max(1),
            periodicity: None,
        }
    }

    pub fn with_periodicity(mut self, periodicity: Option<Periodicity>) -> Self {
        self.periodicity = periodicity;
        self
    }

    /// Iterate from `z0` with parameter `c`.
    ///
    /// Escape counts are 1-based: an orbit whose first step escapes reports
    /// one iteration. Cancellation is polled before every `poll_interval`-th
    /// step and leaves the orbit where it stopped.
    ///
    /// With periodicity on, a detected cycle ends the orbit as `Bounded`.
    /// Where the next orbit starts checking is left in `ctx`: just past this
    /// orbit's escape count, or right away after a bounded orbit.
    pub fn iterate<T, C>(
        &self,
        function: &dyn OrbitFunction<T>,
        z0: Complex<T>,
        c: &Complex<T>,
        bailout: &Bailout<T>,
        ctx: &mut NumericContext,
        cancel: &C,
    ) -> OrbitOutcome
    where
        T: Scalar,
        C: CancellationChecker,
    {
        ctx.clear_overflow();
        let mut orbit = OrbitState::start(z0, ctx);
        let mut cycles = self.periodicity.map(|p| CycleTracker::<T>::new(&p, ctx));
        for n in 1..=self.max_iterations {
            if n % self.poll_interval == 0 && cancel.is_cancelled() {
                return OrbitOutcome::Interrupted;
            }
            if function.step(&mut orbit, c, bailout, ctx) {
                if cycles.is_some() {
                    ctx.set_cycle_check_from(n.saturating_add(10));
                }
                return OrbitOutcome::Escaped { iterations: n };
            }
            if let Some(tracker) = cycles.as_mut() {
                if tracker.closes_cycle(n, &orbit.new) {
                    log::trace!("cycle closed after {n} iterations");
                    break;
                }
            }
        }
        if cycles.is_some() {
            ctx.set_cycle_check_from(0);
        }
        OrbitOutcome::Bounded
    }
}
