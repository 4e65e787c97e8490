//! Divergence ("bailout") tests and the orbit state they inspect.

use crate::{Complex, NumericContext, Scalar};
use serde::{Deserialize, Serialize};

/// Magnitude metric used to decide that an orbit has escaped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BailoutTest {
    /// re² + im² against the limit, plus per-axis and overflow guards.
    #[default]
    Modulus,
    /// re² alone.
    Real,
    /// im² alone.
    Imaginary,
    /// Either squared component.
    Or,
    /// Both squared components.
    And,
    /// (|re| + |im|)².
    Manhattan,
    /// (re + im)², without absolute values.
    ///
    /// The signed sum lets opposite-sign components cancel, so orbits near
    /// the line re = -im survive longer than under
    /// [`BailoutTest::Manhattan`] and the escape bands bend along it.
    ManhattanR,
}

impl BailoutTest {
    pub const ALL: [BailoutTest; 7] = [
        BailoutTest::Modulus,
        BailoutTest::Real,
        BailoutTest::Imaginary,
        BailoutTest::Or,
        BailoutTest::And,
        BailoutTest::Manhattan,
        BailoutTest::ManhattanR,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BailoutTest::Modulus => "mod",
            BailoutTest::Real => "real",
            BailoutTest::Imaginary => "imag",
            BailoutTest::Or => "or",
            BailoutTest::And => "and",
            BailoutTest::Manhattan => "manh",
            BailoutTest::ManhattanR => "manr",
        }
    }
}

/// Per-pixel orbit state.
///
/// `sqr` caches re² and im² of the most recent value. Orbit functions read it
/// for the next step (the classic z² + c reuses the squares computed by the
/// bailout test), and the bailout test refreshes it every iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OrbitState<T> {
    /// Value the next step starts from.
    pub old: Complex<T>,
    /// Value produced by the current step.
    pub new: Complex<T>,
    /// (re², im²) of the last value squared.
    pub sqr: Complex<T>,
}

impl<T: Scalar> OrbitState<T> {
    /// Reset for a new pixel starting at `z0`.
    pub fn start(z0: Complex<T>, ctx: &mut NumericContext) -> Self {
        Self {
            old: z0,
            new: z0,
            sqr: Complex::new(z0.re.sqr(ctx), z0.im.sqr(ctx)),
        }
    }
}

/// A bailout test bound to its limits, encoded in the image representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bailout<T> {
    pub test: BailoutTest,
    /// Magnitude limit compared against squared quantities.
    pub limit: T,
    /// Per-axis guard, sqrt(limit), used by the modulus test.
    pub axis_limit: T,
}

impl<T: Scalar> Bailout<T> {
    pub fn new(test: BailoutTest, limit: f64, ctx: &NumericContext) -> Self {
        Self {
            test,
            limit: T::limit_from_f64(limit, ctx),
            axis_limit: T::limit_from_f64(limit.sqrt(), ctx),
        }
    }

    /// Test `orbit.new`.
    ///
    /// On escape the pending overflow flag is cleared and `true` returned. On
    /// non-escape `orbit.old` advances to `orbit.new`. Either way `orbit.sqr`
    /// holds the fresh squared components.
    pub fn escaped(&self, orbit: &mut OrbitState<T>, ctx: &mut NumericContext) -> bool {
        let z = orbit.new;
        let sx = z.re.sqr(ctx);
        let sy = z.im.sqr(ctx);
        orbit.sqr = Complex::new(sx, sy);

        let finite = z.is_finite() && sx.is_finite() && sy.is_finite();
        let escaped = !finite
            || ctx.overflowed()
            || match self.test {
                BailoutTest::Modulus => {
                    let magnitude = sx.add(sy);
                    magnitude >= self.limit
                        || magnitude.is_negative()
                        || z.re.abs() > self.axis_limit
                        || z.im.abs() > self.axis_limit
                }
                BailoutTest::Real => sx >= self.limit,
                BailoutTest::Imaginary => sy >= self.limit,
                BailoutTest::Or => sx >= self.limit || sy >= self.limit,
                BailoutTest::And => sx >= self.limit && sy >= self.limit,
                BailoutTest::Manhattan => {
                    let m = z.re.abs().add(z.im.abs());
                    self.squared_metric_escapes(m, ctx)
                }
                BailoutTest::ManhattanR => {
                    let m = z.re.add(z.im);
                    self.squared_metric_escapes(m, ctx)
                }
            };

        if escaped {
            ctx.clear_overflow();
            return true;
        }
        orbit.old = orbit.new;
        false
    }

    /// m² >= limit. A square that overflows, or a wrapped sum, counts as
    /// escaped.
    #[inline]
    fn squared_metric_escapes(&self, m: T, ctx: &mut NumericContext) -> bool {
        let m_sq = m.sqr(ctx);
        ctx.overflowed() || !m_sq.is_finite() || m_sq.is_negative() || m_sq >= self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Fixed;

    fn float_orbit(re: f64, im: f64) -> OrbitState<f64> {
        let z = Complex::new(re, im);
        OrbitState {
            old: Complex::zero(),
            new: z,
            sqr: Complex::zero(),
        }
    }

    fn escapes(test: BailoutTest, limit: f64, re: f64, im: f64) -> bool {
        let mut ctx = NumericContext::float();
        let bailout = Bailout::<f64>::new(test, limit, &ctx);
        let mut orbit = float_orbit(re, im);
        bailout.escaped(&mut orbit, &mut ctx)
    }

    #[test]
    fn and_requires_both_components() {
        assert!(escapes(BailoutTest::And, 4.0, 3.0, 3.0));
        assert!(!escapes(BailoutTest::And, 4.0, 5.0, 1.0));
        // squares of 3 on each axis stay below the limit
        let r3 = 3.0_f64.sqrt();
        assert!(!escapes(BailoutTest::And, 4.0, r3, r3));
    }

    #[test]
    fn or_needs_either_component() {
        assert!(escapes(BailoutTest::Or, 4.0, 5.0_f64.sqrt(), 1.0));
        assert!(escapes(BailoutTest::Or, 4.0, 0.0, -2.1));
        assert!(!escapes(BailoutTest::Or, 4.0, 1.9, 1.9));
    }

    #[test]
    fn real_and_imaginary_look_at_one_axis() {
        assert!(escapes(BailoutTest::Real, 4.0, 2.0, 0.0));
        assert!(!escapes(BailoutTest::Real, 4.0, 0.0, 100.0));
        assert!(escapes(BailoutTest::Imaginary, 4.0, 0.0, -2.0));
        assert!(!escapes(BailoutTest::Imaginary, 4.0, 100.0, 0.0));
    }

    #[test]
    fn modulus_uses_sum_of_squares() {
        assert!(escapes(BailoutTest::Modulus, 4.0, 1.5, 1.5));
        assert!(!escapes(BailoutTest::Modulus, 4.0, 1.0, 1.0));
        // limit is inclusive
        assert!(escapes(BailoutTest::Modulus, 4.0, 2.0, 0.0));
    }

    #[test]
    fn manhattan_and_manhattan_r_differ_on_opposite_signs() {
        // |1.5| + |-1.5| = 3 -> 9 >= 4, but (1.5 - 1.5)² = 0
        assert!(escapes(BailoutTest::Manhattan, 4.0, 1.5, -1.5));
        assert!(!escapes(BailoutTest::ManhattanR, 4.0, 1.5, -1.5));
        // Same sign: both metrics agree
        assert!(escapes(BailoutTest::Manhattan, 4.0, 1.0, 1.0));
        assert!(escapes(BailoutTest::ManhattanR, 4.0, 1.0, 1.0));
        assert!(!escapes(BailoutTest::ManhattanR, 4.0, -0.9, -0.9));
    }

    #[test]
    fn nan_and_infinity_always_escape() {
        for test in BailoutTest::ALL {
            assert!(escapes(test, 4.0, f64::NAN, 0.0), "{}", test.name());
            assert!(escapes(test, 4.0, 0.0, f64::INFINITY), "{}", test.name());
        }
    }

    #[test]
    fn non_escape_advances_old_value() {
        let mut ctx = NumericContext::float();
        let bailout = Bailout::<f64>::new(BailoutTest::Modulus, 4.0, &ctx);
        let mut orbit = float_orbit(0.5, -0.25);
        assert!(!bailout.escaped(&mut orbit, &mut ctx));
        assert_eq!(orbit.old, Complex::new(0.5, -0.25));
        assert_eq!(orbit.sqr, Complex::new(0.25, 0.0625));
    }

    #[test]
    fn escape_leaves_old_value_untouched() {
        let mut ctx = NumericContext::float();
        let bailout = Bailout::<f64>::new(BailoutTest::Modulus, 4.0, &ctx);
        let mut orbit = float_orbit(3.0, 0.0);
        assert!(bailout.escaped(&mut orbit, &mut ctx));
        assert_eq!(orbit.old, Complex::zero());
    }

    #[test]
    fn fixed_overflow_escapes_and_is_cleared() {
        let mut ctx = NumericContext::fixed(24);
        let bailout = Bailout::<Fixed>::new(BailoutTest::Real, 4.0, &ctx);
        let mut orbit = OrbitState {
            old: Complex::zero(),
            new: Complex::from_f64_pair(0.1, 0.1, &ctx),
            sqr: Complex::zero(),
        };
        ctx.flag_overflow();
        assert!(bailout.escaped(&mut orbit, &mut ctx));
        assert!(!ctx.overflowed());
    }

    #[test]
    fn fixed_modulus_catches_wrapped_sum() {
        // At shift 29 a limit of 4 is not representable and becomes i32::MAX;
        // the wrapped (negative) sum of squares is what triggers the escape.
        let mut ctx = NumericContext::fixed(29);
        let bailout = Bailout::<Fixed>::new(BailoutTest::Modulus, 4.0, &ctx);
        assert_eq!(bailout.limit, Fixed::MAX);
        let mut orbit = OrbitState {
            old: Complex::zero(),
            new: Complex::from_f64_pair(1.5, 1.5, &ctx),
            sqr: Complex::zero(),
        };
        assert!(bailout.escaped(&mut orbit, &mut ctx));

        let mut inside = OrbitState {
            old: Complex::zero(),
            new: Complex::from_f64_pair(1.0, 0.9, &ctx),
            sqr: Complex::zero(),
        };
        assert!(!bailout.escaped(&mut inside, &mut ctx));
    }

    #[test]
    fn fixed_and_float_agree_on_every_test() {
        let samples = [(0.3, 0.4), (1.2, -1.9), (-2.2, 0.1), (1.9, 1.9), (-1.0, -1.5)];
        for test in BailoutTest::ALL {
            for (re, im) in samples {
                let mut fctx = NumericContext::fixed(24);
                let fixed = Bailout::<Fixed>::new(test, 4.0, &fctx);
                let mut orbit = OrbitState {
                    old: Complex::zero(),
                    new: Complex::from_f64_pair(re, im, &fctx),
                    sqr: Complex::zero(),
                };
                assert_eq!(
                    fixed.escaped(&mut orbit, &mut fctx),
                    escapes(test, 4.0, re, im),
                    "{} at ({re}, {im})",
                    test.name()
                );
            }
        }
    }
}
