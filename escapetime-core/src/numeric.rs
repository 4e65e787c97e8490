//! Scalar abstraction shared by the fixed-point and floating-point paths.
//!
//! Every orbit function, bailout test and projection is written once against
//! [`Scalar`]. The representation is chosen per image when the engine is
//! configured, so the iteration loops monomorphize into one `f64` version and
//! one [`Fixed`](crate::Fixed) version with no runtime dispatch per operation.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Numeric representation used for one image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Arithmetic {
    /// IEEE double precision.
    #[default]
    Float,
    /// Scaled 32-bit integers with `bit_shift` fractional bits.
    Fixed { bit_shift: u32 },
}

/// Per-calculation numeric state.
///
/// Holds the implied binary point for fixed-point values, the overflow
/// flag raised by fixed-point multiply/divide and the iteration from which
/// the next orbit starts looking for cycles. One context belongs to exactly
/// one in-flight calculation and is passed by `&mut` through the orbit
/// iterator, the orbit functions and the bailout evaluator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NumericContext {
    bit_shift: u32,
    overflow: bool,
    cycle_check_from: u32,
}

impl NumericContext {
    /// Cycle check start for the first pixel of a scan line.
    pub const LINE_START_CYCLE_CHECK: u32 = 255;

    /// Context for floating-point work. The bit shift is unused.
    pub fn float() -> Self {
        Self::fixed(0)
    }

    /// Context for fixed-point work with `bit_shift` fractional bits.
    pub fn fixed(bit_shift: u32) -> Self {
        Self {
            bit_shift,
            overflow: false,
            cycle_check_from: 0,
        }
    }

    pub fn for_arithmetic(arithmetic: Arithmetic) -> Self {
        match arithmetic {
            Arithmetic::Float => Self::float(),
            Arithmetic::Fixed { bit_shift } => Self::fixed(bit_shift),
        }
    }

    #[inline]
    pub fn bit_shift(&self) -> u32 {
        self.bit_shift
    }

    /// Scale factor between a real value and its fixed-point encoding.
    #[inline]
    pub fn fudge(&self) -> f64 {
        libm::ldexp(1.0, self.bit_shift as i32)
    }

    /// Raise the overflow flag. Called by fixed-point operations only.
    #[inline]
    pub fn flag_overflow(&mut self) {
        self.overflow = true;
    }

    #[inline]
    pub fn overflowed(&self) -> bool {
        self.overflow
    }

    #[inline]
    pub fn clear_overflow(&mut self) {
        self.overflow = false;
    }

    /// Return the flag and clear it.
    #[inline]
    pub fn take_overflow(&mut self) -> bool {
        std::mem::take(&mut self.overflow)
    }

    /// Iterations the next orbit runs before it looks for a cycle.
    ///
    /// Carried from pixel to pixel: neighbors of an escaping pixel tend to
    /// escape at a similar count, so checking starts just past it.
    #[inline]
    pub fn cycle_check_from(&self) -> u32 {
        self.cycle_check_from
    }

    #[inline]
    pub fn set_cycle_check_from(&mut self, iterations: u32) {
        self.cycle_check_from = iterations;
    }

    /// Start a new scan line. The first pixel of a line has no useful
    /// neighbor, so its cycle check starts late.
    #[inline]
    pub fn reset_periodicity(&mut self) {
        self.cycle_check_from = Self::LINE_START_CYCLE_CHECK;
    }
}

/// A real number in one of the two image representations.
///
/// Addition and subtraction never flag: on fixed-point values they wrap, and
/// the bailout tests detect the wrap through a negative magnitude.
/// Multiplication and division flag overflow in the context instead of
/// wrapping; callers treat a raised flag as an immediate bailout.
pub trait Scalar: Copy + Debug + Default + PartialEq + PartialOrd + 'static {
    /// Which representation this type implements.
    const ARITHMETIC_NAME: &'static str;

    fn zero() -> Self;

    /// Encode a real value. Fixed-point values saturate at the i32 range.
    fn from_f64(value: f64, ctx: &NumericContext) -> Self;

    fn to_f64(self, ctx: &NumericContext) -> f64;

    fn add(self, rhs: Self) -> Self;

    fn sub(self, rhs: Self) -> Self;

    fn neg(self) -> Self;

    fn abs(self) -> Self;

    fn mul(self, rhs: Self, ctx: &mut NumericContext) -> Self;

    fn div(self, rhs: Self, ctx: &mut NumericContext) -> Self;

    #[inline]
    fn sqr(self, ctx: &mut NumericContext) -> Self {
        self.mul(self, ctx)
    }

    /// `2 * self * rhs`, computed so the doubling cannot overflow separately.
    #[inline]
    fn twice_product(self, rhs: Self, ctx: &mut NumericContext) -> Self {
        let p = self.mul(rhs, ctx);
        p.add(p)
    }

    /// Multiply by a small integer (slice index, step count).
    fn mul_int(self, k: i32, ctx: &mut NumericContext) -> Self;

    fn is_negative(self) -> bool;

    /// False for NaN and infinities. Always true for fixed-point values.
    fn is_finite(self) -> bool;

    /// Encode a magnitude limit. A limit that cannot be represented becomes
    /// the largest representable value.
    fn limit_from_f64(value: f64, ctx: &NumericContext) -> Self;
}

impl Scalar for f64 {
    const ARITHMETIC_NAME: &'static str = "float";

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn from_f64(value: f64, _ctx: &NumericContext) -> Self {
        value
    }

    #[inline]
    fn to_f64(self, _ctx: &NumericContext) -> f64 {
        self
    }

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self + rhs
    }

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self - rhs
    }

    #[inline]
    fn neg(self) -> Self {
        -self
    }

    #[inline]
    fn abs(self) -> Self {
        f64::abs(self)
    }

    #[inline]
    fn mul(self, rhs: Self, _ctx: &mut NumericContext) -> Self {
        self * rhs
    }

    #[inline]
    fn div(self, rhs: Self, _ctx: &mut NumericContext) -> Self {
        self / rhs
    }

    #[inline]
    fn twice_product(self, rhs: Self, _ctx: &mut NumericContext) -> Self {
        2.0 * self * rhs
    }

    #[inline]
    fn mul_int(self, k: i32, _ctx: &mut NumericContext) -> Self {
        self * k as f64
    }

    #[inline]
    fn is_negative(self) -> bool {
        self < 0.0
    }

    #[inline]
    fn is_finite(self) -> bool {
        f64::is_finite(self)
    }

    #[inline]
    fn limit_from_f64(value: f64, _ctx: &NumericContext) -> Self {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_overflow_clears_flag() {
        let mut ctx = NumericContext::fixed(24);
        assert!(!ctx.overflowed());
        ctx.flag_overflow();
        assert!(ctx.take_overflow());
        assert!(!ctx.overflowed());
        assert!(!ctx.take_overflow());
    }

    #[test]
    fn context_matches_arithmetic() {
        let ctx = NumericContext::for_arithmetic(Arithmetic::Fixed { bit_shift: 16 });
        assert_eq!(ctx.bit_shift(), 16);
        assert_eq!(ctx.fudge(), 65536.0);
        assert_eq!(NumericContext::for_arithmetic(Arithmetic::Float).bit_shift(), 0);
    }

    #[test]
    fn line_start_delays_cycle_check() {
        let mut ctx = NumericContext::float();
        assert_eq!(ctx.cycle_check_from(), 0);
        ctx.set_cycle_check_from(42);
        ctx.reset_periodicity();
        assert_eq!(ctx.cycle_check_from(), 255);
    }

    #[test]
    fn float_ops_never_flag() {
        let mut ctx = NumericContext::float();
        let big = f64::MAX.mul(f64::MAX, &mut ctx);
        assert!(!Scalar::is_finite(big));
        let _ = 1.0_f64.div(0.0, &mut ctx);
        assert!(!ctx.overflowed());
    }

    #[test]
    fn arithmetic_serializes_with_tag() {
        let json = serde_json::to_string(&Arithmetic::Fixed { bit_shift: 29 }).unwrap();
        assert_eq!(json, r#"{"kind":"fixed","bit_shift":29}"#);
        let back: Arithmetic = serde_json::from_str(r#"{"kind":"float"}"#).unwrap();
        assert_eq!(back, Arithmetic::Float);
    }
}
