//! Scaled-integer fixed-point scalar.
//!
//! A [`Fixed`] is a raw `i32` whose implied binary point sits `bit_shift`
//! bits from the right. The shift is not stored in the value; it lives in the
//! [`NumericContext`] of the calculation, so every value of one image shares
//! it.
//!
//! Products and quotients are formed in 64 bits and narrowed back. A result
//! outside the i32 range saturates and raises the context overflow flag.
//! Sums wrap silently.

use crate::{NumericContext, Scalar};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fixed(pub i32);

impl Fixed {
    pub const MAX: Self = Fixed(i32::MAX);
    pub const MIN: Self = Fixed(i32::MIN);

    /// Narrow a 64-bit intermediate, flagging values outside i32.
    #[inline]
    fn narrow(wide: i64, ctx: &mut NumericContext) -> Self {
        if wide > i32::MAX as i64 {
            ctx.flag_overflow();
            Self::MAX
        } else if wide < i32::MIN as i64 {
            ctx.flag_overflow();
            Self::MIN
        } else {
            Fixed(wide as i32)
        }
    }

    #[inline]
    fn saturate(value: f64) -> i32 {
        if value.is_nan() {
            0
        } else if value >= i32::MAX as f64 {
            i32::MAX
        } else if value <= i32::MIN as f64 {
            i32::MIN
        } else {
            value as i32
        }
    }
}

impl Scalar for Fixed {
    const ARITHMETIC_NAME: &'static str = "fixed";

    #[inline]
    fn zero() -> Self {
        Fixed(0)
    }

    #[inline]
    fn from_f64(value: f64, ctx: &NumericContext) -> Self {
        Fixed(Self::saturate(libm::ldexp(value, ctx.bit_shift() as i32)))
    }

    #[inline]
    fn to_f64(self, ctx: &NumericContext) -> f64 {
        libm::ldexp(self.0 as f64, -(ctx.bit_shift() as i32))
    }

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Fixed(self.0.wrapping_add(rhs.0))
    }

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Fixed(self.0.wrapping_sub(rhs.0))
    }

    #[inline]
    fn neg(self) -> Self {
        Fixed(self.0.wrapping_neg())
    }

    #[inline]
    fn abs(self) -> Self {
        Fixed(self.0.wrapping_abs())
    }

    #[inline]
    fn mul(self, rhs: Self, ctx: &mut NumericContext) -> Self {
        let wide = (self.0 as i64 * rhs.0 as i64) >> ctx.bit_shift();
        Self::narrow(wide, ctx)
    }

    #[inline]
    fn div(self, rhs: Self, ctx: &mut NumericContext) -> Self {
        if rhs.0 == 0 {
            ctx.flag_overflow();
            return if self.0 < 0 { Self::MIN } else { Self::MAX };
        }
        let wide = ((self.0 as i64) << ctx.bit_shift()) / rhs.0 as i64;
        Self::narrow(wide, ctx)
    }

    #[inline]
    fn twice_product(self, rhs: Self, ctx: &mut NumericContext) -> Self {
        let wide = (self.0 as i64 * rhs.0 as i64) >> (ctx.bit_shift() - 1);
        Self::narrow(wide, ctx)
    }

    #[inline]
    fn mul_int(self, k: i32, ctx: &mut NumericContext) -> Self {
        Self::narrow(self.0 as i64 * k as i64, ctx)
    }

    #[inline]
    fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[inline]
    fn is_finite(self) -> bool {
        true
    }

    fn limit_from_f64(value: f64, ctx: &NumericContext) -> Self {
        let scaled = libm::ldexp(value, ctx.bit_shift() as i32);
        if scaled.is_nan() || scaled <= 0.0 || scaled >= i32::MAX as f64 {
            Self::MAX
        } else {
            Fixed(scaled as i32)
        }
    }
}
