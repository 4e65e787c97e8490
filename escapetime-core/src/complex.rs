//! Complex number over either scalar representation.

use crate::{NumericContext, Scalar};
use serde::{Deserialize, Serialize};

/// Complex number with [`Scalar`] components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Complex<T> {
    pub re: T,
    pub im: T,
}

impl<T: Scalar> Complex<T> {
    #[inline]
    pub fn new(re: T, im: T) -> Self {
        Self { re, im }
    }

    #[inline]
    pub fn zero() -> Self {
        Self {
            re: T::zero(),
            im: T::zero(),
        }
    }

    #[inline]
    pub fn from_f64_pair(re: f64, im: f64, ctx: &NumericContext) -> Self {
        Self {
            re: T::from_f64(re, ctx),
            im: T::from_f64(im, ctx),
        }
    }

    #[inline]
    pub fn to_f64_pair(&self, ctx: &NumericContext) -> (f64, f64) {
        (self.re.to_f64(ctx), self.im.to_f64(ctx))
    }

    #[inline]
    pub fn add(&self, other: &Self) -> Self {
        Self {
            re: self.re.add(other.re),
            im: self.im.add(other.im),
        }
    }

    #[inline]
    pub fn sub(&self, other: &Self) -> Self {
        Self {
            re: self.re.sub(other.re),
            im: self.im.sub(other.im),
        }
    }

    /// (a + bi)(c + di) = (ac - bd) + (ad + bc)i
    #[inline]
    pub fn mul(&self, other: &Self, ctx: &mut NumericContext) -> Self {
        let ac = self.re.mul(other.re, ctx);
        let bd = self.im.mul(other.im, ctx);
        let ad = self.re.mul(other.im, ctx);
        let bc = self.im.mul(other.re, ctx);
        Self {
            re: ac.sub(bd),
            im: ad.add(bc),
        }
    }

    /// (a + bi)² = (a² - b²) + 2abi
    #[inline]
    pub fn square(&self, ctx: &mut NumericContext) -> Self {
        let re_sq = self.re.sqr(ctx);
        let im_sq = self.im.sqr(ctx);
        Self {
            re: re_sq.sub(im_sq),
            im: self.re.twice_product(self.im, ctx),
        }
    }

    /// Complex quotient. A zero divisor flags overflow on fixed-point values
    /// and yields non-finite components on floats; bailout tests catch both.
    pub fn div(&self, other: &Self, ctx: &mut NumericContext) -> Self {
        let denom = other.norm_sq(ctx);
        let re_num = self
            .re
            .mul(other.re, ctx)
            .add(self.im.mul(other.im, ctx));
        let im_num = self
            .im
            .mul(other.re, ctx)
            .sub(self.re.mul(other.im, ctx));
        Self {
            re: re_num.div(denom, ctx),
            im: im_num.div(denom, ctx),
        }
    }

    /// Squared magnitude: |z|² = re² + im²
    #[inline]
    pub fn norm_sq(&self, ctx: &mut NumericContext) -> T {
        self.re.sqr(ctx).add(self.im.sqr(ctx))
    }

    #[inline]
    pub fn mul_int(&self, k: i32, ctx: &mut NumericContext) -> Self {
        Self {
            re: self.re.mul_int(k, ctx),
            im: self.im.mul_int(k, ctx),
        }
    }

    /// Integer power by repeated multiplication. `power` 0 yields the input.
    pub fn powi(&self, power: u32, ctx: &mut NumericContext) -> Self {
        let mut result = *self;
        for _ in 1..power {
            result = result.mul(self, ctx);
        }
        result
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.re.is_finite() && self.im.is_finite()
    }
}
