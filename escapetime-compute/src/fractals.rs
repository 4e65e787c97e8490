//! Per-fractal orbit functions.
//!
//! An orbit function knows two things: how a pixel and the fractal parameter
//! seed an orbit, and how one step turns the old value into the new one.
//! Every step ends by handing the new value to the bailout evaluator.

use escapetime_core::{Bailout, Complex, FractalKind, NumericContext, OrbitState, Scalar};

/// One escape-time iteration rule.
pub trait OrbitFunction<T: Scalar>: dyn_clone::DynClone {
    fn name(&self) -> &'static str;

    /// Starting value and c for a pixel at `pixel` on the plane.
    fn seed(&self, pixel: Complex<T>, param: Complex<T>) -> (Complex<T>, Complex<T>);

    /// Compute `orbit.new` from `orbit.old` and test it. Returns true on escape.
    ///
    /// `orbit.sqr` holds the squared components of `orbit.old` on entry.
    fn step(
        &self,
        orbit: &mut OrbitState<T>,
        c: &Complex<T>,
        bailout: &Bailout<T>,
        ctx: &mut NumericContext,
    ) -> bool;
}

dyn_clone::clone_trait_object!(<T> OrbitFunction<T> where T: Scalar);

/// Which plane a pixel lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Seeding {
    /// Pixel is c, the parameter is the starting value (Mandelbrot style).
    ParameterPlane,
    /// Pixel is the starting value, the parameter is c (Julia style).
    DynamicalPlane,
}

impl Seeding {
    #[inline]
    fn seed<T: Scalar>(self, pixel: Complex<T>, param: Complex<T>) -> (Complex<T>, Complex<T>) {
        match self {
            Seeding::ParameterPlane => (param, pixel),
            Seeding::DynamicalPlane => (pixel, param),
        }
    }
}

/// z² + c
#[derive(Clone, Copy, Debug)]
pub struct Quadratic {
    pub seeding: Seeding,
}

impl<T: Scalar> OrbitFunction<T> for Quadratic {
    fn name(&self) -> &'static str {
        match self.seeding {
            Seeding::ParameterPlane => "mandelbrot",
            Seeding::DynamicalPlane => "julia",
        }
    }

    fn seed(&self, pixel: Complex<T>, param: Complex<T>) -> (Complex<T>, Complex<T>) {
        self.seeding.seed(pixel, param)
    }

    #[inline]
    fn step(
        &self,
        orbit: &mut OrbitState<T>,
        c: &Complex<T>,
        bailout: &Bailout<T>,
        ctx: &mut NumericContext,
    ) -> bool {
        let old = orbit.old;
        orbit.new = Complex::new(
            orbit.sqr.re.sub(orbit.sqr.im).add(c.re),
            old.re.twice_product(old.im, ctx).add(c.im),
        );
        bailout.escaped(orbit, ctx)
    }
}

/// λ·z·(1 − z), with λ in c.
#[derive(Clone, Copy, Debug, Default)]
pub struct Lambda;

impl<T: Scalar> OrbitFunction<T> for Lambda {
    fn name(&self) -> &'static str {
        "lambda"
    }

    fn seed(&self, pixel: Complex<T>, param: Complex<T>) -> (Complex<T>, Complex<T>) {
        (pixel, param)
    }

    fn step(
        &self,
        orbit: &mut OrbitState<T>,
        c: &Complex<T>,
        bailout: &Bailout<T>,
        ctx: &mut NumericContext,
    ) -> bool {
        let old = orbit.old;
        // z - z²
        let t = Complex::new(
            old.re.sub(orbit.sqr.re).add(orbit.sqr.im),
            old.im.sub(old.re.twice_product(old.im, ctx)),
        );
        orbit.new = c.mul(&t, ctx);
        bailout.escaped(orbit, ctx)
    }
}

/// zⁿ + c for an integer n.
#[derive(Clone, Copy, Debug)]
pub struct IntegerPower {
    pub power: u32,
    pub seeding: Seeding,
}

impl<T: Scalar> OrbitFunction<T> for IntegerPower {
    fn name(&self) -> &'static str {
        match self.seeding {
            Seeding::ParameterPlane => "mandelbrot_power",
            Seeding::DynamicalPlane => "julia_power",
        }
    }

    fn seed(&self, pixel: Complex<T>, param: Complex<T>) -> (Complex<T>, Complex<T>) {
        self.seeding.seed(pixel, param)
    }

    fn step(
        &self,
        orbit: &mut OrbitState<T>,
        c: &Complex<T>,
        bailout: &Bailout<T>,
        ctx: &mut NumericContext,
    ) -> bool {
        orbit.new = orbit.old.powi(self.power, ctx).add(c);
        bailout.escaped(orbit, ctx)
    }
}

/// Build the orbit function for a configured fractal kind.
pub fn create_orbit_function<T: Scalar>(kind: FractalKind) -> Box<dyn OrbitFunction<T>> {
    match kind {
        FractalKind::Mandelbrot => Box::new(Quadratic {
            seeding: Seeding::ParameterPlane,
        }),
        FractalKind::Julia => Box::new(Quadratic {
            seeding: Seeding::DynamicalPlane,
        }),
        FractalKind::Lambda => Box::new(Lambda),
        FractalKind::MandelbrotPower { power } => Box::new(IntegerPower {
            power,
            seeding: Seeding::ParameterPlane,
        }),
        FractalKind::JuliaPower { power } => Box::new(IntegerPower {
            power,
            seeding: Seeding::DynamicalPlane,
        }),
    }
}
