use escapetime_core::{Bailout, BailoutTest, Complex, Fixed, NumericContext, OrbitState, Scalar};

/// Iterate z² + c from zero, reusing the squares cached by the bailout.
fn escape_step<T: Scalar>(c: (f64, f64), max: u32, ctx: &mut NumericContext) -> Option<u32> {
    let c = Complex::<T>::from_f64_pair(c.0, c.1, ctx);
    let bailout = Bailout::<T>::new(BailoutTest::Modulus, 4.0, ctx);
    let mut orbit: OrbitState<T> = OrbitState::start(Complex::zero(), ctx);
    for n in 1..=max {
        let z = orbit.old;
        orbit.new = Complex::new(
            orbit.sqr.re.sub(orbit.sqr.im).add(c.re),
            z.re.twice_product(z.im, ctx).add(c.im),
        );
        if bailout.escaped(&mut orbit, ctx) {
            return Some(n);
        }
    }
    None
}

#[test]
fn classic_orbit_escapes_on_same_step() {
    let mut float_ctx = NumericContext::float();
    let mut fixed_ctx = NumericContext::fixed(24);
    assert_eq!(escape_step::<f64>((-0.75, 0.1), 1000, &mut float_ctx), Some(33));
    assert_eq!(escape_step::<Fixed>((-0.75, 0.1), 1000, &mut fixed_ctx), Some(33));
}

#[test]
fn bounded_and_immediate_orbits_agree() {
    for c in [(-0.5, 0.0), (0.3, 0.5), (2.0, 0.0), (0.0, 2.5)] {
        let mut float_ctx = NumericContext::float();
        let mut fixed_ctx = NumericContext::fixed(24);
        assert_eq!(
            escape_step::<f64>(c, 500, &mut float_ctx),
            escape_step::<Fixed>(c, 500, &mut fixed_ctx),
            "c = {c:?}"
        );
    }
}

#[test]
fn squares_agree_within_resolution() {
    let mut float_ctx = NumericContext::float();
    let mut fixed_ctx = NumericContext::fixed(24);
    let tolerance = 16.0 / fixed_ctx.fudge();

    for (re, im) in [(0.1, 0.2), (-1.3, 0.7), (1.9, -1.9), (0.001, -3.0)] {
        let f = Complex::new(re, im).square(&mut float_ctx);
        let x = Complex::<Fixed>::from_f64_pair(re, im, &fixed_ctx).square(&mut fixed_ctx);
        let (xr, xi) = x.to_f64_pair(&fixed_ctx);
        assert!((f.re - xr).abs() < tolerance, "re of ({re}, {im})²");
        assert!((f.im - xi).abs() < tolerance, "im of ({re}, {im})²");
    }
    assert!(!fixed_ctx.overflowed());
}

#[test]
fn fixed_square_past_range_flags_overflow() {
    let mut ctx = NumericContext::fixed(24);
    let z = Complex::<Fixed>::from_f64_pair(20.0, 0.0, &ctx);
    let _ = z.square(&mut ctx);
    assert!(ctx.take_overflow());
}
