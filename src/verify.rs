//! Numerical self-checks for plans.
//!
//! Errors are relative L∞ errors in `f64`: the largest absolute difference
//! divided by the largest elementwise `min(|a|, |b|)`. Two vectors that
//! are both within `1e-14` of zero compare as exact.

use std::f64::consts::PI;

use num_complex::Complex;

use crate::plan::half_len;
use crate::{FftScalar, NdRealPlan};

const NEGLIGIBLE: f64 = 1e-14;

#[inline]
fn widen<T: FftScalar>(x: T) -> f64 {
    x.to_f64().unwrap_or(f64::NAN)
}

#[inline]
fn narrow<T: FftScalar>(x: f64) -> T {
    num_traits::cast(x).unwrap_or_else(T::nan)
}

fn linf_error(pairs: impl Iterator<Item = (f64, f64)>) -> f64 {
    let (mut err, mut mag) = (0.0f64, 0.0f64);
    for (a, b) in pairs {
        err = err.max((a - b).abs());
        mag = mag.max(a.abs().min(b.abs()));
    }
    if mag < NEGLIGIBLE && err < NEGLIGIBLE {
        0.0
    } else {
        err / mag
    }
}

/// Relative L∞ error between two real vectors. Empty input gives zero.
///
/// # Panics
/// If the lengths differ.
pub fn relative_linf_error<T: FftScalar>(a: &[T], b: &[T]) -> f64 {
    assert_eq!(a.len(), b.len(), "compared vectors differ in length");
    linf_error(a.iter().zip(b).map(|(&x, &y)| (widen(x), widen(y))))
}

/// Relative L∞ error between two complex vectors, taken over the real and
/// imaginary components.
pub fn complex_relative_linf_error<T: FftScalar>(a: &[Complex<T>], b: &[Complex<T>]) -> f64 {
    assert_eq!(a.len(), b.len(), "compared vectors differ in length");
    linf_error(
        a.iter()
            .zip(b)
            .flat_map(|(x, y)| [(widen(x.re), widen(y.re)), (widen(x.im), widen(y.im))]),
    )
}

/// Compare `F(alpha x + beta y)` with `alpha F(x) + beta F(y)` for a forward
/// plan.
pub fn linearity_error<T: FftScalar>(
    plan: &mut NdRealPlan<T>,
    x: &[T],
    y: &[T],
    alpha: T,
    beta: T,
) -> f64 {
    let out_len = plan.output_len();
    let mut fx = vec![Complex::default(); out_len];
    let mut fy = vec![Complex::default(); out_len];
    let mut fxy = vec![Complex::default(); out_len];

    let mixed: Vec<T> = x.iter().zip(y).map(|(&a, &b)| alpha * a + beta * b).collect();
    plan.forward(x, &mut fx);
    plan.forward(y, &mut fy);
    plan.forward(&mixed, &mut fxy);

    let combined: Vec<Complex<T>> = fx
        .iter()
        .zip(&fy)
        .map(|(&a, &b)| a * alpha + b * beta)
        .collect();
    complex_relative_linf_error(&fxy, &combined)
}

/// Transform a unit impulse at the origin with a forward plan; every bin
/// should come out as `1 + 0i`.
pub fn impulse_error<T: FftScalar>(plan: &mut NdRealPlan<T>) -> f64 {
    let mut input = vec![T::zero(); plan.input_len()];
    input[0] = T::one();
    let mut output = vec![Complex::default(); plan.output_len()];
    plan.forward(&input, &mut output);
    let ones = vec![Complex::new(T::one(), T::zero()); output.len()];
    complex_relative_linf_error(&output, &ones)
}

/// Transform a unit impulse `a` at the origin and a second input `b`, and
/// check both `F(a) == 1` everywhere and `F(b) + F(a - b) == F(a)`.
///
/// Returns the larger of the two errors.
pub fn impulse_decomposition_error<T: FftScalar>(plan: &mut NdRealPlan<T>, b: &[T]) -> f64 {
    let out_len = plan.output_len();
    let mut a = vec![T::zero(); plan.input_len()];
    a[0] = T::one();
    let rest: Vec<T> = a.iter().zip(b).map(|(&x, &y)| x - y).collect();

    let mut fa = vec![Complex::default(); out_len];
    let mut fb = vec![Complex::default(); out_len];
    let mut frest = vec![Complex::default(); out_len];
    plan.forward(&a, &mut fa);
    plan.forward(b, &mut fb);
    plan.forward(&rest, &mut frest);

    let ones = vec![Complex::new(T::one(), T::zero()); out_len];
    let summed: Vec<Complex<T>> = fb.iter().zip(&frest).map(|(&x, &y)| x + y).collect();
    complex_relative_linf_error(&fa, &ones).max(complex_relative_linf_error(&summed, &fa))
}

/// Cyclically roll a row-major array by `k` positions along `axis`:
/// element `c` of that axis moves to `(c + k) mod n`.
pub(crate) fn roll_axis<T: Copy>(x: &[T], extents: &[usize], axis: usize, k: usize) -> Vec<T> {
    let n = extents[axis];
    let stride: usize = extents[axis + 1..].iter().product();
    let mut rolled = x.to_vec();
    for (i, &v) in x.iter().enumerate() {
        let c = (i / stride) % n;
        let dest = i - c * stride + ((c + k) % n) * stride;
        rolled[dest] = v;
    }
    rolled
}

/// Predicted spectrum of an input rolled by `k` along `axis`, given the
/// spectrum `plain` of the unrolled input: bin `κ` of that axis picks up
/// `exp(-2πi k κ / n)`.
pub(crate) fn shifted_spectrum<T: FftScalar>(
    plain: &[Complex<T>],
    extents: &[usize],
    axis: usize,
    k: usize,
) -> Vec<Complex<T>> {
    let n = extents[axis];
    let mut shape = extents.to_vec();
    if let Some(last) = shape.last_mut() {
        *last = half_len(*last);
    }
    let bins = shape[axis];
    let stride: usize = shape[axis + 1..].iter().product();
    plain
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let kappa = (i / stride) % bins;
            let turns = ((k % n) * kappa % n) as f64 / n as f64;
            let (im, re) = (-2.0 * PI * turns).sin_cos();
            c * Complex::new(narrow(re), narrow(im))
        })
        .collect()
}

/// Check the shift theorem along one axis of a forward plan.
///
/// Rolling `x` by `k` along `axis` must multiply bin `κ` of that axis by
/// `exp(-2πi k κ / n)`. Unlike an impulse or a linear combination, this
/// tells the axes apart, so a mix-up in axis order shows up here.
pub fn shift_error<T: FftScalar>(plan: &mut NdRealPlan<T>, x: &[T], axis: usize, k: usize) -> f64 {
    let mut plain = vec![Complex::default(); plan.output_len()];
    let mut shifted = vec![Complex::default(); plan.output_len()];
    let rolled = roll_axis(x, plan.extents(), axis, k);
    plan.forward(x, &mut plain);
    plan.forward(&rolled, &mut shifted);

    let expected = shifted_spectrum(&plain, plan.extents(), axis, k);
    complex_relative_linf_error(&shifted, &expected)
}

/// Forward then inverse transform `x`, undo the volume scaling, and
/// compare with `x`.
pub fn round_trip_error<T: FftScalar>(
    fwd: &mut NdRealPlan<T>,
    inv: &mut NdRealPlan<T>,
    x: &[T],
) -> f64 {
    assert_eq!(fwd.extents(), inv.extents(), "plans differ in shape");
    let mut spectrum = vec![Complex::default(); fwd.output_len()];
    let mut back = vec![T::zero(); inv.output_len()];
    fwd.forward(x, &mut spectrum);
    inv.inverse(&spectrum, &mut back);

    let volume = fwd.volume() as f64;
    linf_error(x.iter().zip(&back).map(|(&a, &b)| (widen(a), widen(b) / volume)))
}
