#![allow(dead_code)]

use std::f64::consts::PI;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ndrfft::subplan::{ComplexSubPlan, ComplexToReal, RealToComplex, SubPlanFactory};
use ndrfft::{Direction, FftScalar, NdFftError, RustFftFactory, SubPlanKind};
use num_complex::{Complex, Complex64};
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

// ============================================================================
// Counting factory
// ============================================================================

/// Sub-plan construction and release counts.
#[derive(Debug, Default)]
pub struct Counters {
    pub created: AtomicUsize,
    pub dropped: AtomicUsize,
}

impl Counters {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.created() - self.dropped()
    }
}

/// Wraps a sub-plan and records its construction and release.
struct Counted<P: ?Sized> {
    inner: Arc<P>,
    counters: Arc<Counters>,
}

impl<P: ?Sized> Counted<P> {
    fn new(inner: Arc<P>, counters: &Arc<Counters>) -> Self {
        counters.created.fetch_add(1, Ordering::SeqCst);
        Self {
            inner,
            counters: Arc::clone(counters),
        }
    }
}

impl<P: ?Sized> Drop for Counted<P> {
    fn drop(&mut self) {
        self.counters.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

impl<T: FftScalar> ComplexSubPlan<T> for Counted<dyn ComplexSubPlan<T>> {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn direction(&self) -> Direction {
        self.inner.direction()
    }

    fn scratch_len(&self) -> usize {
        self.inner.scratch_len()
    }

    fn process(&self, input: &[Complex<T>], output: &mut [Complex<T>], scratch: &mut [Complex<T>]) {
        self.inner.process(input, output, scratch)
    }
}

impl<T: FftScalar> RealToComplex<T> for Counted<dyn RealToComplex<T>> {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn scratch_len(&self) -> usize {
        self.inner.scratch_len()
    }

    fn process(&self, input: &[T], output: &mut [Complex<T>], scratch: &mut [Complex<T>]) {
        self.inner.process(input, output, scratch)
    }
}

impl<T: FftScalar> ComplexToReal<T> for Counted<dyn ComplexToReal<T>> {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn scratch_len(&self) -> usize {
        self.inner.scratch_len()
    }

    fn process(&self, input: &[Complex<T>], output: &mut [T], scratch: &mut [Complex<T>]) {
        self.inner.process(input, output, scratch)
    }
}

/// rustfft-backed factory that counts sub-plans and can refuse the
/// `fail_at`-th request (0-based, any kind).
pub struct CountingFactory<T: FftScalar> {
    inner: RustFftFactory<T>,
    pub counters: Arc<Counters>,
    pub requests: usize,
    pub fail_at: Option<usize>,
}

impl<T: FftScalar> CountingFactory<T> {
    pub fn new() -> Self {
        Self {
            inner: RustFftFactory::new(),
            counters: Arc::new(Counters::default()),
            requests: 0,
            fail_at: None,
        }
    }

    pub fn failing_at(request: usize) -> Self {
        Self {
            fail_at: Some(request),
            ..Self::new()
        }
    }

    fn admit(&mut self, kind: SubPlanKind, len: usize) -> ndrfft::Result<()> {
        let request = self.requests;
        self.requests += 1;
        if self.fail_at == Some(request) {
            return Err(NdFftError::SubPlanConstruction {
                kind,
                len,
                reason: format!("request {request} refused"),
            });
        }
        Ok(())
    }
}

impl<T: FftScalar> SubPlanFactory<T> for CountingFactory<T> {
    fn real_to_complex(&mut self, len: usize) -> ndrfft::Result<Arc<dyn RealToComplex<T>>> {
        self.admit(SubPlanKind::RealToComplex, len)?;
        let plan = self.inner.real_to_complex(len)?;
        Ok(Arc::new(Counted::new(plan, &self.counters)))
    }

    fn complex_to_real(&mut self, len: usize) -> ndrfft::Result<Arc<dyn ComplexToReal<T>>> {
        self.admit(SubPlanKind::ComplexToReal, len)?;
        let plan = self.inner.complex_to_real(len)?;
        Ok(Arc::new(Counted::new(plan, &self.counters)))
    }

    fn complex(
        &mut self,
        len: usize,
        direction: Direction,
    ) -> ndrfft::Result<Arc<dyn ComplexSubPlan<T>>> {
        self.admit(SubPlanKind::Complex, len)?;
        let plan = self.inner.complex(len, direction)?;
        Ok(Arc::new(Counted::new(plan, &self.counters)))
    }
}

// ============================================================================
// Reference transform and inputs
// ============================================================================

pub fn random_real(len: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| StandardNormal.sample(&mut rng)).collect()
}

pub fn random_real_f32(len: usize, seed: u64) -> Vec<f32> {
    random_real(len, seed).into_iter().map(|x| x as f32).collect()
}

fn unravel(mut flat: usize, shape: &[usize], idx: &mut [usize]) {
    for (i, &n) in idx.iter_mut().zip(shape).rev() {
        *i = flat % n;
        flat /= n;
    }
}

/// Direct O(volume²) evaluation of the forward transform, returning the
/// half-complex output (last axis reduced to `n / 2 + 1`).
pub fn naive_forward(x: &[f64], shape: &[usize]) -> Vec<Complex64> {
    let mut half_shape = shape.to_vec();
    let last = shape.len() - 1;
    half_shape[last] = shape[last] / 2 + 1;
    let half_volume: usize = half_shape.iter().product();

    let mut k = vec![0usize; shape.len()];
    let mut n = vec![0usize; shape.len()];
    (0..half_volume)
        .map(|out| {
            unravel(out, &half_shape, &mut k);
            x.iter()
                .enumerate()
                .fold(Complex64::default(), |acc, (flat, &v)| {
                    unravel(flat, shape, &mut n);
                    let phase: f64 = k
                        .iter()
                        .zip(&n)
                        .zip(shape)
                        .map(|((&kk, &nn), &len)| ((kk * nn) % len) as f64 / len as f64)
                        .sum();
                    acc + Complex64::from_polar(v, -2.0 * PI * phase)
                })
        })
        .collect()
}
