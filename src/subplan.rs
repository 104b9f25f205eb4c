//! 1-D sub-plans and the factories that build them.
//!
//! A sub-plan is a reusable handle to a 1-D transform of fixed length and
//! direction. `process` never allocates and never mutates the handle: all
//! temporary storage comes from the caller's `scratch`, which must hold at
//! least [`scratch_len`](ComplexSubPlan::scratch_len) elements. That is what
//! lets several axes of one plan share a handle.

use std::sync::Arc;

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::{Direction, FftScalar, Result};

/// Full-complex 1-D transform.
pub trait ComplexSubPlan<T>: Send + Sync {
    fn len(&self) -> usize;

    fn direction(&self) -> Direction;

    fn scratch_len(&self) -> usize;

    /// Transform `input` (`len` elements) into `output` (`len` elements).
    fn process(&self, input: &[Complex<T>], output: &mut [Complex<T>], scratch: &mut [Complex<T>]);
}

/// Real input to half-complex output: `len` reals in, `len / 2 + 1` bins out.
pub trait RealToComplex<T>: Send + Sync {
    fn len(&self) -> usize;

    fn scratch_len(&self) -> usize;

    fn process(&self, input: &[T], output: &mut [Complex<T>], scratch: &mut [Complex<T>]);
}

/// Half-complex input to real output: `len / 2 + 1` bins in, `len` reals out.
///
/// The imaginary parts of the DC bin (and of the Nyquist bin for even
/// lengths) are ignored.
pub trait ComplexToReal<T>: Send + Sync {
    fn len(&self) -> usize;

    fn scratch_len(&self) -> usize;

    fn process(&self, input: &[Complex<T>], output: &mut [T], scratch: &mut [Complex<T>]);
}

/// The real↔half-complex sub-plan of a plan, tagged by direction.
#[derive(Clone)]
pub enum RealSubPlan<T> {
    Forward(Arc<dyn RealToComplex<T>>),
    Inverse(Arc<dyn ComplexToReal<T>>),
}

impl<T> RealSubPlan<T> {
    pub fn len(&self) -> usize {
        match self {
            RealSubPlan::Forward(p) => p.len(),
            RealSubPlan::Inverse(p) => p.len(),
        }
    }

    pub fn scratch_len(&self) -> usize {
        match self {
            RealSubPlan::Forward(p) => p.scratch_len(),
            RealSubPlan::Inverse(p) => p.scratch_len(),
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            RealSubPlan::Forward(_) => Direction::Forward,
            RealSubPlan::Inverse(_) => Direction::Inverse,
        }
    }
}

impl<T> std::fmt::Debug for RealSubPlan<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealSubPlan")
            .field("direction", &self.direction())
            .field("len", &self.len())
            .finish()
    }
}

/// Source of 1-D sub-plans for plan construction.
///
/// A factory may fail; plan construction then tears down everything it
/// built so far and reports the error.
pub trait SubPlanFactory<T> {
    fn real_to_complex(&mut self, len: usize) -> Result<Arc<dyn RealToComplex<T>>>;

    fn complex_to_real(&mut self, len: usize) -> Result<Arc<dyn ComplexToReal<T>>>;

    fn complex(&mut self, len: usize, direction: Direction) -> Result<Arc<dyn ComplexSubPlan<T>>>;
}

// ============================================================================
// rustfft-backed sub-plans
// ============================================================================

/// Default factory, backed by [`rustfft::FftPlanner`].
pub struct RustFftFactory<T: FftScalar> {
    planner: FftPlanner<T>,
}

impl<T: FftScalar> RustFftFactory<T> {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }
}

impl<T: FftScalar> Default for RustFftFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FftScalar> SubPlanFactory<T> for RustFftFactory<T> {
    fn real_to_complex(&mut self, len: usize) -> Result<Arc<dyn RealToComplex<T>>> {
        let fft = self.planner.plan_fft(len, Direction::Forward.to_rustfft());
        Ok(Arc::new(LiftedRealForward::new(fft, len)))
    }

    fn complex_to_real(&mut self, len: usize) -> Result<Arc<dyn ComplexToReal<T>>> {
        let fft = self.planner.plan_fft(len, Direction::Inverse.to_rustfft());
        Ok(Arc::new(LiftedRealInverse::new(fft, len)))
    }

    fn complex(&mut self, len: usize, direction: Direction) -> Result<Arc<dyn ComplexSubPlan<T>>> {
        let fft = self.planner.plan_fft(len, direction.to_rustfft());
        Ok(Arc::new(RustFftComplex {
            fft_scratch: fft.get_inplace_scratch_len(),
            fft,
            len,
            direction,
        }))
    }
}

/// Complex sub-plan: copy to the output, transform in place there.
struct RustFftComplex<T: FftScalar> {
    fft: Arc<dyn Fft<T>>,
    len: usize,
    direction: Direction,
    fft_scratch: usize,
}

impl<T: FftScalar> ComplexSubPlan<T> for RustFftComplex<T> {
    fn len(&self) -> usize {
        self.len
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn scratch_len(&self) -> usize {
        self.fft_scratch
    }

    #[inline]
    fn process(&self, input: &[Complex<T>], output: &mut [Complex<T>], scratch: &mut [Complex<T>]) {
        debug_assert_eq!(input.len(), self.len);
        debug_assert_eq!(output.len(), self.len);
        output.copy_from_slice(input);
        self.fft
            .process_with_scratch(output, &mut scratch[..self.fft_scratch]);
    }
}

/// Real-to-half-complex via a full complex FFT of the lifted row.
///
/// Scratch holds the lifted row followed by the FFT's own scratch.
struct LiftedRealForward<T: FftScalar> {
    fft: Arc<dyn Fft<T>>,
    len: usize,
    fft_scratch: usize,
}

impl<T: FftScalar> LiftedRealForward<T> {
    fn new(fft: Arc<dyn Fft<T>>, len: usize) -> Self {
        Self {
            fft_scratch: fft.get_inplace_scratch_len(),
            fft,
            len,
        }
    }
}

impl<T: FftScalar> RealToComplex<T> for LiftedRealForward<T> {
    fn len(&self) -> usize {
        self.len
    }

    fn scratch_len(&self) -> usize {
        self.len + self.fft_scratch
    }

    #[inline]
    fn process(&self, input: &[T], output: &mut [Complex<T>], scratch: &mut [Complex<T>]) {
        debug_assert_eq!(input.len(), self.len);
        debug_assert_eq!(output.len(), self.len / 2 + 1);
        let (row, fft_scratch) = scratch.split_at_mut(self.len);
        for (lifted, &x) in row.iter_mut().zip(input) {
            *lifted = Complex::new(x, T::zero());
        }
        self.fft
            .process_with_scratch(row, &mut fft_scratch[..self.fft_scratch]);
        output.copy_from_slice(&row[..self.len / 2 + 1]);
    }
}

/// Half-complex-to-real via the Hermitian completion of the spectrum.
struct LiftedRealInverse<T: FftScalar> {
    fft: Arc<dyn Fft<T>>,
    len: usize,
    fft_scratch: usize,
}

impl<T: FftScalar> LiftedRealInverse<T> {
    fn new(fft: Arc<dyn Fft<T>>, len: usize) -> Self {
        Self {
            fft_scratch: fft.get_inplace_scratch_len(),
            fft,
            len,
        }
    }
}

impl<T: FftScalar> ComplexToReal<T> for LiftedRealInverse<T> {
    fn len(&self) -> usize {
        self.len
    }

    fn scratch_len(&self) -> usize {
        self.len + self.fft_scratch
    }

    #[inline]
    fn process(&self, input: &[Complex<T>], output: &mut [T], scratch: &mut [Complex<T>]) {
        let n = self.len;
        let half = n / 2 + 1;
        debug_assert_eq!(input.len(), half);
        debug_assert_eq!(output.len(), n);
        let (row, fft_scratch) = scratch.split_at_mut(n);
        row[..half].copy_from_slice(input);
        for k in half..n {
            row[k] = input[n - k].conj();
        }
        self.fft
            .process_with_scratch(row, &mut fft_scratch[..self.fft_scratch]);
        for (out, c) in output.iter_mut().zip(row.iter()) {
            *out = c.re;
        }
    }
}
