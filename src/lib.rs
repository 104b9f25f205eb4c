//! N-dimensional FFT of real data built from 1-D transforms.
//!
//! A plan decomposes an N-axis problem into one real↔half-complex 1-D
//! transform on the last logical axis and full-complex 1-D transforms on
//! every other axis. Each stage runs its 1-D transforms over contiguous
//! rows and then transposes the result (see [`ndrfft_perm`]) so the next
//! axis becomes contiguous.
//!
//! # Core Types
//!
//! - [`NdRealPlan`]: a reusable plan owning its sub-plans and scratch
//! - [`SubPlanRegistry`]: one 1-D sub-plan per axis, shared between axes of
//!   equal extent
//! - [`SubPlanFactory`] / [`RustFftFactory`]: where 1-D sub-plans come from
//! - [`ScratchLayout`]: named scratch regions derived from the shape
//!
//! # Example
//!
//! ```rust
//! use ndrfft::{Direction, NdRealPlan};
//! use num_complex::Complex32;
//!
//! let mut plan = NdRealPlan::<f32>::new(&[4, 4], Direction::Forward).unwrap();
//! let mut input = vec![0.0f32; 16];
//! input[0] = 1.0;
//! let mut output = vec![Complex32::default(); plan.output_len()];
//! plan.forward(&input, &mut output);
//! assert!(output.iter().all(|c| (c.re - 1.0).abs() < 1e-6 && c.im.abs() < 1e-6));
//! ```
//!
//! Transforms are unnormalized: a forward/inverse round trip scales the
//! data by the volume of the shape.

mod execute;
pub mod plan;
pub mod subplan;
pub mod tensor;
pub mod verify;

use std::collections::TryReserveError;
use std::fmt;

pub use ndrfft_perm::{transpose_blocked, transpose_naive, TransposeStaging};
pub use plan::{AxisSubPlan, NdRealPlan, ScratchLayout, SubPlanRegistry};
pub use subplan::{
    ComplexSubPlan, ComplexToReal, RealSubPlan, RealToComplex, RustFftFactory, SubPlanFactory,
};

// ============================================================================
// Scalar and direction
// ============================================================================

/// Scalar types a plan can be built for (`f32`, `f64`).
pub trait FftScalar: rustfft::FftNum + num_traits::Float + Default {}

impl<T> FftScalar for T where T: rustfft::FftNum + num_traits::Float + Default {}

/// Transform direction, fixed when a plan is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Real input to half-complex output (exponent sign -1).
    Forward,
    /// Half-complex input to real output (exponent sign +1).
    Inverse,
}

impl Direction {
    /// Negative signs select the forward transform, everything else the
    /// inverse one.
    pub fn from_sign(sign: i32) -> Self {
        if sign < 0 {
            Direction::Forward
        } else {
            Direction::Inverse
        }
    }

    pub fn sign(self) -> i32 {
        match self {
            Direction::Forward => -1,
            Direction::Inverse => 1,
        }
    }

    pub(crate) fn to_rustfft(self) -> rustfft::FftDirection {
        match self {
            Direction::Forward => rustfft::FftDirection::Forward,
            Direction::Inverse => rustfft::FftDirection::Inverse,
        }
    }
}

// ============================================================================
// Error types
// ============================================================================

/// Which kind of 1-D sub-plan a factory was asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubPlanKind {
    RealToComplex,
    ComplexToReal,
    Complex,
}

impl fmt::Display for SubPlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubPlanKind::RealToComplex => "real-to-complex",
            SubPlanKind::ComplexToReal => "complex-to-real",
            SubPlanKind::Complex => "complex",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while building plans or walking tensors.
#[derive(Debug, thiserror::Error)]
pub enum NdFftError {
    /// A plan needs at least one axis.
    #[error("shape must have at least one axis")]
    EmptyShape,

    /// Every axis must have a positive extent.
    #[error("axis {axis} has zero extent")]
    ZeroExtent { axis: usize },

    /// The product of the extents does not fit in `usize`.
    #[error("volume of shape {0:?} overflows usize")]
    VolumeOverflow(Vec<usize>),

    /// A scratch buffer or table could not be allocated.
    #[error("failed to allocate {elements} elements for {what}")]
    AllocationFailure {
        what: &'static str,
        elements: usize,
        #[source]
        source: TryReserveError,
    },

    /// A sub-plan factory refused to build a 1-D transform.
    #[error("failed to construct {kind} sub-plan of length {len}: {reason}")]
    SubPlanConstruction {
        kind: SubPlanKind,
        len: usize,
        reason: String,
    },

    /// Tensor ranks do not match.
    #[error("rank mismatch: {0} vs {1}")]
    RankMismatch(usize, usize),

    /// Tensor extents do not match.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),
}

/// Result type for plan construction and tensor walks.
pub type Result<T> = std::result::Result<T, NdFftError>;

/// Allocate `len` copies of `fill`, reporting allocation failure instead of
/// aborting.
pub(crate) fn try_filled<T: Clone>(what: &'static str, len: usize, fill: T) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|source| NdFftError::AllocationFailure {
            what,
            elements: len,
            source,
        })?;
    v.resize(len, fill);
    Ok(v)
}
