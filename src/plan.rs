//! Plan construction for the N-dimensional real transform.
//!
//! Construction: validate shape -> size scratch -> fill stage tables ->
//! build (or share) one 1-D sub-plan per axis.
//!
//! Stage tables follow the row-column decomposition. For a forward plan,
//! stage `i` transforms logical axis `rank - 1 - i`: `ms[i]` is that
//! axis's extent and `ns[i]` the number of 1-D transforms in the stage.
//! For an inverse plan, index `i` is logical axis `i`: `ns[i]` is the
//! extent and `ms[i]` the number of 1-D transforms. In both directions the
//! row count of every complex stage sees the last axis reduced to
//! `n / 2 + 1`.

use std::ops::Range;
use std::sync::Arc;

use ndrfft_perm::{TransposeStaging, STAGING_LEN};
use num_complex::Complex;
use tracing::{debug, trace};

use crate::subplan::{ComplexSubPlan, RealSubPlan, RustFftFactory, SubPlanFactory};
use crate::{try_filled, Direction, FftScalar, NdFftError, Result};

/// Number of half-complex bins produced by a real transform of length `n`.
#[inline]
pub(crate) fn half_len(n: usize) -> usize {
    n / 2 + 1
}

// ============================================================================
// Scratch layout
// ============================================================================

/// Sizes, in complex elements, of the scratch regions a plan owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScratchLayout {
    /// Main working region.
    pub primary: usize,
    /// Second region, live at the same time as `primary` (inverse only).
    pub secondary: usize,
    /// Transpose staging tile.
    pub staging: usize,
}

impl ScratchLayout {
    /// Derive the scratch regions for `extents` in `direction`.
    ///
    /// Forward plans need the whole volume as complex working set. Inverse
    /// plans hold a full-volume region and a half-complex region at once.
    pub fn for_shape(extents: &[usize], direction: Direction) -> Result<Self> {
        let (volume, half_volume) = volume_of(extents)?;
        let (primary, secondary) = match direction {
            Direction::Forward => (volume, 0),
            Direction::Inverse => {
                let n0 = extents[0];
                let folded = n0
                    .checked_mul(half_len(volume / n0))
                    .ok_or_else(|| NdFftError::VolumeOverflow(extents.to_vec()))?;
                (volume, folded.max(half_volume))
            }
        };
        Ok(Self {
            primary,
            secondary,
            staging: STAGING_LEN,
        })
    }

    /// Scalar count of the main scratch allocation (both regions, two
    /// scalars per complex element).
    pub fn scalar_len(&self) -> usize {
        2 * (self.primary + self.secondary)
    }
}

/// Validate `extents` and return `(volume, half_volume)`.
fn volume_of(extents: &[usize]) -> Result<(usize, usize)> {
    if extents.is_empty() {
        return Err(NdFftError::EmptyShape);
    }
    if let Some(axis) = extents.iter().position(|&n| n == 0) {
        return Err(NdFftError::ZeroExtent { axis });
    }
    let volume = extents
        .iter()
        .try_fold(1usize, |acc, &n| acc.checked_mul(n))
        .ok_or_else(|| NdFftError::VolumeOverflow(extents.to_vec()))?;
    let n_last = extents[extents.len() - 1];
    Ok((volume, volume / n_last * half_len(n_last)))
}

// ============================================================================
// Sub-plan registry
// ============================================================================

/// The 1-D sub-plan assigned to one axis.
#[derive(Clone)]
pub enum AxisSubPlan<T> {
    Real(RealSubPlan<T>),
    /// `owner` is the first axis holding this handle; later axes with the
    /// same extent share it.
    Complex {
        handle: Arc<dyn ComplexSubPlan<T>>,
        owner: usize,
    },
}

/// One sub-plan slot per axis, with sharing between axes of equal extent.
///
/// Dropping the registry releases every slot once; a shared handle is
/// freed when its last slot goes.
pub struct SubPlanRegistry<T> {
    slots: Vec<AxisSubPlan<T>>,
    real_axis: usize,
}

impl<T> SubPlanRegistry<T> {
    fn with_capacity(rank: usize) -> Result<Self> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(rank)
            .map_err(|source| NdFftError::AllocationFailure {
                what: "sub-plan table",
                elements: rank,
                source,
            })?;
        Ok(Self {
            slots,
            real_axis: 0,
        })
    }

    fn push_real(&mut self, plan: RealSubPlan<T>) {
        self.real_axis = self.slots.len();
        self.slots.push(AxisSubPlan::Real(plan));
    }

    /// Share the handle of an earlier slot whose length matches, or build a
    /// new one with `build`.
    fn push_complex<M, F>(&mut self, candidates: Range<usize>, matches: M, build: F) -> Result<()>
    where
        M: Fn(usize) -> bool,
        F: FnOnce() -> Result<Arc<dyn ComplexSubPlan<T>>>,
    {
        let axis = self.slots.len();
        for k in candidates {
            if !matches(k) {
                continue;
            }
            if let AxisSubPlan::Complex { handle, owner } = &self.slots[k] {
                trace!(axis, shared_with = *owner, "sharing 1-D sub-plan");
                let slot = AxisSubPlan::Complex {
                    handle: Arc::clone(handle),
                    owner: *owner,
                };
                self.slots.push(slot);
                return Ok(());
            }
        }
        let handle = build()?;
        self.slots.push(AxisSubPlan::Complex {
            handle,
            owner: axis,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, axis: usize) -> &AxisSubPlan<T> {
        &self.slots[axis]
    }

    /// Index of the slot holding the real↔half-complex sub-plan.
    pub fn real_axis(&self) -> usize {
        self.real_axis
    }

    pub fn real(&self) -> &RealSubPlan<T> {
        match &self.slots[self.real_axis] {
            AxisSubPlan::Real(plan) => plan,
            AxisSubPlan::Complex { .. } => {
                unreachable!("axis {} holds a complex sub-plan", self.real_axis)
            }
        }
    }

    /// Complex sub-plan of `axis`.
    ///
    /// # Panics
    /// If `axis` holds the real sub-plan.
    pub fn complex(&self, axis: usize) -> &Arc<dyn ComplexSubPlan<T>> {
        match &self.slots[axis] {
            AxisSubPlan::Complex { handle, .. } => handle,
            AxisSubPlan::Real(_) => panic!("axis {axis} holds the real sub-plan"),
        }
    }

    /// First axis holding the same handle as `axis` (itself if it owns it).
    pub fn owner(&self, axis: usize) -> usize {
        match &self.slots[axis] {
            AxisSubPlan::Complex { owner, .. } => *owner,
            AxisSubPlan::Real(_) => axis,
        }
    }

    pub fn is_alias(&self, axis: usize) -> bool {
        self.owner(axis) != axis
    }

    /// Whether two axes hold the very same sub-plan instance.
    pub fn shares_handle(&self, a: usize, b: usize) -> bool {
        match (&self.slots[a], &self.slots[b]) {
            (AxisSubPlan::Complex { handle: x, .. }, AxisSubPlan::Complex { handle: y, .. }) => {
                Arc::ptr_eq(x, y)
            }
            _ => a == b,
        }
    }

    /// Number of distinct sub-plan instances (owned slots).
    pub fn owned_count(&self) -> usize {
        (0..self.slots.len()).filter(|&a| !self.is_alias(a)).count()
    }

    /// Largest scratch requirement over all sub-plans.
    pub fn max_scratch_len(&self) -> usize {
        self.slots
            .iter()
            .map(|s| match s {
                AxisSubPlan::Real(p) => p.scratch_len(),
                AxisSubPlan::Complex { handle, .. } => handle.scratch_len(),
            })
            .max()
            .unwrap_or(0)
    }
}

impl<T> std::fmt::Debug for SubPlanRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let owners: Vec<usize> = (0..self.slots.len()).map(|a| self.owner(a)).collect();
        f.debug_struct("SubPlanRegistry")
            .field("real_axis", &self.real_axis())
            .field("owners", &owners)
            .finish()
    }
}

// ============================================================================
// Plan
// ============================================================================

/// A reusable N-dimensional real FFT plan.
///
/// A plan owns its scratch and is executed through `&mut self`, so one
/// plan serves one caller at a time; concurrent executions need separate
/// plans.
pub struct NdRealPlan<T: FftScalar> {
    pub(crate) direction: Direction,
    pub(crate) extents: Vec<usize>,
    pub(crate) ns: Vec<usize>,
    pub(crate) ms: Vec<usize>,
    pub(crate) volume: usize,
    pub(crate) half_volume: usize,
    pub(crate) plans: SubPlanRegistry<T>,
    pub(crate) layout: ScratchLayout,
    pub(crate) buf: Vec<Complex<T>>,
    pub(crate) buf2: Vec<Complex<T>>,
    pub(crate) work: Vec<Complex<T>>,
    pub(crate) staging: TransposeStaging<Complex<T>>,
}

impl<T: FftScalar> NdRealPlan<T> {
    /// Build a plan using the default rustfft-backed factory.
    pub fn new(extents: &[usize], direction: Direction) -> Result<Self> {
        Self::with_factory(extents, direction, &mut RustFftFactory::new())
    }

    /// Two-dimensional shorthand for `new(&[n0, n1], direction)`.
    pub fn new_2d(n0: usize, n1: usize, direction: Direction) -> Result<Self> {
        Self::new(&[n0, n1], direction)
    }

    /// Build a plan whose 1-D sub-plans come from `factory`.
    ///
    /// On any failure everything built so far is released before the error
    /// is returned.
    pub fn with_factory<F>(extents: &[usize], direction: Direction, factory: &mut F) -> Result<Self>
    where
        F: SubPlanFactory<T> + ?Sized,
    {
        let (volume, half_volume) = volume_of(extents)?;
        let layout = ScratchLayout::for_shape(extents, direction)?;
        let rank = extents.len();
        let last = rank - 1;
        let n_last = extents[last];
        let reduce = |rows: usize| rows / n_last * half_len(n_last);

        let buf = try_filled("primary scratch", layout.primary, Complex::default())?;
        let buf2 = try_filled("secondary scratch", layout.secondary, Complex::default())?;
        let staging = TransposeStaging::try_new().map_err(|source| {
            NdFftError::AllocationFailure {
                what: "transpose staging",
                elements: STAGING_LEN,
                source,
            }
        })?;

        let mut ns = try_filled("axis table", rank, 0usize)?;
        let mut ms = try_filled("axis table", rank, 0usize)?;
        let mut plans = SubPlanRegistry::with_capacity(rank)?;

        match direction {
            Direction::Forward => {
                for i in 0..rank {
                    ms[i] = extents[last - i];
                    ns[i] = volume / ms[i];
                    if i == 0 {
                        plans.push_real(RealSubPlan::Forward(factory.real_to_complex(ms[0])?));
                        continue;
                    }
                    ns[i] = reduce(ns[i]);
                    let len = ms[i];
                    plans.push_complex(1..i, |k| ms[k] == len, || factory.complex(len, direction))?;
                }
            }
            Direction::Inverse => {
                for i in 0..rank {
                    ns[i] = extents[i];
                    ms[i] = volume / ns[i];
                    if i == last {
                        plans.push_real(RealSubPlan::Inverse(factory.complex_to_real(ns[i])?));
                        continue;
                    }
                    ms[i] = reduce(ms[i]);
                    let len = ns[i];
                    plans.push_complex(0..i, |k| ns[k] == len, || factory.complex(len, direction))?;
                }
            }
        }

        let work = try_filled("sub-plan scratch", plans.max_scratch_len(), Complex::default())?;

        debug!(
            rank,
            ?extents,
            ?direction,
            distinct_sub_plans = plans.owned_count(),
            primary = layout.primary,
            secondary = layout.secondary,
            work = work.len(),
            "built n-d real plan"
        );

        Ok(Self {
            direction,
            extents: extents.to_vec(),
            ns,
            ms,
            volume,
            half_volume,
            plans,
            layout,
            buf,
            buf2,
            work,
            staging,
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn rank(&self) -> usize {
        self.extents.len()
    }

    /// Logical extents as given at construction.
    pub fn extents(&self) -> &[usize] {
        &self.extents
    }

    /// Stage table `Ns` (see module docs).
    pub fn ns(&self) -> &[usize] {
        &self.ns
    }

    /// Stage table `Ms` (see module docs).
    pub fn ms(&self) -> &[usize] {
        &self.ms
    }

    /// Number of real samples.
    pub fn volume(&self) -> usize {
        self.volume
    }

    /// Number of half-complex bins.
    pub fn half_volume(&self) -> usize {
        self.half_volume
    }

    /// Shape of the half-complex side: the extents with the last axis
    /// reduced to `n / 2 + 1`.
    pub fn complex_shape(&self) -> Vec<usize> {
        let mut shape = self.extents.clone();
        if let Some(n) = shape.last_mut() {
            *n = half_len(*n);
        }
        shape
    }

    /// Elements the executor reads.
    pub fn input_len(&self) -> usize {
        match self.direction {
            Direction::Forward => self.volume,
            Direction::Inverse => self.half_volume,
        }
    }

    /// Elements the executor writes.
    pub fn output_len(&self) -> usize {
        match self.direction {
            Direction::Forward => self.half_volume,
            Direction::Inverse => self.volume,
        }
    }

    pub fn layout(&self) -> &ScratchLayout {
        &self.layout
    }

    pub fn registry(&self) -> &SubPlanRegistry<T> {
        &self.plans
    }
}

impl<T: FftScalar> std::fmt::Debug for NdRealPlan<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NdRealPlan")
            .field("direction", &self.direction)
            .field("extents", &self.extents)
            .field("ns", &self.ns)
            .field("ms", &self.ms)
            .field("plans", &self.plans)
            .field("layout", &self.layout)
            .finish()
    }
}

impl<T: FftScalar> Drop for NdRealPlan<T> {
    fn drop(&mut self) {
        trace!(
            rank = self.extents.len(),
            owned_sub_plans = self.plans.owned_count(),
            "releasing n-d real plan"
        );
    }
}
