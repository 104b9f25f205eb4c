//! Row-column execution of a built plan.
//!
//! Each stage runs the 1-D sub-plan over every contiguous row of its
//! source region and then transposes `rows × len` into `len × rows`, which
//! rotates the next axis into the contiguous position. After `rank` stages
//! the axes are back in logical order.

use ndrfft_perm::transpose_blocked;
use num_complex::Complex;

use crate::plan::{half_len, NdRealPlan};
use crate::subplan::RealSubPlan;
use crate::FftScalar;

impl<T: FftScalar> NdRealPlan<T> {
    /// Forward transform: `volume` real samples in, `half_volume`
    /// half-complex bins out, both row-major with the last axis fastest.
    ///
    /// `input` is never written. The output is unnormalized.
    ///
    /// # Panics
    /// If the plan was built for [`Direction::Inverse`](crate::Direction) or
    /// a buffer length does not match [`input_len`](Self::input_len) /
    /// [`output_len`](Self::output_len).
    pub fn forward(&mut self, input: &[T], output: &mut [Complex<T>]) {
        assert_eq!(input.len(), self.volume, "forward input length");
        assert_eq!(output.len(), self.half_volume, "forward output length");

        let NdRealPlan {
            ns,
            ms,
            plans,
            buf,
            work,
            staging,
            half_volume,
            ..
        } = self;
        let real = match plans.real() {
            RealSubPlan::Forward(plan) => plan,
            RealSubPlan::Inverse(_) => panic!("forward() called on an inverse plan"),
        };
        let buf = &mut buf[..*half_volume];

        let len = ms[0];
        let width = half_len(len);
        for (row, out) in input.chunks_exact(len).zip(buf.chunks_exact_mut(width)) {
            real.process(row, out, work);
        }
        transpose_blocked(buf, output, width, ns[0], staging);

        for stage in 1..ns.len() {
            let (len, rows) = (ms[stage], ns[stage]);
            let plan = plans.complex(stage);
            for (row, out) in output.chunks_exact(len).zip(buf.chunks_exact_mut(len)) {
                plan.process(row, out, work);
            }
            transpose_blocked(buf, output, len, rows, staging);
        }
    }

    /// Inverse transform: `half_volume` half-complex bins in, `volume` real
    /// samples out.
    ///
    /// `input` is never written. A forward/inverse round trip scales the
    /// data by [`volume`](Self::volume).
    ///
    /// # Panics
    /// If the plan was built for [`Direction::Forward`](crate::Direction) or
    /// a buffer length does not match.
    pub fn inverse(&mut self, input: &[Complex<T>], output: &mut [T]) {
        assert_eq!(input.len(), self.half_volume, "inverse input length");
        assert_eq!(output.len(), self.volume, "inverse output length");

        let NdRealPlan {
            ns,
            ms,
            plans,
            buf,
            buf2,
            work,
            staging,
            half_volume,
            ..
        } = self;
        let real = match plans.real() {
            RealSubPlan::Inverse(plan) => plan,
            RealSubPlan::Forward(_) => panic!("inverse() called on a forward plan"),
        };
        let primary = &mut buf[..*half_volume];
        let secondary = &mut buf2[..*half_volume];

        let last = ns.len() - 1;
        let width = half_len(ns[last]);
        // Bring the outermost axis to the contiguous position.
        transpose_blocked(input, primary, width, ms[last], staging);

        for axis in (0..last).rev() {
            let (len, rows) = (ns[axis], ms[axis]);
            let plan = plans.complex(axis);
            for (row, out) in primary.chunks_exact(len).zip(secondary.chunks_exact_mut(len)) {
                plan.process(row, out, work);
            }
            transpose_blocked(secondary, primary, len, rows, staging);
        }

        for (row, out) in primary
            .chunks_exact(width)
            .zip(output.chunks_exact_mut(ns[last]))
        {
            real.process(row, out, work);
        }
    }
}
