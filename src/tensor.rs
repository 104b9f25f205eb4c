//! Paired walks over two strided tensors of the same shape.
//!
//! A tensor is described by one [`IoDim`] per axis: its extent and the
//! element strides on the input and output side. [`for_each_pair`] visits
//! every position of two such descriptions in lockstep and hands the four
//! resulting offsets to a callback.

use crate::{NdFftError, Result};

/// One axis of a strided tensor description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoDim {
    /// Extent.
    pub n: usize,
    /// Input-side stride, in elements.
    pub is: usize,
    /// Output-side stride, in elements.
    pub os: usize,
}

impl IoDim {
    pub fn new(n: usize, is: usize, os: usize) -> Self {
        Self { n, is, os }
    }
}

/// Dense row-major description of `shape` (last axis contiguous), with the
/// same strides on both sides.
pub fn row_major_dims(shape: &[usize]) -> Vec<IoDim> {
    let mut dims = vec![IoDim::new(0, 0, 0); shape.len()];
    let mut stride = 1usize;
    for (dim, &n) in dims.iter_mut().zip(shape).rev() {
        *dim = IoDim::new(n, stride, stride);
        stride *= n;
    }
    dims
}

/// Row-major description of `shape` whose last axis occupies `padded_len`
/// slots per row, e.g. `2 * (n / 2 + 1)` for in-place real layouts.
pub fn padded_row_dims(shape: &[usize], padded_len: usize) -> Result<Vec<IoDim>> {
    let Some((&n_last, outer)) = shape.split_last() else {
        return Ok(Vec::new());
    };
    if padded_len < n_last {
        let mut padded = shape.to_vec();
        padded[outer.len()] = padded_len;
        return Err(NdFftError::ShapeMismatch(shape.to_vec(), padded));
    }
    let mut dims = row_major_dims(shape);
    let mut stride = padded_len;
    for (dim, &n) in dims[..outer.len()].iter_mut().zip(outer).rev() {
        dim.is = stride;
        dim.os = stride;
        stride *= n;
    }
    Ok(dims)
}

fn check_pair(sz0: &[IoDim], sz1: &[IoDim]) -> Result<()> {
    if sz0.len() != sz1.len() {
        return Err(NdFftError::RankMismatch(sz0.len(), sz1.len()));
    }
    if sz0.iter().zip(sz1).any(|(a, b)| a.n != b.n) {
        return Err(NdFftError::ShapeMismatch(
            sz0.iter().map(|d| d.n).collect(),
            sz1.iter().map(|d| d.n).collect(),
        ));
    }
    Ok(())
}

/// Visit every position of two equally shaped tensors.
///
/// Positions are visited in row-major order (axis 0 outermost). For each
/// one, `f(indx0, ondx0, indx1, ondx1)` receives the input and output
/// offsets in `sz0` followed by those in `sz1`. A rank-0 pair is visited
/// once at offset zero; a pair with any zero extent is not visited at all.
pub fn for_each_pair<F>(sz0: &[IoDim], sz1: &[IoDim], mut f: F) -> Result<()>
where
    F: FnMut(usize, usize, usize, usize),
{
    check_pair(sz0, sz1)?;
    if sz0.iter().any(|d| d.n == 0) {
        return Ok(());
    }
    let rank = sz0.len();
    // [indx0, ondx0, indx1, ondx1]
    let mut offsets = [0usize; 4];
    let mut idx = vec![0usize; rank];

    loop {
        f(offsets[0], offsets[1], offsets[2], offsets[3]);

        let mut level = rank;
        loop {
            if level == 0 {
                return Ok(());
            }
            level -= 1;
            let (a, b) = (sz0[level], sz1[level]);
            idx[level] += 1;
            if idx[level] < a.n {
                offsets[0] += a.is;
                offsets[1] += a.os;
                offsets[2] += b.is;
                offsets[3] += b.os;
                break;
            }
            idx[level] = 0;
            let back = a.n - 1;
            offsets[0] -= back * a.is;
            offsets[1] -= back * a.os;
            offsets[2] -= back * b.is;
            offsets[3] -= back * b.os;
        }
    }
}

/// Copy every element of `src` (addressed by the output strides of
/// `src_sz`) to `dst` (addressed by the input strides of `dst_sz`).
///
/// # Panics
/// If an offset falls outside its slice.
pub fn copy_strided<T: Copy>(
    src: &[T],
    src_sz: &[IoDim],
    dst: &mut [T],
    dst_sz: &[IoDim],
) -> Result<()> {
    for_each_pair(src_sz, dst_sz, |_, ondx0, indx1, _| {
        dst[indx1] = src[ondx0];
    })
}
