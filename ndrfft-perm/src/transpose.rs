//! Blocked out-of-place transpose of a row-major `h × w` matrix.
//!
//! The bulk of the matrix is walked in bands of [`BLOCK_ROWS`] rows. For
//! each column of a band the strided entries are gathered into a small
//! staging tile and then written out as one contiguous destination run.
//! Two plain double loops cover what the bands leave behind: the rows
//! below the last full band, and the columns right of the last full
//! block of [`BLOCK_COLS`] columns.

use std::collections::TryReserveError;

use crate::{BLOCK_COLS, BLOCK_ROWS, STAGING_LEN};

/// Owned staging tile used by [`transpose_blocked`].
///
/// Its size does not depend on the problem size, so a plan allocates one
/// up front and reuses it for every transpose it performs.
#[derive(Debug, Clone)]
pub struct TransposeStaging<T> {
    tile: Vec<T>,
}

impl<T: Copy + Default> TransposeStaging<T> {
    /// Allocate a staging tile of [`STAGING_LEN`] elements.
    pub fn try_new() -> Result<Self, TryReserveError> {
        let mut tile = Vec::new();
        tile.try_reserve_exact(STAGING_LEN)?;
        tile.resize(STAGING_LEN, T::default());
        Ok(Self { tile })
    }

    /// Number of elements held by the staging tile.
    pub fn len(&self) -> usize {
        self.tile.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tile.is_empty()
    }
}

/// Transpose `src` (`h` rows of `w` elements, row stride `w`) into `dst`
/// (`w` rows of `h` elements, row stride `h`).
///
/// Every destination element is written exactly once. `w == 0` or
/// `h == 0` is a no-op.
///
/// # Panics
/// If either slice holds fewer than `w * h` elements.
pub fn transpose_blocked<T: Copy>(
    src: &[T],
    dst: &mut [T],
    w: usize,
    h: usize,
    staging: &mut TransposeStaging<T>,
) {
    let total = w * h;
    assert!(
        src.len() >= total && dst.len() >= total,
        "transpose of {h}x{w} needs {total} elements (src {}, dst {})",
        src.len(),
        dst.len()
    );
    if total == 0 {
        return;
    }

    let band_rows = h - h % BLOCK_ROWS;
    let band_cols = w - w % BLOCK_COLS;
    let tile = &mut staging.tile[..BLOCK_ROWS * BLOCK_COLS];

    for i in (0..band_rows).step_by(BLOCK_ROWS) {
        for j in (0..band_cols).step_by(BLOCK_COLS) {
            for jj in 0..BLOCK_COLS {
                let column = &mut tile[jj * BLOCK_ROWS..(jj + 1) * BLOCK_ROWS];
                for (ii, slot) in column.iter_mut().enumerate() {
                    *slot = src[(i + ii) * w + j + jj];
                }
            }
            for jj in 0..BLOCK_COLS {
                let start = (j + jj) * h + i;
                dst[start..start + BLOCK_ROWS]
                    .copy_from_slice(&tile[jj * BLOCK_ROWS..(jj + 1) * BLOCK_ROWS]);
            }
        }
    }

    // Rows below the last full band, every column.
    if band_rows < h {
        for col in 0..w {
            for row in band_rows..h {
                dst[col * h + row] = src[row * w + col];
            }
        }
    }

    // Columns right of the last full block, banded rows only.
    if band_cols < w {
        for col in band_cols..w {
            for row in 0..band_rows {
                dst[col * h + row] = src[row * w + col];
            }
        }
    }
}

/// Element-by-element reference transpose with the same contract as
/// [`transpose_blocked`].
pub fn transpose_naive<T: Copy>(src: &[T], dst: &mut [T], w: usize, h: usize) {
    for row in 0..h {
        for col in 0..w {
            dst[col * h + row] = src[row * w + col];
        }
    }
}
