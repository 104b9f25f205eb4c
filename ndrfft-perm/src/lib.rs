//! Cache-friendly matrix transpose for the row-column FFT engine.
//!
//! Every stage of the N-dimensional engine runs contiguous 1-D transforms
//! and then transposes the result so the next axis becomes contiguous.
//! This crate holds that transpose and nothing else.
//!
//! # Dependency graph
//!
//! ```text
//! ndrfft-perm -> ndrfft
//! ```

pub mod transpose;

pub use transpose::{transpose_blocked, transpose_naive, TransposeStaging};

// Block geometry

/// Rows gathered per band. Each column of a band becomes one contiguous
/// run of `BLOCK_ROWS` elements in the destination.
pub const BLOCK_ROWS: usize = 8;

/// Columns per block. Kept at one so the column remainder loop is present
/// but never taken.
pub const BLOCK_COLS: usize = 1;

/// Staging capacity in elements: an 8×8 tile of double-width entries.
pub const STAGING_LEN: usize = BLOCK_ROWS * BLOCK_ROWS;

const _: () = assert!(BLOCK_ROWS * BLOCK_COLS <= STAGING_LEN);
