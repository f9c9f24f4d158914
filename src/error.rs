// Copyright 2025 Lars Brubaker
// License: MIT

//! Error types for tessellation.

use thiserror::Error;

/// Failures reported by [`Tessellator::tessellate`](crate::Tessellator).
///
/// Both variants leave the instance reset and reusable. Geometric
/// degeneracy is never an error: thin or zero-area input tessellates to a
/// (possibly empty) result instead of failing.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TessError {
    /// The input cannot produce a result: no usable contour, a non-finite
    /// or out-of-range coordinate, or an element size below 3.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// Internal storage was exhausted mid-run.
    #[error("tessellation arena exhausted")]
    Resource,
}
