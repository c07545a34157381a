// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Error taxonomy shared by every stage of a tessellation run.

use thiserror::Error;

use crate::bucketalloc::RecordKind;

/// Why a contour or a run was rejected as invalid input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("coordinate is NaN or infinite")]
    NonFiniteCoordinate,
    #[error("vertex size {0} is not 2 or 3")]
    VertexSize(usize),
    #[error("stride {stride} is shorter than vertex size {size}")]
    Stride { stride: usize, size: usize },
    #[error("buffer of {len} values cannot hold {count} vertices")]
    BufferTooShort { len: usize, count: usize },
    #[error("polygon size {0} is below 3")]
    PolygonSize(usize),
    #[error("{0} left the finite range")]
    PredicateOverflow(&'static str),
    #[error("more than {0} intersection vertices were created")]
    IntersectionLimit(usize),
    #[error("inconsistent mesh topology in {0}")]
    Topology(&'static str),
}

/// Errors surfaced by the tessellator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TessError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),
    #[error("out of memory: {0:?} pool exhausted")]
    OutOfMemory(RecordKind),
}

/// Result type used across the crate.
pub type Result<T, E = TessError> = std::result::Result<T, E>;

/// Status of the last operation on a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TessStatus {
    #[default]
    Ok,
    OutOfMemory,
    InvalidInput,
}

impl From<&TessError> for TessStatus {
    fn from(err: &TessError) -> Self {
        match err {
            TessError::InvalidInput(_) => TessStatus::InvalidInput,
            TessError::OutOfMemory(_) => TessStatus::OutOfMemory,
        }
    }
}

/// Fails with [`InvalidInput::PredicateOverflow`] unless `value` is finite.
#[inline]
pub(crate) fn finite(value: f32, what: &'static str) -> Result<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InvalidInput::PredicateOverflow(what).into())
    }
}
