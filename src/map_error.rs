//! MapError: Unified error type for the combinatorial map public APIs
//!
//! Every fallible operation of the crate (mark reservation, traversal
//! construction, attribute access, edit operations) reports through this
//! type instead of panicking.

use thiserror::Error;

use crate::topology::attribute::AttributeHandle;
use crate::topology::dart::DartHandle;
use crate::topology::mark::Mark;

/// Unified error type for combinatorial map operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MapError {
    /// Every slot of the mark pool is reserved.
    #[error("no more available mark: all {capacity} marks are reserved")]
    MarkPoolExhausted { capacity: usize },
    /// The mark was never reserved or has already been freed.
    #[error("mark {0:?} is not reserved")]
    MarkNotReserved(Mark),
    /// The dart handle does not refer to a live dart.
    #[error("dart {0:?} is not used by this map")]
    UnknownDart(DartHandle),
    /// The attribute handle does not refer to a live `dim`-attribute.
    #[error("{dim}-attribute {handle:?} is not used by this map")]
    UnknownAttribute { dim: usize, handle: AttributeHandle },
    /// A link level outside `0..=dimension`.
    #[error("level {level} is out of range for a {dimension}-map")]
    InvalidLevel { level: usize, dimension: usize },
    /// Orbit levels must be strictly increasing, at most the dimension, and must not start with `0, 1`.
    #[error("invalid orbit {levels:?}: {reason}")]
    InvalidOrbit {
        levels: Vec<usize>,
        reason: &'static str,
    },
    /// Cells are `i`-cells in dimension `dim` with `i <= dim + 1` and `dim <= dimension`.
    #[error("invalid {cell}-cell in dimension {dim} for a {dimension}-map")]
    InvalidCellDimension {
        cell: usize,
        dim: usize,
        dimension: usize,
    },
    /// `dim`-attributes are not enabled on this map.
    #[error("{0}-attributes are disabled")]
    AttributesDisabled(usize),
    /// `dim`-attributes are already enabled.
    #[error("{0}-attributes are already enabled")]
    AttributesAlreadyEnabled(usize),
    /// Typed access with a payload type that differs from the enabled one.
    #[error("{dim}-attributes store `{stored}`, not `{requested}`")]
    AttributeTypeMismatch {
        dim: usize,
        stored: &'static str,
        requested: &'static str,
    },
    /// The dart has no `dim`-attribute.
    #[error("dart {dart:?} has no {dim}-attribute")]
    MissingAttribute { dim: usize, dart: DartHandle },
    /// The operation needs a map of a higher dimension.
    #[error("`{operation}` needs dimension >= {required}, map has dimension {dimension}")]
    DimensionTooLow {
        operation: &'static str,
        required: usize,
        dimension: usize,
    },
    /// A documented precondition of an operation does not hold; the map is untouched.
    #[error("precondition of `{operation}` violated: {reason}")]
    PreconditionViolation {
        operation: &'static str,
        reason: &'static str,
    },
    /// A structural invariant does not hold.
    #[error("invalid map: {0}")]
    InvalidMap(String),
    /// Writing to a formatting sink failed.
    #[error("formatting error")]
    Format(#[from] std::fmt::Error),
}
