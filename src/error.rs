//! Custom error types for the geometry engine.
//!
//! This module defines `CitsError`, the error type shared by every stage of plan
//! construction. Using the `thiserror` crate, it gives callers one consistent way
//! to surface pre-flight failures to the operator before any stage motor moves.
//!
//! ## Error Hierarchy
//!
//! - **`InvalidArea`**: A single area descriptor broke one of its invariants. The
//!   offending field, its value and the violated constraint are all reported.
//! - **`EmptyPlan`**: Composition was asked to build a plan with no areas, or with
//!   areas that add up to zero points.
//! - **`InvalidFrame`**: A scan frame parameter is outside the instrument's
//!   documented range (see [`ScanFrame::check_ranges`](crate::frame::ScanFrame::check_ranges)).
//! - **`InvalidScanlines`**: A scan-line distribution was requested with inputs it
//!   cannot split (e.g. fewer than two rows).
//! - **`InvalidMoveScript`** / **`InvalidMoveDistance`**: An auto-move script
//!   contains an unknown direction letter, or the step distance is unusable.
//! - **`Action`**: A failure reported by the hardware collaborator while a plan
//!   is being executed by the [`runner`](crate::runner).
//!
//! All variants except `Action` are deterministic: a given input either always
//! succeeds or always fails with the same error.

use thiserror::Error;

/// Convenience alias for results using the engine error type.
pub type CitsResult<T> = std::result::Result<T, CitsError>;

/// Errors raised while validating, composing or executing a measurement plan.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CitsError {
    /// An area descriptor broke one of its invariants.
    #[error("Invalid area: {field} = {value} violates {constraint}")]
    InvalidArea {
        /// Offending field name.
        field: &'static str,
        /// Rejected value as entered.
        value: String,
        /// The violated constraint.
        constraint: &'static str,
    },

    /// No areas, or areas adding up to zero points.
    #[error("Measurement plan is empty (no areas or zero total points)")]
    EmptyPlan,

    /// A frame parameter is outside the instrument's range.
    #[error("Invalid scan frame: {field} = {value} violates {constraint}")]
    InvalidFrame {
        /// Offending field name.
        field: &'static str,
        /// Rejected value.
        value: String,
        /// The violated range.
        constraint: &'static str,
    },

    /// Scan lines cannot be split for the given inputs.
    #[error("Scan-line distribution error: {0}")]
    InvalidScanlines(String),

    /// Unknown letter in an auto-move script.
    #[error("Invalid move script: unexpected '{found}' at position {position}")]
    InvalidMoveScript {
        /// Character index in the script as written.
        position: usize,
        /// The unknown character.
        found: char,
    },

    /// Auto-move step distance is not finite and positive.
    #[error("Invalid move distance {0}: must be finite and > 0")]
    InvalidMoveDistance(f64),

    /// Failure reported by the hardware side during a run.
    #[error("Point action failed: {0}")]
    Action(String),
}

impl CitsError {
    /// Name of the offending field for `InvalidArea`/`InvalidFrame`, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            CitsError::InvalidArea { field, .. } | CitsError::InvalidFrame { field, .. } => {
                Some(*field)
            }
            _ => None,
        }
    }
}
