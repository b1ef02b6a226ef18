//! Error types for the CAM planners.
//!
//! Planner failures fall into three groups: geometry that cannot be
//! resolved (propagated from `laserkit-core`), sequencing invariants
//! that did not hold, and part configurations the planners do not
//! machine. All of them abort the plan for the affected feature.

use thiserror::Error;

/// Errors that can occur while planning a tooling sequence.
#[derive(Error, Debug)]
pub enum PlanError {
    /// Invalid parameters were provided to a planner.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// The feature lies in a configuration the planners do not machine.
    #[error("Unsupported configuration: {0}")]
    Unsupported(String),

    /// A structural invariant of the sequencer did not hold.
    #[error("Sequence invariant violated: {0}")]
    Invariant(#[from] InvariantError),

    /// A geometry kernel operation failed.
    #[error("Geometry error: {0}")]
    Geometry(#[from] laserkit_core::Error),

    /// Serialization of a plan report failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Structural failures detected inside the sequencers.
///
/// Every one of these means the planner produced, or was about to
/// produce, a block list that would machine a segment twice, skip one,
/// or leave a wire joint of the wrong width. None are recoverable.
#[derive(Error, Debug)]
pub enum InvariantError {
    /// Two sequence marks resolved to the same segment index.
    #[error("Two sequence marks resolved to segment {index}")]
    DuplicateIndex { index: usize },

    /// The terminal segment was claimed by two incompatible marks.
    #[error("Terminal segment {index} is claimed by two marks")]
    TerminalRevisited { index: usize },

    /// A reverse pass reached the chain start and kept going.
    #[error("Reverse pass reached segment zero and continued")]
    PassedChainStart,

    /// Two adjacent sequence marks cannot follow one another.
    #[error("Mark '{curr}' cannot follow mark '{prev}'")]
    IncompatibleMarks {
        prev: &'static str,
        curr: &'static str,
    },

    /// A machining span was constructed with its bounds out of order.
    #[error("Machining span out of order: {lo}..{hi}")]
    SpanOutOfOrder { lo: usize, hi: usize },

    /// The block list is not ordered and disjoint.
    #[error("Blocks out of order near block {index}")]
    BlocksOutOfOrder { index: usize },

    /// A wire-joint block does not span the configured joint width.
    #[error("Wire joint at segment {index} spans {length:.3}, expected {expected:.3}")]
    WireJointLength {
        index: usize,
        length: f64,
        expected: f64,
    },

    /// A tracked split point no longer coincides with its segment end.
    #[error("Tracked point for segment {index} is off its segment end by {distance}")]
    PointIndexMismatch { index: usize, distance: f64 },

    /// The block list does not cover every segment exactly once.
    #[error("Sequence covers segment {index} {count} times")]
    CoverageGap { index: usize, count: usize },

    /// No usable approach point survived placement and flex handling.
    #[error("No usable approach point among the notch fractions")]
    NoApproachPoint,
}

/// Result alias for planner operations.
pub type Result<T> = std::result::Result<T, PlanError>;

/// Result alias for invariant checks.
pub type InvariantResult<T> = std::result::Result<T, InvariantError>;

impl PlanError {
    /// Returns true if this error originated in the geometry kernel.
    pub fn is_geometry(&self) -> bool {
        matches!(self, PlanError::Geometry(_))
    }

    /// Returns true if this error is a sequencing invariant failure.
    pub fn is_invariant(&self) -> bool {
        matches!(self, PlanError::Invariant(_))
    }
}
