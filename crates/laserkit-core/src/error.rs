//! Error handling for the LaserKit core.
//!
//! Two error families cover the kernel and the chain model:
//! - Geometry errors (degenerate inputs, failed arc fits, membership tests)
//! - Chain errors (tooling-chain continuity and flange classification)
//!
//! All error types use `thiserror`. Geometry queries never panic on bad
//! input; they return one of these instead, and the sequencers upstream
//! decide whether that aborts the feature.

use thiserror::Error;

/// Geometry kernel error type
///
/// Represents a geometric impossibility: an input on which the requested
/// curve query has no meaningful answer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A line whose endpoints coincide cannot be parameterized
    #[error("Degenerate line of length {length}")]
    DegenerateLine {
        /// Distance between the line's endpoints.
        length: f64,
    },

    /// The arc's stored samples are collinear, so no circle fits them
    #[error("Arc samples are collinear; cannot fit center and radius")]
    CollinearArc,

    /// A point claimed to be on a curve is not, within tolerance
    #[error("Point ({x}, {y}, {z}) is not on the curve")]
    PointNotOnCurve {
        /// X coordinate of the offending point.
        x: f64,
        /// Y coordinate of the offending point.
        y: f64,
        /// Z coordinate of the offending point.
        z: f64,
    },

    /// None of the angle/sense branches matched the arc's configuration
    #[error("Arc angle/sense could not be resolved: {reason}")]
    UnresolvedArcBranch {
        /// Which disambiguation step failed.
        reason: String,
    },

    /// A scalar argument fell outside its valid interval
    #[error("Parameter '{name}' out of range: {value} (valid: {min}..{max})")]
    OutOfRange {
        /// The parameter name.
        name: &'static str,
        /// The offending value.
        value: f64,
        /// Lower bound of the valid interval.
        min: f64,
        /// Upper bound of the valid interval.
        max: f64,
    },

    /// Two curves or directions that were expected to intersect do not
    #[error("No intersection: {reason}")]
    NoIntersection {
        /// Why the intersection is empty.
        reason: String,
    },
}

/// Tooling-chain error type
///
/// Represents a violated chain invariant or an unsupported flange
/// configuration discovered while walking a chain.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChainError {
    /// The chain has no segments
    #[error("Tooling chain is empty")]
    EmptyChain,

    /// Consecutive segments do not meet within tolerance
    #[error("Chain discontinuity at segment {index}: gap {gap}")]
    Discontinuity {
        /// Index of the segment whose start does not meet the previous end.
        index: usize,
        /// Distance between the previous end and this start.
        gap: f64,
    },

    /// A segment index is outside the chain
    #[error("Segment index {index} out of bounds (chain has {len} segments)")]
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// Number of segments in the chain.
        len: usize,
    },

    /// A tracked point no longer coincides with its segment's end
    #[error("Tracked point for segment {index} is not that segment's end (distance {distance})")]
    PointInfoMismatch {
        /// Index the point claims to mark.
        index: usize,
        /// Distance from the point to the segment end.
        distance: f64,
    },

    /// The segment normals describe a flange the planner does not machine
    #[error("Unsupported flange orientation (normal ({x}, {y}, {z}))")]
    UnsupportedFlange {
        /// X component of the offending normal.
        x: f64,
        /// Y component of the offending normal.
        y: f64,
        /// Z component of the offending normal.
        z: f64,
    },
}

/// Main error type for the LaserKit core
///
/// A unified error type that can represent any error from the kernel or
/// the chain model. This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Geometry kernel error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Tooling-chain error
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a geometry error
    pub fn is_geometry_error(&self) -> bool {
        matches!(self, Error::Geometry(_))
    }

    /// Check if this is a chain error
    pub fn is_chain_error(&self) -> bool {
        matches!(self, Error::Chain(_))
    }

    /// Check if this error marks a point-membership failure
    pub fn is_point_not_on_curve(&self) -> bool {
        matches!(self, Error::Geometry(GeometryError::PointNotOnCurve { .. }))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
