//! # LaserKit Core
//!
//! Geometry kernel and tooling chain model for LaserKit.
//! Provides tolerance math, rigid transforms, the Line|Arc curve variant
//! with its kernel operations, flange classification, and the
//! ToolingSegment/Tooling chain the CAM planners sequence.

pub mod curve;
pub mod error;
pub mod flange;
pub mod intersect;
pub mod math;
pub mod tooling;
pub mod xform;

pub use curve::{nudge_point_to_arc, perturb_point, Arc3, ArcSense, Curve3, Line3};

pub use error::{ChainError, Error, GeometryError, Result};

pub use flange::{classify_normal, classify_pair, is_on_flex, is_web_normal, lateral_axis, FlangeKind};

pub use intersect::{intersect_lines, LineIntersection};

pub use math::{eq, eq_tol, Bound3, Point3, Vector3, EPS, EPS_COARSE, EPS_SPLIT};

pub use tooling::{Tooling, ToolingKind, ToolingSegment};

pub use xform::XForm4;
