//! # LaserKit CAM Tools
//!
//! CAM planners that turn tooling chains from `laserkit-core` into
//! machining sequences for the laser head.
//!
//! ## Planners
//!
//! - **CutOut**: closed-loop laps with wire joints holding the slug,
//!   flex crossings bracketed and wide webs pinned at fixed fractions
//! - **Notch**: open chains cut in two passes from a mid-length entry,
//!   split at the quarter points and partitioned around the approach
//!
//! ## Supporting Infrastructure
//!
//! - **Sections**: the tagged block list both planners emit, with
//!   coverage checking
//! - **Attributes**: per-point exit geometry for approach placement
//! - **Reports**: chrono-stamped plan summaries for the scheduler and
//!   header writer

pub mod attrs;
pub mod cutout;
pub mod error;
pub mod notch;
pub mod report;
pub mod section;
pub mod settings;

pub use attrs::{compute_notch_attribute, NotchAttribute};

pub use cutout::{treat_as_cutout, CutOutPlan};

pub use error::{InvariantError, InvariantResult, PlanError, Result};

pub use notch::{
    is_edge_notch, notch_entry, total_notch_tooling_length, NotchPlan, NotchPlanKind,
    NotchPointInfo,
};

pub use report::{FeatureReport, PlanReport};

pub use section::{check_full_coverage, coverage_counts, Direction, SequenceBlock, Span};

pub use settings::PlannerSettings;
