//! # LaserKit
//!
//! Laser-cutting toolpath sequencing for sheet-metal chassis parts:
//! - Closed cutouts held by wire joints while the slug drops free
//! - Open notches cut in two passes from a mid-length entry
//! - Flex (bend) crossings bracketed so the part folds cleanly
//!
//! ## Architecture
//!
//! LaserKit is organized as a workspace with multiple crates:
//!
//! 1. **laserkit-core** - Tolerance math, transforms, the Line|Arc
//!    curve kernel, flange classification, and the tooling chain model
//! 2. **laserkit-camtools** - The CutOut and Notch sequencers, plan
//!    blocks, and plan reports
//! 3. **laserkit** - Main binary that plans JSON part files
//!
//! ## Features
//!
//! - **Wire Joints**: slugs and offcuts stay tabbed to the sheet until
//!   every feature is cut
//! - **Flex Handling**: bend bands are machined as separate passes with
//!   hand-back joints on both sides
//! - **Wide Webs**: large cutouts on the web get extra joints at fixed
//!   perimeter fractions
//! - **Plan Reports**: chrono-stamped JSON summaries for the scheduler
//!   and G-code header writer

pub mod partfile;

// Re-export modules for main.rs
pub use laserkit_camtools as camtools;
pub use laserkit_core as geometry;

pub use laserkit_core::{
    Arc3, ArcSense, Bound3, Curve3, FlangeKind, Line3, Point3, Tooling, ToolingKind,
    ToolingSegment, Vector3, XForm4,
};

pub use laserkit_camtools::{
    check_full_coverage, is_edge_notch, notch_entry, total_notch_tooling_length, CutOutPlan,
    Direction, FeatureReport, NotchPlan, NotchPlanKind, PlanError, PlanReport, PlannerSettings,
    SequenceBlock, Span,
};

pub use partfile::{plan_part, PartFile};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}
