//! JSON part files and the feature planning driver.
//!
//! A part file carries the part bound, optional planner settings, and
//! the feature chains to sequence. [`plan_part`] dispatches each
//! feature to the matching planner and collects the results into a
//! [`PlanReport`]. A feature the planners reject is logged and left
//! out; the rest of the part still gets a plan.

use laserkit_camtools::{
    treat_as_cutout, CutOutPlan, NotchPlan, PlanReport, PlannerSettings, Result,
};
use laserkit_core::{Bound3, Tooling, ToolingKind};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// On-disk description of one part and its features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartFile {
    /// Bounding box of the finished part.
    pub part: Bound3,
    #[serde(default)]
    pub settings: PlannerSettings,
    pub toolings: Vec<Tooling>,
}

impl PartFile {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Plans every feature in the file.
pub fn plan_part(file: &PartFile) -> Result<PlanReport> {
    file.settings.validate()?;
    let mut report = PlanReport::new(file.part);
    for tooling in &file.toolings {
        if let Err(err) = plan_feature(&mut report, tooling, &file.part, &file.settings) {
            warn!(name = %tooling.name, error = %err, "feature rejected, leaving it out of the plan");
        }
    }
    info!(
        features = report.features.len(),
        total_cut_length = report.total_cut_length(),
        "part planned"
    );
    Ok(report)
}

/// Runs one feature through the planner its kind and size call for.
/// Small holes and marks get a plain single pass.
fn plan_feature(
    report: &mut PlanReport,
    tooling: &Tooling,
    part: &Bound3,
    settings: &PlannerSettings,
) -> Result<()> {
    if treat_as_cutout(tooling, settings)? {
        let plan = CutOutPlan::build(tooling.clone(), settings)?;
        report.add_cutout(&plan)?;
    } else if tooling.kind == ToolingKind::Notch {
        let plan = NotchPlan::build(tooling.clone(), part, settings)?;
        report.add_notch(&plan, part, settings)?;
    } else {
        report.add_plain(tooling)?;
    }
    Ok(())
}
