//! Plan summaries for the scheduler and header writer.
//!
//! A [`PlanReport`] collects one entry per planned feature: entry
//! position, estimated cut length and the block list. The scheduler
//! orders features by it and the G-code writer prints it as a header,
//! neither of which needs to re-run sequencing.

use chrono::{DateTime, Utc};
use laserkit_core::{Bound3, Point3, Tooling, ToolingKind};
use serde::{Deserialize, Serialize};

use crate::cutout::CutOutPlan;
use crate::error::Result;
use crate::notch::{notch_entry, total_notch_tooling_length, NotchPlan, NotchPlanKind};
use crate::section::SequenceBlock;
use crate::settings::PlannerSettings;

/// Summary of one planned feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureReport {
    pub name: String,
    pub kind: ToolingKind,
    /// How the notch was classified; `None` for cutouts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notch_kind: Option<NotchPlanKind>,
    /// Segment count of the re-split chain the blocks index into.
    pub segments: usize,
    /// Estimated total cut length in millimeters, approaches included.
    pub cut_length: f64,
    /// Machine entry position for this feature.
    pub entry: Point3,
    pub blocks: Vec<SequenceBlock>,
}

/// A chrono-stamped summary of every planned feature on one part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanReport {
    pub generated_at: DateTime<Utc>,
    pub part: Bound3,
    pub features: Vec<FeatureReport>,
}

impl PlanReport {
    pub fn new(part: Bound3) -> Self {
        PlanReport {
            generated_at: Utc::now(),
            part,
            features: Vec::new(),
        }
    }

    /// Adds a sequenced notch. Entry and cut length come from the
    /// sizing queries, which are idempotent on the re-split chain.
    pub fn add_notch(
        &mut self,
        plan: &NotchPlan,
        part: &Bound3,
        settings: &PlannerSettings,
    ) -> Result<()> {
        let (entry, _) = notch_entry(&plan.tooling, part, settings)?;
        let cut_length = total_notch_tooling_length(&plan.tooling, part, settings)?;
        self.features.push(FeatureReport {
            name: plan.tooling.name.clone(),
            kind: plan.tooling.kind,
            notch_kind: Some(plan.kind),
            segments: plan.tooling.len(),
            cut_length,
            entry,
            blocks: plan.blocks.clone(),
        });
        Ok(())
    }

    /// Adds a sequenced cutout. The lap pierces at the loop start and
    /// cuts the full perimeter.
    pub fn add_cutout(&mut self, plan: &CutOutPlan) -> Result<()> {
        let entry = plan.tooling.segment(0)?.curve.start();
        self.features.push(FeatureReport {
            name: plan.tooling.name.clone(),
            kind: plan.tooling.kind,
            notch_kind: None,
            segments: plan.tooling.len(),
            cut_length: plan.tooling.perimeter()?,
            entry,
            blocks: plan.blocks.clone(),
        });
        Ok(())
    }

    /// Adds a feature the planners do not sequence (marks, small
    /// holes): one forward pass over the raw chain.
    pub fn add_plain(&mut self, tooling: &Tooling) -> Result<()> {
        let entry = tooling.segment(0)?.curve.start();
        self.features.push(FeatureReport {
            name: tooling.name.clone(),
            kind: tooling.kind,
            notch_kind: None,
            segments: tooling.len(),
            cut_length: tooling.perimeter()?,
            entry,
            blocks: vec![SequenceBlock::machine_forward(0, tooling.len() - 1)?],
        });
        Ok(())
    }

    /// Summed cut length over every feature.
    pub fn total_cut_length(&self) -> f64 {
        self.features.iter().map(|f| f.cut_length).sum()
    }

    /// Header comment block for the start of a G-code file.
    pub fn header_comment(&self) -> String {
        let mut out = String::new();
        out.push_str("; LaserKit toolpath plan\n");
        out.push_str(&format!(
            "; Generated: {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        out.push_str(&format!(
            "; Part bound: ({:.1}, {:.1}, {:.1}) to ({:.1}, {:.1}, {:.1})\n",
            self.part.min.x,
            self.part.min.y,
            self.part.min.z,
            self.part.max.x,
            self.part.max.y,
            self.part.max.z
        ));
        out.push_str(&format!("; Features: {}\n", self.features.len()));
        out.push_str(&format!(
            "; Total cut length: {:.1}mm\n",
            self.total_cut_length()
        ));
        for feature in &self.features {
            out.push_str(&format!(
                "; - {} ({:?}): {} blocks, {:.1}mm, entry ({:.2}, {:.2}, {:.2})\n",
                feature.name,
                feature.kind,
                feature.blocks.len(),
                feature.cut_length,
                feature.entry.x,
                feature.entry.y,
                feature.entry.z
            ));
        }
        out
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
