//! The notch planner.
//!
//! A notch is an open chain cut into the part from its boundary. The
//! planner machines it in two halves from a single entry seam near the
//! middle, leaving small wire joints at the quarter points and around
//! flex runs so the offcut stays attached until the very end. The
//! output is an ordered [`SequenceBlock`] list over a re-split copy of
//! the chain, covering every segment index exactly once.
//!
//! Edge notches (chains hugging the part boundary) and short or nearly
//! closed chains skip all of that and are machined in one plain pass.

mod approach;
mod flex;
mod points;
mod sequence;

pub use approach::{is_edge_notch, notch_entry, total_notch_tooling_length};
pub use points::NotchPointInfo;

use laserkit_core::{Bound3, Point3, Tooling};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{InvariantError, Result};
use crate::section::{check_full_coverage, SequenceBlock};
use crate::settings::PlannerSettings;

use approach::{is_forward_first, select_approach_slot};
use flex::{bracket_flex_runs, recompute_points_against_flex};
use points::{
    check_point_info, enforce_end_separation, place_fraction_points, resolve_indices,
    resolve_point_index,
};
use sequence::{forward_sequences, reverse_sequences, Mark};

/// How a notch chain was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotchPlanKind {
    /// Chain running along the part edge; machined in one pass.
    EdgeNotch,
    /// Short or nearly closed chain; machined in one pass.
    ShortPerimeter,
    /// Full two-half sequence with wire joints and gambits.
    General,
}

/// A fully sequenced notch.
#[derive(Debug, Clone)]
pub struct NotchPlan {
    /// The chain the blocks index into, with all splits applied.
    pub tooling: Tooling,
    /// Machining order.
    pub blocks: Vec<SequenceBlock>,
    pub kind: NotchPlanKind,
    /// The tracked fraction points as finally used.
    pub points: [NotchPointInfo; 3],
    /// Which fraction slot carries the approach; `None` for the
    /// single-pass kinds.
    pub approach_slot: Option<usize>,
    /// Whether the ascending half is machined first.
    pub forward_first: bool,
}

/// Whether the chain is too short, or too nearly closed, for wire
/// joints to make sense.
pub(crate) fn is_short_perimeter(tooling: &Tooling, settings: &PlannerSettings) -> Result<bool> {
    if tooling.perimeter()? < settings.min_notch_length_threshold {
        return Ok(true);
    }
    let first = tooling.segment(0)?.curve.start();
    let last = tooling.segment(tooling.len() - 1)?.curve.end();
    Ok(last.dist_to(&first) <= settings.min_notch_length_threshold)
}

/// Index of the segment ending at `pt`. Every tracked point must sit
/// on a segment boundary once the splits are in.
fn boundary_index(tooling: &Tooling, pt: &Point3) -> Result<usize> {
    if let Some(idx) = resolve_point_index(tooling, pt) {
        return Ok(idx);
    }
    let mut index = 0;
    let mut distance = f64::INFINITY;
    for (i, seg) in tooling.segs.iter().enumerate() {
        let d = seg.curve.end().dist_to(pt);
        if d < distance {
            index = i;
            distance = d;
        }
    }
    Err(InvariantError::PointIndexMismatch { index, distance }.into())
}

fn single_pass_plan(
    tooling: Tooling,
    kind: NotchPlanKind,
    settings: &PlannerSettings,
) -> Result<NotchPlan> {
    let blocks = vec![SequenceBlock::machine_forward(0, tooling.len() - 1)?];
    let [a, b, c] = settings.notch_fractions;
    Ok(NotchPlan {
        tooling,
        blocks,
        kind,
        points: [
            NotchPointInfo::disabled(a),
            NotchPointInfo::disabled(b),
            NotchPointInfo::disabled(c),
        ],
        approach_slot: None,
        forward_first: true,
    })
}

impl NotchPlan {
    /// Plans the machining sequence for one notch chain.
    pub fn build(tooling: Tooling, part: &Bound3, settings: &PlannerSettings) -> Result<NotchPlan> {
        settings.validate()?;
        let mut work = tooling;
        work.fix_chain()?;
        work.check_chain()?;

        if is_edge_notch(&work, part, settings)? {
            info!(name = %work.name, "edge notch, single pass");
            return single_pass_plan(work, NotchPlanKind::EdgeNotch, settings);
        }
        if is_short_perimeter(&work, settings)? {
            info!(name = %work.name, "short perimeter, single pass");
            return single_pass_plan(work, NotchPlanKind::ShortPerimeter, settings);
        }

        let feasible = work.mark_feasible()?;
        let mut points = place_fraction_points(&work, settings, &feasible, false)?;
        enforce_end_separation(&work, &feasible, &mut points)?;
        recompute_points_against_flex(&work, &feasible, &mut points)?;
        let approach_slot = select_approach_slot(&points)?;

        let gap = settings.effective_wire_joint_gap();
        let mut post_points: [Option<Point3>; 3] = [None, None, None];
        let mut pre_approach_point = None;
        for slot in 0..3 {
            let Some(pt) = points[slot].point else {
                continue;
            };
            work.split_at(&pt)?;
            work.merge_segments();
            let (post, _) = work.point_at_length_from_point(&pt, gap)?;
            work.split_at(&post)?;
            work.merge_segments();
            post_points[slot] = Some(post);
            if slot == approach_slot {
                let from_start = work.length_from_start_to_point(&pt)?;
                let (pre, _) = work.point_and_index_at_length_forward(0, from_start - gap)?;
                work.split_at(&pre)?;
                work.merge_segments();
                pre_approach_point = Some(pre);
            }
        }
        let quads = bracket_flex_runs(&mut work, gap)?;

        work.check_chain()?;
        resolve_indices(&work, &mut points);
        check_point_info(&work, &points)?;

        let approach_idx = points[approach_slot]
            .seg_index
            .ok_or(InvariantError::NoApproachPoint)?;
        let pre_idx = match pre_approach_point {
            Some(ref pt) => boundary_index(&work, pt)?,
            None => return Err(InvariantError::NoApproachPoint.into()),
        };
        let post_idx = match post_points[approach_slot] {
            Some(ref pt) => boundary_index(&work, pt)?,
            None => return Err(InvariantError::NoApproachPoint.into()),
        };
        debug!(pre_idx, approach_idx, post_idx, "approach triple resolved");

        let count = work.len();
        let mut fwd_entries: Vec<(usize, Mark)> = Vec::new();
        let mut rev_entries: Vec<(usize, Mark)> = vec![(0, Mark::Zero)];
        for slot in 0..3 {
            if slot == approach_slot {
                continue;
            }
            let Some(at_idx) = points[slot].seg_index else {
                continue;
            };
            let Some(ref post_pt) = post_points[slot] else {
                continue;
            };
            let post_slot_idx = boundary_index(&work, post_pt)?;
            if at_idx > post_idx {
                fwd_entries.push((at_idx, Mark::At(slot)));
                fwd_entries.push((post_slot_idx, Mark::Post(slot)));
            } else if post_slot_idx <= pre_idx {
                rev_entries.push((at_idx, Mark::At(slot)));
                rev_entries.push((post_slot_idx, Mark::Post(slot)));
            } else {
                return Err(InvariantError::IncompatibleMarks {
                    prev: "Approach",
                    curr: "Post",
                }
                .into());
            }
        }
        for (run, quad) in quads.iter().enumerate() {
            let before = boundary_index(&work, &quad[0])?;
            let start = boundary_index(&work, &quad[1])?;
            let end = boundary_index(&work, &quad[2])?;
            let after = boundary_index(&work, &quad[3])?;
            if before > post_idx {
                fwd_entries.push((before, Mark::FlexBeforeStart(run)));
                fwd_entries.push((start, Mark::FlexStart(run)));
                fwd_entries.push((end, Mark::FlexEnd(run)));
                fwd_entries.push((after, Mark::FlexAfterEnd(run)));
            } else if after <= pre_idx {
                rev_entries.push((after, Mark::FlexAfterEnd(run)));
                rev_entries.push((end, Mark::FlexEnd(run)));
                rev_entries.push((start, Mark::FlexStart(run)));
                rev_entries.push((before, Mark::FlexBeforeStart(run)));
            } else {
                return Err(InvariantError::IncompatibleMarks {
                    prev: "Approach",
                    curr: "FlexBeforeStart",
                }
                .into());
            }
        }
        fwd_entries.sort_by_key(|e| e.0);
        rev_entries.sort_by(|a, b| b.0.cmp(&a.0));

        let fwd_blocks = forward_sequences(&fwd_entries, post_idx, count)?;
        let rev_blocks = reverse_sequences(&rev_entries, pre_idx)?;
        let forward_first = is_forward_first(&work, part)?;

        let mut blocks = vec![SequenceBlock::WireJointApproach];
        if forward_first {
            blocks.push(SequenceBlock::GambitAt50Reverse {
                index: approach_idx,
            });
            blocks.extend(fwd_blocks);
            blocks.push(SequenceBlock::MoveToMidApproach);
            blocks.push(SequenceBlock::ApproachOnReEntry);
            blocks.push(SequenceBlock::GambitAt50Forward { index: post_idx });
            blocks.extend(rev_blocks);
        } else {
            blocks.push(SequenceBlock::GambitAt50Forward { index: post_idx });
            blocks.extend(rev_blocks);
            blocks.push(SequenceBlock::MoveToMidApproach);
            blocks.push(SequenceBlock::ApproachOnReEntry);
            blocks.push(SequenceBlock::GambitAt50Reverse {
                index: approach_idx,
            });
            blocks.extend(fwd_blocks);
        }
        check_full_coverage(&blocks, count)?;
        info!(
            name = %work.name,
            count,
            blocks = blocks.len(),
            forward_first,
            "notch plan assembled"
        );

        Ok(NotchPlan {
            tooling: work,
            blocks,
            kind: NotchPlanKind::General,
            points,
            approach_slot: Some(approach_slot),
            forward_first,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::Direction;
    use laserkit_core::{Curve3, Point3, ToolingKind, ToolingSegment, Vector3};

    fn straight_notch() -> Tooling {
        let segs = (0..6)
            .map(|i| {
                let x0 = 50.0 * i as f64;
                ToolingSegment::with_normal(
                    Curve3::line(Point3::new(x0, 0.0, 0.0), Point3::new(x0 + 50.0, 0.0, 0.0)),
                    Vector3::z_axis(),
                )
            })
            .collect();
        Tooling::new("n300", ToolingKind::Notch, segs)
    }

    fn flexed_notch() -> Tooling {
        let segs = (0..7)
            .map(|i| {
                let x0 = 50.0 * i as f64;
                let curve =
                    Curve3::line(Point3::new(x0, 0.0, 0.0), Point3::new(x0 + 50.0, 0.0, 0.0));
                if i == 3 {
                    ToolingSegment::new(curve, Vector3::z_axis(), Vector3::y_axis())
                } else {
                    ToolingSegment::with_normal(curve, Vector3::z_axis())
                }
            })
            .collect();
        Tooling::new("n-flex", ToolingKind::Notch, segs)
    }

    fn interior_part() -> Bound3 {
        Bound3::new(Point3::new(-50.0, -200.0, 0.0), Point3::new(400.0, 100.0, 0.0))
    }

    fn edge_part() -> Bound3 {
        Bound3::new(Point3::new(-50.0, -200.0, 0.0), Point3::new(400.0, 0.0, 0.0))
    }

    #[test]
    fn test_straight_notch_plan() {
        let plan = NotchPlan::build(
            straight_notch(),
            &interior_part(),
            &PlannerSettings::default(),
        )
        .unwrap();

        assert_eq!(plan.kind, NotchPlanKind::General);
        assert_eq!(plan.approach_slot, Some(1));
        assert!(!plan.forward_first);
        assert_eq!(plan.tooling.len(), 12);

        // One entry, one re-entry, one mid move, two gambits.
        let count_of = |pred: fn(&SequenceBlock) -> bool| {
            plan.blocks.iter().filter(|b| pred(b)).count()
        };
        assert_eq!(count_of(|b| matches!(b, SequenceBlock::WireJointApproach)), 1);
        assert_eq!(count_of(|b| matches!(b, SequenceBlock::ApproachOnReEntry)), 1);
        assert_eq!(count_of(|b| matches!(b, SequenceBlock::MoveToMidApproach)), 1);
        assert_eq!(count_of(|b| b.is_gambit()), 2);
        // One jump per surviving outer fraction point.
        assert_eq!(count_of(|b| b.is_wire_joint_jump()), 2);

        assert_eq!(plan.blocks[0], SequenceBlock::WireJointApproach);
        check_full_coverage(&plan.blocks, plan.tooling.len()).unwrap();

        // Both halves present, in both directions.
        let dirs: Vec<_> = plan
            .blocks
            .iter()
            .filter(|b| b.is_machining())
            .map(|b| b.direction().unwrap())
            .collect();
        assert!(dirs.contains(&Direction::Forward));
        assert!(dirs.contains(&Direction::Reverse));
    }

    #[test]
    fn test_flexed_notch_plan() {
        let plan = NotchPlan::build(
            flexed_notch(),
            &interior_part(),
            &PlannerSettings::default(),
        )
        .unwrap();

        assert_eq!(plan.kind, NotchPlanKind::General);
        // The approach relocated off the flex run to 40%.
        assert!((plan.points[1].fraction - 0.40).abs() < 1e-9);

        let flex_machining: Vec<_> = plan
            .blocks
            .iter()
            .filter(|b| {
                matches!(
                    b,
                    SequenceBlock::MachineFlexToolingForward { .. }
                        | SequenceBlock::MachineFlexToolingReverse { .. }
                )
            })
            .collect();
        assert_eq!(flex_machining.len(), 1);

        let flex_jumps = plan
            .blocks
            .iter()
            .filter(|b| match b {
                SequenceBlock::WireJointTraceJumpForward { on_flex, .. }
                | SequenceBlock::WireJointTraceJumpReverse { on_flex, .. } => *on_flex,
                _ => false,
            })
            .count();
        assert_eq!(flex_jumps, 2);

        check_full_coverage(&plan.blocks, plan.tooling.len()).unwrap();
    }

    #[test]
    fn test_edge_notch_single_pass() {
        let plan = NotchPlan::build(
            straight_notch(),
            &edge_part(),
            &PlannerSettings::default(),
        )
        .unwrap();
        assert_eq!(plan.kind, NotchPlanKind::EdgeNotch);
        assert_eq!(plan.approach_slot, None);
        assert_eq!(
            plan.blocks,
            vec![SequenceBlock::machine_forward(0, 5).unwrap()]
        );
    }

    #[test]
    fn test_short_chain_single_pass() {
        let segs = vec![ToolingSegment::with_normal(
            Curve3::line(Point3::origin(), Point3::new(40.0, 0.0, 0.0)),
            Vector3::z_axis(),
        )];
        let plan = NotchPlan::build(
            Tooling::new("stub", ToolingKind::Notch, segs),
            &interior_part(),
            &PlannerSettings::default(),
        )
        .unwrap();
        assert_eq!(plan.kind, NotchPlanKind::ShortPerimeter);
        assert_eq!(
            plan.blocks,
            vec![SequenceBlock::machine_forward(0, 0).unwrap()]
        );
    }

    #[test]
    fn test_disabled_wire_joints_plan_has_no_jumps() {
        let settings = PlannerSettings {
            notch_wire_joint_distance: 0.2,
            ..Default::default()
        };
        let plan = NotchPlan::build(straight_notch(), &interior_part(), &settings).unwrap();

        assert_eq!(plan.kind, NotchPlanKind::General);
        assert!(plan.blocks.iter().all(|b| !b.is_wire_joint_jump()));
        assert_eq!(
            plan.blocks.iter().filter(|b| b.is_machining()).count(),
            2
        );
        assert_eq!(plan.blocks.iter().filter(|b| b.is_gambit()).count(), 2);
        check_full_coverage(&plan.blocks, plan.tooling.len()).unwrap();
    }
}
