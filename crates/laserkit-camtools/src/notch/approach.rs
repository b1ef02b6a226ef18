//! Approach selection, entry geometry and the notch sizing queries.
//!
//! The sizing queries (`notch_entry`, `total_notch_tooling_length`,
//! `is_edge_notch`) are independent of the planning pipeline: they
//! work on a throwaway copy of the chain, so calling them is free of
//! side effects and repeatable.

use laserkit_core::{lateral_axis, Bound3, Point3, Tooling, ToolingKind, Vector3, EPS};
use tracing::debug;

use super::is_short_perimeter;
use super::points::{place_fraction_points, resolve_point_index, NotchPointInfo};
use crate::attrs::{compute_notch_attribute, NotchAttribute};
use crate::error::{InvariantError, Result};
use crate::settings::{PlannerSettings, GAMBIT_STROKE_LENGTH};

/// Chain-end distance that short-circuits the entry anchor scan.
const ENTRY_END_DISTANCE: f64 = 50.0;

/// How far off the chain the first entry midpoint sits.
const APPROACH_MID_OFFSET: f64 = 0.5;

/// Boundary distance below which the chain is considered to hug the
/// part edge and the approach attributes are withdrawn.
// TODO: derive this floor from the approach length instead of 1mm.
const EDGE_BOUNDARY_MIN: f64 = 1.0;

/// The four off-chain positions of the notch entry, all derived from
/// the approach attribute and the entry anchor.
#[derive(Debug, Clone)]
pub(crate) struct ApproachGeometry {
    pub n_mid1: Point3,
    pub n_mid2: Point3,
    pub n1: Point3,
    pub n2: Point3,
    pub boundary_point: Point3,
}

/// Picks the slot whose point carries the approach: the 50% point if
/// it survived, else 25%, else 75%.
pub(crate) fn select_approach_slot(points: &[NotchPointInfo; 3]) -> Result<usize> {
    for slot in [1usize, 0, 2] {
        if points[slot].is_active() {
            return Ok(slot);
        }
    }
    Err(InvariantError::NoApproachPoint.into())
}

/// The anchor the entry strokes aim at.
///
/// When either chain end is laterally within 50mm of the 50% point the
/// anchor stays there; otherwise 51 candidates between 25% and 75% are
/// walked and the one most nearly equidistant (by arc length) from the
/// two open ends wins.
pub(crate) fn mid_entry_anchor(tooling: &Tooling, anchor50: &Point3) -> Result<Point3> {
    let first = tooling.segment(0)?;
    let last = tooling.segment(tooling.len() - 1)?;
    for (seg, end_pt) in [(first, first.curve.start()), (last, last.curve.end())] {
        let axis = lateral_axis(seg.flange()?);
        if (*anchor50 - end_pt).dot(&axis).abs() <= ENTRY_END_DISTANCE {
            return Ok(*anchor50);
        }
    }

    let perimeter = tooling.perimeter()?;
    let mut best = *anchor50;
    let mut best_score = f64::INFINITY;
    for i in 0..=50 {
        let fraction = 0.25 + 0.01 * i as f64;
        let (pt, _) = tooling.point_and_index_at_length_forward(0, fraction * perimeter)?;
        let from_start = tooling.length_from_start_to_point(&pt)?;
        let score = (from_start - (perimeter - from_start)).abs();
        if score < best_score {
            best_score = score;
            best = pt;
        }
    }
    Ok(best)
}

/// Builds the entry positions around `anchor`.
///
/// The first midpoint sits half a millimeter outward of the anchor,
/// the second one wire-joint gap back in; `n1`/`n2` are those two
/// offset sideways by the gap, on the scrap side.
pub(crate) fn approach_positions(
    attr: &NotchAttribute,
    anchor: &Point3,
    gap: f64,
) -> ApproachGeometry {
    let outward_dir = attr.outward.normalized();
    let n_mid1 = *anchor + outward_dir * APPROACH_MID_OFFSET;
    let n_mid2 = n_mid1 - outward_dir * gap;
    let n1 = n_mid1 + attr.scrap_side * gap;
    let n2 = n_mid2 + attr.scrap_side * gap;
    ApproachGeometry {
        n_mid1,
        n_mid2,
        n1,
        n2,
        boundary_point: attr.point + attr.boundary_vec,
    }
}

/// Whether the first machining pass runs with ascending indices. The
/// chain end nearer (in X) to its part boundary decides.
pub(crate) fn is_forward_first(tooling: &Tooling, part: &Bound3) -> Result<bool> {
    let first = tooling.segment(0)?.curve.start();
    let last = tooling.segment(tooling.len() - 1)?.curve.end();
    let forward = if first.x - part.min.x < part.max.x - first.x {
        last.x < first.x
    } else {
        last.x > first.x
    };
    Ok(forward)
}

/// A sized copy of the notch: fraction points placed and split in, one
/// attribute per surviving point.
struct SizedNotch {
    work: Tooling,
    points: [NotchPointInfo; 3],
    attrs: Vec<NotchAttribute>,
}

/// Places and splits the fraction points on a copy of the chain and
/// computes their boundary attributes. Returns `None` when any
/// attribute sits essentially on the part edge, which is the edge
/// notch signal.
fn sized_params(
    tooling: &Tooling,
    part: &Bound3,
    settings: &PlannerSettings,
) -> Result<Option<SizedNotch>> {
    let mut work = tooling.clone();
    work.fix_chain()?;
    let feasible = work.mark_feasible()?;
    let short = is_short_perimeter(&work, settings)?;
    let points = place_fraction_points(&work, settings, &feasible, short)?;

    for info in &points {
        if let Some(pt) = info.point {
            work.split_at(&pt)?;
            work.merge_segments();
        }
    }

    let mut attrs = Vec::new();
    for info in &points {
        let Some(pt) = info.point else {
            continue;
        };
        let Some(index) = resolve_point_index(&work, &pt) else {
            return Err(InvariantError::PointIndexMismatch {
                index: attrs.len(),
                distance: f64::INFINITY,
            }
            .into());
        };
        attrs.push(compute_notch_attribute(&work, part, index)?);
    }

    if attrs
        .iter()
        .any(|a| a.boundary_vec.length() < EDGE_BOUNDARY_MIN - EPS)
    {
        debug!(name = %work.name, "notch hugs the part edge, no approach attributes");
        return Ok(None);
    }
    Ok(Some(SizedNotch {
        work,
        points,
        attrs,
    }))
}

/// Whether this notch runs along the part edge and is machined as a
/// single plain pass.
pub fn is_edge_notch(tooling: &Tooling, part: &Bound3, settings: &PlannerSettings) -> Result<bool> {
    if tooling.kind != ToolingKind::Notch {
        return Ok(false);
    }
    Ok(sized_params(tooling, part, settings)?.is_none())
}

/// The machine's entry position and entry normal for this feature.
///
/// A general notch enters at the offset approach position `n1`; edge
/// notches and non-notch features enter at the chain start. Any
/// boundary vector shorter than the approach length also falls back to
/// the chain start, since the lead-in would leave the part.
pub fn notch_entry(
    tooling: &Tooling,
    part: &Bound3,
    settings: &PlannerSettings,
) -> Result<(Point3, Vector3)> {
    let first = tooling.segment(0)?;
    let fallback = (first.curve.start(), first.start_normal);
    if tooling.kind != ToolingKind::Notch {
        return Ok(fallback);
    }
    let Some(sized) = sized_params(tooling, part, settings)? else {
        return Ok(fallback);
    };
    if sized.attrs.len() != 3 {
        return Ok(fallback);
    }
    if sized
        .attrs
        .iter()
        .any(|a| a.boundary_vec.length() <= settings.notch_approach_length - EPS)
    {
        return Ok(fallback);
    }

    let Some(anchor50) = sized.points[1].point else {
        return Ok(fallback);
    };
    let anchor = mid_entry_anchor(&sized.work, &anchor50)?;
    let geom = approach_positions(
        &sized.attrs[1],
        &anchor,
        settings.effective_wire_joint_gap(),
    );
    Ok((geom.n1, sized.attrs[1].end_normal.normalized()))
}

/// Estimated total cut length of the notch, approach strokes included.
///
/// Chains without full approach attributes (edge notches, disabled
/// wire joints) report their plain perimeter. Otherwise the estimate
/// sums the two gambit strokes, one approach pair per seam and per
/// flex run (minus the uncut joint widths), the entry travel, and the
/// chain itself.
pub fn total_notch_tooling_length(
    tooling: &Tooling,
    part: &Bound3,
    settings: &PlannerSettings,
) -> Result<f64> {
    let perimeter = tooling.perimeter()?;
    if tooling.kind != ToolingKind::Notch {
        return Ok(perimeter);
    }
    let Some(sized) = sized_params(tooling, part, settings)? else {
        return Ok(perimeter);
    };
    if sized.attrs.len() != 3 {
        return Ok(perimeter);
    }

    let wjd = settings.notch_wire_joint_distance;
    let gap = settings.effective_wire_joint_gap();
    let a50 = &sized.attrs[1];

    let mut approaches = 2.0;
    let mut joints = 0.0;
    for _ in 0..sized.work.flex_runs()?.len() {
        approaches += 2.0;
        if settings.wire_joints_enabled() {
            joints -= 2.0;
        }
    }
    for slot in [0usize, 2] {
        if sized.points[slot].is_active() {
            approaches += 2.0;
            joints -= 2.0;
        }
    }

    let Some(anchor50) = sized.points[1].point else {
        return Ok(perimeter);
    };
    let anchor = mid_entry_anchor(&sized.work, &anchor50)?;
    let geom = approach_positions(a50, &anchor, gap);

    let mut total = 2.0 * GAMBIT_STROKE_LENGTH;
    total += approaches * settings.notch_approach_length;
    total += joints * wjd;
    total += geom.n_mid1.dist_to(&geom.boundary_point);
    total += 2.0 * geom.n_mid2.dist_to(&a50.point);
    total += perimeter;
    Ok(total)
}
