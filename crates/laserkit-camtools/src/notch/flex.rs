//! Flex handling for the notch planner.
//!
//! Wire joints and approaches must not land on a flex flange: the
//! sheet springs there and the joint would tear instead of snapping.
//! Tracked points near flex are discarded or relocated, and every flex
//! run is bracketed by a pair of wire-joint gap segments so the
//! machining passes hand over cleanly at its ends.

use laserkit_core::{Point3, Tooling};
use tracing::warn;

use super::points::{place_fraction_point, NotchPointInfo, MIN_SEGMENT_OFFSET};
use crate::error::{PlanError, Result};

/// Chain-end distance below which a point near flex is dropped rather
/// than relocated.
pub(crate) const FLEX_DISCARD_LIMIT: f64 = 200.0;

/// Fallback fractions when a tracked point has to move off a flex run.
const RELOCATED_FRACTIONS: [f64; 3] = [0.125, 0.40, 0.875];

/// Tolerance for the inside-run length comparison.
const RUN_LENGTH_TOL: f64 = 1e-2;

/// Returns the flex run the point lies inside of or within `margin`
/// of, measured along the chain.
pub fn flex_run_near_point(
    tooling: &Tooling,
    pt: &Point3,
    margin: f64,
) -> Result<Option<(usize, usize)>> {
    let len_to_pt = tooling.length_from_start_to_point(pt)?;
    for (start, end) in tooling.flex_runs()? {
        let run_start_len = tooling.length_between_indices(0, start)?;
        let run_end_len = tooling.length_between_indices(0, end + 1)?;
        let to_start = (len_to_pt - run_start_len).abs();
        let to_end = (len_to_pt - run_end_len).abs();
        let run_len = run_end_len - run_start_len;
        let inside = ((to_start + to_end) - run_len).abs() <= RUN_LENGTH_TOL;
        if to_start < margin || to_end < margin || inside {
            return Ok(Some((start, end)));
        }
    }
    Ok(None)
}

/// Moves or drops tracked points that ended up on or near a flex run.
///
/// The outer slots measure their distance to "their" chain end (start
/// for the 25% slot, end for the 75% slot): close to it the point is
/// discarded, far from it the point is relocated to 12.5% or 87.5%.
/// The approach slot is always relocated to 40%.
pub fn recompute_points_against_flex(
    tooling: &Tooling,
    feasible: &[bool],
    points: &mut [NotchPointInfo; 3],
) -> Result<()> {
    for slot in 0..3 {
        let Some(pt) = points[slot].point else {
            continue;
        };
        if flex_run_near_point(tooling, &pt, MIN_SEGMENT_OFFSET)?.is_none() {
            continue;
        }
        if slot == 1 {
            warn!(name = %tooling.name, "approach point on flex, relocating to 40%");
            points[1] = place_fraction_point(tooling, feasible, RELOCATED_FRACTIONS[1], false)?;
            continue;
        }
        let end_dist = if slot == 0 {
            tooling.length_from_start_to_point(&pt)?
        } else {
            tooling.length_from_end_to_point(&pt)?
        };
        if end_dist > FLEX_DISCARD_LIMIT {
            warn!(slot, end_dist, "fraction point on flex, relocating");
            points[slot] = place_fraction_point(tooling, feasible, RELOCATED_FRACTIONS[slot], false)?;
        } else {
            warn!(slot, end_dist, "dropping fraction point near flex");
            points[slot].discard();
        }
    }
    Ok(())
}

/// Splits a wire-joint gap into the chain on each side of every flex
/// run and returns one point quad per run:
///
/// `[flex start, first flex segment end, flex end, post-gap end]`
///
/// The sequence builders later resolve these to the pre-gap segment,
/// the first and last on-flex segments, and the post-gap segment. Runs
/// are re-detected after each split because the inserts shift indices.
pub fn bracket_flex_runs(tooling: &mut Tooling, gap: f64) -> Result<Vec<[Point3; 4]>> {
    let run_count = tooling.flex_runs()?.len();
    let mut quads = Vec::with_capacity(run_count);
    for run in 0..run_count {
        let (start, end) = tooling.flex_runs()?[run];
        if start == 0 || end + 1 == tooling.len() {
            return Err(PlanError::Unsupported(
                "flex run reaches a chain end and cannot be bracketed".to_string(),
            ));
        }

        let (pre_pt, _) = tooling.point_and_index_at_length_reverse(start - 1, gap)?;
        tooling.split_at(&pre_pt)?;
        tooling.merge_segments();

        let (_, end) = tooling.flex_runs()?[run];
        let (post_pt, _) = tooling.point_and_index_at_length_forward(end + 1, gap)?;
        tooling.split_at(&post_pt)?;
        tooling.merge_segments();

        let (start, end) = tooling.flex_runs()?[run];
        let quad = [
            tooling.segment(start - 1)?.curve.end(),
            tooling.segment(start)?.curve.end(),
            tooling.segment(end)?.curve.end(),
            tooling.segment(end + 1)?.curve.end(),
        ];
        quads.push(quad);
    }
    Ok(quads)
}
