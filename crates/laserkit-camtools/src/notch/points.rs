//! Placement of the tracked fraction points along a notch chain.
//!
//! The planner tracks up to three points, nominally at 25%, 50% and
//! 75% of the chain length. The outer two become wire joints and the
//! middle one the approach. Points are tracked by identity: the point
//! itself is the stable value, and its segment index is re-resolved
//! from the chain whenever splits have moved things around.

use laserkit_core::{GeometryError, Point3, Tooling};
use tracing::debug;

use crate::error::{InvariantError, PlanError, Result};
use crate::settings::PlannerSettings;

/// Minimum distance a tracked point keeps from its segment's start.
pub(crate) const MIN_SEGMENT_OFFSET: f64 = 15.0;

/// Fraction step used when a nominal location is not usable.
pub(crate) const FRACTION_STEP: f64 = 0.01;

/// One tracked location on the notch chain.
#[derive(Debug, Clone)]
pub struct NotchPointInfo {
    /// Chain fraction actually in use for this slot. Starts at the
    /// nominal value and is replaced whenever placement moves the
    /// point.
    pub fraction: f64,
    /// The tracked point, or `None` once the slot is discarded.
    pub point: Option<Point3>,
    /// Index of the segment ending at the point. Only meaningful right
    /// after [`resolve_indices`]; splits invalidate it.
    pub seg_index: Option<usize>,
}

impl NotchPointInfo {
    /// A slot that is switched off and places no point.
    pub fn disabled(fraction: f64) -> Self {
        NotchPointInfo {
            fraction,
            point: None,
            seg_index: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.point.is_some()
    }

    /// Drops the point, turning the slot into a discarded one.
    pub fn discard(&mut self) {
        self.point = None;
        self.seg_index = None;
    }
}

/// Places one tracked point at `fraction` of the chain length.
///
/// If the landing segment is marked infeasible the fraction advances
/// in 1% steps until a feasible segment is hit; a short-perimeter
/// chain instead gives the slot up on the first infeasible landing.
/// The final point is kept at least 15mm past its segment's start
/// when the segment is long enough to allow it, and the fraction is
/// rewritten to the location actually used.
pub fn place_fraction_point(
    tooling: &Tooling,
    feasible: &[bool],
    fraction: f64,
    short_perimeter: bool,
) -> Result<NotchPointInfo> {
    let perimeter = tooling.perimeter()?;
    let mut frac = fraction;
    let (mut pt, mut idx) = tooling.point_and_index_at_length_forward(0, frac * perimeter)?;

    if !feasible[idx] && short_perimeter {
        return Ok(NotchPointInfo::disabled(fraction));
    }
    while !feasible[idx] {
        frac += FRACTION_STEP;
        if frac >= 1.0 {
            return Err(PlanError::InvalidParameters(format!(
                "no feasible segment at or beyond {:.0}% of the chain",
                fraction * 100.0
            )));
        }
        let (p, i) = tooling.point_and_index_at_length_forward(0, frac * perimeter)?;
        pt = p;
        idx = i;
    }

    let seg = tooling.segment(idx)?;
    let seg_start = seg.curve.start();
    let within = seg.curve.length_between(&seg_start, &pt, &seg.apn(), tooling.tol())?;
    if within < MIN_SEGMENT_OFFSET && seg.length()? >= MIN_SEGMENT_OFFSET {
        let apn = seg.apn();
        pt = seg.curve.point_at_length_from_start(&apn, MIN_SEGMENT_OFFSET)?;
        if !seg.curve.is_point_on(&pt, &apn, tooling.tol(), true)? {
            return Err(PlanError::Geometry(
                GeometryError::PointNotOnCurve {
                    x: pt.x,
                    y: pt.y,
                    z: pt.z,
                }
                .into(),
            ));
        }
    }

    let used = tooling.length_from_start_to_point(&pt)? / perimeter;
    if (used - fraction).abs() > 1e-9 {
        debug!(
            nominal = fraction,
            used, "fraction point moved during placement"
        );
    }
    Ok(NotchPointInfo {
        fraction: used,
        point: Some(pt),
        seg_index: Some(idx),
    })
}

/// Places the three nominal fraction points. The outer slots are
/// disabled outright when wire joints are switched off.
pub fn place_fraction_points(
    tooling: &Tooling,
    settings: &PlannerSettings,
    feasible: &[bool],
    short_perimeter: bool,
) -> Result<[NotchPointInfo; 3]> {
    let joints = settings.wire_joints_enabled();
    let place = |slot: usize, fraction: f64| -> Result<NotchPointInfo> {
        if slot != 1 && !joints {
            return Ok(NotchPointInfo::disabled(fraction));
        }
        place_fraction_point(tooling, feasible, fraction, short_perimeter)
    };
    let [a, b, c] = settings.notch_fractions;
    Ok([place(0, a)?, place(1, b)?, place(2, c)?])
}

/// Pushes the 75% point until it sits at least 15mm past the approach
/// point, advancing its fraction by 1% at a time up to the chain end.
pub fn enforce_end_separation(
    tooling: &Tooling,
    feasible: &[bool],
    points: &mut [NotchPointInfo; 3],
) -> Result<()> {
    let (Some(p50), Some(p75)) = (points[1].point, points[2].point) else {
        return Ok(());
    };
    let mut len50 = tooling.length_from_start_to_point(&p50)?;
    let mut len75 = tooling.length_from_start_to_point(&p75)?;
    let mut frac = points[2].fraction;
    while len50 >= len75 - MIN_SEGMENT_OFFSET {
        frac += FRACTION_STEP;
        if frac >= 1.0 - 1e-6 {
            break;
        }
        let moved = place_fraction_point(tooling, feasible, frac, false)?;
        let Some(p) = moved.point else {
            break;
        };
        len75 = tooling.length_from_start_to_point(&p)?;
        len50 = tooling.length_from_start_to_point(&p50)?;
        points[2] = moved;
    }
    Ok(())
}

/// Finds the segment whose end coincides with `pt`, if any.
pub fn resolve_point_index(tooling: &Tooling, pt: &Point3) -> Option<usize> {
    let tol = tooling.tol();
    tooling
        .segs
        .iter()
        .position(|seg| seg.curve.end().eq_tol(pt, tol))
}

/// Re-resolves every active point's segment index against the current
/// chain. Points that no longer land on a segment end resolve to
/// `None`; [`check_point_info`] turns that into an error when it
/// matters.
pub fn resolve_indices(tooling: &Tooling, points: &mut [NotchPointInfo]) {
    for info in points.iter_mut() {
        info.seg_index = info
            .point
            .as_ref()
            .and_then(|pt| resolve_point_index(tooling, pt));
    }
}

/// Verifies that every active point still coincides with the end of
/// its resolved segment.
pub fn check_point_info(tooling: &Tooling, points: &[NotchPointInfo]) -> Result<()> {
    let tol = tooling.tol();
    for (slot, info) in points.iter().enumerate() {
        let Some(pt) = info.point else {
            continue;
        };
        let Some(index) = info.seg_index else {
            return Err(InvariantError::PointIndexMismatch {
                index: slot,
                distance: f64::INFINITY,
            }
            .into());
        };
        let end = tooling.segment(index)?.curve.end();
        let distance = end.dist_to(&pt);
        if distance > tol {
            return Err(InvariantError::PointIndexMismatch { index, distance }.into());
        }
    }
    Ok(())
}
