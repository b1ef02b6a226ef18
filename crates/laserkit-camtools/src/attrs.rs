//! Boundary attributes for notch approach points.
//!
//! For each tracked point the notch planner needs to know which way is
//! off the part, how far away the part boundary is, and which side the
//! offcut hangs on. All three are derived here from the owning segment
//! and the part bounding box.

use laserkit_core::{
    lateral_axis, perturb_point, Bound3, ChainError, Error as CoreError, FlangeKind, Point3,
    Tooling, Vector3,
};

use crate::error::{PlanError, Result};

const MAX_PERTURB_STEPS: usize = 10;

/// Everything the approach and entry builders need to know about one
/// tracked point on the notch chain.
#[derive(Debug, Clone)]
pub struct NotchAttribute {
    /// The tracked point, always the end of its segment.
    pub point: Point3,
    /// Surface normal at the segment start.
    pub start_normal: Vector3,
    /// Surface normal at the segment end.
    pub end_normal: Vector3,
    /// Flange the segment lies on.
    pub flange: FlangeKind,
    /// Unit direction from the point toward the near part boundary,
    /// in the flange plane.
    pub outward: Vector3,
    /// Vector from the point to the nearest part boundary.
    pub boundary_vec: Vector3,
    /// Unit lateral direction, flipped to oppose `outward`. The offcut
    /// falls to this side during the approach strokes.
    pub scrap_side: Vector3,
}

/// Distance from `point` along unit direction `dir` to the boundary of
/// `bound`. Returns `None` when the ray never crosses a face in the
/// positive direction.
fn exit_distance(point: &Point3, dir: &Vector3, bound: &Bound3) -> Option<f64> {
    let axes = [
        (point.x, dir.x, bound.min.x, bound.max.x),
        (point.y, dir.y, bound.min.y, bound.max.y),
        (point.z, dir.z, bound.min.z, bound.max.z),
    ];
    let mut exit = f64::INFINITY;
    for (p, d, lo, hi) in axes {
        if d.abs() <= 1e-12 {
            continue;
        }
        let face = if d > 0.0 { hi } else { lo };
        let t = (face - p) / d;
        if t >= 0.0 && t < exit {
            exit = t;
        }
    }
    exit.is_finite().then_some(exit)
}

/// Shortest of the in-plane axis vectors from `point` to a face of
/// `bound`. Distances are clamped at zero so a point already outside
/// the box reports a degenerate boundary vector instead of a negative
/// one.
fn nearest_axis_candidate(point: &Point3, bound: &Bound3, axes: [Vector3; 2]) -> Vector3 {
    let mut best = Vector3::zero();
    let mut best_len = f64::INFINITY;
    for axis in axes {
        let p = point.to_vector().dot(&axis);
        let hi = Vector3::new(bound.max.x, bound.max.y, bound.max.z).dot(&axis);
        let lo = Vector3::new(bound.min.x, bound.min.y, bound.min.z).dot(&axis);
        for (dist, dir) in [((hi - p).max(0.0), axis), ((p - lo).max(0.0), -axis)] {
            if dist < best_len {
                best_len = dist;
                best = dir * dist;
            }
        }
    }
    best
}

/// Computes the boundary attributes for the segment at `index`.
///
/// The outward direction starts as `end_normal x chord` and is flipped
/// to agree with the boundary vector. A degenerate chord (a closed
/// fragment, or one parallel to the normal) is re-perturbed along the
/// lateral axis up to ten times before giving up.
pub fn compute_notch_attribute(
    tooling: &Tooling,
    part: &Bound3,
    index: usize,
) -> Result<NotchAttribute> {
    let seg = tooling.segment(index)?;
    let flange = seg.flange().map_err(|err| match err {
        CoreError::Chain(ChainError::UnsupportedFlange { .. }) => {
            PlanError::Unsupported(err.to_string())
        }
        other => PlanError::Geometry(other),
    })?;
    let lateral = lateral_axis(flange);

    let start = seg.curve.start();
    let end = seg.curve.end();
    let point = end;
    let normal = seg.end_normal;

    let mut outward = normal.cross(&(end - start)).normalized();
    let mut step = 1;
    while outward.is_zero() && step <= MAX_PERTURB_STEPS {
        let probe = perturb_point(&end, &lateral, step as u32);
        outward = normal.cross(&(probe - start)).normalized();
        step += 1;
    }
    if outward.is_zero() {
        return Err(PlanError::InvalidParameters(format!(
            "no outward direction at ({}, {}, {})",
            point.x, point.y, point.z
        )));
    }

    let boundary_vec = match flange {
        FlangeKind::Web => {
            // Either sense of the outward ray leaves the part box; the
            // shorter exit is the near boundary and fixes the sign.
            let fwd = exit_distance(&point, &outward, part);
            let back = exit_distance(&point, &(-outward), part);
            match (fwd, back) {
                (Some(a), Some(b)) if b < a => {
                    outward = -outward;
                    outward * b
                }
                (Some(a), _) => outward * a,
                (None, Some(b)) => {
                    outward = -outward;
                    outward * b
                }
                (None, None) => {
                    return Err(PlanError::InvalidParameters(format!(
                        "point ({}, {}, {}) has no boundary along its outward axis",
                        point.x, point.y, point.z
                    )));
                }
            }
        }
        FlangeKind::Top | FlangeKind::Bottom | FlangeKind::Flex => {
            nearest_axis_candidate(&point, part, [Vector3::x_axis(), Vector3::z_axis()])
        }
    };
    if outward.opposes(&boundary_vec) {
        outward = -outward;
    }

    let mut scrap_side = lateral;
    if scrap_side.dot(&outward) > 0.0 {
        scrap_side = -scrap_side;
    }

    Ok(NotchAttribute {
        point,
        start_normal: seg.start_normal,
        end_normal: seg.end_normal,
        flange,
        outward,
        boundary_vec,
        scrap_side,
    })
}
