//! Arc kernel: center/radius fit, angle and sense, evaluation.
//!
//! The fit intersects two chord perpendicular bisectors; everything else
//! is derived from it. Angles are signed: positive sweeps counterclockwise
//! about the supplied apn, negative clockwise, magnitude in (0, 2pi].

use super::{Arc3, ArcSense};
use crate::error::{GeometryError, Result};
use crate::intersect::{intersect_lines, LineIntersection};
use crate::math::{Point3, Vector3};
use crate::xform::XForm4;
use std::f64::consts::{PI, TAU};

/// Slack applied to normalized angular parameters.
pub(crate) const ANGLE_SLACK: f64 = 1e-5;

/// Sine threshold below which start/end center vectors count as parallel.
const SIN_TOL: f64 = 1e-6;

/// Iteration bound for [`nudge_point_to_arc`].
const MAX_NUDGE_STEPS: usize = 10_000;

fn unit_apn(apn: &Vector3) -> Result<Vector3> {
    let n = apn.normalized();
    if n.is_zero() {
        return Err(GeometryError::UnresolvedArcBranch {
            reason: "arc-plane normal has zero length".to_string(),
        }
        .into());
    }
    Ok(n)
}

impl Arc3 {
    /// Fit the circle through the stored samples (start, p1, p2) by
    /// intersecting the perpendicular bisectors of the two chords.
    /// Bisector direction is `apn x chord`. Fails on collinear samples.
    pub fn center_and_radius(&self, apn: &Vector3) -> Result<(Point3, f64)> {
        let chord1 = self.p1 - self.start;
        let chord2 = self.p2 - self.p1;
        let mid1 = self.start.midpoint(&self.p1);
        let mid2 = self.p1.midpoint(&self.p2);
        let dir1 = apn.cross(&chord1);
        let dir2 = apn.cross(&chord2);

        match intersect_lines(&mid1, &dir1, &mid2, &dir2, 1e-4)? {
            LineIntersection::Point(center) => {
                let radius = center.dist_to(&self.start);
                Ok((center, radius))
            }
            LineIntersection::Parallel | LineIntersection::Collinear => {
                Err(GeometryError::CollinearArc.into())
            }
            LineIntersection::Skew { gap, .. } => Err(GeometryError::NoIntersection {
                reason: format!("chord bisectors miss by {gap}"),
            }
            .into()),
        }
    }

    /// Whether start and end coincide.
    pub fn is_full_circle(&self) -> bool {
        self.start.dist_to(&self.end) <= 1e-6
    }

    /// Signed swept angle and turn sense relative to `apn`.
    ///
    /// The main branch takes the angle between the center->start and
    /// center->end vectors, signs it by their cross product against apn,
    /// and cross-checks against the stored interior sample to pick minor
    /// vs major. Two edge branches are required: a half circle (the cross
    /// product vanishes with opposed vectors, resolved from the tangent
    /// direction just past start) and a vanishing cross product with
    /// aligned vectors (zero sweep or full circle, told apart by
    /// comparing the sample chord chain to pi*radius).
    pub fn angle_and_sense(&self, apn: &Vector3) -> Result<(f64, ArcSense)> {
        let n = unit_apn(apn)?;
        let (center, radius) = self.center_and_radius(apn)?;
        let va = self.start - center;
        let vb = self.end - center;
        let cross = va.cross(&vb);
        let dot = va.dot(&vb);

        let angle = if cross.length() <= radius * radius * SIN_TOL {
            let tangent = self.p1 - self.start;
            let side = va.cross(&tangent).dot(&n);
            if dot < 0.0 {
                // Half circle.
                if side > 0.0 {
                    PI
                } else {
                    -PI
                }
            } else {
                // Aligned endpoints: zero sweep or full circle.
                let chain = self.start.dist_to(&self.p1)
                    + self.p1.dist_to(&self.p2)
                    + self.p2.dist_to(&self.end);
                if chain <= PI * radius {
                    return Err(GeometryError::UnresolvedArcBranch {
                        reason: "near-zero sweep".to_string(),
                    }
                    .into());
                }
                if side > 0.0 {
                    TAU
                } else {
                    -TAU
                }
            }
        } else {
            let alpha = (dot / (radius * radius)).clamp(-1.0, 1.0).acos();
            let signed_end = if cross.dot(&n) > 0.0 { alpha } else { -alpha };
            let vm = self.p1 - center;
            let theta_m = va.cross(&vm).dot(&n).atan2(va.dot(&vm));
            if signed_end > 0.0 {
                if theta_m >= -ANGLE_SLACK && theta_m <= signed_end + ANGLE_SLACK {
                    signed_end
                } else {
                    signed_end - TAU
                }
            } else if theta_m <= ANGLE_SLACK && theta_m >= signed_end - ANGLE_SLACK {
                signed_end
            } else {
                signed_end + TAU
            }
        };

        let sense = if angle >= 0.0 {
            ArcSense::Counterclockwise
        } else {
            ArcSense::Clockwise
        };
        Ok((angle, sense))
    }

    /// Evaluate at a signed angle from start, through the arc's local
    /// frame: X = center->start, Z = apn, Y = Z x X, translated to the
    /// center. The result is nudged back onto the circle to cancel
    /// floating-point drift.
    pub fn point_at_angle(&self, apn: &Vector3, theta: f64) -> Result<Point3> {
        let n = unit_apn(apn)?;
        let (center, radius) = self.center_and_radius(apn)?;
        let x = (self.start - center).normalized();
        if x.is_zero() {
            return Err(GeometryError::DegenerateLine { length: radius }.into());
        }
        let y = n.cross(&x);
        let frame = XForm4::from_axes(center, x, y, n);
        let p = frame.apply_point(&Point3::new(radius * theta.cos(), radius * theta.sin(), 0.0));
        Ok(nudge_point_to_arc(&center, radius, &p, apn))
    }

    /// Normalized angular parameter of a point assumed on the circle:
    /// 0 at start, 1 at end, wrapped into the arc's own sweep direction.
    pub(crate) fn param_of_point(&self, pt: &Point3, apn: &Vector3) -> Result<f64> {
        let n = unit_apn(apn)?;
        let (center, _) = self.center_and_radius(apn)?;
        let (angle, _) = self.angle_and_sense(apn)?;
        let va = self.start - center;
        let vp = *pt - center;
        let mut theta = va.cross(&vp).dot(&n).atan2(va.dot(&vp));
        if angle > 0.0 && theta < -ANGLE_SLACK {
            theta += TAU;
        } else if angle < 0.0 && theta > ANGLE_SLACK {
            theta -= TAU;
        }
        Ok(theta / angle)
    }

    pub(crate) fn is_point_on(
        &self,
        pt: &Point3,
        apn: &Vector3,
        tol: f64,
        constrained: bool,
    ) -> Result<bool> {
        let n = unit_apn(apn)?;
        let (center, radius) = self.center_and_radius(apn)?;
        let vp = *pt - center;
        if vp.dot(&n).abs() > tol {
            return Ok(false);
        }
        let planar = vp - n * vp.dot(&n);
        if (planar.length() - radius).abs() > tol {
            return Ok(false);
        }
        if !constrained || self.is_full_circle() {
            return Ok(true);
        }
        let u = self.param_of_point(pt, apn)?;
        Ok(u >= -ANGLE_SLACK && u <= 1.0 + ANGLE_SLACK)
    }

    /// Fragment between normalized parameters `u1 < u2`, re-derived from
    /// two freshly evaluated interior samples at 1/4 and 3/4 of the
    /// fragment's own angle so it stays an independently valid arc.
    pub fn sub_arc(&self, apn: &Vector3, u1: f64, u2: f64) -> Result<Arc3> {
        if !(-1e-9..=1.0 + 1e-9).contains(&u1)
            || !(-1e-9..=1.0 + 1e-9).contains(&u2)
            || u2 - u1 <= 1e-9
        {
            return Err(GeometryError::OutOfRange {
                name: "u2",
                value: u2,
                min: u1,
                max: 1.0,
            }
            .into());
        }
        let (angle, _) = self.angle_and_sense(apn)?;
        let span = u2 - u1;
        let a = self.point_at_angle(apn, angle * u1)?;
        let q1 = self.point_at_angle(apn, angle * (u1 + span * 0.25))?;
        let q2 = self.point_at_angle(apn, angle * (u1 + span * 0.75))?;
        let b = self.point_at_angle(apn, angle * u2)?;
        Ok(Arc3::new(a, q1, q2, b))
    }
}

/// Pull a near-arc point exactly onto the circle: remove the out-of-plane
/// component, snap to radius, keep the adjustment only while it improves.
/// Bounded at 10,000 steps; corrects drift left by repeated transform
/// round-trips.
pub fn nudge_point_to_arc(center: &Point3, radius: f64, point: &Point3, apn: &Vector3) -> Point3 {
    let n = apn.normalized();
    if n.is_zero() || radius <= 1e-12 {
        return *point;
    }
    let error_of = |p: &Point3| {
        let vp = *p - *center;
        (vp.length() - radius).abs() + vp.dot(&n).abs()
    };
    let mut best = *point;
    let mut best_err = error_of(&best);
    for _ in 0..MAX_NUDGE_STEPS {
        if best_err <= 1e-12 {
            break;
        }
        let vp = best - *center;
        let planar = vp - n * vp.dot(&n);
        if planar.length() <= 1e-12 {
            break;
        }
        let cand = *center + planar.normalized() * radius;
        let err = error_of(&cand);
        if err < best_err {
            best = cand;
            best_err = err;
        } else {
            break;
        }
    }
    best
}
