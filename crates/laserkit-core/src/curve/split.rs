//! Splitting, reversal, resampling and bounds for curves.
//!
//! Split fragments keep the caller's points as their shared boundaries,
//! so downstream identity checks against those points hold exactly. Arc
//! fragments are re-derived from two freshly evaluated interior samples
//! and stay independently valid arcs.

use super::{Arc3, Curve3};
use crate::error::{GeometryError, Result};
use crate::math::{Bound3, Point3, Vector3};
use smallvec::SmallVec;
use std::f64::consts::TAU;

impl Curve3 {
    /// Split at `points` (interior, ordered or not) into N+1 fragments.
    ///
    /// Points coinciding with start/end or with each other within `tol`
    /// are dropped first. A point not on the curve is an error. With a
    /// nonzero `gap`, each fragment after the first has its start moved
    /// forward by that length along its own direction, leaving open gaps
    /// between consecutive fragments (wire joints).
    pub fn split_at(
        &self,
        points: &[Point3],
        gap: f64,
        apn: &Vector3,
        tol: f64,
    ) -> Result<Vec<Curve3>> {
        let total = self.length(apn)?;
        let slack = tol / total;

        let mut cuts: SmallVec<[(f64, Point3); 4]> = SmallVec::new();
        for pt in points {
            let u = self.param_at_point(pt, apn, tol)?;
            if u <= slack || u >= 1.0 - slack {
                continue;
            }
            cuts.push((u, *pt));
        }
        cuts.sort_by(|a, b| a.0.total_cmp(&b.0));
        cuts.dedup_by(|b, a| (b.0 - a.0).abs() <= slack);

        if cuts.is_empty() {
            return Ok(vec![*self]);
        }

        let mut bounds: SmallVec<[(f64, Point3); 6]> = SmallVec::new();
        bounds.push((0.0, self.start()));
        bounds.extend(cuts);
        bounds.push((1.0, self.end()));

        let mut out = Vec::with_capacity(bounds.len() - 1);
        for i in 0..bounds.len() - 1 {
            let (mut u_lo, mut p_lo) = bounds[i];
            let (u_hi, p_hi) = bounds[i + 1];
            if i > 0 && gap > 0.0 {
                let du = gap / total;
                if u_lo + du >= u_hi - slack {
                    return Err(GeometryError::OutOfRange {
                        name: "gap",
                        value: gap,
                        min: 0.0,
                        max: (u_hi - u_lo) * total,
                    }
                    .into());
                }
                u_lo += du;
                p_lo = self.point_at_param(apn, u_lo)?;
            }
            out.push(self.fragment(apn, u_lo, p_lo, u_hi, p_hi)?);
        }
        Ok(out)
    }

    /// One fragment between two parameters, endpoints pinned to the given
    /// points.
    fn fragment(
        &self,
        apn: &Vector3,
        u_lo: f64,
        p_lo: Point3,
        u_hi: f64,
        p_hi: Point3,
    ) -> Result<Curve3> {
        match self {
            Curve3::Line(_) => Ok(Curve3::line(p_lo, p_hi)),
            Curve3::Arc(a) => {
                let fresh = a.sub_arc(apn, u_lo, u_hi)?;
                Ok(Curve3::Arc(Arc3::new(p_lo, fresh.p1, fresh.p2, p_hi)))
            }
        }
    }

    /// Direction-reversed copy. Arc interior samples are freshly
    /// evaluated in the new direction rather than swapped.
    pub fn reversed(&self, apn: &Vector3) -> Result<Curve3> {
        match self {
            Curve3::Line(l) => Ok(Curve3::line(l.end, l.start)),
            Curve3::Arc(a) => {
                let (angle, _) = a.angle_and_sense(apn)?;
                let q1 = a.point_at_angle(apn, angle * 0.75)?;
                let q2 = a.point_at_angle(apn, angle * 0.25)?;
                Ok(Curve3::Arc(Arc3::new(a.end, q1, q2, a.start)))
            }
        }
    }

    /// Copy with arc interior samples re-evaluated at 0.1 and 0.9 of the
    /// sweep. Normalizes sample placement after repeated splitting.
    pub fn clone_resampled(&self, apn: &Vector3) -> Result<Curve3> {
        match self {
            Curve3::Line(_) => Ok(*self),
            Curve3::Arc(a) => {
                let (angle, _) = a.angle_and_sense(apn)?;
                let q1 = a.point_at_angle(apn, angle * 0.1)?;
                let q2 = a.point_at_angle(apn, angle * 0.9)?;
                Ok(Curve3::Arc(Arc3::new(a.start, q1, q2, a.end)))
            }
        }
    }

    /// Axis-aligned bound. Arcs add the axis-extreme candidate points
    /// whose angles fall inside the sweep.
    pub fn bbox(&self, apn: &Vector3) -> Result<Bound3> {
        let mut b = Bound3::from_point(&self.start());
        b.include(&self.end());
        let a = match self {
            Curve3::Line(_) => return Ok(b),
            Curve3::Arc(a) => a,
        };

        let (center, _) = a.center_and_radius(apn)?;
        let (angle, _) = a.angle_and_sense(apn)?;
        let n = apn.normalized();
        let x = (a.start - center).normalized();
        let y = n.cross(&x);

        for axis in [Vector3::x_axis(), Vector3::y_axis(), Vector3::z_axis()] {
            let dx = x.dot(&axis);
            let dy = y.dot(&axis);
            if dx.abs() <= 1e-12 && dy.abs() <= 1e-12 {
                continue;
            }
            let theta0 = dy.atan2(dx);
            for theta in [theta0, theta0 + std::f64::consts::PI] {
                if sweep_contains(angle, theta) {
                    b.include(&a.point_at_angle(apn, theta)?);
                }
            }
        }
        Ok(b)
    }
}

/// Whether a circle angle (any representative) lies within a signed sweep
/// starting at zero.
fn sweep_contains(sweep: f64, theta: f64) -> bool {
    let t = theta.rem_euclid(TAU);
    if sweep >= 0.0 {
        t <= sweep + 1e-9
    } else {
        t - TAU >= sweep - 1e-9
    }
}
