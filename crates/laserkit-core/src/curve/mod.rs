//! Curves: the Line|Arc variant and its kernel operations.
//!
//! An arc is stored as four points on the curve (start, two interior
//! samples, end), never as center/radius/angle. Center, radius, plane and
//! CW/CCW sense are only unambiguous once an external arc-plane normal
//! (apn) is supplied, so every arc operation takes one. Positions along a
//! curve are expressed in arc-length units, not raw parameter t.
//!
//! All fallible operations return `Result` and fail immediately on a
//! degenerate input, a collinear arc fit, a claimed point not actually on
//! the curve, or an unreached angle branch. Callers pre-validate; there is
//! no silent degraded result.

mod arc;
mod split;

pub use arc::nudge_point_to_arc;

use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Turn sense of an arc, relative to a given plane normal pointing toward
/// the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArcSense {
    Clockwise,
    Counterclockwise,
}

/// A straight segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line3 {
    pub start: Point3,
    pub end: Point3,
}

impl Line3 {
    pub fn new(start: Point3, end: Point3) -> Self {
        Line3 { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.dist_to(&self.end)
    }

    /// Unit direction from start to end; zero when the line is degenerate.
    pub fn direction(&self) -> Vector3 {
        (self.end - self.start).normalized()
    }
}

/// A circular arc stored as four on-curve points. `p1` and `p2` are
/// interior samples in travel order between `start` and `end`; for a full
/// circle `start` and `end` coincide and the interior samples carry the
/// orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arc3 {
    pub start: Point3,
    pub p1: Point3,
    pub p2: Point3,
    pub end: Point3,
}

impl Arc3 {
    pub fn new(start: Point3, p1: Point3, p2: Point3, end: Point3) -> Self {
        Arc3 { start, p1, p2, end }
    }
}

/// A curve segment: line or arc.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Curve3 {
    Line(Line3),
    Arc(Arc3),
}

impl Curve3 {
    /// Line constructor shorthand.
    pub fn line(start: Point3, end: Point3) -> Self {
        Curve3::Line(Line3::new(start, end))
    }

    /// Arc constructor shorthand.
    pub fn arc(start: Point3, p1: Point3, p2: Point3, end: Point3) -> Self {
        Curve3::Arc(Arc3::new(start, p1, p2, end))
    }

    pub fn start(&self) -> Point3 {
        match self {
            Curve3::Line(l) => l.start,
            Curve3::Arc(a) => a.start,
        }
    }

    pub fn end(&self) -> Point3 {
        match self {
            Curve3::Line(l) => l.end,
            Curve3::Arc(a) => a.end,
        }
    }

    pub fn is_arc(&self) -> bool {
        matches!(self, Curve3::Arc(_))
    }

    /// Unit chord direction from start to end; zero for a closed curve.
    pub fn chord_direction(&self) -> Vector3 {
        (self.end() - self.start()).normalized()
    }

    /// Curve length. Arcs derive it from the fitted angle and radius, so
    /// a collinear sample set fails here too.
    pub fn length(&self, apn: &Vector3) -> Result<f64> {
        match self {
            Curve3::Line(l) => Ok(l.length()),
            Curve3::Arc(a) => {
                let (_, radius) = a.center_and_radius(apn)?;
                let (angle, _) = a.angle_and_sense(apn)?;
                Ok(angle.abs() * radius)
            }
        }
    }

    /// Membership test. Total over valid curves: any query point yields
    /// `Ok(true)` or `Ok(false)`; only a degenerate line or collinear arc
    /// is an error. `constrained` additionally requires the point's
    /// parameter to lie in [0, 1] (within tolerance); unconstrained only
    /// tests the carrier line/circle.
    pub fn is_point_on(
        &self,
        pt: &Point3,
        apn: &Vector3,
        tol: f64,
        constrained: bool,
    ) -> Result<bool> {
        match self {
            Curve3::Line(l) => {
                let len = l.length();
                if len <= 1e-12 {
                    return Err(GeometryError::DegenerateLine { length: len }.into());
                }
                let dir = l.direction();
                let rel = *pt - l.start;
                // Perpendicular distance via the cross-product magnitude.
                if dir.cross(&rel).length() > tol {
                    return Ok(false);
                }
                if !constrained {
                    return Ok(true);
                }
                let t = rel.dot(&dir) / len;
                let slack = tol / len;
                Ok(t >= -slack && t <= 1.0 + slack)
            }
            Curve3::Arc(a) => a.is_point_on(pt, apn, tol, constrained),
        }
    }

    /// Point at an arc-length distance from the curve start. Accepts
    /// lengths in [-1e-6, L+1e-6]; arcs convert length to angle and nudge
    /// the evaluated point back onto the circle to cancel drift.
    pub fn point_at_length_from_start(&self, apn: &Vector3, length: f64) -> Result<Point3> {
        let total = self.length(apn)?;
        if length < -1e-6 || length > total + 1e-6 {
            return Err(GeometryError::OutOfRange {
                name: "length",
                value: length,
                min: 0.0,
                max: total,
            }
            .into());
        }
        let length = length.clamp(0.0, total);
        match self {
            Curve3::Line(l) => Ok(l.start + l.direction() * length),
            Curve3::Arc(a) => {
                let (angle, _) = a.angle_and_sense(apn)?;
                a.point_at_angle(apn, angle * (length / total))
            }
        }
    }

    /// Arc length from the curve start to an on-curve point.
    pub fn length_at_point(&self, pt: &Point3, apn: &Vector3, tol: f64) -> Result<f64> {
        if !self.is_point_on(pt, apn, tol, true)? {
            return Err(GeometryError::PointNotOnCurve {
                x: pt.x,
                y: pt.y,
                z: pt.z,
            }
            .into());
        }
        let total = self.length(apn)?;
        match self {
            Curve3::Line(l) => {
                let t = (*pt - l.start).dot(&l.direction());
                Ok(t.clamp(0.0, total))
            }
            Curve3::Arc(a) => {
                let u = a.param_of_point(pt, apn)?;
                Ok(u.clamp(0.0, 1.0) * total)
            }
        }
    }

    /// Arc length between two on-curve points, regardless of their order
    /// along the curve.
    pub fn length_between(&self, a: &Point3, b: &Point3, apn: &Vector3, tol: f64) -> Result<f64> {
        let la = self.length_at_point(a, apn, tol)?;
        let lb = self.length_at_point(b, apn, tol)?;
        Ok((la - lb).abs())
    }

    /// Normalized parameter (0 at start, 1 at end) of an on-curve point.
    pub fn param_at_point(&self, pt: &Point3, apn: &Vector3, tol: f64) -> Result<f64> {
        let total = self.length(apn)?;
        if total <= 1e-12 {
            return Err(GeometryError::DegenerateLine { length: total }.into());
        }
        Ok(self.length_at_point(pt, apn, tol)? / total)
    }

    /// Point at a normalized parameter in [0, 1].
    pub fn point_at_param(&self, apn: &Vector3, u: f64) -> Result<Point3> {
        if !(-1e-9..=1.0 + 1e-9).contains(&u) {
            return Err(GeometryError::OutOfRange {
                name: "u",
                value: u,
                min: 0.0,
                max: 1.0,
            }
            .into());
        }
        let u = u.clamp(0.0, 1.0);
        match self {
            Curve3::Line(l) => Ok(l.start.lerp(&l.end, u)),
            Curve3::Arc(a) => {
                let (angle, _) = a.angle_and_sense(apn)?;
                a.point_at_angle(apn, angle * u)
            }
        }
    }

    /// Span between two normalized parameters, returned NEGATED: after
    /// ordering t1 <= t2 the result is `(t1 - t2) * length`, which is
    /// never positive. Callers expect this sign and compensate.
    pub fn length_between_params(&self, apn: &Vector3, t1: f64, t2: f64) -> Result<f64> {
        let (lo, hi) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
        Ok((lo - hi) * self.length(apn)?)
    }
}

/// Deterministic probe jitter: offsets a point along `dir` by
/// `step * 1e-4`. Attribute computations re-probe with increasing steps
/// when a candidate direction degenerates.
pub fn perturb_point(p: &Point3, dir: &Vector3, step: u32) -> Point3 {
    *p + dir.normalized() * (f64::from(step) * 1e-4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{eq, eq_tol, EPS};

    fn z_apn() -> Vector3 {
        Vector3::z_axis()
    }

    #[test]
    fn test_line_point_membership() {
        let c = Curve3::line(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0));
        let n = z_apn();
        assert!(c.is_point_on(&Point3::new(5.0, 0.0, 0.0), &n, EPS, true).unwrap());
        assert!(!c.is_point_on(&Point3::new(5.0, 1.0, 0.0), &n, EPS, true).unwrap());
        // Off the segment but on the carrier line.
        assert!(!c.is_point_on(&Point3::new(12.0, 0.0, 0.0), &n, EPS, true).unwrap());
        assert!(c.is_point_on(&Point3::new(12.0, 0.0, 0.0), &n, EPS, false).unwrap());
    }

    #[test]
    fn test_degenerate_line_is_error() {
        let c = Curve3::line(Point3::origin(), Point3::origin());
        let r = c.is_point_on(&Point3::new(1.0, 0.0, 0.0), &z_apn(), EPS, true);
        assert!(r.is_err());
    }

    #[test]
    fn test_line_length_round_trip() {
        let c = Curve3::line(Point3::new(1.0, 2.0, 0.0), Point3::new(7.0, 2.0, 0.0));
        let n = z_apn();
        let p = c.point_at_length_from_start(&n, 4.0).unwrap();
        assert!(p.coincident(&Point3::new(5.0, 2.0, 0.0)));
        let back = c.length_at_point(&p, &n, EPS).unwrap();
        assert!(eq(back, 4.0));
    }

    #[test]
    fn test_length_between_ignores_argument_order() {
        let c = Curve3::line(Point3::origin(), Point3::new(10.0, 0.0, 0.0));
        let n = z_apn();
        let a = Point3::new(2.0, 0.0, 0.0);
        let b = Point3::new(7.5, 0.0, 0.0);
        assert!(eq(c.length_between(&a, &b, &n, EPS).unwrap(), 5.5));
        assert!(eq(c.length_between(&b, &a, &n, EPS).unwrap(), 5.5));
    }

    #[test]
    fn test_length_out_of_range() {
        let c = Curve3::line(Point3::origin(), Point3::new(10.0, 0.0, 0.0));
        assert!(c.point_at_length_from_start(&z_apn(), 10.5).is_err());
        assert!(c.point_at_length_from_start(&z_apn(), -0.5).is_err());
        // Within the 1e-6 slack both ends clamp.
        assert!(c.point_at_length_from_start(&z_apn(), 10.0 + 5e-7).is_ok());
    }

    #[test]
    fn test_length_between_params_is_negated() {
        let c = Curve3::line(Point3::origin(), Point3::new(10.0, 0.0, 0.0));
        let n = z_apn();
        let span = c.length_between_params(&n, 0.2, 0.7).unwrap();
        assert!(eq(span, -5.0));
        // Argument order does not matter.
        let span = c.length_between_params(&n, 0.7, 0.2).unwrap();
        assert!(eq(span, -5.0));
    }

    #[test]
    fn test_perturb_point() {
        let p = Point3::origin();
        let q = perturb_point(&p, &Vector3::x_axis(), 3);
        assert!(eq_tol(q.x, 3e-4, 1e-12));
        assert!(eq(q.y, 0.0));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn line_length_round_trip(t in 0.01f64..0.99) {
                let c = Curve3::line(Point3::new(-3.0, 2.0, 0.0), Point3::new(9.0, 2.0, 0.0));
                let n = Vector3::z_axis();
                let total = c.length(&n).unwrap();
                let p = c.point_at_length_from_start(&n, total * t).unwrap();
                let back = c.length_at_point(&p, &n, EPS).unwrap();
                prop_assert!((back - total * t).abs() <= 1e-9);
            }

            #[test]
            fn arc_length_round_trip(sweep in 0.2f64..6.0, t in 0.01f64..0.99) {
                let at = |a: f64| Point3::new(12.0 * a.cos(), 12.0 * a.sin(), 0.0);
                let c = Curve3::arc(at(0.0), at(sweep * 0.25), at(sweep * 0.75), at(sweep));
                let n = Vector3::z_axis();
                let total = c.length(&n).unwrap();
                let p = c.point_at_length_from_start(&n, total * t).unwrap();
                let back = c.length_at_point(&p, &n, EPS).unwrap();
                prop_assert!((back - total * t).abs() <= 1e-6);
            }

            #[test]
            fn split_concat_preserves_length(u in 0.1f64..0.9) {
                let at = |a: f64| Point3::new(12.0 * a.cos(), 12.0 * a.sin(), 0.0);
                let c = Curve3::arc(at(0.0), at(0.75), at(2.25), at(3.0));
                let n = Vector3::z_axis();
                let p = c.point_at_param(&n, u).unwrap();
                let frags = c.split_at(&[p], 0.0, &n, EPS).unwrap();
                let total: f64 = frags
                    .iter()
                    .map(|f| f.length(&n).unwrap())
                    .sum();
                prop_assert!((total - c.length(&n).unwrap()).abs() <= 1e-6);
            }
        }
    }
}
