//! Line-line intersection in 3D.
//!
//! Infinite lines, not segments. The solve is a least-squares fit of the
//! two line parameters, so nearly-intersecting lines (numerical noise from
//! repeated transforms) still classify as a point intersection when their
//! closest approach is within tolerance. The arc center fit is the main
//! consumer: it intersects two chord perpendicular bisectors.

use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, EPS};
use nalgebra::{Matrix3x2, Vector3 as NaVector3};

/// Outcome of intersecting two infinite 3D lines.
#[derive(Debug, Clone, PartialEq)]
pub enum LineIntersection {
    /// The lines meet (or pass within tolerance); the midpoint of the
    /// closest-approach segment is reported.
    Point(Point3),
    /// Parallel, distinct lines.
    Parallel,
    /// The lines are the same line.
    Collinear,
    /// Non-parallel lines whose closest approach exceeds tolerance.
    Skew {
        /// Closest point on the first line.
        on_first: Point3,
        /// Closest point on the second line.
        on_second: Point3,
        /// Distance between the two closest points.
        gap: f64,
    },
}

/// Intersect the infinite lines `o1 + t*d1` and `o2 + s*d2`.
///
/// Solves the 3x2 system `[d1 | -d2] * [t, s]^T = o2 - o1` by SVD least
/// squares, then classifies by the residual gap.
pub fn intersect_lines(
    o1: &Point3,
    d1: &Vector3,
    o2: &Point3,
    d2: &Vector3,
    tol: f64,
) -> Result<LineIntersection> {
    let u1 = d1.normalized();
    let u2 = d2.normalized();
    if u1.is_zero() {
        return Err(GeometryError::DegenerateLine { length: d1.length() }.into());
    }
    if u2.is_zero() {
        return Err(GeometryError::DegenerateLine { length: d2.length() }.into());
    }

    let r = *o2 - *o1;
    if u1.cross(&u2).length() <= EPS {
        if r.length() <= tol || u1.cross(&r.normalized()).length() <= EPS {
            return Ok(LineIntersection::Collinear);
        }
        return Ok(LineIntersection::Parallel);
    }

    let a = Matrix3x2::new(u1.x, -u2.x, u1.y, -u2.y, u1.z, -u2.z);
    let b = NaVector3::new(r.x, r.y, r.z);
    let svd = a.svd(true, true);
    let x = svd.solve(&b, 1e-12).map_err(|_| GeometryError::NoIntersection {
        reason: "least-squares solve failed".to_string(),
    })?;

    let on_first = *o1 + u1 * x[0];
    let on_second = *o2 + u2 * x[1];
    let gap = on_first.dist_to(&on_second);
    if gap <= tol {
        Ok(LineIntersection::Point(on_first.midpoint(&on_second)))
    } else {
        Ok(LineIntersection::Skew {
            on_first,
            on_second,
            gap,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crossing_lines() {
        let r = intersect_lines(
            &Point3::new(-1.0, 0.0, 0.0),
            &Vector3::x_axis(),
            &Point3::new(0.0, -1.0, 0.0),
            &Vector3::y_axis(),
            EPS,
        )
        .unwrap();
        match r {
            LineIntersection::Point(p) => assert!(p.coincident(&Point3::origin())),
            other => panic!("expected point intersection, got {:?}", other),
        }
    }

    #[test]
    fn test_parallel_and_collinear() {
        let r = intersect_lines(
            &Point3::origin(),
            &Vector3::x_axis(),
            &Point3::new(0.0, 1.0, 0.0),
            &Vector3::x_axis(),
            EPS,
        )
        .unwrap();
        assert_eq!(r, LineIntersection::Parallel);

        let r = intersect_lines(
            &Point3::origin(),
            &Vector3::x_axis(),
            &Point3::new(5.0, 0.0, 0.0),
            &Vector3::x_axis(),
            EPS,
        )
        .unwrap();
        assert_eq!(r, LineIntersection::Collinear);
    }

    #[test]
    fn test_skew_lines() {
        let r = intersect_lines(
            &Point3::origin(),
            &Vector3::x_axis(),
            &Point3::new(0.0, 0.0, 2.0),
            &Vector3::y_axis(),
            EPS,
        )
        .unwrap();
        match r {
            LineIntersection::Skew { gap, .. } => assert!((gap - 2.0).abs() <= EPS),
            other => panic!("expected skew, got {:?}", other),
        }
    }

    #[test]
    fn test_degenerate_direction() {
        let r = intersect_lines(
            &Point3::origin(),
            &Vector3::zero(),
            &Point3::origin(),
            &Vector3::x_axis(),
            EPS,
        );
        assert!(r.is_err());
    }
}
