//! Rigid transforms.
//!
//! Rotation plus translation only; no scale or shear, so lengths and
//! angles survive. Arc evaluation rotates the start point about the arc
//! axis with one of these, and part loading places chains into the
//! standard frame the same way.

use crate::math::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// A rigid transform. The three axis vectors are the images of the unit
/// axes and must stay orthonormal for [`XForm4::inverse`] to be exact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XForm4 {
    x_axis: Vector3,
    y_axis: Vector3,
    z_axis: Vector3,
    origin: Vector3,
}

impl XForm4 {
    /// The identity transform.
    pub fn identity() -> Self {
        XForm4 {
            x_axis: Vector3::x_axis(),
            y_axis: Vector3::y_axis(),
            z_axis: Vector3::z_axis(),
            origin: Vector3::zero(),
        }
    }

    /// Build a transform from an origin and an orthonormal basis.
    pub fn from_axes(origin: Point3, x_axis: Vector3, y_axis: Vector3, z_axis: Vector3) -> Self {
        XForm4 {
            x_axis,
            y_axis,
            z_axis,
            origin: origin.to_vector(),
        }
    }

    /// Pure translation.
    pub fn translation(offset: Vector3) -> Self {
        let mut xf = XForm4::identity();
        xf.origin = offset;
        xf
    }

    /// Rotation by `angle` radians about an axis through `center`.
    /// Positive angles are counterclockwise looking down the axis.
    pub fn rotation_about_axis(center: Point3, axis: Vector3, angle: f64) -> Self {
        let u = axis.normalized();
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;

        // Rodrigues rotation, written out per column.
        let x_axis = Vector3::new(
            c + u.x * u.x * t,
            u.y * u.x * t + u.z * s,
            u.z * u.x * t - u.y * s,
        );
        let y_axis = Vector3::new(
            u.x * u.y * t - u.z * s,
            c + u.y * u.y * t,
            u.z * u.y * t + u.x * s,
        );
        let z_axis = Vector3::new(
            u.x * u.z * t + u.y * s,
            u.y * u.z * t - u.x * s,
            c + u.z * u.z * t,
        );

        // Conjugate so the rotation pivots about `center` instead of the origin.
        let cv = center.to_vector();
        let rotated = Vector3::new(
            x_axis.x * cv.x + y_axis.x * cv.y + z_axis.x * cv.z,
            x_axis.y * cv.x + y_axis.y * cv.y + z_axis.y * cv.z,
            x_axis.z * cv.x + y_axis.z * cv.y + z_axis.z * cv.z,
        );
        XForm4 {
            x_axis,
            y_axis,
            z_axis,
            origin: cv - rotated,
        }
    }

    /// Transform a point (rotation and translation).
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.apply_vector(&p.to_vector()) + self.origin;
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a direction (rotation only).
    pub fn apply_vector(&self, v: &Vector3) -> Vector3 {
        self.x_axis * v.x + self.y_axis * v.y + self.z_axis * v.z
    }

    /// Exact inverse. Valid because the basis is orthonormal; the
    /// rotation inverts by transpose.
    pub fn inverse(&self) -> XForm4 {
        let x_axis = Vector3::new(self.x_axis.x, self.y_axis.x, self.z_axis.x);
        let y_axis = Vector3::new(self.x_axis.y, self.y_axis.y, self.z_axis.y);
        let z_axis = Vector3::new(self.x_axis.z, self.y_axis.z, self.z_axis.z);
        let inv = XForm4 {
            x_axis,
            y_axis,
            z_axis,
            origin: Vector3::zero(),
        };
        let origin = -inv.apply_vector(&self.origin);
        XForm4 { origin, ..inv }
    }
}

impl Mul for XForm4 {
    type Output = XForm4;

    /// Composition: `(a * b).apply_point(p) == a.apply_point(&b.apply_point(p))`.
    fn mul(self, rhs: XForm4) -> XForm4 {
        XForm4 {
            x_axis: self.apply_vector(&rhs.x_axis),
            y_axis: self.apply_vector(&rhs.y_axis),
            z_axis: self.apply_vector(&rhs.z_axis),
            origin: self.apply_vector(&rhs.origin) + self.origin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{eq, eq_tol};
    use proptest::prelude::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity() {
        let xf = XForm4::identity();
        let p = Point3::new(1.0, 2.0, 3.0);
        assert!(xf.apply_point(&p).coincident(&p));
    }

    #[test]
    fn test_rotation_about_axis() {
        // Quarter turn about Z through the origin takes +X to +Y.
        let xf = XForm4::rotation_about_axis(Point3::origin(), Vector3::z_axis(), FRAC_PI_2);
        let p = xf.apply_point(&Point3::new(1.0, 0.0, 0.0));
        assert!(p.coincident(&Point3::new(0.0, 1.0, 0.0)));

        // Pivot away from the origin: the center itself is fixed.
        let c = Point3::new(5.0, 5.0, 0.0);
        let xf = XForm4::rotation_about_axis(c, Vector3::z_axis(), FRAC_PI_2);
        assert!(xf.apply_point(&c).coincident(&c));
        let p = xf.apply_point(&Point3::new(6.0, 5.0, 0.0));
        assert!(p.coincident(&Point3::new(5.0, 6.0, 0.0)));
    }

    #[test]
    fn test_inverse_round_trip() {
        let xf = XForm4::rotation_about_axis(
            Point3::new(1.0, -2.0, 3.0),
            Vector3::new(1.0, 1.0, 0.5),
            0.7,
        ) * XForm4::translation(Vector3::new(4.0, 0.0, -1.0));
        let p = Point3::new(2.5, -1.5, 8.0);
        let back = xf.inverse().apply_point(&xf.apply_point(&p));
        assert!(back.eq_tol(&p, 1e-9));
    }

    #[test]
    fn test_composition_order() {
        let a = XForm4::translation(Vector3::new(1.0, 0.0, 0.0));
        let b = XForm4::rotation_about_axis(Point3::origin(), Vector3::z_axis(), FRAC_PI_2);
        let p = Point3::new(1.0, 0.0, 0.0);
        let via_mul = (a * b).apply_point(&p);
        let via_chain = a.apply_point(&b.apply_point(&p));
        assert!(via_mul.coincident(&via_chain));
        assert!(eq(via_mul.x, 1.0));
        assert!(eq(via_mul.y, 1.0));
    }

    proptest! {
        #[test]
        fn inverse_round_trips_any_rigid_motion(
            cx in -40.0f64..40.0, cy in -40.0f64..40.0, cz in -40.0f64..40.0,
            ax in -1.0f64..1.0, ay in -1.0f64..1.0, az in -1.0f64..1.0,
            angle in -3.0f64..3.0,
            tx in -30.0f64..30.0, ty in -30.0f64..30.0,
            px in -80.0f64..80.0, py in -80.0f64..80.0, pz in -80.0f64..80.0,
        ) {
            let axis = Vector3::new(ax, ay, az);
            prop_assume!(axis.length() > 0.1);
            let xf = XForm4::rotation_about_axis(Point3::new(cx, cy, cz), axis, angle)
                * XForm4::translation(Vector3::new(tx, ty, 0.0));
            let p = Point3::new(px, py, pz);
            let back = xf.inverse().apply_point(&xf.apply_point(&p));
            prop_assert!(back.eq_tol(&p, 1e-8));
        }

        #[test]
        fn rotation_preserves_vector_length(
            ax in -1.0f64..1.0, ay in -1.0f64..1.0, az in -1.0f64..1.0,
            angle in -6.0f64..6.0,
            vx in -50.0f64..50.0, vy in -50.0f64..50.0, vz in -50.0f64..50.0,
        ) {
            let axis = Vector3::new(ax, ay, az);
            prop_assume!(axis.length() > 0.1);
            let xf = XForm4::rotation_about_axis(Point3::new(3.0, -7.0, 2.0), axis, angle);
            let v = Vector3::new(vx, vy, vz);
            prop_assert!(eq_tol(xf.apply_vector(&v).length(), v.length(), 1e-9));
        }

        #[test]
        fn composition_applies_right_then_left(
            angle_a in -3.0f64..3.0,
            angle_b in -3.0f64..3.0,
            tx in -30.0f64..30.0, ty in -30.0f64..30.0,
            px in -50.0f64..50.0, py in -50.0f64..50.0, pz in -50.0f64..50.0,
        ) {
            let a = XForm4::rotation_about_axis(Point3::origin(), Vector3::z_axis(), angle_a)
                * XForm4::translation(Vector3::new(tx, ty, 0.0));
            let b = XForm4::rotation_about_axis(
                Point3::new(ty, 0.0, tx),
                Vector3::new(0.3, -1.0, 0.8),
                angle_b,
            );
            let p = Point3::new(px, py, pz);
            let via_mul = (a * b).apply_point(&p);
            let via_chain = a.apply_point(&b.apply_point(&p));
            prop_assert!(via_mul.eq_tol(&via_chain, 1e-8));
        }
    }
}
