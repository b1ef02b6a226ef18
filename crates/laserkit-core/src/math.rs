//! Scalar and vector primitives shared by the whole kernel.
//!
//! All coordinates are millimeters in part space. Comparisons go through
//! the tolerance helpers here rather than raw `==`; the default tolerance
//! is [`EPS`] and call sites that need a looser one pass it explicitly.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Default geometric tolerance in millimeters.
pub const EPS: f64 = 1e-6;

/// Tolerance used when re-walking chains that have already been split once.
pub const EPS_SPLIT: f64 = 1e-4;

/// Coarse tolerance for chain continuity checks.
pub const EPS_COARSE: f64 = 1e-3;

/// Compare two scalars within an explicit tolerance.
#[inline]
pub fn eq_tol(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

/// Compare two scalars within the default tolerance.
#[inline]
pub fn eq(a: f64, b: f64) -> bool {
    eq_tol(a, b, EPS)
}

/// A point in part space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    /// Create a new point.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Point3 { x, y, z }
    }

    /// The origin.
    pub fn origin() -> Self {
        Point3::new(0.0, 0.0, 0.0)
    }

    /// Euclidean distance to another point.
    pub fn dist_to(&self, other: &Point3) -> f64 {
        (*other - *self).length()
    }

    /// Whether two points coincide within `tol`.
    pub fn eq_tol(&self, other: &Point3, tol: f64) -> bool {
        self.dist_to(other) <= tol
    }

    /// Whether two points coincide within the default tolerance.
    pub fn coincident(&self, other: &Point3) -> bool {
        self.eq_tol(other, EPS)
    }

    /// Linear interpolation toward `other`; `t` in 0..=1 stays between them.
    pub fn lerp(&self, other: &Point3, t: f64) -> Point3 {
        *self + (*other - *self) * t
    }

    /// Midpoint between two points.
    pub fn midpoint(&self, other: &Point3) -> Point3 {
        self.lerp(other, 0.5)
    }

    /// Position vector from the origin.
    pub fn to_vector(&self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }
}

impl Add<Vector3> for Point3 {
    type Output = Point3;
    fn add(self, v: Vector3) -> Point3 {
        Point3::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }
}

impl AddAssign<Vector3> for Point3 {
    fn add_assign(&mut self, v: Vector3) {
        *self = *self + v;
    }
}

impl Sub<Vector3> for Point3 {
    type Output = Point3;
    fn sub(self, v: Vector3) -> Point3 {
        Point3::new(self.x - v.x, self.y - v.y, self.z - v.z)
    }
}

impl Sub for Point3 {
    type Output = Vector3;
    fn sub(self, other: Point3) -> Vector3 {
        Vector3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

/// A direction or displacement in part space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    /// Create a new vector.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3 { x, y, z }
    }

    /// The zero vector.
    pub fn zero() -> Self {
        Vector3::new(0.0, 0.0, 0.0)
    }

    /// Unit X axis.
    pub fn x_axis() -> Self {
        Vector3::new(1.0, 0.0, 0.0)
    }

    /// Unit Y axis.
    pub fn y_axis() -> Self {
        Vector3::new(0.0, 1.0, 0.0)
    }

    /// Unit Z axis.
    pub fn z_axis() -> Self {
        Vector3::new(0.0, 0.0, 1.0)
    }

    /// Euclidean length.
    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Whether the vector is shorter than the default tolerance.
    pub fn is_zero(&self) -> bool {
        self.length() <= EPS
    }

    /// Component-wise comparison within `tol`.
    pub fn eq_tol(&self, other: &Vector3, tol: f64) -> bool {
        eq_tol(self.x, other.x, tol) && eq_tol(self.y, other.y, tol) && eq_tol(self.z, other.z, tol)
    }

    /// Unit vector in the same direction. A vector shorter than 1e-12
    /// normalizes to zero rather than to NaN.
    pub fn normalized(&self) -> Vector3 {
        let len = self.length();
        if len < 1e-12 {
            Vector3::zero()
        } else {
            *self / len
        }
    }

    /// Dot product.
    pub fn dot(&self, other: &Vector3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product.
    pub fn cross(&self, other: &Vector3) -> Vector3 {
        Vector3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Whether this vector points against `other` (negative dot product).
    pub fn opposes(&self, other: &Vector3) -> bool {
        self.dot(other) < 0.0
    }

    /// Whether this vector is parallel to `other` within the default
    /// tolerance, ignoring orientation.
    pub fn is_parallel_to(&self, other: &Vector3) -> bool {
        self.normalized().cross(&other.normalized()).length() <= EPS
    }

    /// Angle to `other` in radians, in 0..=pi.
    pub fn angle_to(&self, other: &Vector3) -> f64 {
        let d = self.normalized().dot(&other.normalized());
        d.clamp(-1.0, 1.0).acos()
    }
}

impl Add for Vector3 {
    type Output = Vector3;
    fn add(self, other: Vector3) -> Vector3 {
        Vector3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl AddAssign for Vector3 {
    fn add_assign(&mut self, other: Vector3) {
        *self = *self + other;
    }
}

impl Sub for Vector3 {
    type Output = Vector3;
    fn sub(self, other: Vector3) -> Vector3 {
        Vector3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl SubAssign for Vector3 {
    fn sub_assign(&mut self, other: Vector3) {
        *self = *self - other;
    }
}

impl Neg for Vector3 {
    type Output = Vector3;
    fn neg(self) -> Vector3 {
        Vector3::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Vector3;
    fn mul(self, s: f64) -> Vector3 {
        Vector3::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Mul<Vector3> for f64 {
    type Output = Vector3;
    fn mul(self, v: Vector3) -> Vector3 {
        v * self
    }
}

impl Div<f64> for Vector3 {
    type Output = Vector3;
    fn div(self, s: f64) -> Vector3 {
        Vector3::new(self.x / s, self.y / s, self.z / s)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound3 {
    pub min: Point3,
    pub max: Point3,
}

impl Bound3 {
    pub fn new(min: Point3, max: Point3) -> Self {
        Bound3 { min, max }
    }

    /// An empty bound: grows to fit the first point included.
    pub fn empty() -> Self {
        Bound3 {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Bound of a single point.
    pub fn from_point(p: &Point3) -> Self {
        Bound3 { min: *p, max: *p }
    }

    /// Whether no point has been included yet.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    /// Grow to include a point.
    pub fn include(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Union of two bounds.
    pub fn union(&self, other: &Bound3) -> Bound3 {
        let mut b = *self;
        b.include(&other.min);
        b.include(&other.max);
        b
    }

    /// Extent along X.
    pub fn x_span(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Extent along Y.
    pub fn y_span(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Extent along Z.
    pub fn z_span(&self) -> f64 {
        self.max.z - self.min.z
    }

    /// Geometric center.
    pub fn center(&self) -> Point3 {
        self.min.midpoint(&self.max)
    }
}
