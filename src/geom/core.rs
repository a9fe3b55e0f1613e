use std::ops::{Add, Mul, Neg, Sub};

// ─────────────────────────────────────────────────────────────────────────────
// Vec3
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    /// Unit vector along the X axis.
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    /// Unit vector along the Y axis.
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    /// Unit vector along the Z axis.
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Create a Vec3 from an array.
    #[must_use]
    pub const fn from_array(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    /// Convert to an array.
    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    #[must_use]
    pub const fn length_squared(self) -> f64 {
        self.dot(self)
    }

    #[must_use]
    pub const fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[must_use]
    pub const fn cross(self, rhs: Self) -> Self {
        Self {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        if len.is_finite() && len > 0.0 {
            Some(Self::new(self.x / len, self.y / len, self.z / len))
        } else {
            None
        }
    }

    /// Linear interpolation between two vectors.
    /// Returns `self * (1 - t) + rhs * t`.
    #[must_use]
    pub fn lerp(self, rhs: Self, t: f64) -> Self {
        Self::new(
            self.x + (rhs.x - self.x) * t,
            self.y + (rhs.y - self.y) * t,
            self.z + (rhs.z - self.z) * t,
        )
    }

    #[must_use]
    pub const fn mul_scalar(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }

    #[must_use]
    pub const fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }

    #[must_use]
    pub const fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }

    #[must_use]
    pub const fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Component of `self` perpendicular to the unit vector `axis`.
    #[must_use]
    pub fn rejected_from(self, axis: Self) -> Self {
        self.sub(axis.mul_scalar(self.dot(axis)))
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(arr: [f64; 3]) -> Self {
        Self::from_array(arr)
    }
}

impl From<Vec3> for [f64; 3] {
    fn from(v: Vec3) -> Self {
        v.to_array()
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Vec3::add(self, rhs)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Vec3::sub(self, rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Vec3::neg(self)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        self.mul_scalar(rhs)
    }
}

/// Returns a unit vector orthogonal to `reference`.
/// Falls back to the world X axis when `reference` is degenerate.
#[must_use]
pub fn orthogonal_unit_vector(reference: Vec3) -> Vec3 {
    let candidate = if reference.x.abs() < reference.y.abs() {
        Vec3::new(0.0, -reference.z, reference.y)
    } else {
        Vec3::new(-reference.z, 0.0, reference.x)
    };

    candidate
        .normalized()
        .unwrap_or_else(|| Vec3::new(1.0, 0.0, 0.0))
}

// ─────────────────────────────────────────────────────────────────────────────
// Point3
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    /// The origin point (0, 0, 0).
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Create a Point3 from an array.
    #[must_use]
    pub const fn from_array(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Convert point to a position vector from the origin.
    #[must_use]
    pub const fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    #[must_use]
    pub const fn add_vec(self, v: Vec3) -> Self {
        Self::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }

    #[must_use]
    pub const fn sub_vec(self, v: Vec3) -> Self {
        Self::new(self.x - v.x, self.y - v.y, self.z - v.z)
    }

    #[must_use]
    pub const fn sub_point(self, rhs: Self) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }

    /// Linear interpolation between two points.
    /// Returns `self * (1 - t) + rhs * t`.
    #[must_use]
    pub fn lerp(self, rhs: Self, t: f64) -> Self {
        Self::new(
            self.x + (rhs.x - self.x) * t,
            self.y + (rhs.y - self.y) * t,
            self.z + (rhs.z - self.z) * t,
        )
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        self.sub_point(other).length()
    }

    /// Squared Euclidean distance to another point.
    #[must_use]
    pub fn distance_squared_to(self, other: Self) -> f64 {
        self.sub_point(other).length_squared()
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Default for Point3 {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl From<[f64; 3]> for Point3 {
    fn from(arr: [f64; 3]) -> Self {
        Self::from_array(arr)
    }
}

impl From<Point3> for [f64; 3] {
    fn from(p: Point3) -> Self {
        p.to_array()
    }
}

impl Sub for Point3 {
    type Output = Vec3;
    fn sub(self, rhs: Self) -> Self::Output {
        self.sub_point(rhs)
    }
}

impl Add<Vec3> for Point3 {
    type Output = Self;
    fn add(self, rhs: Vec3) -> Self::Output {
        self.add_vec(rhs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tolerance
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub eps: f64,
}

impl Tolerance {
    /// Default geometric tolerance (1e-9).
    pub const DEFAULT: Self = Self { eps: 1e-9 };

    /// Tolerance for detecting zero-length/degenerate vectors (1e-12).
    pub const ZERO_LENGTH: Self = Self { eps: 1e-12 };

    /// Step size for numerical differentiation (1e-6).
    /// Use this as a multiplier for domain span when computing first derivatives.
    pub const DERIVATIVE: Self = Self { eps: 1e-6 };

    /// Loose tolerance for coarse comparisons (1e-6).
    pub const LOOSE: Self = Self { eps: 1e-6 };

    #[must_use]
    pub const fn new(eps: f64) -> Self {
        Self { eps }
    }

    #[must_use]
    pub fn relative_to(self, span: f64) -> f64 {
        self.eps * span.abs().max(1.0)
    }

    #[must_use]
    pub fn approx_eq(self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.eps
    }

    #[must_use]
    pub fn approx_eq_point3(self, a: Point3, b: Point3) -> bool {
        a.distance_squared_to(b) <= self.eps * self.eps
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transform
// ─────────────────────────────────────────────────────────────────────────────

/// Rigid transform stored as a 4×4 matrix (column vectors).
/// Only rotation + translation are ever constructed here; `rigid_inverse`
/// relies on that.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    m: [[f64; 4]; 4],
}

impl Transform {
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            m: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Construct a transform from origin and three orthonormal axes.
    /// The axes are expected to be unit vectors and mutually perpendicular.
    #[must_use]
    pub fn from_axes(origin: Point3, x_axis: Vec3, y_axis: Vec3, z_axis: Vec3) -> Self {
        Self {
            m: [
                [x_axis.x, y_axis.x, z_axis.x, origin.x],
                [x_axis.y, y_axis.y, z_axis.y, origin.y],
                [x_axis.z, y_axis.z, z_axis.z, origin.z],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    #[must_use]
    pub const fn translate(offset: Vec3) -> Self {
        Self {
            m: [
                [1.0, 0.0, 0.0, offset.x],
                [0.0, 1.0, 0.0, offset.y],
                [0.0, 0.0, 1.0, offset.z],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Construct an aim frame at `origin`.
    ///
    /// The X axis points along `aim`, the Y axis is `up_hint` orthogonalized
    /// against the aim direction and the Z axis completes the right-handed
    /// frame. Falls back to a pure translation when `aim` is degenerate.
    #[must_use]
    pub fn aim_frame(origin: Point3, aim: Vec3, up_hint: Vec3) -> Self {
        let Some(x_axis) = aim.normalized() else {
            return Self::translate(origin.to_vec3());
        };

        let y_axis = match up_hint.rejected_from(x_axis).normalized() {
            Some(up) => up,
            None => orthogonal_unit_vector(x_axis),
        };
        let z_axis = match x_axis.cross(y_axis).normalized() {
            Some(z) => z,
            None => return Self::translate(origin.to_vec3()),
        };

        Self::from_axes(origin, x_axis, y_axis, z_axis)
    }

    #[must_use]
    pub fn translation(&self) -> Point3 {
        Point3::new(self.m[0][3], self.m[1][3], self.m[2][3])
    }

    #[must_use]
    pub fn x_axis(&self) -> Vec3 {
        Vec3::new(self.m[0][0], self.m[1][0], self.m[2][0])
    }

    #[must_use]
    pub fn y_axis(&self) -> Vec3 {
        Vec3::new(self.m[0][1], self.m[1][1], self.m[2][1])
    }

    #[must_use]
    pub fn z_axis(&self) -> Vec3 {
        Vec3::new(self.m[0][2], self.m[1][2], self.m[2][2])
    }

    /// Rotation part as row-major 3×3.
    #[must_use]
    pub fn rotation_rows(&self) -> [[f64; 3]; 3] {
        [
            [self.m[0][0], self.m[0][1], self.m[0][2]],
            [self.m[1][0], self.m[1][1], self.m[1][2]],
            [self.m[2][0], self.m[2][1], self.m[2][2]],
        ]
    }

    #[must_use]
    pub fn transform_point(&self, p: Point3) -> Point3 {
        Point3::new(
            self.m[0][0] * p.x + self.m[0][1] * p.y + self.m[0][2] * p.z + self.m[0][3],
            self.m[1][0] * p.x + self.m[1][1] * p.y + self.m[1][2] * p.z + self.m[1][3],
            self.m[2][0] * p.x + self.m[2][1] * p.y + self.m[2][2] * p.z + self.m[2][3],
        )
    }

    #[must_use]
    pub fn transform_vec(&self, v: Vec3) -> Vec3 {
        Vec3::new(
            self.m[0][0] * v.x + self.m[0][1] * v.y + self.m[0][2] * v.z,
            self.m[1][0] * v.x + self.m[1][1] * v.y + self.m[1][2] * v.z,
            self.m[2][0] * v.x + self.m[2][1] * v.y + self.m[2][2] * v.z,
        )
    }

    /// Compose: `self * rhs` (apply `rhs` first, then `self`).
    #[must_use]
    pub fn compose(&self, rhs: &Self) -> Self {
        let mut m = [[0.0; 4]; 4];
        for (i, row) in m.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.m[i][k] * rhs.m[k][j]).sum();
            }
        }
        Self { m }
    }

    /// Inverse of a rigid transform: transposed rotation, negated rotated
    /// translation.
    #[must_use]
    pub fn rigid_inverse(&self) -> Self {
        let r = [
            [self.m[0][0], self.m[1][0], self.m[2][0]],
            [self.m[0][1], self.m[1][1], self.m[2][1]],
            [self.m[0][2], self.m[1][2], self.m[2][2]],
        ];
        let t = self.translation();
        let tx = -(r[0][0] * t.x + r[0][1] * t.y + r[0][2] * t.z);
        let ty = -(r[1][0] * t.x + r[1][1] * t.y + r[1][2] * t.z);
        let tz = -(r[2][0] * t.x + r[2][1] * t.y + r[2][2] * t.z);
        Self {
            m: [
                [r[0][0], r[0][1], r[0][2], tx],
                [r[1][0], r[1][1], r[1][2], ty],
                [r[2][0], r[2][1], r[2][2], tz],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Transform {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_product_follows_right_hand_rule() {
        assert_eq!(Vec3::X.cross(Vec3::Y), Vec3::Z);
        assert_eq!(Vec3::Y.cross(Vec3::Z), Vec3::X);
    }

    #[test]
    fn normalized_rejects_zero_vector() {
        assert!(Vec3::ZERO.normalized().is_none());
        let unit = Vec3::new(3.0, 4.0, 0.0).normalized().unwrap();
        assert!((unit.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn orthogonal_unit_vector_is_perpendicular() {
        for v in [Vec3::X, Vec3::Z, Vec3::new(0.3, -2.0, 1.7)] {
            let o = orthogonal_unit_vector(v);
            assert!(v.dot(o).abs() < 1e-9);
            assert!((o.length() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn aim_frame_is_orthonormal() {
        let frame = Transform::aim_frame(
            Point3::new(1.0, 2.0, 3.0),
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(1.0, 0.5, 0.0),
        );
        let (x, y, z) = (frame.x_axis(), frame.y_axis(), frame.z_axis());
        assert!(x.dot(y).abs() < 1e-12);
        assert!(x.dot(z).abs() < 1e-12);
        assert!((x.cross(y).dot(z) - 1.0).abs() < 1e-12);
        assert_eq!(frame.translation(), Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn aim_frame_with_degenerate_aim_keeps_identity_rotation() {
        let frame = Transform::aim_frame(Point3::new(1.0, 0.0, 0.0), Vec3::ZERO, Vec3::Y);
        assert_eq!(frame.x_axis(), Vec3::X);
        assert_eq!(frame.translation(), Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn rigid_inverse_round_trips_points() {
        let frame = Transform::aim_frame(
            Point3::new(-2.0, 0.5, 4.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::Z,
        );
        let p = Point3::new(0.25, -1.5, 2.0);
        let round_trip = frame.rigid_inverse().transform_point(frame.transform_point(p));
        assert!(p.distance_to(round_trip) < 1e-12);
    }

    #[test]
    fn compose_applies_right_hand_side_first() {
        let shift = Transform::translate(Vec3::new(1.0, 0.0, 0.0));
        let quarter_turn = Transform::from_axes(Point3::ORIGIN, Vec3::Y, Vec3::X.neg(), Vec3::Z);
        let p = quarter_turn.compose(&shift).transform_point(Point3::ORIGIN);
        assert!(p.distance_to(Point3::new(0.0, 1.0, 0.0)) < 1e-12);
    }
}
