use std::ops::{Add, Div, Mul, Neg, Sub};

// ─────────────────────────────────────────────────────────────────────────────
// Vec3
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn from_array(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

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

    /// Unit vector in the same direction, or `None` for a zero or non-finite vector.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        if len.is_finite() && len > 0.0 {
            Some(self / len)
        } else {
            None
        }
    }

    /// Normalizes and also returns the original magnitude.
    /// A zero vector comes back unchanged with magnitude 0.
    #[must_use]
    pub fn normalize_with_length(self) -> (Self, f64) {
        let len = self.length();
        if len > 0.0 { (self / len, len) } else { (self, 0.0) }
    }

    /// Largest absolute coordinate.
    #[must_use]
    pub fn max_abs(self) -> f64 {
        self.x.abs().max(self.y.abs()).max(self.z.abs())
    }

    /// Angle in radians between two vectors, in `[0, pi]`.
    #[must_use]
    pub fn angle_to(self, rhs: Self) -> f64 {
        let c = self.dot(rhs);
        let s = self.cross(rhs).length();
        s.atan2(c)
    }

    /// `self + rhs * s`.
    #[must_use]
    pub fn add_scaled(self, rhs: Self, s: f64) -> Self {
        Self::new(self.x + rhs.x * s, self.y + rhs.y * s, self.z + rhs.z * s)
    }

    #[must_use]
    pub fn lerp(self, rhs: Self, t: f64) -> Self {
        self.add_scaled(rhs - self, t)
    }

    #[must_use]
    pub fn component(self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(arr: [f64; 3]) -> Self {
        Self::from_array(arr)
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Mul<Vec3> for f64 {
    type Output = Vec3;
    fn mul(self, rhs: Vec3) -> Self::Output {
        rhs * self
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;
    fn div(self, rhs: f64) -> Self::Output {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Point3
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    #[must_use]
    pub const fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Homogeneous lift `(x, y, z, w)` without weighting the xyz part.
    #[must_use]
    pub const fn with_weight(self, w: f64) -> Point4 {
        Point4::new(self.x, self.y, self.z, w)
    }

    /// Homogeneous lift `(x*w, y*w, z*w, w)`.
    #[must_use]
    pub const fn weighted(self, w: f64) -> Point4 {
        Point4::new(self.x * w, self.y * w, self.z * w, w)
    }

    #[must_use]
    pub fn scaled(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }

    #[must_use]
    pub fn lerp(self, rhs: Self, t: f64) -> Self {
        self + (rhs - self) * t
    }

    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (self - other).length()
    }

    #[must_use]
    pub fn distance_squared_to(self, other: Self) -> f64 {
        (self - other).length_squared()
    }

    /// Largest absolute coordinate difference.
    #[must_use]
    pub fn max_diff(self, other: Self) -> f64 {
        (self - other).max_abs()
    }

    #[must_use]
    pub fn max_abs(self) -> f64 {
        self.to_vec3().max_abs()
    }

    #[must_use]
    pub fn component(self, axis: usize) -> f64 {
        self.to_vec3().component(axis)
    }

    pub fn set_component(&mut self, axis: usize, value: f64) {
        match axis {
            0 => self.x = value,
            1 => self.y = value,
            _ => self.z = value,
        }
    }
}

impl From<[f64; 3]> for Point3 {
    fn from(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

impl From<Vec3> for Point3 {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl Add<Vec3> for Point3 {
    type Output = Self;
    fn add(self, rhs: Vec3) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub<Vec3> for Point3 {
    type Output = Self;
    fn sub(self, rhs: Vec3) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Vec3;
    fn sub(self, rhs: Self) -> Self::Output {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Point2
// ─────────────────────────────────────────────────────────────────────────────

/// Surface or facet parameter pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Point4
// ─────────────────────────────────────────────────────────────────────────────

/// Homogeneous point. Weighted poles are carried as `(x*w, y*w, z*w, w)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point4 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Point4 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    #[must_use]
    pub const fn from_array(arr: [f64; 4]) -> Self {
        Self::new(arr[0], arr[1], arr[2], arr[3])
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 4] {
        [self.x, self.y, self.z, self.w]
    }

    /// The xyz part, not divided by `w`.
    #[must_use]
    pub const fn xyz(self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }

    #[must_use]
    pub const fn xyz_vec(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Cartesian image `xyz / w`; `None` when `w == 0`.
    #[must_use]
    pub fn normalize(self) -> Option<Point3> {
        if self.w == 0.0 {
            None
        } else {
            let a = 1.0 / self.w;
            Some(Point3::new(self.x * a, self.y * a, self.z * a))
        }
    }

    /// Like [`normalize`](Self::normalize) but treats a zero weight as 1.
    #[must_use]
    pub fn normalize_or_xyz(self) -> Point3 {
        self.normalize().unwrap_or(self.xyz())
    }

    #[must_use]
    pub const fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z + self.w * rhs.w
    }

    #[must_use]
    pub fn scale(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s, self.w * s)
    }

    /// `self + rhs * s`.
    #[must_use]
    pub fn add_scaled(self, rhs: Self, s: f64) -> Self {
        Self::new(
            self.x + rhs.x * s,
            self.y + rhs.y * s,
            self.z + rhs.z * s,
            self.w + rhs.w * s,
        )
    }

    /// `a * self + b * rhs`.
    #[must_use]
    pub fn sum_of(self, a: f64, rhs: Self, b: f64) -> Self {
        Self::new(
            a * self.x + b * rhs.x,
            a * self.y + b * rhs.y,
            a * self.z + b * rhs.z,
            a * self.w + b * rhs.w,
        )
    }

    #[must_use]
    pub fn interpolate(self, t: f64, rhs: Self) -> Self {
        self.sum_of(1.0 - t, rhs, t)
    }

    #[must_use]
    pub fn component(self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            2 => self.z,
            _ => self.w,
        }
    }

    #[must_use]
    pub fn max_abs_diff(self, other: Self) -> f64 {
        (self.x - other.x)
            .abs()
            .max((self.y - other.y).abs())
            .max((self.z - other.z).abs())
            .max((self.w - other.w).abs())
    }
}

impl Add for Point4 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z, self.w + rhs.w)
    }
}

impl Sub for Point4 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z, self.w - rhs.w)
    }
}

impl Mul<f64> for Point4 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        self.scale(rhs)
    }
}

impl Div<f64> for Point4 {
    type Output = Self;
    fn div(self, rhs: f64) -> Self::Output {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs, self.w / rhs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Segment3 / Ray3
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment3 {
    pub start: Point3,
    pub end: Point3,
}

impl Segment3 {
    #[must_use]
    pub const fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.start.distance_to(self.end)
    }

    #[must_use]
    pub fn fraction_to_point(self, f: f64) -> Point3 {
        self.start.lerp(self.end, f)
    }

    #[must_use]
    pub fn reversed(self) -> Self {
        Self::new(self.end, self.start)
    }

    /// Fraction and point on the segment nearest to `p`.
    #[must_use]
    pub fn closest_point(self, p: Point3) -> (f64, Point3) {
        let d = self.end - self.start;
        let dd = d.length_squared();
        if dd == 0.0 {
            return (0.0, self.start);
        }
        let f = ((p - self.start).dot(d) / dd).clamp(0.0, 1.0);
        (f, self.fraction_to_point(f))
    }

    /// Closest pair between two segments as `(fa, fb, pa, pb)`.
    #[must_use]
    pub fn closest_approach(self, other: Self) -> (f64, f64, Point3, Point3) {
        let d1 = self.end - self.start;
        let d2 = other.end - other.start;
        let r = self.start - other.start;
        let a = d1.length_squared();
        let e = d2.length_squared();
        let f = d2.dot(r);

        let (s, t) = if a == 0.0 && e == 0.0 {
            (0.0, 0.0)
        } else if a == 0.0 {
            (0.0, (f / e).clamp(0.0, 1.0))
        } else {
            let c = d1.dot(r);
            if e == 0.0 {
                ((-c / a).clamp(0.0, 1.0), 0.0)
            } else {
                let b = d1.dot(d2);
                let denom = a * e - b * b;
                let mut s = if denom > 0.0 {
                    ((b * f - c * e) / denom).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let mut t = (b * s + f) / e;
                if t < 0.0 {
                    t = 0.0;
                    s = (-c / a).clamp(0.0, 1.0);
                } else if t > 1.0 {
                    t = 1.0;
                    s = ((b - c) / a).clamp(0.0, 1.0);
                }
                (s, t)
            }
        };
        (s, t, self.fraction_to_point(s), other.fraction_to_point(t))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray3 {
    pub origin: Point3,
    pub direction: Vec3,
}

impl Ray3 {
    #[must_use]
    pub const fn new(origin: Point3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    #[must_use]
    pub fn point_at(self, a: f64) -> Point3 {
        self.origin + self.direction * a
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BBox
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min: Point3,
    pub max: Point3,
}

impl BBox {
    #[must_use]
    pub const fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn from_point(p: Point3) -> Self {
        Self::new(p, p)
    }

    #[must_use]
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(rest.iter().fold(Self::from_point(*first), |b, p| b.expand_point(*p)))
    }

    #[must_use]
    pub fn center(self) -> Point3 {
        self.min.lerp(self.max, 0.5)
    }

    #[must_use]
    pub fn size(self) -> Vec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn diagonal(self) -> f64 {
        self.size().length()
    }

    #[must_use]
    pub fn contains_point(self, p: Point3) -> bool {
        (0..3).all(|k| p.component(k) >= self.min.component(k) && p.component(k) <= self.max.component(k))
    }

    #[must_use]
    pub fn intersects(self, other: Self) -> bool {
        (0..3).all(|k| {
            self.min.component(k) <= other.max.component(k)
                && self.max.component(k) >= other.min.component(k)
        })
    }

    #[must_use]
    pub fn expand_point(self, p: Point3) -> Self {
        Self::new(
            Point3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z)),
            Point3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z)),
        )
    }

    #[must_use]
    pub fn expand_by(self, amount: f64) -> Self {
        let d = Vec3::new(amount, amount, amount);
        Self::new(self.min - d, self.max + d)
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        self.expand_point(other.min).expand_point(other.max)
    }

    /// Euclidean gap between the boxes; zero when they overlap.
    #[must_use]
    pub fn distance_to_bbox(self, other: Self) -> f64 {
        let mut sum = 0.0;
        for k in 0..3 {
            let gap = (other.min.component(k) - self.max.component(k))
                .max(self.min.component(k) - other.max.component(k))
                .max(0.0);
            sum += gap * gap;
        }
        sum.sqrt()
    }

    #[must_use]
    pub fn distance_squared_to_point(self, p: Point3) -> f64 {
        let mut sum = 0.0;
        for k in 0..3 {
            let c = p.component(k);
            let gap = (self.min.component(k) - c).max(c - self.max.component(k)).max(0.0);
            sum += gap * gap;
        }
        sum
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tolerance
// ─────────────────────────────────────────────────────────────────────────────

/// Scalar tolerance wrapper for geometric comparisons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub eps: f64,
}

impl Tolerance {
    pub const DEFAULT: Self = Self { eps: 1e-9 };
    /// Degenerate vector and edge detection.
    pub const ZERO_LENGTH: Self = Self { eps: 1e-12 };
    /// Parameter convergence for iterative solvers.
    pub const PARAMETER: Self = Self { eps: 1e-10 };
    pub const LOOSE: Self = Self { eps: 1e-6 };

    #[must_use]
    pub const fn new(eps: f64) -> Self {
        Self { eps }
    }

    #[must_use]
    pub const fn eps_squared(self) -> f64 {
        self.eps * self.eps
    }

    #[must_use]
    pub fn scaled(self, scale: f64) -> Self {
        Self::new(self.eps * scale.abs())
    }

    #[must_use]
    pub fn approx_eq_f64(self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.eps
    }

    #[must_use]
    pub fn approx_eq_point3(self, a: Point3, b: Point3) -> bool {
        a.distance_squared_to(b) <= self.eps_squared()
    }

    #[must_use]
    pub fn approx_eq_vec3(self, a: Vec3, b: Vec3) -> bool {
        (a - b).length_squared() <= self.eps_squared()
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ClosedIndex
// ─────────────────────────────────────────────────────────────────────────────

/// Index arithmetic over a cyclic sequence of `period` entries.
///
/// Periodic curves address poles past the seam (`numPoles + k`) and facet
/// loops address the vertex after the last one; both go through this helper
/// instead of ad-hoc `%` arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosedIndex {
    period: usize,
}

impl ClosedIndex {
    #[must_use]
    pub const fn new(period: usize) -> Self {
        Self { period }
    }

    #[must_use]
    pub const fn period(self) -> usize {
        self.period
    }

    /// Wraps a possibly negative or overflowing index into `0..period`.
    /// Returns 0 for an empty period.
    #[must_use]
    pub fn wrap(self, index: isize) -> usize {
        if self.period == 0 {
            return 0;
        }
        index.rem_euclid(self.period as isize) as usize
    }

    #[must_use]
    pub fn next(self, index: usize) -> usize {
        self.wrap(index as isize + 1)
    }

    #[must_use]
    pub fn prev(self, index: usize) -> usize {
        self.wrap(index as isize - 1)
    }

    /// Copies `items[start..start + count]` with indices wrapped at the period.
    #[must_use]
    pub fn take_wrapped<T: Copy>(self, items: &[T], start: usize, count: usize) -> Vec<T> {
        (0..count)
            .map(|k| items[self.wrap((start + k) as isize)])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point4_normalize_rejects_zero_weight() {
        assert!(Point4::new(1.0, 2.0, 3.0, 0.0).normalize().is_none());
        let p = Point3::new(1.0, 2.0, 3.0).weighted(2.0);
        assert_eq!(p.normalize(), Some(Point3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn bbox_gap_is_zero_when_overlapping() {
        let a = BBox::new(Point3::ORIGIN, Point3::new(2.0, 2.0, 2.0));
        let b = BBox::new(Point3::new(1.0, 1.0, 1.0), Point3::new(3.0, 3.0, 3.0));
        let c = BBox::new(Point3::new(5.0, 2.0, 2.0), Point3::new(6.0, 3.0, 3.0));
        assert_eq!(a.distance_to_bbox(b), 0.0);
        assert!((a.distance_to_bbox(c) - 3.0).abs() < 1e-12);
        assert!((a.distance_squared_to_point(Point3::new(3.0, 3.0, 2.0)) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn closed_index_wraps_both_directions() {
        let idx = ClosedIndex::new(4);
        assert_eq!(idx.wrap(-1), 3);
        assert_eq!(idx.wrap(9), 1);
        assert_eq!(idx.next(3), 0);
        assert_eq!(idx.prev(0), 3);
        assert_eq!(idx.take_wrapped(&[10, 11, 12, 13], 3, 3), vec![13, 10, 11]);
        assert_eq!(ClosedIndex::new(0).wrap(5), 0);
    }

    #[test]
    fn angle_between_axes() {
        assert!((Vec3::X.angle_to(Vec3::Y) - std::f64::consts::FRAC_PI_2).abs() < 1e-15);
        assert!(Vec3::X.angle_to(Vec3::X).abs() < 1e-15);
    }
}
