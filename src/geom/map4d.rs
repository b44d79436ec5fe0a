//! Projective maps: a forward/inverse matrix pair plus a capability mask.

use super::core::{Point3, Point4, Vec3};
use super::matrix4d::Matrix4d;

/// Map contains a translation.
pub const TRANSLATE: u32 = 0x01;
/// Map contains a rotation or general linear frame.
pub const FRAME: u32 = 0x02;
/// Map contains a non-unit scale on some axis.
pub const SCALE: u32 = 0x04;
/// Map has a non-trivial projective row.
pub const PERSPECTIVE: u32 = 0x08;
/// The inverse matrix is not a true inverse.
pub const SINGULAR: u32 = 0x10;

/// Bits recomputed from coefficients in the general multiply path.
const DERIVED_BITS: u32 = SINGULAR | PERSPECTIVE | SCALE;

/// `(cos, sin)` for quarter turns 0..4.
const QUADRANT_COS_SIN: [(f64, f64); 4] = [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)];

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error("box has a zero-length axis")]
    DegenerateBox,
    #[error("rotation axis has zero length")]
    DegenerateAxis,
    #[error("frame matrix could not be inverted")]
    SingularFrame,
    #[error("view volume has an empty coordinate range")]
    DegenerateFrustum,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Map4d {
    /// Forward matrix.
    pub m0: Matrix4d,
    /// Inverse matrix.
    pub m1: Matrix4d,
    pub mask: u32,
}

impl Default for Map4d {
    fn default() -> Self {
        Self::identity()
    }
}

impl Map4d {
    #[must_use]
    pub const fn new(m0: Matrix4d, m1: Matrix4d, mask: u32) -> Self {
        Self { m0, m1, mask }
    }

    #[must_use]
    pub const fn identity() -> Self {
        Self::new(Matrix4d::identity(), Matrix4d::identity(), 0)
    }

    #[must_use]
    pub fn has(&self, bits: u32) -> bool {
        self.mask & bits == bits
    }

    #[must_use]
    pub fn is_singular(&self) -> bool {
        self.has(SINGULAR)
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.m0.is_identity() && self.m1.is_identity()
    }

    #[must_use]
    pub const fn translation(t: Vec3) -> Self {
        Self::new(
            Matrix4d::translation(t),
            Matrix4d::translation(Vec3::new(-t.x, -t.y, -t.z)),
            TRANSLATE,
        )
    }

    /// Axis scales. A zero factor leaves a zero in the inverse and marks the
    /// map singular.
    #[must_use]
    pub fn scale(ax: f64, ay: f64, az: f64) -> Self {
        let mut m0 = Matrix4d::identity();
        let mut m1 = Matrix4d::identity();
        let mut mask = SCALE;
        for (k, a) in [ax, ay, az].into_iter().enumerate() {
            m0.coff[k][k] = a;
            if a == 0.0 {
                m1.coff[k][k] = 0.0;
                mask |= SINGULAR;
            } else {
                m1.coff[k][k] = 1.0 / a;
            }
        }
        Self::new(m0, m1, mask)
    }

    /// Axis-aligned scale and translate taking box `(lo0, hi0)` onto `(lo1, hi1)`.
    ///
    /// # Errors
    /// [`MapError::DegenerateBox`] if any axis has zero extent in either box.
    pub fn box_to_box(lo0: Point3, hi0: Point3, lo1: Point3, hi1: Point3) -> Result<Self, MapError> {
        let mut m0 = Matrix4d::identity();
        let mut m1 = Matrix4d::identity();
        for k in 0..3 {
            let d0 = hi0.component(k) - lo0.component(k);
            let d1 = hi1.component(k) - lo1.component(k);
            if d0 == 0.0 || d1 == 0.0 {
                return Err(MapError::DegenerateBox);
            }
            let a = d1 / d0;
            let b = lo1.component(k) - a * lo0.component(k);
            m0.coff[k][k] = a;
            m0.coff[k][3] = b;
            m1.coff[k][k] = 1.0 / a;
            m1.coff[k][3] = -b / a;
        }
        Ok(Self::new(m0, m1, SCALE | TRANSLATE))
    }

    /// Rotation about `axis` by the angle with the given cosine and sine.
    ///
    /// # Errors
    /// [`MapError::DegenerateAxis`] for a zero axis.
    pub fn rotation_cos_sin(axis: Vec3, c: f64, s: f64) -> Result<Self, MapError> {
        let u = axis.normalized().ok_or(MapError::DegenerateAxis)?;
        let t = 1.0 - c;
        let linear = [
            [t * u.x * u.x + c, t * u.x * u.y - s * u.z, t * u.x * u.z + s * u.y],
            [t * u.x * u.y + s * u.z, t * u.y * u.y + c, t * u.y * u.z - s * u.x],
            [t * u.x * u.z - s * u.y, t * u.y * u.z + s * u.x, t * u.z * u.z + c],
        ];
        let m0 = Matrix4d::from_affine(linear, Vec3::ZERO);
        Ok(Self::new(m0, m0.transpose(), FRAME))
    }

    /// Rotation by `quadrant` quarter turns; negative counts turn clockwise.
    ///
    /// # Errors
    /// [`MapError::DegenerateAxis`] for a zero axis.
    pub fn rotation_quadrant(axis: Vec3, quadrant: i32) -> Result<Self, MapError> {
        let (c, s) = QUADRANT_COS_SIN[quadrant.rem_euclid(4) as usize];
        Self::rotation_cos_sin(axis, c, s)
    }

    /// # Errors
    /// [`MapError::DegenerateAxis`] for a zero axis.
    pub fn rotation_radians(axis: Vec3, radians: f64) -> Result<Self, MapError> {
        Self::rotation_cos_sin(axis, radians.cos(), radians.sin())
    }

    /// `glOrtho`: maps the box `[left,right] x [bottom,top] x [-near,-far]`
    /// to the `+-1` cube. Reversed ranges are accepted and reflect the axis.
    ///
    /// # Errors
    /// [`MapError::DegenerateFrustum`] if any range is empty.
    pub fn ortho(left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> Result<Self, MapError> {
        let (rl, tb, fnr) = (right - left, top - bottom, far - near);
        if rl == 0.0 || tb == 0.0 || fnr == 0.0 {
            return Err(MapError::DegenerateFrustum);
        }
        let m0 = Matrix4d::from_rows([
            [2.0 / rl, 0.0, 0.0, -(right + left) / rl],
            [0.0, 2.0 / tb, 0.0, -(top + bottom) / tb],
            [0.0, 0.0, -2.0 / fnr, -(far + near) / fnr],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        let m1 = Matrix4d::from_rows([
            [0.5 * rl, 0.0, 0.0, 0.5 * (right + left)],
            [0.0, 0.5 * tb, 0.0, 0.5 * (top + bottom)],
            [0.0, 0.0, -0.5 * fnr, -0.5 * (far + near)],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        Ok(Self::new(m0, m1, SCALE | TRANSLATE))
    }

    /// `glFrustum`: perspective view volume onto the `+-1` cube.
    ///
    /// # Errors
    /// [`MapError::DegenerateFrustum`] for empty ranges or a zero near/far plane.
    pub fn frustum(left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> Result<Self, MapError> {
        let (rl, tb, fnr) = (right - left, top - bottom, far - near);
        if rl == 0.0 || tb == 0.0 || fnr == 0.0 || near == 0.0 || far == 0.0 {
            return Err(MapError::DegenerateFrustum);
        }
        let n2 = 2.0 * near;
        let fn2 = 2.0 * far * near;
        let m0 = Matrix4d::from_rows([
            [n2 / rl, 0.0, (right + left) / rl, 0.0],
            [0.0, n2 / tb, (top + bottom) / tb, 0.0],
            [0.0, 0.0, -(far + near) / fnr, -fn2 / fnr],
            [0.0, 0.0, -1.0, 0.0],
        ]);
        let m1 = Matrix4d::from_rows([
            [rl / n2, 0.0, 0.0, (right + left) / n2],
            [0.0, tb / n2, 0.0, (top + bottom) / n2],
            [0.0, 0.0, 0.0, -1.0],
            [0.0, 0.0, -fnr / fn2, (far + near) / fn2],
        ]);
        Ok(Self::new(m0, m1, PERSPECTIVE | SCALE | TRANSLATE))
    }

    /// Camera frustum from the back-plane origin and the ends of its x and y
    /// edges. The eye side lies along the right-handed normal at `depth`, and
    /// the front plane is the back rectangle shrunk by `fraction` about its
    /// center. World maps onto the unit cube with z = 0 on the back plane.
    ///
    /// # Errors
    /// [`MapError::SingularFrame`] when the frame or the taper cannot be
    /// inverted (collinear points, zero depth, zero fraction).
    pub fn camera_frustum(
        origin: Point3,
        x_point: Point3,
        y_point: Point3,
        depth: f64,
        fraction: f64,
    ) -> Result<Self, MapError> {
        let xv = x_point - origin;
        let yv = y_point - origin;
        let zv = xv.cross(yv).normalized().ok_or(MapError::SingularFrame)? * depth;
        let frame = Matrix4d::from_columns(
            Point4::new(xv.x, xv.y, xv.z, 0.0),
            Point4::new(yv.x, yv.y, yv.z, 0.0),
            Point4::new(zv.x, zv.y, zv.z, 0.0),
            origin.with_weight(1.0),
        );
        let h = 0.5 * (fraction - 1.0);
        let taper = Matrix4d::from_rows([
            [1.0, 0.0, h, 0.0],
            [0.0, 1.0, h, 0.0],
            [0.0, 0.0, fraction, 0.0],
            [0.0, 0.0, fraction - 1.0, 1.0],
        ]);
        let frame_inverse = frame.invert_qr().ok_or(MapError::SingularFrame)?;
        let taper_inverse = taper.invert_qr().ok_or(MapError::SingularFrame)?;
        let mut mask = FRAME | TRANSLATE | SCALE;
        if fraction != 1.0 {
            mask |= PERSPECTIVE;
        }
        Ok(Self::new(taper * frame_inverse, frame * taper_inverse, mask))
    }

    /// Map whose inverse takes the unit axes to the edges from `origin` to
    /// each of the three points.
    ///
    /// # Errors
    /// [`MapError::SingularFrame`] if QR inversion of the frame fails.
    pub fn skew_frame(origin: Point3, x_point: Point3, y_point: Point3, z_point: Point3) -> Result<Self, MapError> {
        let col = |p: Point3| {
            let v = p - origin;
            Point4::new(v.x, v.y, v.z, 0.0)
        };
        let frame = Matrix4d::from_columns(col(x_point), col(y_point), col(z_point), origin.with_weight(1.0));
        let inverse = frame.invert_qr().ok_or(MapError::SingularFrame)?;
        Ok(Self::new(frame, inverse, FRAME | TRANSLATE | SCALE))
    }

    /// Swaps forward and inverse.
    #[must_use]
    pub const fn invert(&self) -> Self {
        Self::new(self.m1, self.m0, self.mask)
    }

    /// `self * other` with the mask taken from the operand masks only.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self::new(self.m0 * other.m0, other.m1 * self.m1, self.mask | other.mask)
    }

    /// `self * other` with singular, perspective and scale bits re-derived from
    /// the product coefficients.
    #[must_use]
    pub fn multiply(&self, other: &Self) -> Self {
        let m0 = self.m0 * other.m0;
        let m1 = other.m1 * self.m1;
        let mut mask = (self.mask | other.mask) & !DERIVED_BITS;
        if m0.coff[3] != [0.0, 0.0, 0.0, 1.0] {
            mask |= PERSPECTIVE;
        }
        if (0..3).any(|k| m0.coff[k][k] != 1.0) {
            mask |= SCALE;
        }
        let round_trip = m0 * m1;
        if (0..4).any(|k| round_trip.coff[k][k] == 0.0) {
            mask |= SINGULAR;
        }
        Self::new(m0, m1, mask)
    }

    /// `C^-1 * B^-1 * A * B * C`, skipping absent brackets.
    #[must_use]
    pub fn sandwich(a: &Self, b: Option<&Self>, c: Option<&Self>) -> Self {
        let mut result = *a;
        if let Some(b) = b {
            result = b.invert().multiply(&result).multiply(b);
        }
        if let Some(c) = c {
            result = c.invert().multiply(&result).multiply(c);
        }
        result
    }

    #[must_use]
    pub fn transform_point(&self, p: Point4) -> Point4 {
        self.m0.multiply_point4(p)
    }

    #[must_use]
    pub fn inverse_transform_point(&self, p: Point4) -> Point4 {
        self.m1.multiply_point4(p)
    }

    /// Max-abs deviation of `m0 * m1` from the identity.
    #[must_use]
    pub fn inverse_error(&self) -> f64 {
        (self.m0 * self.m1).max_abs_diff(&Matrix4d::identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadrant_rotation_is_exact() {
        let map = Map4d::rotation_quadrant(Vec3::Z, 1).expect("rotation");
        let p = map.transform_point(Point4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(p, Point4::new(0.0, 1.0, 0.0, 1.0));
        let q = Map4d::rotation_quadrant(Vec3::Z, -3).expect("rotation");
        assert_eq!(map.m0, q.m0);
    }

    #[test]
    fn compose_keeps_table_mask() {
        let a = Map4d::translation(Vec3::new(1.0, 0.0, 0.0));
        let b = Map4d::scale(2.0, 2.0, 2.0);
        let c = a.compose(&b);
        assert_eq!(c.mask, TRANSLATE | SCALE);
    }
}
