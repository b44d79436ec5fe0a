//! Dense 4x4 homogeneous matrix algebra.
//!
//! Storage is row-major (`coff[row][col]`). Points multiply as column vectors,
//! so the translation lives in column 3 and the projective row is row 3.
//!
//! Numeric degeneracy (zero pivots, zero-length reflection columns) is
//! reported through `Option`/`bool` returns; nothing in this module panics on
//! a singular matrix.

use super::core::{Point2, Point3, Point4, Vec3};

const HDIM: usize = 4;

/// Relative tolerance used by [`Matrix4d::evaluate_image_grid`] when the caller passes 0.
pub const DEFAULT_PERSPECTIVE_TOLERANCE: f64 = 1.0e-10;

/// Entry-wise tolerance for [`Matrix4d::is_identity`] and [`Matrix4d::is_affine`].
const IDENTITY_TOLERANCE: f64 = 1.0e-12;

/// Sweep cap for the Jacobi eigen solver.
const MAX_JACOBI_SWEEPS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4d {
    pub coff: [[f64; 4]; 4],
}

/// Principal axes and moments extracted from a moment-products matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrincipalMoments {
    /// Zeroth moment (volume, area or length depending on the integrals).
    pub volume: f64,
    pub centroid: Point3,
    /// Unit principal directions, one per eigenvalue.
    pub axes: [Vec3; 3],
    /// Diagonal of the moment tensor in the principal frame.
    pub moments: Vec3,
}

impl Default for Matrix4d {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix4d {
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            coff: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self { coff: [[0.0; 4]; 4] }
    }

    #[must_use]
    pub const fn from_rows(coff: [[f64; 4]; 4]) -> Self {
        Self { coff }
    }

    #[must_use]
    pub fn from_columns(c0: Point4, c1: Point4, c2: Point4, c3: Point4) -> Self {
        let mut m = Self::zero();
        for (j, c) in [c0, c1, c2, c3].into_iter().enumerate() {
            m.set_column(j, c);
        }
        m
    }

    /// Affine matrix with a 3x3 linear part (rows) and a translation column.
    #[must_use]
    pub const fn from_affine(linear: [[f64; 3]; 3], translation: Vec3) -> Self {
        Self {
            coff: [
                [linear[0][0], linear[0][1], linear[0][2], translation.x],
                [linear[1][0], linear[1][1], linear[1][2], translation.y],
                [linear[2][0], linear[2][1], linear[2][2], translation.z],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    #[must_use]
    pub const fn translation(t: Vec3) -> Self {
        Self::from_affine([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]], t)
    }

    #[must_use]
    pub const fn row(&self, i: usize) -> Point4 {
        Point4::from_array(self.coff[i])
    }

    #[must_use]
    pub const fn column(&self, j: usize) -> Point4 {
        Point4::new(self.coff[0][j], self.coff[1][j], self.coff[2][j], self.coff[3][j])
    }

    pub fn set_row(&mut self, i: usize, p: Point4) {
        self.coff[i] = p.to_array();
    }

    pub fn set_column(&mut self, j: usize, p: Point4) {
        let a = p.to_array();
        for (i, value) in a.into_iter().enumerate() {
            self.coff[i][j] = value;
        }
    }

    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut t = Self::zero();
        for i in 0..HDIM {
            for j in 0..HDIM {
                t.coff[j][i] = self.coff[i][j];
            }
        }
        t
    }

    /// `self * rhs`.
    #[must_use]
    pub fn multiply_matrix(&self, rhs: &Self) -> Self {
        let mut out = Self::zero();
        for i in 0..HDIM {
            for j in 0..HDIM {
                out.coff[i][j] = (0..HDIM).map(|k| self.coff[i][k] * rhs.coff[k][j]).sum();
            }
        }
        out
    }

    #[must_use]
    pub fn multiply_point4(&self, p: Point4) -> Point4 {
        let v = p.to_array();
        let mut out = [0.0; 4];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = (0..HDIM).map(|k| self.coff[i][k] * v[k]).sum();
        }
        Point4::from_array(out)
    }

    /// Multiplies `(xyz, w)` as a homogeneous column.
    #[must_use]
    pub fn multiply_xyzw(&self, xyz: Point3, w: f64) -> Point4 {
        self.multiply_point4(xyz.with_weight(w))
    }

    #[must_use]
    pub fn multiply_points(&self, points: &[Point4]) -> Vec<Point4> {
        points.iter().map(|p| self.multiply_point4(*p)).collect()
    }

    /// Applies the full 4x4 to each point (with w = 1) and divides by the
    /// resulting weight, except when that weight is exactly 0 or 1.
    pub fn multiply_and_renormalize(&self, points: &mut [Point3]) {
        for p in points.iter_mut() {
            let r = self.multiply_xyzw(*p, 1.0);
            *p = if r.w == 1.0 || r.w == 0.0 {
                r.xyz()
            } else {
                let a = 1.0 / r.w;
                Point3::new(r.x * a, r.y * a, r.z * a)
            };
        }
    }

    #[must_use]
    pub fn max_abs(&self) -> f64 {
        self.coff.iter().flatten().fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    #[must_use]
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        self.coff
            .iter()
            .flatten()
            .zip(other.coff.iter().flatten())
            .fold(0.0_f64, |acc, (a, b)| acc.max((a - b).abs()))
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.max_abs_diff(&Self::identity()) <= IDENTITY_TOLERANCE
    }

    #[must_use]
    pub fn is_affine(&self) -> bool {
        self.coff[3][0].abs() < IDENTITY_TOLERANCE
            && self.coff[3][1].abs() < IDENTITY_TOLERANCE
            && self.coff[3][2].abs() < IDENTITY_TOLERANCE
            && (self.coff[3][3] - 1.0).abs() < IDENTITY_TOLERANCE
    }

    #[must_use]
    pub fn determinant(&self) -> f64 {
        let m = &self.coff;
        let mut det = 0.0;
        for j in 0..HDIM {
            let sign = if j % 2 == 0 { 1.0 } else { -1.0 };
            det += sign * m[0][j] * self.minor3(0, j);
        }
        det
    }

    fn minor3(&self, skip_row: usize, skip_col: usize) -> f64 {
        let mut sub = [[0.0; 3]; 3];
        let rows = (0..HDIM).filter(|r| *r != skip_row);
        for (si, r) in rows.enumerate() {
            let cols = (0..HDIM).filter(|c| *c != skip_col);
            for (sj, c) in cols.enumerate() {
                sub[si][sj] = self.coff[r][c];
            }
        }
        determinant3(&sub)
    }

    /// Upper-left 3x3 block.
    #[must_use]
    pub fn linear_part(&self) -> [[f64; 3]; 3] {
        let mut q = [[0.0; 3]; 3];
        for (i, row) in q.iter_mut().enumerate() {
            row.copy_from_slice(&self.coff[i][..3]);
        }
        q
    }

    // ─────────────────────────────────────────────────────────────────────
    // QR
    // ─────────────────────────────────────────────────────────────────────

    /// Householder factorization: reflection vectors (column `k` holds the
    /// vector for pivot `k`, rows `k..4`) and the upper triangle `R`.
    fn factor_reflections(&self) -> Option<(Self, Self)> {
        let mut r = *self;
        let mut q = Self::zero();
        for pivot in 0..HDIM - 1 {
            if !construct_column_reflection(&mut q, &mut r, pivot) {
                return None;
            }
            for j in pivot + 1..HDIM {
                let dot = partial_column_dot(&q, pivot, &r, j, pivot);
                partial_column_update(&mut r, j, dot, &q, pivot, pivot);
            }
        }
        Some((q, r))
    }

    /// Factors `self = Q * R` with `Q` orthogonal and `R` upper triangular.
    ///
    /// Returns `None` when a Householder step meets a column whose trailing
    /// part is exactly zero.
    #[must_use]
    pub fn factor_qr(&self) -> Option<(Self, Self)> {
        let (reflections, r) = self.factor_reflections()?;
        // H0 * H1 * H2, built by applying from the left in reverse order.
        let mut q = Self::identity();
        for pivot in (0..HDIM - 1).rev() {
            apply_reflection_left(&mut q, &reflections, pivot);
        }
        Some((q, r))
    }

    /// Inverse through QR factors and back substitution.
    ///
    /// Fails when the factorization fails or a diagonal of `R` is exactly 0.
    #[must_use]
    pub fn invert_qr(&self) -> Option<Self> {
        let (reflections, r) = self.factor_reflections()?;
        // R * B = H2 * H1 * H0
        let mut b = Self::identity();
        for pivot in 0..HDIM - 1 {
            apply_reflection_left(&mut b, &reflections, pivot);
        }
        for j in 0..HDIM {
            if !back_substitute(&mut b, j, &r) {
                log::trace!("invert_qr: zero diagonal in R");
                return None;
            }
        }
        Some(b)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Eigen
    // ─────────────────────────────────────────────────────────────────────

    /// Eigenvectors of a symmetric matrix by cyclic Jacobi rotation.
    ///
    /// Column `k` of the returned matrix is the unit eigenvector for
    /// eigenvalue `k` of the returned point. Symmetry is not checked; only
    /// the upper triangle drives the rotations.
    #[must_use]
    pub fn symmetric_eigenvectors(&self) -> (Self, Point4) {
        let (vectors, values) = jacobi_eigensystem(self.coff);
        (Self::from_rows(vectors), Point4::from_array(values))
    }

    /// Approximate null vector of an upper triangular matrix.
    ///
    /// The entry at the smallest-magnitude diagonal is fixed at 1 and the
    /// remaining entries are back-solved after Givens rotations restore the
    /// triangle. Returns the vector and the residual left in the last
    /// diagonal slot, or `None` when a back-solve divisor is zero.
    #[must_use]
    pub fn approximate_null_vector_for_upper_triangle(&self) -> Option<(Point4, f64)> {
        let last = HDIM - 1;
        let mut a = self.coff;
        let mut i_min = 0;
        let mut a_min = a[0][0].abs();
        for (i, row) in a.iter().enumerate().skip(1) {
            if row[i].abs() < a_min {
                a_min = row[i].abs();
                i_min = i;
            }
        }

        let mut bb = [0.0; HDIM];
        for (i, b) in bb.iter_mut().enumerate().take(i_min + 1) {
            *b = -a[i][i_min];
        }
        for j in i_min + 1..HDIM {
            for i in 0..=j {
                a[i][j - 1] = a[i][j];
            }
        }
        for (i, row) in a.iter_mut().enumerate() {
            row[last] = bb[i];
        }

        for i in i_min..last {
            let k = i + 1;
            let (c, s) = givens_weights(a[i][i], a[k][i]);
            for j in i..HDIM {
                let (u, v) = (a[i][j], a[k][j]);
                a[i][j] = c * u + s * v;
                a[k][j] = -s * u + c * v;
            }
        }

        let mut yy = [0.0; HDIM];
        for j in (0..last).rev() {
            let yj = safe_divide(a[j][last], a[j][j])?;
            yy[j] = yj;
            for i in 0..j {
                a[i][last] -= yj * a[i][j];
            }
        }

        let mut xx = [0.0; HDIM];
        xx[..i_min].copy_from_slice(&yy[..i_min]);
        xx[i_min] = 1.0;
        for i in i_min + 1..HDIM {
            xx[i] = yy[i - 1];
        }
        Some((Point4::from_array(xx), a[last][last]))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Moment products
    // ─────────────────────────────────────────────────────────────────────

    /// Adds `scale * [x y z 1]^T [x y z 1]`.
    pub fn add_symmetric_scaled_outer_product(&mut self, xyz: Point3, scale: f64) {
        let u = xyz.with_weight(1.0).to_array();
        for i in 0..HDIM {
            for j in 0..HDIM {
                self.coff[i][j] += u[i] * u[j] * scale;
            }
        }
    }

    /// Adds `scale * U U^T`.
    pub fn add_scaled_outer_product(&mut self, u: Point4, scale: f64) {
        let pu = u.to_array();
        for i in 0..HDIM {
            for j in 0..HDIM {
                self.coff[i][j] += scale * pu[i] * pu[j];
            }
        }
    }

    /// Adds `scale * (U V^T + V U^T)`.
    pub fn add_symmetric_scaled_outer_product_pair(&mut self, u: Point4, v: Point4, scale: f64) {
        let (pu, pv) = (u.to_array(), v.to_array());
        for i in 0..HDIM {
            for j in 0..HDIM {
                self.coff[i][j] += scale * (pu[i] * pv[j] + pv[i] * pu[j]);
            }
        }
    }

    /// Moment products of the volume swept by translating a planar region
    /// with the given products along `sweep`.
    #[must_use]
    pub fn sweep_moment_products(base: &Self, sweep: Vec3) -> Self {
        let moment1 = base.column(3);
        let mass0 = base.coff[3][3];
        let a = sweep.length();
        let u = Point4::new(sweep.x, sweep.y, sweep.z, 0.0);
        let mut products = Self::zero();
        for i in 0..HDIM {
            for j in 0..HDIM {
                products.coff[i][j] = a * base.coff[i][j];
            }
        }
        products.add_scaled_outer_product(u, mass0 * a / 3.0);
        products.add_symmetric_scaled_outer_product_pair(moment1, u, a / 2.0);
        products
    }

    /// `scale * T * M * T^T` for an affine `T`, keeping row 3 of `M` unmapped.
    #[must_use]
    pub fn from_sandwich_product(transform: &Self, moments: &Self, scale: f64) -> Self {
        let mut ab = Self::zero();
        for i in 0..3 {
            for j in 0..HDIM {
                ab.coff[i][j] = (0..HDIM).map(|k| transform.coff[i][k] * moments.coff[k][j]).sum();
            }
        }
        ab.coff[3] = moments.coff[3];

        let mut abc = Self::zero();
        for i in 0..HDIM {
            for j in 0..3 {
                abc.coff[i][j] =
                    scale * (0..HDIM).map(|k| ab.coff[i][k] * transform.coff[j][k]).sum::<f64>();
            }
            abc.coff[i][3] = scale * ab.coff[i][3];
        }
        abc
    }

    /// Reduces `[xx xy xz x; .. ; x y z v]` moment products to centroid,
    /// principal axes and principal moments. Fails when the zeroth moment is 0.
    #[must_use]
    pub fn convert_inertia_products_to_principal_moments(&self) -> Option<PrincipalMoments> {
        let volume = self.coff[3][3];
        if volume == 0.0 {
            return None;
        }
        let moment1 = Vec3::new(self.coff[0][3], self.coff[1][3], self.coff[2][3]);
        let centroid = moment1 / volume;
        let mut q = self.linear_part();
        for (i, row) in q.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                *value -= moment1.component(i) * centroid.component(j);
            }
        }
        let (xx, yy, zz) = (q[0][0], q[1][1], q[2][2]);
        let mut s = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                s[i][j] = -q[i][j];
            }
        }
        s[0][0] = yy + zz;
        s[1][1] = xx + zz;
        s[2][2] = xx + yy;

        let (vectors, values) = jacobi_eigensystem(s);
        let axes = [0, 1, 2].map(|k| Vec3::new(vectors[0][k], vectors[1][k], vectors[2][k]));
        Some(PrincipalMoments {
            volume,
            centroid: Point3::from(centroid),
            axes,
            moments: Vec3::from_array(values),
        })
    }

    /// As [`convert_inertia_products_to_principal_moments`](Self::convert_inertia_products_to_principal_moments)
    /// for products computed in local coordinates of an affine `local_to_world`.
    #[must_use]
    pub fn convert_inertia_products_to_principal_moments_in(
        &self,
        local_to_world: &Self,
    ) -> Option<PrincipalMoments> {
        let linear = local_to_world.linear_part();
        let rotate = Self::from_affine(linear, Vec3::ZERO);
        let world = Self::from_sandwich_product(&rotate, self, determinant3(&linear).abs());
        let mut result = world.convert_inertia_products_to_principal_moments()?;
        let shift = local_to_world.column(3);
        result.centroid = result.centroid + shift.xyz_vec();
        Some(result)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Image grid
    // ─────────────────────────────────────────────────────────────────────

    /// Normalized xy images of the grid points `(x0 + i, y0 + j, 0, 1)` for
    /// `i < m`, `j < n`, stored at index `j * m + i`.
    ///
    /// A tolerance of 0 selects [`DEFAULT_PERSPECTIVE_TOLERANCE`]. Returns
    /// `None` when a perspective weight drops below the relative tolerance.
    #[must_use]
    pub fn evaluate_image_grid(&self, x0: f64, y0: f64, m: usize, n: usize, tol: f64) -> Option<Vec<Point2>> {
        let tol = if tol <= 0.0 { DEFAULT_PERSPECTIVE_TOLERANCE } else { tol };
        let c = &self.coff;
        let mut ox = c[0][0] * x0 + c[0][1] * y0 + c[0][3];
        let mut oy = c[1][0] * x0 + c[1][1] * y0 + c[1][3];
        let ow = c[3][0] * x0 + c[3][1] * y0 + c[3][3];
        let (mut dxi, mut dyi, dwi) = (c[0][0], c[1][0], c[3][0]);
        let (mut dxj, mut dyj, dwj) = (c[0][1], c[1][1], c[3][1]);

        let mut grid = Vec::with_capacity(m * n);
        if dwi.abs() + dwj.abs() < tol * ow.abs() {
            if (ow - 1.0).abs() > tol {
                ox /= ow;
                oy /= ow;
                dxi /= ow;
                dyi /= ow;
                dxj /= ow;
                dyj /= ow;
            }
            for j in 0..n {
                let (rx, ry) = (ox + j as f64 * dxj, oy + j as f64 * dyj);
                for i in 0..m {
                    grid.push(Point2::new(rx + i as f64 * dxi, ry + i as f64 * dyi));
                }
            }
        } else {
            let w_tol = tol * (ow.abs() + m as f64 * dwi.abs() + n as f64 * dwj.abs());
            for j in 0..n {
                for i in 0..m {
                    let (fi, fj) = (i as f64, j as f64);
                    let w = ow + fi * dwi + fj * dwj;
                    if w < w_tol {
                        return None;
                    }
                    let x = ox + fi * dxi + fj * dxj;
                    let y = oy + fi * dyi + fj * dyj;
                    grid.push(Point2::new(x / w, y / w));
                }
            }
        }
        Some(grid)
    }
}

impl std::ops::Mul for Matrix4d {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        self.multiply_matrix(&rhs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn determinant3(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

fn partial_column_dot(a: &Matrix4d, col_a: usize, b: &Matrix4d, col_b: usize, first_row: usize) -> f64 {
    (first_row..HDIM).map(|i| a.coff[i][col_a] * b.coff[i][col_b]).sum()
}

/// `a[i][col_a] -= factor * b[i][col_b]` for `i` in `first_row..4`.
fn partial_column_update(
    a: &mut Matrix4d,
    col_a: usize,
    factor: f64,
    b: &Matrix4d,
    col_b: usize,
    first_row: usize,
) {
    for i in first_row..HDIM {
        a.coff[i][col_a] -= factor * b.coff[i][col_b];
    }
}

/// Moves the trailing part of `r[.., pivot]` into a reflection vector in
/// `q[.., pivot]` scaled so that `H = I - v v^T`, leaving `-+|v|` on the
/// diagonal of `r`.
fn construct_column_reflection(q: &mut Matrix4d, r: &mut Matrix4d, pivot: usize) -> bool {
    let mut mag2 = 0.0;
    for i in pivot..HDIM {
        let t = r.coff[i][pivot];
        q.coff[i][pivot] = t;
        r.coff[i][pivot] = 0.0;
        mag2 += t * t;
    }
    if mag2 == 0.0 {
        return false;
    }
    let mut mag = mag2.sqrt();
    if q.coff[pivot][pivot] < 0.0 {
        mag = -mag;
    }
    r.coff[pivot][pivot] = -mag;
    q.coff[pivot][pivot] += mag;
    let scale = 1.0 / (mag * q.coff[pivot][pivot]).sqrt();
    for i in pivot..HDIM {
        q.coff[i][pivot] *= scale;
    }
    true
}

/// `m = H_pivot * m` for every column of `m`.
fn apply_reflection_left(m: &mut Matrix4d, reflections: &Matrix4d, pivot: usize) {
    for j in 0..HDIM {
        let dot = partial_column_dot(reflections, pivot, m, j, pivot);
        partial_column_update(m, j, dot, reflections, pivot, pivot);
    }
}

fn back_substitute(b: &mut Matrix4d, col: usize, r: &Matrix4d) -> bool {
    for i in (0..HDIM).rev() {
        let denom = r.coff[i][i];
        if denom == 0.0 {
            return false;
        }
        b.coff[i][col] /= denom;
        let a = b.coff[i][col];
        for k in 0..i {
            b.coff[k][col] -= a * r.coff[k][i];
        }
    }
    true
}

fn givens_weights(a: f64, b: f64) -> (f64, f64) {
    let r = a.hypot(b);
    if r == 0.0 { (1.0, 0.0) } else { (a / r, b / r) }
}

fn safe_divide(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 { None } else { Some(numerator / denominator) }
}

/// Cyclic Jacobi eigensystem for a symmetric `N x N` array.
/// Returns eigenvectors as columns and the matching eigenvalues.
pub(crate) fn jacobi_eigensystem<const N: usize>(mut a: [[f64; N]; N]) -> ([[f64; N]; N], [f64; N]) {
    let mut v = [[0.0; N]; N];
    for (i, row) in v.iter_mut().enumerate() {
        row[i] = 1.0;
    }

    for _ in 0..MAX_JACOBI_SWEEPS {
        let mut off = 0.0;
        let mut diag = 0.0;
        for i in 0..N {
            diag += a[i][i] * a[i][i];
            for j in i + 1..N {
                off += a[i][j] * a[i][j];
            }
        }
        if off <= f64::EPSILON * f64::EPSILON * diag.max(f64::MIN_POSITIVE) {
            break;
        }

        for p in 0..N {
            for q in p + 1..N {
                let apq = a[p][q];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..N {
                    let (akp, akq) = (a[k][p], a[k][q]);
                    a[k][p] = c * akp - s * akq;
                    a[k][q] = s * akp + c * akq;
                }
                for k in 0..N {
                    let (apk, aqk) = (a[p][k], a[q][k]);
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in &mut v {
                    let (vp, vq) = (row[p], row[q]);
                    row[p] = c * vp - s * vq;
                    row[q] = s * vp + c * vq;
                }
            }
        }
    }

    let mut values = [0.0; N];
    for (i, value) in values.iter_mut().enumerate() {
        *value = a[i][i];
    }
    (v, values)
}
