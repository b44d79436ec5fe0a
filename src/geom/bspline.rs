//! B-spline curve storage, evaluation and differential geometry.
//!
//! Poles are stored in weighted form: for a rational curve `poles[i]` holds
//! `(x*w, y*w, z*w)` and `weights[i]` holds `w`. Evaluation works in that
//! homogeneous space and divides by the blended weight at the end.
//!
//! Closed curves come in two flavors. A *periodic* closed curve carries `n`
//! distinct poles that wrap around the seam. A *fake periodic* closed curve
//! is an open curve whose first and last pole coincide, wrapped in a closed
//! knot vector with full multiplicity at the seam; see
//! [`BsplineCurve::knots_should_be_opened`]. Editing operations live in
//! `bspline_edit`.

use super::core::{ClosedIndex, Point3, Point4, Vec3};
use super::knots::{self, MAX_ORDER};

/// Status returned by successful curve operations.
pub const SUCCESS: i32 = 0;

/// Absolute tolerance of [`is_same_point`].
pub const POINT_ABS_TOLERANCE: f64 = 1e-8;
/// Relative tolerance of [`is_same_point`].
pub const POINT_REL_TOLERANCE: f64 = 1e-8;
/// Weight tolerance of [`is_same_rational_point`].
pub const WEIGHT_TOLERANCE: f64 = 1e-10;
/// Curvature below which a curve is treated as locally straight.
pub const LINEAR_CURVATURE: f64 = 1e-12;
/// Right-handedness tolerance of a Frenet frame.
pub const FRAME_TOLERANCE: f64 = 1e-12;

/// Magnitudes below this are treated as zero when building frames.
const FRAME_EPSILON: f64 = 1e-5;
/// Component threshold used when picking a fallback perpendicular.
const AXIS_PICK_TOLERANCE: f64 = 0.01;

/// Errors reported by curve construction and editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BsplineError {
    #[error("degenerate knot span")]
    BadKnots,
    #[error("curve order out of range or mismatched")]
    BadOrder,
    #[error("poles do not satisfy the operation's requirements")]
    BadPoles,
    #[error("too few poles for the requested operation")]
    TooFewPoles,
    #[error("failed to allocate curve buffers")]
    InsufficientMemory,
    #[error("operation requires open curves")]
    BadPeriodicity,
    #[error("parameter out of range or degenerate")]
    BadParameter,
}

impl BsplineError {
    /// Integer status code; [`SUCCESS`] is reserved for success.
    #[must_use]
    pub const fn status(self) -> i32 {
        match self {
            Self::BadKnots => 1,
            Self::BadOrder => 2,
            Self::BadPoles => 3,
            Self::TooFewPoles => 4,
            Self::InsufficientMemory => 5,
            Self::BadPeriodicity => 6,
            Self::BadParameter => 7,
        }
    }
}

/// Maps an operation result onto the integer status convention.
#[must_use]
pub fn status_of<T>(result: &Result<T, BsplineError>) -> i32 {
    match result {
        Ok(_) => SUCCESS,
        Err(e) => e.status(),
    }
}

/// Point equality with absolute and relative tolerance.
#[must_use]
pub fn is_same_point(a: Point3, b: Point3) -> bool {
    let max_diff = a.max_diff(b);
    let max_abs = a.max_abs().max(b.max_abs());
    max_diff < POINT_ABS_TOLERANCE || max_diff < POINT_ABS_TOLERANCE + POINT_REL_TOLERANCE * max_abs
}

/// Weighted pole equality: weights within [`WEIGHT_TOLERANCE`] and the stored
/// (weighted) coordinates equal per [`is_same_point`].
#[must_use]
pub fn is_same_rational_point(a: Point4, b: Point4) -> bool {
    (a.w - b.w).abs() < WEIGHT_TOLERANCE && is_same_point(a.xyz(), b.xyz())
}

/// Converts homogeneous derivatives `(xyz*w, w)` up to third order into
/// cartesian derivatives by the quotient rule.
#[must_use]
pub fn chain_rule(h: &[Point4]) -> Vec<Vec3> {
    let count = h.len().min(4);
    let mut out = Vec::with_capacity(count);
    if count == 0 {
        return out;
    }
    let w: Vec<f64> = h.iter().map(|p| p.w).collect();
    let p: Vec<Vec3> = h.iter().map(|p| p.xyz_vec()).collect();
    let w0 = w[0];
    out.push(p[0] / w0);
    if count > 1 {
        out.push((p[1] * w0 - p[0] * w[1]) / (w0 * w0));
    }
    if count > 2 {
        let c0 = w[1] * w[1];
        let c1 = w0 * w[2];
        let c2 = w0 * w[1];
        let c3 = w0 * w0;
        out.push(
            (p[0] * (2.0 * c0) - p[0] * c1 - p[1] * (2.0 * c2) + p[2] * c3) / (c3 * w0),
        );
        if count > 3 {
            let numerator = p[0] * (6.0 * c2 * w[2]) - p[0] * (6.0 * c0 * w[1])
                - p[0] * (c3 * w[3])
                + p[1] * (6.0 * c0 * w0)
                - p[1] * (3.0 * c3 * w[2])
                - p[2] * (3.0 * c3 * w[1])
                + p[3] * (c3 * w0);
            out.push(numerator / (c3 * c3));
        }
    }
    out
}

/// Newell normal of a closed polygon, normalized. `None` when the polygon
/// encloses (nearly) no area.
#[must_use]
pub fn polygon_normal(points: &[Point3]) -> Option<Vec3> {
    let prev_start = *points.last()?;
    let mut prev = prev_start;
    let mut n = Vec3::ZERO;
    for &cur in points {
        n.x += (prev.y - cur.y) * (prev.z + cur.z);
        n.y += (prev.z - cur.z) * (prev.x + cur.x);
        n.z += (prev.x - cur.x) * (prev.y + cur.y);
        prev = cur;
    }
    if n.length() < FRAME_EPSILON {
        return None;
    }
    n.normalized()
}

// ─────────────────────────────────────────────────────────────────────────────
// Curve
// ─────────────────────────────────────────────────────────────────────────────

/// A B-spline curve owning its poles, knots and optional weights.
///
/// `knots.len() == num_knots(poles.len(), order, closed)` and, when present,
/// `weights.len() == poles.len()`. Cloning is a deep copy.
#[derive(Debug, Clone, PartialEq)]
pub struct BsplineCurve {
    pub order: usize,
    pub closed: bool,
    pub poles: Vec<Point3>,
    pub knots: Vec<f64>,
    pub weights: Option<Vec<f64>>,
}

/// Moving frame at a curve point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrenetFrame {
    pub origin: Point3,
    pub tangent: Vec3,
    pub normal: Vec3,
    pub binormal: Vec3,
    pub curvature: f64,
    pub torsion: f64,
}

/// Open-curve addressing of a curve's poles and knots.
///
/// Periodic curves are unrolled (`n + order - 1` poles over the full knot
/// array); fake periodic curves drop the `order / 2` leading seam knots.
#[derive(Clone, Copy)]
pub(crate) struct OpenView<'a> {
    curve: &'a BsplineCurve,
    pub(crate) knots: &'a [f64],
    pub(crate) num_poles: usize,
    index: ClosedIndex,
}

impl OpenView<'_> {
    pub(crate) fn pole(&self, i: usize) -> Point4 {
        self.curve.homogeneous_pole(self.index.wrap(i as isize))
    }
}

fn try_filled<T: Clone>(len: usize, value: T) -> Result<Vec<T>, BsplineError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| BsplineError::InsufficientMemory)?;
    v.resize(len, value);
    Ok(v)
}

impl BsplineCurve {
    /// Zero-filled curve buffers sized for the given layout.
    ///
    /// # Errors
    /// [`BsplineError::BadOrder`] for orders outside `2..=MAX_ORDER`,
    /// [`BsplineError::TooFewPoles`] when `num_poles < order`,
    /// [`BsplineError::InsufficientMemory`] when the buffers cannot be reserved.
    pub fn allocate(
        order: usize,
        num_poles: usize,
        closed: bool,
        rational: bool,
    ) -> Result<Self, BsplineError> {
        if !(2..=MAX_ORDER).contains(&order) {
            return Err(BsplineError::BadOrder);
        }
        if num_poles < order {
            return Err(BsplineError::TooFewPoles);
        }
        let poles = try_filled(num_poles, Point3::ORIGIN)?;
        let knots = try_filled(knots::num_knots(num_poles, order, closed), 0.0)?;
        let weights = if rational {
            Some(try_filled(num_poles, 1.0)?)
        } else {
            None
        };
        Ok(Self {
            order,
            closed,
            poles,
            knots,
            weights,
        })
    }

    /// Non-rational curve over `poles` with uniform knots.
    ///
    /// # Errors
    /// Same as [`allocate`](Self::allocate).
    pub fn from_poles(poles: &[Point3], order: usize, closed: bool) -> Result<Self, BsplineError> {
        let mut curve = Self::allocate(order, poles.len(), closed, false)?;
        curve.poles.copy_from_slice(poles);
        curve.knots = knots::compute_knot_vector(poles.len(), order, closed, None);
        Ok(curve)
    }

    /// Rational curve from unweighted poles and their weights.
    ///
    /// # Errors
    /// [`BsplineError::BadPoles`] when the weight count differs from the pole
    /// count, otherwise as [`from_poles`](Self::from_poles).
    pub fn from_weighted_poles(
        points: &[Point3],
        weights: &[f64],
        order: usize,
        closed: bool,
    ) -> Result<Self, BsplineError> {
        if points.len() != weights.len() {
            return Err(BsplineError::BadPoles);
        }
        let weighted: Vec<Point3> = points
            .iter()
            .zip(weights)
            .map(|(p, w)| p.scaled(*w))
            .collect();
        let mut curve = Self::from_poles(&weighted, order, closed)?;
        curve.weights = Some(weights.to_vec());
        Ok(curve)
    }

    /// Curve from explicit parts; poles must already be weighted.
    ///
    /// # Errors
    /// Layout violations map to `BadOrder`, `TooFewPoles`, `BadKnots` or
    /// `BadPoles`.
    pub fn from_parts(
        order: usize,
        closed: bool,
        poles: Vec<Point3>,
        knots: Vec<f64>,
        weights: Option<Vec<f64>>,
    ) -> Result<Self, BsplineError> {
        if !(2..=MAX_ORDER).contains(&order) {
            return Err(BsplineError::BadOrder);
        }
        if poles.len() < order {
            return Err(BsplineError::TooFewPoles);
        }
        if knots.len() != knots::num_knots(poles.len(), order, closed)
            || !knots::is_non_decreasing(&knots)
        {
            return Err(BsplineError::BadKnots);
        }
        if weights.as_ref().is_some_and(|w| w.len() != poles.len()) {
            return Err(BsplineError::BadPoles);
        }
        Ok(Self {
            order,
            closed,
            poles,
            knots,
            weights,
        })
    }

    /// Deep copy of `source` into `self`; copying a curve onto itself is a no-op.
    pub fn copy_from(&mut self, source: &Self) {
        if std::ptr::eq(self, source) {
            return;
        }
        self.clone_from(source);
    }

    #[must_use]
    pub fn num_poles(&self) -> usize {
        self.poles.len()
    }

    #[must_use]
    pub const fn degree(&self) -> usize {
        self.order - 1
    }

    #[must_use]
    pub fn num_knots(&self) -> usize {
        knots::num_knots(self.num_poles(), self.order, self.closed)
    }

    #[must_use]
    pub const fn is_rational(&self) -> bool {
        self.weights.is_some()
    }

    #[must_use]
    pub fn weight(&self, i: usize) -> f64 {
        self.weights.as_ref().map_or(1.0, |w| w[i])
    }

    /// Pole `i` as `(x*w, y*w, z*w, w)`.
    #[must_use]
    pub fn homogeneous_pole(&self, i: usize) -> Point4 {
        self.poles[i].with_weight(self.weight(i))
    }

    /// Poles divided by their weights.
    #[must_use]
    pub fn unweighted_poles(&self) -> Vec<Point3> {
        (0..self.num_poles())
            .map(|i| self.homogeneous_pole(i).normalize_or_xyz())
            .collect()
    }

    /// Gives every pole weight 1 when the curve is not already rational.
    pub fn make_rational(&mut self) {
        if self.weights.is_none() {
            self.weights = Some(vec![1.0; self.num_poles()]);
        }
    }

    /// Drops the weights when they are all equal, unweighting the poles.
    ///
    /// # Errors
    /// [`BsplineError::BadPoles`] when the weights differ, since the curve
    /// then has no polynomial representation.
    pub fn make_non_rational(&mut self) -> Result<(), BsplineError> {
        let Some(weights) = self.weights.as_ref() else {
            return Ok(());
        };
        let w0 = weights.first().copied().unwrap_or(1.0);
        if weights.iter().any(|w| (w - w0).abs() > WEIGHT_TOLERANCE * w0.abs().max(1.0)) {
            return Err(BsplineError::BadPoles);
        }
        self.poles = self.unweighted_poles();
        self.weights = None;
        Ok(())
    }

    // ── knots ───────────────────────────────────────────────────────────

    /// Active parameter range.
    #[must_use]
    pub fn knot_range(&self) -> (f64, f64) {
        knots::knot_range(&self.knots, self.order)
    }

    /// Sum of distances between consecutive unweighted poles, without the
    /// closing edge.
    #[must_use]
    pub fn cumulative_distance(&self) -> f64 {
        self.unweighted_poles()
            .windows(2)
            .map(|w| w[0].distance_to(w[1]))
            .sum()
    }

    /// Control polygon length, including the closing edge of a closed curve.
    #[must_use]
    pub fn polygon_length(&self) -> f64 {
        let points = self.unweighted_poles();
        let mut length = self.cumulative_distance();
        if self.closed {
            if let (Some(first), Some(last)) = (points.first(), points.last()) {
                length += last.distance_to(*first);
            }
        }
        length
    }

    /// Newell normal of the unweighted control polygon.
    #[must_use]
    pub fn polygon_normal(&self) -> Option<Vec3> {
        polygon_normal(&self.unweighted_poles())
    }

    #[must_use]
    pub fn knot_tolerance(&self) -> f64 {
        knots::knot_tolerance(&self.knots, self.order, self.cumulative_distance())
    }

    /// Rescales the knots so the active range is `[0, 1]`.
    ///
    /// # Errors
    /// [`BsplineError::BadParameter`] for an empty range.
    pub fn normalize_knots(&mut self) -> Result<(), BsplineError> {
        let n = self.num_poles();
        knots::normalize_knot_vector(&mut self.knots, n, self.order, self.closed)
    }

    /// Maps the active range linearly onto `[start, end]`.
    pub fn rescale_knots(&mut self, start: f64, end: f64) {
        let (a, b) = self.knot_range();
        let span = b - a;
        if span == 0.0 {
            return;
        }
        let scale = (end - start) / span;
        for k in &mut self.knots {
            *k = start + (*k - a) * scale;
        }
    }

    /// Distinct active knots with multiplicities, compared with `tol`.
    #[must_use]
    pub fn knot_multiplicities(&self, tol: f64) -> Vec<(f64, usize)> {
        knots::knot_multiplicities(&self.knots, self.order, tol)
    }

    /// True for a closed curve built by padding an open, physically closed
    /// curve with a full-multiplicity seam.
    #[must_use]
    pub fn knots_should_be_opened(&self) -> bool {
        if !self.closed || self.order < 2 || self.knots.len() < self.num_knots() {
            return false;
        }
        let start = self.order - 1;
        if self.knots[start] != 0.0 {
            return false;
        }
        let near_zero = |k: &f64| k.abs() <= knots::KNOT_TOLERANCE_BASIS;
        let after = self.knots[start + 1..]
            .iter()
            .take_while(|k| near_zero(k))
            .count();
        let total = self.knots.iter().filter(|k| near_zero(k)).count();
        let n = self.num_poles();
        after == self.order / 2
            && total == self.order
            && n > 1
            && is_same_rational_point(self.homogeneous_pole(0), self.homogeneous_pole(n - 1))
    }

    // ── parameterization ────────────────────────────────────────────────

    /// Natural parameter for a fraction of the active range.
    #[must_use]
    pub fn fraction_to_parameter(&self, fraction: f64) -> f64 {
        let (a, b) = self.knot_range();
        fraction * b + (1.0 - fraction) * a
    }

    /// Fraction of the active range for a natural parameter.
    #[must_use]
    pub fn parameter_to_fraction(&self, u: f64) -> f64 {
        let (a, b) = self.knot_range();
        if b == a { 0.0 } else { (u - a) / (b - a) }
    }

    /// Clamps `u` into the active range, or wraps it by the period when closed.
    #[must_use]
    pub fn wrap_or_clamp_parameter(&self, u: f64) -> f64 {
        let (a, b) = self.knot_range();
        let period = b - a;
        if self.closed && period > 0.0 && (u < a || u > b) {
            a + (u - a).rem_euclid(period)
        } else {
            u.clamp(a.min(b), b.max(a))
        }
    }

    pub(crate) fn open_view(&self) -> OpenView<'_> {
        let n = self.num_poles();
        let index = ClosedIndex::new(n);
        if !self.closed {
            return OpenView {
                curve: self,
                knots: &self.knots,
                num_poles: n,
                index,
            };
        }
        if self.knots_should_be_opened() {
            let offset = self.order / 2;
            return OpenView {
                curve: self,
                knots: &self.knots[offset..offset + n + self.order],
                num_poles: n,
                index,
            };
        }
        OpenView {
            curve: self,
            knots: &self.knots,
            num_poles: n + self.order - 1,
            index,
        }
    }

    // ── evaluation ──────────────────────────────────────────────────────

    /// Homogeneous point at natural parameter `u` (blended, not normalized).
    #[must_use]
    pub fn evaluate_homogeneous(&self, u: f64) -> Point4 {
        let u = self.wrap_or_clamp_parameter(u);
        let view = self.open_view();
        let span = knots::find_span(view.knots, self.order, view.num_poles, u);
        let basis = knots::basis_functions(view.knots, span, u, self.order);
        let first = span + 1 - self.order;
        basis
            .iter()
            .enumerate()
            .fold(Point4::ZERO, |acc, (j, b)| acc.add_scaled(view.pole(first + j), *b))
    }

    /// Point at natural parameter `u`. A zero blended weight is treated as 1.
    #[must_use]
    pub fn evaluate_parameter(&self, u: f64) -> Point3 {
        let mut h = self.evaluate_homogeneous(u);
        if !self.is_rational() {
            return h.xyz();
        }
        if h.w == 0.0 {
            h.w = 1.0;
        }
        h.normalize_or_xyz()
    }

    /// Point at a fraction of the active range.
    #[must_use]
    pub fn evaluate(&self, fraction: f64) -> Point3 {
        self.evaluate_parameter(self.fraction_to_parameter(fraction))
    }

    /// Homogeneous derivatives `0..=num_derivs` at a fraction of the range.
    ///
    /// Entry `k` holds the `k`-th derivative of `(x*w, y*w, z*w)` in its xyz
    /// part and of `w` in its `w` part; non-rational curves report weights
    /// `[1, 0, ...]`. Derivatives above the degree are zero. `left_hand`
    /// selects the polynomial piece ending at `u` when `u` is a knot.
    ///
    /// # Errors
    /// [`BsplineError::BadKnots`] when a knot span used by the recursion is
    /// below the knot tolerance.
    pub fn compute_derivatives(
        &self,
        num_derivs: usize,
        fraction: f64,
        left_hand: bool,
    ) -> Result<Vec<Point4>, BsplineError> {
        self.derivatives_at_parameter(num_derivs, self.fraction_to_parameter(fraction), left_hand)
    }

    /// [`compute_derivatives`](Self::compute_derivatives) at a natural parameter.
    ///
    /// # Errors
    /// As [`compute_derivatives`](Self::compute_derivatives).
    pub fn derivatives_at_parameter(
        &self,
        num_derivs: usize,
        u: f64,
        left_hand: bool,
    ) -> Result<Vec<Point4>, BsplineError> {
        let order = self.order;
        let degree = order - 1;
        let (min_knot, max_knot) = self.knot_range();
        let u = self.wrap_or_clamp_parameter(u);
        let view = self.open_view();
        let kv = view.knots;
        let knot_tol = self.knot_tolerance();

        let mut kk = order;
        while kk + 1 < kv.len() && (min_knot >= kv[kk] || kv[kk] < u) {
            kk += 1;
        }
        let left = kk - 1;
        let mut right = left;
        while right + 1 < kv.len() && u >= kv[right] && kv[right] < max_knot {
            right += 1;
        }

        let last_start = view.num_poles - order;
        let start = if left_hand {
            left.saturating_sub(degree)
        } else {
            right.saturating_sub(order)
        }
        .min(last_start);

        let rational = self.is_rational();
        let mut p: Vec<Point4> = (0..order)
            .map(|i| {
                let mut q = view.pole(start + i);
                if !rational {
                    q.w = 1.0;
                }
                q
            })
            .collect();

        let mut left_diff = vec![0.0; order];
        let mut right_diff = vec![0.0; order];
        for i in 1..order {
            left_diff[i] = u - kv[start + i];
            right_diff[i] = kv[start + degree + i] - u;
        }

        let derivs_to_find = num_derivs.min(degree);
        let check = |span: f64| {
            if span < knot_tol {
                log::trace!("knot span {span} below tolerance {knot_tol}");
                Err(BsplineError::BadKnots)
            } else {
                Ok(span)
            }
        };

        if right_diff[1] > left_diff[degree] {
            for j in 1..order {
                for i in 0..=degree - j {
                    let alpha = left_diff[i + j];
                    let beta = right_diff[i + 1];
                    let denom = check(alpha + beta)?;
                    p[i] = p[i + 1].sum_of(alpha / denom, p[i], beta / denom);
                }
            }
            for j in 1..=derivs_to_find {
                for i in (j..=derivs_to_find).rev() {
                    let denom = check(right_diff[i - j + 1])? / (degree - j + 1) as f64;
                    p[i] = (p[i] - p[i - 1]) / denom;
                }
            }
        } else {
            p.reverse();
            for j in 1..order {
                for i in 0..=degree - j {
                    let alpha = left_diff[degree - i];
                    let beta = right_diff[degree - j + 1 - i];
                    let denom = check(alpha + beta)?;
                    p[i] = p[i].sum_of(alpha / denom, p[i + 1], beta / denom);
                }
            }
            for j in 1..=derivs_to_find {
                for i in (j..=derivs_to_find).rev() {
                    let denom = check(left_diff[degree + j - i])? / (degree - j + 1) as f64;
                    p[i] = (p[i - 1] - p[i]) / denom;
                }
            }
        }

        let mut out = vec![Point4::ZERO; num_derivs + 1];
        for (k, slot) in out.iter_mut().enumerate().take(derivs_to_find + 1) {
            *slot = p[k];
        }
        if !rational {
            for (k, slot) in out.iter_mut().enumerate() {
                slot.w = if k == 0 { 1.0 } else { 0.0 };
            }
        }
        Ok(out)
    }

    /// Cartesian point and derivatives `0..=num_derivs` (at most 3).
    ///
    /// # Errors
    /// As [`compute_derivatives`](Self::compute_derivatives).
    pub fn cartesian_derivatives(
        &self,
        num_derivs: usize,
        fraction: f64,
        left_hand: bool,
    ) -> Result<Vec<Vec3>, BsplineError> {
        let h = self.compute_derivatives(num_derivs.min(3), fraction, left_hand)?;
        if self.is_rational() {
            Ok(chain_rule(&h))
        } else {
            Ok(h.iter().map(|p| p.xyz_vec()).collect())
        }
    }

    /// First derivative with respect to the natural parameter.
    ///
    /// # Errors
    /// As [`compute_derivatives`](Self::compute_derivatives).
    pub fn tangent(&self, fraction: f64, left_hand: bool) -> Result<Vec3, BsplineError> {
        let h = self.compute_derivatives(1, fraction, left_hand)?;
        let d1 = h[1].xyz_vec();
        if self.is_rational() {
            let w0 = h[0].w;
            Ok((d1 * w0 - h[0].xyz_vec() * h[1].w) / (w0 * w0))
        } else {
            Ok(d1)
        }
    }

    /// Frenet frame with curvature and torsion at a fraction of the range.
    ///
    /// Where the curve is locally straight the normal comes from
    /// `default_normal`, else from the control polygon plane, else from an
    /// arbitrary perpendicular. `Ok(None)` means the assembled frame was not
    /// right-handed.
    ///
    /// # Errors
    /// As [`compute_derivatives`](Self::compute_derivatives).
    pub fn frenet_frame(
        &self,
        fraction: f64,
        default_normal: Option<Vec3>,
    ) -> Result<Option<FrenetFrame>, BsplineError> {
        let d = self.cartesian_derivatives(3, fraction, false)?;
        let d1 = d[1];
        let d2 = d[2];
        let d3 = d[3];

        let mut t = Vec3::X;
        let mut m = Vec3::Y;
        let mut b = Vec3::Z;
        if let Some(unit) = d1.normalized() {
            t = unit;
        }

        let mut linear = false;
        if d2.length() < FRAME_EPSILON {
            linear = true;
        } else {
            let (unit, mag) = d1.cross(d2).normalize_with_length();
            if mag < FRAME_EPSILON {
                linear = true;
            } else {
                b = unit;
                m = b.cross(t);
            }
        }

        let d1_len = d1.length();
        let cross = d1.cross(d2);
        let mut curvature = if self.order < 3 || linear || d1_len == 0.0 {
            0.0
        } else {
            cross.length() / (d1_len * d1_len * d1_len)
        };
        linear = linear || curvature < LINEAR_CURVATURE;

        if linear {
            if let Some(default) = default_normal {
                m = default;
                b = t.cross(m).normalized().unwrap_or(Vec3::Z);
                m = b.cross(t);
            } else if let Some(normal) = self.polygon_normal() {
                b = normal;
                m = b.cross(t).normalized().unwrap_or(Vec3::Y);
                b = t.cross(m);
            } else {
                let tmp = if t.x.abs() < AXIS_PICK_TOLERANCE && t.y.abs() < AXIS_PICK_TOLERANCE {
                    Vec3::Y
                } else {
                    Vec3::Z
                };
                m = tmp.cross(t).normalized().unwrap_or(Vec3::Y);
                b = t.cross(m);
            }
            curvature = 0.0;
        }

        let torsion = if self.order < 4 || linear {
            0.0
        } else {
            let denom = cross.length_squared();
            if denom == 0.0 { 0.0 } else { d1.dot(d2.cross(d3)) / denom }
        };

        if (t.dot(m.cross(b)) - 1.0).abs() >= FRAME_TOLERANCE {
            log::trace!("frenet frame at fraction {fraction} is not right handed");
            return Ok(None);
        }
        Ok(Some(FrenetFrame {
            origin: Point3::from(d[0]),
            tangent: t,
            normal: m,
            binormal: b,
            curvature,
            torsion,
        }))
    }

    /// True when the start and end points coincide within `tol`.
    #[must_use]
    pub fn is_physically_closed(&self, tol: f64) -> bool {
        self.evaluate(0.0).distance_to(self.evaluate(1.0)) <= tol
    }

    /// True when this curve's end meets `next`'s start per [`is_same_point`].
    #[must_use]
    pub fn is_contiguous_with(&self, next: &Self) -> bool {
        is_same_point(self.evaluate(1.0), next.evaluate(0.0))
    }
}
