//! Single-span Bezier views of B-spline curves.
//!
//! A [`BezierSegment`] copies the `order` poles supporting one knot span of a
//! curve and saturates the local knots, leaving the pure Bezier poles of that
//! span. Stroking, extrema, arc length and close-approach refinement all work
//! on those copies; the parent curve may change or go away afterwards.

use serde::{Deserialize, Serialize};

use super::bspline::{BsplineCurve, BsplineError, WEIGHT_TOLERANCE};
use super::bspline_edit::KnotSpan;
use super::core::{Point3, Point4, Segment3, Vec3};
use super::knots::KNOT_TOLERANCE_BASIS;
use super::matrix4d::Matrix4d;
use super::numeric::{
    integrate_newton_cotes, BezierPolynomial, FunctionRR2ToRR2, NewtonOptions, NewtonSolver2d,
};

/// Upper bound on the edges emitted for one Bezier span.
pub const MAX_STROKES_PER_BEZIER: usize = 100;

/// Relative tolerance of the arc length and centroid quadrature.
pub const WIRE_INTEGRAL_REL_TOLERANCE: f64 = 1e-12;

/// Chord tolerance is tightened by this factor for rational spans.
const RATIONAL_CHORD_FACTOR: f64 = 0.25;

/// Fraction slack allowed when accepting a Newton result on an open curve.
const FRACTION_SLACK: f64 = 1e-10;

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Parameter reported alongside each stroke point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrokeParameterMapping {
    /// Fraction within the Bezier span.
    BezierFraction,
    /// Natural knot value of the parent curve.
    Knot,
    /// Fraction of the parent curve's active range.
    #[default]
    CurveFraction,
}

/// Stroke density controls. A non-positive tolerance is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeOptions {
    /// Maximum chordal deviation between the polyline and the curve.
    pub chord_tolerance: f64,
    /// Maximum turning angle per edge, in radians.
    pub angle_tolerance: f64,
    /// Maximum edge length.
    pub max_edge_length: f64,
    pub parameter_mapping: StrokeParameterMapping,
}

impl Default for StrokeOptions {
    fn default() -> Self {
        Self {
            chord_tolerance: 0.0,
            angle_tolerance: 0.15,
            max_edge_length: 0.0,
            parameter_mapping: StrokeParameterMapping::CurveFraction,
        }
    }
}

/// Polyline output with one parameter per point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Strokes {
    pub points: Vec<Point3>,
    pub params: Vec<f64>,
}

impl Strokes {
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn push(&mut self, point: Point3, param: f64) {
        self.points.push(point);
        self.params.push(param);
    }
}

/// Result of a refined curve-curve close approach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveCloseApproach {
    pub fraction_a: f64,
    pub fraction_b: f64,
    pub point_a: Point3,
    pub point_b: Point3,
    pub distance: f64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Local helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Blossom of the polynomial piece over local knots `knots[p-1]..knots[p]`.
///
/// `poles` holds the `p + 1` supporting poles and `knots` the `2p` knots
/// around the span; `args` supplies the `p` blossom arguments.
fn blossom(poles: &[Point4], knots: &[f64], args: &[f64]) -> Point4 {
    let p = poles.len() - 1;
    let mut d = poles.to_vec();
    for r in 1..=p {
        let x = args[r - 1];
        for i in (r..=p).rev() {
            let lo = knots[i - 1];
            let hi = knots[p + i - r];
            let alpha = if hi > lo { (x - lo) / (hi - lo) } else { 0.0 };
            d[i] = d[i - 1].interpolate(alpha, d[i]);
        }
    }
    d[p]
}

/// Bezier poles of the span `[a, b]` described by `poles` over `knots`.
fn blossom_bezier_poles(poles: &[Point4], knots: &[f64], a: f64, b: f64) -> Vec<Point4> {
    let p = poles.len() - 1;
    (0..=p)
        .map(|j| {
            let mut args = vec![b; j];
            args.resize(p, a);
            blossom(poles, knots, &args)
        })
        .collect()
}

/// Point and fraction derivative of homogeneous Bezier poles.
fn de_casteljau(poles: &[Point4], f: f64) -> (Point4, Point4) {
    let p = poles.len() - 1;
    if p == 0 {
        return (poles[0], Point4::ZERO);
    }
    let mut work = poles.to_vec();
    for level in 1..p {
        for i in 0..=p - level {
            work[i] = work[i].interpolate(f, work[i + 1]);
        }
    }
    let value = work[0].interpolate(f, work[1]);
    let derivative = (work[1] - work[0]) * p as f64;
    (value, derivative)
}

/// Cartesian point and tangent from a homogeneous point and its derivative.
fn cartesian_point_and_tangent(h: Point4, dh: Point4) -> (Point3, Vec3) {
    let w = if h.w == 0.0 { 1.0 } else { h.w };
    let point = Point3::new(h.x / w, h.y / w, h.z / w);
    let tangent = (dh.xyz_vec() - point.to_vec3() * dh.w) / w;
    (point, tangent)
}

/// Edge count for stroking a Bezier span.
///
/// Polynomial spans use the second-difference chord bound directly; rational
/// spans tighten the chord tolerance first.
fn estimate_edge_count(
    poles: &[Point4],
    chord_tolerance: f64,
    angle_tolerance: f64,
    max_edge_length: f64,
    polynomial: bool,
) -> usize {
    let points: Vec<Point3> = poles.iter().map(|p| p.normalize_or_xyz()).collect();
    let degree = points.len().saturating_sub(1);
    let mut count = 1.0_f64;

    if chord_tolerance > 0.0 && degree >= 2 {
        let second_difference = points
            .windows(3)
            .map(|w| ((w[2] - w[1]) - (w[1] - w[0])).length())
            .fold(0.0, f64::max);
        let tol = if polynomial {
            chord_tolerance
        } else {
            chord_tolerance * RATIONAL_CHORD_FACTOR
        };
        let bound = (degree * (degree - 1)) as f64 * second_difference / (8.0 * tol);
        count = count.max(bound.sqrt().ceil());
    }

    if angle_tolerance > 0.0 {
        let edges: Vec<Vec3> = points
            .windows(2)
            .map(|w| w[1] - w[0])
            .filter(|e| e.length_squared() > 0.0)
            .collect();
        let turning: f64 = edges.windows(2).map(|w| w[0].angle_to(w[1])).sum();
        count = count.max((turning / angle_tolerance).ceil());
    }

    if max_edge_length > 0.0 {
        let length: f64 = points.windows(2).map(|w| w[0].distance_to(w[1])).sum();
        count = count.max((length / max_edge_length).ceil());
    }

    if count.is_finite() {
        (count as usize).clamp(1, MAX_STROKES_PER_BEZIER)
    } else {
        MAX_STROKES_PER_BEZIER
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BezierSegment
// ─────────────────────────────────────────────────────────────────────────────

/// Bezier poles of one knot span, with the span's knot range and index.
#[derive(Debug, Clone, PartialEq)]
pub struct BezierSegment {
    order: usize,
    poles: Vec<Point4>,
    knots: Vec<f64>,
    work_poles: Vec<Point4>,
    u_min: f64,
    u_max: f64,
    index: usize,
}

impl BezierSegment {
    /// Pure Bezier segment from homogeneous poles over `[u_min, u_max]`.
    ///
    /// # Errors
    /// [`BsplineError::BadOrder`] for fewer than two poles,
    /// [`BsplineError::BadKnots`] when `u_min > u_max`.
    pub fn from_poles(poles: Vec<Point4>, u_min: f64, u_max: f64) -> Result<Self, BsplineError> {
        if poles.len() < 2 {
            return Err(BsplineError::BadOrder);
        }
        if u_min > u_max {
            return Err(BsplineError::BadKnots);
        }
        let order = poles.len();
        let mut knots = vec![u_min; order - 1];
        knots.resize(2 * (order - 1), u_max);
        Ok(Self {
            order,
            work_poles: poles.clone(),
            poles,
            knots,
            u_min,
            u_max,
            index: 0,
        })
    }

    /// Copies the support of `span` out of `curve` and saturates its knots.
    ///
    /// # Errors
    /// [`BsplineError::BadParameter`] when `span` does not index a span of
    /// the curve's open view.
    pub fn from_curve_span(curve: &BsplineCurve, span: KnotSpan) -> Result<Self, BsplineError> {
        let mut segment = Self::support(curve, span)?;
        segment.saturate_knots();
        Ok(segment)
    }

    fn support(curve: &BsplineCurve, span: KnotSpan) -> Result<Self, BsplineError> {
        let order = curve.order;
        let view = curve.open_view();
        if order < 2 || span.index + 1 < order || span.index >= view.num_poles {
            return Err(BsplineError::BadParameter);
        }
        let p = order - 1;
        let first_pole = span.index + 1 - order;
        let poles: Vec<Point4> = (first_pole..=span.index).map(|i| view.pole(i)).collect();
        let first_knot = span.index + 1 - p;
        let knots = view.knots[first_knot..first_knot + 2 * p].to_vec();
        Ok(Self {
            order,
            work_poles: poles.clone(),
            poles,
            u_min: knots[p - 1],
            u_max: knots[p],
            knots,
            index: span.index,
        })
    }

    /// Replaces the local B-spline poles by the Bezier poles of the span.
    fn saturate_knots(&mut self) {
        let p = self.order - 1;
        let clamped = self.knots.iter().take(p).all(|k| *k == self.u_min)
            && self.knots.iter().skip(p).all(|k| *k == self.u_max);
        if clamped || self.is_null_u() {
            return;
        }
        self.poles = blossom_bezier_poles(&self.poles, &self.knots, self.u_min, self.u_max);
        self.knots = vec![self.u_min; p];
        self.knots.resize(2 * p, self.u_max);
        self.work_poles.clone_from(&self.poles);
    }

    #[must_use]
    pub const fn order(&self) -> usize {
        self.order
    }

    #[must_use]
    pub const fn degree(&self) -> usize {
        self.order - 1
    }

    #[must_use]
    pub fn poles(&self) -> &[Point4] {
        &self.poles
    }

    #[must_use]
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Secondary pole buffer, loaded by [`load_work_poles`](Self::load_work_poles).
    #[must_use]
    pub fn work_poles(&self) -> &[Point4] {
        &self.work_poles
    }

    #[must_use]
    pub const fn u_min(&self) -> f64 {
        self.u_min
    }

    #[must_use]
    pub const fn u_max(&self) -> f64 {
        self.u_max
    }

    /// Span index in the parent curve's open view.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// True when the knot range is empty within a relative tolerance.
    #[must_use]
    pub fn is_null_u(&self) -> bool {
        let scale = 1.0 + self.u_min.abs().max(self.u_max.abs());
        self.u_max - self.u_min <= KNOT_TOLERANCE_BASIS * scale
    }

    #[must_use]
    pub fn is_rational(&self) -> bool {
        self.poles.iter().any(|p| (p.w - 1.0).abs() > WEIGHT_TOLERANCE)
    }

    #[must_use]
    pub fn knot_to_fraction(&self, u: f64) -> f64 {
        let delta = self.u_max - self.u_min;
        if delta == 0.0 {
            0.0
        } else {
            (u - self.u_min) / delta
        }
    }

    #[must_use]
    pub fn fraction_to_knot(&self, f: f64) -> f64 {
        self.u_min + f * (self.u_max - self.u_min)
    }

    /// Copies the canonical poles through `matrix` into the work buffer.
    pub fn load_work_poles(&mut self, matrix: Option<&Matrix4d>) {
        self.work_poles = match matrix {
            Some(m) => m.multiply_points(&self.poles),
            None => self.poles.clone(),
        };
    }

    // ── evaluation ──────────────────────────────────────────────────────

    #[must_use]
    pub fn fraction_to_point(&self, f: f64) -> Point3 {
        de_casteljau(&self.poles, f).0.normalize_or_xyz()
    }

    /// Point and tangent at a span fraction.
    ///
    /// The tangent is with respect to the fraction unless `apply_knot_scale`
    /// asks for the derivative with respect to the knot value.
    #[must_use]
    pub fn fraction_to_point_and_tangent(&self, f: f64, apply_knot_scale: bool) -> (Point3, Vec3) {
        let (h, dh) = de_casteljau(&self.poles, f);
        let (point, tangent) = cartesian_point_and_tangent(h, dh);
        let delta = self.u_max - self.u_min;
        if apply_knot_scale && delta != 0.0 {
            (point, tangent / delta)
        } else {
            (point, tangent)
        }
    }

    fn subdivide(&mut self, f0: f64, f1: f64) {
        let p = self.order - 1;
        let mut unit = vec![0.0; p];
        unit.resize(2 * p, 1.0);
        self.poles = blossom_bezier_poles(&self.poles, &unit, f0, f1);
        let (u0, u1) = (self.fraction_to_knot(f0), self.fraction_to_knot(f1));
        self.u_min = u0;
        self.u_max = u1;
        self.knots = vec![u0; p];
        self.knots.resize(2 * p, u1);
        self.work_poles.clone_from(&self.poles);
    }

    /// Clips the segment to its overlap with the knot interval `[lo, hi]`.
    ///
    /// Returns false and leaves the segment unchanged when the overlap is
    /// empty or a single value.
    pub fn subdivide_to_intersection(&mut self, lo: f64, hi: f64) -> bool {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let a = lo.max(self.u_min);
        let b = hi.min(self.u_max);
        if b <= a {
            return false;
        }
        if a == self.u_min && b == self.u_max {
            return true;
        }
        let (f0, f1) = (self.knot_to_fraction(a), self.knot_to_fraction(b));
        self.subdivide(f0, f1);
        self.u_min = a;
        self.u_max = b;
        true
    }

    // ── stroking ────────────────────────────────────────────────────────

    /// Appends a polyline over span fractions `[f0, f1]` to `strokes`.
    ///
    /// `include_start` controls whether the point at `f0` is emitted, so
    /// consecutive spans share their junction point. `curve` is only
    /// consulted for [`StrokeParameterMapping::CurveFraction`]; without it
    /// knot values are reported.
    pub fn add_strokes(
        &self,
        strokes: &mut Strokes,
        options: &StrokeOptions,
        f0: f64,
        f1: f64,
        include_start: bool,
        curve: Option<&BsplineCurve>,
    ) {
        let mut work = self.clone();
        if f0 != 0.0 || f1 != 1.0 {
            work.subdivide(f0, f1);
        }
        let edges = estimate_edge_count(
            &work.poles,
            options.chord_tolerance,
            options.angle_tolerance,
            options.max_edge_length,
            !work.is_rational(),
        );
        let first = usize::from(!include_start);
        for i in first..=edges {
            let g = i as f64 / edges as f64;
            let point = work.fraction_to_point(g);
            let fraction = f0 + g * (f1 - f0);
            strokes.push(point, self.map_fraction(fraction, options.parameter_mapping, curve));
        }
    }

    fn map_fraction(
        &self,
        fraction: f64,
        mapping: StrokeParameterMapping,
        curve: Option<&BsplineCurve>,
    ) -> f64 {
        match mapping {
            StrokeParameterMapping::BezierFraction => fraction,
            StrokeParameterMapping::Knot => self.fraction_to_knot(fraction),
            StrokeParameterMapping::CurveFraction => {
                let knot = self.fraction_to_knot(fraction);
                curve.map_or(knot, |c| c.parameter_to_fraction(knot))
            }
        }
    }

    // ── extrema ─────────────────────────────────────────────────────────

    fn coordinate_polynomials(poles: &[Point4]) -> ([BezierPolynomial; 3], BezierPolynomial) {
        let axis = |k: usize| BezierPolynomial::new(poles.iter().map(|p| p.component(k)).collect());
        (
            [axis(0), axis(1), axis(2)],
            BezierPolynomial::new(poles.iter().map(|p| p.w).collect()),
        )
    }

    /// Span fractions where some coordinate of the (optionally transformed)
    /// curve has a zero derivative, ascending.
    ///
    /// `transform` is applied into the work poles, so extrema can be taken in
    /// a local frame while the canonical poles stay untouched.
    pub fn extrema_fractions(&mut self, transform: Option<&Matrix4d>) -> Vec<f64> {
        self.load_work_poles(transform);
        let rational = self.work_poles.iter().any(|p| (p.w - 1.0).abs() > WEIGHT_TOLERANCE);
        let (coords, weight) = Self::coordinate_polynomials(&self.work_poles);
        let weight_derivative = weight.derivative();
        let mut fractions = Vec::new();
        for x in &coords {
            let pseudo_tangent = if rational {
                x.derivative()
                    .product(&weight)
                    .sum_scaled(1.0, &x.product(&weight_derivative), -1.0)
            } else {
                x.derivative()
            };
            fractions.extend(pseudo_tangent.roots_in_unit_interval());
        }
        fractions.sort_by(f64::total_cmp);
        fractions.dedup_by(|a, b| (*a - *b).abs() <= KNOT_TOLERANCE_BASIS);
        fractions
    }

    /// Appends coordinate extrema, bracketed by the span endpoints unless
    /// `include_endpoints` is false. Parameters are knot values when
    /// `map_to_knots`, span fractions otherwise.
    pub fn add_extrema(
        &mut self,
        strokes: &mut Strokes,
        transform: Option<&Matrix4d>,
        map_to_knots: bool,
        include_endpoints: bool,
    ) {
        let mut fractions = self.extrema_fractions(transform);
        if include_endpoints {
            fractions.retain(|f| *f > KNOT_TOLERANCE_BASIS && *f < 1.0 - KNOT_TOLERANCE_BASIS);
            fractions.insert(0, 0.0);
            fractions.push(1.0);
        }
        for f in fractions {
            let param = if map_to_knots { self.fraction_to_knot(f) } else { f };
            strokes.push(self.fraction_to_point(f), param);
        }
    }

    // ── integrals ───────────────────────────────────────────────────────

    /// Arc length over span fractions `[f0, f1]`, with the centroid of that
    /// arc when requested (and the length is non-zero).
    #[must_use]
    pub fn wire_integrals(&self, f0: f64, f1: f64, want_centroid: bool) -> (f64, Option<Point3>) {
        let origin = self.poles[0].normalize_or_xyz();
        let shifted: Vec<Point4> = self
            .poles
            .iter()
            .map(|p| {
                Point4::new(
                    p.x - origin.x * p.w,
                    p.y - origin.y * p.w,
                    p.z - origin.z * p.w,
                    p.w,
                )
            })
            .collect();
        let integrand = |f: f64| {
            let (h, dh) = de_casteljau(&shifted, f);
            let (x, tangent) = cartesian_point_and_tangent(h, dh);
            let speed = tangent.length();
            [speed, x.x * speed, x.y * speed, x.z * speed]
        };
        let sums = integrate_newton_cotes(&integrand, f0, f1, 0.0, WIRE_INTEGRAL_REL_TOLERANCE);
        let length = sums[0].abs();
        let centroid = if want_centroid && sums[0] != 0.0 {
            Some(origin + Vec3::new(sums[1], sums[2], sums[3]) / sums[0])
        } else {
            None
        };
        (length, centroid)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Curve-level helpers
// ─────────────────────────────────────────────────────────────────────────────

impl BsplineCurve {
    /// Bezier segments of every non-degenerate span, in parameter order.
    ///
    /// # Errors
    /// As [`BezierSegment::from_curve_span`].
    pub fn bezier_segments(&self) -> Result<Vec<BezierSegment>, BsplineError> {
        self.bezier_spans()
            .into_iter()
            .map(|span| BezierSegment::from_curve_span(self, span))
            .filter(|segment| segment.as_ref().map_or(true, |s| !s.is_null_u()))
            .collect()
    }

    /// Bezier segments clipped to the knot interval `[lo, hi]`.
    ///
    /// # Errors
    /// As [`BezierSegment::from_curve_span`].
    pub fn bezier_segments_in_interval(&self, lo: f64, hi: f64) -> Result<Vec<BezierSegment>, BsplineError> {
        let mut result = Vec::new();
        for span in self.bezier_spans() {
            if span.u1 <= lo {
                continue;
            }
            if span.u0 >= hi {
                break;
            }
            let mut segment = BezierSegment::from_curve_span(self, span)?;
            if segment.subdivide_to_intersection(lo, hi) && !segment.is_null_u() {
                result.push(segment);
            }
        }
        Ok(result)
    }

    /// Polyline approximation of the whole curve.
    ///
    /// # Errors
    /// As [`BezierSegment::from_curve_span`].
    pub fn strokes(&self, options: &StrokeOptions) -> Result<Strokes, BsplineError> {
        let mut strokes = Strokes::default();
        for segment in self.bezier_segments()? {
            let include_start = strokes.is_empty();
            segment.add_strokes(&mut strokes, options, 0.0, 1.0, include_start, Some(self));
        }
        Ok(strokes)
    }

    /// Arc length of the curve.
    ///
    /// # Errors
    /// As [`BezierSegment::from_curve_span`].
    pub fn length(&self) -> Result<f64, BsplineError> {
        Ok(self
            .bezier_segments()?
            .iter()
            .map(|s| s.wire_integrals(0.0, 1.0, false).0)
            .sum())
    }

    /// Arc length and length-weighted centroid; `None` for a zero-length curve.
    ///
    /// # Errors
    /// As [`BezierSegment::from_curve_span`].
    pub fn wire_centroid(&self) -> Result<Option<(f64, Point3)>, BsplineError> {
        let mut length = 0.0;
        let mut moment = Vec3::ZERO;
        for segment in self.bezier_segments()? {
            let (l, c) = segment.wire_integrals(0.0, 1.0, true);
            if let Some(c) = c {
                moment = moment + c.to_vec3() * l;
                length += l;
            }
        }
        if length == 0.0 {
            return Ok(None);
        }
        Ok(Some((length, Point3::from(moment / length))))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Close approach
// ─────────────────────────────────────────────────────────────────────────────

/// Stationarity conditions of the distance between two curves, in curve
/// fractions: the chord is perpendicular to both tangents.
struct CurveApproachFunction<'a> {
    curve_a: &'a BsplineCurve,
    curve_b: &'a BsplineCurve,
}

impl FunctionRR2ToRR2 for CurveApproachFunction<'_> {
    fn evaluate(&self, u: f64, v: f64) -> Option<[f64; 6]> {
        let da = fraction_derivatives(self.curve_a, u)?;
        let db = fraction_derivatives(self.curve_b, v)?;
        let chord = db[0] - da[0];
        let f = da[1].dot(chord);
        let dfdu = da[2].dot(chord) - da[1].dot(da[1]);
        let dfdv = da[1].dot(db[1]);
        let g = db[1].dot(chord);
        let dgdu = -db[1].dot(da[1]);
        let dgdv = db[2].dot(chord) + db[1].dot(db[1]);
        Some([f, g, dfdu, dfdv, dgdu, dgdv])
    }
}

/// Point, first and second derivative with respect to the curve fraction.
fn fraction_derivatives(curve: &BsplineCurve, fraction: f64) -> Option<[Vec3; 3]> {
    let d = curve.cartesian_derivatives(2, fraction, false).ok()?;
    let (a, b) = curve.knot_range();
    let scale = b - a;
    Some([d[0], d[1] * scale, d[2] * (scale * scale)])
}

fn accept_fraction(curve: &BsplineCurve, fraction: f64) -> Option<f64> {
    if curve.closed {
        Some(fraction.rem_euclid(1.0))
    } else if (-FRACTION_SLACK..=1.0 + FRACTION_SLACK).contains(&fraction) {
        Some(fraction.clamp(0.0, 1.0))
    } else {
        None
    }
}

/// Newton refinement of a close approach between two curves from starting
/// fractions. Finds a local stationary point only.
///
/// Returns `None` when the iteration fails, leaves an open curve's range, or
/// ends farther apart than `max_distance`.
#[must_use]
pub fn refine_close_approach(
    curve_a: &BsplineCurve,
    fraction_a: f64,
    curve_b: &BsplineCurve,
    fraction_b: f64,
    max_distance: f64,
    options: &NewtonOptions,
) -> Option<CurveCloseApproach> {
    let func = CurveApproachFunction { curve_a, curve_b };
    let (u, v) = NewtonSolver2d::new(*options).run(&func, fraction_a, fraction_b)?;
    let fraction_a = accept_fraction(curve_a, u)?;
    let fraction_b = accept_fraction(curve_b, v)?;
    let point_a = curve_a.evaluate(fraction_a);
    let point_b = curve_b.evaluate(fraction_b);
    let distance = point_a.distance_to(point_b);
    if distance > max_distance {
        return None;
    }
    Some(CurveCloseApproach {
        fraction_a,
        fraction_b,
        point_a,
        point_b,
        distance,
    })
}

/// Closest approach between two curves: the nearest pair of stroke edges
/// seeds a Newton refinement, whose result is kept when it improves on the
/// polyline estimate.
///
/// # Errors
/// As [`BsplineCurve::strokes`].
pub fn curve_close_approach(
    curve_a: &BsplineCurve,
    curve_b: &BsplineCurve,
    stroke_options: &StrokeOptions,
    newton_options: &NewtonOptions,
) -> Result<Option<CurveCloseApproach>, BsplineError> {
    let options = StrokeOptions {
        parameter_mapping: StrokeParameterMapping::CurveFraction,
        ..*stroke_options
    };
    let strokes_a = curve_a.strokes(&options)?;
    let strokes_b = curve_b.strokes(&options)?;

    let lerp = |params: &[f64], k: usize, s: f64| params[k - 1] + s * (params[k] - params[k - 1]);
    let mut best: Option<CurveCloseApproach> = None;
    for i in 1..strokes_a.len() {
        let edge_a = Segment3::new(strokes_a.points[i - 1], strokes_a.points[i]);
        for j in 1..strokes_b.len() {
            let edge_b = Segment3::new(strokes_b.points[j - 1], strokes_b.points[j]);
            let (sa, sb, pa, pb) = edge_a.closest_approach(edge_b);
            let distance = pa.distance_to(pb);
            if best.is_some_and(|b| b.distance <= distance) {
                continue;
            }
            best = Some(CurveCloseApproach {
                fraction_a: lerp(&strokes_a.params, i, sa),
                fraction_b: lerp(&strokes_b.params, j, sb),
                point_a: pa,
                point_b: pb,
                distance,
            });
        }
    }

    let Some(seed) = best else {
        return Ok(None);
    };
    let refined = refine_close_approach(
        curve_a,
        seed.fraction_a,
        curve_b,
        seed.fraction_b,
        seed.distance,
        newton_options,
    );
    Ok(Some(refined.unwrap_or(seed)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blossom_of_clamped_span_returns_poles() {
        let poles = vec![
            Point4::new(0.0, 0.0, 0.0, 1.0),
            Point4::new(1.0, 2.0, 0.0, 1.0),
            Point4::new(3.0, 0.0, 0.0, 1.0),
        ];
        let knots = [0.0, 0.0, 1.0, 1.0];
        let bezier = blossom_bezier_poles(&poles, &knots, 0.0, 1.0);
        for (a, b) in bezier.iter().zip(&poles) {
            assert!(a.max_abs_diff(*b) < 1e-15);
        }
    }

    #[test]
    fn edge_count_is_capped() {
        let poles = vec![
            Point4::new(0.0, 0.0, 0.0, 1.0),
            Point4::new(1.0, 100.0, 0.0, 1.0),
            Point4::new(2.0, 0.0, 0.0, 1.0),
        ];
        assert_eq!(estimate_edge_count(&poles, 1e-9, 0.0, 0.0, true), MAX_STROKES_PER_BEZIER);
        assert_eq!(estimate_edge_count(&poles, 0.0, 0.0, 0.0, true), 1);
    }
}
