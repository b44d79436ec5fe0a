//! Structural edits on [`BsplineCurve`]: knot insertion, opening and
//! closing periodic curves, reversal, segmentation, concatenation, degree
//! elevation and Bezier decomposition.
//!
//! Every edit returns a new curve and leaves `self` untouched; on error no
//! partially edited curve escapes.

use super::bspline::{is_same_rational_point, BsplineCurve, BsplineError};
use super::core::{ClosedIndex, Point3, Point4};
use super::knots::{self, KNOT_TOLERANCE_BASIS, MAX_ORDER};
use super::map4d::Map4d;
use super::matrix4d::Matrix4d;

/// Curve lengths below this count as zero when reparameterizing a combine.
const ZERO_LENGTH: f64 = 1e-12;
/// Length ratio beyond which the shorter curve of a combine is ignored.
const LENGTH_RATIO_LIMIT: f64 = 1e10;
/// Relative coordinate tolerance for the wrap-around close test.
const WRAP_POLE_TOLERANCE: f64 = 1e-10;

/// One non-degenerate knot span of a curve's open view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnotSpan {
    /// Span index `i` with `knots[i] < knots[i + 1]`.
    pub index: usize,
    pub u0: f64,
    pub u1: f64,
}

fn insert_knot_once(poles: &mut Vec<Point4>, knots: &mut Vec<f64>, order: usize, u: f64) {
    let n = poles.len();
    let p = order - 1;
    let k = knots::find_span(knots, order, n, u);
    let mut inserted = Vec::with_capacity(n + 1);
    for i in 0..=n {
        if i + p <= k {
            inserted.push(poles[i]);
        } else if i > k {
            inserted.push(poles[i - 1]);
        } else {
            let alpha = (u - knots[i]) / (knots[i + p] - knots[i]);
            inserted.push(poles[i - 1].interpolate(alpha, poles[i]));
        }
    }
    *poles = inserted;
    knots.insert(k + 1, u);
}

impl BsplineCurve {
    fn homogeneous_poles(&self) -> Vec<Point4> {
        (0..self.num_poles()).map(|i| self.homogeneous_pole(i)).collect()
    }

    fn set_homogeneous_poles(&mut self, poles: &[Point4]) {
        self.poles = poles.iter().map(|p| p.xyz()).collect();
        if self.weights.is_some() {
            self.weights = Some(poles.iter().map(|p| p.w).collect());
        }
    }

    /// Inserts `u` until its multiplicity reaches `multiplicity` (or grows by
    /// it when `add` is set), capped at the order. A `u` within `tol` of an
    /// existing knot is snapped onto it.
    ///
    /// # Errors
    /// [`BsplineError::BadPeriodicity`] on closed curves;
    /// [`BsplineError::BadParameter`] when `u` lies outside the active range
    /// or `multiplicity` exceeds the order.
    pub fn add_knot(
        &mut self,
        u: f64,
        tol: f64,
        multiplicity: usize,
        add: bool,
    ) -> Result<(), BsplineError> {
        if self.closed {
            return Err(BsplineError::BadPeriodicity);
        }
        let (a, b) = self.knot_range();
        if u < a - tol || u > b + tol || multiplicity > self.order {
            return Err(BsplineError::BadParameter);
        }
        let u = self
            .knots
            .iter()
            .copied()
            .find(|k| (k - u).abs() <= tol)
            .unwrap_or(u)
            .clamp(a, b);
        let current = knots::multiplicity_at(&self.knots, u, tol);
        let target = if add { current + multiplicity } else { multiplicity }.min(self.order);
        if target <= current {
            return Ok(());
        }

        let mut poles = self.homogeneous_poles();
        for _ in current..target {
            insert_knot_once(&mut poles, &mut self.knots, self.order, u);
        }
        self.set_homogeneous_poles(&poles);
        Ok(())
    }

    /// Open curve spanning two periods of a closed curve.
    fn doubled_open_curve(&self) -> Self {
        let n = self.num_poles();
        let order = self.order;
        let (start, end) = self.knot_range();
        let period = end - start;
        let index = ClosedIndex::new(n);

        let (poles, weights, knots) = if self.knots_should_be_opened() {
            let offset = order / 2;
            let view = &self.knots[offset..offset + n + order];
            let poles: Vec<Point3> = self.poles.iter().chain(&self.poles[1..]).copied().collect();
            let weights = self
                .weights
                .as_ref()
                .map(|w| w.iter().chain(&w[1..]).copied().collect());
            let mut knots = view[..n + order - 1].to_vec();
            knots.extend(view[order..].iter().map(|k| k + period));
            (poles, weights, knots)
        } else {
            let count = 2 * n + order - 1;
            let poles = index.take_wrapped(&self.poles, 0, count);
            let weights = self.weights.as_ref().map(|w| index.take_wrapped(w, 0, count));
            let mut knots = self.knots.clone();
            for j in knots.len()..count + order {
                let k = knots[j - n] + period;
                knots.push(k);
            }
            (poles, weights, knots)
        };

        Self {
            order,
            closed: false,
            poles,
            knots,
            weights,
        }
    }

    /// Sub-curve of an open curve between natural parameters `u1 < u2`,
    /// with knots normalized.
    fn extract_open_segment(&self, u1: f64, u2: f64) -> Result<Self, BsplineError> {
        let tol = self.knot_tolerance();
        let mut curve = self.clone();
        curve.add_knot(u1, tol, self.order, false)?;
        curve.add_knot(u2, tol, self.order, false)?;

        let init = curve
            .knots
            .iter()
            .position(|k| (k - u1).abs() <= tol)
            .ok_or(BsplineError::BadParameter)?;
        let fin = (init + 1..curve.knots.len())
            .find(|&i| (curve.knots[i] - u2).abs() <= tol)
            .ok_or(BsplineError::BadParameter)?;
        let n = fin - init;
        if n < self.order || init + n + self.order > curve.knots.len() {
            return Err(BsplineError::TooFewPoles);
        }

        let mut segment = Self {
            order: self.order,
            closed: false,
            poles: curve.poles[init..init + n].to_vec(),
            knots: curve.knots[init..init + n + self.order].to_vec(),
            weights: curve.weights.as_ref().map(|w| w[init..init + n].to_vec()),
        };
        segment.normalize_knots()?;
        Ok(segment)
    }

    /// Removes the periodicity of a closed curve, moving the seam to natural
    /// parameter `u`. Open curves are returned as copies.
    ///
    /// Parameters within [`KNOT_TOLERANCE_BASIS`] of either end of the range
    /// open at the start. A fake periodic curve opened at its start simply
    /// drops the padding knots.
    ///
    /// # Errors
    /// Propagates knot insertion and normalization failures.
    pub fn open_at(&self, u: f64) -> Result<Self, BsplineError> {
        if !self.closed {
            return Ok(self.clone());
        }
        let (start, end) = self.knot_range();
        let span = end - start;
        let mut u = self.wrap_or_clamp_parameter(u);
        if u < start + KNOT_TOLERANCE_BASIS * span || u > end - KNOT_TOLERANCE_BASIS * span {
            u = start;
        }

        if self.knots_should_be_opened() && u == start {
            log::debug!("opening fake periodic curve in place");
            let offset = self.order / 2;
            let mut curve = self.clone();
            curve.closed = false;
            curve.knots = self.knots[offset..offset + self.num_poles() + self.order].to_vec();
            curve.normalize_knots()?;
            return Ok(curve);
        }

        log::debug!("opening closed curve of order {} at u = {u}", self.order);
        self.doubled_open_curve().extract_open_segment(u, u + span)
    }

    /// Makes an open curve periodic.
    ///
    /// Order-2 curves drop their duplicate end pole. Higher orders first try
    /// to unclamp both ends so the seam is fully continuous, dropping
    /// `degree` poles; when that fails the curve keeps its poles and gets a
    /// closed knot vector with a full-multiplicity seam.
    ///
    /// # Errors
    /// [`BsplineError::BadPoles`] when the first and last poles differ.
    pub fn close(&self) -> Result<Self, BsplineError> {
        if self.closed {
            return Ok(self.clone());
        }
        let n = self.num_poles();
        if self.order == 2 && n == 2 {
            return Ok(self.clone());
        }
        if !is_same_rational_point(self.homogeneous_pole(0), self.homogeneous_pole(n - 1)) {
            return Err(BsplineError::BadPoles);
        }

        let mut curve = self.clone();
        curve.normalize_knots()?;

        if self.order == 2 {
            let k = &mut curve.knots;
            k[0] = k[1] - (k[n] - k[n - 1]);
            k[n + 1] = k[n] + (k[2] - k[1]);
            curve.poles.pop();
            if let Some(w) = curve.weights.as_mut() {
                w.pop();
            }
            curve.closed = true;
            return Ok(curve);
        }

        match curve.close_wrap_around() {
            Ok(closed) => Ok(closed),
            Err(err) => {
                log::debug!("wrap-around close failed ({err}); using padded seam");
                crate::debug_log!("close: padded seam for {} poles of order {}", n, self.order);
                let interior_start = (self.order + 1) / 2;
                let interior = curve.knots[interior_start..].to_vec();
                curve.knots = knots::compute_knot_vector(n, self.order, true, Some(&interior));
                curve.closed = true;
                Ok(curve)
            }
        }
    }

    /// Unclamps both ends of a clamped open curve and checks that the
    /// leading and trailing `degree` poles coincide.
    fn close_wrap_around(&self) -> Result<Self, BsplineError> {
        let p = self.degree();
        let n = self.num_poles() - 1;
        if n < 2 * p {
            return Err(BsplineError::TooFewPoles);
        }
        let mut u = self.knots.clone();
        let mut h = self.homogeneous_poles();

        for i in 0..p.saturating_sub(1) {
            u[p - i - 1] = u[p - i] - (u[n - i + 1] - u[n - i]);
            for j in (0..=i).rev() {
                let k = p - 1 - (i - j);
                let alpha = (u[p] - u[k]) / (u[p + j + 1] - u[k]);
                if alpha == 1.0 {
                    return Err(BsplineError::BadKnots);
                }
                let b = 1.0 / (1.0 - alpha);
                h[j] = h[j].sum_of(b, h[j + 1], -alpha * b);
            }
        }
        u[0] = u[1] - (u[n - p + 2] - u[n - p + 1]);

        for i in 0..p.saturating_sub(1) {
            u[n + i + 2] = u[n + i + 1] + (u[p + i + 1] - u[p + i]);
            for j in (0..=i).rev() {
                let alpha = (u[n + 1] - u[n - j]) / (u[n - j + i + 2] - u[n - j]);
                if alpha == 0.0 {
                    return Err(BsplineError::BadKnots);
                }
                let b = 1.0 / alpha;
                h[n - j] = h[n - j].sum_of(b, h[n - j - 1], (alpha - 1.0) * b);
            }
        }
        u[n + p + 1] = u[n + p] + (u[2 * p] - u[2 * p - 1]);

        let tol = h
            .iter()
            .map(|q| q.xyz().max_abs())
            .fold(0.0, f64::max)
            * WRAP_POLE_TOLERANCE;
        for i in 0..p {
            let a = h[i];
            let b = h[n - p + 1 + i];
            if a.xyz().distance_to(b.xyz()) > tol
                || (self.is_rational() && (a.w - b.w).abs() > WRAP_POLE_TOLERANCE)
            {
                return Err(BsplineError::BadPoles);
            }
        }

        h.truncate(n + 1 - p);
        let mut curve = self.clone();
        curve.set_homogeneous_poles(&h);
        curve.knots = u;
        curve.closed = true;
        Ok(curve)
    }

    /// Reverses the direction of travel. Closed curves keep their start point.
    ///
    /// # Errors
    /// Propagates opening, normalization and closing failures.
    pub fn reverse(&self) -> Result<Self, BsplineError> {
        let was_closed = self.closed;
        let mut curve = if was_closed {
            self.open_at(self.knot_range().0)?
        } else {
            self.clone()
        };
        curve.poles.reverse();
        if let Some(w) = curve.weights.as_mut() {
            w.reverse();
        }
        curve.knots.reverse();
        curve.normalize_knots()?;
        if was_closed {
            curve = curve.close()?;
        }
        Ok(curve)
    }

    /// Sub-curve between two fractions of the active range.
    ///
    /// A reversed request (`f1 < f0`) yields a curve running from `f0` to
    /// `f1`. When the request covers the whole range the result is a copy,
    /// reversed and, for closed curves, re-opened at `f0` as needed.
    ///
    /// # Errors
    /// [`BsplineError::BadParameter`] when the span is below the knot
    /// tolerance; otherwise propagates edit failures.
    pub fn segment(&self, f0: f64, f1: f64) -> Result<Self, BsplineError> {
        let tol = self.knot_tolerance();
        let mut u1 = self.fraction_to_parameter(f0);
        let mut u2 = self.fraction_to_parameter(f1);
        let u_diff = u2 - u1;
        let reversed = u_diff < 0.0;
        let (min_knot, max_knot) = self.knot_range();
        let range = max_knot - min_knot;

        if u_diff.abs() < tol {
            return Err(BsplineError::BadParameter);
        }

        if u_diff.abs() >= range {
            log::debug!("segment covers the full range; copying");
            let mut curve = self.clone();
            if curve.closed && (u1 - min_knot).abs() > tol && (u1 - max_knot).abs() > tol {
                curve = curve.open_at(u1)?;
            }
            if reversed {
                curve = curve.reverse()?;
            }
            return Ok(curve);
        }

        if self.closed {
            u1 = self.wrap_or_clamp_parameter(u1);
            let mut opened = self.open_at(u1)?;
            if reversed {
                opened = opened.reverse()?;
            }
            return opened.extract_open_segment(0.0, u_diff.abs() / range);
        }

        u1 = u1.clamp(min_knot, max_knot);
        u2 = u2.clamp(min_knot, max_knot);
        if reversed {
            std::mem::swap(&mut u1, &mut u2);
        }
        let segment = self.extract_open_segment(u1, u2)?;
        if reversed { segment.reverse() } else { Ok(segment) }
    }

    /// Concatenates two open curves of equal order.
    ///
    /// With `contiguous` the junction pole is shared and `curve1`'s copy is
    /// kept. With `reparam` each curve's knot contribution is scaled by its
    /// control polygon length; if one curve has (relatively) zero length the
    /// other is returned unchanged.
    ///
    /// # Errors
    /// [`BsplineError::BadPeriodicity`] if either curve is closed,
    /// [`BsplineError::BadOrder`] for mismatched orders,
    /// [`BsplineError::BadPoles`] when both curves have zero length under
    /// `reparam`.
    pub fn combine(
        curve1: &Self,
        curve2: &Self,
        contiguous: bool,
        reparam: bool,
    ) -> Result<Self, BsplineError> {
        if curve1.closed || curve2.closed {
            return Err(BsplineError::BadPeriodicity);
        }
        if curve1.order != curve2.order {
            return Err(BsplineError::BadOrder);
        }
        let order = curve1.order;
        let skip = usize::from(contiguous);

        let (mut dist1, mut dist2) = (1.0, 1.0);
        if reparam {
            dist1 = curve1.cumulative_distance();
            dist2 = curve2.cumulative_distance();
            let zero1 = dist1 < ZERO_LENGTH || dist2 / dist1 > LENGTH_RATIO_LIMIT;
            let zero2 = dist2 < ZERO_LENGTH || dist1 / dist2 > LENGTH_RATIO_LIMIT;
            match (zero1, zero2) {
                (true, false) => return Ok(curve2.clone()),
                (false, true) => return Ok(curve1.clone()),
                (true, true) => return Err(BsplineError::BadPoles),
                (false, false) => {}
            }
        }

        let mut k1 = curve1.clone();
        let mut k2 = curve2.clone();
        k1.normalize_knots()?;
        k2.normalize_knots()?;
        let n1 = k1.num_poles();
        let num_poles = n1 + k2.num_poles() - skip;

        let mut knots = Vec::with_capacity(num_poles + order);
        knots.extend(k1.knots[..n1 + order - skip].iter().map(|k| k * dist1));
        let junction = k1.knots[n1] * dist1;
        let base2 = k2.knots[order - 1];
        knots.extend(
            k2.knots[order..]
                .iter()
                .take(num_poles + order - knots.len())
                .map(|k| junction + (k - base2) * dist2),
        );

        let mut poles = k1.poles.clone();
        poles.extend_from_slice(&k2.poles[skip..]);

        let weights = if k1.is_rational() || k2.is_rational() {
            let mut w: Vec<f64> = (0..n1).map(|i| k1.weight(i)).collect();
            w.extend((skip..k2.num_poles()).map(|i| k2.weight(i)));
            Some(w)
        } else {
            None
        };

        let mut out = Self {
            order,
            closed: false,
            poles,
            knots,
            weights,
        };
        out.normalize_knots()?;
        log::debug!("combined curves into {} poles", out.num_poles());
        Ok(out)
    }

    /// Appends `curve2` to `curve1`, opening closed inputs and raising the
    /// lower order to match. The junction is shared when `force_continuity`
    /// is set or the curves already meet.
    ///
    /// # Errors
    /// As [`combine`](Self::combine) and [`elevate_degree`](Self::elevate_degree).
    pub fn append(
        curve1: &Self,
        curve2: &Self,
        force_continuity: bool,
        reparam: bool,
    ) -> Result<Self, BsplineError> {
        let mut a = curve1.open_at(curve1.knot_range().0)?;
        let mut b = curve2.open_at(curve2.knot_range().0)?;
        if a.order < b.order {
            a = a.elevate_degree(b.degree())?;
        } else if b.order < a.order {
            b = b.elevate_degree(a.degree())?;
        }
        let contiguous = force_continuity || a.is_contiguous_with(&b);
        Self::combine(&a, &b, contiguous, reparam)
    }

    /// Raises the degree without changing the curve's shape.
    ///
    /// Every distinct knot gains `new_degree - degree` multiplicity; each new
    /// pole is the blossom of the original curve at its knot neighborhood,
    /// assembled from left-hand derivatives and symmetric functions of the
    /// knot offsets.
    ///
    /// # Errors
    /// [`BsplineError::BadOrder`] when `new_degree` exceeds `MAX_ORDER - 1`
    /// or is below the current degree.
    pub fn elevate_degree(&self, new_degree: usize) -> Result<Self, BsplineError> {
        if new_degree > MAX_ORDER - 1 {
            return Err(BsplineError::BadOrder);
        }
        let degree = self.degree();
        if new_degree == degree {
            return Ok(self.clone());
        }
        if new_degree < degree {
            return Err(BsplineError::BadOrder);
        }

        let (start, end) = self.knot_range();
        let was_closed = self.closed;
        let mut curve = self.open_at(start)?;
        curve.normalize_knots()?;

        let tol = curve.knot_tolerance();
        let new_knots = knots::increase_knot_degree(&curve.knots, curve.order, new_degree - degree, tol);
        let new_order = new_degree + 1;
        let new_num_poles = new_knots.len() - new_order;
        let mut h = vec![Point4::ZERO; new_num_poles];

        for i in 1..new_num_poles {
            let anchor = new_knots[i + new_degree];
            let derivs = curve.derivatives_at_parameter(new_degree, anchor, true)?;
            let deltas: Vec<f64> = (0..new_degree).map(|j| new_knots[i + j] - anchor).collect();
            let sigma = knots::symmetric_functions(&deltas);
            let mut factor = 1.0;
            let mut pole = Point4::ZERO;
            for j in 0..=new_degree {
                if j > 0 {
                    factor /= (new_degree - j + 1) as f64;
                }
                pole = pole.add_scaled(derivs[j], sigma[j] * factor);
            }
            h[i - 1] = pole;
        }
        h[0] = curve.homogeneous_pole(0);
        h[new_num_poles - 1] = curve.homogeneous_pole(curve.num_poles() - 1);

        let mut out = Self {
            order: new_order,
            closed: false,
            poles: Vec::new(),
            knots: new_knots,
            weights: curve.weights.as_ref().map(|_| Vec::new()),
        };
        out.set_homogeneous_poles(&h);
        if was_closed {
            out = out.close()?;
        }
        out.rescale_knots(start, end);
        log::debug!("elevated degree {degree} -> {new_degree}");
        Ok(out)
    }

    /// Raises every interior knot to multiplicity `degree` so each span is an
    /// independent Bezier piece. The result is open.
    ///
    /// # Errors
    /// Propagates opening and knot insertion failures.
    pub fn make_bezier(&self) -> Result<Self, BsplineError> {
        let mut curve = self.open_at(self.knot_range().0)?;
        let n = curve.num_poles();
        if curve.order == 2 || n == curve.order {
            return Ok(curve);
        }
        let degree = curve.degree();
        let tol = curve.knot_tolerance();
        let mults = curve.knot_multiplicities(tol);
        let interior = &mults[..mults.len().saturating_sub(1)];
        if interior.iter().all(|(_, m)| *m >= degree) {
            return Ok(curve);
        }
        for (value, m) in mults {
            if m < degree {
                curve.add_knot(value, tol, degree, false)?;
            }
        }
        log::debug!("bezier decomposition: {} -> {} poles", n, curve.num_poles());
        Ok(curve)
    }

    /// Non-degenerate knot spans of the open view, in order.
    #[must_use]
    pub fn bezier_spans(&self) -> Vec<KnotSpan> {
        let view = self.open_view();
        let (lo, hi) = (self.order - 1, view.num_poles);
        (lo..hi)
            .filter(|&i| view.knots[i] < view.knots[i + 1])
            .map(|i| KnotSpan {
                index: i,
                u0: view.knots[i],
                u1: view.knots[i + 1],
            })
            .collect()
    }

    /// Applies a 4x4 transform to the weighted poles. Non-affine matrices make
    /// the curve rational and write the transformed `w` into the weights.
    #[must_use]
    pub fn transform(&self, matrix: &Matrix4d) -> Self {
        if matrix.is_identity() {
            return self.clone();
        }
        let mut curve = self.clone();
        if !matrix.is_affine() {
            curve.make_rational();
        }
        let transformed: Vec<Point4> = curve
            .homogeneous_poles()
            .into_iter()
            .map(|p| matrix.multiply_point4(p))
            .collect();
        curve.set_homogeneous_poles(&transformed);
        curve
    }

    /// [`transform`](Self::transform) by a map's forward matrix.
    #[must_use]
    pub fn transform_by_map(&self, map: &Map4d) -> Self {
        self.transform(&map.m0)
    }
}
