//! Knot vector conventions shared by the B-spline curve engine.
//!
//! Knot arrays are always stored in full. An open curve with `n` poles of
//! order `k` carries `n + k` knots; a closed (periodic) curve carries
//! `n + 2k - 1` knots, i.e. the `k - 1` wrap-around knots on both sides of the
//! active range are materialized instead of being implied.
//!
//! The active parameter range runs from `knots[order - 1]` to
//! `knots[num_knots - order]` in both cases.

use super::bspline::BsplineError;

/// Relative tolerance used when comparing knot values.
pub const KNOT_TOLERANCE_BASIS: f64 = 1e-10;

/// Highest supported curve order (degree + 1).
pub const MAX_ORDER: usize = 26;

/// Floor for [`knot_tolerance`].
pub const MIN_KNOT_TOLERANCE: f64 = 1e-14;

/// Knot gaps larger than this never shrink the knot tolerance.
pub(crate) const KNOT_GAP_EPSILON: f64 = 1e-5;

/// Number of stored knots for a curve with the given layout.
#[must_use]
pub const fn num_knots(num_poles: usize, order: usize, closed: bool) -> usize {
    if closed {
        num_poles + 2 * order - 1
    } else {
        num_poles + order
    }
}

/// Number of interior knots, excluding the `order` boundary knots on each side.
#[must_use]
pub const fn num_interior_knots(num_poles: usize, order: usize, closed: bool) -> usize {
    num_knots(num_poles, order, closed).saturating_sub(2 * order)
}

/// Builds a knot vector normalized to `[0, 1]`.
///
/// `interior`, when given, supplies the interior knots verbatim; otherwise
/// they are uniformly spaced. For closed curves the wrap-around knots are
/// derived from the interior ones so that `k[i + n] == k[i] + 1`.
#[must_use]
pub fn compute_knot_vector(
    num_poles: usize,
    order: usize,
    closed: bool,
    interior: Option<&[f64]>,
) -> Vec<f64> {
    let total = num_knots(num_poles, order, closed);
    let num_interior = num_interior_knots(num_poles, order, closed);
    let mut knots = vec![0.0; total];
    if order == 0 || total < 2 * order {
        return knots;
    }

    knots[order - 1] = 0.0;
    match interior {
        Some(values) => {
            for (i, slot) in knots[order..order + num_interior].iter_mut().enumerate() {
                *slot = values.get(i).copied().unwrap_or(1.0);
            }
        }
        None => {
            let delta = 1.0 / (num_interior + 1) as f64;
            for i in 0..num_interior {
                knots[order + i] = delta * (i + 1) as f64;
            }
        }
    }

    if closed {
        for i in 0..order {
            knots[i] = knots[num_interior + 1 + i] - 1.0;
            knots[num_interior + order + i] = knots[order - 1 + i] + 1.0;
        }
    } else {
        for i in 0..order {
            knots[i] = 0.0;
            knots[num_interior + order + i] = 1.0;
        }
    }
    knots
}

/// Active parameter range `(knots[order - 1], knots[num_knots - order])`.
#[must_use]
pub fn knot_range(knots: &[f64], order: usize) -> (f64, f64) {
    if order == 0 || knots.len() < order {
        return (0.0, 0.0);
    }
    (knots[order - 1], knots[knots.len() - order])
}

/// Tolerance for knot comparisons.
///
/// Starts from [`KNOT_TOLERANCE_BASIS`] scaled by the knot range and divided
/// by the control polygon length, then shrinks to a tenth of any
/// suspiciously small interior gap so that nearly coincident knots stay
/// distinguishable.
#[must_use]
pub fn knot_tolerance(knots: &[f64], order: usize, polygon_length: f64) -> f64 {
    let (min, max) = knot_range(knots, order);
    let mut tol = KNOT_TOLERANCE_BASIS / polygon_length.max(1.0) * (max - min).abs();
    if order > 0 && knots.len() >= order {
        for i in order..=knots.len() - order {
            let gap = (knots[i] - knots[i - 1]).abs();
            if gap < tol && gap > KNOT_GAP_EPSILON {
                tol = gap / 10.0;
            }
        }
    }
    tol.max(MIN_KNOT_TOLERANCE)
}

/// Rescales a knot vector so its active range becomes `[0, 1]`.
///
/// Descending (reversed) knot vectors come out ascending. Boundary knots are
/// rewritten exactly: clamped ends of open curves become 0 and 1, and the
/// wrap-around knots of closed curves are rebuilt from the period.
///
/// # Errors
/// [`BsplineError::BadParameter`] when the active range is (nearly) empty.
pub fn normalize_knot_vector(
    knots: &mut [f64],
    num_poles: usize,
    order: usize,
    closed: bool,
) -> Result<(), BsplineError> {
    let total = num_knots(num_poles, order, closed);
    if order == 0 || knots.len() < total || num_poles == 0 {
        return Err(BsplineError::BadParameter);
    }
    let root = knots[order - 1];
    let end = if closed {
        knots[num_poles + order - 1]
    } else {
        knots[num_poles]
    };
    let divisor = end - root;
    if divisor.abs() < KNOT_TOLERANCE_BASIS {
        return Err(BsplineError::BadParameter);
    }

    for k in knots[..total].iter_mut() {
        *k = (*k - root) / divisor;
    }

    if closed {
        knots[order - 1] = 0.0;
        knots[num_poles + order - 1] = 1.0;
        for i in 0..order - 1 {
            knots[i] = knots[num_poles + i] - 1.0;
        }
        for i in 1..order {
            knots[num_poles + order - 1 + i] = knots[order - 1 + i] + 1.0;
        }
    } else {
        for k in &mut knots[num_poles..total] {
            *k = 1.0;
        }
    }
    Ok(())
}

/// Distinct knot values inside the active range with their multiplicities.
///
/// Multiplicities are counted over the whole stored vector, so a clamped end
/// of an open curve reports `order`.
#[must_use]
pub fn knot_multiplicities(knots: &[f64], order: usize, tol: f64) -> Vec<(f64, usize)> {
    let (min, max) = knot_range(knots, order);
    let mut result: Vec<(f64, usize)> = Vec::new();
    for &k in knots {
        if k < min - tol || k > max + tol {
            continue;
        }
        match result.last_mut() {
            Some((value, count)) if (k - *value).abs() <= tol => *count += 1,
            _ => result.push((k, 1)),
        }
    }
    result
}

/// Number of stored knots within `tol` of `u`.
#[must_use]
pub fn multiplicity_at(knots: &[f64], u: f64, tol: f64) -> usize {
    knots.iter().filter(|k| (**k - u).abs() <= tol).count()
}

/// Index `i` of the non-degenerate span `knots[i] <= u <= knots[i + 1]`.
///
/// `num_poles` is the count of poles the knot vector drives (for a closed
/// curve, the unrolled count). The result lies in `order - 1 ..= num_poles - 1`
/// and `u` is clamped to the active range.
#[must_use]
pub fn find_span(knots: &[f64], order: usize, num_poles: usize, u: f64) -> usize {
    let lo = order.saturating_sub(1);
    let hi = num_poles.saturating_sub(1).max(lo);
    let mut i = lo;
    while i < hi && knots[i + 1] <= u {
        i += 1;
    }
    while i > lo && knots[i] >= knots[i + 1] {
        i -= 1;
    }
    i
}

/// Non-zero basis functions `N[span - order + 1 ..= span]` at `u`
/// (Cox–de Boor, triangular scheme). Zero denominators contribute nothing.
#[must_use]
pub fn basis_functions(knots: &[f64], span: usize, u: f64, order: usize) -> Vec<f64> {
    let mut n = vec![0.0; order];
    let mut left = vec![0.0; order];
    let mut right = vec![0.0; order];
    n[0] = 1.0;
    for j in 1..order {
        left[j] = u - knots[span + 1 - j];
        right[j] = knots[span + j] - u;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            let temp = if denom == 0.0 { 0.0 } else { n[r] / denom };
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n[j] = saved;
    }
    n
}

/// True when every knot is at least its predecessor.
#[must_use]
pub fn is_non_decreasing(knots: &[f64]) -> bool {
    knots.windows(2).all(|w| w[0] <= w[1])
}

/// Elementary symmetric functions `e_0 ..= e_n` of `values`.
#[must_use]
pub fn symmetric_functions(values: &[f64]) -> Vec<f64> {
    let mut e = vec![0.0; values.len() + 1];
    e[0] = 1.0;
    for (count, &v) in values.iter().enumerate() {
        for j in (1..=count + 1).rev() {
            e[j] += v * e[j - 1];
        }
    }
    e
}

/// Open knot vector with every distinct knot's multiplicity raised by `t`.
#[must_use]
pub fn increase_knot_degree(knots: &[f64], order: usize, t: usize, tol: f64) -> Vec<f64> {
    let mut result = Vec::with_capacity(knots.len() * (t + 1));
    for (value, count) in knot_multiplicities(knots, order, tol) {
        for _ in 0..count + t {
            result.push(value);
        }
    }
    result
}
