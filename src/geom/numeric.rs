//! Small numeric engines used by Bezier analysis: Bernstein polynomials with
//! root isolation on `[0, 1]`, adaptive Newton–Cotes quadrature and a
//! two-variable Newton solver.

use serde::{Deserialize, Serialize};

/// Roots closer than this are reported once.
const ROOT_MERGE_TOLERANCE: f64 = 1e-10;
/// Subdivision depth cap for root isolation.
const MAX_ROOT_DEPTH: usize = 60;
/// Interval width at which isolation stops splitting.
const MIN_ROOT_INTERVAL: f64 = 1e-14;
/// Subdivision depth cap for adaptive quadrature.
const MAX_QUADRATURE_DEPTH: usize = 14;

// ─────────────────────────────────────────────────────────────────────────────
// Bernstein polynomials
// ─────────────────────────────────────────────────────────────────────────────

fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut value = 1.0;
    for i in 0..k {
        value = value * (n - i) as f64 / (i + 1) as f64;
    }
    value
}

/// Scalar polynomial in Bernstein form on `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BezierPolynomial {
    pub coffs: Vec<f64>,
}

impl BezierPolynomial {
    #[must_use]
    pub fn new(coffs: Vec<f64>) -> Self {
        Self { coffs }
    }

    /// Polynomial degree (`coffs.len() - 1`); zero for an empty polynomial.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.coffs.len().saturating_sub(1)
    }

    /// De Casteljau evaluation.
    #[must_use]
    pub fn evaluate(&self, t: f64) -> f64 {
        if self.coffs.is_empty() {
            return 0.0;
        }
        let mut work = self.coffs.clone();
        let s = 1.0 - t;
        for level in 1..work.len() {
            for i in 0..work.len() - level {
                work[i] = s * work[i] + t * work[i + 1];
            }
        }
        work[0]
    }

    /// Derivative in Bernstein form, one degree lower.
    #[must_use]
    pub fn derivative(&self) -> Self {
        let n = self.degree();
        if n == 0 {
            return Self::new(vec![0.0]);
        }
        let scale = n as f64;
        Self::new(self.coffs.windows(2).map(|w| scale * (w[1] - w[0])).collect())
    }

    /// Product of two Bernstein polynomials.
    #[must_use]
    pub fn product(&self, other: &Self) -> Self {
        if self.coffs.is_empty() || other.coffs.is_empty() {
            return Self::new(Vec::new());
        }
        let (m, n) = (self.degree(), other.degree());
        let mut coffs = vec![0.0; m + n + 1];
        for (i, a) in self.coffs.iter().enumerate() {
            for (j, b) in other.coffs.iter().enumerate() {
                coffs[i + j] += binomial(m, i) * binomial(n, j) * a * b;
            }
        }
        for (k, c) in coffs.iter_mut().enumerate() {
            *c /= binomial(m + n, k);
        }
        Self::new(coffs)
    }

    /// `a * self + b * other` for polynomials of equal degree.
    #[must_use]
    pub fn sum_scaled(&self, a: f64, other: &Self, b: f64) -> Self {
        Self::new(
            self.coffs
                .iter()
                .zip(&other.coffs)
                .map(|(x, y)| a * x + b * y)
                .collect(),
        )
    }

    /// Roots in `[0, 1]`, ascending. An identically zero polynomial has none.
    ///
    /// Intervals are isolated by Bernstein subdivision: a coefficient run
    /// without a sign change has no root, a run with exactly one change has
    /// exactly one, which is then bracketed by bisection.
    #[must_use]
    pub fn roots_in_unit_interval(&self) -> Vec<f64> {
        if self.coffs.iter().all(|c| *c == 0.0) {
            return Vec::new();
        }
        let mut roots = Vec::new();
        if self.coffs[0] == 0.0 {
            roots.push(0.0);
        }
        self.isolate(&self.coffs, 0.0, 1.0, 0, &mut roots);
        roots.sort_by(f64::total_cmp);
        roots.dedup_by(|a, b| (*a - *b).abs() <= ROOT_MERGE_TOLERANCE);
        roots
    }

    fn isolate(&self, coffs: &[f64], a: f64, b: f64, depth: usize, roots: &mut Vec<f64>) {
        let Some(&last) = coffs.last() else {
            return;
        };
        if last == 0.0 {
            roots.push(b);
        }
        let changes = sign_changes(coffs);
        if changes == 0 {
            return;
        }
        if changes == 1 && coffs[0] != 0.0 && last != 0.0 {
            roots.push(self.bisect(a, b));
            return;
        }
        if depth >= MAX_ROOT_DEPTH || b - a < MIN_ROOT_INTERVAL {
            roots.push(0.5 * (a + b));
            return;
        }
        let (left, right) = split_bernstein(coffs);
        let mid = 0.5 * (a + b);
        self.isolate(&left, a, mid, depth + 1, roots);
        self.isolate(&right, mid, b, depth + 1, roots);
    }

    fn bisect(&self, mut a: f64, mut b: f64) -> f64 {
        let mut fa = self.evaluate(a);
        for _ in 0..200 {
            let mid = 0.5 * (a + b);
            if mid <= a || mid >= b {
                break;
            }
            let fm = self.evaluate(mid);
            if fm == 0.0 {
                return mid;
            }
            if (fm < 0.0) == (fa < 0.0) {
                a = mid;
                fa = fm;
            } else {
                b = mid;
            }
        }
        0.5 * (a + b)
    }
}

fn sign_changes(coffs: &[f64]) -> usize {
    let mut count = 0;
    let mut previous = 0.0_f64;
    for &c in coffs {
        if c == 0.0 {
            continue;
        }
        if previous != 0.0 && (c < 0.0) != (previous < 0.0) {
            count += 1;
        }
        previous = c;
    }
    count
}

/// Splits Bernstein coefficients at `t = 0.5`.
fn split_bernstein(coffs: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = coffs.len();
    let mut work = coffs.to_vec();
    let mut left = Vec::with_capacity(n);
    let mut right = vec![0.0; n];
    left.push(work[0]);
    right[n - 1] = work[n - 1];
    for level in 1..n {
        for i in 0..n - level {
            work[i] = 0.5 * (work[i] + work[i + 1]);
        }
        left.push(work[0]);
        right[n - 1 - level] = work[n - 1 - level];
    }
    (left, right)
}

// ─────────────────────────────────────────────────────────────────────────────
// Quadrature
// ─────────────────────────────────────────────────────────────────────────────

fn boole_panel<const N: usize>(values: &[[f64; N]; 5], h: f64) -> [f64; N] {
    let mut sum = [0.0; N];
    for (k, slot) in sum.iter_mut().enumerate() {
        *slot = 2.0 * h / 45.0
            * (7.0 * values[0][k]
                + 32.0 * values[1][k]
                + 12.0 * values[2][k]
                + 32.0 * values[3][k]
                + 7.0 * values[4][k]);
    }
    sum
}

/// Adaptive 5-point Newton–Cotes (Boole) integration of a vector integrand.
///
/// A panel is accepted when splitting it changes no component by more than
/// `max(abs_tol, rel_tol * m)`, where `m` is the largest component magnitude;
/// panels are split at least once.
pub fn integrate_newton_cotes<const N: usize, F>(
    f: &F,
    a: f64,
    b: f64,
    abs_tol: f64,
    rel_tol: f64,
) -> [f64; N]
where
    F: Fn(f64) -> [f64; N],
{
    if a == b {
        return [0.0; N];
    }
    let h = 0.25 * (b - a);
    let values = [f(a), f(a + h), f(a + 2.0 * h), f(a + 3.0 * h), f(b)];
    let whole = boole_panel(&values, h);
    refine_panel(f, a, b, &values, whole, abs_tol, rel_tol, 0)
}

#[allow(clippy::too_many_arguments)]
fn refine_panel<const N: usize, F>(
    f: &F,
    a: f64,
    b: f64,
    values: &[[f64; N]; 5],
    whole: [f64; N],
    abs_tol: f64,
    rel_tol: f64,
    depth: usize,
) -> [f64; N]
where
    F: Fn(f64) -> [f64; N],
{
    let h = 0.125 * (b - a);
    let left_values = [values[0], f(a + h), values[1], f(a + 3.0 * h), values[2]];
    let right_values = [values[2], f(a + 5.0 * h), values[3], f(a + 7.0 * h), values[4]];
    let left = boole_panel(&left_values, h);
    let right = boole_panel(&right_values, h);

    let mut total = [0.0; N];
    for k in 0..N {
        total[k] = left[k] + right[k];
    }
    let scale = total.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let tol = abs_tol.max(rel_tol * scale);
    let converged = (0..N).all(|k| (total[k] - whole[k]).abs() <= tol);
    if converged || depth >= MAX_QUADRATURE_DEPTH {
        return total;
    }
    let mid = 0.5 * (a + b);
    let l = refine_panel(f, a, mid, &left_values, left, abs_tol, rel_tol, depth + 1);
    let r = refine_panel(f, mid, b, &right_values, right, abs_tol, rel_tol, depth + 1);
    let mut sum = [0.0; N];
    for k in 0..N {
        sum[k] = l[k] + r[k];
    }
    sum
}

// ─────────────────────────────────────────────────────────────────────────────
// Newton iteration
// ─────────────────────────────────────────────────────────────────────────────

/// Two functions of two variables with their Jacobian.
pub trait FunctionRR2ToRR2 {
    /// Returns `(f, g, df/du, df/dv, dg/du, dg/dv)` at `(u, v)`, or `None`
    /// when the functions cannot be evaluated there.
    fn evaluate(&self, u: f64, v: f64) -> Option<[f64; 6]>;
}

/// Controls for [`NewtonSolver2d`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonOptions {
    /// Convergence threshold on the parameter step.
    pub param_tolerance: f64,
    /// Iteration cap.
    pub max_iterations: usize,
}

impl Default for NewtonOptions {
    fn default() -> Self {
        Self {
            param_tolerance: 1e-10,
            max_iterations: 30,
        }
    }
}

/// Newton iteration for a root of a [`FunctionRR2ToRR2`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NewtonSolver2d {
    pub options: NewtonOptions,
}

impl NewtonSolver2d {
    #[must_use]
    pub const fn new(options: NewtonOptions) -> Self {
        Self { options }
    }

    /// Iterates from `(u, v)` until the step falls below the tolerance.
    ///
    /// Returns `None` on a singular Jacobian, an evaluation failure or when
    /// the iteration cap is reached first.
    pub fn run<F: FunctionRR2ToRR2 + ?Sized>(&self, func: &F, mut u: f64, mut v: f64) -> Option<(f64, f64)> {
        for iteration in 0..self.options.max_iterations {
            let [f, g, dfdu, dfdv, dgdu, dgdv] = func.evaluate(u, v)?;
            let det = dfdu * dgdv - dfdv * dgdu;
            if !det.is_finite() || det.abs() <= f64::MIN_POSITIVE {
                log::trace!("newton: singular jacobian at iteration {iteration}");
                return None;
            }
            let du = (f * dgdv - g * dfdv) / det;
            let dv = (dfdu * g - dgdu * f) / det;
            u -= du;
            v -= dv;
            if du.abs().max(dv.abs()) < self.options.param_tolerance {
                return Some((u, v));
            }
        }
        log::trace!("newton: no convergence in {} iterations", self.options.max_iterations);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadratic_roots_are_found() {
        // (t - 0.25)(t - 0.75) in Bernstein form.
        let p = BezierPolynomial::new(vec![0.1875, -0.3125, 0.1875]);
        let roots = p.roots_in_unit_interval();
        assert_eq!(roots.len(), 2);
        assert!((roots[0] - 0.25).abs() < 1e-12);
        assert!((roots[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn boole_rule_integrates_quartic_exactly() {
        let value = integrate_newton_cotes(&|t: f64| [t.powi(4)], 0.0, 2.0, 0.0, 1e-12);
        assert!((value[0] - 32.0 / 5.0).abs() < 1e-12);
    }

    struct Circle;

    impl FunctionRR2ToRR2 for Circle {
        fn evaluate(&self, u: f64, v: f64) -> Option<[f64; 6]> {
            Some([u * u + v * v - 1.0, u - v, 2.0 * u, 2.0 * v, 1.0, -1.0])
        }
    }

    #[test]
    fn newton_finds_diagonal_circle_point() {
        let (u, v) = NewtonSolver2d::default().run(&Circle, 1.0, 0.5).expect("converges");
        let expected = std::f64::consts::FRAC_1_SQRT_2;
        assert!((u - expected).abs() < 1e-12);
        assert!((v - expected).abs() < 1e-12);
    }
}
