//! Box-constrained Levenberg–Marquardt for small nonlinear least squares problems.
//!
//! Minimizes `½ Σ r_i(p)^2` subject to `lower <= p <= upper`. Bounds are
//! enforced by projecting every trial point back into the box; the damping
//! follows Nielsen's update rule with Marquardt's diagonal scaling.
//!
//! The iteration budget counts residual evaluations (not outer iterations), so
//! a caller can retry a failed fit with a larger budget and get a
//! deterministic continuation of the same search.
//!
//! Convergence is declared when any of the following holds:
//! - the projected gradient is below `gtol` (infinity norm)
//! - an accepted step reduces the cost by less than `ftol` (relative), both
//!   actually and as predicted by the local model
//! - the step length is below `xtol * (xtol + |p|)`

use nalgebra::{DMatrix, DVector};

/// A residual model with an analytic Jacobian.
pub trait LeastSquaresProblem {
    fn residuals(&self, params: &DVector<f64>) -> DVector<f64>;

    /// `J[i][j] = ∂r_i / ∂p_j`
    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LmOptions {
    /// Maximum number of residual evaluations.
    pub max_evaluations: usize,
    pub ftol: f64,
    pub xtol: f64,
    pub gtol: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_evaluations: 300,
            ftol: 1e-8,
            xtol: 1e-8,
            gtol: 1e-8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LmReport {
    pub params: DVector<f64>,
    /// `½ Σ r_i^2` at `params`.
    pub cost: f64,
    pub evaluations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LmFailure {
    /// The evaluation budget ran out before any convergence test passed.
    BudgetExhausted { evaluations: usize },
    /// The residuals or Jacobian became non-finite and no finite step remained.
    NonFinite,
}

/// Run the optimizer from `initial` (projected into the box first).
pub fn minimize<P: LeastSquaresProblem>(
    problem: &P,
    initial: DVector<f64>,
    lower: &DVector<f64>,
    upper: &DVector<f64>,
    opts: &LmOptions,
) -> Result<LmReport, LmFailure> {
    let mut p = project(initial, lower, upper);
    let mut r = problem.residuals(&p);
    let mut evaluations = 1usize;
    if r.iter().any(|v| !v.is_finite()) {
        return Err(LmFailure::NonFinite);
    }
    let mut cost = 0.5 * r.norm_squared();

    let mut mu: Option<f64> = None;
    let mut nu = 2.0_f64;

    loop {
        if cost <= f64::MIN_POSITIVE {
            return Ok(LmReport { params: p, cost, evaluations });
        }

        let j = problem.jacobian(&p);
        if j.iter().any(|v| !v.is_finite()) {
            return Err(LmFailure::NonFinite);
        }
        let g = j.transpose() * &r;
        if projected_gradient(&g, &p, lower, upper).amax() <= opts.gtol {
            return Ok(LmReport { params: p, cost, evaluations });
        }

        let a = j.transpose() * &j;
        let scale = a.diagonal().map(|d| d.max(1e-12));
        let mut damping = *mu.get_or_insert_with(|| 1e-3 * scale.max());

        loop {
            if evaluations >= opts.max_evaluations {
                return Err(LmFailure::BudgetExhausted { evaluations });
            }
            if !damping.is_finite() {
                return Err(LmFailure::NonFinite);
            }

            let mut damped = a.clone();
            for i in 0..damped.nrows() {
                damped[(i, i)] += damping * scale[i];
            }
            let Some(chol) = damped.cholesky() else {
                damping *= nu;
                nu *= 2.0;
                continue;
            };
            let delta = chol.solve(&(-g.clone()));

            let candidate = project(&p + &delta, lower, upper);
            let step = &candidate - &p;
            if step.norm() <= opts.xtol * (opts.xtol + p.norm()) {
                return Ok(LmReport { params: p, cost, evaluations });
            }

            let r_new = problem.residuals(&candidate);
            evaluations += 1;
            let cost_new = 0.5 * r_new.norm_squared();
            let predicted = -g.dot(&step) - 0.5 * step.dot(&(&a * &step));

            if cost_new.is_finite() && cost_new < cost && predicted > 0.0 {
                let actual = cost - cost_new;
                let rho = actual / predicted;
                let previous = cost;

                p = candidate;
                r = r_new;
                cost = cost_new;
                damping *= (1.0_f64 / 3.0).max(1.0 - (2.0 * rho - 1.0).powi(3));
                nu = 2.0;
                mu = Some(damping);

                if actual <= opts.ftol * previous && predicted <= opts.ftol * previous {
                    return Ok(LmReport { params: p, cost, evaluations });
                }
                break;
            }

            damping *= nu;
            nu *= 2.0;
        }
    }
}

fn project(mut p: DVector<f64>, lower: &DVector<f64>, upper: &DVector<f64>) -> DVector<f64> {
    for i in 0..p.len() {
        p[i] = p[i].max(lower[i]).min(upper[i]);
    }
    p
}

/// Zero the gradient components that point out of an active bound.
fn projected_gradient(
    g: &DVector<f64>,
    p: &DVector<f64>,
    lower: &DVector<f64>,
    upper: &DVector<f64>,
) -> DVector<f64> {
    let mut out = g.clone();
    for i in 0..g.len() {
        let blocked_low = p[i] <= lower[i] && g[i] > 0.0;
        let blocked_high = p[i] >= upper[i] && g[i] < 0.0;
        if blocked_low || blocked_high {
            out[i] = 0.0;
        }
    }
    out
}
