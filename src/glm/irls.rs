//! Binomial GLM fitting via iteratively reweighted least squares.
//!
//! Logit link only: at each step the working response
//! `z = eta + (y - mu) / w` with weights `w = mu (1 - mu)` is regressed
//! onto the design matrix by solving the weighted normal equations
//! `X'WX beta = X'Wz` with a Cholesky factorization. Convergence is
//! declared when the deviance change falls under the tolerance; a
//! non-positive pivot in the factorization means a rank-deficient design.

use ndarray::{Array1, Array2};

use crate::error::{ModelError, ModelResult};

use super::design::Design;

/// IRLS iteration controls.
#[derive(Debug, Clone, Copy)]
pub struct IrlsConfig {
    /// Maximum number of reweighting iterations.
    pub max_iter: usize,
    /// Absolute deviance-change tolerance.
    pub tolerance: f64,
}

impl Default for IrlsConfig {
    fn default() -> Self {
        Self { max_iter: 50, tolerance: 1e-8 }
    }
}

/// A converged logistic fit.
#[derive(Debug, Clone)]
pub struct FittedModel {
    /// Term names aligned with `estimates`.
    pub terms: Vec<String>,
    /// Coefficient estimates on the log-odds scale.
    pub estimates: Array1<f64>,
    /// Inverse of the final weighted information matrix.
    pub covariance: Array2<f64>,
    /// Residual deviance at convergence.
    pub deviance: f64,
    /// Deviance of the intercept-only null model.
    pub null_deviance: f64,
    /// Iterations used.
    pub iterations: usize,
    /// Observations entering the fit.
    pub n_obs: usize,
    /// Rows dropped during design construction.
    pub n_dropped: usize,
}

impl FittedModel {
    /// Estimate for one term, if present.
    pub fn coefficient(&self, term: &str) -> Option<f64> {
        self.terms
            .iter()
            .position(|t| t == term)
            .map(|i| self.estimates[i])
    }
}

// Probabilities are clamped away from 0/1 so weights and the working
// response stay finite under (near-)separation.
const MU_FLOOR: f64 = 1e-10;

fn sigmoid(eta: f64) -> f64 {
    let mu = 1.0 / (1.0 + (-eta).exp());
    mu.clamp(MU_FLOOR, 1.0 - MU_FLOOR)
}

fn binomial_deviance(y: &Array1<f64>, mu: &Array1<f64>) -> f64 {
    let mut dev = 0.0;
    for (&yi, &mui) in y.iter().zip(mu.iter()) {
        dev -= 2.0 * (yi * mui.ln() + (1.0 - yi) * (1.0 - mui).ln());
    }
    dev
}

/// Fit a logistic regression to a built design.
pub fn fit_logistic(design: &Design, config: IrlsConfig) -> ModelResult<FittedModel> {
    let x = &design.x;
    let y = &design.y;
    let n = x.nrows();
    let p = x.ncols();

    let mut beta = Array1::<f64>::zeros(p);
    let mut deviance = f64::INFINITY;
    let mut info = Array2::<f64>::zeros((p, p));

    let mut converged_at = None;
    for iteration in 1..=config.max_iter {
        let eta = x.dot(&beta);
        let mu = eta.mapv(sigmoid);
        let weights = mu.mapv(|m| m * (1.0 - m));

        // Working response z = eta + (y - mu) / w
        let mut z = Array1::<f64>::zeros(n);
        for i in 0..n {
            z[i] = eta[i] + (y[i] - mu[i]) / weights[i];
        }

        // X'WX and X'Wz
        info = Array2::<f64>::zeros((p, p));
        let mut xtwz = Array1::<f64>::zeros(p);
        for i in 0..n {
            let w = weights[i];
            for a in 0..p {
                let xa = x[[i, a]];
                xtwz[a] += w * xa * z[i];
                for b in a..p {
                    info[[a, b]] += w * xa * x[[i, b]];
                }
            }
        }
        for a in 0..p {
            for b in 0..a {
                info[[a, b]] = info[[b, a]];
            }
        }

        let chol = cholesky(&info).ok_or(ModelError::Singular)?;
        beta = solve_with_cholesky(&chol, &xtwz);

        let new_deviance = binomial_deviance(y, &x.dot(&beta).mapv(sigmoid));
        let change = (deviance - new_deviance).abs();
        deviance = new_deviance;
        if change < config.tolerance {
            converged_at = Some(iteration);
            break;
        }
    }

    let iterations = converged_at.ok_or(ModelError::NotConverged(config.max_iter))?;

    let chol = cholesky(&info).ok_or(ModelError::Singular)?;
    let covariance = invert_with_cholesky(&chol);

    // Null model: intercept fixed at logit of the overall mean.
    let ybar = y.sum() / n as f64;
    let null_mu = Array1::from_elem(n, ybar.clamp(MU_FLOOR, 1.0 - MU_FLOOR));
    let null_deviance = binomial_deviance(y, &null_mu);

    Ok(FittedModel {
        terms: design.terms.clone(),
        estimates: beta,
        covariance,
        deviance,
        null_deviance,
        iterations,
        n_obs: n,
        n_dropped: design.dropped,
    })
}

/// Lower-triangular Cholesky factor of a symmetric positive-definite
/// matrix, or `None` when a pivot is not positive (rank deficiency).
fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let p = a.nrows();
    let mut l = Array2::<f64>::zeros((p, p));
    for i in 0..p {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                l[[i, i]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }
    Some(l)
}

/// Solve `L L' x = b` by forward then back substitution.
fn solve_with_cholesky(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let p = l.nrows();

    let mut w = Array1::<f64>::zeros(p);
    for i in 0..p {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * w[k];
        }
        w[i] = sum / l[[i, i]];
    }

    let mut x = Array1::<f64>::zeros(p);
    for i in (0..p).rev() {
        let mut sum = w[i];
        for k in (i + 1)..p {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }
    x
}

/// Invert `L L'` column by column against the identity.
fn invert_with_cholesky(l: &Array2<f64>) -> Array2<f64> {
    let p = l.nrows();
    let mut inv = Array2::<f64>::zeros((p, p));
    for j in 0..p {
        let mut e = Array1::<f64>::zeros(p);
        e[j] = 1.0;
        let col = solve_with_cholesky(l, &e);
        for i in 0..p {
            inv[[i, j]] = col[i];
        }
    }
    inv
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn design_of(x: Array2<f64>, y: Array1<f64>) -> Design {
        let terms = (0..x.ncols())
            .map(|i| if i == 0 { "(Intercept)".to_string() } else { format!("x{}", i) })
            .collect();
        Design { x, y, terms, dropped: 0 }
    }

    #[test]
    fn test_cholesky_solves_spd_system() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let b = array![2.0, 1.0];
        let l = cholesky(&a).unwrap();
        let x = solve_with_cholesky(&l, &b);
        // a * x should reproduce b
        let back = a.dot(&x);
        assert!((back[0] - b[0]).abs() < 1e-12);
        assert!((back[1] - b[1]).abs() < 1e-12);
    }

    #[test]
    fn test_cholesky_rejects_rank_deficient() {
        // Second column is twice the first
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        assert!(cholesky(&a).is_none());
    }

    #[test]
    fn test_invert_matches_identity() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let l = cholesky(&a).unwrap();
        let inv = invert_with_cholesky(&l);
        let id = a.dot(&inv);
        assert!((id[[0, 0]] - 1.0).abs() < 1e-12);
        assert!((id[[1, 1]] - 1.0).abs() < 1e-12);
        assert!(id[[0, 1]].abs() < 1e-12);
    }

    #[test]
    fn test_intercept_only_fit_recovers_log_odds() {
        // 30 ones, 10 zeros: intercept = logit(0.75) = ln(3)
        let n = 40;
        let x = Array2::from_elem((n, 1), 1.0);
        let mut y = Array1::zeros(n);
        for i in 0..30 {
            y[i] = 1.0;
        }
        let model = fit_logistic(&design_of(x, y), IrlsConfig::default()).unwrap();
        assert!((model.estimates[0] - 3.0f64.ln()).abs() < 1e-6);
        assert_eq!(model.n_obs, 40);
    }

    #[test]
    fn test_balanced_outcome_gives_zero_intercept() {
        let x = Array2::from_elem((10, 1), 1.0);
        let y = array![1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        let model = fit_logistic(&design_of(x, y), IrlsConfig::default()).unwrap();
        assert!(model.estimates[0].abs() < 1e-8);
        assert!((model.deviance - model.null_deviance).abs() < 1e-8);
    }

    #[test]
    fn test_dummy_coefficient_sign_separates_groups() {
        // Group A (dummy 0) mostly wrong, group B (dummy 1) mostly right:
        // the dummy coefficient must come out positive.
        let mut x = Array2::zeros((20, 2));
        let mut y = Array1::zeros(20);
        for i in 0..20 {
            x[[i, 0]] = 1.0;
            if i >= 10 {
                x[[i, 1]] = 1.0;
            }
        }
        for i in 0..2 {
            y[i] = 1.0; // 2/10 correct in group A
        }
        for i in 10..19 {
            y[i] = 1.0; // 9/10 correct in group B
        }
        let model = fit_logistic(&design_of(x, y), IrlsConfig::default()).unwrap();
        assert!(model.estimates[1] > 0.0);
        // logit(0.9) - logit(0.2) = 2.197 + 1.386
        assert!((model.estimates[1] - (2.197224 + 1.386294)).abs() < 1e-3);
    }

    #[test]
    fn test_rank_deficient_design_is_singular() {
        // All-zero covariate column: information matrix has a zero pivot
        let mut x = Array2::zeros((8, 2));
        let y = array![1.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0];
        for i in 0..8 {
            x[[i, 0]] = 1.0;
        }
        let err = fit_logistic(&design_of(x, y), IrlsConfig::default()).unwrap_err();
        assert!(matches!(err, ModelError::Singular));
    }

    #[test]
    fn test_iteration_budget_respected() {
        let x = Array2::from_elem((4, 1), 1.0);
        let y = array![1.0, 0.0, 1.0, 0.0];
        let config = IrlsConfig { max_iter: 1, tolerance: 1e-12 };
        let err = fit_logistic(&design_of(x, y), config).unwrap_err();
        assert!(matches!(err, ModelError::NotConverged(1)));
    }
}
