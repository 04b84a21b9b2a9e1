//! Standard errors, Wald z statistics, and the printed model summary.
//!
//! Output is for human inspection only: the analyst reads the coefficient
//! table, nothing downstream computes on it.

use serde::Serialize;

use super::irls::FittedModel;

/// One row of the coefficient table.
#[derive(Debug, Clone, Serialize)]
pub struct Coefficient {
    pub term: String,
    pub estimate: f64,
    pub std_error: f64,
    pub z_value: f64,
    pub p_value: f64,
}

impl Coefficient {
    /// R-style significance marker.
    pub fn significance(&self) -> &'static str {
        if self.p_value < 0.001 {
            "***"
        } else if self.p_value < 0.01 {
            "**"
        } else if self.p_value < 0.05 {
            "*"
        } else if self.p_value < 0.1 {
            "."
        } else {
            ""
        }
    }
}

/// Per-term estimates, standard errors, and two-sided Wald p-values.
pub fn coefficients(model: &FittedModel) -> Vec<Coefficient> {
    model
        .terms
        .iter()
        .enumerate()
        .map(|(i, term)| {
            let estimate = model.estimates[i];
            let std_error = model.covariance[[i, i]].max(0.0).sqrt();
            let z_value = if std_error > 0.0 { estimate / std_error } else { f64::NAN };
            let p_value = if z_value.is_finite() {
                2.0 * (1.0 - normal_cdf(z_value.abs()))
            } else {
                f64::NAN
            };
            Coefficient {
                term: term.clone(),
                estimate,
                std_error,
                z_value,
                p_value,
            }
        })
        .collect()
}

/// Render the fitted model as an R-style summary block.
pub fn summary(model: &FittedModel) -> String {
    let mut out = String::new();
    out.push_str("Coefficients:\n");
    out.push_str(&format!(
        "{:<22} {:>10} {:>11} {:>8} {:>10}\n",
        "", "Estimate", "Std. Error", "z value", "Pr(>|z|)"
    ));
    for c in coefficients(model) {
        out.push_str(&format!(
            "{:<22} {:>10.4} {:>11.4} {:>8.3} {:>10} {}\n",
            c.term,
            c.estimate,
            c.std_error,
            c.z_value,
            format_pvalue(c.p_value),
            c.significance(),
        ));
    }
    out.push_str("---\n");
    out.push_str("Signif. codes: 0 '***' 0.001 '**' 0.01 '*' 0.05 '.' 0.1 ' ' 1\n\n");
    out.push_str(&format!(
        "    Null deviance: {:.2} on {} degrees of freedom\n",
        model.null_deviance,
        model.n_obs - 1
    ));
    out.push_str(&format!(
        "Residual deviance: {:.2} on {} degrees of freedom\n",
        model.deviance,
        model.n_obs.saturating_sub(model.terms.len())
    ));
    out.push_str(&format!("IRLS iterations: {}\n", model.iterations));
    if model.n_dropped > 0 {
        out.push_str(&format!(
            "({} observations deleted due to missingness)\n",
            model.n_dropped
        ));
    }
    out
}

fn format_pvalue(p: f64) -> String {
    if !p.is_finite() {
        "NA".to_string()
    } else if p < 1e-4 {
        format!("{:.1e}", p)
    } else {
        format!("{:.4}", p)
    }
}

/// Standard normal CDF via the Abramowitz-Stegun 7.1.26 erf
/// approximation (absolute error under 1.5e-7).
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}
