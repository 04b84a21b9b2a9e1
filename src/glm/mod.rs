//! Binomial generalized linear model (logistic regression).
//!
//! This module handles the model-fit stage:
//! - Design: covariate selection and dummy coding with an explicit baseline
//! - IRLS: the fitting algorithm
//! - Inference: standard errors, z statistics, and the printed summary

pub mod design;
pub mod inference;
pub mod irls;

pub use design::{build_design, Design, ModelSpec};
pub use inference::{coefficients, normal_cdf, summary, Coefficient};
pub use irls::{fit_logistic, FittedModel, IrlsConfig};

use crate::error::ModelResult;
use crate::frame::Frame;

/// Fit a logistic regression for `spec` against a long observation frame.
pub fn fit(frame: &Frame, spec: &ModelSpec) -> ModelResult<FittedModel> {
    let design = build_design(frame, spec)?;
    fit_logistic(&design, IrlsConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::test_util::{frame_of, n, v};
    use crate::models::{Covariate, Language};
    use serde_json::Value;

    fn long_row(id: i64, lang: &str, correct: i64) -> Vec<Value> {
        vec![n(id), v(lang), n(30), n(10), v("q1"), n(correct)]
    }

    const HEADERS: [&str; 6] =
        ["id", "native_language", "age", "age_of_english", "item", "correct"];

    #[test]
    fn test_separated_categories_coefficient_sign() {
        // Spanish always answers 1, French always 0: the French contrast
        // must come out negative.
        let rows: Vec<Vec<Value>> = (1..=5)
            .map(|i| long_row(i, "Spanish", 1))
            .chain((6..=10).map(|i| long_row(i, "French", 0)))
            .collect();
        let frame = frame_of(&HEADERS, &rows);

        let spec = ModelSpec::new("q1").with_covariates(vec![Covariate::Language {
            reference: Language::Spanish,
        }]);
        let model = fit(&frame, &spec).unwrap();

        let contrast = model.coefficient("language[French]").unwrap();
        assert!(contrast < 0.0);
        assert!(model.coefficient("(Intercept)").unwrap() > 0.0);
    }

    #[test]
    fn test_mixed_accuracy_coefficient_sign() {
        // French answers correctly 4/5 of the time, Spanish 1/5.
        let rows: Vec<Vec<Value>> = (1..=5)
            .map(|i| long_row(i, "Spanish", if i == 1 { 1 } else { 0 }))
            .chain((6..=10).map(|i| long_row(i, "French", if i == 6 { 0 } else { 1 })))
            .collect();
        let frame = frame_of(&HEADERS, &rows);

        let spec = ModelSpec::new("q1").with_covariates(vec![Covariate::Language {
            reference: Language::Spanish,
        }]);
        let model = fit(&frame, &spec).unwrap();

        assert!(model.coefficient("language[French]").unwrap() > 0.0);
    }

    #[test]
    fn test_swapping_covariates_keeps_fit_procedure() {
        let rows: Vec<Vec<Value>> = (1..=6)
            .map(|i| {
                vec![
                    n(i),
                    v(if i % 2 == 0 { "Spanish" } else { "French" }),
                    n(20 + i),
                    n(10),
                    v("q1"),
                    n(i % 2),
                ]
            })
            .collect();
        let frame = frame_of(&HEADERS, &rows);

        let with_language = ModelSpec::new("q1").with_covariates(vec![Covariate::Language {
            reference: Language::Spanish,
        }]);
        let with_duration =
            ModelSpec::new("q1").with_covariates(vec![Covariate::LearningDuration]);

        let a = fit(&frame, &with_language).unwrap();
        let b = fit(&frame, &with_duration).unwrap();
        assert_eq!(a.terms.len(), 2);
        assert_eq!(b.terms, vec!["(Intercept)", "years_learning"]);
        assert_eq!(a.n_obs, b.n_obs);
    }
}
