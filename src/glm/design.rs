//! Model specification and design-matrix construction.
//!
//! A [`ModelSpec`] names the target question and the covariate set; the
//! fitting procedure never changes, so analyses swap covariate sets
//! freely. The categorical language covariate is dummy-coded against its
//! explicit reference level: fitted coefficients are contrasts against
//! that baseline.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::frame::{cell_num, Frame};
use crate::models::{Covariate, Language, Observation, SurveyColumns};

/// Specification of one logistic-regression analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Target question key; only observations of this question enter the fit.
    pub question: String,
    /// Covariate set, applied in order.
    pub covariates: Vec<Covariate>,
    /// Column holding the question key in the long frame.
    pub item_col: String,
    /// Column holding the binary outcome.
    pub answer_col: String,
    /// Column holding the per-subject total score (for
    /// [`Covariate::TotalScore`]).
    pub total_col: String,
    /// Wide-table column mapping carried through the reshape.
    pub columns: SurveyColumns,
}

impl ModelSpec {
    /// Default analysis for one question: language (Spanish baseline) plus
    /// learning duration.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            covariates: vec![
                Covariate::Language { reference: Language::baseline() },
                Covariate::LearningDuration,
            ],
            item_col: "item".to_string(),
            answer_col: "correct".to_string(),
            total_col: "total".to_string(),
            columns: SurveyColumns::default(),
        }
    }

    /// Replace the covariate set.
    pub fn with_covariates(mut self, covariates: Vec<Covariate>) -> Self {
        self.covariates = covariates;
        self
    }
}

/// A built design matrix with its outcome vector and term names.
#[derive(Debug, Clone)]
pub struct Design {
    /// n x p matrix, first column the intercept.
    pub x: Array2<f64>,
    /// Binary outcome vector.
    pub y: Array1<f64>,
    /// Term names, aligned with the columns of `x`.
    pub terms: Vec<String>,
    /// Rows dropped for missing outcome or covariate values.
    pub dropped: usize,
}

/// One decoded model row.
struct ModelRow {
    observation: Observation,
    total: Option<f64>,
}

/// Build the design matrix for `spec` from a long observation frame.
///
/// Rows are restricted to the target question. Rows with a missing
/// outcome or a missing value for any requested covariate are dropped
/// (and counted); an all-dropped or empty restriction is fatal.
pub fn build_design(frame: &Frame, spec: &ModelSpec) -> ModelResult<Design> {
    if spec.covariates.iter().any(|c| matches!(c, Covariate::TotalScore))
        && !frame.has_column(&spec.total_col)
    {
        return Err(ModelError::MissingCovariate(spec.total_col.clone()));
    }

    let mut rows: Vec<ModelRow> = Vec::new();
    let mut dropped = 0usize;
    let mut restricted = 0usize;

    for raw in frame.rows() {
        let Some(obs) =
            Observation::from_row(raw, &spec.columns, &spec.item_col, &spec.answer_col)
        else {
            continue;
        };
        if obs.item != spec.question {
            continue;
        }
        restricted += 1;

        if obs.correct != 0.0 && obs.correct != 1.0 {
            return Err(ModelError::NonBinaryOutcome(obs.correct.to_string()));
        }

        let total = raw.get(&spec.total_col).and_then(cell_num);
        let row = ModelRow { observation: obs, total };
        if complete(&row, &spec.covariates) {
            rows.push(row);
        } else {
            dropped += 1;
        }
    }

    if restricted == 0 || rows.is_empty() {
        return Err(ModelError::EmptyModelFrame(spec.question.clone()));
    }

    // Dummy levels: non-reference languages actually present, in ALL order.
    let mut terms = vec!["(Intercept)".to_string()];
    let mut dummy_levels: Vec<(usize, Vec<Language>)> = Vec::new();
    for (ci, covariate) in spec.covariates.iter().enumerate() {
        match covariate {
            Covariate::Language { reference } => {
                let present: Vec<Language> = Language::ALL
                    .into_iter()
                    .filter(|lang| {
                        lang != reference
                            && rows.iter().any(|r| r.observation.language == *lang)
                    })
                    .collect();
                for lang in &present {
                    terms.push(format!("language[{}]", lang));
                }
                dummy_levels.push((ci, present));
            }
            Covariate::ExposureAge => terms.push("exposure_age".to_string()),
            Covariate::LearningDuration => terms.push("years_learning".to_string()),
            Covariate::TotalScore => terms.push("total_score".to_string()),
        }
    }

    let n = rows.len();
    let p = terms.len();
    let mut x = Array2::<f64>::zeros((n, p));
    let mut y = Array1::<f64>::zeros(n);

    for (i, row) in rows.iter().enumerate() {
        y[i] = row.observation.correct;
        x[[i, 0]] = 1.0;
        let mut j = 1;
        for (ci, covariate) in spec.covariates.iter().enumerate() {
            match covariate {
                Covariate::Language { .. } => {
                    let levels = &dummy_levels
                        .iter()
                        .find(|(idx, _)| *idx == ci)
                        .expect("dummy levels recorded per language covariate")
                        .1;
                    for lang in levels.iter() {
                        x[[i, j]] = if row.observation.language == *lang { 1.0 } else { 0.0 };
                        j += 1;
                    }
                }
                Covariate::ExposureAge => {
                    x[[i, j]] = row.observation.exposure_age.unwrap_or_default();
                    j += 1;
                }
                Covariate::LearningDuration => {
                    x[[i, j]] = row.observation.learning_duration().unwrap_or_default();
                    j += 1;
                }
                Covariate::TotalScore => {
                    x[[i, j]] = row.total.unwrap_or_default();
                    j += 1;
                }
            }
        }
    }

    Ok(Design { x, y, terms, dropped })
}

/// Does the row carry every value the covariate set needs?
fn complete(row: &ModelRow, covariates: &[Covariate]) -> bool {
    covariates.iter().all(|covariate| match covariate {
        Covariate::Language { .. } => true,
        Covariate::ExposureAge => row.observation.exposure_age.is_some(),
        Covariate::LearningDuration => row.observation.learning_duration().is_some(),
        Covariate::TotalScore => row.total.is_some(),
    })
}
