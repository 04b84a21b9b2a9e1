//! High-level analysis pipeline.
//!
//! Combines every stage: load, filter, reshape, join, aggregate, model
//! fit, and report rendering. Each stage logs what it kept and what it
//! dropped so the analyst can sanity-check intermediate output, and each
//! stage is a pure function of the frames it receives.
//!
//! # Example
//!
//! ```rust,ignore
//! use l2survey::{run_analysis, AnalysisOptions};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = run_analysis(
//!         Path::new("survey.csv"),
//!         Path::new("questions.csv"),
//!         &AnalysisOptions::default(),
//!     )?;
//!     println!("{}", report.model_summary);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};
use crate::frame::Frame;
use crate::glm::{self, Coefficient, ModelSpec};
use crate::logs::{log_info, log_success, log_warning};
use crate::models::{participants, question_infos, Covariate, Language, SurveyColumns};
use crate::parser::load_frame;
use crate::report;

use super::aggregate::{group_mean, group_sum, with_duration};
use super::filter::{retain_languages, retain_matching};
use super::join::{inner_join, JoinKeys};
use super::reshape::{ensure_binary_answers, pivot_longer, QuestionPattern};

/// Options for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Language allow-list for the filter stage.
    pub languages: Vec<Language>,

    /// Wide-table column names.
    pub columns: SurveyColumns,

    /// Prefix naming the question columns to reshape.
    pub question_prefix: String,

    /// Name of the question-key column produced by the reshape.
    pub item_col: String,

    /// Name of the answer column produced by the reshape.
    pub answer_col: String,

    /// Key column of the question-metadata file (differs from
    /// `item_col` by design; the join maps between them).
    pub metadata_key_col: String,

    /// Question key the accuracy curve and the model fit target.
    pub target_question: String,

    /// Covariate set for the logistic fit.
    pub covariates: Vec<Covariate>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            languages: Language::ALL.to_vec(),
            columns: SurveyColumns::default(),
            question_prefix: "q".to_string(),
            item_col: "item".to_string(),
            answer_col: "correct".to_string(),
            metadata_key_col: "question".to_string(),
            target_question: "q1".to_string(),
            covariates: vec![
                Covariate::Language { reference: Language::baseline() },
                Covariate::LearningDuration,
            ],
        }
    }
}

/// Result of a complete analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Rows in the wide survey file.
    pub wide_rows: usize,

    /// Rows surviving the language filter.
    pub filtered_rows: usize,

    /// Long observation rows produced by the reshape.
    pub long_rows: usize,

    /// Observation rows matched against question metadata.
    pub matched_rows: usize,

    /// Observation rows dropped by the inner join.
    pub dropped_observations: usize,

    /// Metadata rows that matched no observation.
    pub unused_metadata_rows: usize,

    /// Language frequencies, ranked descending.
    pub language_frequencies: Vec<(String, usize)>,

    /// Per-subject total scores.
    pub subject_totals: Frame,

    /// Accuracy by (language, learning duration) for the target question.
    pub accuracy_curve: Frame,

    /// Coefficient table of the fitted model.
    pub coefficients: Vec<Coefficient>,

    /// Rendered model summary for display.
    pub model_summary: String,
}

/// Run the full analysis from the two input files.
pub fn run_analysis(
    survey_path: &Path,
    questions_path: &Path,
    options: &AnalysisOptions,
) -> PipelineResult<AnalysisReport> {
    log_info("Reading survey file...");
    let survey = load_frame(survey_path)?;
    log_success(format!("Detected encoding: {}", survey.encoding));
    log_success(format!("Detected delimiter: '{}'", format_delimiter(survey.delimiter)));
    log_success(format!("Read {} rows, {} columns", survey.frame.len(), survey.frame.headers().len()));

    log_info("Reading question metadata...");
    let questions = load_frame(questions_path)?;
    log_success(format!("Read {} metadata rows", questions.frame.len()));

    analyze_frames(&survey.frame, &questions.frame, options)
}

/// Run the analysis on already-loaded frames.
pub fn analyze_frames(
    survey: &Frame,
    questions: &Frame,
    options: &AnalysisOptions,
) -> PipelineResult<AnalysisReport> {
    if survey.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    let cols = &options.columns;

    // Stage 1: language filter. The reshape multiplies row count by the
    // question-column count, so restricting the language set here keeps
    // the long table tractable.
    log_info("Filtering to retained languages...");
    let filtered = retain_languages(survey, &cols.language, &options.languages)?;
    log_success(format!("Kept {} of {} participants", filtered.len(), survey.len()));

    // Invariant checks: unique participant ids, unique question keys.
    let subjects = participants(&filtered, cols)?;
    let infos = question_infos(questions, &options.metadata_key_col)?;
    log_info(format!("{} participants, {} documented questions", subjects.len(), infos.len()));

    let language_frequencies = report::frequency_table(&filtered, &cols.language);

    // Stage 2: wide -> long reshape.
    log_info("Reshaping answer columns to long form...");
    let pattern = QuestionPattern::new(&options.question_prefix);
    let long = pivot_longer(&filtered, &pattern, &cols.id, &options.item_col, &options.answer_col)?;
    ensure_binary_answers(&long, &cols.id, &options.answer_col)?;
    log_success(format!("{} observations", long.len()));

    // Stage 3: join against question metadata. Non-matching rows drop
    // silently by design; surface the counts.
    log_info("Joining question metadata...");
    let keys = JoinKeys::new(options.item_col.clone(), options.metadata_key_col.clone());
    let joined = inner_join(&long, questions, &keys)?;
    log_success(format!("{} matched observations", joined.matched));
    if joined.dropped_left > 0 {
        log_warning(format!(
            "{} observations dropped: no metadata for their question key",
            joined.dropped_left
        ));
    }
    if joined.dropped_right > 0 {
        log_warning(format!(
            "{} metadata rows matched no observation",
            joined.dropped_right
        ));
    }

    // Stage 4a: per-subject totals.
    log_info("Summing per-subject scores...");
    let subject_totals = group_sum(
        &joined.frame,
        &[cols.id.as_str(), cols.language.as_str()],
        &options.answer_col,
        "total",
    )?;

    // Re-join totals onto the observations by participant identifier.
    let totals_by_id = subject_totals
        .select(&[cols.id.as_str(), "total"])
        .renamed(&cols.id, "participant");
    let rejoin = JoinKeys::new(cols.id.clone(), "participant");
    let observations = inner_join(&joined.frame, &totals_by_id, &rejoin)?.frame;

    // Stage 4b: accuracy by experience for the target question.
    log_info(format!("Computing accuracy curve for {}...", options.target_question));
    let with_years = with_duration(&observations, &cols.age, &cols.exposure, "years_learning")?;
    let target = retain_matching(&with_years, &options.item_col, &options.target_question)?;
    let accuracy_curve = group_mean(
        &target,
        &[cols.language.as_str(), "years_learning"],
        &options.answer_col,
        "accuracy",
    )?;

    // Stage 5: logistic fit.
    log_info(format!("Fitting logistic model for {}...", options.target_question));
    let spec = ModelSpec {
        question: options.target_question.clone(),
        covariates: options.covariates.clone(),
        item_col: options.item_col.clone(),
        answer_col: options.answer_col.clone(),
        total_col: "total".to_string(),
        columns: cols.clone(),
    };
    let model = glm::fit(&with_years, &spec)?;
    log_success(format!(
        "Converged in {} iterations ({} observations)",
        model.iterations, model.n_obs
    ));

    Ok(AnalysisReport {
        wide_rows: survey.len(),
        filtered_rows: filtered.len(),
        long_rows: long.len(),
        matched_rows: joined.matched,
        dropped_observations: joined.dropped_left,
        unused_metadata_rows: joined.dropped_right,
        language_frequencies,
        subject_totals,
        accuracy_curve,
        coefficients: glm::coefficients(&model),
        model_summary: glm::summary(&model),
    })
}

/// Format delimiter for display
fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
