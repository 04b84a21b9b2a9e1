//! # l2survey - Second-language survey wrangling and modeling
//!
//! l2survey reshapes a wide second-language-acquisition survey export into
//! tidy long form, joins question metadata, aggregates per-subject scores,
//! and fits a logistic regression of answer correctness on learner
//! covariates.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────┐   ┌──────────┐   ┌────────┐   ┌───────────┐   ┌─────────┐
//! │ Survey CSV  │──▶│ Filter  │──▶│ Reshape  │──▶│  Join  │──▶│ Aggregate │──▶│ GLM fit │
//! │ (auto-enc)  │   │ (langs) │   │ (w→long) │   │ (meta) │   │ (totals)  │   │ (logit) │
//! └─────────────┘   └─────────┘   └──────────┘   └────────┘   └───────────┘   └─────────┘
//! ```
//!
//! Frames flow strictly downstream; every stage returns a new frame and
//! never mutates its input.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use l2survey::{run_analysis, AnalysisOptions};
//! use std::path::Path;
//!
//! fn main() {
//!     let report = run_analysis(
//!         Path::new("survey.csv"),
//!         Path::new("questions.csv"),
//!         &AnalysisOptions::default(),
//!     ).unwrap();
//!     println!("{}", report.model_summary);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`frame`] - The in-memory table of labeled columns
//! - [`models`] - Domain models (Language, Participant, Observation)
//! - [`parser`] - CSV loading with auto-detection
//! - [`wrangle`] - Filter, reshape, join, aggregate, pipeline
//! - [`glm`] - Logistic regression (design, IRLS, inference)
//! - [`report`] - Text rendering of tables and the model summary
//! - [`logs`] - Leveled progress logging

// Core modules
pub mod error;
pub mod frame;
pub mod models;

// Loading
pub mod parser;

// Wrangling
pub mod wrangle;

// Modeling
pub mod glm;

// Presentation
pub mod report;

// Logging
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CsvError,
    CsvResult,
    ModelError,
    ModelResult,
    PipelineError,
    PipelineResult,
    WrangleError,
    WrangleResult,
};

// =============================================================================
// Re-exports - Frame
// =============================================================================

pub use frame::{cell_num, cell_str, Frame};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Covariate,
    Language,
    Observation,
    Participant,
    QuestionInfo,
    SubjectScore,
    SurveyColumns,
};

// =============================================================================
// Re-exports - Loading
// =============================================================================

pub use parser::{
    detect_delimiter,
    detect_encoding,
    load_bytes,
    load_frame,
    load_frame_with_delimiter,
    LoadedFrame,
};

// =============================================================================
// Re-exports - Wrangling
// =============================================================================

pub use wrangle::{
    analyze_frames,
    ensure_binary_answers,
    group_mean,
    group_sum,
    inner_join,
    pivot_longer,
    pivot_wider,
    retain_languages,
    retain_matching,
    run_analysis,
    with_duration,
    AnalysisOptions,
    AnalysisReport,
    JoinKeys,
    JoinOutcome,
    QuestionPattern,
};

// =============================================================================
// Re-exports - Modeling
// =============================================================================

pub use glm::{fit_logistic, Coefficient, FittedModel, IrlsConfig, ModelSpec};

/// Fit the logistic model described by `spec` against a long frame.
pub use glm::fit;
