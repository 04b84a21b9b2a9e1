//! Error types for the l2survey analysis pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`CsvError`] - CSV loading and decoding errors
//! - [`WrangleError`] - filter/reshape/join/aggregate errors
//! - [`ModelError`] - GLM construction and fitting errors
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across stage boundaries.

use thiserror::Error;

// =============================================================================
// CSV Loading Errors
// =============================================================================

/// Errors while loading a delimited survey file.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// The requested delimiter cannot be used by the byte-oriented reader.
    #[error("Delimiter '{0}' is not a single-byte ASCII character")]
    InvalidDelimiter(char),

    /// Malformed CSV content.
    #[error("Invalid CSV on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No header row found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Wrangling Errors
// =============================================================================

/// Errors during filter, reshape, join, or aggregation.
#[derive(Debug, Error)]
pub enum WrangleError {
    /// A stage referenced a column the frame does not have.
    #[error("Missing column '{column}' in {stage} stage")]
    MissingColumn { stage: &'static str, column: String },

    /// The wide table repeats a participant identifier.
    #[error("Duplicate participant identifier: {0}")]
    DuplicateIdentifier(String),

    /// The metadata table repeats a question key.
    #[error("Duplicate question key in metadata: {0}")]
    DuplicateQuestionKey(String),

    /// An answer cell was not a 0/1 indicator.
    #[error("Non-binary answer value '{value}' for participant {id}")]
    NonBinaryAnswer { id: String, value: String },
}

// =============================================================================
// Model Errors
// =============================================================================

/// Errors during design-matrix construction or IRLS fitting.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A covariate referenced a column missing from the model frame.
    #[error("Missing covariate column '{0}' in model frame")]
    MissingCovariate(String),

    /// No observations matched the target question.
    #[error("No observations for question '{0}'")]
    EmptyModelFrame(String),

    /// The outcome column contained a value other than 0 or 1.
    #[error("Non-binary outcome value: {0}")]
    NonBinaryOutcome(String),

    /// The weighted normal equations were singular (rank-deficient design).
    #[error("Design matrix is rank-deficient; cannot solve normal equations")]
    Singular,

    /// IRLS failed to converge within the iteration budget.
    #[error("IRLS did not converge after {0} iterations")]
    NotConverged(usize),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::wrangle::pipeline::run_analysis`].
/// It wraps all lower-level errors and adds pipeline-specific variants.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV loading error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Wrangling error.
    #[error("Wrangle error: {0}")]
    Wrangle(#[from] WrangleError),

    /// Model error.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// IO error outside of CSV loading (e.g. writing reports).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The survey file parsed but contained no data rows.
    #[error("No survey rows to analyze")]
    EmptyInput,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV loading.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for wrangling stages.
pub type WrangleResult<T> = Result<T, WrangleError>;

/// Result type for model fitting.
pub type ModelResult<T> = Result<T, ModelError>;

/// Result type for pipeline orchestration.
pub type PipelineResult<T> = Result<T, PipelineError>;
