//! Data-wrangling stages.
//!
//! This module handles the frame transformations between loading and
//! modeling:
//! - Filter: language allow-list
//! - Reshape: wide answer columns to long observations
//! - Join: observations against question metadata
//! - Aggregate: per-subject totals and accuracy curves
//! - Pipeline: the full analysis orchestration

pub mod aggregate;
pub mod filter;
pub mod join;
pub mod pipeline;
pub mod reshape;

pub use aggregate::{group_mean, group_sum, with_duration};
pub use filter::{retain_languages, retain_matching};
pub use join::{inner_join, JoinKeys, JoinOutcome};
pub use pipeline::{analyze_frames, run_analysis, AnalysisOptions, AnalysisReport};
pub use reshape::{ensure_binary_answers, pivot_longer, pivot_wider, QuestionPattern};
