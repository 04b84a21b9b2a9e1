//! Domain models for the survey analysis pipeline.
//!
//! This module contains the typed views of the tabular data flowing
//! through the pipeline:
//!
//! - [`Language`] - first-language category with an explicit baseline
//! - [`SurveyColumns`] - column-name mapping for the wide survey file
//! - [`Participant`] - one wide-table respondent
//! - [`Observation`] - one (participant, question) long row
//! - [`QuestionInfo`] - metadata about one question
//! - [`SubjectScore`] - per-participant total correct answers
//! - [`Covariate`] - a model covariate selection

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{WrangleError, WrangleResult};
use crate::frame::{cell_num, cell_str, Frame};

// =============================================================================
// Language Category
// =============================================================================

/// First-language category retained by the analysis.
///
/// The enum is the category's full label set: filtering to these three
/// languages leaves no dangling empty categories. [`Language::baseline`]
/// names the reference level against which the other levels' fitted
/// effects are contrasts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Language {
    Spanish,
    French,
    German,
}

impl Language {
    /// All retained categories, in reporting order.
    pub const ALL: [Language; 3] = [Language::Spanish, Language::French, Language::German];

    /// The designated reference level for modeling.
    pub fn baseline() -> Language {
        Language::Spanish
    }

    /// Parse a category label (case-insensitive).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "spanish" => Some(Self::Spanish),
            "french" => Some(Self::French),
            "german" => Some(Self::German),
            _ => None,
        }
    }

    /// Canonical label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spanish => "Spanish",
            Self::French => "French",
            Self::German => "German",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Column Mapping
// =============================================================================

/// Column names of the wide survey file.
///
/// The public dataset ships with these defaults, but every stage takes the
/// mapping explicitly so renamed exports still load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurveyColumns {
    /// Participant identifier column.
    pub id: String,
    /// First-language category column.
    pub language: String,
    /// Age at survey time.
    pub age: String,
    /// Age of first English exposure.
    pub exposure: String,
}

impl Default for SurveyColumns {
    fn default() -> Self {
        Self {
            id: "id".to_string(),
            language: "native_language".to_string(),
            age: "age".to_string(),
            exposure: "age_of_english".to_string(),
        }
    }
}

// =============================================================================
// Participant (wide row)
// =============================================================================

/// One respondent of the wide survey table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    pub id: i64,
    pub language: Language,
    pub age: Option<f64>,
    pub exposure_age: Option<f64>,
}

impl Participant {
    /// Decode a wide row. Returns `None` when the identifier is missing,
    /// non-numeric, or the language label is outside the retained set.
    pub fn from_row(row: &Map<String, Value>, cols: &SurveyColumns) -> Option<Self> {
        let id = row.get(&cols.id).and_then(cell_num)? as i64;
        let language = row
            .get(&cols.language)
            .map(cell_str)
            .and_then(|l| Language::from_label(&l))?;
        Some(Self {
            id,
            language,
            age: row.get(&cols.age).and_then(cell_num),
            exposure_age: row.get(&cols.exposure).and_then(cell_num),
        })
    }
}

/// Decode every row of a filtered wide frame, enforcing the unique-identifier
/// invariant of the wide table.
pub fn participants(frame: &Frame, cols: &SurveyColumns) -> WrangleResult<Vec<Participant>> {
    if !frame.has_column(&cols.id) {
        return Err(WrangleError::MissingColumn {
            stage: "load",
            column: cols.id.clone(),
        });
    }
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for row in frame.rows() {
        if let Some(p) = Participant::from_row(row, cols) {
            if !seen.insert(p.id) {
                return Err(WrangleError::DuplicateIdentifier(p.id.to_string()));
            }
            out.push(p);
        }
    }
    Ok(out)
}

// =============================================================================
// Observation (long row)
// =============================================================================

/// One (participant, question) pair of the long table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    pub id: i64,
    pub item: String,
    pub correct: f64,
    pub language: Language,
    pub age: Option<f64>,
    pub exposure_age: Option<f64>,
}

impl Observation {
    /// Decode a long row. `item_col`/`answer_col` name the reshape output
    /// columns; participant attributes come from the carried wide columns.
    pub fn from_row(
        row: &Map<String, Value>,
        cols: &SurveyColumns,
        item_col: &str,
        answer_col: &str,
    ) -> Option<Self> {
        let id = row.get(&cols.id).and_then(cell_num)? as i64;
        let item = row.get(item_col).map(cell_str)?;
        let correct = row.get(answer_col).and_then(cell_num)?;
        let language = row
            .get(&cols.language)
            .map(cell_str)
            .and_then(|l| Language::from_label(&l))?;
        Some(Self {
            id,
            item,
            correct,
            language,
            age: row.get(&cols.age).and_then(cell_num),
            exposure_age: row.get(&cols.exposure).and_then(cell_num),
        })
    }

    /// Learning duration in years: age minus age of first exposure.
    pub fn learning_duration(&self) -> Option<f64> {
        match (self.age, self.exposure_age) {
            (Some(age), Some(exposure)) => Some(age - exposure),
            _ => None,
        }
    }
}

// =============================================================================
// Question Metadata
// =============================================================================

/// Metadata about one question of the survey instrument.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionInfo {
    /// Question key, matching the reshaped item column.
    pub key: String,
    /// Linguistic construct the question tests.
    pub construct: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
}

impl QuestionInfo {
    pub fn from_row(row: &Map<String, Value>, key_col: &str) -> Option<Self> {
        let key = row.get(key_col).map(cell_str)?;
        if key.is_empty() {
            return None;
        }
        let text = |name: &str| {
            row.get(name)
                .map(cell_str)
                .filter(|s| !s.is_empty())
        };
        Some(Self {
            key,
            construct: text("construct"),
            description: text("description"),
        })
    }
}

/// Decode the metadata frame, enforcing the unique-question-key invariant.
pub fn question_infos(frame: &Frame, key_col: &str) -> WrangleResult<Vec<QuestionInfo>> {
    if !frame.has_column(key_col) {
        return Err(WrangleError::MissingColumn {
            stage: "join",
            column: key_col.to_string(),
        });
    }
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for row in frame.rows() {
        if let Some(info) = QuestionInfo::from_row(row, key_col) {
            if !seen.insert(info.key.clone()) {
                return Err(WrangleError::DuplicateQuestionKey(info.key));
            }
            out.push(info);
        }
    }
    Ok(out)
}

// =============================================================================
// Per-Subject Score
// =============================================================================

/// Total correct answers for one participant, from the group-by-sum stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubjectScore {
    pub id: i64,
    pub language: Language,
    pub total: f64,
}

impl SubjectScore {
    pub fn from_row(
        row: &Map<String, Value>,
        id_col: &str,
        language_col: &str,
        total_col: &str,
    ) -> Option<Self> {
        Some(Self {
            id: row.get(id_col).and_then(cell_num)? as i64,
            language: row
                .get(language_col)
                .map(cell_str)
                .and_then(|l| Language::from_label(&l))?,
            total: row.get(total_col).and_then(cell_num)?,
        })
    }
}

// =============================================================================
// Covariates
// =============================================================================

/// A covariate selection for the logistic model.
///
/// Swapping the covariate set changes the design matrix only; the fitting
/// procedure is identical for every analysis question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Covariate {
    /// First-language category, dummy-coded against an explicit reference
    /// level.
    Language {
        #[serde(default = "Language::baseline")]
        reference: Language,
    },

    /// Age of first English exposure (continuous).
    ExposureAge,

    /// Years of learning: age minus age of first exposure (continuous).
    LearningDuration,

    /// Per-subject total correct score (continuous; requires the score
    /// column to be joined onto the model frame).
    TotalScore,
}
