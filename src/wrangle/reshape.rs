//! Wide-to-long reshape of per-question answer columns.
//!
//! The wide survey table carries one column per question (`q1`, `q2`,
//! `q21_a`, ...). [`pivot_longer`] turns each (row, question column) pair
//! into one long row, duplicating the non-question columns. This is the
//! only combinatorial stage of the pipeline: row count multiplies by the
//! number of question columns, which is why the language filter runs
//! before it.
//!
//! [`pivot_wider`] is the inverse, used to check the reshape round-trip.

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{WrangleError, WrangleResult};
use crate::frame::{cell_num, cell_str, Frame};

/// Naming rule selecting the wide columns to reshape.
///
/// Matches `<prefix><index>` with an optional `_suffix` sub-item marker,
/// e.g. for prefix `q`: `q1`, `q17`, `q21_a`.
#[derive(Debug, Clone)]
pub struct QuestionPattern {
    regex: Regex,
}

impl QuestionPattern {
    pub fn new(prefix: &str) -> Self {
        let pattern = format!(r"^{}\d+(_[A-Za-z0-9]+)?$", regex::escape(prefix));
        Self {
            // The pattern is built from an escaped prefix, so it always compiles.
            regex: Regex::new(&pattern).expect("valid question pattern"),
        }
    }

    pub fn matches(&self, column: &str) -> bool {
        self.regex.is_match(column)
    }

    /// Split a frame's headers into (selected, carried) per this pattern,
    /// both in original column order.
    pub fn split_headers(&self, frame: &Frame) -> (Vec<String>, Vec<String>) {
        let mut selected = Vec::new();
        let mut carried = Vec::new();
        for header in frame.headers() {
            if self.matches(header) {
                selected.push(header.clone());
            } else {
                carried.push(header.clone());
            }
        }
        (selected, carried)
    }
}

/// Reshape wide question columns to long form.
///
/// Output columns: every non-question column (duplicated per question),
/// then `key_col` holding the question-column name and `value_col` holding
/// the answer cell. The result is sorted non-decreasing by `id_col` so
/// that each participant's observations stay together; the sort is stable,
/// so within a participant the original column order is preserved.
///
/// For R input rows and C selected columns the output has exactly R×C
/// rows. Zero selected columns yield zero rows.
pub fn pivot_longer(
    frame: &Frame,
    pattern: &QuestionPattern,
    id_col: &str,
    key_col: &str,
    value_col: &str,
) -> WrangleResult<Frame> {
    if !frame.has_column(id_col) {
        return Err(WrangleError::MissingColumn {
            stage: "reshape",
            column: id_col.to_string(),
        });
    }

    let (selected, carried) = pattern.split_headers(frame);

    let mut headers = carried.clone();
    headers.push(key_col.to_string());
    headers.push(value_col.to_string());

    let mut rows = Vec::with_capacity(frame.len() * selected.len());
    for row in frame.rows() {
        for question in &selected {
            let mut long_row = Map::new();
            for col in &carried {
                long_row.insert(col.clone(), row.get(col).cloned().unwrap_or(Value::Null));
            }
            long_row.insert(key_col.to_string(), Value::String(question.clone()));
            long_row.insert(
                value_col.to_string(),
                row.get(question).cloned().unwrap_or(Value::Null),
            );
            rows.push(long_row);
        }
    }

    Ok(Frame::new(headers, rows).sorted_by(id_col))
}

/// Inverse reshape: long form back to one row per participant.
///
/// Carried columns are taken from each participant's first long row;
/// question columns appear in first-appearance order of the key column.
pub fn pivot_wider(
    frame: &Frame,
    id_col: &str,
    key_col: &str,
    value_col: &str,
) -> WrangleResult<Frame> {
    for col in [id_col, key_col, value_col] {
        if !frame.has_column(col) {
            return Err(WrangleError::MissingColumn {
                stage: "reshape",
                column: col.to_string(),
            });
        }
    }

    let carried: Vec<String> = frame
        .headers()
        .iter()
        .filter(|h| h.as_str() != key_col && h.as_str() != value_col)
        .cloned()
        .collect();
    let questions: Vec<String> = frame.distinct(key_col).iter().map(cell_str).collect();

    let mut order: Vec<String> = Vec::new();
    let mut wide: std::collections::HashMap<String, Map<String, Value>> =
        std::collections::HashMap::new();

    for row in frame.rows() {
        let id = row.get(id_col).map(cell_str).unwrap_or_default();
        let entry = wide.entry(id.clone()).or_insert_with(|| {
            order.push(id.clone());
            let mut out = Map::new();
            for col in &carried {
                out.insert(col.clone(), row.get(col).cloned().unwrap_or(Value::Null));
            }
            out
        });
        let question = row.get(key_col).map(cell_str).unwrap_or_default();
        entry.insert(
            question,
            row.get(value_col).cloned().unwrap_or(Value::Null),
        );
    }

    let mut headers = carried;
    headers.extend(questions);

    let rows = order
        .into_iter()
        .filter_map(|id| wide.remove(&id))
        .collect();

    Ok(Frame::new(headers, rows))
}

/// Check that every answer cell of the long frame is a 0/1 indicator.
///
/// Missing answers (null cells) pass; anything else that is not exactly
/// 0 or 1 is an error naming the offending participant and value.
pub fn ensure_binary_answers(
    frame: &Frame,
    id_col: &str,
    value_col: &str,
) -> WrangleResult<()> {
    for col in [id_col, value_col] {
        if !frame.has_column(col) {
            return Err(WrangleError::MissingColumn {
                stage: "reshape",
                column: col.to_string(),
            });
        }
    }

    for row in frame.rows() {
        let cell = row.get(value_col).cloned().unwrap_or(Value::Null);
        if cell.is_null() {
            continue;
        }
        match cell_num(&cell) {
            Some(x) if x == 0.0 || x == 1.0 => {}
            _ => {
                return Err(WrangleError::NonBinaryAnswer {
                    id: row.get(id_col).map(cell_str).unwrap_or_default(),
                    value: cell_str(&cell),
                });
            }
        }
    }
    Ok(())
}
