//! Text rendering of analysis output.
//!
//! Stands in for the chart layer: a ranked frequency table with bars, the
//! accuracy-by-experience curve per language, and the per-subject totals.
//! None of this is a machine-readable contract; the JSON dumps are.

use crate::frame::{cell_num, cell_str, Frame};
use crate::models::SubjectScore;

/// Count category frequencies, ranked descending (ties break on label).
pub fn frequency_table(frame: &Frame, col: &str) -> Vec<(String, usize)> {
    let mut counts: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for row in frame.rows() {
        let label = row.get(col).map(cell_str).unwrap_or_default();
        if !label.is_empty() {
            *counts.entry(label).or_insert(0) += 1;
        }
    }
    let mut out: Vec<(String, usize)> = counts.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Render a ranked frequency table with proportional bars.
pub fn render_frequency(table: &[(String, usize)]) -> String {
    let mut out = String::new();
    let max = table.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1);
    let label_width = table.iter().map(|(l, _)| l.len()).max().unwrap_or(8);
    for (label, count) in table {
        let bar_len = (count * 40).div_ceil(max);
        out.push_str(&format!(
            "{:<width$}  {:>6}  {}\n",
            label,
            count,
            "#".repeat(bar_len),
            width = label_width,
        ));
    }
    out
}

/// Render the accuracy curve frame as one block per language.
///
/// Expects the group-mean output: one row per (language, duration) with
/// an accuracy column.
pub fn render_curve(
    curve: &Frame,
    language_col: &str,
    duration_col: &str,
    accuracy_col: &str,
) -> String {
    let mut out = String::new();
    for language in curve.distinct(language_col) {
        out.push_str(&format!("{}:\n", cell_str(&language)));
        out.push_str(&format!("  {:>8}  {:>8}\n", "years", "accuracy"));
        for row in curve.rows() {
            if row.get(language_col).map(cell_str) != Some(cell_str(&language)) {
                continue;
            }
            let years = row.get(duration_col).map(cell_str).unwrap_or_default();
            let accuracy = row.get(accuracy_col).and_then(cell_num);
            match accuracy {
                Some(a) => out.push_str(&format!("  {:>8}  {:>8.3}\n", years, a)),
                None => out.push_str(&format!("  {:>8}  {:>8}\n", years, "NA")),
            }
        }
    }
    out
}

/// Render per-subject totals, highest first.
pub fn render_subject_totals(
    totals: &Frame,
    id_col: &str,
    language_col: &str,
    total_col: &str,
) -> String {
    let mut scores: Vec<SubjectScore> = totals
        .rows()
        .iter()
        .filter_map(|row| SubjectScore::from_row(row, id_col, language_col, total_col))
        .collect();
    scores.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut out = String::new();
    out.push_str(&format!("  {:>6}  {:<8}  {:>5}\n", "id", "language", "total"));
    for s in scores {
        out.push_str(&format!("  {:>6}  {:<8}  {:>5}\n", s.id, s.language.as_str(), s.total));
    }
    out
}
