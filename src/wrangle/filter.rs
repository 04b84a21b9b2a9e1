//! Row filtering against the retained language set.

use crate::error::{WrangleError, WrangleResult};
use crate::frame::{cell_str, Frame};
use crate::models::Language;

/// Keep only rows whose language column matches the allow-list.
///
/// Labels outside the allow-list (including labels that are not languages
/// at all) are dropped, so the distinct labels of the output are exactly
/// the intersection of the allow-list and the labels present. An empty
/// result is allowed.
pub fn retain_languages(
    frame: &Frame,
    language_col: &str,
    allowed: &[Language],
) -> WrangleResult<Frame> {
    if !frame.has_column(language_col) {
        return Err(WrangleError::MissingColumn {
            stage: "filter",
            column: language_col.to_string(),
        });
    }

    let rows = frame
        .rows()
        .iter()
        .filter(|row| {
            row.get(language_col)
                .map(cell_str)
                .and_then(|label| Language::from_label(&label))
                .map(|lang| allowed.contains(&lang))
                .unwrap_or(false)
        })
        .cloned()
        .collect();

    Ok(Frame::new(frame.headers().to_vec(), rows))
}

/// Keep only rows whose cell in `col` equals `value` (canonical-string
/// comparison, so `1` matches `"1"`).
pub fn retain_matching(frame: &Frame, col: &str, value: &str) -> WrangleResult<Frame> {
    if !frame.has_column(col) {
        return Err(WrangleError::MissingColumn {
            stage: "filter",
            column: col.to_string(),
        });
    }

    let rows = frame
        .rows()
        .iter()
        .filter(|row| row.get(col).map(cell_str).as_deref() == Some(value))
        .cloned()
        .collect();

    Ok(Frame::new(frame.headers().to_vec(), rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::test_util::{frame_of, n, v};
    use crate::frame::cell_str;

    fn sample() -> Frame {
        frame_of(
            &["id", "native_language"],
            &[
                vec![n(1), v("Spanish")],
                vec![n(2), v("Mandarin")],
                vec![n(3), v("French")],
                vec![n(4), v("Dutch")],
                vec![n(5), v("German")],
            ],
        )
    }

    #[test]
    fn test_retains_only_allowed_languages() {
        let out = retain_languages(&sample(), "native_language", &Language::ALL).unwrap();
        assert_eq!(out.len(), 3);
        for row in out.rows() {
            let label = cell_str(&row["native_language"]);
            assert!(Language::from_label(&label).is_some());
        }
    }

    #[test]
    fn test_distinct_labels_equal_intersection() {
        // German absent from input; allow-list intersected with present labels
        let f = frame_of(
            &["native_language"],
            &[vec![v("Spanish")], vec![v("French")], vec![v("Mandarin")]],
        );
        let out = retain_languages(&f, "native_language", &Language::ALL).unwrap();
        let labels: Vec<String> = out.distinct("native_language").iter().map(cell_str).collect();
        assert_eq!(labels, vec!["Spanish", "French"]);
    }

    #[test]
    fn test_empty_result_is_not_fatal() {
        let f = frame_of(&["native_language"], &[vec![v("Mandarin")]]);
        let out = retain_languages(&f, "native_language", &Language::ALL).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.headers(), &["native_language".to_string()]);
    }

    #[test]
    fn test_subset_allow_list() {
        let out = retain_languages(&sample(), "native_language", &[Language::German]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(cell_str(&out.rows()[0]["native_language"]), "German");
    }

    #[test]
    fn test_missing_column_is_error() {
        let err = retain_languages(&sample(), "lang", &Language::ALL).unwrap_err();
        assert!(err.to_string().contains("lang"));
    }

    #[test]
    fn test_retain_matching_numeric_vs_string() {
        let f = frame_of(&["item"], &[vec![v("q1")], vec![v("q2")], vec![v("q1")]]);
        let out = retain_matching(&f, "item", "q1").unwrap();
        assert_eq!(out.len(), 2);
    }
}
