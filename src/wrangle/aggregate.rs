//! Group-by reductions over long observation frames.
//!
//! Grouping keys define output row identity; groups appear only for key
//! combinations present in the data, and output order is deterministic
//! (ascending by group key, numeric-aware).

use serde_json::{Map, Number, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::error::{WrangleError, WrangleResult};
use crate::frame::{cell_num, cell_str, compare_cells, Frame};

/// Accumulated state for one group.
struct GroupAcc {
    key_cells: Vec<Value>,
    sum: f64,
    count: usize,
}

fn grouped(
    frame: &Frame,
    keys: &[&str],
    value_col: &str,
    stage: &'static str,
) -> WrangleResult<BTreeMap<Vec<String>, GroupAcc>> {
    for col in keys.iter().copied().chain([value_col]) {
        if !frame.has_column(col) {
            return Err(WrangleError::MissingColumn {
                stage,
                column: col.to_string(),
            });
        }
    }

    let mut groups: BTreeMap<Vec<String>, GroupAcc> = BTreeMap::new();
    for row in frame.rows() {
        let key: Vec<String> = keys
            .iter()
            .map(|k| row.get(*k).map(cell_str).unwrap_or_default())
            .collect();
        let acc = groups.entry(key).or_insert_with(|| GroupAcc {
            key_cells: keys
                .iter()
                .map(|k| row.get(*k).cloned().unwrap_or(Value::Null))
                .collect(),
            sum: 0.0,
            count: 0,
        });
        // Cells without a numeric view (missing answers) are skipped.
        if let Some(x) = row.get(value_col).and_then(cell_num) {
            acc.sum += x;
            acc.count += 1;
        }
    }
    Ok(groups)
}

fn assemble(
    keys: &[&str],
    out_col: &str,
    groups: BTreeMap<Vec<String>, GroupAcc>,
    reduce: impl Fn(&GroupAcc) -> f64,
) -> Frame {
    let mut headers: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
    headers.push(out_col.to_string());

    let mut rows: Vec<Map<String, Value>> = groups
        .into_values()
        .map(|acc| {
            let mut row = Map::new();
            for (name, cell) in keys.iter().zip(&acc.key_cells) {
                row.insert(name.to_string(), cell.clone());
            }
            let value = reduce(&acc);
            row.insert(
                out_col.to_string(),
                Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null),
            );
            row
        })
        .collect();

    // Numeric-aware ordering on the key columns, leftmost first.
    rows.sort_by(|a, b| {
        for k in keys {
            let ord = compare_cells(
                a.get(*k).unwrap_or(&Value::Null),
                b.get(*k).unwrap_or(&Value::Null),
            );
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });

    Frame::new(headers, rows)
}

/// Group by `keys` and sum `value_col` into `out_col`.
pub fn group_sum(
    frame: &Frame,
    keys: &[&str],
    value_col: &str,
    out_col: &str,
) -> WrangleResult<Frame> {
    let groups = grouped(frame, keys, value_col, "aggregate")?;
    Ok(assemble(keys, out_col, groups, |acc| acc.sum))
}

/// Group by `keys` and average `value_col` into `out_col`.
///
/// Groups whose every cell is missing report a null mean.
pub fn group_mean(
    frame: &Frame,
    keys: &[&str],
    value_col: &str,
    out_col: &str,
) -> WrangleResult<Frame> {
    let groups = grouped(frame, keys, value_col, "aggregate")?;
    Ok(assemble(keys, out_col, groups, |acc| {
        if acc.count == 0 {
            f64::NAN // becomes null via Number::from_f64
        } else {
            acc.sum / acc.count as f64
        }
    }))
}

/// Add a learning-duration column: `age_col` minus `exposure_col`.
///
/// Rows missing either input get a null duration.
pub fn with_duration(
    frame: &Frame,
    age_col: &str,
    exposure_col: &str,
    out_col: &str,
) -> WrangleResult<Frame> {
    for col in [age_col, exposure_col] {
        if !frame.has_column(col) {
            return Err(WrangleError::MissingColumn {
                stage: "aggregate",
                column: col.to_string(),
            });
        }
    }

    let mut headers = frame.headers().to_vec();
    if !frame.has_column(out_col) {
        headers.push(out_col.to_string());
    }

    let rows = frame
        .rows()
        .iter()
        .map(|row| {
            let mut out = row.clone();
            let duration = match (
                row.get(age_col).and_then(cell_num),
                row.get(exposure_col).and_then(cell_num),
            ) {
                (Some(age), Some(exposure)) => {
                    Number::from_f64(age - exposure).map(Value::Number).unwrap_or(Value::Null)
                }
                _ => Value::Null,
            };
            out.insert(out_col.to_string(), duration);
            out
        })
        .collect();

    Ok(Frame::new(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::test_util::{frame_of, n, v};
    use serde_json::json;

    fn long() -> Frame {
        frame_of(
            &["id", "native_language", "item", "correct"],
            &[
                vec![n(1), v("Spanish"), v("q1"), n(1)],
                vec![n(1), v("Spanish"), v("q2"), n(0)],
                vec![n(1), v("Spanish"), v("q3"), n(1)],
                vec![n(2), v("French"), v("q1"), n(1)],
                vec![n(2), v("French"), v("q2"), n(1)],
                vec![n(2), v("French"), v("q3"), n(0)],
            ],
        )
    }

    #[test]
    fn test_group_sum_totals() {
        let totals = group_sum(&long(), &["id", "native_language"], "correct", "total").unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals.rows()[0]["id"], json!(1));
        assert_eq!(totals.rows()[0]["total"], json!(2.0));
        assert_eq!(totals.rows()[1]["id"], json!(2));
        assert_eq!(totals.rows()[1]["total"], json!(2.0));
    }

    #[test]
    fn test_group_sum_idempotent_under_same_grouping() {
        let once = group_sum(&long(), &["id", "native_language"], "correct", "total").unwrap();
        let twice = group_sum(&once, &["id", "native_language"], "total", "total").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_group_mean() {
        let means = group_mean(&long(), &["native_language"], "correct", "accuracy").unwrap();
        // Deterministic key order: French before Spanish
        assert_eq!(means.rows()[0]["native_language"], json!("French"));
        assert_eq!(means.rows()[0]["accuracy"], json!(2.0 / 3.0));
        assert_eq!(means.rows()[1]["native_language"], json!("Spanish"));
        assert_eq!(means.rows()[1]["accuracy"], json!(2.0 / 3.0));
    }

    #[test]
    fn test_numeric_keys_order_numerically() {
        let f = frame_of(
            &["years", "correct"],
            &[
                vec![n(10), n(1)],
                vec![n(2), n(0)],
                vec![n(2), n(1)],
            ],
        );
        let means = group_mean(&f, &["years"], "correct", "accuracy").unwrap();
        let years: Vec<Value> = means.column("years");
        assert_eq!(years, vec![json!(2), json!(10)]);
        assert_eq!(means.rows()[0]["accuracy"], json!(0.5));
    }

    #[test]
    fn test_missing_values_skipped_in_mean() {
        let f = frame_of(
            &["lang", "correct"],
            &[
                vec![v("Spanish"), n(1)],
                vec![v("Spanish"), Value::Null],
            ],
        );
        let means = group_mean(&f, &["lang"], "correct", "accuracy").unwrap();
        assert_eq!(means.rows()[0]["accuracy"], json!(1.0));
    }

    #[test]
    fn test_empty_groups_absent() {
        // No German rows: no German group in output
        let totals = group_sum(&long(), &["native_language"], "correct", "total").unwrap();
        assert_eq!(totals.len(), 2);
    }

    #[test]
    fn test_with_duration() {
        let f = frame_of(
            &["id", "age", "age_of_english"],
            &[vec![n(1), n(30), n(12)], vec![n(2), n(25), Value::Null]],
        );
        let out = with_duration(&f, "age", "age_of_english", "years_learning").unwrap();
        assert_eq!(out.rows()[0]["years_learning"], json!(18.0));
        assert_eq!(out.rows()[1]["years_learning"], Value::Null);
        assert!(out.has_column("years_learning"));
    }

    #[test]
    fn test_missing_value_column_is_error() {
        let err = group_sum(&long(), &["id"], "score", "total").unwrap_err();
        assert!(err.to_string().contains("score"));
    }
}
