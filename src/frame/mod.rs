//! In-memory table of labeled columns.
//!
//! A [`Frame`] is the value passed between pipeline stages: a header list
//! (column order) plus JSON-object rows. Stages never mutate their input
//! frame; each returns a new `Frame`, so no aliasing can leak across
//! stages.
//!
//! Cells are JSON values: the loader coerces numeric-looking cells to
//! numbers, empty cells to null, and keeps everything else as strings.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashSet;

/// A table of labeled columns with row-major JSON-object storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Frame {
    headers: Vec<String>,
    rows: Vec<Map<String, Value>>,
}

impl Frame {
    /// Build a frame from explicit headers and rows.
    pub fn new(headers: Vec<String>, rows: Vec<Map<String, Value>>) -> Self {
        Self { headers, rows }
    }

    /// An empty frame with the given headers.
    pub fn empty(headers: Vec<String>) -> Self {
        Self { headers, rows: Vec::new() }
    }

    /// Column order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// All rows.
    pub fn rows(&self) -> &[Map<String, Value>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// All cells of one column, null where a row lacks the key.
    pub fn column(&self, name: &str) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| row.get(name).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// Distinct values of one column, in first-appearance order.
    pub fn distinct(&self, name: &str) -> Vec<Value> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for row in &self.rows {
            let value = row.get(name).cloned().unwrap_or(Value::Null);
            if seen.insert(cell_str(&value)) {
                out.push(value);
            }
        }
        out
    }

    /// Project onto a subset of columns, in the given order.
    pub fn select(&self, names: &[&str]) -> Frame {
        let headers: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut out = Map::new();
                for name in names {
                    out.insert(
                        name.to_string(),
                        row.get(*name).cloned().unwrap_or(Value::Null),
                    );
                }
                out
            })
            .collect();
        Frame::new(headers, rows)
    }

    /// A copy with one column renamed. Column order is preserved; a
    /// missing `from` column leaves the frame unchanged.
    pub fn renamed(&self, from: &str, to: &str) -> Frame {
        let headers = self
            .headers
            .iter()
            .map(|h| if h == from { to.to_string() } else { h.clone() })
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut out = row.clone();
                if let Some(value) = out.remove(from) {
                    out.insert(to.to_string(), value);
                }
                out
            })
            .collect();
        Frame::new(headers, rows)
    }

    /// A copy sorted non-decreasing by one column (stable).
    ///
    /// Numbers order numerically; everything else falls back to the
    /// canonical string form.
    pub fn sorted_by(&self, name: &str) -> Frame {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| {
            let left = a.get(name).cloned().unwrap_or(Value::Null);
            let right = b.get(name).cloned().unwrap_or(Value::Null);
            compare_cells(&left, &right)
        });
        Frame::new(self.headers.clone(), rows)
    }
}

/// Ordering between two cells: numeric when both sides are numbers,
/// canonical-string otherwise.
pub fn compare_cells(left: &Value, right: &Value) -> Ordering {
    match (cell_num(left), cell_num(right)) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => cell_str(left).cmp(&cell_str(right)),
    }
}

/// Numeric view of a cell, if it has one.
pub fn cell_num(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Canonical string form of a cell, used for group keys and join keys.
///
/// Integral floats print without a trailing `.0` so that `1` and `1.0`
/// key identically.
pub fn cell_str(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{}", f as i64)
                } else {
                    f.to_string()
                }
            } else {
                n.to_string()
            }
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use serde_json::json;

    /// Build a frame from header names and rows of JSON values.
    pub fn frame_of(headers: &[&str], rows: &[Vec<Value>]) -> Frame {
        let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        let rows = rows
            .iter()
            .map(|cells| {
                let mut row = Map::new();
                for (h, c) in headers.iter().zip(cells) {
                    row.insert(h.clone(), c.clone());
                }
                row
            })
            .collect();
        Frame::new(headers, rows)
    }

    pub fn v(x: impl Into<Value>) -> Value {
        x.into()
    }

    pub fn n(x: i64) -> Value {
        json!(x)
    }
}

#[cfg(test)]
mod tests {
    use super::test_util::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_and_len() {
        let f = frame_of(
            &["id", "lang"],
            &[vec![n(1), v("Spanish")], vec![n(2), v("French")]],
        );
        assert_eq!(f.len(), 2);
        assert_eq!(f.column("lang"), vec![json!("Spanish"), json!("French")]);
    }

    #[test]
    fn test_missing_column_is_null() {
        let f = frame_of(&["id"], &[vec![n(1)]]);
        assert_eq!(f.column("nope"), vec![Value::Null]);
    }

    #[test]
    fn test_distinct_keeps_first_appearance_order() {
        let f = frame_of(
            &["lang"],
            &[
                vec![v("French")],
                vec![v("Spanish")],
                vec![v("French")],
                vec![v("German")],
            ],
        );
        let d: Vec<String> = f.distinct("lang").iter().map(cell_str).collect();
        assert_eq!(d, vec!["French", "Spanish", "German"]);
    }

    #[test]
    fn test_select_projects_and_orders() {
        let f = frame_of(&["a", "b", "c"], &[vec![n(1), n(2), n(3)]]);
        let s = f.select(&["c", "a"]);
        assert_eq!(s.headers(), &["c".to_string(), "a".to_string()]);
        assert_eq!(s.rows()[0]["c"], json!(3));
        assert_eq!(s.rows()[0]["a"], json!(1));
    }

    #[test]
    fn test_renamed_column() {
        let f = frame_of(&["id", "total"], &[vec![n(1), n(2)]]);
        let r = f.renamed("id", "participant");
        assert_eq!(r.headers(), &["participant".to_string(), "total".to_string()]);
        assert_eq!(r.rows()[0]["participant"], json!(1));
        assert!(r.rows()[0].get("id").is_none());
    }

    #[test]
    fn test_sorted_by_numeric() {
        let f = frame_of(&["id"], &[vec![n(10)], vec![n(2)], vec![n(33)]]);
        let s = f.sorted_by("id");
        let ids: Vec<Value> = s.column("id");
        assert_eq!(ids, vec![json!(2), json!(10), json!(33)]);
    }

    #[test]
    fn test_sorted_by_is_stable() {
        let f = frame_of(
            &["id", "item"],
            &[
                vec![n(2), v("q1")],
                vec![n(1), v("q1")],
                vec![n(2), v("q2")],
                vec![n(1), v("q2")],
            ],
        );
        let s = f.sorted_by("id");
        let items: Vec<String> = s.column("item").iter().map(cell_str).collect();
        assert_eq!(items, vec!["q1", "q2", "q1", "q2"]);
    }

    #[test]
    fn test_cell_num_coercions() {
        assert_eq!(cell_num(&json!(3)), Some(3.0));
        assert_eq!(cell_num(&json!("2.5")), Some(2.5));
        assert_eq!(cell_num(&json!(true)), Some(1.0));
        assert_eq!(cell_num(&json!("abc")), None);
        assert_eq!(cell_num(&Value::Null), None);
    }

    #[test]
    fn test_cell_str_integral_float() {
        assert_eq!(cell_str(&json!(1.0)), "1");
        assert_eq!(cell_str(&json!(1.5)), "1.5");
        assert_eq!(cell_str(&json!("x")), "x");
        assert_eq!(cell_str(&Value::Null), "");
    }
}
