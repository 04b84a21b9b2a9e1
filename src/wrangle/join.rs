//! Inner join of long observations against question metadata.
//!
//! The two tables name their key differently (the reshaped item column vs
//! the metadata key column), so the key mapping is explicit. Non-matching
//! rows are dropped silently by design, matching the source analysis; the
//! outcome reports the dropped counts so the caller can surface them
//! instead of losing rows without a trace.

use serde_json::Map;
use std::collections::{HashMap, HashSet};

use crate::error::{WrangleError, WrangleResult};
use crate::frame::{cell_str, Frame};

/// Key mapping and disambiguation rule for an inner join.
#[derive(Debug, Clone)]
pub struct JoinKeys {
    /// Key column in the left (observation) frame.
    pub left: String,
    /// Key column in the right (metadata) frame.
    pub right: String,
    /// Suffix for left columns whose name collides with a right column.
    pub left_suffix: String,
    /// Suffix for right columns whose name collides with a left column.
    pub right_suffix: String,
}

impl JoinKeys {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
            left_suffix: "_x".to_string(),
            right_suffix: "_y".to_string(),
        }
    }
}

/// Result of an inner join, with row-loss accounting.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    /// The joined frame.
    pub frame: Frame,
    /// Output row count.
    pub matched: usize,
    /// Left rows whose key had no match on the right.
    pub dropped_left: usize,
    /// Right rows whose key matched no left row.
    pub dropped_right: usize,
}

/// Inner join `left` against `right` on the explicit key mapping.
///
/// All columns from both sides are retained. When a non-key column name
/// appears on both sides, both copies are kept under distinct suffixed
/// names. Rows without a key match on the other side are dropped and
/// counted in the outcome.
pub fn inner_join(left: &Frame, right: &Frame, keys: &JoinKeys) -> WrangleResult<JoinOutcome> {
    if !left.has_column(&keys.left) {
        return Err(WrangleError::MissingColumn {
            stage: "join",
            column: keys.left.clone(),
        });
    }
    if !right.has_column(&keys.right) {
        return Err(WrangleError::MissingColumn {
            stage: "join",
            column: keys.right.clone(),
        });
    }

    let left_names: HashSet<&String> = left.headers().iter().collect();
    let right_names: HashSet<&String> = right.headers().iter().collect();

    // Collision rule: a name present on both sides is kept twice, each
    // copy under its side's suffix.
    let rename_left = |name: &String| {
        if right_names.contains(name) {
            format!("{}{}", name, keys.left_suffix)
        } else {
            name.clone()
        }
    };
    let rename_right = |name: &String| {
        if left_names.contains(name) {
            format!("{}{}", name, keys.right_suffix)
        } else {
            name.clone()
        }
    };

    let mut headers: Vec<String> = left.headers().iter().map(rename_left).collect();
    headers.extend(right.headers().iter().map(rename_right));

    // Index the right side by key; duplicate keys all match.
    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, row) in right.rows().iter().enumerate() {
        if let Some(key) = row.get(&keys.right).map(cell_str) {
            index.entry(key).or_default().push(i);
        }
    }

    let mut matched_right: HashSet<usize> = HashSet::new();
    let mut rows = Vec::new();
    let mut dropped_left = 0;

    for row in left.rows() {
        let key = row.get(&keys.left).map(cell_str).unwrap_or_default();
        let Some(partners) = index.get(&key) else {
            dropped_left += 1;
            continue;
        };
        for &i in partners {
            matched_right.insert(i);
            let mut out = Map::new();
            for name in left.headers() {
                out.insert(
                    rename_left(name),
                    row.get(name).cloned().unwrap_or(serde_json::Value::Null),
                );
            }
            let partner = &right.rows()[i];
            for name in right.headers() {
                out.insert(
                    rename_right(name),
                    partner.get(name).cloned().unwrap_or(serde_json::Value::Null),
                );
            }
            rows.push(out);
        }
    }

    let matched = rows.len();
    let dropped_right = right.len() - matched_right.len();

    Ok(JoinOutcome {
        frame: Frame::new(headers, rows),
        matched,
        dropped_left,
        dropped_right,
    })
}
