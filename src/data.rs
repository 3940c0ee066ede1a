use std::{cmp::Ordering, collections::HashSet, fmt};

use serde::{Deserialize, Serialize};

/// A non-null cell of a normalized attendance table. Nulls are `None` in the
/// surrounding `Option<Value>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Text(String),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::Integer(i) => i.to_string(),
            Value::Text(s) => s.clone(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Integer(_) => None,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Integer(_), Value::Text(_)) => Ordering::Less,
            (Value::Text(_), Value::Integer(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Orders cells ascending with nulls last.
pub fn compare_nulls_last(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.cmp(b),
    }
}

pub fn render_cell(cell: Option<&Value>) -> String {
    cell.map(Value::as_display).unwrap_or_default()
}

/// Parses an integer cell. Surrounding whitespace is ignored and an integral
/// decimal such as `3.0` is accepted; anything else yields `None`.
pub fn parse_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    let (whole, fraction) = trimmed.split_once('.')?;
    if fraction.is_empty() || !fraction.bytes().all(|b| b == b'0') {
        return None;
    }
    whole.parse::<i64>().ok()
}

/// Returns `name`, or `name.1`, `name.2`, ... when it is already in `seen`,
/// and records the result.
pub fn unique_column_name(seen: &mut HashSet<String>, name: &str) -> String {
    let mut candidate = name.to_string();
    let mut suffix = 0;
    while seen.contains(&candidate) {
        suffix += 1;
        candidate = format!("{name}.{suffix}");
    }
    seen.insert(candidate.clone());
    candidate
}

/// Decoded upload before any cleaning. Empty cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }
}

/// Positions of the columns the reports read, resolved once per table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnRoles {
    pub sequence: usize,
    pub name: usize,
    pub course: usize,
    pub session: usize,
    /// Base duplicate key, without the session column.
    pub key: Vec<usize>,
}

/// Attendance rows after cleaning: ordered, renamed columns with typed cells.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NormalizedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<Value>>>,
    #[serde(skip)]
    pub roles: ColumnRoles,
}

impl NormalizedTable {
    /// Same columns and roles, different rows.
    pub fn with_rows(&self, rows: Vec<Vec<Option<Value>>>) -> Self {
        Self {
            columns: self.columns.clone(),
            rows,
            roles: self.roles.clone(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column)).and_then(Option::as_ref)
    }

    /// Row cells rendered as text, nulls as empty strings.
    pub fn rendered_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|cell| render_cell(cell.as_ref())).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_integer_accepts_integral_forms() {
        assert_eq!(parse_integer("12"), Some(12));
        assert_eq!(parse_integer(" 7 "), Some(7));
        assert_eq!(parse_integer("3.0"), Some(3));
        assert_eq!(parse_integer("-4"), Some(-4));
    }

    #[test]
    fn parse_integer_rejects_text_and_fractions() {
        assert_eq!(parse_integer("abc"), None);
        assert_eq!(parse_integer("1.5"), None);
        assert_eq!(parse_integer("2."), None);
        assert_eq!(parse_integer(""), None);
        assert_eq!(parse_integer("1,000"), None);
    }

    #[test]
    fn nulls_sort_after_values() {
        let text = Value::Text("가".into());
        assert_eq!(compare_nulls_last(None, Some(&text)), Ordering::Greater);
        assert_eq!(compare_nulls_last(Some(&text), None), Ordering::Less);
        assert_eq!(compare_nulls_last(None, None), Ordering::Equal);
    }
}
