//! In-memory table with typed cells, shared read-only by every dashboard view.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;

/// Semantic type declared for a column at load time.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Number,
    Integer,
    Date,
}

impl ColumnKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Number | Self::Integer)
    }
}

/// A single cell. Cells that failed coercion or were blank are `Missing`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Number(f64),
    Integer(i64),
    Date(NaiveDate),
    Missing,
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Numeric view of the cell; text, dates and missing cells have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Exact-match equality used by filters. `Missing` never matches.
    pub fn matches(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Total order for sorting group keys: numbers numerically, text
    /// lexicographically, dates chronologically; mixed kinds by kind rank.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => self.rank().cmp(&other.rank()),
            },
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Number(_) | Self::Integer(_) => 0,
            Self::Date(_) => 1,
            Self::Text(_) => 2,
            Self::Missing => 3,
        }
    }

    /// Human-readable label for chart axes and dropdowns.
    pub fn label(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => format!("{n}"),
            Self::Integer(i) => i.to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Missing => String::new(),
        }
    }

    /// Numbers rounded to one decimal for tabular display; other kinds as-is.
    pub fn rounded(&self) -> Value {
        match self {
            Self::Number(n) => Self::Number(round1(*n)),
            other => other.clone(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

/// Round to one decimal place.
pub fn round1(n: f64) -> f64 {
    (n * 10.0).round() / 10.0
}

/// Column name and declared kind.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Row-major table. Every row has exactly one cell per column.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding short rows with `Missing` and truncating long ones.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Missing);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Names of numeric columns in header order.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind.is_numeric())
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Sorted, de-duplicated text values of a column, skipping missing cells.
    pub fn distinct_text(&self, name: &str) -> Vec<String> {
        let Some(idx) = self.column_index(name) else {
            return Vec::new();
        };
        let mut values: Vec<String> = self
            .rows
            .iter()
            .filter_map(|row| row[idx].as_str().map(str::to_string))
            .collect();
        values.sort();
        values.dedup();
        values
    }
}
