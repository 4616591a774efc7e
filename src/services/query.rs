//! Indicator query: exact-match filtering plus mean/sum/count aggregation.
//!
//! A query never fails on data: an empty selection produces an empty result
//! and an aggregate over nothing produces `Measure::NotAvailable`. The only
//! error is a field that the table does not have.

use serde::{Serialize, Serializer};

use crate::errors::Notice;
use crate::models::table::{round1, Table, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Mean,
    Sum,
    Count,
}

/// Order of groups in a grouped result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOrder {
    /// Order in which keys first appear in the table.
    FirstSeen,
    /// Keys sorted ascending (numerically for numeric keys).
    Ascending,
}

/// Result of an aggregation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measure {
    Value(f64),
    NotAvailable,
}

impl Measure {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::NotAvailable => None,
        }
    }

    pub fn is_available(self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// `"92.0%"`, or `"N/A"` when not available.
    pub fn display_percent(self) -> String {
        match self {
            Self::Value(v) => format!("{v:.1}%"),
            Self::NotAvailable => "N/A".to_string(),
        }
    }

    pub fn rounded(self) -> Self {
        match self {
            Self::Value(v) => Self::Value(round1(v)),
            Self::NotAvailable => Self::NotAvailable,
        }
    }
}

impl Serialize for Measure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => serializer.serialize_f64(*v),
            Self::NotAvailable => serializer.serialize_none(),
        }
    }
}

/// Aggregate the cells of one column. Mean and sum read numeric cells only;
/// count counts every non-missing cell. No usable cell means not available.
pub fn aggregate<'a>(cells: impl IntoIterator<Item = &'a Value>, op: Aggregate) -> Measure {
    let mut count = 0usize;
    let mut sum = 0.0;
    for cell in cells {
        match op {
            Aggregate::Count => {
                if !cell.is_missing() {
                    count += 1;
                }
            }
            Aggregate::Mean | Aggregate::Sum => {
                if let Some(v) = cell.as_f64() {
                    count += 1;
                    sum += v;
                }
            }
        }
    }
    if count == 0 {
        return Measure::NotAvailable;
    }
    match op {
        Aggregate::Mean => Measure::Value(sum / count as f64),
        Aggregate::Sum => Measure::Value(sum),
        Aggregate::Count => Measure::Value(count as f64),
    }
}

/// One group of a grouped aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub key: Value,
    pub measure: Measure,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult<'t> {
    /// Matching rows in table order (no aggregation requested).
    Rows(Vec<&'t [Value]>),
    /// Aggregate over all matching rows.
    Total(Measure),
    /// Aggregate per group key.
    Groups(Vec<Group>),
}

impl QueryResult<'_> {
    /// True when the selection matched nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Rows(rows) => rows.is_empty(),
            Self::Total(measure) => !measure.is_available(),
            Self::Groups(groups) => groups.is_empty(),
        }
    }
}

/// Filter, group and aggregate specification over one table.
#[derive(Debug, Clone, Default)]
pub struct Query {
    filters: Vec<(String, Value)>,
    group_by: Option<(String, GroupOrder)>,
    aggregation: Option<(String, Aggregate)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep rows whose `field` equals `value` exactly.
    pub fn filter(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    /// Like `filter`, but an absent or empty selection passes every row.
    pub fn filter_opt(self, field: &str, value: Option<&str>) -> Self {
        match value.filter(|v| !v.is_empty()) {
            Some(v) => self.filter(field, v),
            None => self,
        }
    }

    pub fn group_by(mut self, field: &str, order: GroupOrder) -> Self {
        self.group_by = Some((field.to_string(), order));
        self
    }

    pub fn aggregate(mut self, field: &str, op: Aggregate) -> Self {
        self.aggregation = Some((field.to_string(), op));
        self
    }

    /// Matching rows only, ignoring grouping and aggregation.
    pub fn select<'t>(&self, table: &'t Table) -> Result<Vec<&'t [Value]>, Notice> {
        let filters = self
            .filters
            .iter()
            .map(|(field, value)| Ok((column(table, field)?, value)))
            .collect::<Result<Vec<_>, Notice>>()?;

        Ok(table
            .rows
            .iter()
            .filter(|row| filters.iter().all(|(idx, value)| row[*idx].matches(value)))
            .map(Vec::as_slice)
            .collect())
    }

    pub fn run<'t>(&self, table: &'t Table) -> Result<QueryResult<'t>, Notice> {
        let group = self
            .group_by
            .as_ref()
            .map(|(field, order)| Ok::<_, Notice>((column(table, field)?, *order)))
            .transpose()?;
        let aggregation = self
            .aggregation
            .as_ref()
            .map(|(field, op)| Ok::<_, Notice>((column(table, field)?, *op)))
            .transpose()?;

        let rows = self.select(table)?;

        let Some((value_idx, op)) = aggregation else {
            return Ok(QueryResult::Rows(rows));
        };

        let Some((key_idx, order)) = group else {
            return Ok(QueryResult::Total(aggregate(
                rows.iter().map(|row| &row[value_idx]),
                op,
            )));
        };

        let mut buckets: Vec<(Value, Vec<&Value>)> = Vec::new();
        for row in &rows {
            let key = &row[key_idx];
            if key.is_missing() {
                continue;
            }
            match buckets.iter_mut().find(|(k, _)| k.matches(key)) {
                Some((_, cells)) => cells.push(&row[value_idx]),
                None => buckets.push((key.clone(), vec![&row[value_idx]])),
            }
        }

        if order == GroupOrder::Ascending {
            buckets.sort_by(|(a, _), (b, _)| a.sort_cmp(b));
        }

        Ok(QueryResult::Groups(
            buckets
                .into_iter()
                .map(|(key, cells)| Group {
                    key,
                    measure: aggregate(cells, op),
                })
                .collect(),
        ))
    }
}

fn column(table: &Table, field: &str) -> Result<usize, Notice> {
    table
        .column_index(field)
        .ok_or_else(|| Notice::missing_column(field))
}
