//! Displayable artifacts returned by dashboard sections.
//!
//! An artifact is a complete, immutable description of one output region:
//! cards, a chart, a heat bar, a table, a map, or an alert. The front-end
//! draws it as-is.

use serde::Serialize;

use crate::errors::{AlertLevel, Notice};
use crate::models::table::Value;

/// Rows per page for every data table.
pub const TABLE_PAGE_SIZE: usize = 15;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    Cards { cards: Vec<SummaryCard> },
    Chart(Chart),
    HeatBar(HeatBar),
    Table(DataTable),
    Choropleth(Choropleth),
    Alert { level: AlertLevel, message: String },
}

impl Artifact {
    pub fn is_alert(&self) -> bool {
        matches!(self, Self::Alert { .. })
    }
}

impl From<Notice> for Artifact {
    fn from(notice: Notice) -> Self {
        Self::Alert {
            level: notice.level(),
            message: notice.to_string(),
        }
    }
}

/// Color band for a summary card.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    High,
    Medium,
    Low,
}

impl Tier {
    pub const HIGH_THRESHOLD: f64 = 90.0;
    pub const MEDIUM_THRESHOLD: f64 = 70.0;

    /// `>= 90` high, `>= 70` medium, anything else (including N/A) low.
    pub fn of(value: Option<f64>) -> Self {
        match value {
            Some(v) if v >= Self::HIGH_THRESHOLD => Self::High,
            Some(v) if v >= Self::MEDIUM_THRESHOLD => Self::Medium,
            _ => Self::Low,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::High => "success",
            Self::Medium => "warning",
            Self::Low => "danger",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::High => "fas fa-check-circle",
            Self::Medium => "fas fa-exclamation-triangle",
            Self::Low => "fas fa-times-circle",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryCard {
    pub title: String,
    /// Raw value rounded to one decimal; `null` when not available.
    pub value: Option<f64>,
    pub display: String,
    pub color: String,
    pub icon: String,
    pub tier: Option<Tier>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Chart {
    pub chart_type: ChartType,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<ChartPoint>,
    pub color_scale: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatBarEntry {
    pub label: String,
    pub value: f64,
    pub color: String,
}

/// Horizontal bars sorted descending, standing in for a geographic heat map.
#[derive(Debug, Clone, Serialize)]
pub struct HeatBar {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<HeatBarEntry>,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableColumn {
    pub id: String,
    pub name: String,
    pub numeric: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableRow {
    pub cells: Vec<Value>,
    pub background: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataTable {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<TableRow>,
    pub header_color: String,
    pub striped: bool,
    pub sortable: bool,
    pub page_size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapValue {
    pub municipio: String,
    pub value: f64,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Choropleth {
    pub title: String,
    pub feature_key: String,
    pub geojson: serde_json::Value,
    pub values: Vec<MapValue>,
}
