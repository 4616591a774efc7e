//! View renderer: turns a query result into a displayable artifact.

use serde::Deserialize;

use crate::errors::Notice;
use crate::models::artifact::{
    Artifact, Chart, ChartPoint, ChartType, DataTable, HeatBar, HeatBarEntry, SummaryCard,
    TableColumn, TableRow, Tier, TABLE_PAGE_SIZE,
};
use crate::models::table::{round1, Table, Value};
use crate::services::query::{aggregate, Aggregate, Group, Measure};

/// Continuous scale used for bar and heat-bar coloring.
pub const COLOR_SCALE: &str = "RdYlGn";

const DEFAULT_HEADER_COLOR: &str = "#0d6efd";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    SummaryCards,
    Bar,
    Line,
    Pie,
    HeatBar,
    Table,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub label: String,
    pub measure: Measure,
}

/// Labelled values ready to be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn new(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            points: Vec::new(),
        }
    }

    pub fn push(&mut self, label: impl Into<String>, measure: Measure) {
        self.points.push(SeriesPoint {
            label: label.into(),
            measure,
        });
    }

    /// One point per field: the mean of that column over `rows`.
    pub fn column_means(
        mut self,
        table: &Table,
        rows: &[&[Value]],
        fields: &[&str],
    ) -> Result<Self, Notice> {
        for field in fields {
            let idx = table
                .column_index(field)
                .ok_or_else(|| Notice::missing_column(*field))?;
            let measure = aggregate(rows.iter().map(|row| &row[idx]), Aggregate::Mean);
            self.push(humanize(field), measure);
        }
        Ok(self)
    }

    /// One point per row, labelled by `label_field` and valued by `value_field`.
    pub fn from_rows(
        mut self,
        table: &Table,
        rows: &[&[Value]],
        label_field: &str,
        value_field: &str,
    ) -> Result<Self, Notice> {
        let label_idx = table
            .column_index(label_field)
            .ok_or_else(|| Notice::missing_column(label_field))?;
        let value_idx = table
            .column_index(value_field)
            .ok_or_else(|| Notice::missing_column(value_field))?;
        for row in rows {
            let measure = row[value_idx]
                .as_f64()
                .map_or(Measure::NotAvailable, Measure::Value);
            self.push(row[label_idx].label(), measure);
        }
        Ok(self)
    }

    pub fn from_groups(mut self, groups: &[Group]) -> Self {
        for group in groups {
            self.push(group.key.label(), group.measure);
        }
        self
    }

    /// Points that have a value, in series order.
    fn available(&self) -> impl Iterator<Item = (&str, f64)> {
        self.points
            .iter()
            .filter_map(|p| p.measure.value().map(|v| (p.label.as_str(), v)))
    }
}

/// Render a series in the requested view mode.
pub fn render(series: &Series, mode: ViewMode) -> Artifact {
    if series.points.is_empty() {
        return Notice::EmptyResult(format!("No hay datos para {}", series.title)).into();
    }
    match mode {
        ViewMode::SummaryCards => summary_cards(series),
        ViewMode::Bar => chart(series, ChartType::Bar),
        ViewMode::Line => chart(series, ChartType::Line),
        ViewMode::Pie => chart(series, ChartType::Pie),
        ViewMode::HeatBar => heat_bar(series),
        ViewMode::Table => series_table(series),
    }
}

fn summary_cards(series: &Series) -> Artifact {
    let cards = series
        .points
        .iter()
        .map(|point| {
            let rounded = point.measure.rounded();
            let tier = Tier::of(point.measure.value());
            SummaryCard {
                title: point.label.clone(),
                value: rounded.value(),
                display: rounded.display_percent(),
                color: tier.color().to_string(),
                icon: tier.icon().to_string(),
                tier: Some(tier),
            }
        })
        .collect();
    Artifact::Cards { cards }
}

fn chart(series: &Series, chart_type: ChartType) -> Artifact {
    let points: Vec<ChartPoint> = series
        .available()
        .map(|(label, value)| ChartPoint {
            label: label.to_string(),
            value,
        })
        .collect();

    if points.is_empty() {
        return Notice::EmptyResult(format!("No hay datos para {}", series.title)).into();
    }
    if chart_type == ChartType::Pie && points.iter().any(|p| p.value < 0.0) {
        return Notice::NegativeValues.into();
    }

    Artifact::Chart(Chart {
        chart_type,
        title: series.title.clone(),
        x_label: series.x_label.clone(),
        y_label: series.y_label.clone(),
        points,
        color_scale: (chart_type == ChartType::Bar).then(|| COLOR_SCALE.to_string()),
    })
}

fn heat_bar(series: &Series) -> Artifact {
    let mut bars: Vec<HeatBarEntry> = series
        .available()
        .map(|(label, value)| HeatBarEntry {
            label: label.to_string(),
            value,
            color: scale_color(value),
        })
        .collect();

    if bars.is_empty() {
        return Notice::EmptyResult(format!("No hay datos para {}", series.title)).into();
    }
    bars.sort_by(|a, b| b.value.total_cmp(&a.value));

    let height = (bars.len() as u32 * 30).max(400);
    Artifact::HeatBar(HeatBar {
        title: series.title.clone(),
        x_label: series.x_label.clone(),
        y_label: series.y_label.clone(),
        bars,
        height,
    })
}

fn series_table(series: &Series) -> Artifact {
    let columns = vec![
        TableColumn {
            id: "label".to_string(),
            name: series.x_label.clone(),
            numeric: false,
        },
        TableColumn {
            id: "value".to_string(),
            name: series.y_label.clone(),
            numeric: true,
        },
    ];
    let rows = series
        .points
        .iter()
        .map(|p| TableRow {
            cells: vec![
                Value::Text(p.label.clone()),
                p.measure.value().map_or(Value::Missing, |v| Value::Number(round1(v))),
            ],
            background: None,
        })
        .collect();
    Artifact::Table(data_table(columns, rows, DEFAULT_HEADER_COLOR))
}

/// Tabular rendering of raw rows, restricted to `columns` in that order.
pub fn render_rows(
    table: &Table,
    rows: &[&[Value]],
    columns: &[&str],
    header_color: &str,
) -> Artifact {
    let mut indices = Vec::with_capacity(columns.len());
    let mut headers = Vec::with_capacity(columns.len());
    for name in columns {
        let Some(idx) = table.column_index(name) else {
            return Notice::missing_column(*name).into();
        };
        let column = &table.columns[idx];
        indices.push(idx);
        headers.push(TableColumn {
            id: column.name.clone(),
            name: humanize(&column.name),
            numeric: column.kind.is_numeric(),
        });
    }

    let rows = rows
        .iter()
        .map(|row| TableRow {
            cells: indices.iter().map(|idx| row[*idx].rounded()).collect(),
            background: None,
        })
        .collect();

    Artifact::Table(data_table(headers, rows, header_color))
}

/// Striped, sortable table with the fixed page size.
pub fn data_table(columns: Vec<TableColumn>, rows: Vec<TableRow>, header_color: &str) -> DataTable {
    DataTable {
        columns,
        rows,
        header_color: header_color.to_string(),
        striped: true,
        sortable: true,
        page_size: TABLE_PAGE_SIZE,
    }
}

/// `CPN_Precoz` → `Cpn Precoz`.
pub fn humanize(name: &str) -> String {
    name.replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Red → yellow → green color for a percentage, clamped to [0, 100].
pub fn scale_color(value: f64) -> String {
    const RED: (f64, f64, f64) = (215.0, 48.0, 39.0);
    const YELLOW: (f64, f64, f64) = (254.0, 224.0, 139.0);
    const GREEN: (f64, f64, f64) = (26.0, 152.0, 80.0);

    let t = (value / 100.0).clamp(0.0, 1.0);
    let (from, to, local) = if t < 0.5 {
        (RED, YELLOW, t * 2.0)
    } else {
        (YELLOW, GREEN, (t - 0.5) * 2.0)
    };
    let lerp = |a: f64, b: f64| (a + (b - a) * local).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        lerp(from.0, to.0),
        lerp(from.1, to.1),
        lerp(from.2, to.2)
    )
}
