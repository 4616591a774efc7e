//! Sections over the indicator table: category chart, semáforo and sexual violence.

use serde::{Deserialize, Serialize};

use crate::errors::Notice;
use crate::loader::{BoundaryLayer, Dataset};
use crate::models::artifact::{Artifact, Choropleth, MapValue, TableColumn, TableRow};
use crate::models::columns::indicator;
use crate::models::table::{round1, Table, Value};
use crate::services::query::{Aggregate, Group, GroupOrder, Query, QueryResult};
use crate::services::render::{data_table, render, render_rows, scale_color, Series, ViewMode};
use crate::services::selected;
use crate::services::semaforo::{classify, DEFAULT_TARGET};

const SEMAFORO_HEADER_COLOR: &str = "#28a745";
const VIOLENCE_HEADER_COLOR: &str = "#dc3545";
const NO_STATUS: &str = "Sin dato";

/// Chart type of the category section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartKind {
    #[default]
    #[serde(rename = "Barras", alias = "bar")]
    Bar,
    #[serde(rename = "Línea", alias = "line")]
    Line,
    #[serde(rename = "Pastel", alias = "pie")]
    Pie,
}

impl From<ChartKind> for ViewMode {
    fn from(kind: ChartKind) -> Self {
        match kind {
            ChartKind::Bar => ViewMode::Bar,
            ChartKind::Line => ViewMode::Line,
            ChartKind::Pie => ViewMode::Pie,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategorySelection {
    pub categoria: Option<String>,
    pub municipio: Option<String>,
    #[serde(default)]
    pub tipo: ChartKind,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SemaforoSelection {
    pub municipio: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolenceView {
    #[default]
    Grafico,
    Tabla,
    Tendencia,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViolenceSelection {
    pub municipio: Option<String>,
    #[serde(default)]
    pub vista: ViolenceView,
}

fn require_indicators(data: &Dataset) -> Result<&Table, Notice> {
    if data.indicators.is_empty() {
        return Err(Notice::missing_source("indicadores"));
    }
    Ok(&data.indicators)
}

/// `Valor (%)` per indicator for one category and municipality.
pub fn category_chart(data: &Dataset, selection: &CategorySelection) -> Result<Artifact, Notice> {
    let table = require_indicators(data)?;
    let (Some(category), Some(municipality)) =
        (selected(&selection.categoria), selected(&selection.municipio))
    else {
        return Err(Notice::SelectionRequired(
            "Seleccione categoría y municipio".to_string(),
        ));
    };

    let rows = Query::new()
        .filter(indicator::CATEGORY, category)
        .filter(indicator::MUNICIPALITY, municipality)
        .select(table)?;
    if rows.is_empty() {
        return Err(Notice::EmptyResult(format!(
            "No hay datos para {category} - {municipality}"
        )));
    }

    let series = Series::new(
        format!("{category} - {municipality}"),
        indicator::INDICATOR,
        indicator::VALUE,
    )
    .from_rows(table, &rows, indicator::INDICATOR, indicator::VALUE)?;
    Ok(render(&series, selection.tipo.into()))
}

/// Compliance table of every indicator of one municipality.
pub fn semaforo(data: &Dataset, selection: &SemaforoSelection) -> Result<Artifact, Notice> {
    let table = require_indicators(data)?;
    let Some(municipality) = selected(&selection.municipio) else {
        return Err(Notice::SelectionRequired("Seleccione un municipio".to_string()));
    };

    let rows = Query::new()
        .filter(indicator::MUNICIPALITY, municipality)
        .select(table)?;
    if rows.is_empty() {
        return Err(Notice::EmptyResult(format!("No hay datos para {municipality}")));
    }

    let name_idx = index(table, indicator::INDICATOR)?;
    let value_idx = index(table, indicator::VALUE)?;
    let target_idx = index(table, indicator::TARGET)?;

    let rows = rows
        .iter()
        .map(|row| {
            let value = row[value_idx].as_f64();
            let target = row[target_idx].as_f64().unwrap_or(DEFAULT_TARGET);
            let status = value.map(|v| classify(v, target));
            TableRow {
                cells: vec![
                    row[name_idx].clone(),
                    value.map_or(Value::Missing, |v| Value::Number(round1(v))),
                    Value::Number(round1(target)),
                    Value::Text(status.map_or(NO_STATUS, |s| s.label()).to_string()),
                ],
                background: status.map(|s| s.background().to_string()),
            }
        })
        .collect();

    let columns = vec![
        text_column(indicator::INDICATOR),
        numeric_column(indicator::VALUE),
        numeric_column(indicator::TARGET),
        text_column("Estado"),
    ];
    Ok(Artifact::Table(data_table(columns, rows, SEMAFORO_HEADER_COLOR)))
}

/// Sexual-violence indicators of one municipality as chart, table or yearly trend.
pub fn sexual_violence(data: &Dataset, selection: &ViolenceSelection) -> Result<Artifact, Notice> {
    let table = require_indicators(data)?;
    let Some(municipality) = selected(&selection.municipio) else {
        return Err(Notice::SelectionRequired("Seleccione un municipio".to_string()));
    };

    let query = Query::new()
        .filter(indicator::CATEGORY, indicator::SEXUAL_VIOLENCE)
        .filter(indicator::MUNICIPALITY, municipality);
    let rows = query.select(table)?;
    if rows.is_empty() {
        return Err(Notice::EmptyResult(format!(
            "No hay datos de violencia sexual para {municipality}"
        )));
    }

    match selection.vista {
        ViolenceView::Grafico => {
            let groups = grouped(
                query
                    .group_by(indicator::INDICATOR, GroupOrder::FirstSeen)
                    .aggregate(indicator::VALUE, Aggregate::Mean)
                    .run(table)?,
            );
            let series = Series::new(
                format!("Violencia Sexual - {municipality}"),
                indicator::INDICATOR,
                indicator::VALUE,
            )
            .from_groups(&groups);
            Ok(render(&series, ViewMode::Bar))
        }
        ViolenceView::Tabla => {
            let mut columns = vec![indicator::INDICATOR, indicator::VALUE, indicator::TARGET];
            if table.has_column(indicator::YEAR) {
                columns.insert(0, indicator::YEAR);
            }
            Ok(render_rows(table, &rows, &columns, VIOLENCE_HEADER_COLOR))
        }
        ViolenceView::Tendencia => {
            let groups = grouped(
                query
                    .group_by(indicator::YEAR, GroupOrder::Ascending)
                    .aggregate(indicator::VALUE, Aggregate::Mean)
                    .run(table)?,
            );
            let series = Series::new(
                format!("Tendencia Violencia Sexual - {municipality}"),
                indicator::YEAR,
                indicator::VALUE,
            )
            .from_groups(&groups);
            Ok(render(&series, ViewMode::Line))
        }
    }
}

/// Mean sexual-violence value per municipality: a map when boundaries are
/// loaded, a heat bar otherwise.
pub fn violence_map(data: &Dataset) -> Result<Artifact, Notice> {
    let table = require_indicators(data)?;
    let groups = grouped(
        Query::new()
            .filter(indicator::CATEGORY, indicator::SEXUAL_VIOLENCE)
            .group_by(indicator::MUNICIPALITY, GroupOrder::FirstSeen)
            .aggregate(indicator::VALUE, Aggregate::Mean)
            .run(table)?,
    );
    if groups.is_empty() {
        return Err(Notice::EmptyResult(
            "No hay datos de violencia sexual disponibles".to_string(),
        ));
    }

    let title = "Violencia sexual por municipio";
    match &data.boundaries {
        Some(layer) => Ok(choropleth(layer, title, &groups)),
        None => {
            let series = Series::new(title, indicator::VALUE, indicator::MUNICIPALITY)
                .from_groups(&groups);
            Ok(render(&series, ViewMode::HeatBar))
        }
    }
}

fn choropleth(
    layer: &BoundaryLayer,
    title: &str,
    groups: &[Group],
) -> Artifact {
    let values = groups
        .iter()
        .filter_map(|group| {
            let value = group.measure.rounded().value()?;
            let municipio = group.key.label();
            if !layer.contains(&municipio) {
                tracing::debug!(municipio = %municipio, "Municipality has no boundary feature");
            }
            Some(MapValue {
                municipio,
                value,
                color: scale_color(value),
            })
        })
        .collect();

    Artifact::Choropleth(Choropleth {
        title: title.to_string(),
        feature_key: BoundaryLayer::feature_key(),
        geojson: layer.geojson.clone(),
        values,
    })
}

fn grouped(result: QueryResult<'_>) -> Vec<Group> {
    match result {
        QueryResult::Groups(groups) => groups,
        QueryResult::Rows(_) | QueryResult::Total(_) => Vec::new(),
    }
}

fn index(table: &Table, name: &str) -> Result<usize, Notice> {
    table
        .column_index(name)
        .ok_or_else(|| Notice::missing_column(name))
}

fn text_column(name: &str) -> TableColumn {
    TableColumn {
        id: name.to_string(),
        name: name.to_string(),
        numeric: false,
    }
}

fn numeric_column(name: &str) -> TableColumn {
    TableColumn {
        numeric: true,
        ..text_column(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::table::{Column, ColumnKind};
    use crate::services::semaforo::Status;

    fn indicators(with_year: bool) -> Table {
        let mut columns = vec![
            Column::new(indicator::MUNICIPALITY, ColumnKind::Text),
            Column::new(indicator::CATEGORY, ColumnKind::Text),
            Column::new(indicator::INDICATOR, ColumnKind::Text),
            Column::new(indicator::VALUE, ColumnKind::Number),
            Column::new(indicator::TARGET, ColumnKind::Number),
        ];
        if with_year {
            columns.push(Column::new(indicator::YEAR, ColumnKind::Integer));
        }
        let mut table = Table::new("indicadores", columns);
        let rows: [(&str, &str, &str, Option<f64>, Option<f64>, i64); 6] = [
            ("Popayán", "Materno", "CPN Precoz", Some(92.0), Some(90.0), 2023),
            ("Popayán", "Materno", "Parto Institucional", Some(75.0), Some(90.0), 2023),
            ("Popayán", "Materno", "Tamizaje", Some(50.0), None, 2023),
            ("Popayán", "Violencia Sexual", "Atención VS", Some(20.0), Some(80.0), 2024),
            ("Popayán", "Violencia Sexual", "Atención VS", Some(30.0), Some(80.0), 2023),
            ("Timbío", "Violencia Sexual", "Atención VS", None, Some(80.0), 2023),
        ];
        for (m, c, i, v, t, y) in rows {
            let mut row = vec![
                m.into(),
                c.into(),
                i.into(),
                v.map_or(Value::Missing, Value::Number),
                t.map_or(Value::Missing, Value::Number),
            ];
            if with_year {
                row.push(Value::Integer(y));
            }
            table.push_row(row);
        }
        table
    }

    fn dataset(with_year: bool) -> Dataset {
        Dataset::from_tables(
            indicators(with_year),
            Table::default(),
            Table::default(),
            Table::default(),
        )
    }

    #[test]
    fn category_chart_requires_both_controls() {
        let sel = CategorySelection {
            categoria: Some("Materno".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            category_chart(&dataset(false), &sel).unwrap_err(),
            Notice::SelectionRequired(_)
        ));
    }

    #[test]
    fn category_chart_plots_values_by_indicator() {
        let sel = CategorySelection {
            categoria: Some("Materno".to_string()),
            municipio: Some("Popayán".to_string()),
            tipo: ChartKind::Line,
        };
        let Artifact::Chart(chart) = category_chart(&dataset(false), &sel).unwrap() else {
            panic!("expected chart");
        };
        assert_eq!(chart.title, "Materno - Popayán");
        assert_eq!(chart.points.len(), 3);
        assert_eq!(chart.points[0].label, "CPN Precoz");
    }

    #[test]
    fn category_chart_unmatched_selection() {
        let sel = CategorySelection {
            categoria: Some("Materno".to_string()),
            municipio: Some("Timbío".to_string()),
            tipo: ChartKind::Bar,
        };
        assert_eq!(
            category_chart(&dataset(false), &sel).unwrap_err(),
            Notice::EmptyResult("No hay datos para Materno - Timbío".to_string())
        );
    }

    #[test]
    fn chart_kind_accepts_display_names() {
        let sel: CategorySelection =
            serde_json::from_value(serde_json::json!({"tipo": "Pastel"})).unwrap();
        assert_eq!(sel.tipo, ChartKind::Pie);
        let sel: CategorySelection =
            serde_json::from_value(serde_json::json!({"tipo": "line"})).unwrap();
        assert_eq!(sel.tipo, ChartKind::Line);
    }

    #[test]
    fn semaforo_statuses_and_default_target() {
        let sel = SemaforoSelection {
            municipio: Some("Popayán".to_string()),
        };
        let Artifact::Table(table) = semaforo(&dataset(false), &sel).unwrap() else {
            panic!("expected table");
        };
        let statuses: Vec<Value> = table.rows.iter().map(|r| r.cells[3].clone()).collect();
        assert_eq!(
            statuses,
            vec![
                Value::from(Status::Meets.label()),
                Value::from(Status::Partial.label()),
                Value::from(Status::BelowTarget.label()),
                Value::from(Status::BelowTarget.label()),
                Value::from(Status::BelowTarget.label()),
            ]
        );
        assert_eq!(table.rows[2].cells[2], Value::Number(90.0));
        assert_eq!(table.rows[0].background.as_deref(), Some("#d4edda"));
        assert_eq!(table.header_color, "#28a745");
    }

    #[test]
    fn semaforo_missing_value_has_no_status() {
        let sel = SemaforoSelection {
            municipio: Some("Timbío".to_string()),
        };
        let Artifact::Table(table) = semaforo(&dataset(false), &sel).unwrap() else {
            panic!("expected table");
        };
        assert_eq!(table.rows[0].cells[3], Value::from("Sin dato"));
        assert!(table.rows[0].background.is_none());
    }

    #[test]
    fn violence_chart_and_table() {
        let sel = ViolenceSelection {
            municipio: Some("Popayán".to_string()),
            vista: ViolenceView::Grafico,
        };
        let Artifact::Chart(chart) = sexual_violence(&dataset(false), &sel).unwrap() else {
            panic!("expected chart");
        };
        assert_eq!(chart.points.len(), 1);
        assert_eq!(chart.points[0].value, 25.0);

        let sel = ViolenceSelection {
            vista: ViolenceView::Tabla,
            ..sel
        };
        let Artifact::Table(table) = sexual_violence(&dataset(false), &sel).unwrap() else {
            panic!("expected table");
        };
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.header_color, "#dc3545");
    }

    #[test]
    fn violence_trend_groups_by_year_ascending() {
        let sel = ViolenceSelection {
            municipio: Some("Popayán".to_string()),
            vista: ViolenceView::Tendencia,
        };
        let Artifact::Chart(chart) = sexual_violence(&dataset(true), &sel).unwrap() else {
            panic!("expected chart");
        };
        let labels: Vec<&str> = chart.points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2023", "2024"]);
        assert_eq!(chart.points[0].value, 30.0);
    }

    #[test]
    fn violence_trend_without_year_column() {
        let sel = ViolenceSelection {
            municipio: Some("Popayán".to_string()),
            vista: ViolenceView::Tendencia,
        };
        assert_eq!(
            sexual_violence(&dataset(false), &sel).unwrap_err(),
            Notice::missing_column(indicator::YEAR)
        );
    }

    #[test]
    fn violence_map_falls_back_to_heat_bar() {
        let Artifact::HeatBar(heat) = violence_map(&dataset(false)).unwrap() else {
            panic!("expected heat bar");
        };
        assert_eq!(heat.bars.len(), 1);
        assert_eq!(heat.bars[0].label, "Popayán");
    }

    #[test]
    fn violence_map_uses_boundaries_when_loaded() {
        let mut data = dataset(false);
        let geojson = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"NOMBRE_MUN":"Popayán"},"geometry":null}]}"#;
        data.boundaries = Some(BoundaryLayer::from_slice(geojson.as_bytes()).unwrap());
        let Artifact::Choropleth(map) = violence_map(&data).unwrap() else {
            panic!("expected map");
        };
        assert_eq!(map.feature_key, "properties.NOMBRE_MUN");
        assert_eq!(map.values.len(), 1);
        assert_eq!(map.values[0].value, 25.0);
    }

    #[test]
    fn empty_indicator_table_is_missing_source() {
        let data = Dataset::default();
        assert_eq!(
            violence_map(&data).unwrap_err(),
            Notice::missing_source("indicadores")
        );
    }
}
