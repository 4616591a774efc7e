//! Prenatal care (CPN) and pregnant-women sections.

use serde::{Deserialize, Serialize};

use crate::errors::Notice;
use crate::loader::Dataset;
use crate::models::artifact::Artifact;
use crate::models::columns::{prenatal, pregnant};
use crate::models::table::Table;
use crate::services::query::{Aggregate, GroupOrder, Query, QueryResult};
use crate::services::render::{render, render_rows, Series, ViewMode};
use crate::services::selected;

/// Municipality control value meaning "no municipality filter".
pub const ALL_MUNICIPALITIES: &str = "Todos";

const CPN_HEADER_COLOR: &str = "#ffc107";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CpnView {
    #[default]
    Resumen,
    Barras,
    MapaCalor,
    Tabla,
}

/// Controls of the CPN section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CpnSelection {
    pub municipio: Option<String>,
    #[serde(default)]
    pub vista: CpnView,
    pub indicador: Option<String>,
}

/// Controls of the pregnant-women heat bar.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PregnantSelection {
    pub indicador: Option<String>,
}

/// Numeric columns of a per-municipality table, minus identifier columns.
pub fn indicator_columns(table: &Table) -> Vec<&str> {
    table
        .numeric_columns()
        .into_iter()
        .filter(|name| !prenatal::NON_INDICATOR.contains(&name.to_lowercase().as_str()))
        .collect()
}

pub fn cpn(data: &Dataset, selection: &CpnSelection) -> Result<Artifact, Notice> {
    let table = &data.prenatal;
    if table.is_empty() {
        return Err(Notice::missing_source("CPN"));
    }

    let municipality = selected(&selection.municipio).filter(|m| *m != ALL_MUNICIPALITIES);
    let rows = Query::new()
        .filter_opt(prenatal::MUNICIPALITY, municipality)
        .select(table)?;
    if rows.is_empty() {
        return Err(Notice::EmptyResult(format!(
            "No hay datos para {}",
            municipality.unwrap_or(ALL_MUNICIPALITIES)
        )));
    }

    let indicators = indicator_columns(table);
    let scope = municipality.unwrap_or("Cauca");

    match selection.vista {
        CpnView::Resumen | CpnView::Barras => {
            if indicators.is_empty() {
                return Err(Notice::EmptyResult(
                    "No se encontraron indicadores".to_string(),
                ));
            }
            let series = Series::new(format!("Indicadores CPN - {scope}"), "Indicador", "Valor (%)")
                .column_means(table, &rows, &indicators)?;
            let mode = if selection.vista == CpnView::Resumen {
                ViewMode::SummaryCards
            } else {
                ViewMode::Bar
            };
            Ok(render(&series, mode))
        }
        CpnView::MapaCalor => {
            let Some(indicator) = selected(&selection.indicador) else {
                return Err(Notice::SelectionRequired(
                    "Seleccione un indicador para el mapa de calor".to_string(),
                ));
            };
            let series = municipality_heat_series(
                table,
                prenatal::MUNICIPALITY,
                indicator,
                format!("Mapa de calor - {indicator}"),
            )?;
            Ok(render(&series, ViewMode::HeatBar))
        }
        CpnView::Tabla => {
            let columns: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
            Ok(render_rows(table, &rows, &columns, CPN_HEADER_COLOR))
        }
    }
}

pub fn pregnant_women(data: &Dataset, selection: &PregnantSelection) -> Result<Artifact, Notice> {
    let table = &data.pregnant;
    if table.is_empty() {
        return Err(Notice::missing_source("gestantes"));
    }

    let indicator = match selected(&selection.indicador) {
        Some(indicator) => indicator,
        None => default_pregnant_indicator(table).ok_or_else(|| {
            Notice::EmptyResult("No hay indicadores numéricos de gestantes".to_string())
        })?,
    };

    let series = municipality_heat_series(
        table,
        pregnant::MUNICIPALITY,
        indicator,
        format!("{indicator} por municipio"),
    )?;
    Ok(render(&series, ViewMode::HeatBar))
}

/// First numeric indicator column of the table.
pub fn default_pregnant_indicator(table: &Table) -> Option<&str> {
    indicator_columns(table).first().copied()
}

/// Mean of `indicator` per municipality over the whole table.
fn municipality_heat_series(
    table: &Table,
    municipality_field: &str,
    indicator: &str,
    title: String,
) -> Result<Series, Notice> {
    let series = Series::new(title, indicator, "Municipio");
    match Query::new()
        .group_by(municipality_field, GroupOrder::FirstSeen)
        .aggregate(indicator, Aggregate::Mean)
        .run(table)?
    {
        QueryResult::Groups(groups) => Ok(series.from_groups(&groups)),
        QueryResult::Rows(_) | QueryResult::Total(_) => Ok(series),
    }
}
