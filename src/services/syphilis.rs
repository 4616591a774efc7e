//! Syphilis surveillance: weekly case counts per event.

use serde::{Deserialize, Serialize};

use crate::errors::Notice;
use crate::loader::Dataset;
use crate::models::artifact::{Artifact, Chart};
use crate::models::columns::syphilis;
use crate::models::table::Table;
use crate::services::query::{Aggregate, GroupOrder, Query, QueryResult};
use crate::services::render::{render, Series, ViewMode};
use crate::services::selected;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyphilisEvent {
    #[default]
    Gestacional,
    Congenita,
}

impl SyphilisEvent {
    pub const ALL: [SyphilisEvent; 2] = [Self::Gestacional, Self::Congenita];

    /// Value of the `evento` column for this event.
    pub fn label(self) -> &'static str {
        match self {
            Self::Gestacional => "Sífilis Gestacional",
            Self::Congenita => "Sífilis Congénita",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyphilisSelection {
    #[serde(default)]
    pub tab: SyphilisEvent,
    pub municipio: Option<String>,
    pub eps: Option<String>,
}

/// Dropdown options restricted to one event.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SyphilisOptions {
    pub event: SyphilisEvent,
    pub municipios: Vec<String>,
    pub eps: Vec<String>,
}

pub fn weekly_cases(data: &Dataset, selection: &SyphilisSelection) -> Result<Artifact, Notice> {
    let table = &data.syphilis;
    if table.is_empty() {
        return Err(Notice::missing_source("sífilis"));
    }

    let event = selection.tab.label();
    let result = Query::new()
        .filter(syphilis::EVENT, event)
        .filter_opt(syphilis::MUNICIPALITY, selected(&selection.municipio))
        .filter_opt(syphilis::EPS, selected(&selection.eps))
        .group_by(syphilis::WEEK, GroupOrder::Ascending)
        .aggregate(syphilis::CASES, Aggregate::Sum)
        .run(table)?;

    let groups = match result {
        QueryResult::Groups(groups) if !groups.is_empty() => groups,
        _ => {
            return Err(Notice::EmptyResult(format!(
                "No hay casos de {event} para la selección"
            )))
        }
    };

    let series = Series::new(
        format!("Casos de {event} por semana epidemiológica"),
        "Semana",
        "Número de casos",
    )
    .from_groups(&groups);

    // Case counts are drawn in a single flat color.
    Ok(match render(&series, ViewMode::Bar) {
        Artifact::Chart(chart) => Artifact::Chart(Chart {
            color_scale: None,
            ..chart
        }),
        other => other,
    })
}

pub fn options(table: &Table, event: SyphilisEvent) -> SyphilisOptions {
    let distinct = |field: &str| -> Vec<String> {
        let Ok(rows) = Query::new().filter(syphilis::EVENT, event.label()).select(table) else {
            return Vec::new();
        };
        let Some(idx) = table.column_index(field) else {
            return Vec::new();
        };
        let mut values: Vec<String> = rows
            .iter()
            .filter_map(|row| row[idx].as_str().map(str::to_string))
            .collect();
        values.sort();
        values.dedup();
        values
    };

    SyphilisOptions {
        event,
        municipios: distinct(syphilis::MUNICIPALITY),
        eps: distinct(syphilis::EPS),
    }
}
