//! Headline KPIs and the option lists behind every dashboard control.

use regex::Regex;
use serde::Serialize;

use crate::errors::AppError;
use crate::loader::Dataset;
use crate::models::artifact::{Artifact, SummaryCard};
use crate::models::columns::{indicator, prenatal as prenatal_columns};
use crate::models::table::Table;
use crate::services::indicators::{ChartKind, ViolenceView};
use crate::services::prenatal::{self, CpnView, ALL_MUNICIPALITIES};
use crate::services::query::{aggregate, Aggregate, Measure};
use crate::services::syphilis::{self, SyphilisEvent, SyphilisOptions};

const PRENATAL_PATTERN: &str = "(?i)CPN|Prenatal";
const BIRTH_PATTERN: &str = "(?i)Parto|Institucional";
const VIOLENCE_PATTERN: &str = "(?i)Violencia|Sexual";

/// The four headline cards over the indicator table.
pub fn kpis(data: &Dataset) -> Result<Artifact, AppError> {
    let table = &data.indicators;
    let prenatal_re = Regex::new(PRENATAL_PATTERN)?;
    let birth_re = Regex::new(BIRTH_PATTERN)?;
    let violence_re = Regex::new(VIOLENCE_PATTERN)?;

    let prenatal_coverage = mean_matching(table, &prenatal_re);
    let institutional_birth = mean_matching(table, &birth_re);
    let violence_cases = count_matching(table, indicator::CATEGORY, &violence_re);
    let municipalities = table.distinct_text(indicator::MUNICIPALITY).len();

    tracing::debug!(
        rows = table.len(),
        violence_cases,
        municipalities,
        "Computed KPIs"
    );

    let cards = vec![
        percent_card("Cobertura CPN Promedio", prenatal_coverage, "primary", "fas fa-user-md"),
        percent_card("Parto Institucional", institutional_birth, "success", "fas fa-hospital"),
        count_card("Casos Violencia Sexual", violence_cases, "warning", "fas fa-shield-alt"),
        count_card(
            "Municipios Monitoreados",
            municipalities,
            "info",
            "fas fa-map-marked-alt",
        ),
    ];
    Ok(Artifact::Cards { cards })
}

/// Mean `Valor (%)` over rows whose indicator name matches, falling back to
/// the mean over every row.
fn mean_matching(table: &Table, pattern: &Regex) -> Measure {
    let (Some(name_idx), Some(value_idx)) = (
        table.column_index(indicator::INDICATOR),
        table.column_index(indicator::VALUE),
    ) else {
        return Measure::NotAvailable;
    };

    let matching = aggregate(
        table
            .rows
            .iter()
            .filter(|row| row[name_idx].as_str().is_some_and(|name| pattern.is_match(name)))
            .map(|row| &row[value_idx]),
        Aggregate::Mean,
    );
    if matching.is_available() {
        return matching;
    }
    aggregate(table.rows.iter().map(|row| &row[value_idx]), Aggregate::Mean)
}

fn count_matching(table: &Table, field: &str, pattern: &Regex) -> usize {
    let Some(idx) = table.column_index(field) else {
        return 0;
    };
    table
        .rows
        .iter()
        .filter(|row| row[idx].as_str().is_some_and(|v| pattern.is_match(v)))
        .count()
}

fn percent_card(title: &str, measure: Measure, color: &str, icon: &str) -> SummaryCard {
    let rounded = measure.rounded();
    SummaryCard {
        title: title.to_string(),
        value: rounded.value(),
        display: rounded.display_percent(),
        color: color.to_string(),
        icon: icon.to_string(),
        tier: None,
    }
}

fn count_card(title: &str, count: usize, color: &str, icon: &str) -> SummaryCard {
    SummaryCard {
        title: title.to_string(),
        value: Some(count as f64),
        display: count.to_string(),
        color: color.to_string(),
        icon: icon.to_string(),
        tier: None,
    }
}

/// Defaults the front-end uses before the user touches a control.
#[derive(Debug, Serialize)]
pub struct ControlDefaults {
    pub categoria: Option<String>,
    pub categoria_municipio: Option<String>,
    pub tipo: ChartKind,
    pub semaforo_municipio: Option<String>,
    pub violencia_municipio: Option<String>,
    pub cpn_municipio: String,
    pub cpn_vista: CpnView,
    pub violencia_vista: ViolenceView,
    pub gestantes_indicador: Option<String>,
    pub sifilis_tab: SyphilisEvent,
}

/// Option lists for every dropdown on the page.
#[derive(Debug, Serialize)]
pub struct Controls {
    pub municipios: Vec<String>,
    pub categorias: Vec<String>,
    /// Municipalities with at least one sexual-violence row.
    pub violencia_municipios: Vec<String>,
    pub cpn_municipios: Vec<String>,
    pub cpn_indicadores: Vec<String>,
    pub gestantes_indicadores: Vec<String>,
    pub sifilis: Vec<SyphilisOptions>,
    pub defaults: ControlDefaults,
}

pub fn controls(data: &Dataset) -> Controls {
    let mut cpn_municipios = vec![ALL_MUNICIPALITIES.to_string()];
    cpn_municipios.extend(data.prenatal.distinct_text(prenatal_columns::MUNICIPALITY));

    let municipios = data.indicators.distinct_text(indicator::MUNICIPALITY);
    let categorias = data.indicators.distinct_text(indicator::CATEGORY);
    let violencia_municipios = violence_municipalities(&data.indicators);

    Controls {
        defaults: ControlDefaults {
            categoria: categorias.first().cloned(),
            categoria_municipio: municipios.first().cloned(),
            tipo: ChartKind::default(),
            semaforo_municipio: municipios.first().cloned(),
            violencia_municipio: violencia_municipios.first().cloned(),
            cpn_municipio: ALL_MUNICIPALITIES.to_string(),
            cpn_vista: CpnView::default(),
            violencia_vista: ViolenceView::default(),
            gestantes_indicador: prenatal::default_pregnant_indicator(&data.pregnant)
                .map(str::to_string),
            sifilis_tab: SyphilisEvent::default(),
        },
        municipios,
        categorias,
        violencia_municipios,
        cpn_municipios,
        cpn_indicadores: owned(prenatal::indicator_columns(&data.prenatal)),
        gestantes_indicadores: owned(prenatal::indicator_columns(&data.pregnant)),
        sifilis: SyphilisEvent::ALL
            .iter()
            .map(|event| syphilis::options(&data.syphilis, *event))
            .collect(),
    }
}

fn violence_municipalities(table: &Table) -> Vec<String> {
    let (Some(category_idx), Some(municipality_idx)) = (
        table.column_index(indicator::CATEGORY),
        table.column_index(indicator::MUNICIPALITY),
    ) else {
        return Vec::new();
    };
    let mut names: Vec<String> = table
        .rows
        .iter()
        .filter(|row| row[category_idx].as_str() == Some(indicator::SEXUAL_VIOLENCE))
        .filter_map(|row| row[municipality_idx].as_str().map(str::to_string))
        .collect();
    names.sort();
    names.dedup();
    names
}

fn owned(names: Vec<&str>) -> Vec<String> {
    names.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::sources::{IndicatorSource, PrenatalSource};
    use crate::loader::Source;
    use crate::models::table::{Column, ColumnKind, Value};

    fn indicators(rows: &[(&str, &str, &str, f64)]) -> Table {
        let mut table = Table::new(
            "indicadores",
            vec![
                Column::new(indicator::MUNICIPALITY, ColumnKind::Text),
                Column::new(indicator::CATEGORY, ColumnKind::Text),
                Column::new(indicator::INDICATOR, ColumnKind::Text),
                Column::new(indicator::VALUE, ColumnKind::Number),
            ],
        );
        for (m, c, i, v) in rows {
            table.push_row(vec![(*m).into(), (*c).into(), (*i).into(), Value::Number(*v)]);
        }
        table
    }

    fn cards(data: &Dataset) -> Vec<SummaryCard> {
        match kpis(data).unwrap() {
            Artifact::Cards { cards } => cards,
            other => panic!("expected cards, got {other:?}"),
        }
    }

    #[test]
    fn kpis_match_indicator_names_case_insensitively() {
        let table = indicators(&[
            ("Popayán", "Materno", "Cobertura cpn", 80.0),
            ("Timbío", "Materno", "Control prenatal", 90.0),
            ("Popayán", "Materno", "Parto institucional", 95.0),
            ("Popayán", "Violencia Sexual", "Atención", 10.0),
            ("Patía", "violencia de género", "Atención", 12.0),
        ]);
        let data = Dataset::from_tables(table, Table::default(), Table::default(), Table::default());
        let cards = cards(&data);
        assert_eq!(cards[0].display, "85.0%");
        assert_eq!(cards[1].display, "95.0%");
        assert_eq!(cards[2].display, "2");
        assert_eq!(cards[3].display, "3");
    }

    #[test]
    fn kpis_fall_back_to_overall_mean() {
        let table = indicators(&[
            ("Popayán", "Nutrición", "Lactancia", 60.0),
            ("Timbío", "Nutrición", "Lactancia", 80.0),
        ]);
        let data = Dataset::from_tables(table, Table::default(), Table::default(), Table::default());
        let cards = cards(&data);
        assert_eq!(cards[0].display, "70.0%");
        assert_eq!(cards[1].display, "70.0%");
        assert_eq!(cards[2].display, "0");
    }

    #[test]
    fn kpis_over_empty_table_are_not_available() {
        let data = Dataset::from_tables(
            IndicatorSource.placeholder(),
            Table::default(),
            Table::default(),
            Table::default(),
        );
        let cards = cards(&data);
        assert_eq!(cards[0].display, "N/A");
        assert_eq!(cards[0].value, None);
        assert_eq!(cards[3].display, "0");
    }

    #[test]
    fn controls_list_options_and_defaults() {
        let table = indicators(&[
            ("Timbío", "Materno", "CPN", 80.0),
            ("Popayán", "Materno", "CPN", 90.0),
            ("Popayán", "Violencia Sexual", "Atención", 10.0),
        ]);
        let data = Dataset::from_tables(
            table,
            PrenatalSource.placeholder(),
            Table::default(),
            Table::default(),
        );
        let controls = controls(&data);
        assert_eq!(controls.municipios, vec!["Popayán", "Timbío"]);
        assert_eq!(controls.categorias, vec!["Materno", "Violencia Sexual"]);
        assert_eq!(controls.violencia_municipios, vec!["Popayán"]);
        assert_eq!(controls.cpn_municipios[0], "Todos");
        assert_eq!(controls.cpn_indicadores.len(), 4);
        assert!(controls.gestantes_indicadores.is_empty());
        assert_eq!(controls.sifilis.len(), 2);

        let json = serde_json::to_value(&controls.defaults).unwrap();
        assert_eq!(json["cpn_vista"], "resumen");
        assert_eq!(json["sifilis_tab"], "gestacional");
        assert_eq!(json["categoria"], "Materno");
        assert_eq!(json["categoria_municipio"], "Popayán");
        assert_eq!(json["tipo"], "Barras");
        assert_eq!(json["semaforo_municipio"], "Popayán");
        assert_eq!(json["violencia_municipio"], "Popayán");
        assert!(json["gestantes_indicador"].is_null());
    }
}
