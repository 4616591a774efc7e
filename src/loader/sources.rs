//! The four tabular sources of the dashboard and their placeholders.

use crate::loader::{ColumnSpec, Source};
use crate::models::columns::{indicator, prenatal, pregnant, syphilis};
use crate::models::table::{Column, ColumnKind, Table, Value};

fn empty_table(name: &str, specs: &[ColumnSpec]) -> Table {
    Table::new(
        name,
        specs
            .iter()
            .map(|spec| Column::new(spec.name, spec.kind))
            .collect(),
    )
}

/// Indicator table: value and target per municipality, category and indicator.
#[derive(Debug, Default)]
pub struct IndicatorSource;

const INDICATOR_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::required(indicator::MUNICIPALITY, ColumnKind::Text),
    ColumnSpec::required(indicator::CATEGORY, ColumnKind::Text),
    ColumnSpec::required(indicator::INDICATOR, ColumnKind::Text),
    ColumnSpec::required(indicator::VALUE, ColumnKind::Number),
    ColumnSpec::required(indicator::TARGET, ColumnKind::Number),
    ColumnSpec::optional(indicator::YEAR, ColumnKind::Integer),
];

impl Source for IndicatorSource {
    fn name(&self) -> &'static str {
        "indicadores"
    }

    fn columns(&self) -> &'static [ColumnSpec] {
        INDICATOR_COLUMNS
    }

    fn placeholder(&self) -> Table {
        empty_table(self.name(), INDICATOR_COLUMNS)
    }
}

/// Prenatal-care summary: sub-indicator columns are discovered from the header.
#[derive(Debug, Default)]
pub struct PrenatalSource;

const PRENATAL_COLUMNS: &[ColumnSpec] =
    &[ColumnSpec::required(prenatal::MUNICIPALITY, ColumnKind::Text)];

/// Fixed stand-in so the CPN section stays usable without its file.
const PRENATAL_PLACEHOLDER: &[(&str, [f64; 4])] = &[
    ("Popayán", [88.4, 81.2, 92.6, 73.5]),
    ("Timbío", [79.1, 72.8, 86.3, 64.0]),
    ("Patía", [71.5, 66.9, 83.7, 61.2]),
    ("Bolívar", [92.3, 85.4, 90.1, 78.8]),
];

const PRENATAL_PLACEHOLDER_INDICATORS: [&str; 4] = [
    "CPN_Precoz",
    "CPN_Completo",
    "Suplementacion_Hierro",
    "Control_Odontologico",
];

impl Source for PrenatalSource {
    fn name(&self) -> &'static str {
        "CPN"
    }

    fn columns(&self) -> &'static [ColumnSpec] {
        PRENATAL_COLUMNS
    }

    fn infers_extra_columns(&self) -> bool {
        true
    }

    fn placeholder(&self) -> Table {
        let mut columns = vec![Column::new(prenatal::MUNICIPALITY, ColumnKind::Text)];
        columns.extend(
            PRENATAL_PLACEHOLDER_INDICATORS
                .iter()
                .map(|name| Column::new(*name, ColumnKind::Number)),
        );
        let mut table = Table::new(self.name(), columns);
        for (municipality, values) in PRENATAL_PLACEHOLDER {
            let mut row = vec![Value::from(*municipality)];
            row.extend(values.iter().map(|v| Value::Number(*v)));
            table.push_row(row);
        }
        table
    }
}

/// Pregnant women per municipality plus any further numeric indicators.
#[derive(Debug, Default)]
pub struct PregnantSource;

const PREGNANT_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::required(pregnant::MUNICIPALITY, ColumnKind::Text),
    ColumnSpec::optional(pregnant::ACTIVE, ColumnKind::Number),
];

impl Source for PregnantSource {
    fn name(&self) -> &'static str {
        "gestantes"
    }

    fn columns(&self) -> &'static [ColumnSpec] {
        PREGNANT_COLUMNS
    }

    fn infers_extra_columns(&self) -> bool {
        true
    }

    fn placeholder(&self) -> Table {
        empty_table(self.name(), PREGNANT_COLUMNS)
    }
}

/// Syphilis surveillance cases, one row per notified case count.
#[derive(Debug, Default)]
pub struct SyphilisSource;

const SYPHILIS_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::required(syphilis::EVENT, ColumnKind::Text),
    ColumnSpec::required(syphilis::MUNICIPALITY, ColumnKind::Text),
    ColumnSpec::required(syphilis::EPS, ColumnKind::Text),
    ColumnSpec::required(syphilis::WEEK, ColumnKind::Integer),
    ColumnSpec::optional(syphilis::NOTIFIED, ColumnKind::Date),
    ColumnSpec::required(syphilis::CASES, ColumnKind::Number),
];

impl Source for SyphilisSource {
    fn name(&self) -> &'static str {
        "sífilis"
    }

    fn columns(&self) -> &'static [ColumnSpec] {
        SYPHILIS_COLUMNS
    }

    fn placeholder(&self) -> Table {
        empty_table(self.name(), SYPHILIS_COLUMNS)
    }
}
