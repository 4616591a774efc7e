//! Spreadsheet loading into read-only tables.
//!
//! Each input file is described by a `Source`: its declared columns, whether
//! undeclared header columns are kept, and the placeholder table used when
//! the file is missing or malformed. Loading never fails the process: every
//! problem is logged, recorded in the `SourceReport`, and replaced by the
//! placeholder.

pub mod boundary;
pub mod coerce;
pub mod sources;

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use serde::Serialize;

use crate::config::DataConfig;
use crate::models::table::{Column, ColumnKind, Table, Value};

pub use boundary::BoundaryLayer;
use sources::{IndicatorSource, PregnantSource, PrenatalSource, SyphilisSource};

/// Declared column of a source.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
}

impl ColumnSpec {
    pub const fn required(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// A tabular input of the dashboard.
pub trait Source: Send + Sync {
    /// Name used in logs, load reports and alerts.
    fn name(&self) -> &'static str;

    /// Columns with a fixed semantic type.
    fn columns(&self) -> &'static [ColumnSpec];

    /// Keep undeclared header columns, typing each as number when every
    /// non-blank cell parses as one and as text otherwise.
    fn infers_extra_columns(&self) -> bool {
        false
    }

    /// Deterministic table substituted for a missing or malformed file.
    fn placeholder(&self) -> Table;
}

/// Why a source could not be read.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid workbook: {0}")]
    Workbook(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("sheet is empty")]
    EmptySheet,

    #[error("required column '{0}' is missing")]
    MissingColumn(&'static str),

    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] serde_json::Error),

    #[error("GeoJSON is not a FeatureCollection")]
    NotFeatureCollection,
}

impl LoadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Input file format, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Workbook,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Self::Workbook),
            _ => None,
        }
    }
}

/// Header row plus raw cell text of a sheet.
#[derive(Debug, Default)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Where a loaded table came from.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum Origin {
    File,
    Placeholder { reason: String },
}

/// Outcome of loading one source, exposed by the readiness probe.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub path: String,
    #[serde(flatten)]
    pub origin: Origin,
    pub rows: usize,
    pub parse_failures: usize,
}

impl SourceReport {
    pub fn is_placeholder(&self) -> bool {
        matches!(self.origin, Origin::Placeholder { .. })
    }
}

/// A table and the report describing how it was obtained.
#[derive(Debug)]
pub struct LoadedTable {
    pub table: Table,
    pub report: SourceReport,
}

/// Read a file into raw text cells.
pub fn read_sheet(path: &Path) -> Result<RawSheet, LoadError> {
    let format = SourceFormat::from_path(path)
        .ok_or_else(|| LoadError::UnsupportedFormat(path.display().to_string()))?;

    let data = read_bytes(path)?;
    match format {
        SourceFormat::Csv => parse_csv(&data),
        SourceFormat::Workbook => parse_workbook(&data),
    }
}

/// Read a whole file, distinguishing a missing file from other I/O failures.
pub(crate) fn read_bytes(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound(path.display().to_string())
        } else {
            LoadError::Io {
                path: path.display().to_string(),
                source: e,
            }
        }
    })
}

/// Parse CSV bytes (header row first).
///
/// Fields are decoded one by one: UTF-8 when valid, Latin-1 otherwise.
pub fn parse_csv(data: &[u8]) -> Result<RawSheet, LoadError> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .byte_headers()?
        .iter()
        .map(|h| decode_field(h).trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.byte_records() {
        let record = result?;
        rows.push(record.iter().map(decode_field).collect());
    }
    Ok(RawSheet { headers, rows })
}

fn decode_field(field: &[u8]) -> String {
    match std::str::from_utf8(field) {
        Ok(text) => text.to_string(),
        Err(_) => field.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Parse workbook bytes (xlsx, xls, ods), reading the first sheet with its
/// first row as headers.
pub fn parse_workbook(data: &[u8]) -> Result<RawSheet, LoadError> {
    let cursor = Cursor::new(data);
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e: calamine::Error| LoadError::Workbook(format!("{e}")))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| LoadError::Workbook("no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| LoadError::Workbook(format!("failed to read sheet '{sheet_name}': {e}")))?;

    let mut row_iter = range.rows();
    let header_row = row_iter.next().ok_or(LoadError::EmptySheet)?;
    let headers = header_row
        .iter()
        .map(|cell| cell_text(cell).trim().to_string())
        .collect();

    let rows = row_iter
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    Ok(RawSheet { headers, rows })
}

/// Text of a workbook cell; date cells are rendered as ISO dates.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_date()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}

/// Build a typed table from raw cells. Returns the table and the number of
/// non-blank cells that failed coercion.
pub fn build_table(source: &dyn Source, sheet: &RawSheet) -> Result<(Table, usize), LoadError> {
    let mut layout: Vec<(usize, ColumnKind)> = Vec::new();
    let mut columns = Vec::new();

    for spec in source.columns() {
        match sheet.headers.iter().position(|h| h == spec.name) {
            Some(idx) => {
                layout.push((idx, spec.kind));
                columns.push(Column::new(spec.name, spec.kind));
            }
            None if spec.required => return Err(LoadError::MissingColumn(spec.name)),
            None => {}
        }
    }

    if source.infers_extra_columns() {
        for (idx, header) in sheet.headers.iter().enumerate() {
            let declared = source.columns().iter().any(|s| s.name == header);
            if header.is_empty() || declared {
                continue;
            }
            let kind = infer_kind(sheet, idx);
            layout.push((idx, kind));
            columns.push(Column::new(header.clone(), kind));
        }
    }

    let mut table = Table::new(source.name(), columns);
    let mut failures = 0;

    for raw in &sheet.rows {
        if raw.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let row = layout
            .iter()
            .map(|(idx, kind)| {
                let cell = raw.get(*idx).map(String::as_str).unwrap_or("");
                coerce::coerce(cell, *kind).unwrap_or_else(|err| {
                    tracing::trace!(source = source.name(), error = %err, "Cell coerced to missing");
                    failures += 1;
                    Value::Missing
                })
            })
            .collect();
        table.push_row(row);
    }

    Ok((table, failures))
}

/// Number when every non-blank cell of the column parses as one, text otherwise.
fn infer_kind(sheet: &RawSheet, idx: usize) -> ColumnKind {
    let mut cells = sheet
        .rows
        .iter()
        .filter_map(|row| row.get(idx))
        .filter(|cell| !cell.trim().is_empty())
        .peekable();
    if cells.peek().is_none() {
        return ColumnKind::Number;
    }
    if cells.all(|cell| coerce::coerce(cell, ColumnKind::Number).is_ok()) {
        ColumnKind::Number
    } else {
        ColumnKind::Text
    }
}

/// Load a source from disk, substituting its placeholder on any failure.
pub fn load_table(source: &dyn Source, path: &Path) -> LoadedTable {
    let path_text = path.display().to_string();
    let result = read_sheet(path).and_then(|sheet| build_table(source, &sheet));

    match result {
        Ok((table, parse_failures)) => {
            if parse_failures > 0 {
                tracing::warn!(
                    source = source.name(),
                    path = %path_text,
                    parse_failures,
                    "Unparsable cells treated as missing"
                );
            }
            tracing::info!(source = source.name(), rows = table.len(), "Loaded source");
            let report = SourceReport {
                source: source.name().to_string(),
                path: path_text,
                origin: Origin::File,
                rows: table.len(),
                parse_failures,
            };
            LoadedTable { table, report }
        }
        Err(err) => {
            tracing::warn!(
                source = source.name(),
                path = %path_text,
                error = %err,
                "Source unavailable, using placeholder data"
            );
            let table = source.placeholder();
            let report = SourceReport {
                source: source.name().to_string(),
                path: path_text,
                origin: Origin::Placeholder {
                    reason: err.to_string(),
                },
                rows: table.len(),
                parse_failures: 0,
            };
            LoadedTable { table, report }
        }
    }
}

/// Every table the dashboard reads, built once at startup and never mutated.
#[derive(Debug, Default)]
pub struct Dataset {
    pub indicators: Table,
    pub prenatal: Table,
    pub pregnant: Table,
    pub syphilis: Table,
    pub boundaries: Option<BoundaryLayer>,
    pub report: Vec<SourceReport>,
}

impl Dataset {
    /// Load every configured source. Never fails; see `SourceReport`.
    pub fn load(config: &DataConfig) -> Self {
        let indicators = load_table(&IndicatorSource, &config.indicators_path());
        let prenatal = load_table(&PrenatalSource, &config.prenatal_path());
        let pregnant = load_table(&PregnantSource, &config.pregnant_path());
        let syphilis = load_table(&SyphilisSource, &config.syphilis_path());
        let (boundaries, boundary_report) = boundary::load_optional(&config.boundaries_path());

        Self {
            report: vec![
                indicators.report,
                prenatal.report,
                pregnant.report,
                syphilis.report,
                boundary_report,
            ],
            indicators: indicators.table,
            prenatal: prenatal.table,
            pregnant: pregnant.table,
            syphilis: syphilis.table,
            boundaries,
        }
    }

    /// Assemble a dataset from already-built tables, without a map layer.
    pub fn from_tables(indicators: Table, prenatal: Table, pregnant: Table, syphilis: Table) -> Self {
        Self {
            indicators,
            prenatal,
            pregnant,
            syphilis,
            boundaries: None,
            report: Vec::new(),
        }
    }
}
