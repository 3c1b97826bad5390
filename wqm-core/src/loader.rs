//! Delimited-table loading and normalization.
//!
//! The loader reads the whole table, classifies the non-required columns,
//! parses timestamps permissively and drops rows without a usable location.
//!
//! # Input format
//!
//! Required headers: `Site ID,Site Name,Date,Latitude,Longitude`. Any other
//! column whose non-missing cells all parse as numbers is a monitored
//! parameter; the remaining columns are carried through as text.
//!
//! ```text
//! Site ID,Site Name,Date,Latitude,Longitude,pH,Turbidity
//! 1,Site A,2023-01-01,35.70,51.40,7.0,12.5
//! ```

use crate::error::LoadError;
use crate::reading::{
    resolve_sites, Column, ColumnKind, Dataset, Reading, Schema, DATE, LATITUDE, LONGITUDE,
    REQUIRED_COLUMNS, SITE_ID, SITE_NAME,
};
use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use wqm_utils::{cells, dates};

/// Loader configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Columns read as text whatever their cells look like.
    pub text_columns: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            text_columns: Vec::new(),
        }
    }
}

impl LoadOptions {
    /// Options that read an export of a dataset with `schema` back into the
    /// same column kinds, so text columns stay text even when every
    /// exported cell looks numeric.
    pub fn for_schema(schema: &Schema) -> Self {
        Self {
            delimiter: schema.delimiter(),
            text_columns: schema.text_columns(),
        }
    }
}

/// Diagnostics about rows the loader normalized away or could not fully parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Data rows present in the source.
    pub rows_read: usize,
    /// Rows excluded because latitude or longitude was missing or non-numeric.
    pub rows_dropped_missing_location: usize,
    /// Kept rows whose `Date` cell could not be parsed.
    pub unparsed_timestamps: usize,
    /// Kept rows whose name or coordinates disagree with the first row seen
    /// for the same `Site ID`.
    pub site_conflicts: usize,
}

/// Load a dataset with default options.
pub fn load<R: Read>(source: R) -> Result<Dataset, LoadError> {
    load_with_report(source, &LoadOptions::default()).map(|(dataset, _)| dataset)
}

/// Load a dataset from an in-memory string with default options.
pub fn load_str(csv_data: &str) -> Result<Dataset, LoadError> {
    load(csv_data.as_bytes())
}

/// Load a dataset from a file.
pub fn load_path<P: AsRef<Path>>(
    path: P,
    options: &LoadOptions,
) -> Result<(Dataset, LoadReport), LoadError> {
    let file = File::open(path.as_ref()).map_err(|e| {
        LoadError::Unreadable(format!("{}: {}", path.as_ref().display(), e))
    })?;
    load_with_report(file, options)
}

/// Load a dataset and report what normalization did to it.
pub fn load_with_report<R: Read>(
    source: R,
    options: &LoadOptions,
) -> Result<(Dataset, LoadReport), LoadError> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(source);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::Unreadable("no header row".to_string()));
    }

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h == *required))
        .map(|required| required.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns(missing));
    }

    let mut records: Vec<StringRecord> = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        if record.len() > headers.len() {
            return Err(LoadError::Unreadable(format!(
                "row {} has {} fields, expected {}",
                line + 1,
                record.len(),
                headers.len()
            )));
        }
        records.push(record);
    }

    let schema = classify_columns(&headers, &records, options);
    let mut report = LoadReport {
        rows_read: records.len(),
        ..LoadReport::default()
    };

    let readings: Vec<Reading> = records
        .iter()
        .filter_map(|record| {
            let reading = to_reading(&schema, record);
            match &reading {
                None => report.rows_dropped_missing_location += 1,
                Some(r) if r.timestamp.is_none() => report.unparsed_timestamps += 1,
                Some(_) => {}
            }
            reading
        })
        .collect();

    let (sites, conflicts) = resolve_sites(&readings);
    report.site_conflicts = conflicts;

    log::info!(
        "loader: Loaded {} readings for {} sites, dropped {} without location",
        readings.len(),
        sites.len(),
        report.rows_dropped_missing_location
    );
    if report.unparsed_timestamps > 0 {
        log::warn!(
            "loader: {} readings have an unparsable date",
            report.unparsed_timestamps
        );
    }
    if report.site_conflicts > 0 {
        log::warn!(
            "loader: {} readings disagree with the first-seen name or coordinates of their site",
            report.site_conflicts
        );
    }

    Ok((Dataset::from_parts(schema, sites, readings), report))
}

/// Assign a kind to every header. The first occurrence of a required header
/// wins; any repeat of it is treated like an ordinary extra column.
fn classify_columns(headers: &[String], records: &[StringRecord], options: &LoadOptions) -> Schema {
    let mut columns: Vec<Column> = Vec::with_capacity(headers.len());
    let mut parameter_count = 0usize;
    let mut text_count = 0usize;

    for (index, name) in headers.iter().enumerate() {
        let required = match name.as_str() {
            SITE_ID => Some(ColumnKind::SiteId),
            SITE_NAME => Some(ColumnKind::SiteName),
            DATE => Some(ColumnKind::Date),
            LATITUDE => Some(ColumnKind::Latitude),
            LONGITUDE => Some(ColumnKind::Longitude),
            _ => None,
        }
        .filter(|kind| !columns.iter().any(|c| c.kind == *kind));

        let kind = match required {
            Some(kind) => kind,
            None => {
                let numeric = !options.text_columns.contains(name)
                    && records
                        .iter()
                        .all(|r| cells::parse_float(r.get(index).unwrap_or("")).is_ok());
                if numeric {
                    parameter_count += 1;
                    ColumnKind::Parameter(parameter_count - 1)
                } else {
                    text_count += 1;
                    ColumnKind::Text(text_count - 1)
                }
            }
        };
        columns.push(Column {
            name: name.clone(),
            kind,
        });
    }
    Schema::new(columns, options.delimiter)
}

/// Convert one record; `None` when the row has no usable location.
fn to_reading(schema: &Schema, record: &StringRecord) -> Option<Reading> {
    let mut site_id = String::new();
    let mut site_name = String::new();
    let mut timestamp = None;
    let mut latitude = None;
    let mut longitude = None;
    let mut values = vec![None; schema.parameters().len()];
    let mut text = Vec::new();

    for (index, column) in schema.columns().iter().enumerate() {
        let cell = record.get(index).unwrap_or("");
        match column.kind {
            ColumnKind::SiteId => site_id = cell.trim().to_string(),
            ColumnKind::SiteName => site_name = cell.trim().to_string(),
            ColumnKind::Date => timestamp = dates::parse_timestamp(cell),
            ColumnKind::Latitude => latitude = parse_coordinate(cell),
            ColumnKind::Longitude => longitude = parse_coordinate(cell),
            ColumnKind::Parameter(i) => values[i] = cells::parse_float(cell).unwrap_or(None),
            ColumnKind::Text(_) => text.push(cell.to_string()),
        }
    }

    Some(Reading {
        site_id,
        site_name,
        timestamp,
        latitude: latitude?,
        longitude: longitude?,
        values,
        text,
    })
}

fn parse_coordinate(cell: &str) -> Option<f64> {
    cells::parse_float(cell)
        .ok()
        .flatten()
        .filter(|v| v.is_finite())
}
