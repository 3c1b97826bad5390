//! Re-serialization of a Dataset in its source layout.
//!
//! Columns are written in schema order with the source delimiter, so a
//! filtered table can be downloaded and loaded again. Derived `Month` and
//! `Year` columns are appended only on request.

use crate::error::ExportError;
use crate::reading::{ColumnKind, Dataset, Reading};
use chrono::Datelike;
use csv::WriterBuilder;
use std::io::Write;
use wqm_utils::dates;

pub const MONTH_COLUMN: &str = "Month";
pub const YEAR_COLUMN: &str = "Year";

/// Which derived columns to append after the source columns.
///
/// A derived column is skipped when the schema already has a column of
/// that name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DerivedColumns {
    /// `YYYY-MM` of the timestamp.
    pub month: bool,
    /// Calendar year of the timestamp.
    pub year: bool,
}

impl DerivedColumns {
    pub fn all() -> Self {
        Self {
            month: true,
            year: true,
        }
    }
}

/// Write `dataset` as delimited text to `writer`.
pub fn write_csv<W: Write>(
    dataset: &Dataset,
    writer: W,
    derived: DerivedColumns,
) -> Result<(), ExportError> {
    let schema = dataset.schema();
    let with_month = derived.month && !schema.has_column(MONTH_COLUMN);
    let with_year = derived.year && !schema.has_column(YEAR_COLUMN);

    let mut wtr = WriterBuilder::new()
        .delimiter(schema.delimiter())
        .from_writer(writer);

    let mut header: Vec<&str> = schema.columns().iter().map(|c| c.name.as_str()).collect();
    if with_month {
        header.push(MONTH_COLUMN);
    }
    if with_year {
        header.push(YEAR_COLUMN);
    }
    wtr.write_record(&header)?;

    for reading in dataset.readings() {
        let mut row: Vec<String> = schema
            .columns()
            .iter()
            .map(|c| cell(reading, c.kind))
            .collect();
        if with_month {
            row.push(
                reading
                    .timestamp
                    .map(|ts| dates::month_label(ts.year(), ts.month()))
                    .unwrap_or_default(),
            );
        }
        if with_year {
            row.push(
                reading
                    .timestamp
                    .map(|ts| ts.year().to_string())
                    .unwrap_or_default(),
            );
        }
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    log::debug!("export: Wrote {} rows", dataset.len());
    Ok(())
}

/// Render `dataset` to an in-memory string.
pub fn to_csv_string(dataset: &Dataset, derived: DerivedColumns) -> Result<String, ExportError> {
    let mut buffer: Vec<u8> = Vec::new();
    write_csv(dataset, &mut buffer, derived)?;
    Ok(String::from_utf8(buffer)?)
}

/// Download file name for one site's rows, e.g. `Site_A_data.csv`.
pub fn export_file_name(site_name: &str) -> String {
    format!("{}_data.csv", site_name.replace(' ', "_"))
}

fn cell(reading: &Reading, kind: ColumnKind) -> String {
    match kind {
        ColumnKind::SiteId => reading.site_id.clone(),
        ColumnKind::SiteName => reading.site_name.clone(),
        ColumnKind::Date => reading
            .timestamp
            .map(|ts| dates::format_timestamp(&ts))
            .unwrap_or_default(),
        ColumnKind::Latitude => reading.latitude.to_string(),
        ColumnKind::Longitude => reading.longitude.to_string(),
        ColumnKind::Parameter(i) => reading.value(i).map(|v| v.to_string()).unwrap_or_default(),
        ColumnKind::Text(i) => reading.text.get(i).cloned().unwrap_or_default(),
    }
}
