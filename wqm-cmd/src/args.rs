//! Arguments shared across subcommands.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use wqm_core::loader::{self, LoadOptions};
use wqm_core::Dataset;
use wqm_data::filter::FilterSpec;
use wqm_data::series::Granularity;
use wqm_utils::dates;

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Path to the readings table
    #[arg(short, long)]
    pub input: PathBuf,

    /// Field delimiter of the readings table
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    pub delimiter: u8,
}

impl InputArgs {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            delimiter: self.delimiter,
            ..LoadOptions::default()
        }
    }

    /// Load the table, logging what normalization dropped.
    pub fn load(&self) -> anyhow::Result<Dataset> {
        let (dataset, report) = loader::load_path(&self.input, &self.load_options())
            .with_context(|| format!("Could not load {}", self.input.display()))?;
        log::info!(
            "Loaded {} of {} rows from {} ({} without location, {} with unparsable dates)",
            dataset.len(),
            report.rows_read,
            self.input.display(),
            report.rows_dropped_missing_location,
            report.unparsed_timestamps
        );
        Ok(dataset)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Keep readings on or after this date (YYYY-MM-DD)
    #[arg(long, value_parser = dates::parse_date)]
    pub from: Option<NaiveDate>,

    /// Keep readings on or before this date (YYYY-MM-DD)
    #[arg(long, value_parser = dates::parse_date)]
    pub to: Option<NaiveDate>,

    /// Parameter the --min/--max bounds apply to (defaults to --param)
    #[arg(long)]
    pub filter_param: Option<String>,

    /// Keep readings whose value is at least this
    #[arg(long, allow_negative_numbers = true)]
    pub min: Option<f64>,

    /// Keep readings whose value is at most this
    #[arg(long, allow_negative_numbers = true)]
    pub max: Option<f64>,
}

impl FilterArgs {
    /// Build the filter; value bounds fall back to `default_param`.
    pub fn to_spec(&self, default_param: Option<&str>) -> FilterSpec {
        FilterSpec {
            date_from: self.from,
            date_to: self.to,
            param_name: self
                .filter_param
                .clone()
                .or_else(|| default_param.map(String::from)),
            value_min: self.min,
            value_max: self.max,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    /// Every dated reading
    Raw,
    /// Monthly means
    Month,
    /// Yearly means
    Year,
}

impl SeriesKind {
    pub fn granularity(&self) -> Option<Granularity> {
        match self {
            SeriesKind::Raw => None,
            SeriesKind::Month => Some(Granularity::Month),
            SeriesKind::Year => Some(Granularity::Year),
        }
    }
}

fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s {
        "\\t" | "tab" => Ok(b'\t'),
        _ if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        _ => Err(format!("delimiter must be a single ASCII character, got {:?}", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(","), Ok(b','));
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert!(parse_delimiter(",,").is_err());
        assert!(parse_delimiter("é").is_err());
    }

    #[test]
    fn test_filter_args_default_param() {
        let args = FilterArgs {
            min: Some(7.0),
            ..FilterArgs::default()
        };
        let spec = args.to_spec(Some("pH"));
        assert_eq!(spec.param_name.as_deref(), Some("pH"));
        assert_eq!(spec.value_min, Some(7.0));

        let explicit = FilterArgs {
            filter_param: Some("EC".to_string()),
            ..FilterArgs::default()
        };
        assert_eq!(explicit.to_spec(Some("pH")).param_name.as_deref(), Some("EC"));
    }
}
