//! Per-site chart data: time series, paired scatter values and correlation.

use crate::args::SeriesKind;
use crate::{fmt_value, write_json};
use serde_json::json;
use std::io::Write;
use wqm_core::Dataset;
use wqm_data::color::{Color, Palette, Scale};
use wqm_data::correlation::correlation_matrix;
use wqm_data::filter::{filter, FilterSpec};
use wqm_data::series::{bucketed_series, paired_values, time_series};
use wqm_data::validate::{require_filter, require_parameter, require_site};
use wqm_utils::dates;

const NO_DATA: &str = "No data matches the current filters.";

/// Print the raw or bucketed series of `param` at `site`.
pub fn run_series(
    dataset: &Dataset,
    spec: &FilterSpec,
    site: &str,
    param: &str,
    kind: SeriesKind,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    require_site(dataset, site)?;
    require_parameter(dataset, param)?;
    require_filter(dataset, spec)?;
    let filtered = filter(dataset, spec);

    match kind.granularity() {
        None => {
            let points = time_series(&filtered, site, param);
            if json {
                return write_json(out, &json!({ "site": site, "parameter": param, "points": points }));
            }
            if points.is_empty() {
                writeln!(out, "{}", NO_DATA)?;
                return Ok(());
            }
            writeln!(out, "{} at {}", param, site)?;
            for point in &points {
                writeln!(
                    out,
                    "  {}  {:>8}",
                    dates::format_timestamp(&point.timestamp),
                    fmt_value(point.value)
                )?;
            }
        }
        Some(granularity) => {
            let points = bucketed_series(&filtered, site, param, granularity);
            if json {
                return write_json(out, &json!({ "site": site, "parameter": param, "points": points }));
            }
            if points.is_empty() {
                writeln!(out, "{}", NO_DATA)?;
                return Ok(());
            }
            writeln!(out, "Mean {} at {}", param, site)?;
            for point in &points {
                writeln!(out, "  {:<8} {:>8} n={}", point.bucket.to_string(), fmt_value(point.mean), point.count)?;
            }
        }
    }
    Ok(())
}

/// Print readings at `site` where both `param` and `with` are present.
pub fn run_compare(
    dataset: &Dataset,
    spec: &FilterSpec,
    site: &str,
    param: &str,
    with: &str,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    require_site(dataset, site)?;
    require_parameter(dataset, param)?;
    require_parameter(dataset, with)?;
    require_filter(dataset, spec)?;
    let filtered = filter(dataset, spec);
    let pairs = paired_values(&filtered, site, with, param);

    if json {
        return write_json(
            out,
            &json!({ "site": site, "x": with, "y": param, "pairs": pairs }),
        );
    }
    if pairs.is_empty() {
        writeln!(out, "Not enough data to compare {} with {} at {}.", param, with, site)?;
        return Ok(());
    }
    writeln!(out, "x={} y={} at {}", with, param, site)?;
    for pair in &pairs {
        writeln!(out, "  {:>10.2} {:>10.2}", pair.x, pair.y)?;
    }
    Ok(())
}

/// Print the correlation matrix between parameters at `site`.
pub fn run_correlate(
    dataset: &Dataset,
    spec: &FilterSpec,
    site: &str,
    params: &[String],
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    require_site(dataset, site)?;
    for param in params {
        require_parameter(dataset, param)?;
    }
    require_filter(dataset, spec)?;
    let filtered = filter(dataset, spec);
    let matrix = correlation_matrix(&filtered, site, params);

    if json {
        let heat = Scale::with_range(-1.0, 1.0, Palette::RdBu)?;
        let rows: Vec<&[Option<f64>]> = matrix.rows().collect();
        let colors: Vec<Vec<Color>> = matrix
            .rows()
            .map(|row| row.iter().map(|cell| heat.color_for(*cell)).collect())
            .collect();
        return write_json(
            out,
            &json!({
                "site": site,
                "parameters": matrix.parameters(),
                "matrix": rows,
                "colors": colors,
                "valid": !matrix.all_null(),
            }),
        );
    }
    if matrix.all_null() {
        writeln!(out, "No valid correlation values for {}.", site)?;
        return Ok(());
    }

    let width = matrix
        .parameters()
        .iter()
        .map(|p| p.len())
        .max()
        .unwrap_or(0)
        .max(6);
    write!(out, "{:<width$}", "", width = width)?;
    for name in matrix.parameters() {
        write!(out, " {:>width$}", name, width = width)?;
    }
    writeln!(out)?;
    for (name, row) in matrix.parameters().iter().zip(matrix.rows()) {
        write!(out, "{:<width$}", name, width = width)?;
        for cell in row {
            write!(out, " {:>width$}", fmt_value(*cell), width = width)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn run_text(kind: SeriesKind, site: &str) -> String {
        let mut out = Vec::new();
        run_series(&testing::dataset(), &FilterSpec::default(), site, "pH", kind, false, &mut out)
            .unwrap();
        testing::output(out)
    }

    #[test]
    fn test_raw_series() {
        let text = run_text(SeriesKind::Raw, "Site A");
        assert_eq!(text, "pH at Site A\n  2023-01-01      7.00\n  2023-02-01      7.50\n");
    }

    #[test]
    fn test_monthly_series() {
        let text = run_text(SeriesKind::Month, "Site A");
        assert!(text.starts_with("Mean pH at Site A\n"));
        assert!(text.contains("2023-01"));
        assert!(text.contains("7.50 n=1"));
    }

    #[test]
    fn test_yearly_series_json() {
        let mut out = Vec::new();
        run_series(
            &testing::dataset(),
            &FilterSpec::default(),
            "Site A",
            "pH",
            SeriesKind::Year,
            true,
            &mut out,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&testing::output(out)).unwrap();
        let points = value["points"].as_array().unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0]["bucket"], "2023");
        assert_eq!(points[0]["mean"], 7.25);
        assert_eq!(points[0]["count"], 2);
    }

    #[test]
    fn test_series_filtered_to_nothing() {
        let spec = FilterSpec {
            date_from: chrono::NaiveDate::from_ymd_opt(2024, 1, 1),
            ..FilterSpec::default()
        };
        let mut out = Vec::new();
        run_series(&testing::dataset(), &spec, "Site A", "pH", SeriesKind::Raw, false, &mut out)
            .unwrap();
        assert_eq!(testing::output(out), format!("{}\n", NO_DATA));
    }

    #[test]
    fn test_series_unknown_site_fails() {
        let mut out = Vec::new();
        let spec = FilterSpec::default();
        let err = run_series(&testing::dataset(), &spec, "Site Z", "pH", SeriesKind::Raw, false, &mut out)
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown site: Site Z");
    }

    #[test]
    fn test_compare() {
        let spec = FilterSpec::default();
        let mut out = Vec::new();
        run_compare(&testing::dataset(), &spec, "Site A", "pH", "Turbidity", true, &mut out)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&testing::output(out)).unwrap();
        let pairs = value["pairs"].as_array().unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0]["x"], 12.5);
        assert_eq!(pairs[0]["y"], 7.0);

        let mut out = Vec::new();
        run_compare(&testing::dataset(), &spec, "Site B", "pH", "Turbidity", false, &mut out)
            .unwrap();
        assert!(testing::output(out).starts_with("Not enough data"));
    }

    #[test]
    fn test_correlate() {
        let spec = FilterSpec::default();
        let mut out = Vec::new();
        run_correlate(&testing::dataset(), &spec, "Site A", &[], true, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_str(&testing::output(out)).unwrap();
        assert_eq!(value["parameters"][0], "pH");
        assert_eq!(value["matrix"][0][0], 1.0);
        assert!(value["matrix"][0][1].is_null());
        assert_eq!(value["colors"][0][0], "#053061");
        assert_eq!(value["colors"][0][1], "#808080");
        assert_eq!(value["valid"], true);

        let mut out = Vec::new();
        run_correlate(&testing::dataset(), &spec, "Site C", &[], false, &mut out).unwrap();
        assert_eq!(testing::output(out), "No valid correlation values for Site C.\n");
    }

    #[test]
    fn test_correlate_rejects_unknown_parameter() {
        let mut out = Vec::new();
        let params = vec!["pH".to_string(), "Nitrate".to_string()];
        let err = run_correlate(&testing::dataset(), &FilterSpec::default(), "Site A", &params, false, &mut out)
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown parameter: Nitrate");
    }

    #[test]
    fn test_correlate_rejects_value_bound_without_parameter() {
        let spec = FilterSpec {
            value_min: Some(7.0),
            ..FilterSpec::default()
        };
        let mut out = Vec::new();
        let err = run_correlate(&testing::dataset(), &spec, "Site A", &[], false, &mut out)
            .unwrap_err();
        assert_eq!(err.to_string(), "A value bound needs a parameter to filter on");
    }
}
