//! Dataset-wide views: site listing, map summary and click resolution.

use crate::{fmt_value, write_json};
use anyhow::Context;
use serde_json::json;
use std::io::Write;
use std::path::Path;
use wqm_core::overlay::Overlay;
use wqm_core::Dataset;
use wqm_data::aggregate::summarize;
use wqm_data::filter::{filter, FilterSpec};
use wqm_data::map::{nearest_site, site_map};
use wqm_data::overview::overview;
use wqm_data::validate::{require_filter, require_parameter};
use wqm_data::AnalysisError;
use wqm_utils::dates;

/// Print the overview cards, parameter list and site registry.
pub fn run_sites(dataset: &Dataset, json: bool, out: &mut dyn Write) -> anyhow::Result<()> {
    let summary = overview(dataset, None);
    if json {
        return write_json(
            out,
            &json!({
                "overview": summary,
                "parameters": dataset.parameters(),
                "sites": dataset.sites(),
            }),
        );
    }

    let span = match (summary.first_date, summary.last_date) {
        (Some(first), Some(last)) => format!(
            "{} -> {}",
            dates::format_timestamp(&first),
            dates::format_timestamp(&last)
        ),
        _ => "no dated readings".to_string(),
    };
    writeln!(out, "Sites: {}  Rows: {}  Dates: {}", summary.total_sites, summary.rows, span)?;
    writeln!(out, "Parameters: {}", dataset.parameters().join(", "))?;
    for site in dataset.sites() {
        writeln!(
            out,
            "  {:<8} {:<30} ({:.4}, {:.4})",
            site.site_id, site.site_name, site.latitude, site.longitude
        )?;
    }
    Ok(())
}

/// Print per-site summaries and marker colors for `param`.
///
/// An empty filter result or a flat color scale is reported as such rather
/// than treated as a failure.
pub fn run_summary(
    dataset: &Dataset,
    spec: &FilterSpec,
    param: &str,
    overlay: Option<&Path>,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    require_parameter(dataset, param)?;
    require_filter(dataset, spec)?;
    let overlay = overlay
        .map(|path| {
            Overlay::from_path(path)
                .with_context(|| format!("Could not load overlay {}", path.display()))
        })
        .transpose()?;
    let filtered = filter(dataset, spec);

    match site_map(&filtered, param) {
        Ok(map) => {
            if json {
                return write_json(
                    out,
                    &json!({ "status": "ok", "map": map, "overlay": overlay }),
                );
            }
            writeln!(
                out,
                "{} average by site (scale {:.2} .. {:.2})",
                map.parameter,
                map.scale.min(),
                map.scale.max()
            )?;
            if let Some(overlay) = &overlay {
                writeln!(
                    out,
                    "Overlay: {} ({} features)",
                    overlay.name,
                    overlay.feature_count().unwrap_or(0)
                )?;
            }
            for marker in &map.markers {
                let s = &marker.summary;
                writeln!(
                    out,
                    "  {:<30} {} mean={:>8} n={:<5} {} -> {}",
                    s.site_name,
                    marker.color,
                    fmt_value(s.mean),
                    s.count,
                    s.min_date.map(|d| dates::format_timestamp(&d)).unwrap_or_default(),
                    s.max_date.map(|d| dates::format_timestamp(&d)).unwrap_or_default(),
                )?;
            }
            Ok(())
        }
        Err(AnalysisError::EmptyResult(_)) => {
            log::warn!("summary: no readings match the current filters");
            if json {
                return write_json(out, &json!({ "status": "no_data", "summaries": [] }));
            }
            writeln!(out, "No data matches the current filters.")?;
            Ok(())
        }
        Err(AnalysisError::DegenerateScale(reason)) => {
            log::warn!("summary: cannot render color scale for {}: {}", param, reason);
            let summaries = summarize(&filtered, param);
            if json {
                return write_json(
                    out,
                    &json!({
                        "status": "flat_scale",
                        "message": reason.to_string(),
                        "summaries": summaries,
                    }),
                );
            }
            writeln!(out, "Cannot render color scale for {}: {}", param, reason)?;
            for s in &summaries {
                writeln!(out, "  {:<30} mean={:>8} n={}", s.site_name, fmt_value(s.mean), s.count)?;
            }
            Ok(())
        }
        Err(other) => Err(other.into()),
    }
}

/// Print the site nearest to a map point.
pub fn run_nearest(
    dataset: &Dataset,
    latitude: f64,
    longitude: f64,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match nearest_site(dataset, latitude, longitude) {
        Some(site) => writeln!(out, "{}", site)?,
        None => writeln!(out, "No sites loaded.")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_sites_text() {
        let mut out = Vec::new();
        run_sites(&testing::dataset(), false, &mut out).unwrap();
        let text = testing::output(out);
        assert!(text.starts_with("Sites: 3  Rows: 4  Dates: 2023-01-01 -> 2023-03-10"));
        assert!(text.contains("Parameters: pH, Turbidity"));
        assert!(text.contains("Site B"));
    }

    #[test]
    fn test_summary_json_ok() {
        let mut out = Vec::new();
        run_summary(&testing::dataset(), &FilterSpec::default(), "pH", None, true, &mut out)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&testing::output(out)).unwrap();
        assert_eq!(value["status"], "ok");
        let markers = value["map"]["markers"].as_array().unwrap();
        assert_eq!(markers.len(), 3);
        assert_eq!(markers[0]["summary"]["site_name"], "Site A");
        assert_eq!(markers[0]["color"], "#ffffd9");
        assert_eq!(markers[1]["color"], "#808080");
        assert_eq!(markers[2]["color"], "#081d58");
    }

    #[test]
    fn test_summary_reports_empty_result() {
        let spec = FilterSpec {
            param_name: Some("pH".to_string()),
            value_min: Some(10.0),
            ..FilterSpec::default()
        };
        let mut out = Vec::new();
        run_summary(&testing::dataset(), &spec, "pH", None, false, &mut out).unwrap();
        assert_eq!(testing::output(out), "No data matches the current filters.\n");
    }

    #[test]
    fn test_summary_reports_flat_scale() {
        let spec = FilterSpec {
            param_name: Some("pH".to_string()),
            value_max: Some(7.0),
            ..FilterSpec::default()
        };
        let mut out = Vec::new();
        run_summary(&testing::dataset(), &spec, "pH", None, true, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_str(&testing::output(out)).unwrap();
        assert_eq!(value["status"], "flat_scale");
        assert_eq!(value["summaries"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_summary_with_overlay() {
        let dir = testing::scratch_dir("overlay");
        let path = dir.join("Watershed.geojson");
        std::fs::write(&path, r#"{"type":"FeatureCollection","features":[]}"#).unwrap();
        let mut out = Vec::new();
        let spec = FilterSpec::default();
        run_summary(&testing::dataset(), &spec, "pH", Some(path.as_path()), false, &mut out)
            .unwrap();
        assert!(testing::output(out).contains("Overlay: Watershed (0 features)"));
    }

    #[test]
    fn test_summary_unknown_parameter_fails() {
        let mut out = Vec::new();
        let spec = FilterSpec::default();
        let err = run_summary(&testing::dataset(), &spec, "Nitrate", None, false, &mut out)
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown parameter: Nitrate");
    }

    #[test]
    fn test_summary_unknown_filter_parameter_fails() {
        let spec = FilterSpec {
            param_name: Some("Nitrate".to_string()),
            value_min: Some(0.0),
            ..FilterSpec::default()
        };
        let mut out = Vec::new();
        let err = run_summary(&testing::dataset(), &spec, "pH", None, false, &mut out).unwrap_err();
        assert_eq!(err.to_string(), "Unknown parameter: Nitrate");
        assert!(out.is_empty());
    }

    #[test]
    fn test_nearest() {
        let mut out = Vec::new();
        run_nearest(&testing::dataset(), 35.9, 51.9, &mut out).unwrap();
        assert_eq!(testing::output(out), "Site B\n");
    }
}
