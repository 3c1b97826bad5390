//! Site map feed: one colored marker per site, plus the extent to fit the
//! view to and click-to-site resolution.

use crate::aggregate::{summarize, SiteSummary};
use crate::color::{Color, Scale};
use crate::error::{AnalysisError, Result};
use serde::Serialize;
use wqm_core::Dataset;

/// Lat/lon extent of a set of readings, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_latitude: f64,
    pub min_longitude: f64,
    pub max_latitude: f64,
    pub max_longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub summary: SiteSummary,
    pub color: Color,
}

/// Everything needed to draw the site map for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteMap {
    pub parameter: String,
    pub scale: Scale,
    pub bounds: Bounds,
    pub markers: Vec<Marker>,
}

/// Extent of every reading's location; `None` for an empty dataset.
pub fn bounds(dataset: &Dataset) -> Option<Bounds> {
    let mut readings = dataset.readings().iter();
    let first = readings.next()?;
    let start = Bounds {
        min_latitude: first.latitude,
        min_longitude: first.longitude,
        max_latitude: first.latitude,
        max_longitude: first.longitude,
    };
    Some(readings.fold(start, |b, r| Bounds {
        min_latitude: b.min_latitude.min(r.latitude),
        min_longitude: b.min_longitude.min(r.longitude),
        max_latitude: b.max_latitude.max(r.latitude),
        max_longitude: b.max_longitude.max(r.longitude),
    }))
}

/// Site name of the reading closest to a clicked point.
///
/// Distance is planar in degrees; on a tie the earlier reading wins.
pub fn nearest_site(dataset: &Dataset, latitude: f64, longitude: f64) -> Option<String> {
    let mut best: Option<(f64, &str)> = None;
    for reading in dataset.readings() {
        let distance = (reading.latitude - latitude).hypot(reading.longitude - longitude);
        if best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, reading.site_name.as_str()));
        }
    }
    best.map(|(_, name)| name.to_string())
}

/// Summaries, color scale and markers for `param`.
///
/// Fails with `UnknownParameter` for a name outside the schema, with
/// `EmptyResult` when the dataset has no rows, and with `DegenerateScale`
/// when the defined site means do not span a range. Sites with a null mean
/// are still present, colored with the fallback color.
pub fn site_map(dataset: &Dataset, param: &str) -> Result<SiteMap> {
    if dataset.schema().parameter_index(param).is_none() {
        return Err(AnalysisError::UnknownParameter(param.to_string()));
    }
    let summaries = summarize(dataset, param);
    let Some(bounds) = bounds(dataset) else {
        return Err(AnalysisError::EmptyResult("no sites to map"));
    };
    let scale = Scale::from_summaries(&summaries)?;
    let markers = summaries
        .into_iter()
        .map(|summary| Marker {
            color: scale.color_for(summary.mean),
            summary,
        })
        .collect();
    Ok(SiteMap {
        parameter: param.to_string(),
        scale,
        bounds,
        markers,
    })
}
