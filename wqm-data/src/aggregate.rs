use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use wqm_core::{Dataset, Reading};

/// Per-site statistics for one parameter, as drawn on the site map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteSummary {
    pub site_name: String,
    /// `Site ID` of the first row seen for this site name.
    pub site_id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Mean of the non-null values; `None` when every value is null.
    pub mean: Option<f64>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    /// Number of non-null values behind `mean`.
    pub value_count: usize,
    pub min_date: Option<NaiveDateTime>,
    pub max_date: Option<NaiveDateTime>,
    /// Number of rows for this site, null values included.
    pub count: usize,
}

#[derive(Default)]
struct Accumulator<'a> {
    first: Option<&'a Reading>,
    sum: f64,
    min_value: Option<f64>,
    max_value: Option<f64>,
    value_count: usize,
    min_date: Option<NaiveDateTime>,
    max_date: Option<NaiveDateTime>,
    count: usize,
}

impl<'a> Accumulator<'a> {
    fn push(&mut self, reading: &'a Reading, value: Option<f64>) {
        self.first.get_or_insert(reading);
        self.count += 1;
        if let Some(v) = value {
            self.sum += v;
            self.value_count += 1;
            self.min_value = Some(self.min_value.map_or(v, |m| m.min(v)));
            self.max_value = Some(self.max_value.map_or(v, |m| m.max(v)));
        }
        if let Some(ts) = reading.timestamp {
            self.min_date = Some(self.min_date.map_or(ts, |d| d.min(ts)));
            self.max_date = Some(self.max_date.map_or(ts, |d| d.max(ts)));
        }
    }
}

/// Group rows by site name and summarize `param_name` for each group.
///
/// The result holds exactly one entry per distinct site name, ordered by
/// name. Sites whose values are all null are kept with `mean = None`. An
/// unknown parameter behaves like a column of nulls.
pub fn summarize(dataset: &Dataset, param_name: &str) -> Vec<SiteSummary> {
    let param_index = dataset.schema().parameter_index(param_name);
    let mut groups: BTreeMap<&str, Accumulator> = BTreeMap::new();
    for reading in dataset.readings() {
        let value = param_index.and_then(|i| reading.value(i));
        groups
            .entry(reading.site_name.as_str())
            .or_default()
            .push(reading, value);
    }

    groups
        .into_iter()
        .filter_map(|(site_name, acc)| {
            let first = acc.first?;
            let (latitude, longitude) = match dataset.site(&first.site_id) {
                Some(site) => (site.latitude, site.longitude),
                None => (first.latitude, first.longitude),
            };
            Some(SiteSummary {
                site_name: site_name.to_string(),
                site_id: first.site_id.clone(),
                latitude,
                longitude,
                mean: (acc.value_count > 0).then(|| acc.sum / acc.value_count as f64),
                min_value: acc.min_value,
                max_value: acc.max_value,
                value_count: acc.value_count,
                min_date: acc.min_date,
                max_date: acc.max_date,
                count: acc.count,
            })
        })
        .collect()
}

/// Non-null site means, the input to the map's color scale.
pub fn defined_means(summaries: &[SiteSummary]) -> Vec<f64> {
    summaries.iter().filter_map(|s| s.mean).collect()
}
