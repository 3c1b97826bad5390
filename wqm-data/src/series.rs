//! Per-site chart series: raw time series, monthly and yearly means, and
//! paired values for parameter comparison.
//!
//! Bucketed series are sparse. A month or year with no readings produces no
//! entry, so chart axes built from them are not continuous.

use chrono::{Datelike, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use wqm_core::{Dataset, Reading};
use wqm_utils::dates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Granularity {
    Month,
    Year,
}

/// Time-aggregation key. `month` is `None` for yearly buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bucket {
    pub year: i32,
    pub month: Option<u32>,
}

impl Bucket {
    pub fn of(ts: &NaiveDateTime, granularity: Granularity) -> Bucket {
        match granularity {
            Granularity::Month => Bucket {
                year: ts.year(),
                month: Some(ts.month()),
            },
            Granularity::Year => Bucket {
                year: ts.year(),
                month: None,
            },
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            Some(month) => write!(f, "{}", dates::month_label(self.year, month)),
            None => write!(f, "{}", self.year),
        }
    }
}

impl Serialize for Bucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Mean of one bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub bucket: Bucket,
    /// `None` when the bucket has readings but all of them are null.
    pub mean: Option<f64>,
    /// Non-null values averaged into `mean`.
    pub count: usize,
}

/// One raw reading of a parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimePoint {
    pub timestamp: NaiveDateTime,
    pub value: Option<f64>,
}

/// Both parameter values of one reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairedValue {
    pub x: f64,
    pub y: f64,
}

fn site_rows<'a>(dataset: &'a Dataset, site: &'a str) -> impl Iterator<Item = &'a Reading> + 'a {
    dataset.readings().iter().filter(move |r| r.site_name == site)
}

/// Bucket means of `param` for one site, ordered by bucket.
///
/// Rows with a null timestamp are left out entirely.
pub fn bucketed_series(
    dataset: &Dataset,
    site: &str,
    param: &str,
    granularity: Granularity,
) -> Vec<SeriesPoint> {
    let index = dataset.schema().parameter_index(param);
    let mut buckets: BTreeMap<Bucket, (f64, usize)> = BTreeMap::new();
    for reading in site_rows(dataset, site) {
        let Some(ts) = reading.timestamp else {
            continue;
        };
        let entry = buckets.entry(Bucket::of(&ts, granularity)).or_insert((0.0, 0));
        if let Some(v) = index.and_then(|i| reading.value(i)) {
            entry.0 += v;
            entry.1 += 1;
        }
    }
    buckets
        .into_iter()
        .map(|(bucket, (sum, count))| SeriesPoint {
            bucket,
            mean: (count > 0).then(|| sum / count as f64),
            count,
        })
        .collect()
}

/// Monthly means, keyed by (year, month).
pub fn monthly_series(dataset: &Dataset, site: &str, param: &str) -> Vec<SeriesPoint> {
    bucketed_series(dataset, site, param, Granularity::Month)
}

/// Yearly means, keyed by calendar year.
pub fn yearly_series(dataset: &Dataset, site: &str, param: &str) -> Vec<SeriesPoint> {
    bucketed_series(dataset, site, param, Granularity::Year)
}

/// Every dated reading of `param` at one site, in time order. Null values
/// are kept so a line chart can show gaps.
pub fn time_series(dataset: &Dataset, site: &str, param: &str) -> Vec<TimePoint> {
    let index = dataset.schema().parameter_index(param);
    let mut points: Vec<TimePoint> = site_rows(dataset, site)
        .filter_map(|r| {
            r.timestamp.map(|timestamp| TimePoint {
                timestamp,
                value: index.and_then(|i| r.value(i)),
            })
        })
        .collect();
    points.sort_by_key(|p| p.timestamp);
    points
}

/// Readings at one site where both parameters are non-null, in dataset order.
pub fn paired_values(dataset: &Dataset, site: &str, x_param: &str, y_param: &str) -> Vec<PairedValue> {
    let schema = dataset.schema();
    let (Some(xi), Some(yi)) = (schema.parameter_index(x_param), schema.parameter_index(y_param))
    else {
        return Vec::new();
    };
    site_rows(dataset, site)
        .filter_map(|r| Some(PairedValue { x: r.value(xi)?, y: r.value(yi)? }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use wqm_core::loader;

    const SAMPLE: &str = "\
Site ID,Site Name,Date,Latitude,Longitude,pH,DO
1,Site A,2023-03-10,35.7,51.4,6.0,8.0
1,Site A,2023-01-01,35.7,51.4,7.0,9.0
1,Site A,2023-01-20,35.7,51.4,7.4,
1,Site A,2023-05-05,35.7,51.4,,7.5
1,Site A,2024-02-01,35.7,51.4,8.0,7.0
1,Site A,??,35.7,51.4,9.9,9.9
2,Site B,2023-01-15,35.1,51.9,5.0,6.0
";

    fn bucket(year: i32, month: Option<u32>) -> Bucket {
        Bucket { year, month }
    }

    #[test]
    fn test_monthly_series_sparse_and_ordered() {
        let dataset = loader::load_str(SAMPLE).unwrap();
        let series = monthly_series(&dataset, "Site A", "pH");
        let buckets: Vec<String> = series.iter().map(|p| p.bucket.to_string()).collect();
        assert_eq!(buckets, vec!["2023-01", "2023-03", "2023-05", "2024-02"]);
        assert_relative_eq!(series[0].mean.unwrap(), 7.2);
        assert_eq!(series[0].count, 2);
        assert_eq!(series[1].mean, Some(6.0));
        assert_eq!(series[2].mean, None);
        assert_eq!(series[2].count, 0);
        assert_eq!(series[3].bucket, bucket(2024, Some(2)));
    }

    #[test]
    fn test_yearly_series() {
        let dataset = loader::load_str(SAMPLE).unwrap();
        let series = yearly_series(&dataset, "Site A", "pH");
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].bucket, bucket(2023, None));
        assert_eq!(series[0].bucket.to_string(), "2023");
        assert_relative_eq!(series[0].mean.unwrap(), (6.0 + 7.0 + 7.4) / 3.0);
        assert_eq!(series[1].mean, Some(8.0));
    }

    #[test]
    fn test_series_for_unknown_site_is_empty() {
        let dataset = loader::load_str(SAMPLE).unwrap();
        assert!(monthly_series(&dataset, "Nowhere", "pH").is_empty());
    }

    #[test]
    fn test_time_series_sorted_without_null_timestamps() {
        let dataset = loader::load_str(SAMPLE).unwrap();
        let points = time_series(&dataset, "Site A", "DO");
        assert_eq!(points.len(), 5);
        assert_eq!(
            points[0].timestamp,
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
        );
        assert_eq!(points[1].value, None);
        assert!(points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_paired_values_drop_incomplete_rows() {
        let dataset = loader::load_str(SAMPLE).unwrap();
        let pairs = paired_values(&dataset, "Site A", "DO", "pH");
        assert_eq!(
            pairs,
            vec![
                PairedValue { x: 8.0, y: 6.0 },
                PairedValue { x: 9.0, y: 7.0 },
                PairedValue { x: 7.0, y: 8.0 },
                PairedValue { x: 9.9, y: 9.9 },
            ]
        );
        assert!(paired_values(&dataset, "Site A", "pH", "Nitrate").is_empty());
    }
}
