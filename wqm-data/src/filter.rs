//! Row filtering by date range, value range and site.
//!
//! Every predicate is optional and they combine with intersection
//! semantics. Filtering never mutates its input and filtering an already
//! filtered dataset with the same spec returns an equal dataset.

use chrono::NaiveDate;
use serde::Serialize;
use wqm_core::{Dataset, Reading};

/// Row predicates; `None` fields are unrestricted.
///
/// Date bounds are inclusive calendar days compared against the date part
/// of each reading's timestamp, so `date_to` keeps readings taken at any
/// time on that day.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSpec {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Parameter the value bounds apply to.
    pub param_name: Option<String>,
    pub value_min: Option<f64>,
    pub value_max: Option<f64>,
}

impl FilterSpec {
    pub fn is_unrestricted(&self) -> bool {
        self.date_from.is_none()
            && self.date_to.is_none()
            && self.value_min.is_none()
            && self.value_max.is_none()
    }

    fn has_date_bound(&self) -> bool {
        self.date_from.is_some() || self.date_to.is_some()
    }

    /// True when `value_min` or `value_max` is set.
    pub fn has_value_bound(&self) -> bool {
        self.value_min.is_some() || self.value_max.is_some()
    }

    fn keeps(&self, reading: &Reading, param_index: Option<usize>) -> bool {
        if self.has_date_bound() {
            let Some(date) = reading.timestamp.map(|ts| ts.date()) else {
                return false;
            };
            if self.date_from.is_some_and(|from| date < from) {
                return false;
            }
            if self.date_to.is_some_and(|to| date > to) {
                return false;
            }
        }
        if self.has_value_bound() {
            let Some(value) = param_index.and_then(|i| reading.value(i)) else {
                return false;
            };
            if self.value_min.is_some_and(|min| value < min) {
                return false;
            }
            if self.value_max.is_some_and(|max| value > max) {
                return false;
            }
        }
        true
    }
}

/// Rows of `dataset` that satisfy every bound in `spec`.
///
/// A value bound whose parameter is unset or absent from the schema matches
/// no row. An empty result is returned as an empty dataset.
pub fn filter(dataset: &Dataset, spec: &FilterSpec) -> Dataset {
    let param_index = spec
        .param_name
        .as_deref()
        .and_then(|name| dataset.schema().parameter_index(name));
    if spec.has_value_bound() && param_index.is_none() {
        log::warn!(
            "filter: value bound on unknown parameter {:?}; no rows can match",
            spec.param_name
        );
    }
    let filtered = dataset.retain_rows(|r| spec.keeps(r, param_index));
    log::debug!("filter: {} of {} rows kept", filtered.len(), dataset.len());
    filtered
}

/// Rows belonging to one site, matched by site name.
pub fn select_site(dataset: &Dataset, site_name: &str) -> Dataset {
    dataset.retain_rows(|r| r.site_name == site_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wqm_core::loader;

    const SAMPLE: &str = "\
Site ID,Site Name,Date,Latitude,Longitude,pH,Turbidity
1,Site A,2023-01-01,35.7,51.4,7.0,12.5
1,Site A,2023-02-01 18:30,35.7,51.4,7.5,
2,Site B,2023-01-15,35.1,51.9,,3.0
2,Site B,unknown,35.1,51.9,8.1,3.5
3,Site C,2023-03-20,35.2,51.8,6.2,4.0
";

    fn dataset() -> Dataset {
        loader::load_str(SAMPLE).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_unrestricted_spec_keeps_everything() {
        let data = dataset();
        let spec = FilterSpec::default();
        assert!(spec.is_unrestricted());
        assert_eq!(filter(&data, &spec), data);
    }

    #[test]
    fn test_date_range_is_inclusive_and_drops_null_dates() {
        let data = dataset();
        let spec = FilterSpec {
            date_from: Some(date(2023, 1, 15)),
            date_to: Some(date(2023, 2, 1)),
            ..FilterSpec::default()
        };
        let filtered = filter(&data, &spec);
        let names: Vec<_> = filtered.readings().iter().map(|r| r.site_name.as_str()).collect();
        assert_eq!(names, vec!["Site A", "Site B"]);
        assert!(filtered.readings().iter().all(|r| r.timestamp.is_some()));
    }

    #[test]
    fn test_value_range_drops_null_values() {
        let data = dataset();
        let spec = FilterSpec {
            param_name: Some("pH".to_string()),
            value_min: Some(7.0),
            ..FilterSpec::default()
        };
        let filtered = filter(&data, &spec);
        let values: Vec<_> = filtered.readings().iter().map(|r| r.value(0)).collect();
        assert_eq!(values, vec![Some(7.0), Some(7.5), Some(8.1)]);
    }

    #[test]
    fn test_date_and_value_bounds_intersect() {
        let data = dataset();
        let spec = FilterSpec {
            date_from: Some(date(2023, 1, 1)),
            param_name: Some("pH".to_string()),
            value_max: Some(7.2),
            ..FilterSpec::default()
        };
        let filtered = filter(&data, &spec);
        let values: Vec<_> = filtered.readings().iter().map(|r| r.value(0)).collect();
        assert_eq!(values, vec![Some(7.0), Some(6.2)]);
    }

    #[test]
    fn test_no_match_returns_empty_dataset() {
        let data = dataset();
        let spec = FilterSpec {
            param_name: Some("pH".to_string()),
            value_min: Some(10.0),
            ..FilterSpec::default()
        };
        let filtered = filter(&data, &spec);
        assert!(filtered.is_empty());
        assert_eq!(filtered.parameters(), data.parameters());
    }

    #[test]
    fn test_value_bound_on_unknown_parameter_matches_nothing() {
        let data = dataset();
        let spec = FilterSpec {
            param_name: Some("Nitrate".to_string()),
            value_min: Some(0.0),
            ..FilterSpec::default()
        };
        assert!(filter(&data, &spec).is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let data = dataset();
        let specs = [
            FilterSpec::default(),
            FilterSpec {
                date_to: Some(date(2023, 1, 31)),
                ..FilterSpec::default()
            },
            FilterSpec {
                date_from: Some(date(2023, 1, 2)),
                param_name: Some("Turbidity".to_string()),
                value_min: Some(3.0),
                value_max: Some(4.0),
                ..FilterSpec::default()
            },
        ];
        for spec in &specs {
            let once = filter(&data, spec);
            let twice = filter(&once, spec);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_filter_does_not_touch_input() {
        let data = dataset();
        let before = data.clone();
        let _ = filter(
            &data,
            &FilterSpec {
                date_from: Some(date(2024, 1, 1)),
                ..FilterSpec::default()
            },
        );
        assert_eq!(data, before);
    }

    #[test]
    fn test_select_site() {
        let data = dataset();
        let site_b = select_site(&data, "Site B");
        assert_eq!(site_b.len(), 2);
        assert!(site_b.readings().iter().all(|r| r.site_name == "Site B"));
        assert!(select_site(&data, "Nowhere").is_empty());
    }
}
