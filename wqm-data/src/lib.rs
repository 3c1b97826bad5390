//! Analysis stages for water-quality monitoring data.
//!
//! Data flows one way: a loaded [`Dataset`](wqm_core::Dataset) is narrowed by
//! [`filter`], then either summarized per site for the map ([`aggregate`],
//! [`color`], [`map`]) or turned into per-site chart data ([`series`],
//! [`correlation`]). Every function here is pure and returns a new value.

pub mod aggregate;
pub mod color;
pub mod correlation;
pub mod error;
pub mod filter;
pub mod map;
pub mod series;

pub use error::{AnalysisError, DegenerateScale};

/// Headline numbers for the whole dataset.
pub mod overview {
    use chrono::NaiveDateTime;
    use serde::Serialize;
    use std::collections::HashSet;
    use wqm_core::Dataset;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct Overview {
        pub rows: usize,
        /// Distinct `Site ID` values.
        pub total_sites: usize,
        pub first_date: Option<NaiveDateTime>,
        pub last_date: Option<NaiveDateTime>,
        pub parameter: Option<String>,
    }

    pub fn overview(dataset: &Dataset, parameter: Option<&str>) -> Overview {
        let total_sites = dataset
            .readings()
            .iter()
            .map(|r| r.site_id.as_str())
            .collect::<HashSet<_>>()
            .len();
        let timestamps = dataset.readings().iter().filter_map(|r| r.timestamp);
        Overview {
            rows: dataset.len(),
            total_sites,
            first_date: timestamps.clone().min(),
            last_date: timestamps.max(),
            parameter: parameter.map(String::from),
        }
    }

}

/// Up-front checks for caller-supplied names and for empty results.
pub mod validate {
    use crate::error::{AnalysisError, Result};
    use crate::filter::FilterSpec;
    use wqm_core::Dataset;

    /// Index of `param` within the dataset's parameters.
    pub fn require_parameter(dataset: &Dataset, param: &str) -> Result<usize> {
        dataset
            .schema()
            .parameter_index(param)
            .ok_or_else(|| AnalysisError::UnknownParameter(param.to_string()))
    }

    /// Fails unless some row carries `site` as its site name.
    pub fn require_site(dataset: &Dataset, site: &str) -> Result<()> {
        if dataset.readings().iter().any(|r| r.site_name == site) {
            Ok(())
        } else {
            Err(AnalysisError::UnknownSite(site.to_string()))
        }
    }

    /// Fails when a value bound names no parameter or one outside the schema.
    pub fn require_filter(dataset: &Dataset, spec: &FilterSpec) -> Result<()> {
        if !spec.has_value_bound() {
            return Ok(());
        }
        match spec.param_name.as_deref() {
            Some(param) => require_parameter(dataset, param).map(|_| ()),
            None => Err(AnalysisError::UnboundValueFilter),
        }
    }

    /// Fails with `EmptyResult` when the dataset has no rows.
    pub fn require_rows(dataset: &Dataset, stage: &'static str) -> Result<()> {
        if dataset.is_empty() {
            Err(AnalysisError::EmptyResult(stage))
        } else {
            Ok(())
        }
    }

}
