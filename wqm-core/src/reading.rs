use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Header of the site identifier column.
pub const SITE_ID: &str = "Site ID";
/// Header of the site display name column.
pub const SITE_NAME: &str = "Site Name";
/// Header of the sampling date column.
pub const DATE: &str = "Date";
/// Header of the latitude column (decimal degrees).
pub const LATITUDE: &str = "Latitude";
/// Header of the longitude column (decimal degrees).
pub const LONGITUDE: &str = "Longitude";

/// Headers every input table must carry, in reporting order.
pub const REQUIRED_COLUMNS: [&str; 5] = [SITE_ID, SITE_NAME, DATE, LATITUDE, LONGITUDE];

/// What a column of the input table holds.
///
/// `Parameter` and `Text` carry an index into `Reading::values` and
/// `Reading::text` respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnKind {
    SiteId,
    SiteName,
    Date,
    Latitude,
    Longitude,
    Parameter(usize),
    Text(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// Column layout of a Dataset, in the order the source presented it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    columns: Vec<Column>,
    parameters: Vec<String>,
    delimiter: u8,
}

impl Schema {
    /// Build a schema from ordered columns. Parameter names are collected
    /// from the `Parameter` columns in index order.
    pub fn new(columns: Vec<Column>, delimiter: u8) -> Self {
        let mut indexed: Vec<(usize, String)> = columns
            .iter()
            .filter_map(|c| match c.kind {
                ColumnKind::Parameter(i) => Some((i, c.name.clone())),
                _ => None,
            })
            .collect();
        indexed.sort_by_key(|(i, _)| *i);
        Self {
            columns,
            parameters: indexed.into_iter().map(|(_, name)| name).collect(),
            delimiter,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Numeric parameter names, in schema order.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Index of a parameter within `Reading::values`.
    pub fn parameter_index(&self, name: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p == name)
    }

    /// Names of the non-numeric passthrough columns, in schema order.
    pub fn text_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| matches!(c.kind, ColumnKind::Text(_)))
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Field delimiter of the source; exports reuse it.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }
}

/// One row of monitoring data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub site_id: String,
    pub site_name: String,
    /// `None` when the source cell could not be parsed as a date.
    pub timestamp: Option<NaiveDateTime>,
    pub latitude: f64,
    pub longitude: f64,
    /// Parameter values, indexed like `Schema::parameters`.
    pub values: Vec<Option<f64>>,
    /// Non-numeric passthrough cells, kept only for export.
    pub text: Vec<String>,
}

impl Reading {
    /// Value of the parameter at `index`, `None` when null or out of range.
    pub fn value(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }
}

/// A fixed monitoring location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Site {
    pub site_id: String,
    pub site_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// An immutable, ordered sequence of readings sharing one schema.
///
/// The site registry maps each `site_id` to the first name and coordinates
/// seen for it in the loaded source. Row subsets keep the registry of the
/// dataset they were cut from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    schema: Schema,
    sites: Vec<Site>,
    #[serde(skip)]
    site_index: HashMap<String, usize>,
    readings: Vec<Reading>,
}

impl Dataset {
    /// Assemble a dataset, resolving the site registry first-seen wins.
    pub fn new(schema: Schema, readings: Vec<Reading>) -> Self {
        let (sites, _conflicts) = resolve_sites(&readings);
        Self::from_parts(schema, sites, readings)
    }

    pub(crate) fn from_parts(schema: Schema, sites: Vec<Site>, readings: Vec<Reading>) -> Self {
        let site_index = sites
            .iter()
            .enumerate()
            .map(|(i, site)| (site.site_id.clone(), i))
            .collect();
        Self {
            schema,
            sites,
            site_index,
            readings,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Numeric parameter names, in schema order.
    pub fn parameters(&self) -> &[String] {
        self.schema.parameters()
    }

    /// Registered site for a `site_id`.
    pub fn site(&self, site_id: &str) -> Option<&Site> {
        self.site_index.get(site_id).map(|&i| &self.sites[i])
    }

    /// Registered sites in first-seen order.
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// Distinct site names of the rows present, in first-seen order.
    pub fn site_names(&self) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        self.readings
            .iter()
            .filter(|r| seen.insert(r.site_name.as_str()))
            .map(|r| r.site_name.clone())
            .collect()
    }

    /// A new dataset holding the rows for which `keep` returns true.
    /// Row order, schema and site registry are preserved.
    pub fn retain_rows<F>(&self, keep: F) -> Dataset
    where
        F: Fn(&Reading) -> bool,
    {
        Dataset {
            schema: self.schema.clone(),
            sites: self.sites.clone(),
            site_index: self.site_index.clone(),
            readings: self.readings.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}

/// First-seen registry plus the number of rows that disagree with it.
pub(crate) fn resolve_sites(readings: &[Reading]) -> (Vec<Site>, usize) {
    let mut sites: Vec<Site> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut conflicts = 0usize;
    for reading in readings {
        match index.get(reading.site_id.as_str()) {
            Some(&i) => {
                let site = &sites[i];
                if site.site_name != reading.site_name
                    || site.latitude != reading.latitude
                    || site.longitude != reading.longitude
                {
                    conflicts += 1;
                }
            }
            None => {
                index.insert(reading.site_id.as_str(), sites.len());
                sites.push(Site {
                    site_id: reading.site_id.clone(),
                    site_name: reading.site_name.clone(),
                    latitude: reading.latitude,
                    longitude: reading.longitude,
                });
            }
        }
    }
    (sites, conflicts)
}
