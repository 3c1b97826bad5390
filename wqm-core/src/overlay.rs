use crate::error::OverlayError;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// A boundary layer (e.g. a watershed outline) drawn on top of the site map.
///
/// The geometry is opaque here: it is only checked to be JSON and handed to
/// whatever renders the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub name: String,
    pub geojson: Value,
}

impl Overlay {
    /// Read an overlay file, naming it after the file stem.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Overlay, OverlayError> {
        let path = path.as_ref();
        let body = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "overlay".to_string());
        Overlay::parse(&name, &body)
    }

    /// Parse overlay JSON held in memory.
    pub fn parse(name: &str, body: &str) -> Result<Overlay, OverlayError> {
        let geojson: Value = serde_json::from_str(body)?;
        let overlay = Overlay {
            name: name.to_string(),
            geojson,
        };
        log::info!(
            "overlay: Loaded {} ({} features)",
            overlay.name,
            overlay.feature_count().unwrap_or(0)
        );
        Ok(overlay)
    }

    /// Number of entries in a FeatureCollection's `features` array.
    pub fn feature_count(&self) -> Option<usize> {
        self.geojson
            .get("features")
            .and_then(Value::as_array)
            .map(Vec::len)
    }
}
