//! Core types for water-quality monitoring data.
//!
//! A [`Dataset`](reading::Dataset) is produced once per load event by the
//! [`loader`] and is never mutated afterwards. Every downstream stage
//! (see the `wqm-data` crate) takes a `&Dataset` and returns a new value.
//!
//! # Usage
//!
//! ```rust
//! use wqm_core::loader;
//!
//! let csv = "Site ID,Site Name,Date,Latitude,Longitude,pH\n\
//!            1,Site A,2023-01-01,35.1,51.4,7.0\n";
//! let dataset = loader::load_str(csv).unwrap();
//! assert_eq!(dataset.len(), 1);
//! assert_eq!(dataset.parameters(), ["pH"]);
//! ```

pub mod error;
pub mod export;
pub mod loader;
pub mod overlay;
pub mod reading;

pub use error::{ExportError, LoadError, OverlayError};
pub use reading::{Column, ColumnKind, Dataset, Reading, Schema, Site};
