//! Download of the filtered table, optionally for a single site.

use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use wqm_core::export::{export_file_name, write_csv, DerivedColumns};
use wqm_core::Dataset;
use wqm_data::filter::{filter, select_site, FilterSpec};
use wqm_data::validate::{require_filter, require_site};

/// Write the filtered rows to `output`.
///
/// With a site, `output` may name a directory; the file is then named
/// after the site.
pub fn run_export(
    dataset: &Dataset,
    spec: &FilterSpec,
    site: Option<&str>,
    output: &Path,
    derived: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    require_filter(dataset, spec)?;
    let mut rows = filter(dataset, spec);
    let mut path = output.to_path_buf();
    if let Some(site) = site {
        require_site(dataset, site)?;
        rows = select_site(&rows, site);
        if output.is_dir() {
            path = output.join(export_file_name(site));
        }
    }

    let columns = if derived {
        DerivedColumns::all()
    } else {
        DerivedColumns::default()
    };
    write_file(&rows, &path, columns)?;
    log::info!("export: Wrote {} rows to {}", rows.len(), path.display());
    writeln!(out, "Wrote {} rows to {}", rows.len(), path.display())?;
    Ok(())
}

fn write_file(dataset: &Dataset, path: &Path, columns: DerivedColumns) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("Could not create {}", path.display()))?;
    write_csv(dataset, BufWriter::new(file), columns)
        .with_context(|| format!("Could not write {}", path.display()))?;
    Ok(())
}
