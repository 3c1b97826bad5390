//! Command implementations for the WQM CLI.
//!
//! Each subcommand loads the readings table, runs it through the pure
//! pipeline in `wqm-data` and prints the result as text or JSON. Commands
//! hold no state between runs.

use clap::Subcommand;
use std::io::{self, Write};
use std::path::PathBuf;

pub mod args;
pub mod charts;
pub mod export;
pub mod query;

use args::{FilterArgs, InputArgs, SeriesKind};

#[derive(Subcommand)]
pub enum Command {
    /// List sites, parameters and the overall date range
    Sites {
        #[command(flatten)]
        input: InputArgs,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Per-site summary of one parameter with marker colors
    Summary {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// Parameter to summarize
        #[arg(short, long)]
        param: String,

        /// Boundary overlay (GeoJSON) to attach to the map output
        #[arg(long)]
        overlay: Option<PathBuf>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Time series or monthly/yearly means of one parameter at one site
    Series {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// Site name
        #[arg(short, long)]
        site: String,

        /// Parameter to chart
        #[arg(short, long)]
        param: String,

        /// Raw readings or bucket means
        #[arg(short, long, value_enum, default_value = "raw")]
        granularity: SeriesKind,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Paired values of two parameters at one site
    Compare {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// Site name
        #[arg(short, long)]
        site: String,

        /// Parameter on the y axis
        #[arg(short, long)]
        param: String,

        /// Parameter on the x axis
        #[arg(short, long)]
        with: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Correlation matrix between parameters at one site
    Correlate {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// Site name
        #[arg(short, long)]
        site: String,

        /// Parameters to include (default: all)
        #[arg(short, long, num_args = 1..)]
        params: Vec<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Site closest to a map point
    Nearest {
        #[command(flatten)]
        input: InputArgs,

        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },

    /// Write the filtered table in the input's layout
    Export {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// Output file, or a directory when --site is given
        #[arg(short, long)]
        output: PathBuf,

        /// Only this site's readings
        #[arg(short, long)]
        site: Option<String>,

        /// Append derived Month and Year columns
        #[arg(long)]
        derived: bool,
    },
}

pub fn run(command: Command) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with_output(command, &mut out)
}

/// Run a command, printing results to `out`.
pub fn run_with_output(command: Command, out: &mut dyn Write) -> anyhow::Result<()> {
    match command {
        Command::Sites { input, json } => query::run_sites(&input.load()?, json, out),
        Command::Summary {
            input,
            filters,
            param,
            overlay,
            json,
        } => {
            let dataset = input.load()?;
            let spec = filters.to_spec(Some(&param));
            query::run_summary(&dataset, &spec, &param, overlay.as_deref(), json, out)
        }
        Command::Series {
            input,
            filters,
            site,
            param,
            granularity,
            json,
        } => {
            let dataset = input.load()?;
            let spec = filters.to_spec(Some(&param));
            charts::run_series(&dataset, &spec, &site, &param, granularity, json, out)
        }
        Command::Compare {
            input,
            filters,
            site,
            param,
            with,
            json,
        } => {
            let dataset = input.load()?;
            let spec = filters.to_spec(Some(&param));
            charts::run_compare(&dataset, &spec, &site, &param, &with, json, out)
        }
        Command::Correlate {
            input,
            filters,
            site,
            params,
            json,
        } => {
            let dataset = input.load()?;
            let spec = filters.to_spec(None);
            charts::run_correlate(&dataset, &spec, &site, &params, json, out)
        }
        Command::Nearest { input, lat, lon } => query::run_nearest(&input.load()?, lat, lon, out),
        Command::Export {
            input,
            filters,
            output,
            site,
            derived,
        } => {
            let dataset = input.load()?;
            let spec = filters.to_spec(None);
            export::run_export(&dataset, &spec, site.as_deref(), &output, derived, out)
        }
    }
}

/// Pretty JSON followed by a newline.
pub(crate) fn write_json<T: serde::Serialize + ?Sized>(
    out: &mut dyn Write,
    value: &T,
) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Text cell for an optional value.
pub(crate) fn fmt_value(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::PathBuf;
    use wqm_core::{loader, Dataset};

    pub const READINGS: &str = "\
Site ID,Site Name,Date,Latitude,Longitude,pH,Turbidity
1,Site A,2023-01-01,35.0,51.0,7.0,12.5
1,Site A,2023-02-01,35.0,51.0,7.5,
2,Site B,2023-01-15,36.0,52.0,,3.0
3,Site C,2023-03-10,35.5,50.0,8.0,4.0
";

    pub fn dataset() -> Dataset {
        loader::load_str(READINGS).unwrap()
    }

    /// Fresh scratch directory under the system temp dir.
    pub fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("wqm-cmd-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub fn output(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }
}
