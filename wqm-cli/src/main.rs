//! WQM CLI - Command line tool for exploring water-quality monitoring data.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "wqm",
    version,
    about = "Water-quality monitoring data toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: wqm_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("wqm {}", env!("CARGO_PKG_VERSION"));
    wqm_cmd::run(cli.command)
}
