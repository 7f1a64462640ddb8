use anyhow::Result;
use camera_modes::{cli, config};
use clap::Parser;

fn main() -> Result<()> {
    // RUST_LOG overrides the default `info` level
    camera_modes::init_logger();

    let cli = cli::Cli::parse();
    config::init()?;

    cli::run(cli, &config::all())
}
