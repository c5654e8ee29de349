//! evofond command-line interface.
//!
//! ```text
//! evofond run project/config.json --output results/torrent
//! evofond hydrau project/config.json --discharge 25
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use evofond::io::{DataTable, write_config_reminder, write_results};
use evofond::simulation::Project;

/// Bed evolution of steep channels during a flood.
#[derive(Parser)]
#[command(name = "evofond")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "1D hydraulics and bedload transport along a torrent profile", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the flood event and write the results
    Run {
        /// Project configuration file
        config: PathBuf,

        /// Output directory (default: results/<NAME>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the steady water line for one discharge
    Hydrau {
        /// Project configuration file
        config: PathBuf,

        /// Discharge (m³/s)
        #[arg(short = 'q', long)]
        discharge: f64,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_target(false)
        .init();
}

fn run(config: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let mut project = Project::load(&config)
        .with_context(|| format!("cannot load project {}", config.display()))?;
    let result = project.run().context("event computation failed")?;

    let output = output.unwrap_or_else(|| PathBuf::from("results").join(&project.config.name));
    write_results(&output, &result, project.config.backup_time_step)
        .with_context(|| format!("cannot write results to {}", output.display()))?;
    write_config_reminder(&output, &project.config)?;

    if let Some(perf) = &project.performance {
        perf.save(output.join("perf.txt"))?;
        print!("{}", perf.summary());
    }

    println!(
        "{} recorded times, {} internal steps, net solid input {:.2} m³ -> {}",
        result.len(),
        result.n_internal_steps,
        result.volume_in - result.volume_out,
        output.display()
    );
    Ok(())
}

fn hydrau(config: PathBuf, discharge: f64) -> Result<()> {
    let project = Project::load(&config)
        .with_context(|| format!("cannot load project {}", config.display()))?;
    let line = project.hydraulics(discharge)?;
    let table = DataTable::new(
        ["x", "z", "y", "H"],
        vec![line.abscissa, line.bed, line.depth, line.energy],
    )?;
    print!("{}", table);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run { config, output } => run(config, output),
        Commands::Hydrau { config, discharge } => hydrau(config, discharge),
    }
}
