mod analysis;
mod common;
mod parsing;

use std::path::PathBuf;
use thiserror::Error;

use analysis::{generate_node_age_analysis, generate_node_age_plots};
use analysis::node_age::NodeAgeError;

/// Default burn-in fraction applied when none is given on the command line
const DEFAULT_BURNIN_FRACTION: f64 = 0.1;

/// Summarize node-age posteriors from BEAST-style divergence-time logs:
/// per-file mean, standard deviation, ESS and 95% HDI, exported as a CSV
/// table and a forest plot.
#[derive(argh::FromArgs)]
struct Args {
    /// directory containing the .log files
    #[argh(option, short = 'p')]
    path: PathBuf,

    /// output base name for the .csv and .png files
    #[argh(option, short = 'f')]
    filename: String,

    /// burn-in fraction in [0, 1), e.g. 0.1 or 0.2 (default 0.1)
    #[argh(option, short = 'b', default = "DEFAULT_BURNIN_FRACTION")]
    burnin_percentage: f64,
}

/// Errors that can occur during analysis
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("invalid burn-in fraction {0}: must lie in [0, 1)")]
    InvalidBurnin(f64),

    #[error("Node-age analysis error: {0}")]
    NodeAge(#[from] NodeAgeError),
}

type Result<T> = core::result::Result<T, AnalysisError>;

fn main() -> Result<()> {
    env_logger::init();
    let args: Args = argh::from_env();

    // Check if the input directory exists
    if !args.path.is_dir() {
        eprintln!(
            "Error: Input directory does not exist: {}",
            args.path.display()
        );
        std::process::exit(1);
    }
    if !(0.0..1.0).contains(&args.burnin_percentage) {
        return Err(AnalysisError::InvalidBurnin(args.burnin_percentage));
    }

    // Summarize every log file and export the CSV table
    let table = generate_node_age_analysis(&args.path, &args.filename, args.burnin_percentage)?;

    // Render the forest plot
    generate_node_age_plots(&table, &args.filename)?;

    Ok(())
}
