mod report;

use argh::FromArgs;
use report::{run, ReportError};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Builds score plots, a summary table and data frames from a directory of eval logs
#[derive(FromArgs, Debug)]
pub struct Args {
    /// directory containing eval logs (*.json, *.json.zst)
    #[argh(option, short = 'i')]
    input: PathBuf,

    /// directory to write plots and data frames to
    #[argh(option, short = 'o')]
    output: PathBuf,

    /// confidence level of error bars, overrides the settings file (default: 0.95)
    #[argh(option, short = 'c')]
    ci: Option<f64>,

    /// JSON file with report settings
    #[argh(option)]
    settings: Option<PathBuf>,

    /// also save a data frame with one row per message
    #[argh(switch)]
    messages: bool,
}

fn main() -> Result<(), ReportError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let args: Args = argh::from_env();

    let summary = run(&args, true)?;
    println!();
    println!("{}", summary.table);
    println!();
    println!("Wrote {} files to {}", summary.written.len(), args.output.display());
    Ok(())
}
