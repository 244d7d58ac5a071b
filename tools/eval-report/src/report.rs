use crate::Args;
use eval_insights::frame::{save_frame, DataFrame};
use eval_insights::logs::{evals_frame, find_eval_logs, messages_frame, read_eval_log_files};
use eval_insights::logs::{ColumnGroup, EvalLogFile};
use eval_insights::prepare::{log_viewer, model_info, prepare, LogViewerKind, Operation};
use eval_insights::settings::ReportSettings;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const EVALS_FRAME_FILE: &str = "evals.json.zst";
pub const MESSAGES_FRAME_FILE: &str = "messages.json.zst";
pub const BAR_PLOT_FILE: &str = "evals_bar.svg";
pub const HEATMAP_FILE: &str = "evals_heatmap.svg";

/// Errors that can occur while building a report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Input path must be a directory: {0}")]
    InputNotDirectory(PathBuf),

    #[error("No eval logs could be read from {0}")]
    NoLogs(PathBuf),

    #[error("Failed to create output directory: {0}")]
    OutputDirectory(#[from] std::io::Error),

    #[error("Invalid progress bar template: {0}")]
    ProgressTemplate(#[from] indicatif::style::TemplateError),

    #[error(transparent)]
    Insights(#[from] eval_insights::Error),
}

type Result<T> = core::result::Result<T, ReportError>;

/// What a report run produced.
#[derive(Debug)]
pub struct ReportSummary {
    pub table: String,
    pub written: Vec<PathBuf>,
}

/// Reads the logs of `args.input` and writes every report artifact to `args.output`.
pub fn run(args: &Args, show_progress: bool) -> Result<ReportSummary> {
    if !args.input.is_dir() {
        return Err(ReportError::InputNotDirectory(args.input.clone()));
    }

    let mut settings = match &args.settings {
        Some(path) => ReportSettings::from_json_file(path).map_err(eval_insights::Error::from)?,
        None => ReportSettings::new(),
    };
    if let Some(ci) = args.ci {
        settings.ci = ci;
    }
    settings.validate().map_err(eval_insights::Error::from)?;

    println!("Building eval report:");
    println!("Input directory: {}", args.input.display());
    println!("Output directory: {}", args.output.display());
    println!("Confidence level: {}", settings.ci);

    let logs = read_logs(&args.input, show_progress)?;
    if logs.is_empty() {
        return Err(ReportError::NoLogs(args.input.clone()));
    }
    println!("Read {} eval logs", logs.len());

    fs::create_dir_all(&args.output)?;
    let mut written = Vec::new();

    let evals = evals_frame(&logs).map_err(eval_insights::Error::from)?;
    let evals = prepare_frame(evals, &settings, LogViewerKind::Eval)?;
    written.push(save(&evals, &args.output, EVALS_FRAME_FILE)?);

    let bar_plot = settings.bar_plot();
    if bar_plot.facets(&evals).map_err(eval_insights::Error::from)?.is_empty() {
        tracing::warn!(field = %settings.score_field, "no scored evals, skipping bar plot");
    } else {
        let bar_plot_path = args.output.join(BAR_PLOT_FILE);
        bar_plot
            .render(&evals, &bar_plot_path)
            .map_err(eval_insights::Error::from)?;
        written.push(bar_plot_path);
    }

    let heatmap = settings.heatmap();
    if heatmap.grid(&evals).map_err(eval_insights::Error::from)?.is_empty() {
        tracing::warn!("no heatmap cells, skipping heatmap");
    } else {
        let heatmap_path = args.output.join(HEATMAP_FILE);
        heatmap
            .render(&evals, &heatmap_path)
            .map_err(eval_insights::Error::from)?;
        written.push(heatmap_path);
    }

    if args.messages {
        let messages = messages_frame(&logs, &ColumnGroup::ALL).map_err(eval_insights::Error::from)?;
        let messages = prepare_frame(messages, &settings, LogViewerKind::Message)?;
        println!("Collected {} messages", messages.len());
        written.push(save(&messages, &args.output, MESSAGES_FRAME_FILE)?);
    }

    let table = settings
        .table()
        .render(&evals)
        .map_err(eval_insights::Error::from)?;

    Ok(ReportSummary { table, written })
}

/// Reads every log below `input`, skipping files which fail to parse.
fn read_logs(input: &Path, show_progress: bool) -> Result<Vec<EvalLogFile>> {
    let paths = find_eval_logs(input).map_err(eval_insights::Error::from)?;

    let progress = if show_progress {
        ProgressBar::new(paths.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:>12} [{bar:30.white}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    progress.set_prefix("Reading logs");

    let logs = read_eval_log_files(paths, |_| progress.inc(1));

    progress.finish_and_clear();
    Ok(logs)
}

/// Adds model names and, when log directories are mapped, log viewer links.
fn prepare_frame(
    frame: DataFrame,
    settings: &ReportSettings,
    kind: LogViewerKind,
) -> Result<DataFrame> {
    let model_info = model_info();
    let log_viewer = log_viewer(kind, settings.url_mappings.clone());

    let mut operations: Vec<&dyn Operation> = vec![&model_info];
    if !settings.url_mappings.is_empty() {
        operations.push(&log_viewer);
    }

    let prepared = prepare(frame, &operations).map_err(eval_insights::Error::from)?;
    Ok(prepared)
}

fn save(frame: &DataFrame, output: &Path, file_name: &str) -> Result<PathBuf> {
    let path = output.join(file_name);
    save_frame(frame, &path).map_err(eval_insights::Error::from)?;
    Ok(path)
}
