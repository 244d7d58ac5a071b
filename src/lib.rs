//! # eval-insights
//!
//! Turns directories of evaluation logs into data frames, asks language models structured
//! questions about conversation transcripts, and renders score summaries as bar plots,
//! heatmaps and tables.

pub mod error;
pub mod settings;

/// Statistics used when summarizing eval scores.
pub mod stats {
    /// Mapping from two-sided confidence levels to z critical values.
    pub mod confidence;

    /// Symmetric confidence bounds around point estimates.
    pub mod bounds;
}

/// A small ordered table type which the log readers produce and the visual components consume.
pub mod frame {
    pub mod data_frame;
    pub mod io;
    pub mod value;

    pub use data_frame::{DataFrame, FrameError, RowView};
    pub use io::{load_frame, save_frame, FrameFileError};
    pub use value::Value;
}

/// Reading eval logs from disk and flattening them into data frames.
pub mod logs {
    /// Serde model of the eval log JSON documents.
    pub mod model;

    /// Locating and parsing log files.
    pub mod reader;

    /// One row per eval log.
    pub mod evals;

    /// One row per message of every sample.
    pub mod messages;

    pub use evals::{evals_df, evals_frame};
    pub use messages::{messages_df, messages_frame, ColumnGroup};
    pub use reader::{
        find_eval_logs, read_eval_log, read_eval_log_files, read_eval_logs, EvalLogFile,
        LogReadError,
    };
}

/// Operations which enrich data frames after loading.
pub mod prepare {
    pub mod log_viewer;
    pub mod model_info;
    pub mod operation;

    pub use log_viewer::{log_viewer, LogViewer, LogViewerKind, UrlMapping};
    pub use model_info::{model_info, ModelInfo};
    pub use operation::{prepare, Operation, PrepareError};
}

/// LLM-judged scanners which answer structured questions about transcripts.
pub mod scanner {
    pub mod answer;
    pub mod builtin;
    pub mod scan;
    pub mod transcript;

    pub use answer::{AnswerField, FieldKind, StructuredAnswer};
    pub use builtin::{cybench_lint, perseveration, CybenchLint, Perseveration};
    pub use scan::{LanguageModel, Scan, ScanError, Scanner};
    pub use transcript::MessageFilter;
}

/// Visual components summarizing model scores across tasks.
pub mod viz {
    pub mod bar_plot;
    pub mod heatmap;
    pub mod plots;
    pub mod table;

    pub use bar_plot::{Bar, EvalsBarPlot, TaskFacet};
    pub use heatmap::{EvalsHeatmap, HeatmapGrid};
    pub use plots::PlotError;
    pub use table::{EvalsTable, EvalsTableRow};
}

pub use error::{Error, Result};
