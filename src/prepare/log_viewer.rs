//! Adds links into a hosted log viewer for each row of a data frame.

use super::Operation;
use crate::frame::{DataFrame, FrameError, RowView, Value};
use crate::logs::evals::LOG;
use crate::logs::messages::{EPOCH, ID, MESSAGE_ID};
use serde::{Deserialize, Serialize};

pub const LOG_VIEWER: &str = "log_viewer";

/// Maps a local log directory to the URL the viewer serves it under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlMapping {
    pub directory: String,
    pub url: String,
}

impl UrlMapping {
    pub fn new(directory: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            url: url.into(),
        }
    }

    /// Path of `log` relative to this mapping's directory, if it lies below it.
    fn relative<'a>(&self, log: &'a str) -> Option<&'a str> {
        let directory = self.directory.replace('\\', "/");
        let directory = directory.trim_end_matches('/');
        let rest = log.strip_prefix(directory)?;
        match rest.strip_prefix('/') {
            Some(relative) if !relative.is_empty() => Some(relative),
            _ => None,
        }
    }
}

/// Which level of the log the links should point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogViewerKind {
    Eval,
    Sample,
    Message,
}

impl LogViewerKind {
    fn required_columns(&self) -> &'static [&'static str] {
        match self {
            LogViewerKind::Eval => &[LOG],
            LogViewerKind::Sample => &[LOG, ID, EPOCH],
            LogViewerKind::Message => &[LOG, ID, EPOCH, MESSAGE_ID],
        }
    }
}

/// Adds a `log_viewer` column with a URL for every row whose log is below a mapped directory.
#[derive(Debug, Clone)]
pub struct LogViewer {
    kind: LogViewerKind,
    url_mappings: Vec<UrlMapping>,
}

/// Creates the [`LogViewer`] operation.
pub fn log_viewer(kind: LogViewerKind, url_mappings: Vec<UrlMapping>) -> LogViewer {
    LogViewer { kind, url_mappings }
}

impl LogViewer {
    fn url(&self, row: RowView<'_>) -> Result<Option<String>, FrameError> {
        let log = match row.str(LOG)? {
            Some(log) => log,
            None => return Ok(None),
        };

        let Some((mapping, relative)) = self
            .url_mappings
            .iter()
            .find_map(|mapping| mapping.relative(log).map(|relative| (mapping, relative)))
        else {
            tracing::debug!(log, "no url mapping for log");
            return Ok(None);
        };

        let mut url = format!("{}/#/logs/{}", mapping.url.trim_end_matches('/'), relative);
        if self.kind == LogViewerKind::Eval {
            return Ok(Some(url));
        }

        let (id, epoch) = (row.get(ID)?, row.get(EPOCH)?);
        if id.is_null() || epoch.is_null() {
            return Ok(None);
        }
        url.push_str(&format!("/samples/sample/{}/{}", id, epoch));

        if self.kind == LogViewerKind::Message {
            match row.get(MESSAGE_ID)? {
                Value::Null => return Ok(None),
                message_id => url.push_str(&format!("/messages#{}", message_id)),
            }
        }

        Ok(Some(url))
    }
}

impl Operation for LogViewer {
    fn name(&self) -> &'static str {
        "log_viewer"
    }

    fn apply(&self, frame: &mut DataFrame) -> Result<(), FrameError> {
        for column in self.kind.required_columns() {
            frame.column_index(column)?;
        }

        frame.with_column(LOG_VIEWER, |row| self.url(row).map(Value::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn mappings() -> Vec<UrlMapping> {
        vec![
            UrlMapping::new("logs/cybench/", "https://viewer.example.com/cybench/"),
            UrlMapping::new("logs", "https://viewer.example.com"),
        ]
    }

    fn frame() -> DataFrame {
        let mut frame = DataFrame::new([LOG, ID, EPOCH, MESSAGE_ID]).unwrap();
        frame
            .push_row(vec![
                "logs/cybench/run.json".into(),
                "7".into(),
                2i64.into(),
                "m2".into(),
            ])
            .unwrap();
        frame
            .push_row(vec![
                "logs/intercode/run.json".into(),
                "a".into(),
                1i64.into(),
                Value::Null,
            ])
            .unwrap();
        frame
            .push_row(vec![
                "elsewhere/run.json".into(),
                "a".into(),
                1i64.into(),
                "m1".into(),
            ])
            .unwrap();
        frame
    }

    #[rstest(kind, expected,
        case(LogViewerKind::Eval, "https://viewer.example.com/cybench/#/logs/run.json"),
        case(LogViewerKind::Sample, "https://viewer.example.com/cybench/#/logs/run.json/samples/sample/7/2"),
        case(LogViewerKind::Message, "https://viewer.example.com/cybench/#/logs/run.json/samples/sample/7/2/messages#m2")
    )]
    fn builds_urls_per_kind(kind: LogViewerKind, expected: &str) {
        let mut frame = frame();
        log_viewer(kind, mappings()).apply(&mut frame).unwrap();
        assert_eq!(frame.str_value(0, LOG_VIEWER), Ok(Some(expected)));
    }

    #[test]
    fn falls_back_to_later_mappings() {
        let mut frame = frame();
        log_viewer(LogViewerKind::Sample, mappings())
            .apply(&mut frame)
            .unwrap();
        assert_eq!(
            frame.str_value(1, LOG_VIEWER),
            Ok(Some(
                "https://viewer.example.com/#/logs/intercode/run.json/samples/sample/a/1"
            ))
        );
    }

    #[test]
    fn unmapped_and_incomplete_rows_are_null() {
        let mut frame = frame();
        log_viewer(LogViewerKind::Message, mappings())
            .apply(&mut frame)
            .unwrap();
        assert_eq!(frame.value(1, LOG_VIEWER), Ok(&Value::Null));
        assert_eq!(frame.value(2, LOG_VIEWER), Ok(&Value::Null));
    }

    #[test]
    fn directory_must_match_whole_segments() {
        let mapping = UrlMapping::new("logs", "https://viewer.example.com");
        assert_eq!(mapping.relative("logs/run.json"), Some("run.json"));
        assert_eq!(mapping.relative("logs-old/run.json"), None);
        assert_eq!(mapping.relative("logs"), None);
    }

    #[test]
    fn sample_links_require_sample_columns() {
        let mut frame = DataFrame::new([LOG]).unwrap();
        frame.push_row(vec!["logs/run.json".into()]).unwrap();
        assert_eq!(
            log_viewer(LogViewerKind::Sample, mappings()).apply(&mut frame),
            Err(FrameError::MissingColumn(ID.to_string()))
        );

        log_viewer(LogViewerKind::Eval, mappings())
            .apply(&mut frame)
            .unwrap();
        assert_eq!(
            frame.str_value(0, LOG_VIEWER),
            Ok(Some("https://viewer.example.com/#/logs/run.json"))
        );
    }
}
