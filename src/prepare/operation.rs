use crate::frame::{DataFrame, FrameError};
use thiserror::Error;

/// Errors that can occur while preparing a data frame
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrepareError {
    #[error("Operation '{operation}' failed: {source}")]
    Frame {
        operation: &'static str,
        #[source]
        source: FrameError,
    },
}

/// A transformation applied to a data frame after it was loaded.
pub trait Operation {
    /// Short name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Applies the operation in place.
    fn apply(&self, frame: &mut DataFrame) -> Result<(), FrameError>;
}

/// Applies `operations` to `frame` in order and returns the result.
///
/// Stops at the first failing operation.
pub fn prepare(mut frame: DataFrame, operations: &[&dyn Operation]) -> Result<DataFrame, PrepareError> {
    for operation in operations {
        operation
            .apply(&mut frame)
            .map_err(|source| PrepareError::Frame {
                operation: operation.name(),
                source,
            })?;
        tracing::debug!(operation = operation.name(), rows = frame.len(), "applied operation");
    }

    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Value;

    struct Constant(&'static str);

    impl Operation for Constant {
        fn name(&self) -> &'static str {
            "constant"
        }

        fn apply(&self, frame: &mut DataFrame) -> Result<(), FrameError> {
            frame.with_column(self.0, |_| Ok(Value::Int(1)))
        }
    }

    struct Fails;

    impl Operation for Fails {
        fn name(&self) -> &'static str {
            "fails"
        }

        fn apply(&self, frame: &mut DataFrame) -> Result<(), FrameError> {
            frame.column_index("missing").map(|_| ())
        }
    }

    #[test]
    fn operations_apply_in_order() {
        let mut frame = DataFrame::new(["model"]).unwrap();
        frame.push_row(vec!["a".into()]).unwrap();

        let prepared = prepare(frame, &[&Constant("first"), &Constant("second")]).unwrap();
        assert_eq!(prepared.columns(), ["model", "first", "second"]);
    }

    #[test]
    fn failure_names_the_operation() {
        let frame = DataFrame::new(["model"]).unwrap();
        let err = prepare(frame, &[&Constant("first"), &Fails]).unwrap_err();
        assert_eq!(
            err,
            PrepareError::Frame {
                operation: "fails",
                source: FrameError::MissingColumn("missing".to_string())
            }
        );
        assert!(err.to_string().starts_with("Operation 'fails' failed"));
    }
}
