//! An ordered, row-major table of [`Value`]s.
//!
//! This is intentionally small: it covers the projections, derived columns and lookups
//! needed to go from eval logs to plots and tables, and nothing more.

use super::Value;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when accessing or building a [`DataFrame`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("Column '{0}' does not exist in data frame")]
    MissingColumn(String),

    #[error("Column '{0}' appears more than once")]
    DuplicateColumn(String),

    #[error("Row has {actual} values but the data frame has {expected} columns")]
    RowLength { expected: usize, actual: usize },

    #[error("Value in column '{column}' at row {row} is not numeric")]
    NotNumeric { column: String, row: usize },
}

type Result<T> = core::result::Result<T, FrameError>;

/// Tabular data with named, ordered columns.
///
/// Deserialized frames are rebuilt through [`DataFrame::new`] and [`DataFrame::push_row`],
/// so a loaded frame has unique columns and rows of matching length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFrame")]
pub struct DataFrame {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// Serialized form of a [`DataFrame`], before its columns and rows are checked.
#[derive(Deserialize)]
struct RawFrame {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl TryFrom<RawFrame> for DataFrame {
    type Error = FrameError;

    fn try_from(raw: RawFrame) -> Result<Self> {
        let mut frame = DataFrame::new(raw.columns)?;
        frame.rows.reserve(raw.rows.len());
        for row in raw.rows {
            frame.push_row(row)?;
        }
        Ok(frame)
    }
}

/// A borrowed view of a single row of a [`DataFrame`].
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    frame: &'a DataFrame,
    index: usize,
}

impl DataFrame {
    /// Creates an empty data frame with the given columns.
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = Vec::new();
        for column in columns {
            let column = column.into();
            if names.contains(&column) {
                return Err(FrameError::DuplicateColumn(column));
            }
            names.push(column);
        }

        Ok(Self {
            columns: names,
            rows: Vec::new(),
        })
    }

    /// Appends a row. The number of values must match the number of columns.
    pub fn push_row(&mut self, values: Vec<Value>) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(FrameError::RowLength {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }

        self.rows.push(values);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    /// Returns the position of a column, or [`FrameError::MissingColumn`].
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| FrameError::MissingColumn(name.to_string()))
    }

    /// Returns the value at `row` in column `name`.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    pub fn value(&self, row: usize, name: &str) -> Result<&Value> {
        let column = self.column_index(name)?;
        Ok(&self.rows[row][column])
    }

    /// Reads a numeric value, treating Null and NaN as missing.
    ///
    /// Text and boolean values produce [`FrameError::NotNumeric`].
    pub fn f64_value(&self, row: usize, name: &str) -> Result<Option<f64>> {
        let value = self.value(row, name)?;
        if !value.is_numeric_or_missing() {
            return Err(FrameError::NotNumeric {
                column: name.to_string(),
                row,
            });
        }

        Ok(value.as_f64())
    }

    pub fn str_value(&self, row: usize, name: &str) -> Result<Option<&str>> {
        Ok(self.value(row, name)?.as_str())
    }

    /// Iterates over all rows.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = RowView<'_>> + '_ {
        (0..self.rows.len()).map(move |index| RowView { frame: self, index })
    }

    /// Returns a new data frame with only the given columns, in the given order.
    pub fn select(&self, names: &[&str]) -> Result<DataFrame> {
        let indices = names
            .iter()
            .map(|name| self.column_index(name))
            .collect::<Result<Vec<_>>>()?;

        let mut selected = DataFrame::new(names.iter().copied())?;
        selected.rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&index| row[index].clone()).collect())
            .collect();

        Ok(selected)
    }

    /// Adds a column derived from each row.
    ///
    /// If a column with the same name already exists, its values are replaced in place.
    /// The closure may fail, in which case the data frame is left unchanged.
    pub fn with_column<F, E>(&mut self, name: &str, mut derive: F) -> core::result::Result<(), E>
    where
        F: FnMut(RowView<'_>) -> core::result::Result<Value, E>,
    {
        let values = self
            .rows()
            .map(&mut derive)
            .collect::<core::result::Result<Vec<_>, E>>()?;

        match self.columns.iter().position(|column| column == name) {
            Some(index) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[index] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }

        Ok(())
    }

    /// Returns a new data frame holding the rows for which `keep` returns true.
    pub fn filter<F>(&self, mut keep: F) -> DataFrame
    where
        F: FnMut(RowView<'_>) -> bool,
    {
        let rows = self
            .rows()
            .filter(|row| keep(*row))
            .map(|row| self.rows[row.index].clone())
            .collect();

        DataFrame {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Distinct non-null values of a column, in order of first appearance.
    pub fn distinct(&self, name: &str) -> Result<Vec<Value>> {
        let index = self.column_index(name)?;
        let mut seen: Vec<Value> = Vec::new();
        for row in &self.rows {
            let value = &row[index];
            if !value.is_null() && !seen.contains(value) {
                seen.push(value.clone());
            }
        }

        Ok(seen)
    }
}

impl<'a> RowView<'a> {
    /// Position of this row within its data frame.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, name: &str) -> Result<&'a Value> {
        self.frame.value(self.index, name)
    }

    pub fn f64(&self, name: &str) -> Result<Option<f64>> {
        self.frame.f64_value(self.index, name)
    }

    pub fn str(&self, name: &str) -> Result<Option<&'a str>> {
        self.frame.str_value(self.index, name)
    }

    /// All values of the row, in column order.
    pub fn values(&self) -> &'a [Value] {
        &self.frame.rows[self.index]
    }
}
