//! Columnar frame built from row-records.
//!
//! The serving boundary speaks JSON rows: a request carries a sequence of
//! records, each a mapping from column name to a numeric value. Internally
//! every adapter operation materializes those rows into a [`Frame`], a
//! column-major table keyed by column name, and converts between frames and
//! aprender's `Matrix`/`Vector` primitives at the model seam.
//!
//! # Example
//!
//! ```
//! use servir::frame::{Frame, Record};
//!
//! let records: Vec<Record> = serde_json::from_value(serde_json::json!([
//!     {"a": 1.0, "b": 2.0},
//!     {"a": 2.0, "b": 4.0},
//! ]))
//! .expect("valid records");
//!
//! let frame = Frame::from_records(&records).expect("numeric columns");
//! assert_eq!(frame.num_rows(), 2);
//! assert_eq!(frame.columns(), ["a", "b"]);
//! ```

use std::collections::HashMap;

use aprender::primitives::{Matrix, Vector};
use serde_json::Value;
use thiserror::Error;

/// A single row at the adapter boundary: column name -> JSON value.
pub type Record = serde_json::Map<String, Value>;

/// Frame errors
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Non-numeric value in column '{column}' at row {row}")]
    NonNumeric { column: String, row: usize },

    #[error("Label count mismatch: {labels} labels for {columns} columns")]
    LabelMismatch { labels: usize, columns: usize },

    #[error("Frame has no columns")]
    EmptyColumns,

    #[error("Matrix construction failed: {0}")]
    Matrix(String),
}

/// Result type for frame operations
pub type Result<T> = std::result::Result<T, FrameError>;

/// In-memory columnar table indexed by column name.
///
/// Column order is deterministic: the key order of the first record for
/// [`Frame::from_records`], the caller-supplied order for projections and
/// label assignment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    columns: Vec<String>,
    data: HashMap<String, Vec<f32>>,
    rows: usize,
}

impl Frame {
    /// Build a frame from a sequence of row-records.
    ///
    /// The first record fixes the column set; every following record must
    /// contain each of those columns with a numeric value. Keys not present
    /// in the first record are ignored.
    pub fn from_records(records: &[Record]) -> Result<Self> {
        let Some(first) = records.first() else {
            return Ok(Self::default());
        };

        let columns: Vec<String> = first.keys().cloned().collect();
        let mut data: HashMap<String, Vec<f32>> = columns
            .iter()
            .map(|c| (c.clone(), Vec::with_capacity(records.len())))
            .collect();

        for (row, record) in records.iter().enumerate() {
            for column in &columns {
                let value = record
                    .get(column)
                    .ok_or_else(|| FrameError::MissingColumn(column.clone()))?;
                let number = value.as_f64().ok_or_else(|| FrameError::NonNumeric {
                    column: column.clone(),
                    row,
                })?;
                // infallible: every column was inserted above
                if let Some(values) = data.get_mut(column) {
                    values.push(number as f32);
                }
            }
        }

        Ok(Self { columns, data, rows: records.len() })
    }

    /// Build a one-column frame from a vector.
    pub fn from_vector(values: &Vector<f32>, label: &str) -> Self {
        let values = values.as_slice().to_vec();
        let rows = values.len();
        let mut data = HashMap::new();
        data.insert(label.to_string(), values);
        Self { columns: vec![label.to_string()], data, rows }
    }

    /// Build a frame from a matrix, naming columns from `labels` when given.
    ///
    /// Without labels, columns are named `y0..yN`. A label count that does
    /// not match the matrix width is a [`FrameError::LabelMismatch`].
    pub fn from_matrix(matrix: &Matrix<f32>, labels: Option<&[String]>) -> Result<Self> {
        let (rows, cols) = matrix.shape();

        let columns: Vec<String> = match labels {
            Some(labels) => {
                if labels.len() != cols {
                    return Err(FrameError::LabelMismatch { labels: labels.len(), columns: cols });
                }
                labels.to_vec()
            }
            None => (0..cols).map(|i| format!("y{i}")).collect(),
        };

        let mut data: HashMap<String, Vec<f32>> = columns
            .iter()
            .map(|c| (c.clone(), Vec::with_capacity(rows)))
            .collect();

        for i in 0..rows {
            for (j, column) in columns.iter().enumerate() {
                if let Some(values) = data.get_mut(column) {
                    values.push(matrix.get(i, j));
                }
            }
        }

        Ok(Self { columns, data, rows })
    }

    /// Project to exactly the named columns, order preserved.
    pub fn select(&self, columns: &[String]) -> Result<Self> {
        let mut data = HashMap::new();
        for column in columns {
            let values = self
                .data
                .get(column)
                .ok_or_else(|| FrameError::MissingColumn(column.clone()))?;
            data.insert(column.clone(), values.clone());
        }
        Ok(Self { columns: columns.to_vec(), data, rows: self.rows })
    }

    /// A single column as an aprender vector.
    pub fn column(&self, name: &str) -> Result<Vector<f32>> {
        self.data
            .get(name)
            .map(|values| Vector::from_slice(values))
            .ok_or_else(|| FrameError::MissingColumn(name.to_string()))
    }

    /// Convert to a row-major aprender matrix.
    pub fn to_matrix(&self) -> Result<Matrix<f32>> {
        if self.columns.is_empty() {
            return Err(FrameError::EmptyColumns);
        }

        let mut flat = Vec::with_capacity(self.rows * self.columns.len());
        for row in 0..self.rows {
            for column in &self.columns {
                if let Some(values) = self.data.get(column) {
                    flat.push(values[row]);
                }
            }
        }

        Matrix::from_vec(self.rows, self.columns.len(), flat)
            .map_err(|e| FrameError::Matrix(e.to_string()))
    }

    /// Convert back to row-records for the serving boundary.
    ///
    /// Non-finite values (NaN, infinity) serialize as JSON null.
    pub fn to_records(&self) -> Vec<Record> {
        (0..self.rows)
            .map(|row| {
                let mut record = Record::new();
                for column in &self.columns {
                    if let Some(values) = self.data.get(column) {
                        let value = serde_json::Number::from_f64(f64::from(values[row]))
                            .map_or(Value::Null, Value::Number);
                        record.insert(column.clone(), value);
                    }
                }
                record
            })
            .collect()
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Whether the frame holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

// =============================================================================
// Tests
// =============================================================================


// =============================================================================
// Property Tests
// =============================================================================
