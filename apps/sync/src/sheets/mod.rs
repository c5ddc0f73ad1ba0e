// Spreadsheet access in two layers: `SheetBackend` exposes the raw range
// primitives the Sheets API offers, `SheetStore` builds the sync protocol
// (watermark, headers, insert-at-top) on top of them.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod google;
#[cfg(test)]
pub mod memory;
pub mod store;

pub use google::GoogleSheets;
pub use store::SheetStore;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sheets API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid Sheets API URL: {0}")]
    InvalidUrl(String),

    #[error("Row count mismatch: range spans {expected} rows, got {actual} rows of values")]
    RowCountMismatch { expected: usize, actual: usize },

    #[error("Filling inserted rows failed (blank rows removed: {cleaned_up}): {source}")]
    FillFailed {
        cleaned_up: bool,
        #[source]
        source: Box<SheetError>,
    },
}

/// Half-open, zero-based row range `[start, end)` across the full A:V column span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpan {
    pub start: usize,
    pub end: usize,
}

impl RowSpan {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn single(row: usize) -> Self {
        Self::new(row, row + 1)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

#[async_trait]
pub trait SheetBackend: Send + Sync {
    /// Values in `rows`. Trailing empty rows may be omitted and rows may be
    /// shorter than the column span.
    async fn read_rows(&self, rows: RowSpan) -> Result<Vec<Vec<Value>>, SheetError>;

    /// Overwrites `rows` with `values` (one entry per row); returns the updated cell count.
    async fn write_rows(&self, rows: RowSpan, values: &[Vec<Value>]) -> Result<u64, SheetError>;

    /// Inserts blank rows at `rows`, shifting existing rows down.
    async fn insert_blank_rows(&self, rows: RowSpan) -> Result<(), SheetError>;

    /// Deletes `rows`, shifting later rows up.
    async fn delete_rows(&self, rows: RowSpan) -> Result<(), SheetError>;

    async fn bold_rows(&self, rows: RowSpan) -> Result<(), SheetError>;
}

pub(crate) fn check_row_count(rows: RowSpan, values: &[Vec<Value>]) -> Result<(), SheetError> {
    if rows.len() != values.len() {
        return Err(SheetError::RowCountMismatch {
            expected: rows.len(),
            actual: values.len(),
        });
    }
    Ok(())
}
