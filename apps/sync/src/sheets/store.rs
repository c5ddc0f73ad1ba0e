use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::models::post::PostId;
use crate::models::row::{header_cells, DerivedRow, POST_ID_COLUMN};
use crate::sheets::{RowSpan, SheetBackend, SheetError};

const HEADER_ROW: usize = 0;
/// Newest data row; new rows are always inserted here.
const FIRST_DATA_ROW: usize = 1;

/// Sync protocol over a sheet: header row on top, data rows newest first.
#[derive(Clone)]
pub struct SheetStore {
    backend: Arc<dyn SheetBackend>,
}

impl SheetStore {
    pub fn new(backend: Arc<dyn SheetBackend>) -> Self {
        Self { backend }
    }

    /// ID in the first data row. An empty sheet or a short/unparseable row
    /// yields `None`; only backend failures are errors.
    pub async fn read_watermark(&self) -> Result<Option<PostId>, SheetError> {
        let rows = self
            .backend
            .read_rows(RowSpan::single(FIRST_DATA_ROW))
            .await?;

        let Some(first) = rows.into_iter().next() else {
            debug!("Sheet has no data rows");
            return Ok(None);
        };

        let Some(cell) = first.get(POST_ID_COLUMN) else {
            warn!(
                "First data row has {} columns, expected more than {POST_ID_COLUMN}; ignoring watermark",
                first.len()
            );
            return Ok(None);
        };

        let raw = match cell {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            other => {
                warn!("Unexpected watermark cell {other}; ignoring");
                return Ok(None);
            }
        };

        match raw.parse::<PostId>() {
            Ok(id) => Ok(Some(id)),
            Err(e) => {
                warn!("Watermark cell '{raw}' is not a post id ({e}); ignoring");
                Ok(None)
            }
        }
    }

    /// Writes and bolds the header row when it is empty. Returns whether
    /// headers were created; an existing header row is left untouched.
    pub async fn ensure_headers(&self) -> Result<bool, SheetError> {
        let existing = self.backend.read_rows(RowSpan::single(HEADER_ROW)).await?;
        if existing.first().is_some_and(|row| !row.is_empty()) {
            return Ok(false);
        }

        let header = RowSpan::single(HEADER_ROW);
        self.backend.write_rows(header, &[header_cells()]).await?;
        self.backend.bold_rows(header).await?;
        info!("Initialized header row");
        Ok(true)
    }

    /// Inserts `rows` (newest first) directly below the header, shifting
    /// existing data down, and returns the number of cells written.
    ///
    /// The backend has no insert-with-values, so this is insert-then-fill over
    /// one span. If the fill fails, the blank rows are deleted again so the
    /// watermark row is never left empty.
    pub async fn insert_rows(&self, rows: &[DerivedRow]) -> Result<u64, SheetError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let span = RowSpan::new(FIRST_DATA_ROW, FIRST_DATA_ROW + rows.len());
        let values: Vec<Vec<Value>> = rows.iter().map(DerivedRow::to_cells).collect();

        self.backend.insert_blank_rows(span).await?;

        match self.backend.write_rows(span, &values).await {
            Ok(cells) => {
                info!("Updated {cells} cells in the spreadsheet");
                Ok(cells)
            }
            Err(fill_error) => {
                error!("Filling {} inserted rows failed: {fill_error}", span.len());
                let cleaned_up = match self.backend.delete_rows(span).await {
                    Ok(()) => true,
                    Err(cleanup_error) => {
                        error!(
                            start_row = span.start + 1,
                            end_row = span.end,
                            "Blank rows left in sheet; removing them failed: {cleanup_error}"
                        );
                        false
                    }
                };
                Err(SheetError::FillFailed {
                    cleaned_up,
                    source: Box::new(fill_error),
                })
            }
        }
    }
}
