//! In-memory sheet used by tests. Mirrors the Sheets API's shift semantics,
//! including formatting moving with inserted/deleted rows.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::models::row::COLUMN_COUNT;
use crate::sheets::{check_row_count, RowSpan, SheetBackend, SheetError};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Snapshot {
    pub rows: Vec<Vec<Value>>,
    pub bold_rows: BTreeSet<usize>,
}

#[derive(Default)]
pub struct MemorySheet {
    state: Mutex<Snapshot>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub fail_inserts: AtomicBool,
    pub fail_deletes: AtomicBool,
}

impl MemorySheet {
    pub fn with_rows(rows: Vec<Vec<Value>>) -> Self {
        let sheet = Self::default();
        sheet.state.lock().unwrap().rows = rows;
        sheet
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.lock().unwrap().clone()
    }

    fn injected(flag: &AtomicBool, op: &str) -> Result<(), SheetError> {
        if flag.load(Ordering::SeqCst) {
            return Err(SheetError::Api {
                status: 500,
                message: format!("injected {op} failure"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SheetBackend for MemorySheet {
    async fn read_rows(&self, rows: RowSpan) -> Result<Vec<Vec<Value>>, SheetError> {
        Self::injected(&self.fail_reads, "read")?;
        let state = self.state.lock().unwrap();
        let end = rows.end.min(state.rows.len());
        let mut out: Vec<Vec<Value>> = if rows.start < end {
            state.rows[rows.start..end].to_vec()
        } else {
            Vec::new()
        };
        while out.last().is_some_and(|r| r.is_empty()) {
            out.pop();
        }
        Ok(out)
    }

    async fn write_rows(&self, rows: RowSpan, values: &[Vec<Value>]) -> Result<u64, SheetError> {
        Self::injected(&self.fail_writes, "write")?;
        check_row_count(rows, values)?;
        let mut state = self.state.lock().unwrap();
        if state.rows.len() < rows.end {
            state.rows.resize(rows.end, Vec::new());
        }
        let mut cells = 0u64;
        for (offset, row) in values.iter().enumerate() {
            let row: Vec<Value> = row.iter().take(COLUMN_COUNT).cloned().collect();
            cells += row.len() as u64;
            state.rows[rows.start + offset] = row;
        }
        Ok(cells)
    }

    async fn insert_blank_rows(&self, rows: RowSpan) -> Result<(), SheetError> {
        Self::injected(&self.fail_inserts, "insert")?;
        let mut state = self.state.lock().unwrap();
        if state.rows.len() < rows.start {
            state.rows.resize(rows.start, Vec::new());
        }
        let tail = state.rows.split_off(rows.start);
        state.rows.extend(std::iter::repeat(Vec::new()).take(rows.len()));
        state.rows.extend(tail);
        state.bold_rows = state
            .bold_rows
            .iter()
            .map(|&r| if r >= rows.start { r + rows.len() } else { r })
            .collect();
        Ok(())
    }

    async fn delete_rows(&self, rows: RowSpan) -> Result<(), SheetError> {
        Self::injected(&self.fail_deletes, "delete")?;
        let mut state = self.state.lock().unwrap();
        let end = rows.end.min(state.rows.len());
        if rows.start < end {
            state.rows.drain(rows.start..end);
        }
        state.bold_rows = state
            .bold_rows
            .iter()
            .filter(|&&r| r < rows.start || r >= rows.end)
            .map(|&r| if r >= rows.end { r - rows.len() } else { r })
            .collect();
        Ok(())
    }

    async fn bold_rows(&self, rows: RowSpan) -> Result<(), SheetError> {
        let mut state = self.state.lock().unwrap();
        state.bold_rows.extend(rows.start..rows.end);
        Ok(())
    }
}
