// Sync orchestration: watermark → fetch → reconcile → extract → insert.
// One run at a time; the scheduler and the /sync route share the same instance.

pub mod reconcile;

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::metrics::MetricsExtractor;
use crate::models::post::PostId;
use crate::models::row::DerivedRow;
use crate::sheets::{SheetError, SheetStore};
use crate::source::PostSource;
use reconcile::reconcile;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("A sync is already in progress")]
    AlreadyRunning,

    #[error("Spreadsheet error: {0}")]
    Sheet(#[from] SheetError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    Startup,
    Scheduled,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub tweets_synced: usize,
    pub cells_updated: u64,
    /// Watermark after the run.
    pub watermark: Option<PostId>,
}

pub struct SyncOrchestrator {
    source: Arc<dyn PostSource>,
    store: SheetStore,
    extractor: MetricsExtractor,
    running: Mutex<()>,
}

impl SyncOrchestrator {
    pub fn new(source: Arc<dyn PostSource>, store: SheetStore, extractor: MetricsExtractor) -> Self {
        Self {
            source,
            store,
            extractor,
            running: Mutex::new(()),
        }
    }

    /// Runs one sync. Overlapping calls are rejected with `AlreadyRunning`
    /// rather than queued, so sheet mutations never interleave.
    ///
    /// Source failures degrade to zero tweets synced. Sheet failures fail the
    /// run; the next run resumes from whatever watermark the sheet holds.
    pub async fn run(&self, trigger: SyncTrigger) -> Result<SyncReport, SyncError> {
        let _guard = self.running.try_lock().map_err(|_| {
            warn!(?trigger, "Sync requested while another is running; rejected");
            SyncError::AlreadyRunning
        })?;

        info!(?trigger, "Starting tweet sync");
        let result = self.sync_once().await;
        match &result {
            Ok(report) => info!(
                ?trigger,
                tweets_synced = report.tweets_synced,
                cells_updated = report.cells_updated,
                watermark = ?report.watermark,
                "Tweet sync finished"
            ),
            Err(e) => error!(?trigger, "Tweet sync failed: {e}"),
        }
        result
    }

    #[cfg(test)]
    pub(crate) async fn hold_run_lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.running.lock().await
    }

    async fn sync_once(&self) -> Result<SyncReport, SyncError> {
        let watermark = self.store.read_watermark().await?;
        match watermark {
            Some(id) => info!("Current watermark: {id}"),
            None => info!("First sync - no watermark in sheet"),
        }

        let fetched = match self.source.fetch_since(watermark).await {
            Ok(posts) => posts,
            Err(e) => {
                warn!("Error fetching tweets, treating as no new tweets: {e}");
                return Ok(SyncReport {
                    tweets_synced: 0,
                    cells_updated: 0,
                    watermark,
                });
            }
        };

        let posts = reconcile(fetched, watermark);
        if posts.is_empty() {
            info!("No new tweets to add");
            return Ok(SyncReport {
                tweets_synced: 0,
                cells_updated: 0,
                watermark,
            });
        }

        let synced_at = Utc::now();
        let rows: Vec<DerivedRow> = posts
            .iter()
            .map(|post| self.extractor.extract(post, synced_at))
            .collect();

        self.store.ensure_headers().await?;
        let cells_updated = self.store.insert_rows(&rows).await?;

        Ok(SyncReport {
            tweets_synced: rows.len(),
            cells_updated,
            watermark: posts.first().map(|p| p.id),
        })
    }
}
