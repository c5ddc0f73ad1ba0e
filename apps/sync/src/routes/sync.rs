use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::state::AppState;
use crate::sync::SyncTrigger;

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub status: &'static str,
    pub tweets_synced: usize,
}

/// GET /sync
/// Runs a sync immediately. 409 if one is already running, 500 if the sheet update fails.
pub async fn sync_handler(State(state): State<AppState>) -> Result<Json<SyncResponse>, AppError> {
    info!(
        user_id = %state.config.twitter.user_id,
        sheet = %state.config.sheets.sheet_name,
        "Manual sync requested"
    );
    let report = state.orchestrator.run(SyncTrigger::Manual).await?;
    Ok(Json(SyncResponse {
        status: "success",
        tweets_synced: report.tweets_synced,
    }))
}
