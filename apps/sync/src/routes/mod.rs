pub mod health;
pub mod sync;

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/sync", get(sync::sync_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::test_config;
    use crate::metrics::MetricsExtractor;
    use crate::models::post::{EngagementMetrics, Post, PostId};
    use crate::sheets::memory::MemorySheet;
    use crate::sheets::SheetStore;
    use crate::source::fake::FakeSource;
    use crate::sync::SyncOrchestrator;

    fn post(id: u64) -> Post {
        Post {
            id: PostId(id),
            created_at: Some(Utc.with_ymd_and_hms(2025, 2, 2, 20, 0, 0).unwrap()),
            text: "hello".to_string(),
            metrics: EngagementMetrics::default(),
            media_keys: vec![],
            references: vec![],
        }
    }

    fn app(source: FakeSource, sheet: Arc<MemorySheet>) -> (Router, Arc<SyncOrchestrator>) {
        let config = Arc::new(test_config());
        let orchestrator = Arc::new(SyncOrchestrator::new(
            Arc::new(source),
            SheetStore::new(sheet),
            MetricsExtractor::from_config(&config),
        ));
        let state = AppState {
            config,
            orchestrator: orchestrator.clone(),
        };
        (build_router(state), orchestrator)
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_is_static() {
        let (router, _) = app(FakeSource::default(), Arc::new(MemorySheet::default()));
        let (status, body) = get_json(router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_sync_reports_count() {
        let sheet = Arc::new(MemorySheet::default());
        let (router, _) = app(FakeSource::with_posts(vec![post(3), post(2)]), sheet);
        let (status, body) = get_json(router, "/sync").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["tweets_synced"], 2);
    }

    #[tokio::test]
    async fn test_sync_source_failure_is_still_success() {
        let (router, _) = app(FakeSource::failing(), Arc::new(MemorySheet::default()));
        let (status, body) = get_json(router, "/sync").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tweets_synced"], 0);
    }

    #[tokio::test]
    async fn test_sync_sheet_failure_is_500() {
        let sheet = Arc::new(MemorySheet::default());
        sheet.fail_reads.store(true, Ordering::SeqCst);
        let (router, _) = app(FakeSource::with_posts(vec![post(1)]), sheet);
        let (status, body) = get_json(router, "/sync").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().unwrap().contains("injected read failure"));
    }

    #[tokio::test]
    async fn test_overlapping_sync_is_409() {
        let (router, orchestrator) = app(FakeSource::default(), Arc::new(MemorySheet::default()));
        let _running = orchestrator.hold_run_lock().await;

        let (status, body) = get_json(router, "/sync").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["status"], "error");
    }
}
