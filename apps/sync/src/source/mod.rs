//! Remote source of posts. The sync orchestrator only sees this trait, so the
//! platform client can be swapped for a fake in tests.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::post::{Post, PostId};

pub mod twitter;

pub use twitter::TwitterSource;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[async_trait]
pub trait PostSource: Send + Sync {
    /// Posts strictly newer than `watermark`, newest first. Without a
    /// watermark, the most recent page.
    async fn fetch_since(&self, watermark: Option<PostId>) -> Result<Vec<Post>, SourceError>;
}
