//! Twitter API v2 timeline client (app-only bearer auth).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::{Config, TwitterSettings};
use crate::models::post::{EngagementMetrics, Post, PostId, PostReference, ReferenceKind};
use crate::source::{PostSource, SourceError};

const TWEET_FIELDS: &str = "created_at,public_metrics,author_id,text,referenced_tweets,attachments";
const EXPANSIONS: &str = "referenced_tweets.id";

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    #[serde(default)]
    data: Option<Vec<ApiTweet>>,
    #[serde(default)]
    meta: Option<TimelineMeta>,
}

#[derive(Debug, Deserialize)]
struct TimelineMeta {
    #[serde(default)]
    result_count: Option<u32>,
    #[serde(default)]
    newest_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiTweet {
    id: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    public_metrics: Option<ApiMetrics>,
    #[serde(default)]
    referenced_tweets: Option<Vec<ApiReference>>,
    #[serde(default)]
    attachments: Option<ApiAttachments>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiMetrics {
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    retweet_count: u64,
    #[serde(default)]
    bookmark_count: u64,
    #[serde(default)]
    reply_count: u64,
    #[serde(default)]
    quote_count: u64,
    #[serde(default)]
    impression_count: u64,
}

#[derive(Debug, Deserialize)]
struct ApiReference {
    #[serde(rename = "type")]
    ref_type: String,
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiAttachments {
    #[serde(default)]
    media_keys: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

impl ApiTweet {
    fn into_post(self) -> Option<Post> {
        let id = match self.id.parse::<PostId>() {
            Ok(id) => id,
            Err(e) => {
                warn!("Skipping tweet with non-numeric id '{}': {e}", self.id);
                return None;
            }
        };
        let metrics = self.public_metrics.unwrap_or_default();

        Some(Post {
            id,
            created_at: self.created_at,
            text: self.text,
            metrics: EngagementMetrics {
                likes: metrics.like_count,
                reshares: metrics.retweet_count,
                bookmarks: metrics.bookmark_count,
                replies: metrics.reply_count,
                quotes: metrics.quote_count,
                impressions: metrics.impression_count,
            },
            media_keys: self
                .attachments
                .and_then(|a| a.media_keys)
                .unwrap_or_default(),
            references: self
                .referenced_tweets
                .unwrap_or_default()
                .into_iter()
                .map(|r| PostReference {
                    kind: ReferenceKind::from_api(&r.ref_type),
                    id: r.id,
                })
                .collect(),
        })
    }
}

/// Reads one user's timeline. A single page per call; no retries.
#[derive(Clone)]
pub struct TwitterSource {
    client: Client,
    settings: TwitterSettings,
}

impl TwitterSource {
    pub fn new(config: &Config) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(format!("sheet-sync/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            settings: config.twitter.clone(),
        })
    }

    fn timeline_url(&self) -> String {
        format!(
            "{}/2/users/{}/tweets",
            self.settings.api_url.trim_end_matches('/'),
            self.settings.user_id
        )
    }
}

/// Query string for the timeline call. `since_id` is an exclusive lower bound.
fn timeline_query(page_size: u32, watermark: Option<PostId>) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("max_results", page_size.to_string()),
        ("tweet.fields", TWEET_FIELDS.to_string()),
        ("expansions", EXPANSIONS.to_string()),
    ];
    if let Some(since) = watermark {
        params.push(("since_id", since.to_string()));
    }
    params
}

/// Decodes a timeline body. A missing `data` array means no posts.
fn parse_timeline(body: &str) -> Result<Vec<Post>, SourceError> {
    let response: TimelineResponse = serde_json::from_str(body)?;
    if let Some(meta) = &response.meta {
        debug!(
            result_count = meta.result_count.unwrap_or(0),
            newest_id = meta.newest_id.as_deref().unwrap_or("-"),
            "Timeline page received"
        );
    }
    Ok(response
        .data
        .unwrap_or_default()
        .into_iter()
        .filter_map(ApiTweet::into_post)
        .collect())
}

/// Seconds until the rate-limit window resets, from the `x-rate-limit-reset` epoch header.
fn retry_after_secs(reset_header: Option<&str>, now: DateTime<Utc>) -> u64 {
    reset_header
        .and_then(|v| v.trim().parse::<i64>().ok())
        .map(|reset| (reset - now.timestamp()).max(0) as u64)
        .unwrap_or(15 * 60)
}

#[async_trait]
impl PostSource for TwitterSource {
    async fn fetch_since(&self, watermark: Option<PostId>) -> Result<Vec<Post>, SourceError> {
        match watermark {
            Some(id) => info!("Fetching tweets newer than ID: {id}"),
            None => info!("No watermark; fetching most recent tweets"),
        }

        let response = self
            .client
            .get(self.timeline_url())
            .bearer_auth(&self.settings.bearer_token)
            .query(&timeline_query(self.settings.page_size, watermark))
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let reset = response
                .headers()
                .get("x-rate-limit-reset")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            return Err(SourceError::RateLimited {
                retry_after_secs: retry_after_secs(reset.as_deref(), Utc::now()),
            });
        }

        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|e| e.detail.or(e.title))
                .unwrap_or(body);
            return Err(SourceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let posts = parse_timeline(&body)?;
        debug!("Fetched {} tweets", posts.len());
        Ok(posts)
    }
}
