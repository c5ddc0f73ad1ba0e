use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform-assigned post identifier. IDs increase monotonically with
/// creation time, so the newest stored ID doubles as the sync watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostId(pub u64);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PostId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(PostId)
    }
}

impl TryFrom<String> for PostId {
    type Error = std::num::ParseIntError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PostId> for String {
    fn from(id: PostId) -> Self {
        id.to_string()
    }
}

/// Public engagement counters as reported at fetch time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub likes: u64,
    pub reshares: u64,
    pub bookmarks: u64,
    pub replies: u64,
    pub quotes: u64,
    pub impressions: u64,
}

impl EngagementMetrics {
    /// Sum of every interaction counter; impressions are not an interaction.
    pub fn total_engagements(&self) -> u64 {
        self.likes + self.reshares + self.bookmarks + self.replies + self.quotes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    RepliedTo,
    Quoted,
    Retweeted,
    #[serde(other)]
    Other,
}

impl ReferenceKind {
    pub fn from_api(kind: &str) -> Self {
        match kind {
            "replied_to" => ReferenceKind::RepliedTo,
            "quoted" => ReferenceKind::Quoted,
            "retweeted" => ReferenceKind::Retweeted,
            _ => ReferenceKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostReference {
    pub kind: ReferenceKind,
    pub id: String,
}

/// A single post as fetched from the platform. Never mutated after fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub created_at: Option<DateTime<Utc>>,
    pub text: String,
    pub metrics: EngagementMetrics,
    /// Attachment media keys. The timeline call does not expand media,
    /// so the type behind each key is unknown.
    pub media_keys: Vec<String>,
    /// Referenced posts in API order.
    pub references: Vec<PostReference>,
}
