use serde::Serialize;
use serde_json::{json, Value};

use crate::models::post::PostId;

/// Fixed header schema, columns A through V.
pub const HEADERS: [&str; 22] = [
    "Date",
    "Time",
    "Time Period",
    "Day of Week",
    "Tweet Content",
    "Total Engagements",
    "Likes",
    "Retweets",
    "Bookmarks",
    "Replies",
    "Quote Tweets",
    "Impressions",
    "Engagement Rate",
    "Tweet Type",
    "Has Link",
    "Has Image",
    "Number of Images",
    "Has Video",
    "Hashtag Count",
    "Mention Count",
    "Tweet ID",
    "Sync Time",
];

pub const COLUMN_COUNT: usize = HEADERS.len();

/// Zero-based column holding the post ID ("Tweet ID", column U).
pub const POST_ID_COLUMN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimePeriod {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimePeriod {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimePeriod::Morning,
            12..=16 => TimePeriod::Afternoon,
            17..=20 => TimePeriod::Evening,
            _ => TimePeriod::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimePeriod::Morning => "Morning",
            TimePeriod::Afternoon => "Afternoon",
            TimePeriod::Evening => "Evening",
            TimePeriod::Night => "Night",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PostType {
    Retweet,
    Reply,
    Quote,
    Regular,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Retweet => "Retweet",
            PostType::Reply => "Reply",
            PostType::Quote => "Quote",
            PostType::Regular => "Regular",
        }
    }
}

/// Tri-state media flag. `Possible` means attachments exist but their type
/// was never resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MediaFlag {
    #[allow(dead_code)]
    True,
    False,
    Possible,
}

impl MediaFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaFlag::True => "TRUE",
            MediaFlag::False => "FALSE",
            MediaFlag::Possible => "POSSIBLE",
        }
    }
}

fn bool_cell(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// One analytics row derived from a single post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedRow {
    pub date: String,
    pub time: String,
    pub time_period: TimePeriod,
    pub day_of_week: String,
    pub content: String,
    pub total_engagements: u64,
    pub likes: u64,
    pub retweets: u64,
    pub bookmarks: u64,
    pub replies: u64,
    pub quotes: u64,
    pub impressions: u64,
    /// Already rendered, e.g. `2.5%`.
    pub engagement_rate: String,
    pub post_type: PostType,
    pub has_link: bool,
    pub has_image: bool,
    pub image_count: usize,
    pub has_video: MediaFlag,
    pub hashtag_count: usize,
    pub mention_count: usize,
    pub post_id: PostId,
    pub sync_time: String,
}

impl DerivedRow {
    /// Cell values in header order. Counters stay numeric so the sheet can aggregate them.
    pub fn to_cells(&self) -> Vec<Value> {
        vec![
            json!(self.date),
            json!(self.time),
            json!(self.time_period.as_str()),
            json!(self.day_of_week),
            json!(self.content),
            json!(self.total_engagements),
            json!(self.likes),
            json!(self.retweets),
            json!(self.bookmarks),
            json!(self.replies),
            json!(self.quotes),
            json!(self.impressions),
            json!(self.engagement_rate),
            json!(self.post_type.as_str()),
            json!(bool_cell(self.has_link)),
            json!(bool_cell(self.has_image)),
            json!(self.image_count),
            json!(self.has_video.as_str()),
            json!(self.hashtag_count),
            json!(self.mention_count),
            json!(self.post_id.to_string()),
            json!(self.sync_time),
        ]
    }
}

pub fn header_cells() -> Vec<Value> {
    HEADERS.iter().map(|h| json!(h)).collect()
}
