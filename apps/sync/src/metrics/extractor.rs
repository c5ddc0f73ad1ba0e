use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::config::Config;
use crate::metrics::text::{
    count_hashtags, count_mentions, has_link, is_retweet_text, truncate_content,
};
use crate::models::post::{EngagementMetrics, Post, ReferenceKind};
use crate::models::row::{DerivedRow, MediaFlag, PostType, TimePeriod};

/// Turns a fetched post into its analytics row.
#[derive(Debug, Clone)]
pub struct MetricsExtractor {
    self_handle: String,
    timezone: Tz,
    tz_label: String,
}

impl MetricsExtractor {
    pub fn new(self_handle: impl Into<String>, timezone: Tz, tz_label: impl Into<String>) -> Self {
        Self {
            self_handle: self_handle.into(),
            timezone,
            tz_label: tz_label.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.twitter.username.clone(),
            config.schedule.timezone,
            config.schedule.tz_label.clone(),
        )
    }

    /// `synced_at` stamps the row and stands in for a missing creation time.
    pub fn extract(&self, post: &Post, synced_at: DateTime<Utc>) -> DerivedRow {
        let created = post
            .created_at
            .unwrap_or(synced_at)
            .with_timezone(&self.timezone);
        let metrics = &post.metrics;
        let image_count = post.media_keys.len();

        DerivedRow {
            date: created.format("%Y-%m-%d").to_string(),
            time: format!("{} {}", created.format("%H:%M:%S"), self.tz_label),
            time_period: TimePeriod::from_hour(created.hour()),
            day_of_week: created.format("%A").to_string(),
            content: truncate_content(&post.text),
            total_engagements: metrics.total_engagements(),
            likes: metrics.likes,
            retweets: metrics.reshares,
            bookmarks: metrics.bookmarks,
            replies: metrics.replies,
            quotes: metrics.quotes,
            impressions: metrics.impressions,
            engagement_rate: format_engagement_rate(metrics),
            post_type: classify(post),
            has_link: has_link(&post.text),
            has_image: image_count > 0,
            image_count,
            has_video: video_flag(post),
            hashtag_count: count_hashtags(&post.text),
            mention_count: count_mentions(&post.text, &self.self_handle),
            post_id: post.id,
            sync_time: self.sync_timestamp(synced_at),
        }
    }

    pub fn sync_timestamp(&self, synced_at: DateTime<Utc>) -> String {
        format!(
            "{} {}",
            synced_at
                .with_timezone(&self.timezone)
                .format("%Y-%m-%d %H:%M:%S"),
            self.tz_label
        )
    }
}

/// Percentage of impressions that produced an interaction, rounded to two places.
/// Zero impressions yield 0.
///
/// Rounds the exact binary value half-to-even (`1/32` → `3.12`), matching
/// rows already in the sheet; `(x * 100).round() / 100` would give `3.13`.
pub fn engagement_rate(metrics: &EngagementMetrics) -> f64 {
    if metrics.impressions == 0 {
        return 0.0;
    }
    let rate = metrics.total_engagements() as f64 / metrics.impressions as f64 * 100.0;
    format!("{rate:.2}").parse().unwrap_or(rate)
}

/// Renders the rate the way earlier rows in the sheet were written:
/// `0%` for no impressions, otherwise at least one decimal (`12.0%`, `2.5%`, `3.33%`).
pub fn format_engagement_rate(metrics: &EngagementMetrics) -> String {
    if metrics.impressions == 0 {
        return "0%".to_string();
    }
    let rate = engagement_rate(metrics);
    if rate.fract() == 0.0 {
        format!("{rate:.1}%")
    } else {
        format!("{rate}%")
    }
}

/// Retweet prefix wins; otherwise the first reply/quote reference in API order decides.
pub fn classify(post: &Post) -> PostType {
    if is_retweet_text(&post.text) {
        return PostType::Retweet;
    }
    post.references
        .iter()
        .find_map(|r| match r.kind {
            ReferenceKind::RepliedTo => Some(PostType::Reply),
            ReferenceKind::Quoted => Some(PostType::Quote),
            _ => None,
        })
        .unwrap_or(PostType::Regular)
}

/// Media keys carry no type without an expansion call, so any attachment
/// is only a possible video.
pub fn video_flag(post: &Post) -> MediaFlag {
    if post.media_keys.is_empty() {
        MediaFlag::False
    } else {
        MediaFlag::Possible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::post::{PostId, PostReference};
    use chrono::TimeZone;

    fn post(id: u64, text: &str) -> Post {
        Post {
            id: PostId(id),
            created_at: Some(Utc.with_ymd_and_hms(2025, 1, 15, 14, 30, 0).unwrap()),
            text: text.to_string(),
            metrics: EngagementMetrics::default(),
            media_keys: vec![],
            references: vec![],
        }
    }

    fn reference(kind: ReferenceKind) -> PostReference {
        PostReference {
            kind,
            id: "1".to_string(),
        }
    }

    fn extractor() -> MetricsExtractor {
        MetricsExtractor::new("me", chrono_tz::US::Eastern, "ET")
    }

    fn synced_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 16, 11, 0, 0).unwrap()
    }

    #[test]
    fn test_rate_is_zero_without_impressions() {
        let metrics = EngagementMetrics {
            likes: 10,
            ..Default::default()
        };
        assert_eq!(engagement_rate(&metrics), 0.0);
        assert_eq!(format_engagement_rate(&metrics), "0%");
    }

    #[test]
    fn test_rate_rounds_to_two_places() {
        let metrics = EngagementMetrics {
            likes: 1,
            impressions: 3,
            ..Default::default()
        };
        assert_eq!(engagement_rate(&metrics), 33.33);
        assert_eq!(format_engagement_rate(&metrics), "33.33%");
    }

    #[test]
    fn test_rate_ties_round_half_to_even() {
        let rate = |likes, impressions| {
            format_engagement_rate(&EngagementMetrics {
                likes,
                impressions,
                ..Default::default()
            })
        };
        // 3.125, 15.625 and 28.125 are exact in binary, so they are true ties.
        assert_eq!(rate(1, 32), "3.12%");
        assert_eq!(rate(5, 32), "15.62%");
        assert_eq!(rate(9, 32), "28.12%");
        assert_eq!(rate(3, 32), "9.38%");
    }

    #[test]
    fn test_rate_sums_every_interaction() {
        let metrics = EngagementMetrics {
            likes: 2,
            reshares: 1,
            bookmarks: 1,
            replies: 0,
            quotes: 1,
            impressions: 200,
        };
        assert_eq!(format_engagement_rate(&metrics), "2.5%");
    }

    #[test]
    fn test_whole_rate_keeps_one_decimal() {
        let metrics = EngagementMetrics {
            likes: 12,
            impressions: 100,
            ..Default::default()
        };
        assert_eq!(format_engagement_rate(&metrics), "12.0%");
    }

    #[test]
    fn test_retweet_prefix_beats_references() {
        let mut p = post(1, "RT @someone: great thread");
        p.references = vec![reference(ReferenceKind::RepliedTo)];
        assert_eq!(classify(&p), PostType::Retweet);
    }

    #[test]
    fn test_first_matching_reference_wins() {
        let mut p = post(1, "hmm");
        p.references = vec![
            reference(ReferenceKind::Quoted),
            reference(ReferenceKind::RepliedTo),
        ];
        assert_eq!(classify(&p), PostType::Quote);

        p.references.reverse();
        assert_eq!(classify(&p), PostType::Reply);
    }

    #[test]
    fn test_retweeted_reference_without_prefix_is_regular() {
        let mut p = post(1, "plain text");
        p.references = vec![reference(ReferenceKind::Retweeted)];
        assert_eq!(classify(&p), PostType::Regular);
    }

    #[test]
    fn test_attachments_give_possible_video() {
        let mut p = post(1, "photo!");
        assert_eq!(video_flag(&p), MediaFlag::False);
        p.media_keys = vec!["3_1".to_string(), "3_2".to_string()];
        assert_eq!(video_flag(&p), MediaFlag::Possible);

        let row = extractor().extract(&p, synced_at());
        assert!(row.has_image);
        assert_eq!(row.image_count, 2);
        assert_eq!(row.has_video, MediaFlag::Possible);
    }

    #[test]
    fn test_extract_converts_to_local_time() {
        // 14:30 UTC in January is 09:30 EST.
        let row = extractor().extract(&post(42, "hello #rust @me @you"), synced_at());
        assert_eq!(row.date, "2025-01-15");
        assert_eq!(row.time, "09:30:00 ET");
        assert_eq!(row.time_period, TimePeriod::Morning);
        assert_eq!(row.day_of_week, "Wednesday");
        assert_eq!(row.hashtag_count, 1);
        assert_eq!(row.mention_count, 1);
        assert_eq!(row.post_id, PostId(42));
        assert_eq!(row.sync_time, "2025-01-16 06:00:00 ET");
    }

    #[test]
    fn test_local_date_can_differ_from_utc_date() {
        let mut p = post(7, "late");
        p.created_at = Some(Utc.with_ymd_and_hms(2025, 7, 4, 2, 15, 0).unwrap());
        let row = extractor().extract(&p, synced_at());
        // 02:15 UTC in July is 22:15 EDT the previous day.
        assert_eq!(row.date, "2025-07-03");
        assert_eq!(row.time_period, TimePeriod::Night);
    }

    #[test]
    fn test_missing_created_at_falls_back_to_sync_time() {
        let mut p = post(8, "no timestamp");
        p.created_at = None;
        let row = extractor().extract(&p, synced_at());
        assert_eq!(row.date, "2025-01-16");
        assert_eq!(row.time, "06:00:00 ET");
    }

    #[test]
    fn test_cells_follow_header_order() {
        let row = extractor().extract(&post(105, "Check https://x.com #a #b @other"), synced_at());
        let cells = row.to_cells();
        assert_eq!(cells.len(), crate::models::row::COLUMN_COUNT);
        assert_eq!(cells[14], "TRUE");
        assert_eq!(cells[18], 2);
        assert_eq!(cells[19], 1);
        assert_eq!(cells[crate::models::row::POST_ID_COLUMN], "105");
    }
}
