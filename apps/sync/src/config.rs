use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono_tz::Tz;

const DEFAULT_TWITTER_API_URL: &str = "https://api.twitter.com";
const DEFAULT_SHEETS_API_URL: &str = "https://sheets.googleapis.com";

/// Application configuration loaded from environment variables.
/// Built once at startup and shared by reference; nothing below `main` reads the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub twitter: TwitterSettings,
    pub sheets: SheetSettings,
    pub schedule: ScheduleSettings,
    pub port: u16,
    pub rust_log: String,
    pub http_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct TwitterSettings {
    pub api_url: String,
    pub bearer_token: String,
    /// Numeric account ID whose timeline is synced.
    pub user_id: String,
    /// Handle without the leading `@`; excluded from mention counts.
    pub username: String,
    pub page_size: u32,
}

#[derive(Debug, Clone)]
pub struct SheetSettings {
    pub api_url: String,
    pub access_token: String,
    pub spreadsheet_id: String,
    /// Tab title used in A1 ranges.
    pub sheet_name: String,
    /// Numeric tab id used by structural batch requests.
    pub sheet_gid: i64,
}

#[derive(Debug, Clone)]
pub struct ScheduleSettings {
    pub timezone: Tz,
    /// Suffix written after local times, e.g. `ET`.
    pub tz_label: String,
    pub hour: u32,
    pub minute: u32,
    pub sync_on_startup: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let timezone_name = optional_env("SYNC_TIMEZONE", "US/Eastern");
        let timezone: Tz = timezone_name
            .parse()
            .map_err(|e| anyhow::anyhow!("SYNC_TIMEZONE '{timezone_name}' is invalid: {e}"))?;

        let hour = parse_env("SYNC_HOUR", 6u32)?;
        let minute = parse_env("SYNC_MINUTE", 0u32)?;
        if hour > 23 || minute > 59 {
            bail!("SYNC_HOUR/SYNC_MINUTE out of range: {hour:02}:{minute:02}");
        }

        Ok(Config {
            twitter: TwitterSettings {
                api_url: optional_env("TWITTER_API_URL", DEFAULT_TWITTER_API_URL),
                bearer_token: require_env("TWITTER_BEARER_TOKEN")?,
                user_id: require_env("TWITTER_USER_ID")?,
                username: require_env("TWITTER_USERNAME")?
                    .trim_start_matches('@')
                    .to_string(),
                page_size: clamp_page_size(parse_env("TWITTER_PAGE_SIZE", 100u32)?),
            },
            sheets: SheetSettings {
                api_url: optional_env("SHEETS_API_URL", DEFAULT_SHEETS_API_URL),
                access_token: require_env("GOOGLE_ACCESS_TOKEN")?,
                spreadsheet_id: require_env("SPREADSHEET_ID")?,
                sheet_name: optional_env("SHEET_NAME", "posts"),
                sheet_gid: parse_env("SHEET_GID", 0i64)?,
            },
            schedule: ScheduleSettings {
                timezone,
                tz_label: optional_env("SYNC_TZ_LABEL", "ET"),
                hour,
                minute,
                sync_on_startup: parse_env("SYNC_ON_STARTUP", true)?,
            },
            port: parse_env("PORT", 8080u16).context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG", "info"),
            http_timeout: Duration::from_secs(parse_env("HTTP_TIMEOUT_SECS", 30u64)?),
        })
    }
}

/// The timeline endpoint accepts `max_results` in 5..=100.
pub fn clamp_page_size(requested: u32) -> u32 {
    requested.clamp(5, 100)
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Environment variable '{key}' is invalid: {e}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        twitter: TwitterSettings {
            api_url: DEFAULT_TWITTER_API_URL.to_string(),
            bearer_token: "test-bearer".to_string(),
            user_id: "1237140914558164992".to_string(),
            username: "me".to_string(),
            page_size: 100,
        },
        sheets: SheetSettings {
            api_url: DEFAULT_SHEETS_API_URL.to_string(),
            access_token: "test-token".to_string(),
            spreadsheet_id: "sheet-under-test".to_string(),
            sheet_name: "posts".to_string(),
            sheet_gid: 0,
        },
        schedule: ScheduleSettings {
            timezone: chrono_tz::US::Eastern,
            tz_label: "ET".to_string(),
            hour: 6,
            minute: 0,
            sync_on_startup: false,
        },
        port: 8080,
        rust_log: "info".to_string(),
        http_timeout: Duration::from_secs(30),
    }
}
