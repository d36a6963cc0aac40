//! Core data models for the account manager

use serde::{Deserialize, Serialize};

/// Avatar assigned to accounts that were not given one
pub const DEFAULT_PROFILE_IMAGE: &str = "/avatars/default.png";

/// Base of the externally visible channel URL
pub const CHANNEL_URL_BASE: &str = "https://youtube.com/channel/";

/// One catalogued YouTube channel with cached statistics

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub id: String,

    pub name: String,

    pub email: String,

    pub profile_image: String,

    /// Date-only ISO string (`YYYY-MM-DD`)
    pub created_at: String,

    #[serde(default)]
    pub subscribers: u64,

    #[serde(default)]
    pub total_views: u64,

    #[serde(default)]
    pub total_videos: u64,

    #[serde(default)]
    pub estimated_revenue: f64,

    #[serde(default)]
    pub is_active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(
        rename = "content_niche",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub content_niche: Option<String>,

    #[serde(
        rename = "upload_frequency",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub upload_frequency: Option<String>,
}

impl AccountRecord {
    /// Attach an allocated id to a candidate record
    pub fn from_new(id: String, account: NewAccount) -> Self {
        Self {
            id,
            name: account.name,
            email: account.email,
            profile_image: account.profile_image,
            created_at: account.created_at,
            subscribers: account.subscribers,
            total_views: account.total_views,
            total_videos: account.total_videos,
            estimated_revenue: account.estimated_revenue.max(0.0),
            is_active: account.is_active,
            channel_id: account.channel_id,
            description: account.description,
            content_niche: account.content_niche,
            upload_frequency: account.upload_frequency,
        }
    }

    /// Numeric value of the id; non-numeric ids count as 0
    pub fn numeric_id(&self) -> u64 {
        self.id.trim().parse::<u64>().unwrap_or(0)
    }

    /// Channel identifier used for external links, falling back to the record id
    pub fn external_channel_id(&self) -> &str {
        match self.channel_id.as_deref() {
            Some(channel_id) if !channel_id.is_empty() => channel_id,
            _ => &self.id,
        }
    }

    /// Strip the id, e.g. to compare a stored record with the candidate it came from
    pub fn to_new(&self) -> NewAccount {
        NewAccount {
            name: self.name.clone(),
            email: self.email.clone(),
            profile_image: self.profile_image.clone(),
            created_at: self.created_at.clone(),
            subscribers: self.subscribers,
            total_views: self.total_views,
            total_videos: self.total_videos,
            estimated_revenue: self.estimated_revenue,
            is_active: self.is_active,
            channel_id: self.channel_id.clone(),
            description: self.description.clone(),
            content_niche: self.content_niche.clone(),
            upload_frequency: self.upload_frequency.clone(),
        }
    }
}

/// An account record before the store allocates its id

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub name: String,

    pub email: String,

    pub profile_image: String,

    pub created_at: String,

    #[serde(default)]
    pub subscribers: u64,

    #[serde(default)]
    pub total_views: u64,

    #[serde(default)]
    pub total_videos: u64,

    #[serde(default)]
    pub estimated_revenue: f64,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(
        rename = "content_niche",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub content_niche: Option<String>,

    #[serde(
        rename = "upload_frequency",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub upload_frequency: Option<String>,
}

fn default_true() -> bool {
    true
}

impl NewAccount {
    /// Blank active account created today with zeroed counters
    pub fn with_defaults(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            profile_image: DEFAULT_PROFILE_IMAGE.to_string(),
            created_at: today_iso_date(),
            subscribers: 0,
            total_views: 0,
            total_videos: 0,
            estimated_revenue: 0.0,
            is_active: true,
            channel_id: None,
            description: None,
            content_niche: None,
            upload_frequency: None,
        }
    }
}

/// Aggregate totals over a collection snapshot

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub total_accounts: usize,

    pub total_subscribers: u64,

    pub total_views: u64,

    pub total_videos: u64,

    pub total_revenue: f64,
}

/// One row of a weekly statistics table

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelStats {
    pub day: String,

    pub subscribers: u64,

    pub views: u64,

    pub revenue: f64,
}

/// Counter reported by the YouTube API: a numeric string, occasionally a bare number
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CountValue {
    Text(String),
    Number(f64),
}

impl CountValue {
    /// Parse into a non-negative integer, 0 when unparseable
    pub fn as_count(&self) -> u64 {
        match self {
            Self::Text(text) => parse_count(text),
            Self::Number(value) if value.is_finite() && *value > 0.0 => value.trunc() as u64,
            Self::Number(_) => 0,
        }
    }
}

/// Leading-digit integer parse: `"123abc"` is 123, `"-5"` and `"abc"` are 0.
/// Counts too large for `u64` saturate.
pub fn parse_count(text: &str) -> u64 {
    text.trim()
        .trim_start_matches('+')
        .chars()
        .map_while(|c| c.to_digit(10))
        .fold(0u64, |count, digit| {
            count.saturating_mul(10).saturating_add(u64::from(digit))
        })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatistics {
    #[serde(default)]
    pub subscriber_count: Option<CountValue>,

    #[serde(default)]
    pub view_count: Option<CountValue>,

    #[serde(default)]
    pub video_count: Option<CountValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSnippet {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub published_at: Option<String>,
}

/// Channel object as returned by `channels?mine=true`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub id: String,

    /// Flattened title used by the import boundary; the raw API carries it in the snippet
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub statistics: ChannelStatistics,

    #[serde(default)]
    pub snippet: ChannelSnippet,

    #[serde(default)]
    pub content_details: Option<serde_json::Value>,
}

impl ChannelInfo {
    pub fn display_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .or(self.snippet.title.as_deref())
            .filter(|title| !title.trim().is_empty())
    }

    /// Id of the uploads playlist, if the API reported one
    pub fn uploads_playlist_id(&self) -> Option<&str> {
        self.content_details
            .as_ref()?
            .get("relatedPlaylists")?
            .get("uploads")?
            .as_str()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
}

/// Recent upload shown alongside the channel list during OAuth import
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub published_at: String,
    pub thumbnail: String,
    pub statistics: VideoStatistics,
}

/// Payload of a successful channel fetch
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelData {
    #[serde(default)]
    pub channels: Vec<ChannelInfo>,

    #[serde(default)]
    pub recent_videos: Vec<VideoInfo>,
}

/// `{ success, data }` / `{ success: false, message }` envelope of the account source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiEnvelope {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ChannelData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Today's date in UTC as `YYYY-MM-DD`
pub fn today_iso_date() -> String {
    chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("YouTube error: {0}")]
    Youtube(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Import error: {0}")]
    Import(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_json_field_names() {
        let record = AccountRecord::from_new("7".to_string(), NewAccount::with_defaults("A", "a@x.io"));
        let json = serde_json::to_value(&record).unwrap();

        assert!(json.get("profileImage").is_some());
        assert!(json.get("estimatedRevenue").is_some());
        assert!(json.get("isActive").is_some());
        assert!(json.get("channelId").is_none());
        assert!(json.get("content_niche").is_none());
    }

    #[test]
    fn test_missing_counters_default_to_zero() {
        let json = r#"{"id":"1","name":"n","email":"e","profileImage":"p","createdAt":"2022-01-01","content_niche":"tech"}"#;
        let record: AccountRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.subscribers, 0);
        assert_eq!(record.estimated_revenue, 0.0);
        assert_eq!(record.content_niche.as_deref(), Some("tech"));
    }

    #[test]
    fn test_external_channel_id_fallback() {
        let mut record = AccountRecord::from_new("4".to_string(), NewAccount::with_defaults("A", "a"));
        assert_eq!(record.external_channel_id(), "4");

        record.channel_id = Some(String::new());
        assert_eq!(record.external_channel_id(), "4");

        record.channel_id = Some("UC42".to_string());
        assert_eq!(record.external_channel_id(), "UC42");
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("12500"), 12500);
        assert_eq!(parse_count("  99 "), 99);
        assert_eq!(parse_count("123abc"), 123);
        assert_eq!(parse_count("-5"), 0);
        assert_eq!(parse_count("n/a"), 0);
        assert_eq!(parse_count("99999999999999999999"), u64::MAX);
        assert_eq!(parse_count("18446744073709551615"), u64::MAX);
        assert_eq!(CountValue::Text("99999999999999999999".into()).as_count(), u64::MAX);
        assert_eq!(CountValue::Number(1000.0).as_count(), 1000);
        assert_eq!(CountValue::Number(-3.0).as_count(), 0);
    }

    #[test]
    fn test_uploads_playlist_id() {
        let channel: ChannelInfo = serde_json::from_value(serde_json::json!({
            "id": "UC1",
            "contentDetails": { "relatedPlaylists": { "uploads": "UU1" } }
        }))
        .unwrap();

        assert_eq!(channel.uploads_playlist_id(), Some("UU1"));
    }
}
