//! YouTube Data API and OAuth token client
//!
//! Thin `reqwest` wrapper used as the external account source during OAuth
//! import. The import flow only sees the [`ChannelSource`] trait so it can run
//! against a fake source.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::config::YoutubeConfig;
use crate::core::error_handling::{ImportFailure, ImportStep};
use crate::core::models::{
    AppError, AppResult, ChannelData, ChannelInfo, CountValue, VideoInfo, VideoStatistics,
};
use crate::core::oauth::CallbackOutcome;

/// Source of the authenticated user's channels
#[async_trait]
pub trait ChannelSource: Send + Sync {
    async fn fetch_channels(&self, access_token: &str) -> Result<ChannelData, ImportFailure>;
}

/// Tokens returned by the authorization-code exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    #[serde(default)]
    snippet: PlaylistSnippet,
    content_details: PlaylistContentDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    published_at: String,
    #[serde(default)]
    thumbnails: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistContentDetails {
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct VideoStatsItem {
    id: String,
    #[serde(default)]
    statistics: RawVideoStatistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVideoStatistics {
    view_count: Option<CountValue>,
    like_count: Option<CountValue>,
    comment_count: Option<CountValue>,
}

impl RawVideoStatistics {
    fn to_statistics(&self) -> VideoStatistics {
        let count = |value: &Option<CountValue>| value.as_ref().map_or(0, CountValue::as_count);
        VideoStatistics {
            view_count: count(&self.view_count),
            like_count: count(&self.like_count),
            comment_count: count(&self.comment_count),
        }
    }
}

pub struct YoutubeApiClient {
    client: Client,
    config: YoutubeConfig,
}

impl YoutubeApiClient {
    pub fn new(config: YoutubeConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(crate::utils::network::get_user_agent())
            .build()?;

        Ok(Self { client, config })
    }

    /// Exchange an authorization code for tokens
    pub async fn exchange_code(&self, code: &str) -> AppResult<TokenSet> {
        let response = self
            .client
            .post(&self.config.token_endpoint)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Youtube(format!(
                "Token exchange rejected ({}): {}",
                status, body
            )));
        }

        let tokens = response.json::<TokenSet>().await?;
        info!("🔑 Exchanged authorization code for an access token");
        Ok(tokens)
    }

    /// Turn a classified callback into an access token
    pub async fn complete_authorization(
        &self,
        callback: CallbackOutcome,
    ) -> Result<TokenSet, ImportFailure> {
        match callback {
            CallbackOutcome::Failed(failure) => Err(failure),
            CallbackOutcome::Authorized { code, .. } => self
                .exchange_code(&code)
                .await
                .map_err(|e| ImportFailure::classify(ImportStep::TokenExchange, &e)),
        }
    }

    /// Channels owned by the token's user
    pub async fn channels(&self, access_token: &str) -> AppResult<Vec<ChannelInfo>> {
        let response = self
            .client
            .get(format!("{}/channels", self.config.api_base))
            .query(&[("part", "snippet,statistics,contentDetails"), ("mine", "true")])
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Youtube(format!(
                "Channel request failed ({}): {}",
                status, body
            )));
        }

        let list = response.json::<ListResponse<ChannelInfo>>().await?;
        debug!("Fetched {} channel(s)", list.items.len());
        Ok(list.items)
    }

    /// Latest uploads of a playlist with their statistics
    pub async fn recent_videos(
        &self,
        access_token: &str,
        uploads_playlist_id: &str,
    ) -> AppResult<Vec<VideoInfo>> {
        let max_results = self.config.max_recent_videos.to_string();
        let response = self
            .client
            .get(format!("{}/playlistItems", self.config.api_base))
            .query(&[
                ("part", "snippet,contentDetails"),
                ("playlistId", uploads_playlist_id),
                ("maxResults", max_results.as_str()),
            ])
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?;
        let playlist = response.json::<ListResponse<PlaylistItem>>().await?;

        if playlist.items.is_empty() {
            return Ok(Vec::new());
        }

        let video_ids = playlist
            .items
            .iter()
            .map(|item| item.content_details.video_id.as_str())
            .collect::<Vec<_>>()
            .join(",");

        let response = self
            .client
            .get(format!("{}/videos", self.config.api_base))
            .query(&[("part", "statistics"), ("id", video_ids.as_str())])
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?;
        let stats = response.json::<ListResponse<VideoStatsItem>>().await?;

        Ok(playlist
            .items
            .into_iter()
            .map(|item| {
                let video_id = item.content_details.video_id;
                let statistics = stats
                    .items
                    .iter()
                    .find(|entry| entry.id == video_id)
                    .map(|entry| entry.statistics.to_statistics())
                    .unwrap_or_default();
                let thumbnail = item
                    .snippet
                    .thumbnails
                    .as_ref()
                    .and_then(|thumbs| thumbs.get("medium")?.get("url")?.as_str())
                    .unwrap_or_default()
                    .to_string();

                VideoInfo {
                    id: video_id,
                    title: item.snippet.title,
                    published_at: item.snippet.published_at,
                    thumbnail,
                    statistics,
                }
            })
            .collect())
    }

    /// Channels plus recent uploads of the first channel.
    ///
    /// Video lookups are best effort: their failure leaves `recent_videos` empty.
    pub async fn fetch_channel_data(&self, access_token: &str) -> AppResult<ChannelData> {
        let channels = self.channels(access_token).await?;

        let mut recent_videos = Vec::new();
        if let Some(uploads) = channels.first().and_then(ChannelInfo::uploads_playlist_id) {
            match self.recent_videos(access_token, uploads).await {
                Ok(videos) => recent_videos = videos,
                Err(e) => warn!("Failed to load recent videos for {}: {}", uploads, e),
            }
        }

        Ok(ChannelData {
            channels,
            recent_videos,
        })
    }
}

#[async_trait]
impl ChannelSource for YoutubeApiClient {
    async fn fetch_channels(&self, access_token: &str) -> Result<ChannelData, ImportFailure> {
        if access_token.trim().is_empty() {
            return Err(ImportFailure::MissingToken);
        }

        self.fetch_channel_data(access_token)
            .await
            .map_err(|e| ImportFailure::classify(ImportStep::ChannelFetch, &e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_token_is_missing_token() {
        let client = YoutubeApiClient::new(YoutubeConfig::default()).unwrap();
        let result = client.fetch_channels("  ").await;

        assert_eq!(result, Err(ImportFailure::MissingToken));
    }

    #[tokio::test]
    async fn test_failed_callback_short_circuits() {
        let client = YoutubeApiClient::new(YoutubeConfig::default()).unwrap();
        let result = client
            .complete_authorization(CallbackOutcome::Failed(ImportFailure::AccessDenied))
            .await;

        assert!(matches!(result, Err(ImportFailure::AccessDenied)));
    }

    #[test]
    fn test_raw_channel_list_parses() {
        let json = serde_json::json!({
            "items": [{
                "id": "UC1",
                "snippet": { "title": "Main", "publishedAt": "2020-01-02T03:04:05Z" },
                "statistics": { "subscriberCount": "100", "viewCount": "2000", "videoCount": "3" },
                "contentDetails": { "relatedPlaylists": { "uploads": "UU1" } }
            }]
        });
        let list: ListResponse<ChannelInfo> = serde_json::from_value(json).unwrap();

        assert_eq!(list.items[0].display_title(), Some("Main"));
        assert_eq!(list.items[0].uploads_playlist_id(), Some("UU1"));
    }
}
