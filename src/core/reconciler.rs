//! Import reconciler
//!
//! Turns candidates from the manual form, the OAuth channel list and CSV rows
//! into [`NewAccount`] values and commits them through the store's id
//! allocation path.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::config::ImportConfig;
use crate::core::models::{
    today_iso_date, AccountRecord, AppError, AppResult, ChannelInfo, CountValue, NewAccount,
};
use crate::core::selection::ChannelSelection;
use crate::core::store::AccountStore;
use crate::parsers::csv_parser::{AccountCsv, AccountCsvParser, CsvAccountRow, SkippedRow};
use crate::utils::validation::{is_valid_email, non_empty, require_field, to_iso_date};

/// Upload frequency given to manually added accounts
pub const DEFAULT_UPLOAD_FREQUENCY: &str = "weekly";

/// Fields of the manual add form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualAccountForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "content_niche", default)]
    pub content_niche: String,
    #[serde(rename = "upload_frequency", default)]
    pub upload_frequency: String,
}

impl ManualAccountForm {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            upload_frequency: DEFAULT_UPLOAD_FREQUENCY.to_string(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        require_field("Name", &self.name).map_err(AppError::Validation)?;
        let email = require_field("Email", &self.email).map_err(AppError::Validation)?;
        if !is_valid_email(email) {
            return Err(AppError::Validation(format!(
                "Invalid email address: {}",
                email
            )));
        }
        Ok(())
    }

    fn to_new_account(&self, avatar: &str) -> NewAccount {
        let mut account = NewAccount::with_defaults(self.name.trim(), self.email.trim());
        account.profile_image = avatar.to_string();
        account.channel_id = non_empty(Some(self.channel_id.as_str()));
        account.description = non_empty(Some(self.description.as_str()));
        account.content_niche = non_empty(Some(self.content_niche.as_str()));
        account.upload_frequency = non_empty(Some(self.upload_frequency.as_str()))
            .or_else(|| Some(DEFAULT_UPLOAD_FREQUENCY.to_string()));
        account
    }
}

/// Outcome of a CSV import
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CsvImportReport {
    pub imported: Vec<AccountRecord>,
    pub skipped: Vec<SkippedRow>,
    pub detected_encoding: String,
}

pub struct ImportReconciler {
    store: Arc<AccountStore>,
    config: ImportConfig,
}

impl ImportReconciler {
    pub fn new(store: Arc<AccountStore>, config: ImportConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<AccountStore> {
        &self.store
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Validate the form and add one account
    pub fn import_manual(&self, form: &ManualAccountForm) -> AppResult<AccountRecord> {
        form.validate()?;
        let record = self
            .store
            .add(form.to_new_account(&self.config.default_avatar))?;
        info!("Manually added account {} ({})", record.id, record.name);
        Ok(record)
    }

    /// Commit the selected channels, in fetched order, as one batch
    pub fn import_channels(
        &self,
        channels: &[ChannelInfo],
        selection: &ChannelSelection,
    ) -> AppResult<Vec<AccountRecord>> {
        let candidates: Vec<NewAccount> = selection
            .pick(channels)
            .into_iter()
            .map(|channel| map_channel(channel, &self.config.default_avatar))
            .collect();

        if candidates.is_empty() {
            warn!("No channels selected, nothing imported");
            return Ok(Vec::new());
        }

        let imported = self.store.add_many(candidates)?;
        info!("Imported {} channel(s) from YouTube", imported.len());
        Ok(imported)
    }

    pub fn import_csv_file(&self, path: &Path) -> AppResult<CsvImportReport> {
        let parsed = self.csv_parser().parse_file(path)?;
        self.commit_csv(parsed)
    }

    pub fn import_csv_bytes(&self, data: &[u8]) -> AppResult<CsvImportReport> {
        let parsed = self.csv_parser().parse_bytes(data)?;
        self.commit_csv(parsed)
    }

    fn csv_parser(&self) -> AccountCsvParser {
        AccountCsvParser::new(self.config.max_csv_bytes)
    }

    fn commit_csv(&self, parsed: AccountCsv) -> AppResult<CsvImportReport> {
        let candidates: Vec<NewAccount> = parsed
            .rows
            .iter()
            .map(|row| map_csv_row(row, &self.config.default_avatar))
            .collect();

        // add_many writes nothing for an empty batch
        let imported = self.store.add_many(candidates)?;
        info!(
            "Imported {} account(s) from CSV, {} row(s) skipped",
            imported.len(),
            parsed.skipped.len()
        );

        Ok(CsvImportReport {
            imported,
            skipped: parsed.skipped,
            detected_encoding: parsed.detected_encoding,
        })
    }
}

/// Map a fetched channel onto a candidate account
pub fn map_channel(channel: &ChannelInfo, avatar: &str) -> NewAccount {
    let count = |value: &Option<CountValue>| value.as_ref().map_or(0, CountValue::as_count);
    let name = channel
        .display_title()
        .map(str::to_string)
        .unwrap_or_else(|| channel.id.clone());
    let created_at = channel
        .snippet
        .published_at
        .as_deref()
        .and_then(to_iso_date)
        .unwrap_or_else(today_iso_date);

    let mut account = NewAccount::with_defaults(name, format!("email-{}@example.com", channel.id));
    account.profile_image = avatar.to_string();
    account.created_at = created_at;
    account.subscribers = count(&channel.statistics.subscriber_count);
    account.total_views = count(&channel.statistics.view_count);
    account.total_videos = count(&channel.statistics.video_count);
    account.channel_id = Some(channel.id.clone());
    account.description = non_empty(channel.snippet.description.as_deref());
    account
}

fn map_csv_row(row: &CsvAccountRow, avatar: &str) -> NewAccount {
    let mut account = NewAccount::with_defaults(row.name.clone(), row.email.clone());
    account.profile_image = avatar.to_string();
    account.channel_id = row.channel_id.clone();
    if let Some(created_at) = &row.created_at {
        account.created_at = created_at.clone();
    }
    account
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_manual_form_validation() {
        assert!(ManualAccountForm::new("Chan", "chan@mail.com").validate().is_ok());
        assert!(matches!(
            ManualAccountForm::new("  ", "chan@mail.com").validate(),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            ManualAccountForm::new("Chan", "not-an-email").validate(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_manual_form_defaults() {
        let form = ManualAccountForm {
            upload_frequency: String::new(),
            ..ManualAccountForm::new("Chan", "chan@mail.com")
        };
        let account = form.to_new_account("/a.png");

        assert_eq!(account.channel_id, None);
        assert_eq!(account.upload_frequency.as_deref(), Some("weekly"));
        assert_eq!(account.subscribers, 0);
        assert!(account.is_active);
        assert_eq!(account.profile_image, "/a.png");
        assert_eq!(account.created_at, today_iso_date());
    }

    #[test]
    fn test_map_channel() {
        let channel: ChannelInfo = serde_json::from_value(json!({
            "id": "UCabc",
            "snippet": {
                "title": "My Channel",
                "description": "About",
                "publishedAt": "2020-01-02T03:04:05Z"
            },
            "statistics": { "subscriberCount": "1200", "viewCount": 3400, "videoCount": "x" }
        }))
        .unwrap();
        let account = map_channel(&channel, "/a.png");

        assert_eq!(account.name, "My Channel");
        assert_eq!(account.email, "email-UCabc@example.com");
        assert_eq!(account.created_at, "2020-01-02");
        assert_eq!(account.subscribers, 1200);
        assert_eq!(account.total_views, 3400);
        assert_eq!(account.total_videos, 0);
        assert_eq!(account.estimated_revenue, 0.0);
        assert_eq!(account.channel_id.as_deref(), Some("UCabc"));
        assert_eq!(account.description.as_deref(), Some("About"));
    }

    #[test]
    fn test_map_channel_fallbacks() {
        let channel: ChannelInfo = serde_json::from_value(json!({
            "id": "UCxyz",
            "title": "",
            "snippet": { "publishedAt": "yesterday" }
        }))
        .unwrap();
        let account = map_channel(&channel, "/a.png");

        assert_eq!(account.name, "UCxyz");
        assert_eq!(account.created_at, today_iso_date());
        assert_eq!(account.subscribers, 0);
        assert_eq!(account.description, None);
    }
}
