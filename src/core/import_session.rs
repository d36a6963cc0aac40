//! Import page state
//!
//! Tracks the chosen import method, the manual form, the fetched channel list
//! and its selection, the chosen CSV file and the last error message. Async
//! completions that land after the page was left are dropped.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::core::error_handling::ImportFailure;
use crate::core::models::{AppError, AppResult, ChannelData};
use crate::core::oauth::CallbackOutcome;
use crate::core::reconciler::{ImportReconciler, ManualAccountForm};
use crate::core::selection::ChannelSelection;
use crate::core::youtube_client::ChannelSource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMethod {
    #[default]
    Manual,
    Oauth,
    Csv,
}

impl std::str::FromStr for ImportMethod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "oauth" | "youtube" => Ok(Self::Oauth),
            "csv" => Ok(Self::Csv),
            other => Err(format!("Unknown import method: {}", other)),
        }
    }
}

/// Lets the owner of the page mark it as left while async work is pending
#[derive(Debug, Clone)]
pub struct MountHandle {
    mounted: Arc<AtomicBool>,
}

impl MountHandle {
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }
}

pub struct ImportSession {
    reconciler: Arc<ImportReconciler>,
    method: ImportMethod,
    pub form: ManualAccountForm,
    channel_data: Option<ChannelData>,
    selection: ChannelSelection,
    csv_file: Option<PathBuf>,
    error: Option<String>,
    loading: bool,
    mounted: Arc<AtomicBool>,
}

impl ImportSession {
    pub fn new(reconciler: Arc<ImportReconciler>) -> Self {
        Self {
            reconciler,
            method: ImportMethod::default(),
            form: ManualAccountForm::new("", ""),
            channel_data: None,
            selection: ChannelSelection::new(),
            csv_file: None,
            error: None,
            loading: false,
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn mount_handle(&self) -> MountHandle {
        MountHandle {
            mounted: Arc::clone(&self.mounted),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    pub fn method(&self) -> ImportMethod {
        self.method
    }

    pub fn set_method(&mut self, method: ImportMethod) {
        self.method = method;
        self.error = None;
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn channel_data(&self) -> Option<&ChannelData> {
        self.channel_data.as_ref()
    }

    pub fn selection(&self) -> &ChannelSelection {
        &self.selection
    }

    pub fn toggle_channel(&mut self, channel_id: &str) -> bool {
        self.selection.toggle(channel_id)
    }

    pub fn select_all(&mut self) {
        match &self.channel_data {
            Some(data) => self.selection.select_all(&data.channels),
            None => self.selection.clear(),
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn set_csv_file(&mut self, path: impl Into<PathBuf>) {
        self.csv_file = Some(path.into());
    }

    /// Classify the OAuth redirect against the state issued with the consent
    /// URL. Returns the authorization code to exchange, or records the failure
    /// message and returns `None`.
    pub fn handle_callback(&mut self, query: &str, expected_state: &str) -> Option<String> {
        self.method = ImportMethod::Oauth;

        match CallbackOutcome::parse(query).verify_state(expected_state) {
            CallbackOutcome::Authorized { code, .. } => {
                self.error = None;
                Some(code)
            }
            CallbackOutcome::Failed(failure) => {
                self.record_failure(&failure);
                None
            }
        }
    }

    /// Fetch the user's channels. On success every channel starts selected;
    /// on failure the channel list is cleared. Nothing is applied if the page
    /// was left while the fetch was running.
    pub async fn load_channels(
        &mut self,
        source: &dyn ChannelSource,
        access_token: &str,
    ) -> Result<(), ImportFailure> {
        self.method = ImportMethod::Oauth;
        self.loading = true;
        self.error = None;

        let result = if access_token.trim().is_empty() {
            Err(ImportFailure::MissingToken)
        } else {
            source.fetch_channels(access_token).await
        };

        if !self.is_mounted() {
            debug!("Import page left during channel fetch, discarding result");
            return result.map(|_| ());
        }
        self.loading = false;

        match result {
            Ok(data) => {
                info!("Loaded {} channel(s) for import", data.channels.len());
                self.selection.select_all(&data.channels);
                self.channel_data = Some(data);
                Ok(())
            }
            Err(failure) => {
                self.channel_data = None;
                self.selection.clear();
                self.record_failure(&failure);
                Err(failure)
            }
        }
    }

    /// Commit according to the current method; returns the confirmation message
    pub async fn submit(&mut self) -> AppResult<String> {
        self.loading = true;
        self.error = None;

        let delay = self.reconciler.config().commit_delay_ms;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let result = self.commit();
        self.loading = false;

        match result {
            Ok(message) => {
                info!("✅ {}", message);
                Ok(message)
            }
            Err(e) => {
                error!("❌ Import failed: {}", e);
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn commit(&mut self) -> AppResult<String> {
        match self.method {
            ImportMethod::Manual => {
                self.reconciler.import_manual(&self.form)?;
                self.form = ManualAccountForm::new("", "");
                Ok("Account added".to_string())
            }
            ImportMethod::Oauth => {
                let data = self
                    .channel_data
                    .as_ref()
                    .ok_or_else(|| AppError::Import("No channel data to import".to_string()))?;
                if self.selection.is_empty() {
                    return Err(AppError::Validation(
                        "Select at least one channel to import".to_string(),
                    ));
                }

                let imported = self
                    .reconciler
                    .import_channels(&data.channels, &self.selection)?;
                Ok(match imported.len() {
                    1 => "1 channel imported".to_string(),
                    n => format!("{} channels imported", n),
                })
            }
            ImportMethod::Csv => {
                let path = self
                    .csv_file
                    .as_ref()
                    .ok_or_else(|| AppError::Validation("Select a CSV file to import".to_string()))?;

                let report = self.reconciler.import_csv_file(path)?;
                if report.imported.is_empty() {
                    return Err(AppError::Import(
                        "The CSV file contains no valid accounts".to_string(),
                    ));
                }
                Ok(format!("{} accounts imported from CSV", report.imported.len()))
            }
        }
    }

    fn record_failure(&mut self, failure: &ImportFailure) {
        error!("❌ OAuth import failed ({}): {}", failure.code(), failure);
        self.error = Some(failure.message());
    }
}
