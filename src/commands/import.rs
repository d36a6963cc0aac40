//! Import command handlers
//!
//! Manual entry, OAuth channel import and CSV upload, plus the CSV template.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::core::models::{AccountRecord, ApiEnvelope, ChannelInfo};
use crate::core::oauth::{AuthorizationRequest, CallbackOutcome};
use crate::core::reconciler::{CsvImportReport, ManualAccountForm};
use crate::core::selection::ChannelSelection;
use crate::core::youtube_client::ChannelSource;
use crate::parsers::csv_parser::{write_template, TEMPLATE_FILE_NAME};
use crate::utils::file_utils::get_file_extension;
use crate::AppState;

/// Consent URL and the state value the callback must echo back
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationInfo {
    pub url: String,
    pub state: String,
}

pub async fn import_manual_account(
    state: &AppState,
    form: ManualAccountForm,
) -> Result<AccountRecord, String> {
    info!("📝 Manual import: {}", form.name);

    state.reconciler.import_manual(&form).map_err(|e| {
        error!("❌ Manual import failed: {}", e);
        e.to_string()
    })
}

pub async fn get_authorization_url(state: &AppState) -> Result<AuthorizationInfo, String> {
    let config = state.config.read().await;
    let request = AuthorizationRequest::new(&config.youtube).map_err(|e| {
        error!("❌ Cannot start YouTube authorization: {}", e);
        e.to_string()
    })?;

    info!("🔐 Authorization URL issued");
    Ok(AuthorizationInfo {
        url: request.url.to_string(),
        state: request.state,
    })
}

/// Finish the OAuth redirect: verify state, exchange the code and fetch channels.
///
/// Failures are reported in the envelope, never as `Err`.
pub async fn complete_youtube_authorization(
    state: &AppState,
    callback_query: String,
    expected_state: String,
) -> Result<ApiEnvelope, String> {
    let outcome = CallbackOutcome::parse(&callback_query).verify_state(&expected_state);

    let tokens = match state.youtube.complete_authorization(outcome).await {
        Ok(tokens) => tokens,
        Err(failure) => {
            warn!("⚠️ YouTube authorization failed: {}", failure.code());
            return Ok(failure_envelope(failure.message()));
        }
    };

    fetch_youtube_channels(state, tokens.access_token).await
}

pub async fn fetch_youtube_channels(
    state: &AppState,
    access_token: String,
) -> Result<ApiEnvelope, String> {
    match state.youtube.fetch_channels(&access_token).await {
        Ok(data) => {
            info!("📺 Fetched {} channel(s)", data.channels.len());
            Ok(ApiEnvelope {
                success: true,
                data: Some(data),
                message: None,
            })
        }
        Err(failure) => {
            error!("❌ Channel fetch failed: {}", failure);
            Ok(failure_envelope(failure.message()))
        }
    }
}

/// Import the channels whose ids are listed, in the order they were fetched
pub async fn import_youtube_channels(
    state: &AppState,
    channels: Vec<ChannelInfo>,
    selected_ids: Vec<String>,
) -> Result<Vec<AccountRecord>, String> {
    let mut selection = ChannelSelection::new();
    for id in &selected_ids {
        if !selection.contains(id) {
            selection.toggle(id);
        }
    }

    state
        .reconciler
        .import_channels(&channels, &selection)
        .map_err(|e| {
            error!("❌ Channel import failed: {}", e);
            e.to_string()
        })
}

pub async fn import_csv_accounts(
    state: &AppState,
    file_path: String,
) -> Result<CsvImportReport, String> {
    info!("📂 Importing accounts from CSV: {}", file_path);

    match get_file_extension(&file_path) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") || ext.eq_ignore_ascii_case("txt") => {}
        other => warn!("⚠️ Unexpected extension {:?}, parsing as CSV anyway", other),
    }

    match state.reconciler.import_csv_file(Path::new(&file_path)) {
        Ok(report) => {
            info!(
                "✅ {} account(s) imported, {} row(s) skipped ({})",
                report.imported.len(),
                report.skipped.len(),
                report.detected_encoding
            );
            Ok(report)
        }
        Err(e) => {
            error!("❌ CSV import failed: {}", e);
            Err(e.to_string())
        }
    }
}

/// Write the CSV template; a directory target gets the default file name
pub async fn save_csv_template(target: String) -> Result<String, String> {
    let mut path = PathBuf::from(&target);
    if path.is_dir() {
        path.push(TEMPLATE_FILE_NAME);
    }

    write_template(&path).map_err(|e| {
        error!("❌ Failed to write CSV template: {}", e);
        e.to_string()
    })?;
    Ok(path.display().to_string())
}

fn failure_envelope(message: String) -> ApiEnvelope {
    ApiEnvelope {
        success: false,
        data: None,
        message: Some(message),
    }
}
