//! External-source failure taxonomy for account import
//!
//! Network, HTTP status and payload faults from the OAuth flow are collapsed
//! into a small set of reasons, each with a user-facing message naming the
//! step that failed. Local faults (storage, not-found) never come through here.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::core::models::AppError;

/// Step of the OAuth import that was running when a fault occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImportStep {
    TokenExchange,
    ChannelFetch,
}

/// Reason an external import attempt failed; nothing is committed in any case
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ImportFailure {
    #[error("Access was denied by the user")]
    AccessDenied,

    #[error("Failed to exchange the authorization code")]
    TokenExchangeFailed,

    #[error("Failed to fetch channel data")]
    ChannelFetchFailed,

    #[error("Security error: invalid state")]
    InvalidState,

    #[error("No access token was found")]
    MissingToken,

    #[error("Authentication error: {0}")]
    Unknown(String),
}

impl ImportFailure {
    /// Map a callback `error` parameter onto a reason
    pub fn from_code(code: &str) -> Self {
        match code {
            "access_denied" => Self::AccessDenied,
            "token_exchange_failed" => Self::TokenExchangeFailed,
            "channel_fetch_failed" => Self::ChannelFetchFailed,
            "invalid_state" => Self::InvalidState,
            "missing_token" => Self::MissingToken,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Wire code, the inverse of [`ImportFailure::from_code`]
    pub fn code(&self) -> &str {
        match self {
            Self::AccessDenied => "access_denied",
            Self::TokenExchangeFailed => "token_exchange_failed",
            Self::ChannelFetchFailed => "channel_fetch_failed",
            Self::InvalidState => "invalid_state",
            Self::MissingToken => "missing_token",
            Self::Unknown(code) => code,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Classify a crate error raised while running `step`
    pub fn classify(step: ImportStep, err: &AppError) -> Self {
        warn!("Import step {:?} failed: {}", step, err);

        match step {
            ImportStep::TokenExchange => Self::TokenExchangeFailed,
            ImportStep::ChannelFetch => Self::ChannelFetchFailed,
        }
    }
}

impl From<ImportFailure> for AppError {
    fn from(failure: ImportFailure) -> Self {
        AppError::Import(failure.message())
    }
}
