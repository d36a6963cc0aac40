//! OAuth authorization request and callback handling
//!
//! Builds the consent URL with a random CSRF `state` and classifies the
//! redirect that comes back: either `code` + `state` (exchange it for a token)
//! or `error` (one of a fixed set of reasons, each rendered differently).

use rand::distributions::Alphanumeric;
use rand::Rng;
use url::Url;

use crate::core::config::YoutubeConfig;
use crate::core::error_handling::ImportFailure;
use crate::core::models::{AppError, AppResult};

const STATE_LENGTH: usize = 32;

/// Consent request sent to the authorization endpoint
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: Url,
    pub state: String,
}

impl AuthorizationRequest {
    pub fn new(config: &YoutubeConfig) -> AppResult<Self> {
        let state: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(STATE_LENGTH)
            .map(char::from)
            .collect();
        Self::with_state(config, state)
    }

    pub fn with_state(config: &YoutubeConfig, state: String) -> AppResult<Self> {
        if config.client_id.is_empty() {
            return Err(AppError::Config(
                "YouTube client id is not configured".to_string(),
            ));
        }

        let mut url = Url::parse(&config.auth_endpoint)
            .map_err(|e| AppError::Config(format!("Invalid authorization endpoint: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("client_id", &config.client_id)
            .append_pair("redirect_uri", &config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("access_type", "offline")
            .append_pair("scope", &config.scopes.join(" "))
            .append_pair("state", &state);

        Ok(Self { url, state })
    }
}

/// Classified authorization redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Authorized { code: String, state: Option<String> },
    Failed(ImportFailure),
}

impl CallbackOutcome {
    /// Parse a callback query string (with or without the leading `?`) or full URL
    pub fn parse(input: &str) -> Self {
        let query = match Url::parse(input) {
            Ok(url) => url.query().unwrap_or_default().to_string(),
            Err(_) => input.trim_start_matches('?').to_string(),
        };

        let mut code = None;
        let mut state = None;
        let mut error = None;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                "error" => error = Some(value.into_owned()),
                _ => {}
            }
        }

        if let Some(error) = error {
            return Self::Failed(ImportFailure::from_code(&error));
        }

        match code {
            Some(code) if !code.is_empty() => Self::Authorized { code, state },
            _ => Self::Failed(ImportFailure::from_code("no_code")),
        }
    }

    /// Check the returned state against the one issued with the request
    pub fn verify_state(self, expected: &str) -> Self {
        match self {
            Self::Authorized { state, .. } if state.as_deref() != Some(expected) => {
                Self::Failed(ImportFailure::InvalidState)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> YoutubeConfig {
        YoutubeConfig {
            client_id: "client-1".to_string(),
            ..YoutubeConfig::default()
        }
    }

    #[test]
    fn test_authorization_url_carries_state() {
        let request = AuthorizationRequest::new(&configured()).unwrap();
        let pairs: std::collections::HashMap<String, String> =
            request.url.query_pairs().into_owned().collect();

        assert_eq!(request.state.len(), STATE_LENGTH);
        assert_eq!(pairs.get("state"), Some(&request.state));
        assert_eq!(pairs.get("response_type").map(String::as_str), Some("code"));
        assert_eq!(pairs.get("client_id").map(String::as_str), Some("client-1"));
    }

    #[test]
    fn test_missing_client_id_is_config_error() {
        let result = AuthorizationRequest::new(&YoutubeConfig::default());
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_callback_with_code() {
        let outcome = CallbackOutcome::parse("?code=abc&state=xyz");
        assert_eq!(
            outcome,
            CallbackOutcome::Authorized {
                code: "abc".to_string(),
                state: Some("xyz".to_string())
            }
        );
    }

    #[test]
    fn test_callback_with_error_from_full_url() {
        let outcome =
            CallbackOutcome::parse("http://localhost:3000/accounts/import?error=access_denied");
        assert_eq!(outcome, CallbackOutcome::Failed(ImportFailure::AccessDenied));
    }

    #[test]
    fn test_callback_without_code() {
        let outcome = CallbackOutcome::parse("state=xyz");
        assert_eq!(
            outcome,
            CallbackOutcome::Failed(ImportFailure::Unknown("no_code".to_string()))
        );
    }

    #[test]
    fn test_state_mismatch_is_invalid_state() {
        let outcome = CallbackOutcome::parse("code=abc&state=other").verify_state("expected");
        assert_eq!(outcome, CallbackOutcome::Failed(ImportFailure::InvalidState));

        let outcome = CallbackOutcome::parse("code=abc&state=expected").verify_state("expected");
        assert!(matches!(outcome, CallbackOutcome::Authorized { .. }));
    }
}
