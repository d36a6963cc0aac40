//! Tracing subscriber setup
//!
//! The filter sits behind a reload layer so the level from configuration can
//! be applied after logging is already running.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "youtube_account_manager=info";

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Install the global fmt subscriber with the default filter
pub fn init_tracing() {
    init_tracing_with(None);
}

/// Same as [`init_tracing`], with a level taken from configuration
/// (`"debug"`, `"warn"`, ...) when `RUST_LOG` is unset.
///
/// Once a subscriber is installed, later calls only swap the filter.
pub fn init_tracing_with(level: Option<&str>) {
    let filter = build_filter(level);

    if let Some(handle) = FILTER_HANDLE.get() {
        if let Err(e) = handle.reload(filter) {
            tracing::warn!("Failed to apply log level: {}", e);
        }
        return;
    }

    let (filter_layer, handle) = reload::Layer::new(filter);
    let installed = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer())
        .try_init()
        .is_ok();

    if installed {
        let _ = FILTER_HANDLE.set(handle);
    }
}

fn build_filter(level: Option<&str>) -> EnvFilter {
    let fallback = match level {
        Some(level) => format!("youtube_account_manager={}", level),
        None => DEFAULT_LOG_FILTER.to_string(),
    };

    EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into())
}
