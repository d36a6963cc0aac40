//! Configuration command handlers
//!
//! This module provides commands for managing application configuration,
//! including getting, updating, resetting, and importing/exporting settings.

use tracing::{error, info, warn};

use crate::core::{
    models::{AppError, AppResult},
    AppConfig,
};
use crate::AppState;

/// Get current application configuration
pub async fn get_config(state: &AppState) -> Result<AppConfig, String> {
    info!("⚙️ Getting application configuration");

    let config = state.config.read().await;
    Ok(config.clone())
}

/// Update application configuration.
///
/// Storage and client settings take effect on the next start.
pub async fn update_config(state: &AppState, new_config: AppConfig) -> Result<(), String> {
    info!("🔧 Updating application configuration");

    match update_config_impl(state, new_config).await {
        Ok(()) => {
            info!("✅ Configuration updated successfully");
            Ok(())
        }
        Err(e) => {
            error!("❌ Failed to update configuration: {}", e);
            Err(e.to_string())
        }
    }
}

/// Reset configuration to default values
pub async fn reset_config(state: &AppState) -> Result<AppConfig, String> {
    info!("🔄 Resetting configuration to defaults");

    match AppConfig::reset() {
        Ok(config) => {
            *state.config.write().await = config.clone();
            info!("✅ Configuration reset successfully");
            Ok(config)
        }
        Err(e) => {
            error!("❌ Failed to reset configuration: {}", e);
            Err(e.to_string())
        }
    }
}

/// Export configuration to file
pub async fn export_config(state: &AppState, file_path: String) -> Result<(), String> {
    info!("💾 Exporting configuration to: {}", file_path);

    match export_config_impl(state, &file_path).await {
        Ok(()) => {
            info!("✅ Configuration exported successfully");
            Ok(())
        }
        Err(e) => {
            error!("❌ Failed to export configuration: {}", e);
            Err(e.to_string())
        }
    }
}

/// Import configuration from file
pub async fn import_config(state: &AppState, file_path: String) -> Result<AppConfig, String> {
    info!("📂 Importing configuration from: {}", file_path);

    match import_config_impl(state, &file_path).await {
        Ok(config) => {
            info!("✅ Configuration imported successfully");
            Ok(config)
        }
        Err(e) => {
            error!("❌ Failed to import configuration: {}", e);
            Err(e.to_string())
        }
    }
}

// Implementation functions

async fn update_config_impl(state: &AppState, new_config: AppConfig) -> AppResult<()> {
    new_config
        .validate()
        .map_err(|e| AppError::Config(e.to_string()))?;
    warn_on_unusual_values(&new_config);

    new_config
        .save()
        .map_err(|e| AppError::Config(format!("Failed to save configuration: {}", e)))?;

    *state.config.write().await = new_config;
    Ok(())
}

async fn export_config_impl(state: &AppState, file_path: &str) -> AppResult<()> {
    let json_data = state
        .config
        .read()
        .await
        .export()
        .map_err(|e| AppError::Config(format!("Failed to serialize configuration: {}", e)))?;

    tokio::fs::write(file_path, json_data).await?;
    Ok(())
}

async fn import_config_impl(state: &AppState, file_path: &str) -> AppResult<AppConfig> {
    if !tokio::fs::try_exists(file_path).await? {
        return Err(AppError::Config(format!(
            "Configuration file not found: {}",
            file_path
        )));
    }

    let content = tokio::fs::read_to_string(file_path).await?;
    let imported_config =
        AppConfig::import(&content).map_err(|e| AppError::Config(format!("{:#}", e)))?;
    warn_on_unusual_values(&imported_config);

    imported_config
        .save()
        .map_err(|e| AppError::Config(format!("Failed to save imported configuration: {}", e)))?;

    *state.config.write().await = imported_config.clone();
    Ok(imported_config)
}

fn warn_on_unusual_values(config: &AppConfig) {
    if config.import.commit_delay_ms > 5_000 {
        warn!(
            "⚠️ Import commit delay set to {}ms (recommended: 0-2000ms)",
            config.import.commit_delay_ms
        );
    }

    if config.youtube.client_id.is_empty() {
        warn!("⚠️ YouTube client id is empty, OAuth import is unavailable");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::StorageConfig;
    use crate::core::storage::MemoryStorage;
    use std::sync::Arc;

    fn state() -> AppState {
        let config = AppConfig {
            storage: StorageConfig {
                watch_enabled: false,
                ..StorageConfig::default()
            },
            ..AppConfig::default()
        };
        AppState::with_storage(config, Arc::new(MemoryStorage::new())).unwrap()
    }

    #[test]
    fn test_get_config() {
        let config = tokio_test::block_on(get_config(&state())).unwrap();
        assert!(!config.storage.watch_enabled);
    }

    #[test]
    fn test_export_then_missing_import() {
        let state = state();
        let dir = tempfile::tempdir().unwrap();
        let exported = dir.path().join("config.json");

        tokio_test::block_on(export_config(&state, exported.display().to_string())).unwrap();
        let json = std::fs::read_to_string(&exported).unwrap();
        assert!(AppConfig::import(&json).is_ok());

        let missing = dir.path().join("missing.json").display().to_string();
        let result = tokio_test::block_on(import_config(&state, missing));
        assert!(matches!(result, Err(message) if message.contains("not found")));
    }
}
