//! YouTube Account Manager - Core Library
//!
//! This library keeps a local catalogue of YouTube channel accounts in one
//! JSON document and keeps every open view of it consistent, including views
//! in other processes sharing the same file. Accounts are added by hand,
//! imported from the user's YouTube channels over OAuth, or loaded from CSV.

pub mod commands;
pub mod core;
pub mod parsers;
pub mod utils;

// Re-export commonly used types
pub use crate::core::{
    bus::{ChangeBus, ChangeSource, LocalBus, StorageWatcher, Subscription},
    config::AppConfig,
    error_handling::ImportFailure,
    import_session::{ImportMethod, ImportSession},
    models::{AccountRecord, AccountSummary, AppError, AppResult, NewAccount},
    reconciler::{ImportReconciler, ManualAccountForm},
    storage::{AccountStorage, FileStorage, MemoryStorage},
    store::AccountStore,
    view::{AccountDetailView, AccountsView},
    youtube_client::{ChannelSource, YoutubeApiClient},
};

pub use utils::encoding::detect_encoding;

use std::sync::Arc;
use std::time::Duration;

/// Application state shared between commands
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<tokio::sync::RwLock<AppConfig>>,
    pub store: Arc<AccountStore>,
    pub reconciler: Arc<ImportReconciler>,
    pub youtube: Arc<YoutubeApiClient>,
}

impl AppState {
    pub fn new() -> anyhow::Result<Self> {
        let config = Self::load_or_initialize_config();
        Self::with_config(config)
    }

    /// Build on the collection file named by `config`
    pub fn with_config(config: AppConfig) -> anyhow::Result<Self> {
        let data_file = config.accounts_file()?;
        tracing::info!("📁 Account collection: {}", data_file.display());
        Self::with_storage(config, Arc::new(FileStorage::new(data_file)))
    }

    pub fn with_storage(config: AppConfig, storage: Arc<dyn AccountStorage>) -> anyhow::Result<Self> {
        let bus = if config.storage.watch_enabled {
            let watcher = Arc::new(StorageWatcher::new(
                Arc::clone(&storage),
                Duration::from_millis(config.storage.watch_interval_ms),
            ));
            // Without a runtime the watcher stays idle and only local changes are seen
            watcher.start();
            ChangeBus::with_watcher(watcher)
        } else {
            ChangeBus::local_only()
        };

        let store = Arc::new(AccountStore::new(storage, bus));
        let reconciler = Arc::new(ImportReconciler::new(
            Arc::clone(&store),
            config.import.clone(),
        ));
        let youtube = Arc::new(
            YoutubeApiClient::new(config.youtube.clone())
                .map_err(|e| anyhow::anyhow!("Failed to create YouTube client: {}", e))?,
        );

        Ok(Self {
            config: Arc::new(tokio::sync::RwLock::new(config)),
            store,
            reconciler,
            youtube,
        })
    }

    fn load_or_initialize_config() -> AppConfig {
        match AppConfig::load() {
            Ok(cfg) => {
                if let Err(err) = cfg.validate() {
                    tracing::warn!(
                        "Invalid configuration detected ({}), falling back to defaults",
                        err
                    );
                    let default_cfg = AppConfig::default();
                    if let Err(save_err) = default_cfg.save() {
                        tracing::warn!("Failed to persist default configuration: {}", save_err);
                    }
                    default_cfg
                } else {
                    cfg
                }
            }
            Err(err) => {
                tracing::warn!(
                    "Failed to load configuration from disk: {}. Using defaults",
                    err
                );
                let default_cfg = AppConfig::default();
                if let Err(save_err) = default_cfg.save() {
                    tracing::warn!("Failed to persist default configuration: {}", save_err);
                }
                default_cfg
            }
        }
    }
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize the library with default settings
pub fn init() -> anyhow::Result<()> {
    utils::logging::init_tracing();

    tracing::info!("📚 {} v{} initialized", NAME, VERSION);
    Ok(())
}
