//! Account command handlers
//!
//! Listing, editing and aggregate queries over the account collection.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::core::models::{AccountRecord, AccountSummary, ChannelStats, NewAccount};
use crate::core::projections::{self, AccountFilter, ACCOUNT_STATS_RATIO};
use crate::core::seed::last_week_stats;
use crate::AppState;

/// Aggregates shown above the accounts list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountOverview {
    pub summary: AccountSummary,
    pub average_revenue: f64,
    pub active_accounts: usize,
    pub inactive_accounts: usize,
}

/// One account with its weekly statistics and public channel link
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetail {
    pub account: AccountRecord,
    pub weekly_stats: Vec<ChannelStats>,
    pub channel_url: String,
}

/// List accounts, optionally filtered by `all` / `active` / `inactive`
pub async fn list_accounts(
    state: &AppState,
    filter: Option<String>,
) -> Result<Vec<AccountRecord>, String> {
    let filter = match filter.as_deref() {
        Some(value) => value.parse::<AccountFilter>()?,
        None => AccountFilter::All,
    };

    let accounts = projections::filter_accounts(&state.store.list(), filter);
    info!("📋 Listed {} account(s) ({:?})", accounts.len(), filter);
    Ok(accounts)
}

pub async fn get_account(state: &AppState, id: String) -> Result<Option<AccountRecord>, String> {
    Ok(state.store.get(&id))
}

pub async fn get_account_detail(state: &AppState, id: String) -> Result<AccountDetail, String> {
    let account = state.store.get(&id).ok_or_else(|| {
        warn!("⚠️ Account {} not found", id);
        format!("Account not found: {}", id)
    })?;

    Ok(AccountDetail {
        channel_url: projections::channel_url(&account),
        weekly_stats: projections::weekly_stats(&last_week_stats(), ACCOUNT_STATS_RATIO),
        account,
    })
}

pub async fn add_account(state: &AppState, account: NewAccount) -> Result<AccountRecord, String> {
    info!("➕ Adding account: {}", account.name);

    match state.store.add(account) {
        Ok(record) => {
            info!("✅ Account added with id {}", record.id);
            Ok(record)
        }
        Err(e) => {
            error!("❌ Failed to add account: {}", e);
            Err(e.to_string())
        }
    }
}

/// Replace an account; `None` when the id does not exist
pub async fn update_account(
    state: &AppState,
    account: AccountRecord,
) -> Result<Option<AccountRecord>, String> {
    info!("✏️ Updating account {}", account.id);

    state.store.update(account).map_err(|e| {
        error!("❌ Failed to update account: {}", e);
        e.to_string()
    })
}

pub async fn toggle_account_status(
    state: &AppState,
    id: String,
) -> Result<Option<AccountRecord>, String> {
    match state.store.toggle_active(&id) {
        Ok(Some(account)) => {
            info!(
                "🔁 Account {} is now {}",
                id,
                if account.is_active { "active" } else { "inactive" }
            );
            Ok(Some(account))
        }
        Ok(None) => {
            warn!("⚠️ Account {} not found", id);
            Ok(None)
        }
        Err(e) => {
            error!("❌ Failed to toggle account {}: {}", id, e);
            Err(e.to_string())
        }
    }
}

pub async fn delete_account(state: &AppState, id: String) -> Result<bool, String> {
    info!("🗑️ Deleting account {}", id);

    state.store.delete(&id).map_err(|e| {
        error!("❌ Failed to delete account {}: {}", id, e);
        e.to_string()
    })
}

pub async fn get_account_overview(state: &AppState) -> Result<AccountOverview, String> {
    let accounts = state.store.list();

    Ok(AccountOverview {
        summary: projections::summary(&accounts),
        average_revenue: projections::average_revenue(&accounts),
        active_accounts: projections::active_count(&accounts),
        inactive_accounts: projections::inactive_count(&accounts),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{AppConfig, StorageConfig};
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

    #[tokio::test]
    async fn test_overview_of_seed() {
        let overview = get_account_overview(&state()).await.unwrap();

        assert_eq!(overview.summary.total_subscribers, 132_800);
        assert_eq!(overview.active_accounts, 4);
        assert_eq!(overview.inactive_accounts, 1);
    }

    #[tokio::test]
    async fn test_list_with_filter() {
        let state = state();

        assert_eq!(list_accounts(&state, Some("active".into())).await.unwrap().len(), 4);
        assert!(list_accounts(&state, Some("bogus".into())).await.is_err());
    }

    #[tokio::test]
    async fn test_detail_and_missing_account() {
        let state = state();

        let detail = get_account_detail(&state, "1".into()).await.unwrap();
        assert_eq!(detail.channel_url, "https://youtube.com/channel/1");
        assert_eq!(detail.weekly_stats.len(), 7);

        assert!(get_account_detail(&state, "42".into()).await.is_err());
        assert_eq!(toggle_account_status(&state, "42".into()).await, Ok(None));
        assert_eq!(delete_account(&state, "42".into()).await, Ok(false));
    }
}
