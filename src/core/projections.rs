//! Read-only aggregates derived from a collection snapshot
//!
//! Nothing here holds state; views recompute these on every change.

use serde::{Deserialize, Serialize};

use crate::core::models::{AccountRecord, AccountSummary, ChannelStats, CHANNEL_URL_BASE};

/// Share of the weekly template attributed to a single account
pub const ACCOUNT_STATS_RATIO: f64 = 0.2;

/// List filter offered by the accounts view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl AccountFilter {
    pub fn matches(self, account: &AccountRecord) -> bool {
        match self {
            Self::All => true,
            Self::Active => account.is_active,
            Self::Inactive => !account.is_active,
        }
    }
}

impl std::str::FromStr for AccountFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(format!("Unknown account filter: {}", other)),
        }
    }
}

pub fn summary(accounts: &[AccountRecord]) -> AccountSummary {
    AccountSummary {
        total_accounts: accounts.len(),
        total_subscribers: accounts.iter().map(|a| a.subscribers).sum(),
        total_views: accounts.iter().map(|a| a.total_views).sum(),
        total_videos: accounts.iter().map(|a| a.total_videos).sum(),
        total_revenue: accounts.iter().map(|a| a.estimated_revenue).sum(),
    }
}

pub fn active_count(accounts: &[AccountRecord]) -> usize {
    accounts.iter().filter(|a| a.is_active).count()
}

pub fn inactive_count(accounts: &[AccountRecord]) -> usize {
    accounts.len() - active_count(accounts)
}

/// Total revenue per account; 0 for an empty collection
pub fn average_revenue(accounts: &[AccountRecord]) -> f64 {
    if accounts.is_empty() {
        return 0.0;
    }
    summary(accounts).total_revenue / accounts.len() as f64
}

pub fn filter_accounts(accounts: &[AccountRecord], filter: AccountFilter) -> Vec<AccountRecord> {
    accounts
        .iter()
        .filter(|account| filter.matches(account))
        .cloned()
        .collect()
}

/// Scale the weekly template by a fixed ratio, rounding to whole units
pub fn weekly_stats(template: &[ChannelStats], ratio: f64) -> Vec<ChannelStats> {
    template
        .iter()
        .map(|stat| ChannelStats {
            day: stat.day.clone(),
            subscribers: (stat.subscribers as f64 * ratio).round() as u64,
            views: (stat.views as f64 * ratio).round() as u64,
            revenue: (stat.revenue * ratio).round(),
        })
        .collect()
}

pub fn channel_url(account: &AccountRecord) -> String {
    format!("{}{}", CHANNEL_URL_BASE, account.external_channel_id())
}
