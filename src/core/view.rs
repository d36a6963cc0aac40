//! Account views
//!
//! A view holds a snapshot of the collection plus whatever it derives from it.
//! While mounted it re-reads the store on every bus notification; once
//! unmounted it ignores notifications, including ones already in flight.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

use crate::core::bus::{ChangeSource, Subscription};
use crate::core::models::{AccountRecord, AccountSummary, AppResult, ChannelStats};
use crate::core::projections::{self, AccountFilter, ACCOUNT_STATS_RATIO};
use crate::core::seed::last_week_stats;
use crate::core::store::AccountStore;

/// State derived from a collection snapshot
pub trait Projection: Clone + Send + Sync + 'static {
    fn derive(&mut self, accounts: &[AccountRecord]);
}

/// Mounted subscription driving a [`Projection`]
pub struct ViewState<P: Projection> {
    store: Arc<AccountStore>,
    projection: Arc<RwLock<P>>,
    mounted: Arc<AtomicBool>,
    subscription: Option<Subscription>,
}

impl<P: Projection> ViewState<P> {
    /// Derive from the current snapshot and start listening
    pub fn mount(store: Arc<AccountStore>, mut projection: P) -> Self {
        projection.derive(&store.list());
        let projection = Arc::new(RwLock::new(projection));
        let mounted = Arc::new(AtomicBool::new(true));

        // Weak, so the bus's listener list does not keep the store alive
        let weak_store: Weak<AccountStore> = Arc::downgrade(&store);
        let listener_projection = Arc::clone(&projection);
        let listener_mounted = Arc::clone(&mounted);
        let subscription = store.bus().subscribe(Arc::new(move || {
            if !listener_mounted.load(Ordering::SeqCst) {
                return;
            }
            if let Some(store) = weak_store.upgrade() {
                let accounts = store.list();
                listener_projection.write().derive(&accounts);
            }
        }));

        Self {
            store,
            projection,
            mounted,
            subscription: Some(subscription),
        }
    }

    pub fn store(&self) -> &Arc<AccountStore> {
        &self.store
    }

    /// Copy of the current projection; no lock is held once this returns
    pub fn read(&self) -> P {
        self.projection.read().clone()
    }

    /// Re-derive on demand; a no-op once unmounted
    pub fn refresh(&self) {
        if self.is_mounted() {
            let accounts = self.store.list();
            self.projection.write().derive(&accounts);
        }
    }

    /// Change the projection's inputs, then re-derive from the current snapshot
    pub fn reconfigure(&self, change: impl FnOnce(&mut P)) {
        let accounts = self.store.list();
        let mut projection = self.projection.write();
        change(&mut projection);
        projection.derive(&accounts);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    pub fn unmount(&mut self) {
        if self.mounted.swap(false, Ordering::SeqCst) {
            debug!("View unmounted");
        }
        self.subscription.take();
    }
}

impl<P: Projection> Drop for ViewState<P> {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Everything the accounts list page shows
#[derive(Debug, Clone, Default)]
pub struct AccountsProjection {
    pub filter: AccountFilter,
    pub accounts: Vec<AccountRecord>,
    pub visible: Vec<AccountRecord>,
    pub summary: AccountSummary,
    pub average_revenue: f64,
    pub active_count: usize,
    pub inactive_count: usize,
    /// Number of times this projection was derived
    pub revision: u64,
}

impl Projection for AccountsProjection {
    fn derive(&mut self, accounts: &[AccountRecord]) {
        self.accounts = accounts.to_vec();
        self.visible = projections::filter_accounts(accounts, self.filter);
        self.summary = projections::summary(accounts);
        self.average_revenue = projections::average_revenue(accounts);
        self.active_count = projections::active_count(accounts);
        self.inactive_count = projections::inactive_count(accounts);
        self.revision += 1;
    }
}

/// Accounts list page
pub struct AccountsView {
    state: ViewState<AccountsProjection>,
}

impl AccountsView {
    pub fn mount(store: Arc<AccountStore>) -> Self {
        Self {
            state: ViewState::mount(store, AccountsProjection::default()),
        }
    }

    pub fn snapshot(&self) -> AccountsProjection {
        self.state.read()
    }

    /// Re-read the store without waiting for a notification
    pub fn refresh(&self) {
        self.state.refresh();
    }

    pub fn set_filter(&self, filter: AccountFilter) {
        self.state.reconfigure(|projection| projection.filter = filter);
    }

    /// Status button on a row
    pub fn toggle_active(&self, id: &str) -> AppResult<Option<AccountRecord>> {
        self.state.store().toggle_active(id)
    }

    pub fn delete(&self, id: &str) -> AppResult<bool> {
        self.state.store().delete(id)
    }

    pub fn is_mounted(&self) -> bool {
        self.state.is_mounted()
    }

    pub fn unmount(&mut self) {
        self.state.unmount();
    }
}

/// One account with its scaled weekly statistics
#[derive(Debug, Clone)]
pub struct AccountDetailProjection {
    pub account_id: String,
    pub account: Option<AccountRecord>,
    pub weekly_stats: Vec<ChannelStats>,
    pub channel_url: Option<String>,
}

impl AccountDetailProjection {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            account: None,
            weekly_stats: Vec::new(),
            channel_url: None,
        }
    }
}

impl Projection for AccountDetailProjection {
    fn derive(&mut self, accounts: &[AccountRecord]) {
        self.account = accounts
            .iter()
            .find(|account| account.id == self.account_id)
            .cloned();
        self.channel_url = self.account.as_ref().map(projections::channel_url);
        self.weekly_stats = match self.account {
            Some(_) => projections::weekly_stats(&last_week_stats(), ACCOUNT_STATS_RATIO),
            None => Vec::new(),
        };
    }
}

/// Detail page of a single account
pub struct AccountDetailView {
    state: ViewState<AccountDetailProjection>,
}

impl AccountDetailView {
    pub fn mount(store: Arc<AccountStore>, account_id: impl Into<String>) -> Self {
        Self {
            state: ViewState::mount(store, AccountDetailProjection::new(account_id)),
        }
    }

    pub fn snapshot(&self) -> AccountDetailProjection {
        self.state.read()
    }

    /// Persist an edited copy of the shown account
    pub fn save(&self, account: AccountRecord) -> AppResult<Option<AccountRecord>> {
        self.state.store().update(account)
    }

    pub fn is_mounted(&self) -> bool {
        self.state.is_mounted()
    }

    pub fn unmount(&mut self) {
        self.state.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bus::ChangeBus;
    use crate::core::models::NewAccount;
    use crate::core::storage::MemoryStorage;

    fn store() -> Arc<AccountStore> {
        Arc::new(AccountStore::new(
            Arc::new(MemoryStorage::new()),
            ChangeBus::local_only(),
        ))
    }

    #[test]
    fn test_accounts_view_follows_mutations() {
        let store = store();
        let view = AccountsView::mount(Arc::clone(&store));
        assert_eq!(view.snapshot().summary.total_accounts, 5);

        store.add(NewAccount::with_defaults("New", "new@mail.com")).unwrap();
        assert_eq!(view.snapshot().summary.total_accounts, 6);
        assert_eq!(view.snapshot().active_count, 5);

        view.toggle_active("1").unwrap();
        assert_eq!(view.snapshot().inactive_count, 2);
    }

    #[test]
    fn test_filter_applies_to_current_snapshot() {
        let view = AccountsView::mount(store());
        view.set_filter(AccountFilter::Inactive);

        let snapshot = view.snapshot();
        assert_eq!(snapshot.visible.len(), 1);
        assert_eq!(snapshot.visible[0].id, "5");
        assert_eq!(snapshot.accounts.len(), 5);
    }

    #[test]
    fn test_unmounted_view_ignores_changes() {
        let store = store();
        let mut view = AccountsView::mount(Arc::clone(&store));
        let before = view.snapshot().revision;

        view.unmount();
        store.delete("1").unwrap();

        assert!(!view.is_mounted());
        assert_eq!(view.snapshot().revision, before);
        assert_eq!(view.snapshot().accounts.len(), 5);
        assert_eq!(store.bus().listener_count(), 0);
    }

    #[test]
    fn test_refresh_picks_up_unannounced_write() {
        let storage = Arc::new(MemoryStorage::new());
        let ours = Arc::new(AccountStore::new(storage.clone(), ChangeBus::local_only()));
        let theirs = AccountStore::new(storage, ChangeBus::local_only());
        let view = AccountsView::mount(Arc::clone(&ours));

        theirs.delete("4").unwrap();
        assert_eq!(view.snapshot().accounts.len(), 5);

        view.refresh();
        assert_eq!(view.snapshot().accounts.len(), 4);
    }

    #[test]
    fn test_detail_view() {
        let store = store();
        let view = AccountDetailView::mount(Arc::clone(&store), "2");
        {
            let snapshot = view.snapshot();
            assert_eq!(snapshot.account.as_ref().map(|a| a.name.as_str()), Some("Automated Channel 2"));
            assert_eq!(snapshot.weekly_stats.len(), 7);
            assert_eq!(snapshot.channel_url.as_deref(), Some("https://youtube.com/channel/2"));
        }

        store.delete("2").unwrap();
        assert!(view.snapshot().account.is_none());
        assert!(view.snapshot().weekly_stats.is_empty());
    }

    #[test]
    fn test_toggle_while_holding_snapshot() {
        let store = store();
        let view = Arc::new(AccountsView::mount(Arc::clone(&store)));
        let (tx, rx) = std::sync::mpsc::channel();

        let worker = Arc::clone(&view);
        std::thread::spawn(move || {
            let snapshot = worker.snapshot();
            let toggled = worker.toggle_active(&snapshot.visible[0].id);
            let _ = tx.send((toggled.map(|a| a.map(|a| a.is_active)), snapshot.inactive_count));
        });

        let (toggled, held_inactive) = rx
            .recv_timeout(std::time::Duration::from_secs(3))
            .expect("toggle completes while a snapshot is held");
        assert_eq!(toggled.unwrap(), Some(false));
        assert_eq!(held_inactive, 1);
        assert_eq!(view.snapshot().inactive_count, 2);
    }

    #[test]
    fn test_detail_save_while_holding_snapshot() {
        let view = AccountDetailView::mount(store(), "4");
        let snapshot = view.snapshot();
        let mut account = snapshot.account.clone().unwrap();
        account.name = "Renamed".to_string();

        view.save(account).unwrap();

        assert_eq!(snapshot.account.unwrap().name, "Automated Channel 4");
        assert_eq!(view.snapshot().account.unwrap().name, "Renamed");
    }

    #[test]
    fn test_detail_view_save() {
        let store = store();
        let view = AccountDetailView::mount(Arc::clone(&store), "3");
        let mut account = view.snapshot().account.unwrap();
        account.channel_id = Some("UCedited".to_string());

        view.save(account).unwrap();
        assert_eq!(
            view.snapshot().channel_url.as_deref(),
            Some("https://youtube.com/channel/UCedited")
        );
    }
}
