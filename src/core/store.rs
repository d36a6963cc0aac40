//! Account store
//!
//! Repository over an injected [`AccountStorage`]. Every mutation follows the
//! same discipline: read the whole collection, change it, write it whole, then
//! publish on the [`ChangeBus`]. In-process mutations are serialized; writes
//! from other processes are last-writer-wins.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::bus::ChangeBus;
use crate::core::models::{AccountRecord, AppError, AppResult, NewAccount};
use crate::core::seed::default_accounts;
use crate::core::storage::AccountStorage;

pub struct AccountStore {
    storage: Arc<dyn AccountStorage>,
    bus: ChangeBus,
    write_lock: Mutex<()>,
}

impl AccountStore {
    pub fn new(storage: Arc<dyn AccountStorage>, bus: ChangeBus) -> Self {
        Self {
            storage,
            bus,
            write_lock: Mutex::new(()),
        }
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    pub fn storage(&self) -> &Arc<dyn AccountStorage> {
        &self.storage
    }

    /// Current collection, seeding the default dataset on first access.
    ///
    /// Never fails: an unreadable or corrupt document falls back to the
    /// default dataset without overwriting what is stored.
    pub fn list(&self) -> Vec<AccountRecord> {
        match self.storage.load() {
            Ok(Some(accounts)) => accounts,
            Ok(None) => {
                let seed = default_accounts();
                match self.storage.save(&seed) {
                    Ok(revision) => {
                        // Seeding is not a change listeners need to hear about
                        if let Some(watcher) = self.bus.watcher() {
                            watcher.mark_seen(Some(revision));
                        }
                        info!("Seeded account collection with {} default accounts", seed.len());
                    }
                    Err(e) => warn!("Failed to persist default accounts: {}", e),
                }
                seed
            }
            Err(e) => {
                warn!("Failed to read account collection, using defaults: {}", e);
                default_accounts()
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<AccountRecord> {
        self.list().into_iter().find(|account| account.id == id)
    }

    /// Append one account under the next id (`max + 1`)
    pub fn add(&self, account: NewAccount) -> AppResult<AccountRecord> {
        let mut added = self.add_many(vec![account])?;
        // add_many returns one record per input
        Ok(added.remove(0))
    }

    /// Append a batch under a contiguous block of ids starting at `max + 1`,
    /// in input order, with a single write and a single notification
    pub fn add_many(&self, accounts: Vec<NewAccount>) -> AppResult<Vec<AccountRecord>> {
        if accounts.is_empty() {
            return Ok(Vec::new());
        }

        let (added, revision) = {
            let _guard = self.write_lock.lock();
            let mut collection = self.list();
            let first_id = next_account_id(&collection).ok_or_else(id_space_exhausted)?;

            let added = accounts
                .into_iter()
                .enumerate()
                .map(|(offset, account)| {
                    u64::try_from(offset)
                        .ok()
                        .and_then(|offset| first_id.checked_add(offset))
                        .map(|id| AccountRecord::from_new(id.to_string(), account))
                        .ok_or_else(id_space_exhausted)
                })
                .collect::<AppResult<Vec<AccountRecord>>>()?;

            collection.extend(added.iter().cloned());
            let revision = self.storage.save(&collection)?;
            (added, revision)
        };
        self.publish(revision);

        info!(
            "Added {} account(s) with ids {}..={}",
            added.len(),
            added[0].id,
            added[added.len() - 1].id
        );
        Ok(added)
    }

    /// Replace the record with the same id in place; `None` if there is none
    pub fn update(&self, account: AccountRecord) -> AppResult<Option<AccountRecord>> {
        let revision = {
            let _guard = self.write_lock.lock();
            let mut collection = self.list();

            let Some(slot) = collection.iter_mut().find(|existing| existing.id == account.id)
            else {
                debug!("Update skipped, account {} not found", account.id);
                return Ok(None);
            };
            *slot = account.clone();

            self.storage.save(&collection)?
        };
        self.publish(revision);
        info!("Updated account {}", account.id);
        Ok(Some(account))
    }

    pub fn set_active(&self, id: &str, is_active: bool) -> AppResult<Option<AccountRecord>> {
        match self.get(id) {
            Some(mut account) => {
                account.is_active = is_active;
                self.update(account)
            }
            None => Ok(None),
        }
    }

    /// Flip the active flag, as the list view's status button does
    pub fn toggle_active(&self, id: &str) -> AppResult<Option<AccountRecord>> {
        match self.get(id) {
            Some(account) => self.set_active(id, !account.is_active),
            None => Ok(None),
        }
    }

    /// Remove by id; persists and notifies only if something was removed
    pub fn delete(&self, id: &str) -> AppResult<bool> {
        let revision = {
            let _guard = self.write_lock.lock();
            let collection = self.list();
            let before = collection.len();

            let remaining: Vec<AccountRecord> = collection
                .into_iter()
                .filter(|account| account.id != id)
                .collect();

            if remaining.len() == before {
                debug!("Delete skipped, account {} not found", id);
                return Ok(false);
            }

            self.storage.save(&remaining)?
        };
        self.publish(revision);
        info!("Deleted account {}", id);
        Ok(true)
    }

    // Called after the write lock is released so listeners may re-enter the store
    fn publish(&self, revision: String) {
        let notified = self.bus.publish(Some(revision));
        debug!("Collection change published to {} listener(s)", notified);
    }
}

/// `1 + max(existing ids)`, with an empty collection starting at 1.
///
/// A retired top id is handed out again after its record is deleted.
/// `None` once the largest id is `u64::MAX`.
pub fn next_account_id(accounts: &[AccountRecord]) -> Option<u64> {
    accounts
        .iter()
        .map(AccountRecord::numeric_id)
        .max()
        .unwrap_or(0)
        .checked_add(1)
}

fn id_space_exhausted() -> AppError {
    AppError::Storage("No account ids left to allocate".to_string())
}
