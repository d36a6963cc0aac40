//! Change bus integration tests
//!
//! Covers in-process delivery after store mutations and cross-process delivery
//! through the storage watcher, using two stores over one file.

#[cfg(test)]
mod tests {
    use crate::core::bus::{ChangeBus, ChangeListener, ChangeSource, LocalBus, StorageWatcher};
    use crate::core::models::{AppResult, NewAccount};
    use crate::core::storage::{AccountStorage, FileStorage, MemoryStorage};
    use crate::core::store::AccountStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn counter() -> (Arc<AtomicUsize>, ChangeListener) {
        let count = Arc::new(AtomicUsize::new(0));
        let listener_count = Arc::clone(&count);
        let listener: ChangeListener = Arc::new(move || {
            listener_count.fetch_add(1, Ordering::SeqCst);
        });
        (count, listener)
    }

    fn watched_store(storage: Arc<dyn AccountStorage>) -> (Arc<StorageWatcher>, AccountStore) {
        let watcher = Arc::new(StorageWatcher::new(
            storage.clone(),
            Duration::from_millis(20),
        ));
        let store = AccountStore::new(storage, ChangeBus::with_watcher(watcher.clone()));
        (watcher, store)
    }

    #[test]
    fn test_every_listener_hears_every_mutation() -> AppResult<()> {
        let store = AccountStore::new(
            Arc::new(MemoryStorage::with_raw("[]")),
            ChangeBus::local_only(),
        );
        let (first, first_listener) = counter();
        let (second, second_listener) = counter();
        let _a = store.bus().subscribe(first_listener);
        let _b = store.bus().subscribe(second_listener);

        store.add(NewAccount::with_defaults("A", "a@mail.com"))?;
        store.toggle_active("1")?;
        store.delete("1")?;

        assert_eq!(first.load(Ordering::SeqCst), 3);
        assert_eq!(second.load(Ordering::SeqCst), 3);
        Ok(())
    }

    #[test]
    fn test_noop_mutations_do_not_notify() -> AppResult<()> {
        let store = AccountStore::new(
            Arc::new(MemoryStorage::with_raw("[]")),
            ChangeBus::local_only(),
        );
        let (count, listener) = counter();
        let _subscription = store.bus().subscribe(listener);

        assert!(!store.delete("404")?);
        assert_eq!(store.toggle_active("404")?, None);

        assert_eq!(count.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let bus = LocalBus::new();
        let (count, listener) = counter();

        let subscription = bus.subscribe(listener);
        assert_eq!(bus.emit(), 1);
        drop(subscription);

        assert_eq!(bus.emit(), 0);
        assert_eq!(bus.listener_count(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_may_reenter_store() -> AppResult<()> {
        let store = Arc::new(AccountStore::new(
            Arc::new(MemoryStorage::with_raw("[]")),
            ChangeBus::local_only(),
        ));
        let seen = Arc::new(AtomicUsize::new(0));

        let weak = Arc::downgrade(&store);
        let seen_in_listener = Arc::clone(&seen);
        let _subscription = store.bus().subscribe(Arc::new(move || {
            if let Some(store) = weak.upgrade() {
                seen_in_listener.store(store.list().len(), Ordering::SeqCst);
            }
        }));

        store.add(NewAccount::with_defaults("A", "a@mail.com"))?;
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[test]
    fn test_watcher_delivers_external_writes_only() -> AppResult<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("youtube_accounts.json");
        std::fs::write(&path, "[]")?;

        let (watcher, ours) = watched_store(Arc::new(FileStorage::new(&path)));
        let theirs = AccountStore::new(Arc::new(FileStorage::new(&path)), ChangeBus::local_only());
        let (count, listener) = counter();
        let _subscription = ours.bus().subscribe(listener);

        // Own write: delivered locally once, not again by the watcher
        ours.add(NewAccount::with_defaults("Ours", "ours@mail.com"))?;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!watcher.poll_once());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // Another process's write: delivered by the watcher
        theirs.add(NewAccount::with_defaults("Theirs", "theirs@mail.com"))?;
        assert!(watcher.poll_once());
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(ours.list().len(), 2);

        assert!(!watcher.poll_once());
        Ok(())
    }

    #[test]
    fn test_seeding_is_not_announced() {
        let storage: Arc<dyn AccountStorage> = Arc::new(MemoryStorage::new());
        let (watcher, store) = watched_store(storage);
        let (count, listener) = counter();
        let _subscription = store.bus().subscribe(listener);

        assert_eq!(store.list().len(), 5);
        assert!(!watcher.poll_once());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_running_watcher_notifies_subscribers() -> AppResult<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("youtube_accounts.json");
        std::fs::write(&path, "[]")?;

        let (watcher, ours) = watched_store(Arc::new(FileStorage::new(&path)));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let _subscription = ours.bus().subscribe(Arc::new(move || {
            let _ = tx.send(());
        }));

        assert!(watcher.start());
        assert!(watcher.is_running());

        let theirs = AccountStore::new(Arc::new(FileStorage::new(&path)), ChangeBus::local_only());
        theirs.add(NewAccount::with_defaults("Theirs", "theirs@mail.com"))?;

        let delivered = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        assert!(matches!(delivered, Ok(Some(()))));

        watcher.stop();
        assert!(!watcher.is_running());
        Ok(())
    }

    #[test]
    fn test_start_without_runtime_is_refused() {
        let watcher = StorageWatcher::new(Arc::new(MemoryStorage::new()), Duration::from_millis(10));
        assert!(!watcher.start());
        assert!(!watcher.is_running());
    }
}
