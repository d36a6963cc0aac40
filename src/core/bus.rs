//! Change notification bus
//!
//! Tells every interested view "the collection changed, re-read it". There is
//! no payload. Two transports sit behind one subscription interface:
//!
//! - [`LocalBus`]: in-process delivery, fired by the store after each write
//! - [`StorageWatcher`]: cross-process delivery, fired when the stored
//!   document's revision changes because some other process wrote it
//!
//! [`ChangeBus`] composes both so a subscriber cannot tell where a change came from.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::storage::AccountStorage;

/// Callback invoked on every change; receivers re-read the store
pub type ChangeListener = Arc<dyn Fn() + Send + Sync>;

/// Anything a view can subscribe to for change notifications
pub trait ChangeSource: Send + Sync {
    fn subscribe(&self, listener: ChangeListener) -> Subscription;
}

#[derive(Default)]
struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, ChangeListener)>>,
}

impl ListenerRegistry {
    fn register(self: &Arc<Self>, listener: ChangeListener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.listeners.lock().push((id, listener));
        Subscription {
            handles: vec![(Arc::downgrade(self), id)],
        }
    }

    fn remove(&self, id: u64) {
        self.listeners.lock().retain(|(listener_id, _)| *listener_id != id);
    }

    /// Invoke a snapshot of the listeners; the lock is released first so a
    /// listener may subscribe or unsubscribe while being notified.
    fn notify(&self) -> usize {
        let snapshot: Vec<ChangeListener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in &snapshot {
            listener();
        }
        snapshot.len()
    }

    fn len(&self) -> usize {
        self.listeners.lock().len()
    }
}

/// Registration handle; dropping it (or calling `unsubscribe`) removes the listener
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    handles: Vec<(Weak<ListenerRegistry>, u64)>,
}

impl Subscription {
    pub fn unsubscribe(self) {}

    fn merge(mut self, mut other: Subscription) -> Subscription {
        self.handles.append(&mut other.handles);
        self
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        for (registry, id) in self.handles.drain(..) {
            if let Some(registry) = registry.upgrade() {
                registry.remove(id);
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("transports", &self.handles.len())
            .finish()
    }
}

/// Same-process transport
#[derive(Clone, Default)]
pub struct LocalBus {
    registry: Arc<ListenerRegistry>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notify every listener; returns how many were invoked
    pub fn emit(&self) -> usize {
        self.registry.notify()
    }

    pub fn listener_count(&self) -> usize {
        self.registry.len()
    }
}

impl ChangeSource for LocalBus {
    fn subscribe(&self, listener: ChangeListener) -> Subscription {
        self.registry.register(listener)
    }
}

struct WatchState {
    registry: Arc<ListenerRegistry>,
    storage: Arc<dyn AccountStorage>,
    last_seen: Mutex<Option<String>>,
}

impl WatchState {
    fn poll_once(&self) -> bool {
        let current = match self.storage.revision() {
            Ok(revision) => revision,
            Err(e) => {
                warn!("Storage watcher could not read revision: {}", e);
                return false;
            }
        };

        {
            let mut last_seen = self.last_seen.lock();
            if *last_seen == current {
                return false;
            }
            *last_seen = current;
        }

        let delivered = self.registry.notify();
        debug!("External collection change delivered to {} listener(s)", delivered);
        true
    }
}

/// Cross-process transport: polls the storage revision
pub struct StorageWatcher {
    state: Arc<WatchState>,
    interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl StorageWatcher {
    pub fn new(storage: Arc<dyn AccountStorage>, interval: Duration) -> Self {
        let initial = storage.revision().ok().flatten();
        Self {
            state: Arc::new(WatchState {
                registry: Arc::new(ListenerRegistry::default()),
                storage,
                last_seen: Mutex::new(initial),
            }),
            interval,
            task: Mutex::new(None),
        }
    }

    /// Record a revision this process wrote itself so it is not redelivered
    pub fn mark_seen(&self, revision: Option<String>) {
        *self.state.last_seen.lock() = revision;
    }

    /// Check once; returns whether an external change was delivered
    pub fn poll_once(&self) -> bool {
        self.state.poll_once()
    }

    /// Spawn the polling loop on the current tokio runtime
    pub fn start(&self) -> bool {
        let mut task = self.task.lock();
        if task.is_some() {
            return true;
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No tokio runtime available; cross-process change watching disabled");
                return false;
            }
        };

        let state = Arc::clone(&self.state);
        let interval = self.interval;
        *task = Some(handle.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                state.poll_once();
            }
        }));

        info!("Storage watcher started ({} ms interval)", interval.as_millis());
        true
    }

    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
            info!("Storage watcher stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.lock().is_some()
    }
}

impl Drop for StorageWatcher {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

impl ChangeSource for StorageWatcher {
    fn subscribe(&self, listener: ChangeListener) -> Subscription {
        self.state.registry.register(listener)
    }
}

/// The one logical bus: local delivery plus optional cross-process watching
#[derive(Clone, Default)]
pub struct ChangeBus {
    local: LocalBus,
    watcher: Option<Arc<StorageWatcher>>,
}

impl ChangeBus {
    pub fn local_only() -> Self {
        Self::default()
    }

    pub fn with_watcher(watcher: Arc<StorageWatcher>) -> Self {
        Self {
            local: LocalBus::new(),
            watcher: Some(watcher),
        }
    }

    /// Announce a write made by this process
    pub fn publish(&self, revision: Option<String>) -> usize {
        if let Some(watcher) = &self.watcher {
            watcher.mark_seen(revision);
        }
        self.local.emit()
    }

    pub fn watcher(&self) -> Option<&Arc<StorageWatcher>> {
        self.watcher.as_ref()
    }

    pub fn listener_count(&self) -> usize {
        self.local.listener_count()
    }
}

impl ChangeSource for ChangeBus {
    fn subscribe(&self, listener: ChangeListener) -> Subscription {
        let subscription = self.local.subscribe(Arc::clone(&listener));
        match &self.watcher {
            Some(watcher) => subscription.merge(watcher.subscribe(listener)),
            None => subscription,
        }
    }
}
