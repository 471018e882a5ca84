//! Change-notification fan-out shared by the settings backends.

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use std::collections::HashMap;
use std::sync::Arc;

/// Callback invoked when a subscribed key changes. Carries no payload; the
/// subscriber is expected to re-read the key.
pub type ChangeListener = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<SubscriptionId, (String, ChangeListener)>,
}

impl Registry {
    fn listeners_for(&self, key: &str) -> Vec<ChangeListener> {
        self.listeners
            .values()
            .filter(|(subscribed_key, _)| subscribed_key == key)
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }
}

enum Dispatch {
    Changed(String),
    Flush(oneshot::Sender<()>),
}

/// Listener registry plus a dedicated dispatch thread.
///
/// `notify` only enqueues; listeners run on the `settings-watchers` thread,
/// one notification at a time, in the order the writes happened. The thread
/// exits once the owning `Watchers` is dropped.
pub struct Watchers {
    registry: Arc<Mutex<Registry>>,
    sender: mpsc::UnboundedSender<Dispatch>,
}

impl Watchers {
    pub fn new() -> std::io::Result<Self> {
        let registry = Arc::new(Mutex::new(Registry::default()));
        let (sender, receiver) = mpsc::unbounded_channel();

        let dispatch_registry = Arc::clone(&registry);
        std::thread::Builder::new()
            .name("settings-watchers".into())
            .spawn(move || dispatch_loop(dispatch_registry, receiver))?;

        Ok(Self { registry, sender })
    }

    pub fn subscribe(&self, key: &str, listener: ChangeListener) -> SubscriptionId {
        let mut registry = self.registry.lock();
        registry.next_id += 1;
        let id = SubscriptionId(registry.next_id);
        registry
            .listeners
            .insert(id, (key.to_string(), listener));
        id
    }

    /// Returns whether a listener was actually removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.registry.lock().listeners.remove(&id).is_some()
    }

    /// Queue a change notification for every listener of `key`.
    pub fn notify(&self, key: &str) {
        if self.sender.send(Dispatch::Changed(key.to_string())).is_err() {
            tracing::warn!(key, "settings watcher thread is gone, dropping change notification");
        }
    }

    /// Block until every notification queued before this call has been delivered.
    ///
    /// Must not be called from inside a listener or an async context.
    pub fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.sender.send(Dispatch::Flush(done_tx)).is_ok() {
            let _ = done_rx.blocking_recv();
        }
    }
}

fn dispatch_loop(registry: Arc<Mutex<Registry>>, mut receiver: mpsc::UnboundedReceiver<Dispatch>) {
    while let Some(dispatch) = receiver.blocking_recv() {
        match dispatch {
            Dispatch::Changed(key) => {
                // Snapshot so listeners may (un)subscribe without deadlocking.
                let listeners = registry.lock().listeners_for(&key);
                tracing::trace!(%key, listeners = listeners.len(), "dispatching setting change");
                for listener in listeners {
                    listener();
                }
            }
            Dispatch::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::debug!("settings watcher dispatch stopped");
}
