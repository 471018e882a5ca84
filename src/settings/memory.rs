//! In-process settings registry with fault injection.

use crate::error::{Result, SettingsError};
use crate::settings::{ChangeListener, SettingsBackend, SubscriptionId, Watchers};

use anyhow::Context as _;
use parking_lot::Mutex;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Volatile settings backend. Notifies subscribers exactly like `SettingsStore`,
/// and can be told to fail reads, writes or subscriptions.
pub struct MemorySettings {
    values: Mutex<HashMap<String, String>>,
    watchers: Watchers,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reject_subscriptions: AtomicBool,
}

impl MemorySettings {
    pub fn new() -> Result<Self> {
        let watchers = Watchers::new().context("failed to start settings watcher thread")?;
        Ok(Self {
            values: Mutex::new(HashMap::new()),
            watchers,
            writes: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            reject_subscriptions: AtomicBool::new(false),
        })
    }

    /// Number of successful `put` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_reject_subscriptions(&self, reject: bool) {
        self.reject_subscriptions.store(reject, Ordering::SeqCst);
    }

    /// Block until all pending change notifications have been delivered.
    pub fn flush_notifications(&self) {
        self.watchers.flush();
    }
}

impl SettingsBackend for MemorySettings {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, SettingsError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SettingsError::Unavailable(format!("read of '{key}' rejected")));
        }
        Ok(self.values.lock().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> std::result::Result<(), SettingsError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SettingsError::Unavailable(format!("write of '{key}' rejected")));
        }
        self.values.lock().insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.watchers.notify(key);
        Ok(())
    }

    fn subscribe(
        &self,
        key: &str,
        listener: ChangeListener,
    ) -> std::result::Result<SubscriptionId, SettingsError> {
        if self.reject_subscriptions.load(Ordering::SeqCst) {
            return Err(SettingsError::Unavailable(format!(
                "change notifications for '{key}' are not supported"
            )));
        }
        Ok(self.watchers.subscribe(key, listener))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.watchers.unsubscribe(id);
    }
}
