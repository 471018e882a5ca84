//! String-valued settings registry with per-key change notifications.

pub mod memory;
pub mod store;
pub mod watchers;

pub use memory::MemorySettings;
pub use store::SettingsStore;
pub use watchers::{ChangeListener, SubscriptionId, Watchers};

use crate::error::SettingsError;

/// A key/value settings registry that can notify subscribers when a key changes.
///
/// Implementations must never invoke listeners from inside `put`. Delivery
/// happens on a separate dispatch thread, so callers may hold their own locks
/// across a write.
pub trait SettingsBackend: Send + Sync {
    /// Read a setting. `None` means the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError>;

    /// Write a setting and schedule a change notification for its subscribers.
    fn put(&self, key: &str, value: &str) -> Result<(), SettingsError>;

    /// Register a listener invoked (with no payload) whenever `key` is written.
    fn subscribe(
        &self,
        key: &str,
        listener: ChangeListener,
    ) -> Result<SubscriptionId, SettingsError>;

    /// Remove a listener. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}
