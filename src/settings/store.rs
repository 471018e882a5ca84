//! Key-value settings storage (redb).

use crate::error::{Result, SettingsError};
use crate::settings::{ChangeListener, SettingsBackend, SubscriptionId, Watchers};

use anyhow::Context as _;
use redb::{Database, ReadableTable as _, TableDefinition};

use std::path::Path;
use std::sync::Arc;

const SETTINGS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("settings");

/// Durable settings store. Every committed write notifies the key's subscribers.
pub struct SettingsStore {
    db: Database,
    watchers: Watchers,
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore").finish_non_exhaustive()
    }
}

impl SettingsStore {
    /// Open (or create) the settings database at `path`.
    pub fn new(path: &Path) -> Result<Self> {
        let db = Database::create(path).map_err(|error| SettingsError::Open {
            path: path.display().to_string(),
            source: Arc::new(error.into()),
        })?;
        let watchers = Watchers::new().context("failed to start settings watcher thread")?;

        tracing::debug!(path = %path.display(), "settings store opened");
        Ok(Self { db, watchers })
    }

    /// Block until all pending change notifications have been delivered.
    pub fn flush_notifications(&self) {
        self.watchers.flush();
    }
}

impl SettingsBackend for SettingsStore {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, SettingsError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|error| SettingsError::read(key, error))?;
        let table = match read_txn.open_table(SETTINGS_TABLE) {
            Ok(table) => table,
            // Nothing has been written yet.
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(error) => return Err(SettingsError::read(key, error)),
        };
        let value = table
            .get(key)
            .map_err(|error| SettingsError::read(key, error))?;
        Ok(value.map(|guard| guard.value().to_string()))
    }

    fn put(&self, key: &str, value: &str) -> std::result::Result<(), SettingsError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|error| SettingsError::write(key, error))?;
        {
            let mut table = write_txn
                .open_table(SETTINGS_TABLE)
                .map_err(|error| SettingsError::write(key, error))?;
            table
                .insert(key, value)
                .map_err(|error| SettingsError::write(key, error))?;
        }
        write_txn
            .commit()
            .map_err(|error| SettingsError::write(key, error))?;

        self.watchers.notify(key);
        Ok(())
    }

    fn subscribe(
        &self,
        key: &str,
        listener: ChangeListener,
    ) -> std::result::Result<SubscriptionId, SettingsError> {
        Ok(self.watchers.subscribe(key, listener))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.watchers.unsubscribe(id);
    }
}
