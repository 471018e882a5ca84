//! Lock-protected cache of per-device bitrates over one settings key.

use crate::bitrate::codec::{self, Rates};
use crate::device::{DeviceIdentity, validate_address};
use crate::error::Result;
use crate::settings::{ChangeListener, SettingsBackend, SubscriptionId};

use parking_lot::Mutex;

use std::sync::Arc;

enum CacheState {
    /// Must be reloaded from the settings backend before use.
    Unloaded,
    Loaded(Arc<Rates>),
}

struct RateCache {
    state: CacheState,
    /// Raw setting value the loaded map corresponds to.
    last_seen: Option<String>,
}

/// Device address → SBC bitrate, persisted as a single string setting.
///
/// All reads, reloads and writes go through one lock. Local writes are written
/// through to the backend immediately; external writes arrive through the
/// change listener registered by [`DeviceRateStore::init`].
pub struct DeviceRateStore {
    settings: Arc<dyn SettingsBackend>,
    key: String,
    cache: Mutex<RateCache>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl std::fmt::Debug for DeviceRateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRateStore")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl DeviceRateStore {
    pub fn new(settings: Arc<dyn SettingsBackend>, key: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            settings,
            key: key.into(),
            cache: Mutex::new(RateCache {
                state: CacheState::Unloaded,
                last_seen: None,
            }),
            subscription: Mutex::new(None),
        })
    }

    /// Subscribe to external changes of the key and load the current value.
    ///
    /// Neither step is fatal: without a subscription the store simply never
    /// sees external writes, and a failed load is retried on next access.
    pub fn init(self: &Arc<Self>) {
        let store = Arc::downgrade(self);
        let listener: ChangeListener = Arc::new(move || {
            let Some(store) = store.upgrade() else {
                return;
            };
            if let Err(error) = store.on_external_change() {
                tracing::warn!(%error, key = %store.key, "failed to reload bitrates after external change");
            }
        });

        match self.settings.subscribe(&self.key, listener) {
            Ok(id) => {
                if let Some(previous) = self.subscription.lock().replace(id) {
                    self.settings.unsubscribe(previous);
                }
            }
            Err(error) => {
                tracing::debug!(%error, key = %self.key, "change notifications unavailable");
            }
        }

        let mut cache = self.cache.lock();
        if let Err(error) = self.reload_locked(&mut cache) {
            tracing::warn!(%error, key = %self.key, "initial bitrate load failed");
        }
    }

    /// Drop the change subscription. Safe to call repeatedly or before `init`.
    pub fn close(&self) {
        if let Some(id) = self.subscription.lock().take() {
            self.settings.unsubscribe(id);
            tracing::debug!(key = %self.key, "stopped watching bitrate setting");
        }
    }

    /// Clear every stored bitrate.
    pub fn factory_reset(&self) -> Result<()> {
        let mut cache = self.cache.lock();
        self.settings.put(&self.key, "")?;
        cache.state = CacheState::Loaded(Arc::new(Rates::new()));
        cache.last_seen = Some(String::new());

        tracing::info!(key = %self.key, "SBC bitrates reset");
        Ok(())
    }

    /// Set the bitrate for `device`. Returns `false` if it was already `rate`.
    ///
    /// The cache only changes once the backend write succeeded.
    pub fn set_rate<D: DeviceIdentity + ?Sized>(&self, device: &D, rate: i32) -> Result<bool> {
        let address = device.address();
        validate_address(address)?;

        let mut cache = self.cache.lock();
        let current = self.rates_locked(&mut cache)?;
        if current.get(address) == Some(&rate) {
            return Ok(false);
        }

        let mut updated = Rates::clone(&current);
        updated.insert(address.to_string(), rate);
        let encoded = codec::encode(&updated);

        if cache.last_seen.as_deref() != Some(encoded.as_str()) {
            self.settings.put(&self.key, &encoded)?;
        }
        cache.state = CacheState::Loaded(Arc::new(updated));
        cache.last_seen = Some(encoded);

        tracing::info!(device = %address, rate, "SBC bitrate set");
        Ok(true)
    }

    /// Bitrate stored for `device`, or 0 when none is set.
    pub fn get_rate<D: DeviceIdentity + ?Sized>(&self, device: &D) -> Result<i32> {
        let address = device.address();
        let rates = {
            let mut cache = self.cache.lock();
            self.rates_locked(&mut cache)?
        };

        match rates.get(address) {
            Some(&rate) => {
                tracing::info!(device = %address, rate, "SBC bitrate");
                Ok(rate)
            }
            None => {
                tracing::info!(device = %address, "SBC bitrate is not set");
                Ok(0)
            }
        }
    }

    /// Current map of all bitrates, loading it first if necessary.
    pub fn snapshot(&self) -> Result<Arc<Rates>> {
        let mut cache = self.cache.lock();
        self.rates_locked(&mut cache)
    }

    /// Re-read the setting after it changed outside this store.
    ///
    /// Decoding is skipped when the raw value matches the one already loaded.
    pub fn on_external_change(&self) -> Result<()> {
        let mut cache = self.cache.lock();
        self.reload_locked(&mut cache)?;
        Ok(())
    }

    fn rates_locked(&self, cache: &mut RateCache) -> Result<Arc<Rates>> {
        if let CacheState::Loaded(rates) = &cache.state {
            return Ok(Arc::clone(rates));
        }
        self.reload_locked(cache)
    }

    fn reload_locked(&self, cache: &mut RateCache) -> Result<Arc<Rates>> {
        let raw = self.settings.get(&self.key)?;

        if let CacheState::Loaded(rates) = &cache.state {
            if raw == cache.last_seen {
                tracing::trace!(key = %self.key, "bitrate setting unchanged");
                return Ok(Arc::clone(rates));
            }
        }

        let rates = Arc::new(raw.as_deref().map(codec::decode).unwrap_or_default());
        tracing::debug!(key = %self.key, devices = rates.len(), "bitrates reloaded");

        cache.state = CacheState::Loaded(Arc::clone(&rates));
        cache.last_seen = raw;
        Ok(rates)
    }
}

impl Drop for DeviceRateStore {
    fn drop(&mut self) {
        self.close();
    }
}
