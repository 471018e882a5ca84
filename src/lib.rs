//! sbc-rates: per-device SBC bitrates kept in a single string-valued setting.

pub mod bitrate;
pub mod config;
pub mod device;
pub mod error;
pub mod settings;

pub use bitrate::DeviceRateStore;
pub use device::{BluetoothAddress, DeviceIdentity};
pub use error::{Error, Result};
