//! Per-device SBC bitrates persisted in a single string-valued setting.

pub mod codec;
pub mod store;

pub use codec::{Rates, decode, encode};
pub use store::DeviceRateStore;
