//! Encoding of the device → bitrate map into its legacy settings string.
//!
//! The format is a list of entries, each terminated by `|`:
//!
//! ```text
//! addr=AA:BB:CC:DD:EE:FF,sbcbr=328|addr=11:22:33:44:55:66,sbcbr=229|
//! ```
//!
//! Every entry (the last one included) carries the trailing separator, so the
//! decoder ignores empty entries.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

/// Device address → bitrate.
pub type Rates = BTreeMap<String, i32>;

pub const ENTRY_SEPARATOR: char = '|';
pub const PAIR_SEPARATOR: char = ',';
pub const ADDRESS_KEY: &str = "addr";
pub const RATE_KEY: &str = "sbcbr";

/// An entry containing a pair with no `=`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{pair}' in '{entry}' is not a valid key-value pair")]
pub struct MalformedEntry {
    pub entry: String,
    pub pair: String,
}

/// Parsed `key=value,key=value` list. Keys and values are trimmed; a repeated
/// key keeps its last value. A pair without `=` (an empty one included)
/// rejects the whole list.
#[derive(Debug, Default)]
pub struct KeyValueList<'a> {
    pairs: HashMap<&'a str, &'a str>,
}

impl<'a> KeyValueList<'a> {
    pub fn parse(entry: &'a str) -> Result<Self, MalformedEntry> {
        let mut pairs = HashMap::new();
        // A trailing separator is harmless; any other empty pair is malformed.
        for pair in entry.split_terminator(PAIR_SEPARATOR) {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(MalformedEntry {
                    entry: entry.to_string(),
                    pair: pair.to_string(),
                });
            };
            pairs.insert(key.trim(), value.trim());
        }
        Ok(Self { pairs })
    }

    pub fn get_str(&self, key: &str) -> Option<&'a str> {
        self.pairs.get(key).copied()
    }

    /// Integer value of `key`, or `default` when absent or not an integer.
    pub fn get_int(&self, key: &str, default: i32) -> i32 {
        match self.get_str(key) {
            Some(value) => value.parse().unwrap_or_else(|_| {
                tracing::debug!(key, value, default, "non-integer setting value, using default");
                default
            }),
            None => default,
        }
    }
}

pub fn encode(rates: &Rates) -> String {
    let mut encoded = String::new();
    for (address, rate) in rates {
        // Writing into a String cannot fail.
        let _ = write!(
            encoded,
            "{ADDRESS_KEY}={address}{PAIR_SEPARATOR}{RATE_KEY}={rate}{ENTRY_SEPARATOR}"
        );
    }
    encoded
}

/// Decode a serialized rate list. Malformed entries are logged and dropped;
/// entries without an address are skipped; a missing or unparsable rate is 0.
pub fn decode(serialized: &str) -> Rates {
    let mut rates = Rates::new();

    for entry in serialized.split(ENTRY_SEPARATOR).filter(|entry| !entry.is_empty()) {
        let pairs = match KeyValueList::parse(entry) {
            Ok(pairs) => pairs,
            Err(error) => {
                tracing::error!(%error, "skipping malformed bitrate entry");
                continue;
            }
        };

        let Some(address) = pairs.get_str(ADDRESS_KEY).filter(|address| !address.is_empty())
        else {
            continue;
        };

        rates.insert(address.to_string(), pairs.get_int(RATE_KEY, 0));
    }

    rates
}
