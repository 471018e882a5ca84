//! Device identity: the stable string address rates are keyed by.

use std::str::FromStr;

/// Anything that can name a device by a stable address.
pub trait DeviceIdentity {
    fn address(&self) -> &str;
}

impl DeviceIdentity for str {
    fn address(&self) -> &str {
        self
    }
}

impl DeviceIdentity for String {
    fn address(&self) -> &str {
        self.as_str()
    }
}

/// Address that cannot be stored in the serialized rate list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid device address '{address}': {reason}")]
pub struct InvalidAddress {
    pub address: String,
    pub reason: &'static str,
}

/// Check that `address` survives the `addr=<address>,sbcbr=<rate>|` encoding.
pub fn validate_address(address: &str) -> Result<(), InvalidAddress> {
    let reason = if address.is_empty() {
        "address is empty"
    } else if address.contains(['|', ',', '=']) {
        "address contains a reserved separator"
    } else if address.trim() != address {
        "address has surrounding whitespace"
    } else {
        return Ok(());
    };

    Err(InvalidAddress {
        address: address.to_string(),
        reason,
    })
}

/// Bluetooth MAC address in canonical upper-case `XX:XX:XX:XX:XX:XX` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BluetoothAddress(String);

impl FromStr for BluetoothAddress {
    type Err = InvalidAddress;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let octets: Vec<&str> = value.split(':').collect();
        let well_formed = octets.len() == 6
            && octets
                .iter()
                .all(|octet| octet.len() == 2 && octet.chars().all(|c| c.is_ascii_hexdigit()));

        if !well_formed {
            return Err(InvalidAddress {
                address: value.to_string(),
                reason: "expected six colon-separated hex octets",
            });
        }

        Ok(Self(value.to_ascii_uppercase()))
    }
}

impl std::fmt::Display for BluetoothAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl DeviceIdentity for BluetoothAddress {
    fn address(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bluetooth_address_is_normalized_to_upper_case() {
        let address: BluetoothAddress = "aa:bb:cc:dd:ee:0f".parse().expect("address should parse");

        assert_eq!(address.address(), "AA:BB:CC:DD:EE:0F");
        assert_eq!(address.to_string(), "AA:BB:CC:DD:EE:0F");
    }

    #[test]
    fn bluetooth_address_rejects_malformed_input() {
        for input in ["", "AA:BB:CC:DD:EE", "AA:BB:CC:DD:EE:GG", "AABBCCDDEEFF", "A:BB:CC:DD:EE:FF0"] {
            assert!(
                input.parse::<BluetoothAddress>().is_err(),
                "expected {input:?} to be rejected"
            );
        }
    }

    #[test]
    fn validate_address_rejects_separators() {
        assert!(validate_address("AA:BB:CC:DD:EE:FF").is_ok());
        assert!(validate_address("hci0-speaker").is_ok());

        let error = validate_address("a|b").expect_err("pipe must be rejected");
        assert!(error.to_string().contains("reserved separator"));
        assert!(validate_address("a,b").is_err());
        assert!(validate_address("a=b").is_err());
        assert!(validate_address("").is_err());
        assert!(validate_address(" padded ").is_err());
    }
}
