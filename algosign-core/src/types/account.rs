use super::Address;
use serde::{Deserialize, Serialize};

/// A Ledger device paired with the app over Bluetooth LE
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerDevice {
    /// Name advertised by the device, e.g. `Nano X 1A2B`
    pub name: String,
    /// The device's BLE address
    pub bluetooth_address: String,
}

impl LedgerDevice {
    pub fn new(name: impl Into<String>, bluetooth_address: impl Into<String>) -> Self {
        Self { name: name.into(), bluetooth_address: bluetooth_address.into() }
    }
}

/// Where a hardware-backed account lives
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerDetail {
    pub device: LedgerDevice,
    /// Index of the account in the Algorand app, i.e. `m/44'/283'/{index}'/0/0`
    pub account_index: u32,
}

/// How an account authorizes its transactions
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthorizationType {
    /// The private key is stored in the app
    Standard,
    /// The key never leaves a Ledger device
    Ledger(LedgerDetail),
    /// The account was rekeyed, transactions are signed by `auth_address`
    Rekeyed {
        #[serde(rename = "authAddress")]
        auth_address: Address,
    },
    /// Tracked by address only, cannot sign
    Watch,
}

/// An account known to the wallet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub address: Address,
    #[serde(default)]
    pub name: String,
    pub authorization: AuthorizationType,
}

impl Account {
    pub fn standard(address: Address, name: impl Into<String>) -> Self {
        Self { address, name: name.into(), authorization: AuthorizationType::Standard }
    }

    pub fn ledger(address: Address, name: impl Into<String>, detail: LedgerDetail) -> Self {
        Self { address, name: name.into(), authorization: AuthorizationType::Ledger(detail) }
    }

    pub fn rekeyed(address: Address, name: impl Into<String>, auth_address: Address) -> Self {
        Self {
            address,
            name: name.into(),
            authorization: AuthorizationType::Rekeyed { auth_address },
        }
    }

    pub fn watch(address: Address, name: impl Into<String>) -> Self {
        Self { address, name: name.into(), authorization: AuthorizationType::Watch }
    }

    /// Returns false for watch accounts, which have no signing capability at all
    pub fn can_sign(&self) -> bool {
        !matches!(self.authorization, AuthorizationType::Watch)
    }

    pub fn is_ledger(&self) -> bool {
        matches!(self.authorization, AuthorizationType::Ledger(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_ledger_account() {
        let json = r#"{
            "address": "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ",
            "name": "Cold",
            "authorization": {
                "type": "ledger",
                "device": { "name": "Nano X", "bluetoothAddress": "C4:5E:00:11:22:33" },
                "accountIndex": 2
            }
        }"#;
        let account: Account = serde_json::from_str(json).unwrap();
        assert!(account.is_ledger());
        assert!(account.can_sign());
        match account.authorization {
            AuthorizationType::Ledger(detail) => {
                assert_eq!(detail.account_index, 2);
                assert_eq!(detail.device.bluetooth_address, "C4:5E:00:11:22:33");
            }
            other => panic!("unexpected authorization {other:?}"),
        }
    }

    #[test]
    fn watch_accounts_cannot_sign() {
        let account = Account::watch(Address::default(), "");
        assert!(!account.can_sign());
        assert!(!account.is_ledger());
    }
}
