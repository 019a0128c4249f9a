use crate::cbor::Value;
use serde::{Deserialize, Serialize};

pub mod cose_key;
pub use cose_key::CoseKey;

/// The holder's device key as bound into the MSO.
///
/// Key authorizations and key info are carried through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceKeyInfo {
    pub device_key: CoseKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_authorizations: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_info: Option<Value>,
}

impl From<CoseKey> for DeviceKeyInfo {
    fn from(device_key: CoseKey) -> Self {
        Self {
            device_key,
            key_authorizations: None,
            key_info: None,
        }
    }
}
