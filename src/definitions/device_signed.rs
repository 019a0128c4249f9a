//! The device-signed part of a document: device-supplied elements and the device's
//! authentication over the session.
use crate::cbor::{self, Value};
use crate::definitions::helpers::{EmbeddedSign1, Tag24};
use crate::definitions::traits::ToCbor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Represents a device-signed structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSigned {
    #[serde(rename = "nameSpaces")]
    pub namespaces: DeviceNamespacesBytes,
    pub device_auth: DeviceAuth,
}

pub type DeviceNamespacesBytes = Tag24<DeviceNamespaces>;
pub type DeviceSignedItems = BTreeMap<String, Value>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceNamespaces(pub BTreeMap<String, DeviceSignedItems>);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceAuth {
    DeviceSignature(EmbeddedSign1),
    /// Carried through as received; MAC authentication needs session keys this crate does not
    /// derive.
    DeviceMac(Value),
}

/// `["DeviceAuthentication", SessionTranscript, DocType, DeviceNameSpacesBytes]`, the structure
/// the device signs (detached) to bind a document to the session.
///
/// The transcript is held as the encoded bytes the caller supplied. The verifier rebuilds this
/// structure from the transcript it holds, so those bytes are written into the array unchanged
/// rather than being decoded and encoded again.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceAuthentication {
    pub session_transcript: Vec<u8>,
    pub doc_type: String,
    pub namespaces_bytes: DeviceNamespacesBytes,
}

const DEVICE_AUTHENTICATION: &str = "DeviceAuthentication";
/// Initial byte of a definite-length array of four elements.
const ARRAY_OF_FOUR: u8 = 0x84;

impl DeviceAuthentication {
    pub fn new(
        session_transcript: Vec<u8>,
        doc_type: String,
        namespaces_bytes: DeviceNamespacesBytes,
    ) -> Self {
        Self {
            session_transcript,
            doc_type,
            namespaces_bytes,
        }
    }

    /// The encoded array, not yet wrapped in tag 24.
    ///
    /// Fails when the transcript is not exactly one CBOR data item.
    pub fn to_vec(&self) -> Result<Vec<u8>, cbor::Error> {
        cbor::from_slice(&self.session_transcript)?;
        let mut bytes = vec![ARRAY_OF_FOUR];
        bytes.extend(DEVICE_AUTHENTICATION.to_cbor_bytes()?);
        bytes.extend_from_slice(&self.session_transcript);
        bytes.extend(self.doc_type.to_cbor_bytes()?);
        bytes.extend(self.namespaces_bytes.to_cbor_bytes()?);
        Ok(bytes)
    }

    /// `DeviceAuthenticationBytes`, the detached payload of the device signature.
    pub fn to_tagged_bytes(&self) -> Result<Vec<u8>, cbor::Error> {
        cbor::encode(&cbor::tag24(self.to_vec()?))
    }
}

impl DeviceAuth {
    pub fn device_signature(&self) -> Option<&EmbeddedSign1> {
        match self {
            DeviceAuth::DeviceSignature(sign1) => Some(sign1),
            DeviceAuth::DeviceMac(_) => None,
        }
    }
}
