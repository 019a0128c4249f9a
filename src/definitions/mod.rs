//! The mdoc data model of ISO/IEC 18013-5, and the conversions between each structure and CBOR.
pub mod device_key;
pub mod device_request;
pub mod device_response;
pub mod device_signed;
mod error;
pub mod helpers;
pub mod issuer_signed;
pub mod mso;
pub mod session;
pub mod traits;
pub mod validity_info;

#[cfg(test)]
pub(crate) mod fixture;

pub use device_key::{CoseKey, DeviceKeyInfo};
pub use device_request::{DeviceRequest, DocRequest, ItemsRequest};
pub use device_response::{decode_documents, DeviceResponse, Document, DocumentErrorCode, Status};
pub use device_signed::{DeviceAuth, DeviceAuthentication, DeviceNamespaces, DeviceSigned};
pub use error::Error;
pub use issuer_signed::{IssuerNamespaces, IssuerSigned, IssuerSignedItem, IssuerSignedItemBytes};
pub use mso::{DigestAlgorithm, DigestId, Mso};
pub use session::{Handover, NfcHandover, OID4VPHandover, SessionTranscript};
pub use validity_info::ValidityInfo;
