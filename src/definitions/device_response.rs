use crate::cbor;
use crate::definitions::{
    helpers::NonEmptyVec,
    traits::{FromCbor, ToCbor},
    DeviceSigned, Error, IssuerSigned,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::collections::BTreeMap;
use strum_macros::{AsRefStr, EnumString, EnumVariantNames};

/// Represents a device response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    /// The version of the response.
    pub version: String,

    /// The documents associated with the response, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<Documents>,

    /// The errors associated with the documents, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_errors: Option<DocumentErrors>,

    /// The status of the response.
    pub status: Status,
}

pub type Documents = NonEmptyVec<Document>;

/// Represents a document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub doc_type: String,
    pub issuer_signed: IssuerSigned,
    /// Absent on documents a holder keeps in storage; always set in a response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_signed: Option<DeviceSigned>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Errors>,
}

/// Errors mapped by namespace and element identifier.
pub type Errors = BTreeMap<String, BTreeMap<String, DocumentErrorCode>>;
/// A list of document errors.
pub type DocumentErrors = Vec<DocumentError>;
/// A map of document type to document error for them.
pub type DocumentError = BTreeMap<String, DocumentErrorCode>;

/// Document specific errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i128", into = "i128")]
pub enum DocumentErrorCode {
    DataNotReturned,
    ApplicationSpecific(i128),
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, EnumString, EnumVariantNames, AsRefStr,
)]
#[serde(try_from = "u64", into = "u64")]
pub enum Status {
    OK,
    GeneralError,
    CborDecodingError,
    CborValidationError,
}

impl DeviceResponse {
    pub const VERSION: &'static str = "1.0";

    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            version: Self::VERSION.to_string(),
            documents: NonEmptyVec::maybe_new(documents),
            document_errors: None,
            status: Status::OK,
        }
    }

    pub fn documents(&self) -> &[Document] {
        self.documents.as_deref().unwrap_or_default()
    }
}

impl Document {
    pub fn to_json(&self, separate_element_identifier: bool) -> JsonValue {
        let mut rendered = json!({
            "docType": self.doc_type,
            "issuerSigned": self.issuer_signed.to_json(separate_element_identifier),
        });
        if let Some(errors) = &self.errors {
            rendered["errors"] = errors
                .to_cbor()
                .map(|errors| cbor::to_json(&errors))
                .unwrap_or(JsonValue::Null);
        }
        rendered
    }
}

/// The `documents` of any top-level map, such as a DeviceResponse or a holder's document store.
#[derive(Deserialize)]
struct DocumentStore {
    documents: Vec<Document>,
}

/// Decode the `documents` array of a top-level map.
pub fn decode_documents(bytes: &[u8]) -> Result<Vec<Document>, Error> {
    DocumentStore::from_cbor_bytes(bytes).map(|store| store.documents)
}

impl From<DocumentErrorCode> for i128 {
    fn from(c: DocumentErrorCode) -> i128 {
        match c {
            DocumentErrorCode::DataNotReturned => 0,
            DocumentErrorCode::ApplicationSpecific(i) => i,
        }
    }
}

impl From<i128> for DocumentErrorCode {
    fn from(value: i128) -> Self {
        match value {
            0 => DocumentErrorCode::DataNotReturned,
            _ => DocumentErrorCode::ApplicationSpecific(value),
        }
    }
}

impl From<Status> for u64 {
    fn from(s: Status) -> u64 {
        match s {
            Status::OK => 0,
            Status::GeneralError => 10,
            Status::CborDecodingError => 11,
            Status::CborValidationError => 12,
        }
    }
}

impl TryFrom<u64> for Status {
    type Error = Error;

    fn try_from(n: u64) -> Result<Status, Error> {
        match n {
            0 => Ok(Status::OK),
            10 => Ok(Status::GeneralError),
            11 => Ok(Status::CborDecodingError),
            12 => Ok(Status::CborValidationError),
            _ => Err(Error::InvalidValue {
                field: "status",
                reason: format!("unrecognised status code: {n}"),
            }),
        }
    }
}
