use crate::cbor;
use crate::definitions::device_key::cose_key;
use crate::definitions::helpers::{non_empty_vec, tag24};
use crate::definitions::traits::value_error;
use crate::definitions::validity_info;

/// Well-formed CBOR that does not have the shape an mdoc structure requires.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Worded like serde's own messages, so the field survives being nested in an embedded item.
    #[error("missing field `{0}`")]
    MissingField(String),
    #[error("unknown field `{0}`")]
    UnexpectedField(String),
    #[error("{0}")]
    Schema(String),
    #[error("field '{field}' must be {expected}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("field '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error(transparent)]
    Empty(#[from] non_empty_vec::Error),
    #[error(transparent)]
    Tag24(#[from] tag24::Error),
    #[error("embedded CBOR: {0}")]
    Cbor(#[from] cbor::Error),
    #[error("'{field}' is not a COSE_Sign1: {reason}")]
    Cose { field: &'static str, reason: String },
    #[error("digest for '{namespace}/{element_identifier}' (digestID {digest_id}) does not match the issuer's")]
    DigestMismatch {
        namespace: String,
        element_identifier: String,
        digest_id: u32,
    },
    #[error("the issuer signed no digest for '{namespace}' digestID {digest_id}")]
    MissingDigest { namespace: String, digest_id: u32 },
    #[error("validityInfo: {0}")]
    ValidityInfo(#[from] validity_info::Error),
    #[error("deviceKey: {0}")]
    CoseKey(#[from] cose_key::Error),
}

impl Error {
    /// The field the error refers to, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::MissingField(field) | Error::UnexpectedField(field) => Some(field.as_str()),
            Error::InvalidType { field, .. }
            | Error::InvalidValue { field, .. }
            | Error::Cose { field, .. } => Some(*field),
            Error::DigestMismatch {
                element_identifier, ..
            } => Some(element_identifier.as_str()),
            Error::ValidityInfo(_) => Some("validityInfo"),
            Error::CoseKey(_) => Some("deviceKey"),
            Error::Schema(_)
            | Error::Empty(_)
            | Error::Tag24(_)
            | Error::Cbor(_)
            | Error::MissingDigest { .. } => None,
        }
    }
}

/// The name between the first pair of backticks after `prefix`.
fn quoted(msg: &str, prefix: &str) -> Option<String> {
    let rest = msg.strip_prefix(prefix)?.strip_prefix('`')?;
    rest.split('`').next().map(str::to_string)
}

impl From<ciborium::value::Error> for Error {
    fn from(e: ciborium::value::Error) -> Self {
        let msg = value_error(e);
        if let Some(field) = quoted(&msg, "missing field ") {
            Error::MissingField(field)
        } else if let Some(field) = quoted(&msg, "unknown field ") {
            Error::UnexpectedField(field)
        } else {
            Error::Schema(msg)
        }
    }
}
