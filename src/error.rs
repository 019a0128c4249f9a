//! Errors surfaced to callers of the public API.
//!
//! Every error carries a stable [ErrorCode], a human-readable message and, where it applies, the
//! index, field or document type it relates to.
use crate::{cbor, cose, custodian, definitions, encoding, presentation};
use serde::Serialize;
use strum_macros::{AsRefStr, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString, Serialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bytes that are not CBOR, or CBOR that is truncated or carries trailing data.
    MalformedInput,
    /// Well-formed input of the wrong shape.
    SchemaViolation,
    KeyNotFound,
    SigningFailed,
    /// Text that is neither base64url nor base64.
    InvalidEncoding,
    /// A requested document could not be parsed.
    DocumentParsingError,
    TranscriptError,
    /// An operation was invoked on a component in the wrong state.
    InvalidState,
}

/// Where in the input an error was found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("{}: {}", .code.as_ref(), .message)]
pub struct Error {
    code: ErrorCode,
    message: String,
    context: ErrorContext,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.context.index = Some(index);
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    pub fn with_doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.context.doc_type = Some(doc_type.into());
        self
    }

    /// A JSON object with `code`, `message` and `context`, for hosts that forward errors as data.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.code.as_ref(),
            "message": self.message,
            "context": self.context,
        })
    }
}

impl From<encoding::InvalidEncoding> for Error {
    fn from(e: encoding::InvalidEncoding) -> Self {
        Error::new(ErrorCode::InvalidEncoding, e.to_string())
    }
}

impl From<cbor::Error> for Error {
    fn from(e: cbor::Error) -> Self {
        let code = match e {
            cbor::Error::EncodeFailed(_) => ErrorCode::SchemaViolation,
            _ => ErrorCode::MalformedInput,
        };
        Error::new(code, e.to_string())
    }
}

impl From<definitions::Error> for Error {
    fn from(e: definitions::Error) -> Self {
        if let definitions::Error::Cbor(e) = e {
            return e.into();
        }
        let field = e.field().map(str::to_string);
        let err = Error::new(ErrorCode::SchemaViolation, e.to_string());
        match field {
            Some(field) => err.with_field(field),
            None => err,
        }
    }
}

impl From<definitions::session::Error> for Error {
    fn from(e: definitions::session::Error) -> Self {
        Error::new(ErrorCode::TranscriptError, e.to_string())
    }
}

impl From<custodian::Error> for Error {
    fn from(e: custodian::Error) -> Self {
        let code = match e {
            custodian::Error::KeyNotFound(_) => ErrorCode::KeyNotFound,
            _ => ErrorCode::SigningFailed,
        };
        Error::new(code, e.to_string())
    }
}

impl From<cose::Error> for Error {
    fn from(e: cose::Error) -> Self {
        match e {
            cose::Error::Custodian(e) => e.into(),
            cose::Error::Cbor(e) => e.into(),
            e @ (cose::Error::InvalidSignature(_) | cose::Error::UnsupportedAlgorithm(_)) => {
                Error::new(ErrorCode::SigningFailed, e.to_string())
            }
            e => Error::new(ErrorCode::SchemaViolation, e.to_string()),
        }
    }
}

impl From<presentation::Error> for Error {
    fn from(e: presentation::Error) -> Self {
        e.into_api_error()
    }
}
