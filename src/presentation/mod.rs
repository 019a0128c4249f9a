//! Holder-side presentment: from stored documents, a session transcript and the holder's
//! consent to a signed DeviceResponse.
pub mod oid4vp;
pub mod reader;
pub mod request;
pub mod response;

pub use request::{AcceptedFields, RequestedDocument};
pub use response::{create_response, ResponseGenerator, State};

use crate::definitions::session;
use crate::error::{Error as ApiError, ErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input that does not have the shape of a presentation request.
    #[error("invalid {field}: {reason}")]
    InvalidRequest { field: String, reason: String },
    /// A requested document is missing, mistyped or cannot be decoded.
    #[error("document {index}: {reason}")]
    DocumentParsing {
        index: usize,
        field: Option<&'static str>,
        reason: String,
    },
    /// Processing a specific document failed after it was parsed.
    #[error("document {index} ({doc_type}): {source}")]
    Document {
        index: usize,
        doc_type: String,
        source: Box<ApiError>,
    },
    #[error(transparent)]
    Transcript(#[from] session::Error),
    #[error("cannot {operation} in state {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
    #[error(transparent)]
    Other(Box<ApiError>),
}

impl Error {
    pub(crate) fn document(index: usize, doc_type: &str, source: impl Into<ApiError>) -> Self {
        Error::Document {
            index,
            doc_type: doc_type.to_string(),
            source: Box::new(source.into()),
        }
    }

    pub(crate) fn parsing(index: usize, field: Option<&'static str>, reason: impl ToString) -> Self {
        Error::DocumentParsing {
            index,
            field,
            reason: reason.to_string(),
        }
    }

    /// Flatten into the caller-facing error, keeping the document context.
    pub fn into_api_error(self) -> ApiError {
        match self {
            Error::InvalidRequest { field, reason } => {
                ApiError::new(ErrorCode::SchemaViolation, reason).with_field(field)
            }
            Error::DocumentParsing {
                index,
                field,
                reason,
            } => {
                let err = ApiError::new(ErrorCode::DocumentParsingError, reason).with_index(index);
                match field {
                    Some(field) => err.with_field(field),
                    None => err,
                }
            }
            Error::Document {
                index,
                doc_type,
                source,
            } => (*source).with_index(index).with_doc_type(doc_type),
            Error::Transcript(e) => e.into(),
            e @ Error::InvalidState { .. } => ApiError::new(ErrorCode::InvalidState, e.to_string()),
            Error::Other(e) => *e,
        }
    }
}

impl From<crate::cbor::Error> for Error {
    fn from(e: crate::cbor::Error) -> Self {
        Error::Other(Box::new(e.into()))
    }
}
