//! Holder-side ISO/IEC 18013-5 and 18013-7 mdoc presentment.
//!
//! Decodes stored credentials, builds session transcripts for proximity and OpenID4VP
//! presentments, and produces selectively disclosed, device-signed DeviceResponses. Private
//! keys stay with a [custodian::KeyCustodian]; the proximity transport stays with the host
//! behind [transport::Transport].
pub mod api;
pub mod cbor;
pub mod config;
pub mod cose;
pub mod custodian;
pub mod definitions;
pub mod encoding;
pub mod error;
pub mod presentation;
pub mod transport;

pub use error::{Error, ErrorCode, ErrorContext};
