//! COSE_Sign1 signing and verification (RFC 8152 / RFC 9052).
//!
//! Signatures are always ECDSA in the fixed-length `r ‖ s` form COSE requires. Keys are never
//! held here: signing goes through a [KeyCustodian](crate::custodian::KeyCustodian) and
//! verification takes a JWK.
pub mod key;
pub mod sign1;

use crate::{cbor, custodian};
use coset::iana;

pub use key::{Curve, PublicKey};
pub use sign1::{build_sig1_structure, sign, sign_detached, verify, verify_detached, CoseSign1};

/// CBOR tag number of a tagged COSE_Sign1.
pub const TAG_COSE_SIGN1: u64 = 18;

/// Trait to represent the signature algorithm of a signer or verifier.
pub trait SignatureAlgorithm {
    fn algorithm(&self) -> iana::Algorithm;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Cbor(#[from] cbor::Error),
    #[error("malformed COSE_Sign1: {0}")]
    Frame(coset::CoseError),
    #[error("invalid JWK: {0}")]
    InvalidJwk(String),
    #[error("unsupported curve '{0}'")]
    UnsupportedCurve(String),
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
    /// The custodian returned something that is neither a raw nor a DER ECDSA signature.
    #[error("invalid signature from key custodian: {0}")]
    InvalidSignature(String),
    #[error(transparent)]
    Custodian(#[from] custodian::Error),
}
