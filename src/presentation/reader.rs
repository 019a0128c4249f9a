//! The reader side of device authentication, used to check what the generator produced and by
//! hosts that also act as verifiers.
use crate::cbor;
use crate::cose::PublicKey;
use crate::definitions::{self, DeviceAuthentication, Document};
use crate::error::{Error, ErrorCode};
use ssi_jwk::JWK;

/// Verify the device signature of `document` against the device key its MSO binds.
///
/// Issuer trust is a separate question: call
/// [IssuerSigned::verify_issuer_auth](crate::definitions::IssuerSigned::verify_issuer_auth)
/// for that.
pub fn verify_device_auth(document: &Document, session_transcript: &[u8]) -> Result<bool, Error> {
    let mso = document.issuer_signed.mso()?;
    let jwk = JWK::try_from(mso.device_key_info.device_key).map_err(definitions::Error::from)?;
    let key = PublicKey::try_from(&jwk)?;
    verify_device_auth_with_key(document, session_transcript, &key)
}

/// The transcript is used exactly as given, so a non-canonical encoding verifies only when the
/// device signed the same bytes.
pub fn verify_device_auth_with_key(
    document: &Document,
    session_transcript: &[u8],
    key: &PublicKey,
) -> Result<bool, Error> {
    let device_signed = document.device_signed.as_ref().ok_or_else(|| {
        Error::new(ErrorCode::SchemaViolation, "document has no deviceSigned")
            .with_field("deviceSigned")
            .with_doc_type(document.doc_type.clone())
    })?;
    let Some(signature) = device_signed.device_auth.device_signature() else {
        tracing::debug!("deviceMac cannot be checked without session keys");
        return Ok(false);
    };
    cbor::from_slice(session_transcript).map_err(|e| {
        Error::new(ErrorCode::TranscriptError, format!("session transcript is not CBOR: {e}"))
    })?;
    let payload = DeviceAuthentication::new(
        session_transcript.to_vec(),
        document.doc_type.clone(),
        device_signed.namespaces.clone(),
    )
    .to_tagged_bytes()?;
    Ok(signature.sign1().verify(key, Some(&payload)))
}
