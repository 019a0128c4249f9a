//! Presentment over OpenID4VP (ISO/IEC 18013-7 Annex B).
use super::{create_response, AcceptedFields, Error, RequestedDocument};
use crate::config::ResponseConfig;
use crate::custodian::KeyCustodian;
use crate::definitions::session;
use crate::encoding;
use rand::{rngs::OsRng, RngCore};

/// A DeviceResponse for a verifier, and the nonce the device minted for it.
///
/// The wallet has to return `mdoc_generated_nonce` to the verifier (as the `apu` of the
/// encrypted authorization response) or the verifier cannot rebuild the transcript.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Oid4vpResponse {
    pub device_response: Vec<u8>,
    pub mdoc_generated_nonce: String,
}

/// `len` bytes from the OS RNG, base64url without padding.
pub fn generate_mdoc_nonce(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    encoding::encode_url_safe(&bytes)
}

#[allow(clippy::too_many_arguments)]
pub fn create_oid4vp_response(
    custodian: &dyn KeyCustodian,
    client_id: &str,
    response_uri: &str,
    nonce: &str,
    mdoc_generated_nonce: Option<&str>,
    documents: &[RequestedDocument],
    accepted: &AcceptedFields,
    config: &ResponseConfig,
) -> Result<Oid4vpResponse, Error> {
    let mdoc_generated_nonce = match mdoc_generated_nonce {
        Some(nonce) => nonce.to_string(),
        None => {
            config.validate().map_err(|e| Error::InvalidRequest {
                field: "mdoc_generated_nonce_len".to_string(),
                reason: e.to_string(),
            })?;
            generate_mdoc_nonce(config.mdoc_generated_nonce_len)
        }
    };
    let transcript =
        session::build_oid4vp_transcript(client_id, response_uri, nonce, &mdoc_generated_nonce)?;
    let device_response = create_response(custodian, documents, accepted, &transcript, config)?;
    Ok(Oid4vpResponse {
        device_response,
        mdoc_generated_nonce,
    })
}
