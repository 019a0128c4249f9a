//! The host-facing surface: base64 or base64url text in, JSON or standard base64 out.
//!
//! Every function here reports failures as [Error], with a stable code a host can branch on.
use crate::cbor;
use crate::config::ResponseConfig;
use crate::cose;
use crate::custodian::KeyCustodian;
use crate::definitions::{self, traits::FromCbor, DeviceRequest, IssuerSigned};
use crate::encoding::{decode_flexible, encode_standard};
use crate::error::{Error, ErrorCode, Result};
use crate::presentation::{self, oid4vp, AcceptedFields, RequestedDocument};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use ssi_jwk::JWK;

/// The result of [generate_oid4vp_device_response].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Oid4vpDeviceResponse {
    /// Standard base64 of the encoded DeviceResponse.
    pub device_response: String,
    pub mdoc_generated_nonce: String,
}

/// Decode any CBOR item into its JSON rendering.
pub fn decode_cbor(data: &str) -> Result<JsonValue> {
    let value = cbor::decode(&decode_flexible(data)?)?;
    Ok(cbor::to_json(&value))
}

/// Decode the `documents` of a DeviceResponse or document store into `{"documents": [..]}`.
pub fn decode_documents(data: &str, separate_element_identifier: bool) -> Result<JsonValue> {
    let documents = definitions::decode_documents(&decode_flexible(data)?)?;
    let documents = documents
        .iter()
        .map(|document| document.to_json(separate_element_identifier))
        .collect::<Vec<_>>();
    Ok(json!({ "documents": documents }))
}

pub fn decode_issuer_signed(data: &str) -> Result<JsonValue> {
    let issuer_signed = IssuerSigned::from_cbor_bytes(&decode_flexible(data)?)?;
    Ok(issuer_signed.to_json(true))
}

/// Check every item of an IssuerSigned against the digests in its MSO.
pub fn validate_issuer_digests(data: &str) -> Result<()> {
    let issuer_signed = IssuerSigned::from_cbor_bytes(&decode_flexible(data)?)?;
    Ok(issuer_signed.validate_digests()?)
}

/// Sign `payload` into a COSE_Sign1 with the key under `alias`, returned as standard base64.
pub fn sign(custodian: &dyn KeyCustodian, payload: &str, alias: &str) -> Result<String> {
    let sign1 = cose::sign(custodian, alias, decode_flexible(payload)?)?;
    Ok(encode_standard(&sign1.to_vec()?))
}

/// Verify a COSE_Sign1 against a public JWK. A signature that does not match is `Ok(false)`.
pub fn verify(sign1: &str, jwk: &JsonValue) -> Result<bool> {
    let jwk: JWK = serde_json::from_value(jwk.clone()).map_err(|e| {
        Error::new(ErrorCode::SchemaViolation, format!("invalid JWK: {e}")).with_field("jwk")
    })?;
    Ok(cose::verify(&jwk, &decode_flexible(sign1)?)?)
}

/// Build a DeviceResponse from the host's documents and consent.
///
/// `documents` is an array of `{issuerSignedContent, alias, docType}` and `accepted_fields` is
/// `{docType: {namespace: {elementIdentifier: bool}}}`.
pub fn generate_response(
    custodian: &dyn KeyCustodian,
    documents: &JsonValue,
    accepted_fields: &JsonValue,
    session_transcript: &str,
    config: &ResponseConfig,
) -> Result<String> {
    let documents = RequestedDocument::list_from_json(documents)?;
    let accepted = AcceptedFields::from_json(accepted_fields)?;
    let transcript = decode_flexible(session_transcript).map_err(|e| {
        Error::new(ErrorCode::InvalidEncoding, e.to_string()).with_field("sessionTranscript")
    })?;
    let response =
        presentation::create_response(custodian, &documents, &accepted, &transcript, config)?;
    Ok(encode_standard(&response))
}

/// Build a DeviceResponse for an OpenID4VP verifier.
#[allow(clippy::too_many_arguments)]
pub fn generate_oid4vp_device_response(
    custodian: &dyn KeyCustodian,
    client_id: &str,
    response_uri: &str,
    nonce: &str,
    mdoc_generated_nonce: Option<&str>,
    documents: &JsonValue,
    accepted_fields: &JsonValue,
    config: &ResponseConfig,
) -> Result<Oid4vpDeviceResponse> {
    let documents = RequestedDocument::list_from_json(documents)?;
    let accepted = AcceptedFields::from_json(accepted_fields)?;
    let response = oid4vp::create_oid4vp_response(
        custodian,
        client_id,
        response_uri,
        nonce,
        mdoc_generated_nonce,
        &documents,
        &accepted,
        config,
    )?;
    Ok(Oid4vpDeviceResponse {
        device_response: encode_standard(&response.device_response),
        mdoc_generated_nonce: response.mdoc_generated_nonce,
    })
}

/// Decode a DeviceRequest into `{"request": {docType: {namespace: {element: intentToRetain}}}}`.
pub fn decode_device_request(data: &str) -> Result<JsonValue> {
    Ok(DeviceRequest::from_bytes(&decode_flexible(data)?)?.to_request_json())
}
