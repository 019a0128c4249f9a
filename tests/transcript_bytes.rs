use anyhow::{Context, Result};
use hex::FromHex;

use isomdl_holder::cbor::{self, Value};
use isomdl_holder::config::ResponseConfig;
use isomdl_holder::cose::PublicKey;
use isomdl_holder::definitions::traits::{FromCbor, ToCbor};
use isomdl_holder::definitions::{DeviceAuth, DeviceResponse};
use isomdl_holder::presentation::{create_response, reader, AcceptedFields, RequestedDocument};

mod common;

use common::{DOC_TYPE, NAMESPACE};

/// A transcript as some readers send it: `[_ null, null, [h'00']]`, indefinite-length outer array.
const INDEFINITE_TRANSCRIPT: &str = "9ff6f6814100ff";

/// `#6.24(bstr .cbor ["DeviceAuthentication", transcript, docType, nameSpacesBytes])`, with the
/// transcript copied in byte for byte.
fn device_authentication_bytes(
    transcript: &[u8],
    doc_type: &str,
    namespaces_bytes: &[u8],
) -> Result<Vec<u8>> {
    let mut array = vec![0x84];
    array.extend(cbor::encode(&Value::Text("DeviceAuthentication".into()))?);
    array.extend_from_slice(transcript);
    array.extend(cbor::encode(&Value::Text(doc_type.into()))?);
    array.extend_from_slice(namespaces_bytes);
    Ok(cbor::encode(&cbor::tag24(array))?)
}

#[test]
fn device_signature_covers_the_transcript_as_received() -> Result<()> {
    let wallet = common::issue_mdl()?;
    let transcript = <Vec<u8>>::from_hex(INDEFINITE_TRANSCRIPT)?;
    assert_ne!(cbor::encode(&cbor::decode(&transcript)?)?, transcript);

    let response = create_response(
        &wallet.custodian,
        &[RequestedDocument::new(
            wallet.issuer_signed.clone().to_cbor_bytes()?,
            common::DEVICE_ALIAS,
            DOC_TYPE,
        )],
        &AcceptedFields::new().accept(DOC_TYPE, NAMESPACE, "family_name"),
        &transcript,
        &ResponseConfig::default(),
    )
    .map_err(|e| e.into_api_error())
    .context("could not create a response")?;

    let response = DeviceResponse::from_cbor_bytes(&response)?;
    let document = &response.documents()[0];
    let device_signed = document
        .device_signed
        .as_ref()
        .context("response has no deviceSigned")?;
    let DeviceAuth::DeviceSignature(signature) = &device_signed.device_auth else {
        anyhow::bail!("expected a deviceSignature");
    };

    // A verifier that splices the transcript bytes itself.
    let payload =
        device_authentication_bytes(&transcript, DOC_TYPE, &device_signed.namespaces.to_cbor_bytes()?)?;
    let device_key = PublicKey::try_from(&wallet.device_jwk)?;
    assert!(signature.sign1().verify(&device_key, Some(&payload)));

    // The crate's own reader agrees, and does not accept the canonical form instead.
    assert!(reader::verify_device_auth(document, &transcript)?);
    let canonical = cbor::encode(&cbor::decode(&transcript)?)?;
    assert!(!reader::verify_device_auth(document, &canonical)?);
    Ok(())
}
