use super::{Curve, Error, PublicKey, SignatureAlgorithm, TAG_COSE_SIGN1};
use crate::cbor::{self, Value};
use crate::custodian::KeyCustodian;
use coset::{AsCborValue, Header, HeaderBuilder, ProtectedHeader};
use signature::Verifier;
use ssi_jwk::JWK;

/// A COSE_Sign1, remembering whether it was wrapped in tag 18 so it is re-encoded the same way.
#[derive(Clone, Debug, PartialEq)]
pub struct CoseSign1 {
    pub tagged: bool,
    pub inner: coset::CoseSign1,
}

/// Encode the `Sig_structure` for a COSE_Sign1: `["Signature1", protected, external_aad, payload]`.
pub fn build_sig1_structure(
    protected: &[u8],
    external_aad: &[u8],
    payload: &[u8],
) -> Result<Vec<u8>, cbor::Error> {
    cbor::encode(&Value::Array(vec![
        Value::Text("Signature1".to_string()),
        Value::Bytes(protected.to_vec()),
        Value::Bytes(external_aad.to_vec()),
        Value::Bytes(payload.to_vec()),
    ]))
}

/// Sign `payload` with the key held under `alias`, embedding the payload.
pub fn sign(
    custodian: &dyn KeyCustodian,
    alias: &str,
    payload: Vec<u8>,
) -> Result<CoseSign1, Error> {
    let mut sign1 = sign_detached(custodian, alias, &payload)?;
    sign1.inner.payload = Some(payload);
    Ok(sign1)
}

/// Sign `payload` with the key held under `alias`, leaving the payload out of the structure.
pub fn sign_detached(
    custodian: &dyn KeyCustodian,
    alias: &str,
    payload: &[u8],
) -> Result<CoseSign1, Error> {
    let jwk = custodian.public_key(alias)?;
    let key = PublicKey::try_from(&jwk).map_err(|e| Error::UnsupportedAlgorithm(e.to_string()))?;

    let header = HeaderBuilder::new().algorithm(key.algorithm()).build();
    let protected = encode_header(&header)?;
    let tbs = build_sig1_structure(&protected, &[], payload)?;
    let signature = custodian.sign(alias, &tbs)?;
    let signature = normalize_signature(key.curve(), &signature)?;

    let sign1 = CoseSign1::new(coset::CoseSign1 {
        protected: ProtectedHeader {
            original_data: Some(protected),
            header,
        },
        unprotected: Header::default(),
        payload: None,
        signature,
    });
    if !sign1.verify(&key, Some(payload)) {
        return Err(Error::InvalidSignature(format!(
            "signature does not match the public key of '{alias}'"
        )));
    }
    tracing::debug!(alias, alg = ?key.algorithm(), "produced COSE_Sign1 signature");
    Ok(sign1)
}

/// Verify an encoded COSE_Sign1 with an embedded payload.
///
/// `Ok(false)` covers every way a signature can fail to match, including a well-formed key on a
/// curve this crate does not implement. `Err` is reserved for input that is not a COSE_Sign1 or
/// a JWK that cannot be read.
pub fn verify(jwk: &JWK, sign1: &[u8]) -> Result<bool, Error> {
    verify_with(jwk, sign1, None)
}

/// Verify an encoded COSE_Sign1 over a payload carried separately.
pub fn verify_detached(jwk: &JWK, sign1: &[u8], payload: &[u8]) -> Result<bool, Error> {
    verify_with(jwk, sign1, Some(payload))
}

fn verify_with(jwk: &JWK, sign1: &[u8], payload: Option<&[u8]>) -> Result<bool, Error> {
    let sign1 = CoseSign1::from_slice(sign1)?;
    let key = match PublicKey::try_from(jwk) {
        Ok(key) => key,
        Err(Error::UnsupportedCurve(curve)) => {
            tracing::debug!(curve, "no verifier for curve, signature does not match");
            return Ok(false);
        }
        Err(e) => return Err(e),
    };
    Ok(sign1.verify(&key, payload))
}

/// Convert a custodian signature to `r ‖ s`. DER is tried first, then the raw form.
pub fn normalize_signature(curve: Curve, signature: &[u8]) -> Result<Vec<u8>, Error> {
    let from_der = match curve {
        Curve::P256 => p256::ecdsa::Signature::from_der(signature)
            .map(|s| s.to_bytes().to_vec())
            .ok(),
        Curve::P384 => p384::ecdsa::Signature::from_der(signature)
            .map(|s| s.to_bytes().to_vec())
            .ok(),
    };
    match from_der {
        Some(raw) => Ok(raw),
        None if signature.len() == 2 * curve.field_len() => Ok(signature.to_vec()),
        None => Err(Error::InvalidSignature(format!(
            "{} bytes is neither a DER nor a raw {} signature",
            signature.len(),
            curve.jwk_name()
        ))),
    }
}

fn encode_header(header: &Header) -> Result<Vec<u8>, Error> {
    let value = header.clone().to_cbor_value().map_err(Error::Frame)?;
    Ok(cbor::encode(&value)?)
}

impl CoseSign1 {
    pub fn new(inner: coset::CoseSign1) -> Self {
        Self {
            tagged: false,
            inner,
        }
    }

    pub fn from_value(value: Value) -> Result<Self, Error> {
        let (tagged, value) = match value {
            Value::Tag(TAG_COSE_SIGN1, inner) => (true, *inner),
            other => (false, other),
        };
        let inner = coset::CoseSign1::from_cbor_value(value).map_err(Error::Frame)?;
        Ok(Self { tagged, inner })
    }

    pub fn to_value(&self) -> Result<Value, Error> {
        let value = self.inner.clone().to_cbor_value().map_err(Error::Frame)?;
        Ok(if self.tagged {
            Value::Tag(TAG_COSE_SIGN1, Box::new(value))
        } else {
            value
        })
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        Self::from_value(cbor::from_slice(bytes)?)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, Error> {
        Ok(cbor::encode(&self.to_value()?)?)
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.inner.payload.as_deref()
    }

    /// The protected header exactly as it was received, or its encoding if built locally.
    pub fn protected_bytes(&self) -> Result<Vec<u8>, Error> {
        match &self.inner.protected.original_data {
            Some(bytes) => Ok(bytes.clone()),
            None if self.inner.protected.header.is_empty() => Ok(Vec::new()),
            None => encode_header(&self.inner.protected.header),
        }
    }

    /// The bytes the signature covers.
    pub fn signature_payload(&self, detached_payload: Option<&[u8]>) -> Result<Vec<u8>, Error> {
        let payload = detached_payload.or(self.payload()).unwrap_or_default();
        Ok(build_sig1_structure(&self.protected_bytes()?, &[], payload)?)
    }

    /// Check the signature against `key`. The algorithm is taken from the protected header only
    /// and must match the key's curve.
    pub fn verify(&self, key: &PublicKey, detached_payload: Option<&[u8]>) -> bool {
        let expected = coset::Algorithm::Assigned(key.algorithm());
        if self.inner.protected.header.alg.as_ref() != Some(&expected) {
            return false;
        }
        if detached_payload.is_none() && self.payload().is_none() {
            return false;
        }
        let signature = &self.inner.signature;
        if signature.len() != 2 * key.curve().field_len() {
            return false;
        }
        let Ok(tbs) = self.signature_payload(detached_payload) else {
            return false;
        };
        match key {
            PublicKey::P256(key) => p256::ecdsa::Signature::from_slice(signature)
                .map(|sig| key.verify(&tbs, &sig).is_ok())
                .unwrap_or(false),
            PublicKey::P384(key) => p384::ecdsa::Signature::from_slice(signature)
                .map(|sig| key.verify(&tbs, &sig).is_ok())
                .unwrap_or(false),
        }
    }
}
