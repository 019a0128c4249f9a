//! The SessionTranscript: `[DeviceEngagementBytes, EReaderKeyBytes, Handover]`.
//!
//! The builders here produce it with the canonical encoder. A transcript received from a host is
//! signed exactly as received, see [DeviceAuthentication](super::DeviceAuthentication).
use crate::cbor::{self, Value};
use crate::definitions::{
    helpers::{tag24, Tag24},
    traits::{FromCbor, ToCbor},
};
use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;
use sha2::{Digest, Sha256};

/// An encoded DeviceEngagement, carried as `#6.24(bstr)`.
pub type DeviceEngagementBytes = Tag24<Value>;
/// An encoded EReaderKey, carried as `#6.24(bstr)`.
pub type EReaderKeyBytes = Tag24<Value>;

/// `None` in either of the first two positions encodes as null.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionTranscript(
    pub Option<DeviceEngagementBytes>,
    pub Option<EReaderKeyBytes>,
    pub Handover,
);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Handover {
    /// Engagement by QR code: null.
    Qr,
    Oid4vp(OID4VPHandover),
    /// `[HandoverSelect, HandoverRequest / null]` NDEF messages.
    Nfc(NfcHandover),
    /// Any other handover, kept as received.
    Raw(Value),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NfcHandover(
    #[serde(with = "serde_bytes")] pub Vec<u8>,
    pub Option<ByteBuf>,
);

/// `[clientIdHash, responseUriHash, nonce]` as defined by ISO/IEC 18013-7 for OpenID4VP.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(ByteBuf, ByteBuf, String)", into = "(ByteBuf, ByteBuf, String)")]
pub struct OID4VPHandover {
    pub client_id_hash: Vec<u8>,
    pub response_uri_hash: Vec<u8>,
    pub nonce: String,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{field} is not CBOR: {source}")]
    InvalidInput {
        field: &'static str,
        source: cbor::Error,
    },
    #[error("{field}: {source}")]
    Embedded {
        field: &'static str,
        source: tag24::Error,
    },
    #[error("unable to encode the session transcript: {0}")]
    Encode(cbor::Error),
    #[error("a session transcript is an array of 3 elements: {0}")]
    Malformed(String),
    #[error("'{0}' must not be empty")]
    MissingParameter(&'static str),
}

type Result<T, E = Error> = std::result::Result<T, E>;

impl From<(ByteBuf, ByteBuf, String)> for OID4VPHandover {
    fn from((client_id_hash, response_uri_hash, nonce): (ByteBuf, ByteBuf, String)) -> Self {
        Self {
            client_id_hash: client_id_hash.into_vec(),
            response_uri_hash: response_uri_hash.into_vec(),
            nonce,
        }
    }
}

impl From<OID4VPHandover> for (ByteBuf, ByteBuf, String) {
    fn from(handover: OID4VPHandover) -> Self {
        (
            ByteBuf::from(handover.client_id_hash),
            ByteBuf::from(handover.response_uri_hash),
            handover.nonce,
        )
    }
}

impl OID4VPHandover {
    /// Hash each of `client_id` and `response_uri` together with the device's nonce.
    pub fn compute(
        client_id: &str,
        response_uri: &str,
        nonce: &str,
        mdoc_generated_nonce: &str,
    ) -> Result<Self> {
        let hash = |value: &str| -> Result<Vec<u8>> {
            let bytes = (value, mdoc_generated_nonce)
                .to_cbor_bytes()
                .map_err(Error::Encode)?;
            Ok(Sha256::digest(bytes).to_vec())
        };
        Ok(Self {
            client_id_hash: hash(client_id)?,
            response_uri_hash: hash(response_uri)?,
            nonce: nonce.to_string(),
        })
    }
}

impl SessionTranscript {
    pub fn oid4vp(handover: OID4VPHandover) -> Self {
        Self(None, None, Handover::Oid4vp(handover))
    }

    pub fn device_engagement_bytes(&self) -> Option<&[u8]> {
        self.0.as_ref().map(|bytes| bytes.inner_bytes.as_slice())
    }

    pub fn e_reader_key_bytes(&self) -> Option<&[u8]> {
        self.1.as_ref().map(|bytes| bytes.inner_bytes.as_slice())
    }

    pub fn handover(&self) -> &Handover {
        &self.2
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.to_cbor_bytes().map_err(Error::Encode)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let value = cbor::decode(bytes).map_err(|source| Error::InvalidInput {
            field: "SessionTranscript",
            source,
        })?;
        Self::from_cbor(&value).map_err(|e| Error::Malformed(e.to_string()))
    }
}

/// Accept either an already wrapped `#6.24(bstr)` item or the bare encoded structure.
fn embedded(bytes: &[u8], field: &'static str) -> Result<Option<Tag24<Value>>> {
    if bytes.is_empty() {
        return Ok(None);
    }
    let value = cbor::decode(bytes).map_err(|source| Error::InvalidInput { field, source })?;
    let inner = cbor::untag24(&value).unwrap_or(bytes).to_vec();
    Tag24::from_bytes(inner)
        .map(Some)
        .map_err(|source| Error::Embedded { field, source })
}

/// Build the transcript of a proximity session from its engagement material.
///
/// Empty inputs encode as null; an empty handover is the QR handover.
pub fn build_proximity_transcript(
    device_engagement: &[u8],
    e_reader_key: &[u8],
    handover: &[u8],
) -> Result<Vec<u8>> {
    let handover = if handover.is_empty() {
        Handover::Qr
    } else {
        let value = cbor::decode(handover).map_err(|source| Error::InvalidInput {
            field: "Handover",
            source,
        })?;
        match Handover::from_cbor(&value) {
            Ok(Handover::Raw(_)) | Err(_) => Handover::Raw(value),
            Ok(handover) => handover,
        }
    };
    let transcript = SessionTranscript(
        embedded(device_engagement, "DeviceEngagement")?,
        embedded(e_reader_key, "EReaderKey")?,
        handover,
    );
    tracing::debug!(handover = ?transcript.handover(), "built proximity session transcript");
    transcript.to_bytes()
}

/// Build the OpenID4VP transcript `[null, null, [clientIdHash, responseUriHash, nonce]]`.
pub fn build_oid4vp_transcript(
    client_id: &str,
    response_uri: &str,
    nonce: &str,
    mdoc_generated_nonce: &str,
) -> Result<Vec<u8>> {
    for (name, value) in [
        ("clientId", client_id),
        ("responseUri", response_uri),
        ("nonce", nonce),
        ("mdocGeneratedNonce", mdoc_generated_nonce),
    ] {
        if value.is_empty() {
            return Err(Error::MissingParameter(name));
        }
    }
    let handover = OID4VPHandover::compute(client_id, response_uri, nonce, mdoc_generated_nonce)?;
    SessionTranscript::oid4vp(handover).to_bytes()
}

#[cfg(test)]
mod test {
    use super::*;
    use hex::FromHex;

    #[test]
    fn oid4vp_transcript_is_deterministic() {
        let a = build_oid4vp_transcript("client", "https://rp/response", "n-0S6", "mdoc-nonce")
            .unwrap();
        let b = build_oid4vp_transcript("client", "https://rp/response", "n-0S6", "mdoc-nonce")
            .unwrap();
        assert_eq!(a, b);
        // [null, null, [bstr(32), bstr(32), text]]
        assert_eq!(&a[..4], &[0x83, 0xf6, 0xf6, 0x83]);
    }

    #[test]
    fn mdoc_nonce_changes_both_hashes() {
        let a = OID4VPHandover::compute("client", "https://rp/response", "n", "one").unwrap();
        let b = OID4VPHandover::compute("client", "https://rp/response", "n", "two").unwrap();
        assert_ne!(a.client_id_hash, b.client_id_hash);
        assert_ne!(a.response_uri_hash, b.response_uri_hash);
        assert_eq!(a.nonce, b.nonce);
    }

    #[test]
    fn client_id_hash_vector() {
        // sha256(cbor(["a", "b"])) = sha256(h'82616161 62')
        let handover = OID4VPHandover::compute("a", "c", "n", "b").unwrap();
        let expected = Sha256::digest(<Vec<u8>>::from_hex("8261616162").unwrap()).to_vec();
        assert_eq!(handover.client_id_hash, expected);
    }

    #[test]
    fn proximity_wraps_engagement_once() {
        // DeviceEngagement stand-in: {0: "1.0"}
        let engagement = <Vec<u8>>::from_hex("a10063312e30").unwrap();
        let wrapped = cbor::encode(&cbor::tag24(engagement.clone())).unwrap();
        let from_bare = build_proximity_transcript(&engagement, &[], &[]).unwrap();
        let from_wrapped = build_proximity_transcript(&wrapped, &[], &[]).unwrap();
        assert_eq!(from_bare, from_wrapped);

        let transcript = SessionTranscript::from_bytes(&from_bare).unwrap();
        assert_eq!(transcript.device_engagement_bytes(), Some(engagement.as_slice()));
        assert_eq!(transcript.e_reader_key_bytes(), None);
        assert_eq!(transcript.handover(), &Handover::Qr);
        assert_eq!(transcript.to_bytes().unwrap(), from_bare);
    }

    #[test]
    fn proximity_nfc_handover() {
        let handover = cbor::encode(&Value::Array(vec![Value::Bytes(vec![0xd1]), Value::Null]))
            .unwrap();
        let bytes = build_proximity_transcript(&[0xa0], &[0xa0], &handover).unwrap();
        let transcript = SessionTranscript::from_bytes(&bytes).unwrap();
        assert_eq!(transcript.handover(), &Handover::Nfc(NfcHandover(vec![0xd1], None)));
    }

    #[test]
    fn unrecognised_handover_is_kept() {
        let handover = cbor::encode(&Value::Array(vec![Value::Text("x".into())])).unwrap();
        let bytes = build_proximity_transcript(&[], &[], &handover).unwrap();
        let transcript = SessionTranscript::from_bytes(&bytes).unwrap();
        assert_eq!(
            transcript.handover(),
            &Handover::Raw(Value::Array(vec![Value::Text("x".into())]))
        );
    }

    #[test]
    fn oid4vp_handover_layout() {
        let bytes = build_oid4vp_transcript("c", "https://r", "n", "m").unwrap();
        let transcript = SessionTranscript::from_bytes(&bytes).unwrap();
        let Handover::Oid4vp(handover) = transcript.handover() else {
            panic!("expected an OpenID4VP handover");
        };
        assert_eq!(handover.nonce, "n");
        assert_eq!(handover.client_id_hash.len(), 32);
        assert_eq!(SessionTranscript::oid4vp(handover.clone()).to_bytes().unwrap(), bytes);
    }

    #[test]
    fn invalid_engagement_is_rejected() {
        assert!(matches!(
            build_proximity_transcript(&[0xff, 0x00], &[], &[]),
            Err(Error::InvalidInput {
                field: "DeviceEngagement",
                ..
            })
        ));
        assert!(SessionTranscript::from_bytes(&[0x82, 0xf6, 0xf6]).is_err());
    }

    #[test]
    fn oid4vp_parameters_are_required() {
        assert!(matches!(
            build_oid4vp_transcript("client", "https://rp", "", "mdoc-nonce"),
            Err(Error::MissingParameter("nonce"))
        ));
    }
}
