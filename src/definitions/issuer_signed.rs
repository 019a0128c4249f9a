//! [IssuerSigned]: the disclosed items of a credential and the issuer's signature over their
//! digests.
//!
//! Decoding only checks structure. Verifying `issuerAuth` and checking the items against the
//! MSO digests are separate, explicit calls.
use crate::cbor::{self, bytes_to_json, to_json, Value, TAG_ENCODED_CBOR};
use crate::cose::{self, PublicKey};
use crate::definitions::{
    helpers::{EmbeddedSign1, Tag24},
    mso::{DigestId, Mso},
    traits::FromCbor,
    Error,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use ssi_jwk::JWK;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IssuerSigned {
    #[serde(rename = "nameSpaces")]
    pub namespaces: IssuerNamespaces,
    pub issuer_auth: EmbeddedSign1,
}

pub type IssuerNamespaces = BTreeMap<String, Vec<IssuerSignedItemBytes>>;
pub type IssuerSignedItemBytes = Tag24<IssuerSignedItem>;

/// Represents an item signed by the issuer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuerSignedItem {
    /// The ID of the digest used for signing.
    #[serde(rename = "digestID")]
    pub digest_id: DigestId,

    /// Random bytes associated with the signed item.
    #[serde(with = "serde_bytes")]
    pub random: Vec<u8>,

    /// The identifier of the element.
    pub element_identifier: String,

    /// The value of the element.
    pub element_value: Value,
}

impl IssuerSignedItem {
    fn to_json(&self, with_identifier: bool) -> JsonValue {
        let mut object = Map::new();
        object.insert("digestID".into(), json!(self.digest_id));
        object.insert("random".into(), bytes_to_json(&self.random));
        if with_identifier {
            object.insert(
                "elementIdentifier".into(),
                JsonValue::String(self.element_identifier.clone()),
            );
        }
        object.insert("elementValue".into(), to_json(&self.element_value));
        JsonValue::Object(object)
    }
}

impl IssuerSigned {
    /// Decode the MSO carried as the `issuerAuth` payload.
    pub fn mso(&self) -> Result<Mso, Error> {
        let payload = self.issuer_auth.sign1().payload().ok_or(Error::Cose {
            field: "issuerAuth",
            reason: "the payload is detached".to_string(),
        })?;
        match cbor::decode(payload)? {
            Value::Tag(TAG_ENCODED_CBOR, inner) => match *inner {
                Value::Bytes(bytes) => Mso::from_cbor_bytes(&bytes),
                _ => Err(Error::InvalidType {
                    field: "issuerAuth",
                    expected: "a payload of MobileSecurityObjectBytes",
                }),
            },
            // Bare MSO maps are tolerated.
            other => Mso::from_cbor(&other),
        }
    }

    /// Check every item against `valueDigests` of the MSO.
    pub fn validate_digests(&self) -> Result<(), Error> {
        let mso = self.mso()?;
        mso.validate_namespaces(&self.namespaces)
    }

    /// Verify `issuerAuth` against the issuer's public key.
    pub fn verify_issuer_auth(&self, jwk: &JWK) -> Result<bool, cose::Error> {
        let key = PublicKey::try_from(jwk)?;
        Ok(self.issuer_auth.sign1().verify(&key, None))
    }

    /// Keep only the items `keep` accepts. Namespaces are kept even when emptied.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str, &IssuerSignedItem) -> bool,
    {
        for (namespace, items) in self.namespaces.iter_mut() {
            items.retain(|item| keep(namespace, item.as_ref()));
        }
    }

    /// Element identifiers per namespace, in item order.
    pub fn element_identifiers(&self) -> BTreeMap<&str, Vec<&str>> {
        self.namespaces
            .iter()
            .map(|(namespace, items)| {
                let ids = items
                    .iter()
                    .map(|item| item.as_ref().element_identifier.as_str())
                    .collect();
                (namespace.as_str(), ids)
            })
            .collect()
    }

    /// Render for callers that work in JSON.
    ///
    /// With `separate_element_identifier`, each namespace becomes a map keyed by element
    /// identifier instead of a list of items.
    pub fn to_json(&self, separate_element_identifier: bool) -> JsonValue {
        let namespaces: Map<String, JsonValue> = self
            .namespaces
            .iter()
            .map(|(namespace, items)| {
                let rendered = if separate_element_identifier {
                    JsonValue::Object(
                        items
                            .iter()
                            .map(|item| {
                                let item = item.as_ref();
                                (item.element_identifier.clone(), item.to_json(false))
                            })
                            .collect(),
                    )
                } else {
                    JsonValue::Array(items.iter().map(|item| item.as_ref().to_json(true)).collect())
                };
                (namespace.clone(), rendered)
            })
            .collect();
        let raw = cbor::encode(self.issuer_auth.value())
            .map(|bytes| bytes_to_json(&bytes))
            .unwrap_or(JsonValue::Null);
        let mso = self
            .issuer_auth
            .sign1()
            .payload()
            .and_then(|payload| cbor::decode(payload).ok())
            .map(|payload| to_json(&payload))
            .unwrap_or(JsonValue::Null);
        json!({
            "nameSpaces": namespaces,
            "issuerAuth": {
                "raw": raw,
                "mso": mso,
            },
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cbor::CborMap;
    use crate::definitions::fixture;
    use crate::definitions::traits::ToCbor;

    #[test]
    fn decodes_minted_document() {
        let fixture = fixture::mdl();
        let bytes = fixture.issuer_signed.to_cbor_bytes().unwrap();
        let decoded = IssuerSigned::from_cbor_bytes(&bytes).unwrap();
        assert_eq!(decoded, fixture.issuer_signed);
        assert_eq!(decoded.to_cbor_bytes().unwrap(), bytes);

        let ids = decoded.element_identifiers();
        assert_eq!(
            ids[fixture::NAMESPACE],
            vec!["family_name", "given_name", "birth_date", "age_over_18"]
        );
        let mso = decoded.mso().unwrap();
        assert_eq!(mso.doc_type, fixture::DOC_TYPE);
        assert!(decoded.validate_digests().is_ok());
        assert!(decoded.verify_issuer_auth(&fixture.issuer_jwk).unwrap());
        assert!(!decoded.verify_issuer_auth(&fixture.device_jwk).unwrap());
    }

    #[test]
    fn missing_issuer_auth() {
        let mut map = CborMap::new();
        map.insert("nameSpaces", Value::Map(vec![]));
        let err = IssuerSigned::from_cbor(&map.into()).unwrap_err();
        assert!(matches!(&err, Error::MissingField(field) if field == "issuerAuth"));
    }

    #[test]
    fn extra_top_level_key() {
        let fixture = fixture::mdl();
        let mut map = CborMap::try_from(fixture.issuer_signed.to_cbor().unwrap()).unwrap();
        map.insert("deviceSigned", Value::Null);
        let err = IssuerSigned::from_cbor(&map.into()).unwrap_err();
        assert_eq!(err.field(), Some("deviceSigned"));
    }

    #[test]
    fn issuer_auth_must_be_a_sign1() {
        let mut map = CborMap::new();
        map.insert("nameSpaces", Value::Map(vec![]));
        map.insert("issuerAuth", Value::Text("not cose".into()));
        let err = IssuerSigned::from_cbor(&map.into()).unwrap_err();
        assert!(err.to_string().contains("not a COSE_Sign1"));
    }

    #[test]
    fn tampered_item_fails_digest_check() {
        let fixture = fixture::mdl();
        let mut issuer_signed = fixture.issuer_signed;
        let items = issuer_signed.namespaces.get_mut(fixture::NAMESPACE).unwrap();
        let mut forged = items[0].as_ref().clone();
        forged.element_value = Value::Text("Mallory".into());
        items[0] = Tag24::new(forged).unwrap();
        assert!(matches!(
            issuer_signed.validate_digests(),
            Err(Error::DigestMismatch { digest_id: 0, .. })
        ));
    }

    #[test]
    fn retain_keeps_emptied_namespaces() {
        let mut issuer_signed = fixture::mdl().issuer_signed;
        issuer_signed.retain(|_, _| false);
        assert_eq!(issuer_signed.namespaces[fixture::NAMESPACE].len(), 0);
        assert!(issuer_signed.validate_digests().is_ok());
    }

    #[test]
    fn json_rendering() {
        let issuer_signed = fixture::mdl().issuer_signed;
        let nested = issuer_signed.to_json(false);
        let items = nested["nameSpaces"][fixture::NAMESPACE].as_array().unwrap();
        assert_eq!(items[0]["elementIdentifier"], "family_name");
        assert_eq!(items[0]["elementValue"], "Doe");
        assert_eq!(items[0]["digestID"], 0);

        let separate = issuer_signed.to_json(true);
        let family_name = &separate["nameSpaces"][fixture::NAMESPACE]["family_name"];
        assert_eq!(family_name["elementValue"], "Doe");
        assert!(family_name.get("elementIdentifier").is_none());
        assert_eq!(separate["issuerAuth"]["mso"]["docType"], fixture::DOC_TYPE);
        assert!(separate["issuerAuth"]["raw"].is_string());
    }
}
