use crate::cbor;
use crate::definitions::{helpers::Tag24, DeviceKeyInfo, Error, IssuerSignedItem, ValidityInfo};
use digest::Digest;
use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;
use sha2::{Sha256, Sha384, Sha512};
use std::collections::BTreeMap;

pub type DigestId = u32;
pub type DigestIds = BTreeMap<DigestId, ByteBuf>;

/// The MobileSecurityObject: the issuer's signed manifest of item digests and the holder's
/// device key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mso {
    pub version: String,
    pub digest_algorithm: DigestAlgorithm,
    pub value_digests: BTreeMap<String, DigestIds>,
    pub device_key_info: DeviceKeyInfo,
    pub doc_type: String,
    pub validity_info: ValidityInfo,
}

#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    #[serde(rename = "SHA-256")]
    SHA256,
    #[serde(rename = "SHA-384")]
    SHA384,
    #[serde(rename = "SHA-512")]
    SHA512,
}

fn hash<D: Digest>(bytes: &[u8]) -> Vec<u8> {
    D::digest(bytes).to_vec()
}

impl DigestAlgorithm {
    pub fn digest(&self, bytes: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::SHA256 => hash::<Sha256>(bytes),
            DigestAlgorithm::SHA384 => hash::<Sha384>(bytes),
            DigestAlgorithm::SHA512 => hash::<Sha512>(bytes),
        }
    }

    /// Digest of an item as the issuer computes it: over the encoded `#6.24(bstr)`.
    pub fn digest_item(&self, item: &Tag24<IssuerSignedItem>) -> Result<Vec<u8>, cbor::Error> {
        let bytes = cbor::encode(&cbor::tag24(item.inner_bytes.clone()))?;
        Ok(self.digest(&bytes))
    }
}

impl Mso {
    /// Check one item against the digest the issuer signed for it.
    pub fn validate_item(
        &self,
        namespace: &str,
        item: &Tag24<IssuerSignedItem>,
    ) -> Result<(), Error> {
        let digest_id = item.as_ref().digest_id;
        let expected = self
            .value_digests
            .get(namespace)
            .and_then(|ids| ids.get(&digest_id))
            .ok_or_else(|| Error::MissingDigest {
                namespace: namespace.to_string(),
                digest_id,
            })?;
        if self.digest_algorithm.digest_item(item)? != expected.as_slice() {
            tracing::warn!(
                namespace,
                element_identifier = item.as_ref().element_identifier.as_str(),
                digest_id,
                "issuer-signed item does not match its digest"
            );
            return Err(Error::DigestMismatch {
                namespace: namespace.to_string(),
                element_identifier: item.as_ref().element_identifier.clone(),
                digest_id,
            });
        }
        Ok(())
    }

    pub fn validate_namespaces<'a, I>(&self, namespaces: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (&'a String, &'a Vec<Tag24<IssuerSignedItem>>)>,
    {
        for (namespace, items) in namespaces {
            for item in items {
                self.validate_item(namespace, item)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cbor::Value;
    use crate::definitions::fixture;
    use crate::definitions::traits::{FromCbor, ToCbor};
    use hex::FromHex;

    #[test]
    fn digest_algorithm_names() {
        assert_eq!(
            DigestAlgorithm::SHA256.to_cbor().unwrap(),
            Value::Text("SHA-256".into())
        );
        assert_eq!(
            DigestAlgorithm::from_cbor(&Value::Text("SHA-512".into())).unwrap(),
            DigestAlgorithm::SHA512
        );
        assert!(DigestAlgorithm::from_cbor(&Value::Text("SHA-1".into())).is_err());
    }

    #[test]
    fn sha256_of_known_input() {
        let expected =
            <Vec<u8>>::from_hex("9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08")
                .unwrap();
        assert_eq!(DigestAlgorithm::SHA256.digest(b"test"), expected);
        assert_eq!(DigestAlgorithm::SHA384.digest(b"test").len(), 48);
    }

    #[test]
    fn digest_ids_must_be_integers() {
        let value = Value::Map(vec![(Value::Text("1".into()), Value::Bytes(vec![]))]);
        assert!(DigestIds::from_cbor(&value).is_err());
        let value = Value::Map(vec![(Value::Integer(7.into()), Value::Bytes(vec![1]))]);
        assert_eq!(DigestIds::from_cbor(&value).unwrap()[&7].as_slice(), &[1]);
    }

    #[test]
    fn minted_mso_roundtrip() {
        let mso = fixture::mdl().issuer_signed.mso().unwrap();
        let bytes = mso.to_cbor_bytes().unwrap();
        let decoded = Mso::from_cbor_bytes(&bytes).unwrap();
        assert_eq!(decoded, mso);
        assert_eq!(decoded.to_cbor_bytes().unwrap(), bytes);
    }
}
