use anyhow::{Context, Result};
use rand::{rngs::OsRng, RngCore};
use serde_bytes::ByteBuf;
use ssi_jwk::JWK;
use std::collections::BTreeMap;
use time::{Duration, OffsetDateTime};

use isomdl_holder::cbor::{self, Value};
use isomdl_holder::cose::{self, Curve, PublicKey};
use isomdl_holder::custodian::SoftwareKeyCustodian;
use isomdl_holder::definitions::helpers::{EmbeddedSign1, Tag24};
use isomdl_holder::definitions::traits::ToCbor;
use isomdl_holder::definitions::validity_info::Tdate;
use isomdl_holder::definitions::{
    CoseKey, DeviceKeyInfo, DigestAlgorithm, IssuerSigned, IssuerSignedItem, Mso, ValidityInfo,
};
use isomdl_holder::encoding;

#[allow(dead_code)]
pub const DOC_TYPE: &str = "org.iso.18013.5.1.mDL";
#[allow(dead_code)]
pub const NAMESPACE: &str = "org.iso.18013.5.1";
#[allow(dead_code)]
pub const AAMVA_NAMESPACE: &str = "org.iso.18013.5.1.aamva";
#[allow(dead_code)]
pub const DEVICE_ALIAS: &str = "mdl-device-key";
const ISSUER_ALIAS: &str = "document-signer";

#[allow(dead_code)]
fn main() {}

/// A wallet holding one freshly issued mDL.
#[allow(dead_code)]
pub struct Wallet {
    pub custodian: SoftwareKeyCustodian,
    pub issuer_jwk: JWK,
    pub device_jwk: JWK,
    pub issuer_signed: IssuerSigned,
}

#[allow(dead_code)]
impl Wallet {
    /// The stored IssuerSigned, standard base64 as a host would keep it.
    pub fn issuer_signed_content(&self) -> Result<String> {
        let bytes = self.issuer_signed.clone().to_cbor_bytes()?;
        Ok(encoding::encode_standard(&bytes))
    }

    /// `[{issuerSignedContent, alias, docType}]` for the response generator.
    pub fn requested_documents(&self) -> Result<serde_json::Value> {
        Ok(serde_json::json!([{
            "issuerSignedContent": self.issuer_signed_content()?,
            "alias": DEVICE_ALIAS,
            "docType": DOC_TYPE,
        }]))
    }
}

fn item(
    digest_id: u32,
    element_identifier: &str,
    element_value: Value,
) -> Result<Tag24<IssuerSignedItem>> {
    let mut random = vec![0u8; 32];
    OsRng.fill_bytes(&mut random);
    Tag24::new(IssuerSignedItem {
        digest_id,
        random,
        element_identifier: element_identifier.to_string(),
        element_value,
    })
    .context("could not encode issuer signed item")
}

/// Issue an mDL to a new device key, the way a document signer would.
#[allow(dead_code)]
pub fn issue_mdl() -> Result<Wallet> {
    let custodian = SoftwareKeyCustodian::default();
    let issuer_jwk = custodian.generate(ISSUER_ALIAS, Curve::P256)?;
    let device_jwk = custodian.generate(DEVICE_ALIAS, Curve::P256)?;

    let mut namespaces = BTreeMap::new();
    namespaces.insert(
        NAMESPACE.to_string(),
        vec![
            item(0, "family_name", Value::Text("Mustermann".into()))?,
            item(1, "given_name", Value::Text("Erika".into()))?,
            item(
                2,
                "birth_date",
                Value::Tag(1004, Box::new(Value::Text("1971-09-01".into()))),
            )?,
            item(3, "age_over_21", Value::Bool(true))?,
            item(4, "document_number", Value::Text("T22000129".into()))?,
        ],
    );
    namespaces.insert(
        AAMVA_NAMESPACE.to_string(),
        vec![item(5, "DHS_compliance", Value::Text("F".into()))?],
    );

    let mut value_digests = BTreeMap::new();
    for (namespace, items) in &namespaces {
        let mut digests = BTreeMap::new();
        for item in items {
            let item: &Tag24<IssuerSignedItem> = item;
            digests.insert(
                item.as_ref().digest_id,
                ByteBuf::from(DigestAlgorithm::SHA256.digest_item(item)?),
            );
        }
        value_digests.insert(namespace.clone(), digests);
    }

    let now = OffsetDateTime::now_utc();
    let device_key = PublicKey::try_from(&device_jwk)?;
    let mso = Mso {
        version: "1.0".to_string(),
        digest_algorithm: DigestAlgorithm::SHA256,
        value_digests,
        device_key_info: DeviceKeyInfo::from(CoseKey::from(&device_key)),
        doc_type: DOC_TYPE.to_string(),
        validity_info: ValidityInfo {
            signed: Tdate::new(now)?,
            valid_from: Tdate::new(now)?,
            valid_until: Tdate::new(now + Duration::days(365))?,
            expected_update: None,
        },
    };
    let mso_bytes = mso.to_cbor_bytes()?;
    let payload = cbor::encode(&cbor::tag24(mso_bytes))?;
    let sign1 = cose::sign(&custodian, ISSUER_ALIAS, payload)?;

    Ok(Wallet {
        issuer_signed: IssuerSigned {
            namespaces,
            issuer_auth: EmbeddedSign1::new(sign1)?,
        },
        custodian,
        issuer_jwk,
        device_jwk,
    })
}
