//! A minimal issuer for unit tests: mints a P-256-signed mDL with SHA-256 digests.
use crate::cbor::{self, Value};
use crate::cose::{self, Curve, PublicKey};
use crate::custodian::SoftwareKeyCustodian;
use crate::definitions::{
    device_key::CoseKey,
    helpers::{EmbeddedSign1, Tag24},
    mso::{DigestAlgorithm, Mso},
    validity_info::Tdate,
    DeviceKeyInfo, IssuerSigned, IssuerSignedItem, ValidityInfo,
};
use crate::definitions::traits::ToCbor;
use rand::{rngs::OsRng, RngCore};
use serde_bytes::ByteBuf;
use ssi_jwk::JWK;
use std::collections::BTreeMap;
use time::{Duration, OffsetDateTime};

pub const DOC_TYPE: &str = "org.iso.18013.5.1.mDL";
pub const NAMESPACE: &str = "org.iso.18013.5.1";
pub const AAMVA_NAMESPACE: &str = "org.iso.18013.5.1.aamva";
pub const ISSUER_ALIAS: &str = "issuer";
pub const DEVICE_ALIAS: &str = "device";

pub struct Fixture {
    pub custodian: SoftwareKeyCustodian,
    pub issuer_jwk: JWK,
    pub device_jwk: JWK,
    pub issuer_signed: IssuerSigned,
}

fn item(digest_id: u32, element_identifier: &str, element_value: Value) -> Tag24<IssuerSignedItem> {
    let mut random = vec![0u8; 16];
    OsRng.fill_bytes(&mut random);
    Tag24::new(IssuerSignedItem {
        digest_id,
        random,
        element_identifier: element_identifier.to_string(),
        element_value,
    })
    .unwrap()
}

pub fn mdl() -> Fixture {
    let custodian = SoftwareKeyCustodian::default();
    let issuer_jwk = custodian.generate(ISSUER_ALIAS, Curve::P256).unwrap();
    let device_jwk = custodian.generate(DEVICE_ALIAS, Curve::P256).unwrap();

    let mut namespaces = BTreeMap::new();
    namespaces.insert(
        NAMESPACE.to_string(),
        vec![
            item(0, "family_name", Value::Text("Doe".into())),
            item(1, "given_name", Value::Text("John".into())),
            item(
                2,
                "birth_date",
                Value::Tag(1004, Box::new(Value::Text("1990-01-01".into()))),
            ),
            item(3, "age_over_18", Value::Bool(true)),
        ],
    );
    namespaces.insert(
        AAMVA_NAMESPACE.to_string(),
        vec![item(4, "DHS_compliance", Value::Text("F".into()))],
    );

    let value_digests = namespaces
        .iter()
        .map(|(namespace, items)| {
            let ids = items
                .iter()
                .map(|item: &Tag24<IssuerSignedItem>| {
                    let digest = DigestAlgorithm::SHA256.digest_item(item).unwrap();
                    (item.as_ref().digest_id, ByteBuf::from(digest))
                })
                .collect();
            (namespace.clone(), ids)
        })
        .collect();

    let now = OffsetDateTime::now_utc();
    let device_key = PublicKey::try_from(&device_jwk).unwrap();
    let mso = Mso {
        version: "1.0".to_string(),
        digest_algorithm: DigestAlgorithm::SHA256,
        value_digests,
        device_key_info: DeviceKeyInfo::from(CoseKey::from(&device_key)),
        doc_type: DOC_TYPE.to_string(),
        validity_info: ValidityInfo {
            signed: Tdate::new(now).unwrap(),
            valid_from: Tdate::new(now).unwrap(),
            valid_until: Tdate::new(now + Duration::days(365)).unwrap(),
            expected_update: None,
        },
    };
    let mso_bytes = mso.to_cbor_bytes().unwrap();
    let payload = cbor::encode(&cbor::tag24(mso_bytes)).unwrap();
    let sign1 = cose::sign(&custodian, ISSUER_ALIAS, payload).unwrap();

    Fixture {
        issuer_signed: IssuerSigned {
            namespaces,
            issuer_auth: EmbeddedSign1::new(sign1).unwrap(),
        },
        custodian,
        issuer_jwk,
        device_jwk,
    }
}
