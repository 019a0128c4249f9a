use crate::cbor::{CborMap, Value};
use crate::cose::{Curve, PublicKey};
use serde::{Deserialize, Serialize};
use ssi_jwk::JWK;

/// An implementation of RFC-8152 [COSE_Key](https://datatracker.ietf.org/doc/html/rfc8152#section-13)
/// restricted to the requirements of ISO/IEC 18013-5:2021.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "Value", into = "Value")]
pub enum CoseKey {
    EC2 { crv: EC2Curve, x: Vec<u8>, y: EC2Y },
    OKP { crv: OKPCurve, x: Vec<u8> },
}

/// The sign bit or value of the y-coordinate for the EC point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EC2Y {
    Value(Vec<u8>),
    SignBit(bool),
}

/// The RFC-8152 identifier of the curve, for EC2 key type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EC2Curve {
    P256,
    P384,
    P521,
    P256K,
}

/// The RFC-8152 identifier of the curve, for OKP key type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OKPCurve {
    X25519,
    X448,
    Ed25519,
    Ed448,
}

/// Errors that can occur when deserialising a COSE_Key.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("COSE_Key of kty 'EC2' missing x coordinate")]
    EC2MissingX,
    #[error("COSE_Key of kty 'EC2' missing y coordinate")]
    EC2MissingY,
    #[error("Expected to parse a CBOR bool or bstr for y-coordinate, received: '{0:?}'")]
    InvalidTypeY(Box<Value>),
    #[error("Expected to parse a CBOR map: {0}")]
    NotAMap(crate::cbor::MapError),
    #[error("Unable to discern the elliptic curve")]
    UnknownCurve,
    #[error("This implementation of COSE_Key only supports P-256, P-384, P-521, Ed25519 and Ed448 elliptic curves")]
    UnsupportedCurve,
    #[error("This implementation of COSE_Key only supports EC2 and OKP keys")]
    UnsupportedKeyType,
    #[error("Could not reconstruct coordinates from the provided COSE_Key")]
    InvalidCoseKey,
    #[error("Constructing a JWK from CoseKey with point-compression is not supported.")]
    UnsupportedFormat,
}

// COSE_Key labels.
const KTY: i64 = 1;
const CRV: i64 = -1;
const X: i64 = -2;
const Y: i64 = -3;

const KTY_OKP: i128 = 1;
const KTY_EC2: i128 = 2;

impl CoseKey {
    /// Whether both describe the same public key, comparing a compressed y-coordinate by its
    /// parity.
    pub fn same_key(&self, other: &CoseKey) -> bool {
        match (self, other) {
            (
                CoseKey::EC2 { crv, x, y },
                CoseKey::EC2 {
                    crv: other_crv,
                    x: other_x,
                    y: other_y,
                },
            ) => {
                crv == other_crv
                    && x == other_x
                    && match (y, other_y) {
                        (EC2Y::Value(a), EC2Y::Value(b)) => a == b,
                        (EC2Y::SignBit(a), EC2Y::SignBit(b)) => a == b,
                        (EC2Y::Value(v), EC2Y::SignBit(bit))
                        | (EC2Y::SignBit(bit), EC2Y::Value(v)) => {
                            v.last().map(|b| b & 1 == 1) == Some(*bit)
                        }
                    }
            }
            (a, b) => a == b,
        }
    }
}

impl From<&PublicKey> for CoseKey {
    fn from(key: &PublicKey) -> Self {
        let (x, y) = key.coordinates();
        let crv = match key.curve() {
            Curve::P256 => EC2Curve::P256,
            Curve::P384 => EC2Curve::P384,
        };
        CoseKey::EC2 {
            crv,
            x,
            y: EC2Y::Value(y),
        }
    }
}

impl From<CoseKey> for Value {
    fn from(key: CoseKey) -> Value {
        let mut map = CborMap::new();
        match key {
            CoseKey::EC2 { crv, x, y } => {
                map.insert(KTY, Value::Integer(2.into()));
                map.insert(CRV, crv.into());
                map.insert(X, Value::Bytes(x));
                map.insert(Y, y.into());
            }
            CoseKey::OKP { crv, x } => {
                map.insert(KTY, Value::Integer(1.into()));
                map.insert(CRV, crv.into());
                map.insert(X, Value::Bytes(x));
            }
        }
        map.into()
    }
}

impl TryFrom<Value> for CoseKey {
    type Error = Error;

    fn try_from(v: Value) -> Result<Self, Error> {
        let mut map = CborMap::try_from(v).map_err(Error::NotAMap)?;
        let int = |v: Option<Value>| match v {
            Some(Value::Integer(i)) => Some(i128::from(i)),
            _ => None,
        };
        let kty = int(map.remove(KTY)).ok_or(Error::UnsupportedKeyType)?;
        let crv = int(map.remove(CRV)).ok_or(Error::UnknownCurve)?;
        match kty {
            KTY_EC2 => {
                let crv = EC2Curve::try_from(crv)?;
                let x = match map.remove(X) {
                    Some(Value::Bytes(x)) => x,
                    _ => return Err(Error::EC2MissingX),
                };
                let y = map.remove(Y).ok_or(Error::EC2MissingY)?.try_into()?;
                Ok(Self::EC2 { crv, x, y })
            }
            KTY_OKP => {
                let crv = OKPCurve::try_from(crv)?;
                match map.remove(X) {
                    Some(Value::Bytes(x)) => Ok(Self::OKP { crv, x }),
                    _ => Err(Error::InvalidCoseKey),
                }
            }
            _ => Err(Error::UnsupportedKeyType),
        }
    }
}

impl From<EC2Y> for Value {
    fn from(y: EC2Y) -> Value {
        match y {
            EC2Y::Value(s) => Value::Bytes(s),
            EC2Y::SignBit(b) => Value::Bool(b),
        }
    }
}

impl TryFrom<Value> for EC2Y {
    type Error = Error;

    fn try_from(v: Value) -> Result<Self, Error> {
        match v {
            Value::Bytes(s) => Ok(EC2Y::Value(s)),
            Value::Bool(b) => Ok(EC2Y::SignBit(b)),
            _ => Err(Error::InvalidTypeY(Box::new(v))),
        }
    }
}

impl From<EC2Curve> for Value {
    fn from(crv: EC2Curve) -> Value {
        let id = match crv {
            EC2Curve::P256 => 1,
            EC2Curve::P384 => 2,
            EC2Curve::P521 => 3,
            EC2Curve::P256K => 8,
        };
        Value::Integer(id.into())
    }
}

impl TryFrom<i128> for EC2Curve {
    type Error = Error;

    fn try_from(crv_id: i128) -> Result<Self, Error> {
        match crv_id {
            1 => Ok(EC2Curve::P256),
            2 => Ok(EC2Curve::P384),
            3 => Ok(EC2Curve::P521),
            8 => Ok(EC2Curve::P256K),
            _ => Err(Error::UnsupportedCurve),
        }
    }
}

impl From<OKPCurve> for Value {
    fn from(crv: OKPCurve) -> Value {
        let id = match crv {
            OKPCurve::X25519 => 4,
            OKPCurve::X448 => 5,
            OKPCurve::Ed25519 => 6,
            OKPCurve::Ed448 => 7,
        };
        Value::Integer(id.into())
    }
}

impl TryFrom<i128> for OKPCurve {
    type Error = Error;

    fn try_from(crv_id: i128) -> Result<Self, Error> {
        match crv_id {
            4 => Ok(OKPCurve::X25519),
            5 => Ok(OKPCurve::X448),
            6 => Ok(OKPCurve::Ed25519),
            7 => Ok(OKPCurve::Ed448),
            _ => Err(Error::UnsupportedCurve),
        }
    }
}

impl TryFrom<JWK> for CoseKey {
    type Error = Error;

    fn try_from(jwk: JWK) -> Result<Self, Self::Error> {
        match jwk.params {
            ssi_jwk::Params::EC(params) => {
                let x = params
                    .x_coordinate
                    .as_ref()
                    .ok_or(Error::EC2MissingX)?
                    .0
                    .clone();
                Ok(CoseKey::EC2 {
                    crv: (&params).try_into()?,
                    x,
                    y: params.try_into()?,
                })
            }
            ssi_jwk::Params::OKP(params) => Ok(CoseKey::OKP {
                crv: (&params).try_into()?,
                x: params.public_key.0.clone(),
            }),
            _ => Err(Error::UnsupportedKeyType),
        }
    }
}

impl TryFrom<&ssi_jwk::ECParams> for EC2Curve {
    type Error = Error;

    fn try_from(params: &ssi_jwk::ECParams) -> Result<Self, Self::Error> {
        match params.curve.as_deref() {
            Some("P-256") => Ok(Self::P256),
            Some("P-384") => Ok(Self::P384),
            Some("P-521") => Ok(Self::P521),
            Some("secp256k1") => Ok(Self::P256K),
            Some(_) => Err(Error::UnsupportedCurve),
            None => Err(Error::UnknownCurve),
        }
    }
}

impl TryFrom<ssi_jwk::ECParams> for EC2Y {
    type Error = Error;

    fn try_from(params: ssi_jwk::ECParams) -> Result<Self, Self::Error> {
        params
            .y_coordinate.clone()
            .map(|y| Self::Value(y.0))
            .ok_or(Error::EC2MissingY)
    }
}

impl TryFrom<&ssi_jwk::OctetParams> for OKPCurve {
    type Error = Error;

    fn try_from(params: &ssi_jwk::OctetParams) -> Result<Self, Self::Error> {
        match params.curve.as_str() {
            "Ed25519" => Ok(Self::Ed25519),
            "Ed448" => Ok(Self::Ed448),
            "X25519" => Ok(Self::X25519),
            "X448" => Ok(Self::X448),
            _ => Err(Error::UnsupportedCurve),
        }
    }
}

impl TryFrom<CoseKey> for JWK {
    type Error = Error;

    fn try_from(cose: CoseKey) -> Result<JWK, Error> {
        let params = match cose {
            CoseKey::EC2 { crv, x, y } => ssi_jwk::Params::EC(ssi_jwk::ECParams {
                curve: Some(
                    match crv {
                        EC2Curve::P256 => "P-256",
                        EC2Curve::P384 => "P-384",
                        EC2Curve::P521 => "P-521",
                        EC2Curve::P256K => "secp256k1",
                    }
                    .to_string(),
                ),
                x_coordinate: Some(ssi_jwk::Base64urlUInt(x)),
                y_coordinate: match y {
                    EC2Y::Value(vec) => Some(ssi_jwk::Base64urlUInt(vec)),
                    EC2Y::SignBit(_) => return Err(Error::UnsupportedFormat),
                },
                ecc_private_key: None,
            }),
            CoseKey::OKP { crv, x } => ssi_jwk::Params::OKP(ssi_jwk::OctetParams {
                curve: match crv {
                    OKPCurve::X25519 => "X25519",
                    OKPCurve::X448 => "X448",
                    OKPCurve::Ed25519 => "Ed25519",
                    OKPCurve::Ed448 => "Ed448",
                }
                .to_string(),
                public_key: ssi_jwk::Base64urlUInt(x),
                private_key: None,
            }),
        };
        Ok(JWK {
            params,
            public_key_use: None,
            key_operations: None,
            algorithm: None,
            key_id: None,
            x509_url: None,
            x509_certificate_chain: None,
            x509_thumbprint_sha1: None,
            x509_thumbprint_sha256: None,
        })
    }
}
