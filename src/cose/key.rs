//! Public keys used to verify COSE signatures, built from JWKs.
use super::{Error, SignatureAlgorithm};
use coset::iana;
use elliptic_curve::generic_array::GenericArray;
use ssi_jwk::{Base64urlUInt, ECParams, Params, JWK};

/// The curves the COSE layer signs and verifies with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    P256,
    P384,
}

impl Curve {
    pub fn from_jwk_name(name: &str) -> Option<Self> {
        match name {
            "P-256" => Some(Curve::P256),
            "P-384" => Some(Curve::P384),
            _ => None,
        }
    }

    pub fn jwk_name(&self) -> &'static str {
        match self {
            Curve::P256 => "P-256",
            Curve::P384 => "P-384",
        }
    }

    /// Length in bytes of one affine coordinate, and of each of `r` and `s`.
    pub fn field_len(&self) -> usize {
        match self {
            Curve::P256 => 32,
            Curve::P384 => 48,
        }
    }

    pub fn algorithm(&self) -> iana::Algorithm {
        match self {
            Curve::P256 => iana::Algorithm::ES256,
            Curve::P384 => iana::Algorithm::ES384,
        }
    }
}

/// An ECDSA verifying key on one of the supported curves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    P256(p256::ecdsa::VerifyingKey),
    P384(p384::ecdsa::VerifyingKey),
}

impl PublicKey {
    pub fn curve(&self) -> Curve {
        match self {
            PublicKey::P256(_) => Curve::P256,
            PublicKey::P384(_) => Curve::P384,
        }
    }

    /// Uncompressed affine coordinates `(x, y)`.
    pub fn coordinates(&self) -> (Vec<u8>, Vec<u8>) {
        match self {
            PublicKey::P256(key) => {
                let point = key.to_encoded_point(false);
                (
                    point.x().map(|x| x.to_vec()).unwrap_or_default(),
                    point.y().map(|y| y.to_vec()).unwrap_or_default(),
                )
            }
            PublicKey::P384(key) => {
                let point = key.to_encoded_point(false);
                (
                    point.x().map(|x| x.to_vec()).unwrap_or_default(),
                    point.y().map(|y| y.to_vec()).unwrap_or_default(),
                )
            }
        }
    }

    pub fn to_jwk(&self) -> JWK {
        let (x, y) = self.coordinates();
        JWK {
            params: Params::EC(ECParams {
                curve: Some(self.curve().jwk_name().to_string()),
                x_coordinate: Some(Base64urlUInt(x)),
                y_coordinate: Some(Base64urlUInt(y)),
                ecc_private_key: None,
            }),
            public_key_use: None,
            key_operations: None,
            algorithm: None,
            key_id: None,
            x509_url: None,
            x509_certificate_chain: None,
            x509_thumbprint_sha1: None,
            x509_thumbprint_sha256: None,
        }
    }

    /// Build a key from raw affine coordinates, checking their length first.
    pub fn from_coordinates(curve: Curve, x: &[u8], y: &[u8]) -> Result<Self, Error> {
        let len = curve.field_len();
        if x.len() != len || y.len() != len {
            return Err(Error::InvalidJwk(format!(
                "{} coordinates must be {len} bytes, received x: {}, y: {}",
                curve.jwk_name(),
                x.len(),
                y.len()
            )));
        }
        match curve {
            Curve::P256 => {
                let point = p256::EncodedPoint::from_affine_coordinates(
                    GenericArray::from_slice(x),
                    GenericArray::from_slice(y),
                    false,
                );
                p256::ecdsa::VerifyingKey::from_encoded_point(&point)
                    .map(PublicKey::P256)
                    .map_err(|_| Error::InvalidJwk("point is not on P-256".to_string()))
            }
            Curve::P384 => {
                let point = p384::EncodedPoint::from_affine_coordinates(
                    GenericArray::from_slice(x),
                    GenericArray::from_slice(y),
                    false,
                );
                p384::ecdsa::VerifyingKey::from_encoded_point(&point)
                    .map(PublicKey::P384)
                    .map_err(|_| Error::InvalidJwk("point is not on P-384".to_string()))
            }
        }
    }
}

impl TryFrom<&JWK> for PublicKey {
    type Error = Error;

    fn try_from(jwk: &JWK) -> Result<Self, Error> {
        let Params::EC(params) = &jwk.params else {
            return Err(Error::InvalidJwk("only EC keys are supported".to_string()));
        };
        let curve = params
            .curve
            .as_deref()
            .ok_or_else(|| Error::InvalidJwk("missing 'crv'".to_string()))?;
        let curve = Curve::from_jwk_name(curve)
            .ok_or_else(|| Error::UnsupportedCurve(curve.to_string()))?;
        let x = params
            .x_coordinate
            .as_ref()
            .ok_or_else(|| Error::InvalidJwk("missing 'x'".to_string()))?;
        let y = params
            .y_coordinate
            .as_ref()
            .ok_or_else(|| Error::InvalidJwk("missing 'y'".to_string()))?;
        PublicKey::from_coordinates(curve, &x.0, &y.0)
    }
}

impl From<p256::ecdsa::VerifyingKey> for PublicKey {
    fn from(key: p256::ecdsa::VerifyingKey) -> Self {
        PublicKey::P256(key)
    }
}

impl From<p384::ecdsa::VerifyingKey> for PublicKey {
    fn from(key: p384::ecdsa::VerifyingKey) -> Self {
        PublicKey::P384(key)
    }
}

impl SignatureAlgorithm for PublicKey {
    fn algorithm(&self) -> iana::Algorithm {
        self.curve().algorithm()
    }
}
