//! The key-custody boundary.
//!
//! Device keys live with a custodian (a hardware keystore on a phone). The rest of the crate
//! only ever asks it to sign bytes under an alias or to hand out the public half as a JWK.
use crate::cose::{Curve, PublicKey};
use rand::rngs::OsRng;
use signature::Signer;
use ssi_jwk::JWK;
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("no key found for alias '{0}'")]
    KeyNotFound(String),
    #[error("signing failed: {0}")]
    SigningFailed(String),
}

/// Holds private keys and signs with them on request.
///
/// `sign` receives the full message; hashing is the custodian's job (SHA-256 for P-256,
/// SHA-384 for P-384). The signature may be DER or raw `r ‖ s`.
pub trait KeyCustodian: Send + Sync {
    fn sign(&self, alias: &str, data: &[u8]) -> Result<Vec<u8>, Error>;
    fn public_key(&self, alias: &str) -> Result<JWK, Error>;
    fn exists(&self, alias: &str) -> bool;
}

/// The wire form the [SoftwareKeyCustodian] returns signatures in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureFormat {
    /// ASN.1 DER, as platform keystores return.
    #[default]
    Der,
    Raw,
}

#[derive(Clone)]
pub enum SoftwareKey {
    P256(p256::ecdsa::SigningKey),
    P384(p384::ecdsa::SigningKey),
}

/// In-memory keys, for tests, tools and hosts without a keystore.
#[derive(Default)]
pub struct SoftwareKeyCustodian {
    keys: RwLock<BTreeMap<String, SoftwareKey>>,
    format: SignatureFormat,
}

impl SoftwareKey {
    pub fn generate(curve: Curve) -> Self {
        match curve {
            Curve::P256 => SoftwareKey::P256(p256::ecdsa::SigningKey::random(&mut OsRng)),
            Curve::P384 => SoftwareKey::P384(p384::ecdsa::SigningKey::random(&mut OsRng)),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            SoftwareKey::P256(key) => PublicKey::P256(*key.verifying_key()),
            SoftwareKey::P384(key) => PublicKey::P384(*key.verifying_key()),
        }
    }

    fn sign(&self, data: &[u8], format: SignatureFormat) -> Result<Vec<u8>, Error> {
        let failed = |e: signature::Error| Error::SigningFailed(e.to_string());
        Ok(match (self, format) {
            (SoftwareKey::P256(key), SignatureFormat::Raw) => {
                let sig: p256::ecdsa::Signature = key.try_sign(data).map_err(failed)?;
                sig.to_bytes().to_vec()
            }
            (SoftwareKey::P256(key), SignatureFormat::Der) => {
                let sig: p256::ecdsa::Signature = key.try_sign(data).map_err(failed)?;
                sig.to_der().as_bytes().to_vec()
            }
            (SoftwareKey::P384(key), SignatureFormat::Raw) => {
                let sig: p384::ecdsa::Signature = key.try_sign(data).map_err(failed)?;
                sig.to_bytes().to_vec()
            }
            (SoftwareKey::P384(key), SignatureFormat::Der) => {
                let sig: p384::ecdsa::Signature = key.try_sign(data).map_err(failed)?;
                sig.to_der().as_bytes().to_vec()
            }
        })
    }
}

impl From<p256::ecdsa::SigningKey> for SoftwareKey {
    fn from(key: p256::ecdsa::SigningKey) -> Self {
        SoftwareKey::P256(key)
    }
}

impl From<p384::ecdsa::SigningKey> for SoftwareKey {
    fn from(key: p384::ecdsa::SigningKey) -> Self {
        SoftwareKey::P384(key)
    }
}

impl SoftwareKeyCustodian {
    pub fn with_format(format: SignatureFormat) -> Self {
        Self {
            keys: RwLock::default(),
            format,
        }
    }

    /// Generate a fresh key under `alias`, replacing any existing one, and return its JWK.
    pub fn generate(&self, alias: &str, curve: Curve) -> Result<JWK, Error> {
        let key = SoftwareKey::generate(curve);
        let jwk = key.public_key().to_jwk();
        self.insert(alias, key)?;
        Ok(jwk)
    }

    pub fn insert(&self, alias: &str, key: impl Into<SoftwareKey>) -> Result<(), Error> {
        self.keys
            .write()
            .map_err(|_| Error::SigningFailed("key store lock poisoned".to_string()))?
            .insert(alias.to_string(), key.into());
        Ok(())
    }

    pub fn remove(&self, alias: &str) -> Result<bool, Error> {
        Ok(self
            .keys
            .write()
            .map_err(|_| Error::SigningFailed("key store lock poisoned".to_string()))?
            .remove(alias)
            .is_some())
    }

    fn key(&self, alias: &str) -> Result<SoftwareKey, Error> {
        self.keys
            .read()
            .map_err(|_| Error::SigningFailed("key store lock poisoned".to_string()))?
            .get(alias)
            .cloned()
            .ok_or_else(|| Error::KeyNotFound(alias.to_string()))
    }
}

impl KeyCustodian for SoftwareKeyCustodian {
    fn sign(&self, alias: &str, data: &[u8]) -> Result<Vec<u8>, Error> {
        self.key(alias)?.sign(data, self.format)
    }

    fn public_key(&self, alias: &str) -> Result<JWK, Error> {
        Ok(self.key(alias)?.public_key().to_jwk())
    }

    fn exists(&self, alias: &str) -> bool {
        self.keys
            .read()
            .map(|keys| keys.contains_key(alias))
            .unwrap_or(false)
    }
}
