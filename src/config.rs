//! Policy knobs for response generation.
use serde::{de, Deserialize, Deserializer, Serialize};

/// What to do with a requested document whose docType has no entry in the accepted fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnacceptedDocTypePolicy {
    /// Keep the document, with every namespace emptied.
    #[default]
    IncludeSuppressed,
    /// Leave the document out of the response.
    Omit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResponseConfig {
    /// Check each disclosed item against the MSO digests before it is released.
    pub verify_issuer_digests: bool,
    pub unaccepted_doc_type: UnacceptedDocTypePolicy,
    /// Require the custodian key under the document's alias to be the MSO device key.
    pub check_device_key_binding: bool,
    /// Number of random bytes in a minted mdocGeneratedNonce. Never zero.
    #[serde(deserialize_with = "nonce_len")]
    pub mdoc_generated_nonce_len: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("mdoc_generated_nonce_len must be at least 1")]
    EmptyNonce,
}

fn nonce_len<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    match usize::deserialize(deserializer)? {
        0 => Err(de::Error::custom(Error::EmptyNonce)),
        len => Ok(len),
    }
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            verify_issuer_digests: true,
            unaccepted_doc_type: UnacceptedDocTypePolicy::default(),
            check_device_key_binding: true,
            mdoc_generated_nonce_len: 16,
        }
    }
}

impl ResponseConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Checks a configuration that was built in code rather than parsed.
    pub fn validate(&self) -> Result<(), Error> {
        if self.mdoc_generated_nonce_len == 0 {
            return Err(Error::EmptyNonce);
        }
        Ok(())
    }
}
