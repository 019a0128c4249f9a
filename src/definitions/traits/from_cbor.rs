use crate::cbor::{self, Value};
use crate::definitions::Error;
use serde::de::DeserializeOwned;

pub trait FromCbor: DeserializeOwned {
    fn from_cbor(value: &Value) -> Result<Self, Error> {
        value.deserialized().map_err(Error::from)
    }

    /// Decode bytes holding exactly one data item into `Self`.
    ///
    /// Maps are canonicalized first, so a repeated key is not a schema error.
    fn from_cbor_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Self::from_cbor(&cbor::decode(bytes)?)
    }
}

impl<T: DeserializeOwned> FromCbor for T {}
