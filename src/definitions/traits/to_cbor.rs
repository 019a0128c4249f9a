//! ToCbor is blanket-implemented for everything serde can serialize. Byte strings have to be
//! marked with `serde_bytes`, otherwise a `Vec<u8>` is written as an array of integers.
use crate::cbor::{self, Value};
use serde::Serialize;

pub trait ToCbor: Serialize {
    fn to_cbor(&self) -> Result<Value, cbor::Error> {
        Value::serialized(self).map_err(|e| cbor::Error::EncodeFailed(value_error(e)))
    }

    fn to_cbor_bytes(&self) -> Result<Vec<u8>, cbor::Error> {
        cbor::encode(&self.to_cbor()?)
    }
}

impl<T: Serialize> ToCbor for T {}

pub(crate) fn value_error(e: ciborium::value::Error) -> String {
    match e {
        ciborium::value::Error::Custom(msg) => msg,
    }
}
