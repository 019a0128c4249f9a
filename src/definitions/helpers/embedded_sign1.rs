//! A COSE_Sign1 carried inside an mdoc structure (`issuerAuth`, `deviceSignature`).
use crate::cbor::Value;
use crate::cose::{self, CoseSign1};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// The parsed frame together with the value it was parsed from.
///
/// Re-encoding writes the original value back out, so a frame passes through unchanged even when
/// coset would lay its headers out differently.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddedSign1 {
    sign1: CoseSign1,
    value: Value,
}

impl EmbeddedSign1 {
    pub fn new(sign1: CoseSign1) -> Result<Self, cose::Error> {
        let value = sign1.to_value()?;
        Ok(Self { sign1, value })
    }

    pub fn sign1(&self) -> &CoseSign1 {
        &self.sign1
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl TryFrom<Value> for EmbeddedSign1 {
    type Error = cose::Error;

    fn try_from(value: Value) -> Result<Self, cose::Error> {
        let sign1 = CoseSign1::from_value(value.clone())?;
        Ok(Self { sign1, value })
    }
}

impl Serialize for EmbeddedSign1 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EmbeddedSign1 {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(d)?;
        EmbeddedSign1::try_from(value)
            .map_err(|e| de::Error::custom(format!("not a COSE_Sign1: {e}")))
    }
}
