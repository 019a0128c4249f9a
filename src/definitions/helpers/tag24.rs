//! Support for embedded
//! [CBOR Data Items](https://www.ietf.org/rfc/rfc8949.html#name-encoded-cbor-data-item),
//! also known as a tagged data item with tag number 24.
use crate::cbor::{self, Value, TAG_ENCODED_CBOR};
use crate::definitions::traits::{FromCbor, ToCbor};
use ciborium::tag::Required;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_bytes::{ByteBuf, Bytes};

/// A value carried as `#6.24(bstr .cbor T)`.
///
/// The embedded bytes are kept exactly as received, so digests and signatures computed over them
/// by someone else still match after the value is passed on.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag24<T> {
    inner: T,
    pub inner_bytes: Vec<u8>,
}

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to encode value as CBOR: {0}")]
    UnableToEncode(cbor::Error),
    #[error("unable to decode embedded CBOR: {0}")]
    UnableToDecode(cbor::Error),
    #[error("{0}")]
    Inner(Box<crate::definitions::Error>),
}

impl<T> Tag24<T> {
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: ToCbor> Tag24<T> {
    pub fn new(inner: T) -> Result<Tag24<T>> {
        let inner_bytes = inner.to_cbor_bytes().map_err(Error::UnableToEncode)?;
        Ok(Self { inner, inner_bytes })
    }
}

impl<T: FromCbor> Tag24<T> {
    pub fn from_bytes(inner_bytes: Vec<u8>) -> Result<Tag24<T>> {
        let value = cbor::decode(&inner_bytes).map_err(Error::UnableToDecode)?;
        let inner = T::from_cbor(&value).map_err(|e| Error::Inner(Box::new(e)))?;
        Ok(Self { inner, inner_bytes })
    }
}

impl<T> From<Tag24<T>> for Value {
    fn from(Tag24 { inner_bytes, .. }: Tag24<T>) -> Value {
        cbor::tag24(inner_bytes)
    }
}

impl<T> AsRef<T> for Tag24<T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}

impl<T> Serialize for Tag24<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        Required::<_, TAG_ENCODED_CBOR>(Bytes::new(&self.inner_bytes)).serialize(serializer)
    }
}

impl<'de, T: FromCbor> Deserialize<'de> for Tag24<T> {
    fn deserialize<D>(d: D) -> std::result::Result<Tag24<T>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Required(inner_bytes) = Required::<ByteBuf, TAG_ENCODED_CBOR>::deserialize(d)?;
        Tag24::from_bytes(inner_bytes.into_vec()).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::Tag24;
    use crate::cbor::{self, Value};
    use crate::definitions::traits::{FromCbor, ToCbor};
    use crate::definitions::IssuerSignedItem;

    #[test]
    fn original_bytes_survive_reencoding() {
        // {"digestID": 0x00000007 (non-minimal), "random": h'00', "elementIdentifier": "a",
        //  "elementValue": true}
        let mut inner = vec![0xa4];
        inner.extend_from_slice(&[0x68]);
        inner.extend_from_slice(b"digestID");
        inner.extend_from_slice(&[0x1a, 0x00, 0x00, 0x00, 0x07]);
        inner.extend_from_slice(&[0x66]);
        inner.extend_from_slice(b"random");
        inner.extend_from_slice(&[0x41, 0x00]);
        inner.extend_from_slice(&[0x71]);
        inner.extend_from_slice(b"elementIdentifier");
        inner.extend_from_slice(&[0x61, b'a']);
        inner.extend_from_slice(&[0x6c]);
        inner.extend_from_slice(b"elementValue");
        inner.extend_from_slice(&[0xf5]);

        let wrapped = cbor::encode(&cbor::tag24(inner.clone())).unwrap();
        let item = Tag24::<IssuerSignedItem>::from_cbor_bytes(&wrapped).unwrap();
        assert_eq!(item.as_ref().digest_id, 7);
        assert_eq!(item.as_ref().random, vec![0x00]);
        assert_eq!(item.inner_bytes, inner);
        assert_eq!(item.to_cbor_bytes().unwrap(), wrapped);
        assert_eq!(Value::from(item), cbor::tag24(inner));
    }

    #[test]
    fn not_a_tag24() {
        assert!(Tag24::<IssuerSignedItem>::from_cbor(&Value::Bytes(vec![])).is_err());
        assert!(Tag24::<IssuerSignedItem>::from_cbor(&Value::Tag(24, Box::new(Value::Null))).is_err());
        assert!(Tag24::<IssuerSignedItem>::from_cbor(&Value::Tag(
            1,
            Box::new(Value::Bytes(vec![0xa0]))
        ))
        .is_err());
    }

    #[test]
    fn inner_schema_errors_keep_their_field() {
        // {"digestID": 1}
        let inner = cbor::encode(&Value::Map(vec![(
            Value::Text("digestID".into()),
            Value::Integer(1.into()),
        )]))
        .unwrap();
        let err = Tag24::<IssuerSignedItem>::from_cbor(&cbor::tag24(inner)).unwrap_err();
        assert_eq!(err.field(), Some("random"));
    }
}
