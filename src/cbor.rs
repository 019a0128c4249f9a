//! CBOR codec for the mdoc data model.
//!
//! Decoding is lenient: definite and indefinite length items are both accepted, as long as the
//! input holds exactly one well-formed data item. Encoding is strict: the output always uses
//! definite lengths and the shortest form for every integer and length argument, so that bytes
//! which are signed can be rebuilt identically by the other party.
//!
//! Values are represented with [ciborium::Value], which keeps map entries in insertion order and
//! keeps the major type of every key.
use thiserror::Error;

mod json;
mod map;

pub use ciborium::Value;
pub use json::{bytes_to_json, to_json};
pub use map::{CborMap, MapError, MapKey};

/// CBOR tag number of an embedded CBOR data item.
pub const TAG_ENCODED_CBOR: u64 = 24;
/// CBOR tag number of a standard date/time string.
pub const TAG_DATE_TIME: u64 = 0;

#[derive(Debug, Error)]
pub enum Error {
    /// Input ended before the data item was complete.
    #[error("truncated CBOR input: {0}")]
    Truncated(String),
    /// An invalid initial byte, major type / argument combination or break code.
    #[error("invalid CBOR syntax at offset {0}")]
    Syntax(usize),
    /// Structurally valid CBOR that could not be represented.
    #[error("unsupported CBOR item: {0}")]
    Semantic(String),
    #[error("CBOR nesting exceeds the recursion limit")]
    RecursionLimitExceeded,
    /// Bytes remained after the top-level data item.
    #[error("extraneous data: {0} bytes after the top-level CBOR item")]
    ExtraneousData(usize),
    #[error("unable to encode CBOR: {0}")]
    EncodeFailed(String),
}

impl From<ciborium::de::Error<std::io::Error>> for Error {
    fn from(e: ciborium::de::Error<std::io::Error>) -> Self {
        match e {
            ciborium::de::Error::Io(e) => Error::Truncated(e.to_string()),
            ciborium::de::Error::Syntax(offset) => Error::Syntax(offset),
            ciborium::de::Error::Semantic(_, msg) => Error::Semantic(msg),
            ciborium::de::Error::RecursionLimitExceeded => Error::RecursionLimitExceeded,
        }
    }
}

/// Parse exactly one CBOR data item, keeping the raw tree as it was on the wire.
///
/// Duplicate map keys are retained; see [decode] for the canonicalized tree.
pub fn from_slice(bytes: &[u8]) -> Result<Value, Error> {
    let mut remaining = bytes;
    let value: Value = ciborium::de::from_reader(&mut remaining)?;
    if !remaining.is_empty() {
        return Err(Error::ExtraneousData(remaining.len()));
    }
    Ok(value)
}

/// Decode a CBOR data item and canonicalize every map so that each key occurs once.
///
/// When a key is repeated, the entry keeps the position of its first occurrence and the value of
/// its last one.
pub fn decode(bytes: &[u8]) -> Result<Value, Error> {
    from_slice(bytes).map(canonicalize)
}

/// Encode a value with definite lengths and shortest-form arguments.
pub fn encode(value: &Value) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf).map_err(|e| Error::EncodeFailed(format!("{e:?}")))?;
    Ok(buf)
}

/// Recursively collapse duplicate map keys, last value wins.
pub fn canonicalize(value: Value) -> Value {
    match value {
        Value::Map(entries) => {
            let mut unique: Vec<(Value, Value)> = Vec::with_capacity(entries.len());
            for (k, v) in entries {
                let v = canonicalize(v);
                match unique.iter_mut().find(|(existing, _)| *existing == k) {
                    Some(slot) => slot.1 = v,
                    None => unique.push((k, v)),
                }
            }
            Value::Map(unique)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        Value::Tag(tag, inner) => Value::Tag(tag, Box::new(canonicalize(*inner))),
        other => other,
    }
}

/// Wrap already-encoded CBOR bytes as an embedded data item (`#6.24(bstr)`).
pub fn tag24(inner_bytes: Vec<u8>) -> Value {
    Value::Tag(TAG_ENCODED_CBOR, Box::new(Value::Bytes(inner_bytes)))
}

/// The bytes inside an embedded data item, if the value is one.
pub fn untag24(value: &Value) -> Option<&[u8]> {
    match value {
        Value::Tag(TAG_ENCODED_CBOR, inner) => inner.as_bytes().map(Vec::as_slice),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hex::FromHex;

    #[test]
    fn indefinite_length_items_are_accepted() {
        // {_ "a": [_ 1, 2], "b": (_ h'0102', h'03')}
        let bytes = <Vec<u8>>::from_hex("bf61619f0102ff61625f4201024103ffff").unwrap();
        let value = decode(&bytes).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(
            map[0].1,
            Value::Array(vec![Value::Integer(1.into()), Value::Integer(2.into())])
        );
        assert_eq!(map[1].1, Value::Bytes(vec![1, 2, 3]));
    }

    #[test]
    fn encoding_is_definite_and_canonical() {
        let bytes = <Vec<u8>>::from_hex("bf61619f0102ffff").unwrap();
        let once = encode(&decode(&bytes).unwrap()).unwrap();
        assert_eq!(hex::encode(&once), "a16161820102");
        let twice = encode(&decode(&once).unwrap()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn shortest_form_integers() {
        assert_eq!(encode(&Value::Integer(23.into())).unwrap(), vec![0x17]);
        assert_eq!(encode(&Value::Integer(24.into())).unwrap(), vec![0x18, 0x18]);
        assert_eq!(encode(&Value::Integer((-1).into())).unwrap(), vec![0x20]);
        assert_eq!(encode(&Value::Integer((-500).into())).unwrap(), vec![0x39, 0x01, 0xf3]);
        // Non-minimal encodings are accepted on the way in and minimized on the way out.
        let padded = decode(&[0x1a, 0x00, 0x00, 0x00, 0x05]).unwrap();
        assert_eq!(encode(&padded).unwrap(), vec![0x05]);
    }

    #[test]
    fn truncated_input_is_rejected() {
        // Array of three, two present.
        assert!(matches!(decode(&[0x83, 0x01, 0x02]), Err(Error::Truncated(_))));
        // Byte string claiming four bytes, two present.
        assert!(decode(&[0x44, 0x01, 0x02]).is_err());
        assert!(decode(&[]).is_err());
    }

    #[test]
    fn unterminated_indefinite_length_is_rejected() {
        assert!(decode(&[0x9f, 0x01, 0x02]).is_err());
        assert!(decode(&[0xbf, 0x61, 0x61, 0x01]).is_err());
    }

    #[test]
    fn invalid_additional_information_is_rejected() {
        // Additional information 28 is reserved.
        assert!(decode(&[0x1c]).is_err());
        // A stray break code.
        assert!(decode(&[0xff]).is_err());
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        assert!(matches!(decode(&[0x01, 0x02]), Err(Error::ExtraneousData(1))));
    }

    #[test]
    fn duplicate_keys_keep_last_value_at_first_position() {
        // {"a": 1, "b": 2, "a": 3}
        let bytes = <Vec<u8>>::from_hex("a3616101616202616103").unwrap();
        let raw = from_slice(&bytes).unwrap();
        assert_eq!(raw.as_map().unwrap().len(), 3);
        let value = decode(&bytes).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[0], (Value::Text("a".into()), Value::Integer(3.into())));
        assert_eq!(map[1], (Value::Text("b".into()), Value::Integer(2.into())));
    }

    #[test]
    fn int_and_text_keys_are_distinct() {
        // {1: "int", "1": "text"}
        let bytes = <Vec<u8>>::from_hex("a20163696e7461316474657874").unwrap();
        let value = decode(&bytes).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[0].0, Value::Integer(1.into()));
        assert_eq!(map[1].0, Value::Text("1".into()));
    }

    #[test]
    fn tag24_wraps_and_unwraps() {
        let inner = encode(&Value::Text("hello".into())).unwrap();
        let wrapped = tag24(inner.clone());
        let bytes = encode(&wrapped).unwrap();
        assert_eq!(&bytes[..2], &[0xd8, 0x18]);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(untag24(&decoded), Some(inner.as_slice()));
        assert_eq!(untag24(&Value::Null), None);
    }
}
