//! Rendering of CBOR trees as JSON for callers that do not speak CBOR.
use super::{Value, TAG_ENCODED_CBOR};
use serde_json::{Map, Number, Value as JsonValue};

/// Render a byte string the way every byte string is rendered: base64url without padding.
pub fn bytes_to_json(bytes: &[u8]) -> JsonValue {
    JsonValue::String(base64::encode_config(bytes, base64::URL_SAFE_NO_PAD))
}

/// Convert a CBOR tree into a JSON tree.
///
/// - byte strings become base64url text,
/// - tags are dropped and their content rendered in place; an embedded data item (tag 24) is
///   rendered as the tree it contains when that parses, and as its bytes otherwise,
/// - map keys that are not text are stringified.
pub fn to_json(value: &Value) -> JsonValue {
    match value {
        Value::Integer(i) => {
            let i = i128::from(*i);
            if let Ok(n) = i64::try_from(i) {
                JsonValue::Number(n.into())
            } else if let Ok(n) = u64::try_from(i) {
                JsonValue::Number(n.into())
            } else {
                JsonValue::String(i.to_string())
            }
        }
        Value::Bytes(b) => bytes_to_json(b),
        Value::Float(f) => Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Text(s) => JsonValue::String(s.clone()),
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Null => JsonValue::Null,
        Value::Tag(TAG_ENCODED_CBOR, inner) => match inner.as_ref() {
            Value::Bytes(bytes) => super::decode(bytes)
                .map(|embedded| to_json(&embedded))
                .unwrap_or_else(|_| bytes_to_json(bytes)),
            other => to_json(other),
        },
        Value::Tag(_, inner) => to_json(inner),
        Value::Array(items) => JsonValue::Array(items.iter().map(to_json).collect()),
        Value::Map(entries) => {
            let mut object = Map::new();
            for (k, v) in entries {
                object.insert(key_to_string(k), to_json(v));
            }
            JsonValue::Object(object)
        }
        _ => JsonValue::Null,
    }
}

fn key_to_string(key: &Value) -> String {
    match key {
        Value::Text(s) => s.clone(),
        Value::Integer(i) => i128::from(*i).to_string(),
        other => match to_json(other) {
            JsonValue::String(s) => s,
            rendered => rendered.to_string(),
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_mdoc_shapes() {
        let value = Value::Map(vec![
            (Value::Integer(1.into()), Value::Integer(2.into())),
            (Value::Integer((-2).into()), Value::Bytes(vec![0xfb, 0xff])),
            (
                Value::Text("birth_date".into()),
                Value::Tag(1004, Box::new(Value::Text("1990-01-01".into()))),
            ),
            (Value::Text("flags".into()), Value::Array(vec![Value::Bool(true), Value::Null])),
        ]);
        assert_eq!(
            to_json(&value),
            json!({
                "1": 2,
                "-2": "-_8",
                "birth_date": "1990-01-01",
                "flags": [true, null],
            })
        );
    }

    #[test]
    fn embedded_cbor_is_expanded() {
        let inner = crate::cbor::encode(&Value::Text("nested".into())).unwrap();
        assert_eq!(to_json(&crate::cbor::tag24(inner)), json!("nested"));
        // Not CBOR: rendered as the raw bytes.
        assert_eq!(to_json(&crate::cbor::tag24(vec![0xff])), json!("_w"));
    }
}
