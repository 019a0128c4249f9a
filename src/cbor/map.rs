use super::Value;
use ciborium::value::Integer;

/// A map key in the mdoc profile: either an integer or a text string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Int(i128),
    Text(String),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum MapError {
    #[error("expected a CBOR map, received: '{0:?}'")]
    NotAMap(Box<Value>),
    #[error("map keys must be integers or text strings, received: '{0:?}'")]
    UnsupportedKey(Box<Value>),
}

/// A decoded CBOR map with unique int/text keys, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CborMap {
    entries: Vec<(MapKey, Value)>,
}

impl MapKey {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MapKey::Text(s) => Some(s),
            MapKey::Int(_) => None,
        }
    }
}

impl std::fmt::Display for MapKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapKey::Int(i) => write!(f, "{i}"),
            MapKey::Text(s) => f.write_str(s),
        }
    }
}

impl TryFrom<&Value> for MapKey {
    type Error = MapError;

    fn try_from(value: &Value) -> Result<Self, MapError> {
        match value {
            Value::Integer(i) => Ok(MapKey::Int(i128::from(*i))),
            Value::Text(s) => Ok(MapKey::Text(s.clone())),
            other => Err(MapError::UnsupportedKey(Box::new(other.clone()))),
        }
    }
}

impl From<MapKey> for Value {
    fn from(key: MapKey) -> Value {
        match key {
            // Keys are only ever built from decoded integers, so they fit.
            MapKey::Int(i) => Integer::try_from(i)
                .map(Value::Integer)
                .unwrap_or_else(|_| Value::Text(i.to_string())),
            MapKey::Text(s) => Value::Text(s),
        }
    }
}

impl From<&str> for MapKey {
    fn from(s: &str) -> Self {
        MapKey::Text(s.to_string())
    }
}

impl From<i64> for MapKey {
    fn from(i: i64) -> Self {
        MapKey::Int(i.into())
    }
}

impl CborMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: impl Into<MapKey>) -> Option<&Value> {
        let key = key.into();
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: impl Into<MapKey>) -> bool {
        self.get(key).is_some()
    }

    /// Take the value out of the map, leaving the remaining entries in order.
    pub fn remove(&mut self, key: impl Into<MapKey>) -> Option<Value> {
        let key = key.into();
        let pos = self.entries.iter().position(|(k, _)| *k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Insert or replace, keeping the position of an existing key.
    pub fn insert(&mut self, key: impl Into<MapKey>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &MapKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MapKey, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl IntoIterator for CborMap {
    type Item = (MapKey, Value);
    type IntoIter = std::vec::IntoIter<(MapKey, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl TryFrom<Value> for CborMap {
    type Error = MapError;

    fn try_from(value: Value) -> Result<Self, MapError> {
        let Value::Map(raw) = value else {
            return Err(MapError::NotAMap(Box::new(value)));
        };
        let mut map = CborMap::new();
        for (k, v) in raw {
            map.insert(MapKey::try_from(&k)?, v);
        }
        Ok(map)
    }
}

impl From<CborMap> for Value {
    fn from(map: CborMap) -> Value {
        Value::Map(map.entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn duplicate_keys_collapse() {
        let value = Value::Map(vec![
            (Value::Text("a".into()), Value::Integer(1.into())),
            (Value::Integer((-1).into()), Value::Bool(true)),
            (Value::Text("a".into()), Value::Integer(2.into())),
        ]);
        let mut map = CborMap::try_from(value).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some(&Value::Integer(2.into())));
        assert_eq!(map.remove(-1i64), Some(Value::Bool(true)));
        assert!(map.get(-1i64).is_none());
    }

    #[test]
    fn byte_string_keys_are_rejected() {
        let value = Value::Map(vec![(Value::Bytes(vec![1]), Value::Null)]);
        assert!(matches!(
            CborMap::try_from(value),
            Err(MapError::UnsupportedKey(_))
        ));
    }
}
