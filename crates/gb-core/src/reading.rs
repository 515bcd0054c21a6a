//! Aggregated per-cycle readings.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::value::Value;

/// One cycle's snapshot of field name to value.
///
/// Keys keep insertion order, which is also the persistence column order.
/// Inserting an existing key replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reading {
    entries: Vec<(String, Value)>,
}

impl Reading {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous value for that key if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Reading {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut reading = Reading::new();
        for (k, v) in iter {
            reading.insert(k, v);
        }
        reading
    }
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let mut r = Reading::new();
        r.insert("humidity", 80.0);
        r.insert("celsius", 21.0);
        r.insert("co2", 900_i64);
        assert_eq!(r.keys().collect::<Vec<_>>(), vec!["humidity", "celsius", "co2"]);
    }

    #[test]
    fn replace_keeps_position() {
        let mut r = Reading::new();
        r.insert("a", 1_i64);
        r.insert("b", 2_i64);
        let old = r.insert("a", 3_i64);
        assert_eq!(old, Some(Value::Int(1)));
        assert_eq!(r.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(r.get("a"), Some(&Value::Int(3)));
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn serializes_as_ordered_object() {
        let r: Reading = [("z", Value::Int(1)), ("a", Value::Bool(true))]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"z":1,"a":true}"#);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn keys_follow_first_insertion(keys in proptest::collection::vec("[a-e]", 0..30)) {
                let mut r = Reading::new();
                let mut expected: Vec<String> = Vec::new();
                for (i, key) in keys.iter().enumerate() {
                    r.insert(key.as_str(), i as i64);
                    if !expected.contains(key) {
                        expected.push(key.clone());
                    }
                }
                prop_assert_eq!(r.keys().collect::<Vec<_>>(), expected.iter().map(String::as_str).collect::<Vec<_>>());
                prop_assert_eq!(r.len(), expected.len());
            }
        }
    }
}
