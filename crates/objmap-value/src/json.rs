//! Bridges between [`Value`] and serde data
//!
//! JSON text, `serde_json::Value` and any `Serialize` type can be turned into
//! a [`Value`]; the reverse direction supports `DeserializeOwned` targets.

use crate::value::{Object, Value};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map_or(Value::Null, Value::Decimal),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(Object {
                type_name: None,
                fields: map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            }),
        }
    }
}

impl Value {
    /// Parse JSON text into a value
    ///
    /// # Errors
    ///
    /// Returns an error when the text is not valid JSON.
    pub fn parse_json(text: &str) -> Result<Self> {
        serde_json::from_str::<serde_json::Value>(text)
            .map(Value::from)
            .map_err(|e| Error::conversion("json", e.to_string()))
    }

    /// Convert to a `serde_json::Value`. Record type names are not carried;
    /// non-finite decimals become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Decimal(d) => serde_json::Number::from_f64(*d)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(object) => serde_json::Value::Object(
                object
                    .fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Build a value from any serializable type, tagging records with `type_name`
    ///
    /// # Errors
    ///
    /// Returns an error when serialization fails.
    pub fn from_serialize<T: Serialize>(data: &T, type_name: Option<&str>) -> Result<Self> {
        let json = serde_json::to_value(data)
            .map_err(|e| Error::conversion("serialize", e.to_string()))?;
        let mut value = Value::from(json);
        if let (Some(name), Value::Object(object)) = (type_name, &mut value) {
            object.type_name = Some(name.to_string());
        }
        Ok(value)
    }

    /// Deserialize the value into a concrete type
    ///
    /// # Errors
    ///
    /// Returns an error when the value does not fit the target type.
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.to_json())
            .map_err(|e| Error::conversion(std::any::type_name::<T>(), e.to_string()))
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct UserDto {
        id: i64,
        name: String,
        active: bool,
    }

    #[test]
    fn test_parse_json_object() {
        let value = Value::parse_json(r#"{"user_id": 1, "first_name": "John", "score": 1.5}"#)
            .unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.type_name, None);
        assert_eq!(object.get("user_id"), Some(&Value::Integer(1)));
        assert_eq!(object.get("score"), Some(&Value::Decimal(1.5)));
    }

    #[test]
    fn test_parse_json_rejects_garbage() {
        assert!(Value::parse_json("{not json").is_err());
    }

    #[test]
    fn test_serialize_bridge_tags_records() {
        let dto = UserDto {
            id: 3,
            name: "Grace".to_string(),
            active: true,
        };
        let value = Value::from_serialize(&dto, Some("UserDto")).unwrap();
        assert_eq!(value.type_name(), Some("UserDto"));

        let back: UserDto = value.deserialize_into().unwrap();
        assert_eq!(back, dto);
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let value: Value = serde_yaml::from_str("name: n/a\ncount: 0\n").unwrap();
        assert_eq!(value.get_path("count"), Some(&Value::Integer(0)));
    }
}
