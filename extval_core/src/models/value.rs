//! Runtime values of backing beans

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Decimal(f64),
    Text(String),
    Object(Arc<Bean>),
}

/// An instance of a described type. Property values are a read-only snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bean {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

impl Bean {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(property.into(), value.into());
        self
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn into_value(self) -> Value {
        Value::Object(Arc::new(self))
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_empty_text(&self) -> bool {
        matches!(self, Value::Text(text) if text.is_empty())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Integers widen to decimals.
    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            Value::Integer(value) => Some(*value as f64),
            Value::Decimal(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bean(&self) -> Option<&Arc<Bean>> {
        match self {
            Value::Object(bean) => Some(bean),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
            Value::Object(_) => "object",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(value) => write!(f, "{}", value),
            Value::Integer(value) => write!(f, "{}", value),
            Value::Decimal(value) => write!(f, "{}", value),
            Value::Text(value) => write!(f, "{}", value),
            Value::Object(bean) => write!(f, "{}@{:p}", bean.type_name, Arc::as_ptr(bean)),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Decimal(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Bean> for Value {
    fn from(bean: Bean) -> Self {
        bean.into_value()
    }
}

impl From<Arc<Bean>> for Value {
    fn from(bean: Arc<Bean>) -> Self {
        Value::Object(bean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bean_deserializes_from_yaml() {
        let yaml = r#"
type: Person
properties:
  name: Jane
  age: 42
  active: true
  score: 1.5
  address:
    type: Address
    properties:
      city: Vienna
  nickname: ~
"#;
        let bean: Bean = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(bean.type_name, "Person");
        assert_eq!(bean.property("name"), Some(&Value::Text("Jane".to_string())));
        assert_eq!(bean.property("age"), Some(&Value::Integer(42)));
        assert_eq!(bean.property("active"), Some(&Value::Bool(true)));
        assert_eq!(bean.property("score"), Some(&Value::Decimal(1.5)));
        assert_eq!(bean.property("nickname"), Some(&Value::Null));

        let address = bean.property("address").and_then(Value::as_bean).unwrap();
        assert_eq!(address.type_name, "Address");
    }

    #[test]
    fn test_value_accessors() {
        assert!(Value::from("").is_empty_text());
        assert!(!Value::from("x").is_empty_text());
        assert_eq!(Value::from(3).as_decimal(), Some(3.0));
        assert_eq!(Value::from(2.5).as_integer(), None);
        assert_eq!(Value::Null.kind(), "null");
    }
}
