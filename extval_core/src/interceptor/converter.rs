//! Conversion of submitted text into typed values

use crate::models::Value;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("'{0}' is not a whole number")]
    NotAnInteger(String),

    #[error("'{0}' is not a number")]
    NotADecimal(String),
}

/// Turns the raw submitted string of a component into a value.
pub trait Converter: Send + Sync {
    fn name(&self) -> &'static str;

    fn as_value(&self, submitted: &str) -> Result<Value, ConversionError>;
}

#[derive(Debug, Default)]
pub struct TextConverter;

impl Converter for TextConverter {
    fn name(&self) -> &'static str {
        "text"
    }

    fn as_value(&self, submitted: &str) -> Result<Value, ConversionError> {
        Ok(Value::from(submitted))
    }
}

/// Blank input converts to null.
#[derive(Debug, Default)]
pub struct IntegerConverter;

impl Converter for IntegerConverter {
    fn name(&self) -> &'static str {
        "integer"
    }

    fn as_value(&self, submitted: &str) -> Result<Value, ConversionError> {
        let trimmed = submitted.trim();
        if trimmed.is_empty() {
            return Ok(Value::Null);
        }
        trimmed
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| ConversionError::NotAnInteger(submitted.to_string()))
    }
}

/// Blank input converts to null.
#[derive(Debug, Default)]
pub struct DecimalConverter;

impl Converter for DecimalConverter {
    fn name(&self) -> &'static str {
        "decimal"
    }

    fn as_value(&self, submitted: &str) -> Result<Value, ConversionError> {
        let trimmed = submitted.trim();
        if trimmed.is_empty() {
            return Ok(Value::Null);
        }
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|number| number.is_finite())
            .map(Value::Decimal)
            .ok_or_else(|| ConversionError::NotADecimal(submitted.to_string()))
    }
}

/// Converter for a name as used in fixtures.
pub fn converter_by_name(name: &str) -> Option<Arc<dyn Converter>> {
    match name {
        "text" => Some(Arc::new(TextConverter)),
        "integer" => Some(Arc::new(IntegerConverter)),
        "decimal" => Some(Arc::new(DecimalConverter)),
        _ => None,
    }
}
