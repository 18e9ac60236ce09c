//! Strategies for the property-validation annotations

use super::{violation, ValidationStrategy};
use crate::error::{ExtValError, Result};
use crate::models::annotation::{DoubleRange, Length, LongRange, Pattern, Required};
use crate::models::Value;
use crate::property::MetaDataEntry;
use crate::request::RequestContext;
use crate::ExtValEngine;
use parking_lot::RwLock;
use regex::Regex;
use std::collections::HashMap;
use tracing::trace;
use validator::{ValidateLength, ValidateRange, ValidationError};

#[derive(Debug, Default)]
pub struct RequiredStrategy;

impl RequiredStrategy {
    pub const NAME: &'static str = "RequiredStrategy";
}

impl ValidationStrategy for RequiredStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(
        &self,
        _engine: &ExtValEngine,
        _ctx: &RequestContext,
        entry: &MetaDataEntry,
        value: &Value,
    ) -> Result<Vec<ValidationError>> {
        let required = entry.value::<Required>()?;
        if value.is_null() || value.is_empty_text() {
            let message = required.message.clone().unwrap_or_else(|| "Value is required".to_string());
            return Ok(vec![violation("required", message)]);
        }
        Ok(Vec::new())
    }
}

#[derive(Debug, Default)]
pub struct LengthStrategy;

impl LengthStrategy {
    pub const NAME: &'static str = "LengthStrategy";
}

impl ValidationStrategy for LengthStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(
        &self,
        _engine: &ExtValEngine,
        _ctx: &RequestContext,
        entry: &MetaDataEntry,
        value: &Value,
    ) -> Result<Vec<ValidationError>> {
        let length = entry.value::<Length>()?;
        if value.is_null() {
            return Ok(Vec::new());
        }

        let text = value.to_string();
        let minimum = length.minimum as u64;
        let maximum = if length.maximum == usize::MAX { None } else { Some(length.maximum as u64) };

        if text.validate_length(Some(minimum), maximum, None) {
            return Ok(Vec::new());
        }

        let message = length.message.clone().unwrap_or_else(|| match maximum {
            None => format!("Value must be at least {} characters", minimum),
            Some(maximum) if minimum == 0 => format!("Value must be at most {} characters", maximum),
            Some(maximum) => format!("Value must be between {} and {} characters", minimum, maximum),
        });
        let mut error = violation("length", message);
        error.add_param("min".into(), &minimum);
        if let Some(maximum) = maximum {
            error.add_param("max".into(), &maximum);
        }
        Ok(vec![error])
    }
}

#[derive(Debug, Default)]
pub struct LongRangeStrategy;

impl LongRangeStrategy {
    pub const NAME: &'static str = "LongRangeStrategy";
}

impl ValidationStrategy for LongRangeStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(
        &self,
        _engine: &ExtValEngine,
        _ctx: &RequestContext,
        entry: &MetaDataEntry,
        value: &Value,
    ) -> Result<Vec<ValidationError>> {
        let range = entry.value::<LongRange>()?;
        if value.is_null() {
            return Ok(Vec::new());
        }

        let Some(number) = whole_number(value) else {
            return Ok(vec![violation("range", "Value is not a whole number")]);
        };

        if number.validate_range(Some(range.minimum), Some(range.maximum), None, None) {
            return Ok(Vec::new());
        }

        let message = range
            .message
            .clone()
            .unwrap_or_else(|| format!("Value must be between {} and {}", range.minimum, range.maximum));
        let mut error = violation("range", message);
        error.add_param("min".into(), &range.minimum);
        error.add_param("max".into(), &range.maximum);
        Ok(vec![error])
    }
}

#[derive(Debug, Default)]
pub struct DoubleRangeStrategy;

impl DoubleRangeStrategy {
    pub const NAME: &'static str = "DoubleRangeStrategy";
}

impl ValidationStrategy for DoubleRangeStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(
        &self,
        _engine: &ExtValEngine,
        _ctx: &RequestContext,
        entry: &MetaDataEntry,
        value: &Value,
    ) -> Result<Vec<ValidationError>> {
        let range = entry.value::<DoubleRange>()?;
        if value.is_null() {
            return Ok(Vec::new());
        }

        let number = match value {
            Value::Text(text) => text.trim().parse::<f64>().ok(),
            other => other.as_decimal(),
        };
        let Some(number) = number else {
            return Ok(vec![violation("range", "Value is not a number")]);
        };

        if number.validate_range(Some(range.minimum), Some(range.maximum), None, None) {
            return Ok(Vec::new());
        }

        let message = range
            .message
            .clone()
            .unwrap_or_else(|| format!("Value must be between {} and {}", range.minimum, range.maximum));
        Ok(vec![violation("range", message)])
    }
}

/// Every pattern has to match the whole value.
#[derive(Debug, Default)]
pub struct PatternStrategy {
    compiled: RwLock<HashMap<String, Regex>>,
}

impl PatternStrategy {
    pub const NAME: &'static str = "PatternStrategy";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn matches(&self, pattern: &str, text: &str) -> Result<bool> {
        if let Some(regex) = self.compiled.read().get(pattern) {
            return Ok(regex.is_match(text));
        }

        let regex = Regex::new(&format!("^(?:{})$", pattern))
            .map_err(|error| ExtValError::InvalidExpression(format!("{}: {}", pattern, error)))?;
        let matched = regex.is_match(text);
        self.compiled.write().insert(pattern.to_string(), regex);
        Ok(matched)
    }
}

impl ValidationStrategy for PatternStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(
        &self,
        _engine: &ExtValEngine,
        _ctx: &RequestContext,
        entry: &MetaDataEntry,
        value: &Value,
    ) -> Result<Vec<ValidationError>> {
        let pattern = entry.value::<Pattern>()?;
        if value.is_null() {
            return Ok(Vec::new());
        }

        let text = value.to_string();
        for expression in &pattern.value {
            if !self.matches(expression, &text)? {
                let message = pattern
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("Value does not match {}", expression));
                let mut error = violation("pattern", message);
                error.add_param("pattern".into(), expression);
                return Ok(vec![error]);
            }
        }
        Ok(Vec::new())
    }
}

/// Referenced validators run inside the host framework; nothing to do here.
#[derive(Debug, Default)]
pub struct ValidatorStrategy;

impl ValidatorStrategy {
    pub const NAME: &'static str = "ValidatorStrategy";
}

impl ValidationStrategy for ValidatorStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(
        &self,
        _engine: &ExtValEngine,
        _ctx: &RequestContext,
        entry: &MetaDataEntry,
        _value: &Value,
    ) -> Result<Vec<ValidationError>> {
        trace!(key = entry.key(), "Delegated to host validators");
        Ok(Vec::new())
    }
}

fn whole_number(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(number) => Some(*number),
        Value::Decimal(number) if number.fract() == 0.0 => Some(*number as i64),
        Value::Text(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}
