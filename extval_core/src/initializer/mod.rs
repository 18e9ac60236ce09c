//! Component configuration from abstract metadata
//!
//! Initializers only touch validators attached by this layer (keyed by slot)
//! and the weak required flag, so applying the same metadata again leaves the
//! component unchanged.

use crate::metadata::keys::{self, string_list, MetaData};
use crate::models::{InputComponent, NativeValidator};
use crate::request::RequestContext;
use serde_json::Value as JsonValue;
use std::sync::Arc;

pub trait ComponentInitializer: Send + Sync {
    fn name(&self) -> &'static str;

    fn configure_component(&self, ctx: &RequestContext, component: &mut InputComponent, meta_data: &MetaData);
}

/// Attaches a length validator and the `maxlength` attribute, replacing the
/// ones from an earlier render.
#[derive(Debug, Default)]
pub struct LengthInitializer;

impl ComponentInitializer for LengthInitializer {
    fn name(&self) -> &'static str {
        "length"
    }

    fn configure_component(&self, _ctx: &RequestContext, component: &mut InputComponent, meta_data: &MetaData) {
        let minimum = meta_data.get(keys::MIN_LENGTH).and_then(JsonValue::as_u64);
        let maximum = meta_data.get(keys::MAX_LENGTH).and_then(JsonValue::as_u64);

        if let Some(NativeValidator::Length { maximum: Some(previous), .. }) =
            component.extval_validators.remove("length")
        {
            // only a maxlength this initializer wrote is dropped
            if component.attributes.get("maxlength") == Some(&JsonValue::from(previous)) {
                component.attributes.remove("maxlength");
            }
        }

        if minimum.is_none() && maximum.is_none() {
            return;
        }
        // a zero minimum on its own does not restrict anything
        if maximum.is_none() && minimum == Some(0) {
            return;
        }

        component.attach_validator(NativeValidator::Length { minimum, maximum });
        if let Some(maximum) = maximum {
            component.attributes.insert("maxlength".to_string(), JsonValue::from(maximum));
        }
    }
}

/// Attaches a long range validator for integral bounds, a double range
/// validator otherwise.
#[derive(Debug, Default)]
pub struct RangeInitializer;

impl ComponentInitializer for RangeInitializer {
    fn name(&self) -> &'static str {
        "range"
    }

    fn configure_component(&self, _ctx: &RequestContext, component: &mut InputComponent, meta_data: &MetaData) {
        let minimum = meta_data.get(keys::RANGE_MIN);
        let maximum = meta_data.get(keys::RANGE_MAX);

        if minimum.is_none() && maximum.is_none() {
            component.extval_validators.remove("range");
            return;
        }

        let integral = [minimum, maximum].into_iter().flatten().all(JsonValue::is_i64);
        let validator = if integral {
            NativeValidator::LongRange {
                minimum: minimum.and_then(JsonValue::as_i64),
                maximum: maximum.and_then(JsonValue::as_i64),
            }
        } else {
            NativeValidator::DoubleRange {
                minimum: minimum.and_then(JsonValue::as_f64),
                maximum: maximum.and_then(JsonValue::as_f64),
            }
        };
        component.attach_validator(validator);
    }
}

#[derive(Debug, Default)]
pub struct RequiredInitializer;

impl ComponentInitializer for RequiredInitializer {
    fn name(&self) -> &'static str {
        "required"
    }

    fn configure_component(&self, _ctx: &RequestContext, component: &mut InputComponent, meta_data: &MetaData) {
        if keys::flag(meta_data, keys::REQUIRED) {
            component.set_required(true);
        } else if keys::flag(meta_data, keys::WEAK_REQUIRED) {
            component.mark_weak_required();
        }
    }
}

/// One regex validator per pattern. Patterns no longer present are dropped.
#[derive(Debug, Default)]
pub struct PatternInitializer;

impl ComponentInitializer for PatternInitializer {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn configure_component(&self, _ctx: &RequestContext, component: &mut InputComponent, meta_data: &MetaData) {
        let patterns = string_list(meta_data, keys::PATTERN);

        component.extval_validators.retain(|_, validator| match validator {
            NativeValidator::Regex { pattern } => patterns.contains(pattern),
            _ => true,
        });
        for pattern in patterns {
            component.attach_validator(NativeValidator::Regex { pattern });
        }
    }
}

/// Custom validator references and the email validator. References no
/// longer present are dropped.
#[derive(Debug, Default)]
pub struct CustomValidatorInitializer;

impl ComponentInitializer for CustomValidatorInitializer {
    fn name(&self) -> &'static str {
        "custom"
    }

    fn configure_component(&self, _ctx: &RequestContext, component: &mut InputComponent, meta_data: &MetaData) {
        let ids = string_list(meta_data, keys::CUSTOM);
        let email = keys::flag(meta_data, keys::EMAIL);

        component.extval_validators.retain(|_, validator| match validator {
            NativeValidator::Custom { id } => ids.contains(id),
            NativeValidator::Email => email,
            _ => true,
        });
        for id in ids {
            component.attach_validator(NativeValidator::Custom { id });
        }
        if email {
            component.attach_validator(NativeValidator::Email);
        }
    }
}

pub fn default_initializers() -> Vec<Arc<dyn ComponentInitializer>> {
    vec![
        Arc::new(RequiredInitializer),
        Arc::new(LengthInitializer),
        Arc::new(RangeInitializer),
        Arc::new(PatternInitializer),
        Arc::new(CustomValidatorInitializer),
    ]
}
