//! Validation strategies: behaviour attached to a constraint type

pub mod bean_validation;
pub mod join;
pub mod property;

pub use bean_validation::BeanValidationStrategyAdapter;
pub use join::JoinValidationStrategy;
pub use property::{
    DoubleRangeStrategy, LengthStrategy, LongRangeStrategy, PatternStrategy, RequiredStrategy, ValidatorStrategy,
};

use crate::error::Result;
use crate::models::annotation::{
    AnnotationType, DoubleRange, JoinValidation, Length, LongRange, Pattern, Required, Validator,
};
use crate::models::Value;
use crate::property::MetaDataEntry;
use crate::registry::ClassCatalog;
use crate::request::RequestContext;
use crate::ExtValEngine;
use std::borrow::Cow;
use std::sync::Arc;
use validator::ValidationError;

/// Validates a converted value against one metadata entry.
///
/// The strategy name identifies the strategy to the transformer registry.
pub trait ValidationStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the violations found; an empty list means the value passed.
    fn validate(
        &self,
        engine: &ExtValEngine,
        ctx: &RequestContext,
        entry: &MetaDataEntry,
        value: &Value,
    ) -> Result<Vec<ValidationError>>;
}

/// Built-in strategy for an annotation key.
pub fn default_strategy_name(annotation_key: &str) -> Option<&'static str> {
    let defaults = [
        (Required::KEY, RequiredStrategy::NAME),
        (Length::KEY, LengthStrategy::NAME),
        (LongRange::KEY, LongRangeStrategy::NAME),
        (DoubleRange::KEY, DoubleRangeStrategy::NAME),
        (Pattern::KEY, PatternStrategy::NAME),
        (Validator::KEY, ValidatorStrategy::NAME),
        (JoinValidation::KEY, JoinValidationStrategy::NAME),
    ];

    defaults
        .iter()
        .find(|(key, _)| *key == annotation_key)
        .map(|(_, name)| *name)
}

pub fn register_defaults(catalog: &mut ClassCatalog<dyn ValidationStrategy>) {
    catalog.register(RequiredStrategy::NAME, || Ok(Arc::new(RequiredStrategy) as Arc<dyn ValidationStrategy>));
    catalog.register(LengthStrategy::NAME, || Ok(Arc::new(LengthStrategy) as Arc<dyn ValidationStrategy>));
    catalog.register(LongRangeStrategy::NAME, || Ok(Arc::new(LongRangeStrategy) as Arc<dyn ValidationStrategy>));
    catalog.register(DoubleRangeStrategy::NAME, || {
        Ok(Arc::new(DoubleRangeStrategy) as Arc<dyn ValidationStrategy>)
    });
    catalog.register(PatternStrategy::NAME, || Ok(Arc::new(PatternStrategy::new()) as Arc<dyn ValidationStrategy>));
    catalog.register(ValidatorStrategy::NAME, || Ok(Arc::new(ValidatorStrategy) as Arc<dyn ValidationStrategy>));
    catalog.register(JoinValidationStrategy::NAME, || {
        Ok(Arc::new(JoinValidationStrategy) as Arc<dyn ValidationStrategy>)
    });
}

pub(crate) fn violation(code: &'static str, message: impl Into<String>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(message.into()));
    error
}

/// Message of a validation error, falling back to its code.
pub fn error_message(error: &ValidationError) -> String {
    error
        .message
        .as_ref()
        .map(|message| message.to_string())
        .unwrap_or_else(|| error.code.to_string())
}
