//! Conversion of metadata entries into abstract configuration keys

use super::extractor::{ExtractionTarget, JoinAwareMetaDataExtractor, MetaDataExtractor};
use super::keys::{self, merge_meta_data, MetaData};
use crate::error::Result;
use crate::models::annotation::{AnnotationType, DoubleRange, JoinValidation, Length, LongRange, Pattern, Validator};
use crate::models::types::simple_name;
use crate::models::{ConstraintDescriptor, ConstraintKind};
use crate::property::MetaDataEntry;
use crate::registry::ClassCatalog;
use crate::request::RequestContext;
use crate::strategy::join::join_targets;
use crate::strategy::{
    BeanValidationStrategyAdapter, DoubleRangeStrategy, JoinValidationStrategy, LengthStrategy, LongRangeStrategy,
    PatternStrategy, RequiredStrategy, ValidatorStrategy,
};
use crate::ExtValEngine;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tracing::{debug, warn};

/// Turns one metadata entry into configuration keys.
pub trait MetaDataTransformer: Send + Sync {
    fn name(&self) -> &str;

    fn convert_meta_data(&self, engine: &ExtValEngine, ctx: &RequestContext, entry: &MetaDataEntry)
        -> Result<MetaData>;
}

macro_rules! transformer_name {
    ($transformer:ident, $name:literal) => {
        impl $transformer {
            pub const NAME: &'static str = $name;
        }
    };
}

#[derive(Debug, Default)]
pub struct RequiredMetaDataTransformer;
transformer_name!(RequiredMetaDataTransformer, "RequiredMetaDataTransformer");

impl MetaDataTransformer for RequiredMetaDataTransformer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn convert_meta_data(&self, _: &ExtValEngine, _: &RequestContext, _: &MetaDataEntry) -> Result<MetaData> {
        Ok(MetaData::from([(keys::REQUIRED.to_string(), JsonValue::Bool(true))]))
    }
}

#[derive(Debug, Default)]
pub struct LengthMetaDataTransformer;
transformer_name!(LengthMetaDataTransformer, "LengthMetaDataTransformer");

impl MetaDataTransformer for LengthMetaDataTransformer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn convert_meta_data(&self, _: &ExtValEngine, _: &RequestContext, entry: &MetaDataEntry) -> Result<MetaData> {
        let length = entry.value::<Length>()?;
        Ok(length_meta_data(length.minimum, length.maximum))
    }
}

fn length_meta_data(minimum: usize, maximum: usize) -> MetaData {
    let mut results = MetaData::new();
    results.insert(keys::MIN_LENGTH.to_string(), json!(minimum));
    if maximum != usize::MAX {
        results.insert(keys::MAX_LENGTH.to_string(), json!(maximum));
    }
    if minimum > 0 {
        results.insert(keys::WEAK_REQUIRED.to_string(), JsonValue::Bool(true));
    }
    results
}

#[derive(Debug, Default)]
pub struct LongRangeMetaDataTransformer;
transformer_name!(LongRangeMetaDataTransformer, "LongRangeMetaDataTransformer");

impl MetaDataTransformer for LongRangeMetaDataTransformer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn convert_meta_data(&self, _: &ExtValEngine, _: &RequestContext, entry: &MetaDataEntry) -> Result<MetaData> {
        let range = entry.value::<LongRange>()?;
        let mut results = MetaData::new();

        if range.minimum != i64::MIN {
            results.insert(keys::RANGE_MIN.to_string(), json!(range.minimum));
        }
        if range.maximum != i64::MAX {
            results.insert(keys::RANGE_MAX.to_string(), json!(range.maximum));
        }
        if range.minimum > 0 {
            results.insert(keys::WEAK_REQUIRED.to_string(), JsonValue::Bool(true));
        }

        Ok(results)
    }
}

#[derive(Debug, Default)]
pub struct DoubleRangeMetaDataTransformer;
transformer_name!(DoubleRangeMetaDataTransformer, "DoubleRangeMetaDataTransformer");

impl MetaDataTransformer for DoubleRangeMetaDataTransformer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn convert_meta_data(&self, _: &ExtValEngine, _: &RequestContext, entry: &MetaDataEntry) -> Result<MetaData> {
        let range = entry.value::<DoubleRange>()?;
        let mut results = MetaData::new();

        if range.minimum != f64::MIN {
            results.insert(keys::RANGE_MIN.to_string(), json!(range.minimum));
        }
        if range.maximum != f64::MAX {
            results.insert(keys::RANGE_MAX.to_string(), json!(range.maximum));
        }

        Ok(results)
    }
}

#[derive(Debug, Default)]
pub struct PatternMetaDataTransformer;
transformer_name!(PatternMetaDataTransformer, "PatternMetaDataTransformer");

impl MetaDataTransformer for PatternMetaDataTransformer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn convert_meta_data(&self, _: &ExtValEngine, _: &RequestContext, entry: &MetaDataEntry) -> Result<MetaData> {
        let pattern = entry.value::<Pattern>()?;
        Ok(MetaData::from([(keys::PATTERN.to_string(), json!(pattern.value))]))
    }
}

#[derive(Debug, Default)]
pub struct ValidatorMetaDataTransformer;
transformer_name!(ValidatorMetaDataTransformer, "ValidatorMetaDataTransformer");

impl MetaDataTransformer for ValidatorMetaDataTransformer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn convert_meta_data(&self, _: &ExtValEngine, _: &RequestContext, entry: &MetaDataEntry) -> Result<MetaData> {
        let validator = entry.value::<Validator>()?;
        let mut results = MetaData::from([(keys::CUSTOM.to_string(), json!(validator.value))]);

        if validator
            .value
            .iter()
            .any(|name| simple_name(name).to_lowercase().contains("email"))
        {
            results.insert(keys::EMAIL.to_string(), JsonValue::Bool(true));
        }

        Ok(results)
    }
}

/// Union of the metadata of every joined property.
#[derive(Debug, Default)]
pub struct JoinMetaDataTransformer;
transformer_name!(JoinMetaDataTransformer, "JoinMetaDataTransformer");

impl MetaDataTransformer for JoinMetaDataTransformer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn convert_meta_data(&self, engine: &ExtValEngine, ctx: &RequestContext, entry: &MetaDataEntry) -> Result<MetaData> {
        let extractor = JoinAwareMetaDataExtractor::new();
        let mut results = MetaData::new();

        for target in join_targets(entry)? {
            let information = match extractor.extract(engine, ctx, ExtractionTarget::Expression(&target)) {
                Ok(information) => information,
                Err(error) => {
                    warn!(target = %target, error = %error, "Join target skipped");
                    continue;
                }
            };

            for joined in information.entries() {
                if joined.key() == JoinValidation::KEY {
                    continue;
                }
                let Some(strategy) = engine.strategy_for(joined.key()) else {
                    continue;
                };
                if let Some(meta_data) = engine.transform(ctx, strategy.as_ref(), joined) {
                    debug!(target = %target, key = joined.key(), "Joined metadata");
                    merge_meta_data(&mut results, meta_data);
                }
            }
        }

        Ok(results)
    }
}

/// Maps constraint descriptors of the constraint engine, composing
/// constraints included.
#[derive(Debug, Default)]
pub struct BeanValidationMetaDataTransformer;
transformer_name!(BeanValidationMetaDataTransformer, "BeanValidationMetaDataTransformer");

impl BeanValidationMetaDataTransformer {
    fn describe(descriptor: &ConstraintDescriptor, results: &mut MetaData) {
        let converted = match &descriptor.constraint {
            ConstraintKind::NotNull => MetaData::from([(keys::WEAK_REQUIRED.to_string(), JsonValue::Bool(true))]),
            ConstraintKind::Size { min, max } => length_meta_data(*min, *max),
            ConstraintKind::Min { value } => MetaData::from([(keys::RANGE_MIN.to_string(), json!(value))]),
            ConstraintKind::Max { value } => MetaData::from([(keys::RANGE_MAX.to_string(), json!(value))]),
            ConstraintKind::Pattern { regexp } => MetaData::from([(keys::PATTERN.to_string(), json!([regexp]))]),
            ConstraintKind::Email => MetaData::from([(keys::EMAIL.to_string(), JsonValue::Bool(true))]),
            ConstraintKind::Equal { .. } => MetaData::new(),
        };
        merge_meta_data(results, converted);

        for composing in &descriptor.composing {
            Self::describe(composing, results);
        }
    }
}

impl MetaDataTransformer for BeanValidationMetaDataTransformer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn convert_meta_data(&self, _: &ExtValEngine, _: &RequestContext, entry: &MetaDataEntry) -> Result<MetaData> {
        let descriptor = entry.value::<ConstraintDescriptor>()?;
        let mut results = MetaData::new();
        Self::describe(descriptor, &mut results);
        Ok(results)
    }
}

/// Built-in transformer for a strategy name.
pub fn default_transformer_name(strategy_name: &str) -> Option<&'static str> {
    let defaults = [
        (RequiredStrategy::NAME, RequiredMetaDataTransformer::NAME),
        (LengthStrategy::NAME, LengthMetaDataTransformer::NAME),
        (LongRangeStrategy::NAME, LongRangeMetaDataTransformer::NAME),
        (DoubleRangeStrategy::NAME, DoubleRangeMetaDataTransformer::NAME),
        (PatternStrategy::NAME, PatternMetaDataTransformer::NAME),
        (ValidatorStrategy::NAME, ValidatorMetaDataTransformer::NAME),
        (JoinValidationStrategy::NAME, JoinMetaDataTransformer::NAME),
        (BeanValidationStrategyAdapter::NAME, BeanValidationMetaDataTransformer::NAME),
    ];

    defaults
        .iter()
        .find(|(strategy, _)| *strategy == strategy_name)
        .map(|(_, transformer)| *transformer)
}

pub fn register_defaults(catalog: &mut ClassCatalog<dyn MetaDataTransformer>) {
    catalog.register(RequiredMetaDataTransformer::NAME, || {
        Ok(Arc::new(RequiredMetaDataTransformer) as Arc<dyn MetaDataTransformer>)
    });
    catalog.register(LengthMetaDataTransformer::NAME, || {
        Ok(Arc::new(LengthMetaDataTransformer) as Arc<dyn MetaDataTransformer>)
    });
    catalog.register(LongRangeMetaDataTransformer::NAME, || {
        Ok(Arc::new(LongRangeMetaDataTransformer) as Arc<dyn MetaDataTransformer>)
    });
    catalog.register(DoubleRangeMetaDataTransformer::NAME, || {
        Ok(Arc::new(DoubleRangeMetaDataTransformer) as Arc<dyn MetaDataTransformer>)
    });
    catalog.register(PatternMetaDataTransformer::NAME, || {
        Ok(Arc::new(PatternMetaDataTransformer) as Arc<dyn MetaDataTransformer>)
    });
    catalog.register(ValidatorMetaDataTransformer::NAME, || {
        Ok(Arc::new(ValidatorMetaDataTransformer) as Arc<dyn MetaDataTransformer>)
    });
    catalog.register(JoinMetaDataTransformer::NAME, || {
        Ok(Arc::new(JoinMetaDataTransformer) as Arc<dyn MetaDataTransformer>)
    });
    catalog.register(BeanValidationMetaDataTransformer::NAME, || {
        Ok(Arc::new(BeanValidationMetaDataTransformer) as Arc<dyn MetaDataTransformer>)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::Required;
    use crate::models::{Annotation, Bean, PropertyDescriptor, TypeDescriptor, TypeModel};
    use crate::property::VALUE_BINDING_EXPRESSION;

    fn convert(transformer: &dyn MetaDataTransformer, annotation: impl Into<Annotation>) -> MetaData {
        let engine = ExtValEngine::builder().build();
        let ctx = RequestContext::new("/test.xhtml");
        transformer
            .convert_meta_data(&engine, &ctx, &MetaDataEntry::new(annotation.into()))
            .unwrap()
    }

    #[test]
    fn test_long_range_weak_required() {
        let results = convert(
            &LongRangeMetaDataTransformer,
            LongRange { minimum: 1, maximum: 100, message: None },
        );
        assert_eq!(results.get(keys::RANGE_MIN), Some(&json!(1)));
        assert_eq!(results.get(keys::RANGE_MAX), Some(&json!(100)));
        assert_eq!(results.get(keys::WEAK_REQUIRED), Some(&JsonValue::Bool(true)));

        let results = convert(
            &LongRangeMetaDataTransformer,
            LongRange { minimum: 0, maximum: 100, message: None },
        );
        assert_eq!(results.get(keys::RANGE_MIN), Some(&json!(0)));
        assert!(!results.contains_key(keys::WEAK_REQUIRED));

        let results = convert(&LongRangeMetaDataTransformer, LongRange { maximum: 5, ..Default::default() });
        assert!(!results.contains_key(keys::RANGE_MIN));
    }

    #[test]
    fn test_length_and_validator() {
        let results = convert(&LengthMetaDataTransformer, Length { minimum: 0, maximum: 20, message: None });
        assert_eq!(results.get(keys::MAX_LENGTH), Some(&json!(20)));
        assert!(!results.contains_key(keys::WEAK_REQUIRED));

        let results = convert(
            &ValidatorMetaDataTransformer,
            Validator { value: vec!["acme.validation.EmailValidator".to_string()] },
        );
        assert_eq!(results.get(keys::CUSTOM), Some(&json!(["acme.validation.EmailValidator"])));
        assert_eq!(results.get(keys::EMAIL), Some(&JsonValue::Bool(true)));
    }

    #[test]
    fn test_wrong_entry_type_fails() {
        let engine = ExtValEngine::builder().build();
        let ctx = RequestContext::new("/test.xhtml");
        let entry = MetaDataEntry::new(Annotation::from(Required::default()));
        assert!(LengthMetaDataTransformer.convert_meta_data(&engine, &ctx, &entry).is_err());
    }

    #[test]
    fn test_bean_validation_with_composing() {
        let descriptor = ConstraintDescriptor {
            composing: vec![ConstraintDescriptor::new(ConstraintKind::Pattern { regexp: "[0-9]+".to_string() })],
            ..ConstraintDescriptor::new(ConstraintKind::Size { min: 2, max: 8 })
        };
        let results = convert(&BeanValidationMetaDataTransformer, Annotation::Constraint(descriptor));

        assert_eq!(results.get(keys::MIN_LENGTH), Some(&json!(2)));
        assert_eq!(results.get(keys::MAX_LENGTH), Some(&json!(8)));
        assert_eq!(results.get(keys::WEAK_REQUIRED), Some(&JsonValue::Bool(true)));
        assert_eq!(results.get(keys::PATTERN), Some(&json!(["[0-9]+"])));
    }

    #[test]
    fn test_join_merges_target_metadata() {
        let model = TypeModel::new().with(
            TypeDescriptor::class("Order")
                .property(PropertyDescriptor::new("code").on_field(Length { minimum: 3, maximum: 10, message: None }))
                .property(PropertyDescriptor::new("reference").on_field(JoinValidation {
                    value: vec!["code".to_string()],
                })),
        );
        let engine = ExtValEngine::builder().with_type_model(model).build();
        let ctx = RequestContext::new("/order.xhtml").with_bean("order", Bean::new("Order"));
        let entry = MetaDataEntry::new(Annotation::from(JoinValidation { value: vec!["code".to_string()] }))
            .for_property("reference")
            .with_source(VALUE_BINDING_EXPRESSION, "#{order.reference}");

        let results = JoinMetaDataTransformer.convert_meta_data(&engine, &ctx, &entry).unwrap();
        assert_eq!(results.get(keys::MIN_LENGTH), Some(&json!(3)));
        assert_eq!(results.get(keys::MAX_LENGTH), Some(&json!(10)));
    }

    #[test]
    fn test_default_transformer_names() {
        assert_eq!(
            default_transformer_name(LengthStrategy::NAME),
            Some(LengthMetaDataTransformer::NAME)
        );
        assert_eq!(
            default_transformer_name(BeanValidationStrategyAdapter::NAME),
            Some(BeanValidationMetaDataTransformer::NAME)
        );
        assert!(default_transformer_name("acme.UnknownStrategy").is_none());
    }
}
