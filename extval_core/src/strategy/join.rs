use super::ValidationStrategy;
use crate::el::{is_el_term, ValueBindingExpression};
use crate::error::Result;
use crate::metadata::extractor::{ExtractionTarget, JoinAwareMetaDataExtractor, MetaDataExtractor};
use crate::models::annotation::{AnnotationType, JoinValidation};
use crate::models::Value;
use crate::property::{MetaDataEntry, VALUE_BINDING_EXPRESSION};
use crate::request::RequestContext;
use crate::ExtValEngine;
use tracing::{debug, warn};
use validator::ValidationError;

/// Bindings a join entry points at. Relative targets are resolved against the
/// binding the entry was extracted for.
pub fn join_targets(entry: &MetaDataEntry) -> Result<Vec<String>> {
    let join = entry.value::<JoinValidation>()?;
    let source = entry.source(VALUE_BINDING_EXPRESSION).map(ValueBindingExpression::new);

    let targets = join
        .value
        .iter()
        .filter_map(|target| {
            if is_el_term(target) {
                return Some(target.clone());
            }
            match &source {
                Some(source) => Some(source.replace_or_add_property(target).expression_string().to_string()),
                None => {
                    warn!(target = %target, "Relative join target without source binding");
                    None
                }
            }
        })
        .collect();

    Ok(targets)
}

/// Validates the value against the constraints of the joined properties.
#[derive(Debug, Default)]
pub struct JoinValidationStrategy;

impl JoinValidationStrategy {
    pub const NAME: &'static str = "JoinValidationStrategy";
}

impl ValidationStrategy for JoinValidationStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(
        &self,
        engine: &ExtValEngine,
        ctx: &RequestContext,
        entry: &MetaDataEntry,
        value: &Value,
    ) -> Result<Vec<ValidationError>> {
        let extractor = JoinAwareMetaDataExtractor::new();
        let mut errors = Vec::new();

        for target in join_targets(entry)? {
            let information = match extractor.extract(engine, ctx, ExtractionTarget::Expression(&target)) {
                Ok(information) => information,
                Err(error) => {
                    warn!(target = %target, error = %error, "Join target skipped");
                    continue;
                }
            };

            for joined in information.entries() {
                // joins of joins are not followed
                if joined.key() == JoinValidation::KEY {
                    continue;
                }
                let Some(strategy) = engine.strategy_for(joined.key()) else {
                    continue;
                };
                debug!(target = %target, key = joined.key(), "Validating joined constraint");
                errors.extend(strategy.validate(engine, ctx, joined, value)?);
            }
        }

        Ok(errors)
    }
}
