use super::{violation, ValidationStrategy};
use crate::error::Result;
use crate::models::{Annotation, ConstraintDescriptor, Value};
use crate::property::{MetaDataEntry, VALUE_BINDING_EXPRESSION};
use crate::request::RequestContext;
use crate::ExtValEngine;
use validator::ValidationError;

/// Presents a constraint descriptor of the constraint engine as a strategy so
/// that it shares the transformer lookup of the annotation-based strategies.
///
/// Rendering uses it only as that bridge. The apply phase validates engine
/// constraints through [`ConstraintEngine::validate_value`], which applies
/// group sequencing; [`ValidationStrategy::validate`] here checks the single
/// descriptor regardless of groups, for callers holding one descriptor.
///
/// [`ConstraintEngine::validate_value`]: crate::beanval::ConstraintEngine::validate_value
#[derive(Debug, Clone)]
pub struct BeanValidationStrategyAdapter {
    descriptor: ConstraintDescriptor,
}

impl BeanValidationStrategyAdapter {
    pub const NAME: &'static str = "BeanValidationStrategyAdapter";

    pub fn new(descriptor: ConstraintDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn descriptor(&self) -> &ConstraintDescriptor {
        &self.descriptor
    }

    /// Entry carrying the descriptor, as consumed by the transformers.
    pub fn meta_data_entry(&self, property: &str, binding: Option<&str>) -> MetaDataEntry {
        let entry = MetaDataEntry::new(Annotation::Constraint(self.descriptor.clone())).for_property(property);
        match binding {
            Some(binding) => entry.with_source(VALUE_BINDING_EXPRESSION, binding),
            None => entry,
        }
    }
}

impl ValidationStrategy for BeanValidationStrategyAdapter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(
        &self,
        engine: &ExtValEngine,
        _ctx: &RequestContext,
        _entry: &MetaDataEntry,
        value: &Value,
    ) -> Result<Vec<ValidationError>> {
        let errors = engine
            .constraint_engine()
            .check_constraint(&self.descriptor, value)
            .into_iter()
            .map(|message| violation("constraint", message))
            .collect();
        Ok(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConstraintKind;
    use crate::strategy::error_message;

    #[test]
    fn test_adapter_delegates_to_constraint_engine() {
        let engine = ExtValEngine::builder().build();
        let ctx = RequestContext::new("/test.xhtml");
        let adapter = BeanValidationStrategyAdapter::new(
            ConstraintDescriptor::new(ConstraintKind::Size { min: 2, max: 3 }).with_message("wrong size"),
        );
        let entry = adapter.meta_data_entry("code", Some("#{order.code}"));

        assert_eq!(entry.key(), "beanval.constraints.Size");
        assert!(adapter.validate(&engine, &ctx, &entry, &Value::from("ab")).unwrap().is_empty());

        let errors = adapter.validate(&engine, &ctx, &entry, &Value::from("abcd")).unwrap();
        assert_eq!(error_message(&errors[0]), "wrong size");
    }
}
