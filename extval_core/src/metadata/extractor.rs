//! Discovery of constraint annotations along the type hierarchy

use crate::el::{is_el_term, ValueBindingExpression};
use crate::error::{ExtValError, Result};
use crate::models::annotation::{AnnotationType, BeanValidation, JoinValidation};
use crate::models::{Annotation, InputComponent, PropertyDescriptor};
use crate::property::{MetaDataEntry, PropertyDetails, PropertyInformation, PROPERTY_DETAILS, VALUE_BINDING_EXPRESSION};
use crate::request::RequestContext;
use crate::strategy::join::join_targets;
use crate::ExtValEngine;
use tracing::{debug, trace, warn};

/// What to extract metadata for.
#[derive(Debug, Clone)]
pub enum ExtractionTarget<'a> {
    /// A component whose value binding still has to be resolved.
    Component(&'a InputComponent),
    /// A binding expression such as `#{person.name}`.
    Expression(&'a str),
    /// An already resolved property.
    Details(PropertyDetails),
}

pub trait MetaDataExtractor: Send + Sync {
    fn extract(&self, engine: &ExtValEngine, ctx: &RequestContext, target: ExtractionTarget<'_>)
        -> Result<PropertyInformation>;
}

/// Resolves a target to its property details and the binding it came from.
pub fn resolve_target(
    engine: &ExtValEngine,
    ctx: &RequestContext,
    target: ExtractionTarget<'_>,
) -> Result<(PropertyDetails, Option<String>)> {
    match target {
        ExtractionTarget::Component(component) => {
            let binding = component.value_binding.as_deref().ok_or_else(|| {
                ExtValError::UnresolvableBinding(format!("{} has no value binding", component.client_id))
            })?;
            resolve_expression(engine, ctx, binding)
        }
        ExtractionTarget::Expression(binding) => resolve_expression(engine, ctx, binding),
        ExtractionTarget::Details(details) => Ok((details, None)),
    }
}

fn resolve_expression(
    engine: &ExtValEngine,
    ctx: &RequestContext,
    binding: &str,
) -> Result<(PropertyDetails, Option<String>)> {
    let expression = ValueBindingExpression::parse(binding)?;
    let details = engine.evaluator().property_details(ctx, &expression)?;
    Ok((details, Some(expression.expression_string().to_string())))
}

fn property_annotations(property: &PropertyDescriptor) -> impl Iterator<Item = &Annotation> {
    let accessor = property
        .accessor
        .is_some()
        .then_some(property.accessor_annotations.iter())
        .into_iter()
        .flatten();
    let field = property
        .has_field
        .then_some(property.field_annotations.iter())
        .into_iter()
        .flatten();
    accessor.chain(field)
}

/// Scans accessor and field annotations of the bound property on the base
/// type, its superclasses and their interfaces.
#[derive(Debug, Clone, Default)]
pub struct DefaultComponentMetaDataExtractor;

impl DefaultComponentMetaDataExtractor {
    pub const NAME: &'static str = "DefaultComponentMetaDataExtractor";

    pub fn new() -> Self {
        Self
    }
}

impl MetaDataExtractor for DefaultComponentMetaDataExtractor {
    fn extract(
        &self,
        engine: &ExtValEngine,
        ctx: &RequestContext,
        target: ExtractionTarget<'_>,
    ) -> Result<PropertyInformation> {
        let (details, binding) = resolve_target(engine, ctx, target)?;
        let mut information = PropertyInformation::new();

        let Some(base) = details.base_object().cloned() else {
            warn!(key = %details.key(), "Base object is null, no metadata extracted");
            information.set_information(PROPERTY_DETAILS, details);
            return Ok(information);
        };

        let model = engine.type_model();
        let property = details.property();
        if !model.contains(&base.type_name) {
            return Err(ExtValError::UnknownType(base.type_name.clone()));
        }
        if model.readable_accessor(&base.type_name, property).is_none() {
            return Err(ExtValError::property_not_found(&base.type_name, property));
        }

        for descriptor in model.hierarchy(&base.type_name) {
            let Some(declared) = descriptor.declared_property(property) else {
                continue;
            };
            for annotation in property_annotations(declared) {
                if annotation.is_group_controller() {
                    continue;
                }
                let mut entry = MetaDataEntry::new(annotation.clone())
                    .for_property(property)
                    .declared_in(&descriptor.name);
                if let Some(binding) = &binding {
                    entry = entry.with_source(VALUE_BINDING_EXPRESSION, binding);
                }
                trace!(key = entry.key(), declared_in = %descriptor.name, property, "Found metadata");
                information.add_entry(entry);
            }
        }

        debug!(key = %details.key(), entries = information.entries().len(), "Extracted metadata");
        information.set_information(PROPERTY_DETAILS, details);
        Ok(information)
    }
}

/// Collects `BeanValidation` controllers for the current view.
///
/// As an extractor it returns the controllers of the bound property; the
/// class and property helpers serve the group resolution, which scans more
/// than one location.
#[derive(Debug, Clone, Default)]
pub struct GroupControllerScanningExtractor;

impl GroupControllerScanningExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Class-level controllers of the type and its supertypes.
    pub fn class_controllers(&self, engine: &ExtValEngine, ctx: &RequestContext, type_name: &str) -> Vec<BeanValidation> {
        engine
            .type_model()
            .class_annotations(type_name)
            .into_iter()
            .filter_map(BeanValidation::from_annotation)
            .filter(|controller| controller.matches_view(ctx.view_id()))
            .cloned()
            .collect()
    }

    /// Controllers on a property declaration anywhere in the hierarchy.
    pub fn property_controllers(
        &self,
        engine: &ExtValEngine,
        ctx: &RequestContext,
        type_name: &str,
        property: &str,
    ) -> Vec<BeanValidation> {
        engine
            .type_model()
            .hierarchy(type_name)
            .into_iter()
            .filter_map(|descriptor| descriptor.declared_property(property))
            .flat_map(property_annotations)
            .filter_map(BeanValidation::from_annotation)
            .filter(|controller| controller.matches_view(ctx.view_id()))
            .cloned()
            .collect()
    }
}

impl MetaDataExtractor for GroupControllerScanningExtractor {
    fn extract(
        &self,
        engine: &ExtValEngine,
        ctx: &RequestContext,
        target: ExtractionTarget<'_>,
    ) -> Result<PropertyInformation> {
        let (details, _) = resolve_target(engine, ctx, target)?;
        let mut information = PropertyInformation::new();

        if let Some(base) = details.base_object() {
            for controller in self.property_controllers(engine, ctx, &base.type_name, details.property()) {
                information.add_entry(
                    MetaDataEntry::new(Annotation::BeanValidation(controller)).for_property(details.property()),
                );
            }
        }

        information.set_information(PROPERTY_DETAILS, details);
        Ok(information)
    }
}

/// Default extraction with join targets rewritten to absolute bindings, so
/// that the entries stay meaningful away from the component they came from.
#[derive(Debug, Clone, Default)]
pub struct JoinAwareMetaDataExtractor {
    inner: DefaultComponentMetaDataExtractor,
}

impl JoinAwareMetaDataExtractor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetaDataExtractor for JoinAwareMetaDataExtractor {
    fn extract(
        &self,
        engine: &ExtValEngine,
        ctx: &RequestContext,
        target: ExtractionTarget<'_>,
    ) -> Result<PropertyInformation> {
        let mut information = self.inner.extract(engine, ctx, target)?;

        for entry in information.entries_mut().iter_mut() {
            if entry.key() != JoinValidation::KEY {
                continue;
            }
            let targets = join_targets(entry)?;
            if targets.iter().all(|target| is_el_term(target)) {
                *entry = entry.with_value(Annotation::JoinValidation(JoinValidation { value: targets }));
            }
        }

        Ok(information)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{Length, Required};
    use crate::models::{Bean, PropertyDescriptor, TypeDescriptor, TypeModel};
    use crate::property::PropertyDetails;

    fn engine() -> ExtValEngine {
        let model = TypeModel::new()
            .with(TypeDescriptor::interface("Named").property(
                PropertyDescriptor::accessor_only("name").on_accessor(Length { maximum: 40, ..Default::default() }),
            ))
            .with(
                TypeDescriptor::class("Person")
                    .implements("Named")
                    .property(PropertyDescriptor::new("name").on_field(Required::default()))
                    .property(PropertyDescriptor::new("secret").without_accessor().on_field(Required::default()))
                    .property(PropertyDescriptor::new("nickname").on_field(JoinValidation {
                        value: vec!["name".to_string()],
                    }))
                    .property(PropertyDescriptor::new("alias").on_field(BeanValidation {
                        view_ids: vec!["/edit.xhtml".to_string()],
                        ..Default::default()
                    })),
            );
        ExtValEngine::builder().with_type_model(model).build()
    }

    fn context() -> RequestContext {
        RequestContext::new("/edit.xhtml").with_bean("person", Bean::new("Person").with("name", "Ada"))
    }

    #[test]
    fn test_default_extractor_walks_interfaces() {
        let engine = engine();
        let ctx = context();
        let information = DefaultComponentMetaDataExtractor::new()
            .extract(&engine, &ctx, ExtractionTarget::Expression("#{person.name}"))
            .unwrap();

        let keys: Vec<&str> = information.entries().iter().map(|entry| entry.key()).collect();
        assert_eq!(keys, vec!["extval.property.Required", "extval.property.Length"]);
        assert_eq!(information.entries()[1].declaring_type(), Some("Named"));
        assert_eq!(information.entries()[0].source(VALUE_BINDING_EXPRESSION), Some("#{person.name}"));

        let details = information.information::<PropertyDetails>(PROPERTY_DETAILS).unwrap();
        assert_eq!(details.key(), "person.name");
        assert_eq!(details.base_type(), Some("Person"));
    }

    #[test]
    fn test_missing_accessor_is_property_not_found() {
        let engine = engine();
        let ctx = context();
        let result = DefaultComponentMetaDataExtractor::new()
            .extract(&engine, &ctx, ExtractionTarget::Expression("#{person.secret}"));
        assert!(matches!(result, Err(ExtValError::PropertyNotFound { .. })));
    }

    #[test]
    fn test_null_base_gives_empty_information() {
        let engine = engine();
        let ctx = RequestContext::new("/edit.xhtml").with_bean("holder", Bean::new("Holder"));
        let information = DefaultComponentMetaDataExtractor::new()
            .extract(
                &engine,
                &ctx,
                ExtractionTarget::Details(PropertyDetails::new("holder.person.name", None, "name")),
            )
            .unwrap();

        assert!(information.is_empty());
        assert!(information.contains_information(PROPERTY_DETAILS));
    }

    #[test]
    fn test_join_targets_become_absolute() {
        let engine = engine();
        let ctx = context();
        let information = JoinAwareMetaDataExtractor::new()
            .extract(&engine, &ctx, ExtractionTarget::Expression("#{person.nickname}"))
            .unwrap();

        let join = information.entries()[0].value::<JoinValidation>().unwrap();
        assert_eq!(join.value, vec!["#{person.name}"]);
    }

    #[test]
    fn test_controllers_are_filtered_by_view() {
        let engine = engine();
        let extractor = GroupControllerScanningExtractor::new();

        let edit = context();
        assert_eq!(extractor.property_controllers(&engine, &edit, "Person", "alias").len(), 1);

        let list = RequestContext::new("/list.xhtml");
        assert!(extractor.property_controllers(&engine, &list, "Person", "alias").is_empty());

        let information = extractor
            .extract(&engine, &edit, ExtractionTarget::Expression("#{person.alias}"))
            .unwrap();
        assert_eq!(information.entries()[0].key(), BeanValidation::KEY);
    }
}
