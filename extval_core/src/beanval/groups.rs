//! Resolution of the validation groups of a component

use super::model_validation::ModelValidationEntry;
use crate::metadata::GroupControllerScanningExtractor;
use crate::models::annotation::{AnnotationType, BeanValidation, GroupSequence};
use crate::models::{Bean, ComponentIdentity, Value};
use crate::property::PropertyDetails;
use crate::request::RequestContext;
use crate::ExtValEngine;
use std::sync::Arc;
use tracing::{debug, error, trace};

/// Whether any condition of the controller is a valid expression that
/// evaluates to `true`. Broken conditions are logged and count as unsatisfied.
pub fn is_validation_permitted(engine: &ExtValEngine, ctx: &RequestContext, controller: &BeanValidation) -> bool {
    let evaluator = engine.evaluator();

    for condition in &controller.conditions {
        if !evaluator.is_well_formed(condition) || !evaluator.is_valid(ctx, condition) {
            error!(condition = %condition, "Invalid condition of bean validation controller");
            continue;
        }
        match evaluator.value_of(ctx, condition) {
            Ok(Value::Bool(true)) => return true,
            Ok(_) => {}
            Err(err) => error!(condition = %condition, error = %err, "Condition evaluation failed"),
        }
    }
    false
}

#[derive(Default)]
struct ScanResult {
    found_groups: Vec<String>,
    restricted_groups: Vec<String>,
    model_entries: Vec<ModelValidationEntry>,
    restricted_model_groups: Vec<String>,
}

/// Resolves and registers the groups of a component, then returns the
/// effective groups (active minus restricted). Registered groups accumulate
/// over the request, including those added by the application.
///
/// With additional group annotations deactivated only group sequences of
/// the base type count. Otherwise `BeanValidation` controllers are read from,
/// in order, the root bean class, the first property of the binding, the
/// base object class and the bound property. Model validations found on the
/// way are queued when `queue_model_validation` is set.
pub fn resolve_groups(
    engine: &ExtValEngine,
    ctx: &mut RequestContext,
    identity: &ComponentIdentity,
    details: &PropertyDetails,
    queue_model_validation: bool,
) -> Vec<String> {
    let view_id = ctx.view_id().to_string();

    if engine.config().use_standard_group_sequences() {
        if let Some(base) = details.base_object() {
            if let Some(sequence) = group_sequence(engine, &base.type_name) {
                trace!(client_id = %identity.client_id, groups = ?sequence.value, "Using group sequence");
                for group in &sequence.value {
                    ctx.bean_validation_mut().add_group(group, &view_id, &identity.client_id);
                }
            }
        }
        return ctx.bean_validation().groups(&view_id, &identity.client_id);
    }

    let scan = scan_controllers(engine, ctx, identity, details);
    let context = ctx.bean_validation_mut();

    for group in &scan.found_groups {
        context.add_group(group, &view_id, &identity.client_id);
    }
    for group in &scan.restricted_groups {
        context.restrict_group(group, &view_id, &identity.client_id);
    }

    if queue_model_validation {
        for mut entry in scan.model_entries {
            entry.groups.retain(|group| !scan.restricted_model_groups.contains(group));
            if entry.groups.is_empty() {
                trace!(source = %entry.source.type_name, "Model validation fully restricted");
                continue;
            }
            context.add_model_validation_entry(entry, &view_id);
        }
    }

    let groups = context.groups(&view_id, &identity.client_id);
    debug!(client_id = %identity.client_id, view_id = %view_id, groups = ?groups, "Resolved validation groups");
    groups
}

fn group_sequence<'a>(engine: &'a ExtValEngine, type_name: &str) -> Option<&'a GroupSequence> {
    engine
        .type_model()
        .class_annotations(type_name)
        .into_iter()
        .find_map(GroupSequence::from_annotation)
}

fn scan_controllers(
    engine: &ExtValEngine,
    ctx: &RequestContext,
    identity: &ComponentIdentity,
    details: &PropertyDetails,
) -> ScanResult {
    let extractor = GroupControllerScanningExtractor::new();
    let mut result = ScanResult::default();
    let mut scanned: Vec<(*const Bean, Option<String>)> = Vec::new();

    let segments: Vec<&str> = details.key().split('.').collect();
    let root = segments
        .first()
        .and_then(|name| engine.evaluator().bean(ctx, name))
        .and_then(|value| value.as_bean().cloned());

    let mut locations: Vec<(Arc<Bean>, Option<String>)> = Vec::new();
    if let Some(root) = &root {
        locations.push((Arc::clone(root), None));
        if let Some(first) = segments.get(1) {
            locations.push((Arc::clone(root), Some(first.to_string())));
        }
    }
    if let Some(base) = details.base_object() {
        locations.push((Arc::clone(base), None));
        locations.push((Arc::clone(base), Some(details.property().to_string())));
    }

    let default_target = details.base_object().cloned().or_else(|| root.clone());

    for (bean, property) in locations {
        let location = (Arc::as_ptr(&bean), property.clone());
        if scanned.contains(&location) {
            continue;
        }
        scanned.push(location);

        let controllers = match &property {
            None => extractor.class_controllers(engine, ctx, &bean.type_name),
            Some(property) => extractor.property_controllers(engine, ctx, &bean.type_name, property),
        };

        for controller in controllers {
            if !is_validation_permitted(engine, ctx, &controller) {
                trace!(source = %bean.type_name, "Bean validation controller not permitted");
                continue;
            }

            if controller.model_validation.is_active {
                result.restricted_model_groups.extend(controller.restrict_groups.iter().cloned());
                result.model_entries.push(ModelValidationEntry {
                    groups: controller.use_groups.clone(),
                    source: Arc::clone(&bean),
                    default_target: default_target.clone().unwrap_or_else(|| Arc::clone(&bean)),
                    identity: identity.clone(),
                    meta_data: controller,
                });
            } else {
                result.found_groups.extend(controller.use_groups.iter().cloned());
                result.restricted_groups.extend(controller.restrict_groups.iter().cloned());
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtValConfig;
    use crate::models::annotation::ModelValidation;
    use crate::models::{InputComponent, PropertyDescriptor, TypeDescriptor, TypeModel, DEFAULT_GROUP};

    fn controller(views: &[&str], groups: &[&str]) -> BeanValidation {
        BeanValidation {
            view_ids: views.iter().map(|view| view.to_string()).collect(),
            use_groups: groups.iter().map(|group| group.to_string()).collect(),
            ..Default::default()
        }
    }

    fn engine(config: ExtValConfig) -> ExtValEngine {
        let model = TypeModel::new()
            .with(
                TypeDescriptor::class("Customer")
                    .annotated(GroupSequence { value: vec!["Basic".to_string(), "Full".to_string()] })
                    .annotated(controller(&["*"], &["Address"]))
                    .property(
                        PropertyDescriptor::new("street")
                            .on_field(controller(&["/edit.xhtml"], &["Street"]))
                            .on_field(BeanValidation {
                                restrict_groups: vec!["Address".to_string()],
                                use_groups: Vec::new(),
                                conditions: vec!["#{!admin}".to_string()],
                                ..Default::default()
                            }),
                    )
                    .property(PropertyDescriptor::new("email").on_field(BeanValidation {
                        model_validation: ModelValidation { is_active: true, ..Default::default() },
                        use_groups: vec!["Contact".to_string(), "Audit".to_string()],
                        ..Default::default()
                    }))
                    .property(PropertyDescriptor::new("phone").on_field(BeanValidation {
                        view_ids: vec!["/edit.xhtml".to_string()],
                        restrict_groups: vec!["Audit".to_string()],
                        model_validation: ModelValidation { is_active: true, ..Default::default() },
                        use_groups: vec!["Audit".to_string()],
                        ..Default::default()
                    })),
            );
        ExtValEngine::builder().with_config(config).with_type_model(model).build()
    }

    fn details(customer: &Arc<Bean>, property: &str) -> PropertyDetails {
        PropertyDetails::new(format!("customer.{}", property), Some(Arc::clone(customer)), property)
    }

    fn request(view: &str, customer: &Arc<Bean>, admin: bool) -> RequestContext {
        RequestContext::new(view)
            .with_bean("customer", Arc::clone(customer))
            .with_bean("admin", admin)
    }

    #[test]
    fn test_view_filtering() {
        let engine = engine(ExtValConfig::default());
        let customer = Arc::new(Bean::new("Customer"));
        let identity = InputComponent::new("form:street").identity();

        let mut edit = request("/edit.xhtml", &customer, true);
        let groups = resolve_groups(&engine, &mut edit, &identity, &details(&customer, "street"), false);
        assert_eq!(groups, vec!["Address", "Street"]);

        let mut list = request("/list.xhtml", &customer, true);
        let groups = resolve_groups(&engine, &mut list, &identity, &details(&customer, "street"), false);
        assert_eq!(groups, vec!["Address"]);
    }

    #[test]
    fn test_condition_enables_restriction() {
        let engine = engine(ExtValConfig::default());
        let customer = Arc::new(Bean::new("Customer"));
        let identity = InputComponent::new("form:street").identity();

        let mut ctx = request("/edit.xhtml", &customer, false);
        let groups = resolve_groups(&engine, &mut ctx, &identity, &details(&customer, "street"), false);
        assert_eq!(groups, vec!["Street"]);
    }

    #[test]
    fn test_registered_groups_accumulate() {
        let engine = engine(ExtValConfig::default());
        let customer = Arc::new(Bean::new("Customer"));
        let identity = InputComponent::new("form:street").identity();

        let mut ctx = request("/edit.xhtml", &customer, true);
        ctx.bean_validation_mut().add_group("Audit", "/edit.xhtml", "form:street");

        let rendered = resolve_groups(&engine, &mut ctx, &identity, &details(&customer, "street"), false);
        let applied = resolve_groups(&engine, &mut ctx, &identity, &details(&customer, "street"), true);
        assert_eq!(rendered, vec!["Audit", "Address", "Street"]);
        assert_eq!(applied, rendered);
    }

    #[test]
    fn test_invalid_condition_is_not_permitted() {
        let engine = engine(ExtValConfig::default());
        let ctx = RequestContext::new("/edit.xhtml");
        let broken = BeanValidation {
            conditions: vec!["#{missing.flag}".to_string(), "not an expression".to_string()],
            ..Default::default()
        };
        assert!(!is_validation_permitted(&engine, &ctx, &broken));

        let either = BeanValidation {
            conditions: vec!["#{missing.flag}".to_string(), "#{true}".to_string()],
            ..Default::default()
        };
        assert!(is_validation_permitted(&engine, &ctx, &either));
    }

    #[test]
    fn test_model_validation_is_queued_with_restrictions() {
        let engine = engine(ExtValConfig::default());
        let customer = Arc::new(Bean::new("Customer"));
        let identity = InputComponent::new("form:email").identity();

        let mut ctx = request("/edit.xhtml", &customer, true);
        let groups = resolve_groups(&engine, &mut ctx, &identity, &details(&customer, "email"), true);
        assert_eq!(groups, vec!["Address"]);

        let entries = ctx.bean_validation_mut().take_model_validation_entries("/edit.xhtml");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].groups, vec!["Contact", "Audit"]);
        assert_eq!(entries[0].identity.client_id, "form:email");

        // a restriction on the same controller removes its only group
        let mut ctx = request("/edit.xhtml", &customer, true);
        resolve_groups(&engine, &mut ctx, &identity, &details(&customer, "phone"), true);
        assert!(!ctx.bean_validation().has_model_validation_entries("/edit.xhtml"));

        let mut ctx = request("/edit.xhtml", &customer, true);
        resolve_groups(&engine, &mut ctx, &identity, &details(&customer, "email"), false);
        assert!(!ctx.bean_validation().has_model_validation_entries("/edit.xhtml"));
    }

    #[test]
    fn test_group_sequence_mode() {
        let config = ExtValConfig {
            deactivate_additional_group_validation_annotations: true,
            ..Default::default()
        };
        let engine = engine(config);
        let customer = Arc::new(Bean::new("Customer"));
        let identity = InputComponent::new("form:street").identity();

        let mut ctx = request("/edit.xhtml", &customer, true);
        let groups = resolve_groups(&engine, &mut ctx, &identity, &details(&customer, "street"), true);
        assert_eq!(groups, vec!["Basic", "Full"]);

        let plain = Arc::new(Bean::new("Unknown"));
        let mut ctx = request("/edit.xhtml", &plain, true);
        let groups = resolve_groups(
            &engine,
            &mut ctx,
            &identity,
            &PropertyDetails::new("customer.street", Some(plain), "street"),
            true,
        );
        assert_eq!(groups, vec![DEFAULT_GROUP]);
    }
}
