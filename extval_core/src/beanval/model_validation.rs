//! Cross-field validation drained after all field validations

use crate::interceptor::outcome::ValidationFailure;
use crate::interceptor::validation::report_violations;
use crate::models::annotation::BeanValidation;
use crate::models::{Bean, ComponentIdentity, Value, DEFAULT_TARGET};
use crate::request::RequestContext;
use crate::ExtValEngine;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

/// A model validation queued while resolving the groups of a component.
#[derive(Debug, Clone)]
pub struct ModelValidationEntry {
    /// Groups left after restrictions were applied.
    pub groups: Vec<String>,
    /// The controller that requested the validation.
    pub meta_data: BeanValidation,
    /// Object the controller was found on; relative targets start here.
    pub source: Arc<Bean>,
    /// Owner of the bound property, used for the default target.
    pub default_target: Arc<Bean>,
    pub identity: ComponentIdentity,
}

impl ModelValidationEntry {
    pub fn validation_targets(&self) -> &[String] {
        &self.meta_data.model_validation.validation_targets
    }
}

/// Failure of one model validation target.
#[derive(Debug, Clone, Serialize)]
pub struct ModelValidationFailure {
    pub identity: ComponentIdentity,
    pub target_type: String,
    pub failure: ValidationFailure,
}

/// Objects to validate for an entry, in target order. Unreachable targets are
/// logged and left out.
pub fn resolve_targets(engine: &ExtValEngine, ctx: &RequestContext, entry: &ModelValidationEntry) -> Vec<Arc<Bean>> {
    let targets = entry.validation_targets();
    if targets.len() == 1 && targets[0] == DEFAULT_TARGET {
        return vec![Arc::clone(&entry.default_target)];
    }

    targets
        .iter()
        .filter_map(|target| {
            let resolved = resolve_target(engine, ctx, &entry.source, target);
            if resolved.is_none() {
                error!(target = %target, source = %entry.source.type_name, "Model validation target unreachable");
            }
            resolved
        })
        .collect()
}

/// A binding expression when well-formed, otherwise a dotted property path
/// read through the accessors of `source`.
pub fn resolve_target(engine: &ExtValEngine, ctx: &RequestContext, source: &Arc<Bean>, target: &str) -> Option<Arc<Bean>> {
    let evaluator = engine.evaluator();

    if evaluator.is_well_formed(target) {
        if !evaluator.is_valid(ctx, target) {
            error!(target = %target, "Invalid model validation target");
            return None;
        }
        return match evaluator.value_of(ctx, target) {
            Ok(Value::Object(bean)) => Some(bean),
            _ => None,
        };
    }

    let mut current = Arc::clone(source);
    for property in target.split('.') {
        engine.type_model().readable_accessor(&current.type_name, property)?;
        current = match current.property(property) {
            Some(Value::Object(bean)) => Arc::clone(bean),
            _ => return None,
        };
    }
    Some(current)
}

/// Runs every model validation queued for the current view. Failures are
/// reported like field failures and queued as messages on the request.
pub fn process_model_validation(engine: &ExtValEngine, ctx: &mut RequestContext) -> Vec<ModelValidationFailure> {
    let view_id = ctx.view_id().to_string();
    let entries = ctx.bean_validation_mut().take_model_validation_entries(&view_id);
    let mut failures = Vec::new();

    for entry in entries {
        if entry.groups.is_empty() {
            continue;
        }

        for target in resolve_targets(engine, ctx, &entry) {
            let violations = engine.constraint_engine().validate(&target, &entry.groups);
            debug!(
                target = %target.type_name,
                groups = ?entry.groups,
                violations = violations.len(),
                "Model validation"
            );
            if violations.is_empty() {
                continue;
            }

            if let Some(failure) = report_violations(engine, &entry.identity, violations) {
                ctx.add_message(Some(&entry.identity.client_id), failure.message.clone());
                for additional in &failure.additional_messages {
                    ctx.add_message(Some(&entry.identity.client_id), additional.clone());
                }
                failures.push(ModelValidationFailure {
                    identity: entry.identity.clone(),
                    target_type: target.type_name.clone(),
                    failure,
                });
            }
        }
    }

    failures
}
