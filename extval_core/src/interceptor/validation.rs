//! Render-time configuration and postback validation of input components

use super::hooks::LABEL_PLACEHOLDER;
use super::outcome::{ValidationFailure, ValidationOutcome};
use crate::beanval::{resolve_groups, ConstraintViolation};
use crate::error::Result;
use crate::metadata::{merge_meta_data, ExtractionTarget, MetaData};
use crate::models::{ComponentIdentity, InputComponent, UserMessage, Value};
use crate::property::{PropertyDetails, PropertyInformation, CONSTRAINT_VIOLATIONS, PROPERTY_DETAILS};
use crate::request::{ProcessingState, RequestContext};
use crate::strategy::{error_message, BeanValidationStrategyAdapter};
use crate::ExtValEngine;
use tracing::{debug, trace, warn};

/// Drives one component through rendering or validation.
pub struct ValidationInterceptor<'a> {
    engine: &'a ExtValEngine,
}

impl<'a> ValidationInterceptor<'a> {
    pub fn new(engine: &'a ExtValEngine) -> Self {
        Self { engine }
    }

    /// Extracts the metadata of the bound property and configures the
    /// component with it. Returns the applied metadata; resolution failures
    /// are logged and leave the component untouched.
    pub fn init_component(&self, ctx: &mut RequestContext, component: &mut InputComponent) -> MetaData {
        ctx.set_state(&component.client_id, ProcessingState::Init);

        let information = match self.extract(ctx, component) {
            Ok(information) => information,
            Err(err) => {
                warn!(client_id = %component.client_id, error = %err, "Skipping component initialization");
                return MetaData::new();
            }
        };
        ctx.set_state(&component.client_id, ProcessingState::MetaDataExtracted);

        let Some(details) = information.information::<PropertyDetails>(PROPERTY_DETAILS).cloned() else {
            return MetaData::new();
        };
        if details.base_object().is_none() {
            return MetaData::new();
        }

        let mut meta_data = self.engine.meta_data_for(ctx, &information);
        merge_meta_data(&mut meta_data, self.constraint_meta_data(ctx, component, &details));

        for initializer in self.engine.initializers() {
            trace!(client_id = %component.client_id, initializer = initializer.name(), "Configuring component");
            initializer.configure_component(ctx, component, &meta_data);
        }

        ctx.set_state(&component.client_id, ProcessingState::Configured);
        debug!(client_id = %component.client_id, keys = meta_data.len(), "Component configured");
        meta_data
    }

    /// Metadata of the engine constraints active for the component's groups.
    fn constraint_meta_data(&self, ctx: &mut RequestContext, component: &InputComponent, details: &PropertyDetails) -> MetaData {
        let mut meta_data = MetaData::new();
        let Some(bean_type) = details.base_type() else {
            return meta_data;
        };

        let groups = resolve_groups(self.engine, ctx, &component.identity(), details, false);
        if groups.is_empty() {
            return meta_data;
        }

        for descriptor in self.engine.constraint_engine().constraints_for_property(bean_type, details.property()) {
            if !groups.iter().any(|group| descriptor.applies_to_group(group)) {
                continue;
            }
            let adapter = BeanValidationStrategyAdapter::new(descriptor);
            let entry = adapter.meta_data_entry(details.property(), component.value_binding.as_deref());
            if let Some(converted) = self.engine.transform(ctx, &adapter, &entry) {
                merge_meta_data(&mut meta_data, converted);
            }
        }

        meta_data
    }

    /// Converts, records and validates a submitted value.
    pub fn process_validation(
        &self,
        ctx: &mut RequestContext,
        component: &InputComponent,
        submitted: &str,
    ) -> ValidationOutcome {
        let client_id = component.client_id.clone();
        ctx.set_state(&client_id, ProcessingState::RawInput);

        if !component.editable {
            trace!(client_id = %client_id, "Read-only component not validated");
            return ValidationOutcome::Valid;
        }

        let converted = match &component.converter {
            Some(converter) => converter.as_value(submitted),
            None => Ok(Value::from(submitted)),
        };
        let mut value = match converted {
            Ok(value) => value,
            Err(err) => {
                debug!(client_id = %client_id, error = %err, "Conversion failed");
                let message = UserMessage::error(format!("{}: {}", component.identity().display_name(), err));
                ctx.add_message(Some(&client_id), message.clone());
                ctx.set_state(&client_id, ProcessingState::Failed);
                return ValidationOutcome::Failed(ValidationFailure {
                    client_id,
                    message,
                    additional_messages: Vec::new(),
                    violations: Vec::new(),
                });
            }
        };
        ctx.set_state(&client_id, ProcessingState::Converted);

        for recorder in self.engine.recorders() {
            recorder.record_user_input(self.engine, ctx, component, &value);
        }

        if self.engine.config().interpret_empty_string_as_null() && value.is_empty_text() {
            value = Value::Null;
        }

        let mut information = match self.extract(ctx, component) {
            Ok(information) => information,
            Err(err) => {
                warn!(client_id = %client_id, error = %err, "Skipping validation");
                return ValidationOutcome::Valid;
            }
        };
        let Some(details) = information.information::<PropertyDetails>(PROPERTY_DETAILS).cloned() else {
            return ValidationOutcome::Valid;
        };
        let Some(bean_type) = details.base_type().map(str::to_string) else {
            return ValidationOutcome::Valid;
        };

        let interceptors = self.engine.property_interceptors();
        let mut proceed = true;
        for interceptor in interceptors {
            if !interceptor.before_validation(ctx, component, &value, &information) {
                proceed = false;
            }
        }

        let mut outcome = ValidationOutcome::Valid;
        if proceed {
            let mut violations = self.strategy_violations(ctx, &information, &bean_type, &details, &value);

            let groups = resolve_groups(self.engine, ctx, &component.identity(), &details, true);
            ctx.set_state(&client_id, ProcessingState::GroupsResolved);
            if !groups.is_empty() {
                violations.extend(self.engine.constraint_engine().validate_value(
                    &bean_type,
                    details.property(),
                    &value,
                    &groups,
                ));
            }
            ctx.set_state(&client_id, ProcessingState::Validated);

            if !violations.is_empty() {
                if let Some(failure) = report_violations(self.engine, &component.identity(), violations.clone()) {
                    ctx.add_message(Some(&client_id), failure.message.clone());
                    for additional in &failure.additional_messages {
                        ctx.add_message(Some(&client_id), additional.clone());
                    }
                    outcome = ValidationOutcome::Failed(failure);
                }
                information.set_information(CONSTRAINT_VIOLATIONS, violations);
            }
        }

        for interceptor in interceptors {
            interceptor.after_validation(ctx, component, &value, &information);
        }

        let state = if outcome.is_valid() {
            ProcessingState::Valid
        } else {
            ProcessingState::Failed
        };
        ctx.set_state(&client_id, state);
        outcome
    }

    fn extract(&self, ctx: &RequestContext, component: &InputComponent) -> Result<PropertyInformation> {
        self.engine
            .component_extractor()
            .extract(self.engine, ctx, ExtractionTarget::Component(component))
    }

    /// Violations of the annotation-based strategies, in entry order.
    fn strategy_violations(
        &self,
        ctx: &RequestContext,
        information: &PropertyInformation,
        bean_type: &str,
        details: &PropertyDetails,
        value: &Value,
    ) -> Vec<ConstraintViolation> {
        let mut violations = Vec::new();

        for entry in information.entries() {
            let Some(strategy) = self.engine.strategy_for(entry.key()) else {
                trace!(key = entry.key(), "No validation strategy");
                continue;
            };
            match strategy.validate(self.engine, ctx, entry, value) {
                Ok(errors) => violations.extend(errors.iter().map(|error| {
                    let message = error_message(error);
                    ConstraintViolation {
                        message_template: message.clone(),
                        message,
                        bean_type: bean_type.to_string(),
                        property_path: details.property().to_string(),
                        invalid_value: value.clone(),
                        constraint_key: entry.key().to_string(),
                    }
                })),
                Err(err) => warn!(key = entry.key(), strategy = strategy.name(), error = %err, "Strategy failed"),
            }
        }

        violations
    }
}

/// Composes the failure for a non-empty list of violations.
///
/// The first violation becomes the message, prefixed with the label slot.
/// When the exception interceptors leave that slot untouched the plain
/// message is reported instead. `None` means an interceptor suppressed the
/// failure.
pub(crate) fn report_violations(
    engine: &ExtValEngine,
    identity: &ComponentIdentity,
    violations: Vec<ConstraintViolation>,
) -> Option<ValidationFailure> {
    let first = violations.first()?;
    let labeled = format!("{}: {}", LABEL_PLACEHOLDER, first.message);
    let mut message = UserMessage::error(labeled.clone());

    if let Some(interceptor) = engine.exception_interceptor_for(identity) {
        if !interceptor.after_throwing(identity, &violations, &mut message) {
            debug!(client_id = %identity.client_id, "Failure suppressed by exception interceptor");
            return None;
        }
    }

    if message.summary == labeled || message.detail == labeled {
        message = UserMessage {
            severity: message.severity,
            summary: first.message.clone(),
            detail: first.message.clone(),
        };
    }

    let additional_messages = if engine.config().activate_multiple_violation_messages_per_field {
        violations
            .iter()
            .skip(1)
            .map(|violation| UserMessage::error(violation.message.clone()))
            .collect()
    } else {
        Vec::new()
    };

    Some(ValidationFailure {
        client_id: identity.client_id.clone(),
        message,
        additional_messages,
        violations,
    })
}
