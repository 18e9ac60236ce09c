//! Extension points around the validation of a component

use crate::beanval::ConstraintViolation;
use crate::el::ValueBindingExpression;
use crate::models::{ComponentIdentity, InputComponent, UserMessage, Value};
use crate::property::PropertyInformation;
use crate::request::RequestContext;
use crate::ExtValEngine;
use tracing::trace;

/// Placeholder replaced by the component label in failure messages.
pub const LABEL_PLACEHOLDER: &str = "{0}";

/// Runs before and after the validation of each component.
pub trait PropertyValidationInterceptor: Send + Sync {
    /// Returning `false` skips validation of this component.
    fn before_validation(
        &self,
        _ctx: &mut RequestContext,
        _component: &InputComponent,
        _value: &Value,
        _information: &PropertyInformation,
    ) -> bool {
        true
    }

    fn after_validation(
        &self,
        _ctx: &mut RequestContext,
        _component: &InputComponent,
        _value: &Value,
        _information: &PropertyInformation,
    ) {
    }
}

/// Sees every failure before it is reported and may rewrite its message.
pub trait ValidationExceptionInterceptor: Send + Sync {
    /// Returning `false` suppresses the failure.
    fn after_throwing(
        &self,
        identity: &ComponentIdentity,
        violations: &[ConstraintViolation],
        message: &mut UserMessage,
    ) -> bool;
}

/// Puts the component label into the message.
#[derive(Debug, Default)]
pub struct DefaultValidationExceptionInterceptor;

impl DefaultValidationExceptionInterceptor {
    pub const NAME: &'static str = "DefaultValidationExceptionInterceptor";
}

impl ValidationExceptionInterceptor for DefaultValidationExceptionInterceptor {
    fn after_throwing(
        &self,
        identity: &ComponentIdentity,
        _violations: &[ConstraintViolation],
        message: &mut UserMessage,
    ) -> bool {
        if let Some(label) = &identity.label {
            message.summary = message.summary.replace(LABEL_PLACEHOLDER, label);
            message.detail = message.detail.replace(LABEL_PLACEHOLDER, label);
        }
        true
    }
}

/// Records converted values for use by later components of the request.
pub trait ProcessedInformationRecorder: Send + Sync {
    fn record_user_input(&self, engine: &ExtValEngine, ctx: &mut RequestContext, component: &InputComponent, value: &Value);
}

/// Stores the value under the binding key of the component.
#[derive(Debug, Default)]
pub struct DefaultProcessedInformationRecorder;

impl ProcessedInformationRecorder for DefaultProcessedInformationRecorder {
    fn record_user_input(&self, engine: &ExtValEngine, ctx: &mut RequestContext, component: &InputComponent, value: &Value) {
        let Some(binding) = component.value_binding.as_deref() else {
            return;
        };
        let expression = ValueBindingExpression::new(binding);
        let key = engine
            .evaluator()
            .property_details(ctx, &expression)
            .map(|details| details.key().to_string())
            .unwrap_or_else(|_| expression.inner().to_string());

        trace!(client_id = %component.client_id, key = %key, "Recorded user input");
        ctx.record_input(key, value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bean;

    #[test]
    fn test_default_interceptor_uses_label() {
        let interceptor = DefaultValidationExceptionInterceptor;
        let labeled = InputComponent::new("form:name").labeled("Name").identity();
        let mut message = UserMessage::error("{0}: may not be null");

        assert!(interceptor.after_throwing(&labeled, &[], &mut message));
        assert_eq!(message.summary, "Name: may not be null");

        let unlabeled = InputComponent::new("form:name").identity();
        let mut message = UserMessage::error("{0}: may not be null");
        interceptor.after_throwing(&unlabeled, &[], &mut message);
        assert_eq!(message.summary, "{0}: may not be null");
    }

    #[test]
    fn test_recorder_uses_resolved_key() {
        let engine = ExtValEngine::builder().build();
        let mut ctx = RequestContext::new("/edit.xhtml")
            .with_bean("person", Bean::new("Person"))
            .with_bean("field", "name");
        let component = InputComponent::new("form:name").bound_to("#{person[field]}");

        DefaultProcessedInformationRecorder.record_user_input(&engine, &mut ctx, &component, &Value::from("Ada"));
        assert_eq!(ctx.processed_input("person.name"), Some(&Value::from("Ada")));
    }
}
