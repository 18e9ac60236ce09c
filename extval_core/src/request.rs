//! State of one request: view, named beans, recorded input and groups

use crate::beanval::BeanValidationContext;
use crate::models::{UserMessage, Value};
use serde::Serialize;
use std::collections::HashMap;
use tracing::trace;

/// Lifecycle position of a component within the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingState {
    Init,
    MetaDataExtracted,
    Configured,
    RawInput,
    Converted,
    GroupsResolved,
    Validated,
    Valid,
    Failed,
}

/// A message queued for the response, optionally tied to a component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueuedMessage {
    pub client_id: Option<String>,
    pub message: UserMessage,
}

/// Everything scoped to one request. Nothing here outlives it.
#[derive(Debug)]
pub struct RequestContext {
    view_id: String,
    beans: HashMap<String, Value>,
    processed_input: HashMap<String, Value>,
    bean_validation: BeanValidationContext,
    messages: Vec<QueuedMessage>,
    states: HashMap<String, ProcessingState>,
}

impl RequestContext {
    pub fn new(view_id: impl Into<String>) -> Self {
        Self {
            view_id: view_id.into(),
            beans: HashMap::new(),
            processed_input: HashMap::new(),
            bean_validation: BeanValidationContext::new(),
            messages: Vec::new(),
            states: HashMap::new(),
        }
    }

    pub fn with_bean(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_bean(name, value);
        self
    }

    pub fn set_bean(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.beans.insert(name.into(), value.into());
    }

    pub fn bean(&self, name: &str) -> Option<&Value> {
        self.beans.get(name)
    }

    pub fn view_id(&self) -> &str {
        &self.view_id
    }

    /// Stores a converted value under a binding key for later components.
    pub fn record_input(&mut self, key: impl Into<String>, value: Value) {
        self.processed_input.insert(key.into(), value);
    }

    pub fn processed_input(&self, key: &str) -> Option<&Value> {
        self.processed_input.get(key)
    }

    pub fn bean_validation(&self) -> &BeanValidationContext {
        &self.bean_validation
    }

    pub fn bean_validation_mut(&mut self) -> &mut BeanValidationContext {
        &mut self.bean_validation
    }

    pub fn add_message(&mut self, client_id: Option<&str>, message: UserMessage) {
        self.messages.push(QueuedMessage {
            client_id: client_id.map(str::to_string),
            message,
        });
    }

    pub fn messages(&self) -> &[QueuedMessage] {
        &self.messages
    }

    pub fn messages_for<'a>(&'a self, client_id: &'a str) -> impl Iterator<Item = &'a UserMessage> + 'a {
        self.messages
            .iter()
            .filter(move |queued| queued.client_id.as_deref() == Some(client_id))
            .map(|queued| &queued.message)
    }

    pub fn set_state(&mut self, client_id: &str, state: ProcessingState) {
        trace!(client_id, ?state, "Component state");
        self.states.insert(client_id.to_string(), state);
    }

    pub fn state(&self, client_id: &str) -> Option<ProcessingState> {
        self.states.get(client_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bean;

    #[test]
    fn test_request_scope() {
        let mut ctx = RequestContext::new("/edit.xhtml").with_bean("person", Bean::new("Person"));
        assert_eq!(ctx.view_id(), "/edit.xhtml");
        assert!(ctx.bean("person").and_then(Value::as_bean).is_some());
        assert!(ctx.bean("other").is_none());

        ctx.record_input("person.name", Value::from("Ada"));
        assert_eq!(ctx.processed_input("person.name"), Some(&Value::from("Ada")));

        ctx.add_message(Some("form:name"), UserMessage::error("required"));
        ctx.add_message(None, UserMessage::error("global"));
        assert_eq!(ctx.messages().len(), 2);
        assert_eq!(ctx.messages_for("form:name").count(), 1);

        ctx.set_state("form:name", ProcessingState::Converted);
        assert_eq!(ctx.state("form:name"), Some(ProcessingState::Converted));
    }
}
