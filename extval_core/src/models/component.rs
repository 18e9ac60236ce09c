//! Input components as seen by the validation layer

use crate::interceptor::converter::Converter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    #[default]
    Error,
    Fatal,
}

/// Message shown to the end user for a failed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessage {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
}

impl UserMessage {
    pub fn error(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            severity: Severity::Error,
            summary: text.clone(),
            detail: text,
        }
    }
}

impl fmt::Display for UserMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.summary == self.detail {
            write!(f, "{}", self.summary)
        } else {
            write!(f, "{}: {}", self.summary, self.detail)
        }
    }
}

/// Validators the host framework runs on the component itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NativeValidator {
    Length { minimum: Option<u64>, maximum: Option<u64> },
    LongRange { minimum: Option<i64>, maximum: Option<i64> },
    DoubleRange { minimum: Option<f64>, maximum: Option<f64> },
    Regex { pattern: String },
    Email,
    Custom { id: String },
}

impl NativeValidator {
    /// Identity of the attachment. Attaching a validator with an occupied slot
    /// replaces the previous one.
    pub fn slot(&self) -> String {
        match self {
            NativeValidator::Length { .. } => "length".to_string(),
            NativeValidator::LongRange { .. } | NativeValidator::DoubleRange { .. } => "range".to_string(),
            NativeValidator::Regex { pattern } => format!("regex:{}", pattern),
            NativeValidator::Email => "email".to_string(),
            NativeValidator::Custom { id } => format!("custom:{}", id),
        }
    }
}

/// Identity of a component, detached from its mutable state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentIdentity {
    pub client_id: String,
    pub component_type: String,
    pub label: Option<String>,
}

impl ComponentIdentity {
    /// Label for messages, falling back to the client id.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.client_id)
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct InputComponent {
    pub client_id: String,
    #[serde(default = "default_component_type")]
    pub component_type: String,
    #[serde(default)]
    pub value_binding: Option<String>,
    #[serde(default = "editable")]
    pub editable: bool,
    #[serde(default)]
    pub label: Option<String>,
    /// Required flag set explicitly by the page author or by a strong
    /// required constraint.
    #[serde(default)]
    pub required: Option<bool>,
    /// Weak required derived from metadata. Never overrides `required`.
    #[serde(default)]
    pub metadata_required: bool,
    /// Validators declared by the page author.
    #[serde(default)]
    pub validators: Vec<NativeValidator>,
    /// Validators attached by this layer, keyed by slot.
    #[serde(default)]
    pub extval_validators: BTreeMap<String, NativeValidator>,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
    #[serde(skip)]
    pub converter: Option<Arc<dyn Converter>>,
}

fn default_component_type() -> String {
    "HtmlInputText".to_string()
}

fn editable() -> bool {
    true
}

impl InputComponent {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            component_type: default_component_type(),
            value_binding: None,
            editable: true,
            label: None,
            required: None,
            metadata_required: false,
            validators: Vec::new(),
            extval_validators: BTreeMap::new(),
            attributes: BTreeMap::new(),
            converter: None,
        }
    }

    pub fn bound_to(mut self, expression: impl Into<String>) -> Self {
        self.value_binding = Some(expression.into());
        self
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn of_type(mut self, component_type: impl Into<String>) -> Self {
        self.component_type = component_type.into();
        self
    }

    pub fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }

    pub fn with_converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(self.metadata_required)
    }

    pub fn set_required(&mut self, required: bool) {
        self.required = Some(required);
    }

    /// Weak required only applies while the page author left the flag unset.
    pub fn mark_weak_required(&mut self) {
        if self.required.is_none() {
            self.metadata_required = true;
        }
    }

    pub fn attach_validator(&mut self, validator: NativeValidator) {
        self.extval_validators.insert(validator.slot(), validator);
    }

    /// Author-declared validators followed by the ones attached here.
    pub fn all_validators(&self) -> impl Iterator<Item = &NativeValidator> {
        self.validators.iter().chain(self.extval_validators.values())
    }

    pub fn identity(&self) -> ComponentIdentity {
        ComponentIdentity {
            client_id: self.client_id.clone(),
            component_type: self.component_type.clone(),
            label: self.label.clone(),
        }
    }
}

impl fmt::Debug for InputComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputComponent")
            .field("client_id", &self.client_id)
            .field("component_type", &self.component_type)
            .field("value_binding", &self.value_binding)
            .field("editable", &self.editable)
            .field("label", &self.label)
            .field("required", &self.required)
            .field("metadata_required", &self.metadata_required)
            .field("validators", &self.validators)
            .field("extval_validators", &self.extval_validators)
            .field("attributes", &self.attributes)
            .field("converter", &self.converter.as_ref().map(|converter| converter.name()))
            .finish()
    }
}
