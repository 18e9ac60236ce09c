//! Constraint engine contract and the built-in implementation

use crate::models::{Annotation, Bean, ConstraintDescriptor, ConstraintKind, TypeModel, Value};
use lazy_static::lazy_static;
use parking_lot::RwLock;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, trace};
use validator::{ValidateEmail, ValidateLength, ValidateRange};

lazy_static! {
    static ref MESSAGE_PARAMETER: Regex = Regex::new(r"\{(\w+)\}").unwrap();
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintViolation {
    /// Interpolated message.
    pub message: String,
    pub message_template: String,
    pub bean_type: String,
    /// Property name; empty for class-level constraints.
    pub property_path: String,
    pub invalid_value: Value,
    pub constraint_key: String,
}

/// The bean-validation provider as seen by this layer.
pub trait ConstraintEngine: Send + Sync {
    /// Property constraints declared anywhere in the type hierarchy.
    fn constraints_for_property(&self, bean_type: &str, property: &str) -> Vec<ConstraintDescriptor>;

    /// Messages of every violated part of `descriptor`, composing constraints
    /// included. Group membership is not considered.
    fn check_constraint(&self, descriptor: &ConstraintDescriptor, value: &Value) -> Vec<String>;

    /// Validates a candidate value for a property. Groups are evaluated in
    /// order and evaluation stops at the first group with violations.
    fn validate_value(&self, bean_type: &str, property: &str, value: &Value, groups: &[String])
        -> Vec<ConstraintViolation>;

    /// Validates all property and class constraints of an object, with the
    /// same group sequencing as [`ConstraintEngine::validate_value`].
    fn validate(&self, bean: &Bean, groups: &[String]) -> Vec<ConstraintViolation>;
}

/// Constraint engine over the constraint annotations of a [`TypeModel`].
pub struct DefaultConstraintEngine {
    model: Arc<TypeModel>,
    patterns: RwLock<HashMap<String, Option<Regex>>>,
}

impl DefaultConstraintEngine {
    pub fn new(model: Arc<TypeModel>) -> Self {
        Self {
            model,
            patterns: RwLock::new(HashMap::new()),
        }
    }

    fn class_constraints(&self, bean_type: &str) -> Vec<ConstraintDescriptor> {
        self.model
            .class_annotations(bean_type)
            .into_iter()
            .filter_map(|annotation| match annotation {
                Annotation::Constraint(descriptor) => Some(descriptor.clone()),
                _ => None,
            })
            .collect()
    }

    /// Names of constrained properties in hierarchy order.
    fn constrained_properties(&self, bean_type: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for descriptor in self.model.hierarchy(bean_type) {
            for property in &descriptor.properties {
                if property.annotations().any(Annotation::is_constraint) && !names.contains(&property.name) {
                    names.push(property.name.clone());
                }
            }
        }
        names
    }

    fn violates(&self, kind: &ConstraintKind, value: &Value) -> bool {
        if let ConstraintKind::NotNull = kind {
            return value.is_null();
        }
        if value.is_null() {
            return false;
        }

        match kind {
            ConstraintKind::NotNull => false,
            ConstraintKind::Size { min, max } => match value {
                Value::Text(text) => {
                    let max = if *max == usize::MAX { None } else { Some(*max as u64) };
                    !text.validate_length(Some(*min as u64), max, None)
                }
                _ => false,
            },
            ConstraintKind::Min { value: minimum } => {
                numeric(value).is_some_and(|number| !number.validate_range(Some(*minimum as f64), None, None, None))
            }
            ConstraintKind::Max { value: maximum } => {
                numeric(value).is_some_and(|number| !number.validate_range(None, Some(*maximum as f64), None, None))
            }
            ConstraintKind::Pattern { regexp } => match value {
                Value::Text(text) => self.pattern(regexp).is_some_and(|pattern| !pattern.is_match(text)),
                _ => false,
            },
            ConstraintKind::Email => match value {
                Value::Text(text) if !text.is_empty() => !text.validate_email(),
                _ => false,
            },
            ConstraintKind::Equal { .. } => {
                trace!("Equal is a class-level constraint; ignored on a property");
                false
            }
        }
    }

    fn pattern(&self, regexp: &str) -> Option<Regex> {
        if let Some(compiled) = self.patterns.read().get(regexp) {
            return compiled.clone();
        }

        let compiled = match Regex::new(&format!("^(?:{})$", regexp)) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                error!(regexp = %regexp, error = %err, "Invalid pattern constraint");
                None
            }
        };
        self.patterns.write().insert(regexp.to_string(), compiled.clone());
        compiled
    }

    fn property_violations(
        &self,
        bean_type: &str,
        property: &str,
        descriptors: &[ConstraintDescriptor],
        value: &Value,
        group: &str,
    ) -> Vec<ConstraintViolation> {
        descriptors
            .iter()
            .filter(|descriptor| descriptor.applies_to_group(group))
            .flat_map(|descriptor| self.describe_violations(descriptor, value))
            .map(|(template, message, key)| ConstraintViolation {
                message,
                message_template: template,
                bean_type: bean_type.to_string(),
                property_path: property.to_string(),
                invalid_value: value.clone(),
                constraint_key: key.to_string(),
            })
            .collect()
    }

    /// (template, message, constraint key) for every violated part.
    fn describe_violations(&self, descriptor: &ConstraintDescriptor, value: &Value) -> Vec<(String, String, &'static str)> {
        let mut found = Vec::new();
        if self.violates(&descriptor.constraint, value) {
            let template = descriptor
                .message
                .clone()
                .unwrap_or_else(|| default_template(&descriptor.constraint).to_string());
            let message = interpolate(&template, &descriptor.constraint);
            found.push((template, message, descriptor.constraint.key()));
        }
        for composing in &descriptor.composing {
            found.extend(self.describe_violations(composing, value));
        }
        found
    }

    fn class_violations(&self, bean: &Bean, descriptors: &[ConstraintDescriptor], group: &str) -> Vec<ConstraintViolation> {
        descriptors
            .iter()
            .filter(|descriptor| descriptor.applies_to_group(group))
            .filter_map(|descriptor| match &descriptor.constraint {
                ConstraintKind::Equal { properties } => {
                    let values: Vec<Value> = properties
                        .iter()
                        .map(|property| bean.property(property).cloned().unwrap_or_default())
                        .collect();
                    let equal = values.windows(2).all(|pair| pair[0] == pair[1]);
                    if equal {
                        return None;
                    }
                    let template = descriptor
                        .message
                        .clone()
                        .unwrap_or_else(|| default_template(&descriptor.constraint).to_string());
                    Some(ConstraintViolation {
                        message: interpolate(&template, &descriptor.constraint),
                        message_template: template,
                        bean_type: bean.type_name.clone(),
                        property_path: String::new(),
                        invalid_value: values.into_iter().nth(1).unwrap_or_default(),
                        constraint_key: descriptor.constraint.key().to_string(),
                    })
                }
                other => {
                    trace!(key = other.key(), "Class-level constraint not supported");
                    None
                }
            })
            .collect()
    }
}

impl ConstraintEngine for DefaultConstraintEngine {
    fn constraints_for_property(&self, bean_type: &str, property: &str) -> Vec<ConstraintDescriptor> {
        self.model
            .hierarchy(bean_type)
            .into_iter()
            .filter_map(|descriptor| descriptor.declared_property(property))
            .flat_map(|declared| declared.annotations())
            .filter_map(|annotation| match annotation {
                Annotation::Constraint(descriptor) => Some(descriptor.clone()),
                _ => None,
            })
            .collect()
    }

    fn check_constraint(&self, descriptor: &ConstraintDescriptor, value: &Value) -> Vec<String> {
        self.describe_violations(descriptor, value)
            .into_iter()
            .map(|(_, message, _)| message)
            .collect()
    }

    fn validate_value(
        &self,
        bean_type: &str,
        property: &str,
        value: &Value,
        groups: &[String],
    ) -> Vec<ConstraintViolation> {
        let descriptors = self.constraints_for_property(bean_type, property);
        if descriptors.is_empty() {
            return Vec::new();
        }

        for group in groups {
            let violations = self.property_violations(bean_type, property, &descriptors, value, group);
            if !violations.is_empty() {
                trace!(bean_type, property, group = %group, count = violations.len(), "Constraint violations");
                return violations;
            }
        }
        Vec::new()
    }

    fn validate(&self, bean: &Bean, groups: &[String]) -> Vec<ConstraintViolation> {
        let class_descriptors = self.class_constraints(&bean.type_name);
        let properties: Vec<(String, Vec<ConstraintDescriptor>)> = self
            .constrained_properties(&bean.type_name)
            .into_iter()
            .map(|property| {
                let descriptors = self.constraints_for_property(&bean.type_name, &property);
                (property, descriptors)
            })
            .collect();

        for group in groups {
            let mut violations = Vec::new();
            for (property, descriptors) in &properties {
                let value = bean.property(property).cloned().unwrap_or_default();
                violations.extend(self.property_violations(&bean.type_name, property, descriptors, &value, group));
            }
            violations.extend(self.class_violations(bean, &class_descriptors, group));

            if !violations.is_empty() {
                return violations;
            }
        }
        Vec::new()
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Text(text) => text.trim().parse::<f64>().ok(),
        other => other.as_decimal(),
    }
}

fn default_template(kind: &ConstraintKind) -> &'static str {
    match kind {
        ConstraintKind::NotNull => "may not be null",
        ConstraintKind::Size { max, .. } if *max == usize::MAX => "size must be at least {min}",
        ConstraintKind::Size { .. } => "size must be between {min} and {max}",
        ConstraintKind::Min { .. } => "must be greater than or equal to {value}",
        ConstraintKind::Max { .. } => "must be less than or equal to {value}",
        ConstraintKind::Pattern { .. } => "must match \"{regexp}\"",
        ConstraintKind::Email => "not a well-formed email address",
        ConstraintKind::Equal { .. } => "{properties} must be equal",
    }
}

fn parameters(kind: &ConstraintKind) -> HashMap<&'static str, String> {
    let mut parameters = HashMap::new();
    match kind {
        ConstraintKind::Size { min, max } => {
            parameters.insert("min", min.to_string());
            parameters.insert("max", max.to_string());
        }
        ConstraintKind::Min { value } | ConstraintKind::Max { value } => {
            parameters.insert("value", value.to_string());
        }
        ConstraintKind::Pattern { regexp } => {
            parameters.insert("regexp", regexp.clone());
        }
        ConstraintKind::Equal { properties } => {
            parameters.insert("properties", properties.join(", "));
        }
        ConstraintKind::NotNull | ConstraintKind::Email => {}
    }
    parameters
}

/// Replaces `{name}` with constraint attributes; unknown placeholders such as
/// the label slot `{0}` are left in place.
fn interpolate(template: &str, kind: &ConstraintKind) -> String {
    let parameters = parameters(kind);
    MESSAGE_PARAMETER
        .replace_all(template, |captures: &regex::Captures| {
            parameters
                .get(&captures[1])
                .cloned()
                .unwrap_or_else(|| captures[0].to_string())
        })
        .into_owned()
}
