use crate::error::{ExtValError, Result};
use crate::models::{Annotation, AnnotationType};
use std::collections::BTreeMap;

/// Source information key holding the binding the entry was extracted for.
pub const VALUE_BINDING_EXPRESSION: &str = "value_binding_expression";

/// One constraint found on a property.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaDataEntry {
    key: String,
    value: Annotation,
    property: Option<String>,
    declared_in: Option<String>,
    source_information: BTreeMap<String, String>,
}

impl MetaDataEntry {
    pub fn new(value: Annotation) -> Self {
        Self {
            key: value.key().to_string(),
            value,
            property: None,
            declared_in: None,
            source_information: BTreeMap::new(),
        }
    }

    pub fn for_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    pub fn declared_in(mut self, type_name: impl Into<String>) -> Self {
        self.declared_in = Some(type_name.into());
        self
    }

    pub fn with_source(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.source_information.insert(key.into(), value.into());
        self
    }

    /// Same entry carrying another annotation of the same type.
    pub fn with_value(&self, value: Annotation) -> Self {
        Self {
            value,
            ..self.clone()
        }
    }

    /// Annotation type name, e.g. `extval.property.Length`.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn annotation(&self) -> &Annotation {
        &self.value
    }

    /// Typed access to the annotation; fails when the entry holds another type.
    pub fn value<T: AnnotationType>(&self) -> Result<&T> {
        T::from_annotation(&self.value).ok_or_else(|| ExtValError::UnexpectedMetaDataType {
            expected: T::KEY,
            found: self.key.clone(),
        })
    }

    pub fn property(&self) -> Option<&str> {
        self.property.as_deref()
    }

    pub fn declaring_type(&self) -> Option<&str> {
        self.declared_in.as_deref()
    }

    pub fn source(&self, key: &str) -> Option<&str> {
        self.source_information.get(key).map(String::as_str)
    }

    pub fn source_information(&self) -> &BTreeMap<String, String> {
        &self.source_information
    }
}
