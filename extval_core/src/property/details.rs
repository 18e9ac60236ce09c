use crate::models::Bean;
use std::sync::Arc;

/// Which property of which object a component is bound to.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDetails {
    key: String,
    base_object: Option<Arc<Bean>>,
    property: String,
}

impl PropertyDetails {
    pub fn new(key: impl Into<String>, base_object: Option<Arc<Bean>>, property: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            base_object,
            property: property.into(),
        }
    }

    /// Dotted binding path, e.g. `person.address.city`.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn base_object(&self) -> Option<&Arc<Bean>> {
        self.base_object.as_ref()
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn base_type(&self) -> Option<&str> {
        self.base_object.as_deref().map(|bean| bean.type_name.as_str())
    }
}
