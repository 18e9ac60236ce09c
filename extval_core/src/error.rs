//! Error types for the extraction and validation pipeline

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExtValError>;

/// Internal failures of the pipeline.
///
/// None of these reach the end user. Callers log them and degrade (skip the
/// component, fall through to the next plugin candidate, treat a condition as
/// unsatisfied). Constraint violations are not errors; they travel as
/// [`crate::interceptor::ValidationOutcome::Failed`].
#[derive(Error, Debug)]
pub enum ExtValError {
    #[error("Property not found: {bean_type}.{property}")]
    PropertyNotFound { bean_type: String, property: String },

    #[error("Unresolvable binding: {0}")]
    UnresolvableBinding(String),

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Unexpected metadata type: expected {expected}, found {found}")]
    UnexpectedMetaDataType { expected: &'static str, found: String },

    #[error("Class not found: {0}")]
    ClassNotFound(String),

    #[error("Failed to instantiate {name}: {reason}")]
    Instantiation { name: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExtValError {
    pub fn property_not_found(bean_type: &str, property: &str) -> Self {
        ExtValError::PropertyNotFound {
            bean_type: bean_type.to_string(),
            property: property.to_string(),
        }
    }

    /// Resolution failures abort the current component only.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            ExtValError::PropertyNotFound { .. }
                | ExtValError::UnresolvableBinding(_)
                | ExtValError::UnknownType(_)
        )
    }
}
