//! Result of validating one submitted value

use crate::beanval::ConstraintViolation;
use crate::models::UserMessage;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationFailure {
    pub client_id: String,
    pub message: UserMessage,
    /// Further violations, when multiple messages per field are enabled.
    pub additional_messages: Vec<UserMessage>,
    pub violations: Vec<ConstraintViolation>,
}

/// At most one failure per submitted value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ValidationOutcome {
    Valid,
    Failed(ValidationFailure),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    pub fn failure(&self) -> Option<&ValidationFailure> {
        match self {
            ValidationOutcome::Valid => None,
            ValidationOutcome::Failed(failure) => Some(failure),
        }
    }
}
