//! Bean validation integration: constraint engine, groups and model validation

pub mod context;
pub mod engine;
pub mod groups;
pub mod model_validation;

pub use context::BeanValidationContext;
pub use engine::{ConstraintEngine, ConstraintViolation, DefaultConstraintEngine};
pub use groups::{is_validation_permitted, resolve_groups};
pub use model_validation::{process_model_validation, ModelValidationEntry, ModelValidationFailure};
