//! Validation lifecycle of input components

pub mod converter;
pub mod hooks;
pub mod outcome;
pub mod validation;

pub use converter::{ConversionError, Converter, DecimalConverter, IntegerConverter, TextConverter};
pub use hooks::{
    DefaultProcessedInformationRecorder, DefaultValidationExceptionInterceptor, ProcessedInformationRecorder,
    PropertyValidationInterceptor, ValidationExceptionInterceptor,
};
pub use outcome::{ValidationFailure, ValidationOutcome};
pub use validation::ValidationInterceptor;
