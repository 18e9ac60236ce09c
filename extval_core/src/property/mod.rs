//! Carriers for extracted property metadata

pub mod details;
pub mod entry;
pub mod information;

pub use details::PropertyDetails;
pub use entry::{MetaDataEntry, VALUE_BINDING_EXPRESSION};
pub use information::{PropertyInformation, CONSTRAINT_VIOLATIONS, PROPERTY_DETAILS};
