pub mod annotation;
pub mod component;
pub mod types;
pub mod value;

pub use annotation::{Annotation, AnnotationType, ConstraintDescriptor, ConstraintKind, DEFAULT_GROUP, DEFAULT_TARGET};
pub use component::{ComponentIdentity, InputComponent, NativeValidator, Severity, UserMessage};
pub use types::{Accessor, PropertyDescriptor, TypeDescriptor, TypeKind, TypeModel, ROOT_TYPE};
pub use value::{Bean, Value};
