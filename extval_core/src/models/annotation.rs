//! Declarative constraints attached to types and properties

use serde::{Deserialize, Serialize};

/// Target list marker resolving to the base object of the validated property.
pub const DEFAULT_TARGET: &str = "#{default}";

/// The implicit bean-validation group.
pub const DEFAULT_GROUP: &str = "Default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Annotation {
    Required(Required),
    Length(Length),
    LongRange(LongRange),
    DoubleRange(DoubleRange),
    Pattern(Pattern),
    Validator(Validator),
    JoinValidation(JoinValidation),
    GroupSequence(GroupSequence),
    BeanValidation(BeanValidation),
    Constraint(ConstraintDescriptor),
    /// Any annotation this layer has no strategy for.
    Marker { name: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Required {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Length {
    #[serde(default)]
    pub minimum: usize,
    #[serde(default = "unbounded_length")]
    pub maximum: usize,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRange {
    #[serde(default = "long_min")]
    pub minimum: i64,
    #[serde(default = "long_max")]
    pub maximum: i64,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoubleRange {
    #[serde(default = "double_min")]
    pub minimum: f64,
    #[serde(default = "double_max")]
    pub maximum: f64,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub value: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// References to validators executed by the host framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validator {
    pub value: Vec<String>,
}

/// Borrows the constraints of other properties. Targets are binding
/// expressions or property names relative to the annotated property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinValidation {
    pub value: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSequence {
    pub value: Vec<String>,
}

/// Group controller: activates or restricts groups per view, or queues a
/// model validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeanValidation {
    #[serde(default = "any_view")]
    pub view_ids: Vec<String>,
    #[serde(default = "default_groups")]
    pub use_groups: Vec<String>,
    #[serde(default)]
    pub restrict_groups: Vec<String>,
    #[serde(default = "always")]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub model_validation: ModelValidation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelValidation {
    #[serde(default)]
    pub is_active: bool,
    #[serde(default = "default_targets")]
    pub validation_targets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintDescriptor {
    pub constraint: ConstraintKind,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub composing: Vec<ConstraintDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ConstraintKind {
    NotNull,
    Size {
        #[serde(default)]
        min: usize,
        #[serde(default = "unbounded_length")]
        max: usize,
    },
    Min { value: i64 },
    Max { value: i64 },
    Pattern { regexp: String },
    Email,
    /// Class-level: all listed properties hold equal values.
    Equal { properties: Vec<String> },
}

fn unbounded_length() -> usize {
    usize::MAX
}

fn long_min() -> i64 {
    i64::MIN
}

fn long_max() -> i64 {
    i64::MAX
}

fn double_min() -> f64 {
    f64::MIN
}

fn double_max() -> f64 {
    f64::MAX
}

fn any_view() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_groups() -> Vec<String> {
    vec![DEFAULT_GROUP.to_string()]
}

fn always() -> Vec<String> {
    vec!["#{true}".to_string()]
}

fn default_targets() -> Vec<String> {
    vec![DEFAULT_TARGET.to_string()]
}

impl Default for Length {
    fn default() -> Self {
        Self {
            minimum: 0,
            maximum: unbounded_length(),
            message: None,
        }
    }
}

impl Default for LongRange {
    fn default() -> Self {
        Self {
            minimum: long_min(),
            maximum: long_max(),
            message: None,
        }
    }
}

impl Default for DoubleRange {
    fn default() -> Self {
        Self {
            minimum: double_min(),
            maximum: double_max(),
            message: None,
        }
    }
}

impl Default for ModelValidation {
    fn default() -> Self {
        Self {
            is_active: false,
            validation_targets: default_targets(),
        }
    }
}

impl Default for BeanValidation {
    fn default() -> Self {
        Self {
            view_ids: any_view(),
            use_groups: default_groups(),
            restrict_groups: Vec::new(),
            conditions: always(),
            model_validation: ModelValidation::default(),
        }
    }
}

impl BeanValidation {
    pub fn matches_view(&self, view_id: &str) -> bool {
        self.view_ids.iter().any(|candidate| candidate == view_id || candidate == "*")
    }
}

impl ConstraintDescriptor {
    pub fn new(constraint: ConstraintKind) -> Self {
        Self {
            constraint,
            groups: Vec::new(),
            message: None,
            composing: Vec::new(),
        }
    }

    pub fn in_groups(mut self, groups: &[&str]) -> Self {
        self.groups = groups.iter().map(|group| group.to_string()).collect();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Declared groups, or the default group when none are declared.
    pub fn effective_groups(&self) -> Vec<&str> {
        if self.groups.is_empty() {
            vec![DEFAULT_GROUP]
        } else {
            self.groups.iter().map(String::as_str).collect()
        }
    }

    pub fn applies_to_group(&self, group: &str) -> bool {
        self.effective_groups().contains(&group)
    }
}

impl ConstraintKind {
    pub fn key(&self) -> &'static str {
        match self {
            ConstraintKind::NotNull => "beanval.constraints.NotNull",
            ConstraintKind::Size { .. } => "beanval.constraints.Size",
            ConstraintKind::Min { .. } => "beanval.constraints.Min",
            ConstraintKind::Max { .. } => "beanval.constraints.Max",
            ConstraintKind::Pattern { .. } => "beanval.constraints.Pattern",
            ConstraintKind::Email => "beanval.constraints.Email",
            ConstraintKind::Equal { .. } => "beanval.constraints.Equal",
        }
    }
}

/// Typed view of one annotation variant.
pub trait AnnotationType: Sized + 'static {
    const KEY: &'static str;

    fn from_annotation(annotation: &Annotation) -> Option<&Self>;
}

macro_rules! annotation_types {
    ($($variant:ident => $key:expr),* $(,)?) => {
        $(
            impl AnnotationType for $variant {
                const KEY: &'static str = $key;

                fn from_annotation(annotation: &Annotation) -> Option<&Self> {
                    match annotation {
                        Annotation::$variant(value) => Some(value),
                        _ => None,
                    }
                }
            }

            impl From<$variant> for Annotation {
                fn from(value: $variant) -> Self {
                    Annotation::$variant(value)
                }
            }
        )*

        impl Annotation {
            /// Fully qualified annotation type name.
            pub fn key(&self) -> &str {
                match self {
                    $(Annotation::$variant(_) => $key,)*
                    Annotation::Constraint(descriptor) => descriptor.constraint.key(),
                    Annotation::Marker { name } => name,
                }
            }
        }
    };
}

annotation_types! {
    Required => "extval.property.Required",
    Length => "extval.property.Length",
    LongRange => "extval.property.LongRange",
    DoubleRange => "extval.property.DoubleRange",
    Pattern => "extval.property.Pattern",
    Validator => "extval.property.Validator",
    JoinValidation => "extval.property.JoinValidation",
    GroupSequence => "beanval.GroupSequence",
    BeanValidation => "extval.beanval.BeanValidation",
}

impl AnnotationType for ConstraintDescriptor {
    const KEY: &'static str = "beanval.constraints";

    fn from_annotation(annotation: &Annotation) -> Option<&Self> {
        match annotation {
            Annotation::Constraint(descriptor) => Some(descriptor),
            _ => None,
        }
    }
}

impl From<ConstraintDescriptor> for Annotation {
    fn from(descriptor: ConstraintDescriptor) -> Self {
        Annotation::Constraint(descriptor)
    }
}

impl Annotation {
    pub fn is_constraint(&self) -> bool {
        matches!(self, Annotation::Constraint(_))
    }

    pub fn is_group_controller(&self) -> bool {
        matches!(self, Annotation::BeanValidation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_keys() {
        let length = Annotation::from(Length { minimum: 1, maximum: 10, message: None });
        assert_eq!(length.key(), Length::KEY);

        let not_null = Annotation::from(ConstraintDescriptor::new(ConstraintKind::NotNull));
        assert_eq!(not_null.key(), "beanval.constraints.NotNull");

        let marker = Annotation::Marker { name: "app.Audited".to_string() };
        assert_eq!(marker.key(), "app.Audited");
    }

    #[test]
    fn test_annotation_deserializes_with_defaults() {
        let yaml = r#"
- type: LongRange
  minimum: 1
- type: BeanValidation
  use_groups: [Registration]
- type: Constraint
  constraint:
    kind: Size
    max: 20
  groups: [Registration]
"#;
        let annotations: Vec<Annotation> = serde_yaml::from_str(yaml).unwrap();

        let range = LongRange::from_annotation(&annotations[0]).unwrap();
        assert_eq!(range.minimum, 1);
        assert_eq!(range.maximum, i64::MAX);

        let controller = BeanValidation::from_annotation(&annotations[1]).unwrap();
        assert_eq!(controller.view_ids, vec!["*"]);
        assert_eq!(controller.use_groups, vec!["Registration"]);
        assert_eq!(BeanValidation::default().use_groups, vec![DEFAULT_GROUP]);
        assert_eq!(controller.conditions, vec!["#{true}"]);
        assert!(!controller.model_validation.is_active);
        assert_eq!(controller.model_validation.validation_targets, vec![DEFAULT_TARGET]);

        let size = ConstraintDescriptor::from_annotation(&annotations[2]).unwrap();
        assert_eq!(size.constraint, ConstraintKind::Size { min: 0, max: 20 });
        assert!(size.applies_to_group("Registration"));
        assert!(!size.applies_to_group(DEFAULT_GROUP));
    }

    #[test]
    fn test_view_matching() {
        let controller = BeanValidation {
            view_ids: vec!["/x.xhtml".to_string()],
            ..BeanValidation::default()
        };
        assert!(controller.matches_view("/x.xhtml"));
        assert!(!controller.matches_view("/y.xhtml"));
        assert!(BeanValidation::default().matches_view("/y.xhtml"));
    }
}
