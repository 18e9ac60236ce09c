//! Static description of bean types: members, annotations and hierarchy links

use super::annotation::Annotation;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Name of the implicit root of every class chain. The hierarchy walk stops
/// before it.
pub const ROOT_TYPE: &str = "Object";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accessor {
    Get,
    Is,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    #[serde(default)]
    pub has_field: bool,
    #[serde(default)]
    pub field_annotations: Vec<Annotation>,
    #[serde(default = "default_accessor")]
    pub accessor: Option<Accessor>,
    #[serde(default)]
    pub accessor_annotations: Vec<Annotation>,
}

fn default_accessor() -> Option<Accessor> {
    Some(Accessor::Get)
}

impl PropertyDescriptor {
    /// A property backed by a field and a `get` accessor.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            has_field: true,
            field_annotations: Vec::new(),
            accessor: Some(Accessor::Get),
            accessor_annotations: Vec::new(),
        }
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self {
            accessor: Some(Accessor::Is),
            ..Self::new(name)
        }
    }

    /// Accessor-only property, as declared on interfaces.
    pub fn accessor_only(name: impl Into<String>) -> Self {
        Self {
            has_field: false,
            ..Self::new(name)
        }
    }

    pub fn without_accessor(mut self) -> Self {
        self.accessor = None;
        self
    }

    pub fn on_field(mut self, annotation: impl Into<Annotation>) -> Self {
        self.field_annotations.push(annotation.into());
        self
    }

    pub fn on_accessor(mut self, annotation: impl Into<Annotation>) -> Self {
        self.accessor_annotations.push(annotation.into());
        self
    }

    /// Accessor annotations first, then field annotations.
    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.accessor_annotations.iter().chain(self.field_annotations.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub name: String,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    /// Class-level annotations.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub properties: Vec<PropertyDescriptor>,
}

impl TypeDescriptor {
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Class,
            superclass: None,
            interfaces: Vec::new(),
            annotations: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            kind: TypeKind::Interface,
            ..Self::class(name)
        }
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn annotated(mut self, annotation: impl Into<Annotation>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    pub fn declared_property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|property| property.name == name)
    }

    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }
}

/// Last dotted segment of a qualified name.
pub fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Snapshot of every type the pipeline may reflect over.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeModel {
    types: HashMap<String, TypeDescriptor>,
}

impl TypeModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_types(types: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        types.into_iter().fold(Self::new(), TypeModel::with)
    }

    pub fn with(mut self, descriptor: TypeDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    pub fn register(&mut self, descriptor: TypeDescriptor) {
        self.types.insert(descriptor.name.clone(), descriptor);
    }

    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Class chain from `name` up to (excluding) [`ROOT_TYPE`]; at each level
    /// the class comes first, then its interfaces depth-first. Every type
    /// appears at most once. Unknown names end the walk on that branch.
    pub fn hierarchy(&self, name: &str) -> Vec<&TypeDescriptor> {
        let mut visited = HashSet::new();
        let mut result = Vec::new();
        let mut current = Some(name);

        while let Some(class_name) = current {
            if class_name == ROOT_TYPE {
                break;
            }
            let Some(descriptor) = self.get(class_name) else {
                break;
            };
            if !visited.insert(descriptor.name.as_str()) {
                break;
            }
            result.push(descriptor);
            for interface in &descriptor.interfaces {
                self.collect_interfaces(interface, &mut visited, &mut result);
            }
            current = descriptor.superclass.as_deref();
        }

        result
    }

    fn collect_interfaces<'a>(
        &'a self,
        name: &str,
        visited: &mut HashSet<&'a str>,
        result: &mut Vec<&'a TypeDescriptor>,
    ) {
        let Some(descriptor) = self.get(name) else {
            return;
        };
        if !visited.insert(descriptor.name.as_str()) {
            return;
        }
        result.push(descriptor);
        for parent in &descriptor.interfaces {
            self.collect_interfaces(parent, visited, result);
        }
    }

    /// First declaration of `property` along the hierarchy walk.
    pub fn find_property(&self, type_name: &str, property: &str) -> Option<&PropertyDescriptor> {
        self.hierarchy(type_name)
            .into_iter()
            .find_map(|descriptor| descriptor.declared_property(property))
    }

    /// Whether `property` can be read through a `get` or `is` accessor.
    pub fn readable_accessor(&self, type_name: &str, property: &str) -> Option<Accessor> {
        self.hierarchy(type_name)
            .into_iter()
            .filter_map(|descriptor| descriptor.declared_property(property))
            .find_map(|descriptor| descriptor.accessor)
    }

    /// Class-level annotations of the type and all its supertypes.
    pub fn class_annotations(&self, type_name: &str) -> Vec<&Annotation> {
        self.hierarchy(type_name)
            .into_iter()
            .flat_map(|descriptor| descriptor.annotations.iter())
            .collect()
    }
}
