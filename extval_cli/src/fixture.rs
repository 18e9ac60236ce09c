//! Page fixtures: a type model, the beans in scope and the components of one view

use anyhow::{Context, Result};
use extval_core::{
    interceptor::converter::converter_by_name,
    models::{Bean, InputComponent, TypeDescriptor, TypeModel},
    RequestContext,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub view_id: String,
    #[serde(default)]
    pub types: Vec<TypeDescriptor>,
    #[serde(default)]
    pub beans: BTreeMap<String, Bean>,
    #[serde(default)]
    pub components: Vec<ComponentFixture>,
}

#[derive(Debug, Deserialize)]
pub struct ComponentFixture {
    #[serde(flatten)]
    pub component: InputComponent,
    /// One of `text`, `integer` or `decimal`.
    #[serde(default)]
    pub converter: Option<String>,
    /// Raw value posted for the component. Components without one are only
    /// rendered.
    #[serde(default)]
    pub submitted: Option<String>,
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        let fixture: Fixture = serde_yaml::from_str(&source)
            .with_context(|| format!("Failed to parse fixture {}", path.display()))?;
        Ok(fixture)
    }

    pub fn type_model(&self) -> TypeModel {
        TypeModel::from_types(self.types.iter().cloned())
    }

    /// Fresh request scope for `view_id`, falling back to the fixture's view.
    pub fn request(&self, view_id: Option<&str>) -> RequestContext {
        let mut ctx = RequestContext::new(view_id.unwrap_or(&self.view_id));
        for (name, bean) in &self.beans {
            ctx.set_bean(name.clone(), bean.clone());
        }
        ctx
    }

    /// Components with their converters attached.
    pub fn components(&self) -> Result<Vec<(InputComponent, Option<String>)>> {
        self.components
            .iter()
            .map(|fixture| {
                let mut component = fixture.component.clone();
                if let Some(name) = &fixture.converter {
                    let converter =
                        converter_by_name(name).with_context(|| format!("Unknown converter '{}'", name))?;
                    component = component.with_converter(converter);
                }
                Ok((component, fixture.submitted.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r##"
view_id: /register.xhtml
types:
  - name: Registration
    properties:
      - name: age
        has_field: true
        field_annotations:
          - type: LongRange
            minimum: 18
            maximum: 120
beans:
  registration:
    type: Registration
    properties:
      age: 30
components:
  - client_id: "form:age"
    value_binding: "#{registration.age}"
    converter: integer
    submitted: "17"
"##;

    #[test]
    fn test_fixture_parsing() {
        let fixture: Fixture = serde_yaml::from_str(FIXTURE).unwrap();

        assert_eq!(fixture.view_id, "/register.xhtml");
        assert!(fixture.type_model().contains("Registration"));

        let components = fixture.components().unwrap();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].0.client_id, "form:age");
        assert!(components[0].0.converter.is_some());
        assert_eq!(components[0].1.as_deref(), Some("17"));

        let ctx = fixture.request(None);
        assert_eq!(ctx.view_id(), "/register.xhtml");
        assert!(ctx.bean("registration").is_some());
    }

    #[test]
    fn test_unknown_converter_is_rejected() {
        let mut fixture: Fixture = serde_yaml::from_str(FIXTURE).unwrap();
        fixture.components[0].converter = Some("date".to_string());
        assert!(fixture.components().is_err());
    }
}
