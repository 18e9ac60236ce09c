//! Expression evaluation against the request scope

use super::expression::{is_el_term, Segment, ValueBindingExpression};
use crate::error::{ExtValError, Result};
use crate::models::Value;
use crate::property::PropertyDetails;
use crate::request::RequestContext;
use tracing::trace;

/// Evaluates binding expressions. The host framework normally provides this.
pub trait ExpressionEvaluator: Send + Sync {
    fn is_well_formed(&self, expression: &str) -> bool {
        is_el_term(expression)
    }

    fn value_of(&self, ctx: &RequestContext, expression: &str) -> Result<Value>;

    /// Well-formed and resolvable in the current request.
    fn is_valid(&self, ctx: &RequestContext, expression: &str) -> bool {
        self.is_well_formed(expression) && self.value_of(ctx, expression).is_ok()
    }

    fn bean(&self, ctx: &RequestContext, name: &str) -> Option<Value>;

    /// Resolves the owning object and final property of a binding.
    fn property_details(&self, ctx: &RequestContext, expression: &ValueBindingExpression) -> Result<PropertyDetails>;
}

/// Evaluator over the named beans of a [`RequestContext`].
///
/// Supports property and key navigation, nested dynamic keys, the literals
/// `true`, `false`, numbers and quoted strings, and `!`/`not` negation.
#[derive(Debug, Clone, Default)]
pub struct ScopeExpressionEvaluator;

impl ScopeExpressionEvaluator {
    pub fn new() -> Self {
        Self
    }

    fn evaluate_body(&self, ctx: &RequestContext, body: &str) -> Result<Value> {
        let body = body.trim();

        if let Some(negated) = body.strip_prefix('!').or_else(|| body.strip_prefix("not ")) {
            let value = self.evaluate_body(ctx, negated)?;
            return match value {
                Value::Bool(flag) => Ok(Value::Bool(!flag)),
                other => Err(ExtValError::InvalidExpression(format!(
                    "cannot negate {} value in '{}'",
                    other.kind(),
                    body
                ))),
            };
        }

        if let Some(literal) = literal(body) {
            return Ok(literal);
        }

        let expression = ValueBindingExpression::new(format!("#{{{}}}", body));
        let segments = expression.segments();
        self.navigate(ctx, &segments)
    }

    fn navigate(&self, ctx: &RequestContext, segments: &[Segment]) -> Result<Value> {
        let Some((root, steps)) = segments.split_first() else {
            return Err(ExtValError::InvalidExpression(String::new()));
        };

        let mut current = self
            .bean(ctx, root.name())
            .ok_or_else(|| ExtValError::UnresolvableBinding(root.name().to_string()))?;

        for step in steps {
            let name = self.segment_name(ctx, step)?;
            current = match &current {
                Value::Null => return Ok(Value::Null),
                Value::Object(bean) => bean.property(&name).cloned().unwrap_or(Value::Null),
                other => {
                    return Err(ExtValError::InvalidExpression(format!(
                        "cannot read '{}' of {} value",
                        name,
                        other.kind()
                    )))
                }
            };
        }

        Ok(current)
    }

    fn segment_name(&self, ctx: &RequestContext, segment: &Segment) -> Result<String> {
        match segment {
            Segment::Property(name) | Segment::Key(name) => Ok(name.clone()),
            Segment::Dynamic(body) => match self.evaluate_body(ctx, body)? {
                Value::Text(name) => Ok(name),
                Value::Integer(index) => Ok(index.to_string()),
                other => Err(ExtValError::InvalidExpression(format!(
                    "key '{}' resolved to {} value",
                    body,
                    other.kind()
                ))),
            },
        }
    }
}

impl ExpressionEvaluator for ScopeExpressionEvaluator {
    fn value_of(&self, ctx: &RequestContext, expression: &str) -> Result<Value> {
        if !self.is_well_formed(expression) {
            return Err(ExtValError::InvalidExpression(expression.to_string()));
        }
        let body = ValueBindingExpression::new(expression).inner().to_string();
        self.evaluate_body(ctx, &body)
    }

    fn bean(&self, ctx: &RequestContext, name: &str) -> Option<Value> {
        ctx.bean(name).cloned()
    }

    fn property_details(&self, ctx: &RequestContext, expression: &ValueBindingExpression) -> Result<PropertyDetails> {
        if !expression.is_el_term() {
            return Err(ExtValError::InvalidExpression(expression.to_string()));
        }

        let segments = expression.segments();
        if segments.len() < 2 {
            return Err(ExtValError::UnresolvableBinding(format!(
                "{} does not point to a property",
                expression
            )));
        }

        let names = segments
            .iter()
            .map(|segment| self.segment_name(ctx, segment))
            .collect::<Result<Vec<_>>>()?;
        let key = names.join(".");
        let property = names[names.len() - 1].clone();

        let base = self.navigate(ctx, &segments[..segments.len() - 1])?;
        trace!(binding = %expression, key = %key, base = base.kind(), "Resolved property details");

        match base {
            Value::Object(bean) => Ok(PropertyDetails::new(key, Some(bean), property)),
            Value::Null => Ok(PropertyDetails::new(key, None, property)),
            other => Err(ExtValError::UnresolvableBinding(format!(
                "base of {} is a {} value",
                expression,
                other.kind()
            ))),
        }
    }
}

fn literal(body: &str) -> Option<Value> {
    match body {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        "null" => return Some(Value::Null),
        _ => {}
    }

    if body.len() >= 2
        && ((body.starts_with('\'') && body.ends_with('\'')) || (body.starts_with('"') && body.ends_with('"')))
    {
        return Some(Value::Text(body[1..body.len() - 1].to_string()));
    }

    if let Ok(integer) = body.parse::<i64>() {
        return Some(Value::Integer(integer));
    }
    if body.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
        if let Ok(decimal) = body.parse::<f64>() {
            return Some(Value::Decimal(decimal));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bean;

    fn context() -> RequestContext {
        let address = Bean::new("Address").with("city", "Vienna");
        let person = Bean::new("Person")
            .with("name", "Jane")
            .with("active", true)
            .with("address", address);
        RequestContext::new("/register.xhtml")
            .with_bean("person", person)
            .with_bean("fieldName", "name")
    }

    #[test]
    fn test_value_navigation() {
        let evaluator = ScopeExpressionEvaluator::new();
        let ctx = context();

        assert_eq!(evaluator.value_of(&ctx, "#{person.name}").unwrap(), Value::from("Jane"));
        assert_eq!(evaluator.value_of(&ctx, "#{person['address'].city}").unwrap(), Value::from("Vienna"));
        assert_eq!(evaluator.value_of(&ctx, "#{person[fieldName]}").unwrap(), Value::from("Jane"));
        assert_eq!(evaluator.value_of(&ctx, "#{person.nickname}").unwrap(), Value::Null);
        assert_eq!(evaluator.value_of(&ctx, "#{person.nickname.length}").unwrap(), Value::Null);
        assert!(evaluator.value_of(&ctx, "#{unknown.name}").is_err());
        assert!(evaluator.value_of(&ctx, "#{person.name.first}").is_err());
    }

    #[test]
    fn test_literals_and_negation() {
        let evaluator = ScopeExpressionEvaluator::new();
        let ctx = context();

        assert_eq!(evaluator.value_of(&ctx, "#{true}").unwrap(), Value::Bool(true));
        assert_eq!(evaluator.value_of(&ctx, "#{!person.active}").unwrap(), Value::Bool(false));
        assert_eq!(evaluator.value_of(&ctx, "#{42}").unwrap(), Value::Integer(42));
        assert!(evaluator.is_valid(&ctx, "#{not person.active}"));
        assert!(!evaluator.is_valid(&ctx, "#{!person.name}"));
        assert!(!evaluator.is_valid(&ctx, "person.active"));
    }

    #[test]
    fn test_property_details() {
        let evaluator = ScopeExpressionEvaluator::new();
        let ctx = context();

        let details = evaluator
            .property_details(&ctx, &ValueBindingExpression::new("#{person.address.city}"))
            .unwrap();
        assert_eq!(details.key(), "person.address.city");
        assert_eq!(details.property(), "city");
        assert_eq!(details.base_object().unwrap().type_name, "Address");

        let details = evaluator
            .property_details(&ctx, &ValueBindingExpression::new("#{person[fieldName]}"))
            .unwrap();
        assert_eq!(details.key(), "person.name");
        assert_eq!(details.property(), "name");

        let details = evaluator
            .property_details(&ctx, &ValueBindingExpression::new("#{person.employer.name}"))
            .unwrap();
        assert!(details.base_object().is_none());

        assert!(evaluator
            .property_details(&ctx, &ValueBindingExpression::new("#{person}"))
            .is_err());
    }
}
