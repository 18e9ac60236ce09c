//! Parsing and rewriting of `#{...}` binding expressions

use crate::error::{ExtValError, Result};
use std::fmt;

/// One step of a binding path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// `.name`, or the root name.
    Property(String),
    /// `['name']`
    Key(String),
    /// `[expression]`, resolved against the request scope.
    Dynamic(String),
}

impl Segment {
    /// Property name as written in the expression.
    pub fn name(&self) -> &str {
        match self {
            Segment::Property(name) | Segment::Key(name) | Segment::Dynamic(name) => name,
        }
    }

    fn from_brackets(content: &str) -> Self {
        let content = content.trim();
        let quoted = content.len() >= 2
            && ((content.starts_with('\'') && content.ends_with('\''))
                || (content.starts_with('"') && content.ends_with('"')));

        if quoted {
            Segment::Key(content[1..content.len() - 1].to_string())
        } else {
            Segment::Dynamic(content.to_string())
        }
    }
}

/// A value binding such as `#{bean.property}` or `#{bean['property']}`.
///
/// Rewrites always emit dot syntax, so `#{a['b']}` becomes `#{a.c}` after
/// replacing its property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueBindingExpression {
    expression: String,
}

impl ValueBindingExpression {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }

    /// Parses and rejects anything that is not a single well-formed term.
    pub fn parse(expression: &str) -> Result<Self> {
        if !is_el_term(expression) {
            return Err(ExtValError::InvalidExpression(expression.to_string()));
        }
        Ok(Self::new(expression))
    }

    pub fn expression_string(&self) -> &str {
        &self.expression
    }

    /// Body without the `#{` `}` delimiters.
    pub fn inner(&self) -> &str {
        strip_delimiters(&self.expression)
    }

    /// Expression of the owning object; `None` for a bare root name.
    pub fn base_expression(&self) -> Option<ValueBindingExpression> {
        let (base, _) = split_last(self.inner());
        base.map(wrap)
    }

    pub fn property(&self) -> String {
        let (_, last) = split_last(self.inner());
        last.name().to_string()
    }

    pub fn last_segment(&self) -> Segment {
        split_last(self.inner()).1
    }

    /// Root name followed by every navigation step.
    pub fn segments(&self) -> Vec<Segment> {
        let (base, last) = split_last(self.inner());
        let mut segments = base.map(|base| wrap(base).segments()).unwrap_or_default();
        segments.push(last);
        segments
    }

    pub fn replace_property(&self, property: &str) -> ValueBindingExpression {
        match self.base_expression() {
            Some(base) => wrap(&format!("{}.{}", base.inner(), property)),
            None => wrap(property),
        }
    }

    pub fn add_property(&self, property: &str) -> ValueBindingExpression {
        wrap(&format!("{}.{}", self.inner(), property))
    }

    /// Resolves a path relative to this binding.
    ///
    /// When the first segment of `path` names this binding or one of its
    /// bases, the rest of the path is appended there. Otherwise `path`
    /// replaces the last property (a sibling of the bound property).
    pub fn replace_or_add_property(&self, path: &str) -> ValueBindingExpression {
        let (first, rest) = match path.split_once('.') {
            Some((first, rest)) => (first, Some(rest)),
            None => (path, None),
        };

        let mut candidate = self.base_expression();
        while let Some(expression) = candidate {
            if expression.property() == first {
                return match rest {
                    Some(rest) => expression.add_property(rest),
                    None => expression,
                };
            }
            candidate = expression.base_expression();
        }

        self.replace_property(path)
    }

    pub fn is_el_term(&self) -> bool {
        is_el_term(&self.expression)
    }
}

impl fmt::Display for ValueBindingExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

/// `#{...}` with balanced brackets and quotes and a non-empty body.
pub fn is_el_term(expression: &str) -> bool {
    let trimmed = expression.trim();
    if !(trimmed.starts_with("#{") && trimmed.ends_with('}')) || trimmed.len() <= 3 {
        return false;
    }

    let inner = strip_delimiters(trimmed);
    if inner.trim().is_empty() {
        return false;
    }

    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    for c in inner.chars() {
        if let Some(open) = quote {
            if c == open {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            '{' | '}' => return false,
            _ => {}
        }
    }

    depth == 0 && quote.is_none()
}

fn strip_delimiters(expression: &str) -> &str {
    let trimmed = expression.trim();
    trimmed
        .strip_prefix("#{")
        .and_then(|rest| rest.strip_suffix('}'))
        .unwrap_or(trimmed)
        .trim()
}

fn wrap(inner: &str) -> ValueBindingExpression {
    ValueBindingExpression::new(format!("#{{{}}}", inner))
}

/// Splits off the last navigation step, honouring nested brackets and quotes.
fn split_last(inner: &str) -> (Option<&str>, Segment) {
    let bytes = inner.as_bytes();
    let mut depth = 0i32;
    let mut quote: Option<u8> = None;

    if inner.ends_with(']') {
        for index in (0..bytes.len()).rev() {
            let c = bytes[index];
            if let Some(open) = quote {
                if c == open {
                    quote = None;
                }
                continue;
            }
            match c {
                b'\'' | b'"' => quote = Some(c),
                b']' => depth += 1,
                b'[' => {
                    depth -= 1;
                    if depth == 0 {
                        let base = &inner[..index];
                        let segment = Segment::from_brackets(&inner[index + 1..inner.len() - 1]);
                        return (non_empty(base), segment);
                    }
                }
                _ => {}
            }
        }
    } else {
        for index in (0..bytes.len()).rev() {
            let c = bytes[index];
            if let Some(open) = quote {
                if c == open {
                    quote = None;
                }
                continue;
            }
            match c {
                b'\'' | b'"' => quote = Some(c),
                b']' => depth += 1,
                b'[' => depth -= 1,
                b'.' if depth == 0 => {
                    let segment = Segment::Property(inner[index + 1..].trim().to_string());
                    return (non_empty(&inner[..index]), segment);
                }
                _ => {}
            }
        }
    }

    (None, Segment::Property(inner.trim().to_string()))
}

fn non_empty(base: &str) -> Option<&str> {
    let base = base.trim();
    if base.is_empty() {
        None
    } else {
        Some(base)
    }
}
