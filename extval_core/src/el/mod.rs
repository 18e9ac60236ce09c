//! Binding expressions and their evaluation

pub mod expression;
pub mod resolver;

pub use expression::{is_el_term, Segment, ValueBindingExpression};
pub use resolver::{ExpressionEvaluator, ScopeExpressionEvaluator};
