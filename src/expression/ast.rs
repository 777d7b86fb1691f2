//! Compiled expression tree handed to the rendering engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// A literal leaf. Numbers are carried at double precision; integer and float
/// sources are not distinguished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
#[ts(export)]
pub enum Literal {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Literal {
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Bool(b) => Value::Bool(*b),
            // Non-finite numbers have no JSON form.
            Literal::Number(n) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
            Literal::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Number(n)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::Text(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::Text(s)
    }
}

/// A node of a compiled expression: either a literal leaf or an operator
/// applied to ordered arguments. Trees are immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum ExpressionNode {
    Literal { value: Literal },
    Operator { name: String, args: Vec<ExpressionNode> },
}

impl ExpressionNode {
    pub fn literal(value: impl Into<Literal>) -> Self {
        ExpressionNode::Literal {
            value: value.into(),
        }
    }

    pub fn operator(name: impl Into<String>, args: Vec<ExpressionNode>) -> Self {
        ExpressionNode::Operator {
            name: name.into(),
            args,
        }
    }

    /// Operator name, or `None` for a literal.
    pub fn name(&self) -> Option<&str> {
        match self {
            ExpressionNode::Operator { name, .. } => Some(name),
            ExpressionNode::Literal { .. } => None,
        }
    }

    /// Operator arguments. Literals have none.
    pub fn args(&self) -> &[ExpressionNode] {
        match self {
            ExpressionNode::Operator { args, .. } => args,
            ExpressionNode::Literal { .. } => &[],
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            ExpressionNode::Literal { value } => Some(value),
            ExpressionNode::Operator { .. } => None,
        }
    }

    /// Nesting depth. A literal has depth 0, an operator 1 + its deepest argument.
    pub fn depth(&self) -> usize {
        match self {
            ExpressionNode::Literal { .. } => 0,
            ExpressionNode::Operator { args, .. } => {
                1 + args.iter().map(ExpressionNode::depth).max().unwrap_or(0)
            }
        }
    }

    pub fn node_count(&self) -> usize {
        1 + self.args().iter().map(ExpressionNode::node_count).sum::<usize>()
    }

    /// Convert back to the operator-first array form.
    pub fn to_array(&self) -> Value {
        match self {
            ExpressionNode::Literal { value } => value.to_value(),
            ExpressionNode::Operator { name, args } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().map(ExpressionNode::to_array));
                Value::Array(items)
            }
        }
    }
}

impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_array())
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ExpressionNode {
        ExpressionNode::operator(
            "match",
            vec![
                ExpressionNode::operator("get", vec![ExpressionNode::literal("class")]),
                ExpressionNode::literal("park"),
                ExpressionNode::literal(true),
                ExpressionNode::literal(false),
            ],
        )
    }

    #[test]
    fn to_array_restores_operator_first_form() {
        assert_eq!(
            sample().to_array(),
            json!(["match", ["get", "class"], "park", true, false])
        );
    }

    #[test]
    fn display_prints_json() {
        let node = ExpressionNode::operator("zoom", vec![]);
        assert_eq!(node.to_string(), r#"["zoom"]"#);
    }

    #[test]
    fn depth_and_count() {
        let node = sample();
        assert_eq!(node.depth(), 2);
        assert_eq!(node.node_count(), 6);
        assert_eq!(ExpressionNode::literal(1.0).depth(), 0);
    }

    #[test]
    fn accessors() {
        let node = sample();
        assert_eq!(node.name(), Some("match"));
        assert_eq!(node.args().len(), 4);
        assert_eq!(node.args()[1].as_literal(), Some(&Literal::Text("park".into())));
        assert!(node.args()[1].args().is_empty());
    }
}
