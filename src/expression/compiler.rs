use serde_json::Value;

use super::ast::{ExpressionNode, Literal};
use super::error::{CompileError, ExpressionPath};
use crate::settings::CompilerSettings;

/// Recursive-descent translator from the operator-first array form
/// (`["op", arg, ...]`) to an [`ExpressionNode`] tree.
///
/// Compilation is pure: the same input always yields an equal tree, and any
/// unsupported element anywhere fails the whole call.
#[derive(Debug, Clone, Default)]
pub struct ExpressionCompiler {
    settings: CompilerSettings,
}

impl ExpressionCompiler {
    pub fn new(settings: CompilerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CompilerSettings {
        &self.settings
    }

    /// Compile any JSON value that must be an expression array.
    pub fn compile_value(&self, value: &Value) -> Result<ExpressionNode, CompileError> {
        match value {
            Value::Array(items) => self.compile(items),
            other => Err(CompileError::malformed(
                format!("expected an expression array, found {}", kind_name(other)),
                ExpressionPath::root(),
            )),
        }
    }

    /// Compile one expression array.
    pub fn compile(&self, array: &[Value]) -> Result<ExpressionNode, CompileError> {
        let mut path = ExpressionPath::root();
        let node = self.compile_array(array, 1, &mut path)?;
        log::trace!("compiled expression with {} nodes", node.node_count());
        Ok(node)
    }

    fn compile_array(
        &self,
        array: &[Value],
        depth: usize,
        path: &mut ExpressionPath,
    ) -> Result<ExpressionNode, CompileError> {
        let max_depth = self.settings.effective_max_depth();
        if depth > max_depth {
            return Err(CompileError::depth_limit(max_depth, path.clone()));
        }

        let name = match array.first() {
            Some(Value::String(name)) => name.clone(),
            Some(other) => {
                return Err(CompileError::malformed(
                    format!("operator name must be a string, found {}", kind_name(other)),
                    path.clone(),
                ));
            }
            None => {
                return Err(CompileError::malformed(
                    "empty expression array has no operator",
                    path.clone(),
                ));
            }
        };

        let mut args = Vec::with_capacity(array.len().saturating_sub(1));
        for (i, element) in array.iter().enumerate().skip(1) {
            path.push(i);
            let arg = self.compile_element(element, depth, path)?;
            path.pop();
            args.push(arg);
        }

        Ok(ExpressionNode::Operator { name, args })
    }

    fn compile_element(
        &self,
        element: &Value,
        depth: usize,
        path: &mut ExpressionPath,
    ) -> Result<ExpressionNode, CompileError> {
        let literal = match element {
            Value::Array(nested) => return self.compile_array(nested, depth + 1, path),
            Value::Bool(b) => Literal::Bool(*b),
            Value::Number(n) => {
                let n = n.as_f64().ok_or_else(|| {
                    CompileError::unsupported(format!("number {n}"), path.clone())
                })?;
                let rounded = self.settings.number_precision.apply(n);
                if !rounded.is_finite() {
                    return Err(CompileError::unsupported(
                        format!("number {n} out of range"),
                        path.clone(),
                    ));
                }
                Literal::Number(rounded)
            }
            Value::String(s) => Literal::Text(s.clone()),
            Value::Null | Value::Object(_) => {
                return Err(CompileError::unsupported(kind_name(element), path.clone()));
            }
        };
        Ok(ExpressionNode::Literal { value: literal })
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::expression::error::CompileErrorKind;
    use crate::settings::{NumberPrecision, MAX_DEPTH_CEILING};
    use serde_json::json;

    fn compile(value: Value) -> Result<ExpressionNode, CompileError> {
        ExpressionCompiler::default().compile_value(&value)
    }

    fn lit(v: impl Into<Literal>) -> ExpressionNode {
        ExpressionNode::literal(v)
    }

    #[test]
    fn addition() {
        let node = compile(json!(["+", 1, 2])).unwrap();
        assert_eq!(node, ExpressionNode::operator("+", vec![lit(1.0), lit(2.0)]));
    }

    #[test]
    fn match_with_nested_get() {
        let node = compile(json!(["match", ["get", "class"], "park", true, false])).unwrap();
        assert_eq!(
            node,
            ExpressionNode::operator(
                "match",
                vec![
                    ExpressionNode::operator("get", vec![lit("class")]),
                    lit("park"),
                    lit(true),
                    lit(false),
                ],
            )
        );
    }

    #[test]
    fn interpolate_keeps_order_and_zero_arg_operators() {
        let node = compile(json!(["interpolate", ["linear"], ["zoom"], 0, 1, 10, 5])).unwrap();
        assert_eq!(node.name(), Some("interpolate"));
        let args = node.args();
        assert_eq!(args.len(), 6);
        assert_eq!(args[0], ExpressionNode::operator("linear", vec![]));
        assert_eq!(args[1], ExpressionNode::operator("zoom", vec![]));
        assert_eq!(args[2], lit(0.0));
        assert_eq!(args[3], lit(1.0));
        assert_eq!(args[4], lit(10.0));
        assert_eq!(args[5], lit(5.0));
    }

    #[test]
    fn child_count_matches_array_length() {
        let input = json!(["case", ["==", ["get", "a"], 1], "one", "other"]);
        let node = compile(input.clone()).unwrap();
        assert_eq!(node.args().len(), input.as_array().unwrap().len() - 1);
    }

    #[test]
    fn compilation_is_deterministic() {
        let input = json!(["coalesce", ["get", "name_en"], ["get", "name"], "unnamed"]);
        assert_eq!(compile(input.clone()).unwrap(), compile(input).unwrap());
    }

    #[test]
    fn null_element_fails_without_partial_tree() {
        let err = compile(json!(["+", 1, null])).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::UnsupportedConversion);
        assert_eq!(err.path.indices(), &[2]);
    }

    #[test]
    fn nested_object_fails_with_path() {
        let err = compile(json!(["all", ["==", {"a": 1}, 2]])).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::UnsupportedConversion);
        assert_eq!(err.path.to_string(), "[1][1]");
        assert_eq!(err.message, "object");
    }

    #[test]
    fn operator_must_be_text() {
        let err = compile(json!([1, 2])).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::Malformed);

        let err = compile(json!(["any", [true]])).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::Malformed);
        assert_eq!(err.path.indices(), &[1]);
    }

    #[test]
    fn empty_array_is_malformed() {
        let err = compile(json!([])).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::Malformed);
    }

    #[test]
    fn non_array_root_is_malformed() {
        let err = compile(json!("zoom")).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::Malformed);
    }

    #[test]
    fn depth_limit_is_enforced() {
        let settings = CompilerSettings {
            max_depth: 3,
            ..CompilerSettings::default()
        };
        let compiler = ExpressionCompiler::new(settings);
        assert!(compiler.compile_value(&json!(["a", ["b", ["c"]]])).is_ok());

        let err = compiler
            .compile_value(&json!(["a", ["b", ["c", ["d"]]]]))
            .unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::DepthLimit { limit: 3 });
        assert_eq!(err.path.indices(), &[1, 1, 1]);
    }

    #[test]
    fn deeply_nested_input_is_rejected_by_default() {
        let mut value = json!(["zoom"]);
        for _ in 0..1000 {
            value = json!(["abs", value]);
        }
        let err = compile(value).unwrap_err();
        assert!(matches!(err.kind, CompileErrorKind::DepthLimit { .. }));
    }

    #[test]
    fn single_precision_numbers() {
        let compiler = ExpressionCompiler::new(CompilerSettings {
            number_precision: NumberPrecision::Single,
            ..CompilerSettings::default()
        });
        let node = compiler.compile_value(&json!(["literal", 0.1])).unwrap();
        assert_eq!(node.args()[0], lit(f64::from(0.1_f32)));
    }

    #[test]
    fn single_precision_overflow_is_unsupported() {
        let compiler = ExpressionCompiler::new(CompilerSettings {
            number_precision: NumberPrecision::Single,
            ..CompilerSettings::default()
        });
        let err = compiler
            .compile_value(&json!(["+", 1, ["-", 1e300]]))
            .unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::UnsupportedConversion);
        assert_eq!(err.path.indices(), &[2, 1]);

        // The same value fits at double precision.
        assert!(compile(json!(["literal", 1e300])).is_ok());
    }

    #[test]
    fn oversized_max_depth_is_capped() {
        let compiler = ExpressionCompiler::new(CompilerSettings {
            max_depth: usize::MAX,
            ..CompilerSettings::default()
        });
        let mut value = json!(["zoom"]);
        for _ in 0..MAX_DEPTH_CEILING {
            value = json!(["abs", value]);
        }
        let err = compiler.compile_value(&value).unwrap_err();
        assert_eq!(
            err.kind,
            CompileErrorKind::DepthLimit {
                limit: MAX_DEPTH_CEILING
            }
        );
    }
}
