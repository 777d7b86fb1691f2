//! Uniform handle over how a style property's value is derived.
//!
//! A [`Function`] is backed either by a stop table (built through one of the
//! shape factories: [`Function::zoom`], [`Function::property`],
//! [`Function::composite`]) or by a raw expression array deserialized from
//! style data ([`Function::from_expression`]). The backing is a sum type, so a
//! function never holds both or neither.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;

use crate::error::StyleError;
use crate::expression::ast::ExpressionNode;
use crate::expression::compiler::ExpressionCompiler;
use crate::model::stops::{CompositeValue, Stops, StopsKind, StopsVariant, ValueObject};

pub(crate) const PROPERTY_KEY: &str = "property";
pub(crate) const DEFAULT_VALUE_KEY: &str = "default";

/// Function driven by zoom only.
pub type CameraFunction<Z, O> = Function<Z, O>;
/// Function driven by a single feature property.
pub type SourceFunction<I, O> = Function<I, O>;
/// Function driven by zoom and a feature property together.
pub type CompositeFunction<Z, V, O> = Function<CompositeValue<Z, V>, O>;

/// Which inputs drive a stops-backed function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionShape {
    Camera,
    Source { property: String },
    Composite { property: String },
}

impl FunctionShape {
    pub fn property(&self) -> Option<&str> {
        match self {
            FunctionShape::Camera => None,
            FunctionShape::Source { property } | FunctionShape::Composite { property } => {
                Some(property)
            }
        }
    }

    fn label(&self) -> &'static str {
        match self {
            FunctionShape::Camera => "CameraFunction",
            FunctionShape::Source { .. } => "SourceFunction",
            FunctionShape::Composite { .. } => "CompositeFunction",
        }
    }
}

const CAMERA_KINDS: &[StopsKind] = &[StopsKind::Exponential, StopsKind::Interval];
const SOURCE_KINDS: &[StopsKind] = &[
    StopsKind::Exponential,
    StopsKind::Interval,
    StopsKind::Categorical,
    StopsKind::Identity,
];
const COMPOSITE_KINDS: &[StopsKind] = &[
    StopsKind::Categorical,
    StopsKind::Exponential,
    StopsKind::Interval,
];

#[derive(Debug, Clone)]
enum Backing<I, O> {
    Stops {
        shape: FunctionShape,
        stops: Stops<I, O>,
        default_value: Option<O>,
    },
    Expression(ExpressionSource),
}

/// Raw expression array plus its lazily compiled tree. The cache is
/// single-assignment: the first stored tree wins and later compilations of the
/// same array are equal anyway.
#[derive(Debug)]
struct ExpressionSource {
    array: Vec<Value>,
    compiled: RwLock<Option<Arc<ExpressionNode>>>,
}

impl Clone for ExpressionSource {
    fn clone(&self) -> Self {
        Self {
            array: self.array.clone(),
            compiled: RwLock::new(self.compiled.read().clone()),
        }
    }
}

/// A style function with input type `I` and output type `O`.
#[derive(Debug, Clone)]
pub struct Function<I, O> {
    backing: Backing<I, O>,
}

fn require_stops<I, O>(
    stops: Stops<I, O>,
    allowed: &[StopsKind],
    shape: &str,
) -> Result<Stops<I, O>, StyleError> {
    let kind = stops.kind();
    if !allowed.contains(&kind) {
        return Err(StyleError::invalid_argument(format!(
            "{shape} does not support {kind} stops"
        )));
    }
    if kind != StopsKind::Identity && stops.entries().is_empty() {
        return Err(StyleError::invalid_argument(format!(
            "{shape} requires at least one {kind} stop"
        )));
    }
    if !stops.is_ordered() {
        return Err(StyleError::invalid_argument(format!(
            "{shape} has {kind} stop inputs that cannot be sorted ascending"
        )));
    }
    Ok(stops)
}

fn require_property(property: impl Into<String>, shape: &str) -> Result<String, StyleError> {
    let property = property.into();
    if property.is_empty() {
        return Err(StyleError::invalid_argument(format!(
            "{shape} requires a non-empty property name"
        )));
    }
    Ok(property)
}

impl<I, O> Function<I, O> {
    /// Camera function over exponential or interval zoom stops.
    pub fn zoom(stops: Stops<I, O>) -> Result<CameraFunction<I, O>, StyleError> {
        let stops = require_stops(stops, CAMERA_KINDS, "camera function")?;
        Ok(Self::from_stops(FunctionShape::Camera, stops))
    }

    /// Source function over the named feature property.
    pub fn property(
        property: impl Into<String>,
        stops: Stops<I, O>,
    ) -> Result<SourceFunction<I, O>, StyleError> {
        let property = require_property(property, "source function")?;
        let stops = require_stops(stops, SOURCE_KINDS, "source function")?;
        Ok(Self::from_stops(FunctionShape::Source { property }, stops))
    }

    /// Build an expression-backed function from deserialized style data.
    pub fn from_expression(value: Value) -> Result<Self, StyleError> {
        match value {
            Value::Array(array) => Ok(Self {
                backing: Backing::Expression(ExpressionSource {
                    array,
                    compiled: RwLock::new(None),
                }),
            }),
            _ => Err(StyleError::invalid_argument("expression must be a JSON array")),
        }
    }

    fn from_stops(shape: FunctionShape, stops: Stops<I, O>) -> Self {
        Self {
            backing: Backing::Stops {
                shape,
                stops,
                default_value: None,
            },
        }
    }

    /// Set the value used when a feature falls outside stop coverage.
    /// Only source and composite functions carry a default.
    pub fn with_default_value(mut self, value: O) -> Result<Self, StyleError> {
        match &mut self.backing {
            Backing::Stops {
                shape: FunctionShape::Source { .. } | FunctionShape::Composite { .. },
                default_value,
                ..
            } => *default_value = Some(value),
            Backing::Stops { shape, .. } => {
                return Err(StyleError::unsupported_state(format!(
                    "{} has no default value",
                    shape.label()
                )));
            }
            Backing::Expression(_) => {
                return Err(StyleError::unsupported_state(
                    "expression-backed function has no default value",
                ));
            }
        }
        Ok(self)
    }

    pub fn is_stops_backed(&self) -> bool {
        matches!(self.backing, Backing::Stops { .. })
    }

    pub fn is_expression_backed(&self) -> bool {
        matches!(self.backing, Backing::Expression(_))
    }

    /// Shape of a stops-backed function. `None` for expression-backed ones.
    pub fn shape(&self) -> Option<&FunctionShape> {
        match &self.backing {
            Backing::Stops { shape, .. } => Some(shape),
            Backing::Expression(_) => None,
        }
    }

    pub fn property_name(&self) -> Option<&str> {
        self.shape().and_then(FunctionShape::property)
    }

    pub fn default_value(&self) -> Option<&O> {
        match &self.backing {
            Backing::Stops { default_value, .. } => default_value.as_ref(),
            Backing::Expression(_) => None,
        }
    }

    fn expression_source(&self) -> Result<&ExpressionSource, StyleError> {
        match &self.backing {
            Backing::Expression(source) => Ok(source),
            Backing::Stops { shape, .. } => Err(StyleError::unsupported_state(format!(
                "{} is backed by stops, not an expression",
                shape.label()
            ))),
        }
    }

    /// The raw expression array this function was built from.
    pub fn raw_expression(&self) -> Result<&[Value], StyleError> {
        Ok(&self.expression_source()?.array)
    }

    /// Compiled expression tree, compiled on first use and cached.
    pub fn expression(&self) -> Result<Arc<ExpressionNode>, StyleError> {
        let source = self.expression_source()?;
        if let Some(node) = source.compiled.read().as_ref() {
            return Ok(Arc::clone(node));
        }
        let node = Arc::new(ExpressionCompiler::default().compile(&source.array)?);
        let mut slot = source.compiled.write();
        Ok(Arc::clone(slot.get_or_insert(node)))
    }

    /// Compile with a specific compiler configuration. Not cached.
    pub fn expression_with(&self, compiler: &ExpressionCompiler) -> Result<ExpressionNode, StyleError> {
        let source = self.expression_source()?;
        Ok(compiler.compile(&source.array)?)
    }

    pub fn stops(&self) -> Result<&Stops<I, O>, StyleError> {
        match &self.backing {
            Backing::Stops { stops, .. } => Ok(stops),
            Backing::Expression(_) => Err(StyleError::unsupported_state(
                "expression-backed function has no stops",
            )),
        }
    }

    /// Probe the stop table for a concrete strategy. Never fails: a mismatch
    /// (or an expression-backed function) yields `None`.
    pub fn stops_as<S: StopsVariant<I, O>>(&self) -> Option<&S> {
        let Ok(stops) = self.stops() else {
            log::debug!("stops_as::<{}>() on an expression-backed function", S::KIND);
            return None;
        };
        let narrowed = S::narrow(stops);
        if narrowed.is_none() {
            log::debug!("Stops: {} is a different type than {}", stops.kind(), S::KIND);
        }
        narrowed
    }
}

impl<Z, V, O> Function<CompositeValue<Z, V>, O> {
    /// Composite function keyed by (zoom, property value) pairs.
    pub fn composite(
        property: impl Into<String>,
        stops: Stops<CompositeValue<Z, V>, O>,
    ) -> Result<CompositeFunction<Z, V, O>, StyleError> {
        let property = require_property(property, "composite function")?;
        let stops = require_stops(stops, COMPOSITE_KINDS, "composite function")?;
        Ok(Self::from_stops(FunctionShape::Composite { property }, stops))
    }
}

impl<I: Serialize, O: Serialize> Function<I, O> {
    /// Value object for the rendering engine: the stop table's own
    /// serialization plus `property` and `default` where the shape has them.
    pub fn to_value_object(&self) -> Result<ValueObject, StyleError> {
        let Backing::Stops {
            shape,
            stops,
            default_value,
        } = &self.backing
        else {
            return Err(StyleError::unsupported_state(
                "expression-backed function has no value object",
            ));
        };
        let mut map = stops.to_value_object()?;
        if let Some(property) = shape.property() {
            map.insert(PROPERTY_KEY.to_string(), Value::from(property));
        }
        if let Some(default_value) = default_value {
            map.insert(DEFAULT_VALUE_KEY.to_string(), serde_json::to_value(default_value)?);
        }
        Ok(map)
    }
}

impl<I, O> fmt::Display for Function<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.backing {
            Backing::Stops { shape, stops, .. } => write!(f, "{}: {stops}", shape.label()),
            Backing::Expression(source) => {
                write!(f, "Expression: {}", Value::Array(source.array.clone()))
            }
        }
    }
}
