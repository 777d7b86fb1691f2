//! Serde-deserializable description of a stops-backed function, mirroring the
//! value-object layout (`type`, `base`, `stops`, `property`, `default`).

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StyleError;
use crate::function::Function;
use crate::model::stops::{CompositeValue, ExponentialStops, Stop, Stops, StopsKind, ValueObject};

/// A JSON stop input. Numbers order numerically, strings lexically and bools
/// `false < true`. Any other pairing is incomparable, which interval and
/// exponential tables reject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StopInput(pub Value);

impl PartialOrd for StopInput {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (&self.0, &other.0) {
            (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Camera,
    Source,
    Composite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopsDescription {
    #[serde(rename = "type")]
    pub kind: StopsKind,
    #[serde(default)]
    pub base: Option<f64>,
    #[serde(default)]
    pub stops: Vec<(Value, Value)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionDescription {
    pub shape: ShapeKind,
    #[serde(default)]
    pub property: Option<String>,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub stops: Option<StopsDescription>,
}

/// A function built from a description. Composite functions key their stops
/// by (zoom, value) pairs, so they get their own variant.
#[derive(Debug, Clone)]
pub enum DescribedFunction {
    Single(Function<StopInput, Value>),
    Composite(Function<CompositeValue<f64, StopInput>, Value>),
}

impl DescribedFunction {
    pub fn to_value_object(&self) -> Result<ValueObject, StyleError> {
        match self {
            DescribedFunction::Single(f) => f.to_value_object(),
            DescribedFunction::Composite(f) => f.to_value_object(),
        }
    }
}

fn build_stops<I: PartialOrd>(
    desc: StopsDescription,
    convert: impl Fn(Value) -> Result<I, StyleError>,
) -> Result<Stops<I, Value>, StyleError> {
    let entries = desc
        .stops
        .into_iter()
        .map(|(input, output)| Ok(Stop::new(convert(input)?, output)))
        .collect::<Result<Vec<_>, StyleError>>()?;
    Ok(match desc.kind {
        StopsKind::Identity => Stops::identity(),
        StopsKind::Interval => Stops::interval(entries),
        StopsKind::Exponential => {
            let stops = ExponentialStops::new(entries);
            Stops::from(match desc.base {
                Some(base) => stops.with_base(base),
                None => stops,
            })
        }
        StopsKind::Categorical => Stops::categorical(entries),
    })
}

fn with_default<I, O>(f: Function<I, O>, default: Option<O>) -> Result<Function<I, O>, StyleError> {
    match default {
        Some(value) => f.with_default_value(value),
        None => Ok(f),
    }
}

impl FunctionDescription {
    pub fn from_value(value: Value) -> Result<Self, StyleError> {
        serde_json::from_value(value).map_err(|e| {
            StyleError::invalid_argument(format!("invalid function description: {e}"))
        })
    }

    pub fn into_function(self) -> Result<DescribedFunction, StyleError> {
        let stops = self
            .stops
            .ok_or_else(|| StyleError::invalid_argument("function description has no stops"))?;
        if stops.kind == StopsKind::Identity && !stops.stops.is_empty() {
            return Err(StyleError::invalid_argument("identity stops take no entries"));
        }
        if self.shape == ShapeKind::Camera && self.property.is_some() {
            return Err(StyleError::invalid_argument(
                "camera function description takes no property",
            ));
        }
        let property = || {
            self.property
                .clone()
                .ok_or_else(|| StyleError::invalid_argument("function description has no property"))
        };

        match self.shape {
            ShapeKind::Camera => {
                let f = Function::zoom(build_stops(stops, |v| Ok(StopInput(v)))?)?;
                Ok(DescribedFunction::Single(with_default(f, self.default)?))
            }
            ShapeKind::Source => {
                let f = Function::property(property()?, build_stops(stops, |v| Ok(StopInput(v)))?)?;
                Ok(DescribedFunction::Single(with_default(f, self.default)?))
            }
            ShapeKind::Composite => {
                let stops = build_stops(stops, |v| {
                    serde_json::from_value::<CompositeValue<f64, StopInput>>(v).map_err(|e| {
                        StyleError::invalid_argument(format!("invalid composite stop input: {e}"))
                    })
                })?;
                let f = Function::composite(property()?, stops)?;
                Ok(DescribedFunction::Composite(with_default(f, self.default)?))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(value: Value) -> Result<DescribedFunction, StyleError> {
        FunctionDescription::from_value(value)?.into_function()
    }

    #[test]
    fn camera_description_sorts_and_serializes() {
        let f = build(json!({
            "shape": "camera",
            "stops": {"type": "exponential", "base": 2.0, "stops": [[10, 5], [0, 1]]}
        }))
        .unwrap();
        let obj = f.to_value_object().unwrap();
        assert_eq!(obj["type"], json!("exponential"));
        assert_eq!(obj["base"], json!(2.0));
        assert_eq!(obj["stops"], json!([[0, 1], [10, 5]]));
    }

    #[test]
    fn source_description_with_default() {
        let f = build(json!({
            "shape": "source",
            "property": "class",
            "default": "#000",
            "stops": {"type": "categorical", "stops": [["park", "#0f0"], ["water", "#00f"]]}
        }))
        .unwrap();
        let obj = f.to_value_object().unwrap();
        assert_eq!(obj["property"], json!("class"));
        assert_eq!(obj["default"], json!("#000"));
        assert_eq!(obj["stops"][1], json!(["water", "#00f"]));
    }

    #[test]
    fn composite_description() {
        let f = build(json!({
            "shape": "composite",
            "property": "rank",
            "stops": {"type": "interval", "stops": [
                [{"zoom": 5, "value": 1}, 2],
                [{"zoom": 0, "value": 1}, 1]
            ]}
        }))
        .unwrap();
        assert!(matches!(f, DescribedFunction::Composite(_)));
        let obj = f.to_value_object().unwrap();
        assert_eq!(obj["stops"][0][0], json!({"zoom": 0.0, "value": 1}));
    }

    #[test]
    fn missing_stops_is_invalid_argument() {
        for shape in ["camera", "source", "composite"] {
            let err = build(json!({"shape": shape, "property": "p"})).unwrap_err();
            assert!(matches!(err, StyleError::InvalidArgument { .. }), "{shape}");
        }
    }

    #[test]
    fn missing_property_is_invalid_argument() {
        let err = build(json!({
            "shape": "source",
            "stops": {"type": "identity"}
        }))
        .unwrap_err();
        assert!(matches!(err, StyleError::InvalidArgument { .. }));
    }

    #[test]
    fn malformed_description_is_invalid_argument() {
        let err = build(json!({"shape": "spiral"})).unwrap_err();
        assert!(matches!(err, StyleError::InvalidArgument { .. }));
    }

    #[test]
    fn mixed_input_types_are_invalid_argument() {
        let err = build(json!({
            "shape": "source",
            "property": "rank",
            "stops": {"type": "interval", "stops": [[1, "a"], ["x", "b"]]}
        }))
        .unwrap_err();
        assert!(matches!(err, StyleError::InvalidArgument { .. }));

        let err = build(json!({
            "shape": "camera",
            "stops": {"type": "exponential", "stops": [[0, 1], [null, 2]]}
        }))
        .unwrap_err();
        assert!(matches!(err, StyleError::InvalidArgument { .. }));

        // Categorical keys may mix types.
        assert!(build(json!({
            "shape": "source",
            "property": "class",
            "stops": {"type": "categorical", "stops": [[1, "a"], ["x", "b"]]}
        }))
        .is_ok());
    }

    #[test]
    fn camera_property_is_invalid_argument() {
        let err = build(json!({
            "shape": "camera",
            "property": "rank",
            "stops": {"type": "interval", "stops": [[0, 1]]}
        }))
        .unwrap_err();
        assert!(matches!(err, StyleError::InvalidArgument { .. }));
    }

    #[test]
    fn identity_entries_are_invalid_argument() {
        let err = build(json!({
            "shape": "source",
            "property": "name",
            "stops": {"type": "identity", "stops": [[0, 1]]}
        }))
        .unwrap_err();
        assert!(matches!(err, StyleError::InvalidArgument { .. }));

        assert!(build(json!({
            "shape": "source",
            "property": "name",
            "stops": {"type": "identity"}
        }))
        .is_ok());
    }

    #[test]
    fn stop_input_ordering() {
        assert!(StopInput(json!(1)) < StopInput(json!(2.5)));
        assert!(StopInput(json!("a")) < StopInput(json!("b")));
        assert_eq!(StopInput(json!(1)).partial_cmp(&StopInput(json!("a"))), None);
    }
}
