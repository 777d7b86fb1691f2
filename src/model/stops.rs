use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StyleError;

/// Generic key/value mapping handed to the rendering engine. Key order is kept
/// so serialized output is stable.
pub type ValueObject = IndexMap<String, Value>;

/// A single (input, output) control point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop<I, O> {
    pub input: I,
    pub output: O,
}

impl<I, O> Stop<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self { input, output }
    }
}

/// Composite stop input: a zoom level paired with a feature-property value.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct CompositeValue<Z, V> {
    pub zoom: Z,
    pub value: V,
}

impl<Z, V> CompositeValue<Z, V> {
    pub fn new(zoom: Z, value: V) -> Self {
        Self { zoom, value }
    }
}

/// Interpolation strategy tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopsKind {
    Identity,
    Interval,
    Exponential,
    Categorical,
}

impl StopsKind {
    pub fn type_name(self) -> &'static str {
        match self {
            StopsKind::Identity => "identity",
            StopsKind::Interval => "interval",
            StopsKind::Exponential => "exponential",
            StopsKind::Categorical => "categorical",
        }
    }
}

impl fmt::Display for StopsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Output equals input; no stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityStops;

/// Step function over stops sorted ascending by input.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalStops<I, O> {
    stops: Vec<Stop<I, O>>,
    ordered: bool,
}

/// Exponential interpolation over stops sorted ascending by input.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialStops<I, O> {
    base: f64,
    stops: Vec<Stop<I, O>>,
    ordered: bool,
}

/// Discrete lookup keyed by input. Insertion order is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalStops<I, O> {
    stops: Vec<Stop<I, O>>,
}

/// Sort by input and report whether the result is a total ascending order.
/// Incomparable inputs (NaN, mixed kinds) leave the table unordered.
fn sort_stops<I: PartialOrd, O>(stops: &mut [Stop<I, O>]) -> bool {
    stops.sort_by(|a, b| {
        a.input
            .partial_cmp(&b.input)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    stops.iter().all(|s| s.input.partial_cmp(&s.input).is_some())
        && stops
            .windows(2)
            .all(|w| matches!(w, [a, b] if a.input <= b.input))
}

impl<I: PartialOrd, O> IntervalStops<I, O> {
    /// Stops are sorted by input.
    pub fn new(mut stops: Vec<Stop<I, O>>) -> Self {
        let ordered = sort_stops(&mut stops);
        Self { stops, ordered }
    }
}

impl<I, O> IntervalStops<I, O> {
    pub fn stops(&self) -> &[Stop<I, O>] {
        &self.stops
    }

    /// False when some inputs could not be compared, so the table has no
    /// ascending order.
    pub fn is_ordered(&self) -> bool {
        self.ordered
    }
}

impl<I: PartialOrd, O> ExponentialStops<I, O> {
    /// Stops are sorted by input. The base defaults to 1 (linear).
    pub fn new(mut stops: Vec<Stop<I, O>>) -> Self {
        let ordered = sort_stops(&mut stops);
        Self {
            base: 1.0,
            stops,
            ordered,
        }
    }
}

impl<I, O> ExponentialStops<I, O> {
    pub fn with_base(mut self, base: f64) -> Self {
        self.base = base;
        self
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn stops(&self) -> &[Stop<I, O>] {
        &self.stops
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }
}

impl<I, O> CategoricalStops<I, O> {
    pub fn new(stops: Vec<Stop<I, O>>) -> Self {
        Self { stops }
    }

    pub fn stops(&self) -> &[Stop<I, O>] {
        &self.stops
    }
}

/// A stop table: the closed set of interpolation strategies.
#[derive(Debug, Clone, PartialEq)]
pub enum Stops<I, O> {
    Identity(IdentityStops),
    Interval(IntervalStops<I, O>),
    Exponential(ExponentialStops<I, O>),
    Categorical(CategoricalStops<I, O>),
}

impl<I, O> Stops<I, O> {
    pub fn identity() -> Self {
        Stops::Identity(IdentityStops)
    }

    pub fn categorical(stops: Vec<Stop<I, O>>) -> Self {
        Stops::Categorical(CategoricalStops::new(stops))
    }

    pub fn kind(&self) -> StopsKind {
        match self {
            Stops::Identity(_) => StopsKind::Identity,
            Stops::Interval(_) => StopsKind::Interval,
            Stops::Exponential(_) => StopsKind::Exponential,
            Stops::Categorical(_) => StopsKind::Categorical,
        }
    }

    /// Whether the inputs are in ascending order. Identity and categorical
    /// tables have no ordering requirement.
    pub fn is_ordered(&self) -> bool {
        match self {
            Stops::Identity(_) | Stops::Categorical(_) => true,
            Stops::Interval(s) => s.is_ordered(),
            Stops::Exponential(s) => s.is_ordered(),
        }
    }

    /// Stop entries in table order. Identity tables have none.
    pub fn entries(&self) -> &[Stop<I, O>] {
        match self {
            Stops::Identity(_) => &[],
            Stops::Interval(s) => s.stops(),
            Stops::Exponential(s) => s.stops(),
            Stops::Categorical(s) => s.stops(),
        }
    }

    pub fn as_identity(&self) -> Option<&IdentityStops> {
        IdentityStops::narrow(self)
    }

    pub fn as_interval(&self) -> Option<&IntervalStops<I, O>> {
        IntervalStops::narrow(self)
    }

    pub fn as_exponential(&self) -> Option<&ExponentialStops<I, O>> {
        ExponentialStops::narrow(self)
    }

    pub fn as_categorical(&self) -> Option<&CategoricalStops<I, O>> {
        CategoricalStops::narrow(self)
    }

    /// Narrow to a concrete strategy, or `None` if the table is a different kind.
    pub fn narrow<S: StopsVariant<I, O>>(&self) -> Option<&S> {
        S::narrow(self)
    }
}

impl<I: PartialOrd, O> Stops<I, O> {
    pub fn interval(stops: Vec<Stop<I, O>>) -> Self {
        Stops::Interval(IntervalStops::new(stops))
    }

    pub fn exponential(stops: Vec<Stop<I, O>>) -> Self {
        Stops::Exponential(ExponentialStops::new(stops))
    }
}

impl<I: Serialize, O: Serialize> Stops<I, O> {
    /// Serialize the strategy tag and entries for the rendering engine.
    pub fn to_value_object(&self) -> Result<ValueObject, StyleError> {
        let mut map = ValueObject::new();
        map.insert("type".to_string(), Value::from(self.kind().type_name()));
        if let Stops::Exponential(s) = self {
            map.insert("base".to_string(), serde_json::to_value(s.base())?);
        }
        if !matches!(self, Stops::Identity(_)) {
            let entries = self
                .entries()
                .iter()
                .map(|stop| {
                    Ok(Value::Array(vec![
                        serde_json::to_value(&stop.input)?,
                        serde_json::to_value(&stop.output)?,
                    ]))
                })
                .collect::<Result<Vec<_>, serde_json::Error>>()?;
            map.insert("stops".to_string(), Value::Array(entries));
        }
        Ok(map)
    }
}

impl<I, O> fmt::Display for Stops<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stops ({})", self.kind(), self.entries().len())
    }
}

impl<I, O> From<IdentityStops> for Stops<I, O> {
    fn from(s: IdentityStops) -> Self {
        Stops::Identity(s)
    }
}

impl<I, O> From<IntervalStops<I, O>> for Stops<I, O> {
    fn from(s: IntervalStops<I, O>) -> Self {
        Stops::Interval(s)
    }
}

impl<I, O> From<ExponentialStops<I, O>> for Stops<I, O> {
    fn from(s: ExponentialStops<I, O>) -> Self {
        Stops::Exponential(s)
    }
}

impl<I, O> From<CategoricalStops<I, O>> for Stops<I, O> {
    fn from(s: CategoricalStops<I, O>) -> Self {
        Stops::Categorical(s)
    }
}

/// A concrete strategy that a [`Stops`] table can be narrowed to.
pub trait StopsVariant<I, O>: Sized {
    const KIND: StopsKind;

    fn narrow(stops: &Stops<I, O>) -> Option<&Self>;
}

impl<I, O> StopsVariant<I, O> for IdentityStops {
    const KIND: StopsKind = StopsKind::Identity;

    fn narrow(stops: &Stops<I, O>) -> Option<&Self> {
        match stops {
            Stops::Identity(s) => Some(s),
            _ => None,
        }
    }
}

impl<I, O> StopsVariant<I, O> for IntervalStops<I, O> {
    const KIND: StopsKind = StopsKind::Interval;

    fn narrow(stops: &Stops<I, O>) -> Option<&Self> {
        match stops {
            Stops::Interval(s) => Some(s),
            _ => None,
        }
    }
}

impl<I, O> StopsVariant<I, O> for ExponentialStops<I, O> {
    const KIND: StopsKind = StopsKind::Exponential;

    fn narrow(stops: &Stops<I, O>) -> Option<&Self> {
        match stops {
            Stops::Exponential(s) => Some(s),
            _ => None,
        }
    }
}

impl<I, O> StopsVariant<I, O> for CategoricalStops<I, O> {
    const KIND: StopsKind = StopsKind::Categorical;

    fn narrow(stops: &Stops<I, O>) -> Option<&Self> {
        match stops {
            Stops::Categorical(s) => Some(s),
            _ => None,
        }
    }
}
