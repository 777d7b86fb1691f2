//! Style functions for map rendering.
//!
//! A style property's value can be derived from the camera zoom, from a feature
//! property, or from both. [`function::Function`] wraps the stop table that
//! describes that mapping, or a raw expression array that
//! [`expression::compiler::ExpressionCompiler`] turns into an
//! [`expression::ast::ExpressionNode`] tree.

pub mod description;
pub mod error;
pub mod expression;
pub mod function;
pub mod model;
pub mod settings;

pub use error::StyleError;
pub use expression::ast::{ExpressionNode, Literal};
pub use expression::compiler::ExpressionCompiler;
pub use function::{CameraFunction, CompositeFunction, Function, FunctionShape, SourceFunction};
pub use model::stops::{
    CategoricalStops, CompositeValue, ExponentialStops, IdentityStops, IntervalStops, Stop, Stops,
    StopsKind, StopsVariant, ValueObject,
};
pub use settings::{CompilerSettings, NumberPrecision};
