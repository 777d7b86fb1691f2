pub mod stops;

// Re-export commonly used types at the model level.
pub use stops::{
    CategoricalStops, CompositeValue, ExponentialStops, IdentityStops, IntervalStops, Stop, Stops,
    StopsKind, StopsVariant, ValueObject,
};
