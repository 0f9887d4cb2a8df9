use serde::Serialize;
use thiserror::Error;

/// Why a token could not be resolved. Contained to the token it belongs to;
/// resolution of every other token continues.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ResolutionError {
    #[error("Cyclic alias reference: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("Reference to undefined token '{name}'")]
    MissingReference { name: String },

    #[error("Alias '{name}' resolved to non-numeric value {value} inside an arithmetic expression")]
    NonNumericOperand { name: String, value: String },

    #[error("Incompatible units for '{op}': {left} and {right}")]
    IncompatibleUnits { op: String, left: String, right: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Arithmetic produced a non-finite result")]
    NonFiniteResult,

    #[error("Alias '{name}' resolved to a composite value and cannot be interpolated into text")]
    NonScalarInterpolation { name: String },

    #[error("Maximum alias depth ({max_depth}) exceeded")]
    DepthExceeded { max_depth: usize },
}

impl ResolutionError {
    pub fn is_cycle(&self) -> bool {
        matches!(self, ResolutionError::Cycle { .. })
    }
}
