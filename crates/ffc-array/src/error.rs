//! Error types for labeled arrays
//!
//! - [`ArrayError`]: construction and label-selection failures
//! - [`DataAlignmentError`]: two arrays cannot share a coordinate space

use crate::label::Label;

/// Errors building or indexing a labeled array
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArrayError {
    /// Data length does not match the product of axis lengths
    #[error("shape mismatch: axes describe {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Same dimension name used twice
    #[error("duplicate dimension: '{0}'")]
    DuplicateDimension(String),

    /// Same label used twice on one axis
    #[error("duplicate label {label} on dimension '{dimension}'")]
    DuplicateLabel { dimension: String, label: Label },

    /// Auxiliary coordinate length differs from axis length
    #[error("coordinate '{coord}' has {actual} values, axis '{dimension}' has {expected}")]
    CoordinateLength {
        dimension: String,
        coord: String,
        expected: usize,
        actual: usize,
    },

    /// Dimension not present on the array
    #[error("unknown dimension: '{0}'")]
    UnknownDimension(String),

    /// Label not present on the axis
    #[error("label {label} not found on dimension '{dimension}'")]
    LabelNotFound { dimension: String, label: Label },

    /// Index tuple has the wrong arity
    #[error("index has {actual} labels, array has {expected} dimensions")]
    IndexArity { expected: usize, actual: usize },
}

/// Failure to place two arrays in one coordinate space
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataAlignmentError {
    /// A required shared dimension is absent on one side
    #[error("dimension '{dimension}' missing on {side} operand")]
    MissingDimension { dimension: String, side: Side },

    /// The shared dimension exists on both sides but no label matches
    #[error("no common labels on dimension '{dimension}'")]
    EmptyIntersection { dimension: String },

    /// The two arrays share no dimension at all
    #[error("arrays share no dimension (left: {left:?}, right: {right:?})")]
    NoSharedDimension {
        left: Vec<String>,
        right: Vec<String>,
    },

    /// A value required to complete a dataset is absent in every source
    #[error("no data for {what}")]
    MissingValue { what: String },

    /// Underlying array operation failed during alignment
    #[error("array error during alignment: {0}")]
    Array(#[from] ArrayError),
}

/// Operand position in a binary operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_error_display() {
        let err = DataAlignmentError::EmptyIntersection {
            dimension: "Item".to_string(),
        };
        assert_eq!(err.to_string(), "no common labels on dimension 'Item'");
    }

    #[test]
    fn array_error_converts() {
        let err: DataAlignmentError = ArrayError::UnknownDimension("Year".to_string()).into();
        assert!(matches!(err, DataAlignmentError::Array(_)));
    }
}
