//! Error types for pipeline construction and execution
//!
//! Construction failures ([`BuildError`]) are raised before any node runs.
//! Execution failures wrap the failing node's identity and bound parameters.

use crate::node::{NodeCategory, NodeKind};
use crate::params::NodeParams;
use ffc_array::{ArrayError, DataAlignmentError};
use ffc_datablock::{DataBlock, DataBlockError};
use std::fmt;

/// Malformed output of the scenario compiler
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A bound number is `NaN` or infinite
    #[error("node {index} ({kind}): parameter '{key}' is not finite")]
    NonFinite {
        index: usize,
        kind: NodeKind,
        key: String,
    },

    /// Two parameters that are read pairwise differ in length
    #[error("node {index} ({kind}): '{left}' has {left_len} entries but '{right}' has {right_len}")]
    LengthMismatch {
        index: usize,
        kind: NodeKind,
        left: &'static str,
        right: &'static str,
        left_len: usize,
        right_len: usize,
    },

    /// An item selector that cannot match anything
    #[error("node {index} ({kind}): item selector '{key}' is empty")]
    EmptySelector {
        index: usize,
        kind: NodeKind,
        key: String,
    },

    /// Node placed after a later category
    #[error("node {index} ({kind}): category '{category}' follows '{previous}'")]
    CategoryOrder {
        index: usize,
        kind: NodeKind,
        category: NodeCategory,
        previous: NodeCategory,
    },

    /// Run record could not be written to the DataBlock
    #[error("datablock error: {0}")]
    DataBlock(#[from] DataBlockError),
}

/// Parameter lookup failure inside a transform
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    #[error("missing parameter '{key}'")]
    Missing { key: String },

    #[error("parameter '{key}' is a {found}, expected {expected}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Scenario identifier could not be encoded or decoded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScenarioIdError {
    #[error("scenario id must start with '{0}'")]
    MissingPrefix(&'static str),

    #[error("scenario id payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("scenario id payload has {0} bytes, not a whole number of values")]
    Length(usize),

    #[error("unknown scenario parameter '{0}'")]
    UnknownKey(String),

    #[error("scenario id holds {found} values, expected {expected}")]
    KeyCount { expected: usize, found: usize },
}

/// Failure raised by a transform
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error(transparent)]
    Param(#[from] ParamError),

    #[error(transparent)]
    DataBlock(#[from] DataBlockError),

    #[error(transparent)]
    Alignment(#[from] DataAlignmentError),

    #[error(transparent)]
    Array(#[from] ArrayError),

    #[error(transparent)]
    ScenarioId(#[from] ScenarioIdError),

    /// No transform registered for the node kind
    #[error("no transform registered for '{0}'")]
    Unregistered(NodeKind),

    /// Transform needs the run parameters, which were never recorded
    #[error("run parameters not recorded")]
    MissingRunParams,

    /// Failure reported by an external transform
    #[error("{0}")]
    Failed(String),
}

impl TransformError {
    /// Create a failure with a message
    pub fn failed(message: impl ToString) -> Self {
        Self::Failed(message.to_string())
    }
}

/// A node failed while being applied
#[derive(Debug, thiserror::Error)]
#[error("node {index} ({kind}) failed: {source}; params: {}", .params.to_json())]
pub struct NodeExecutionError {
    pub index: usize,
    pub kind: NodeKind,
    pub params: NodeParams,
    #[source]
    pub source: TransformError,
}

/// Reason a pipeline run stopped
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Baselines must be frozen before the first node
    #[error("baseline snapshot not taken before execution")]
    NoBaselineSnapshot,

    #[error(transparent)]
    Node(#[from] Box<NodeExecutionError>),

    /// A node replaced or dropped a baseline snapshot
    #[error("node {index} ({kind}) invalidated the baseline snapshot")]
    BaselineInvalidated { index: usize, kind: NodeKind },
}

/// A failed run together with the DataBlock as the failing node left it
pub struct ExecutionFailure {
    pub error: RunError,
    /// State after the last node that ran; not rolled back
    pub partial: Box<DataBlock>,
}

impl ExecutionFailure {
    pub(crate) fn new(error: RunError, partial: DataBlock) -> Self {
        Self {
            error,
            partial: Box::new(partial),
        }
    }

    /// The failing node's error, if a node failed
    #[must_use]
    pub fn node_error(&self) -> Option<&NodeExecutionError> {
        match &self.error {
            RunError::Node(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Debug for ExecutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionFailure")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pipeline execution failed: {}", self.error)
    }
}

impl std::error::Error for ExecutionFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
