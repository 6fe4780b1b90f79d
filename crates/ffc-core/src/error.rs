//! Error types for the calculator
//!
//! Every failure is deterministic for a given provider, key material and
//! parameter set, so nothing here is retryable.

use ffc_datablock::{ConfigurationError, DataBlock, DataBlockError};
use ffc_pipeline::{BuildError, ExecutionFailure, NodeExecutionError};

/// Main calculator error type
#[derive(Debug, thiserror::Error)]
pub enum CalculatorError {
    /// Calculator or settings misconfigured
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Baseline could not be loaded or the DataBlock rejected an operation
    #[error("datablock error: {0}")]
    DataBlock(#[from] DataBlockError),

    /// Scenario parameters could not be compiled
    #[error("build failed: {0}")]
    Build(#[from] BuildError),

    /// A node failed; the partial DataBlock is kept
    #[error(transparent)]
    Execution(#[from] ExecutionFailure),
}

impl CalculatorError {
    /// Always false: the same inputs fail the same way
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Check if the protected land-use resource could not be decrypted
    #[must_use]
    pub fn is_fatal_encryption(&self) -> bool {
        matches!(
            self,
            Self::DataBlock(DataBlockError::Encryption(_))
                | Self::Build(BuildError::DataBlock(DataBlockError::Encryption(_)))
        )
    }

    /// The failing node's error, if a node failed
    #[must_use]
    pub fn node_error(&self) -> Option<&NodeExecutionError> {
        match self {
            Self::Execution(failure) => failure.node_error(),
            _ => None,
        }
    }

    /// DataBlock as left by the failing node
    #[must_use]
    pub fn into_partial(self) -> Option<DataBlock> {
        match self {
            Self::Execution(failure) => Some(*failure.partial),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffc_datablock::EncryptionError;

    #[test]
    fn nothing_is_retryable() {
        let errors = [
            CalculatorError::from(ConfigurationError::UnknownProjection("Zero".into())),
            CalculatorError::from(DataBlockError::SnapshotAlreadyTaken),
            CalculatorError::from(DataBlockError::from(EncryptionError::Padding)),
        ];
        assert!(errors.iter().all(|e| !e.is_retryable()));
    }

    #[test]
    fn encryption_failures_are_fatal() {
        let err = CalculatorError::from(DataBlockError::from(EncryptionError::Padding));
        assert!(err.is_fatal_encryption());

        let err = CalculatorError::from(DataBlockError::from(
            ConfigurationError::InvalidKeyLength(7),
        ));
        assert!(!err.is_fatal_encryption());
    }

    #[test]
    fn display_names_the_layer() {
        let err = CalculatorError::from(ConfigurationError::MissingSetting("popProj".into()));
        assert!(err.to_string().starts_with("configuration error"));
        assert!(err.node_error().is_none());
        assert!(err.into_partial().is_none());
    }
}
