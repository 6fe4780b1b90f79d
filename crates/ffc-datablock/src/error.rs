//! Error types for DataBlock construction
//!
//! Provides the error taxonomy for:
//! - Configuration (settings, key material, projection names)
//! - Decryption of the protected land-use resource
//! - Dataset alignment and provider access
//! - DataBlock write-once and snapshot rules

use ffc_array::{ArrayError, DataAlignmentError};
use std::path::PathBuf;

/// Misconfiguration detected before any data is touched
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// Required setting absent
    #[error("missing required setting: '{0}'")]
    MissingSetting(String),

    /// Key or IV is not valid base64
    #[error("invalid base64 in {field}: {source}")]
    InvalidBase64 {
        field: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    /// Decoded key is not 16, 24 or 32 bytes
    #[error("invalid AES key length: {0} bytes")]
    InvalidKeyLength(usize),

    /// Decoded IV is not one block
    #[error("invalid initialization vector length: {0} bytes")]
    InvalidIvLength(usize),

    /// Population projection series not offered by the provider
    #[error("unknown population projection: '{0}'")]
    UnknownProjection(String),

    /// Setting present but outside its accepted range
    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: &'static str, message: String },

    /// Settings text could not be parsed
    #[error("invalid {format} settings: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    /// Settings file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigurationError {
    /// Create parse error for a format
    pub fn parse(format: &'static str, message: impl ToString) -> Self {
        Self::Parse {
            format,
            message: message.to_string(),
        }
    }

    /// Create invalid-value error for a setting
    pub fn invalid(key: &'static str, message: impl ToString) -> Self {
        Self::InvalidValue {
            key,
            message: message.to_string(),
        }
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Decryption failure; fatal, never retried
#[derive(Debug, thiserror::Error)]
pub enum EncryptionError {
    /// Cipher rejected the key/IV pair
    #[error("cipher initialization failed")]
    Cipher,

    /// Padding invalid after decryption (wrong key or IV, truncated data)
    #[error("invalid padding after decryption")]
    Padding,

    /// Decrypted bytes are not a serialized labeled array
    #[error("decrypted payload is not a valid dataset: {0}")]
    CorruptPayload(String),
}

/// Errors building or mutating a DataBlock
#[derive(Debug, thiserror::Error)]
pub enum DataBlockError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("encryption error: {0}")]
    Encryption(#[from] EncryptionError),

    #[error("data alignment error: {0}")]
    Alignment(#[from] DataAlignmentError),

    /// Source array is missing a label or dimension the block requires
    #[error("dataset error: {0}")]
    Array(#[from] ArrayError),

    /// Data provider could not supply a dataset
    #[error("provider failed for '{dataset}': {message}")]
    Provider { dataset: String, message: String },

    /// Metric not derived yet
    #[error("metric not available: '{0}'")]
    MissingMetric(String),

    /// Baseline snapshot requested a second time
    #[error("baseline snapshot already taken")]
    SnapshotAlreadyTaken,

    /// Run parameters written a second time
    #[error("run parameters already recorded")]
    RunParamsAlreadyRecorded,

    /// Attempt to overwrite a baseline entry by key
    #[error("'{area}.baseline' is read-only")]
    BaselineReadOnly { area: &'static str },
}

impl DataBlockError {
    /// Create provider error for a dataset
    pub fn provider(dataset: impl Into<String>, message: impl ToString) -> Self {
        Self::Provider {
            dataset: dataset.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_display() {
        let err = ConfigurationError::MissingSetting("popProj".to_string());
        assert_eq!(err.to_string(), "missing required setting: 'popProj'");
    }

    #[test]
    fn error_conversions() {
        let err: DataBlockError = EncryptionError::Padding.into();
        assert!(matches!(err, DataBlockError::Encryption(EncryptionError::Padding)));

        let err: DataBlockError = DataAlignmentError::EmptyIntersection {
            dimension: "Item".to_string(),
        }
        .into();
        assert!(err.to_string().contains("Item"));
    }
}
