//! Content digests for labeled arrays
//!
//! Provides [`ArrayDigest`], a 32-byte Blake3 fingerprint over dimension
//! names, labels, auxiliary coordinates and value bit patterns. Two arrays
//! with the same digest are bit-identical for all practical purposes.

use crate::array::LabeledArray;
use std::fmt::{self, Display, Formatter};

/// A 32-byte array fingerprint (Blake3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArrayDigest([u8; 32]);

impl ArrayDigest {
    /// Compute the digest of an array
    #[must_use]
    pub fn of(array: &LabeledArray) -> Self {
        let mut hasher = blake3::Hasher::new();
        for axis in array.axes() {
            hasher.update(axis.name().as_bytes());
            hasher.update(&[0]);
            for label in axis.labels() {
                hasher.update(label.to_string().as_bytes());
                hasher.update(&[0]);
            }
            for coord in axis.coord_names() {
                hasher.update(coord.as_bytes());
                hasher.update(&[1]);
                for value in axis.coord(coord).unwrap_or_default() {
                    hasher.update(value.as_bytes());
                    hasher.update(&[0]);
                }
            }
            hasher.update(&[2]);
        }
        for v in array.values() {
            hasher.update(&v.to_bits().to_le_bytes());
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// Raw bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for ArrayDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
