//! Secure dataset loading
//!
//! The baseline land-use raster ships encrypted with AES-CBC and PKCS#7
//! padding. [`SecureDatasetLoader`] holds the decoded key material, decrypts
//! the resource and aligns it with the land classification grid.
//!
//! Any failure after key decoding is an [`EncryptionError`]: the loader never
//! hands out partially decrypted data.

use crate::error::{ConfigurationError, DataBlockError, EncryptionError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockCipher, BlockDecryptMut, KeyInit, KeyIvInit};
use ffc_array::{align_shared, LabeledArray};
use std::fmt;

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// Decrypts the protected land-use dataset
#[derive(Clone)]
pub struct SecureDatasetLoader {
    key: Vec<u8>,
    iv: [u8; BLOCK_SIZE],
}

impl SecureDatasetLoader {
    /// Create a loader from base64-encoded key and IV
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] if either value is not valid base64 or
    /// decodes to the wrong length.
    pub fn from_base64(key: &str, iv: &str) -> Result<Self, ConfigurationError> {
        let key = STANDARD
            .decode(key.trim())
            .map_err(|source| ConfigurationError::InvalidBase64 { field: "key", source })?;
        let iv = STANDARD
            .decode(iv.trim())
            .map_err(|source| ConfigurationError::InvalidBase64 { field: "iv", source })?;
        Self::from_bytes(key, &iv)
    }

    /// Create a loader from raw key and IV bytes
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] if the key is not 16, 24 or 32 bytes or
    /// the IV is not 16 bytes.
    pub fn from_bytes(key: Vec<u8>, iv: &[u8]) -> Result<Self, ConfigurationError> {
        if !matches!(key.len(), 16 | 24 | 32) {
            return Err(ConfigurationError::InvalidKeyLength(key.len()));
        }
        let iv: [u8; BLOCK_SIZE] = iv
            .try_into()
            .map_err(|_| ConfigurationError::InvalidIvLength(iv.len()))?;
        Ok(Self { key, iv })
    }

    /// Key size in bits
    #[inline]
    #[must_use]
    pub fn key_bits(&self) -> usize {
        self.key.len() * 8
    }

    /// Decrypt and unpad a ciphertext
    ///
    /// # Errors
    /// Returns [`EncryptionError::Padding`] on invalid padding or a
    /// ciphertext that is not a whole number of blocks.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        match self.key.len() {
            16 => decrypt_with::<aes::Aes128>(&self.key, &self.iv, ciphertext),
            24 => decrypt_with::<aes::Aes192>(&self.key, &self.iv, ciphertext),
            _ => decrypt_with::<aes::Aes256>(&self.key, &self.iv, ciphertext),
        }
    }

    /// Decrypt a ciphertext holding a serialized labeled array
    ///
    /// # Errors
    /// Returns [`EncryptionError`] if decryption fails or the plaintext is not
    /// a valid array.
    pub fn decrypt_array(&self, ciphertext: &[u8]) -> Result<LabeledArray, EncryptionError> {
        let plaintext = self.decrypt(ciphertext)?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| EncryptionError::CorruptPayload(e.to_string()))
    }

    /// Decrypt the land-use resource and align it with the classification grid
    ///
    /// Returns `(percentage_land_use, dominant_classification)` sharing one
    /// coordinate space; cells present in only one input hold `NaN` in the
    /// other.
    ///
    /// # Errors
    /// Returns [`DataBlockError::Encryption`] on decryption failure and
    /// [`DataBlockError::Alignment`] if the grids share no dimension.
    pub fn load_land_use(
        &self,
        ciphertext: &[u8],
        classification: &LabeledArray,
    ) -> Result<(LabeledArray, LabeledArray), DataBlockError> {
        let land_use = self.decrypt_array(ciphertext)?;
        let (classification, land_use) = align_shared(classification, &land_use)?;
        tracing::debug!(
            cells = classification.len(),
            land_use_digest = %land_use.digest().short(),
            "land use decrypted and aligned"
        );
        Ok((land_use, classification))
    }
}

fn decrypt_with<C>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, EncryptionError>
where
    C: BlockCipher + BlockDecryptMut + KeyInit,
{
    cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| EncryptionError::Cipher)?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| EncryptionError::Padding)
}

impl fmt::Debug for SecureDatasetLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureDatasetLoader")
            .field("key_bits", &self.key_bits())
            .field("key", &"<redacted>")
            .finish_non_exhaustive()
    }
}
