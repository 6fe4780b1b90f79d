//! Shareable scenario identifiers
//!
//! An identifier is `v1.` followed by URL-safe unpadded base64 of the chosen
//! parameter values as little-endian `f64`, in key order. Decoding returns
//! the exact encoded values.

use crate::error::ScenarioIdError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ffc_datablock::ScenarioParams;

/// Parameters encoded into the identifier by default
pub const SCENARIO_ID_KEYS: [&str; 3] = ["ruminant", "pig_poultry", "fish_seafood"];

/// Format version prefix
pub const PREFIX: &str = "v1.";

const VALUE_BYTES: usize = std::mem::size_of::<f64>();

/// Encode raw values
#[must_use]
pub fn encode(values: &[f64]) -> String {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    format!("{PREFIX}{}", URL_SAFE_NO_PAD.encode(bytes))
}

/// Decode raw values
///
/// # Errors
/// Returns error on a wrong prefix, invalid base64 or a truncated payload.
pub fn decode(id: &str) -> Result<Vec<f64>, ScenarioIdError> {
    let payload = id
        .strip_prefix(PREFIX)
        .ok_or(ScenarioIdError::MissingPrefix(PREFIX))?;
    let bytes = URL_SAFE_NO_PAD.decode(payload)?;
    if bytes.len() % VALUE_BYTES != 0 {
        return Err(ScenarioIdError::Length(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(VALUE_BYTES)
        .map(|chunk| {
            let mut raw = [0u8; VALUE_BYTES];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect())
}

/// Encode the named parameters of a scenario
///
/// # Errors
/// Returns [`ScenarioIdError::UnknownKey`] for a key that is not a slider.
pub fn encode_params<S: AsRef<str>>(
    params: &ScenarioParams,
    keys: &[S],
) -> Result<String, ScenarioIdError> {
    let values = keys
        .iter()
        .map(|k| {
            params
                .get(k.as_ref())
                .ok_or_else(|| ScenarioIdError::UnknownKey(k.as_ref().to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(encode(&values))
}

/// Rebuild scenario parameters from an identifier
///
/// Keys not in `keys` keep their defaults.
///
/// # Errors
/// Returns error if the identifier is malformed, holds a different number of
/// values than `keys`, or a key is unknown.
pub fn decode_params<S: AsRef<str>>(
    id: &str,
    keys: &[S],
) -> Result<ScenarioParams, ScenarioIdError> {
    let values = decode(id)?;
    if values.len() != keys.len() {
        return Err(ScenarioIdError::KeyCount {
            expected: keys.len(),
            found: values.len(),
        });
    }
    let mut params = ScenarioParams::default();
    for (key, value) in keys.iter().zip(values) {
        if !params.set(key.as_ref(), value) {
            return Err(ScenarioIdError::UnknownKey(key.as_ref().to_string()));
        }
    }
    Ok(params)
}
