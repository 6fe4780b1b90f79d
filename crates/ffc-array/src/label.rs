//! Coordinate labels
//!
//! A [`Label`] is the value an axis position is addressed by: a region code,
//! a year, an item code, a grid cell, or a textual class such as a land type.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// A single coordinate label
///
/// Integer labels sort before text labels; within a kind the natural order
/// applies.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    /// Numeric code (region, year, item, grid index)
    Int(i64),
    /// Named class (land type, nutrient kind, datatype)
    Text(String),
}

impl Label {
    /// Integer value, if this is a numeric label
    #[inline]
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    /// Text value, if this is a named label
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Int(_) => None,
            Self::Text(s) => Some(s),
        }
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Label {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Label {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Build a label vector from anything convertible
pub fn labels<T: Into<Label>>(values: impl IntoIterator<Item = T>) -> Vec<Label> {
    values.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_sorts_before_text() {
        assert!(Label::Int(9999) < Label::from("Arable"));
    }

    #[test]
    fn untagged_serde() {
        let json = serde_json::to_string(&labels([2020, 2021])).unwrap();
        assert_eq!(json, "[2020,2021]");

        let back: Vec<Label> = serde_json::from_str(r#"[5, "Arable"]"#).unwrap();
        assert_eq!(back, vec![Label::Int(5), Label::from("Arable")]);
    }
}
