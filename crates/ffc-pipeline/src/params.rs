//! Bound node parameters and item selectors

use crate::error::ParamError;
use ffc_array::{Axis, Label};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Food-balance coordinate naming an item's group
pub const ITEM_GROUP: &str = "Item_group";
/// Food-balance coordinate naming an item's origin
pub const ITEM_ORIGIN: &str = "Item_origin";
pub const ANIMAL_PRODUCTS: &str = "Animal Products";
pub const VEGETAL_PRODUCTS: &str = "Vegetal Products";

/// Items a node acts on
///
/// Kept unresolved: the node resolves it against the item axis it touches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemSelector {
    /// Explicit item codes
    Explicit { items: Vec<i64> },
    /// Every item whose coordinate `dimension` is one of `values`
    Group {
        dimension: String,
        values: Vec<String>,
    },
}

impl ItemSelector {
    pub fn items(items: impl IntoIterator<Item = i64>) -> Self {
        Self::Explicit {
            items: items.into_iter().collect(),
        }
    }

    pub fn group<S: Into<String>>(
        dimension: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::Group {
            dimension: dimension.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Items of one origin, e.g. `Animal Products`
    pub fn origin(name: impl Into<String>) -> Self {
        Self::group(ITEM_ORIGIN, [name.into()])
    }

    /// True when the selector can match nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Explicit { items } => items.is_empty(),
            Self::Group { dimension, values } => dimension.is_empty() || values.is_empty(),
        }
    }

    /// Labels on `axis` matched by this selector
    ///
    /// Explicit codes not on the axis are skipped; order follows the selector
    /// for explicit codes and the axis for groups.
    #[must_use]
    pub fn resolve(&self, axis: &Axis) -> Vec<Label> {
        match self {
            Self::Explicit { items } => items
                .iter()
                .map(|&i| Label::Int(i))
                .filter(|l| axis.contains(l))
                .collect(),
            Self::Group { dimension, values } => axis.labels_where(dimension, values),
        }
    }
}

/// A single bound parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    Number(f64),
    Numbers(Vec<f64>),
    Integer(i64),
    Flag(bool),
    Text(String),
    Texts(Vec<String>),
    Selector(ItemSelector),
    Selectors(Vec<ItemSelector>),
}

impl ParamValue {
    /// Type name used in error messages
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Number(_) => "number",
            ParamValue::Numbers(_) => "numbers",
            ParamValue::Integer(_) => "integer",
            ParamValue::Flag(_) => "flag",
            ParamValue::Text(_) => "text",
            ParamValue::Texts(_) => "texts",
            ParamValue::Selector(_) => "selector",
            ParamValue::Selectors(_) => "selectors",
        }
    }

    /// Element count of list values
    #[must_use]
    pub fn list_len(&self) -> Option<usize> {
        match self {
            ParamValue::Numbers(v) => Some(v.len()),
            ParamValue::Texts(v) => Some(v.len()),
            ParamValue::Selectors(v) => Some(v.len()),
            _ => None,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<Vec<f64>> for ParamValue {
    fn from(v: Vec<f64>) -> Self {
        ParamValue::Numbers(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Integer(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Flag(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(v: Vec<&str>) -> Self {
        ParamValue::Texts(v.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(v: Vec<String>) -> Self {
        ParamValue::Texts(v)
    }
}

impl From<ItemSelector> for ParamValue {
    fn from(v: ItemSelector) -> Self {
        ParamValue::Selector(v)
    }
}

impl From<Vec<ItemSelector>> for ParamValue {
    fn from(v: Vec<ItemSelector>) -> Self {
        ParamValue::Selectors(v)
    }
}

/// Parameters bound to one node, in binding order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeParams(IndexMap<String, ParamValue>);

macro_rules! typed_getter {
    (@emit $(#[$meta:meta])* $name:ident, $variant:ident, $ty:ty, $expected:literal, $v:ident => $out:expr) => {
        $(#[$meta])*
        ///
        /// # Errors
        /// Returns [`ParamError`] if the key is absent or holds another type.
        pub fn $name(&self, key: &str) -> Result<$ty, ParamError> {
            match self.require(key)? {
                ParamValue::$variant($v) => Ok($out),
                other => Err(ParamError::WrongType {
                    key: key.to_string(),
                    expected: $expected,
                    found: other.type_name(),
                }),
            }
        }
    };
    ($(#[$meta:meta])* $name:ident, $variant:ident, copy $ty:ty, $expected:literal) => {
        typed_getter!(@emit $(#[$meta])* $name, $variant, $ty, $expected, v => *v);
    };
    ($(#[$meta:meta])* $name:ident, $variant:ident, $ty:ty, $expected:literal) => {
        typed_getter!(@emit $(#[$meta])* $name, $variant, $ty, $expected, v => v);
    };
}

impl NodeParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value, replacing any previous binding of `key`
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    fn require(&self, key: &str) -> Result<&ParamValue, ParamError> {
        self.0.get(key).ok_or_else(|| ParamError::Missing {
            key: key.to_string(),
        })
    }

    /// Bound values in binding order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    typed_getter!(
        /// Bound number
        number, Number, copy f64, "number"
    );
    typed_getter!(
        /// Bound integer
        integer, Integer, copy i64, "integer"
    );
    typed_getter!(
        /// Bound flag
        flag, Flag, copy bool, "flag"
    );
    typed_getter!(
        /// Bound number list
        numbers, Numbers, &[f64], "numbers"
    );
    typed_getter!(
        /// Bound text
        text, Text, &str, "text"
    );
    typed_getter!(
        /// Bound text list
        texts, Texts, &[String], "texts"
    );
    typed_getter!(
        /// Bound item selector
        selector, Selector, &ItemSelector, "selector"
    );
    typed_getter!(
        /// Bound item selector list
        selectors, Selectors, &[ItemSelector], "selectors"
    );

    /// Parameters as compact JSON for diagnostics
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffc_array::labels;

    fn item_axis() -> Axis {
        Axis::new("Item", labels([2511, 2731, 2761]))
            .unwrap()
            .with_coord(
                ITEM_ORIGIN,
                vec![
                    VEGETAL_PRODUCTS.to_string(),
                    ANIMAL_PRODUCTS.to_string(),
                    ANIMAL_PRODUCTS.to_string(),
                ],
            )
            .unwrap()
            .with_coord(
                ITEM_GROUP,
                vec![
                    "Cereals - Excluding Beer".to_string(),
                    "Meat".to_string(),
                    "Fish, Seafood".to_string(),
                ],
            )
            .unwrap()
    }

    #[test]
    fn explicit_selector_skips_absent_items() {
        let sel = ItemSelector::items([2761, 9999, 2511]);
        assert_eq!(sel.resolve(&item_axis()), labels([2761, 2511]));
    }

    #[test]
    fn origin_selector_is_a_group() {
        let sel = ItemSelector::origin(ANIMAL_PRODUCTS);
        assert_eq!(
            sel,
            ItemSelector::Group {
                dimension: ITEM_ORIGIN.to_string(),
                values: vec![ANIMAL_PRODUCTS.to_string()],
            }
        );
        assert_eq!(sel.resolve(&item_axis()), labels([2731, 2761]));
    }

    #[test]
    fn group_selector_matches_any_value() {
        let sel = ItemSelector::group(ITEM_GROUP, ["Meat", "Cereals - Excluding Beer"]);
        assert_eq!(sel.resolve(&item_axis()), labels([2511, 2731]));
    }

    #[test]
    fn empty_selectors() {
        assert!(ItemSelector::items(Vec::new()).is_empty());
        assert!(ItemSelector::group(ITEM_GROUP, Vec::<String>::new()).is_empty());
        assert!(!ItemSelector::items([1]).is_empty());
    }

    #[test]
    fn typed_getters() {
        let params = NodeParams::new()
            .with("scale", 1.5)
            .with("items", ItemSelector::items([1, 2]))
            .with("source", vec!["production", "imports"])
            .with("copy_from", 2731_i64)
            .with("constant", true);

        assert_eq!(params.number("scale").unwrap(), 1.5);
        assert_eq!(params.integer("copy_from").unwrap(), 2731);
        assert!(params.flag("constant").unwrap());
        assert_eq!(params.texts("source").unwrap().len(), 2);
        assert!(params.selector("items").is_ok());

        assert!(matches!(
            params.number("items"),
            Err(ParamError::WrongType { expected: "number", found: "selector", .. })
        ));
        assert!(matches!(params.text("missing"), Err(ParamError::Missing { .. })));
    }

    #[test]
    fn scalar_getters_reject_other_types() {
        let params = NodeParams::new()
            .with("scale", 1.5)
            .with("copy_from", 2731_i64)
            .with("constant", true);

        assert!(matches!(
            params.flag("scale"),
            Err(ParamError::WrongType { expected: "flag", found: "number", .. })
        ));
        assert!(matches!(
            params.integer("constant"),
            Err(ParamError::WrongType { expected: "integer", found: "flag", .. })
        ));
        assert!(matches!(
            params.number("copy_from"),
            Err(ParamError::WrongType { expected: "number", found: "integer", .. })
        ));
        assert!(matches!(params.flag("missing"), Err(ParamError::Missing { .. })));
    }

    #[test]
    fn binding_order_is_preserved() {
        let params = NodeParams::new().with("b", 1.0).with("a", 2.0);
        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn params_serialize_with_type_tags() {
        let params = NodeParams::new().with("items", ItemSelector::origin(VEGETAL_PRODUCTS));
        let json = params.to_json();
        assert!(json.contains("\"type\":\"selector\""));
        assert!(json.contains("\"kind\":\"group\""));
        let back: NodeParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}
