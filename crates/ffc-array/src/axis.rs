//! Named axes
//!
//! An [`Axis`] is a dimension name, an ordered set of unique labels, and
//! optional auxiliary string coordinates attached to each label (for example
//! `Item_group` and `Item_origin` on the `Item` axis).

use crate::error::ArrayError;
use crate::label::Label;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A named dimension with unique labels
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "AxisRepr", into = "AxisRepr")]
pub struct Axis {
    name: String,
    labels: Vec<Label>,
    coords: BTreeMap<String, Vec<String>>,
    index: HashMap<Label, usize>,
}

#[derive(Serialize, Deserialize)]
struct AxisRepr {
    name: String,
    labels: Vec<Label>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    coords: BTreeMap<String, Vec<String>>,
}

impl Axis {
    /// Create an axis
    ///
    /// # Errors
    /// Returns [`ArrayError::DuplicateLabel`] if a label repeats.
    pub fn new(name: impl Into<String>, labels: Vec<Label>) -> Result<Self, ArrayError> {
        let name = name.into();
        let mut index = HashMap::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            if index.insert(label.clone(), i).is_some() {
                return Err(ArrayError::DuplicateLabel {
                    dimension: name,
                    label: label.clone(),
                });
            }
        }
        Ok(Self {
            name,
            labels,
            coords: BTreeMap::new(),
            index,
        })
    }

    /// Attach an auxiliary coordinate, one value per label
    ///
    /// # Errors
    /// Returns [`ArrayError::CoordinateLength`] on a length mismatch.
    pub fn with_coord(
        mut self,
        coord: impl Into<String>,
        values: Vec<String>,
    ) -> Result<Self, ArrayError> {
        let coord = coord.into();
        if values.len() != self.labels.len() {
            return Err(ArrayError::CoordinateLength {
                dimension: self.name,
                coord,
                expected: self.labels.len(),
                actual: values.len(),
            });
        }
        self.coords.insert(coord, values);
        Ok(self)
    }

    /// Dimension name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Labels in axis order
    #[inline]
    #[must_use]
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Number of labels
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when the axis has no labels
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Position of a label
    #[inline]
    #[must_use]
    pub fn position(&self, label: &Label) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// True when the label is on this axis
    #[inline]
    #[must_use]
    pub fn contains(&self, label: &Label) -> bool {
        self.index.contains_key(label)
    }

    /// Names of the auxiliary coordinates
    pub fn coord_names(&self) -> impl Iterator<Item = &str> {
        self.coords.keys().map(String::as_str)
    }

    /// Values of an auxiliary coordinate
    #[must_use]
    pub fn coord(&self, coord: &str) -> Option<&[String]> {
        self.coords.get(coord).map(Vec::as_slice)
    }

    /// Auxiliary coordinate value of one label
    #[must_use]
    pub fn coord_of(&self, coord: &str, label: &Label) -> Option<&str> {
        let pos = self.position(label)?;
        self.coords.get(coord).map(|values| values[pos].as_str())
    }

    /// Labels whose auxiliary coordinate is one of `values`
    #[must_use]
    pub fn labels_where(&self, coord: &str, values: &[String]) -> Vec<Label> {
        let Some(column) = self.coords.get(coord) else {
            return Vec::new();
        };
        self.labels
            .iter()
            .zip(column)
            .filter(|(_, v)| values.contains(v))
            .map(|(l, _)| l.clone())
            .collect()
    }

    /// Sub-axis at the given positions, carrying coordinates along
    pub(crate) fn take(&self, positions: &[usize]) -> Self {
        let labels: Vec<Label> = positions.iter().map(|&p| self.labels[p].clone()).collect();
        let coords = self
            .coords
            .iter()
            .map(|(k, v)| (k.clone(), positions.iter().map(|&p| v[p].clone()).collect()))
            .collect();
        let index = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();
        Self {
            name: self.name.clone(),
            labels,
            coords,
            index,
        }
    }

    /// Union with another axis of the same name
    ///
    /// Left labels keep their order; labels only present on the right are
    /// appended in right order. Coordinates merge, left value wins.
    pub(crate) fn union(&self, other: &Self) -> Self {
        let mut labels = self.labels.clone();
        labels.extend(other.labels.iter().filter(|l| !self.contains(l)).cloned());

        let coord_names: std::collections::BTreeSet<&String> =
            self.coords.keys().chain(other.coords.keys()).collect();
        let coords = coord_names
            .into_iter()
            .map(|name| {
                let column = labels
                    .iter()
                    .map(|l| {
                        self.coord_of(name, l)
                            .or_else(|| other.coord_of(name, l))
                            .unwrap_or_default()
                            .to_string()
                    })
                    .collect();
                (name.clone(), column)
            })
            .collect();

        let index = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();
        Self {
            name: self.name.clone(),
            labels,
            coords,
            index,
        }
    }

    /// Labels present on both axes, in left order
    pub(crate) fn intersection(&self, other: &Self) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, l)| other.contains(l))
            .map(|(i, _)| i)
            .collect()
    }
}

impl PartialEq for Axis {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.labels == other.labels && self.coords == other.coords
    }
}

impl TryFrom<AxisRepr> for Axis {
    type Error = ArrayError;

    fn try_from(repr: AxisRepr) -> Result<Self, Self::Error> {
        let mut axis = Axis::new(repr.name, repr.labels)?;
        for (coord, values) in repr.coords {
            axis = axis.with_coord(coord, values)?;
        }
        Ok(axis)
    }
}

impl From<Axis> for AxisRepr {
    fn from(axis: Axis) -> Self {
        Self {
            name: axis.name,
            labels: axis.labels,
            coords: axis.coords,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::labels;

    fn item_axis() -> Axis {
        Axis::new("Item", labels([2731, 2732, 2511]))
            .unwrap()
            .with_coord(
                "Item_origin",
                vec![
                    "Animal Products".to_string(),
                    "Animal Products".to_string(),
                    "Vegetal Products".to_string(),
                ],
            )
            .unwrap()
    }

    #[test]
    fn rejects_duplicate_labels() {
        let err = Axis::new("Year", labels([2020, 2020])).unwrap_err();
        assert!(matches!(err, ArrayError::DuplicateLabel { .. }));
    }

    #[test]
    fn rejects_short_coordinate() {
        let err = Axis::new("Item", labels([1, 2]))
            .unwrap()
            .with_coord("Item_group", vec!["Cereals".to_string()])
            .unwrap_err();
        assert!(matches!(err, ArrayError::CoordinateLength { .. }));
    }

    #[test]
    fn labels_where_filters_by_coordinate() {
        let axis = item_axis();
        let animal = axis.labels_where("Item_origin", &["Animal Products".to_string()]);
        assert_eq!(animal, labels([2731, 2732]));
        assert!(axis.labels_where("Item_group", &["Pulses".to_string()]).is_empty());
    }

    #[test]
    fn union_appends_right_only_labels() {
        let left = Axis::new("Item", labels([3, 1])).unwrap();
        let right = Axis::new("Item", labels([1, 2])).unwrap();
        let joined = left.union(&right);
        assert_eq!(joined.labels(), labels([3, 1, 2]).as_slice());
        assert_eq!(joined.position(&Label::Int(2)), Some(2));
    }

    #[test]
    fn union_merges_coordinates() {
        let left = item_axis();
        let right = Axis::new("Item", labels([2949]))
            .unwrap()
            .with_coord("Item_origin", vec!["Animal Products".to_string()])
            .unwrap();
        let joined = left.union(&right);
        assert_eq!(
            joined.coord_of("Item_origin", &Label::Int(2949)),
            Some("Animal Products")
        );
    }

    #[test]
    fn serde_rebuilds_index() {
        let json = serde_json::to_string(&item_axis()).unwrap();
        let back: Axis = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item_axis());
        assert_eq!(back.position(&Label::Int(2511)), Some(2));
    }
}
