//! The labeled array type
//!
//! [`LabeledArray`] stores dense row-major `f64` values over an ordered list of
//! named [`Axis`] values. `NaN` marks "no data". All binary arithmetic aligns
//! both operands with an outer join first and then broadcasts by dimension
//! name, so a missing label on either side yields `NaN` rather than a dropped
//! position.

use crate::align::{align, Join};
use crate::axis::Axis;
use crate::digest::ArrayDigest;
use crate::error::{ArrayError, DataAlignmentError};
use crate::label::Label;
use serde::{Deserialize, Serialize};

/// An n-dimensional array with labeled axes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ArrayRepr", into = "ArrayRepr")]
pub struct LabeledArray {
    axes: Vec<Axis>,
    data: Vec<f64>,
}

/// Wire form: `null` stands for "no data"
#[derive(Serialize, Deserialize)]
struct ArrayRepr {
    axes: Vec<Axis>,
    data: Vec<Option<f64>>,
}

impl LabeledArray {
    /// Create an array from axes and row-major data
    ///
    /// # Errors
    /// Returns error if dimension names repeat or the data length does not
    /// match the axes.
    pub fn new(axes: Vec<Axis>, data: Vec<f64>) -> Result<Self, ArrayError> {
        for (i, axis) in axes.iter().enumerate() {
            if axes[..i].iter().any(|a| a.name() == axis.name()) {
                return Err(ArrayError::DuplicateDimension(axis.name().to_string()));
            }
        }
        let expected: usize = axes.iter().map(Axis::len).product();
        if expected != data.len() {
            return Err(ArrayError::ShapeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { axes, data })
    }

    /// Create an array with every position set to `value`
    ///
    /// # Errors
    /// Returns error if dimension names repeat.
    pub fn filled(axes: Vec<Axis>, value: f64) -> Result<Self, ArrayError> {
        let len = axes.iter().map(Axis::len).product();
        Self::new(axes, vec![value; len])
    }

    /// Create a one-dimensional array
    ///
    /// # Errors
    /// Returns error if the data length differs from the axis length.
    pub fn from_axis(axis: Axis, data: Vec<f64>) -> Result<Self, ArrayError> {
        Self::new(vec![axis], data)
    }

    /// Axes in storage order
    #[inline]
    #[must_use]
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Dimension names in storage order
    #[must_use]
    pub fn dims(&self) -> Vec<&str> {
        self.axes.iter().map(Axis::name).collect()
    }

    /// Axis by dimension name
    #[must_use]
    pub fn axis(&self, dim: &str) -> Option<&Axis> {
        self.axes.iter().find(|a| a.name() == dim)
    }

    /// True when the dimension is present
    #[must_use]
    pub fn has_dim(&self, dim: &str) -> bool {
        self.axis(dim).is_some()
    }

    /// Axis lengths in storage order
    #[must_use]
    pub fn shape(&self) -> Vec<usize> {
        self.axes.iter().map(Axis::len).collect()
    }

    /// Total number of positions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when any axis is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw values, row-major
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.data
    }

    /// Mutable raw values, row-major
    #[inline]
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    fn axis_position(&self, dim: &str) -> Option<usize> {
        self.axes.iter().position(|a| a.name() == dim)
    }

    fn require_axis(&self, dim: &str) -> Result<usize, ArrayError> {
        self.axis_position(dim)
            .ok_or_else(|| ArrayError::UnknownDimension(dim.to_string()))
    }

    fn strides(&self) -> Vec<usize> {
        let mut strides = vec![1; self.axes.len()];
        for k in (0..self.axes.len().saturating_sub(1)).rev() {
            strides[k] = strides[k + 1] * self.axes[k + 1].len();
        }
        strides
    }

    /// Own strides laid out along `axes`; zero where the dimension is absent
    fn strides_in(&self, axes: &[Axis]) -> Vec<usize> {
        let own = self.strides();
        axes.iter()
            .map(|a| self.axis_position(a.name()).map_or(0, |k| own[k]))
            .collect()
    }

    fn offset(&self, index: &[Label]) -> Result<usize, ArrayError> {
        if index.len() != self.axes.len() {
            return Err(ArrayError::IndexArity {
                expected: self.axes.len(),
                actual: index.len(),
            });
        }
        let strides = self.strides();
        let mut offset = 0;
        for ((axis, label), stride) in self.axes.iter().zip(index).zip(strides) {
            let pos = axis.position(label).ok_or_else(|| ArrayError::LabelNotFound {
                dimension: axis.name().to_string(),
                label: label.clone(),
            })?;
            offset += pos * stride;
        }
        Ok(offset)
    }

    /// Value at a label tuple given in storage order
    ///
    /// # Errors
    /// Returns error on arity mismatch or unknown label.
    pub fn get(&self, index: &[Label]) -> Result<f64, ArrayError> {
        self.offset(index).map(|o| self.data[o])
    }

    /// Overwrite the value at a label tuple given in storage order
    ///
    /// # Errors
    /// Returns error on arity mismatch or unknown label.
    pub fn set(&mut self, index: &[Label], value: f64) -> Result<(), ArrayError> {
        let o = self.offset(index)?;
        self.data[o] = value;
        Ok(())
    }

    /// Gather along axis `k`; `None` positions become `NaN`
    fn take_along(&self, k: usize, positions: &[Option<usize>], new_axis: Axis) -> Self {
        let shape = self.shape();
        let outer: usize = shape[..k].iter().product();
        let inner: usize = shape[k + 1..].iter().product();
        let old_len = shape[k];

        let mut data = Vec::with_capacity(outer * positions.len() * inner);
        for o in 0..outer {
            for p in positions {
                match p {
                    Some(p) => {
                        let start = (o * old_len + p) * inner;
                        data.extend_from_slice(&self.data[start..start + inner]);
                    }
                    None => data.extend(std::iter::repeat(f64::NAN).take(inner)),
                }
            }
        }

        let mut axes = self.axes.clone();
        axes[k] = new_axis;
        Self { axes, data }
    }

    /// Select a subset of labels, keeping the dimension
    ///
    /// # Errors
    /// Returns error if the dimension or any label is unknown.
    pub fn sel(&self, dim: &str, labels: &[Label]) -> Result<Self, ArrayError> {
        let k = self.require_axis(dim)?;
        let axis = &self.axes[k];
        let positions = labels
            .iter()
            .map(|l| {
                axis.position(l).ok_or_else(|| ArrayError::LabelNotFound {
                    dimension: dim.to_string(),
                    label: l.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let new_axis = axis.take(&positions);
        let positions: Vec<Option<usize>> = positions.into_iter().map(Some).collect();
        Ok(self.take_along(k, &positions, new_axis))
    }

    /// Select a single label and drop the dimension
    ///
    /// # Errors
    /// Returns error if the dimension or label is unknown.
    pub fn sel_one(&self, dim: &str, label: &Label) -> Result<Self, ArrayError> {
        let k = self.require_axis(dim)?;
        let mut selected = self.sel(dim, std::slice::from_ref(label))?;
        selected.axes.remove(k);
        Ok(selected)
    }

    /// Remove labels from a dimension; labels not present are ignored
    ///
    /// # Errors
    /// Returns error if the dimension is unknown.
    pub fn drop_labels(&self, dim: &str, labels: &[Label]) -> Result<Self, ArrayError> {
        let k = self.require_axis(dim)?;
        let axis = &self.axes[k];
        let keep: Vec<usize> = (0..axis.len())
            .filter(|&i| !labels.contains(&axis.labels()[i]))
            .collect();
        let new_axis = axis.take(&keep);
        let positions: Vec<Option<usize>> = keep.into_iter().map(Some).collect();
        Ok(self.take_along(k, &positions, new_axis))
    }

    /// Prepend a new dimension, repeating the data along it
    ///
    /// # Errors
    /// Returns error if the dimension already exists.
    pub fn expand_dims(&self, axis: Axis) -> Result<Self, ArrayError> {
        if self.has_dim(axis.name()) {
            return Err(ArrayError::DuplicateDimension(axis.name().to_string()));
        }
        let mut data = Vec::with_capacity(self.data.len() * axis.len());
        for _ in 0..axis.len() {
            data.extend_from_slice(&self.data);
        }
        let mut axes = Vec::with_capacity(self.axes.len() + 1);
        axes.push(axis);
        axes.extend(self.axes.iter().cloned());
        Ok(Self { axes, data })
    }

    /// Conform a dimension to a target axis; new labels hold `NaN`
    ///
    /// # Errors
    /// Returns error if the dimension is unknown.
    pub fn reindex(&self, dim: &str, target: &Axis) -> Result<Self, ArrayError> {
        let k = self.require_axis(dim)?;
        let axis = &self.axes[k];
        let positions: Vec<Option<usize>> =
            target.labels().iter().map(|l| axis.position(l)).collect();
        let mut new_axis = target.clone();
        if new_axis.name() != dim {
            new_axis = Axis::new(dim, target.labels().to_vec())?;
        }
        Ok(self.take_along(k, &positions, new_axis))
    }

    /// Apply a function to every value
    #[must_use]
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            axes: self.axes.clone(),
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Replace `NaN` and infinities with `value`
    #[must_use]
    pub fn fill_non_finite(&self, value: f64) -> Self {
        self.map(|v| if v.is_finite() { v } else { value })
    }

    /// Multiply every value by a scalar
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        self.map(|v| v * factor)
    }

    /// Apply a function in place to every position whose label on `dim` is in
    /// `labels`; labels not on the axis are ignored
    ///
    /// # Errors
    /// Returns error if the dimension is unknown.
    pub fn update_labels(
        &mut self,
        dim: &str,
        labels: &[Label],
        f: impl Fn(f64) -> f64,
    ) -> Result<(), ArrayError> {
        let k = self.require_axis(dim)?;
        let shape = self.shape();
        let outer: usize = shape[..k].iter().product();
        let inner: usize = shape[k + 1..].iter().product();
        let selected: Vec<usize> = labels
            .iter()
            .filter_map(|l| self.axes[k].position(l))
            .collect();
        for o in 0..outer {
            for &p in &selected {
                let start = (o * shape[k] + p) * inner;
                for v in &mut self.data[start..start + inner] {
                    *v = f(*v);
                }
            }
        }
        Ok(())
    }

    /// Elementwise combination after outer alignment and broadcasting
    ///
    /// The result carries the left operand's axes (conformed to the label
    /// union) followed by any dimensions only the right operand has.
    ///
    /// # Errors
    /// Returns error if alignment fails.
    pub fn zip_with(
        &self,
        other: &Self,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Self, DataAlignmentError> {
        let (left, right) = align(self, other, Join::Outer)?;

        let mut axes = left.axes.clone();
        axes.extend(
            right
                .axes
                .iter()
                .filter(|a| !left.has_dim(a.name()))
                .cloned(),
        );
        let shape: Vec<usize> = axes.iter().map(Axis::len).collect();
        let left_strides = left.strides_in(&axes);
        let right_strides = right.strides_in(&axes);
        let total: usize = shape.iter().product();

        let mut data = Vec::with_capacity(total);
        let mut index = vec![0usize; shape.len()];
        let (mut lo, mut ro) = (0usize, 0usize);
        for _ in 0..total {
            data.push(f(left.data[lo], right.data[ro]));
            for k in (0..shape.len()).rev() {
                index[k] += 1;
                lo += left_strides[k];
                ro += right_strides[k];
                if index[k] < shape[k] {
                    break;
                }
                lo -= left_strides[k] * shape[k];
                ro -= right_strides[k] * shape[k];
                index[k] = 0;
            }
        }

        Ok(Self { axes, data })
    }

    /// Elementwise sum
    ///
    /// # Errors
    /// Returns error if alignment fails.
    pub fn add(&self, other: &Self) -> Result<Self, DataAlignmentError> {
        self.zip_with(other, |a, b| a + b)
    }

    /// Elementwise difference
    ///
    /// # Errors
    /// Returns error if alignment fails.
    pub fn sub(&self, other: &Self) -> Result<Self, DataAlignmentError> {
        self.zip_with(other, |a, b| a - b)
    }

    /// Elementwise product
    ///
    /// # Errors
    /// Returns error if alignment fails.
    pub fn mul(&self, other: &Self) -> Result<Self, DataAlignmentError> {
        self.zip_with(other, |a, b| a * b)
    }

    /// Elementwise quotient
    ///
    /// # Errors
    /// Returns error if alignment fails.
    pub fn div(&self, other: &Self) -> Result<Self, DataAlignmentError> {
        self.zip_with(other, |a, b| a / b)
    }

    /// Sum of all finite values
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.data.iter().filter(|v| v.is_finite()).sum()
    }

    /// Count of positions holding data
    #[must_use]
    pub fn count_finite(&self) -> usize {
        self.data.iter().filter(|v| v.is_finite()).count()
    }

    /// Exact equality of axes and value bit patterns
    #[must_use]
    pub fn bit_eq(&self, other: &Self) -> bool {
        self.axes == other.axes
            && self.data.len() == other.data.len()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }

    /// Equality within a relative tolerance; `NaN` matches `NaN`
    #[must_use]
    pub fn approx_eq(&self, other: &Self, rel_tol: f64) -> bool {
        self.axes == other.axes
            && self.data.len() == other.data.len()
            && self.data.iter().zip(&other.data).all(|(&a, &b)| {
                (a.is_nan() && b.is_nan()) || a == b || (a - b).abs() <= rel_tol * a.abs().max(b.abs())
            })
    }

    /// Content digest over axes and values
    #[must_use]
    pub fn digest(&self) -> ArrayDigest {
        ArrayDigest::of(self)
    }
}

impl TryFrom<ArrayRepr> for LabeledArray {
    type Error = ArrayError;

    fn try_from(repr: ArrayRepr) -> Result<Self, Self::Error> {
        let data = repr.data.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        Self::new(repr.axes, data)
    }
}

impl From<LabeledArray> for ArrayRepr {
    fn from(array: LabeledArray) -> Self {
        Self {
            axes: array.axes,
            data: array
                .data
                .into_iter()
                .map(|v| v.is_finite().then_some(v))
                .collect(),
        }
    }
}
