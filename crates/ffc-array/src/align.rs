//! Alignment of labeled arrays
//!
//! Alignment conforms every dimension the two arrays share to one common
//! axis. With [`Join::Outer`] the common axis is the label union; labels
//! present on only one side are kept and hold `NaN` on the other. Dimensions
//! that only one array has are left untouched.

use crate::array::LabeledArray;
use crate::error::{DataAlignmentError, Side};

/// How shared axes are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Join {
    /// Union of labels, missing positions hold `NaN`
    #[default]
    Outer,
    /// Intersection of labels, in left order
    Inner,
}

/// Conform the shared dimensions of two arrays
///
/// # Errors
/// Returns error if reindexing fails.
pub fn align(
    left: &LabeledArray,
    right: &LabeledArray,
    join: Join,
) -> Result<(LabeledArray, LabeledArray), DataAlignmentError> {
    let mut l = left.clone();
    let mut r = right.clone();

    for axis in left.axes() {
        let Some(other) = right.axis(axis.name()) else {
            continue;
        };
        if axis.labels() == other.labels() {
            continue;
        }
        let target = match join {
            Join::Outer => axis.union(other),
            Join::Inner => axis.take(&axis.intersection(other)),
        };
        l = l.reindex(axis.name(), &target)?;
        r = r.reindex(axis.name(), &target)?;
    }

    Ok((l, r))
}

/// Dimension names both arrays carry, in left order
#[must_use]
pub fn shared_dims(left: &LabeledArray, right: &LabeledArray) -> Vec<String> {
    left.dims()
        .into_iter()
        .filter(|d| right.has_dim(d))
        .map(str::to_string)
        .collect()
}

/// Outer-align two arrays that must share at least one dimension
///
/// # Errors
/// Returns [`DataAlignmentError::NoSharedDimension`] when the arrays have no
/// dimension in common.
pub fn align_shared(
    left: &LabeledArray,
    right: &LabeledArray,
) -> Result<(LabeledArray, LabeledArray), DataAlignmentError> {
    if shared_dims(left, right).is_empty() {
        return Err(DataAlignmentError::NoSharedDimension {
            left: left.dims().into_iter().map(str::to_string).collect(),
            right: right.dims().into_iter().map(str::to_string).collect(),
        });
    }
    align(left, right, Join::Outer)
}

/// Check that both arrays carry `dim` and share at least one label on it
///
/// # Errors
/// Returns error naming the missing side or the empty intersection.
pub fn require_overlap(
    left: &LabeledArray,
    right: &LabeledArray,
    dim: &str,
) -> Result<(), DataAlignmentError> {
    let l = left
        .axis(dim)
        .ok_or_else(|| DataAlignmentError::MissingDimension {
            dimension: dim.to_string(),
            side: Side::Left,
        })?;
    let r = right
        .axis(dim)
        .ok_or_else(|| DataAlignmentError::MissingDimension {
            dimension: dim.to_string(),
            side: Side::Right,
        })?;
    if l.intersection(r).is_empty() {
        return Err(DataAlignmentError::EmptyIntersection {
            dimension: dim.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::Axis;
    use crate::label::{labels, Label};

    fn grid(xs: &[i64], value: f64) -> LabeledArray {
        LabeledArray::filled(vec![Axis::new("x", labels(xs.iter().copied())).unwrap()], value)
            .unwrap()
    }

    #[test]
    fn outer_join_keeps_both_sides() {
        let (l, r) = align(&grid(&[1, 2], 1.0), &grid(&[2, 3], 2.0), Join::Outer).unwrap();
        let expected = labels([1, 2, 3]);
        assert_eq!(l.axis("x").unwrap().labels(), expected.as_slice());
        assert_eq!(r.axis("x").unwrap().labels(), expected.as_slice());
        assert!(l.get(&[Label::Int(3)]).unwrap().is_nan());
        assert!(r.get(&[Label::Int(1)]).unwrap().is_nan());
    }

    #[test]
    fn inner_join_intersects() {
        let (l, r) = align(&grid(&[1, 2], 1.0), &grid(&[2, 3], 2.0), Join::Inner).unwrap();
        assert_eq!(l.axis("x").unwrap().labels(), labels([2]).as_slice());
        assert_eq!(r.values(), &[2.0]);
    }

    #[test]
    fn identical_axes_are_untouched() {
        let a = grid(&[5, 4], 1.0);
        let (l, _) = align(&a, &grid(&[5, 4], 0.0), Join::Outer).unwrap();
        assert!(l.bit_eq(&a));
    }

    #[test]
    fn align_shared_requires_common_dim() {
        let years =
            LabeledArray::filled(vec![Axis::new("Year", labels([2020])).unwrap()], 1.0).unwrap();
        let err = align_shared(&grid(&[1], 1.0), &years).unwrap_err();
        assert!(matches!(err, DataAlignmentError::NoSharedDimension { .. }));
    }

    #[test]
    fn require_overlap_reports_problems() {
        assert!(require_overlap(&grid(&[1, 2], 1.0), &grid(&[2], 1.0), "x").is_ok());
        assert!(matches!(
            require_overlap(&grid(&[1], 1.0), &grid(&[2], 1.0), "x"),
            Err(DataAlignmentError::EmptyIntersection { .. })
        ));
        assert!(matches!(
            require_overlap(&grid(&[1], 1.0), &grid(&[1], 1.0), "y"),
            Err(DataAlignmentError::MissingDimension { side: Side::Left, .. })
        ));
    }
}
