//! FFC Array - labeled n-dimensional arrays
//!
//! The numeric primitive every dataset in the calculator is stored in.
//!
//! # Core Concepts
//!
//! - [`Label`]: integer or text coordinate value
//! - [`Axis`]: named dimension with unique labels and auxiliary coordinates
//! - [`LabeledArray`]: dense `f64` values over named axes, `NaN` = no data
//! - [`align`]: outer/inner alignment; arithmetic always aligns outer first
//! - [`ArrayDigest`]: Blake3 fingerprint for snapshot checks
//!
//! # Example
//!
//! ```rust,ignore
//! use ffc_array::{labels, Axis, LabeledArray};
//!
//! let food = LabeledArray::from_axis(Axis::new("Item", labels([2511, 2731]))?, vec![5.0, 2.0])?;
//! let kcal = LabeledArray::from_axis(Axis::new("Item", labels([2511]))?, vec![3.3])?;
//!
//! // 2731 has no intensity: the product keeps it as NaN
//! let energy = food.mul(&kcal)?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod align;
mod array;
mod axis;
mod digest;
mod error;
mod label;

pub use align::{align, align_shared, require_overlap, shared_dims, Join};
pub use array::LabeledArray;
pub use axis::Axis;
pub use digest::ArrayDigest;
pub use error::{ArrayError, DataAlignmentError, Side};
pub use label::{labels, Label};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
