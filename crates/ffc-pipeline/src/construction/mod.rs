//! Construction Phase
//!
//! Everything that happens before the first node runs.
//!
//! # Two-Phase Architecture
//!
//! 1. **Construction Phase** (this module):
//!    - Compile slider positions and settings into bound nodes
//!    - Validate every bound value
//!    - Record run parameters and timescale in the DataBlock
//!    - Produce a [`Pipeline`](crate::Pipeline)
//!
//! 2. **Execution Phase** (executor module):
//!    - Check the baseline snapshot exists
//!    - Apply each node in order
//!    - Stop at the first failure, keeping the partial DataBlock
//!    - Zero parameter validation

pub mod builder;
pub mod validator;

pub use builder::{agroecology_sequestration, PipelineBuilder};
pub use validator::{ConstructionValidator, PAIRED_PARAMS};
