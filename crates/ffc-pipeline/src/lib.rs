//! FFC Pipeline - scenario compiler and sequential executor
//!
//! # Two-Phase Architecture
//!
//! 1. **Construction**: [`PipelineBuilder`] turns slider positions and
//!    advanced settings into a validated, fully bound [`Node`] sequence
//! 2. **Execution**: [`Executor`] applies each node's [`Transform`] to the
//!    DataBlock, in order, stopping at the first failure
//!
//! ```rust,ignore
//! let pipeline = PipelineBuilder::build(params, datablock)?;
//! let executor = Executor::new(Arc::new(registry));
//! let result = executor.run(pipeline)?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod construction;
mod error;
mod executor;
mod node;
mod params;
mod pipeline;
pub mod scenario_id;
mod transform;

pub use construction::{agroecology_sequestration, ConstructionValidator, PipelineBuilder};
pub use error::{
    BuildError, ExecutionFailure, NodeExecutionError, ParamError, RunError, ScenarioIdError,
    TransformError,
};
pub use executor::Executor;
pub use node::{Node, NodeCategory, NodeKind};
pub use params::{
    ItemSelector, NodeParams, ParamValue, ANIMAL_PRODUCTS, ITEM_GROUP, ITEM_ORIGIN,
    VEGETAL_PRODUCTS,
};
pub use pipeline::Pipeline;
pub use scenario_id::SCENARIO_ID_KEYS;
pub use transform::{
    ComputeMetrics, GenerateScenarioId, ScaleImpact, ScaleProduction, Transform,
    TransformRegistry, ITEM_DIM,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
