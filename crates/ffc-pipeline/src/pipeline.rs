//! A compiled pipeline and the DataBlock it owns

use crate::node::Node;
use ffc_datablock::DataBlock;

/// Ordered nodes plus the DataBlock they will mutate
///
/// Built fresh for each evaluation and consumed by the executor.
#[derive(Debug, Clone)]
pub struct Pipeline {
    nodes: Vec<Node>,
    datablock: DataBlock,
}

impl Pipeline {
    #[must_use]
    pub fn new(nodes: Vec<Node>, datablock: DataBlock) -> Self {
        Self { nodes, datablock }
    }

    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    #[must_use]
    pub fn datablock(&self) -> &DataBlock {
        &self.datablock
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Split into nodes and DataBlock
    #[must_use]
    pub fn into_parts(self) -> (Vec<Node>, DataBlock) {
        (self.nodes, self.datablock)
    }
}
