//! Identity-keyed memo store for one build pass.

use std::collections::HashMap;
use std::sync::Arc;

use crate::graph::NodeId;
use crate::snippet::FunctionLayout;
use crate::types::{NodeType, ShaderStage};

/// Compiled artifacts memoized for one node within one cache.
#[derive(Debug, Default)]
pub struct NodeData {
    /// Generated text per requested output type; reused verbatim while the
    /// cache is active.
    pub outputs: HashMap<NodeType, String>,
    /// Raw expression at the node's natural type, before adaptation.
    pub snippet: Option<String>,
    /// Name of the materialized temporary, when one was emitted.
    pub node_var: Option<String>,
    /// Name of a declared property (conditional results, loop indices).
    pub property_name: Option<String>,
    /// Number of consumers found by the analyze phase.
    pub dependants: u32,
    pub(crate) constructed: bool,
}

/// Pure memo table keyed by node identity (and stage, since the same node
/// may generate different text per stage). No eviction; lifetime equals the
/// builder's, and sub-builds swap in an isolated instance.
#[derive(Debug, Default)]
pub struct NodeCache {
    data: HashMap<(NodeId, usize), NodeData>,
    /// Parsed snippet layouts; stage-agnostic.
    functions: HashMap<NodeId, Arc<FunctionLayout>>,
}

impl NodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_node_data(&self, node: NodeId, stage: ShaderStage) -> Option<&NodeData> {
        self.data.get(&(node, stage.index()))
    }

    pub fn node_data_mut(&mut self, node: NodeId, stage: ShaderStage) -> &mut NodeData {
        self.data.entry((node, stage.index())).or_default()
    }

    pub fn function(&self, node: NodeId) -> Option<Arc<FunctionLayout>> {
        self.functions.get(&node).cloned()
    }

    pub fn set_function(&mut self, node: NodeId, layout: Arc<FunctionLayout>) {
        self.functions.insert(node, layout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_is_per_stage() {
        let mut cache = NodeCache::new();
        let id = NodeId(0);
        cache
            .node_data_mut(id, ShaderStage::Vertex)
            .outputs
            .insert(NodeType::Vec3, "in.position".to_string());

        assert!(cache.get_node_data(id, ShaderStage::Fragment).is_none());
        assert_eq!(
            cache
                .get_node_data(id, ShaderStage::Vertex)
                .unwrap()
                .outputs
                .get(&NodeType::Vec3)
                .unwrap(),
            "in.position"
        );
    }
}
