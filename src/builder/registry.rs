//! Hash-keyed binding registries.
//!
//! Each registry guarantees one emission per logical value: the first
//! registration under a hash wins and later registrations reuse it, which is
//! how structurally-identical values collapse to one GPU binding across many
//! call sites.

use std::collections::HashMap;

use serde::Serialize;

use crate::graph::NodeId;
use crate::types::NodeType;

/// Insertion-ordered store with hash-based dedup (vector for deterministic
/// emission order, map for reuse lookups).
#[derive(Debug)]
pub(crate) struct Registry<T> {
    items: Vec<T>,
    index_by_hash: HashMap<u64, usize>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Registry {
            items: Vec::new(),
            index_by_hash: HashMap::new(),
        }
    }
}

impl<T> Registry<T> {
    pub fn get(&self, hash: u64) -> Option<&T> {
        self.index_by_hash.get(&hash).map(|&idx| &self.items[idx])
    }

    /// Register under `hash`; the first registration wins.
    pub fn insert(&mut self, hash: u64, item: T) {
        if self.index_by_hash.contains_key(&hash) {
            return;
        }
        self.index_by_hash.insert(hash, self.items.len());
        self.items.push(item);
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A uniform binding: CPU-supplied, GPU-read-only value bound once per
/// compiled program.
#[derive(Clone, Debug, Serialize)]
pub struct NodeUniform {
    pub name: String,
    pub ty: NodeType,
    pub node: NodeId,
}

/// A sampled texture + sampler binding pair.
#[derive(Clone, Debug, Serialize)]
pub struct NodeTexture {
    pub name: String,
    pub sampler_name: String,
    pub node: NodeId,
}

/// A per-vertex input read from a geometry buffer.
#[derive(Clone, Debug, Serialize)]
pub struct NodeAttribute {
    pub name: String,
    pub ty: NodeType,
    pub location: usize,
    pub node: NodeId,
}

/// A value computed in the vertex stage and interpolated into the fragment
/// stage.
#[derive(Clone, Debug, Serialize)]
pub struct NodeVarying {
    pub name: String,
    pub ty: NodeType,
    pub node: NodeId,
    /// Integer values transfer without interpolation.
    pub flat: bool,
}

/// A builder-declared local (temporary or property). Internal bookkeeping,
/// not part of the program metadata.
#[derive(Clone, Debug)]
pub struct NodeVar {
    pub name: String,
    pub ty: NodeType,
}

/// A registered code block (function declaration or raw header code),
/// emitted once per program.
#[derive(Clone, Debug)]
pub(crate) struct CodeSection {
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_registration_wins() {
        let mut reg: Registry<NodeUniform> = Registry::default();
        reg.insert(
            7,
            NodeUniform {
                name: "u0".to_string(),
                ty: NodeType::Float,
                node: NodeId(0),
            },
        );
        reg.insert(
            7,
            NodeUniform {
                name: "u1".to_string(),
                ty: NodeType::Float,
                node: NodeId(1),
            },
        );
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(7).unwrap().name, "u0");
        assert!(reg.get(8).is_none());
    }
}
