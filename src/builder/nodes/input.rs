//! Generators for input nodes: constants, uniforms, attributes, varyings,
//! builtins and properties.

use anyhow::{Result, bail};

use crate::builder::{NodeBuilder, emit};
use crate::graph::{NodeId, NodeKind};

pub(crate) fn generate_constant(b: &mut NodeBuilder, id: NodeId) -> Result<String> {
    let graph = b.graph();
    let NodeKind::Constant(value) = &graph.node(id).kind else {
        unreachable!()
    };
    match value.literal(b.language) {
        Some(lit) => Ok(lit),
        None => bail!("ConstNode: texture values have no literal form"),
    }
}

pub(crate) fn generate_uniform(b: &mut NodeBuilder, id: NodeId) -> Result<String> {
    b.register_uniform(id)
}

/// Attributes read per-vertex geometry data. A referenced attribute missing
/// from the geometry is the one recovered failure: warn and substitute a
/// type-appropriate constant so partial geometry never aborts a build.
pub(crate) fn generate_attribute(b: &mut NodeBuilder, id: NodeId) -> Result<String> {
    let graph = b.graph();
    let NodeKind::Attribute { name, ty } = &graph.node(id).kind else {
        unreachable!()
    };
    let declared = *ty;
    let name = name.clone();

    match b.geometry().find(&name) {
        Some(attr) => {
            let ty = declared.unwrap_or(attr.ty);
            Ok(b.register_attribute(id, &name, ty))
        }
        None => {
            let ty = declared.unwrap_or(crate::types::NodeType::Float);
            log::warn!(
                "NodeBuilder: Attribute '{name}' not found in the geometry; substituting a typed constant."
            );
            Ok(emit::zero_literal(b.language, ty))
        }
    }
}

pub(crate) fn generate_varying(b: &mut NodeBuilder, id: NodeId) -> Result<String> {
    let graph = b.graph();
    let NodeKind::Varying { inner, label } = &graph.node(id).kind else {
        unreachable!()
    };
    let (inner, label) = (*inner, label.clone());
    let ty = b.node_type_of(inner)?;
    b.build_varying_of(inner, ty, label.as_deref())
}

pub(crate) fn generate_builtin(b: &mut NodeBuilder, id: NodeId) -> Result<String> {
    let graph = b.graph();
    let NodeKind::Builtin(builtin) = &graph.node(id).kind else {
        unreachable!()
    };
    b.register_builtin(*builtin)
}

pub(crate) fn generate_property(b: &mut NodeBuilder, id: NodeId) -> Result<String> {
    let graph = b.graph();
    let NodeKind::Property { ty, label } = &graph.node(id).kind else {
        unreachable!()
    };
    let (ty, label) = (*ty, label.clone());
    Ok(b.property_for(id, ty, label.as_deref()))
}
