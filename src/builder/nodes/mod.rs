//! Per-kind code generation, dispatched from a single match.

pub(crate) mod control;
pub(crate) mod function;
pub(crate) mod input;
pub(crate) mod math;
pub(crate) mod texture;

use anyhow::Result;

use crate::builder::NodeBuilder;
use crate::graph::{NodeId, NodeKind};

/// Generate the raw expression (or flow statements) for one node at its
/// natural type. Temp materialization, varying promotion and output
/// adaptation happen in the builder around this call.
pub(crate) fn generate(b: &mut NodeBuilder, id: NodeId) -> Result<String> {
    let graph = b.graph();
    match &graph.node(id).kind {
        NodeKind::Constant(_) => input::generate_constant(b, id),
        NodeKind::Uniform(_) => input::generate_uniform(b, id),
        NodeKind::Attribute { .. } => input::generate_attribute(b, id),
        NodeKind::Varying { .. } => input::generate_varying(b, id),
        NodeKind::Builtin(_) => input::generate_builtin(b, id),
        NodeKind::Property { .. } => input::generate_property(b, id),
        NodeKind::Operator { .. } => math::generate_operator(b, id),
        NodeKind::Math { .. } => math::generate_math(b, id),
        NodeKind::Convert { .. } => math::generate_convert(b, id),
        NodeKind::Swizzle { .. } => math::generate_swizzle(b, id),
        NodeKind::Join { .. } => math::generate_join(b, id),
        NodeKind::Sample { .. } => texture::generate_sample(b, id),
        NodeKind::Context { .. } => control::generate_context(b, id),
        NodeKind::Stack(_) => control::generate_stack(b, id),
        NodeKind::Cond(_) => control::generate_cond(b, id),
        NodeKind::Loop(_) => control::generate_loop(b, id),
        NodeKind::LoopIndex => control::generate_loop_index(b, id),
        NodeKind::Assign { .. } => control::generate_assign(b, id),
        NodeKind::Function(_) => function::generate_function(b, id),
        NodeKind::Code(_) => function::generate_code(b, id),
        NodeKind::Call { .. } => function::generate_call(b, id),
    }
}
