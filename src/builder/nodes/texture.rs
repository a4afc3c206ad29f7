//! Generator for texture sampling.

use anyhow::{Result, bail};

use crate::builder::{NodeBuilder, emit};
use crate::graph::{NodeId, NodeKind};
use crate::types::{NodeType, Value};

pub(crate) fn generate_sample(b: &mut NodeBuilder, id: NodeId) -> Result<String> {
    let graph = b.graph();
    let NodeKind::Sample { texture, uv } = &graph.node(id).kind else {
        unreachable!()
    };
    let (texture, uv) = (*texture, *uv);

    match &graph.node(texture).kind {
        NodeKind::Uniform(slot) if matches!(slot.value, Value::Texture(_)) => {}
        other => bail!("TextureNode: 'sample' expects a texture uniform, got {other:?}"),
    }

    let (tex_name, sampler_name) = b.register_texture(texture)?;
    let uv_snippet = b.build(uv, Some(NodeType::Vec2))?;
    Ok(emit::sample_expr(
        b.language,
        b.stage(),
        &tex_name,
        &sampler_name,
        &uv_snippet,
    ))
}
