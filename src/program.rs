//! Program descriptions, compilation entry point and compiled bundles.

use anyhow::{Result, bail};
use serde::Serialize;

use crate::builder::{NodeAttribute, NodeBuilder, NodeTexture, NodeUniform, NodeVarying, emit};
use crate::error::CompileError;
use crate::graph::{NodeGraph, NodeId};
use crate::types::{NodeType, ShaderStage, TargetLanguage};

/// One per-vertex input available from the geometry.
#[derive(Clone, Debug, Serialize)]
pub struct GeometryAttribute {
    pub name: String,
    pub ty: NodeType,
}

/// The set of attributes the current geometry provides. Attribute nodes
/// referencing anything outside this set are recovered with a typed
/// constant instead of failing the build.
#[derive(Clone, Debug, Default, Serialize)]
pub struct GeometryLayout {
    pub attributes: Vec<GeometryAttribute>,
}

impl GeometryLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, ty: NodeType) -> Self {
        self.attributes.push(GeometryAttribute {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn find(&self, name: &str) -> Option<&GeometryAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// What to compile: one root per requested stage. Render programs take a
/// vertex root (clip position) and a fragment root (color); compute
/// programs take a single root built in statement context.
#[derive(Clone, Debug)]
pub struct ProgramDesc {
    pub label: String,
    pub language: TargetLanguage,
    pub vertex: Option<NodeId>,
    pub fragment: Option<NodeId>,
    pub compute: Option<NodeId>,
    pub workgroup_size: [u32; 3],
    pub geometry: GeometryLayout,
}

impl ProgramDesc {
    pub fn render(
        label: impl Into<String>,
        language: TargetLanguage,
        vertex: NodeId,
        fragment: NodeId,
        geometry: GeometryLayout,
    ) -> Self {
        ProgramDesc {
            label: label.into(),
            language,
            vertex: Some(vertex),
            fragment: Some(fragment),
            compute: None,
            workgroup_size: [1, 1, 1],
            geometry,
        }
    }

    pub fn compute(
        label: impl Into<String>,
        language: TargetLanguage,
        root: NodeId,
        workgroup_size: [u32; 3],
    ) -> Self {
        ProgramDesc {
            label: label.into(),
            language,
            vertex: None,
            fragment: None,
            compute: Some(root),
            workgroup_size,
            geometry: GeometryLayout::new(),
        }
    }
}

/// Compiled output: one source per requested stage plus the ordered binding
/// metadata the GPU backend needs to create shader modules and layouts.
#[derive(Clone, Debug, Serialize)]
pub struct ProgramBundle {
    pub label: String,
    pub language: TargetLanguage,
    pub vertex: Option<String>,
    pub fragment: Option<String>,
    pub compute: Option<String>,
    /// Combined WGSL module containing all emitted entry points (WGSL
    /// stages share one compilation unit; GLSL stages do not).
    pub module: Option<String>,
    pub uniforms: Vec<NodeUniform>,
    pub textures: Vec<NodeTexture>,
    pub attributes: Vec<NodeAttribute>,
    pub varyings: Vec<NodeVarying>,
}

#[derive(Serialize)]
struct BindingLayout<'a> {
    label: &'a str,
    language: TargetLanguage,
    uniforms: &'a [NodeUniform],
    textures: &'a [NodeTexture],
    attributes: &'a [NodeAttribute],
    varyings: &'a [NodeVarying],
}

impl ProgramBundle {
    /// Serialize the binding metadata for downstream tooling.
    pub fn layout_json(&self) -> Result<String> {
        let layout = BindingLayout {
            label: &self.label,
            language: self.language,
            uniforms: &self.uniforms,
            textures: &self.textures,
            attributes: &self.attributes,
            varyings: &self.varyings,
        };
        Ok(serde_json::to_string_pretty(&layout)?)
    }
}

/// Compile one program from the graph. Synchronous and run-to-completion:
/// either every requested stage is produced or an error is returned and
/// nothing is handed downstream.
pub fn compile_program(graph: &NodeGraph, desc: &ProgramDesc) -> Result<ProgramBundle> {
    let mut b = NodeBuilder::new(graph, desc.language, desc.geometry.clone(), desc.label.clone());

    let (vertex, fragment, compute, module) = if let Some(root) = desc.compute {
        if desc.vertex.is_some() || desc.fragment.is_some() {
            bail!("NodeBuilder: a program is either render (vertex + fragment) or compute, not both");
        }
        b.set_stage(ShaderStage::Compute);
        b.construct(root)?;
        b.analyze(root);
        let natural = b.node_type_of(root)?;
        let snippet = b.build(root, Some(NodeType::Void))?;
        b.flush_statement(&snippet, natural);

        let source = match desc.language {
            TargetLanguage::Wgsl => format!(
                "{}{}",
                emit::wgsl_common(&b, false),
                emit::wgsl_compute_entry(&b, desc.workgroup_size)
            ),
            TargetLanguage::Glsl => {
                emit::glsl_stage_source(&b, ShaderStage::Compute, desc.workgroup_size)
            }
        };
        let module = matches!(desc.language, TargetLanguage::Wgsl).then(|| source.clone());
        (None, None, Some(source), module)
    } else {
        let Some(vertex_root) = desc.vertex else {
            return Err(CompileError::MissingStageRoot { stage: "vertex" }.into());
        };
        let Some(fragment_root) = desc.fragment else {
            return Err(CompileError::MissingStageRoot { stage: "fragment" }.into());
        };

        b.set_stage(ShaderStage::Vertex);
        b.construct(vertex_root)?;
        b.analyze(vertex_root);
        let position = b.build(vertex_root, Some(NodeType::Vec4))?;
        b.flow_line(format!("{} = {position};", emit::position_ref(desc.language)));

        b.set_stage(ShaderStage::Fragment);
        b.construct(fragment_root)?;
        b.analyze(fragment_root);
        let color = b.build(fragment_root, Some(NodeType::Vec4))?;
        match desc.language {
            TargetLanguage::Wgsl => b.flow_line(format!("return {color};")),
            TargetLanguage::Glsl => b.flow_line(format!("fragColor = {color};")),
        }

        match desc.language {
            TargetLanguage::Wgsl => {
                let common = emit::wgsl_common(&b, true);
                let vs = emit::wgsl_vertex_entry(&b);
                let fs = emit::wgsl_fragment_entry(&b);
                let module = format!("{common}{vs}\n{fs}");
                (
                    Some(format!("{common}{vs}")),
                    Some(format!("{common}{fs}")),
                    None,
                    Some(module),
                )
            }
            TargetLanguage::Glsl => (
                Some(emit::glsl_stage_source(
                    &b,
                    ShaderStage::Vertex,
                    desc.workgroup_size,
                )),
                Some(emit::glsl_stage_source(
                    &b,
                    ShaderStage::Fragment,
                    desc.workgroup_size,
                )),
                None,
                None,
            ),
        }
    };

    Ok(ProgramBundle {
        label: desc.label.clone(),
        language: desc.language,
        vertex,
        fragment,
        compute,
        module,
        uniforms: b.uniform_list(),
        textures: b.texture_list(),
        attributes: b.attribute_list(),
        varyings: b.varying_list(),
    })
}
