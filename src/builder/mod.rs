//! One compilation pass over a node graph.
//!
//! The builder owns the per-program state: current stage, the cache stack,
//! the context stack, one flow buffer per stage and the binding registries.
//! A build runs three phases per stage root — construct (validation and
//! snippet parsing), analyze (consumer counting) and generate (text
//! emission) — and either completes or fails before any output is handed
//! downstream.

pub mod cache;
pub(crate) mod emit;
pub(crate) mod flow;
pub(crate) mod nodes;
pub mod registry;

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use anyhow::{Result, bail};

use crate::error::CompileError;
use crate::graph::{BuiltinVar, NodeGraph, NodeId, NodeKind};
use crate::program::GeometryLayout;
use crate::snippet::{self, FunctionLayout};
use crate::types::{NodeType, ShaderStage, TargetLanguage};

pub use cache::{NodeCache, NodeData};
pub use registry::{NodeAttribute, NodeTexture, NodeUniform, NodeVar, NodeVarying};

use flow::FlowBuffer;
use registry::{CodeSection, Registry};

const BUILD_RECURSION_LIMIT: u32 = 256;

/// Identifiers that generated names must never collide with.
const RESERVED_NAMES: &[&str] = &[
    "in",
    "out",
    "uniforms",
    "NodeUniforms",
    "VertexInput",
    "VertexOutput",
    "vs_main",
    "fs_main",
    "cs_main",
    "gid",
    "position",
    "fragColor",
    "main",
];

pub struct NodeBuilder<'g> {
    graph: &'g NodeGraph,
    pub(crate) language: TargetLanguage,
    stage: ShaderStage,
    label: String,
    geometry: GeometryLayout,
    caches: Vec<NodeCache>,
    contexts: Vec<HashMap<String, serde_json::Value>>,
    pub(crate) flows: [FlowBuffer; 3],
    pub(crate) uniforms: Registry<NodeUniform>,
    pub(crate) textures: Registry<NodeTexture>,
    pub(crate) attributes: Registry<NodeAttribute>,
    pub(crate) varyings: Registry<NodeVarying>,
    vars: [Vec<NodeVar>; 3],
    /// Property declarations, hoisted to the top of each stage's entry
    /// function so assignments inside nested blocks stay in scope.
    pub(crate) props: [Vec<NodeVar>; 3],
    /// Stable names for property nodes; survives cache swaps.
    property_names: HashMap<(NodeId, usize), String>,
    pub(crate) codes: Registry<CodeSection>,
    pub(crate) builtins: [Vec<BuiltinVar>; 3],
    used_names: HashSet<String>,
    loop_counter: u32,
    discard_counter: u32,
    depth: u32,
}

impl<'g> NodeBuilder<'g> {
    pub fn new(
        graph: &'g NodeGraph,
        language: TargetLanguage,
        geometry: GeometryLayout,
        label: impl Into<String>,
    ) -> Self {
        let used_names = RESERVED_NAMES.iter().map(|s| s.to_string()).collect();
        NodeBuilder {
            graph,
            language,
            stage: ShaderStage::Vertex,
            label: label.into(),
            geometry,
            caches: vec![NodeCache::new()],
            contexts: vec![HashMap::new()],
            flows: [FlowBuffer::default(), FlowBuffer::default(), FlowBuffer::default()],
            uniforms: Registry::default(),
            textures: Registry::default(),
            attributes: Registry::default(),
            varyings: Registry::default(),
            vars: [Vec::new(), Vec::new(), Vec::new()],
            props: [Vec::new(), Vec::new(), Vec::new()],
            property_names: HashMap::new(),
            codes: Registry::default(),
            builtins: [Vec::new(), Vec::new(), Vec::new()],
            used_names,
            loop_counter: 0,
            discard_counter: 0,
            depth: 0,
        }
    }

    /// The graph under compilation. The returned borrow is independent of
    /// the builder, so generators can read node payloads while mutating
    /// builder state.
    pub fn graph(&self) -> &'g NodeGraph {
        self.graph
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn set_stage(&mut self, stage: ShaderStage) {
        self.stage = stage;
    }

    pub fn language(&self) -> TargetLanguage {
        self.language
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn geometry(&self) -> &GeometryLayout {
        &self.geometry
    }

    pub fn node_type_of(&self, id: NodeId) -> Result<NodeType> {
        self.graph.node_type(id, Some(&self.geometry))
    }

    // ---- cache stack ----------------------------------------------------

    /// Swap in an isolated cache for a nested sub-build.
    pub fn push_cache(&mut self) {
        self.caches.push(NodeCache::new());
    }

    pub fn pop_cache(&mut self) {
        if self.caches.len() > 1 {
            self.caches.pop();
        } else {
            log::error!("NodeBuilder: unbalanced pop_cache()");
        }
    }

    fn cache(&self) -> &NodeCache {
        self.caches.last().expect("cache stack is never empty")
    }

    fn cache_mut(&mut self) -> &mut NodeCache {
        self.caches.last_mut().expect("cache stack is never empty")
    }

    pub fn node_data(&self, id: NodeId) -> Option<&NodeData> {
        self.cache().get_node_data(id, self.stage)
    }

    pub(crate) fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        let stage = self.stage;
        self.cache_mut().node_data_mut(id, stage)
    }

    // ---- context stack --------------------------------------------------

    /// Layer ambient overrides for a nested sub-build.
    pub fn push_context(&mut self, overrides: &[(String, serde_json::Value)]) {
        let mut top = self.contexts.last().cloned().unwrap_or_default();
        for (key, value) in overrides {
            top.insert(key.clone(), value.clone());
        }
        self.contexts.push(top);
    }

    pub fn pop_context(&mut self) {
        if self.contexts.len() > 1 {
            self.contexts.pop();
        } else {
            log::error!("NodeBuilder: unbalanced pop_context()");
        }
    }

    pub fn get_context(&self, key: &str) -> Option<&serde_json::Value> {
        self.contexts.last().and_then(|m| m.get(key))
    }

    // ---- phases ---------------------------------------------------------

    /// Construct phase: validate call signatures and parse snippet
    /// declarations before any text is generated.
    pub fn construct(&mut self, id: NodeId) -> Result<()> {
        if self.node_data(id).map(|d| d.constructed).unwrap_or(false) {
            return Ok(());
        }
        self.data_mut(id).constructed = true;

        let graph = self.graph;
        match &graph.node(id).kind {
            NodeKind::Function(_) => {
                self.parsed_function(id)?;
            }
            NodeKind::Call { function, args } => {
                let function = *function;
                let args = args.clone();
                let layout = self.parsed_function(function)?;
                for (i, input) in layout.inputs.iter().enumerate() {
                    let found = args
                        .iter()
                        .any(|a| a.name.as_deref() == Some(input.name.as_str()))
                        || args.get(i).is_some_and(|a| a.name.is_none());
                    if !found {
                        return Err(CompileError::UnresolvedInput {
                            kind: "FunctionCallNode",
                            name: input.name.clone(),
                        }
                        .into());
                    }
                }
            }
            _ => {}
        }

        for child in graph.children(id) {
            self.construct(child)?;
        }
        Ok(())
    }

    /// Analyze phase: count consumers so temp materialization can tell one
    /// use from many.
    pub fn analyze(&mut self, id: NodeId) {
        let data = self.data_mut(id);
        data.dependants += 1;
        if data.dependants == 1 {
            for child in self.graph.children(id) {
                self.analyze(child);
            }
        }
    }

    /// Generate phase: produce the node's text at the requested output
    /// type, consulting the cache first. The cache is written only after a
    /// successful generate, so a failed build never leaves a poisoned entry.
    pub fn build(&mut self, id: NodeId, output: Option<NodeType>) -> Result<String> {
        self.depth += 1;
        if self.depth > BUILD_RECURSION_LIMIT {
            self.depth -= 1;
            bail!("NodeBuilder: build recursion limit exceeded (is the graph cyclic?)");
        }
        let result = self.build_inner(id, output);
        self.depth -= 1;
        result
    }

    fn build_inner(&mut self, id: NodeId, output: Option<NodeType>) -> Result<String> {
        let natural = self.node_type_of(id)?;
        let requested = output.unwrap_or(natural);

        if let Some(data) = self.node_data(id) {
            if let Some(memo) = data.outputs.get(&requested) {
                return Ok(memo.clone());
            }
        }

        let snippet = match self.promote_across_stages(id, natural)? {
            Some(promoted) => promoted,
            None => self.generate_with_temp(id, natural, requested)?,
        };
        let adapted = self.format(&snippet, natural, requested)?;
        self.data_mut(id)
            .outputs
            .insert(requested, adapted.clone());
        Ok(adapted)
    }

    /// Stage safety: a value pinned to an earlier stage than the current one
    /// is transparently wrapped in a varying; anything else out of place is
    /// fatal.
    fn promote_across_stages(&mut self, id: NodeId, natural: NodeType) -> Result<Option<String>> {
        let node = self.graph.node(id);
        let Some(affinity) = node.affinity() else {
            return Ok(None);
        };
        if affinity == self.stage {
            return Ok(None);
        }
        match (affinity, self.stage) {
            (ShaderStage::Vertex, ShaderStage::Fragment) => {
                Ok(Some(self.build_varying_of(id, natural, None)?))
            }
            (from, to) => bail!(
                "NodeBuilder: a value with '{from:?}' affinity is not available in the '{to:?}' stage"
            ),
        }
    }

    fn generate_with_temp(
        &mut self,
        id: NodeId,
        natural: NodeType,
        requested: NodeType,
    ) -> Result<String> {
        let node = self.graph.node(id);
        let temp_capable = node.kind.is_temp() && !node.is_global();

        if !temp_capable || requested == NodeType::Void || natural == NodeType::Void {
            return nodes::generate(self, id);
        }

        if let Some(var) = self.node_data(id).and_then(|d| d.node_var.clone()) {
            return Ok(var);
        }

        let snippet = nodes::generate(self, id)?;
        self.data_mut(id).snippet = Some(snippet.clone());

        let dependants = self.node_data(id).map(|d| d.dependants).unwrap_or(0);
        if dependants > 1 {
            let name = self.declare_temp(natural, &snippet);
            self.data_mut(id).node_var = Some(name.clone());
            Ok(name)
        } else {
            Ok(snippet)
        }
    }

    /// Adapt a snippet from its natural type to the requested one.
    pub(crate) fn format(&self, snippet: &str, from: NodeType, to: NodeType) -> Result<String> {
        if from == to || to == NodeType::Void {
            return Ok(snippet.to_string());
        }
        if from == NodeType::Void {
            log::error!(
                "Node: 'generate' produced no value where '{to}' was requested; substituting a typed default."
            );
            return Ok(emit::zero_literal(self.language, to));
        }
        if !from.can_convert_to(to) {
            return Err(CompileError::InvalidConversion { from, to }.into());
        }
        Ok(emit::convert(self.language, snippet, from, to))
    }

    // ---- flow -----------------------------------------------------------

    pub(crate) fn flow_line(&mut self, line: impl Into<String>) {
        self.flows[self.stage.index()].line(line);
    }

    pub(crate) fn indent(&mut self) {
        self.flows[self.stage.index()].indent();
    }

    pub(crate) fn dedent(&mut self) {
        self.flows[self.stage.index()].dedent();
    }

    /// Flush a statement-context snippet: bare names are already
    /// materialized, void snippets become call statements, everything else
    /// is bound to a discard local (WGSL has no expression statements).
    pub(crate) fn flush_statement(&mut self, snippet: &str, ty: NodeType) {
        if snippet.is_empty() || emit::is_bare_ident(snippet) {
            return;
        }
        if ty == NodeType::Void {
            self.flow_line(format!("{snippet};"));
            return;
        }
        match self.language {
            TargetLanguage::Wgsl => {
                let name = self.unique_name(&format!("d{}", self.discard_counter));
                self.discard_counter += 1;
                self.flow_line(format!("let {name} = {snippet};"));
            }
            TargetLanguage::Glsl => self.flow_line(format!("{snippet};")),
        }
    }

    // ---- registration ---------------------------------------------------

    /// Register a uniform binding, reusing any prior registration with the
    /// same hash, and return the call-site reference.
    pub(crate) fn register_uniform(&mut self, id: NodeId) -> Result<String> {
        let NodeKind::Uniform(slot) = &self.graph.node(id).kind else {
            bail!("NodeBuilder: register_uniform() on a non-uniform node");
        };
        let ty = slot.value.node_type();
        if ty == NodeType::Texture {
            let (tex, _) = self.register_texture(id)?;
            return Ok(tex);
        }
        let label = slot.label.clone();
        let hash = self.graph.hash_of(id);
        let name = match self.uniforms.get(hash) {
            Some(u) => u.name.clone(),
            None => {
                let base = label
                    .map(|l| emit::sanitize_ident(&l))
                    .unwrap_or_else(|| format!("u{}", self.uniforms.len()));
                let name = self.unique_name(&base);
                self.uniforms.insert(
                    hash,
                    NodeUniform {
                        name: name.clone(),
                        ty,
                        node: id,
                    },
                );
                name
            }
        };
        Ok(emit::uniform_ref(self.language, &name, ty))
    }

    /// Register a sampled texture + sampler pair.
    pub(crate) fn register_texture(&mut self, id: NodeId) -> Result<(String, String)> {
        let NodeKind::Uniform(slot) = &self.graph.node(id).kind else {
            bail!("TextureNode: expected a texture uniform");
        };
        let label = slot.label.clone();
        let hash = self.graph.hash_of(id);
        if let Some(t) = self.textures.get(hash) {
            return Ok((t.name.clone(), t.sampler_name.clone()));
        }
        let base = label
            .map(|l| emit::sanitize_ident(&l))
            .unwrap_or_else(|| format!("tex{}", self.textures.len()));
        let name = self.unique_name(&base);
        let sampler_name = self.unique_name(&format!("{name}_sampler"));
        self.textures.insert(
            hash,
            NodeTexture {
                name: name.clone(),
                sampler_name: sampler_name.clone(),
                node: id,
            },
        );
        Ok((name, sampler_name))
    }

    /// Register a vertex attribute, deduplicated by name.
    pub(crate) fn register_attribute(&mut self, id: NodeId, name: &str, ty: NodeType) -> String {
        let hash = hash_str("attribute", name);
        if let Some(a) = self.attributes.get(hash) {
            return emit::attribute_ref(self.language, &a.name);
        }
        let sanitized = emit::sanitize_ident(name);
        let location = self.attributes.len();
        self.used_names.insert(sanitized.clone());
        self.attributes.insert(
            hash,
            NodeAttribute {
                name: sanitized.clone(),
                ty,
                location,
                node: id,
            },
        );
        emit::attribute_ref(self.language, &sanitized)
    }

    pub(crate) fn register_builtin(&mut self, builtin: BuiltinVar) -> Result<String> {
        let idx = self.stage.index();
        if !self.builtins[idx].contains(&builtin) {
            self.builtins[idx].push(builtin);
        }
        Ok(emit::builtin_ref(self.language, builtin))
    }

    /// Wrap a vertex-stage value in a varying: declare the interpolated
    /// slot once, build the wrapped node under vertex stage, and return the
    /// reference for the current stage.
    pub(crate) fn build_varying_of(
        &mut self,
        inner: NodeId,
        ty: NodeType,
        label: Option<&str>,
    ) -> Result<String> {
        if self.stage == ShaderStage::Compute {
            bail!("NodeBuilder: varyings are not available in compute programs");
        }
        if ty.scalar() == NodeType::Bool {
            bail!("NodeBuilder: boolean values cannot be interpolated across stages");
        }
        if ty.is_matrix() || ty == NodeType::Texture || ty == NodeType::Void {
            bail!("NodeBuilder: '{ty}' values cannot be interpolated across stages");
        }

        let hash = self.graph.hash_of(inner);
        let (name, inserted) = match self.varyings.get(hash) {
            Some(v) => (v.name.clone(), false),
            None => {
                let base = label
                    .map(emit::sanitize_ident)
                    .unwrap_or_else(|| format!("v{}", self.varyings.len()));
                let name = self.unique_name(&base);
                let flat = matches!(ty.scalar(), NodeType::Int | NodeType::UInt);
                self.varyings.insert(
                    hash,
                    NodeVarying {
                        name: name.clone(),
                        ty,
                        node: inner,
                        flat,
                    },
                );
                (name, true)
            }
        };

        if inserted {
            // Cross-stage build: the wrapped value is computed once in the
            // vertex stage and interpolated from there.
            let previous = self.stage;
            self.stage = ShaderStage::Vertex;
            let result = self.build(inner, Some(ty));
            match result {
                Ok(snippet) => {
                    let target = emit::varying_ref(self.language, ShaderStage::Vertex, &name);
                    self.flows[ShaderStage::Vertex.index()].line(format!("{target} = {snippet};"));
                    self.stage = previous;
                }
                Err(e) => {
                    self.stage = previous;
                    return Err(e);
                }
            }
        }

        Ok(emit::varying_ref(self.language, self.stage, &name))
    }

    pub(crate) fn parsed_function(&mut self, id: NodeId) -> Result<Arc<FunctionLayout>> {
        if let Some(layout) = self.cache().function(id) {
            return Ok(layout);
        }
        let graph = self.graph;
        let NodeKind::Function(f) = &graph.node(id).kind else {
            bail!("FunctionCallNode: callee is not a function snippet");
        };
        if f.language != self.language {
            return Err(CompileError::LanguageMismatch {
                declared: f.language.name(),
                target: self.language.name(),
            }
            .into());
        }
        let layout = Arc::new(snippet::parse(f.language, &f.code)?);
        self.cache_mut().set_function(id, layout.clone());
        Ok(layout)
    }

    pub(crate) fn add_code(&mut self, hash: u64, code: String) {
        self.codes.insert(hash, CodeSection { code });
    }

    // ---- locals ---------------------------------------------------------

    pub(crate) fn declare_temp(&mut self, ty: NodeType, snippet: &str) -> String {
        let idx = self.stage.index();
        let name = self.unique_name(&format!("t{}", self.vars[idx].len()));
        self.vars[idx].push(NodeVar {
            name: name.clone(),
            ty,
        });
        let line = emit::temp_decl(self.language, ty, &name, snippet);
        self.flow_line(line);
        name
    }

    /// Declare a mutable local at the top of the current stage's entry
    /// function (hoisted, so assignments inside nested blocks stay in
    /// scope).
    pub(crate) fn declare_property(&mut self, ty: NodeType, label: Option<&str>) -> String {
        let idx = self.stage.index();
        let base = label
            .map(emit::sanitize_ident)
            .unwrap_or_else(|| format!("p{}", self.props[idx].len()));
        let name = self.unique_name(&base);
        self.props[idx].push(NodeVar {
            name: name.clone(),
            ty,
        });
        name
    }

    /// Stable name of a property node in the current stage, declaring it on
    /// first use. Property identity lives on the builder, not the cache, so
    /// isolated sub-builds still resolve the same variable.
    pub(crate) fn property_for(&mut self, id: NodeId, ty: NodeType, label: Option<&str>) -> String {
        let key = (id, self.stage.index());
        if let Some(name) = self.property_names.get(&key) {
            return name.clone();
        }
        let name = self.declare_property(ty, label);
        self.property_names.insert(key, name.clone());
        name
    }

    pub(crate) fn fresh_loop_index(&mut self) -> String {
        let name = self.unique_name(&format!("i{}", self.loop_counter));
        self.loop_counter += 1;
        name
    }

    pub(crate) fn unique_name(&mut self, base: &str) -> String {
        let base = emit::sanitize_ident(base);
        if self.used_names.insert(base.clone()) {
            return base;
        }
        let mut i = 1u32;
        loop {
            let candidate = format!("{base}_{i}");
            if self.used_names.insert(candidate.clone()) {
                return candidate;
            }
            i += 1;
        }
    }

    // ---- metadata -------------------------------------------------------

    pub fn uniform_list(&self) -> Vec<NodeUniform> {
        self.uniforms.items().to_vec()
    }

    pub fn texture_list(&self) -> Vec<NodeTexture> {
        self.textures.items().to_vec()
    }

    pub fn attribute_list(&self) -> Vec<NodeAttribute> {
        self.attributes.items().to_vec()
    }

    pub fn varying_list(&self) -> Vec<NodeVarying> {
        self.varyings.items().to_vec()
    }
}

fn hash_str(discriminator: &str, s: &str) -> u64 {
    let mut h = DefaultHasher::new();
    discriminator.hash(&mut h);
    s.hash(&mut h);
    h.finish()
}
