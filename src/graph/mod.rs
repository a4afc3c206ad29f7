//! The node graph: an arena of typed expression nodes plus the fluent
//! construction API.
//!
//! Graphs are built once and may be shared across many compiled programs;
//! building borrows the graph immutably, so a graph can never change shape
//! mid-compile. The arena owns node ids — there are no process-global
//! counters.

pub mod node;

use anyhow::{Context as _, Result, anyhow, bail};

use crate::error::CompileError;
use crate::frame::FrameInfo;
use crate::program::GeometryLayout;
use crate::snippet;
use crate::types::{self, NodeType, ShaderStage, TargetLanguage, Value};

pub use node::{
    BuiltinVar, CallArg, CodeSnippet, CondData, FunctionSnippet, LoopData, MathFn, Node, NodeId,
    NodeKind, NodeUpdater, Operator, StackData, UniformSlot, UpdateCadence, UpdateRule,
};

const TYPE_RECURSION_LIMIT: u32 = 64;

/// Arena of nodes addressed by [`NodeId`].
#[derive(Debug, Default)]
pub struct NodeGraph {
    nodes: Vec<Node>,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert a node and return its handle.
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(kind));
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Dedup hash of a node (identity unless a shared key was set).
    pub fn hash_of(&self, id: NodeId) -> u64 {
        self.node(id).uniform_hash(id)
    }

    // ---- constants ------------------------------------------------------

    pub fn constant(&mut self, value: Value) -> NodeId {
        self.add_node(NodeKind::Constant(value))
    }

    pub fn float(&mut self, v: f32) -> NodeId {
        self.constant(Value::Float(v))
    }

    pub fn int(&mut self, v: i32) -> NodeId {
        self.constant(Value::Int(v))
    }

    pub fn uint(&mut self, v: u32) -> NodeId {
        self.constant(Value::UInt(v))
    }

    pub fn boolean(&mut self, v: bool) -> NodeId {
        self.constant(Value::Bool(v))
    }

    pub fn vec2(&mut self, x: f32, y: f32) -> NodeId {
        self.constant(Value::Vec2(glam::Vec2::new(x, y)))
    }

    pub fn vec3(&mut self, x: f32, y: f32, z: f32) -> NodeId {
        self.constant(Value::Vec3(glam::Vec3::new(x, y, z)))
    }

    pub fn vec4(&mut self, x: f32, y: f32, z: f32, w: f32) -> NodeId {
        self.constant(Value::Vec4(glam::Vec4::new(x, y, z, w)))
    }

    pub fn color(&mut self, r: f32, g: f32, b: f32) -> NodeId {
        self.constant(Value::Color(glam::Vec3::new(r, g, b)))
    }

    // ---- inputs ---------------------------------------------------------

    pub fn uniform(&mut self, value: Value) -> NodeId {
        self.add_node(NodeKind::Uniform(UniformSlot { value, label: None }))
    }

    pub fn uniform_labeled(&mut self, label: impl Into<String>, value: Value) -> NodeId {
        self.add_node(NodeKind::Uniform(UniformSlot {
            value,
            label: Some(label.into()),
        }))
    }

    /// Frame-time uniform (seconds), refreshed once per frame.
    pub fn time(&mut self) -> NodeId {
        let id = self.uniform_labeled("time", Value::Float(0.0));
        self.set_update(id, UpdateCadence::Frame, UpdateRule::Time);
        id
    }

    /// Seconds since the previous frame, refreshed once per frame.
    pub fn delta_time(&mut self) -> NodeId {
        let id = self.uniform_labeled("delta_time", Value::Float(0.0));
        self.set_update(id, UpdateCadence::Frame, UpdateRule::DeltaTime);
        id
    }

    /// Opaque handle to an externally-owned texture, bound as a sampled
    /// texture + sampler pair.
    pub fn texture(&mut self, handle: u64) -> NodeId {
        self.uniform(Value::Texture(handle))
    }

    pub fn texture_labeled(&mut self, label: impl Into<String>, handle: u64) -> NodeId {
        self.uniform_labeled(label, Value::Texture(handle))
    }

    pub fn attribute(&mut self, name: impl Into<String>, ty: NodeType) -> NodeId {
        self.add_node(NodeKind::Attribute {
            name: name.into(),
            ty: Some(ty),
        })
    }

    /// Attribute whose type is taken from the geometry layout at build time.
    pub fn attribute_auto(&mut self, name: impl Into<String>) -> NodeId {
        self.add_node(NodeKind::Attribute {
            name: name.into(),
            ty: None,
        })
    }

    pub fn varying(&mut self, inner: NodeId) -> NodeId {
        self.add_node(NodeKind::Varying { inner, label: None })
    }

    pub fn varying_labeled(&mut self, label: impl Into<String>, inner: NodeId) -> NodeId {
        self.add_node(NodeKind::Varying {
            inner,
            label: Some(label.into()),
        })
    }

    pub fn builtin(&mut self, b: BuiltinVar) -> NodeId {
        self.add_node(NodeKind::Builtin(b))
    }

    pub fn property(&mut self, ty: NodeType) -> NodeId {
        self.add_node(NodeKind::Property { ty, label: None })
    }

    pub fn property_labeled(&mut self, label: impl Into<String>, ty: NodeType) -> NodeId {
        self.add_node(NodeKind::Property {
            ty,
            label: Some(label.into()),
        })
    }

    // ---- operators and math --------------------------------------------

    pub fn op(&mut self, op: Operator, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.add_node(NodeKind::Operator { op, lhs, rhs })
    }

    pub fn add(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.op(Operator::Add, a, b)
    }

    pub fn sub(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.op(Operator::Sub, a, b)
    }

    pub fn mul(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.op(Operator::Mul, a, b)
    }

    pub fn div(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.op(Operator::Div, a, b)
    }

    pub fn rem(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.op(Operator::Rem, a, b)
    }

    pub fn eq(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.op(Operator::Equal, a, b)
    }

    pub fn ne(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.op(Operator::NotEqual, a, b)
    }

    pub fn lt(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.op(Operator::Less, a, b)
    }

    pub fn le(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.op(Operator::LessEqual, a, b)
    }

    pub fn gt(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.op(Operator::Greater, a, b)
    }

    pub fn ge(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.op(Operator::GreaterEqual, a, b)
    }

    pub fn logical_and(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.op(Operator::And, a, b)
    }

    pub fn logical_or(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.op(Operator::Or, a, b)
    }

    pub fn math(&mut self, f: MathFn, args: &[NodeId]) -> NodeId {
        self.add_node(NodeKind::Math {
            f,
            args: args.to_vec(),
        })
    }

    pub fn abs(&mut self, x: NodeId) -> NodeId {
        self.math(MathFn::Abs, &[x])
    }

    pub fn floor(&mut self, x: NodeId) -> NodeId {
        self.math(MathFn::Floor, &[x])
    }

    pub fn fract(&mut self, x: NodeId) -> NodeId {
        self.math(MathFn::Fract, &[x])
    }

    pub fn sqrt(&mut self, x: NodeId) -> NodeId {
        self.math(MathFn::Sqrt, &[x])
    }

    pub fn sin(&mut self, x: NodeId) -> NodeId {
        self.math(MathFn::Sin, &[x])
    }

    pub fn cos(&mut self, x: NodeId) -> NodeId {
        self.math(MathFn::Cos, &[x])
    }

    pub fn normalize(&mut self, x: NodeId) -> NodeId {
        self.math(MathFn::Normalize, &[x])
    }

    pub fn length(&mut self, x: NodeId) -> NodeId {
        self.math(MathFn::Length, &[x])
    }

    pub fn min(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.math(MathFn::Min, &[a, b])
    }

    pub fn max(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.math(MathFn::Max, &[a, b])
    }

    pub fn pow(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.math(MathFn::Pow, &[a, b])
    }

    pub fn dot(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.math(MathFn::Dot, &[a, b])
    }

    pub fn cross(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.math(MathFn::Cross, &[a, b])
    }

    pub fn mix(&mut self, a: NodeId, b: NodeId, t: NodeId) -> NodeId {
        self.math(MathFn::Mix, &[a, b, t])
    }

    pub fn clamp(&mut self, x: NodeId, lo: NodeId, hi: NodeId) -> NodeId {
        self.math(MathFn::Clamp, &[x, lo, hi])
    }

    pub fn smoothstep(&mut self, e0: NodeId, e1: NodeId, x: NodeId) -> NodeId {
        self.math(MathFn::Smoothstep, &[e0, e1, x])
    }

    pub fn convert(&mut self, inner: NodeId, to: NodeType) -> NodeId {
        self.add_node(NodeKind::Convert { inner, to })
    }

    pub fn swizzle(&mut self, inner: NodeId, pattern: impl Into<String>) -> NodeId {
        self.add_node(NodeKind::Swizzle {
            inner,
            pattern: pattern.into(),
        })
    }

    pub fn join(&mut self, parts: &[NodeId]) -> NodeId {
        self.add_node(NodeKind::Join {
            parts: parts.to_vec(),
        })
    }

    pub fn sample(&mut self, texture: NodeId, uv: NodeId) -> NodeId {
        self.add_node(NodeKind::Sample { texture, uv })
    }

    pub fn context(
        &mut self,
        inner: NodeId,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> NodeId {
        self.add_node(NodeKind::Context {
            inner,
            overrides: vec![(key.into(), value)],
        })
    }

    // ---- foreign snippets ----------------------------------------------

    pub fn wgsl_fn(&mut self, code: impl Into<String>) -> NodeId {
        self.add_node(NodeKind::Function(FunctionSnippet {
            code: code.into(),
            language: TargetLanguage::Wgsl,
            includes: Vec::new(),
            keywords: Vec::new(),
        }))
    }

    pub fn glsl_fn(&mut self, code: impl Into<String>) -> NodeId {
        self.add_node(NodeKind::Function(FunctionSnippet {
            code: code.into(),
            language: TargetLanguage::Glsl,
            includes: Vec::new(),
            keywords: Vec::new(),
        }))
    }

    pub fn wgsl_code(&mut self, code: impl Into<String>) -> NodeId {
        self.add_node(NodeKind::Code(CodeSnippet {
            code: code.into(),
            language: TargetLanguage::Wgsl,
            includes: Vec::new(),
        }))
    }

    pub fn glsl_code(&mut self, code: impl Into<String>) -> NodeId {
        self.add_node(NodeKind::Code(CodeSnippet {
            code: code.into(),
            language: TargetLanguage::Glsl,
            includes: Vec::new(),
        }))
    }

    /// Register another node to be emitted before this snippet.
    pub fn snippet_include(&mut self, snippet: NodeId, include: NodeId) {
        match &mut self.node_mut(snippet).kind {
            NodeKind::Function(f) => f.includes.push(include),
            NodeKind::Code(c) => c.includes.push(include),
            other => {
                log::error!("NodeGraph: snippet_include() on a non-snippet node ({other:?})");
            }
        }
    }

    /// Declare a keyword node: its build output replaces whole-word
    /// occurrences of `keyword` in the snippet body.
    pub fn function_keyword(&mut self, function: NodeId, keyword: impl Into<String>, node: NodeId) {
        match &mut self.node_mut(function).kind {
            NodeKind::Function(f) => f.keywords.push((keyword.into(), node)),
            other => {
                log::error!("NodeGraph: function_keyword() on a non-function node ({other:?})");
            }
        }
    }

    /// Call a function snippet with positional arguments.
    pub fn call(&mut self, function: NodeId, args: &[NodeId]) -> NodeId {
        self.add_node(NodeKind::Call {
            function,
            args: args
                .iter()
                .map(|&node| CallArg { name: None, node })
                .collect(),
        })
    }

    /// Call a function snippet with named arguments.
    pub fn call_named(&mut self, function: NodeId, args: &[(&str, NodeId)]) -> NodeId {
        self.add_node(NodeKind::Call {
            function,
            args: args
                .iter()
                .map(|(name, node)| CallArg {
                    name: Some((*name).to_string()),
                    node: *node,
                })
                .collect(),
        })
    }

    // ---- control flow ---------------------------------------------------

    pub fn stack(&mut self) -> NodeId {
        self.add_node(NodeKind::Stack(StackData::default()))
    }

    fn stack_data_mut(&mut self, stack: NodeId) -> &mut StackData {
        match &mut self.node_mut(stack).kind {
            NodeKind::Stack(data) => data,
            other => panic!("expected a stack node, got {other:?}"),
        }
    }

    /// Buffer a statement; its side effects are flushed when the stack
    /// builds, even if its value is unused.
    pub fn stack_add(&mut self, stack: NodeId, statement: NodeId) {
        let data = self.stack_data_mut(stack);
        data.statements.push(statement);
        data.open_cond = None;
    }

    /// Sugar for buffering an assignment statement.
    pub fn stack_assign(&mut self, stack: NodeId, target: NodeId, value: NodeId) {
        let assign = self.add_node(NodeKind::Assign { target, value });
        self.stack_add(stack, assign);
    }

    /// Terminal output value of the stack.
    pub fn stack_set_output(&mut self, stack: NodeId, output: NodeId) {
        self.stack_data_mut(stack).output = Some(output);
    }

    /// Open a conditional chain.
    pub fn stack_if(&mut self, stack: NodeId, cond: NodeId, then_branch: NodeId) -> NodeId {
        let cond_id = self.add_node(NodeKind::Cond(CondData {
            cond,
            then_branch,
            else_branch: None,
        }));
        let data = self.stack_data_mut(stack);
        data.statements.push(cond_id);
        data.open_cond = Some(cond_id);
        cond_id
    }

    /// Chain an `else if` onto the open conditional.
    pub fn stack_else_if(
        &mut self,
        stack: NodeId,
        cond: NodeId,
        then_branch: NodeId,
    ) -> Result<NodeId> {
        let open = match self.stack_data_mut(stack).open_cond {
            Some(open) => open,
            None => {
                return Err(CompileError::NoOpenConditional { operation: "else_if" }.into());
            }
        };
        let cond_id = self.add_node(NodeKind::Cond(CondData {
            cond,
            then_branch,
            else_branch: None,
        }));
        match &mut self.node_mut(open).kind {
            NodeKind::Cond(data) => data.else_branch = Some(cond_id),
            other => panic!("open conditional is not a cond node: {other:?}"),
        }
        self.stack_data_mut(stack).open_cond = Some(cond_id);
        Ok(cond_id)
    }

    /// Attach the terminal branch and close the chain.
    pub fn stack_else(&mut self, stack: NodeId, body: NodeId) -> Result<()> {
        let open = match self.stack_data_mut(stack).open_cond {
            Some(open) => open,
            None => {
                return Err(CompileError::NoOpenConditional { operation: "else" }.into());
            }
        };
        match &mut self.node_mut(open).kind {
            NodeKind::Cond(data) => data.else_branch = Some(body),
            other => panic!("open conditional is not a cond node: {other:?}"),
        }
        self.stack_data_mut(stack).open_cond = None;
        Ok(())
    }

    /// Standalone conditional value, outside any stack.
    pub fn cond(&mut self, cond: NodeId, then_branch: NodeId, else_branch: NodeId) -> NodeId {
        self.add_node(NodeKind::Cond(CondData {
            cond,
            then_branch,
            else_branch: Some(else_branch),
        }))
    }

    /// Counted loop over a u32 index. Returns `(loop, body stack, index)`;
    /// buffer statements into the body stack and reference the index node
    /// inside it.
    pub fn loop_n(&mut self, count: NodeId) -> (NodeId, NodeId, NodeId) {
        let body = self.stack();
        let index = self.add_node(NodeKind::LoopIndex);
        let lp = self.add_node(NodeKind::Loop(LoopData { count, body, index }));
        (lp, body, index)
    }

    // ---- per-node metadata ---------------------------------------------

    /// Deliberate sharing: nodes with equal shared keys collapse to one
    /// binding inside one builder.
    pub fn set_shared_key(&mut self, id: NodeId, key: impl Into<String>) {
        self.node_mut(id).shared_key = Some(key.into());
    }

    pub fn set_stage(&mut self, id: NodeId, stage: ShaderStage) {
        self.node_mut(id).stage = Some(stage);
    }

    pub fn set_global(&mut self, id: NodeId, global: bool) {
        self.node_mut(id).global = Some(global);
    }

    pub fn set_update(&mut self, id: NodeId, cadence: UpdateCadence, rule: UpdateRule) {
        self.node_mut(id).update = Some(NodeUpdater { cadence, rule });
    }

    pub fn set_update_before(&mut self, id: NodeId, cadence: UpdateCadence, rule: UpdateRule) {
        self.node_mut(id).update_before = Some(NodeUpdater { cadence, rule });
    }

    // ---- uniform values -------------------------------------------------

    pub fn uniform_value(&self, id: NodeId) -> Option<&Value> {
        match &self.node(id).kind {
            NodeKind::Uniform(slot) => Some(&slot.value),
            _ => None,
        }
    }

    pub fn set_uniform_value(&mut self, id: NodeId, value: Value) {
        match &mut self.node_mut(id).kind {
            NodeKind::Uniform(slot) => slot.value = value,
            other => log::error!("NodeGraph: set_uniform_value() on a non-uniform node ({other:?})"),
        }
    }

    pub(crate) fn run_update(&mut self, id: NodeId, info: &FrameInfo, before: bool) {
        let node = &mut self.nodes[id.index()];
        let Node {
            kind,
            update,
            update_before,
            ..
        } = node;
        let hook = if before { update_before } else { update };
        let Some(hook) = hook else { return };
        if let NodeKind::Uniform(slot) = kind {
            hook.apply(&mut slot.value, info);
        }
    }

    // ---- traversal ------------------------------------------------------

    /// Direct children of a node, in build order.
    pub(crate) fn children(&self, id: NodeId) -> Vec<NodeId> {
        match &self.node(id).kind {
            NodeKind::Constant(_)
            | NodeKind::Uniform(_)
            | NodeKind::Attribute { .. }
            | NodeKind::Builtin(_)
            | NodeKind::Property { .. }
            | NodeKind::LoopIndex => Vec::new(),
            NodeKind::Varying { inner, .. }
            | NodeKind::Convert { inner, .. }
            | NodeKind::Swizzle { inner, .. }
            | NodeKind::Context { inner, .. } => vec![*inner],
            NodeKind::Operator { lhs, rhs, .. } => vec![*lhs, *rhs],
            NodeKind::Math { args, .. } => args.clone(),
            NodeKind::Join { parts } => parts.clone(),
            NodeKind::Sample { texture, uv } => vec![*texture, *uv],
            NodeKind::Function(f) => {
                let mut out = f.includes.clone();
                out.extend(f.keywords.iter().map(|(_, n)| *n));
                out
            }
            NodeKind::Code(c) => c.includes.clone(),
            NodeKind::Call { function, args } => {
                let mut out = vec![*function];
                out.extend(args.iter().map(|a| a.node));
                out
            }
            NodeKind::Stack(data) => {
                let mut out = data.statements.clone();
                out.extend(data.output);
                out
            }
            NodeKind::Cond(data) => {
                let mut out = vec![data.cond, data.then_branch];
                out.extend(data.else_branch);
                out
            }
            NodeKind::Loop(data) => vec![data.count, data.body],
            NodeKind::Assign { target, value } => vec![*target, *value],
        }
    }

    // ---- typing ---------------------------------------------------------

    /// Semantic type of a node. `geometry` resolves attributes declared
    /// without an explicit type.
    pub fn node_type(&self, id: NodeId, geometry: Option<&GeometryLayout>) -> Result<NodeType> {
        self.node_type_inner(id, geometry, 0)
    }

    fn node_type_inner(
        &self,
        id: NodeId,
        geometry: Option<&GeometryLayout>,
        depth: u32,
    ) -> Result<NodeType> {
        if depth > TYPE_RECURSION_LIMIT {
            bail!("NodeGraph: type recursion limit exceeded (cycle in graph?)");
        }
        let ty = |child: NodeId| self.node_type_inner(child, geometry, depth + 1);
        Ok(match &self.node(id).kind {
            NodeKind::Constant(v) => v.node_type(),
            NodeKind::Uniform(slot) => slot.value.node_type(),
            NodeKind::Attribute { name, ty } => match ty {
                Some(t) => *t,
                None => geometry
                    .and_then(|g| g.find(name))
                    .map(|a| a.ty)
                    .unwrap_or(NodeType::Float),
            },
            NodeKind::Varying { inner, .. } => ty(*inner)?,
            NodeKind::Builtin(b) => b.node_type(),
            NodeKind::Property { ty, .. } => *ty,
            NodeKind::Operator { op, lhs, rhs } => {
                if op.is_comparison() || op.is_logical() {
                    NodeType::Bool
                } else {
                    let (a, b) = (ty(*lhs)?, ty(*rhs)?);
                    types::widen(a, b).ok_or_else(|| {
                        anyhow!("NodeBuilder: incompatible operand types '{a}' and '{b}'")
                    })?
                }
            }
            NodeKind::Math { f, args } => {
                if args.len() != f.arity() {
                    bail!(
                        "NodeBuilder: {:?} expects {} argument(s), got {}",
                        f,
                        f.arity(),
                        args.len()
                    );
                }
                match f {
                    MathFn::Length | MathFn::Distance | MathFn::Dot => NodeType::Float,
                    MathFn::Cross => NodeType::Vec3,
                    _ => {
                        let mut out = ty(args[0])?;
                        for arg in &args[1..] {
                            let t = ty(*arg)?;
                            out = types::widen(out, t).ok_or_else(|| {
                                anyhow!("NodeBuilder: incompatible operand types '{out}' and '{t}'")
                            })?;
                        }
                        out
                    }
                }
            }
            NodeKind::Convert { to, .. } => *to,
            NodeKind::Swizzle { inner, pattern } => {
                let base = ty(*inner)?.scalar();
                NodeType::with_components(base, pattern.len() as u32).ok_or_else(|| {
                    anyhow!("NodeBuilder: invalid swizzle pattern '{pattern}'")
                })?
            }
            NodeKind::Join { parts } => {
                let mut count = 0;
                for p in parts {
                    count += ty(*p)?.component_count();
                }
                NodeType::with_components(NodeType::Float, count).ok_or_else(|| {
                    anyhow!("NodeBuilder: join produces {count} components, expected 1..=4")
                })?
            }
            NodeKind::Sample { .. } => NodeType::Vec4,
            NodeKind::Context { inner, .. } => ty(*inner)?,
            NodeKind::Function(_) | NodeKind::Code(_) => NodeType::Void,
            NodeKind::Call { function, .. } => {
                let layout = self.function_layout(*function)?;
                layout.return_type.ok_or_else(|| {
                    anyhow!(
                        "FunctionNode: return type '{}' has no graph equivalent",
                        layout.return_type_text
                    )
                })?
            }
            NodeKind::Stack(data) => match data.output {
                Some(out) => ty(out)?,
                None => NodeType::Void,
            },
            NodeKind::Cond(data) => {
                let then_ty = ty(data.then_branch)?;
                match data.else_branch {
                    Some(els) => {
                        let else_ty = ty(els)?;
                        // Widening tie-break: keep the if-branch's type unless
                        // the else branch is strictly wider.
                        if else_ty.component_count() > then_ty.component_count() {
                            else_ty
                        } else {
                            then_ty
                        }
                    }
                    None => then_ty,
                }
            }
            NodeKind::Loop(_) => NodeType::Void,
            NodeKind::LoopIndex => NodeType::UInt,
            NodeKind::Assign { target, .. } => ty(*target)?,
        })
    }

    /// Parse (without caching) the declaration of a function snippet node.
    pub fn function_layout(&self, function: NodeId) -> Result<snippet::FunctionLayout> {
        match &self.node(function).kind {
            NodeKind::Function(f) => snippet::parse(f.language, &f.code)
                .with_context(|| "while parsing a function snippet declaration"),
            other => bail!("FunctionCallNode: callee is not a function snippet ({other:?})"),
        }
    }
}
