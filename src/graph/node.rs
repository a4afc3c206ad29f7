//! Node payloads: the closed set of node kinds plus per-node metadata.
//!
//! Every graph element is one `NodeKind` variant carrying exactly the state
//! that variant needs; shared behavior (typing, hashing, child listing) is
//! implemented as functions over the enum rather than through inheritance.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::frame::FrameInfo;
use crate::types::{NodeType, ShaderStage, TargetLanguage, Value};

/// Handle to a node inside a [`crate::graph::NodeGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// How often a node's CPU-side value refresh runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateCadence {
    /// At most once per frame id.
    Frame,
    /// At most once per (render id, frame id) pair.
    Render,
    /// Unconditionally on every call; intended for per-draw-call values.
    Object,
}

/// What an update hook does to the node's uniform value when it fires.
pub enum UpdateRule {
    /// Accumulated frame time in seconds.
    Time,
    /// Seconds since the previous frame.
    DeltaTime,
    /// The current frame id as a u32.
    FrameId,
    /// Caller-supplied refresh.
    Custom(Box<dyn Fn(&mut Value, &FrameInfo)>),
}

impl std::fmt::Debug for UpdateRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateRule::Time => f.write_str("Time"),
            UpdateRule::DeltaTime => f.write_str("DeltaTime"),
            UpdateRule::FrameId => f.write_str("FrameId"),
            UpdateRule::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// An update hook: cadence plus the rule applied when it fires.
#[derive(Debug)]
pub struct NodeUpdater {
    pub cadence: UpdateCadence,
    pub rule: UpdateRule,
}

impl NodeUpdater {
    pub(crate) fn apply(&self, value: &mut Value, info: &FrameInfo) {
        match &self.rule {
            UpdateRule::Time => *value = Value::Float(info.time),
            UpdateRule::DeltaTime => *value = Value::Float(info.delta_time),
            UpdateRule::FrameId => *value = Value::UInt(info.frame_id as u32),
            UpdateRule::Custom(f) => f(value, info),
        }
    }
}

/// Binary operators over graph values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

impl Operator {
    pub fn token(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Rem => "%",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::And => "&&",
            Operator::Or => "||",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Operator::Equal
                | Operator::NotEqual
                | Operator::Less
                | Operator::LessEqual
                | Operator::Greater
                | Operator::GreaterEqual
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, Operator::And | Operator::Or)
    }
}

/// Intrinsic math functions shared by both target languages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MathFn {
    Abs,
    Floor,
    Ceil,
    Fract,
    Sqrt,
    InverseSqrt,
    Sin,
    Cos,
    Tan,
    Exp,
    Exp2,
    Log,
    Log2,
    Sign,
    Normalize,
    Length,
    Min,
    Max,
    Pow,
    Step,
    Dot,
    Cross,
    Distance,
    Reflect,
    Mix,
    Clamp,
    Smoothstep,
}

impl MathFn {
    pub fn arity(self) -> usize {
        match self {
            MathFn::Abs
            | MathFn::Floor
            | MathFn::Ceil
            | MathFn::Fract
            | MathFn::Sqrt
            | MathFn::InverseSqrt
            | MathFn::Sin
            | MathFn::Cos
            | MathFn::Tan
            | MathFn::Exp
            | MathFn::Exp2
            | MathFn::Log
            | MathFn::Log2
            | MathFn::Sign
            | MathFn::Normalize
            | MathFn::Length => 1,
            MathFn::Min
            | MathFn::Max
            | MathFn::Pow
            | MathFn::Step
            | MathFn::Dot
            | MathFn::Cross
            | MathFn::Distance
            | MathFn::Reflect => 2,
            MathFn::Mix | MathFn::Clamp | MathFn::Smoothstep => 3,
        }
    }

    pub fn name_in(self, language: TargetLanguage) -> &'static str {
        match (self, language) {
            (MathFn::InverseSqrt, TargetLanguage::Wgsl) => "inverseSqrt",
            (MathFn::InverseSqrt, TargetLanguage::Glsl) => "inversesqrt",
            (f, _) => match f {
                MathFn::Abs => "abs",
                MathFn::Floor => "floor",
                MathFn::Ceil => "ceil",
                MathFn::Fract => "fract",
                MathFn::Sqrt => "sqrt",
                MathFn::Sin => "sin",
                MathFn::Cos => "cos",
                MathFn::Tan => "tan",
                MathFn::Exp => "exp",
                MathFn::Exp2 => "exp2",
                MathFn::Log => "log",
                MathFn::Log2 => "log2",
                MathFn::Sign => "sign",
                MathFn::Normalize => "normalize",
                MathFn::Length => "length",
                MathFn::Min => "min",
                MathFn::Max => "max",
                MathFn::Pow => "pow",
                MathFn::Step => "step",
                MathFn::Dot => "dot",
                MathFn::Cross => "cross",
                MathFn::Distance => "distance",
                MathFn::Reflect => "reflect",
                MathFn::Mix => "mix",
                MathFn::Clamp => "clamp",
                MathFn::Smoothstep => "smoothstep",
                MathFn::InverseSqrt => unreachable!(),
            },
        }
    }
}

/// Stage-provided built-in values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuiltinVar {
    /// Index of the current vertex. Vertex stage.
    VertexIndex,
    /// Index of the current instance. Vertex stage.
    InstanceIndex,
    /// Window-space fragment coordinate. Fragment stage.
    FragCoord,
    /// Global invocation id. Compute stage.
    GlobalInvocationId,
}

impl BuiltinVar {
    pub fn node_type(self) -> NodeType {
        match self {
            BuiltinVar::VertexIndex | BuiltinVar::InstanceIndex => NodeType::UInt,
            BuiltinVar::FragCoord => NodeType::Vec4,
            BuiltinVar::GlobalInvocationId => NodeType::UVec3,
        }
    }

    /// The only stage this value exists in.
    pub fn stage(self) -> ShaderStage {
        match self {
            BuiltinVar::VertexIndex | BuiltinVar::InstanceIndex => ShaderStage::Vertex,
            BuiltinVar::FragCoord => ShaderStage::Fragment,
            BuiltinVar::GlobalInvocationId => ShaderStage::Compute,
        }
    }
}

/// A uniform slot: CPU-side value bound once per compiled program.
#[derive(Debug)]
pub struct UniformSlot {
    pub value: Value,
    pub label: Option<String>,
}

/// One argument of a function call, matched by name when given, by position
/// otherwise.
#[derive(Clone, Debug)]
pub struct CallArg {
    pub name: Option<String>,
    pub node: NodeId,
}

/// A hand-written foreign function snippet.
#[derive(Debug)]
pub struct FunctionSnippet {
    pub code: String,
    pub language: TargetLanguage,
    /// Nodes whose code must be emitted before this one.
    pub includes: Vec<NodeId>,
    /// Named keyword nodes; the build output of each is substituted into the
    /// snippet body wherever the bare keyword appears as a whole word.
    pub keywords: Vec<(String, NodeId)>,
}

/// A raw code block hoisted verbatim into the generated source.
#[derive(Debug)]
pub struct CodeSnippet {
    pub code: String,
    pub language: TargetLanguage,
    pub includes: Vec<NodeId>,
}

/// Ordered statement buffer with an optional terminal output value.
#[derive(Debug, Default)]
pub struct StackData {
    pub statements: Vec<NodeId>,
    pub output: Option<NodeId>,
    /// Innermost conditional of the currently open if/elseif chain.
    pub open_cond: Option<NodeId>,
}

/// One link of a conditional chain. An elseif chain is a `Cond` whose else
/// branch is itself a `Cond`.
#[derive(Debug)]
pub struct CondData {
    pub cond: NodeId,
    pub then_branch: NodeId,
    pub else_branch: Option<NodeId>,
}

/// Counted loop over a u32 index.
#[derive(Debug)]
pub struct LoopData {
    pub count: NodeId,
    pub body: NodeId,
    pub index: NodeId,
}

/// The closed set of node kinds.
#[derive(Debug)]
pub enum NodeKind {
    Constant(Value),
    Uniform(UniformSlot),
    Attribute {
        name: String,
        /// Declared type; when absent the type is taken from the geometry
        /// layout carried by the builder.
        ty: Option<NodeType>,
    },
    Varying {
        inner: NodeId,
        label: Option<String>,
    },
    Builtin(BuiltinVar),
    /// Declared mutable local, the assignable target of `stack_assign`.
    Property {
        ty: NodeType,
        label: Option<String>,
    },
    Operator {
        op: Operator,
        lhs: NodeId,
        rhs: NodeId,
    },
    Math {
        f: MathFn,
        args: Vec<NodeId>,
    },
    Convert {
        inner: NodeId,
        to: NodeType,
    },
    Swizzle {
        inner: NodeId,
        pattern: String,
    },
    /// Pack scalars/vectors into a wider float vector.
    Join {
        parts: Vec<NodeId>,
    },
    Sample {
        texture: NodeId,
        uv: NodeId,
    },
    /// Scoped ambient overrides for the wrapped subtree.
    Context {
        inner: NodeId,
        overrides: Vec<(String, serde_json::Value)>,
    },
    Function(FunctionSnippet),
    Code(CodeSnippet),
    Call {
        function: NodeId,
        args: Vec<CallArg>,
    },
    Stack(StackData),
    Cond(CondData),
    Loop(LoopData),
    /// The index of the enclosing loop; only valid inside a loop body.
    LoopIndex,
    Assign {
        target: NodeId,
        value: NodeId,
    },
}

impl NodeKind {
    /// Temp-capable kinds materialize a named temporary when their analyzed
    /// consumer count exceeds one.
    pub(crate) fn is_temp(&self) -> bool {
        matches!(
            self,
            NodeKind::Operator { .. }
                | NodeKind::Math { .. }
                | NodeKind::Join { .. }
                | NodeKind::Sample { .. }
                | NodeKind::Call { .. }
        )
    }

    /// Default for the `isGlobal` flag: the value is stable across the whole
    /// program and never re-evaluated per call site.
    pub(crate) fn default_global(&self) -> bool {
        matches!(
            self,
            NodeKind::Constant(_)
                | NodeKind::Uniform(_)
                | NodeKind::Attribute { .. }
                | NodeKind::Varying { .. }
                | NodeKind::Builtin(_)
                | NodeKind::Property { .. }
        )
    }

    /// The stage a kind is pinned to regardless of explicit affinity.
    pub(crate) fn implied_stage(&self) -> Option<ShaderStage> {
        match self {
            NodeKind::Attribute { .. } => Some(ShaderStage::Vertex),
            NodeKind::Builtin(b) => Some(b.stage()),
            _ => None,
        }
    }
}

/// A graph element: kind payload plus cross-cutting metadata.
#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    /// Cache/binding key that may differ from identity to allow deliberate
    /// sharing. Defaults to the node's own id.
    pub shared_key: Option<String>,
    /// Fixed shader-stage affinity, on top of what the kind implies.
    pub stage: Option<ShaderStage>,
    /// Override for the kind's default `isGlobal` flag.
    pub global: Option<bool>,
    pub update: Option<NodeUpdater>,
    pub update_before: Option<NodeUpdater>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            shared_key: None,
            stage: None,
            global: None,
            update: None,
            update_before: None,
        }
    }

    pub fn is_global(&self) -> bool {
        self.global.unwrap_or_else(|| self.kind.default_global())
    }

    /// Effective stage affinity: explicit pin wins over the kind's implied
    /// stage.
    pub fn affinity(&self) -> Option<ShaderStage> {
        self.stage.or_else(|| self.kind.implied_stage())
    }

    /// The dedup hash: identity unless a shared key was set.
    pub fn uniform_hash(&self, self_id: NodeId) -> u64 {
        let mut h = DefaultHasher::new();
        match &self.shared_key {
            Some(key) => {
                1u8.hash(&mut h);
                key.hash(&mut h);
            }
            None => {
                0u8.hash(&mut h);
                self_id.0.hash(&mut h);
            }
        }
        h.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_key_controls_hash() {
        let mut a = Node::new(NodeKind::Constant(Value::Float(1.0)));
        let mut b = Node::new(NodeKind::Constant(Value::Float(1.0)));
        assert_ne!(a.uniform_hash(NodeId(0)), b.uniform_hash(NodeId(1)));

        a.shared_key = Some("shared".to_string());
        b.shared_key = Some("shared".to_string());
        assert_eq!(a.uniform_hash(NodeId(0)), b.uniform_hash(NodeId(1)));
    }

    #[test]
    fn attribute_implies_vertex_stage() {
        let n = Node::new(NodeKind::Attribute {
            name: "uv".to_string(),
            ty: Some(NodeType::Vec2),
        });
        assert_eq!(n.affinity(), Some(ShaderStage::Vertex));

        let mut pinned = Node::new(NodeKind::Constant(Value::Float(0.0)));
        pinned.stage = Some(ShaderStage::Fragment);
        assert_eq!(pinned.affinity(), Some(ShaderStage::Fragment));
    }

    #[test]
    fn math_arity_and_names() {
        assert_eq!(MathFn::Mix.arity(), 3);
        assert_eq!(MathFn::Dot.arity(), 2);
        assert_eq!(MathFn::InverseSqrt.name_in(TargetLanguage::Wgsl), "inverseSqrt");
        assert_eq!(MathFn::InverseSqrt.name_in(TargetLanguage::Glsl), "inversesqrt");
    }
}
