//! Shader-graph compiler: typed expression graphs lowered to textual
//! shader programs.
//!
//! Callers assemble a [`graph::NodeGraph`] once through the fluent
//! construction API, then compile it per program with
//! [`program::compile_program`] — one source string per pipeline stage
//! (vertex/fragment or compute) plus ordered binding metadata for the GPU
//! backend. Output is deterministic: the same graph compiles to
//! byte-identical text every time.
//!
//! Per rendered frame, a [`frame::NodeFrame`] walks the same graph and
//! refreshes the CPU-side values feeding uniform slots; compilation and
//! per-frame refresh are decoupled passes.
//!
//! ```
//! use node_forge_shader_graph::{
//!     GeometryLayout, NodeType, ProgramDesc, TargetLanguage, compile_program,
//!     graph::NodeGraph,
//! };
//!
//! let mut g = NodeGraph::new();
//! let position = g.attribute("position", NodeType::Vec3);
//! let tint = g.uniform_labeled("tint", node_forge_shader_graph::Value::Color(glam::Vec3::ONE));
//!
//! let geometry = GeometryLayout::new().with("position", NodeType::Vec3);
//! let desc = ProgramDesc::render("demo", TargetLanguage::Wgsl, position, tint, geometry);
//! let bundle = compile_program(&g, &desc).unwrap();
//! assert!(bundle.module.unwrap().contains("fn fs_main"));
//! ```

pub mod builder;
pub mod error;
pub mod frame;
pub mod graph;
pub mod program;
pub mod snippet;
pub mod types;
pub mod validation;

pub use builder::{NodeBuilder, NodeCache};
pub use error::CompileError;
pub use frame::{FrameInfo, NodeFrame};
pub use graph::{
    BuiltinVar, MathFn, NodeGraph, NodeId, Operator, UpdateCadence, UpdateRule,
};
pub use program::{
    GeometryAttribute, GeometryLayout, ProgramBundle, ProgramDesc, compile_program,
};
pub use types::{NodeType, ShaderStage, TargetLanguage, Value};
