//! Typed compile-failure taxonomy.
//!
//! All fatal kinds abort the whole compile synchronously; no partially
//! generated source is ever handed downstream. Missing geometry attributes
//! are the one recovered case and are handled inline by the builder (warn +
//! typed zero constant), so they do not appear here.

use crate::types::NodeType;

/// Fatal compile errors. Surfaced through `anyhow::Result`; callers can
/// `downcast_ref::<CompileError>()` to match on the variant.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// A foreign snippet's declaration line failed to tokenize.
    #[error("{parser}: Function is not valid {language} code.")]
    MalformedSnippet {
        parser: &'static str,
        language: &'static str,
    },

    /// A call node omits a parameter the callee declares.
    #[error("{kind}: Input '{name}' not found.")]
    UnresolvedInput { kind: &'static str, name: String },

    /// A value conversion outside the widen/narrow/scalar-cast table.
    #[error("NodeBuilder: Cannot convert from '{from}' to '{to}'.")]
    InvalidConversion { from: NodeType, to: NodeType },

    /// A snippet tagged for one language was built for another.
    #[error("FunctionNode: {declared} snippet cannot be built for a {target} program.")]
    LanguageMismatch {
        declared: &'static str,
        target: &'static str,
    },

    /// `else`/`else if` was attached to a stack with no open conditional.
    #[error("StackNode: '{operation}' called with no open conditional chain.")]
    NoOpenConditional { operation: &'static str },

    /// A stage was requested that the program description does not provide
    /// a root for.
    #[error("NodeBuilder: No root node for stage '{stage}'.")]
    MissingStageRoot { stage: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_failure_surface() {
        let e = CompileError::MalformedSnippet {
            parser: "GlslNodeParser",
            language: "GLSL",
        };
        assert_eq!(e.to_string(), "GlslNodeParser: Function is not valid GLSL code.");

        let e = CompileError::UnresolvedInput {
            kind: "FunctionCallNode",
            name: "uv".to_string(),
        };
        assert_eq!(e.to_string(), "FunctionCallNode: Input 'uv' not found.");

        let e = CompileError::InvalidConversion {
            from: NodeType::Mat3,
            to: NodeType::Vec2,
        };
        assert_eq!(
            e.to_string(),
            "NodeBuilder: Cannot convert from 'mat3' to 'vec2'."
        );
    }
}
