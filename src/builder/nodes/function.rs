//! Generators for foreign snippets: function declarations, raw code blocks
//! and call sites.

use anyhow::{Result, bail};

use crate::builder::NodeBuilder;
use crate::error::CompileError;
use crate::graph::{NodeId, NodeKind};
use crate::snippet::substitute_keyword;
use crate::types::NodeType;

/// A function node built directly registers its declaration and produces no
/// value (useful in include lists).
pub(crate) fn generate_function(b: &mut NodeBuilder, id: NodeId) -> Result<String> {
    register_function_decl(b, id)?;
    Ok(String::new())
}

pub(crate) fn generate_code(b: &mut NodeBuilder, id: NodeId) -> Result<String> {
    let graph = b.graph();
    let NodeKind::Code(code) = &graph.node(id).kind else {
        unreachable!()
    };
    if code.language != b.language {
        return Err(CompileError::LanguageMismatch {
            declared: code.language.name(),
            target: b.language.name(),
        }
        .into());
    }
    let includes = code.includes.clone();
    let text = code.code.clone();

    for include in includes {
        b.build(include, Some(NodeType::Void))?;
    }
    let hash = b.graph().hash_of(id);
    b.add_code(hash, text);
    Ok(String::new())
}

pub(crate) fn generate_call(b: &mut NodeBuilder, id: NodeId) -> Result<String> {
    let graph = b.graph();
    let NodeKind::Call { function, args } = &graph.node(id).kind else {
        unreachable!()
    };
    let function = *function;
    let args = args.clone();

    let layout = b.parsed_function(function)?;
    let fn_name = register_function_decl(b, function)?;

    let mut built = Vec::with_capacity(layout.inputs.len());
    for (i, input) in layout.inputs.iter().enumerate() {
        let arg = args
            .iter()
            .find(|a| a.name.as_deref() == Some(input.name.as_str()))
            .or_else(|| match args.get(i) {
                Some(a) if a.name.is_none() => Some(a),
                _ => None,
            })
            .ok_or_else(|| CompileError::UnresolvedInput {
                kind: "FunctionCallNode",
                name: input.name.clone(),
            })?;
        built.push(b.build(arg.node, input.ty)?);
    }

    Ok(format!("{fn_name}({})", built.join(", ")))
}

/// Emit the snippet's code once per program: includes first, then header
/// code and the declaration with keyword nodes substituted in.
pub(crate) fn register_function_decl(b: &mut NodeBuilder, id: NodeId) -> Result<String> {
    let layout = b.parsed_function(id)?;

    let graph = b.graph();
    let NodeKind::Function(snippet) = &graph.node(id).kind else {
        bail!("FunctionCallNode: callee is not a function snippet");
    };
    let includes = snippet.includes.clone();
    let keywords = snippet.keywords.clone();

    for include in includes {
        b.build(include, Some(NodeType::Void))?;
    }

    let mut declaration = layout.declaration.clone();
    let mut header = layout.header.clone();
    for (keyword, node) in keywords {
        let replacement = b.build(node, None)?;
        declaration = substitute_keyword(&declaration, &keyword, &replacement);
        if let Some(h) = header.take() {
            header = Some(substitute_keyword(&h, &keyword, &replacement));
        }
    }

    let code = match header {
        Some(h) => format!("{h}\n\n{declaration}"),
        None => declaration,
    };
    let hash = b.graph().hash_of(id);
    b.add_code(hash, code);
    Ok(layout.name.clone())
}
