//! Generators for control flow: statement stacks, conditional chains,
//! counted loops, assignments and context overrides.

use anyhow::{Result, bail};

use crate::builder::NodeBuilder;
use crate::graph::{NodeId, NodeKind};
use crate::types::NodeType;

pub(crate) fn generate_context(b: &mut NodeBuilder, id: NodeId) -> Result<String> {
    let graph = b.graph();
    let NodeKind::Context { inner, overrides } = &graph.node(id).kind else {
        unreachable!()
    };
    let inner = *inner;
    let overrides = overrides.clone();

    b.push_context(&overrides);
    let result = b.build(inner, None);
    b.pop_context();
    result
}

/// Statements flush strictly in insertion order; the optional output node
/// builds last and becomes the stack's value.
pub(crate) fn generate_stack(b: &mut NodeBuilder, id: NodeId) -> Result<String> {
    let graph = b.graph();
    let NodeKind::Stack(data) = &graph.node(id).kind else {
        unreachable!()
    };
    let statements = data.statements.clone();
    let output = data.output;

    for stmt in statements {
        let natural = b.node_type_of(stmt)?;
        let s = b.build(stmt, Some(NodeType::Void))?;
        b.flush_statement(&s, natural);
    }

    match output {
        Some(out) => b.build(out, None),
        None => Ok(String::new()),
    }
}

/// Lower a conditional chain. When any branch carries a value, a property
/// variable is declared up front and every branch assigns into it; void
/// branches flush as bare statements. Elseif chains flatten into
/// `else if` blocks sharing the one property.
pub(crate) fn generate_cond(b: &mut NodeBuilder, id: NodeId) -> Result<String> {
    let out_ty = b.node_type_of(id)?;
    let prop = if out_ty != NodeType::Void {
        Some(b.declare_property(out_ty, None))
    } else {
        None
    };

    let mut link = id;
    let mut first = true;
    loop {
        let graph = b.graph();
        let NodeKind::Cond(data) = &graph.node(link).kind else {
            unreachable!()
        };
        let (cond, then_branch, else_branch) = (data.cond, data.then_branch, data.else_branch);

        let cond_snippet = b.build(cond, Some(NodeType::Bool))?;
        if first {
            b.flow_line(format!("if ({cond_snippet}) {{"));
        } else {
            b.flow_line(format!("}} else if ({cond_snippet}) {{"));
        }
        first = false;

        build_branch(b, then_branch, out_ty, prop.as_deref())?;

        match else_branch {
            None => {
                b.flow_line("}");
                break;
            }
            Some(next) => {
                let is_chain = matches!(b.graph().node(next).kind, NodeKind::Cond(_));
                if is_chain {
                    link = next;
                } else {
                    b.flow_line("} else {");
                    build_branch(b, next, out_ty, prop.as_deref())?;
                    b.flow_line("}");
                    break;
                }
            }
        }
    }

    Ok(prop.unwrap_or_default())
}

/// One branch body, built under an isolated cache so temp naming never
/// leaks between branches.
fn build_branch(
    b: &mut NodeBuilder,
    branch: NodeId,
    out_ty: NodeType,
    prop: Option<&str>,
) -> Result<()> {
    b.indent();
    b.push_cache();
    let branch_ty = b.node_type_of(branch)?;
    let result = (|| -> Result<()> {
        if branch_ty != NodeType::Void {
            let value = b.build(branch, Some(out_ty))?;
            match prop {
                Some(p) => b.flow_line(format!("{p} = {value};")),
                None => b.flush_statement(&value, branch_ty),
            }
        } else {
            let s = b.build(branch, Some(NodeType::Void))?;
            b.flush_statement(&s, NodeType::Void);
        }
        Ok(())
    })();
    b.pop_cache();
    b.dedent();
    result
}

pub(crate) fn generate_loop(b: &mut NodeBuilder, id: NodeId) -> Result<String> {
    let graph = b.graph();
    let NodeKind::Loop(data) = &graph.node(id).kind else {
        unreachable!()
    };
    let (count, body, index) = (data.count, data.body, data.index);

    let count_snippet = b.build(count, Some(NodeType::UInt))?;
    let i = b.fresh_loop_index();
    let header = match b.language {
        crate::types::TargetLanguage::Wgsl => {
            format!("for (var {i}: u32 = 0u; {i} < {count_snippet}; {i} = {i} + 1u) {{")
        }
        crate::types::TargetLanguage::Glsl => {
            format!("for (uint {i} = 0u; {i} < {count_snippet}; {i} = {i} + 1u) {{")
        }
    };
    b.flow_line(header);
    b.indent();
    b.push_cache();
    b.data_mut(index).property_name = Some(i.clone());
    let result = b.build(body, Some(NodeType::Void));
    b.pop_cache();
    b.dedent();
    b.flow_line("}");
    result.map(|_| String::new())
}

pub(crate) fn generate_loop_index(b: &mut NodeBuilder, id: NodeId) -> Result<String> {
    if let Some(name) = b.node_data(id).and_then(|d| d.property_name.clone()) {
        return Ok(name);
    }
    log::error!("Node: loop index referenced outside a loop body.");
    Ok("0u".to_string())
}

pub(crate) fn generate_assign(b: &mut NodeBuilder, id: NodeId) -> Result<String> {
    let graph = b.graph();
    let NodeKind::Assign { target, value } = &graph.node(id).kind else {
        unreachable!()
    };
    let (target, value) = (*target, *value);

    if !matches!(b.graph().node(target).kind, NodeKind::Property { .. }) {
        bail!("StackNode: assignment target must be a property node");
    }
    let target_ty = b.node_type_of(target)?;
    let t = b.build(target, None)?;
    let v = b.build(value, Some(target_ty))?;
    b.flow_line(format!("{t} = {v};"));
    Ok(t)
}
