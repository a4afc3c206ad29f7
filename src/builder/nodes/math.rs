//! Generators for operators, intrinsic math, conversions, swizzles and
//! vector packing.

use anyhow::{Result, anyhow, bail};

use crate::builder::NodeBuilder;
use crate::graph::{NodeId, NodeKind, Operator};
use crate::types::{self, NodeType, TargetLanguage};

pub(crate) fn generate_operator(b: &mut NodeBuilder, id: NodeId) -> Result<String> {
    let graph = b.graph();
    let NodeKind::Operator { op, lhs, rhs } = &graph.node(id).kind else {
        unreachable!()
    };
    let (op, lhs, rhs) = (*op, *lhs, *rhs);

    if op.is_logical() {
        let a = b.build(lhs, Some(NodeType::Bool))?;
        let c = b.build(rhs, Some(NodeType::Bool))?;
        return Ok(format!("({a} {} {c})", op.token()));
    }

    let lt = b.node_type_of(lhs)?;
    let rt = b.node_type_of(rhs)?;
    let common = types::widen(lt, rt)
        .ok_or_else(|| anyhow!("NodeBuilder: incompatible operand types '{lt}' and '{rt}'"))?;

    if op.is_comparison() {
        if !common.is_scalar() {
            bail!("NodeBuilder: comparison operands must be scalar, got '{common}'");
        }
        let a = b.build(lhs, Some(common))?;
        let c = b.build(rhs, Some(common))?;
        return Ok(format!("({a} {} {c})", op.token()));
    }

    // Matrix operands keep their natural types; everything else is coerced
    // to the widened common type.
    let (a, c) = if lt.is_matrix() || rt.is_matrix() {
        (b.build(lhs, None)?, b.build(rhs, None)?)
    } else {
        (b.build(lhs, Some(common))?, b.build(rhs, Some(common))?)
    };

    // GLSL restricts `%` to integers; floats use mod().
    if op == Operator::Rem
        && b.language == TargetLanguage::Glsl
        && common.scalar() == NodeType::Float
    {
        return Ok(format!("mod({a}, {c})"));
    }

    Ok(format!("({a} {} {c})", op.token()))
}

pub(crate) fn generate_math(b: &mut NodeBuilder, id: NodeId) -> Result<String> {
    let graph = b.graph();
    let NodeKind::Math { f, args } = &graph.node(id).kind else {
        unreachable!()
    };
    let (f, args) = (*f, args.clone());
    if args.len() != f.arity() {
        bail!(
            "NodeBuilder: {:?} expects {} argument(s), got {}",
            f,
            f.arity(),
            args.len()
        );
    }

    let built: Vec<String> = match f {
        // Unary intrinsics take their argument as-is.
        _ if f.arity() == 1 => vec![b.build(args[0], None)?],
        // Everything else is coerced to the widened common type so the
        // overloads resolve consistently in both languages.
        _ => {
            let mut common = b.node_type_of(args[0])?;
            for arg in &args[1..] {
                let t = b.node_type_of(*arg)?;
                common = types::widen(common, t)
                    .ok_or_else(|| anyhow!("NodeBuilder: incompatible operand types '{common}' and '{t}'"))?;
            }
            let mut out = Vec::with_capacity(args.len());
            for arg in &args {
                out.push(b.build(*arg, Some(common))?);
            }
            out
        }
    };

    Ok(format!("{}({})", f.name_in(b.language), built.join(", ")))
}

pub(crate) fn generate_convert(b: &mut NodeBuilder, id: NodeId) -> Result<String> {
    let graph = b.graph();
    let NodeKind::Convert { inner, to } = &graph.node(id).kind else {
        unreachable!()
    };
    // The inner build adapts to the target type; the node's natural type is
    // already `to`, so no further formatting happens outside.
    b.build(*inner, Some(*to))
}

pub(crate) fn generate_swizzle(b: &mut NodeBuilder, id: NodeId) -> Result<String> {
    let graph = b.graph();
    let NodeKind::Swizzle { inner, pattern } = &graph.node(id).kind else {
        unreachable!()
    };
    let (inner, pattern) = (*inner, pattern.clone());

    if pattern.is_empty() || pattern.len() > 4 || !pattern.chars().all(|c| "xyzw".contains(c)) {
        bail!("NodeBuilder: invalid swizzle pattern '{pattern}'");
    }
    let inner_ty = b.node_type_of(inner)?;
    let width = inner_ty.component_count();
    for c in pattern.chars() {
        let idx = "xyzw".find(c).unwrap() as u32;
        if idx >= width {
            bail!("NodeBuilder: swizzle '{pattern}' reads component '{c}' of a '{inner_ty}' value");
        }
    }

    let s = b.build(inner, None)?;
    let base = if crate::builder::emit::is_bare_ident(&s) {
        s
    } else {
        format!("({s})")
    };
    Ok(format!("{base}.{pattern}"))
}

pub(crate) fn generate_join(b: &mut NodeBuilder, id: NodeId) -> Result<String> {
    let graph = b.graph();
    let NodeKind::Join { parts } = &graph.node(id).kind else {
        unreachable!()
    };
    let parts = parts.clone();
    let out_ty = b.node_type_of(id)?;

    let mut built = Vec::with_capacity(parts.len());
    for part in parts {
        let count = b.node_type_of(part)?.component_count();
        let float_ty = NodeType::with_components(NodeType::Float, count)
            .ok_or_else(|| anyhow!("NodeBuilder: join parts must be scalars or vectors"))?;
        built.push(b.build(part, Some(float_ty))?);
    }

    Ok(format!(
        "{}({})",
        out_ty.name_in(b.language),
        built.join(", ")
    ))
}
