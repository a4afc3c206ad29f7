//! Language-specific text emission: type spellings, declarations, value
//! conversions and stage entry points.
//!
//! Everything here is pure string assembly over the builder's registries;
//! emission order always follows registration order so output is
//! deterministic.

use crate::builder::NodeBuilder;
use crate::graph::BuiltinVar;
use crate::types::{NodeType, ShaderStage, TargetLanguage};

pub(crate) fn type_name(language: TargetLanguage, ty: NodeType) -> &'static str {
    ty.name_in(language)
}

fn canon(ty: NodeType) -> NodeType {
    if ty == NodeType::Color { NodeType::Vec3 } else { ty }
}

/// Host-shareable type for uniform block fields (bool is not
/// host-shareable; it travels as u32).
pub(crate) fn host_type(ty: NodeType) -> NodeType {
    match canon(ty) {
        NodeType::Bool => NodeType::UInt,
        other => other,
    }
}

pub(crate) fn is_bare_ident(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        && s.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
}

fn paren(s: &str) -> String {
    if is_bare_ident(s) || (s.starts_with('(') && s.ends_with(')')) {
        s.to_string()
    } else {
        format!("({s})")
    }
}

/// Zero-value literal of a type.
pub(crate) fn zero_literal(language: TargetLanguage, ty: NodeType) -> String {
    let ty = canon(ty);
    match ty {
        NodeType::Bool => "false".to_string(),
        NodeType::Int => match language {
            TargetLanguage::Wgsl => "0i".to_string(),
            TargetLanguage::Glsl => "0".to_string(),
        },
        NodeType::UInt => "0u".to_string(),
        NodeType::Float => "0.0".to_string(),
        NodeType::Void | NodeType::Texture => String::new(),
        NodeType::Mat3 | NodeType::Mat4 => match language {
            TargetLanguage::Wgsl => format!("{}()", type_name(language, ty)),
            TargetLanguage::Glsl => format!("{}(0.0)", type_name(language, ty)),
        },
        vec => {
            let scalar_zero = zero_literal(language, vec.scalar());
            format!("{}({scalar_zero})", type_name(language, vec))
        }
    }
}

fn scalar_zero(language: TargetLanguage, base: NodeType) -> &'static str {
    match (base, language) {
        (NodeType::Float, _) => "0.0",
        (NodeType::Int, TargetLanguage::Wgsl) => "0i",
        (NodeType::Int, TargetLanguage::Glsl) => "0",
        (NodeType::UInt, _) => "0u",
        _ => "0.0",
    }
}

fn scalar_one(language: TargetLanguage, base: NodeType) -> &'static str {
    match (base, language) {
        (NodeType::Float, _) => "1.0",
        (NodeType::Int, TargetLanguage::Wgsl) => "1i",
        (NodeType::Int, TargetLanguage::Glsl) => "1",
        (NodeType::UInt, _) => "1u",
        _ => "1.0",
    }
}

fn scalar_cast(language: TargetLanguage, snippet: &str, from: NodeType, to: NodeType) -> String {
    if from == to {
        return snippet.to_string();
    }
    if to == NodeType::Bool {
        return format!("({snippet} != {})", scalar_zero(language, from));
    }
    if from == NodeType::Bool {
        let one = scalar_one(language, to);
        let zero = scalar_zero(language, to);
        return match language {
            TargetLanguage::Wgsl => format!("select({zero}, {one}, {snippet})"),
            TargetLanguage::Glsl => format!("({snippet} ? {one} : {zero})"),
        };
    }
    format!("{}({snippet})", type_name(language, to))
}

/// Adapt a snippet from its natural type to the requested one. Legality is
/// checked by the caller ([`NodeType::can_convert_to`]); this function is
/// total over the legal pairs. Widening pads with zeros and a trailing one
/// for the fourth component; narrowing swizzle-truncates.
pub(crate) fn convert(
    language: TargetLanguage,
    snippet: &str,
    from: NodeType,
    to: NodeType,
) -> String {
    let from = canon(from);
    let to = canon(to);
    if from == to {
        return snippet.to_string();
    }

    let (fc, tc) = (from.component_count(), to.component_count());
    let (fb, tb) = (from.scalar(), to.scalar());

    if fc == 1 && tc == 1 {
        return scalar_cast(language, snippet, fb, tb);
    }

    if fc == 1 {
        let s = scalar_cast(language, snippet, fb, tb);
        return match tc {
            4 => format!(
                "{}({s}, {s}, {s}, {})",
                type_name(language, to),
                scalar_one(language, tb)
            ),
            _ => format!("{}({s})", type_name(language, to)),
        };
    }

    if tc == 1 {
        let x = format!("{}.x", paren(snippet));
        return scalar_cast(language, &x, fb, tb);
    }

    if fc == tc {
        // Same shape, different scalar base.
        return format!("{}({snippet})", type_name(language, to));
    }

    if fc > tc {
        let sw = &"xyzw"[..tc as usize];
        let s = format!("{}.{sw}", paren(snippet));
        return if fb == tb {
            s
        } else {
            format!("{}({s})", type_name(language, to))
        };
    }

    // Widen: align the scalar base at the source count, then pad.
    let s = if fb == tb {
        snippet.to_string()
    } else {
        let same_count = NodeType::with_components(tb, fc).unwrap_or(to);
        format!("{}({snippet})", type_name(language, same_count))
    };
    let zero = scalar_zero(language, tb);
    let one = scalar_one(language, tb);
    let target = type_name(language, to);
    match (fc, tc) {
        (2, 3) => format!("{target}({s}, {zero})"),
        (2, 4) => format!("{target}({s}, {zero}, {one})"),
        (3, 4) => format!("{target}({s}, {one})"),
        _ => format!("{target}({s})"),
    }
}

pub(crate) fn temp_decl(
    language: TargetLanguage,
    ty: NodeType,
    name: &str,
    snippet: &str,
) -> String {
    match language {
        TargetLanguage::Wgsl => format!("let {name}: {} = {snippet};", type_name(language, ty)),
        TargetLanguage::Glsl => format!("{} {name} = {snippet};", type_name(language, ty)),
    }
}

pub(crate) fn property_decl(language: TargetLanguage, ty: NodeType, name: &str) -> String {
    match language {
        TargetLanguage::Wgsl => format!("var {name}: {};", type_name(language, ty)),
        TargetLanguage::Glsl => format!("{} {name};", type_name(language, ty)),
    }
}

/// Reference to a registered uniform at a call site.
pub(crate) fn uniform_ref(language: TargetLanguage, name: &str, ty: NodeType) -> String {
    let member = match language {
        TargetLanguage::Wgsl => format!("uniforms.{name}"),
        TargetLanguage::Glsl => name.to_string(),
    };
    // Bool travels as u32 in the block and is re-materialized here.
    if canon(ty) == NodeType::Bool {
        format!("({member} != 0u)")
    } else {
        member
    }
}

pub(crate) fn attribute_ref(language: TargetLanguage, name: &str) -> String {
    match language {
        TargetLanguage::Wgsl => format!("in.{name}"),
        TargetLanguage::Glsl => name.to_string(),
    }
}

pub(crate) fn varying_ref(language: TargetLanguage, stage: ShaderStage, name: &str) -> String {
    match language {
        TargetLanguage::Wgsl => match stage {
            ShaderStage::Vertex => format!("out.{name}"),
            _ => format!("in.{name}"),
        },
        TargetLanguage::Glsl => name.to_string(),
    }
}

pub(crate) fn position_ref(language: TargetLanguage) -> &'static str {
    match language {
        TargetLanguage::Wgsl => "out.position",
        TargetLanguage::Glsl => "gl_Position",
    }
}

pub(crate) fn builtin_ref(language: TargetLanguage, b: BuiltinVar) -> String {
    match (language, b) {
        (TargetLanguage::Wgsl, BuiltinVar::VertexIndex) => "in.vertex_index".to_string(),
        (TargetLanguage::Wgsl, BuiltinVar::InstanceIndex) => "in.instance_index".to_string(),
        (TargetLanguage::Wgsl, BuiltinVar::FragCoord) => "in.position".to_string(),
        (TargetLanguage::Wgsl, BuiltinVar::GlobalInvocationId) => "gid".to_string(),
        (TargetLanguage::Glsl, BuiltinVar::VertexIndex) => "uint(gl_VertexIndex)".to_string(),
        (TargetLanguage::Glsl, BuiltinVar::InstanceIndex) => "uint(gl_InstanceIndex)".to_string(),
        (TargetLanguage::Glsl, BuiltinVar::FragCoord) => "gl_FragCoord".to_string(),
        (TargetLanguage::Glsl, BuiltinVar::GlobalInvocationId) => {
            "gl_GlobalInvocationID".to_string()
        }
    }
}

pub(crate) fn sample_expr(
    language: TargetLanguage,
    stage: ShaderStage,
    texture: &str,
    sampler: &str,
    uv: &str,
) -> String {
    match language {
        TargetLanguage::Wgsl => match stage {
            // Implicit-derivative sampling only exists in fragment shaders.
            ShaderStage::Fragment => format!("textureSample({texture}, {sampler}, {uv})"),
            _ => format!("textureSampleLevel({texture}, {sampler}, {uv}, 0.0)"),
        },
        TargetLanguage::Glsl => match stage {
            ShaderStage::Fragment => format!("texture({texture}, {uv})"),
            _ => format!("textureLod({texture}, {uv}, 0.0)"),
        },
    }
}

// ---- program text assembly ----------------------------------------------

/// Declarations shared by every WGSL stage of a program: uniform block,
/// texture bindings, IO structs and registered code blocks.
pub(crate) fn wgsl_common(b: &NodeBuilder, render: bool) -> String {
    let mut out = String::new();

    if !b.uniforms.is_empty() {
        out.push_str("struct NodeUniforms {\n");
        for u in b.uniforms.items() {
            out.push_str(&format!(
                "    {}: {},\n",
                u.name,
                type_name(TargetLanguage::Wgsl, host_type(u.ty))
            ));
        }
        out.push_str("};\n\n@group(0) @binding(0)\nvar<uniform> uniforms: NodeUniforms;\n\n");
    }

    for (i, t) in b.textures.items().iter().enumerate() {
        let tex_binding = (i as u32) * 2;
        let samp_binding = tex_binding + 1;
        out.push_str(&format!(
            "@group(1) @binding({tex_binding})\nvar {}: texture_2d<f32>;\n\n",
            t.name
        ));
        out.push_str(&format!(
            "@group(1) @binding({samp_binding})\nvar {}: sampler;\n\n",
            t.sampler_name
        ));
    }

    if render {
        if wgsl_has_vertex_input(b) {
            out.push_str("struct VertexInput {\n");
            for a in b.attributes.items() {
                out.push_str(&format!(
                    "    @location({}) {}: {},\n",
                    a.location,
                    a.name,
                    type_name(TargetLanguage::Wgsl, canon(a.ty))
                ));
            }
            for bi in &b.builtins[ShaderStage::Vertex.index()] {
                match bi {
                    BuiltinVar::VertexIndex => {
                        out.push_str("    @builtin(vertex_index) vertex_index: u32,\n");
                    }
                    BuiltinVar::InstanceIndex => {
                        out.push_str("    @builtin(instance_index) instance_index: u32,\n");
                    }
                    _ => {}
                }
            }
            out.push_str("};\n\n");
        }

        out.push_str("struct VertexOutput {\n    @builtin(position) position: vec4f,\n");
        for (i, v) in b.varyings.items().iter().enumerate() {
            let interpolate = if v.flat { "@interpolate(flat) " } else { "" };
            out.push_str(&format!(
                "    @location({i}) {interpolate}{}: {},\n",
                v.name,
                type_name(TargetLanguage::Wgsl, canon(v.ty))
            ));
        }
        out.push_str("};\n\n");
    }

    for code in b.codes.items() {
        out.push_str(&code.code);
        out.push_str("\n\n");
    }

    out
}

pub(crate) fn wgsl_has_vertex_input(b: &NodeBuilder) -> bool {
    !b.attributes.is_empty() || !b.builtins[ShaderStage::Vertex.index()].is_empty()
}

/// Hoisted property declarations at the top of a stage's entry body.
fn props_block(b: &NodeBuilder, stage: ShaderStage) -> String {
    let mut out = String::new();
    for p in &b.props[stage.index()] {
        out.push_str("    ");
        out.push_str(&property_decl(b.language, p.ty, &p.name));
        out.push('\n');
    }
    out
}

pub(crate) fn wgsl_vertex_entry(b: &NodeBuilder) -> String {
    let params = if wgsl_has_vertex_input(b) {
        "in: VertexInput"
    } else {
        ""
    };
    format!(
        "@vertex\nfn vs_main({params}) -> VertexOutput {{\n    var out: VertexOutput;\n{}{}    return out;\n}}\n",
        props_block(b, ShaderStage::Vertex),
        b.flows[ShaderStage::Vertex.index()].render(1)
    )
}

pub(crate) fn wgsl_fragment_entry(b: &NodeBuilder) -> String {
    format!(
        "@fragment\nfn fs_main(in: VertexOutput) -> @location(0) vec4f {{\n{}{}}}\n",
        props_block(b, ShaderStage::Fragment),
        b.flows[ShaderStage::Fragment.index()].render(1)
    )
}

pub(crate) fn wgsl_compute_entry(b: &NodeBuilder, workgroup_size: [u32; 3]) -> String {
    let [x, y, z] = workgroup_size;
    format!(
        "@compute @workgroup_size({x}, {y}, {z})\nfn cs_main(@builtin(global_invocation_id) gid: vec3u) {{\n{}{}}}\n",
        props_block(b, ShaderStage::Compute),
        b.flows[ShaderStage::Compute.index()].render(1)
    )
}

/// One standalone GLSL compilation unit for a stage.
pub(crate) fn glsl_stage_source(b: &NodeBuilder, stage: ShaderStage, workgroup_size: [u32; 3]) -> String {
    let mut out = String::from("#version 450\n\n");

    if !b.uniforms.is_empty() {
        out.push_str("layout(std140) uniform NodeUniforms {\n");
        for u in b.uniforms.items() {
            out.push_str(&format!(
                "    {} {};\n",
                type_name(TargetLanguage::Glsl, host_type(u.ty)),
                u.name
            ));
        }
        out.push_str("};\n\n");
    }

    for (i, t) in b.textures.items().iter().enumerate() {
        out.push_str(&format!(
            "layout(binding = {}) uniform sampler2D {};\n",
            i + 1,
            t.name
        ));
    }
    if !b.textures.is_empty() {
        out.push('\n');
    }

    match stage {
        ShaderStage::Vertex => {
            for a in b.attributes.items() {
                out.push_str(&format!(
                    "layout(location = {}) in {} {};\n",
                    a.location,
                    type_name(TargetLanguage::Glsl, canon(a.ty)),
                    a.name
                ));
            }
            for (i, v) in b.varyings.items().iter().enumerate() {
                let flat = if v.flat { "flat " } else { "" };
                out.push_str(&format!(
                    "layout(location = {i}) {flat}out {} {};\n",
                    type_name(TargetLanguage::Glsl, canon(v.ty)),
                    v.name
                ));
            }
        }
        ShaderStage::Fragment => {
            for (i, v) in b.varyings.items().iter().enumerate() {
                let flat = if v.flat { "flat " } else { "" };
                out.push_str(&format!(
                    "layout(location = {i}) {flat}in {} {};\n",
                    type_name(TargetLanguage::Glsl, canon(v.ty)),
                    v.name
                ));
            }
            out.push_str("layout(location = 0) out vec4 fragColor;\n");
        }
        ShaderStage::Compute => {
            let [x, y, z] = workgroup_size;
            out.push_str(&format!(
                "layout(local_size_x = {x}, local_size_y = {y}, local_size_z = {z}) in;\n"
            ));
        }
    }
    out.push('\n');

    for code in b.codes.items() {
        out.push_str(&code.code);
        out.push_str("\n\n");
    }

    out.push_str("void main() {\n");
    out.push_str(&props_block(b, stage));
    out.push_str(&b.flows[stage.index()].render(1));
    out.push_str("}\n");
    out
}

/// Sanitize a label into a valid identifier.
pub(crate) fn sanitize_ident(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() || out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}
