//! Ingestion of hand-written foreign shader snippets.
//!
//! A snippet is split at an optional `#pragma main` marker into header code
//! (hoisted verbatim) and a declaration + body. Only the declaration line is
//! tokenized; the body stays opaque. The tokenizers are hand-written and
//! return typed errors instead of panicking — they are the most
//! failure-prone, text-slicing part of the crate and are fuzz-tested.

pub mod glsl;
pub mod wgsl;

use crate::error::CompileError;
use crate::types::{NodeType, TargetLanguage};

/// Marker separating hoisted header code from the function declaration.
pub const HEADER_MARKER: &str = "#pragma main";

/// Parameter qualifier recovered from a declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Qualifier {
    In,
    Out,
    InOut,
}

/// One declared parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamDecl {
    pub qualifier: Option<Qualifier>,
    pub is_const: bool,
    /// Type exactly as written.
    pub ty_text: String,
    /// Graph equivalent, when the spelling is a known value type.
    pub ty: Option<NodeType>,
    /// Array element count, for `float x[3]` / `array<f32, 3>` parameters.
    pub count: Option<u32>,
    pub name: String,
}

/// Parsed shape of a snippet: everything the builder needs to emit the code
/// and type-check calls against it.
#[derive(Clone, Debug)]
pub struct FunctionLayout {
    pub name: String,
    pub return_type_text: String,
    pub return_type: Option<NodeType>,
    /// GLSL precision qualifier on the declaration, when present.
    pub precision: Option<String>,
    pub inputs: Vec<ParamDecl>,
    /// Code before the `#pragma main` marker, hoisted verbatim.
    pub header: Option<String>,
    /// Declaration + body, exactly as written.
    pub declaration: String,
}

/// Parse a snippet declaration with the parser family for `language`.
pub fn parse(language: TargetLanguage, code: &str) -> Result<FunctionLayout, CompileError> {
    match language {
        TargetLanguage::Glsl => glsl::parse(code),
        TargetLanguage::Wgsl => wgsl::parse(code),
    }
}

/// Split a snippet at the header marker. Returns `(header, declaration)`.
pub(crate) fn split_header(code: &str) -> (Option<String>, String) {
    match code.find(HEADER_MARKER) {
        Some(pos) => {
            let header = code[..pos].trim();
            let rest = &code[pos + HEADER_MARKER.len()..];
            let header = if header.is_empty() {
                None
            } else {
                Some(header.to_string())
            };
            (header, rest.trim_start().to_string())
        }
        None => (None, code.trim_start().to_string()),
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub(crate) fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(is_ident_char)
}

/// Substitute `replacement` for each whole-word occurrence of `keyword`.
pub fn substitute_keyword(code: &str, keyword: &str, replacement: &str) -> String {
    if keyword.is_empty() {
        return code.to_string();
    }
    let mut out = String::with_capacity(code.len());
    let bytes = code.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if code[i..].starts_with(keyword) {
            let before_ok = i == 0 || !is_ident_char(bytes[i - 1] as char);
            let end = i + keyword.len();
            let after_ok = end >= bytes.len() || !is_ident_char(bytes[end] as char);
            if before_ok && after_ok {
                out.push_str(replacement);
                i = end;
                continue;
            }
        }
        // Advance one full character (the scan above only matches at ASCII
        // boundaries, but the input may contain arbitrary UTF-8).
        let ch_len = code[i..].chars().next().map(char::len_utf8).unwrap_or(1);
        out.push_str(&code[i..i + ch_len]);
        i += ch_len;
    }
    out
}

/// Map a type spelling from either language onto a graph type, tolerating a
/// trailing numeric-precision suffix (`vec3f16`, `float32`).
pub(crate) fn map_type(text: &str) -> Option<NodeType> {
    let direct = |t: &str| -> Option<NodeType> {
        Some(match t {
            "void" => NodeType::Void,
            "bool" => NodeType::Bool,
            "int" | "i32" => NodeType::Int,
            "uint" | "u32" => NodeType::UInt,
            "float" | "f32" | "f16" => NodeType::Float,
            "vec2" | "vec2f" | "vec2<f32>" | "vec2<f16>" => NodeType::Vec2,
            "vec3" | "vec3f" | "vec3<f32>" | "vec3<f16>" => NodeType::Vec3,
            "vec4" | "vec4f" | "vec4<f32>" | "vec4<f16>" => NodeType::Vec4,
            "ivec2" | "vec2i" | "vec2<i32>" => NodeType::IVec2,
            "ivec3" | "vec3i" | "vec3<i32>" => NodeType::IVec3,
            "ivec4" | "vec4i" | "vec4<i32>" => NodeType::IVec4,
            "uvec2" | "vec2u" | "vec2<u32>" => NodeType::UVec2,
            "uvec3" | "vec3u" | "vec3<u32>" => NodeType::UVec3,
            "uvec4" | "vec4u" | "vec4<u32>" => NodeType::UVec4,
            "mat3" | "mat3x3f" | "mat3x3<f32>" => NodeType::Mat3,
            "mat4" | "mat4x4f" | "mat4x4<f32>" => NodeType::Mat4,
            "sampler2D" | "texture_2d<f32>" => NodeType::Texture,
            _ => return None,
        })
    };
    if let Some(ty) = direct(text) {
        return Some(ty);
    }
    // Trailing numeric-precision suffix: strip the digits and retry.
    let stripped = text.trim_end_matches(|c: char| c.is_ascii_digit());
    if stripped.len() < text.len() && !stripped.is_empty() {
        return direct(stripped);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_split() {
        let (header, rest) = split_header("const float K = 2.0;\n#pragma main\nfloat f() { return K; }");
        assert_eq!(header.as_deref(), Some("const float K = 2.0;"));
        assert!(rest.starts_with("float f()"));

        let (header, rest) = split_header("float f() { return 1.0; }");
        assert!(header.is_none());
        assert!(rest.starts_with("float f()"));
    }

    #[test]
    fn keyword_substitution_is_whole_word() {
        let code = "vec3 c = albedo * albedoFactor + x_albedo;";
        let out = substitute_keyword(code, "albedo", "base.rgb");
        assert_eq!(out, "vec3 c = base.rgb * albedoFactor + x_albedo;");
    }

    #[test]
    fn type_mapping_tolerates_precision_suffixes() {
        assert_eq!(map_type("vec3"), Some(NodeType::Vec3));
        assert_eq!(map_type("vec3f"), Some(NodeType::Vec3));
        assert_eq!(map_type("vec3<f32>"), Some(NodeType::Vec3));
        assert_eq!(map_type("float16"), Some(NodeType::Float));
        assert_eq!(map_type("MyStruct"), None);
    }
}
