//! Declaration tokenizer for WGSL snippets.
//!
//! Recognized shape: `fn name ( paramList ) [-> returnType] { body }`, with
//! parameters `name: type`. Pointer parameters (`ptr<function, T>`) map to
//! the inout qualifier; `array<T, N>` parameters carry an element count.

use crate::error::CompileError;
use crate::snippet::{FunctionLayout, ParamDecl, Qualifier, is_ident, map_type, split_header};

const PARSER: &str = "WgslNodeParser";
const LANGUAGE: &str = "WGSL";

fn malformed() -> CompileError {
    CompileError::MalformedSnippet {
        parser: PARSER,
        language: LANGUAGE,
    }
}

pub fn parse(code: &str) -> Result<FunctionLayout, CompileError> {
    let (header, decl) = split_header(code);

    let fn_pos = find_fn_keyword(&decl).ok_or_else(malformed)?;
    let after_fn = &decl[fn_pos + 2..];
    let open_rel = after_fn.find('(').ok_or_else(malformed)?;
    let name = after_fn[..open_rel].trim();
    if !is_ident(name) {
        return Err(malformed());
    }

    let open = fn_pos + 2 + open_rel;
    let close = matching_paren(&decl, open).ok_or_else(malformed)?;

    // Optional `-> type`, then the body.
    let tail = decl[close + 1..].trim_start();
    let (return_type_text, body_tail) = if let Some(rest) = tail.strip_prefix("->") {
        let brace = rest.find('{').ok_or_else(malformed)?;
        (rest[..brace].trim().to_string(), rest[brace..].trim_start())
    } else {
        ("void".to_string(), tail)
    };
    if !body_tail.starts_with('{') {
        return Err(malformed());
    }
    if return_type_text.is_empty() {
        return Err(malformed());
    }

    let mut inputs = Vec::new();
    for raw in split_params(&decl[open + 1..close]) {
        inputs.push(parse_param(raw)?);
    }

    Ok(FunctionLayout {
        name: name.to_string(),
        return_type: map_type(&return_type_text),
        return_type_text,
        precision: None,
        inputs,
        header,
        declaration: decl,
    })
}

/// First `fn` keyword at a word boundary.
fn find_fn_keyword(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut from = 0;
    while let Some(rel) = s[from..].find("fn") {
        let i = from + rel;
        let before_ok = i == 0 || !(bytes[i - 1].is_ascii_alphanumeric() || bytes[i - 1] == b'_');
        let end = i + 2;
        let after_ok = end < bytes.len() && bytes[end].is_ascii_whitespace();
        if before_ok && after_ok {
            return Some(i);
        }
        from = i + 2;
    }
    None
}

fn matching_paren(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a parameter list at top-level commas, tracking template brackets.
fn split_params(list: &str) -> Vec<&str> {
    let trimmed = list.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in trimmed.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            ',' if depth == 0 => {
                out.push(trimmed[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(trimmed[start..].trim());
    out
}

fn parse_param(raw: &str) -> Result<ParamDecl, CompileError> {
    let colon = raw.find(':').ok_or_else(malformed)?;
    let name = raw[..colon].trim();
    if !is_ident(name) {
        return Err(malformed());
    }
    let mut ty_text = raw[colon + 1..].trim().to_string();

    let mut qualifier = None;
    let mut count = None;

    // `ptr<function, T>` parameters are read-write views of a local.
    if let Some(inner) = strip_template(&ty_text, "ptr") {
        let mut parts = split_params(inner).into_iter();
        let space = parts.next().ok_or_else(malformed)?;
        let pointee = parts.next().ok_or_else(malformed)?;
        if space != "function" {
            return Err(malformed());
        }
        qualifier = Some(Qualifier::InOut);
        ty_text = pointee.to_string();
    }

    if let Some(inner) = strip_template(&ty_text, "array") {
        let mut parts = split_params(inner).into_iter();
        let elem = parts.next().ok_or_else(malformed)?;
        let n = parts.next().ok_or_else(malformed)?;
        count = Some(n.trim().parse::<u32>().map_err(|_| malformed())?);
        ty_text = elem.to_string();
    }

    let ty = map_type(&ty_text);
    Ok(ParamDecl {
        qualifier,
        is_const: false,
        ty_text,
        ty,
        count,
        name: name.to_string(),
    })
}

/// `head<inner>` -> `inner`, when the text is exactly that template form.
fn strip_template<'a>(text: &'a str, head: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(head)?.trim_start();
    let rest = rest.strip_prefix('<')?;
    let rest = rest.strip_suffix('>')?;
    Some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeType;

    #[test]
    fn parses_simple_declaration() {
        let layout = parse("fn add(a: vec3f, b: vec3f) -> vec3f { return a + b; }").unwrap();
        assert_eq!(layout.name, "add");
        assert_eq!(layout.return_type, Some(NodeType::Vec3));
        assert_eq!(layout.inputs.len(), 2);
        assert_eq!(layout.inputs[0].name, "a");
        assert_eq!(layout.inputs[0].ty, Some(NodeType::Vec3));
    }

    #[test]
    fn parses_void_and_templates() {
        let layout = parse("fn scatter(p: ptr<function, vec2<f32>>, k: array<f32, 4>) { }").unwrap();
        assert_eq!(layout.return_type, Some(NodeType::Void));
        assert_eq!(layout.return_type_text, "void");
        assert_eq!(layout.inputs[0].qualifier, Some(Qualifier::InOut));
        assert_eq!(layout.inputs[0].ty, Some(NodeType::Vec2));
        assert_eq!(layout.inputs[1].count, Some(4));
        assert_eq!(layout.inputs[1].ty, Some(NodeType::Float));
    }

    #[test]
    fn missing_paren_is_malformed() {
        let err = parse("fn add(a: vec3f, b: vec3f -> vec3f { return a + b; }").unwrap_err();
        assert_eq!(err.to_string(), "WgslNodeParser: Function is not valid WGSL code.");
    }

    #[test]
    fn missing_fn_keyword_is_malformed() {
        assert!(parse("vec3 add(vec3 a) { return a; }").is_err());
    }

    #[test]
    fn header_is_hoisted() {
        let layout =
            parse("const TAU: f32 = 6.2831853;\n#pragma main\nfn wrap(x: f32) -> f32 { return x % TAU; }")
                .unwrap();
        assert_eq!(layout.header.as_deref(), Some("const TAU: f32 = 6.2831853;"));
    }
}
