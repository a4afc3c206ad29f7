//! Declaration tokenizer for GLSL snippets.
//!
//! Recognized shape: `[precision] returnType name ( paramList ) { body }`,
//! with parameters `[const] [in|out|inout] [precision] type [count] name`.

use crate::error::CompileError;
use crate::snippet::{FunctionLayout, ParamDecl, Qualifier, is_ident, map_type, split_header};

const PARSER: &str = "GlslNodeParser";
const LANGUAGE: &str = "GLSL";

fn malformed() -> CompileError {
    CompileError::MalformedSnippet {
        parser: PARSER,
        language: LANGUAGE,
    }
}

fn is_precision(tok: &str) -> bool {
    matches!(tok, "highp" | "mediump" | "lowp")
}

pub fn parse(code: &str) -> Result<FunctionLayout, CompileError> {
    let (header, decl) = split_header(code);

    let open = decl.find('(').ok_or_else(malformed)?;
    let close = matching_paren(&decl, open).ok_or_else(malformed)?;

    // Body must open right after the parameter list.
    match decl[close + 1..].trim_start().chars().next() {
        Some('{') => {}
        _ => return Err(malformed()),
    }

    // `[precision] type name` before the parameter list.
    let mut head: Vec<&str> = decl[..open].split_whitespace().collect();
    let name = head.pop().ok_or_else(malformed)?;
    if !is_ident(name) {
        return Err(malformed());
    }
    let ty_text = head.pop().ok_or_else(malformed)?;
    if !is_type_token(ty_text) {
        return Err(malformed());
    }
    let precision = match head.as_slice() {
        [] => None,
        [p] if is_precision(p) => Some((*p).to_string()),
        _ => return Err(malformed()),
    };

    let mut inputs = Vec::new();
    for raw in split_params(&decl[open + 1..close]) {
        inputs.push(parse_param(raw)?);
    }

    Ok(FunctionLayout {
        name: name.to_string(),
        return_type_text: ty_text.to_string(),
        return_type: map_type(ty_text),
        precision,
        inputs,
        header,
        declaration: decl,
    })
}

fn is_type_token(tok: &str) -> bool {
    // Either a known value type or a user-declared struct name.
    map_type(tok).is_some() || is_ident(tok)
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

fn split_params(list: &str) -> Vec<&str> {
    let trimmed = list.trim();
    if trimmed.is_empty() || trimmed == "void" {
        return Vec::new();
    }
    trimmed.split(',').map(str::trim).collect()
}

fn parse_param(raw: &str) -> Result<ParamDecl, CompileError> {
    let mut qualifier = None;
    let mut is_const = false;
    let mut ty_text: Option<String> = None;
    let mut count: Option<u32> = None;
    let mut name: Option<String> = None;

    for tok in raw.split_whitespace() {
        match tok {
            "const" if ty_text.is_none() => is_const = true,
            "in" if ty_text.is_none() => qualifier = Some(Qualifier::In),
            "out" if ty_text.is_none() => qualifier = Some(Qualifier::Out),
            "inout" if ty_text.is_none() => qualifier = Some(Qualifier::InOut),
            p if is_precision(p) && ty_text.is_none() => {}
            tok if ty_text.is_none() => {
                let (base, n) = split_array_suffix(tok)?;
                if !is_type_token(base) {
                    return Err(malformed());
                }
                ty_text = Some(base.to_string());
                count = n;
            }
            tok if name.is_none() => {
                let (base, n) = split_array_suffix(tok)?;
                if !is_ident(base) {
                    return Err(malformed());
                }
                name = Some(base.to_string());
                if n.is_some() {
                    count = n;
                }
            }
            _ => return Err(malformed()),
        }
    }

    let (ty_text, name) = match (ty_text, name) {
        (Some(t), Some(n)) => (t, n),
        _ => return Err(malformed()),
    };
    let ty = map_type(&ty_text);
    Ok(ParamDecl {
        qualifier,
        is_const,
        ty_text,
        ty,
        count,
        name,
    })
}

/// Split a `name[3]` / `float[3]` token into the base and the count.
fn split_array_suffix(tok: &str) -> Result<(&str, Option<u32>), CompileError> {
    match tok.find('[') {
        None => Ok((tok, None)),
        Some(start) => {
            let end = tok.find(']').ok_or_else(malformed)?;
            if end < start || !tok[end + 1..].is_empty() {
                return Err(malformed());
            }
            let n: u32 = tok[start + 1..end].trim().parse().map_err(|_| malformed())?;
            Ok((&tok[..start], Some(n)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeType;

    #[test]
    fn parses_simple_declaration() {
        let layout = parse("vec3 add(vec3 a, vec3 b) { return a + b; }").unwrap();
        assert_eq!(layout.name, "add");
        assert_eq!(layout.return_type_text, "vec3");
        assert_eq!(layout.return_type, Some(NodeType::Vec3));
        assert_eq!(layout.inputs.len(), 2);
        assert_eq!(layout.inputs[0].name, "a");
        assert_eq!(layout.inputs[0].ty, Some(NodeType::Vec3));
        assert_eq!(layout.inputs[1].name, "b");
    }

    #[test]
    fn parses_qualifiers_and_precision() {
        let layout =
            parse("highp float remap(const in float x, inout vec2 range) { return x; }").unwrap();
        assert_eq!(layout.precision.as_deref(), Some("highp"));
        assert!(layout.inputs[0].is_const);
        assert_eq!(layout.inputs[0].qualifier, Some(Qualifier::In));
        assert_eq!(layout.inputs[1].qualifier, Some(Qualifier::InOut));
    }

    #[test]
    fn parses_array_counts() {
        let layout = parse("float poly(float coeffs[3], float x) { return x; }").unwrap();
        assert_eq!(layout.inputs[0].count, Some(3));
        assert_eq!(layout.inputs[0].name, "coeffs");
        assert_eq!(layout.inputs[1].count, None);
    }

    #[test]
    fn missing_paren_is_malformed() {
        let err = parse("vec3 add(vec3 a, vec3 b { return a + b; }").unwrap_err();
        assert_eq!(err.to_string(), "GlslNodeParser: Function is not valid GLSL code.");
    }

    #[test]
    fn missing_body_is_malformed() {
        assert!(parse("vec3 add(vec3 a, vec3 b);").is_err());
    }

    #[test]
    fn header_is_hoisted() {
        let layout = parse(
            "const float PI = 3.14159265;\n#pragma main\nfloat tau(float x) { return x * PI * 2.0; }",
        )
        .unwrap();
        assert_eq!(layout.header.as_deref(), Some("const float PI = 3.14159265;"));
        assert!(layout.declaration.starts_with("float tau"));
    }
}
