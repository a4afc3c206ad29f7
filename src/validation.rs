//! Shader validation using the naga library.

use anyhow::{Context, Result, anyhow};

/// Validate WGSL source code using naga's parser.
///
/// # Arguments
/// * `source` - The WGSL source code to validate
///
/// # Returns
/// The parsed naga Module on success, or an error with detailed information
/// on failure.
pub fn validate_wgsl(source: &str) -> Result<naga::Module> {
    naga::front::wgsl::parse_str(source)
        .map_err(|e| anyhow!("WGSL validation failed:\n{}", format_naga_error(source, &e)))
}

/// Validate WGSL and provide context about which program generated it.
pub fn validate_wgsl_with_context(source: &str, context: &str) -> Result<naga::Module> {
    validate_wgsl(source).with_context(|| format!("{} generated invalid WGSL", context))
}

/// Parse and validate one GLSL stage source with naga's GLSL frontend.
pub fn validate_glsl(source: &str, stage: crate::types::ShaderStage) -> Result<naga::Module> {
    let shader_stage = match stage {
        crate::types::ShaderStage::Vertex => naga::ShaderStage::Vertex,
        crate::types::ShaderStage::Fragment => naga::ShaderStage::Fragment,
        crate::types::ShaderStage::Compute => naga::ShaderStage::Compute,
    };

    let mut parser = naga::front::glsl::Frontend::default();
    let options = naga::front::glsl::Options {
        stage: shader_stage,
        defines: Default::default(),
    };

    let module = parser
        .parse(&options, source)
        .map_err(|e| anyhow!("GLSL parse failed: {e:?}"))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| anyhow!("GLSL validation failed: {e:?}"))?;

    Ok(module)
}

/// Format a naga parse error with source context for better error messages.
fn format_naga_error(source: &str, error: &naga::front::wgsl::ParseError) -> String {
    let mut output = String::new();

    output.push_str(&format!("  {}\n", error));
    output.push_str("\nGenerated WGSL:\n---\n");
    for (line_num, line) in source.lines().enumerate() {
        output.push_str(&format!("{:4} | {}\n", line_num + 1, line));
    }
    output.push_str("---\n");

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ShaderStage;

    #[test]
    fn test_valid_wgsl() {
        let source = r#"
@vertex
fn vs_main(@location(0) position: vec3f) -> @builtin(position) vec4f {
    return vec4f(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4f {
    return vec4f(1.0, 0.0, 0.0, 1.0);
}
"#;
        assert!(validate_wgsl(source).is_ok());
    }

    #[test]
    fn test_invalid_wgsl_syntax() {
        let source = "fn invalid() -> { return vec4f(1.0); }"; // Missing type
        assert!(validate_wgsl(source).is_err());
    }

    #[test]
    fn test_validate_with_context() {
        let source = "invalid wgsl";
        let result = validate_wgsl_with_context(source, "test program");
        assert!(result.is_err());
        let err_msg = format!("{:#}", result.unwrap_err());
        assert!(err_msg.contains("test program"));
    }

    #[test]
    fn test_valid_glsl_fragment() {
        let source = r#"#version 450

layout(location = 0) out vec4 fragColor;

void main() {
    fragColor = vec4(1.0, 0.0, 1.0, 1.0);
}
"#;
        assert!(validate_glsl(source, ShaderStage::Fragment).is_ok());
    }
}
