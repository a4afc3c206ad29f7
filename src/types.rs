//! Core type definitions shared by the graph, the builder and the emitters.

use serde::{Deserialize, Serialize};

/// One phase of the GPU pipeline, with its own code buffer during a build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

impl ShaderStage {
    pub const ALL: [ShaderStage; 3] = [
        ShaderStage::Vertex,
        ShaderStage::Fragment,
        ShaderStage::Compute,
    ];

    /// Stable index for per-stage storage.
    pub(crate) fn index(self) -> usize {
        match self {
            ShaderStage::Vertex => 0,
            ShaderStage::Fragment => 1,
            ShaderStage::Compute => 2,
        }
    }
}

/// Target shading language of a compiled program.
///
/// The language selects the snippet parser family and the spelling of types
/// and declarations; the graph itself is language-independent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetLanguage {
    Wgsl,
    Glsl,
}

impl TargetLanguage {
    pub fn name(self) -> &'static str {
        match self {
            TargetLanguage::Wgsl => "WGSL",
            TargetLanguage::Glsl => "GLSL",
        }
    }
}

/// Semantic value type of a node. Semantic, not textual: the per-language
/// spelling comes from [`TargetLanguage`] + [`NodeType::wgsl`]/[`NodeType::glsl`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Void,
    Bool,
    Int,
    UInt,
    Float,
    Vec2,
    Vec3,
    Vec4,
    IVec2,
    IVec3,
    IVec4,
    UVec2,
    UVec3,
    UVec4,
    Mat3,
    Mat4,
    /// RGB color; behaves as a 3-component float vector in generated code.
    Color,
    Texture,
}

impl NodeType {
    /// Number of scalar components. Used by the Cond widening tie-break and
    /// by widen/narrow conversions.
    pub fn component_count(self) -> u32 {
        match self {
            NodeType::Void | NodeType::Texture => 0,
            NodeType::Bool | NodeType::Int | NodeType::UInt | NodeType::Float => 1,
            NodeType::Vec2 | NodeType::IVec2 | NodeType::UVec2 => 2,
            NodeType::Vec3 | NodeType::IVec3 | NodeType::UVec3 | NodeType::Color => 3,
            NodeType::Vec4 | NodeType::IVec4 | NodeType::UVec4 => 4,
            NodeType::Mat3 => 9,
            NodeType::Mat4 => 16,
        }
    }

    /// The scalar base of a vector type (self for scalars).
    pub fn scalar(self) -> NodeType {
        match self {
            NodeType::Vec2 | NodeType::Vec3 | NodeType::Vec4 | NodeType::Color => NodeType::Float,
            NodeType::IVec2 | NodeType::IVec3 | NodeType::IVec4 => NodeType::Int,
            NodeType::UVec2 | NodeType::UVec3 | NodeType::UVec4 => NodeType::UInt,
            other => other,
        }
    }

    /// Vector type with the given scalar base and component count.
    pub fn with_components(scalar: NodeType, count: u32) -> Option<NodeType> {
        Some(match (scalar, count) {
            (s, 1) => s,
            (NodeType::Float, 2) => NodeType::Vec2,
            (NodeType::Float, 3) => NodeType::Vec3,
            (NodeType::Float, 4) => NodeType::Vec4,
            (NodeType::Int, 2) => NodeType::IVec2,
            (NodeType::Int, 3) => NodeType::IVec3,
            (NodeType::Int, 4) => NodeType::IVec4,
            (NodeType::UInt, 2) => NodeType::UVec2,
            (NodeType::UInt, 3) => NodeType::UVec3,
            (NodeType::UInt, 4) => NodeType::UVec4,
            _ => return None,
        })
    }

    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            NodeType::Bool | NodeType::Int | NodeType::UInt | NodeType::Float
        )
    }

    pub fn is_vector(self) -> bool {
        self.component_count() >= 2 && !self.is_matrix()
    }

    pub fn is_matrix(self) -> bool {
        matches!(self, NodeType::Mat3 | NodeType::Mat4)
    }

    /// Whether a conversion from `self` to `to` can be expressed in generated
    /// code. Matrices and textures never convert; everything else converts
    /// within the scalar/vector family.
    pub fn can_convert_to(self, to: NodeType) -> bool {
        if self == to || to == NodeType::Void {
            return true;
        }
        if self.is_matrix() || to.is_matrix() {
            return false;
        }
        if self == NodeType::Texture || to == NodeType::Texture {
            return false;
        }
        if self == NodeType::Void {
            return false;
        }
        true
    }

    /// WGSL spelling.
    pub fn wgsl(self) -> &'static str {
        match self {
            NodeType::Void => "void",
            NodeType::Bool => "bool",
            NodeType::Int => "i32",
            NodeType::UInt => "u32",
            NodeType::Float => "f32",
            NodeType::Vec2 => "vec2f",
            NodeType::Vec3 | NodeType::Color => "vec3f",
            NodeType::Vec4 => "vec4f",
            NodeType::IVec2 => "vec2i",
            NodeType::IVec3 => "vec3i",
            NodeType::IVec4 => "vec4i",
            NodeType::UVec2 => "vec2u",
            NodeType::UVec3 => "vec3u",
            NodeType::UVec4 => "vec4u",
            NodeType::Mat3 => "mat3x3<f32>",
            NodeType::Mat4 => "mat4x4<f32>",
            NodeType::Texture => "texture_2d<f32>",
        }
    }

    /// GLSL spelling.
    pub fn glsl(self) -> &'static str {
        match self {
            NodeType::Void => "void",
            NodeType::Bool => "bool",
            NodeType::Int => "int",
            NodeType::UInt => "uint",
            NodeType::Float => "float",
            NodeType::Vec2 => "vec2",
            NodeType::Vec3 | NodeType::Color => "vec3",
            NodeType::Vec4 => "vec4",
            NodeType::IVec2 => "ivec2",
            NodeType::IVec3 => "ivec3",
            NodeType::IVec4 => "ivec4",
            NodeType::UVec2 => "uvec2",
            NodeType::UVec3 => "uvec3",
            NodeType::UVec4 => "uvec4",
            NodeType::Mat3 => "mat3",
            NodeType::Mat4 => "mat4",
            NodeType::Texture => "sampler2D",
        }
    }

    /// Spelling in the given target language.
    pub fn name_in(self, language: TargetLanguage) -> &'static str {
        match language {
            TargetLanguage::Wgsl => self.wgsl(),
            TargetLanguage::Glsl => self.glsl(),
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Semantic names for error messages, independent of the target
        // language spelling.
        let name = match self {
            NodeType::Void => "void",
            NodeType::Bool => "bool",
            NodeType::Int => "int",
            NodeType::UInt => "uint",
            NodeType::Float => "float",
            NodeType::Vec2 => "vec2",
            NodeType::Vec3 => "vec3",
            NodeType::Vec4 => "vec4",
            NodeType::IVec2 => "ivec2",
            NodeType::IVec3 => "ivec3",
            NodeType::IVec4 => "ivec4",
            NodeType::UVec2 => "uvec2",
            NodeType::UVec3 => "uvec3",
            NodeType::UVec4 => "uvec4",
            NodeType::Mat3 => "mat3",
            NodeType::Mat4 => "mat4",
            NodeType::Color => "color",
            NodeType::Texture => "texture",
        };
        f.write_str(name)
    }
}

/// CPU-side value feeding a constant or a uniform slot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i32),
    UInt(u32),
    Float(f32),
    Vec2(glam::Vec2),
    Vec3(glam::Vec3),
    Vec4(glam::Vec4),
    Mat3(glam::Mat3),
    Mat4(glam::Mat4),
    Color(glam::Vec3),
    /// Opaque handle to an externally-owned texture resource.
    Texture(u64),
}

impl Value {
    pub fn node_type(&self) -> NodeType {
        match self {
            Value::Bool(_) => NodeType::Bool,
            Value::Int(_) => NodeType::Int,
            Value::UInt(_) => NodeType::UInt,
            Value::Float(_) => NodeType::Float,
            Value::Vec2(_) => NodeType::Vec2,
            Value::Vec3(_) => NodeType::Vec3,
            Value::Vec4(_) => NodeType::Vec4,
            Value::Mat3(_) => NodeType::Mat3,
            Value::Mat4(_) => NodeType::Mat4,
            Value::Color(_) => NodeType::Color,
            Value::Texture(_) => NodeType::Texture,
        }
    }

    /// Literal spelling of the value, or `None` for values with no literal
    /// form (textures).
    pub fn literal(&self, language: TargetLanguage) -> Option<String> {
        let ctor = |ty: NodeType, parts: &[f32]| -> String {
            let joined = parts.iter().map(|v| fmt_f32(*v)).collect::<Vec<_>>().join(", ");
            format!("{}({})", ty.name_in(language), joined)
        };
        Some(match self {
            Value::Bool(v) => format!("{v}"),
            Value::Int(v) => match language {
                TargetLanguage::Wgsl => format!("{v}i"),
                TargetLanguage::Glsl => format!("{v}"),
            },
            Value::UInt(v) => format!("{v}u"),
            Value::Float(v) => fmt_f32(*v),
            Value::Vec2(v) => ctor(NodeType::Vec2, &v.to_array()),
            Value::Vec3(v) => ctor(NodeType::Vec3, &v.to_array()),
            Value::Vec4(v) => ctor(NodeType::Vec4, &v.to_array()),
            Value::Color(v) => ctor(NodeType::Color, &v.to_array()),
            Value::Mat3(m) => ctor(NodeType::Mat3, &m.to_cols_array()),
            Value::Mat4(m) => ctor(NodeType::Mat4, &m.to_cols_array()),
            Value::Texture(_) => return None,
        })
    }
}

/// Common type of a binary operation's operands, or `None` when the pair
/// cannot combine. Scalars splat against vectors; the wider component count
/// and the higher-ranked scalar base (float > int > uint) win.
pub fn widen(a: NodeType, b: NodeType) -> Option<NodeType> {
    let a = if a == NodeType::Color { NodeType::Vec3 } else { a };
    let b = if b == NodeType::Color { NodeType::Vec3 } else { b };
    if a == b {
        return Some(a);
    }
    if a == NodeType::Texture || b == NodeType::Texture {
        return None;
    }
    if a == NodeType::Void || b == NodeType::Void {
        return None;
    }
    // Matrix combinations: mat * vec and mat * scalar keep the non-matrix
    // operand's shape (or the matrix for scalar scaling).
    if a.is_matrix() || b.is_matrix() {
        return match (a.is_matrix(), b.is_matrix()) {
            (true, true) => Some(a),
            (true, false) => Some(if b.is_scalar() { a } else { b }),
            (false, true) => Some(if a.is_scalar() { b } else { a }),
            _ => unreachable!(),
        };
    }
    fn rank(s: NodeType) -> u8 {
        match s {
            NodeType::Float => 3,
            NodeType::Int => 2,
            NodeType::UInt => 1,
            NodeType::Bool => 0,
            _ => 0,
        }
    }
    let base = if rank(a.scalar()) >= rank(b.scalar()) {
        a.scalar()
    } else {
        b.scalar()
    };
    let count = a.component_count().max(b.component_count());
    if base == NodeType::Bool && count > 1 {
        return None;
    }
    NodeType::with_components(base, count)
}

/// Format a float literal, removing trailing zeros but keeping an
/// unambiguous decimal point.
pub fn fmt_f32(v: f32) -> String {
    if v.is_finite() {
        let s = format!("{v:.9}");
        let s = s.trim_end_matches('0').trim_end_matches('.');
        if s.contains('.') || s.contains('e') {
            s.to_string()
        } else {
            format!("{s}.0")
        }
    } else {
        "0.0".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_f32_keeps_decimal_point() {
        assert_eq!(fmt_f32(3.0), "3.0");
        assert_eq!(fmt_f32(0.5), "0.5");
        assert_eq!(fmt_f32(-2.25), "-2.25");
        assert_eq!(fmt_f32(f32::NAN), "0.0");
    }

    #[test]
    fn component_counts() {
        assert_eq!(NodeType::Float.component_count(), 1);
        assert_eq!(NodeType::Vec4.component_count(), 4);
        assert_eq!(NodeType::Color.component_count(), 3);
        assert_eq!(NodeType::Void.component_count(), 0);
    }

    #[test]
    fn with_components_round_trips() {
        for ty in [NodeType::Vec2, NodeType::Vec3, NodeType::Vec4, NodeType::UVec3] {
            assert_eq!(
                NodeType::with_components(ty.scalar(), ty.component_count()),
                Some(ty)
            );
        }
        assert_eq!(NodeType::with_components(NodeType::Bool, 3), None);
    }

    #[test]
    fn conversion_legality() {
        assert!(NodeType::Float.can_convert_to(NodeType::Vec4));
        assert!(NodeType::Vec4.can_convert_to(NodeType::Vec2));
        assert!(NodeType::Color.can_convert_to(NodeType::Vec4));
        assert!(!NodeType::Mat3.can_convert_to(NodeType::Vec2));
        assert!(!NodeType::Texture.can_convert_to(NodeType::Float));
        assert!(!NodeType::Void.can_convert_to(NodeType::Float));
    }

    #[test]
    fn value_literals() {
        assert_eq!(
            Value::Float(1.5).literal(TargetLanguage::Wgsl).unwrap(),
            "1.5"
        );
        assert_eq!(
            Value::Vec3(glam::Vec3::new(1.0, 0.0, 0.5))
                .literal(TargetLanguage::Wgsl)
                .unwrap(),
            "vec3f(1.0, 0.0, 0.5)"
        );
        assert_eq!(
            Value::Vec2(glam::Vec2::ONE).literal(TargetLanguage::Glsl).unwrap(),
            "vec2(1.0, 1.0)"
        );
        assert_eq!(Value::UInt(3).literal(TargetLanguage::Wgsl).unwrap(), "3u");
        assert!(Value::Texture(7).literal(TargetLanguage::Wgsl).is_none());
    }
}
