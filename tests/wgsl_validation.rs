//! Generated sources must parse under naga's frontends: every program the
//! compiler emits feeds GPU module creation directly.

use node_forge_shader_graph::graph::NodeGraph;
use node_forge_shader_graph::{
    CompileError, GeometryLayout, NodeType, ProgramDesc, ShaderStage, TargetLanguage, Value,
    compile_program, validation,
};

fn geometry() -> GeometryLayout {
    GeometryLayout::new()
        .with("position", NodeType::Vec3)
        .with("uv", NodeType::Vec2)
}

#[test]
fn representative_render_program_is_valid_wgsl() {
    let mut g = NodeGraph::new();
    let position = g.attribute("position", NodeType::Vec3);
    let uv = g.attribute("uv", NodeType::Vec2);

    let tint = g.uniform_labeled("tint", Value::Color(glam::Vec3::new(1.0, 0.8, 0.6)));
    let time = g.time();
    let wave = g.sin(time);

    // Shared sub-expression consumed twice: exercises the temp path.
    let bright = g.add(wave, tint);
    let doubled = g.mul(bright, bright);

    // Conditional with mixed widths: exercises widening + property vars.
    let threshold = g.float(0.5);
    let hot = g.gt(wave, threshold);
    let cool = g.swizzle(uv, "xy");
    let picked = g.cond(hot, doubled, cool);

    let desc = ProgramDesc::render("validate", TargetLanguage::Wgsl, position, picked, geometry());
    let bundle = compile_program(&g, &desc).unwrap();

    let module = bundle.module.as_deref().unwrap();
    validation::validate_wgsl_with_context(module, "program 'validate'").unwrap();
    validation::validate_wgsl(bundle.vertex.as_deref().unwrap()).unwrap();
    validation::validate_wgsl(bundle.fragment.as_deref().unwrap()).unwrap();
}

#[test]
fn textured_program_is_valid_wgsl() {
    let mut g = NodeGraph::new();
    let position = g.attribute("position", NodeType::Vec3);
    let uv = g.attribute("uv", NodeType::Vec2);

    let albedo = g.texture_labeled("albedo", 1);
    let sampled = g.sample(albedo, uv);

    let desc = ProgramDesc::render("textured", TargetLanguage::Wgsl, position, sampled, geometry());
    let bundle = compile_program(&g, &desc).unwrap();

    assert_eq!(bundle.textures.len(), 1);
    assert_eq!(bundle.textures[0].name, "albedo");

    let fragment = bundle.fragment.as_deref().unwrap();
    assert!(fragment.contains("textureSample(albedo, albedo_sampler,"));
    validation::validate_wgsl(bundle.module.as_deref().unwrap()).unwrap();
}

#[test]
fn compute_loop_program_is_valid_wgsl() {
    let mut g = NodeGraph::new();

    let stack = g.stack();
    let acc = g.property(NodeType::Float);
    let zero = g.float(0.0);
    g.stack_assign(stack, acc, zero);

    let count = g.uint(8);
    let (lp, body, index) = g.loop_n(count);
    let index_f = g.convert(index, NodeType::Float);
    let sum = g.add(acc, index_f);
    g.stack_assign(body, acc, sum);
    g.stack_add(stack, lp);

    let desc = ProgramDesc::compute("sumloop", TargetLanguage::Wgsl, stack, [64, 1, 1]);
    let bundle = compile_program(&g, &desc).unwrap();
    validation::validate_wgsl(bundle.compute.as_deref().unwrap()).unwrap();
}

#[test]
fn function_snippet_call_compiles_and_validates() {
    let mut g = NodeGraph::new();
    let position = g.attribute("position", NodeType::Vec3);

    let f = g.wgsl_fn(
        "fn tone_map(color: vec3f, exposure: f32) -> vec3f { return color * exposure; }",
    );
    let base = g.uniform_labeled("base_color", Value::Vec3(glam::Vec3::ONE));
    let exposure = g.uniform_labeled("exposure", Value::Float(1.2));
    let mapped = g.call(f, &[base, exposure]);

    let desc = ProgramDesc::render("snippet", TargetLanguage::Wgsl, position, mapped, geometry());
    let bundle = compile_program(&g, &desc).unwrap();

    let fragment = bundle.fragment.as_deref().unwrap();
    assert!(fragment.contains("fn tone_map(color: vec3f, exposure: f32) -> vec3f"));
    assert!(fragment.contains("tone_map(uniforms.base_color, uniforms.exposure)"));
    validation::validate_wgsl(bundle.module.as_deref().unwrap()).unwrap();
}

#[test]
fn keyword_nodes_substitute_into_the_snippet_body() {
    let mut g = NodeGraph::new();
    let position = g.attribute("position", NodeType::Vec3);

    let f = g.wgsl_fn("fn pulse(x: f32) -> f32 { return x * strength; }");
    let strength = g.uniform_labeled("strength", Value::Float(2.0));
    g.function_keyword(f, "strength", strength);

    let x = g.uniform_labeled("level", Value::Float(0.25));
    let value = g.call(f, &[x]);

    let desc = ProgramDesc::render("keywords", TargetLanguage::Wgsl, position, value, geometry());
    let bundle = compile_program(&g, &desc).unwrap();

    let fragment = bundle.fragment.as_deref().unwrap();
    assert!(fragment.contains("return x * uniforms.strength;"));
    validation::validate_wgsl(bundle.module.as_deref().unwrap()).unwrap();
}

#[test]
fn missing_call_input_is_fatal() {
    let mut g = NodeGraph::new();
    let position = g.attribute("position", NodeType::Vec3);

    let f = g.wgsl_fn("fn mixdown(a: f32, b: f32) -> f32 { return a + b; }");
    let only = g.uniform(Value::Float(1.0));
    let call = g.call(f, &[only]);

    let desc = ProgramDesc::render("unresolved", TargetLanguage::Wgsl, position, call, geometry());
    let err = compile_program(&g, &desc).unwrap_err();
    let compile = err.downcast_ref::<CompileError>().expect("typed error");
    assert_eq!(compile.to_string(), "FunctionCallNode: Input 'b' not found.");
}

#[test]
fn malformed_snippet_aborts_the_compile() {
    let mut g = NodeGraph::new();
    let position = g.attribute("position", NodeType::Vec3);

    let f = g.wgsl_fn("fn broken(a: vec3f { return a; }");
    let arg = g.vec3(1.0, 0.0, 0.0);
    let call = g.call(f, &[arg]);

    let desc = ProgramDesc::render("malformed", TargetLanguage::Wgsl, position, call, geometry());
    let err = compile_program(&g, &desc).unwrap_err();
    let compile = err.downcast_ref::<CompileError>().expect("typed error");
    assert!(matches!(compile, CompileError::MalformedSnippet { .. }));
}

#[test]
fn snippet_language_must_match_the_program() {
    let mut g = NodeGraph::new();
    let position = g.attribute("position", NodeType::Vec3);

    let f = g.glsl_fn("vec3 tint(vec3 c) { return c; }");
    let arg = g.vec3(1.0, 0.0, 0.0);
    let call = g.call(f, &[arg]);

    let desc = ProgramDesc::render("mismatch", TargetLanguage::Wgsl, position, call, geometry());
    let err = compile_program(&g, &desc).unwrap_err();
    let compile = err.downcast_ref::<CompileError>().expect("typed error");
    assert!(matches!(compile, CompileError::LanguageMismatch { .. }));
}

#[test]
fn simple_glsl_program_passes_the_glsl_frontend() {
    let mut g = NodeGraph::new();
    let position = g.attribute("position", NodeType::Vec3);
    let color = g.color(1.0, 0.0, 1.0);

    let geometry = GeometryLayout::new().with("position", NodeType::Vec3);
    let desc = ProgramDesc::render("glsl-valid", TargetLanguage::Glsl, position, color, geometry);
    let bundle = compile_program(&g, &desc).unwrap();

    validation::validate_glsl(bundle.vertex.as_deref().unwrap(), ShaderStage::Vertex).unwrap();
    validation::validate_glsl(bundle.fragment.as_deref().unwrap(), ShaderStage::Fragment).unwrap();
}
