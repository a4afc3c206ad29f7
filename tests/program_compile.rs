use node_forge_shader_graph::{
    CompileError, GeometryLayout, NodeType, ProgramDesc, TargetLanguage, Value, compile_program,
    graph::NodeGraph,
};

fn basic_geometry() -> GeometryLayout {
    GeometryLayout::new()
        .with("position", NodeType::Vec3)
        .with("uv", NodeType::Vec2)
}

#[test]
fn identical_graphs_compile_to_identical_text() {
    let mut g = NodeGraph::new();
    let position = g.attribute("position", NodeType::Vec3);
    let tint = g.uniform_labeled("tint", Value::Color(glam::Vec3::new(1.0, 0.5, 0.25)));
    let time = g.time();
    let wave = g.sin(time);
    let color = g.mul(tint, wave);

    let desc = ProgramDesc::render("determinism", TargetLanguage::Wgsl, position, color, basic_geometry());

    let first = compile_program(&g, &desc).unwrap();
    let second = compile_program(&g, &desc).unwrap();

    assert_eq!(first.vertex, second.vertex);
    assert_eq!(first.fragment, second.fragment);
    assert_eq!(first.module, second.module);
    let names_first: Vec<_> = first.uniforms.iter().map(|u| u.name.clone()).collect();
    let names_second: Vec<_> = second.uniforms.iter().map(|u| u.name.clone()).collect();
    assert_eq!(names_first, names_second);
}

#[test]
fn vertex_value_in_fragment_becomes_a_varying() {
    let mut g = NodeGraph::new();
    let position = g.attribute("position", NodeType::Vec3);
    let uv = g.attribute("uv", NodeType::Vec2);

    let desc = ProgramDesc::render("varying", TargetLanguage::Wgsl, position, uv, basic_geometry());
    let bundle = compile_program(&g, &desc).unwrap();

    assert_eq!(bundle.varyings.len(), 1);
    let vary = &bundle.varyings[0];
    assert_eq!(vary.ty, NodeType::Vec2);

    // The vertex stage computes the value and writes the interpolated slot.
    let vertex = bundle.vertex.as_deref().unwrap();
    assert!(vertex.contains(&format!("out.{} = in.uv;", vary.name)));

    // Fragment code reads the varying, never the raw attribute.
    let fragment = bundle.fragment.as_deref().unwrap();
    assert!(fragment.contains(&format!("in.{}", vary.name)));
    assert!(!fragment.contains("in.uv"));
}

#[test]
fn shared_hash_uniforms_collapse_to_one_binding() {
    let mut g = NodeGraph::new();
    let position = g.attribute("position", NodeType::Vec3);

    let a = g.uniform(Value::Float(1.0));
    let b = g.uniform(Value::Float(1.0));
    g.set_shared_key(a, "exposure");
    g.set_shared_key(b, "exposure");
    let sum = g.add(a, b);

    let desc = ProgramDesc::render("dedup", TargetLanguage::Wgsl, position, sum, basic_geometry());
    let bundle = compile_program(&g, &desc).unwrap();

    assert_eq!(bundle.uniforms.len(), 1);
    let name = &bundle.uniforms[0].name;
    let fragment = bundle.fragment.as_deref().unwrap();
    assert!(fragment.contains(&format!("(uniforms.{name} + uniforms.{name})")));
}

#[test]
fn distinct_uniforms_stay_distinct() {
    let mut g = NodeGraph::new();
    let position = g.attribute("position", NodeType::Vec3);
    let a = g.uniform(Value::Float(1.0));
    let b = g.uniform(Value::Float(1.0));
    let sum = g.add(a, b);

    let desc = ProgramDesc::render("no-dedup", TargetLanguage::Wgsl, position, sum, basic_geometry());
    let bundle = compile_program(&g, &desc).unwrap();
    assert_eq!(bundle.uniforms.len(), 2);
}

#[test]
fn single_consumer_expression_is_inlined() {
    let mut g = NodeGraph::new();
    let position = g.attribute("position", NodeType::Vec3);
    let a = g.uniform(Value::Float(2.0));
    let b = g.uniform(Value::Float(3.0));
    let product = g.mul(a, b);

    let desc = ProgramDesc::render("inline", TargetLanguage::Wgsl, position, product, basic_geometry());
    let bundle = compile_program(&g, &desc).unwrap();

    let fragment = bundle.fragment.as_deref().unwrap();
    assert!(!fragment.contains("let t0"));
    assert!(fragment.contains("(uniforms.u0 * uniforms.u1)"));
}

#[test]
fn multi_consumer_expression_emits_one_temporary() {
    let mut g = NodeGraph::new();
    let position = g.attribute("position", NodeType::Vec3);
    let a = g.uniform(Value::Float(2.0));
    let b = g.uniform(Value::Float(3.0));
    let sum = g.add(a, b);
    let squared = g.mul(sum, sum);

    let desc = ProgramDesc::render("temp", TargetLanguage::Wgsl, position, squared, basic_geometry());
    let bundle = compile_program(&g, &desc).unwrap();

    let fragment = bundle.fragment.as_deref().unwrap();
    let decls = fragment
        .lines()
        .filter(|l| l.trim_start().starts_with("let t0:"))
        .count();
    assert_eq!(decls, 1);
    assert!(fragment.contains("let t0: f32 = (uniforms.u0 + uniforms.u1);"));
    assert!(fragment.contains("(t0 * t0)"));
}

#[test]
fn missing_attribute_recovers_with_a_typed_constant() {
    let mut g = NodeGraph::new();
    let position = g.attribute("position", NodeType::Vec3);
    let color = g.attribute("color", NodeType::Vec3);

    // Geometry carries no `color` attribute.
    let geometry = GeometryLayout::new().with("position", NodeType::Vec3);
    let desc = ProgramDesc::render("recovery", TargetLanguage::Wgsl, position, color, geometry);
    let bundle = compile_program(&g, &desc).unwrap();

    // Only the present attribute is registered; the absent one compiled to
    // a zero constant fed through a varying.
    assert_eq!(bundle.attributes.len(), 1);
    assert_eq!(bundle.attributes[0].name, "position");
    let vertex = bundle.vertex.as_deref().unwrap();
    assert!(vertex.contains("vec3f(0.0)"));
}

#[test]
fn unsupported_conversion_is_fatal() {
    let mut g = NodeGraph::new();
    let position = g.attribute("position", NodeType::Vec3);
    let m = g.uniform(Value::Mat3(glam::Mat3::IDENTITY));

    let desc = ProgramDesc::render("badconv", TargetLanguage::Wgsl, position, m, basic_geometry());
    let err = compile_program(&g, &desc).unwrap_err();
    match err.downcast_ref::<CompileError>() {
        Some(CompileError::InvalidConversion { from, to }) => {
            assert_eq!(*from, NodeType::Mat3);
            assert_eq!(*to, NodeType::Vec4);
        }
        other => panic!("expected InvalidConversion, got {other:?}"),
    }
}

#[test]
fn glsl_programs_use_glsl_syntax() {
    let mut g = NodeGraph::new();
    let position = g.attribute("position", NodeType::Vec3);
    let tint = g.uniform_labeled("tint", Value::Color(glam::Vec3::ONE));
    let strength = g.uniform_labeled("strength", Value::Float(0.5));
    let scaled = g.mul(tint, strength);

    let desc = ProgramDesc::render("glsl", TargetLanguage::Glsl, position, scaled, basic_geometry());
    let bundle = compile_program(&g, &desc).unwrap();

    let vertex = bundle.vertex.as_deref().unwrap();
    assert!(vertex.starts_with("#version 450"));
    assert!(vertex.contains("layout(location = 0) in vec3 position;"));
    assert!(vertex.contains("gl_Position = vec4(position, 1.0);"));

    let fragment = bundle.fragment.as_deref().unwrap();
    assert!(fragment.contains("layout(std140) uniform NodeUniforms {"));
    assert!(fragment.contains("vec3 tint;"));
    assert!(fragment.contains("fragColor = vec4((tint * vec3(strength)), 1.0);"));

    // GLSL stages are separate compilation units; no combined module.
    assert!(bundle.module.is_none());
}

#[test]
fn layout_json_lists_bindings_in_order() {
    let mut g = NodeGraph::new();
    let position = g.attribute("position", NodeType::Vec3);
    let a = g.uniform_labeled("base", Value::Float(1.0));
    let b = g.uniform_labeled("gain", Value::Float(2.0));
    let sum = g.add(a, b);

    let desc = ProgramDesc::render("layout", TargetLanguage::Wgsl, position, sum, basic_geometry());
    let bundle = compile_program(&g, &desc).unwrap();

    let json: serde_json::Value = serde_json::from_str(&bundle.layout_json().unwrap()).unwrap();
    assert_eq!(json["label"], "layout");
    let uniforms = json["uniforms"].as_array().unwrap();
    assert_eq!(uniforms.len(), 2);
    assert_eq!(uniforms[0]["name"], "base");
    assert_eq!(uniforms[1]["name"], "gain");
    assert_eq!(json["attributes"][0]["name"], "position");
}

#[test]
fn missing_stage_root_is_an_error() {
    let g = NodeGraph::new();
    let desc = ProgramDesc {
        label: "broken".to_string(),
        language: TargetLanguage::Wgsl,
        vertex: None,
        fragment: None,
        compute: None,
        workgroup_size: [1, 1, 1],
        geometry: GeometryLayout::new(),
    };
    let err = compile_program(&g, &desc).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CompileError>(),
        Some(CompileError::MissingStageRoot { stage: "vertex" })
    ));
}
