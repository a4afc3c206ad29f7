use node_forge_shader_graph::{
    GeometryLayout, NodeType, ProgramDesc, TargetLanguage, Value, compile_program,
    graph::NodeGraph,
};

fn geometry() -> GeometryLayout {
    GeometryLayout::new().with("position", NodeType::Vec3)
}

fn render_desc(g: &mut NodeGraph, fragment: node_forge_shader_graph::NodeId) -> ProgramDesc {
    let position = g.attribute("position", NodeType::Vec3);
    ProgramDesc::render("flow", TargetLanguage::Wgsl, position, fragment, geometry())
}

#[test]
fn cond_widens_to_the_else_branch_when_strictly_wider() {
    let mut g = NodeGraph::new();
    let cond = g.boolean(true);
    let narrow = g.vec2(1.0, 0.0);
    let wide = g.vec4(0.0, 1.0, 0.0, 1.0);
    let value = g.cond(cond, narrow, wide);

    let desc = render_desc(&mut g, value);
    let bundle = compile_program(&g, &desc).unwrap();
    let fragment = bundle.fragment.as_deref().unwrap();

    // The result property is vec4 and the narrow branch widens into it.
    assert!(fragment.contains("var p0: vec4f;"));
    assert!(fragment.contains("p0 = vec4f(vec2f(1.0, 0.0), 0.0, 1.0);"));
    assert!(fragment.contains("return p0;"));
}

#[test]
fn cond_keeps_the_if_branch_type_when_not_narrower() {
    let mut g = NodeGraph::new();
    let cond = g.boolean(false);
    let wide = g.vec4(0.0, 1.0, 0.0, 1.0);
    let narrow = g.vec2(1.0, 0.0);
    let value = g.cond(cond, wide, narrow);

    let desc = render_desc(&mut g, value);
    let bundle = compile_program(&g, &desc).unwrap();
    let fragment = bundle.fragment.as_deref().unwrap();

    assert!(fragment.contains("var p0: vec4f;"));
    assert!(fragment.contains("} else {"));
    assert!(fragment.contains("p0 = vec4f(vec2f(1.0, 0.0), 0.0, 1.0);"));
}

#[test]
fn elseif_chains_flatten_and_share_one_property() {
    let mut g = NodeGraph::new();

    let level = g.uniform_labeled("level", Value::Float(0.0));
    let result = g.property(NodeType::Vec3);

    let stack = g.stack();
    let low = g.float(0.25);
    let high = g.float(0.75);

    let c1 = g.lt(level, low);
    let red = g.vec3(1.0, 0.0, 0.0);
    let b1 = g.stack();
    g.stack_assign(b1, result, red);
    g.stack_if(stack, c1, b1);

    let c2 = g.lt(level, high);
    let green = g.vec3(0.0, 1.0, 0.0);
    let b2 = g.stack();
    g.stack_assign(b2, result, green);
    g.stack_else_if(stack, c2, b2).unwrap();

    let blue = g.vec3(0.0, 0.0, 1.0);
    let b3 = g.stack();
    g.stack_assign(b3, result, blue);
    g.stack_else(stack, b3).unwrap();

    g.stack_set_output(stack, result);

    let desc = render_desc(&mut g, stack);
    let bundle = compile_program(&g, &desc).unwrap();
    let fragment = bundle.fragment.as_deref().unwrap();

    assert!(fragment.contains("if ((uniforms.level < 0.25)) {"));
    assert!(fragment.contains("} else if ((uniforms.level < 0.75)) {"));
    assert!(fragment.contains("} else {"));

    // One hoisted property, assigned in every branch.
    assert!(fragment.contains("var p0: vec3f;"));
    assert_eq!(fragment.matches("p0 = vec3f(").count(), 3);
    assert!(fragment.contains("return vec4f(p0, 1.0);"));
}

#[test]
fn statements_flush_in_insertion_order() {
    let mut g = NodeGraph::new();

    let p = g.property(NodeType::Float);
    let stack = g.stack();
    let one = g.float(1.0);
    let two = g.float(2.0);
    g.stack_assign(stack, p, one);
    g.stack_assign(stack, p, two);
    g.stack_set_output(stack, p);

    let desc = render_desc(&mut g, stack);
    let bundle = compile_program(&g, &desc).unwrap();
    let fragment = bundle.fragment.as_deref().unwrap();

    let first = fragment.find("p0 = 1.0;").expect("first assignment");
    let second = fragment.find("p0 = 2.0;").expect("second assignment");
    assert!(first < second);
}

#[test]
fn counted_loop_compiles_with_a_usable_index() {
    let mut g = NodeGraph::new();

    let stack = g.stack();
    let acc = g.property(NodeType::Float);
    let zero = g.float(0.0);
    g.stack_assign(stack, acc, zero);

    let count = g.uint(4);
    let (lp, body, index) = g.loop_n(count);
    let index_f = g.convert(index, NodeType::Float);
    let sum = g.add(acc, index_f);
    g.stack_assign(body, acc, sum);
    g.stack_add(stack, lp);

    let desc = ProgramDesc::compute("loop", TargetLanguage::Wgsl, stack, [64, 1, 1]);
    let bundle = compile_program(&g, &desc).unwrap();
    let compute = bundle.compute.as_deref().unwrap();

    assert!(compute.contains("@compute @workgroup_size(64, 1, 1)"));
    let headers = compute
        .lines()
        .filter(|l| l.trim_start().starts_with("for (var i0: u32 = 0u; i0 < 4u;"))
        .count();
    assert_eq!(headers, 1);
    assert!(compute.contains("p0 = (p0 + f32(i0));"));
}

#[test]
fn glsl_loops_use_glsl_headers() {
    let mut g = NodeGraph::new();

    let stack = g.stack();
    let acc = g.property(NodeType::Float);
    let zero = g.float(0.0);
    g.stack_assign(stack, acc, zero);

    let count = g.uint(3);
    let (lp, body, index) = g.loop_n(count);
    let index_f = g.convert(index, NodeType::Float);
    let sum = g.add(acc, index_f);
    g.stack_assign(body, acc, sum);
    g.stack_add(stack, lp);

    let desc = ProgramDesc::compute("loop-glsl", TargetLanguage::Glsl, stack, [8, 8, 1]);
    let bundle = compile_program(&g, &desc).unwrap();
    let compute = bundle.compute.as_deref().unwrap();

    assert!(compute.contains("layout(local_size_x = 8, local_size_y = 8, local_size_z = 1) in;"));
    assert!(compute.contains("for (uint i0 = 0u; i0 < 3u; i0 = i0 + 1u) {"));
    assert!(compute.contains("p0 = (p0 + float(i0));"));
}

#[test]
fn void_conditionals_emit_no_property() {
    let mut g = NodeGraph::new();

    let p = g.property(NodeType::Float);
    let stack = g.stack();
    let init = g.float(0.0);
    g.stack_assign(stack, p, init);

    let cond = g.boolean(true);
    let body = g.stack();
    let one = g.float(1.0);
    g.stack_assign(body, p, one);
    g.stack_if(stack, cond, body);
    g.stack_set_output(stack, p);

    let desc = render_desc(&mut g, stack);
    let bundle = compile_program(&g, &desc).unwrap();
    let fragment = bundle.fragment.as_deref().unwrap();

    // Only the user property is declared; the void conditional itself
    // introduces none.
    assert_eq!(fragment.matches("var p").count(), 1);
    assert!(fragment.contains("if (true) {"));
    assert!(!fragment.contains("} else"));
}
