use std::cell::Cell;
use std::rc::Rc;

use node_forge_shader_graph::graph::NodeGraph;
use node_forge_shader_graph::{
    GeometryLayout, NodeFrame, NodeType, ProgramDesc, TargetLanguage, UpdateCadence, UpdateRule,
    Value, compile_program,
};

fn counting_rule(counter: &Rc<Cell<u32>>) -> UpdateRule {
    let counter = counter.clone();
    UpdateRule::Custom(Box::new(move |_value, _info| {
        counter.set(counter.get() + 1);
    }))
}

#[test]
fn frame_cadence_updates_once_per_frame() {
    let mut g = NodeGraph::new();
    let u = g.uniform(Value::Float(0.0));
    let counter = Rc::new(Cell::new(0));
    g.set_update(u, UpdateCadence::Frame, counting_rule(&counter));

    let mut frame = NodeFrame::new();
    frame.update();

    frame.update_node(&mut g, u);
    frame.update_node(&mut g, u);
    assert_eq!(counter.get(), 1);

    frame.update();
    frame.update_node(&mut g, u);
    assert_eq!(counter.get(), 2);
}

#[test]
fn render_cadence_updates_once_per_render_and_frame() {
    let mut g = NodeGraph::new();
    let u = g.uniform(Value::Float(0.0));
    let counter = Rc::new(Cell::new(0));
    g.set_update(u, UpdateCadence::Render, counting_rule(&counter));

    let mut frame = NodeFrame::new();
    frame.update();

    frame.update_node(&mut g, u);
    frame.update_node(&mut g, u);
    assert_eq!(counter.get(), 1);

    // Second pass within the same frame.
    frame.begin_render();
    frame.update_node(&mut g, u);
    assert_eq!(counter.get(), 2);

    // New frame, same render id.
    frame.update();
    frame.update_node(&mut g, u);
    assert_eq!(counter.get(), 3);
}

#[test]
fn object_cadence_updates_every_call() {
    let mut g = NodeGraph::new();
    let u = g.uniform(Value::Float(0.0));
    let counter = Rc::new(Cell::new(0));
    g.set_update(u, UpdateCadence::Object, counting_rule(&counter));

    let mut frame = NodeFrame::new();
    frame.update();
    for _ in 0..5 {
        frame.update_node(&mut g, u);
    }
    assert_eq!(counter.get(), 5);
}

#[test]
fn before_hooks_deduplicate_separately() {
    let mut g = NodeGraph::new();
    let u = g.uniform(Value::Float(0.0));
    let updates = Rc::new(Cell::new(0));
    let before = Rc::new(Cell::new(0));
    g.set_update(u, UpdateCadence::Frame, counting_rule(&updates));
    g.set_update_before(u, UpdateCadence::Frame, counting_rule(&before));

    let mut frame = NodeFrame::new();
    frame.update();

    frame.update_before_node(&mut g, u);
    frame.update_node(&mut g, u);
    frame.update_before_node(&mut g, u);
    frame.update_node(&mut g, u);

    assert_eq!(updates.get(), 1);
    assert_eq!(before.get(), 1);
}

#[test]
fn nodes_without_cadence_are_ignored() {
    let mut g = NodeGraph::new();
    let u = g.uniform(Value::Float(7.0));

    let mut frame = NodeFrame::new();
    frame.update();
    frame.update_node(&mut g, u);

    assert_eq!(g.uniform_value(u), Some(&Value::Float(7.0)));
}

#[test]
fn update_advances_the_clock() {
    let mut frame = NodeFrame::new();
    assert_eq!(frame.info.frame_id, 0);

    frame.update();
    frame.update();
    assert_eq!(frame.info.frame_id, 2);
    assert!(frame.info.delta_time >= 0.0);
    assert!(frame.info.time >= 0.0);
}

#[test]
fn time_node_tracks_accumulated_time() {
    let mut g = NodeGraph::new();
    let t = g.time();

    let mut frame = NodeFrame::new();
    frame.update();
    std::thread::sleep(std::time::Duration::from_millis(2));
    frame.update();
    frame.update_node(&mut g, t);

    match g.uniform_value(t) {
        Some(Value::Float(time)) => assert!(*time > 0.0),
        other => panic!("expected a float time value, got {other:?}"),
    }
}

#[test]
fn update_program_refreshes_compiled_uniforms() {
    let mut g = NodeGraph::new();
    let position = g.attribute("position", NodeType::Vec3);
    let t = g.time();

    let geometry = GeometryLayout::new().with("position", NodeType::Vec3);
    let desc = ProgramDesc::render("frame", TargetLanguage::Wgsl, position, t, geometry);
    let bundle = compile_program(&g, &desc).unwrap();
    assert_eq!(bundle.uniforms.len(), 1);

    let mut frame = NodeFrame::new();
    frame.update();
    std::thread::sleep(std::time::Duration::from_millis(2));
    frame.update();
    frame.update_program(&mut g, &bundle);

    match g.uniform_value(t) {
        Some(Value::Float(time)) => assert!(*time > 0.0),
        other => panic!("expected a float time value, got {other:?}"),
    }
}
