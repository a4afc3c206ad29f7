//! Per-frame update scheduling.
//!
//! Compilation and per-frame value refresh are decoupled passes: a
//! `NodeFrame` walks an already-compiled program's uniform nodes each draw
//! and pushes fresh CPU values into their slots, deduplicating by cadence.
//! One `NodeFrame` lives for the whole rendering session.

use std::collections::HashMap;
use std::time::Instant;

use crate::graph::{NodeGraph, NodeId, UpdateCadence};
use crate::program::ProgramBundle;

/// Clock and ambient state handed to update rules. The renderer, camera,
/// object, material and scene are externally-owned collaborators, carried
/// as opaque handles.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInfo {
    pub frame_id: u64,
    pub render_id: u64,
    /// Accumulated time in seconds.
    pub time: f32,
    /// Seconds since the previous frame.
    pub delta_time: f32,
    pub renderer: Option<u64>,
    pub camera: Option<u64>,
    pub object: Option<u64>,
    pub material: Option<u64>,
    pub scene: Option<u64>,
}

/// The update scheduler. `frame` cadence fires at most once per frame id,
/// `render` cadence at most once per (render id, frame id) pair, `object`
/// cadence unconditionally on every call.
#[derive(Debug, Default)]
pub struct NodeFrame {
    pub info: FrameInfo,
    last_tick: Option<Instant>,
    frame_updated: HashMap<NodeId, u64>,
    before_frame_updated: HashMap<NodeId, u64>,
    render_updated: HashMap<NodeId, (u64, u64)>,
    before_render_updated: HashMap<NodeId, (u64, u64)>,
}

impl NodeFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to the next frame: bump the frame id, recompute the delta
    /// from the monotonic clock and accumulate time.
    pub fn update(&mut self) {
        self.info.frame_id += 1;
        let now = Instant::now();
        self.info.delta_time = self
            .last_tick
            .map(|t| now.duration_since(t).as_secs_f32())
            .unwrap_or(0.0);
        self.info.time += self.info.delta_time;
        self.last_tick = Some(now);
    }

    /// Begin a render pass within the current frame (multi-pass rendering
    /// re-fires `render`-cadence updates per pass).
    pub fn begin_render(&mut self) {
        self.info.render_id += 1;
    }

    /// Run a node's update hook if its cadence says it is due.
    pub fn update_node(&mut self, graph: &mut NodeGraph, id: NodeId) {
        let Some(cadence) = graph.node(id).update.as_ref().map(|u| u.cadence) else {
            return;
        };
        if self.mark(id, cadence, false) {
            graph.run_update(id, &self.info, false);
        }
    }

    /// Run a node's before-render update hook if it is due. Dedup state is
    /// tracked separately from [`NodeFrame::update_node`].
    pub fn update_before_node(&mut self, graph: &mut NodeGraph, id: NodeId) {
        let Some(cadence) = graph.node(id).update_before.as_ref().map(|u| u.cadence) else {
            return;
        };
        if self.mark(id, cadence, true) {
            graph.run_update(id, &self.info, true);
        }
    }

    /// Refresh every uniform slot of a compiled program. The per-draw
    /// convenience entry for the render loop.
    pub fn update_program(&mut self, graph: &mut NodeGraph, bundle: &ProgramBundle) {
        for uniform in &bundle.uniforms {
            self.update_before_node(graph, uniform.node);
            self.update_node(graph, uniform.node);
        }
        for texture in &bundle.textures {
            self.update_before_node(graph, texture.node);
            self.update_node(graph, texture.node);
        }
    }

    fn mark(&mut self, id: NodeId, cadence: UpdateCadence, before: bool) -> bool {
        match cadence {
            UpdateCadence::Frame => {
                let map = if before {
                    &mut self.before_frame_updated
                } else {
                    &mut self.frame_updated
                };
                if map.get(&id) == Some(&self.info.frame_id) {
                    false
                } else {
                    map.insert(id, self.info.frame_id);
                    true
                }
            }
            UpdateCadence::Render => {
                let key = (self.info.render_id, self.info.frame_id);
                let map = if before {
                    &mut self.before_render_updated
                } else {
                    &mut self.render_updated
                };
                if map.get(&id) == Some(&key) {
                    false
                } else {
                    map.insert(id, key);
                    true
                }
            }
            UpdateCadence::Object => true,
        }
    }
}
