//! Test harness for a three-node splice diagram.
//!
//! ```text
//!   A (100,100)  --link 1-->  B (500,100)
//!
//!               N (300,400)
//! ```
//!
//! A and B are 150x100, N is 100x60. Pins sit at the vertical center of the
//! left (input) and right (output) edges. The link runs along y = 150 from
//! x = 250 to x = 500.

#![allow(dead_code)]

use super::{init_logging, CallbackTracker};
use slint::Model;
use slint_node_splice::{
    DiagramGraph, DragSummary, EditorConfig, Link, LinkId, Modifiers, Node, NodeId, Point,
    PointerDown, PointerEvent, Port, PortDirection, PortId, SpliceEditorController,
};

pub const NODE_A: NodeId = NodeId(1);
pub const NODE_B: NodeId = NodeId(2);
pub const NODE_N: NodeId = NodeId(3);

pub const A_OUT: PortId = PortId(11);
pub const B_IN: PortId = PortId(21);
pub const N_IN: PortId = PortId(31);
pub const N_OUT: PortId = PortId(32);

pub const LINK_AB: LinkId = LinkId(1);

/// A point on the link, away from both nodes.
pub const ON_LINK: (f32, f32) = (375.0, 151.0);
/// A point inside N, away from its pins.
pub const INSIDE_N: (f32, f32) = (350.0, 410.0);

pub struct SpliceHarness {
    pub ctrl: SpliceEditorController,
    pub tracker: CallbackTracker,
}

impl SpliceHarness {
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        Self::with_graph(config, default_graph())
    }

    pub fn with_graph(config: EditorConfig, graph: DiagramGraph) -> Self {
        init_logging();
        let ctrl = SpliceEditorController::with_config(config);
        ctrl.set_graph(graph);

        let tracker = CallbackTracker::new();
        ctrl.on_diagram_changed({
            let changed = tracker.diagram_changed.clone();
            move || *changed.borrow_mut() += 1
        });
        ctrl.on_repaint({
            let repaints = tracker.repaints.clone();
            move || *repaints.borrow_mut() += 1
        });

        let harness = Self { ctrl, tracker };
        harness.report_geometry();
        harness
    }

    /// Report node rects and pin offsets the way a rendered window would.
    pub fn report_geometry(&self) {
        let report_rect = self.ctrl.node_rect_callback();
        let report_pin = self.ctrl.pin_position_callback();
        let graph = self.ctrl.graph();
        let graph = graph.borrow();
        for node in graph.nodes() {
            let (w, h) = if node.id == NODE_N { (100.0, 60.0) } else { (150.0, 100.0) };
            let viewport = self.ctrl.viewport();
            let screen = viewport.to_screen(node.position);
            let z = viewport.effective_zoom();
            report_rect(node.id.0, screen.x, screen.y, w * z, h * z);
            for port in node.ports() {
                let rel_x = if port.direction == PortDirection::Input { 0.0 } else { w };
                report_pin(port.id.0, node.id.0, rel_x, h / 2.0);
            }
        }
    }

    pub fn press(&self, x: f32, y: f32) -> PointerDown {
        self.ctrl.handle_pointer_down_at(x, y, Modifiers::default())
    }

    pub fn move_to(&self, x: f32, y: f32) {
        self.ctrl.handle_pointer_move(&PointerEvent::at(x, y));
    }

    pub fn release(&self, x: f32, y: f32) -> DragSummary {
        self.ctrl.handle_pointer_up(&PointerEvent::at(x, y))
    }

    /// Press at `from`, move there in `steps` increments, release at `to`.
    pub fn drag(&self, from: (f32, f32), to: (f32, f32), steps: usize) -> DragSummary {
        self.press(from.0, from.1);
        let steps = steps.max(1);
        for i in 1..=steps {
            let t = i as f32 / steps as f32;
            self.move_to(from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t);
        }
        self.release(to.0, to.1)
    }

    pub fn position(&self, id: NodeId) -> Point {
        self.ctrl.graph().borrow().position(id).expect("node should exist")
    }

    pub fn set_locked(&self, id: NodeId, locked: bool) {
        if let Some(node) = self.ctrl.graph().borrow_mut().node_mut(id) {
            node.locked = locked;
        }
    }

    pub fn hovered_ids(&self) -> Vec<i32> {
        self.ctrl.hovered_links_model().iter().collect()
    }

    pub fn has_link(&self, source: PortId, target: PortId) -> bool {
        self.ctrl.graph().borrow().find_link(source, target).is_some()
    }
}

pub fn default_graph() -> DiagramGraph {
    let mut graph = DiagramGraph::new();
    graph
        .add_node(Node::new(NODE_A, Point::new(100.0, 100.0)).with_port(Port::output(A_OUT, "out-0")))
        .expect("add A");
    graph
        .add_node(Node::new(NODE_B, Point::new(500.0, 100.0)).with_port(Port::input(B_IN, "in-0")))
        .expect("add B");
    graph
        .add_node(
            Node::new(NODE_N, Point::new(300.0, 400.0))
                .with_port(Port::input(N_IN, "in-0"))
                .with_port(Port::output(N_OUT, "out-0")),
        )
        .expect("add N");
    graph.add_link(Link::new(LINK_AB, A_OUT, B_IN)).expect("add link");
    graph
}
