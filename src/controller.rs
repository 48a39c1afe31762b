//! High-level controller wiring the splice editor into a Slint window.
//!
//! The [`SpliceEditorController`] owns the diagram graph, selection, hover
//! tracker, geometry scene and drag session of one editor, and hands out
//! callbacks the window can bind directly.
//!
//! # Example
//!
//! ```ignore
//! use slint_node_splice::{EditorConfig, SpliceEditorController};
//!
//! slint::include_modules!();
//!
//! fn main() {
//!     let window = MainWindow::new().unwrap();
//!     let config = EditorConfig::load("editor.toml").unwrap_or_default();
//!     let ctrl = SpliceEditorController::with_config(config);
//!
//!     // Geometry reports from the rendered nodes
//!     window.on_node_rect_changed(ctrl.node_rect_callback());
//!     window.on_pin_position_changed(ctrl.pin_position_callback());
//!
//!     // Pointer gesture
//!     window.on_pointer_pressed(ctrl.pointer_down_callback());
//!     window.on_pointer_moved(ctrl.pointer_move_callback());
//!     window.on_pointer_released(ctrl.pointer_up_callback());
//!
//!     window.on_update_viewport({
//!         let ctrl = ctrl.clone();
//!         move |z, pan_x, pan_y| ctrl.set_viewport(z, pan_x, pan_y)
//!     });
//!
//!     // Models the UI binds to
//!     window.set_hovered_links(ctrl.hovered_links_model());
//!     window.set_selected_nodes(ctrl.selected_nodes_model());
//!
//!     let w = window.as_weak();
//!     ctrl.on_repaint(move || {
//!         if let Some(w) = w.upgrade() {
//!             w.invoke_request_redraw();
//!         }
//!     });
//!     ctrl.on_diagram_changed(|| println!("diagram changed"));
//!
//!     window.run().unwrap();
//! }
//! ```

use crate::config::{EditorConfig, SplicePolicy};
use crate::drag::{Canvas, CanvasEvent, DragContext, DragState, DragSummary, PointerDown};
use crate::graph::DiagramGraph;
use crate::hover::HoverTracker;
use crate::scene::{GeometryScene, SceneParams, Viewport};
use crate::selection::SelectionManager;
use crate::types::{EntityRef, LinkId, Modifiers, NodeId, Point, PointerEvent, PortId};
use slint::{ModelRc, VecModel};
use std::cell::RefCell;
use std::rc::Rc;

type Listener = Rc<dyn Fn()>;

#[derive(Default)]
struct Listeners {
    changed: Vec<Listener>,
    repaint: Vec<Listener>,
}

/// [`Canvas`] handed to the drag session. Requests are queued and delivered
/// to listeners once every borrow on the editor state is released.
struct HostCanvas {
    viewport: Viewport,
    repaints: usize,
    events: Vec<CanvasEvent>,
}

impl HostCanvas {
    fn new(viewport: Viewport) -> Self {
        Self { viewport, repaints: 0, events: Vec::new() }
    }
}

impl Canvas for HostCanvas {
    fn repaint(&mut self) {
        self.repaints += 1;
    }

    fn zoom(&self) -> f32 {
        self.viewport.effective_zoom()
    }

    fn relative_point(&self, screen: Point) -> Point {
        self.viewport.to_world(screen)
    }

    fn fire_event(&mut self, event: CanvasEvent) {
        self.events.push(event);
    }
}

/// Controller for one splice editor session.
///
/// Clone this controller to share it across callbacks; clones share state.
#[derive(Clone)]
pub struct SpliceEditorController {
    graph: Rc<RefCell<DiagramGraph>>,
    selection: Rc<RefCell<SelectionManager>>,
    hover: Rc<RefCell<HoverTracker>>,
    scene: Rc<RefCell<GeometryScene>>,
    drag: Rc<RefCell<DragState>>,
    config: Rc<RefCell<EditorConfig>>,
    selected_nodes: Rc<VecModel<i32>>,
    listeners: Rc<RefCell<Listeners>>,
}

impl Default for SpliceEditorController {
    fn default() -> Self {
        Self::new()
    }
}

impl SpliceEditorController {
    /// Create a controller with an empty graph and default settings.
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        let mut graph = DiagramGraph::new();
        graph.set_grid_size(config.grid_size);
        Self {
            graph: Rc::new(RefCell::new(graph)),
            selection: Rc::new(RefCell::new(SelectionManager::new())),
            hover: Rc::new(RefCell::new(HoverTracker::new())),
            scene: Rc::new(RefCell::new(GeometryScene::new(SceneParams::from(&config)))),
            drag: Rc::new(RefCell::new(DragState::new())),
            config: Rc::new(RefCell::new(config)),
            selected_nodes: Rc::new(VecModel::default()),
            listeners: Rc::new(RefCell::new(Listeners::default())),
        }
    }

    /// Shared handle to the diagram graph.
    ///
    /// Call [`sync_scene_links`](Self::sync_scene_links) after changing links
    /// through it.
    pub fn graph(&self) -> Rc<RefCell<DiagramGraph>> {
        self.graph.clone()
    }

    /// Replace the diagram, ending any gesture and dropping selection and hover.
    pub fn set_graph(&self, mut graph: DiagramGraph) {
        graph.set_grid_size(self.config.borrow().grid_size);
        self.drag.borrow_mut().eject();
        {
            let mut scene = self.scene.borrow_mut();
            self.hover.borrow_mut().clear_hover(&mut *scene);
        }
        self.selection.borrow_mut().clear();
        *self.graph.borrow_mut() = graph;
        self.sync_scene_links();
        self.sync_selection_model();
    }

    pub fn config(&self) -> EditorConfig {
        self.config.borrow().clone()
    }

    pub fn set_splice_policy(&self, policy: SplicePolicy) {
        self.config.borrow_mut().splice.policy = policy;
    }

    pub fn set_grid_size(&self, size: f32) {
        self.config.borrow_mut().grid_size = size;
        self.graph.borrow_mut().set_grid_size(size);
    }

    pub fn hovered_link(&self) -> Option<LinkId> {
        self.hover.borrow().hovered_link()
    }

    pub fn selected_nodes(&self) -> Vec<NodeId> {
        self.selection.borrow().selected_nodes().collect()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.borrow().is_dragging()
    }

    /// Model of hovered link ids (at most one) for link highlighting.
    pub fn hovered_links_model(&self) -> ModelRc<i32> {
        self.scene.borrow().hovered_links_model()
    }

    /// Model of selected node ids, in selection order.
    pub fn selected_nodes_model(&self) -> ModelRc<i32> {
        ModelRc::from(self.selected_nodes.clone())
    }

    /// Called once per drag gesture that moved something.
    pub fn on_diagram_changed(&self, listener: impl Fn() + 'static) {
        self.listeners.borrow_mut().changed.push(Rc::new(listener));
    }

    /// Called when the diagram needs to be redrawn.
    pub fn on_repaint(&self, listener: impl Fn() + 'static) {
        self.listeners.borrow_mut().repaint.push(Rc::new(listener));
    }

    // === Callback factories ===

    /// Returns a callback for `pointer-pressed(x, y)`.
    pub fn pointer_down_callback(&self) -> impl Fn(f32, f32) {
        let ctrl = self.clone();
        move |x, y| {
            ctrl.handle_pointer_down_at(x, y, Modifiers::default());
        }
    }

    /// Returns a callback for `pointer-moved(x, y)`.
    pub fn pointer_move_callback(&self) -> impl Fn(f32, f32) {
        let ctrl = self.clone();
        move |x, y| ctrl.handle_pointer_move(&PointerEvent::at(x, y))
    }

    /// Returns a callback for `pointer-released(x, y)`.
    pub fn pointer_up_callback(&self) -> impl Fn(f32, f32) {
        let ctrl = self.clone();
        move |x, y| {
            ctrl.handle_pointer_up(&PointerEvent::at(x, y));
        }
    }

    /// Returns a callback for `node-rect-changed(id, x, y, w, h)`, screen space.
    pub fn node_rect_callback(&self) -> impl Fn(i32, f32, f32, f32, f32) {
        let ctrl = self.clone();
        move |id, x, y, w, h| ctrl.handle_node_rect(NodeId(id), x, y, w, h)
    }

    /// Returns a callback for `pin-position-changed(pin, node, rel-x, rel-y)`.
    pub fn pin_position_callback(&self) -> impl Fn(i32, i32, f32, f32) {
        let ctrl = self.clone();
        move |pin, node, rel_x, rel_y| ctrl.handle_pin_position(PortId(pin), NodeId(node), rel_x, rel_y)
    }

    // === Direct handlers ===

    /// Handle node-rect-changed: convert screen→world and update the cache.
    pub fn handle_node_rect(&self, id: NodeId, x: f32, y: f32, w: f32, h: f32) {
        let mut scene = self.scene.borrow_mut();
        let viewport = scene.viewport();
        let z = viewport.effective_zoom();
        let origin = viewport.to_world(Point::new(x, y));
        scene.cache_mut().update_node_rect(id, origin.x, origin.y, w / z, h / z);
    }

    /// Handle pin-position-changed. Offsets are relative to the node, world space.
    pub fn handle_pin_position(&self, pin: PortId, node: NodeId, rel_x: f32, rel_y: f32) {
        self.scene.borrow_mut().cache_mut().handle_pin_report(pin, node, rel_x, rel_y);
    }

    /// Set viewport state: zoom, pan_x, pan_y.
    pub fn set_viewport(&self, zoom: f32, pan_x: f32, pan_y: f32) {
        self.scene.borrow_mut().set_viewport(Viewport::new(zoom, pan_x, pan_y));
    }

    pub fn viewport(&self) -> Viewport {
        self.scene.borrow().viewport()
    }

    /// Get the current zoom level.
    pub fn zoom(&self) -> f32 {
        self.viewport().zoom
    }

    /// Rebuild the scene's link table and node positions from the graph.
    pub fn sync_scene_links(&self) {
        let graph = self.graph.borrow();
        let mut scene = self.scene.borrow_mut();
        scene.sync_links(&graph);
        scene.cache_mut().sync_positions(&graph);
    }

    /// Start a gesture at a screen point, hit-testing the scene for the target.
    /// `modifiers` travel on the event but do not change what gets selected.
    pub fn handle_pointer_down_at(&self, x: f32, y: f32, modifiers: Modifiers) -> PointerDown {
        let path = self.scene.borrow().target_path_at(x, y);
        let event = PointerEvent::at(x, y).with_target_path(path).with_modifiers(modifiers);
        self.handle_pointer_down(&event)
    }

    pub fn handle_pointer_down(&self, event: &PointerEvent) -> PointerDown {
        self.drag.borrow_mut().on_activate();
        let (result, canvas) = self.run_drag(|drag, ctx| drag.on_pointer_down(ctx, event));

        if let PointerDown::Selected(EntityRef::Node(id)) = result {
            self.scene.borrow_mut().cache_mut().raise_node(id);
        }
        self.sync_selection_model();
        self.dispatch(canvas);
        result
    }

    pub fn handle_pointer_move(&self, event: &PointerEvent) {
        let ((), canvas) = self.run_drag(|drag, ctx| drag.on_pointer_move(ctx, event));
        {
            let graph = self.graph.borrow();
            self.scene.borrow_mut().cache_mut().sync_positions(&graph);
        }
        self.dispatch(canvas);
    }

    pub fn handle_pointer_up(&self, event: &PointerEvent) -> DragSummary {
        let (summary, canvas) = self.run_drag(|drag, ctx| drag.on_pointer_up(ctx, event));

        if summary.splice.is_some() {
            self.sync_scene_links();
            let graph = self.graph.borrow();
            self.selection.borrow_mut().retain(|entity| match entity {
                EntityRef::Node(id) => graph.contains_node(id),
                EntityRef::Link(id) => graph.contains_link(id),
            });
        } else {
            let graph = self.graph.borrow();
            self.scene.borrow_mut().cache_mut().sync_positions(&graph);
        }
        self.sync_selection_model();
        self.dispatch(canvas);
        summary
    }

    /// Abandon the current gesture without notifying anyone.
    pub fn eject(&self) {
        self.drag.borrow_mut().eject();
    }

    /// Replace the selection with everything inside a screen-space box.
    pub fn handle_box_selection(&self, x: f32, y: f32, width: f32, height: f32) {
        let entities = self.scene.borrow().entities_in_box(x, y, width, height);
        self.selection.borrow_mut().replace_selection(entities);
        self.sync_selection_model();
    }

    // === Internals ===

    fn run_drag<R>(&self, f: impl FnOnce(&mut DragState, &mut DragContext<'_>) -> R) -> (R, HostCanvas) {
        let mut canvas = HostCanvas::new(self.scene.borrow().viewport());
        let result = {
            let mut graph = self.graph.borrow_mut();
            let mut selection = self.selection.borrow_mut();
            let mut hover = self.hover.borrow_mut();
            let mut scene = self.scene.borrow_mut();
            let mut drag = self.drag.borrow_mut();
            let config = self.config.borrow();
            let mut ctx = DragContext {
                graph: &mut *graph,
                selection: &mut *selection,
                hover: &mut *hover,
                scene: &mut *scene,
                canvas: &mut canvas,
                splice: &config.splice,
            };
            f(&mut *drag, &mut ctx)
        };
        (result, canvas)
    }

    fn sync_selection_model(&self) {
        self.selection.borrow().sync_to_model(&self.selected_nodes);
    }

    fn dispatch(&self, canvas: HostCanvas) {
        // Snapshot so listeners can register further listeners.
        let (changed, repaint) = {
            let listeners = self.listeners.borrow();
            (listeners.changed.clone(), listeners.repaint.clone())
        };
        for event in &canvas.events {
            match event {
                CanvasEvent::DiagramChanged => changed.iter().for_each(|l| l()),
            }
        }
        if canvas.repaints > 0 {
            repaint.iter().for_each(|l| l());
        }
    }
}
