//! Pointer gesture that moves the selected nodes and splices on release.
//!
//! A session runs `on_activate` → `on_pointer_down` → `on_pointer_move`* →
//! `on_pointer_up`. Every collaborator is handed in through [`DragContext`]
//! per call; the state machine owns only the per-gesture bookkeeping.

use std::collections::HashMap;

use crate::config::SpliceConfig;
use crate::graph::DiagramGraph;
use crate::hover::{detect_link_under_pointer, HoverTracker, SceneQuery};
use crate::selection::SelectionManager;
use crate::splice::{DroppedNode, SpliceCommand, SpliceOutcome};
use crate::types::{EntityRef, NodeId, Point, PointerEvent, TargetElement};

/// Notifications the gesture sends to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CanvasEvent {
    /// Sent at most once per gesture, when the dragged entity ended up
    /// somewhere else than it started.
    DiagramChanged,
}

/// Host surface the drag gesture renders into.
pub trait Canvas {
    /// Schedule a redraw of the diagram.
    fn repaint(&mut self);

    /// Current zoom factor.
    fn zoom(&self) -> f32;

    /// Convert a screen point to diagram coordinates.
    fn relative_point(&self, screen: Point) -> Point;

    fn fire_event(&mut self, event: CanvasEvent);
}

/// Borrowed collaborators for a single event.
pub struct DragContext<'a> {
    pub graph: &'a mut DiagramGraph,
    pub selection: &'a mut SelectionManager,
    pub hover: &'a mut HoverTracker,
    pub scene: &'a mut dyn SceneQuery,
    pub canvas: &'a mut dyn Canvas,
    pub splice: &'a SpliceConfig,
}

impl DragContext<'_> {
    fn sample_hover(&mut self, screen: Point) {
        let link = detect_link_under_pointer(&*self.scene, screen.x, screen.y);
        self.hover.set_hover(&mut *self.scene, link);
    }

    fn entity_position(&self, entity: EntityRef) -> Option<Point> {
        entity.as_node().and_then(|id| self.graph.position(id))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragPhase {
    #[default]
    Inactive,
    Active,
    Dragging,
}

/// What a pointer-down did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerDown {
    /// No session is active.
    Ignored,
    /// A drag-blocking element sat above the entity; the session was ejected.
    Rejected,
    /// Nothing draggable under the pointer.
    NoEntity,
    Selected(EntityRef),
}

/// Result of finishing a gesture.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DragSummary {
    /// Set when a node was dropped onto a hovered link.
    pub splice: Option<SpliceOutcome>,
    /// Whether the host was told the diagram changed.
    pub changed: bool,
}

#[derive(Debug, Default)]
pub struct DragState {
    phase: DragPhase,
    origin: Option<Point>,
    snapshots: HashMap<NodeId, Point>,
    initial_position: Option<Point>,
    final_position: Option<Point>,
}

impl DragState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn is_dragging(&self) -> bool {
        self.phase == DragPhase::Dragging
    }

    /// Start a new session, forgetting everything from the previous one.
    pub fn on_activate(&mut self) {
        self.reset();
        self.phase = DragPhase::Active;
    }

    /// Abandon the current session. No listener is notified.
    pub fn eject(&mut self) {
        if self.phase != DragPhase::Inactive {
            log::debug!("Drag session ejected in phase {:?}", self.phase);
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.phase = DragPhase::Inactive;
        self.origin = None;
        self.snapshots.clear();
        self.initial_position = None;
        self.final_position = None;
    }

    pub fn on_pointer_down(&mut self, ctx: &mut DragContext<'_>, event: &PointerEvent) -> PointerDown {
        if self.phase == DragPhase::Inactive {
            return PointerDown::Ignored;
        }
        if is_blocked(&event.target_path) {
            log::debug!("Pointer down at {:?} landed on a no-drag element", event.position);
            self.eject();
            return PointerDown::Rejected;
        }

        let Some(entity) = event.target_path.iter().find_map(|el| el.entity) else {
            return PointerDown::NoEntity;
        };

        if !ctx.selection.contains(entity) {
            ctx.selection.clear();
        }
        ctx.selection.select(entity);

        ctx.sample_hover(event.position);
        ctx.canvas.repaint();

        let position = ctx.entity_position(entity);
        self.origin = Some(event.position);
        self.initial_position = position;
        self.final_position = position;
        self.phase = DragPhase::Dragging;
        PointerDown::Selected(entity)
    }

    pub fn on_pointer_move(&mut self, ctx: &mut DragContext<'_>, event: &PointerEvent) {
        if self.phase != DragPhase::Dragging {
            return;
        }
        let Some(origin) = self.origin else {
            return;
        };

        ctx.sample_hover(event.position);

        let zoom = effective_zoom(ctx.canvas.zoom());
        let dx = (event.position.x - origin.x) / zoom;
        let dy = (event.position.y - origin.y) / zoom;

        let selected: Vec<NodeId> = ctx.selection.selected_nodes().collect();
        for id in selected {
            if ctx.graph.is_locked(id) {
                continue;
            }
            let Some(current) = ctx.graph.position(id) else {
                continue;
            };
            let start = *self.snapshots.entry(id).or_insert(current);
            let moved = Point::new(
                ctx.graph.grid_position(start.x + dx),
                ctx.graph.grid_position(start.y + dy),
            );
            if ctx.graph.set_position(id, moved).is_ok() {
                self.final_position = Some(moved);
            }
        }

        ctx.canvas.repaint();
    }

    /// Finish the gesture. A session whose pointer-down found no entity ends
    /// here without touching anything.
    pub fn on_pointer_up(&mut self, ctx: &mut DragContext<'_>, event: &PointerEvent) -> DragSummary {
        if self.phase != DragPhase::Dragging {
            self.reset();
            return DragSummary::default();
        }

        let hovered = ctx.hover.hovered_link();
        let dragged = ctx.selection.first_node();

        let mut summary = DragSummary::default();
        if let (Some(link), Some(node)) = (hovered, dragged) {
            let drop_point = ctx.canvas.relative_point(event.position);
            let before = ctx.graph.position(node);
            let outcome = SpliceCommand::new(DroppedNode::Existing(node), link, drop_point)
                .with_config(ctx.splice.clone())
                .execute(&mut *ctx.graph);
            summary.splice = Some(outcome);
            let after = ctx.graph.position(node);
            if after != before {
                self.final_position = after;
            }
        }

        ctx.hover.clear_hover(&mut *ctx.scene);

        if self.initial_position != self.final_position {
            ctx.canvas.fire_event(CanvasEvent::DiagramChanged);
            summary.changed = true;
        }
        ctx.canvas.repaint();

        self.reset();
        summary
    }
}

/// A drag-blocking element met before any entity-carrying element.
fn is_blocked(path: &[TargetElement]) -> bool {
    for element in path {
        if element.blocks_drag {
            return true;
        }
        if element.entity.is_some() {
            return false;
        }
    }
    false
}

fn effective_zoom(zoom: f32) -> f32 {
    if zoom > 0.0 {
        zoom
    } else {
        1.0
    }
}
