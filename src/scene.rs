//! Geometry-backed scene: the hit-testing view of what the UI has rendered.
//!
//! The UI reports node rectangles and pin offsets (world space) as it lays
//! them out. [`GeometryScene`] projects them through the current [`Viewport`]
//! and answers front-to-back hit queries in screen space, so results match
//! what the user sees. The link hover marker lives in a slint model of
//! hovered link ids the UI binds its link highlighting to.

use crate::config::EditorConfig;
use crate::graph::DiagramGraph;
use crate::hit_test::{
    find_pin_at, links_in_selection_box, links_near, nodes_at, nodes_in_selection_box, LinkGeometry,
    LinkHitParams, NodeGeometry, PinGeometry,
};
use crate::hover::{SceneElement, SceneQuery};
use crate::types::{EntityRef, LinkId, NodeId, Point, PortId, TargetElement};
use slint::{Model, ModelRc, VecModel};
use std::collections::HashMap;
use std::rc::Rc;

/// Zoom and pan of the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub zoom: f32,
    pub pan: Point,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { zoom: 1.0, pan: Point::default() }
    }
}

impl Viewport {
    pub fn new(zoom: f32, pan_x: f32, pan_y: f32) -> Self {
        Self { zoom, pan: Point::new(pan_x, pan_y) }
    }

    /// Zoom clamped to a usable positive value.
    pub fn effective_zoom(&self) -> f32 {
        if self.zoom > 0.0 {
            self.zoom
        } else {
            1.0
        }
    }

    /// Screen → world: `(screen - pan) / zoom`
    pub fn to_world(&self, screen: Point) -> Point {
        let z = self.effective_zoom();
        Point::new((screen.x - self.pan.x) / z, (screen.y - self.pan.y) / z)
    }

    /// World → screen: `world * zoom + pan`
    pub fn to_screen(&self, world: Point) -> Point {
        let z = self.effective_zoom();
        Point::new(world.x * z + self.pan.x, world.y * z + self.pan.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StoredPin {
    pub node: NodeId,
    /// Offset from the node's origin, world space.
    pub offset: Point,
}

/// Node rectangles and pin offsets as last reported by the UI, world space.
///
/// Nodes are kept in paint order; the last one is drawn on top.
#[derive(Debug, Default)]
pub struct GeometryCache {
    node_rects: HashMap<NodeId, NodeGeometry>,
    paint_order: Vec<NodeId>,
    pins: HashMap<PortId, StoredPin>,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_node_rect(&mut self, id: NodeId, x: f32, y: f32, width: f32, height: f32) {
        if self.node_rects.insert(id, NodeGeometry::new(id, x, y, width, height)).is_none() {
            self.paint_order.push(id);
        }
    }

    /// Move a known node, keeping its size. Unknown nodes are ignored.
    pub fn move_node(&mut self, id: NodeId, origin: Point) {
        if let Some(rect) = self.node_rects.get_mut(&id) {
            rect.origin = origin;
        }
    }

    /// Paint the node above all others.
    pub fn raise_node(&mut self, id: NodeId) {
        if let Some(index) = self.paint_order.iter().position(|n| *n == id) {
            let id = self.paint_order.remove(index);
            self.paint_order.push(id);
        }
    }

    pub fn remove_node(&mut self, id: NodeId) {
        self.node_rects.remove(&id);
        self.paint_order.retain(|n| *n != id);
        self.pins.retain(|_, pin| pin.node != id);
    }

    pub fn node_rect(&self, id: NodeId) -> Option<NodeGeometry> {
        self.node_rects.get(&id).copied()
    }

    pub fn handle_pin_report(&mut self, pin: PortId, node: NodeId, rel_x: f32, rel_y: f32) {
        self.pins.insert(pin, StoredPin { node, offset: Point::new(rel_x, rel_y) });
    }

    pub fn pin(&self, pin: PortId) -> Option<StoredPin> {
        self.pins.get(&pin).copied()
    }

    /// World position of a pin; `None` while its node has no rectangle.
    pub fn pin_position(&self, pin: PortId) -> Option<Point> {
        let stored = self.pins.get(&pin)?;
        let rect = self.node_rects.get(&stored.node)?;
        Some(rect.origin.offset(stored.offset.x, stored.offset.y))
    }

    /// Nodes in paint order, bottom first.
    pub fn nodes(&self) -> impl Iterator<Item = NodeGeometry> + '_ {
        self.paint_order.iter().filter_map(|id| self.node_rects.get(id).copied())
    }

    /// Pins with absolute world positions. Orphan pins are skipped.
    pub fn absolute_pins(&self) -> impl Iterator<Item = PinGeometry> + '_ {
        self.pins.iter().filter_map(|(&id, stored)| {
            Some(PinGeometry { id, node: stored.node, position: self.pin_position(id)? })
        })
    }

    /// Pull node positions from the graph for every node the cache knows.
    pub fn sync_positions(&mut self, graph: &DiagramGraph) {
        for node in graph.nodes() {
            self.move_node(node.id, node.position);
        }
    }
}

/// Hit-testing parameters in screen pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneParams {
    pub hover_distance: f32,
    pub pin_hit_radius: f32,
    pub bezier_min_offset: f32,
    pub hit_samples: usize,
}

impl Default for SceneParams {
    fn default() -> Self {
        Self::from(&EditorConfig::default())
    }
}

impl From<&EditorConfig> for SceneParams {
    fn from(config: &EditorConfig) -> Self {
        Self {
            hover_distance: config.hover_distance,
            pin_hit_radius: config.pin_hit_radius,
            bezier_min_offset: config.bezier_min_offset,
            hit_samples: config.hit_samples,
        }
    }
}

/// [`SceneQuery`] over a [`GeometryCache`].
///
/// Front-to-back order of hits: pins, nodes (topmost painted first), links
/// (closest first), then the background.
pub struct GeometryScene {
    cache: GeometryCache,
    links: Vec<(LinkId, PortId, PortId)>,
    viewport: Viewport,
    params: SceneParams,
    hovered_links: Rc<VecModel<i32>>,
}

impl Default for GeometryScene {
    fn default() -> Self {
        Self::new(SceneParams::default())
    }
}

impl GeometryScene {
    pub fn new(params: SceneParams) -> Self {
        Self {
            cache: GeometryCache::new(),
            links: Vec::new(),
            viewport: Viewport::default(),
            params,
            hovered_links: Rc::new(VecModel::default()),
        }
    }

    pub fn cache(&self) -> &GeometryCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut GeometryCache {
        &mut self.cache
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Model of hovered link ids for the UI to bind its highlight to.
    pub fn hovered_links_model(&self) -> ModelRc<i32> {
        ModelRc::from(self.hovered_links.clone())
    }

    pub fn is_link_hovered(&self, id: LinkId) -> bool {
        self.hovered_links.iter().any(|l| l == id.0)
    }

    /// Register a rendered link for hit testing. Re-registering replaces it.
    pub fn register_link(&mut self, id: LinkId, source: PortId, target: PortId) {
        self.unregister_link(id);
        self.links.push((id, source, target));
    }

    pub fn unregister_link(&mut self, id: LinkId) {
        self.links.retain(|&(lid, _, _)| lid != id);
        self.set_link_hovered(id, false);
    }

    pub fn registered_links(&self) -> impl Iterator<Item = LinkId> + '_ {
        self.links.iter().map(|&(id, _, _)| id)
    }

    /// Replace the link table with the fully connected links of `graph` and
    /// drop markers of links that no longer exist.
    pub fn sync_links(&mut self, graph: &DiagramGraph) {
        let mut links: Vec<(LinkId, PortId, PortId)> = graph
            .links()
            .filter_map(|l| Some((l.id, l.source?, l.target?)))
            .collect();
        links.sort_by_key(|&(id, _, _)| id);
        self.links = links;

        let mut i = 0;
        while i < self.hovered_links.row_count() {
            let id = self.hovered_links.row_data(i).unwrap_or_default();
            if graph.contains_link(LinkId(id)) {
                i += 1;
            } else {
                self.hovered_links.remove(i);
            }
        }
    }

    fn link_geometry_screen(&self) -> Vec<LinkGeometry> {
        self.links
            .iter()
            .filter_map(|&(id, source, target)| {
                let start = self.cache.pin_position(source)?;
                let end = self.cache.pin_position(target)?;
                Some(LinkGeometry {
                    id,
                    start: self.viewport.to_screen(start),
                    end: self.viewport.to_screen(end),
                })
            })
            .collect()
    }

    fn pins_screen(&self) -> impl Iterator<Item = PinGeometry> + '_ {
        self.cache.absolute_pins().map(move |pin| PinGeometry {
            position: self.viewport.to_screen(pin.position),
            ..pin
        })
    }

    fn nodes_screen_topmost_first(&self) -> Vec<NodeGeometry> {
        let z = self.viewport.effective_zoom();
        let mut nodes: Vec<NodeGeometry> = self
            .cache
            .nodes()
            .map(|n| NodeGeometry {
                origin: self.viewport.to_screen(n.origin),
                width: n.width * z,
                height: n.height * z,
                ..n
            })
            .collect();
        nodes.reverse();
        nodes
    }

    /// Build the target chain a pointer event at the screen point carries:
    /// the hit element first, then the node it sits in.
    ///
    /// Pins block drags (they start link creation instead).
    pub fn target_path_at(&self, x: f32, y: f32) -> Vec<TargetElement> {
        let mut path = Vec::new();
        for element in self.elements_at_point(x, y) {
            match element {
                SceneElement::Pin(pin) => {
                    path.push(TargetElement::blocking());
                    if let Some(stored) = self.cache.pin(pin) {
                        path.push(TargetElement::entity(EntityRef::Node(stored.node)));
                    }
                    return path;
                }
                SceneElement::Node(id) => {
                    path.push(TargetElement::entity(EntityRef::Node(id)));
                    return path;
                }
                SceneElement::Link(id) => {
                    path.push(TargetElement::entity(EntityRef::Link(id)));
                    return path;
                }
                SceneElement::Background => path.push(TargetElement::plain()),
            }
        }
        path
    }

    /// Nodes overlapping, and links with an endpoint inside, a screen-space
    /// selection box. Nodes come first.
    pub fn entities_in_box(&self, x: f32, y: f32, width: f32, height: f32) -> Vec<EntityRef> {
        let z = self.viewport.effective_zoom();
        let origin = self.viewport.to_world(Point::new(x, y));
        let (width, height) = (width / z, height / z);

        let links: Vec<LinkGeometry> = self
            .links
            .iter()
            .filter_map(|&(id, source, target)| {
                Some(LinkGeometry {
                    id,
                    start: self.cache.pin_position(source)?,
                    end: self.cache.pin_position(target)?,
                })
            })
            .collect();

        nodes_in_selection_box(origin, width, height, self.cache.nodes())
            .into_iter()
            .map(EntityRef::Node)
            .chain(
                links_in_selection_box(origin, width, height, links)
                    .into_iter()
                    .map(EntityRef::Link),
            )
            .collect()
    }
}

impl SceneQuery for GeometryScene {
    fn elements_at_point(&self, x: f32, y: f32) -> Vec<SceneElement> {
        let point = Point::new(x, y);
        let mut elements = Vec::new();

        if let Some(pin) = find_pin_at(point, self.pins_screen(), self.params.pin_hit_radius) {
            elements.push(SceneElement::Pin(pin));
        }

        elements.extend(
            nodes_at(point, self.nodes_screen_topmost_first())
                .into_iter()
                .map(SceneElement::Node),
        );

        let params = LinkHitParams {
            hover_distance: self.params.hover_distance,
            zoom: self.viewport.effective_zoom(),
            bezier_min_offset: self.params.bezier_min_offset,
            hit_samples: self.params.hit_samples,
        };
        elements.extend(
            links_near(point, self.link_geometry_screen(), &params)
                .into_iter()
                .map(|(id, _)| SceneElement::Link(id)),
        );

        elements.push(SceneElement::Background);
        elements
    }

    fn set_link_hovered(&mut self, link: LinkId, hovered: bool) -> bool {
        let row = self.hovered_links.iter().position(|l| l == link.0);
        if !hovered {
            if let Some(row) = row {
                self.hovered_links.remove(row);
            }
            return row.is_some() || self.links.iter().any(|&(id, _, _)| id == link);
        }
        if !self.links.iter().any(|&(id, _, _)| id == link) {
            return false;
        }
        if row.is_none() {
            self.hovered_links.push(link.0);
        }
        true
    }
}
