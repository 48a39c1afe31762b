//! Identifier, geometry and pointer-event types shared by the editor core.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// Identifier of a node in a [`DiagramGraph`](crate::graph::DiagramGraph).
    NodeId,
    "node#"
);
id_type!(
    /// Identifier of a port. Port ids are unique across the whole graph.
    PortId,
    "port#"
);
id_type!(
    /// Identifier of a link.
    LinkId,
    "link#"
);

/// A 2D point, either in screen or diagram (world) space depending on context.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Translate by `(dx, dy)`.
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    pub fn as_tuple(self) -> (f32, f32) {
        (self.x, self.y)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

/// Reference to a selectable model entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Node(NodeId),
    Link(LinkId),
}

impl EntityRef {
    pub fn as_node(self) -> Option<NodeId> {
        match self {
            EntityRef::Node(id) => Some(id),
            EntityRef::Link(_) => None,
        }
    }
}

/// Keyboard modifier state at the time of a pointer event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

/// One element of the chain from a pointer event's target up to the root.
///
/// An element carrying an `entity` is a draggable model element; `blocks_drag`
/// opts the element (and anything below it) out of drag gestures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TargetElement {
    pub entity: Option<EntityRef>,
    pub blocks_drag: bool,
}

impl TargetElement {
    pub fn entity(entity: EntityRef) -> Self {
        Self { entity: Some(entity), blocks_drag: false }
    }

    pub fn blocking() -> Self {
        Self { entity: None, blocks_drag: true }
    }

    pub fn plain() -> Self {
        Self::default()
    }
}

/// Pointer input as delivered by the host canvas.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointerEvent {
    /// Screen-space pointer position.
    pub position: Point,
    /// Carried for hosts; the press selection rule does not read it.
    pub modifiers: Modifiers,
    /// Target element first, then its ancestors.
    pub target_path: Vec<TargetElement>,
}

impl PointerEvent {
    pub fn at(x: f32, y: f32) -> Self {
        Self { position: Point::new(x, y), ..Default::default() }
    }

    pub fn with_target_path(mut self, path: Vec<TargetElement>) -> Self {
        self.target_path = path;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}
