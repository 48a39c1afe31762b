//! Detection and tracking of the link under the pointer.
//!
//! [`detect_link_under_pointer`] asks a [`SceneQuery`] what is rendered at a
//! screen point; [`HoverTracker`] remembers the last detected link and keeps
//! the scene's hover marker in sync with it. All hover changes in an editor
//! session go through one tracker, so at most one link is marked at a time.

use crate::types::{LinkId, NodeId, PortId};

/// A rendered element reported by a scene hit test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneElement {
    Pin(PortId),
    Node(NodeId),
    Link(LinkId),
    Background,
}

impl SceneElement {
    /// The link this element belongs to, if any.
    pub fn link_id(&self) -> Option<LinkId> {
        match self {
            SceneElement::Link(id) => Some(*id),
            _ => None,
        }
    }
}

/// Capability interface over the rendering backend.
pub trait SceneQuery {
    /// Elements under the screen point, topmost first.
    fn elements_at_point(&self, x: f32, y: f32) -> Vec<SceneElement>;

    /// Toggle the hover marker on a link's rendered element.
    ///
    /// Returns `false` when the link has no rendered element.
    fn set_link_hovered(&mut self, link: LinkId, hovered: bool) -> bool;
}

/// The link under the screen point: the first element in front-to-back order
/// that belongs to a link.
pub fn detect_link_under_pointer<S>(scene: &S, x: f32, y: f32) -> Option<LinkId>
where
    S: SceneQuery + ?Sized,
{
    scene
        .elements_at_point(x, y)
        .iter()
        .find_map(SceneElement::link_id)
}

/// Holds the currently hovered link of one editor session.
#[derive(Debug, Default)]
pub struct HoverTracker {
    hovered: Option<LinkId>,
}

impl HoverTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered_link(&self) -> Option<LinkId> {
        self.hovered
    }

    /// Make `link` the hovered link.
    ///
    /// Repeating the current value does nothing. The tracked id always becomes
    /// `link`, even when the scene has no element to mark for it.
    pub fn set_hover<S>(&mut self, scene: &mut S, link: Option<LinkId>)
    where
        S: SceneQuery + ?Sized,
    {
        if link == self.hovered {
            return;
        }
        self.clear_hover(scene);
        if let Some(id) = link {
            if !scene.set_link_hovered(id, true) {
                log::debug!("No rendered element for hovered {}", id);
            }
        }
        log::debug!("Hover changed to {:?}", link);
        self.hovered = link;
    }

    /// Remove the marker from the hovered link and forget it.
    pub fn clear_hover<S>(&mut self, scene: &mut S)
    where
        S: SceneQuery + ?Sized,
    {
        let Some(id) = self.hovered.take() else {
            return;
        };
        scene.set_link_hovered(id, false);
    }

    /// Forget the hovered link without touching the scene, e.g. when the
    /// scene itself was rebuilt.
    pub fn reset(&mut self) {
        self.hovered = None;
    }
}
