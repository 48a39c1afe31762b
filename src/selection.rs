use crate::types::{EntityRef, NodeId};
use slint::{Model, VecModel};
use std::collections::HashSet;

/// Selected entities, in the order they were selected.
#[derive(Default, Debug)]
pub struct SelectionManager {
    order: Vec<EntityRef>,
    selected: HashSet<EntityRef>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle selection of an item (e.g., node or link) based on interaction modifiers
    pub fn handle_interaction(&mut self, entity: EntityRef, shift_held: bool) {
        if shift_held {
            if self.contains(entity) {
                self.deselect(entity);
            } else {
                self.select(entity);
            }
        } else {
            if self.len() == 1 && self.contains(entity) {
                return;
            }
            self.clear();
            self.select(entity);
        }
    }

    /// Add an entity to the selection. Already selected entities keep their place.
    pub fn select(&mut self, entity: EntityRef) {
        if self.selected.insert(entity) {
            self.order.push(entity);
        }
    }

    pub fn deselect(&mut self, entity: EntityRef) {
        if self.selected.remove(&entity) {
            self.order.retain(|e| *e != entity);
        }
    }

    /// Clear the current selection
    pub fn clear(&mut self) {
        self.selected.clear();
        self.order.clear();
    }

    /// Replace the current selection with a new set of entities
    pub fn replace_selection<I>(&mut self, entities: I)
    where
        I: IntoIterator<Item = EntityRef>,
    {
        self.clear();
        for entity in entities {
            self.select(entity);
        }
    }

    pub fn contains(&self, entity: EntityRef) -> bool {
        self.selected.contains(&entity)
    }

    pub fn is_node_selected(&self, id: NodeId) -> bool {
        self.contains(EntityRef::Node(id))
    }

    /// Selected entities in selection order
    pub fn iter(&self) -> impl Iterator<Item = EntityRef> + '_ {
        self.order.iter().copied()
    }

    /// Selected nodes in selection order
    pub fn selected_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter().filter_map(EntityRef::as_node)
    }

    /// The earliest selected node, if any
    pub fn first_node(&self) -> Option<NodeId> {
        self.selected_nodes().next()
    }

    /// Drop entities for which `keep` returns false (e.g. after a deletion).
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(EntityRef) -> bool,
    {
        let selected = &mut self.selected;
        self.order.retain(|e| {
            let kept = keep(*e);
            if !kept {
                selected.remove(e);
            }
            kept
        });
    }

    /// Sync the selected node ids to a Slint VecModel
    pub fn sync_to_model(&self, model: &VecModel<i32>) {
        let ids: Vec<i32> = self.selected_nodes().map(|id| id.0).collect();
        let unchanged = model.row_count() == ids.len() && model.iter().zip(&ids).all(|(a, b)| a == *b);
        if !unchanged {
            model.set_vec(ids);
        }
    }

    /// Get the number of selected items
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the selection is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
