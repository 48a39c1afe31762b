//! Common test utilities for integration tests.

#![allow(dead_code)]

pub mod harness;

use std::cell::RefCell;
use std::rc::Rc;

/// Route `log` output through the test harness; `RUST_LOG=debug` shows it.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Tracks controller notifications for testing.
#[derive(Default, Clone)]
pub struct CallbackTracker {
    /// Count of diagram_changed calls
    pub diagram_changed: Rc<RefCell<usize>>,
    /// Count of repaint calls
    pub repaints: Rc<RefCell<usize>>,
}

impl CallbackTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changed_count(&self) -> usize {
        *self.diagram_changed.borrow()
    }

    pub fn repaint_count(&self) -> usize {
        *self.repaints.borrow()
    }

    /// Clear all recorded callbacks.
    pub fn clear(&self) {
        *self.diagram_changed.borrow_mut() = 0;
        *self.repaints.borrow_mut() = 0;
    }
}
