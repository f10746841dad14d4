//! Deferred work, run on the next [`Editor::tick`](crate::Editor::tick).
//!
//! Tasks are never cancelled. Each carries the scene generation it was
//! captured in so the hook it runs can tell whether a reload happened since.

use crate::input::InputEvent;
use annota_core::HitTarget;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// A canvas click that switched tools; the new tool gets the click.
    ShapeClick {
        plugin: usize,
        event: InputEvent,
        target: HitTarget,
        generation: u64,
    },
    /// One-shot tool winding down. Only applies if it is still current.
    Deactivate { plugin: usize },
    /// Scheduled by a plugin through its hook params.
    Deferred {
        plugin: usize,
        token: u64,
        generation: u64,
    },
}

#[derive(Debug, Default)]
pub struct TaskQueue {
    queue: VecDeque<Task>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: Task) {
        log::trace!("task queued: {task:?}");
        self.queue.push_back(task);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Everything queued so far, in order. Tasks pushed while these run
    /// wait for the next call.
    pub fn take_ready(&mut self) -> Vec<Task> {
        self.queue.drain(..).collect()
    }
}
