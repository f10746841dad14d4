//! Undo bookkeeping.
//!
//! Tools never talk to the toolbar directly. They publish on a
//! [`HistoryChannel`] owned by their engine instance; the engine delivers
//! each message to the [`HistoryStack`] and flips the undo entry of the
//! [`ToolbarItemConfig`] on the empty ↔ non-empty edges.
//!
//! The engine only appends. Removing entries (actually undoing) is done by
//! tool or host code, which then announces the result with
//! [`HistoryMessage::Pop`].

use crate::model::NodeSnapshot;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};

/// Toolbar entry driven by the history signal.
pub const UNDO_ITEM: &str = "repeal";

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryMessage {
    /// `PUSH_HISTORY`: a tool committed a node.
    Push(NodeSnapshot),
    /// `POP_HISTORY`: someone removed entries; `remaining` is the stack after.
    Pop { remaining: Vec<NodeSnapshot> },
}

/// Per-engine publish/subscribe mailbox.
///
/// Publishing only needs a shared reference, so tool code can hold the
/// channel alongside mutable scene access.
#[derive(Debug, Default)]
pub struct HistoryChannel {
    queue: RefCell<VecDeque<HistoryMessage>>,
}

impl HistoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, message: HistoryMessage) {
        self.queue.borrow_mut().push_back(message);
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Take every queued message in publish order.
    pub fn drain(&self) -> Vec<HistoryMessage> {
        self.queue.borrow_mut().drain(..).collect()
    }
}

/// Append-only log of committed node snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryStack {
    entries: Vec<NodeSnapshot>,
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[NodeSnapshot] {
        &self.entries
    }

    pub fn last(&self) -> Option<&NodeSnapshot> {
        self.entries.last()
    }

    /// Remove the newest entry. For undo implementations; announce the
    /// result with [`HistoryMessage::Pop`] afterwards.
    pub fn pop(&mut self) -> Option<NodeSnapshot> {
        self.entries.pop()
    }

    /// Discard everything (reload checkpoint).
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolbarItemState {
    pub disabled: bool,
}

/// Per-plugin toolbar state, keyed by plugin name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolbarItemConfig(pub BTreeMap<String, ToolbarItemState>);

impl ToolbarItemConfig {
    /// Every plugin enabled, except the undo entry which starts disabled.
    pub fn for_plugins<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self(
            names
                .into_iter()
                .map(|name| {
                    (
                        name.to_string(),
                        ToolbarItemState {
                            disabled: name == UNDO_ITEM,
                        },
                    )
                })
                .collect(),
        )
    }

    pub fn is_disabled(&self, name: &str) -> Option<bool> {
        self.0.get(name).map(|s| s.disabled)
    }

    /// Set the flag of an existing entry. Returns true if it changed;
    /// unknown names are left alone.
    pub fn set_disabled(&mut self, name: &str, disabled: bool) -> bool {
        match self.0.get_mut(name) {
            Some(state) if state.disabled != disabled => {
                state.disabled = disabled;
                true
            }
            _ => false,
        }
    }
}

/// Deliver one message. Returns true if the toolbar config changed.
pub fn deliver(
    message: HistoryMessage,
    stack: &mut HistoryStack,
    toolbar: &mut ToolbarItemConfig,
) -> bool {
    match message {
        HistoryMessage::Push(snapshot) => {
            let was_empty = stack.is_empty();
            stack.entries.push(snapshot);
            log::trace!("history push, depth {}", stack.len());
            was_empty && toolbar.set_disabled(UNDO_ITEM, false)
        }
        HistoryMessage::Pop { remaining } => {
            log::trace!("history pop announced, {} remaining", remaining.len());
            remaining.is_empty() && toolbar.set_disabled(UNDO_ITEM, true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeId;
    use crate::model::{Node, NodeKind};
    use pretty_assertions::assert_eq;

    fn snapshot(id: &str) -> NodeSnapshot {
        Node::new(NodeId::intern(id), NodeKind::Group).snapshot().unwrap()
    }

    fn toolbar() -> ToolbarItemConfig {
        ToolbarItemConfig::for_plugins(["rect", UNDO_ITEM, "download"])
    }

    #[test]
    fn undo_entry_starts_disabled() {
        let cfg = toolbar();
        assert_eq!(cfg.is_disabled(UNDO_ITEM), Some(true));
        assert_eq!(cfg.is_disabled("rect"), Some(false));
        assert_eq!(cfg.is_disabled("missing"), None);
    }

    #[test]
    fn first_push_enables_undo_once() {
        let mut stack = HistoryStack::new();
        let mut cfg = toolbar();

        assert!(deliver(HistoryMessage::Push(snapshot("h1")), &mut stack, &mut cfg));
        assert!(!deliver(HistoryMessage::Push(snapshot("h2")), &mut stack, &mut cfg));
        assert_eq!(stack.len(), 2);
        assert_eq!(cfg.is_disabled(UNDO_ITEM), Some(false));
    }

    #[test]
    fn pop_to_empty_disables_idempotently() {
        let mut stack = HistoryStack::new();
        let mut cfg = toolbar();
        deliver(HistoryMessage::Push(snapshot("p1")), &mut stack, &mut cfg);
        deliver(HistoryMessage::Push(snapshot("p2")), &mut stack, &mut cfg);

        stack.pop();
        let remaining = stack.entries().to_vec();
        assert!(!deliver(HistoryMessage::Pop { remaining }, &mut stack, &mut cfg));
        assert_eq!(cfg.is_disabled(UNDO_ITEM), Some(false));

        stack.pop();
        assert!(deliver(HistoryMessage::Pop { remaining: vec![] }, &mut stack, &mut cfg));
        assert!(!deliver(HistoryMessage::Pop { remaining: vec![] }, &mut stack, &mut cfg));
        assert_eq!(cfg.is_disabled(UNDO_ITEM), Some(true));
    }

    #[test]
    fn toolbar_without_undo_entry_is_untouched() {
        let mut stack = HistoryStack::new();
        let mut cfg = ToolbarItemConfig::for_plugins(["rect"]);
        let before = cfg.clone();
        assert!(!deliver(HistoryMessage::Push(snapshot("u1")), &mut stack, &mut cfg));
        assert_eq!(cfg, before);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn channel_drains_in_publish_order() {
        let channel = HistoryChannel::new();
        channel.publish(HistoryMessage::Push(snapshot("c1")));
        channel.publish(HistoryMessage::Pop { remaining: vec![] });
        assert_eq!(channel.pending(), 2);

        let drained = channel.drain();
        assert!(matches!(drained[0], HistoryMessage::Push(_)));
        assert!(matches!(drained[1], HistoryMessage::Pop { .. }));
        assert_eq!(channel.pending(), 0);
    }
}
