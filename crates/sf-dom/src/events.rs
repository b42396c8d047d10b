//! Event objects and listener bookkeeping.
//!
//! Listeners are plain data: a handler value of the caller's choosing bound to
//! a node and an event kind. Whoever owns the [`Listeners`] table walks
//! [`crate::Document::event_path`] and runs the handlers it finds.

use crate::NodeId;

/// Event types the page reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Change,
    Submit,
    TouchStart,
    TouchEnd,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Change => "change",
            Self::Submit => "submit",
            Self::TouchStart => "touchstart",
            Self::TouchEnd => "touchend",
        }
    }
}

/// A dispatched event and its propagation flags.
#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent {
    pub kind: EventKind,
    pub target: NodeId,
    pub current_target: NodeId,
    /// Horizontal coordinate of the (first changed) touch point.
    pub client_x: Option<f64>,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl DomEvent {
    pub fn new(kind: EventKind, target: NodeId) -> Self {
        Self {
            kind,
            target,
            current_target: target,
            client_x: None,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn with_client_x(mut self, x: f64) -> Self {
        self.client_x = Some(x);
        self
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

#[derive(Debug, Clone)]
struct ListenerEntry<H> {
    node: NodeId,
    kind: EventKind,
    handler: H,
}

/// Registration-ordered listener table.
#[derive(Debug, Clone)]
pub struct Listeners<H> {
    entries: Vec<ListenerEntry<H>>,
}

impl<H> Default for Listeners<H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<H: Clone> Listeners<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: NodeId, kind: EventKind, handler: H) {
        self.entries.push(ListenerEntry {
            node,
            kind,
            handler,
        });
    }

    /// Moves every entry of `other` after the existing ones.
    pub fn append(&mut self, other: &mut Self) {
        self.entries.append(&mut other.entries);
    }

    /// Handlers bound to `node` for `kind`, in registration order.
    pub fn handlers(&self, node: NodeId, kind: EventKind) -> Vec<H> {
        self.entries
            .iter()
            .filter(|entry| entry.node == node && entry.kind == kind)
            .map(|entry| entry.handler.clone())
            .collect()
    }

    pub fn count_on(&self, node: NodeId) -> usize {
        self.entries.iter().filter(|entry| entry.node == node).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::DomEvent;
    use super::EventKind;
    use super::Listeners;
    use crate::Document;

    #[test]
    fn handlers_are_filtered_by_node_and_kind() {
        let mut doc = Document::new();
        let button = doc.create_element("button");
        let mut listeners = Listeners::new();
        listeners.add(button, EventKind::Click, "first");
        listeners.add(button, EventKind::TouchEnd, "touch");
        listeners.add(button, EventKind::Click, "second");
        listeners.add(doc.root(), EventKind::Click, "document");

        assert_eq!(listeners.handlers(button, EventKind::Click), vec!["first", "second"]);
        assert_eq!(listeners.count_on(button), 3);
        assert_eq!(listeners.len(), 4);
        assert!(listeners.handlers(button, EventKind::Submit).is_empty());
    }

    #[test]
    fn appended_listeners_run_after_existing_ones() {
        let mut doc = Document::new();
        let button = doc.create_element("button");
        let mut listeners = Listeners::new();
        listeners.add(button, EventKind::Click, "kept");
        let mut pending = Listeners::new();
        pending.add(button, EventKind::Click, "merged");

        listeners.append(&mut pending);
        assert!(pending.is_empty());
        assert_eq!(listeners.handlers(button, EventKind::Click), vec!["kept", "merged"]);
    }

    #[test]
    fn propagation_flags_start_cleared() {
        let doc = Document::new();
        let mut event = DomEvent::new(EventKind::Submit, doc.root()).with_client_x(12.0);
        assert!(!event.is_default_prevented());
        assert!(!event.is_propagation_stopped());
        event.prevent_default();
        event.stop_propagation();
        assert!(event.is_default_prevented());
        assert!(event.is_propagation_stopped());
        assert_eq!(event.client_x, Some(12.0));
    }
}
