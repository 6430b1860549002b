//! Event system - browser-style three-phase propagation
//!
//! Listeners are stored outside the tree, keyed by (element, event type), so
//! cloning or serializing a node never drags callbacks along.
//!
//! ```text
//! capture:   root → … → parent      (ancestors, top-down)
//! at target: target
//! bubble:    parent → … → root      (only if the event bubbles)
//! ```
//!
//! `stop_propagation` lets the current node finish and blocks every later
//! node. `stop_immediate_propagation` also skips the current node's remaining
//! listeners. The flags are sticky: dispatching the same `Event` again
//! without `reset_flags` reaches no listener at all.

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::NodeId;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Where an event currently is in its propagation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EventPhase {
    #[default]
    None,
    Capturing,
    AtTarget,
    Bubbling,
}

/// Pointer data carried by mouse events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MouseDetail {
    pub client_x: i32,
    pub client_y: i32,
    pub ctrl_key: bool,
    pub alt_key: bool,
    pub shift_key: bool,
}

/// An event travelling through the tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    event_type: String,
    bubbles: bool,
    cancelable: bool,
    default_prevented: bool,
    propagation_stopped: bool,
    immediate_propagation_stopped: bool,
    phase: EventPhase,
    target: Option<NodeId>,
    current_target: Option<NodeId>,
    mouse: Option<MouseDetail>,
}

impl Event {
    pub fn new(event_type: impl Into<String>, bubbles: bool, cancelable: bool) -> Self {
        Self {
            event_type: event_type.into(),
            bubbles,
            cancelable,
            default_prevented: false,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
            phase: EventPhase::None,
            target: None,
            current_target: None,
            mouse: None,
        }
    }

    /// A bubbling, cancelable mouse event
    pub fn mouse(event_type: impl Into<String>, detail: MouseDetail) -> Self {
        Self {
            mouse: Some(detail),
            ..Self::new(event_type, true, true)
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn cancelable(&self) -> bool {
        self.cancelable
    }

    pub fn phase(&self) -> EventPhase {
        self.phase
    }

    /// The element the event was dispatched on
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// The element whose listeners are running right now
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target
    }

    pub fn mouse_detail(&self) -> Option<&MouseDetail> {
        self.mouse.as_ref()
    }

    /// Mark the default action as canceled. No effect unless cancelable.
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_propagation_stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn is_immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped
    }

    /// Clear both propagation flags so the event can be dispatched again
    pub fn reset_flags(&mut self) {
        self.propagation_stopped = false;
        self.immediate_propagation_stopped = false;
    }
}

/// Listener callback
pub type EventListener = Box<dyn FnMut(&mut Event)>;

/// Listener storage: element → event type → listeners in registration order
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: AHashMap<NodeId, AHashMap<String, Vec<EventListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener; earlier registrations run first
    pub fn add(&mut self, node_id: NodeId, event_type: impl Into<String>, listener: EventListener) {
        self.listeners
            .entry(node_id)
            .or_default()
            .entry(event_type.into())
            .or_default()
            .push(listener);
    }

    /// Drop every listener of `event_type` on `node_id`
    pub fn clear(&mut self, node_id: NodeId, event_type: &str) {
        if let Some(by_type) = self.listeners.get_mut(&node_id) {
            by_type.remove(event_type);
            if by_type.is_empty() {
                self.listeners.remove(&node_id);
            }
        }
    }

    /// Drop everything registered on `node_id`
    pub fn remove_node(&mut self, node_id: NodeId) {
        self.listeners.remove(&node_id);
    }

    pub fn count(&self, node_id: NodeId, event_type: &str) -> usize {
        self.listeners
            .get(&node_id)
            .and_then(|by_type| by_type.get(event_type))
            .map_or(0, Vec::len)
    }

    /// Run `node_id`'s listeners for the event's type, in order, until one
    /// stops immediate propagation
    fn invoke(&mut self, node_id: NodeId, event: &mut Event) {
        let Some(list) = self
            .listeners
            .get_mut(&node_id)
            .and_then(|by_type| by_type.get_mut(&event.event_type))
        else {
            return;
        };

        for listener in list.iter_mut() {
            if event.immediate_propagation_stopped {
                break;
            }
            listener(event);
        }
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total: usize = self
            .listeners
            .values()
            .flat_map(|by_type| by_type.values())
            .map(Vec::len)
            .sum();
        f.debug_struct("ListenerRegistry")
            .field("elements", &self.listeners.len())
            .field("listeners", &total)
            .finish()
    }
}

/// Three-phase dispatcher
pub struct EventDispatcher;

impl EventDispatcher {
    /// Dispatch `event` at `target_id`
    ///
    /// Fails with `InvalidNodeType` when the target is not an element, in
    /// which case no listener runs. Otherwise returns `true` unless a
    /// listener prevented the default action.
    pub fn dispatch(
        arena: &DomArena,
        registry: &mut ListenerRegistry,
        target_id: NodeId,
        event: &mut Event,
    ) -> Result<bool> {
        let target = arena.get(target_id)?;
        if !target.is_element() {
            return Err(DomError::not_an_element(target.kind.name()));
        }

        // Element ancestors, root first
        let mut path: Vec<NodeId> = arena
            .ancestors(target_id)?
            .into_iter()
            .filter(|&id| arena.get(id).is_ok_and(|node| node.is_element()))
            .collect();
        path.reverse();

        tracing::debug!(
            event_type = %event.event_type,
            target = target_id,
            ancestors = path.len(),
            "dispatching event"
        );

        event.target = Some(target_id);

        event.phase = EventPhase::Capturing;
        for &node_id in &path {
            if event.propagation_stopped {
                break;
            }
            event.current_target = Some(node_id);
            registry.invoke(node_id, event);
        }

        if !event.propagation_stopped {
            event.phase = EventPhase::AtTarget;
            event.current_target = Some(target_id);
            registry.invoke(target_id, event);
        }

        if event.bubbles {
            event.phase = EventPhase::Bubbling;
            for &node_id in path.iter().rev() {
                if event.propagation_stopped {
                    break;
                }
                event.current_target = Some(node_id);
                registry.invoke(node_id, event);
            }
        }

        event.phase = EventPhase::None;
        event.current_target = None;

        Ok(!event.default_prevented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    /// root -> a -> b -> target, plus a text child under target
    struct Fixture {
        arena: DomArena,
        registry: ListenerRegistry,
        a: NodeId,
        b: NodeId,
        target: NodeId,
        text: NodeId,
        log: Log,
    }

    fn fixture() -> Fixture {
        let mut arena = DomArena::new();
        let a = arena.create_element("a");
        let b = arena.create_element("b");
        let target = arena.create_element("target");
        let text = arena.create_text("t");
        arena.append_child(arena.root_id(), a).unwrap();
        arena.append_child(a, b).unwrap();
        arena.append_child(b, target).unwrap();
        arena.append_child(target, text).unwrap();

        Fixture {
            arena,
            registry: ListenerRegistry::new(),
            a,
            b,
            target,
            text,
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn recorder(log: &Log, label: &str) -> EventListener {
        let log = log.clone();
        let label = label.to_string();
        Box::new(move |event: &mut Event| {
            log.borrow_mut().push(format!("{}:{:?}", label, event.phase()));
        })
    }

    impl Fixture {
        fn listen_all(&mut self) {
            for (id, name) in [(0, "root"), (self.a, "a"), (self.b, "b"), (self.target, "t")] {
                self.registry.add(id, "click", recorder(&self.log, name));
            }
        }

        fn dispatch(&mut self, event: &mut Event) -> Result<bool> {
            EventDispatcher::dispatch(&self.arena, &mut self.registry, self.target, event)
        }

        fn entries(&self) -> Vec<String> {
            self.log.borrow().clone()
        }
    }

    #[test]
    fn test_three_phase_order() {
        let mut fx = fixture();
        fx.listen_all();

        let mut event = Event::new("click", true, true);
        assert!(fx.dispatch(&mut event).unwrap());

        assert_eq!(
            fx.entries(),
            vec![
                "root:Capturing",
                "a:Capturing",
                "b:Capturing",
                "t:AtTarget",
                "b:Bubbling",
                "a:Bubbling",
                "root:Bubbling",
            ]
        );
        assert_eq!(event.phase(), EventPhase::None);
        assert_eq!(event.target(), Some(fx.target));
        assert_eq!(event.current_target(), None);
    }

    #[test]
    fn test_non_bubbling_event_stops_at_target() {
        let mut fx = fixture();
        fx.listen_all();

        let mut event = Event::new("click", false, true);
        fx.dispatch(&mut event).unwrap();

        assert_eq!(fx.entries().last().map(String::as_str), Some("t:AtTarget"));
        assert_eq!(fx.entries().len(), 4);
    }

    #[test]
    fn test_stop_propagation_during_capture() {
        let mut fx = fixture();
        fx.listen_all();
        fx.registry.add(
            fx.a,
            "click",
            Box::new(|event: &mut Event| event.stop_propagation()),
        );
        fx.registry.add(fx.a, "click", recorder(&fx.log, "a2"));

        let mut event = Event::new("click", true, true);
        fx.dispatch(&mut event).unwrap();

        // a's remaining listener still runs; b and the target never do
        assert_eq!(fx.entries(), vec!["root:Capturing", "a:Capturing", "a2:Capturing"]);
        assert!(event.is_propagation_stopped());
    }

    #[test]
    fn test_stop_propagation_during_bubble() {
        let mut fx = fixture();
        fx.listen_all();
        fx.registry.add(
            fx.b,
            "click",
            Box::new(|event: &mut Event| {
                if event.phase() == EventPhase::Bubbling {
                    event.stop_propagation();
                }
            }),
        );

        let mut event = Event::new("click", true, true);
        fx.dispatch(&mut event).unwrap();

        assert_eq!(fx.entries().last().map(String::as_str), Some("b:Bubbling"));
        assert!(!fx.entries().contains(&"a:Bubbling".to_string()));
    }

    #[test]
    fn test_listeners_fire_in_registration_order() {
        let mut fx = fixture();
        fx.registry.add(fx.target, "click", recorder(&fx.log, "L1"));
        fx.registry.add(fx.target, "click", recorder(&fx.log, "L2"));

        let mut event = Event::new("click", true, true);
        fx.dispatch(&mut event).unwrap();

        assert_eq!(fx.entries(), vec!["L1:AtTarget", "L2:AtTarget"]);
    }

    #[test]
    fn test_stop_immediate_skips_same_node_listeners() {
        let mut fx = fixture();
        fx.listen_all();
        let log = fx.log.clone();
        fx.registry.add(
            fx.target,
            "click",
            Box::new(move |event: &mut Event| {
                log.borrow_mut().push("L1".to_string());
                event.stop_immediate_propagation();
            }),
        );
        fx.registry.add(fx.target, "click", recorder(&fx.log, "L2"));

        let mut event = Event::new("click", true, true);
        fx.dispatch(&mut event).unwrap();

        let entries = fx.entries();
        assert!(entries.contains(&"L1".to_string()));
        assert!(!entries.iter().any(|e| e.starts_with("L2")));
        assert!(!entries.iter().any(|e| e.ends_with("Bubbling")));
    }

    #[test]
    fn test_prevent_default_requires_cancelable() {
        let mut fx = fixture();
        fx.registry.add(
            fx.target,
            "submit",
            Box::new(|event: &mut Event| event.prevent_default()),
        );

        let mut cancelable = Event::new("submit", true, true);
        assert!(!fx.dispatch(&mut cancelable).unwrap());
        assert!(cancelable.is_default_prevented());

        let mut fixed = Event::new("submit", true, false);
        assert!(fx.dispatch(&mut fixed).unwrap());
        assert!(!fixed.is_default_prevented());
    }

    #[test]
    fn test_other_event_types_ignored() {
        let mut fx = fixture();
        fx.listen_all();
        let mut event = Event::new("keydown", true, true);
        fx.dispatch(&mut event).unwrap();
        assert!(fx.entries().is_empty());
    }

    #[test]
    fn test_dispatch_on_text_fails() {
        let mut fx = fixture();
        fx.listen_all();
        let mut event = Event::new("click", true, true);

        let result = EventDispatcher::dispatch(&fx.arena, &mut fx.registry, fx.text, &mut event);

        assert!(matches!(result, Err(DomError::InvalidNodeType { .. })));
        assert!(fx.entries().is_empty());
        assert_eq!(event.target(), None);
    }

    #[test]
    fn test_flags_are_sticky_until_reset() {
        let mut fx = fixture();
        fx.registry.add(
            fx.b,
            "click",
            Box::new(|event: &mut Event| event.stop_propagation()),
        );
        fx.registry.add(fx.target, "click", recorder(&fx.log, "t"));

        let mut event = Event::new("click", true, true);
        fx.dispatch(&mut event).unwrap();
        assert!(fx.entries().is_empty());

        // Remove the stopper; the stale flag still blocks everything
        fx.registry.clear(fx.b, "click");
        fx.dispatch(&mut event).unwrap();
        assert!(fx.entries().is_empty());

        event.reset_flags();
        fx.dispatch(&mut event).unwrap();
        assert_eq!(fx.entries(), vec!["t:AtTarget"]);
    }

    #[test]
    fn test_mouse_event_detail() {
        let mut fx = fixture();
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        fx.registry.add(
            fx.target,
            "click",
            Box::new(move |event: &mut Event| {
                *sink.borrow_mut() = event.mouse_detail().copied();
            }),
        );

        let detail = MouseDetail {
            client_x: 10,
            client_y: 20,
            shift_key: true,
            ..Default::default()
        };
        let mut event = Event::mouse("click", detail);
        assert!(event.bubbles() && event.cancelable());
        fx.dispatch(&mut event).unwrap();

        assert_eq!(*seen.borrow(), Some(detail));
    }

    #[test]
    fn test_registry_bookkeeping() {
        let mut registry = ListenerRegistry::new();
        registry.add(3, "click", Box::new(|_: &mut Event| {}));
        registry.add(3, "click", Box::new(|_: &mut Event| {}));
        registry.add(3, "input", Box::new(|_: &mut Event| {}));
        assert_eq!(registry.count(3, "click"), 2);

        registry.clear(3, "click");
        assert_eq!(registry.count(3, "click"), 0);
        assert_eq!(registry.count(3, "input"), 1);

        registry.remove_node(3);
        assert_eq!(registry.count(3, "input"), 0);
    }
}
