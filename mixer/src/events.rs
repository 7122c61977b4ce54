use log::error;
use spatial_core::{EventKind, EventPayload, SpatialEvent};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

/// Boxed event listener. Returned errors are logged by the bus.
pub type EventHandler = Box<dyn FnMut(&SpatialEvent) -> anyhow::Result<()> + Send>;

/// Handle returned when subscribing, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId {
    kind: EventKind,
    id: u64,
}

impl ListenerId {
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

/// In-process publish/subscribe channel keyed by event kind.
///
/// A failing listener (error or panic) is logged and skipped; the remaining
/// listeners still receive the event.
#[derive(Default)]
pub struct EventBus {
    listeners: HashMap<EventKind, Vec<(u64, EventHandler)>>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener<F>(&mut self, kind: EventKind, handler: F) -> ListenerId
    where
        F: FnMut(&SpatialEvent) -> anyhow::Result<()> + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners
            .entry(kind)
            .or_default()
            .push((id, Box::new(handler)));
        ListenerId { kind, id }
    }

    /// Subscribe to one event kind through its payload type.
    pub fn subscribe<E, F>(&mut self, mut handler: F) -> ListenerId
    where
        E: EventPayload,
        F: FnMut(&E) -> anyhow::Result<()> + Send + 'static,
    {
        self.add_listener(E::KIND, move |event| match E::from_event(event) {
            Some(payload) => handler(payload),
            None => Ok(()),
        })
    }

    pub fn remove_listener(&mut self, listener: ListenerId) -> bool {
        let Some(listeners) = self.listeners.get_mut(&listener.kind) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != listener.id);
        before != listeners.len()
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }

    pub fn emit(&mut self, event: impl Into<SpatialEvent>) {
        let event = event.into();
        let kind = event.kind();
        let Some(listeners) = self.listeners.get_mut(&kind) else {
            return;
        };

        for (id, handler) in listeners.iter_mut() {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(&event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Error in event handler {} for {}: {:#}", id, kind, e),
                Err(_) => error!("Event handler {} for {} panicked", id, kind),
            }
        }
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}
