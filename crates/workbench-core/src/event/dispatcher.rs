use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::sync::Mutex;

use crate::event::EventResult;
use crate::utils::lock;

pub type HandlerId = u64;

/// An event routed by the [`EventDispatcher`].
pub trait DispatchedEvent: Send + Sync + 'static {
    type Kind: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    fn kind(&self) -> Self::Kind;
}

type Handler<E> = std::sync::Arc<dyn Fn(&E) -> EventResult + Send + Sync>;

struct DispatcherState<E: DispatchedEvent> {
    handlers: HashMap<E::Kind, Vec<(HandlerId, Handler<E>)>>,
    next_handler_id: HandlerId,
    event_queue: VecDeque<E>,
}

/// Push-model dispatcher for one-shot events.
///
/// Handlers for a kind run in registration order until one returns
/// [`EventResult::Stop`].
pub struct EventDispatcher<E: DispatchedEvent> {
    state: Mutex<DispatcherState<E>>,
}

impl<E: DispatchedEvent> fmt::Debug for EventDispatcher<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        let handler_count: usize = state.handlers.values().map(Vec::len).sum();
        f.debug_struct("EventDispatcher")
            .field("handlers_count", &handler_count)
            .field("next_handler_id", &state.next_handler_id)
            .field("event_queue_size", &state.event_queue.len())
            .finish()
    }
}

impl<E: DispatchedEvent> EventDispatcher<E> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DispatcherState {
                handlers: HashMap::new(),
                next_handler_id: 1,
                event_queue: VecDeque::new(),
            }),
        }
    }

    pub fn register_handler<F>(&self, kind: E::Kind, handler: F) -> HandlerId
    where
        F: Fn(&E) -> EventResult + Send + Sync + 'static,
    {
        let mut state = lock(&self.state);
        let id = state.next_handler_id;
        state.next_handler_id += 1;
        state
            .handlers
            .entry(kind)
            .or_default()
            .push((id, std::sync::Arc::new(handler)));
        id
    }

    pub fn unregister_handler(&self, id: HandlerId) -> bool {
        let mut state = lock(&self.state);
        let mut found = false;
        state.handlers.values_mut().for_each(|handlers| {
            let len_before = handlers.len();
            handlers.retain(|(h_id, _)| *h_id != id);
            if handlers.len() < len_before {
                found = true;
            }
        });
        state.handlers.retain(|_, handlers| !handlers.is_empty());
        found
    }

    pub fn dispatch(&self, event: &E) -> EventResult {
        // Handlers may register or dispatch again, so run them unlocked.
        let handlers: Vec<Handler<E>> = lock(&self.state)
            .handlers
            .get(&event.kind())
            .map(|handlers| handlers.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default();
        for handler in handlers {
            if handler(event) == EventResult::Stop {
                return EventResult::Stop;
            }
        }
        EventResult::Continue
    }

    pub fn queue_event(&self, event: E) {
        lock(&self.state).event_queue.push_back(event);
    }

    /// Dispatch queued events in FIFO order, including ones queued by handlers
    /// while the queue drains. Returns how many were dispatched.
    pub fn process_queue(&self) -> usize {
        let mut count = 0;
        loop {
            let next = lock(&self.state).event_queue.pop_front();
            let Some(event) = next else { break };
            self.dispatch(&event);
            count += 1;
        }
        count
    }

    pub fn queue_size(&self) -> usize {
        lock(&self.state).event_queue.len()
    }

    pub fn handler_count(&self, kind: E::Kind) -> usize {
        lock(&self.state).handlers.get(&kind).map_or(0, Vec::len)
    }
}

impl<E: DispatchedEvent> Default for EventDispatcher<E> {
    fn default() -> Self {
        Self::new()
    }
}
