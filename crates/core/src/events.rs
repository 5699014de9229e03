/// Event buffering for off-chain observers. Components push events as state
/// transitions commit; callers drain them after each call.

use aegis_types::HookEvent;
use log::info;

/// Ordered buffer of committed events
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<HookEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event and log it
    pub fn emit(&mut self, event: HookEvent) {
        match event.pool_id() {
            Some(pool_id) => info!("{} pool={} ts={}", event.name(), pool_id, event.timestamp()),
            None => info!("{} ts={}", event.name(), event.timestamp()),
        }
        self.events.push(event);
    }

    /// Take every buffered event, oldest first
    pub fn drain(&mut self) -> Vec<HookEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[HookEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
