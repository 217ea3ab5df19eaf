//! Event Bus adapter
//!
//! Implements the EventBus port by recording every published event.

use crate::events::TipChangedEvent;
use crate::ports::EventBus;
use async_trait::async_trait;

/// In-memory event bus adapter for testing
pub struct InMemoryEventBus {
    events: parking_lot::RwLock<Vec<TipChangedEvent>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self {
            events: parking_lot::RwLock::new(Vec::new()),
        }
    }

    pub fn get_events(&self) -> Vec<TipChangedEvent> {
        self.events.read().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.read().len()
    }

    pub fn last_event(&self) -> Option<TipChangedEvent> {
        self.events.read().last().cloned()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish_tip_changed(&self, event: TipChangedEvent) -> Result<(), String> {
        self.events.write().push(event);
        Ok(())
    }
}
