// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Event, EventPublisher, ProtocolEvent};
use std::sync::{Arc, Mutex};

/// In-memory publisher that keeps every event it receives.
///
/// Used by synchronous callers of the protocol that have no actor system to publish on.
#[derive(Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<ProtocolEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProtocolEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn event_types(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event_type())
            .collect()
    }

    pub fn last(&self) -> Option<ProtocolEvent> {
        self.events.lock().unwrap().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl EventPublisher for EventRecorder {
    fn publish(&self, event: ProtocolEvent) {
        self.events.lock().unwrap().push(event);
    }
}
