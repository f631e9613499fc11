// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::ProtocolEvent;
use actix::{Addr, Message};
use std::fmt::Display;
use std::hash::Hash;

use crate::EventBus;

/// Trait that must be implemented by events used with EventBus
pub trait Event:
    Message<Result = ()> + Clone + Display + Send + Sync + Unpin + Sized + 'static
{
    type Id: Hash + Eq + Clone + Unpin + Send + Sync + Display;

    /// Payload for the Event
    type Data;

    fn event_type(&self) -> String;
    fn event_id(&self) -> Self::Id;
    fn get_data(&self) -> &Self::Data;
    fn into_data(self) -> Self::Data;
}

/// Sink for the audit stream emitted by a protocol instance.
///
/// Publishing never fails from the point of view of the emitter: once an operation has
/// committed its state change the event is handed over and delivery is the sink's concern.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: ProtocolEvent);
}

impl EventPublisher for Addr<EventBus<ProtocolEvent>> {
    fn publish(&self, event: ProtocolEvent) {
        self.do_send(event);
    }
}
