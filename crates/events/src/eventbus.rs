// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::traits::Event;
use actix::prelude::*;
use std::collections::{HashMap, VecDeque};
use std::marker::PhantomData;
use tracing::{info, trace};

//////////////////////////////////////////////////////////////////////////////
// EventBus Implementation
//////////////////////////////////////////////////////////////////////////////

/// Central bus for the audit stream of a protocol instance. The protocol actor publishes every
/// committed event here and listeners (loggers, oracle relayers, test collectors) subscribe
/// either to a specific event type or to `*`.
pub struct EventBus<E: Event> {
    listeners: HashMap<String, Vec<Recipient<E>>>,
}

impl<E: Event> Actor for EventBus<E> {
    type Context = Context<Self>;
}

impl<E: Event> EventBus<E> {
    pub fn new() -> Self {
        EventBus {
            listeners: HashMap::new(),
        }
    }

    /// Attach a [`HistoryCollector`] that records every event published on `source`.
    pub fn history(source: &Addr<EventBus<E>>) -> Addr<HistoryCollector<E>> {
        let addr = HistoryCollector::<E>::new().start();
        source.do_send(Subscribe::new("*", addr.clone().recipient()));
        addr
    }
}

impl<E: Event> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> Handler<E> for EventBus<E> {
    type Result = ();

    fn handle(&mut self, event: E, _: &mut Context<Self>) {
        if let Some(listeners) = self.listeners.get("*") {
            for listener in listeners {
                listener.do_send(event.clone());
            }
        }

        if let Some(listeners) = self.listeners.get(&event.event_type()) {
            for listener in listeners {
                listener.do_send(event.clone());
            }
        }

        trace!(">>> {}", event);
    }
}

//////////////////////////////////////////////////////////////////////////////
// Subscribe Message
//////////////////////////////////////////////////////////////////////////////

#[derive(Message)]
#[rtype(result = "()")]
pub struct Subscribe<E: Event> {
    pub event_type: String,
    pub listener: Recipient<E>,
}

impl<E: Event> Subscribe<E> {
    pub fn new(event_type: impl Into<String>, listener: Recipient<E>) -> Self {
        Self {
            event_type: event_type.into(),
            listener,
        }
    }
}

impl<E: Event> Handler<Subscribe<E>> for EventBus<E> {
    type Result = ();

    fn handle(&mut self, msg: Subscribe<E>, _: &mut Context<Self>) {
        self.listeners
            .entry(msg.event_type)
            .or_default()
            .push(msg.listener);
    }
}

//////////////////////////////////////////////////////////////////////////////
// History Management
//////////////////////////////////////////////////////////////////////////////

#[derive(Message)]
#[rtype(result = "Vec<E>")]
pub struct GetEvents<E: Event>(PhantomData<E>);

impl<E: Event> GetEvents<E> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E: Event> Default for GetEvents<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait until `amount` events are available and drain them from the collector.
#[derive(Message)]
#[rtype(result = "Vec<E>")]
pub struct TakeEvents<E: Event> {
    amount: usize,
    _d: PhantomData<E>,
}

impl<E: Event> TakeEvents<E> {
    pub fn new(amount: usize) -> Self {
        Self {
            amount,
            _d: PhantomData,
        }
    }
}

struct PendingTake<E: Event> {
    count: usize,
    collected: Vec<E>,
    responder: tokio::sync::oneshot::Sender<Vec<E>>,
}

//////////////////////////////////////////////////////////////////////////////
// History Collector
//////////////////////////////////////////////////////////////////////////////

/// Actor to subscribe to EventBus to capture all history
pub struct HistoryCollector<E: Event> {
    history: VecDeque<E>,
    pending_takes: Vec<PendingTake<E>>,
}

impl<E: Event> HistoryCollector<E> {
    pub fn new() -> Self {
        Self {
            history: VecDeque::new(),
            pending_takes: Vec::new(),
        }
    }

    fn add_event(&mut self, event: E) {
        if let Some(pending) = self
            .pending_takes
            .iter_mut()
            .find(|pending| pending.collected.len() < pending.count)
        {
            info!(
                "Received event {}. Pushing to pending take {}/{}...",
                event.event_type(),
                pending.collected.len() + 1,
                pending.count
            );
            pending.collected.push(event);
            self.flush_completed_takes();
            return;
        }

        self.history.push_back(event);
    }

    fn flush_completed_takes(&mut self) {
        let mut idx = 0;
        while idx < self.pending_takes.len() {
            if self.pending_takes[idx].collected.len() >= self.pending_takes[idx].count {
                let pending = self.pending_takes.remove(idx);
                let _ = pending.responder.send(pending.collected);
            } else {
                idx += 1;
            }
        }
    }
}

impl<E: Event> Default for HistoryCollector<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> Actor for HistoryCollector<E> {
    type Context = Context<Self>;
}

impl<E: Event> Handler<E> for HistoryCollector<E> {
    type Result = ();

    fn handle(&mut self, msg: E, _: &mut Context<Self>) {
        self.add_event(msg);
    }
}

impl<E: Event> Handler<GetEvents<E>> for HistoryCollector<E> {
    type Result = Vec<E>;

    fn handle(&mut self, _: GetEvents<E>, _: &mut Context<Self>) -> Vec<E> {
        self.history.iter().cloned().collect()
    }
}

impl<E: Event> Handler<TakeEvents<E>> for HistoryCollector<E> {
    type Result = ResponseActFuture<Self, Vec<E>>;

    fn handle(&mut self, msg: TakeEvents<E>, _: &mut Context<Self>) -> Self::Result {
        let count = msg.amount;

        if self.history.len() >= count {
            let events: Vec<E> = self.history.drain(..count).collect();
            return Box::pin(async move { events }.into_actor(self));
        }

        info!(
            "Requesting {} events but only {} in the buffer. waiting for more...",
            count,
            self.history.len()
        );

        let (tx, rx) = tokio::sync::oneshot::channel();
        let collected: Vec<E> = self.history.drain(..).collect();
        self.pending_takes.push(PendingTake {
            count,
            collected,
            responder: tx,
        });

        Box::pin(async move { rx.await.unwrap_or_default() }.into_actor(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BatchId, BatchOpened, ProtocolEvent};

    fn opened(seq: u64) -> ProtocolEvent {
        ProtocolEvent::new(
            seq,
            BatchOpened {
                batch_id: BatchId::new(seq + 1),
            },
        )
    }

    #[actix::test]
    async fn history_records_published_events() -> anyhow::Result<()> {
        let bus = EventBus::<ProtocolEvent>::new().start();
        let history = EventBus::history(&bus);

        bus.send(opened(0)).await?;
        bus.send(opened(1)).await?;

        let events = history.send(TakeEvents::new(2)).await?;
        assert_eq!(events, vec![opened(0), opened(1)]);
        Ok(())
    }

    #[actix::test]
    async fn typed_subscription_only_sees_its_type() -> anyhow::Result<()> {
        let bus = EventBus::<ProtocolEvent>::new().start();
        let typed = HistoryCollector::<ProtocolEvent>::new().start();
        bus.send(Subscribe::new("BatchClosed", typed.clone().recipient()))
            .await?;

        bus.send(opened(0)).await?;
        let events = typed.send(GetEvents::new()).await?;
        assert!(events.is_empty());
        Ok(())
    }
}
