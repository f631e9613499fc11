// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::Protocol;
use actix::prelude::*;
use alloy_primitives::Address;
use ctally_aggregator::{Batch, ProtocolResult};
use ctally_events::{
    BatchClosed, BatchId, BatchOpened, CooldownSet, DataSubmitted, DecryptionCompleted,
    DecryptionRequested, Paused, ProviderAdded, ProviderRemoved, RequestId, Totals, Unpaused,
};
use ctally_fhe::CiphertextHandle;
use ctally_oracle::DecryptionContext;

/// Serializes all calls into one [`Protocol`] through the actor mailbox.
pub struct ProtocolActor {
    protocol: Protocol,
}

impl ProtocolActor {
    pub fn new(protocol: Protocol) -> Self {
        Self { protocol }
    }

    pub fn attach(protocol: Protocol) -> Addr<Self> {
        Self::new(protocol).start()
    }
}

impl Actor for ProtocolActor {
    type Context = Context<Self>;
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "ProtocolResult<ProviderAdded>")]
pub struct AddProvider {
    pub caller: Address,
    pub provider: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "ProtocolResult<ProviderRemoved>")]
pub struct RemoveProvider {
    pub caller: Address,
    pub provider: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "ProtocolResult<Paused>")]
pub struct Pause {
    pub caller: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "ProtocolResult<Unpaused>")]
pub struct Unpause {
    pub caller: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "ProtocolResult<CooldownSet>")]
pub struct SetCooldown {
    pub caller: Address,
    pub cooldown: u64,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "ProtocolResult<BatchOpened>")]
pub struct OpenBatch {
    pub caller: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "ProtocolResult<BatchClosed>")]
pub struct CloseBatch {
    pub caller: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "ProtocolResult<DataSubmitted>")]
pub struct Submit {
    pub caller: Address,
    pub tax: CiphertextHandle,
    pub resource: CiphertextHandle,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "ProtocolResult<DecryptionRequested>")]
pub struct RequestBatchDecryption {
    pub caller: Address,
}

/// The oracle's answer to a [`RequestBatchDecryption`].
#[derive(Message, Clone, Debug)]
#[rtype(result = "ProtocolResult<DecryptionCompleted>")]
pub struct DecryptionCallback {
    pub request_id: RequestId,
    pub cleartexts: Vec<u8>,
    pub proof: Vec<u8>,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Option<Batch>")]
pub struct GetBatch(pub BatchId);

#[derive(Message, Clone, Debug)]
#[rtype(result = "Option<Totals>")]
pub struct GetRevealedTotals(pub BatchId);

#[derive(Message, Clone, Debug)]
#[rtype(result = "Option<DecryptionContext>")]
pub struct GetDecryptionContext(pub RequestId);

impl Handler<AddProvider> for ProtocolActor {
    type Result = ProtocolResult<ProviderAdded>;

    fn handle(&mut self, msg: AddProvider, _: &mut Self::Context) -> Self::Result {
        self.protocol.add_provider(msg.caller, msg.provider)
    }
}

impl Handler<RemoveProvider> for ProtocolActor {
    type Result = ProtocolResult<ProviderRemoved>;

    fn handle(&mut self, msg: RemoveProvider, _: &mut Self::Context) -> Self::Result {
        self.protocol.remove_provider(msg.caller, msg.provider)
    }
}

impl Handler<Pause> for ProtocolActor {
    type Result = ProtocolResult<Paused>;

    fn handle(&mut self, msg: Pause, _: &mut Self::Context) -> Self::Result {
        self.protocol.pause(msg.caller)
    }
}

impl Handler<Unpause> for ProtocolActor {
    type Result = ProtocolResult<Unpaused>;

    fn handle(&mut self, msg: Unpause, _: &mut Self::Context) -> Self::Result {
        self.protocol.unpause(msg.caller)
    }
}

impl Handler<SetCooldown> for ProtocolActor {
    type Result = ProtocolResult<CooldownSet>;

    fn handle(&mut self, msg: SetCooldown, _: &mut Self::Context) -> Self::Result {
        self.protocol.set_cooldown(msg.caller, msg.cooldown)
    }
}

impl Handler<OpenBatch> for ProtocolActor {
    type Result = ProtocolResult<BatchOpened>;

    fn handle(&mut self, msg: OpenBatch, _: &mut Self::Context) -> Self::Result {
        self.protocol.open_batch(msg.caller)
    }
}

impl Handler<CloseBatch> for ProtocolActor {
    type Result = ProtocolResult<BatchClosed>;

    fn handle(&mut self, msg: CloseBatch, _: &mut Self::Context) -> Self::Result {
        self.protocol.close_batch(msg.caller)
    }
}

impl Handler<Submit> for ProtocolActor {
    type Result = ProtocolResult<DataSubmitted>;

    fn handle(&mut self, msg: Submit, _: &mut Self::Context) -> Self::Result {
        self.protocol.submit(msg.caller, msg.tax, msg.resource)
    }
}

impl Handler<RequestBatchDecryption> for ProtocolActor {
    type Result = ProtocolResult<DecryptionRequested>;

    fn handle(&mut self, msg: RequestBatchDecryption, _: &mut Self::Context) -> Self::Result {
        self.protocol.request_batch_decryption(msg.caller)
    }
}

impl Handler<DecryptionCallback> for ProtocolActor {
    type Result = ProtocolResult<DecryptionCompleted>;

    fn handle(&mut self, msg: DecryptionCallback, _: &mut Self::Context) -> Self::Result {
        self.protocol
            .on_decryption_callback(msg.request_id, &msg.cleartexts, &msg.proof)
    }
}

impl Handler<GetBatch> for ProtocolActor {
    type Result = Option<Batch>;

    fn handle(&mut self, msg: GetBatch, _: &mut Self::Context) -> Self::Result {
        self.protocol.batch(msg.0).cloned()
    }
}

impl Handler<GetRevealedTotals> for ProtocolActor {
    type Result = Option<Totals>;

    fn handle(&mut self, msg: GetRevealedTotals, _: &mut Self::Context) -> Self::Result {
        self.protocol.revealed_totals(msg.0)
    }
}

impl Handler<GetDecryptionContext> for ProtocolActor {
    type Result = Option<DecryptionContext>;

    fn handle(&mut self, msg: GetDecryptionContext, _: &mut Self::Context) -> Self::Result {
        self.protocol.decryption_context(msg.0).cloned()
    }
}
