// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use ctally_aggregator::{
    AccessControl, Batch, BatchLedger, Clock, ProtocolError, ProtocolResult, RateLimited,
    Requirements, SubmissionRecord,
};
use ctally_events::{
    BatchClosed, BatchId, BatchOpened, CooldownSet, DataSubmitted, DecryptionCompleted,
    DecryptionRequested, EventPublisher, Paused, ProtocolEvent, ProtocolEventData, ProviderAdded,
    ProviderRemoved, RequestId, Totals, Unpaused,
};
use ctally_fhe::{CiphertextHandle, HomomorphicCipher};
use ctally_oracle::{DecryptionContext, DecryptionOracle, DecryptionOracleClient};
use std::sync::Arc;
use tracing::{info, warn};

pub struct ProtocolParams {
    pub owner: Address,
    /// Identity of this protocol instance, bound into every request fingerprint
    pub instance: Address,
    pub cooldown: u64,
    pub cipher: Arc<dyn HomomorphicCipher>,
    pub oracle: Arc<dyn DecryptionOracle>,
    pub clock: Arc<dyn Clock>,
    pub publisher: Arc<dyn EventPublisher>,
}

/// One protocol instance.
///
/// Every mutating operation takes `&mut self` and either commits completely and publishes
/// exactly one event, or fails with a [`ProtocolError`] leaving no trace. Checks run in the
/// order role, pause, cooldown, lifecycle.
pub struct Protocol {
    access: AccessControl,
    ledger: BatchLedger,
    oracle: DecryptionOracleClient,
    cipher: Arc<dyn HomomorphicCipher>,
    clock: Arc<dyn Clock>,
    publisher: Arc<dyn EventPublisher>,
    seq: u64,
}

fn rejected(op: &'static str, caller: &Address, err: ProtocolError) -> ProtocolError {
    warn!(op, caller = %caller, error = %err, "Operation rejected");
    err
}

impl Protocol {
    pub fn new(params: ProtocolParams) -> ProtocolResult<Self> {
        let access = AccessControl::new(params.owner, params.cooldown)?;
        info!(
            owner = %params.owner,
            instance = %params.instance,
            cooldown = params.cooldown,
            "Protocol instance created"
        );
        Ok(Self {
            access,
            ledger: BatchLedger::new(),
            oracle: DecryptionOracleClient::new(params.instance, params.oracle),
            cipher: params.cipher,
            clock: params.clock,
            publisher: params.publisher,
            seq: 0,
        })
    }

    fn commit<T>(&mut self, data: T) -> T
    where
        T: Clone + Into<ProtocolEventData>,
    {
        let event = ProtocolEvent::new(self.seq, data.clone());
        self.seq += 1;
        info!(evt = %event, "Event emitted");
        self.publisher.publish(event);
        data
    }

    pub fn add_provider(
        &mut self,
        caller: Address,
        provider: Address,
    ) -> ProtocolResult<ProviderAdded> {
        let data = self
            .access
            .add_provider(&caller, provider)
            .map_err(|e| rejected("add_provider", &caller, e))?;
        Ok(self.commit(data))
    }

    pub fn remove_provider(
        &mut self,
        caller: Address,
        provider: Address,
    ) -> ProtocolResult<ProviderRemoved> {
        let data = self
            .access
            .remove_provider(&caller, provider)
            .map_err(|e| rejected("remove_provider", &caller, e))?;
        Ok(self.commit(data))
    }

    pub fn pause(&mut self, caller: Address) -> ProtocolResult<Paused> {
        let data = self
            .access
            .pause(&caller)
            .map_err(|e| rejected("pause", &caller, e))?;
        Ok(self.commit(data))
    }

    pub fn unpause(&mut self, caller: Address) -> ProtocolResult<Unpaused> {
        let data = self
            .access
            .unpause(&caller)
            .map_err(|e| rejected("unpause", &caller, e))?;
        Ok(self.commit(data))
    }

    pub fn set_cooldown(&mut self, caller: Address, cooldown: u64) -> ProtocolResult<CooldownSet> {
        let data = self
            .access
            .set_cooldown(&caller, cooldown)
            .map_err(|e| rejected("set_cooldown", &caller, e))?;
        Ok(self.commit(data))
    }

    pub fn open_batch(&mut self, caller: Address) -> ProtocolResult<BatchOpened> {
        let now = self.clock.now();
        self.access
            .check(&caller, Requirements::owner().when_not_paused(), now)
            .map_err(|e| rejected("open_batch", &caller, e))?;
        let data = self.ledger.open_batch();
        Ok(self.commit(data))
    }

    pub fn close_batch(&mut self, caller: Address) -> ProtocolResult<BatchClosed> {
        let reject = |e| rejected("close_batch", &caller, e);
        let now = self.clock.now();
        self.access
            .check(&caller, Requirements::owner().when_not_paused(), now)
            .map_err(reject)?;
        let data = self.ledger.close_batch().map_err(reject)?;
        Ok(self.commit(data))
    }

    /// Fold an encrypted `(tax, resource)` pair into the current batch.
    pub fn submit(
        &mut self,
        caller: Address,
        tax: CiphertextHandle,
        resource: CiphertextHandle,
    ) -> ProtocolResult<DataSubmitted> {
        let reject = |e| rejected("submit", &caller, e);
        let now = self.clock.now();
        let req = Requirements::provider()
            .when_not_paused()
            .rate_limited(RateLimited::Submission);
        self.access.check(&caller, req, now).map_err(reject)?;
        let data = self
            .ledger
            .submit(self.cipher.as_ref(), caller, tax, resource)
            .map_err(reject)?;
        self.access
            .record_action(RateLimited::Submission, caller, now);
        Ok(self.commit(data))
    }

    /// Ask the oracle to decrypt the aggregate of the current, closed batch.
    ///
    /// Returns once the request is recorded. The result arrives through
    /// [`Protocol::on_decryption_callback`].
    pub fn request_batch_decryption(
        &mut self,
        caller: Address,
    ) -> ProtocolResult<DecryptionRequested> {
        let reject = |e| rejected("request_batch_decryption", &caller, e);
        let now = self.clock.now();
        let req = Requirements::owner()
            .when_not_paused()
            .rate_limited(RateLimited::DecryptionRequest);
        self.access.check(&caller, req, now).map_err(reject)?;
        let batch = self.ledger.require_current_closed().map_err(reject)?;
        let data = self.oracle.request(batch).map_err(reject)?;
        self.access
            .record_action(RateLimited::DecryptionRequest, caller, now);
        Ok(self.commit(data))
    }

    /// Entry point for the oracle's answer. Anyone may deliver it; the proof decides.
    ///
    /// Accepted while paused so that requests issued before a pause can still complete.
    pub fn on_decryption_callback(
        &mut self,
        request_id: RequestId,
        cleartexts: &[u8],
        proof: &[u8],
    ) -> ProtocolResult<DecryptionCompleted> {
        let data = self
            .oracle
            .on_callback(&mut self.ledger, request_id, cleartexts, proof)
            .map_err(|err| {
                warn!(
                    op = "on_decryption_callback",
                    request_id = %request_id,
                    error = %err,
                    "Operation rejected"
                );
                err
            })?;
        Ok(self.commit(data))
    }

    pub fn owner(&self) -> Address {
        self.access.owner()
    }

    pub fn instance(&self) -> Address {
        self.oracle.instance()
    }

    pub fn is_provider(&self, addr: &Address) -> bool {
        self.access.is_provider(addr)
    }

    pub fn providers(&self) -> Vec<Address> {
        self.access.providers().copied().collect()
    }

    pub fn is_paused(&self) -> bool {
        self.access.is_paused()
    }

    pub fn cooldown(&self) -> u64 {
        self.access.cooldown()
    }

    pub fn last_submission(&self, addr: &Address) -> Option<u64> {
        self.access.last_action(RateLimited::Submission, addr)
    }

    pub fn last_request(&self, addr: &Address) -> Option<u64> {
        self.access.last_action(RateLimited::DecryptionRequest, addr)
    }

    pub fn current_batch_id(&self) -> BatchId {
        self.ledger.current_batch_id()
    }

    pub fn batch(&self, id: BatchId) -> Option<&Batch> {
        self.ledger.batch(id)
    }

    /// Submission `ordinal` of batch `id`, counting from 1.
    pub fn submission(&self, id: BatchId, ordinal: u64) -> Option<&SubmissionRecord> {
        self.ledger.batch(id)?.accumulator().submission(ordinal)
    }

    pub fn encrypted_totals(&self, id: BatchId) -> Option<[CiphertextHandle; 2]> {
        self.ledger.batch(id).map(Batch::encrypted_totals)
    }

    pub fn revealed_totals(&self, id: BatchId) -> Option<Totals> {
        self.ledger.batch(id)?.revealed()
    }

    pub fn decryption_context(&self, request_id: RequestId) -> Option<&DecryptionContext> {
        self.oracle.context(request_id)
    }

    #[cfg(any(test, feature = "test-helpers"))]
    pub fn tamper_state_hash(
        &mut self,
        request_id: RequestId,
        state_hash: alloy_primitives::B256,
    ) -> bool {
        self.oracle.tamper_state_hash(request_id, state_hash)
    }
}
