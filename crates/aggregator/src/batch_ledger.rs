// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{EncryptedAccumulator, ProtocolError, ProtocolResult};
use alloy_primitives::Address;
use ctally_events::{BatchClosed, BatchId, BatchOpened, DataSubmitted, Totals};
use ctally_fhe::{CiphertextHandle, HomomorphicCipher};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    Open,
    Closed,
}

/// A collection window. Once closed it never reopens and is never deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    id: BatchId,
    status: BatchStatus,
    accumulator: EncryptedAccumulator,
    revealed: Option<Totals>,
}

impl Batch {
    fn open(id: BatchId) -> Self {
        Self {
            id,
            status: BatchStatus::Open,
            accumulator: EncryptedAccumulator::new(),
            revealed: None,
        }
    }

    pub fn id(&self) -> BatchId {
        self.id
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.status == BatchStatus::Open
    }

    pub fn is_closed(&self) -> bool {
        self.status == BatchStatus::Closed
    }

    pub fn accumulator(&self) -> &EncryptedAccumulator {
        &self.accumulator
    }

    pub fn count(&self) -> u64 {
        self.accumulator.count()
    }

    /// Aggregate handles as `[tax, resource]`.
    pub fn encrypted_totals(&self) -> [CiphertextHandle; 2] {
        self.accumulator.totals()
    }

    /// Set once a verified decryption of this batch has been accepted.
    pub fn revealed(&self) -> Option<Totals> {
        self.revealed
    }
}

/// Batch lifecycle state machine.
///
/// Ids are allocated from 1 and only ever grow. Only the most recently opened batch is
/// current; older batches stay readable.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BatchLedger {
    batches: BTreeMap<BatchId, Batch>,
    current: BatchId,
}

impl BatchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// `BatchId::NONE` until the first batch is opened.
    pub fn current_batch_id(&self) -> BatchId {
        self.current
    }

    pub fn current(&self) -> Option<&Batch> {
        self.batches.get(&self.current)
    }

    pub fn batch(&self, id: BatchId) -> Option<&Batch> {
        self.batches.get(&id)
    }

    pub fn batches(&self) -> impl Iterator<Item = &Batch> {
        self.batches.values()
    }

    /// Start a new batch. Whatever state the previous one is in does not matter.
    pub fn open_batch(&mut self) -> BatchOpened {
        let batch_id = self.current.next();
        self.batches.insert(batch_id, Batch::open(batch_id));
        self.current = batch_id;
        info!(batch_id = %batch_id, "Batch opened");
        BatchOpened { batch_id }
    }

    pub fn close_batch(&mut self) -> ProtocolResult<BatchClosed> {
        let batch = self.require_current_open_mut()?;
        batch.status = BatchStatus::Closed;
        let batch_id = batch.id;
        info!(batch_id = %batch_id, count = batch.count(), "Batch closed");
        Ok(BatchClosed { batch_id })
    }

    /// Fold a provider's encrypted pair into the current batch.
    pub fn submit(
        &mut self,
        cipher: &dyn HomomorphicCipher,
        provider: Address,
        tax: CiphertextHandle,
        resource: CiphertextHandle,
    ) -> ProtocolResult<DataSubmitted> {
        let batch = self.require_current_open_mut()?;
        let count = batch.accumulator.accumulate(cipher, provider, tax, resource)?;
        Ok(DataSubmitted {
            provider,
            batch_id: batch.id,
            count,
        })
    }

    pub fn require_current_open(&self) -> ProtocolResult<&Batch> {
        match self.current() {
            Some(batch) if batch.is_open() => Ok(batch),
            _ => Err(ProtocolError::InvalidBatch(self.current)),
        }
    }

    pub fn require_current_closed(&self) -> ProtocolResult<&Batch> {
        match self.current() {
            Some(batch) if batch.is_closed() => Ok(batch),
            _ => Err(ProtocolError::InvalidBatch(self.current)),
        }
    }

    /// Record decrypted totals on a batch.
    pub fn set_revealed(&mut self, id: BatchId, totals: Totals) -> ProtocolResult<()> {
        let batch = self
            .batches
            .get_mut(&id)
            .ok_or(ProtocolError::InvalidBatch(id))?;
        batch.revealed = Some(totals);
        Ok(())
    }

    fn require_current_open_mut(&mut self) -> ProtocolResult<&mut Batch> {
        let current = self.current;
        match self.batches.get_mut(&current) {
            Some(batch) if batch.is_open() => Ok(batch),
            _ => Err(ProtocolError::InvalidBatch(current)),
        }
    }
}
