// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{decode_cleartexts, state_hash, DecryptionContext, DecryptionOracle};
use alloy::primitives::{Address, B256};
use ctally_aggregator::{Batch, BatchLedger, ProtocolError, ProtocolResult};
use ctally_events::{DecryptionCompleted, DecryptionRequested, RequestId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Protocol side of the oracle round trip.
///
/// Owns the context table. Contexts are appended on request and flip to processed exactly once
/// on a valid callback. They are never removed.
pub struct DecryptionOracleClient {
    instance: Address,
    oracle: Arc<dyn DecryptionOracle>,
    contexts: BTreeMap<RequestId, DecryptionContext>,
}

impl DecryptionOracleClient {
    pub fn new(instance: Address, oracle: Arc<dyn DecryptionOracle>) -> Self {
        Self {
            instance,
            oracle,
            contexts: BTreeMap::new(),
        }
    }

    pub fn instance(&self) -> Address {
        self.instance
    }

    pub fn context(&self, request_id: RequestId) -> Option<&DecryptionContext> {
        self.contexts.get(&request_id)
    }

    pub fn contexts(&self) -> impl Iterator<Item = (&RequestId, &DecryptionContext)> {
        self.contexts.iter()
    }

    fn fingerprint(&self, batch: &Batch) -> B256 {
        let [tax, resource] = batch.encrypted_totals();
        state_hash(&tax, &resource, self.instance)
    }

    /// Hand the aggregate of `batch` to the oracle and remember what it looked like.
    pub fn request(&mut self, batch: &Batch) -> ProtocolResult<DecryptionRequested> {
        let hash = self.fingerprint(batch);
        let request_id = self
            .oracle
            .request_decryption(&batch.encrypted_totals())
            .map_err(|e| ProtocolError::Oracle(e.to_string()))?;

        if self.contexts.contains_key(&request_id) {
            return Err(ProtocolError::Oracle(format!(
                "oracle reissued request id {request_id}"
            )));
        }

        debug!(request_id = %request_id, state_hash = %hash, "Stored decryption context");
        self.contexts
            .insert(request_id, DecryptionContext::new(batch.id(), hash));
        info!(request_id = %request_id, batch_id = %batch.id(), "Decryption requested");

        Ok(DecryptionRequested {
            request_id,
            batch_id: batch.id(),
        })
    }

    /// Validate an oracle response and, if it holds, record the revealed totals on the batch.
    ///
    /// Checks run in the order: known request, not yet processed, aggregate unchanged, proof
    /// valid, cleartexts decodable. Nothing is written unless all pass.
    pub fn on_callback(
        &mut self,
        ledger: &mut BatchLedger,
        request_id: RequestId,
        cleartexts: &[u8],
        proof: &[u8],
    ) -> ProtocolResult<DecryptionCompleted> {
        let context = self
            .contexts
            .get(&request_id)
            .ok_or(ProtocolError::UnknownRequest(request_id))?;

        if context.processed {
            return Err(ProtocolError::ReplayDetected(request_id));
        }

        let batch_id = context.batch_id;
        let current = ledger
            .batch(batch_id)
            .map(|batch| self.fingerprint(batch))
            .ok_or(ProtocolError::StateMismatch(request_id))?;
        if current != context.state_hash {
            debug!(
                request_id = %request_id,
                stored = %context.state_hash,
                current = %current,
                "State hash mismatch"
            );
            return Err(ProtocolError::StateMismatch(request_id));
        }

        if !self.oracle.verify_proof(request_id, cleartexts, proof) {
            return Err(ProtocolError::DecryptionFailed(
                "proof did not verify".to_string(),
            ));
        }

        let results = decode_cleartexts(cleartexts)
            .map_err(|e| ProtocolError::DecryptionFailed(e.to_string()))?;

        ledger.set_revealed(batch_id, results)?;
        if let Some(context) = self.contexts.get_mut(&request_id) {
            context.processed = true;
        }
        info!(
            request_id = %request_id,
            batch_id = %batch_id,
            results = %results,
            "Decryption completed"
        );

        Ok(DecryptionCompleted {
            request_id,
            batch_id,
            results,
        })
    }

    /// Overwrite the stored fingerprint of a request.
    #[cfg(any(test, feature = "test-helpers"))]
    pub fn tamper_state_hash(&mut self, request_id: RequestId, state_hash: B256) -> bool {
        match self.contexts.get_mut(&request_id) {
            Some(context) => {
                context.state_hash = state_hash;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{encode_cleartexts, LocalOracle};
    use anyhow::Result;
    use ctally_events::{BatchId, Totals};
    use ctally_fhe::{create_shared_rng_from_u64, BfvParamSet, Encryptor, Fhe, FheKeys};

    const INSTANCE: Address = Address::repeat_byte(0x42);
    const ALICE: Address = Address::repeat_byte(0xa1);

    struct Setup {
        fhe: Fhe,
        enc: Encryptor,
        oracle: Arc<LocalOracle>,
        client: DecryptionOracleClient,
        ledger: BatchLedger,
    }

    fn setup() -> Result<Setup> {
        let rng = create_shared_rng_from_u64(5);
        let params = BfvParamSet::default().build_arc();
        let keys = FheKeys::generate(params.clone(), &rng);
        let enc = keys.encryptor(rng);
        let oracle = Arc::new(LocalOracle::random(keys));
        let client = DecryptionOracleClient::new(INSTANCE, oracle.clone());
        let fhe = Fhe::new(params);

        let mut ledger = BatchLedger::new();
        ledger.open_batch();
        ledger.submit(&fhe, ALICE, enc.encrypt_u64(5)?, enc.encrypt_u64(2)?)?;
        ledger.submit(&fhe, ALICE, enc.encrypt_u64(3)?, enc.encrypt_u64(1)?)?;
        ledger.close_batch()?;

        Ok(Setup {
            fhe,
            enc,
            oracle,
            client,
            ledger,
        })
    }

    fn request(s: &mut Setup) -> Result<RequestId> {
        let batch = s.ledger.require_current_closed()?;
        Ok(s.client.request(batch)?.request_id)
    }

    #[test]
    fn round_trip_reveals_totals() -> Result<()> {
        let mut s = setup()?;
        let id = request(&mut s)?;
        let context = s.client.context(id).cloned().unwrap();
        assert_eq!(context.batch_id, BatchId::new(1));
        assert!(!context.processed);

        let response = s.oracle.fulfil(id)?;
        let event = s
            .client
            .on_callback(&mut s.ledger, id, &response.cleartexts, &response.proof)?;
        assert_eq!(
            event,
            DecryptionCompleted {
                request_id: id,
                batch_id: BatchId::new(1),
                results: Totals::new(8, 3),
            }
        );
        assert!(s.client.context(id).unwrap().processed);
        assert_eq!(
            s.ledger.batch(BatchId::new(1)).and_then(Batch::revealed),
            Some(Totals::new(8, 3))
        );
        Ok(())
    }

    #[test]
    fn second_callback_is_a_replay() -> Result<()> {
        let mut s = setup()?;
        let id = request(&mut s)?;
        let response = s.oracle.fulfil(id)?;
        s.client
            .on_callback(&mut s.ledger, id, &response.cleartexts, &response.proof)?;

        let err = s
            .client
            .on_callback(&mut s.ledger, id, &response.cleartexts, &response.proof)
            .unwrap_err();
        assert_eq!(err, ProtocolError::ReplayDetected(id));
        Ok(())
    }

    #[test]
    fn unknown_request_is_rejected() -> Result<()> {
        let mut s = setup()?;
        let err = s
            .client
            .on_callback(&mut s.ledger, RequestId::new(77), &[], &[])
            .unwrap_err();
        assert_eq!(err, ProtocolError::UnknownRequest(RequestId::new(77)));
        Ok(())
    }

    #[test]
    fn tampered_fingerprint_is_a_state_mismatch() -> Result<()> {
        let mut s = setup()?;
        let id = request(&mut s)?;
        let response = s.oracle.fulfil(id)?;

        assert!(s.client.tamper_state_hash(id, B256::repeat_byte(0xff)));
        let err = s
            .client
            .on_callback(&mut s.ledger, id, &response.cleartexts, &response.proof)
            .unwrap_err();
        assert_eq!(err, ProtocolError::StateMismatch(id));
        assert!(!s.client.context(id).unwrap().processed);
        assert!(s.ledger.batch(BatchId::new(1)).unwrap().revealed().is_none());
        Ok(())
    }

    #[test]
    fn forged_cleartexts_fail_the_proof() -> Result<()> {
        let mut s = setup()?;
        let id = request(&mut s)?;
        let response = s.oracle.fulfil(id)?;
        let forged = encode_cleartexts(Totals::new(1000, 3));

        let err = s
            .client
            .on_callback(&mut s.ledger, id, &forged, &response.proof)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::DecryptionFailed(_)));
        assert!(!s.client.context(id).unwrap().processed);

        // the genuine response is still accepted afterwards
        s.client
            .on_callback(&mut s.ledger, id, &response.cleartexts, &response.proof)?;
        Ok(())
    }

    #[test]
    fn each_request_gets_its_own_context() -> Result<()> {
        let mut s = setup()?;
        let first = request(&mut s)?;
        let second = request(&mut s)?;
        assert_ne!(first, second);
        assert_eq!(s.client.contexts().count(), 2);

        // a later batch does not disturb the fence of an earlier one
        s.ledger.open_batch();
        s.ledger
            .submit(&s.fhe, ALICE, s.enc.encrypt_u64(9)?, s.enc.encrypt_u64(9)?)?;
        let response = s.oracle.fulfil(first)?;
        s.client
            .on_callback(&mut s.ledger, first, &response.cleartexts, &response.proof)?;
        Ok(())
    }
}
