// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{encode_cleartexts, sign_proof, DecryptionOracle, ProofVerifier};
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{anyhow, bail, Result};
use ctally_events::{RequestId, Totals};
use ctally_fhe::{CiphertextHandle, FheKeys};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::{debug, info};

/// What the oracle pushes back for one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecryptionResponse {
    pub request_id: RequestId,
    pub cleartexts: Vec<u8>,
    pub proof: Vec<u8>,
}

#[derive(Default)]
struct LocalOracleState {
    next_id: u64,
    pending: BTreeMap<RequestId, [CiphertextHandle; 2]>,
}

/// In-process decryption oracle.
///
/// Holds the BFV secret key and a signing key. Requests are queued until [`fulfil`] is called,
/// which decrypts the pair and signs the encoded cleartexts.
///
/// [`fulfil`]: LocalOracle::fulfil
pub struct LocalOracle {
    keys: FheKeys,
    signer: PrivateKeySigner,
    verifier: ProofVerifier,
    state: Mutex<LocalOracleState>,
}

impl LocalOracle {
    pub fn new(keys: FheKeys, signer: PrivateKeySigner) -> Self {
        let verifier = ProofVerifier::new(signer.address());
        Self {
            keys,
            signer,
            verifier,
            state: Mutex::new(LocalOracleState {
                next_id: 1,
                pending: BTreeMap::new(),
            }),
        }
    }

    /// Oracle with a freshly generated signing key.
    pub fn random(keys: FheKeys) -> Self {
        Self::new(keys, PrivateKeySigner::random())
    }

    pub fn from_signer_key(keys: FheKeys, hex_key: &str) -> Result<Self> {
        let signer: PrivateKeySigner = hex_key
            .parse()
            .map_err(|e| anyhow!("Invalid oracle signer key: {e}"))?;
        Ok(Self::new(keys, signer))
    }

    /// Address proofs are signed with.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn keys(&self) -> &FheKeys {
        &self.keys
    }

    /// Ids still waiting for [`LocalOracle::fulfil`].
    pub fn pending(&self) -> Vec<RequestId> {
        self.state.lock().unwrap().pending.keys().copied().collect()
    }

    /// Decrypt a queued request and produce the signed response. The request leaves the queue.
    pub fn fulfil(&self, request_id: RequestId) -> Result<DecryptionResponse> {
        let [tax, resource] = self
            .state
            .lock()
            .unwrap()
            .pending
            .remove(&request_id)
            .ok_or_else(|| anyhow!("No pending decryption request {request_id}"))?;

        let totals = Totals::new(
            self.keys.decrypt_u64(&tax)?,
            self.keys.decrypt_u64(&resource)?,
        );
        let cleartexts = encode_cleartexts(totals);
        let proof = sign_proof(&self.signer, request_id, &cleartexts)?;
        info!(request_id = %request_id, "Decryption request fulfilled");

        Ok(DecryptionResponse {
            request_id,
            cleartexts,
            proof,
        })
    }
}

impl DecryptionOracle for LocalOracle {
    fn request_decryption(&self, ciphertexts: &[CiphertextHandle]) -> Result<RequestId> {
        let [tax, resource] = ciphertexts else {
            bail!("expected 2 ciphertexts, got {}", ciphertexts.len());
        };
        let mut state = self.state.lock().unwrap();
        let request_id = RequestId::new(state.next_id);
        state.next_id += 1;
        state
            .pending
            .insert(request_id, [tax.clone(), resource.clone()]);
        debug!(request_id = %request_id, "Decryption request queued");
        Ok(request_id)
    }

    fn verify_proof(&self, request_id: RequestId, cleartexts: &[u8], proof: &[u8]) -> bool {
        self.verifier.verify(request_id, cleartexts, proof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode_cleartexts;
    use ctally_fhe::{create_shared_rng_from_u64, BfvParamSet};

    fn oracle() -> (LocalOracle, ctally_fhe::Encryptor) {
        let rng = create_shared_rng_from_u64(11);
        let keys = FheKeys::generate(BfvParamSet::default().build_arc(), &rng);
        let encryptor = keys.encryptor(rng);
        (LocalOracle::random(keys), encryptor)
    }

    #[test]
    fn ids_are_fresh_and_start_at_one() -> Result<()> {
        let (oracle, enc) = oracle();
        let pair = [enc.encrypt_u64(1)?, enc.encrypt_u64(2)?];
        assert_eq!(oracle.request_decryption(&pair)?, RequestId::new(1));
        assert_eq!(oracle.request_decryption(&pair)?, RequestId::new(2));
        assert_eq!(oracle.pending(), vec![RequestId::new(1), RequestId::new(2)]);
        Ok(())
    }

    #[test]
    fn rejects_wrong_arity() -> Result<()> {
        let (oracle, enc) = oracle();
        assert!(oracle.request_decryption(&[]).is_err());
        assert!(oracle
            .request_decryption(&[enc.encrypt_u64(1)?])
            .is_err());
        assert!(oracle.pending().is_empty());
        Ok(())
    }

    #[test]
    fn fulfil_decrypts_and_signs() -> Result<()> {
        let (oracle, enc) = oracle();
        let id = oracle.request_decryption(&[enc.encrypt_u64(8)?, CiphertextHandle::empty()])?;

        let response = oracle.fulfil(id)?;
        assert_eq!(response.request_id, id);
        assert_eq!(decode_cleartexts(&response.cleartexts)?, Totals::new(8, 0));
        assert!(oracle.verify_proof(id, &response.cleartexts, &response.proof));
        assert!(oracle.pending().is_empty());

        // one response per request
        assert!(oracle.fulfil(id).is_err());
        Ok(())
    }

    #[test]
    fn signer_key_from_hex() -> Result<()> {
        let rng = create_shared_rng_from_u64(1);
        let keys = FheKeys::generate(BfvParamSet::default().build_arc(), &rng);
        let oracle = LocalOracle::from_signer_key(
            keys,
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )?;
        assert_eq!(
            oracle.address().to_string(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
        Ok(())
    }
}
