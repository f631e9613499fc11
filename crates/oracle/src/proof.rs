// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Oracle proofs.
//!
//! A proof is an EIP-191 personal signature by the oracle's key over
//! `keccak256(abi.encodePacked(uint64 requestId, bytes32 keccak256(cleartexts)))`.
//! Anyone knowing the oracle address can check it.

use alloy::primitives::{keccak256, Address, Signature, B256};
use alloy::signers::{local::PrivateKeySigner, SignerSync};
use alloy::sol_types::SolValue;
use anyhow::{anyhow, Result};
use ctally_events::RequestId;

pub fn proof_digest(request_id: RequestId, cleartexts: &[u8]) -> B256 {
    let encoded = (request_id.value(), keccak256(cleartexts)).abi_encode_packed();
    keccak256(&encoded)
}

pub fn sign_proof(
    signer: &PrivateKeySigner,
    request_id: RequestId,
    cleartexts: &[u8],
) -> Result<Vec<u8>> {
    let digest = proof_digest(request_id, cleartexts);
    let sig = signer
        .sign_message_sync(digest.as_slice())
        .map_err(|e| anyhow!("Failed to sign decryption proof: {e}"))?;
    Ok(sig.as_bytes().to_vec())
}

/// Checks proofs against a trusted oracle address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProofVerifier {
    oracle: Address,
}

impl ProofVerifier {
    pub fn new(oracle: Address) -> Self {
        Self { oracle }
    }

    pub fn recover_signer(
        request_id: RequestId,
        cleartexts: &[u8],
        proof: &[u8],
    ) -> Result<Address> {
        let sig = Signature::try_from(proof).map_err(|e| anyhow!("Invalid signature: {e}"))?;
        let digest = proof_digest(request_id, cleartexts);
        sig.recover_address_from_msg(digest.as_slice())
            .map_err(|e| anyhow!("Failed to recover signer address: {e}"))
    }

    /// Malformed proofs are reported as `false`, not as errors.
    pub fn verify(&self, request_id: RequestId, cleartexts: &[u8], proof: &[u8]) -> bool {
        Self::recover_signer(request_id, cleartexts, proof)
            .map(|signer| signer == self.oracle)
            .unwrap_or(false)
    }
}
