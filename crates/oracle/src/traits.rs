// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use ctally_events::RequestId;
use ctally_fhe::CiphertextHandle;

/// Off-protocol party holding the decryption key.
///
/// A request returns as soon as the oracle has accepted it; the cleartexts arrive later through
/// the protocol's callback entry point together with a proof that [`verify_proof`] accepts.
///
/// [`verify_proof`]: DecryptionOracle::verify_proof
pub trait DecryptionOracle: Send + Sync {
    /// Queue `ciphertexts` for decryption. Every call yields a fresh id.
    fn request_decryption(&self, ciphertexts: &[CiphertextHandle]) -> Result<RequestId>;

    /// Whether `proof` attests that `cleartexts` is the decryption issued for `request_id`.
    fn verify_proof(&self, request_id: RequestId, cleartexts: &[u8], proof: &[u8]) -> bool;
}
