// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::CiphertextHandle;
use anyhow::Result;

/// Capability of an additively homomorphic cryptosystem as seen by the protocol.
///
/// Implementations never decrypt. `add` must be associative and commutative on the
/// underlying plaintexts, and treats the empty handle as an encryption of zero.
pub trait HomomorphicCipher: Send + Sync {
    /// Whether `ct` is a well-formed ciphertext for this scheme and parameter set.
    fn is_initialized(&self, ct: &CiphertextHandle) -> bool;

    /// Combine two ciphertexts into one that decrypts to the sum of their plaintexts.
    fn add(&self, lhs: &CiphertextHandle, rhs: &CiphertextHandle) -> Result<CiphertextHandle>;
}
