// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::B256;
use ctally_events::BatchId;
use serde::{Deserialize, Serialize};

/// What the protocol remembers about one outstanding or answered decryption request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionContext {
    pub batch_id: BatchId,
    /// Fingerprint of the batch aggregate at request time
    pub state_hash: B256,
    pub processed: bool,
}

impl DecryptionContext {
    pub fn new(batch_id: BatchId, state_hash: B256) -> Self {
        Self {
            batch_id,
            state_hash,
            processed: false,
        }
    }
}
