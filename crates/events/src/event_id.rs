// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::error;

/// Content address of an audit event: SHA-256 over the bincode encoding of its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub [u8; 32]);

impl EventId {
    pub fn from_payload<T: Serialize + ?Sized>(payload: &T) -> Self {
        let mut hasher = Sha256::new();
        // bincode only fails on sequences of unknown length, which event payloads never contain
        if let Err(e) = bincode::serialize_into(&mut hasher, payload) {
            error!("Could not encode event payload for hashing: {e}");
        }
        EventId(hasher.finalize().into())
    }

    fn short(&self) -> String {
        let encoded = bs58::encode(&self.0).into_string();
        encoded.chars().take(8).collect()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evt:{}", self.short())
    }
}
