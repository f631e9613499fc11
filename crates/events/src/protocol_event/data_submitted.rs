// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::BatchId;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A provider's encrypted contribution was folded into the batch aggregate.
///
/// Only the submission count is published. The ciphertexts themselves stay in the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataSubmitted {
    pub provider: Address,
    pub batch_id: BatchId,
    /// Submission count of the batch after this contribution
    pub count: u64,
}

impl Display for DataSubmitted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "provider: {}, {}, count: {}",
            self.provider, self.batch_id, self.count
        )
    }
}
