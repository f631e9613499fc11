// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Emitted when the owner changes the cooldown applied to submissions and decryption requests.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CooldownSet {
    /// Previous cooldown in seconds
    pub old: u64,
    /// New cooldown in seconds
    pub new: u64,
}

impl Display for CooldownSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "old: {}s, new: {}s", self.old, self.new)
    }
}
