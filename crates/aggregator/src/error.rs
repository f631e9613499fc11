// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use ctally_events::{BatchId, RequestId};
use thiserror::Error;

/// Every way an operation on a protocol instance can be rejected.
///
/// A rejection aborts the whole operation: no state is changed and no event is emitted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("caller {0} is not the owner")]
    NotOwner(Address),

    #[error("caller {0} is not an authorized provider")]
    NotProvider(Address),

    #[error("protocol is paused")]
    Paused,

    #[error("protocol is already paused")]
    AlreadyPaused,

    #[error("cooldown active until {ready_at} (now {now})")]
    CooldownActive { now: u64, ready_at: u64 },

    #[error("current batch {0} is not in the required state")]
    InvalidBatch(BatchId),

    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("ciphertext is malformed or uninitialized")]
    InvalidCiphertext,

    #[error("decryption request {0} has already been processed")]
    ReplayDetected(RequestId),

    #[error("aggregate of the batch changed since decryption request {0}")]
    StateMismatch(RequestId),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("unknown decryption request {0}")]
    UnknownRequest(RequestId),

    #[error("decryption oracle rejected the request: {0}")]
    Oracle(String),
}

pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;
