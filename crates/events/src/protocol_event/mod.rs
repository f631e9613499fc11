// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod batch_closed;
mod batch_opened;
mod cooldown_set;
mod data_submitted;
mod decryption_completed;
mod decryption_requested;
mod pause_changed;
mod provider_added;
mod provider_removed;

pub use batch_closed::*;
pub use batch_opened::*;
pub use cooldown_set::*;
pub use data_submitted::*;
pub use decryption_completed::*;
pub use decryption_requested::*;
pub use pause_changed::*;
pub use provider_added::*;
pub use provider_removed::*;

use crate::{BatchId, Event, EventId};
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to help define From traits for ProtocolEventData
macro_rules! impl_from_event {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for ProtocolEventData {
                fn from(data: $variant) -> Self {
                    ProtocolEventData::$variant(data)
                }
            }
        )*
    };
}

/// Payload of every entry in the audit stream.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolEventData {
    ProviderAdded(ProviderAdded),
    ProviderRemoved(ProviderRemoved),
    Paused(Paused),
    Unpaused(Unpaused),
    CooldownSet(CooldownSet),
    BatchOpened(BatchOpened),
    BatchClosed(BatchClosed),
    DataSubmitted(DataSubmitted),
    DecryptionRequested(DecryptionRequested),
    DecryptionCompleted(DecryptionCompleted),
}

impl_from_event!(
    ProviderAdded,
    ProviderRemoved,
    Paused,
    Unpaused,
    CooldownSet,
    BatchOpened,
    BatchClosed,
    DataSubmitted,
    DecryptionRequested,
    DecryptionCompleted
);

impl ProtocolEventData {
    pub fn batch_id(&self) -> Option<BatchId> {
        match self {
            ProtocolEventData::BatchOpened(data) => Some(data.batch_id),
            ProtocolEventData::BatchClosed(data) => Some(data.batch_id),
            ProtocolEventData::DataSubmitted(data) => Some(data.batch_id),
            ProtocolEventData::DecryptionRequested(data) => Some(data.batch_id),
            ProtocolEventData::DecryptionCompleted(data) => Some(data.batch_id),
            _ => None,
        }
    }
}

impl fmt::Display for ProtocolEventData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolEventData::ProviderAdded(data) => write!(f, "{}", data),
            ProtocolEventData::ProviderRemoved(data) => write!(f, "{}", data),
            ProtocolEventData::Paused(data) => write!(f, "{}", data),
            ProtocolEventData::Unpaused(data) => write!(f, "{}", data),
            ProtocolEventData::CooldownSet(data) => write!(f, "{}", data),
            ProtocolEventData::BatchOpened(data) => write!(f, "{}", data),
            ProtocolEventData::BatchClosed(data) => write!(f, "{}", data),
            ProtocolEventData::DataSubmitted(data) => write!(f, "{}", data),
            ProtocolEventData::DecryptionRequested(data) => write!(f, "{}", data),
            ProtocolEventData::DecryptionCompleted(data) => write!(f, "{}", data),
        }
    }
}

/// One entry of the audit stream of a protocol instance.
///
/// `seq` is assigned by the emitting instance and increases by one per event, so two
/// identical payloads emitted at different points of the stream still get distinct ids.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct ProtocolEvent {
    id: EventId,
    seq: u64,
    data: ProtocolEventData,
}

impl ProtocolEvent {
    pub fn new(seq: u64, data: impl Into<ProtocolEventData>) -> Self {
        let data = data.into();
        Self {
            id: EventId::from_payload(&(seq, &data)),
            seq,
            data,
        }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn batch_id(&self) -> Option<BatchId> {
        self.data.batch_id()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

impl Event for ProtocolEvent {
    type Id = EventId;
    type Data = ProtocolEventData;

    fn event_type(&self) -> String {
        let s = format!("{:?}", self.data);
        extract_event_name(&s).to_string()
    }

    fn event_id(&self) -> Self::Id {
        self.id
    }

    fn get_data(&self) -> &Self::Data {
        &self.data
    }

    fn into_data(self) -> Self::Data {
        self.data
    }
}

impl fmt::Display for ProtocolEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}({})", self.event_type(), self.seq, self.data)
    }
}

fn extract_event_name(s: &str) -> &str {
    let bytes = s.as_bytes();
    for (i, &item) in bytes.iter().enumerate() {
        if item == b' ' || item == b'(' {
            return &s[..i];
        }
    }
    s
}
