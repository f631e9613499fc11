// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use core::fmt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{ops::Deref, sync::Arc};

/// Opaque reference to an encrypted value.
///
/// The bytes are the serialized ciphertext of the underlying scheme. An empty handle is the
/// uninitialized handle: it stands for an encryption of zero and is what every running sum
/// starts from, but it is never accepted as a contribution.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct CiphertextHandle(Arc<Vec<u8>>);

impl CiphertextHandle {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(Arc::new(bytes))
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for CiphertextHandle {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<u8>> for CiphertextHandle {
    fn from(value: Vec<u8>) -> Self {
        Self::from_bytes(value)
    }
}

impl fmt::Debug for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        hexf(self, f)
    }
}

impl Serialize for CiphertextHandle {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CiphertextHandle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let vec: Vec<u8> = Vec::deserialize(deserializer)?;
        Ok(CiphertextHandle(Arc::new(vec)))
    }
}

/// Hex formatter that truncates long ciphertexts to their first and last bytes.
pub fn hexf(data: &[u8], f: &mut fmt::Formatter) -> fmt::Result {
    let s: String = data.iter().map(|b| format!("{:02x}", b)).collect();
    if s.len() <= 100 {
        write!(f, "0x{}", s)
    } else {
        write!(
            f,
            "<bytes({}):0x{}..{}>",
            data.len(),
            &s[..25],
            &s[s.len() - 25..]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_handles_print_in_full() {
        let handle = CiphertextHandle::from_bytes(vec![0xde, 0xad]);
        assert_eq!(format!("{:?}", handle), "0xdead");
    }

    #[test]
    fn long_handles_are_truncated() {
        let handle = CiphertextHandle::from_bytes(vec![0xab; 200]);
        let shown = format!("{:?}", handle);
        assert!(shown.starts_with("<bytes(200):0xabab"));
        assert!(shown.len() < 100);
    }

    #[test]
    fn empty_is_default() {
        assert!(CiphertextHandle::empty().is_empty());
        assert_eq!(CiphertextHandle::empty(), CiphertextHandle::default());
    }
}
