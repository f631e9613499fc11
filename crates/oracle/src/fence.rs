// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{keccak256, Address, Bytes, B256};
use alloy::sol_types::SolValue;
use ctally_fhe::CiphertextHandle;

/// Fingerprint of a batch aggregate bound to one protocol instance.
///
/// `keccak256(abi.encode(bytes tax, bytes resource, address instance))`
pub fn state_hash(tax: &CiphertextHandle, resource: &CiphertextHandle, instance: Address) -> B256 {
    let encoded = (
        Bytes::copy_from_slice(tax),
        Bytes::copy_from_slice(resource),
        instance,
    )
        .abi_encode_params();
    keccak256(&encoded)
}
