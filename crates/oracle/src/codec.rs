// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::sol_types::SolValue;
use anyhow::{bail, Context, Result};
use ctally_events::Totals;

const ENCODED_LEN: usize = 64;

/// `abi.encode(uint64 tax, uint64 resource)`
pub fn encode_cleartexts(totals: Totals) -> Vec<u8> {
    (totals.tax, totals.resource).abi_encode_params()
}

pub fn decode_cleartexts(bytes: &[u8]) -> Result<Totals> {
    if bytes.len() != ENCODED_LEN {
        bail!(
            "expected {} bytes of cleartext, got {}",
            ENCODED_LEN,
            bytes.len()
        );
    }
    let (tax, resource) =
        <(u64, u64)>::abi_decode_params(bytes).context("Could not decode cleartexts")?;
    Ok(Totals::new(tax, resource))
}
