// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use ctally_fhe::SharedRng;
use rand::RngCore;

/// `count` distinct addresses drawn from `rng`.
pub fn create_random_eth_addrs(rng: &SharedRng, count: usize) -> Vec<Address> {
    let mut rng = rng.lock().unwrap();
    let mut addrs: Vec<Address> = Vec::with_capacity(count);
    while addrs.len() < count {
        let mut bytes = [0u8; 20];
        rng.fill_bytes(&mut bytes);
        let addr = Address::from(bytes);
        if !addrs.contains(&addr) {
            addrs.push(addr);
        }
    }
    addrs
}

/// Route tracing output through the test harness. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
