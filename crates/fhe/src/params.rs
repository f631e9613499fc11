// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{anyhow, Result};
use fhe::bfv::{BfvParameters, BfvParametersBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Standard BFV parameter set as (degree, plaintext_modulus, moduli).
///
/// - Degree: 2048 (polynomial ring size)
/// - Plaintext modulus: 1032193, every revealed total is reduced modulo this value
/// - Moduli: [0x3FFFFFFF000001]
pub const SET_2048_1032193_1: (usize, u64, [u64; 1]) = (2048, 1032193, [0x3FFFFFFF000001]);

/// Serializable description of a BFV parameter set, as it appears in configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BfvParamSet {
    pub degree: usize,
    pub plaintext_modulus: u64,
    pub moduli: Vec<u64>,
}

impl Default for BfvParamSet {
    fn default() -> Self {
        let (degree, plaintext_modulus, moduli) = SET_2048_1032193_1;
        Self {
            degree,
            plaintext_modulus,
            moduli: moduli.to_vec(),
        }
    }
}

impl BfvParamSet {
    pub fn build_arc(&self) -> Arc<BfvParameters> {
        build_bfv_params_arc(self.degree, self.plaintext_modulus, &self.moduli)
    }

    /// Like [`BfvParamSet::build_arc`] but reports parameters the library refuses.
    pub fn try_build_arc(&self) -> Result<Arc<BfvParameters>> {
        BfvParametersBuilder::new()
            .set_degree(self.degree)
            .set_plaintext_modulus(self.plaintext_modulus)
            .set_moduli(&self.moduli)
            .build_arc()
            .map_err(|e| anyhow!("Invalid BFV parameters: {e}"))
    }
}

/// Builds BFV encryption parameters wrapped in an `Arc` for shared ownership.
///
/// # Panics
///
/// Panics if the parameters cannot be built (e.g., invalid degree or moduli).
pub fn build_bfv_params_arc(
    degree: usize,
    plaintext_modulus: u64,
    moduli: &[u64],
) -> Arc<BfvParameters> {
    match BfvParametersBuilder::new()
        .set_degree(degree)
        .set_plaintext_modulus(plaintext_modulus)
        .set_moduli(moduli)
        .build_arc()
    {
        Ok(params) => params,
        Err(e) => panic!("Failed to build BFV Parameters wrapped in Arc: {}", e),
    }
}
