// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{ProtocolError, ProtocolResult};
use alloy_primitives::Address;
use ctally_fhe::{CiphertextHandle, HomomorphicCipher};
use serde::{Deserialize, Serialize};
use tracing::{error, trace};

/// One accepted contribution, kept for audit. Never decrypted individually.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub provider: Address,
    pub tax: CiphertextHandle,
    pub resource: CiphertextHandle,
}

/// Running encrypted sums of one batch plus the submissions that produced them.
///
/// Both sums start as the empty handle. After `n` accepted submissions `tax` decrypts to the
/// sum of the `n` submitted tax plaintexts, in whatever order they arrived.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedAccumulator {
    tax: CiphertextHandle,
    resource: CiphertextHandle,
    submissions: Vec<SubmissionRecord>,
}

impl EncryptedAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one provider's pair into the running sums.
    ///
    /// Both ciphertexts are validated and both new sums computed before anything is written,
    /// so a rejected pair leaves the accumulator untouched.
    pub fn accumulate(
        &mut self,
        cipher: &dyn HomomorphicCipher,
        provider: Address,
        tax: CiphertextHandle,
        resource: CiphertextHandle,
    ) -> ProtocolResult<u64> {
        if !cipher.is_initialized(&tax) || !cipher.is_initialized(&resource) {
            return Err(ProtocolError::InvalidCiphertext);
        }

        let add = |sum: &CiphertextHandle, ct: &CiphertextHandle| {
            cipher.add(sum, ct).map_err(|e| {
                error!("Homomorphic addition failed: {e}");
                ProtocolError::InvalidCiphertext
            })
        };
        let next_tax = add(&self.tax, &tax)?;
        let next_resource = add(&self.resource, &resource)?;

        self.tax = next_tax;
        self.resource = next_resource;
        self.submissions.push(SubmissionRecord {
            provider,
            tax,
            resource,
        });
        trace!(
            provider = %provider,
            count = self.count(),
            "Accumulated submission"
        );
        Ok(self.count())
    }

    pub fn count(&self) -> u64 {
        self.submissions.len() as u64
    }

    pub fn tax(&self) -> &CiphertextHandle {
        &self.tax
    }

    pub fn resource(&self) -> &CiphertextHandle {
        &self.resource
    }

    /// Both running sums in the order the oracle decrypts them.
    pub fn totals(&self) -> [CiphertextHandle; 2] {
        [self.tax.clone(), self.resource.clone()]
    }

    /// Submission at `ordinal`, counting from 1.
    pub fn submission(&self, ordinal: u64) -> Option<&SubmissionRecord> {
        let index = usize::try_from(ordinal.checked_sub(1)?).ok()?;
        self.submissions.get(index)
    }

    pub fn submissions(&self) -> &[SubmissionRecord] {
        &self.submissions
    }
}
