// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{CiphertextHandle, HomomorphicCipher};
use anyhow::{ensure, Context, Result};
use fhe::bfv::{BfvParameters, Ciphertext, Encoding, Plaintext, PublicKey, SecretKey};
use fhe_traits::{
    DeserializeParametrized, FheDecoder, FheDecrypter, FheEncoder, FheEncrypter, Serialize,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::sync::{Arc, Mutex};

pub type SharedRng = Arc<Mutex<ChaCha20Rng>>;

pub fn create_shared_rng_from_u64(seed: u64) -> SharedRng {
    Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed)))
}

/// Fhe library adaptor. Holds only public parameters, so it can add and validate
/// ciphertexts but has no way to decrypt them.
#[derive(Clone)]
pub struct Fhe {
    params: Arc<BfvParameters>,
}

impl Fhe {
    pub fn new(params: Arc<BfvParameters>) -> Self {
        Self { params }
    }

    pub fn params(&self) -> Arc<BfvParameters> {
        self.params.clone()
    }

    /// Parse a contribution or running sum. Only fresh-shaped ciphertexts (two parts, top
    /// level) are accepted, since BFV addition panics on any shape mismatch.
    fn parse(&self, ct: &CiphertextHandle) -> Result<Ciphertext> {
        let ct =
            Ciphertext::from_bytes(ct, &self.params).context("Error deserializing ciphertext")?;
        ensure!(
            ct.c.len() == 2,
            "Expected a two-part ciphertext, got {} parts",
            ct.c.len()
        );
        ensure!(
            ct.level == 0,
            "Expected a ciphertext at level 0, got level {}",
            ct.level
        );
        Ok(ct)
    }
}

impl HomomorphicCipher for Fhe {
    fn is_initialized(&self, ct: &CiphertextHandle) -> bool {
        !ct.is_empty() && self.parse(ct).is_ok()
    }

    fn add(&self, lhs: &CiphertextHandle, rhs: &CiphertextHandle) -> Result<CiphertextHandle> {
        match (lhs.is_empty(), rhs.is_empty()) {
            (true, true) => Ok(CiphertextHandle::empty()),
            (true, false) => self.parse(rhs).map(|_| rhs.clone()),
            (false, true) => self.parse(lhs).map(|_| lhs.clone()),
            (false, false) => {
                let mut sum = self.parse(lhs)?;
                sum += &self.parse(rhs)?;
                Ok(CiphertextHandle::from_bytes(sum.to_bytes()))
            }
        }
    }
}

/// Encrypts single values under a BFV public key. This is the provider side of the protocol.
#[derive(Clone)]
pub struct Encryptor {
    params: Arc<BfvParameters>,
    public_key: PublicKey,
    rng: SharedRng,
}

impl Encryptor {
    pub fn new(params: Arc<BfvParameters>, public_key: PublicKey, rng: SharedRng) -> Self {
        Self {
            params,
            public_key,
            rng,
        }
    }

    pub fn from_public_key_bytes(
        params: Arc<BfvParameters>,
        bytes: &[u8],
        rng: SharedRng,
    ) -> Result<Self> {
        let public_key =
            PublicKey::from_bytes(bytes, &params).context("Error deserializing public key")?;
        Ok(Self::new(params, public_key, rng))
    }

    pub fn encrypt_u64(&self, value: u64) -> Result<CiphertextHandle> {
        let pt = Plaintext::try_encode(&[value], Encoding::poly(), &self.params)?;
        let ct = self
            .public_key
            .try_encrypt(&pt, &mut *self.rng.lock().unwrap())?;
        Ok(CiphertextHandle::from_bytes(ct.to_bytes()))
    }
}

/// BFV key pair. The secret half belongs to whoever plays the decryption oracle.
pub struct FheKeys {
    params: Arc<BfvParameters>,
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl FheKeys {
    pub fn generate(params: Arc<BfvParameters>, rng: &SharedRng) -> Self {
        let mut rng = rng.lock().unwrap();
        let secret_key = SecretKey::random(&params, &mut *rng);
        let public_key = PublicKey::new(&secret_key, &mut *rng);
        Self {
            params,
            secret_key,
            public_key,
        }
    }

    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.public_key.to_bytes()
    }

    pub fn encryptor(&self, rng: SharedRng) -> Encryptor {
        Encryptor::new(self.params.clone(), self.public_key.clone(), rng)
    }

    /// Decrypt a single value. The empty handle decrypts to zero.
    pub fn decrypt_u64(&self, ct: &CiphertextHandle) -> Result<u64> {
        if ct.is_empty() {
            return Ok(0);
        }
        let ct = Ciphertext::from_bytes(ct, &self.params)
            .context("Error deserializing ciphertext")?;
        let pt = self.secret_key.try_decrypt(&ct)?;
        let decoded = Vec::<u64>::try_decode(&pt, Encoding::poly())?;
        Ok(decoded.first().copied().unwrap_or_default())
    }
}
