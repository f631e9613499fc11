// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::load_config::{find_in_parent, resolve_config_path, DEFAULT_CONFIG_NAME};
use alloy_primitives::{address, Address};
use anyhow::{anyhow, bail, Context, Result};
use ctally_fhe::BfvParamSet;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::{env, io};
use tracing::debug;

/// Prefix of environment variables that override file values. Nested keys use `__`,
/// e.g. `CTALLY_BFV__DEGREE`.
pub const ENV_PREFIX: &str = "CTALLY_";

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Hex private key the local oracle signs proofs with. A random key is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_key: Option<String>,
}

impl fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleConfig")
            .field("signer_key", &self.signer_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub owner: Address,
    pub instance: Address,
    pub cooldown_secs: u64,
    /// Providers registered on top of the owner at startup
    #[serde(default)]
    pub providers: Vec<Address>,
    pub bfv: BfvParamSet,
    #[serde(default)]
    pub oracle: OracleConfig,
    /// File the configuration was read from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            owner: address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
            instance: address!("5FbDB2315678afecb367f032d93F642f64180aa3"),
            cooldown_secs: 60,
            providers: Vec::new(),
            bfv: BfvParamSet::default(),
            oracle: OracleConfig::default(),
            config_file: None,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cooldown_secs == 0 {
            bail!("cooldown_secs must be greater than zero");
        }
        if self.owner == Address::ZERO {
            bail!("owner must not be the zero address");
        }
        if !self.bfv.degree.is_power_of_two() {
            bail!("bfv.degree must be a power of two, got {}", self.bfv.degree);
        }
        if self.bfv.moduli.is_empty() {
            bail!("bfv.moduli must not be empty");
        }
        if self.bfv.plaintext_modulus < 2 {
            bail!("bfv.plaintext_modulus must be at least 2");
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Could not serialize configuration")
    }
}

#[derive(Default, Serialize, Deserialize, Clone, Debug)]
struct ConfigOverrides {
    config_file: Option<PathBuf>,
}

/// Load configuration from the file given on the command line, or the nearest
/// `ctally.config.yaml`, or the OS config directory. A missing file is only an error when it
/// was asked for explicitly.
pub fn load_config(cli_file: Option<&str>) -> Result<AppConfig> {
    let cli_file = cli_file.map(PathBuf::from);
    let path = resolve_config_path(
        find_in_parent,
        &env::current_dir()?,
        &OsDirs::config_dir()?,
        DEFAULT_CONFIG_NAME,
        cli_file.as_deref(),
    );

    if cli_file.is_some() && !path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        ))
        .context("Configuration file not found");
    }

    load_config_from(&path)
}

/// Defaults, then the YAML file at `path` if it exists, then `CTALLY_*` environment variables.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let config_file = path.exists().then(|| path.to_path_buf());
    debug!(path = %path.display(), found = config_file.is_some(), "Loading configuration");

    let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
        .merge(Yaml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .merge(Serialized::defaults(ConfigOverrides { config_file }))
        .extract()
        .context("Could not parse configuration")?;

    config.validate()?;
    Ok(config)
}

pub struct OsDirs;

impl OsDirs {
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("ctally"))
            .ok_or_else(|| anyhow!("This platform provides no config directory"))
    }
}
