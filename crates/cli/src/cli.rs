// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::telemetry::setup_tracing;
use crate::{config, demo};
use anyhow::{bail, Result};
use clap::{ArgAction, Parser, Subcommand};
use ctally_config::{load_config, AppConfig};
use tracing::{info, instrument, Level};

#[derive(Parser, Debug)]
#[command(name = "ctally")]
#[command(about = "Aggregate encrypted figures and reveal only the totals", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,

    /// Indicate error levels by adding additional `-v` arguments. Eg. `ctally -vvv` will give you
    /// trace level output
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Silence all output. This argument cannot be used alongside `-v`
    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "verbose",
        global = true
    )]
    quiet: bool,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,  //
                1 => Level::INFO,  // -v
                2 => Level::DEBUG, // -vv
                _ => Level::TRACE, // -vvv
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn execute(self) -> Result<()> {
        let config = self.load_config()?;
        setup_tracing(self.log_level());
        info!("Config loaded from: {:?}", config.config_file);

        match self.command {
            Commands::Demo {
                tax,
                resource,
                seed,
            } => {
                if tax.len() != resource.len() {
                    bail!(
                        "--tax has {} values but --resource has {}",
                        tax.len(),
                        resource.len()
                    );
                }
                let pairs = tax.into_iter().zip(resource).collect();
                demo::execute(&config, pairs, seed).await?
            }
            Commands::Config => config::execute(&config)?,
        }

        Ok(())
    }

    pub fn load_config(&self) -> Result<AppConfig> {
        load_config(self.config.as_deref())
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one batch end to end in-process: providers submit encrypted figures, the owner closes
    /// the batch and a local oracle reveals the totals
    Demo {
        /// Comma separated tax figures, one per provider
        #[arg(long, value_delimiter = ',', required = true)]
        tax: Vec<u64>,

        /// Comma separated resource figures, one per provider
        #[arg(long, value_delimiter = ',', required = true)]
        resource: Vec<u64>,

        /// Seed for the encryption randomness
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the resolved configuration
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_demo_values() {
        let cli = Cli::try_parse_from(["ctally", "demo", "--tax", "5,3", "--resource", "2,1"])
            .unwrap();
        let Commands::Demo { tax, resource, seed } = cli.command else {
            panic!("demo expected");
        };
        assert_eq!(tax, vec![5, 3]);
        assert_eq!(resource, vec![2, 1]);
        assert_eq!(seed, None);
    }

    #[test]
    fn verbosity_maps_to_level() {
        let cli = Cli::try_parse_from(["ctally", "-vv", "config"]).unwrap();
        assert_eq!(cli.log_level(), Level::DEBUG);
        let cli = Cli::try_parse_from(["ctally", "--quiet", "config"]).unwrap();
        assert_eq!(cli.log_level(), Level::ERROR);
        assert!(Cli::try_parse_from(["ctally", "-v", "--quiet", "config"]).is_err());
    }
}
