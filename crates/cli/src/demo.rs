// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::prelude::*;
use alloy_primitives::{keccak256, Address};
use anyhow::{anyhow, Context, Result};
use ctally_aggregator::SystemClock;
use ctally_config::AppConfig;
use ctally_events::{BatchId, EventBus, ProtocolEvent, Totals};
use ctally_fhe::{create_shared_rng_from_u64, Fhe, FheKeys};
use ctally_logger::SimpleLogger;
use ctally_oracle::LocalOracle;
use ctally_protocol::{
    AddProvider, CloseBatch, GetRevealedTotals, OpenBatch, OracleRelayer, Protocol, ProtocolActor,
    ProtocolParams, RequestBatchDecryption, Submit,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const REVEAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Address of the `index`th demo provider when the configuration names fewer providers.
fn demo_provider(index: usize) -> Address {
    Address::from_word(keccak256(format!("ctally-demo-provider-{index}")))
}

pub async fn execute(
    config: &AppConfig,
    pairs: Vec<(u64, u64)>,
    seed: Option<u64>,
) -> Result<()> {
    let params = config.bfv.try_build_arc()?;
    let rng = create_shared_rng_from_u64(seed.unwrap_or_else(rand::random));
    let keys = FheKeys::generate(params.clone(), &rng);
    let encryptor = keys.encryptor(rng);
    let oracle = Arc::new(match &config.oracle.signer_key {
        Some(key) => LocalOracle::from_signer_key(keys, key)?,
        None => LocalOracle::random(keys),
    });

    let bus = EventBus::<ProtocolEvent>::new().start();
    SimpleLogger::attach("ctally", bus.clone());

    let protocol = Protocol::new(ProtocolParams {
        owner: config.owner,
        instance: config.instance,
        cooldown: config.cooldown_secs,
        cipher: Arc::new(Fhe::new(params)),
        oracle: oracle.clone(),
        clock: Arc::new(SystemClock),
        publisher: Arc::new(bus.clone()),
    })?;
    let addr = ProtocolActor::attach(protocol);
    OracleRelayer::attach(&bus, oracle, addr.clone());

    let owner = config.owner;
    let providers: Vec<Address> = (0..pairs.len())
        .map(|i| config.providers.get(i).copied().unwrap_or_else(|| demo_provider(i)))
        .collect();
    for provider in &providers {
        addr.send(AddProvider {
            caller: owner,
            provider: *provider,
        })
        .await??;
    }

    let batch_id = addr.send(OpenBatch { caller: owner }).await??.batch_id;
    for (provider, (tax, resource)) in providers.iter().zip(&pairs) {
        let submitted = addr
            .send(Submit {
                caller: *provider,
                tax: encryptor.encrypt_u64(*tax)?,
                resource: encryptor.encrypt_u64(*resource)?,
            })
            .await??;
        info!(provider = %provider, count = submitted.count, "Submitted");
    }
    addr.send(CloseBatch { caller: owner }).await??;
    let requested = addr
        .send(RequestBatchDecryption { caller: owner })
        .await??;
    info!(request_id = %requested.request_id, "Waiting for the oracle");

    let totals = wait_for_totals(&addr, requested.batch_id)
        .await
        .context("Oracle did not reveal the totals in time")?;
    println!(
        "{}: {} submissions, tax total = {}, resource total = {}",
        batch_id,
        pairs.len(),
        totals.tax,
        totals.resource
    );
    Ok(())
}

async fn wait_for_totals(
    addr: &Addr<ProtocolActor>,
    batch_id: BatchId,
) -> Result<Totals> {
    tokio::time::timeout(REVEAL_TIMEOUT, async {
        loop {
            if let Some(totals) = addr.send(GetRevealedTotals(batch_id)).await? {
                return Ok::<_, anyhow::Error>(totals);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .map_err(|_| anyhow!("timed out after {:?}", REVEAL_TIMEOUT))?
}
