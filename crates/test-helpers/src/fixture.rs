// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::create_random_eth_addrs;
use actix::prelude::*;
use alloy_primitives::Address;
use anyhow::Result;
use ctally_aggregator::ManualClock;
use ctally_events::{
    EventBus, EventPublisher, EventRecorder, HistoryCollector, ProtocolEvent, Totals,
};
use ctally_fhe::{
    create_shared_rng_from_u64, BfvParamSet, CiphertextHandle, Encryptor, Fhe, FheKeys,
};
use ctally_logger::SimpleLogger;
use ctally_oracle::LocalOracle;
use ctally_protocol::{OracleRelayer, Protocol, ProtocolActor, ProtocolParams};
use std::sync::Arc;

pub const TEST_COOLDOWN: u64 = 60;
pub const TEST_START_TIME: u64 = 1_700_000_000;

/// Everything a protocol instance needs, with deterministic keys and addresses.
pub struct TestFixture {
    pub owner: Address,
    pub instance: Address,
    pub providers: Vec<Address>,
    pub fhe: Arc<Fhe>,
    pub encryptor: Encryptor,
    pub oracle: Arc<LocalOracle>,
    pub clock: ManualClock,
}

/// A protocol instance running inside an actor system.
pub struct ActorSetup {
    pub bus: Addr<EventBus<ProtocolEvent>>,
    pub history: Addr<HistoryCollector<ProtocolEvent>>,
    pub protocol: Addr<ProtocolActor>,
}

impl TestFixture {
    pub fn new(seed: u64, provider_count: usize) -> Self {
        let rng = create_shared_rng_from_u64(seed);
        let params = BfvParamSet::default().build_arc();
        let keys = FheKeys::generate(params.clone(), &rng);
        let encryptor = keys.encryptor(rng.clone());
        let mut addrs = create_random_eth_addrs(&rng, provider_count + 2);
        let instance = addrs.remove(1);
        let owner = addrs.remove(0);

        Self {
            owner,
            instance,
            providers: addrs,
            fhe: Arc::new(Fhe::new(params)),
            encryptor,
            oracle: Arc::new(LocalOracle::random(keys)),
            clock: ManualClock::new(TEST_START_TIME),
        }
    }

    pub fn provider(&self, index: usize) -> Address {
        self.providers[index]
    }

    pub fn encrypt(&self, totals: Totals) -> Result<(CiphertextHandle, CiphertextHandle)> {
        Ok((
            self.encryptor.encrypt_u64(totals.tax)?,
            self.encryptor.encrypt_u64(totals.resource)?,
        ))
    }

    fn params(&self, publisher: Arc<dyn EventPublisher>) -> ProtocolParams {
        ProtocolParams {
            owner: self.owner,
            instance: self.instance,
            cooldown: TEST_COOLDOWN,
            cipher: self.fhe.clone(),
            oracle: self.oracle.clone(),
            clock: Arc::new(self.clock.clone()),
            publisher,
        }
    }

    /// Synchronous instance with every fixture provider registered. The recorder starts empty.
    pub fn protocol(&self) -> Result<(Protocol, EventRecorder)> {
        let events = EventRecorder::new();
        let mut protocol = Protocol::new(self.params(Arc::new(events.clone())))?;
        for provider in &self.providers {
            protocol.add_provider(self.owner, *provider)?;
        }
        events.clear();
        Ok((protocol, events))
    }

    /// Actor instance wired to a bus with a history collector, a logger and an oracle relayer.
    /// Providers are not registered.
    pub fn actor_system(&self) -> Result<ActorSetup> {
        let bus = EventBus::<ProtocolEvent>::new().start();
        let history = EventBus::history(&bus);
        SimpleLogger::attach("test", bus.clone());

        let protocol = ProtocolActor::attach(Protocol::new(self.params(Arc::new(bus.clone())))?);
        OracleRelayer::attach(&bus, self.oracle.clone(), protocol.clone());

        Ok(ActorSetup {
            bus,
            history,
            protocol,
        })
    }
}
