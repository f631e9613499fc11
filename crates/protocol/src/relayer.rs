// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{DecryptionCallback, ProtocolActor};
use actix::prelude::*;
use ctally_events::{Event, EventBus, ProtocolEvent, ProtocolEventData, Subscribe};
use ctally_oracle::LocalOracle;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Plays the oracle side of the round trip inside an actor system.
///
/// Listens for `DecryptionRequested` on the bus, has the [`LocalOracle`] answer it and delivers
/// the signed response to the protocol actor as a [`DecryptionCallback`].
pub struct OracleRelayer {
    oracle: Arc<LocalOracle>,
    protocol: Addr<ProtocolActor>,
}

impl OracleRelayer {
    pub fn attach(
        bus: &Addr<EventBus<ProtocolEvent>>,
        oracle: Arc<LocalOracle>,
        protocol: Addr<ProtocolActor>,
    ) -> Addr<Self> {
        let oracle_address = oracle.address();
        let addr = Self { oracle, protocol }.start();
        bus.do_send(Subscribe::new(
            "DecryptionRequested",
            addr.clone().recipient(),
        ));
        info!(oracle = %oracle_address, "Oracle relayer attached");
        addr
    }
}

impl Actor for OracleRelayer {
    type Context = Context<Self>;
}

impl Handler<ProtocolEvent> for OracleRelayer {
    type Result = ();

    fn handle(&mut self, msg: ProtocolEvent, ctx: &mut Self::Context) -> Self::Result {
        let ProtocolEventData::DecryptionRequested(data) = msg.get_data() else {
            return;
        };

        let response = match self.oracle.fulfil(data.request_id) {
            Ok(response) => response,
            Err(e) => {
                error!(request_id = %data.request_id, "Oracle could not fulfil request: {e}");
                return;
            }
        };

        let request_id = response.request_id;
        let delivery = self
            .protocol
            .send(DecryptionCallback {
                request_id,
                cleartexts: response.cleartexts,
                proof: response.proof,
            })
            .into_actor(self)
            .map(move |res, _, _| match res {
                Ok(Ok(completed)) => {
                    info!(
                        request_id = %request_id,
                        results = %completed.results,
                        "Callback delivered"
                    )
                }
                Ok(Err(e)) => warn!(request_id = %request_id, "Callback rejected: {e}"),
                Err(e) => error!(request_id = %request_id, "Protocol actor unreachable: {e}"),
            });
        ctx.spawn(delivery);
    }
}
