// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::prelude::*;
use anyhow::Result;
use ctally_aggregator::ProtocolError;
use ctally_events::{
    BatchId, Event, ProtocolEvent, ProtocolEventData, RequestId, TakeEvents, Totals,
};
use ctally_protocol::{
    AddProvider, CloseBatch, DecryptionCallback, GetBatch, GetDecryptionContext,
    GetRevealedTotals, OpenBatch, Pause, RequestBatchDecryption, Submit, Unpause,
};
use ctally_test_helpers::{ActorSetup, TestFixture};
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

async fn register_providers(fx: &TestFixture, sys: &ActorSetup) -> Result<()> {
    for provider in &fx.providers {
        sys.protocol
            .send(AddProvider {
                caller: fx.owner,
                provider: *provider,
            })
            .await??;
    }
    Ok(())
}

async fn submit(
    fx: &TestFixture,
    sys: &ActorSetup,
    index: usize,
    totals: Totals,
) -> Result<u64> {
    let (tax, resource) = fx.encrypt(totals)?;
    let submitted = sys
        .protocol
        .send(Submit {
            caller: fx.provider(index),
            tax,
            resource,
        })
        .await??;
    Ok(submitted.count)
}

/// Two providers, one batch, the oracle answering through the bus.
#[actix::test]
#[serial_test::serial]
async fn test_batch_round_trip() -> Result<()> {
    let subscriber = fmt()
        .with_env_filter(EnvFilter::new("info"))
        .with_test_writer()
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let fx = TestFixture::new(1, 2);
    let sys = fx.actor_system()?;
    register_providers(&fx, &sys).await?;

    let opened = sys.protocol.send(OpenBatch { caller: fx.owner }).await??;
    assert_eq!(opened.batch_id, BatchId::new(1));
    assert_eq!(submit(&fx, &sys, 0, Totals::new(5, 2)).await?, 1);
    assert_eq!(submit(&fx, &sys, 1, Totals::new(3, 1)).await?, 2);
    sys.protocol.send(CloseBatch { caller: fx.owner }).await??;
    let requested = sys
        .protocol
        .send(RequestBatchDecryption { caller: fx.owner })
        .await??;

    let events = sys
        .history
        .send(TakeEvents::<ProtocolEvent>::new(8))
        .await?;
    let types: Vec<String> = events.iter().map(|e| e.event_type()).collect();
    assert_eq!(
        types,
        vec![
            "ProviderAdded",
            "ProviderAdded",
            "BatchOpened",
            "DataSubmitted",
            "DataSubmitted",
            "BatchClosed",
            "DecryptionRequested",
            "DecryptionCompleted",
        ]
    );
    let seqs: Vec<u64> = events.iter().map(ProtocolEvent::seq).collect();
    assert_eq!(seqs, (0..8).collect::<Vec<u64>>());

    let Some(ProtocolEventData::DecryptionCompleted(completed)) =
        events.last().map(|e| e.get_data().clone())
    else {
        panic!("DecryptionCompleted expected last");
    };
    assert_eq!(completed.request_id, requested.request_id);
    assert_eq!(completed.batch_id, BatchId::new(1));
    assert_eq!(completed.results, Totals::new(8, 3));

    let context = sys
        .protocol
        .send(GetDecryptionContext(requested.request_id))
        .await?
        .expect("context stored");
    assert!(context.processed);
    assert_eq!(
        sys.protocol.send(GetRevealedTotals(BatchId::new(1))).await?,
        Some(Totals::new(8, 3))
    );

    // a late duplicate delivery is refused before the proof is even looked at
    let replay = sys
        .protocol
        .send(DecryptionCallback {
            request_id: requested.request_id,
            cleartexts: vec![],
            proof: vec![],
        })
        .await?;
    assert_eq!(
        replay.unwrap_err(),
        ProtocolError::ReplayDetected(requested.request_id)
    );
    Ok(())
}

#[actix::test]
async fn test_pause_and_resume_submission() -> Result<()> {
    let fx = TestFixture::new(2, 1);
    let sys = fx.actor_system()?;
    register_providers(&fx, &sys).await?;
    sys.protocol.send(OpenBatch { caller: fx.owner }).await??;
    sys.protocol.send(Pause { caller: fx.owner }).await??;

    let (tax, resource) = fx.encrypt(Totals::new(4, 4))?;
    let msg = Submit {
        caller: fx.provider(0),
        tax,
        resource,
    };
    assert_eq!(
        sys.protocol.send(msg.clone()).await?.unwrap_err(),
        ProtocolError::Paused
    );
    assert_eq!(
        sys.protocol
            .send(Pause { caller: fx.owner })
            .await?
            .unwrap_err(),
        ProtocolError::AlreadyPaused
    );

    sys.protocol.send(Unpause { caller: fx.owner }).await??;
    assert_eq!(sys.protocol.send(msg).await??.count, 1);
    Ok(())
}

#[actix::test]
async fn test_concurrent_submissions_are_serialized() -> Result<()> {
    let fx = TestFixture::new(3, 6);
    let sys = fx.actor_system()?;
    register_providers(&fx, &sys).await?;
    sys.protocol.send(OpenBatch { caller: fx.owner }).await??;

    let mut pending = Vec::new();
    for index in 0..fx.providers.len() {
        let (tax, resource) = fx.encrypt(Totals::new(index as u64, 1))?;
        pending.push(sys.protocol.send(Submit {
            caller: fx.provider(index),
            tax,
            resource,
        }));
    }

    let mut counts = Vec::new();
    for request in pending {
        counts.push(request.await??.count);
    }
    counts.sort_unstable();
    assert_eq!(counts, (1..=6).collect::<Vec<u64>>());

    sys.protocol.send(CloseBatch { caller: fx.owner }).await??;
    sys.protocol
        .send(RequestBatchDecryption { caller: fx.owner })
        .await??;

    let totals = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let revealed = sys.protocol.send(GetRevealedTotals(BatchId::new(1))).await;
            if let Ok(Some(totals)) = revealed {
                return totals;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await?;
    assert_eq!(totals, Totals::new(15, 6));

    let batch = sys
        .protocol
        .send(GetBatch(BatchId::new(1)))
        .await?
        .expect("batch exists");
    assert_eq!(batch.count(), 6);
    assert!(batch.is_closed());
    Ok(())
}

#[actix::test]
async fn test_unknown_callback_is_rejected() -> Result<()> {
    let fx = TestFixture::new(4, 0);
    let sys = fx.actor_system()?;
    let result = sys
        .protocol
        .send(DecryptionCallback {
            request_id: RequestId::new(99),
            cleartexts: vec![0; 64],
            proof: vec![0; 65],
        })
        .await?;
    assert_eq!(
        result.unwrap_err(),
        ProtocolError::UnknownRequest(RequestId::new(99))
    );
    Ok(())
}
