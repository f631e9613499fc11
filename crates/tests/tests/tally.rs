// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::B256;
use anyhow::Result;
use ctally_aggregator::ProtocolError;
use ctally_events::{BatchId, DecryptionCompleted, Event, ProtocolEventData, Totals};
use ctally_test_helpers::{init_test_tracing, TestFixture, TEST_COOLDOWN};
use proptest::prelude::*;

/// Open, submit every pair in the given order, close, request and deliver the oracle's answer.
fn tally(fx: &TestFixture, submissions: &[(usize, Totals)]) -> Result<DecryptionCompleted> {
    let (mut protocol, _) = fx.protocol()?;
    protocol.open_batch(fx.owner)?;
    for (index, totals) in submissions {
        let (tax, resource) = fx.encrypt(*totals)?;
        protocol.submit(fx.provider(*index), tax, resource)?;
    }
    protocol.close_batch(fx.owner)?;
    let request_id = protocol.request_batch_decryption(fx.owner)?.request_id;
    let response = fx.oracle.fulfil(request_id)?;
    Ok(protocol.on_decryption_callback(request_id, &response.cleartexts, &response.proof)?)
}

#[test]
fn reference_scenario() -> Result<()> {
    init_test_tracing();
    let fx = TestFixture::new(10, 2);
    let completed = tally(&fx, &[(0, Totals::new(5, 2)), (1, Totals::new(3, 1))])?;
    assert_eq!(completed.batch_id, BatchId::new(1));
    assert_eq!(completed.results, Totals::new(8, 3));
    Ok(())
}

#[test]
fn empty_batch_reveals_zero() -> Result<()> {
    let fx = TestFixture::new(11, 0);
    let completed = tally(&fx, &[])?;
    assert_eq!(completed.results, Totals::new(0, 0));
    Ok(())
}

#[test]
fn replayed_callback_is_refused() -> Result<()> {
    let fx = TestFixture::new(12, 1);
    let (mut protocol, events) = fx.protocol()?;
    protocol.open_batch(fx.owner)?;
    let (tax, resource) = fx.encrypt(Totals::new(9, 9))?;
    protocol.submit(fx.provider(0), tax, resource)?;
    protocol.close_batch(fx.owner)?;
    let request_id = protocol.request_batch_decryption(fx.owner)?.request_id;
    let response = fx.oracle.fulfil(request_id)?;

    protocol.on_decryption_callback(request_id, &response.cleartexts, &response.proof)?;
    let err = protocol
        .on_decryption_callback(request_id, &response.cleartexts, &response.proof)
        .unwrap_err();
    assert_eq!(err, ProtocolError::ReplayDetected(request_id));

    let completions = events
        .events()
        .iter()
        .filter(|e| matches!(e.get_data(), ProtocolEventData::DecryptionCompleted(_)))
        .count();
    assert_eq!(completions, 1);
    Ok(())
}

#[test]
fn changed_aggregate_is_a_state_mismatch() -> Result<()> {
    let fx = TestFixture::new(13, 1);
    let (mut protocol, _) = fx.protocol()?;
    protocol.open_batch(fx.owner)?;
    protocol.close_batch(fx.owner)?;
    let request_id = protocol.request_batch_decryption(fx.owner)?.request_id;
    let response = fx.oracle.fulfil(request_id)?;

    assert!(protocol.tamper_state_hash(request_id, B256::repeat_byte(1)));
    assert_eq!(
        protocol
            .on_decryption_callback(request_id, &response.cleartexts, &response.proof)
            .unwrap_err(),
        ProtocolError::StateMismatch(request_id)
    );
    assert_eq!(protocol.revealed_totals(BatchId::new(1)), None);
    Ok(())
}

#[test]
fn request_is_refused_while_batch_open() -> Result<()> {
    let fx = TestFixture::new(14, 1);
    let (mut protocol, _) = fx.protocol()?;
    protocol.open_batch(fx.owner)?;
    assert_eq!(
        protocol.request_batch_decryption(fx.owner).unwrap_err(),
        ProtocolError::InvalidBatch(BatchId::new(1))
    );
    assert!(fx.oracle.pending().is_empty());
    assert_eq!(protocol.last_request(&fx.owner), None);
    Ok(())
}

#[test]
fn request_cooldown_is_independent_of_submissions() -> Result<()> {
    let fx = TestFixture::new(15, 0);
    let (mut protocol, _) = fx.protocol()?;
    protocol.open_batch(fx.owner)?;
    let (tax, resource) = fx.encrypt(Totals::new(1, 1))?;
    protocol.submit(fx.owner, tax, resource)?;
    protocol.close_batch(fx.owner)?;

    // the owner just submitted, but requesting is a separate limit
    protocol.request_batch_decryption(fx.owner)?;
    assert!(matches!(
        protocol.request_batch_decryption(fx.owner),
        Err(ProtocolError::CooldownActive { .. })
    ));
    fx.clock.advance(TEST_COOLDOWN);
    protocol.request_batch_decryption(fx.owner)?;
    assert_eq!(fx.oracle.pending().len(), 2);
    Ok(())
}

fn submissions_and_order() -> impl Strategy<Value = (Vec<Totals>, Vec<usize>)> {
    prop::collection::vec((0u64..1000, 0u64..1000), 1..5).prop_flat_map(|values| {
        let totals: Vec<Totals> = values
            .into_iter()
            .map(|(tax, resource)| Totals::new(tax, resource))
            .collect();
        let order: Vec<usize> = (0..totals.len()).collect();
        (Just(totals), Just(order).prop_shuffle())
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn any_order_reveals_the_sum((values, order) in submissions_and_order()) {
        let fx = TestFixture::new(values.len() as u64, values.len());
        let submissions: Vec<(usize, Totals)> =
            order.iter().map(|&index| (index, values[index])).collect();

        let completed = tally(&fx, &submissions).unwrap();
        let expected = Totals::new(
            values.iter().map(|t| t.tax).sum(),
            values.iter().map(|t| t.resource).sum(),
        );
        prop_assert_eq!(completed.results, expected);
    }
}
