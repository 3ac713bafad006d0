// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use anyhow::Result;
use crs_client::{FheAdapter, MockFheInstance, SimulatedAdapter};
use crs_orchestrator::{Aggregator, PermissionOrchestrator};
use crs_test_helpers::{create_shared_rng_from_u64, local_backend_metadata, InMemoryAggregator};
use crs_types::{DecryptionRequest, EncryptedInput, EncryptionContext, Error, ScoreWidth};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn test_tracing() -> tracing::subscriber::DefaultGuard {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("info"))
        .with_test_writer()
        .finish();
    tracing::subscriber::set_default(subscriber)
}

struct Harness {
    adapter: Arc<SimulatedAdapter>,
    instance: Arc<MockFheInstance>,
    aggregator: InMemoryAggregator,
    contract: Address,
}

fn setup(seed: u64) -> Harness {
    let rng = create_shared_rng_from_u64(seed);
    let adapter = Arc::new(SimulatedAdapter::from_metadata(
        local_backend_metadata(),
        rng,
    ));
    let instance = adapter.instance().expect("from_metadata is initialized");
    let contract = Address::repeat_byte(0xaa);
    let requester = Address::repeat_byte(0xcc);
    let aggregator = InMemoryAggregator::new(contract, requester, instance.clone());
    Harness {
        adapter,
        instance,
        aggregator,
        contract,
    }
}

/// Encrypt a single score and submit it for a paper.
async fn submit_score(
    harness: &Harness,
    paper_id: u64,
    submitter: Address,
    width: ScoreWidth,
    score: u64,
) -> Result<EncryptedInput> {
    let context = EncryptionContext::new(harness.contract, submitter)?;
    let mut builder = harness.adapter.create_encrypted_input(context)?;
    builder.add_value(width, score)?;
    let input = builder.encrypt().await?;
    harness
        .aggregator
        .submit_review(paper_id, submitter, &input)?;
    Ok(input)
}

#[tokio::test]
async fn round_trip_across_widths() -> Result<()> {
    let _guard = test_tracing();
    let harness = setup(1);

    let cases = [
        (ScoreWidth::U8, 0u64),
        (ScoreWidth::U8, 255),
        (ScoreWidth::U32, 7),
        (ScoreWidth::U32, u32::MAX as u64),
        (ScoreWidth::U64, u64::MAX),
    ];

    for (paper_id, (width, value)) in cases.into_iter().enumerate() {
        let paper_id = paper_id as u64;
        let submitter = Address::repeat_byte(0xbb);
        submit_score(&harness, paper_id, submitter, width, value).await?;

        let orchestrator = PermissionOrchestrator::new(
            harness.adapter.clone(),
            Arc::new(harness.aggregator.connect_as(Address::repeat_byte(0xcc))),
        );
        assert_eq!(orchestrator.decrypt_average(paper_id).await?, value);
    }
    Ok(())
}

#[tokio::test]
async fn range_enforcement_at_the_builder() -> Result<()> {
    let _guard = test_tracing();
    let harness = setup(2);
    let context = EncryptionContext::new(harness.contract, Address::repeat_byte(0xbb))?;
    let mut builder = harness.adapter.create_encrypted_input(context)?;

    assert!(matches!(
        builder.add_value(ScoreWidth::U8, 256),
        Err(Error::ValueOutOfRange { value: 256, .. })
    ));
    builder.add_value(ScoreWidth::U8, 255)?;
    Ok(())
}

#[tokio::test]
async fn proof_binds_contract_and_submitter() -> Result<()> {
    let _guard = test_tracing();
    let harness = setup(3);
    let submitter = Address::repeat_byte(0xbb);
    let context = EncryptionContext::new(harness.contract, submitter)?;

    // wrong submitter
    let mut builder = harness.adapter.create_encrypted_input(context)?;
    builder.add_u8(7)?;
    let input = builder.encrypt().await?;
    assert!(harness
        .aggregator
        .submit_review(1, Address::repeat_byte(0xdd), &input)
        .is_err());

    // wrong contract: an aggregator living at a different address
    let elsewhere = InMemoryAggregator::new(
        Address::repeat_byte(0xee),
        Address::repeat_byte(0xcc),
        harness.instance.clone(),
    );
    assert!(elsewhere.submit_review(1, submitter, &input).is_err());

    // the proof was not consumed by the failed attempts
    harness.aggregator.submit_review(1, submitter, &input)?;
    Ok(())
}

#[tokio::test]
async fn proof_binds_handle_order() -> Result<()> {
    let _guard = test_tracing();
    let harness = setup(4);
    let submitter = Address::repeat_byte(0xbb);
    let context = EncryptionContext::new(harness.contract, submitter)?;

    let mut builder = harness.adapter.create_encrypted_input(context)?;
    builder.add_u8(7)?;
    builder.add_u32(9000)?;
    let mut input = builder.encrypt().await?;

    input.handles.swap(0, 1);
    assert!(harness
        .aggregator
        .submit_review(1, submitter, &input)
        .is_err());

    input.handles.swap(0, 1);
    harness.aggregator.submit_review(1, submitter, &input)?;
    Ok(())
}

#[tokio::test]
async fn handle_fetched_before_authorizing_fails_decryption() -> Result<()> {
    let _guard = test_tracing();
    let harness = setup(5);
    submit_score(&harness, 1, Address::repeat_byte(0xbb), ScoreWidth::U8, 7).await?;

    // Skipping step 1: the re-read yields a handle nobody holds a grant
    // for, and decryption rejects it. Never a silently wrong plaintext.
    let stale = harness.aggregator.fetch_average_handle(1).await?;
    let request = DecryptionRequest::single(stale, harness.contract);
    let result = harness
        .adapter
        .request_decryption(&request, Address::repeat_byte(0xcc))
        .await;
    assert!(matches!(result, Err(Error::UnauthorizedDecryption { .. })));

    // The full protocol afterwards succeeds.
    let orchestrator = PermissionOrchestrator::new(
        harness.adapter.clone(),
        Arc::new(harness.aggregator.connect_as(Address::repeat_byte(0xcc))),
    );
    assert_eq!(orchestrator.decrypt_average(1).await?, 7);
    Ok(())
}

#[tokio::test]
async fn authorizing_an_empty_aggregate_fails() -> Result<()> {
    let _guard = test_tracing();
    let harness = setup(6);
    let orchestrator = PermissionOrchestrator::new(
        harness.adapter.clone(),
        Arc::new(harness.aggregator.connect_as(Address::repeat_byte(0xcc))),
    );
    assert!(matches!(
        orchestrator.decrypt_average(99).await,
        Err(Error::AuthorizationFailed(_))
    ));
    Ok(())
}

#[tokio::test]
async fn re_decryption_of_authorized_handle_is_idempotent() -> Result<()> {
    let _guard = test_tracing();
    let harness = setup(7);
    submit_score(&harness, 1, Address::repeat_byte(0xbb), ScoreWidth::U8, 5).await?;

    let requester = Address::repeat_byte(0xcc);
    let aggregator = harness.aggregator.connect_as(requester);
    aggregator.authorize_average(1).await?;
    let handle = aggregator.fetch_average_handle(1).await?;

    let request = DecryptionRequest::single(handle, harness.contract);
    let first = harness.adapter.request_decryption(&request, requester).await?;
    let second = harness.adapter.request_decryption(&request, requester).await?;
    assert_eq!(first[&handle], 5);
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn aggregate_recomputation_rotates_the_handle() -> Result<()> {
    let _guard = test_tracing();
    let harness = setup(8);
    let requester = Address::repeat_byte(0xcc);
    let aggregator = Arc::new(harness.aggregator.connect_as(requester));
    let orchestrator = PermissionOrchestrator::new(harness.adapter.clone(), aggregator.clone());

    submit_score(&harness, 1, Address::repeat_byte(0xbb), ScoreWidth::U8, 7).await?;
    assert_eq!(orchestrator.decrypt_average(1).await?, 7);
    let first_handle = aggregator.fetch_average_handle(1).await?;

    // a new accepted score shifts the average and mints a fresh handle
    submit_score(&harness, 1, Address::repeat_byte(0xdd), ScoreWidth::U8, 9).await?;
    assert_eq!(orchestrator.decrypt_average(1).await?, 8);
    let second_handle = aggregator.fetch_average_handle(1).await?;

    assert_ne!(first_handle, second_handle);
    Ok(())
}

#[tokio::test]
async fn end_to_end_two_reviewers_one_requester() -> Result<()> {
    let _guard = test_tracing();
    let harness = setup(9);
    let paper_id = 42;

    // reviewer one scores 7, reviewer two scores 9
    submit_score(&harness, paper_id, Address::repeat_byte(0xbb), ScoreWidth::U8, 7).await?;
    submit_score(&harness, paper_id, Address::repeat_byte(0xb2), ScoreWidth::U8, 9).await?;
    assert_eq!(harness.aggregator.review_count(paper_id), 2);

    // the requester authorizes, re-reads the fresh handle and decrypts.
    // The in-memory aggregator pins floor division, so avg(7, 9) = 8.
    let requester = Address::repeat_byte(0xcc);
    let orchestrator = PermissionOrchestrator::new(
        harness.adapter.clone(),
        Arc::new(harness.aggregator.connect_as(requester)),
    );
    assert_eq!(orchestrator.decrypt_average(paper_id).await?, 8);
    Ok(())
}

#[tokio::test]
async fn concurrent_intents_do_not_interfere() -> Result<()> {
    let _guard = test_tracing();
    let harness = setup(10);
    submit_score(&harness, 1, Address::repeat_byte(0xbb), ScoreWidth::U8, 4).await?;
    submit_score(&harness, 2, Address::repeat_byte(0xbb), ScoreWidth::U8, 6).await?;

    let make = |caller: Address| {
        PermissionOrchestrator::new(
            harness.adapter.clone(),
            Arc::new(harness.aggregator.connect_as(caller)),
        )
    };
    let a = make(Address::repeat_byte(0xc1));
    let b = make(Address::repeat_byte(0xc2));

    let (ra, rb) = tokio::join!(a.decrypt_average(1), b.decrypt_average(2));
    assert_eq!(ra?, 4);
    assert_eq!(rb?, 6);
    Ok(())
}
