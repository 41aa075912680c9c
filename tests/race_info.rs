#![allow(non_snake_case)]

use alloy_primitives::{
    Address,
    U256,
    utils::parse_ether,
};
use pocketcoin_client::{
    Error,
    chain::{
        CallContext,
        ChainClient,
    },
    race_info::{
        RaceInfoAggregator,
        RaceInfoCache,
    },
    test_helpers::{
        FailPoint,
        FakeConnection,
        FakeRaceState,
        coin_table,
    },
};
use std::sync::Arc;

const CONTROLLER: Address = Address::repeat_byte(0x01);
const RACE: Address = Address::repeat_byte(0x02);
const CALLER: Address = Address::repeat_byte(0xaa);

fn seeded_race() -> FakeRaceState {
    FakeRaceState {
        coin_table: coin_table(&[
            (1, 1_000_000_000_000_000_000, 3, 100, 150),
            (2, 500_000_000_000_000_000, 1, 200, 190),
        ]),
        winning_coins: vec![U256::from(1u64)],
        can_claim: true,
        winnings: parse_ether("0.75").unwrap(),
        fail: None,
    }
}

fn aggregator(
    connection: &FakeConnection,
) -> (RaceInfoAggregator<FakeConnection>, RaceInfoCache) {
    let cache = RaceInfoCache::new();
    let client = ChainClient::new(Some(connection.clone()), CONTROLLER);
    (
        RaceInfoAggregator::new(client, cache.clone(), 1),
        cache,
    )
}

#[tokio::test]
async fn complete_info__cache_miss__assembles_the_record_from_four_reads() {
    // given
    let connection = FakeConnection::default();
    connection.add_race(RACE, seeded_race());
    let (races, _cache) = aggregator(&connection);

    // when
    let info = races
        .complete_info(RACE, &CallContext::new(CALLER))
        .await
        .unwrap();

    // then
    assert_eq!(info.id, RACE);
    assert_eq!(info.coins.len(), 2);
    assert_eq!(info.coins[0].coin_id, 1);
    assert_eq!(info.coins[0].change, "50.00000");
    assert_eq!(info.coins[1].coin_id, 2);
    assert_eq!(info.coins[1].change, "-5.00000");
    assert_eq!(info.winning_coins, vec![1]);
    assert_eq!(info.my_winnings, "0.75");
    assert!(info.can_claim);
    assert!(info.loaded);

    let counts = connection.read_counts(&RACE);
    assert_eq!(counts.inspect_coins, 1);
    assert_eq!(counts.winning_coins, 1);
    assert_eq!(counts.claim_status, 1);
    assert_eq!(counts.winnings, 1);
}

#[tokio::test]
async fn complete_info__second_fetch__serves_the_identical_record_without_new_reads() {
    // given a populated cache entry
    let connection = FakeConnection::default();
    connection.add_race(RACE, seeded_race());
    let (races, cache) = aggregator(&connection);
    let ctx = CallContext::new(CALLER);
    let first = races.complete_info(RACE, &ctx).await.unwrap();

    // when
    let second = races.complete_info(RACE, &ctx).await.unwrap();

    // then: same record, no further chain traffic
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(connection.read_counts(&RACE).total(), 4);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn complete_info__mid_chain_failure__aborts_and_caches_nothing() {
    // given the claim-status read rejects
    let connection = FakeConnection::default();
    let mut state = seeded_race();
    state.fail = Some(FailPoint::ClaimStatus);
    connection.add_race(RACE, state);
    let (races, cache) = aggregator(&connection);

    // when
    let err = races
        .complete_info(RACE, &CallContext::new(CALLER))
        .await
        .unwrap_err();

    // then: the raw error surfaces, later reads never ran, nothing cached
    assert!(matches!(err, Error::ContractCall { .. }));
    let counts = connection.read_counts(&RACE);
    assert_eq!(counts.claim_status, 1);
    assert_eq!(counts.winnings, 0);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn complete_info__failed_then_retried__fetches_from_scratch() {
    // given a first request that failed
    let connection = FakeConnection::default();
    let mut broken = seeded_race();
    broken.fail = Some(FailPoint::WinningCoins);
    connection.add_race(RACE, broken);
    let (races, cache) = aggregator(&connection);
    let ctx = CallContext::new(CALLER);
    races.complete_info(RACE, &ctx).await.unwrap_err();

    // when the chain recovers and the caller re-requests
    connection.add_race(RACE, seeded_race());
    let info = races.complete_info(RACE, &ctx).await.unwrap();

    // then the full read sequence ran again
    assert!(info.loaded);
    assert_eq!(connection.read_counts(&RACE).inspect_coins, 2);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn complete_info__concurrent_requests_for_one_id__coalesce_to_one_fetch() {
    // given
    let connection = FakeConnection::default();
    connection.add_race(RACE, seeded_race());
    let (races, _cache) = aggregator(&connection);
    let ctx = CallContext::new(CALLER);

    // when both requests race on an empty cache
    let (a, b) = tokio::join!(
        races.complete_info(RACE, &ctx),
        races.complete_info(RACE, &ctx),
    );

    // then one read sequence served both
    assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
    assert_eq!(connection.read_counts(&RACE).total(), 4);
}

#[tokio::test]
async fn complete_info__no_provider__fails_without_touching_the_cache() {
    let cache = RaceInfoCache::new();
    let client: ChainClient<FakeConnection> = ChainClient::new(None, CONTROLLER);
    let races = RaceInfoAggregator::new(client, cache.clone(), 1);

    let err = races
        .complete_info(RACE, &CallContext::new(CALLER))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NoProvider));
    assert!(cache.is_empty());
}

#[tokio::test]
async fn complete_info__distinct_ids__cache_one_entry_each() {
    let other_race = Address::repeat_byte(0x03);
    let connection = FakeConnection::default();
    connection.add_race(RACE, seeded_race());
    connection.add_race(other_race, seeded_race());
    let (races, cache) = aggregator(&connection);
    let ctx = CallContext::new(CALLER);

    let first = races.complete_info(RACE, &ctx).await.unwrap();
    let second = races.complete_info(other_race, &ctx).await.unwrap();

    assert_eq!(first.id, RACE);
    assert_eq!(second.id, other_race);
    assert_eq!(cache.len(), 2);
}
