//! Runs the action layer against the in-memory fake chain: the wiring a
//! browser wallet would normally provide, minus the browser.

use alloy_primitives::{
    Address,
    U256,
    utils::parse_ether,
};
use color_eyre::eyre::Result;
use pocketcoin_client::{
    actions::PocketCoin,
    chain::ChainClient,
    dispatch::{
        Action,
        Payload,
    },
    notify::LogNotifier,
    race_info::RaceInfoCache,
    test_helpers::{
        FakeConnection,
        FakeRaceState,
        coin_table,
    },
};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let caller = Address::repeat_byte(0xaa);
    let controller_address = Address::repeat_byte(0x01);
    let race_id = Address::repeat_byte(0x02);

    let connection = FakeConnection::new("ropsten", vec![caller]);
    connection.set_bookie(true);
    connection.add_race(
        race_id,
        FakeRaceState {
            coin_table: coin_table(&[
                (1, 1_000_000_000_000_000_000, 3, 100, 150),
                (2, 500_000_000_000_000_000, 1, 200, 190),
            ]),
            winning_coins: vec![U256::from(1u64)],
            can_claim: true,
            winnings: parse_ether("0.75")?,
            fail: None,
        },
    );

    let client = ChainClient::new(Some(connection.clone()), controller_address);
    let cache = RaceInfoCache::new();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Action>();
    let mut pocketcoin =
        PocketCoin::new(client, cache.clone(), 1, tx, LogNotifier);
    pocketcoin.set_account(caller);

    pocketcoin.detect_network().await;
    pocketcoin.retrieve_account().await;
    pocketcoin.is_bookie().await;
    pocketcoin
        .bet_on(race_id, 1, Some(parse_ether("0.1")?), parse_ether("0.01")?)
        .await;
    // Second fetch is served from the cache without touching the chain.
    pocketcoin.race_complete_info(race_id).await;
    pocketcoin.race_complete_info(race_id).await;
    pocketcoin.claim_reward(race_id).await;
    drop(pocketcoin);

    while let Some(action) = rx.recv().await {
        match &action.payload {
            Payload::RaceInfo(info) => {
                println!("{:?}:", action.kind);
                println!("{}", serde_json::to_string_pretty(info.as_ref())?);
            }
            payload => println!("{:?}: {payload:?}", action.kind),
        }
    }

    let counts = connection.read_counts(&race_id);
    println!(
        "race reads issued: {} (two complete-info requests, one fetch), cached races: {}",
        counts.total(),
        cache.len()
    );
    Ok(())
}
