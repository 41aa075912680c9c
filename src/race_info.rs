//! Read-side aggregation of a race's "complete info" view.
//!
//! On a cache miss the aggregator runs four sequential reads against the
//! Race contract (coin inspection, winning coins, claim status, personal
//! winnings), folds the raw chain integers into a display-ready record and
//! stores it in the injected cache. A populated entry lives for the rest of
//! the process; a failed fetch caches nothing and the next request starts
//! from scratch.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
    },
};

use alloy_primitives::{
    U256,
    utils::format_ether,
};
use serde::Serialize;
use tracing::debug;

use crate::{
    Error,
    Result,
    chain::{
        CallContext,
        ChainClient,
        CoinTable,
        Connection,
        RaceContract,
        RaceId,
    },
};

/// One coin's standing within a race. All amounts are display-ready decimal
/// strings; prices are normalized by the precision divisor and rendered to
/// 5 fractional digits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinInfo {
    pub coin_id: u64,
    pub total: String,
    pub num_of_bets: u64,
    pub start_price: String,
    pub end_price: String,
    pub change: String,
}

/// The cached, display-ready record for one race. Immutable once built; a
/// refetch produces a new record that replaces the cache entry wholesale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceInfo {
    pub id: RaceId,
    /// Sorted descending by `change` at construction time.
    pub coins: Vec<CoinInfo>,
    pub winning_coins: Vec<u64>,
    /// The caller's reward in ether.
    pub my_winnings: String,
    pub can_claim: bool,
    /// Always true once constructed; distinguishes a populated store entry
    /// from absence on the consuming side.
    pub loaded: bool,
}

/// Process-wide race info cache, one entry per race id, injected into the
/// aggregator at construction. Entries never expire.
#[derive(Clone, Default)]
pub struct RaceInfoCache {
    entries: Arc<Mutex<HashMap<RaceId, Arc<RaceInfo>>>>,
}

impl RaceInfoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &RaceId) -> Option<Arc<RaceInfo>> {
        self.entries.lock().unwrap().get(id).cloned()
    }

    pub fn insert(&self, id: RaceId, info: Arc<RaceInfo>) {
        self.entries.lock().unwrap().insert(id, info);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

pub struct RaceInfoAggregator<C> {
    client: ChainClient<C>,
    cache: RaceInfoCache,
    in_flight: tokio::sync::Mutex<HashMap<RaceId, Arc<tokio::sync::Mutex<()>>>>,
    precision: u64,
}

impl<C: Connection> RaceInfoAggregator<C> {
    /// `precision` is the fixed divisor applied to raw chain prices before
    /// display. Zero is treated as 1.
    pub fn new(client: ChainClient<C>, cache: RaceInfoCache, precision: u64) -> Self {
        Self {
            client,
            cache,
            in_flight: tokio::sync::Mutex::new(HashMap::new()),
            precision: precision.max(1),
        }
    }

    /// Returns the cached record for `id`, fetching it from the chain on a
    /// miss. Concurrent requests for the same uncached id coalesce on a
    /// per-id gate: one fetch sequence runs, followers observe the cached
    /// result. A failed fetch caches nothing; the follower (or the next
    /// request) fetches from scratch.
    pub async fn complete_info(
        &self,
        id: RaceId,
        ctx: &CallContext,
    ) -> Result<Arc<RaceInfo>> {
        if let Some(hit) = self.cache.get(&id) {
            debug!(race = %id, "serving race info from cache");
            return Ok(hit);
        }

        let gate = {
            let mut in_flight = self.in_flight.lock().await;
            Arc::clone(in_flight.entry(id).or_default())
        };
        let leader = gate.lock().await;

        // A leader may have populated the cache while we waited on the gate.
        if let Some(hit) = self.cache.get(&id) {
            return Ok(hit);
        }

        let fetched = self.fetch(id, ctx).await;
        let outcome = match fetched {
            Ok(info) => {
                let info = Arc::new(info);
                self.cache.insert(id, Arc::clone(&info));
                Ok(info)
            }
            Err(err) => Err(err),
        };
        drop(leader);
        self.in_flight.lock().await.remove(&id);
        outcome
    }

    async fn fetch(&self, id: RaceId, ctx: &CallContext) -> Result<RaceInfo> {
        debug!(race = %id, "fetching race info from chain");
        let race = self.client.race(id)?;

        let table = race.inspect_coins().await?;
        let coins = coin_infos(&table, self.precision)?;

        let winning_coins = race
            .winning_coins()
            .await?
            .into_iter()
            .map(|raw| narrow_u64("winning coin id", raw))
            .collect::<Result<Vec<_>>>()?;

        let can_claim = race.has_claimable_reward(ctx).await?;
        let winnings = race.my_winnings(ctx).await?;

        Ok(RaceInfo {
            id,
            coins,
            winning_coins,
            my_winnings: wei_to_ether(winnings),
            can_claim,
            loaded: true,
        })
    }
}

/// Folds the raw coin table into display rows, sorted descending by the
/// numeric change. The comparison happens on the number, not the rendered
/// string.
pub fn coin_infos(table: &CoinTable, precision: u64) -> Result<Vec<CoinInfo>> {
    let rows = table.len();
    let ragged = table.totals.len() != rows
        || table.bet_counts.len() != rows
        || table.start_prices.len() != rows
        || table.end_prices.len() != rows;
    if ragged {
        return Err(Error::contract_call(
            "inspect_coins",
            "mismatched coin table columns",
        ));
    }

    let divisor = precision.max(1) as f64;
    let mut ranked = Vec::with_capacity(rows);
    for i in 0..rows {
        let start = narrow_u64("start price", table.start_prices[i])? as f64;
        let end = narrow_u64("end price", table.end_prices[i])? as f64;
        // A race with no start price has no meaningful change; rank it flat
        // instead of dividing by zero.
        let change = if start == 0.0 {
            0.0
        } else {
            ((end - start) / start) * 100.0
        };
        ranked.push((
            change,
            CoinInfo {
                coin_id: narrow_u64("coin id", table.ids[i])?,
                total: wei_to_ether(table.totals[i]),
                num_of_bets: narrow_u64("bet count", table.bet_counts[i])?,
                start_price: format!("{:.5}", start / divisor),
                end_price: format!("{:.5}", end / divisor),
                change: format!("{change:.5}"),
            },
        ));
    }
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
    Ok(ranked.into_iter().map(|(_, coin)| coin).collect())
}

/// Converts a wei amount to an ether decimal string, trailing zeros trimmed
/// the way web3's `fromWei` renders it.
pub fn wei_to_ether(wei: U256) -> String {
    format_ether(wei)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn narrow_u64(what: &'static str, value: U256) -> Result<u64> {
    u64::try_from(value).map_err(|_| Error::Decode {
        what,
        value: value.to_string(),
    })
}
