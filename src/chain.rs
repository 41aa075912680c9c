//! Trait seams over the wallet-provided blockchain connection.
//!
//! The contracts themselves are an external service; this module only fixes
//! the shape of the calls the action layer issues against them. Concrete
//! connections (a wallet provider in the app, fakes in tests) implement
//! [`Connection`] and hand out address-bound contract handles.

use alloy_primitives::{
    Address,
    B256,
    U256,
};
use serde::Serialize;

use crate::{
    Error,
    Result,
};

/// A race identifier is the address of its deployed Race contract.
pub type RaceId = Address;

/// Per-call configuration, built fresh for every operation. Carries the
/// caller identity plus the optional attached value and gas limit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallContext {
    pub from: Option<Address>,
    pub value: Option<U256>,
    pub gas: Option<u64>,
}

impl CallContext {
    pub fn new(from: Address) -> Self {
        Self {
            from: Some(from),
            value: None,
            gas: None,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }
}

/// Receipt of a submitted state-changing transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TxReceipt {
    pub tx_hash: B256,
}

/// A bookmaker's registered channel within the Controller contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChannelInfo {
    pub name: String,
    pub description: String,
}

/// Arguments for race creation, amounts in wei.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RaceParams {
    pub name: String,
    pub coins: Vec<u64>,
    pub min_bet: U256,
    pub betting_start: u64,
    pub race_start: u64,
    pub duration: u64,
    pub exclusive: bool,
}

/// Raw coin inspection data as the Race contract returns it: parallel
/// per-coin columns, one row per coin, every cell a chain integer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoinTable {
    pub ids: Vec<U256>,
    pub totals: Vec<U256>,
    pub bet_counts: Vec<U256>,
    pub start_prices: Vec<U256>,
    pub end_prices: Vec<U256>,
}

impl CoinTable {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

pub trait ControllerContract {
    async fn estimate_create_channel_gas(
        &self,
        name: &str,
        description: &str,
        ctx: &CallContext,
    ) -> Result<u64>;

    async fn create_channel(
        &self,
        name: &str,
        description: &str,
        ctx: &CallContext,
    ) -> Result<TxReceipt>;

    async fn estimate_create_race_gas(
        &self,
        params: &RaceParams,
        ctx: &CallContext,
    ) -> Result<u64>;

    async fn create_race(
        &self,
        params: &RaceParams,
        ctx: &CallContext,
    ) -> Result<TxReceipt>;

    /// The caller's channel, resolved through the implicit caller identity.
    async fn my_channel(&self, ctx: &CallContext) -> Result<ChannelInfo>;

    /// Whether the caller is authorized to create races.
    async fn is_bookie(&self, ctx: &CallContext) -> Result<bool>;
}

pub trait RaceContract {
    /// Parallel per-coin arrays: ids, totals, bet counts, start/end prices.
    async fn inspect_coins(&self) -> Result<CoinTable>;

    /// Identifiers of the coins that won the race.
    async fn winning_coins(&self) -> Result<Vec<U256>>;

    /// Whether the caller has an unclaimed reward.
    async fn has_claimable_reward(&self, ctx: &CallContext) -> Result<bool>;

    /// The caller's reward amount in wei.
    async fn my_winnings(&self, ctx: &CallContext) -> Result<U256>;

    async fn estimate_bet_gas(&self, coin: u64, ctx: &CallContext) -> Result<u64>;

    async fn bet_on(&self, coin: u64, ctx: &CallContext) -> Result<TxReceipt>;

    async fn estimate_claim_gas(&self, ctx: &CallContext) -> Result<u64>;

    async fn claim_reward(&self, ctx: &CallContext) -> Result<TxReceipt>;
}

/// An externally supplied blockchain connection.
pub trait Connection {
    type Controller: ControllerContract;
    type Race: RaceContract;

    async fn network_type(&self) -> Result<String>;

    async fn accounts(&self) -> Result<Vec<Address>>;

    fn controller(&self, address: Address) -> Self::Controller;

    fn race(&self, address: Address) -> Self::Race;
}

/// Stateless factory over an optional live connection. Performs no caching
/// and no retries; handle resolution fails with [`Error::NoProvider`] when
/// the wallet never supplied a connection.
#[derive(Clone)]
pub struct ChainClient<C> {
    connection: Option<C>,
    controller_address: Address,
}

impl<C: Connection> ChainClient<C> {
    pub fn new(connection: Option<C>, controller_address: Address) -> Self {
        Self {
            connection,
            controller_address,
        }
    }

    pub fn connection(&self) -> Result<&C> {
        self.connection.as_ref().ok_or(Error::NoProvider)
    }

    pub fn controller(&self) -> Result<C::Controller> {
        Ok(self.connection()?.controller(self.controller_address))
    }

    pub fn race(&self, id: RaceId) -> Result<C::Race> {
        Ok(self.connection()?.race(id))
    }
}
