//! In-memory chain, store and notification doubles shared by the test
//! suites and the demo binary.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
    },
};

use alloy_primitives::{
    Address,
    B256,
    U256,
};

use crate::{
    Error,
    Result,
    chain::{
        CallContext,
        ChannelInfo,
        CoinTable,
        Connection,
        ControllerContract,
        RaceContract,
        RaceId,
        RaceParams,
        TxReceipt,
    },
    dispatch::{
        Action,
        Dispatcher,
    },
    notify::Notifier,
};

/// Which step of a flow the fake chain should reject.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailPoint {
    InspectCoins,
    WinningCoins,
    ClaimStatus,
    Winnings,
    EstimateGas,
    Send,
}

/// Seed data for one fake race.
#[derive(Clone, Debug, Default)]
pub struct FakeRaceState {
    pub coin_table: CoinTable,
    pub winning_coins: Vec<U256>,
    pub can_claim: bool,
    pub winnings: U256,
    pub fail: Option<FailPoint>,
}

/// Per-race read counters, for asserting cache behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadCounts {
    pub inspect_coins: usize,
    pub winning_coins: usize,
    pub claim_status: usize,
    pub winnings: usize,
}

impl ReadCounts {
    pub fn total(&self) -> usize {
        self.inspect_coins + self.winning_coins + self.claim_status + self.winnings
    }
}

/// Record of a state-changing call the fake chain accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SentCall {
    CreateChannel {
        name: String,
        description: String,
        ctx: CallContext,
    },
    CreateRace {
        params: RaceParams,
        ctx: CallContext,
    },
    BetOn {
        race: RaceId,
        coin: u64,
        ctx: CallContext,
    },
    ClaimReward {
        race: RaceId,
        ctx: CallContext,
    },
}

#[derive(Default)]
struct FakeChainInner {
    network: String,
    accounts: Vec<Address>,
    bookie: bool,
    channel: Option<ChannelInfo>,
    races: HashMap<RaceId, FakeRaceState>,
    counts: HashMap<RaceId, ReadCounts>,
    controller_fail: Option<FailPoint>,
    hang_wallet_calls: bool,
    sent: Vec<SentCall>,
    next_tx: u64,
}

impl FakeChainInner {
    fn next_receipt(&mut self) -> TxReceipt {
        self.next_tx += 1;
        TxReceipt {
            tx_hash: B256::from(U256::from(self.next_tx)),
        }
    }
}

/// An in-memory stand-in for the wallet-provided connection.
#[derive(Clone, Default)]
pub struct FakeConnection {
    inner: Arc<Mutex<FakeChainInner>>,
}

impl FakeConnection {
    pub fn new(network: impl Into<String>, accounts: Vec<Address>) -> Self {
        let connection = Self::default();
        {
            let mut inner = connection.inner.lock().unwrap();
            inner.network = network.into();
            inner.accounts = accounts;
        }
        connection
    }

    pub fn add_race(&self, id: RaceId, state: FakeRaceState) {
        self.inner.lock().unwrap().races.insert(id, state);
    }

    pub fn set_bookie(&self, bookie: bool) {
        self.inner.lock().unwrap().bookie = bookie;
    }

    pub fn set_channel(&self, channel: ChannelInfo) {
        self.inner.lock().unwrap().channel = Some(channel);
    }

    pub fn set_controller_failure(&self, fail: Option<FailPoint>) {
        self.inner.lock().unwrap().controller_fail = fail;
    }

    /// Makes network/account calls hang forever, for exercising the guard.
    pub fn hang_wallet_calls(&self) {
        self.inner.lock().unwrap().hang_wallet_calls = true;
    }

    pub fn read_counts(&self, id: &RaceId) -> ReadCounts {
        self.inner
            .lock()
            .unwrap()
            .counts
            .get(id)
            .copied()
            .unwrap_or_default()
    }

    pub fn sent_calls(&self) -> Vec<SentCall> {
        self.inner.lock().unwrap().sent.clone()
    }
}

impl Connection for FakeConnection {
    type Controller = FakeController;
    type Race = FakeRace;

    async fn network_type(&self) -> Result<String> {
        let (hang, network) = {
            let inner = self.inner.lock().unwrap();
            (inner.hang_wallet_calls, inner.network.clone())
        };
        if hang {
            std::future::pending::<()>().await;
        }
        Ok(network)
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        let (hang, accounts) = {
            let inner = self.inner.lock().unwrap();
            (inner.hang_wallet_calls, inner.accounts.clone())
        };
        if hang {
            std::future::pending::<()>().await;
        }
        Ok(accounts)
    }

    fn controller(&self, _address: Address) -> FakeController {
        FakeController {
            inner: Arc::clone(&self.inner),
        }
    }

    fn race(&self, address: Address) -> FakeRace {
        FakeRace {
            id: address,
            inner: Arc::clone(&self.inner),
        }
    }
}

pub struct FakeController {
    inner: Arc<Mutex<FakeChainInner>>,
}

impl FakeController {
    fn estimate(&self, operation: &'static str) -> Result<u64> {
        let inner = self.inner.lock().unwrap();
        if inner.controller_fail == Some(FailPoint::EstimateGas) {
            return Err(Error::gas_estimation(operation, "injected failure"));
        }
        Ok(21_000)
    }

    fn send(&self, operation: &'static str, call: SentCall) -> Result<TxReceipt> {
        let mut inner = self.inner.lock().unwrap();
        if inner.controller_fail == Some(FailPoint::Send) {
            return Err(Error::contract_call(operation, "injected failure"));
        }
        inner.sent.push(call);
        Ok(inner.next_receipt())
    }
}

impl ControllerContract for FakeController {
    async fn estimate_create_channel_gas(
        &self,
        _name: &str,
        _description: &str,
        _ctx: &CallContext,
    ) -> Result<u64> {
        self.estimate("create_channel")
    }

    async fn create_channel(
        &self,
        name: &str,
        description: &str,
        ctx: &CallContext,
    ) -> Result<TxReceipt> {
        self.send(
            "create_channel",
            SentCall::CreateChannel {
                name: name.to_string(),
                description: description.to_string(),
                ctx: ctx.clone(),
            },
        )
    }

    async fn estimate_create_race_gas(
        &self,
        _params: &RaceParams,
        _ctx: &CallContext,
    ) -> Result<u64> {
        self.estimate("create_race")
    }

    async fn create_race(
        &self,
        params: &RaceParams,
        ctx: &CallContext,
    ) -> Result<TxReceipt> {
        self.send(
            "create_race",
            SentCall::CreateRace {
                params: params.clone(),
                ctx: ctx.clone(),
            },
        )
    }

    async fn my_channel(&self, _ctx: &CallContext) -> Result<ChannelInfo> {
        let inner = self.inner.lock().unwrap();
        inner
            .channel
            .clone()
            .ok_or_else(|| Error::contract_call("my_channel", "no channel registered"))
    }

    async fn is_bookie(&self, _ctx: &CallContext) -> Result<bool> {
        Ok(self.inner.lock().unwrap().bookie)
    }
}

pub struct FakeRace {
    id: RaceId,
    inner: Arc<Mutex<FakeChainInner>>,
}

impl FakeRace {
    fn state(&self, operation: &'static str) -> Result<FakeRaceState> {
        let inner = self.inner.lock().unwrap();
        inner
            .races
            .get(&self.id)
            .cloned()
            .ok_or_else(|| Error::contract_call(operation, "unknown race"))
    }

    fn count(&self, bump: impl FnOnce(&mut ReadCounts)) {
        let mut inner = self.inner.lock().unwrap();
        bump(inner.counts.entry(self.id).or_default());
    }

    fn read<T>(
        &self,
        operation: &'static str,
        fail: FailPoint,
        bump: impl FnOnce(&mut ReadCounts),
        value: impl FnOnce(&FakeRaceState) -> T,
    ) -> Result<T> {
        self.count(bump);
        let state = self.state(operation)?;
        if state.fail == Some(fail) {
            return Err(Error::contract_call(operation, "injected failure"));
        }
        Ok(value(&state))
    }
}

impl RaceContract for FakeRace {
    async fn inspect_coins(&self) -> Result<CoinTable> {
        self.read(
            "inspect_coins",
            FailPoint::InspectCoins,
            |c| c.inspect_coins += 1,
            |s| s.coin_table.clone(),
        )
    }

    async fn winning_coins(&self) -> Result<Vec<U256>> {
        self.read(
            "winning_coins",
            FailPoint::WinningCoins,
            |c| c.winning_coins += 1,
            |s| s.winning_coins.clone(),
        )
    }

    async fn has_claimable_reward(&self, _ctx: &CallContext) -> Result<bool> {
        self.read(
            "has_claimable_reward",
            FailPoint::ClaimStatus,
            |c| c.claim_status += 1,
            |s| s.can_claim,
        )
    }

    async fn my_winnings(&self, _ctx: &CallContext) -> Result<U256> {
        self.read(
            "my_winnings",
            FailPoint::Winnings,
            |c| c.winnings += 1,
            |s| s.winnings,
        )
    }

    async fn estimate_bet_gas(&self, _coin: u64, _ctx: &CallContext) -> Result<u64> {
        let state = self.state("bet_on")?;
        if state.fail == Some(FailPoint::EstimateGas) {
            return Err(Error::gas_estimation("bet_on", "injected failure"));
        }
        Ok(42_000)
    }

    async fn bet_on(&self, coin: u64, ctx: &CallContext) -> Result<TxReceipt> {
        let state = self.state("bet_on")?;
        if state.fail == Some(FailPoint::Send) {
            return Err(Error::contract_call("bet_on", "injected failure"));
        }
        let mut inner = self.inner.lock().unwrap();
        inner.sent.push(SentCall::BetOn {
            race: self.id,
            coin,
            ctx: ctx.clone(),
        });
        Ok(inner.next_receipt())
    }

    async fn estimate_claim_gas(&self, _ctx: &CallContext) -> Result<u64> {
        let state = self.state("claim_reward")?;
        if state.fail == Some(FailPoint::EstimateGas) {
            return Err(Error::gas_estimation("claim_reward", "injected failure"));
        }
        Ok(30_000)
    }

    async fn claim_reward(&self, ctx: &CallContext) -> Result<TxReceipt> {
        let state = self.state("claim_reward")?;
        if state.fail == Some(FailPoint::Send) {
            return Err(Error::contract_call("claim_reward", "injected failure"));
        }
        let mut inner = self.inner.lock().unwrap();
        inner.sent.push(SentCall::ClaimReward {
            race: self.id,
            ctx: ctx.clone(),
        });
        Ok(inner.next_receipt())
    }
}

/// Store double that records every dispatched action.
#[derive(Clone, Default)]
pub struct RecordingDispatcher {
    actions: Arc<Mutex<Vec<Action>>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> Vec<Action> {
        self.actions.lock().unwrap().clone()
    }
}

impl Dispatcher for RecordingDispatcher {
    fn dispatch(&self, action: Action) {
        self.actions.lock().unwrap().push(action);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Note {
    Loading(String),
    Dismiss,
    Success(String),
    Error(String),
}

/// Notification double that records the surface traffic.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    notes: Arc<Mutex<Vec<Note>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notes(&self) -> Vec<Note> {
        self.notes.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn loading(&self, message: &str) {
        self.notes
            .lock()
            .unwrap()
            .push(Note::Loading(message.to_string()));
    }

    fn dismiss_loading(&self) {
        self.notes.lock().unwrap().push(Note::Dismiss);
    }

    fn success(&self, message: &str) {
        self.notes
            .lock()
            .unwrap()
            .push(Note::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.notes
            .lock()
            .unwrap()
            .push(Note::Error(message.to_string()));
    }
}

/// Builds a coin table from `(id, total_wei, bets, start_price, end_price)`
/// rows.
pub fn coin_table(rows: &[(u64, u128, u64, u64, u64)]) -> CoinTable {
    CoinTable {
        ids: rows.iter().map(|r| U256::from(r.0)).collect(),
        totals: rows.iter().map(|r| U256::from(r.1)).collect(),
        bet_counts: rows.iter().map(|r| U256::from(r.2)).collect(),
        start_prices: rows.iter().map(|r| U256::from(r.3)).collect(),
        end_prices: rows.iter().map(|r| U256::from(r.4)).collect(),
    }
}
