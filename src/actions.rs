//! The PocketCoin action set.
//!
//! Each operation talks to the chain, reports through the notification
//! surface and ends by dispatching exactly one store action. Write flows are
//! uniform estimate-then-send sequences: a failure before the gas estimate is
//! settled (including handle resolution) is reported as "try again later",
//! while a post-estimation send failure carries the provider's error.

use alloy_primitives::{
    Address,
    U256,
    utils::Unit,
};
use tracing::error;

use crate::{
    Error,
    call::guarded,
    chain::{
        CallContext,
        ChainClient,
        Connection,
        ControllerContract,
        RaceContract,
        RaceId,
        RaceParams,
    },
    dispatch::{
        ActionKind,
        Dispatcher,
        Payload,
        dispatch_outcome,
    },
    notify::Notifier,
    race_info::{
        RaceInfoAggregator,
        RaceInfoCache,
    },
};

const GAS_RETRY_MESSAGE: &str =
    "Could not determine gas at this point in time. Please try again later";

/// Stake attached to channel creation: one ether.
fn channel_stake() -> U256 {
    Unit::ETHER.wei()
}

pub struct PocketCoin<C, D, N> {
    client: ChainClient<C>,
    races: RaceInfoAggregator<C>,
    dispatcher: D,
    notifier: N,
    account: Option<Address>,
}

impl<C, D, N> PocketCoin<C, D, N>
where
    C: Connection,
    D: Dispatcher,
    N: Notifier,
{
    pub fn new(
        client: ChainClient<C>,
        cache: RaceInfoCache,
        precision: u64,
        dispatcher: D,
        notifier: N,
    ) -> Self
    where
        C: Clone,
    {
        let races = RaceInfoAggregator::new(client.clone(), cache, precision);
        Self {
            client,
            races,
            dispatcher,
            notifier,
            account: None,
        }
    }

    /// Caller identity attached to subsequent calls.
    pub fn set_account(&mut self, account: Address) {
        self.account = Some(account);
    }

    fn call_context(&self) -> CallContext {
        match self.account {
            Some(from) => CallContext::new(from),
            None => CallContext::default(),
        }
    }

    fn gas_failure(&self, kind: ActionKind, err: Error) {
        self.notifier.dismiss_loading();
        self.notifier.error(GAS_RETRY_MESSAGE);
        dispatch_outcome(&self.dispatcher, kind, Err(err));
    }

    /// Detects which network the wallet is connected to, bounded by the
    /// fixed guard window.
    pub async fn detect_network(&self) {
        let outcome = async {
            let connection = self.client.connection()?;
            guarded("network detection", connection.network_type()).await
        }
        .await
        .map(Payload::Network);
        dispatch_outcome(&self.dispatcher, ActionKind::DetectEthereumNetwork, outcome);
    }

    /// Retrieves the wallet's accounts, bounded by the fixed guard window.
    pub async fn retrieve_account(&self) {
        let outcome = async {
            let connection = self.client.connection()?;
            guarded("account retrieval", connection.accounts()).await
        }
        .await
        .map(Payload::Accounts);
        dispatch_outcome(&self.dispatcher, ActionKind::RetrieveUserAccount, outcome);
    }

    pub fn load_controller_contract(&self) {
        dispatch_outcome(
            &self.dispatcher,
            ActionKind::LoadControllerContract,
            Ok(Payload::Empty),
        );
    }

    pub async fn create_channel(&self, name: &str, description: &str) {
        self.notifier.loading(&format!(
            "Creating '{name}' channel. This might take a couple of seconds..."
        ));
        let prepared = async {
            let controller = self.client.controller()?;
            let ctx = self.call_context().with_value(channel_stake());
            let gas = controller
                .estimate_create_channel_gas(name, description, &ctx)
                .await?;
            Ok::<_, Error>((controller, ctx.with_gas(gas)))
        }
        .await;
        let (controller, ctx) = match prepared {
            Ok(ready) => ready,
            Err(err) => return self.gas_failure(ActionKind::CreateChannel, err),
        };

        let sent = controller.create_channel(name, description, &ctx).await;
        self.notifier.dismiss_loading();
        match sent {
            Ok(tx) => {
                self.notifier.success(&format!(
                    "Channel '{name}' created in transaction {}",
                    tx.tx_hash
                ));
                dispatch_outcome(
                    &self.dispatcher,
                    ActionKind::CreateChannel,
                    Ok(Payload::Tx(tx)),
                );
            }
            Err(err) => {
                error!(channel = name, error = %err, "create_channel call failed");
                self.notifier.error("Channel creation failed");
                dispatch_outcome(&self.dispatcher, ActionKind::CreateChannel, Err(err));
            }
        }
    }

    pub async fn create_race(&self, params: &RaceParams) {
        self.notifier.loading(&format!(
            "Creating '{}' race. This might take a couple of seconds...",
            params.name
        ));
        let prepared = async {
            let controller = self.client.controller()?;
            let ctx = self.call_context();
            let gas = controller.estimate_create_race_gas(params, &ctx).await?;
            Ok::<_, Error>((controller, ctx.with_gas(gas)))
        }
        .await;
        let (controller, ctx) = match prepared {
            Ok(ready) => ready,
            Err(err) => return self.gas_failure(ActionKind::CreateRace, err),
        };

        let sent = controller.create_race(params, &ctx).await;
        self.notifier.dismiss_loading();
        match sent {
            Ok(tx) => {
                self.notifier
                    .success(&format!("Race created in transaction {}", tx.tx_hash));
                dispatch_outcome(
                    &self.dispatcher,
                    ActionKind::CreateRace,
                    Ok(Payload::Tx(tx)),
                );
            }
            Err(err) => {
                error!(race = params.name, error = %err, "create_race call failed");
                self.notifier.error("Race creation failed");
                dispatch_outcome(&self.dispatcher, ActionKind::CreateRace, Err(err));
            }
        }
    }

    /// Places a bet on `coin`. Without an explicit stake the race creator's
    /// minimum bet is wagered.
    pub async fn bet_on(
        &self,
        race: RaceId,
        coin: u64,
        stake: Option<U256>,
        min_bet: U256,
    ) {
        self.notifier.loading(&format!(
            "Placing a bet on coin {coin}. This might take a couple of seconds..."
        ));
        let prepared = async {
            let handle = self.client.race(race)?;
            let ctx = self.call_context().with_value(stake.unwrap_or(min_bet));
            let gas = handle.estimate_bet_gas(coin, &ctx).await?;
            Ok::<_, Error>((handle, ctx.with_gas(gas)))
        }
        .await;
        let (handle, ctx) = match prepared {
            Ok(ready) => ready,
            Err(err) => return self.gas_failure(ActionKind::BetOn, err),
        };

        let sent = handle.bet_on(coin, &ctx).await;
        self.notifier.dismiss_loading();
        match sent {
            Ok(tx) => {
                self.notifier
                    .success(&format!("Bet placed in transaction {}", tx.tx_hash));
                dispatch_outcome(&self.dispatcher, ActionKind::BetOn, Ok(Payload::Tx(tx)));
            }
            Err(err) => {
                error!(race = %race, coin, error = %err, "bet_on call failed");
                self.notifier.error("Bet could not be placed");
                dispatch_outcome(&self.dispatcher, ActionKind::BetOn, Err(err));
            }
        }
    }

    pub async fn claim_reward(&self, race: RaceId) {
        self.notifier
            .loading("Claiming reward. This might take a couple of seconds...");
        let prepared = async {
            let handle = self.client.race(race)?;
            let ctx = self.call_context();
            let gas = handle.estimate_claim_gas(&ctx).await?;
            Ok::<_, Error>((handle, ctx.with_gas(gas)))
        }
        .await;
        let (handle, ctx) = match prepared {
            Ok(ready) => ready,
            Err(err) => return self.gas_failure(ActionKind::ClaimReward, err),
        };

        let sent = handle.claim_reward(&ctx).await;
        self.notifier.dismiss_loading();
        match sent {
            Ok(tx) => {
                self.notifier
                    .success(&format!("Reward claimed in transaction {}", tx.tx_hash));
                dispatch_outcome(
                    &self.dispatcher,
                    ActionKind::ClaimReward,
                    Ok(Payload::Claim { race, tx }),
                );
            }
            Err(err) => {
                error!(race = %race, error = %err, "claim_reward call failed");
                self.notifier.error("Reward could not be claimed");
                dispatch_outcome(&self.dispatcher, ActionKind::ClaimReward, Err(err));
            }
        }
    }

    pub async fn my_channel(&self) {
        let outcome = async {
            let controller = self.client.controller()?;
            controller.my_channel(&self.call_context()).await
        }
        .await
        .map(Payload::Channel);
        dispatch_outcome(&self.dispatcher, ActionKind::MyChannel, outcome);
    }

    pub async fn is_bookie(&self) {
        let outcome = async {
            let controller = self.client.controller()?;
            controller.is_bookie(&self.call_context()).await
        }
        .await
        .map(Payload::Flag);
        dispatch_outcome(&self.dispatcher, ActionKind::IsBookie, outcome);
    }

    /// The read-side aggregation flow. No UI notification; the record or the
    /// error goes to the store for the caller to render.
    pub async fn race_complete_info(&self, id: RaceId) {
        let outcome = self
            .races
            .complete_info(id, &self.call_context())
            .await
            .map(Payload::RaceInfo);
        dispatch_outcome(&self.dispatcher, ActionKind::RaceCompleteInfos, outcome);
    }
}
