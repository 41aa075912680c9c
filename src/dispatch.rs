//! Adapter between call outcomes and the surrounding store.
//!
//! Every completed operation becomes exactly one [`Action`]: the payload
//! carries either the domain value or the raw error, never both and never
//! neither.

use std::sync::Arc;

use alloy_primitives::Address;
use serde::Serialize;

use crate::{
    Error,
    Result,
    chain::{
        ChannelInfo,
        RaceId,
        TxReceipt,
    },
    race_info::RaceInfo,
};

/// The action types the PocketCoin store reduces over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ActionKind {
    DetectEthereumNetwork,
    LoadControllerContract,
    RetrieveUserAccount,
    CreateChannel,
    IsBookie,
    MyChannel,
    CreateRace,
    BetOn,
    ClaimReward,
    RaceCompleteInfos,
}

#[derive(Clone, Debug)]
pub enum Payload {
    Network(String),
    Accounts(Vec<Address>),
    Tx(TxReceipt),
    Flag(bool),
    Channel(ChannelInfo),
    RaceInfo(Arc<RaceInfo>),
    Claim { race: RaceId, tx: TxReceipt },
    Error(Arc<Error>),
    Empty,
}

impl Payload {
    pub fn is_error(&self) -> bool {
        matches!(self, Payload::Error(_))
    }
}

#[derive(Clone, Debug)]
pub struct Action {
    pub kind: ActionKind,
    pub payload: Payload,
}

/// Outgoing edge to the application state store.
pub trait Dispatcher {
    fn dispatch(&self, action: Action);
}

impl Dispatcher for tokio::sync::mpsc::UnboundedSender<Action> {
    fn dispatch(&self, action: Action) {
        // A closed store means nobody is reducing anymore; nothing to do.
        let _ = self.send(action);
    }
}

/// Emits exactly one action of `kind`: the value on success, the raw error
/// otherwise.
pub fn dispatch_outcome<D: Dispatcher>(
    dispatcher: &D,
    kind: ActionKind,
    outcome: Result<Payload>,
) {
    let payload = match outcome {
        Ok(payload) => payload,
        Err(err) => Payload::Error(Arc::new(err)),
    };
    dispatcher.dispatch(Action { kind, payload });
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        actions: Mutex<Vec<Action>>,
    }

    impl Dispatcher for &Recorder {
        fn dispatch(&self, action: Action) {
            self.actions.lock().unwrap().push(action);
        }
    }

    #[test]
    fn dispatch_outcome__success__emits_one_action_with_the_value() {
        // given
        let recorder = Recorder::default();

        // when
        dispatch_outcome(
            &&recorder,
            ActionKind::IsBookie,
            Ok(Payload::Flag(true)),
        );

        // then
        let actions = recorder.actions.lock().unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, ActionKind::IsBookie);
        assert!(matches!(actions[0].payload, Payload::Flag(true)));
    }

    #[test]
    fn dispatch_outcome__error__emits_one_action_with_the_error() {
        let recorder = Recorder::default();

        dispatch_outcome(
            &&recorder,
            ActionKind::BetOn,
            Err(Error::NoProvider),
        );

        let actions = recorder.actions.lock().unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, ActionKind::BetOn);
        match &actions[0].payload {
            Payload::Error(err) => assert!(matches!(**err, Error::NoProvider)),
            other => panic!("expected error payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn dispatch_outcome__mpsc_sender__delivers_to_the_channel() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        dispatch_outcome(&tx, ActionKind::DetectEthereumNetwork, Ok(Payload::Empty));

        let action = rx.recv().await.unwrap();
        assert_eq!(action.kind, ActionKind::DetectEthereumNetwork);
    }
}
