//! Timeout guard for the narrow set of calls that may hang on a wallet
//! prompt (network detection, account retrieval). Contract reads and writes
//! are not routed through here; they complete or fail on the provider's own
//! schedule.

use std::{
    future::Future,
    time::Duration,
};

use crate::{
    Error,
    Result,
};

/// Fixed window for guarded calls.
pub const GUARDED_CALL_TIMEOUT: Duration = Duration::from_secs(15);

/// Runs `fut` under [`GUARDED_CALL_TIMEOUT`].
///
/// First-settled-wins: when the window elapses the guarded future is dropped,
/// so a completion arriving after the timeout fired is discarded rather than
/// reported alongside it.
pub async fn guarded<T>(
    operation: &'static str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(GUARDED_CALL_TIMEOUT, fut).await {
        Ok(outcome) => outcome,
        Err(_) => Err(Error::Timeout {
            operation,
            timeout: GUARDED_CALL_TIMEOUT,
        }),
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn guarded__call_never_completes__reports_timeout() {
        // given a call that never settles
        let fut = std::future::pending::<Result<()>>();

        // when the window elapses
        let outcome = guarded("network detection", fut).await;

        // then
        assert!(matches!(
            outcome,
            Err(Error::Timeout {
                operation: "network detection",
                ..
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn guarded__call_completes_in_time__passes_value_through() {
        let outcome = guarded("account retrieval", async { Ok(7u64) }).await;
        assert_eq!(outcome.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn guarded__call_fails_in_time__passes_error_through() {
        let outcome = guarded("account retrieval", async {
            Err::<u64, _>(Error::contract_call("accounts", "provider rejected"))
        })
        .await;
        assert!(matches!(outcome, Err(Error::ContractCall { .. })));
    }
}
