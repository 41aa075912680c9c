use std::time::Duration;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No live blockchain connection when a contract handle was requested.
    #[error("no blockchain provider is connected")]
    NoProvider,

    /// A guarded call did not complete within the fixed window. The
    /// underlying call is dropped; a late completion is never observed.
    #[error("{operation} did not complete within {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    /// The preflight gas estimate was rejected. Surfaced to the user as
    /// "try again later", distinct from a post-estimation send failure.
    #[error("gas estimation for {operation} failed: {reason}")]
    GasEstimation {
        operation: &'static str,
        reason: String,
    },

    /// The provider/contract rejected a read or write.
    #[error("contract call {operation} failed: {reason}")]
    ContractCall {
        operation: &'static str,
        reason: String,
    },

    /// An on-chain integer did not fit the expected native width.
    #[error("{what} value {value} is out of range")]
    Decode { what: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn contract_call(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::ContractCall {
            operation,
            reason: reason.into(),
        }
    }

    pub fn gas_estimation(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::GasEstimation {
            operation,
            reason: reason.into(),
        }
    }
}
