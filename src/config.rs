//! Environment-driven configuration, the deployment knobs the hosting page
//! used to inject at build time.

use alloy_primitives::Address;

use crate::{
    Error,
    Result,
};

pub const CONTROLLER_ADDRESS_VAR: &str = "POCKETCOIN_CONTROLLER_ADDRESS";
pub const NETWORK_VAR: &str = "POCKETCOIN_NETWORK";
pub const PRICE_PRECISION_VAR: &str = "POCKETCOIN_PRICE_PRECISION";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Address the Controller contract is deployed at.
    pub controller_address: Address,
    /// Network the contracts are expected to live on, e.g. "ropsten".
    pub network: String,
    /// Divisor applied to raw chain prices before display.
    pub precision: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let controller = required(CONTROLLER_ADDRESS_VAR)?;
        let controller_address = controller.parse::<Address>().map_err(|err| {
            Error::Config(format!("{CONTROLLER_ADDRESS_VAR}: {err}"))
        })?;
        let network = required(NETWORK_VAR)?;
        let precision = match std::env::var(PRICE_PRECISION_VAR) {
            Ok(raw) => raw.parse::<u64>().map_err(|err| {
                Error::Config(format!("{PRICE_PRECISION_VAR}: {err}"))
            })?,
            Err(_) => 1,
        };
        Ok(Self {
            controller_address,
            network,
            precision,
        })
    }
}

fn required(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::Config(format!("{name} is not set")))
}
