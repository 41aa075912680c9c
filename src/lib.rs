//! Client/action layer for the PocketCoin betting dapp.
//!
//! Wraps the Controller and per-race Race contracts behind trait seams,
//! emits one store action per operation, and caches the race "complete info"
//! read aggregate in memory.

pub mod actions;
pub mod call;
pub mod chain;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod notify;
pub mod race_info;

pub mod test_helpers;

pub use error::{
    Error,
    Result,
};
