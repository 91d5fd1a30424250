//! Events recorded for external observers and indexers.
//!
//! Events live in the runtime's state, so a failed call frame discards the
//! events it emitted along with every other change.

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use crate::serde_b58;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    Deposit {
        #[serde(with = "serde_b58")]
        caller: Pubkey,
        #[serde(with = "serde_b58")]
        pool: Pubkey,
        units_minted: u64,
    },
    Withdraw {
        #[serde(with = "serde_b58")]
        caller: Pubkey,
        #[serde(with = "serde_b58")]
        pool: Pubkey,
        units_burned: u64,
        amount_returned: u64,
    },
    FeeCredited {
        /// Integration that routed the fee.
        #[serde(with = "serde_b58")]
        integration: Pubkey,
        #[serde(with = "serde_b58")]
        affiliate: Pubkey,
        #[serde(with = "serde_b58")]
        asset: Pubkey,
        amount: u64,
        affiliate_share: u64,
    },
    FeeClaimed {
        #[serde(with = "serde_b58")]
        affiliate: Pubkey,
        #[serde(with = "serde_b58")]
        asset: Pubkey,
        amount: u64,
    },
    FeeSwept {
        #[serde(with = "serde_b58")]
        asset: Pubkey,
        #[serde(with = "serde_b58")]
        to: Pubkey,
        amount: u64,
    },
    Registered {
        #[serde(with = "serde_b58")]
        integration: Pubkey,
        authorized: bool,
    },
    Staged {
        #[serde(with = "serde_b58")]
        owner: Pubkey,
        #[serde(with = "serde_b58")]
        asset: Pubkey,
        amount: u64,
    },
    Reclaimed {
        #[serde(with = "serde_b58")]
        owner: Pubkey,
        #[serde(with = "serde_b58")]
        asset: Pubkey,
        amount: u64,
    },
    Swapped {
        #[serde(with = "serde_b58")]
        caller: Pubkey,
        #[serde(with = "serde_b58")]
        asset_in: Pubkey,
        amount_in: u64,
        #[serde(with = "serde_b58")]
        asset_out: Pubkey,
        amount_out: u64,
    },
}

/// An event plus the contract that emitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    #[serde(with = "serde_b58")]
    pub emitter: Pubkey,
    pub event: Event,
}

impl EventRecord {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
