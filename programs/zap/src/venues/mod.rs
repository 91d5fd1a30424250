//! External venue boundaries and the reference venues the host ships.
//!
//! The zap never trusts a venue's return values: every amount that matters
//! is re-measured from balances by the adapters.

pub mod constant_product;
pub mod router;

use solana_sdk::pubkey::Pubkey;

use crate::{error::Result, runtime::{CallContext, Runtime}};

pub use constant_product::{ConstantProductVenue, PoolSpec};
pub use router::{OrderRouter, SwapOrder};

/// A swap aggregator. Pulls its input from `ctx.caller` through an allowance
/// (or from the attached value), delivers output wherever `call_data` says,
/// and reports an output amount.
pub trait SwapVenue {
    fn address(&self) -> Pubkey;

    fn execute(&self, rt: &mut Runtime, ctx: &CallContext, call_data: &[u8]) -> Result<u64>;
}

/// Token-only liquidity request, as a pool venue sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddLiquidity {
    pub asset_a: Pubkey,
    pub amount_a: u64,
    pub asset_b: Pubkey,
    pub amount_b: u64,
    pub min_a: u64,
    pub min_b: u64,
    pub recipient: Pubkey,
    pub deadline: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveLiquidity {
    pub pool: Pubkey,
    pub units: u64,
    pub min_a: u64,
    pub min_b: u64,
    pub recipient: Pubkey,
    pub deadline: i64,
}

/// An AMM. Pool units are a token whose mint is the pool address.
pub trait LiquidityVenue {
    fn address(&self) -> Pubkey;

    fn pool_for(&self, rt: &Runtime, asset_a: &Pubkey, asset_b: &Pubkey) -> Option<Pubkey>;

    /// Underlying assets of `pool`, in the pool's own order.
    fn assets_of(&self, rt: &Runtime, pool: &Pubkey) -> Option<(Pubkey, Pubkey)>;

    /// Amounts of each underlying asset `units` would withdraw right now.
    fn quote_remove(&self, rt: &Runtime, pool: &Pubkey, units: u64) -> Result<(u64, u64)>;

    /// Returns `(units_minted, used_a, used_b)` with `a`/`b` in request order.
    fn add_liquidity(
        &self,
        rt: &mut Runtime,
        ctx: &CallContext,
        request: &AddLiquidity,
    ) -> Result<(u64, u64, u64)>;

    /// Returns the amounts paid to the recipient, in the pool's asset order.
    fn remove_liquidity(
        &self,
        rt: &mut Runtime,
        ctx: &CallContext,
        request: &RemoveLiquidity,
    ) -> Result<(u64, u64)>;
}
