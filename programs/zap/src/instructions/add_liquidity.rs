use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::{
    adapters::{Added, PoolAdapter},
    error::Result,
    events::Event,
    runtime::{CallContext, Runtime},
    venues::AddLiquidity,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddLiquidityParams {
    pub asset_a: Pubkey,
    pub asset_b: Pubkey,
    pub amount_a: u64,
    pub amount_b: u64,
    pub min_a: u64,
    pub min_b: u64,
    /// Receives the minted units.
    pub recipient: Pubkey,
    pub deadline: i64,
    pub pool_venue: Option<Pubkey>,
}

/// Provide liquidity out of the caller's staged balances. Whatever the pool
/// does not take stays staged for the caller.
pub fn handler(
    rt: &mut Runtime,
    ctx: &CallContext,
    engine: Pubkey,
    params: &AddLiquidityParams,
) -> Result<Added> {
    let state = rt.engine_mut(&engine)?;
    let venue = params.pool_venue.unwrap_or(state.pool_venue);
    state.take_staged_exact(&ctx.caller, &params.asset_a, params.amount_a)?;
    state.take_staged_exact(&ctx.caller, &params.asset_b, params.amount_b)?;

    let added = PoolAdapter::new(venue, engine).add_liquidity(
        rt,
        &AddLiquidity {
            asset_a: params.asset_a,
            amount_a: params.amount_a,
            asset_b: params.asset_b,
            amount_b: params.amount_b,
            min_a: params.min_a,
            min_b: params.min_b,
            recipient: engine,
            deadline: params.deadline,
        },
    )?;
    rt.bank_mut()
        .transfer_token(&added.pool, &engine, &params.recipient, added.units)?;

    let state = rt.engine_mut(&engine)?;
    state.stage(&ctx.caller, &params.asset_a, params.amount_a.saturating_sub(added.used_a))?;
    state.stage(&ctx.caller, &params.asset_b, params.amount_b.saturating_sub(added.used_b))?;

    rt.emit(
        engine,
        Event::Deposit {
            caller: ctx.caller,
            pool: added.pool,
            units_minted: added.units,
        },
    );
    info!(%engine, caller = %ctx.caller, pool = %added.pool, units = added.units, "liquidity added");
    Ok(added)
}
