use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::{
    adapters::PoolAdapter,
    error::{Result, ZapError},
    require,
    runtime::{CallContext, Runtime},
    venues::RemoveLiquidity,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveLiquidityParams {
    pub pool: Pubkey,
    pub units: u64,
    pub min_a: u64,
    pub min_b: u64,
    /// Receives both underlying assets.
    pub recipient: Pubkey,
    pub deadline: i64,
    pub pool_venue: Option<Pubkey>,
}

/// Burn units pulled from the caller and pay the underlying assets out as
/// they are. Returns amounts in the pool's asset order.
pub fn handler(
    rt: &mut Runtime,
    ctx: &CallContext,
    engine: Pubkey,
    params: &RemoveLiquidityParams,
) -> Result<(u64, u64)> {
    require!(params.units > 0, ZapError::ZeroAmount);
    let venue = params
        .pool_venue
        .unwrap_or(rt.engine(&engine)?.pool_venue);

    rt.bank_mut()
        .transfer_from(&params.pool, &engine, &ctx.caller, &engine, params.units)?;
    let (amount_a, amount_b) = PoolAdapter::new(venue, engine).remove_liquidity(
        rt,
        &RemoveLiquidity {
            pool: params.pool,
            units: params.units,
            min_a: params.min_a,
            min_b: params.min_b,
            recipient: params.recipient,
            deadline: params.deadline,
        },
    )?;

    info!(
        %engine,
        caller = %ctx.caller,
        pool = %params.pool,
        units = params.units,
        amount_a,
        amount_b,
        "liquidity removed"
    );
    Ok((amount_a, amount_b))
}
