use std::collections::BTreeMap;

use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info};

use crate::{
    adapters::{AggregatorAdapter, Fill, PoolAdapter},
    asset::AssetHandle,
    error::{Result, ZapError},
    events::Event,
    instructions::route_goodwill,
    require,
    runtime::{CallContext, Runtime},
    venues::RemoveLiquidity,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawParams {
    /// Pool whose units are being unwound (also the unit mint).
    pub pool: Pubkey,
    pub position_units: u64,
    pub exit_asset: Pubkey,
    pub min_exit_amount: u64,
    /// Pool venue to unwind through instead of the engine's default.
    pub underlying_override: Option<Pubkey>,
    /// Receives the exit asset instead of the caller.
    pub target_override: Option<Pubkey>,
    pub swap_venue: Pubkey,
    /// One payload per underlying asset that has to be converted.
    pub swap_call_data: BTreeMap<Pubkey, Vec<u8>>,
    pub affiliate: Pubkey,
}

/// Unwind position units into a single exit asset.
pub fn handler(
    rt: &mut Runtime,
    ctx: &CallContext,
    engine: Pubkey,
    params: &WithdrawParams,
) -> Result<u64> {
    require!(params.position_units > 0, ZapError::ZeroAmount);
    let default_venue = rt.engine(&engine)?.pool_venue;
    let caller = ctx.caller;

    // Units move only through the allowance the caller granted the engine
    rt.bank_mut().transfer_from(
        &params.pool,
        &engine,
        &caller,
        &engine,
        params.position_units,
    )?;

    // ── Pool withdrawal ───────────────────────────────────────────────────────
    let venue = params.underlying_override.unwrap_or(default_venue);
    let pools = PoolAdapter::new(venue, engine);
    let (asset_a, asset_b) = pools.assets_of(rt, &params.pool)?;
    let now = rt.now();
    let (amount_a, amount_b) = pools.remove_liquidity(
        rt,
        &RemoveLiquidity {
            pool: params.pool,
            units: params.position_units,
            min_a: 0,
            min_b: 0,
            recipient: engine,
            deadline: now,
        },
    )?;

    // ── Conversion into the exit asset ────────────────────────────────────────
    let recipient = params.target_override.unwrap_or(caller);
    let aggregator = AggregatorAdapter::new(engine);
    let mut gross_exit: u64 = 0;
    for (asset, amount) in [(asset_a, amount_a), (asset_b, amount_b)] {
        if amount == 0 {
            continue;
        }
        let fill = if asset == params.exit_asset {
            Fill {
                amount_out: amount,
                unspent: 0,
            }
        } else if AggregatorAdapter::is_wrap_pair(rt, &asset, &params.exit_asset) {
            aggregator.swap(rt, &asset, amount, &params.exit_asset, &params.swap_venue, &[])?
        } else {
            let call_data = params
                .swap_call_data
                .get(&asset)
                .ok_or(ZapError::MissingRoute(asset))?;
            aggregator.swap(
                rt,
                &asset,
                amount,
                &params.exit_asset,
                &params.swap_venue,
                call_data,
            )?
        };
        // an unfilled remainder is paid out as the underlying itself
        AssetHandle::new(asset).transfer(rt.bank_mut(), &engine, &recipient, fill.unspent)?;
        let converted = fill.amount_out;
        debug!(%asset, amount, converted, unspent = fill.unspent, "underlying converted");
        gross_exit = gross_exit
            .checked_add(converted)
            .ok_or(ZapError::MathOverflow)?;
    }
    require!(gross_exit > 0, ZapError::ZeroOutput);

    // ── Goodwill and slippage ─────────────────────────────────────────────────
    let net_exit = route_goodwill(rt, engine, params.affiliate, params.exit_asset, gross_exit)?;
    require!(
        net_exit >= params.min_exit_amount,
        ZapError::SlippageExceeded {
            received: net_exit,
            min: params.min_exit_amount,
        }
    );

    AssetHandle::new(params.exit_asset).transfer(rt.bank_mut(), &engine, &recipient, net_exit)?;

    rt.emit(
        engine,
        Event::Withdraw {
            caller,
            pool: params.pool,
            units_burned: params.position_units,
            amount_returned: net_exit,
        },
    );
    info!(%engine, %caller, %recipient, units = params.position_units, net_exit, "zap withdraw");
    Ok(net_exit)
}
