use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info};

use crate::{
    adapters::{AggregatorAdapter, PoolAdapter},
    asset::AssetHandle,
    error::{Result, ZapError},
    events::Event,
    instructions::route_goodwill,
    require,
    runtime::{CallContext, Runtime},
    venues::AddLiquidity,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositParams {
    /// What the caller pays in; native or token.
    pub entry_asset: Pubkey,
    pub entry_amount: u64,
    /// Pool side the entry is converted into.
    pub venue_deposit_asset: Pubkey,
    /// The pool's other side, supplied from the caller's staged balance.
    pub paired_asset: Pubkey,
    /// Fewest position units the caller accepts.
    pub min_pool_output: u64,
    /// Pool venue to deposit through instead of the engine's default.
    pub pool_address_override: Option<Pubkey>,
    /// Replaces `venue_deposit_asset` when set.
    pub deposit_asset_override: Option<Pubkey>,
    pub swap_venue: Pubkey,
    pub swap_call_data: Vec<u8>,
    pub affiliate: Pubkey,
}

/// Convert the entry asset into one side of a pool and deposit it.
///
/// A two-sided pool needs both sides: if the caller has nothing staged in
/// `paired_asset` yet, the converted amount is staged instead and 0 units
/// are minted. Staging only succeeds with a `min_pool_output` of 0.
pub fn handler(
    rt: &mut Runtime,
    ctx: &CallContext,
    engine: Pubkey,
    params: &DepositParams,
) -> Result<u64> {
    require!(params.entry_amount > 0, ZapError::ZeroAmount);
    let default_venue = rt.engine(&engine)?.pool_venue;
    let caller = ctx.caller;

    let entry = AssetHandle::new(params.entry_asset);
    let received = entry.receive(rt.bank_mut(), ctx, &engine, params.entry_amount)?;
    require!(received > 0, ZapError::ZeroAmount);

    let net = route_goodwill(rt, engine, params.affiliate, params.entry_asset, received)?;

    // ── Conversion ────────────────────────────────────────────────────────────
    let deposit_asset = params
        .deposit_asset_override
        .unwrap_or(params.venue_deposit_asset);
    let converted = if params.entry_asset == deposit_asset {
        net
    } else {
        let fill = AggregatorAdapter::new(engine).swap(
            rt,
            &params.entry_asset,
            net,
            &deposit_asset,
            &params.swap_venue,
            &params.swap_call_data,
        )?;
        // input the venue left unfilled goes straight back
        entry.transfer(rt.bank_mut(), &engine, &caller, fill.unspent)?;
        if fill.unspent > 0 {
            debug!(%engine, %caller, refunded = fill.unspent, "partial fill refunded");
        }
        fill.amount_out
    };

    // ── Paired side ───────────────────────────────────────────────────────────
    if rt.engine(&engine)?.staged(&caller, &params.paired_asset) == 0 {
        // staging mints nothing, so any floor on units cannot be met
        require!(
            params.min_pool_output == 0,
            ZapError::SlippageExceeded {
                received: 0,
                min: params.min_pool_output,
            }
        );
        rt.engine_mut(&engine)?
            .stage(&caller, &deposit_asset, converted)?;
        rt.emit(
            engine,
            Event::Staged {
                owner: caller,
                asset: deposit_asset,
                amount: converted,
            },
        );
        info!(%engine, %caller, amount = converted, "deposit side staged");
        return Ok(0);
    }
    let state = rt.engine_mut(&engine)?;
    let paired_amount = state.take_staged(&caller, &params.paired_asset);
    let deposit_amount = state
        .take_staged(&caller, &deposit_asset)
        .checked_add(converted)
        .ok_or(ZapError::MathOverflow)?;

    // ── Pool deposit ──────────────────────────────────────────────────────────
    let venue = params.pool_address_override.unwrap_or(default_venue);
    let now = rt.now();
    let added = PoolAdapter::new(venue, engine).add_liquidity(
        rt,
        &AddLiquidity {
            asset_a: deposit_asset,
            amount_a: deposit_amount,
            asset_b: params.paired_asset,
            amount_b: paired_amount,
            min_a: 0,
            min_b: 0,
            recipient: engine,
            deadline: now,
        },
    )?;
    require!(
        added.units >= params.min_pool_output,
        ZapError::SlippageExceeded {
            received: added.units,
            min: params.min_pool_output,
        }
    );

    // ── Settlement ────────────────────────────────────────────────────────────
    rt.bank_mut()
        .transfer_token(&added.pool, &engine, &caller, added.units)?;
    AssetHandle::new(deposit_asset).transfer(
        rt.bank_mut(),
        &engine,
        &caller,
        deposit_amount.saturating_sub(added.used_a),
    )?;
    AssetHandle::new(params.paired_asset).transfer(
        rt.bank_mut(),
        &engine,
        &caller,
        paired_amount.saturating_sub(added.used_b),
    )?;

    rt.emit(
        engine,
        Event::Deposit {
            caller,
            pool: added.pool,
            units_minted: added.units,
        },
    );
    info!(%engine, %caller, pool = %added.pool, units = added.units, "zap deposit");
    Ok(added.units)
}
