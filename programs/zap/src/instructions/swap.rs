use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::{
    adapters::AggregatorAdapter,
    asset::AssetHandle,
    error::{Result, ZapError},
    events::Event,
    require,
    runtime::{CallContext, Runtime},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapParams {
    pub asset_in: Pubkey,
    pub amount_in: u64,
    pub asset_out: Pubkey,
    pub min_amount_out: u64,
    pub venue: Pubkey,
    pub call_data: Vec<u8>,
}

/// Plain aggregator conversion paid straight back to the caller. No goodwill.
pub fn handler(
    rt: &mut Runtime,
    ctx: &CallContext,
    engine: Pubkey,
    params: &SwapParams,
) -> Result<u64> {
    require!(params.amount_in > 0, ZapError::ZeroAmount);
    rt.engine(&engine)?;

    let input = AssetHandle::new(params.asset_in);
    let received = input.receive(rt.bank_mut(), ctx, &engine, params.amount_in)?;
    let (amount_out, unspent) = if params.asset_in == params.asset_out {
        (received, 0)
    } else {
        let fill = AggregatorAdapter::new(engine).swap(
            rt,
            &params.asset_in,
            received,
            &params.asset_out,
            &params.venue,
            &params.call_data,
        )?;
        (fill.amount_out, fill.unspent)
    };
    input.transfer(rt.bank_mut(), &engine, &ctx.caller, unspent)?;
    let amount_in = received.saturating_sub(unspent);
    require!(
        amount_out >= params.min_amount_out,
        ZapError::SlippageExceeded {
            received: amount_out,
            min: params.min_amount_out,
        }
    );
    AssetHandle::new(params.asset_out).transfer(rt.bank_mut(), &engine, &ctx.caller, amount_out)?;

    rt.emit(
        engine,
        Event::Swapped {
            caller: ctx.caller,
            asset_in: params.asset_in,
            amount_in,
            asset_out: params.asset_out,
            amount_out,
        },
    );
    info!(%engine, caller = %ctx.caller, amount_in, amount_out, "swap");
    Ok(amount_out)
}
