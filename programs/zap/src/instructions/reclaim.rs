use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::{
    asset::AssetHandle,
    error::{Result, ZapError},
    events::Event,
    require,
    runtime::{CallContext, Runtime},
};

/// Return everything the caller has staged in `asset`.
pub fn handler(rt: &mut Runtime, ctx: &CallContext, engine: Pubkey, asset: Pubkey) -> Result<u64> {
    let amount = rt.engine_mut(&engine)?.take_staged(&ctx.caller, &asset);
    require!(amount > 0, ZapError::NothingToClaim);
    AssetHandle::new(asset).transfer(rt.bank_mut(), &engine, &ctx.caller, amount)?;

    rt.emit(
        engine,
        Event::Reclaimed {
            owner: ctx.caller,
            asset,
            amount,
        },
    );
    info!(%engine, owner = %ctx.caller, amount, "staged balance reclaimed");
    Ok(amount)
}
