use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::{
    asset::AssetHandle,
    error::{Result, ZapError},
    events::Event,
    require,
    runtime::{CallContext, Runtime},
};

/// Move the whole retained balance of `asset` to `to`. Administrator only.
pub fn handler(
    rt: &mut Runtime,
    ctx: &CallContext,
    vault: Pubkey,
    asset: Pubkey,
    to: Pubkey,
) -> Result<u64> {
    let state = rt.vault_mut(&vault)?;
    require!(state.admin == ctx.caller, ZapError::Unauthorized);
    let amount = state.take_retained(&asset)?;
    AssetHandle::new(asset).transfer(rt.bank_mut(), &vault, &to, amount)?;

    rt.emit(vault, Event::FeeSwept { asset, to, amount });
    info!(%vault, %to, amount, "retained goodwill swept");
    Ok(amount)
}
