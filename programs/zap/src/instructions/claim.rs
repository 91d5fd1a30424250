use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::{
    asset::AssetHandle,
    error::Result,
    events::Event,
    runtime::{CallContext, Runtime},
};

/// Pay the caller its full accrual in `asset`.
pub fn handler(rt: &mut Runtime, ctx: &CallContext, vault: Pubkey, asset: Pubkey) -> Result<u64> {
    let amount = rt.vault_mut(&vault)?.take_accrual(&ctx.caller, &asset)?;
    AssetHandle::new(asset).transfer(rt.bank_mut(), &vault, &ctx.caller, amount)?;

    rt.emit(
        vault,
        Event::FeeClaimed {
            affiliate: ctx.caller,
            asset,
            amount,
        },
    );
    info!(%vault, affiliate = %ctx.caller, amount, "fees claimed");
    Ok(amount)
}
