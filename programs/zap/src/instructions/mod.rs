pub mod add_liquidity;
pub mod claim;
pub mod credit_fee;
pub mod deposit;
pub mod fee_math;
pub mod initialize_engine;
pub mod initialize_vault;
pub mod reclaim;
pub mod register;
pub mod remove_liquidity;
pub mod swap;
pub mod sweep;
pub mod withdraw;

pub use add_liquidity::AddLiquidityParams;
pub use deposit::DepositParams;
pub use initialize_engine::InitializeEngineParams;
pub use remove_liquidity::RemoveLiquidityParams;
pub use swap::SwapParams;
pub use withdraw::WithdrawParams;

use solana_sdk::pubkey::Pubkey;

use crate::{
    asset::AssetHandle,
    error::Result,
    runtime::{CallContext, Runtime},
};

// ─── Goodwill routing ──────────────────────────────────────────────────────
// Skim goodwill from `amount` of `asset` held by the engine: push it into the
// vault first, then have the vault record it. Returns what is left.
pub(crate) fn route_goodwill(
    rt: &mut Runtime,
    engine: Pubkey,
    affiliate: Pubkey,
    asset: Pubkey,
    amount: u64,
) -> Result<u64> {
    let state = rt.engine(&engine)?;
    let (fees, vault) = (state.fees, state.vault);

    let goodwill = fee_math::goodwill(amount, fees.goodwill_bps)?;
    if goodwill > 0 {
        AssetHandle::new(asset).transfer(rt.bank_mut(), &engine, &vault, goodwill)?;
        rt.credit_fee(
            CallContext::signed(engine),
            vault,
            affiliate,
            asset,
            goodwill,
            fees.affiliate_split_bps,
        )?;
    }
    Ok(amount - goodwill)
}
