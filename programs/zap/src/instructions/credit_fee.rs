use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::{
    asset::AssetHandle,
    constants::MAX_AFFILIATE_SPLIT_BPS,
    error::{Result, ZapError},
    events::Event,
    require,
    runtime::{CallContext, Runtime},
    state::CreditSplit,
};

/// Record `amount` of goodwill the calling integration has already pushed
/// into the vault's custody.
pub fn handler(
    rt: &mut Runtime,
    ctx: &CallContext,
    vault: Pubkey,
    affiliate: Pubkey,
    asset: Pubkey,
    amount: u64,
    affiliate_split_bps: u16,
) -> Result<CreditSplit> {
    let state = rt.vault(&vault)?;
    require!(state.is_authorized(&ctx.caller), ZapError::Unauthorized);
    require!(amount > 0, ZapError::ZeroAmount);
    require!(affiliate_split_bps <= MAX_AFFILIATE_SPLIT_BPS, ZapError::InvalidFeeRate);

    // Push-then-record: custody must already cover every liability plus this credit
    let custody = AssetHandle::new(asset).balance_of(rt.bank(), &vault);
    let required = state.liabilities(&asset) + amount as u128;
    require!(
        custody as u128 >= required,
        ZapError::InsufficientBalance {
            asset,
            holder: vault,
            available: custody,
            required: u64::try_from(required).unwrap_or(u64::MAX),
        }
    );

    let split = rt
        .vault_mut(&vault)?
        .record_credit(&affiliate, &asset, amount, affiliate_split_bps)?;

    rt.emit(
        vault,
        Event::FeeCredited {
            integration: ctx.caller,
            affiliate,
            asset,
            amount,
            affiliate_share: split.affiliate_share,
        },
    );
    info!(
        %vault,
        integration = %ctx.caller,
        %affiliate,
        amount,
        affiliate_share = split.affiliate_share,
        "fee credited"
    );
    Ok(split)
}
