use crate::{
    constants::{BPS_DENOMINATOR, MAX_AFFILIATE_SPLIT_BPS},
    error::{Result, ZapError},
    require,
    state::FeeRateConfig,
};

/// How one flow of `amount` is divided once goodwill is skimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoodwillSplit {
    /// Total skimmed into the vault.
    pub goodwill: u64,
    /// Part of `goodwill` accrued to the affiliate.
    pub affiliate_share: u64,
    /// Part of `goodwill` kept in the vault's retained balance.
    pub retained: u64,
    /// What continues through the flow (`amount − goodwill`).
    pub net: u64,
}

/// `amount · goodwill_bps / 10_000`, rounded down.
pub fn goodwill(amount: u64, goodwill_bps: u16) -> Result<u64> {
    let fee = (amount as u128)
        .checked_mul(goodwill_bps as u128)
        .ok_or(ZapError::MathOverflow)?
        / BPS_DENOMINATOR;
    Ok(fee as u64)
}

/// `goodwill · affiliate_split_bps / 10_000`, rounded down.
pub fn affiliate_share(goodwill: u64, affiliate_split_bps: u16) -> Result<u64> {
    require!(affiliate_split_bps <= MAX_AFFILIATE_SPLIT_BPS, ZapError::InvalidFeeRate);
    let share = (goodwill as u128)
        .checked_mul(affiliate_split_bps as u128)
        .ok_or(ZapError::MathOverflow)?
        / BPS_DENOMINATOR;
    Ok(share as u64)
}

/// Full breakdown of a flow; `with_affiliate = false` retains the whole goodwill.
pub fn split(amount: u64, fees: FeeRateConfig, with_affiliate: bool) -> Result<GoodwillSplit> {
    let goodwill = goodwill(amount, fees.goodwill_bps)?;
    let affiliate_share = if with_affiliate {
        affiliate_share(goodwill, fees.affiliate_split_bps)?
    } else {
        0
    };
    Ok(GoodwillSplit {
        goodwill,
        affiliate_share,
        retained: goodwill - affiliate_share,
        net: amount - goodwill,
    })
}
