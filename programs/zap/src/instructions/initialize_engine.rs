use std::collections::BTreeMap;

use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::{
    error::{Result, ZapError},
    require,
    runtime::{CallContext, Runtime},
    state::{EngineState, FeeRateConfig},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitializeEngineParams {
    pub vault: Pubkey,
    pub pool_venue: Pubkey,
    pub goodwill_bps: u16,
    pub affiliate_split_bps: u16,
}

/// Create a conversion engine at `engine`. Fee rates, the vault and the
/// default pool venue are fixed from here on.
pub fn handler(
    rt: &mut Runtime,
    ctx: &CallContext,
    engine: Pubkey,
    params: &InitializeEngineParams,
) -> Result<()> {
    let fees = FeeRateConfig::new(params.goodwill_bps, params.affiliate_split_bps)?;
    rt.vault(&params.vault)?;
    require!(
        rt.is_pool_venue(&params.pool_venue),
        ZapError::UnknownVenue(params.pool_venue)
    );

    rt.insert_engine(
        engine,
        EngineState {
            authority: ctx.caller,
            fees,
            vault: params.vault,
            pool_venue: params.pool_venue,
            staged: BTreeMap::new(),
        },
    )?;

    info!(
        %engine,
        vault = %params.vault,
        goodwill_bps = fees.goodwill_bps,
        affiliate_split_bps = fees.affiliate_split_bps,
        "engine initialized"
    );
    Ok(())
}
