use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::{
    error::Result,
    runtime::{CallContext, Runtime},
    state::VaultState,
};

/// Create a fee ledger at `vault`. The caller becomes its administrator.
pub fn handler(rt: &mut Runtime, ctx: &CallContext, vault: Pubkey) -> Result<()> {
    rt.insert_vault(vault, VaultState::new(ctx.caller))?;
    info!(%vault, admin = %ctx.caller, "vault initialized");
    Ok(())
}
