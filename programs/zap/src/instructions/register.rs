use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::{
    error::{Result, ZapError},
    events::Event,
    require,
    runtime::{CallContext, Runtime},
};

/// Set the authorized flag of each integration. Administrator only.
pub fn handler(
    rt: &mut Runtime,
    ctx: &CallContext,
    vault: Pubkey,
    integrations: &[Pubkey],
    authorized: &[bool],
) -> Result<()> {
    require!(
        integrations.len() == authorized.len(),
        ZapError::LengthMismatch {
            left: integrations.len(),
            right: authorized.len(),
        }
    );
    let state = rt.vault_mut(&vault)?;
    require!(state.admin == ctx.caller, ZapError::Unauthorized);

    for (integration, flag) in integrations.iter().zip(authorized) {
        state.integrations.insert(*integration, *flag);
    }
    for (integration, flag) in integrations.iter().zip(authorized) {
        rt.emit(
            vault,
            Event::Registered {
                integration: *integration,
                authorized: *flag,
            },
        );
    }

    info!(%vault, count = integrations.len(), "integrations registered");
    Ok(())
}
