//! Goodwill zap: one-call entry into and exit out of a liquidity pool from
//! any asset, with a goodwill fee routed into an affiliate-aware fee ledger.
//!
//! Vault entry points:
//!   initialize_vault   create a fee ledger; caller becomes administrator
//!   register           authorize / deauthorize integrations (batch)
//!   credit_fee         record goodwill an integration already pushed
//!   claim              affiliate withdraws its accrual
//!   sweep              administrator withdraws non-attributed goodwill
//!
//! Engine entry points:
//!   initialize_engine  fix fee rates, vault and default pool venue
//!   deposit            entry asset → swap → pool units for the caller
//!   withdraw           pool units → swaps → exit asset, net of goodwill
//!   swap               plain aggregator conversion, no goodwill
//!   add_liquidity      provide liquidity from staged balances
//!   remove_liquidity   unwind units into both underlying assets
//!   reclaim            return a staged balance
//!
//! Every entry point runs as one atomic call frame on the [`Runtime`]; any
//! error leaves state exactly as it was. State-mutating engine and vault
//! entry points hold their contract's re-entrancy lock for the whole call.

pub mod adapters;
pub mod asset;
pub mod constants;
pub mod error;
pub mod events;
pub mod instructions;
pub mod runtime;
pub mod serde_b58;
pub mod state;
pub mod venues;

use solana_sdk::pubkey::Pubkey;

pub use adapters::{Added, Fill};
pub use asset::AssetHandle;
pub use constants::*;
pub use error::{Result, ZapError};
pub use events::{Event, EventRecord};
pub use instructions::*;
pub use runtime::{CallContext, Runtime, State};
pub use state::*;

// ─── Entry points ──────────────────────────────────────────────────────────

impl Runtime {
    // ── Vault ─────────────────────────────────────────────────────────────────

    pub fn initialize_vault(&mut self, call: CallContext, vault: Pubkey) -> Result<()> {
        self.invoke(call, vault, |rt, ctx| initialize_vault::handler(rt, ctx, vault))
    }

    pub fn register(
        &mut self,
        call: CallContext,
        vault: Pubkey,
        integrations: &[Pubkey],
        authorized: &[bool],
    ) -> Result<()> {
        self.invoke(call, vault, |rt, ctx| {
            let _guard = rt.lock(vault)?;
            register::handler(rt, ctx, vault, integrations, authorized)
        })
    }

    /// Record `amount` of `asset` goodwill; the caller must be an authorized
    /// integration that has already moved `amount` into the vault.
    pub fn credit_fee(
        &mut self,
        call: CallContext,
        vault: Pubkey,
        affiliate: Pubkey,
        asset: Pubkey,
        amount: u64,
        affiliate_split_bps: u16,
    ) -> Result<CreditSplit> {
        self.invoke(call, vault, |rt, ctx| {
            let _guard = rt.lock(vault)?;
            credit_fee::handler(rt, ctx, vault, affiliate, asset, amount, affiliate_split_bps)
        })
    }

    pub fn claim(&mut self, call: CallContext, vault: Pubkey, asset: Pubkey) -> Result<u64> {
        self.invoke(call, vault, |rt, ctx| {
            let _guard = rt.lock(vault)?;
            claim::handler(rt, ctx, vault, asset)
        })
    }

    pub fn sweep(&mut self, call: CallContext, vault: Pubkey, asset: Pubkey, to: Pubkey) -> Result<u64> {
        self.invoke(call, vault, |rt, ctx| {
            let _guard = rt.lock(vault)?;
            sweep::handler(rt, ctx, vault, asset, to)
        })
    }

    // ── Engine ────────────────────────────────────────────────────────────────

    pub fn initialize_engine(
        &mut self,
        call: CallContext,
        engine: Pubkey,
        params: &InitializeEngineParams,
    ) -> Result<()> {
        self.invoke(call, engine, |rt, ctx| {
            initialize_engine::handler(rt, ctx, engine, params)
        })
    }

    /// Returns the position units minted to the caller (0 when the
    /// converted amount was staged).
    pub fn deposit(&mut self, call: CallContext, engine: Pubkey, params: &DepositParams) -> Result<u64> {
        self.invoke(call, engine, |rt, ctx| {
            let _guard = rt.lock(engine)?;
            deposit::handler(rt, ctx, engine, params)
        })
    }

    /// Returns the net exit amount paid to the recipient.
    pub fn withdraw(&mut self, call: CallContext, engine: Pubkey, params: &WithdrawParams) -> Result<u64> {
        self.invoke(call, engine, |rt, ctx| {
            let _guard = rt.lock(engine)?;
            withdraw::handler(rt, ctx, engine, params)
        })
    }

    pub fn swap(&mut self, call: CallContext, engine: Pubkey, params: &SwapParams) -> Result<u64> {
        self.invoke(call, engine, |rt, ctx| {
            let _guard = rt.lock(engine)?;
            swap::handler(rt, ctx, engine, params)
        })
    }

    pub fn add_liquidity(
        &mut self,
        call: CallContext,
        engine: Pubkey,
        params: &AddLiquidityParams,
    ) -> Result<Added> {
        self.invoke(call, engine, |rt, ctx| {
            let _guard = rt.lock(engine)?;
            add_liquidity::handler(rt, ctx, engine, params)
        })
    }

    pub fn remove_liquidity(
        &mut self,
        call: CallContext,
        engine: Pubkey,
        params: &RemoveLiquidityParams,
    ) -> Result<(u64, u64)> {
        self.invoke(call, engine, |rt, ctx| {
            let _guard = rt.lock(engine)?;
            remove_liquidity::handler(rt, ctx, engine, params)
        })
    }

    pub fn reclaim(&mut self, call: CallContext, engine: Pubkey, asset: Pubkey) -> Result<u64> {
        self.invoke(call, engine, |rt, ctx| {
            let _guard = rt.lock(engine)?;
            reclaim::handler(rt, ctx, engine, asset)
        })
    }

    // ── Holder ────────────────────────────────────────────────────────────────

    /// Set the allowance `spender` has over the caller's `mint` holding.
    pub fn approve(&mut self, call: CallContext, mint: Pubkey, spender: Pubkey, amount: u64) -> Result<()> {
        self.frame(|rt| {
            rt.bank_mut().approve(&mint, &call.caller, &spender, amount);
            Ok(())
        })
    }

    // ── Views ─────────────────────────────────────────────────────────────────

    /// Position units `owner` holds in `pool`.
    pub fn position(&self, owner: &Pubkey, pool: &Pubkey) -> u64 {
        self.bank().token_balance(pool, owner)
    }

    pub fn staged(&self, engine: &Pubkey, owner: &Pubkey, asset: &Pubkey) -> Result<u64> {
        Ok(self.engine(engine)?.staged(owner, asset))
    }

    /// Underlying amounts `units` of `pool` would return through the engine's
    /// default pool venue.
    pub fn quote_remove(&self, engine: &Pubkey, pool: &Pubkey, units: u64) -> Result<(u64, u64)> {
        let venue = self.engine(engine)?.pool_venue;
        adapters::PoolAdapter::new(venue, *engine).quote_remove(self, pool, units)
    }

    /// Custody, liabilities and lifetime totals of `asset` in `vault`.
    pub fn fee_audit(&self, vault: &Pubkey, asset: &Pubkey) -> Result<FeeAudit> {
        let state = self.vault(vault)?;
        Ok(FeeAudit {
            custody: self.balance(asset, vault),
            liabilities: state.liabilities(asset),
            totals: state.totals(asset),
        })
    }
}

/// Snapshot of one asset's books in a vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeAudit {
    pub custody: u64,
    pub liabilities: u128,
    pub totals: FeeTotals,
}

impl FeeAudit {
    /// `Σ accruals + retained + claimed + swept == skimmed`, and custody covers liabilities.
    pub fn balanced(&self) -> bool {
        self.liabilities + self.totals.claimed + self.totals.swept == self.totals.skimmed
            && self.custody as u128 >= self.liabilities
    }
}
