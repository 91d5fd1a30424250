use std::collections::BTreeMap;

use solana_sdk::pubkey::Pubkey;

use crate::{
    constants::{MAX_AFFILIATE_SPLIT_BPS, MAX_GOODWILL_BPS, UNSET_AFFILIATE},
    error::{Result, ZapError},
    instructions::fee_math::affiliate_share,
    require,
};

// ─── FeeRateConfig ─────────────────────────────────────────────────────────
// Fixed when an engine is initialized; there is no setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeRateConfig {
    /// Share of every deposit/withdraw flow skimmed as goodwill (basis points).
    pub goodwill_bps: u16,
    /// Share of the goodwill routed to the named affiliate (basis points).
    pub affiliate_split_bps: u16,
}

impl FeeRateConfig {
    pub fn new(goodwill_bps: u16, affiliate_split_bps: u16) -> Result<Self> {
        require!(
            goodwill_bps <= MAX_GOODWILL_BPS && affiliate_split_bps <= MAX_AFFILIATE_SPLIT_BPS,
            ZapError::InvalidFeeRate
        );
        Ok(Self {
            goodwill_bps,
            affiliate_split_bps,
        })
    }
}

// ─── Engine ────────────────────────────────────────────────────────────────
// One conversion engine. Positions are not stored here: position units are
// the pool's LP token, held by their owners in the bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineState {
    pub authority: Pubkey,
    pub fees: FeeRateConfig,
    /// Fee ledger every goodwill credit is routed to.
    pub vault: Pubkey,
    /// Pool venue used unless a call overrides it.
    pub pool_venue: Pubkey,
    /// `(owner, asset)` → amount held for a deposit whose paired side has not arrived yet.
    pub staged: BTreeMap<(Pubkey, Pubkey), u64>,
}

impl EngineState {
    pub fn staged(&self, owner: &Pubkey, asset: &Pubkey) -> u64 {
        self.staged.get(&(*owner, *asset)).copied().unwrap_or(0)
    }

    pub fn stage(&mut self, owner: &Pubkey, asset: &Pubkey, amount: u64) -> Result<u64> {
        let total = self
            .staged(owner, asset)
            .checked_add(amount)
            .ok_or(ZapError::MathOverflow)?;
        if total > 0 {
            self.staged.insert((*owner, *asset), total);
        }
        Ok(total)
    }

    /// Remove and return everything staged for `(owner, asset)`.
    pub fn take_staged(&mut self, owner: &Pubkey, asset: &Pubkey) -> u64 {
        self.staged.remove(&(*owner, *asset)).unwrap_or(0)
    }

    /// Remove exactly `amount`; fails if less is staged.
    pub fn take_staged_exact(
        &mut self,
        owner: &Pubkey,
        asset: &Pubkey,
        amount: u64,
    ) -> Result<()> {
        let available = self.staged(owner, asset);
        require!(
            available >= amount,
            ZapError::InsufficientBalance {
                asset: *asset,
                holder: *owner,
                available,
                required: amount,
            }
        );
        if available == amount {
            self.staged.remove(&(*owner, *asset));
        } else {
            self.staged.insert((*owner, *asset), available - amount);
        }
        Ok(())
    }

    /// Sum of everything staged in `asset`, across owners.
    pub fn staged_total(&self, asset: &Pubkey) -> u128 {
        self.staged
            .iter()
            .filter(|((_, a), _)| a == asset)
            .map(|(_, v)| *v as u128)
            .sum()
    }
}

// ─── Vault ─────────────────────────────────────────────────────────────────
// The fee ledger. Every recorded liability (accruals + retained) is backed by
// tokens the vault already holds: integrations push first, then record.

/// Lifetime fee flows for one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeTotals {
    /// Every goodwill amount ever credited.
    pub skimmed: u128,
    /// Paid out to affiliates by `claim`.
    pub claimed: u128,
    /// Paid out of the retained balance by `sweep`.
    pub swept: u128,
}

/// How one credit was split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditSplit {
    pub affiliate_share: u64,
    pub retained: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultState {
    pub admin: Pubkey,
    pub integrations: BTreeMap<Pubkey, bool>,
    /// `(affiliate, asset)` → unclaimed affiliate share.
    pub accruals: BTreeMap<(Pubkey, Pubkey), u64>,
    /// asset → goodwill not attributed to any affiliate.
    pub retained: BTreeMap<Pubkey, u64>,
    pub totals: BTreeMap<Pubkey, FeeTotals>,
}

impl VaultState {
    pub fn new(admin: Pubkey) -> Self {
        Self {
            admin,
            integrations: BTreeMap::new(),
            accruals: BTreeMap::new(),
            retained: BTreeMap::new(),
            totals: BTreeMap::new(),
        }
    }

    pub fn is_authorized(&self, integration: &Pubkey) -> bool {
        self.integrations.get(integration).copied().unwrap_or(false)
    }

    pub fn accrued(&self, affiliate: &Pubkey, asset: &Pubkey) -> u64 {
        self.accruals.get(&(*affiliate, *asset)).copied().unwrap_or(0)
    }

    pub fn retained(&self, asset: &Pubkey) -> u64 {
        self.retained.get(asset).copied().unwrap_or(0)
    }

    pub fn totals(&self, asset: &Pubkey) -> FeeTotals {
        self.totals.get(asset).copied().unwrap_or_default()
    }

    /// Everything the vault owes in `asset`: all accruals plus the retained balance.
    pub fn liabilities(&self, asset: &Pubkey) -> u128 {
        let accrued: u128 = self
            .accruals
            .iter()
            .filter(|((_, a), _)| a == asset)
            .map(|(_, v)| *v as u128)
            .sum();
        accrued + self.retained(asset) as u128
    }

    /// Book `amount` of goodwill. An unset affiliate earns nothing; its share
    /// stays in the retained balance.
    pub fn record_credit(
        &mut self,
        affiliate: &Pubkey,
        asset: &Pubkey,
        amount: u64,
        affiliate_split_bps: u16,
    ) -> Result<CreditSplit> {
        let share = if *affiliate == UNSET_AFFILIATE {
            0
        } else {
            affiliate_share(amount, affiliate_split_bps)?
        };
        let retained = amount - share; // share ≤ amount: split_bps ≤ 10_000

        if share > 0 {
            let accrued = self
                .accrued(affiliate, asset)
                .checked_add(share)
                .ok_or(ZapError::MathOverflow)?;
            self.accruals.insert((*affiliate, *asset), accrued);
        }
        if retained > 0 {
            let kept = self
                .retained(asset)
                .checked_add(retained)
                .ok_or(ZapError::MathOverflow)?;
            self.retained.insert(*asset, kept);
        }
        let totals = self.totals.entry(*asset).or_default();
        totals.skimmed += amount as u128;

        Ok(CreditSplit {
            affiliate_share: share,
            retained,
        })
    }

    /// Zero `affiliate`'s accrual in `asset` and return what it was.
    pub fn take_accrual(&mut self, affiliate: &Pubkey, asset: &Pubkey) -> Result<u64> {
        let amount = self
            .accruals
            .remove(&(*affiliate, *asset))
            .unwrap_or(0);
        require!(amount > 0, ZapError::NothingToClaim);
        self.totals.entry(*asset).or_default().claimed += amount as u128;
        Ok(amount)
    }

    /// Zero the retained balance in `asset` and return what it was.
    pub fn take_retained(&mut self, asset: &Pubkey) -> Result<u64> {
        let amount = self.retained.remove(asset).unwrap_or(0);
        require!(amount > 0, ZapError::NothingToClaim);
        self.totals.entry(*asset).or_default().swept += amount as u128;
        Ok(amount)
    }
}
