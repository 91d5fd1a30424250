//! Host-side balances: native lamports, token holdings, allowances and supply.

use std::collections::BTreeMap;

use solana_sdk::pubkey::Pubkey;

use crate::{
    constants::NATIVE_ASSET,
    error::{Result, ZapError},
    require,
};

/// Every balance the host tracks.
///
/// Token keys are `(mint, holder)`; allowance keys are `(mint, owner, spender)`.
/// Zero entries are removed so two banks holding the same balances compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bank {
    native: BTreeMap<Pubkey, u64>,
    tokens: BTreeMap<(Pubkey, Pubkey), u64>,
    allowances: BTreeMap<(Pubkey, Pubkey, Pubkey), u64>,
    supply: BTreeMap<Pubkey, u64>,
}

impl Bank {
    // ── Reads ─────────────────────────────────────────────────────────────────

    pub fn native_balance(&self, holder: &Pubkey) -> u64 {
        self.native.get(holder).copied().unwrap_or(0)
    }

    pub fn token_balance(&self, mint: &Pubkey, holder: &Pubkey) -> u64 {
        self.tokens.get(&(*mint, *holder)).copied().unwrap_or(0)
    }

    pub fn allowance(&self, mint: &Pubkey, owner: &Pubkey, spender: &Pubkey) -> u64 {
        self.allowances
            .get(&(*mint, *owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    /// Outstanding supply of a token mint.
    pub fn supply(&self, mint: &Pubkey) -> u64 {
        self.supply.get(mint).copied().unwrap_or(0)
    }

    // ── Native ────────────────────────────────────────────────────────────────

    /// Credit lamports out of thin air (genesis / test faucet).
    pub fn airdrop(&mut self, to: &Pubkey, amount: u64) -> Result<()> {
        let bal = self.native_balance(to);
        let new = bal.checked_add(amount).ok_or(ZapError::MathOverflow)?;
        set(&mut self.native, *to, new);
        Ok(())
    }

    pub fn transfer_native(&mut self, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<()> {
        if amount == 0 || from == to {
            return Ok(());
        }
        let available = self.native_balance(from);
        require!(
            available >= amount,
            ZapError::InsufficientBalance {
                asset: NATIVE_ASSET,
                holder: *from,
                available,
                required: amount,
            }
        );
        let to_bal = self
            .native_balance(to)
            .checked_add(amount)
            .ok_or(ZapError::MathOverflow)?;
        set(&mut self.native, *from, available - amount);
        set(&mut self.native, *to, to_bal);
        Ok(())
    }

    // ── Tokens ────────────────────────────────────────────────────────────────

    pub fn mint_to(&mut self, mint: &Pubkey, to: &Pubkey, amount: u64) -> Result<()> {
        let supply = self
            .supply(mint)
            .checked_add(amount)
            .ok_or(ZapError::MathOverflow)?;
        let bal = self
            .token_balance(mint, to)
            .checked_add(amount)
            .ok_or(ZapError::MathOverflow)?;
        set(&mut self.supply, *mint, supply);
        set(&mut self.tokens, (*mint, *to), bal);
        Ok(())
    }

    pub fn burn(&mut self, mint: &Pubkey, from: &Pubkey, amount: u64) -> Result<()> {
        let available = self.token_balance(mint, from);
        require!(
            available >= amount,
            ZapError::InsufficientBalance {
                asset: *mint,
                holder: *from,
                available,
                required: amount,
            }
        );
        // supply ≥ any single balance, so this cannot underflow
        let supply = self.supply(mint) - amount;
        set(&mut self.tokens, (*mint, *from), available - amount);
        set(&mut self.supply, *mint, supply);
        Ok(())
    }

    pub fn transfer_token(
        &mut self,
        mint: &Pubkey,
        from: &Pubkey,
        to: &Pubkey,
        amount: u64,
    ) -> Result<()> {
        if amount == 0 || from == to {
            return Ok(());
        }
        let available = self.token_balance(mint, from);
        require!(
            available >= amount,
            ZapError::InsufficientBalance {
                asset: *mint,
                holder: *from,
                available,
                required: amount,
            }
        );
        let to_bal = self
            .token_balance(mint, to)
            .checked_add(amount)
            .ok_or(ZapError::MathOverflow)?;
        set(&mut self.tokens, (*mint, *from), available - amount);
        set(&mut self.tokens, (*mint, *to), to_bal);
        Ok(())
    }

    /// Set (not add to) the amount `spender` may move out of `owner`'s holding.
    pub fn approve(&mut self, mint: &Pubkey, owner: &Pubkey, spender: &Pubkey, amount: u64) {
        set(&mut self.allowances, (*mint, *owner, *spender), amount);
    }

    /// Move `amount` from `owner` to `to` on the strength of `spender`'s allowance.
    pub fn transfer_from(
        &mut self,
        mint: &Pubkey,
        spender: &Pubkey,
        owner: &Pubkey,
        to: &Pubkey,
        amount: u64,
    ) -> Result<()> {
        if spender != owner {
            let available = self.allowance(mint, owner, spender);
            require!(
                available >= amount,
                ZapError::InsufficientAllowance {
                    asset: *mint,
                    owner: *owner,
                    spender: *spender,
                    available,
                    required: amount,
                }
            );
            self.transfer_token(mint, owner, to, amount)?;
            self.approve(mint, owner, spender, available - amount);
            return Ok(());
        }
        self.transfer_token(mint, owner, to, amount)
    }

    // ── Wrapping ──────────────────────────────────────────────────────────────

    /// Convert `amount` lamports held by `holder` into the wrapped-native token, 1:1.
    pub fn wrap(&mut self, wrapped: &Pubkey, holder: &Pubkey, amount: u64) -> Result<()> {
        let available = self.native_balance(holder);
        require!(
            available >= amount,
            ZapError::InsufficientBalance {
                asset: NATIVE_ASSET,
                holder: *holder,
                available,
                required: amount,
            }
        );
        self.mint_to(wrapped, holder, amount)?;
        set(&mut self.native, *holder, available - amount);
        Ok(())
    }

    /// Inverse of [`Bank::wrap`].
    pub fn unwrap(&mut self, wrapped: &Pubkey, holder: &Pubkey, amount: u64) -> Result<()> {
        self.burn(wrapped, holder, amount)?;
        self.airdrop(holder, amount)
    }
}

fn set<K: Ord>(map: &mut BTreeMap<K, u64>, key: K, value: u64) {
    if value == 0 {
        map.remove(&key);
    } else {
        map.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_from_spends_allowance() {
        let mut bank = Bank::default();
        let (mint, owner, spender, to) = (
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
        );
        bank.mint_to(&mint, &owner, 100).unwrap();
        bank.approve(&mint, &owner, &spender, 60);

        bank.transfer_from(&mint, &spender, &owner, &to, 40).unwrap();
        assert_eq!(bank.token_balance(&mint, &to), 40);
        assert_eq!(bank.allowance(&mint, &owner, &spender), 20);

        let err = bank.transfer_from(&mint, &spender, &owner, &to, 21).unwrap_err();
        assert!(matches!(err, ZapError::InsufficientAllowance { available: 20, .. }));
    }

    #[test]
    fn short_holder_is_rejected() {
        let mut bank = Bank::default();
        let (mint, a, b) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        bank.mint_to(&mint, &a, 5).unwrap();
        let err = bank.transfer_token(&mint, &a, &b, 6).unwrap_err();
        assert!(matches!(err, ZapError::InsufficientBalance { available: 5, required: 6, .. }));
    }

    #[test]
    fn wrap_round_trip_keeps_supply_consistent() {
        let mut bank = Bank::default();
        let (wrapped, holder) = (Pubkey::new_unique(), Pubkey::new_unique());
        bank.airdrop(&holder, 1_000).unwrap();

        bank.wrap(&wrapped, &holder, 400).unwrap();
        assert_eq!(bank.native_balance(&holder), 600);
        assert_eq!(bank.token_balance(&wrapped, &holder), 400);
        assert_eq!(bank.supply(&wrapped), 400);

        bank.unwrap(&wrapped, &holder, 400).unwrap();
        assert_eq!(bank.native_balance(&holder), 1_000);
        assert_eq!(bank.supply(&wrapped), 0);
        assert_eq!(bank, {
            let mut fresh = Bank::default();
            fresh.airdrop(&holder, 1_000).unwrap();
            fresh
        });
    }
}
