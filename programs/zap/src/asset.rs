//! One handle for "native base asset" and "fungible token", so callers never
//! branch on asset kind.

use solana_sdk::pubkey::Pubkey;

use crate::{
    constants::NATIVE_ASSET,
    error::{Result, ZapError},
    require,
    runtime::{Bank, CallContext},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetHandle {
    Native,
    Token(Pubkey),
}

impl AssetHandle {
    pub fn new(id: Pubkey) -> Self {
        if id == NATIVE_ASSET {
            Self::Native
        } else {
            Self::Token(id)
        }
    }

    pub fn id(&self) -> Pubkey {
        match self {
            Self::Native => NATIVE_ASSET,
            Self::Token(mint) => *mint,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }

    pub fn balance_of(&self, bank: &Bank, holder: &Pubkey) -> u64 {
        match self {
            Self::Native => bank.native_balance(holder),
            Self::Token(mint) => bank.token_balance(mint, holder),
        }
    }

    pub fn transfer(&self, bank: &mut Bank, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<()> {
        match self {
            Self::Native => bank.transfer_native(from, to, amount),
            Self::Token(mint) => bank.transfer_token(mint, from, to, amount),
        }
    }

    /// Take receipt of `amount` from `ctx.caller` into `to` and return what
    /// actually arrived.
    ///
    /// Native: the value must already ride on the call. Token: pulled through
    /// the caller's allowance to `to`, and the balance delta is returned
    /// (a fee-on-transfer token delivers less than `amount`).
    pub fn receive(
        &self,
        bank: &mut Bank,
        ctx: &CallContext,
        to: &Pubkey,
        amount: u64,
    ) -> Result<u64> {
        match self {
            Self::Native => {
                require!(
                    ctx.value == amount,
                    ZapError::ValueMismatch {
                        expected: amount,
                        attached: ctx.value,
                    }
                );
                Ok(amount)
            }
            Self::Token(mint) => {
                require!(
                    ctx.value == 0,
                    ZapError::ValueMismatch {
                        expected: 0,
                        attached: ctx.value,
                    }
                );
                let before = bank.token_balance(mint, to);
                bank.transfer_from(mint, to, &ctx.caller, to, amount)?;
                Ok(bank.token_balance(mint, to).saturating_sub(before))
            }
        }
    }

    /// Let `spender` take `amount` from `owner` during the next call.
    /// Returns the native value that must be attached to that call instead.
    pub fn authorize(&self, bank: &mut Bank, owner: &Pubkey, spender: &Pubkey, amount: u64) -> u64 {
        match self {
            Self::Native => amount,
            Self::Token(mint) => {
                bank.approve(mint, owner, spender, amount);
                0
            }
        }
    }

    /// Clear whatever allowance `spender` did not use.
    pub fn revoke(&self, bank: &mut Bank, owner: &Pubkey, spender: &Pubkey) {
        if let Self::Token(mint) = self {
            bank.approve(mint, owner, spender, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_receive_requires_exact_value() {
        let mut bank = Bank::default();
        let (alice, engine) = (Pubkey::new_unique(), Pubkey::new_unique());
        let native = AssetHandle::new(NATIVE_ASSET);
        assert!(native.is_native());

        let ctx = CallContext::signed(alice).with_value(10);
        assert_eq!(native.receive(&mut bank, &ctx, &engine, 10), Ok(10));
        assert_eq!(
            native.receive(&mut bank, &ctx, &engine, 11),
            Err(ZapError::ValueMismatch { expected: 11, attached: 10 })
        );
    }

    #[test]
    fn token_receive_pulls_through_allowance() {
        let mut bank = Bank::default();
        let (mint, alice, engine) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        bank.mint_to(&mint, &alice, 500).unwrap();
        bank.approve(&mint, &alice, &engine, 300);

        let token = AssetHandle::new(mint);
        let ctx = CallContext::signed(alice);
        assert_eq!(token.receive(&mut bank, &ctx, &engine, 300), Ok(300));
        assert_eq!(bank.token_balance(&mint, &engine), 300);
        assert!(matches!(
            token.receive(&mut bank, &ctx, &engine, 1),
            Err(ZapError::InsufficientAllowance { .. })
        ));

        let with_value = CallContext::signed(alice).with_value(1);
        assert!(matches!(
            token.receive(&mut bank, &with_value, &engine, 1),
            Err(ZapError::ValueMismatch { expected: 0, attached: 1 })
        ));
    }

    #[test]
    fn authorize_and_revoke() {
        let mut bank = Bank::default();
        let (mint, owner, venue) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());

        assert_eq!(AssetHandle::Native.authorize(&mut bank, &owner, &venue, 77), 77);

        let token = AssetHandle::Token(mint);
        assert_eq!(token.authorize(&mut bank, &owner, &venue, 77), 0);
        assert_eq!(bank.allowance(&mint, &owner, &venue), 77);
        token.revoke(&mut bank, &owner, &venue);
        assert_eq!(bank.allowance(&mint, &owner, &venue), 0);
    }
}
