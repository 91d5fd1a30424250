use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use crate::{
    asset::AssetHandle,
    error::{Result, ZapError},
    runtime::{CallContext, Runtime},
    venues::{AddLiquidity, RemoveLiquidity},
};

/// Outcome of [`PoolAdapter::add_liquidity`], measured from balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Added {
    pub pool: Pubkey,
    pub units: u64,
    pub used_a: u64,
    pub used_b: u64,
}

/// Wraps calls into one pool venue on behalf of `holder`.
///
/// Requests may name the native asset on either side; the adapter wraps it
/// before the venue sees it and unwraps whatever the venue leaves unused.
#[derive(Debug, Clone, Copy)]
pub struct PoolAdapter {
    venue: Pubkey,
    holder: Pubkey,
}

impl PoolAdapter {
    pub fn new(venue: Pubkey, holder: Pubkey) -> Self {
        Self { venue, holder }
    }

    pub fn venue(&self) -> Pubkey {
        self.venue
    }

    pub fn pool_for(&self, rt: &Runtime, asset_a: &Pubkey, asset_b: &Pubkey) -> Result<Pubkey> {
        let (a, b) = (venue_mint(rt, asset_a), venue_mint(rt, asset_b));
        rt.pool_venue(&self.venue)?
            .pool_for(rt, &a, &b)
            .ok_or(ZapError::NoPoolForPair {
                asset_a: *asset_a,
                asset_b: *asset_b,
            })
    }

    pub fn assets_of(&self, rt: &Runtime, pool: &Pubkey) -> Result<(Pubkey, Pubkey)> {
        rt.pool_venue(&self.venue)?
            .assets_of(rt, pool)
            .ok_or(ZapError::UnknownPool(*pool))
    }

    pub fn quote_remove(&self, rt: &Runtime, pool: &Pubkey, units: u64) -> Result<(u64, u64)> {
        rt.pool_venue(&self.venue)?.quote_remove(rt, pool, units)
    }

    pub fn add_liquidity(&self, rt: &mut Runtime, request: &AddLiquidity) -> Result<Added> {
        let program = rt.pool_venue(&self.venue)?;
        let wrapped = rt.wrapped_native();
        let side_a = AssetHandle::new(request.asset_a);
        let side_b = AssetHandle::new(request.asset_b);
        let (mint_a, mint_b) = (venue_mint(rt, &request.asset_a), venue_mint(rt, &request.asset_b));

        if side_a.is_native() {
            rt.bank_mut().wrap(&wrapped, &self.holder, request.amount_a)?;
        }
        if side_b.is_native() {
            rt.bank_mut().wrap(&wrapped, &self.holder, request.amount_b)?;
        }
        let pool = self.pool_for(rt, &mint_a, &mint_b)?;

        let bank = rt.bank_mut();
        bank.approve(&mint_a, &self.holder, &self.venue, request.amount_a);
        bank.approve(&mint_b, &self.holder, &self.venue, request.amount_b);
        let before_a = bank.token_balance(&mint_a, &self.holder);
        let before_b = bank.token_balance(&mint_b, &self.holder);
        let before_units = bank.token_balance(&pool, &request.recipient);

        let venue_request = AddLiquidity {
            asset_a: mint_a,
            asset_b: mint_b,
            ..*request
        };
        rt.invoke(CallContext::signed(self.holder), self.venue, |rt, ctx| {
            program.add_liquidity(rt, ctx, &venue_request)
        })
        .map_err(map_venue_error)?;

        let bank = rt.bank_mut();
        bank.approve(&mint_a, &self.holder, &self.venue, 0);
        bank.approve(&mint_b, &self.holder, &self.venue, 0);
        let used_a = before_a.saturating_sub(bank.token_balance(&mint_a, &self.holder));
        let used_b = before_b.saturating_sub(bank.token_balance(&mint_b, &self.holder));
        let units = bank
            .token_balance(&pool, &request.recipient)
            .saturating_sub(before_units);

        if side_a.is_native() {
            bank.unwrap(&wrapped, &self.holder, request.amount_a.saturating_sub(used_a))?;
        }
        if side_b.is_native() {
            bank.unwrap(&wrapped, &self.holder, request.amount_b.saturating_sub(used_b))?;
        }

        debug!(venue = %self.venue, %pool, units, used_a, used_b, "liquidity added");
        Ok(Added {
            pool,
            units,
            used_a,
            used_b,
        })
    }

    /// Unwind `request.units` held by the holder; returns the amounts the
    /// recipient received, in the pool's asset order.
    pub fn remove_liquidity(&self, rt: &mut Runtime, request: &RemoveLiquidity) -> Result<(u64, u64)> {
        let program = rt.pool_venue(&self.venue)?;
        let (asset_a, asset_b) = self.assets_of(rt, &request.pool)?;

        let bank = rt.bank_mut();
        bank.approve(&request.pool, &self.holder, &self.venue, request.units);
        let before_a = bank.token_balance(&asset_a, &request.recipient);
        let before_b = bank.token_balance(&asset_b, &request.recipient);

        rt.invoke(CallContext::signed(self.holder), self.venue, |rt, ctx| {
            program.remove_liquidity(rt, ctx, request)
        })
        .map_err(map_venue_error)?;

        let bank = rt.bank_mut();
        bank.approve(&request.pool, &self.holder, &self.venue, 0);
        let amount_a = bank
            .token_balance(&asset_a, &request.recipient)
            .saturating_sub(before_a);
        let amount_b = bank
            .token_balance(&asset_b, &request.recipient)
            .saturating_sub(before_b);

        debug!(venue = %self.venue, pool = %request.pool, amount_a, amount_b, "liquidity removed");
        Ok((amount_a, amount_b))
    }
}

/// The token a pool venue knows `asset` by.
fn venue_mint(rt: &Runtime, asset: &Pubkey) -> Pubkey {
    match AssetHandle::new(*asset) {
        AssetHandle::Native => rt.wrapped_native(),
        AssetHandle::Token(mint) => mint,
    }
}

fn map_venue_error(e: ZapError) -> ZapError {
    match e {
        ZapError::SlippageExceeded { .. }
        | ZapError::Expired { .. }
        | ZapError::ReentrantCall
        | ZapError::UnknownPool(_)
        | ZapError::NoPoolForPair { .. } => e,
        other => ZapError::PoolCallFailed(other.to_string()),
    }
}
