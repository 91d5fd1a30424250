//! Reference pool venue: x·y=k pools whose reserves are the pool address's
//! token balances and whose LP units are a token minted at the pool address.

use std::collections::BTreeMap;

use solana_sdk::pubkey::Pubkey;

use crate::{
    constants::BPS_DENOMINATOR,
    error::{Result, ZapError},
    require,
    runtime::{Bank, CallContext, Runtime},
    venues::{AddLiquidity, LiquidityVenue, RemoveLiquidity},
};

/// Pool configuration, fixed at deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSpec {
    /// Pool address; also the LP mint.
    pub address: Pubkey,
    pub asset_a: Pubkey,
    pub asset_b: Pubkey,
    /// LP fee charged on swaps routed through the pool.
    pub fee_bps: u16,
}

impl PoolSpec {
    fn pairs(&self, x: &Pubkey, y: &Pubkey) -> bool {
        (self.asset_a == *x && self.asset_b == *y) || (self.asset_a == *y && self.asset_b == *x)
    }
}

#[derive(Debug, Clone)]
pub struct ConstantProductVenue {
    address: Pubkey,
    pools: BTreeMap<Pubkey, PoolSpec>,
}

impl ConstantProductVenue {
    pub fn new(address: Pubkey) -> Self {
        Self {
            address,
            pools: BTreeMap::new(),
        }
    }

    pub fn with_pool(mut self, pool: Pubkey, asset_a: Pubkey, asset_b: Pubkey, fee_bps: u16) -> Self {
        self.pools.insert(
            pool,
            PoolSpec {
                address: pool,
                asset_a,
                asset_b,
                fee_bps,
            },
        );
        self
    }

    pub fn pools(&self) -> impl Iterator<Item = &PoolSpec> {
        self.pools.values()
    }

    pub fn spec(&self, pool: &Pubkey) -> Result<&PoolSpec> {
        self.pools.get(pool).ok_or(ZapError::UnknownPool(*pool))
    }

    pub fn find(&self, x: &Pubkey, y: &Pubkey) -> Result<&PoolSpec> {
        self.pools
            .values()
            .find(|spec| spec.pairs(x, y))
            .ok_or(ZapError::NoPoolForPair {
                asset_a: *x,
                asset_b: *y,
            })
    }

    pub fn reserves(&self, bank: &Bank, spec: &PoolSpec) -> (u64, u64) {
        (
            bank.token_balance(&spec.asset_a, &spec.address),
            bank.token_balance(&spec.asset_b, &spec.address),
        )
    }

    /// Give an empty pool its opening reserves and mint the opening LP units
    /// to `provider`. Reserves of the wrapped-native token are backed by
    /// native value the pool is airdropped first.
    pub fn seed(
        &self,
        rt: &mut Runtime,
        pool: &Pubkey,
        amount_a: u64,
        amount_b: u64,
        provider: &Pubkey,
    ) -> Result<u64> {
        let spec = *self.spec(pool)?;
        require!(rt.bank().supply(pool) == 0, ZapError::AlreadyInitialized(*pool));
        let (_, _, units) = deposit_amounts(amount_a, amount_b, 0, 0, 0)?;

        let wrapped = rt.wrapped_native();
        for (asset, amount) in [(spec.asset_a, amount_a), (spec.asset_b, amount_b)] {
            if asset == wrapped {
                rt.bank_mut().airdrop(pool, amount)?;
                rt.bank_mut().wrap(&wrapped, pool, amount)?;
            } else {
                rt.bank_mut().mint_to(&asset, pool, amount)?;
            }
        }
        rt.bank_mut().mint_to(pool, provider, units)?;
        Ok(units)
    }

    /// Output of selling `amount_in` of `asset_in` into the pool pairing it with `asset_out`.
    pub fn quote_swap(
        &self,
        bank: &Bank,
        asset_in: &Pubkey,
        amount_in: u64,
        asset_out: &Pubkey,
    ) -> Result<(PoolSpec, u64)> {
        let spec = *self.find(asset_in, asset_out)?;
        let (reserve_in, reserve_out) = self.oriented_reserves(bank, &spec, asset_in);
        let amount_out = compute_swap(amount_in, spec.fee_bps, reserve_in, reserve_out, 0)?;
        Ok((spec, amount_out))
    }

    /// Sell `amount_in` of `asset_in` held by `payer`; pay the output to `recipient`.
    pub fn fill(
        &self,
        bank: &mut Bank,
        payer: &Pubkey,
        asset_in: &Pubkey,
        amount_in: u64,
        asset_out: &Pubkey,
        min_amount_out: u64,
        recipient: &Pubkey,
    ) -> Result<u64> {
        let spec = *self.find(asset_in, asset_out)?;
        let (reserve_in, reserve_out) = self.oriented_reserves(bank, &spec, asset_in);
        let amount_out = compute_swap(amount_in, spec.fee_bps, reserve_in, reserve_out, min_amount_out)?;

        bank.transfer_token(asset_in, payer, &spec.address, amount_in)?;
        bank.transfer_token(asset_out, &spec.address, recipient, amount_out)?;
        Ok(amount_out)
    }

    fn oriented_reserves(&self, bank: &Bank, spec: &PoolSpec, asset_in: &Pubkey) -> (u128, u128) {
        let (ra, rb) = self.reserves(bank, spec);
        if spec.asset_a == *asset_in {
            (ra as u128, rb as u128)
        } else {
            (rb as u128, ra as u128)
        }
    }
}

impl LiquidityVenue for ConstantProductVenue {
    fn address(&self) -> Pubkey {
        self.address
    }

    fn pool_for(&self, _rt: &Runtime, asset_a: &Pubkey, asset_b: &Pubkey) -> Option<Pubkey> {
        self.find(asset_a, asset_b).ok().map(|spec| spec.address)
    }

    fn assets_of(&self, _rt: &Runtime, pool: &Pubkey) -> Option<(Pubkey, Pubkey)> {
        self.pools.get(pool).map(|spec| (spec.asset_a, spec.asset_b))
    }

    fn quote_remove(&self, rt: &Runtime, pool: &Pubkey, units: u64) -> Result<(u64, u64)> {
        let spec = self.spec(pool)?;
        let (ra, rb) = self.reserves(rt.bank(), spec);
        withdraw_amounts(units, ra, rb, rt.bank().supply(pool))
    }

    fn add_liquidity(
        &self,
        rt: &mut Runtime,
        ctx: &CallContext,
        request: &AddLiquidity,
    ) -> Result<(u64, u64, u64)> {
        let now = rt.now();
        require!(
            now <= request.deadline,
            ZapError::Expired {
                deadline: request.deadline,
                now,
            }
        );
        require!(request.amount_a > 0 && request.amount_b > 0, ZapError::ZeroAmount);

        let spec = *self.find(&request.asset_a, &request.asset_b)?;
        let flipped = spec.asset_a != request.asset_a;
        let (amount_a, amount_b, min_a, min_b) = if flipped {
            (request.amount_b, request.amount_a, request.min_b, request.min_a)
        } else {
            (request.amount_a, request.amount_b, request.min_a, request.min_b)
        };

        let (reserve_a, reserve_b) = self.reserves(rt.bank(), &spec);
        let supply = rt.bank().supply(&spec.address);
        let (used_a, used_b, units) =
            deposit_amounts(amount_a, amount_b, reserve_a, reserve_b, supply)?;

        require!(used_a >= min_a, ZapError::SlippageExceeded { received: used_a, min: min_a });
        require!(used_b >= min_b, ZapError::SlippageExceeded { received: used_b, min: min_b });

        let bank = rt.bank_mut();
        bank.transfer_from(&spec.asset_a, &self.address, &ctx.caller, &spec.address, used_a)?;
        bank.transfer_from(&spec.asset_b, &self.address, &ctx.caller, &spec.address, used_b)?;
        bank.mint_to(&spec.address, &request.recipient, units)?;

        if flipped {
            Ok((units, used_b, used_a))
        } else {
            Ok((units, used_a, used_b))
        }
    }

    fn remove_liquidity(
        &self,
        rt: &mut Runtime,
        ctx: &CallContext,
        request: &RemoveLiquidity,
    ) -> Result<(u64, u64)> {
        let now = rt.now();
        require!(
            now <= request.deadline,
            ZapError::Expired {
                deadline: request.deadline,
                now,
            }
        );
        require!(request.units > 0, ZapError::ZeroAmount);

        let spec = *self.spec(&request.pool)?;
        let (amount_a, amount_b) = self.quote_remove(rt, &spec.address, request.units)?;
        require!(amount_a >= request.min_a, ZapError::SlippageExceeded { received: amount_a, min: request.min_a });
        require!(amount_b >= request.min_b, ZapError::SlippageExceeded { received: amount_b, min: request.min_b });

        let bank = rt.bank_mut();
        bank.transfer_from(&spec.address, &self.address, &ctx.caller, &self.address, request.units)?;
        bank.burn(&spec.address, &self.address, request.units)?;
        bank.transfer_token(&spec.asset_a, &spec.address, &request.recipient, amount_a)?;
        bank.transfer_token(&spec.asset_b, &spec.address, &request.recipient, amount_b)?;
        Ok((amount_a, amount_b))
    }
}

// ─── Pool math ─────────────────────────────────────────────────────────────

/// Constant-product output: `dy = y · dx_net / (x + dx_net)`, with the LP fee
/// taken from `dx` first.
pub fn compute_swap(
    amount_in: u64,
    fee_bps: u16,
    reserve_in: u128,
    reserve_out: u128,
    min_amount_out: u64,
) -> Result<u64> {
    require!(amount_in > 0, ZapError::ZeroAmount);
    require!(reserve_in > 0 && reserve_out > 0, ZapError::InsufficientLiquidity);

    let in_u128 = amount_in as u128;
    let lp_fee = in_u128
        .checked_mul(fee_bps as u128)
        .ok_or(ZapError::MathOverflow)?
        / BPS_DENOMINATOR;
    let after_fees = in_u128
        .checked_sub(lp_fee)
        .ok_or(ZapError::MathOverflow)?;

    let amount_out = reserve_out
        .checked_mul(after_fees)
        .ok_or(ZapError::MathOverflow)?
        / reserve_in
            .checked_add(after_fees)
            .ok_or(ZapError::MathOverflow)?;
    let amount_out = amount_out as u64;

    require!(
        amount_out >= min_amount_out,
        ZapError::SlippageExceeded {
            received: amount_out,
            min: min_amount_out,
        }
    );
    require!(amount_out > 0, ZapError::ZeroOutput);
    Ok(amount_out)
}

/// `(used_a, used_b, units)` for a deposit of up to `amount_a`/`amount_b`.
///
/// The first deposit mints `sqrt(a·b)` and sets the price. Later deposits use
/// the largest amounts at the current ratio and mint proportionally.
pub fn deposit_amounts(
    amount_a: u64,
    amount_b: u64,
    reserve_a: u64,
    reserve_b: u64,
    supply: u64,
) -> Result<(u64, u64, u64)> {
    if supply == 0 {
        let product = (amount_a as u128)
            .checked_mul(amount_b as u128)
            .ok_or(ZapError::MathOverflow)?;
        let units = isqrt(product) as u64;
        require!(units > 0, ZapError::ZeroAmount);
        return Ok((amount_a, amount_b, units));
    }
    require!(reserve_a > 0 && reserve_b > 0, ZapError::InsufficientLiquidity);

    let (ra, rb, sup) = (reserve_a as u128, reserve_b as u128, supply as u128);
    let b_optimal = (amount_a as u128)
        .checked_mul(rb)
        .ok_or(ZapError::MathOverflow)?
        / ra;
    let (used_a, used_b) = if b_optimal <= amount_b as u128 {
        (amount_a as u128, b_optimal)
    } else {
        let a_optimal = (amount_b as u128)
            .checked_mul(ra)
            .ok_or(ZapError::MathOverflow)?
            / rb;
        (a_optimal, amount_b as u128)
    };

    // Proportional to the smaller ratio to prevent dilution
    let units_a = used_a.checked_mul(sup).ok_or(ZapError::MathOverflow)? / ra;
    let units_b = used_b.checked_mul(sup).ok_or(ZapError::MathOverflow)? / rb;
    let units = units_a.min(units_b) as u64;
    require!(units > 0, ZapError::ZeroAmount);

    Ok((used_a as u64, used_b as u64, units))
}

/// Pro-rata share of each reserve for `units` out of `supply`.
pub fn withdraw_amounts(units: u64, reserve_a: u64, reserve_b: u64, supply: u64) -> Result<(u64, u64)> {
    require!(supply > 0 && units <= supply, ZapError::InsufficientLiquidity);
    let amount_a = (units as u128)
        .checked_mul(reserve_a as u128)
        .ok_or(ZapError::MathOverflow)?
        / supply as u128;
    let amount_b = (units as u128)
        .checked_mul(reserve_b as u128)
        .ok_or(ZapError::MathOverflow)?
        / supply as u128;
    Ok((amount_a as u64, amount_b as u64))
}

// ─── Integer square root (Babylonian method) ──────────────────────────────
pub fn isqrt(n: u128) -> u128 {
    if n == 0 {
        return 0;
    }
    let mut x = n;
    let mut y = (x + 1) >> 1;
    while y < x {
        x = y;
        y = (y + n / y) >> 1;
    }
    x
}
