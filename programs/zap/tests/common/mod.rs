#![allow(dead_code)]

use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use solana_sdk::pubkey::Pubkey;
use zap::{
    instructions::fee_math,
    runtime::Runtime,
    venues::{ConstantProductVenue, OrderRouter, SwapOrder, SwapVenue},
    CallContext, DepositParams, InitializeEngineParams, Result, WithdrawParams, ZapError,
    NATIVE_ASSET, UNSET_AFFILIATE,
};

pub const SEED_RESERVE: u64 = 10_000_000_000;
pub const STARTING_BALANCE: u64 = 100_000_000;
pub const POOL_FEE_BPS: u16 = 30;

/// A host with two seeded pools (USDC/DAI and wSOL/USDC), a vault, an
/// engine registered with it, and a funded user.
pub struct Env {
    pub rt: Runtime,
    pub admin: Pubkey,
    pub vault: Pubkey,
    pub engine: Pubkey,
    pub pool_venue: Pubkey,
    pub router: Pubkey,
    pub venue: Rc<ConstantProductVenue>,
    pub usdc: Pubkey,
    pub dai: Pubkey,
    pub wsol: Pubkey,
    pub usdc_dai: Pubkey,
    pub wsol_usdc: Pubkey,
    pub alice: Pubkey,
    pub bob: Pubkey,
    pub goodwill_bps: u16,
    pub affiliate_split_bps: u16,
}

pub fn setup(goodwill_bps: u16, affiliate_split_bps: u16) -> Env {
    let mut rt = Runtime::new();
    let wsol = rt.wrapped_native();
    let (usdc, dai) = (Pubkey::new_unique(), Pubkey::new_unique());
    let (usdc_dai, wsol_usdc) = (Pubkey::new_unique(), Pubkey::new_unique());
    let (pool_venue, router) = (Pubkey::new_unique(), Pubkey::new_unique());
    let (admin, vault, engine) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
    let (alice, bob, genesis) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());

    let venue = Rc::new(
        ConstantProductVenue::new(pool_venue)
            .with_pool(usdc_dai, usdc, dai, POOL_FEE_BPS)
            .with_pool(wsol_usdc, wsol, usdc, POOL_FEE_BPS),
    );
    rt.deploy_pool_venue(venue.clone());
    rt.deploy_swap_venue(Rc::new(OrderRouter::new(router, venue.clone())));
    venue
        .seed(&mut rt, &usdc_dai, SEED_RESERVE, SEED_RESERVE, &genesis)
        .unwrap();
    venue
        .seed(&mut rt, &wsol_usdc, SEED_RESERVE, SEED_RESERVE, &genesis)
        .unwrap();

    rt.initialize_vault(CallContext::signed(admin), vault).unwrap();
    rt.initialize_engine(
        CallContext::signed(admin),
        engine,
        &InitializeEngineParams {
            vault,
            pool_venue,
            goodwill_bps,
            affiliate_split_bps,
        },
    )
    .unwrap();
    rt.register(CallContext::signed(admin), vault, &[engine], &[true])
        .unwrap();

    for asset in [usdc, dai, NATIVE_ASSET] {
        rt.fund(&alice, &asset, STARTING_BALANCE).unwrap();
    }

    Env {
        rt,
        admin,
        vault,
        engine,
        pool_venue,
        router,
        venue,
        usdc,
        dai,
        wsol,
        usdc_dai,
        wsol_usdc,
        alice,
        bob,
        goodwill_bps,
        affiliate_split_bps,
    }
}

impl Env {
    pub fn net_of_goodwill(&self, amount: u64) -> u64 {
        amount - fee_math::goodwill(amount, self.goodwill_bps).unwrap()
    }

    /// Router call data converting `amount_in` for the engine.
    pub fn order(&self, asset_in: Pubkey, asset_out: Pubkey, amount_in: u64) -> Vec<u8> {
        SwapOrder::new(asset_in, asset_out, amount_in, self.engine).encode()
    }

    /// Deposit params for `amount` of `entry`, converted into `deposit_asset`
    /// through the router when they differ.
    pub fn deposit_params(
        &self,
        entry: Pubkey,
        amount: u64,
        deposit_asset: Pubkey,
        paired: Pubkey,
        affiliate: Pubkey,
    ) -> DepositParams {
        let swap_call_data = if entry == deposit_asset {
            Vec::new()
        } else {
            self.order(entry, deposit_asset, self.net_of_goodwill(amount))
        };
        DepositParams {
            entry_asset: entry,
            entry_amount: amount,
            venue_deposit_asset: deposit_asset,
            paired_asset: paired,
            min_pool_output: 0,
            pool_address_override: None,
            deposit_asset_override: None,
            swap_venue: self.router,
            swap_call_data,
            affiliate,
        }
    }

    /// Token deposit by `who`, approving the engine first.
    pub fn deposit(&mut self, who: Pubkey, params: &DepositParams) -> Result<u64> {
        let call = if params.entry_asset == NATIVE_ASSET {
            CallContext::signed(who).with_value(params.entry_amount)
        } else {
            self.rt
                .approve(CallContext::signed(who), params.entry_asset, self.engine, params.entry_amount)?;
            CallContext::signed(who)
        };
        self.rt.deposit(call, self.engine, params)
    }

    /// Full USDC → USDC/DAI zap for Alice: half converted to DAI and staged,
    /// the other half deposited against it. Returns units minted.
    pub fn zap_usdc_into_pool(&mut self, total: u64, affiliate: Pubkey) -> u64 {
        let half = total / 2;
        let stage = self.deposit_params(self.usdc, half, self.dai, self.usdc, affiliate);
        assert_eq!(self.deposit(self.alice, &stage).unwrap(), 0);
        let pair = self.deposit_params(self.usdc, total - half, self.usdc, self.dai, affiliate);
        self.deposit(self.alice, &pair).unwrap()
    }

    /// Withdraw params unwinding `units` of USDC/DAI into USDC, with a DAI
    /// route sized from the current quote.
    pub fn withdraw_to_usdc(&self, units: u64, affiliate: Pubkey) -> WithdrawParams {
        let (_, dai_out) = self.rt.quote_remove(&self.engine, &self.usdc_dai, units).unwrap();
        let mut swap_call_data = BTreeMap::new();
        swap_call_data.insert(self.dai, self.order(self.dai, self.usdc, dai_out));
        WithdrawParams {
            pool: self.usdc_dai,
            position_units: units,
            exit_asset: self.usdc,
            min_exit_amount: 0,
            underlying_override: None,
            target_override: None,
            swap_venue: self.router,
            swap_call_data,
            affiliate,
        }
    }

    pub fn withdraw(&mut self, who: Pubkey, params: &WithdrawParams) -> Result<u64> {
        self.rt
            .approve(CallContext::signed(who), params.pool, self.engine, params.position_units)?;
        self.rt.withdraw(CallContext::signed(who), self.engine, params)
    }

    /// Assert the vault's books balance for `asset` and custody equals liabilities.
    pub fn assert_books(&self, asset: &Pubkey) {
        let audit = self.rt.fee_audit(&self.vault, asset).unwrap();
        assert!(audit.balanced(), "unbalanced books: {audit:?}");
        assert_eq!(audit.custody as u128, audit.liabilities);
    }

    pub fn no_affiliate(&self) -> Pubkey {
        UNSET_AFFILIATE
    }
}

// ─── Adversarial venues ────────────────────────────────────────────────────

/// Re-enters the engine's `deposit` from inside a swap.
pub struct ReentrantVenue {
    pub address: Pubkey,
    pub engine: Pubkey,
    pub params: DepositParams,
}

impl SwapVenue for ReentrantVenue {
    fn address(&self) -> Pubkey {
        self.address
    }

    fn execute(&self, rt: &mut Runtime, _ctx: &CallContext, _call_data: &[u8]) -> Result<u64> {
        rt.deposit(CallContext::signed(self.address), self.engine, &self.params)
    }
}

/// Claims to have delivered output it never sent.
pub struct MisreportingVenue {
    pub address: Pubkey,
    pub claimed: u64,
}

impl SwapVenue for MisreportingVenue {
    fn address(&self) -> Pubkey {
        self.address
    }

    fn execute(&self, _rt: &mut Runtime, _ctx: &CallContext, _call_data: &[u8]) -> Result<u64> {
        Ok(self.claimed)
    }
}

/// Always reverts.
pub struct FailingVenue {
    pub address: Pubkey,
}

impl SwapVenue for FailingVenue {
    fn address(&self) -> Pubkey {
        self.address
    }

    fn execute(&self, _rt: &mut Runtime, _ctx: &CallContext, _call_data: &[u8]) -> Result<u64> {
        Err(ZapError::InvalidCallData("venue rejected the order".into()))
    }
}

/// Records the call data it receives and pays nothing.
#[derive(Default)]
pub struct RecordingVenue {
    pub address: Pubkey,
    pub seen: RefCell<Vec<Vec<u8>>>,
}

impl SwapVenue for RecordingVenue {
    fn address(&self) -> Pubkey {
        self.address
    }

    fn execute(&self, _rt: &mut Runtime, _ctx: &CallContext, call_data: &[u8]) -> Result<u64> {
        self.seen.borrow_mut().push(call_data.to_vec());
        Ok(0)
    }
}
