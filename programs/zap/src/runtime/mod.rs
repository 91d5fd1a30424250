//! In-memory host the zap executes against.
//!
//! The host owns every balance and every contract's persisted state, runs
//! each entry point as an atomic call frame and dispatches calls to the
//! venues deployed at known addresses.

pub mod bank;
pub mod guard;

use std::{
    collections::{BTreeMap, HashMap},
    rc::Rc,
};

use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info};

use crate::{
    asset::AssetHandle,
    constants::DEFAULT_WRAPPED_NATIVE,
    error::{Result, ZapError},
    events::{Event, EventRecord},
    state::{EngineState, VaultState},
    venues::{LiquidityVenue, SwapVenue},
};

pub use bank::Bank;
pub use guard::{LockGuard, Locks};

// ─── Call context ──────────────────────────────────────────────────────────

/// Who is calling, and how much native value rides along with the call.
///
/// Attached value has already moved from `caller` to the callee by the time
/// the callee sees the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Pubkey,
    pub value: u64,
}

impl CallContext {
    pub fn signed(caller: Pubkey) -> Self {
        Self { caller, value: 0 }
    }

    pub fn with_value(mut self, value: u64) -> Self {
        self.value = value;
        self
    }
}

// ─── Persisted state ───────────────────────────────────────────────────────

/// Everything a failed call frame rolls back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub bank: Bank,
    pub vaults: BTreeMap<Pubkey, VaultState>,
    pub engines: BTreeMap<Pubkey, EngineState>,
    pub events: Vec<EventRecord>,
    /// Unix seconds.
    pub clock: i64,
    pub wrapped_native: Pubkey,
}

impl Default for State {
    fn default() -> Self {
        Self {
            bank: Bank::default(),
            vaults: BTreeMap::new(),
            engines: BTreeMap::new(),
            events: Vec::new(),
            clock: 0,
            wrapped_native: DEFAULT_WRAPPED_NATIVE,
        }
    }
}

// ─── Runtime ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct Runtime {
    state: State,
    swap_venues: HashMap<Pubkey, Rc<dyn SwapVenue>>,
    pool_venues: HashMap<Pubkey, Rc<dyn LiquidityVenue>>,
    locks: Locks,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host whose wrapped-native token is `wrapped_native` instead of the default mint.
    pub fn with_wrapped_native(wrapped_native: Pubkey) -> Self {
        let mut rt = Self::default();
        rt.state.wrapped_native = wrapped_native;
        rt
    }

    // ── Frames ────────────────────────────────────────────────────────────────

    /// Run `f` atomically: if it fails, every state change it made is undone.
    ///
    /// The event log is append-only, so it is rolled back by truncation
    /// rather than copied into every snapshot.
    pub fn frame<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let events = std::mem::take(&mut self.state.events);
        let mark = events.len();
        let snapshot = self.state.clone();
        self.state.events = events;

        let out = f(self);
        if out.is_err() {
            let mut events = std::mem::take(&mut self.state.events);
            events.truncate(mark);
            self.state = snapshot;
            self.state.events = events;
        }
        out
    }

    /// Open a frame for a call from `call.caller` into `callee`, moving the
    /// attached value first.
    pub fn invoke<T>(
        &mut self,
        call: CallContext,
        callee: Pubkey,
        f: impl FnOnce(&mut Self, &CallContext) -> Result<T>,
    ) -> Result<T> {
        self.frame(|rt| {
            rt.state
                .bank
                .transfer_native(&call.caller, &callee, call.value)?;
            f(rt, &call)
        })
    }

    /// Take `contract`'s re-entrancy lock for the lifetime of the guard.
    pub fn lock(&self, contract: Pubkey) -> Result<LockGuard> {
        self.locks.acquire(contract)
    }

    // ── Venues ────────────────────────────────────────────────────────────────

    pub fn deploy_swap_venue(&mut self, venue: Rc<dyn SwapVenue>) -> Pubkey {
        let address = venue.address();
        debug!(%address, "swap venue deployed");
        self.swap_venues.insert(address, venue);
        address
    }

    pub fn deploy_pool_venue(&mut self, venue: Rc<dyn LiquidityVenue>) -> Pubkey {
        let address = venue.address();
        debug!(%address, "pool venue deployed");
        self.pool_venues.insert(address, venue);
        address
    }

    pub fn pool_venue(&self, address: &Pubkey) -> Result<Rc<dyn LiquidityVenue>> {
        self.pool_venues
            .get(address)
            .cloned()
            .ok_or(ZapError::UnknownVenue(*address))
    }

    pub fn is_pool_venue(&self, address: &Pubkey) -> bool {
        self.pool_venues.contains_key(address)
    }

    /// Call the swap venue at `venue` in its own frame.
    pub fn call_swap_venue(
        &mut self,
        venue: &Pubkey,
        call: CallContext,
        call_data: &[u8],
    ) -> Result<u64> {
        let program = self
            .swap_venues
            .get(venue)
            .cloned()
            .ok_or(ZapError::UnknownVenue(*venue))?;
        self.invoke(call, *venue, |rt, ctx| program.execute(rt, ctx, call_data))
    }

    // ── Clock ─────────────────────────────────────────────────────────────────

    pub fn now(&self) -> i64 {
        self.state.clock
    }

    pub fn set_time(&mut self, unix_seconds: i64) {
        self.state.clock = unix_seconds;
    }

    pub fn advance(&mut self, seconds: i64) {
        self.state.clock = self.state.clock.saturating_add(seconds);
    }

    // ── Events ────────────────────────────────────────────────────────────────

    pub fn emit(&mut self, emitter: Pubkey, event: Event) {
        let record = EventRecord { emitter, event };
        info!(target: "zap::events", %emitter, event = %record.to_json(), "event");
        self.state.events.push(record);
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.state.events
    }

    // ── State access ──────────────────────────────────────────────────────────

    /// A copy of everything a failed call would roll back.
    pub fn snapshot(&self) -> State {
        self.state.clone()
    }

    pub fn bank(&self) -> &Bank {
        &self.state.bank
    }

    pub fn bank_mut(&mut self) -> &mut Bank {
        &mut self.state.bank
    }

    pub fn wrapped_native(&self) -> Pubkey {
        self.state.wrapped_native
    }

    /// Balance of `asset` (native or token) held by `holder`.
    pub fn balance(&self, asset: &Pubkey, holder: &Pubkey) -> u64 {
        AssetHandle::new(*asset).balance_of(&self.state.bank, holder)
    }

    /// Faucet: credit `amount` of `asset` to `holder` out of nothing.
    pub fn fund(&mut self, holder: &Pubkey, asset: &Pubkey, amount: u64) -> Result<()> {
        match AssetHandle::new(*asset) {
            AssetHandle::Native => self.state.bank.airdrop(holder, amount),
            AssetHandle::Token(mint) => self.state.bank.mint_to(&mint, holder, amount),
        }
    }

    pub fn engine(&self, address: &Pubkey) -> Result<&EngineState> {
        self.state
            .engines
            .get(address)
            .ok_or(ZapError::NotInitialized(*address))
    }

    pub(crate) fn engine_mut(&mut self, address: &Pubkey) -> Result<&mut EngineState> {
        self.state
            .engines
            .get_mut(address)
            .ok_or(ZapError::NotInitialized(*address))
    }

    pub(crate) fn insert_engine(&mut self, address: Pubkey, engine: EngineState) -> Result<()> {
        if self.state.engines.contains_key(&address) {
            return Err(ZapError::AlreadyInitialized(address));
        }
        self.state.engines.insert(address, engine);
        Ok(())
    }

    pub fn vault(&self, address: &Pubkey) -> Result<&VaultState> {
        self.state
            .vaults
            .get(address)
            .ok_or(ZapError::NotInitialized(*address))
    }

    pub(crate) fn vault_mut(&mut self, address: &Pubkey) -> Result<&mut VaultState> {
        self.state
            .vaults
            .get_mut(address)
            .ok_or(ZapError::NotInitialized(*address))
    }

    pub(crate) fn insert_vault(&mut self, address: Pubkey, vault: VaultState) -> Result<()> {
        if self.state.vaults.contains_key(&address) {
            return Err(ZapError::AlreadyInitialized(address));
        }
        self.state.vaults.insert(address, vault);
        Ok(())
    }
}
