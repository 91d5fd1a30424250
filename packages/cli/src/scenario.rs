//! TOML-described simulations: pools, balances and a sequence of zap calls
//! run against a fresh in-memory runtime.

use std::{collections::BTreeMap, path::Path, rc::Rc};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use solana_sdk::{hash::hashv, pubkey::Pubkey};
use tracing::{debug, info};
use zap::{
    adapters::AggregatorAdapter,
    instructions::fee_math,
    venues::{ConstantProductVenue, OrderRouter, SwapOrder},
    CallContext, DepositParams, InitializeEngineParams, Runtime, WithdrawParams, ZapError,
    NATIVE_ASSET, UNSET_AFFILIATE,
};

/// Printed by `zap example-scenario`.
pub const EXAMPLE: &str = r#"# Zap scenario: every name below becomes a deterministic address.
# NATIVE is the chain's native asset, WSOL its wrapped token.
start_time = 1_700_000_000

[fees]
goodwill_bps = 100          # 1.00 % of every flow
affiliate_split_bps = 5000  # half of it to the affiliate

[[pools]]
assets   = ["USDC", "DAI"]
reserves = [10_000_000_000, 10_000_000_000]
fee_bps  = 30

[[pools]]
assets   = ["WSOL", "USDC"]
reserves = [10_000_000_000, 10_000_000_000]

[[balances]]
holder = "alice"
asset  = "USDC"
amount = 100_000_000

[[balances]]
holder = "alice"
asset  = "NATIVE"
amount = 50_000_000

# USDC converted to DAI and staged
[[steps]]
kind          = "deposit"
caller        = "alice"
entry         = "USDC"
amount        = 1_000_000
deposit_asset = "DAI"
paired        = "USDC"
affiliate     = "bob"

# native value converted to USDC and deposited against the staged DAI
[[steps]]
kind          = "deposit"
caller        = "alice"
entry         = "NATIVE"
amount        = 1_000_000
deposit_asset = "USDC"
paired        = "DAI"
affiliate     = "bob"

[[steps]]
kind    = "advance"
seconds = 3600

# whole position back out to USDC
[[steps]]
kind      = "withdraw"
caller    = "alice"
pool      = ["USDC", "DAI"]
exit      = "USDC"
affiliate = "bob"

[[steps]]
kind      = "claim"
affiliate = "bob"
asset     = "USDC"

[[steps]]
kind  = "sweep"
asset = "USDC"
to    = "treasury"
"#;

// ─── File format ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub start_time: i64,
    #[serde(default)]
    pub fees: Fees,
    pub pools: Vec<PoolConfig>,
    #[serde(default)]
    pub balances: Vec<Balance>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fees {
    pub goodwill_bps: u16,
    pub affiliate_split_bps: u16,
}

impl Default for Fees {
    fn default() -> Self {
        Self {
            goodwill_bps: 100,
            affiliate_split_bps: 5_000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
    pub assets: [String; 2],
    pub reserves: [u64; 2],
    #[serde(default = "default_pool_fee")]
    pub fee_bps: u16,
}

fn default_pool_fee() -> u16 {
    30
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Balance {
    pub holder: String,
    pub asset: String,
    pub amount: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Step {
    Deposit {
        caller: String,
        entry: String,
        amount: u64,
        deposit_asset: String,
        paired: String,
        affiliate: Option<String>,
        #[serde(default)]
        min_units: u64,
    },
    Withdraw {
        caller: String,
        pool: [String; 2],
        /// Defaults to the caller's whole position.
        units: Option<u64>,
        exit: String,
        affiliate: Option<String>,
        #[serde(default)]
        min_exit: u64,
    },
    Reclaim {
        caller: String,
        asset: String,
    },
    Claim {
        affiliate: String,
        asset: String,
    },
    Sweep {
        asset: String,
        to: String,
    },
    Advance {
        seconds: i64,
    },
}

impl Step {
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Deposit { .. } => "deposit",
            Step::Withdraw { .. } => "withdraw",
            Step::Reclaim { .. } => "reclaim",
            Step::Claim { .. } => "claim",
            Step::Sweep { .. } => "sweep",
            Step::Advance { .. } => "advance",
        }
    }
}

impl Scenario {
    pub fn parse(text: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(text).context("invalid scenario")?;
        if scenario.pools.is_empty() {
            return Err(anyhow!("scenario declares no pools"));
        }
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read scenario '{}'", path.display()))?;
        Self::parse(&text).with_context(|| format!("in '{}'", path.display()))
    }
}

// ─── Naming ───────────────────────────────────────────────────────────────────

/// Deterministic address for a scenario name.
pub fn named(name: &str) -> Pubkey {
    Pubkey::new_from_array(hashv(&[b"zap-scenario", name.as_bytes()]).to_bytes())
}

/// `NATIVE`/`SOL` name the native asset and `WSOL` its wrapped token;
/// anything else is hashed by [`named`].
fn resolve(name: &str, wrapped: Pubkey) -> Pubkey {
    match name.to_uppercase().as_str() {
        "NATIVE" | "SOL" => NATIVE_ASSET,
        "WSOL" => wrapped,
        _ => named(name),
    }
}

// ─── Simulation ───────────────────────────────────────────────────────────────

/// Outcome of one step. Failed steps leave the runtime untouched.
#[derive(Debug)]
pub struct StepOutcome {
    pub index: usize,
    pub kind: &'static str,
    pub result: std::result::Result<Value, ZapError>,
}

impl StepOutcome {
    pub fn to_json(&self) -> Value {
        match &self.result {
            Ok(detail) => json!({
                "step": self.index,
                "kind": self.kind,
                "ok": true,
                "detail": detail,
            }),
            Err(e) => json!({
                "step": self.index,
                "kind": self.kind,
                "ok": false,
                "error": e.to_string(),
            }),
        }
    }
}

pub struct Simulation {
    rt: Runtime,
    fees: Fees,
    labels: BTreeMap<String, Pubkey>,
    venue: Rc<ConstantProductVenue>,
    admin: Pubkey,
    vault: Pubkey,
    engine: Pubkey,
    router: Pubkey,
}

impl Simulation {
    /// Deploy the venues, seed the pools, create and register the vault and
    /// engine, then fund the listed balances.
    pub fn build(scenario: &Scenario, fees: Fees) -> Result<Self> {
        let mut rt = Runtime::new();
        rt.set_time(scenario.start_time);
        let wrapped = rt.wrapped_native();
        let mut labels = BTreeMap::new();
        let mut label = |name: &str| -> Pubkey {
            let key = resolve(name, wrapped);
            labels.insert(name.to_string(), key);
            key
        };
        let admin = label("admin");
        let vault = label("vault");
        let engine = label("engine");
        let router = label("router");
        let pool_venue = label("pool-venue");
        let genesis = label("genesis");

        // pools hold the wrapped token where a side names the native asset
        let pool_mint = |key: Pubkey| if key == NATIVE_ASSET { wrapped } else { key };
        let mut venue = ConstantProductVenue::new(pool_venue);
        let mut seeds = Vec::new();
        for pool in &scenario.pools {
            let [a, b] = &pool.assets;
            let (mint_a, mint_b) = (pool_mint(label(a)), pool_mint(label(b)));
            let address = label(&format!("pool:{a}/{b}"));
            venue = venue.with_pool(address, mint_a, mint_b, pool.fee_bps);
            seeds.push((address, pool.reserves));
        }
        let venue = Rc::new(venue);
        rt.deploy_pool_venue(venue.clone());
        rt.deploy_swap_venue(Rc::new(OrderRouter::new(router, venue.clone())));
        for (address, [reserve_a, reserve_b]) in seeds {
            venue
                .seed(&mut rt, &address, reserve_a, reserve_b, &genesis)
                .with_context(|| format!("seed pool {address}"))?;
        }

        rt.initialize_vault(CallContext::signed(admin), vault)
            .context("initialize vault")?;
        rt.initialize_engine(
            CallContext::signed(admin),
            engine,
            &InitializeEngineParams {
                vault,
                pool_venue,
                goodwill_bps: fees.goodwill_bps,
                affiliate_split_bps: fees.affiliate_split_bps,
            },
        )
        .context("initialize engine")?;
        rt.register(CallContext::signed(admin), vault, &[engine], &[true])
            .context("register engine")?;

        for balance in &scenario.balances {
            let holder = label(&balance.holder);
            let asset = label(&balance.asset);
            rt.fund(&holder, &asset, balance.amount)
                .with_context(|| format!("fund {} with {}", balance.holder, balance.asset))?;
        }

        info!(pools = scenario.pools.len(), "scenario runtime ready");
        Ok(Self {
            rt,
            fees,
            labels,
            venue,
            admin,
            vault,
            engine,
            router,
        })
    }

    pub fn runtime(&self) -> &Runtime {
        &self.rt
    }

    fn key(&mut self, name: &str) -> Pubkey {
        let key = resolve(name, self.rt.wrapped_native());
        self.labels.insert(name.to_string(), key);
        key
    }

    fn affiliate(&mut self, name: Option<&str>) -> Pubkey {
        name.map_or(UNSET_AFFILIATE, |n| self.key(n))
    }

    /// Router call data selling `amount_in` of `asset_in` for the engine.
    fn order(&self, asset_in: Pubkey, asset_out: Pubkey, amount_in: u64) -> Vec<u8> {
        SwapOrder::new(asset_in, asset_out, amount_in, self.engine).encode()
    }

    pub fn run(&mut self, steps: &[Step]) -> Vec<StepOutcome> {
        steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                debug!(index, kind = step.kind(), "running step");
                let result = self.step(step);
                if let Err(e) = &result {
                    info!(index, kind = step.kind(), error = %e, "step reverted");
                }
                StepOutcome {
                    index,
                    kind: step.kind(),
                    result,
                }
            })
            .collect()
    }

    fn step(&mut self, step: &Step) -> std::result::Result<Value, ZapError> {
        match step {
            Step::Deposit {
                caller,
                entry,
                amount,
                deposit_asset,
                paired,
                affiliate,
                min_units,
            } => {
                let caller = self.key(caller);
                let (entry, deposit_asset) = (self.key(entry), self.key(deposit_asset));
                let paired = self.key(paired);
                let affiliate = self.affiliate(affiliate.as_deref());

                let swap_call_data = if entry == deposit_asset {
                    Vec::new()
                } else {
                    let net = amount - fee_math::goodwill(*amount, self.fees.goodwill_bps)?;
                    self.order(entry, deposit_asset, net)
                };
                let params = DepositParams {
                    entry_asset: entry,
                    entry_amount: *amount,
                    venue_deposit_asset: deposit_asset,
                    paired_asset: paired,
                    min_pool_output: *min_units,
                    pool_address_override: None,
                    deposit_asset_override: None,
                    swap_venue: self.router,
                    swap_call_data,
                    affiliate,
                };
                let call = if entry == NATIVE_ASSET {
                    CallContext::signed(caller).with_value(*amount)
                } else {
                    self.rt
                        .approve(CallContext::signed(caller), entry, self.engine, *amount)?;
                    CallContext::signed(caller)
                };
                let units = self.rt.deposit(call, self.engine, &params)?;
                Ok(json!({
                    "units": units,
                    "staged": self.rt.staged(&self.engine, &caller, &deposit_asset)?,
                }))
            }
            Step::Withdraw {
                caller,
                pool,
                units,
                exit,
                affiliate,
                min_exit,
            } => {
                let caller = self.key(caller);
                let wrapped = self.rt.wrapped_native();
                let pool_mint = |key: Pubkey| if key == NATIVE_ASSET { wrapped } else { key };
                let (a, b) = (pool_mint(self.key(&pool[0])), pool_mint(self.key(&pool[1])));
                let spec = *self.venue.find(&a, &b)?;
                let exit = self.key(exit);
                let affiliate = self.affiliate(affiliate.as_deref());
                let units = units.unwrap_or_else(|| self.rt.position(&caller, &spec.address));

                let (out_a, out_b) = self.rt.quote_remove(&self.engine, &spec.address, units)?;
                let mut swap_call_data = BTreeMap::new();
                for (asset, amount) in [(spec.asset_a, out_a), (spec.asset_b, out_b)] {
                    if amount > 0
                        && asset != exit
                        && !AggregatorAdapter::is_wrap_pair(&self.rt, &asset, &exit)
                    {
                        swap_call_data.insert(asset, self.order(asset, exit, amount));
                    }
                }
                let params = WithdrawParams {
                    pool: spec.address,
                    position_units: units,
                    exit_asset: exit,
                    min_exit_amount: *min_exit,
                    underlying_override: None,
                    target_override: None,
                    swap_venue: self.router,
                    swap_call_data,
                    affiliate,
                };
                self.rt
                    .approve(CallContext::signed(caller), spec.address, self.engine, units)?;
                let amount_out = self
                    .rt
                    .withdraw(CallContext::signed(caller), self.engine, &params)?;
                Ok(json!({ "units": units, "amount_out": amount_out }))
            }
            Step::Reclaim { caller, asset } => {
                let (caller, asset) = (self.key(caller), self.key(asset));
                let amount = self
                    .rt
                    .reclaim(CallContext::signed(caller), self.engine, asset)?;
                Ok(json!({ "amount": amount }))
            }
            Step::Claim { affiliate, asset } => {
                let (affiliate, asset) = (self.key(affiliate), self.key(asset));
                let amount = self
                    .rt
                    .claim(CallContext::signed(affiliate), self.vault, asset)?;
                Ok(json!({ "amount": amount }))
            }
            Step::Sweep { asset, to } => {
                let (asset, to) = (self.key(asset), self.key(to));
                let amount = self
                    .rt
                    .sweep(CallContext::signed(self.admin), self.vault, asset, to)?;
                Ok(json!({ "amount": amount }))
            }
            Step::Advance { seconds } => {
                self.rt.advance(*seconds);
                Ok(json!({ "now": self.rt.now() }))
            }
        }
    }

    /// Fee books of every named asset the vault has ever skimmed.
    pub fn audits(&self) -> Vec<(String, zap::FeeAudit)> {
        self.labels
            .iter()
            .filter_map(|(name, key)| {
                let audit = self.rt.fee_audit(&self.vault, key).ok()?;
                (audit.totals.skimmed > 0).then(|| (name.clone(), audit))
            })
            .collect()
    }

    pub fn report(&self, outcomes: &[StepOutcome]) -> Value {
        let accounts: BTreeMap<&String, String> = self
            .labels
            .iter()
            .map(|(name, key)| (name, key.to_string()))
            .collect();
        let audit: Vec<Value> = self
            .audits()
            .into_iter()
            .map(|(asset, a)| {
                json!({
                    "asset": asset,
                    "custody": a.custody,
                    "liabilities": a.liabilities.to_string(),
                    "skimmed": a.totals.skimmed.to_string(),
                    "claimed": a.totals.claimed.to_string(),
                    "swept": a.totals.swept.to_string(),
                    "balanced": a.balanced(),
                })
            })
            .collect();
        json!({
            "steps": outcomes.iter().map(StepOutcome::to_json).collect::<Vec<_>>(),
            "events": self.rt.events().iter().map(|e| e.to_json()).collect::<Vec<_>>(),
            "audit": audit,
            "accounts": accounts,
        })
    }

    /// Scenario name for `key`, or the base-58 address.
    pub fn label_of(&self, key: &Pubkey) -> String {
        self.labels
            .iter()
            .find(|(_, k)| *k == key)
            .map_or_else(|| key.to_string(), |(name, _)| name.clone())
    }
}
