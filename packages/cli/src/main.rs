mod scenario;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;
use zap::{instructions::fee_math, FeeRateConfig, MAX_AFFILIATE_SPLIT_BPS, MAX_GOODWILL_BPS};

use scenario::{Fees, Scenario, Simulation};

// ─── Version banner ───────────────────────────────────────────────────────────

/// Print the Zap banner to stdout.
fn print_banner() {
    let ver = env!("CARGO_PKG_VERSION");
    println!();
    println!("  Zap  v{ver}  ·  any asset in, pool units out, goodwill to affiliates");
    println!("  {}", "─".repeat(62));
    println!("  Goodwill   0–{MAX_GOODWILL_BPS} bps of every entry and exit flow");
    println!("  Affiliate  0–{MAX_AFFILIATE_SPLIT_BPS} bps of the goodwill, claimable from the vault");
    println!("  Runtime    in-memory, atomic per call");
    println!();
}

// ─── CLI definition ───────────────────────────────────────────────────────────

/// Zap: quote goodwill splits and simulate zap flows.
///
/// Every command supports --json for machine-readable output.
/// Global options can also be set via environment variables:
///   ZAP_GOODWILL_BPS         goodwill rate in basis points
///   ZAP_AFFILIATE_SPLIT_BPS  affiliate share of goodwill in basis points
#[derive(Parser)]
#[command(
    name         = "zap",
    version      = env!("CARGO_PKG_VERSION"),
    long_version = concat!(
        env!("CARGO_PKG_VERSION"), "\n",
        "Goodwill:  0–100 bps per flow\n",
        "Affiliate: 0–10000 bps of goodwill\n",
        "License:   MIT",
    ),
    about = "Zap — one-call entry into and exit out of liquidity pools, with affiliate goodwill.",
    after_help = "\
ENVIRONMENT:
  ZAP_GOODWILL_BPS         Goodwill rate  [default: 100, or the scenario's]
  ZAP_AFFILIATE_SPLIT_BPS  Affiliate split  [default: 5000, or the scenario's]
  ZAP_SCENARIO             Scenario file for `simulate`
  RUST_LOG                 Log filter, written to stderr  [default: warn]

QUICK START:
  zap quote --amount 1000000
  zap example-scenario > scenario.toml
  zap simulate --scenario scenario.toml"
)]
struct Cli {
    /// Goodwill skimmed from every flow (basis points, 0–100)
    #[arg(long, global = true, value_name = "BPS", env = "ZAP_GOODWILL_BPS")]
    goodwill_bps: Option<u16>,

    /// Share of goodwill accrued to the affiliate (basis points, 0–10000)
    #[arg(long, global = true, value_name = "BPS", env = "ZAP_AFFILIATE_SPLIT_BPS")]
    affiliate_split_bps: Option<u16>,

    /// Output machine-readable JSON instead of human-readable text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Break a flow down into goodwill, affiliate share, retained and net
    #[command(
        after_help = "\
EXAMPLES:
  # 1 % goodwill, half to the affiliate
  zap quote --amount 1000000 --goodwill-bps 100 --affiliate-split-bps 5000

  # Same flow with no affiliate: the whole goodwill is retained
  zap quote --amount 1000000 --no-affiliate"
    )]
    Quote {
        /// Flow size in atomic units
        #[arg(long, value_name = "AMOUNT")]
        amount: u64,

        /// Quote as if the flow named no affiliate
        #[arg(long, default_value_t = false)]
        no_affiliate: bool,
    },

    /// Run a scenario file against a fresh in-memory runtime
    ///
    /// Pools are seeded, a vault and engine are created and registered,
    /// balances are funded, then each step runs as one atomic call.
    /// A failing step is reported and leaves state untouched.
    #[command(
        after_help = "\
EXAMPLES:
  zap simulate --scenario scenario.toml
  ZAP_GOODWILL_BPS=30 zap simulate --scenario scenario.toml --json"
    )]
    Simulate {
        /// Path to the scenario TOML
        #[arg(long, value_name = "PATH", env = "ZAP_SCENARIO")]
        scenario: PathBuf,
    },

    /// Print a ready-to-edit scenario file
    ExampleScenario,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    // When invoked with no arguments, show banner + full help and exit cleanly.
    if std::env::args().len() == 1 {
        print_banner();
        Cli::command().print_long_help().ok();
        println!();
        return Ok(());
    }

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Quote { amount, no_affiliate } => {
            let fees = fees_from(&cli, Fees::default());
            cmd_quote(fees, *amount, !*no_affiliate, cli.json)?;
        }
        Commands::Simulate { scenario } => {
            cmd_simulate(&cli, scenario, cli.json)?;
        }
        Commands::ExampleScenario => {
            print!("{}", scenario::EXAMPLE);
        }
    }

    Ok(())
}

/// Command-line rates win over `base`.
fn fees_from(cli: &Cli, base: Fees) -> Fees {
    Fees {
        goodwill_bps: cli.goodwill_bps.unwrap_or(base.goodwill_bps),
        affiliate_split_bps: cli.affiliate_split_bps.unwrap_or(base.affiliate_split_bps),
    }
}

// ─── quote ───────────────────────────────────────────────────────────────────

fn cmd_quote(fees: Fees, amount: u64, with_affiliate: bool, json_output: bool) -> Result<()> {
    let rates = FeeRateConfig::new(fees.goodwill_bps, fees.affiliate_split_bps).map_err(|e| {
        anyhow!(
            "{e}.\n  Goodwill must be 0–{MAX_GOODWILL_BPS} bps and the affiliate split \
             0–{MAX_AFFILIATE_SPLIT_BPS} bps."
        )
    })?;
    let split = fee_math::split(amount, rates, with_affiliate).context("fee math")?;

    if json_output {
        println!("{}", json!({
            "status":              "ok",
            "command":             "quote",
            "amount":              amount,
            "goodwill_bps":        rates.goodwill_bps,
            "affiliate_split_bps": rates.affiliate_split_bps,
            "with_affiliate":      with_affiliate,
            "goodwill":            split.goodwill,
            "affiliate_share":     split.affiliate_share,
            "retained":            split.retained,
            "net":                 split.net,
        }));
    } else {
        println!("─── Goodwill Quote ───────────────────────────────────────────────");
        println!("  Amount           {:>20}", amount);
        println!("  Goodwill         {:>20}  ({:.2}%  →  vault)",
                 split.goodwill, rates.goodwill_bps as f64 / 100.0);
        println!("    Affiliate      {:>20}  ({:.2}% of goodwill)",
                 split.affiliate_share, rates.affiliate_split_bps as f64 / 100.0);
        println!("    Retained       {:>20}", split.retained);
        println!("  Net to flow      {:>20}", split.net);
        if !with_affiliate {
            println!();
            println!("  No affiliate: the whole goodwill stays in the retained balance.");
        }
    }
    Ok(())
}

// ─── simulate ────────────────────────────────────────────────────────────────

fn cmd_simulate(cli: &Cli, path: &Path, json_output: bool) -> Result<()> {
    let scenario = Scenario::load(path)?;
    let fees = fees_from(cli, scenario.fees);
    let mut sim = Simulation::build(&scenario, fees)
        .with_context(|| format!("cannot set up '{}'", path.display()))?;
    let outcomes = sim.run(&scenario.steps);

    if json_output {
        let mut report = sim.report(&outcomes);
        report["status"] = json!("ok");
        report["command"] = json!("simulate");
        report["goodwill_bps"] = json!(fees.goodwill_bps);
        report["affiliate_split_bps"] = json!(fees.affiliate_split_bps);
        println!("{report}");
        return Ok(());
    }

    println!("─── Simulation ───────────────────────────────────────────────────");
    println!("  Scenario   {}", path.display());
    println!("  Goodwill   {} bps   Affiliate split  {} bps",
             fees.goodwill_bps, fees.affiliate_split_bps);
    println!();
    println!("  ─── Steps ────────────────────────────────────────");
    for outcome in &outcomes {
        match &outcome.result {
            Ok(detail) => println!("  #{:<3} {:<9} ok        {detail}", outcome.index, outcome.kind),
            Err(e) => println!("  #{:<3} {:<9} reverted  {e}", outcome.index, outcome.kind),
        }
    }

    println!();
    println!("  ─── Events ───────────────────────────────────────");
    for record in sim.runtime().events() {
        println!("  {:<12} {}", sim.label_of(&record.emitter), record.to_json()["event"]);
    }

    println!();
    println!("  ─── Fee Books ────────────────────────────────────");
    let audits = sim.audits();
    if audits.is_empty() {
        println!("  No goodwill skimmed.");
    }
    for (asset, audit) in audits {
        println!("  {asset}");
        println!("    Custody        {:>20}", audit.custody);
        println!("    Owed           {:>20}", audit.liabilities);
        println!("    Skimmed        {:>20}", audit.totals.skimmed);
        println!("    Claimed        {:>20}", audit.totals.claimed);
        println!("    Swept          {:>20}", audit.totals.swept);
        println!("    Balanced       {:>20}", if audit.balanced() { "yes" } else { "NO" });
    }
    Ok(())
}
