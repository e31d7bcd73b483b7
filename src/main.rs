//! CLI entry point for the rankfolio engine.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use log::{info, warn};

use rankfolio::api::{self, PlanRequest, PlanResponse, RebalanceResponse};
use rankfolio::audit::{self, AuditLog};
use rankfolio::config::EngineConfig;
use rankfolio::error::Error;
use rankfolio::holdings::HoldingsFile;
use rankfolio::rebalance::Mode;
use rankfolio::universe::UniverseSnapshot;

#[derive(Parser)]
#[command(name = "rankfolio")]
#[command(about = "Rank-band portfolio allocation and rebalancing engine")]
#[command(version)]
struct Cli {
    /// Path to rankfolio.toml (defaults apply when absent)
    #[arg(long, default_value = "rankfolio.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute an integer-share allocation for a cash amount
    Plan {
        /// Path to universe.json (ranked snapshot)
        universe: PathBuf,

        /// Amount to invest, in dollars
        #[arg(long)]
        amount: f64,

        /// Ticker to exclude from the universe (repeatable)
        #[arg(long = "exclude")]
        excluded: Vec<String>,

        /// Ticker to force in with one share even if too expensive (repeatable)
        #[arg(long = "force")]
        forced: Vec<String>,

        /// Print the response as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Compute sell/hold/buy decisions for an existing book
    Rebalance {
        /// Path to universe.json (ranked snapshot)
        universe: PathBuf,

        /// Path to holdings.json (current book)
        holdings: PathBuf,

        /// Fresh capital to deploy, in dollars
        #[arg(long, default_value_t = 0.0)]
        new_investment: f64,

        /// Never sell; fund buys from new capital only
        #[arg(long)]
        add_only: bool,

        /// Print the response as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Estimate transaction costs for a given turnover
    Costs {
        /// Total turnover (buys + sells), in dollars
        #[arg(long)]
        turnover: f64,

        /// Number of trades
        #[arg(long)]
        trades: usize,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match EngineConfig::load_or_default(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Plan {
            universe,
            amount,
            excluded,
            forced,
            json,
        } => run_plan(&config, &universe, amount, excluded, forced, json),
        Command::Rebalance {
            universe,
            holdings,
            new_investment,
            add_only,
            json,
        } => run_rebalance(&config, &universe, &holdings, new_investment, add_only, json),
        Command::Costs { turnover, trades } => run_costs(&config, turnover, trades),
    };

    if let Err(e) = result {
        match &e {
            Error::InvalidBudget(_) | Error::InvalidCapital(_) | Error::DuplicateRank(_) => {
                eprintln!("Rejected: {e}");
                process::exit(2);
            }
            _ => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }
}

fn run_plan(
    config: &EngineConfig,
    universe_path: &Path,
    amount: f64,
    excluded: Vec<String>,
    forced: Vec<String>,
    json: bool,
) -> rankfolio::Result<()> {
    let snapshot = UniverseSnapshot::load(universe_path)?;
    let assets = snapshot.to_assets();
    info!(
        "loaded {} ranked assets from {} (snapshot {})",
        assets.len(),
        universe_path.display(),
        snapshot.timestamp
    );

    let request = PlanRequest {
        amount,
        excluded_tickers: excluded,
        forced_tickers: forced,
    };
    let response = api::plan(&assets, config, &request)?;

    let mut audit_log = AuditLog::open(&config.audit_path())?;
    audit::log_plan(&mut audit_log, &universe_path.display().to_string(), &response)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }
    display_plan(amount, &response);
    Ok(())
}

fn display_plan(amount: f64, response: &PlanResponse) {
    println!("Allocation plan for ${amount:.2}:\n");
    println!(
        "{:<8} {:>4} {:>7} {:>10} {:>12} {:>8} {:>8}",
        "TICKER", "RANK", "SHARES", "PRICE", "AMOUNT", "TARGET", "ACTUAL"
    );
    for line in &response.allocations {
        println!(
            "{:<8} {:>4} {:>7} {:>10.2} {:>12.2} {:>7.1}% {:>7.1}%",
            line.ticker,
            line.rank,
            line.shares,
            line.price,
            line.amount,
            line.target_weight * 100.0,
            line.actual_weight * 100.0,
        );
    }
    println!(
        "\nInvested ${:.2}, cash remaining ${:.2} ({:.1}% utilized, max deviation {:.2}%)",
        response.summary.total_invested,
        response.summary.cash_remaining,
        response.summary.utilization * 100.0,
        response.summary.max_deviation * 100.0,
    );

    for warning in &response.warnings {
        warn!("{warning}");
    }

    if !response.optimal_amounts.is_empty() {
        println!("\nNearby amounts that fit better:");
        for opt in &response.optimal_amounts {
            println!(
                "  ${:.2} (max deviation {:.2}%)",
                opt.amount,
                opt.max_deviation * 100.0
            );
        }
    }

    if !response.substitutes.is_empty() {
        println!("\nNext-band substitutes:");
        for sub in &response.substitutes {
            println!(
                "  #{:<3} {:<8} {} (${:.2})",
                sub.rank, sub.ticker, sub.name, sub.price
            );
        }
    }
}

fn run_rebalance(
    config: &EngineConfig,
    universe_path: &Path,
    holdings_path: &Path,
    new_investment: f64,
    add_only: bool,
    json: bool,
) -> rankfolio::Result<()> {
    let snapshot = UniverseSnapshot::load(universe_path)?;
    let assets = snapshot.to_assets();
    let holdings = HoldingsFile::load(holdings_path)?.to_holdings();
    info!(
        "loaded {} ranked assets and {} holdings",
        assets.len(),
        holdings.len()
    );

    let mode = if add_only { Mode::AddOnly } else { Mode::Full };
    let new_capital_cents = (new_investment * 100.0).round() as i64;
    let response = api::rebalance_holdings(&assets, config, &holdings, new_capital_cents, mode)?;

    let mut audit_log = AuditLog::open(&config.audit_path())?;
    audit::log_rebalance(&mut audit_log, &universe_path.display().to_string(), &response)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }
    display_rebalance(mode, &response);
    Ok(())
}

fn display_rebalance(mode: Mode, response: &RebalanceResponse) {
    println!("Rebalance plan ({mode}):\n");

    if response.sell.is_empty() {
        println!("Nothing to sell.");
    } else {
        println!("SELL:");
        for sell in &response.sell {
            println!(
                "  {:<8} {:>6} shares  ${:>12.2}  [{}]",
                sell.ticker, sell.shares, sell.proceeds, sell.reason
            );
        }
    }

    if response.buy.is_empty() {
        println!("Nothing to buy.");
    } else {
        println!("BUY:");
        for buy in &response.buy {
            println!(
                "  {:<8} {:>6} shares  ${:>12.2}  [{}]",
                buy.ticker, buy.shares, buy.amount, buy.reason
            );
        }
    }

    println!("\nFinal portfolio:");
    for line in &response.final_portfolio {
        match line.rank {
            Some(rank) => println!("  #{:<3} {:<8} {:>6} shares", rank, line.ticker, line.shares),
            None => println!("  #--  {:<8} {:>6} shares", line.ticker, line.shares),
        }
    }

    println!(
        "\nProceeds ${:.2} + new capital ${:.2} -> invested ${:.2}",
        response.summary.proceeds, response.summary.new_investment, response.summary.invested,
    );
    println!(
        "Estimated costs: ${:.2} fee + ${:.2} spread = ${:.2}",
        response.summary.costs.fee, response.summary.costs.spread, response.summary.costs.total,
    );
    println!(
        "Max drift {:.1}% -> {} urgency",
        response.max_drift * 100.0,
        response.drift_recommendation
    );

    for warning in &response.warnings {
        warn!("{warning}");
    }
}

fn run_costs(config: &EngineConfig, turnover: f64, trades: usize) -> rankfolio::Result<()> {
    if turnover < 0.0 {
        return Err(Error::Config("turnover must be >= 0".into()));
    }
    let turnover_cents = (turnover * 100.0).round() as i64;
    let costs = config.cost_params().estimate(turnover_cents, trades);
    println!("{costs}");
    Ok(())
}
