//! NCD Exit CLI
//!
//! Quote, confirm and commit investor exits against a JSON data directory

use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use ncd_exit::exit::{ExitOutcome, ExitPlan, ExitWorkflow};
use ncd_exit::series::load_lock_in_rules;
use ncd_exit::{InvestorStore, JsonStore, JsonlAuditSink, LockInRules, RefundCalculator, RefundPolicy, SeriesStore};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ncd-exit", version, about = "Lock-in refund quotes and investor exits for NCD series")]
struct Cli {
    /// Directory holding investors.json and series.json
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    /// Evaluation date (YYYY-MM-DD), defaults to today
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,

    /// Refund policy JSON (penaltyRate, defaultLockInMonths, monthRule)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// CSV of lock-in overrides (SeriesId,LockInMonths)
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Audit log file, defaults to <data-dir>/audit.jsonl
    #[arg(long, global = true)]
    audit_log: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the refund plan as JSON without changing anything
    Quote {
        investor_id: String,
        /// Limit the quote to one series
        #[arg(long)]
        series: Option<String>,
    },
    /// Exit an investor from one series
    Exit {
        investor_id: String,
        series_id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Exit every holding and delete the investor
    Delete {
        investor_id: String,
        #[arg(long)]
        yes: bool,
    },
    /// Show active holdings and series status
    Holdings { investor_id: String },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let as_of = cli.as_of.unwrap_or_else(|| Local::now().date_naive());

    let policy = RefundPolicy::load(cli.config.as_deref()).context("Failed to load refund policy")?;
    let overrides = match &cli.rules {
        Some(path) => load_lock_in_rules(path)
            .map_err(|e| anyhow!("Failed to load lock-in rules from {}: {}", path.display(), e))?,
        None => LockInRules::new(),
    };

    let store = JsonStore::open(&cli.data_dir)
        .with_context(|| format!("Failed to open data directory {}", cli.data_dir.display()))?;
    let audit_path = cli.audit_log.clone().unwrap_or_else(|| cli.data_dir.join("audit.jsonl"));
    let mut workflow = ExitWorkflow::new(store, JsonlAuditSink::new(audit_path), RefundCalculator::new(policy))
        .with_rule_overrides(overrides);

    match cli.command {
        Command::Quote { investor_id, series } => {
            let plan = match series {
                Some(series_id) => workflow.plan_series_exit(&investor_id, &series_id, as_of)?,
                None => workflow.plan_investor_deletion(&investor_id, as_of)?,
            };
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Command::Exit { investor_id, series_id, yes } => {
            let plan = workflow.plan_series_exit(&investor_id, &series_id, as_of)?;
            run_exit(&mut workflow, plan, yes)?;
        }
        Command::Delete { investor_id, yes } => {
            let plan = workflow.plan_investor_deletion(&investor_id, as_of)?;
            run_exit(&mut workflow, plan, yes)?;
        }
        Command::Holdings { investor_id } => {
            print_holdings(workflow.store(), &investor_id, as_of)?;
        }
    }

    Ok(())
}

fn run_exit(workflow: &mut ExitWorkflow<JsonStore, JsonlAuditSink>, plan: ExitPlan, yes: bool) -> Result<()> {
    let mut prompt = |plan: &ExitPlan| -> bool {
        println!("{}\n", plan);
        if yes {
            return true;
        }
        print!("Proceed with this exit? [y/N] ");
        io::stdout().flush().ok();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    };

    match workflow.execute(plan, &mut prompt)? {
        ExitOutcome::Declined => println!("Cancelled; nothing was changed."),
        ExitOutcome::Committed(receipt) => {
            println!("Exit committed for {} ({}).", receipt.investor.name, receipt.investor.id);
            println!("  Refund due:  {}", receipt.summary.total_refund);
            println!("  Penalty:     {}", receipt.summary.total_penalty);
            for series in &receipt.series {
                println!(
                    "  {}: funds raised {}, investors {}",
                    series.name, series.funds_raised, series.investor_count
                );
            }
        }
    }
    Ok(())
}

fn print_holdings(store: &JsonStore, investor_id: &str, as_of: NaiveDate) -> Result<()> {
    let investor = store.get_investor(investor_id)?;
    println!("{} ({}) - KYC {:?}, {:?}", investor.name, investor.id, investor.kyc_status, investor.status);
    println!("{:<24} {:>16} {:>6} {:>10}", "Series", "Amount", "Count", "Status");
    println!("{}", "-".repeat(59));

    for holding in investor.holdings() {
        let (name, status) = match store.get_series(&holding.series_id) {
            Ok(series) => (series.name.clone(), format!("{:?}", series.status(as_of))),
            Err(_) => (holding.series_id.clone(), "Unknown".to_string()),
        };
        println!("{:<24} {:>16} {:>6} {:>10}", name, holding.amount, holding.investment_count, status);
    }

    println!("{}", "-".repeat(59));
    println!("Total active: {}", investor.active_principal());
    Ok(())
}
