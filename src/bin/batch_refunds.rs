//! Quote a full-exit refund for every active investor in a data directory
//!
//! Outputs one CSV row per investor for reconciliation.
//! Accepts config via environment variables:
//!   DATA_DIR (default: data), AS_OF (YYYY-MM-DD, default: today),
//!   OUTPUT (default: refund_quotes.csv), plus the NCD_* refund policy overrides

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use ncd_exit::{InvestorStore, JsonStore, LockInRules, RefundCalculator, RefundPolicy, SeriesStore};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use std::env;
use std::time::Instant;

#[derive(Debug, Serialize)]
struct QuoteRow {
    #[serde(rename = "InvestorId")]
    investor_id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Investments")]
    investments: usize,
    #[serde(rename = "EarlyExits")]
    early_exits: usize,
    #[serde(rename = "Original")]
    original: Decimal,
    #[serde(rename = "Penalty")]
    penalty: Decimal,
    #[serde(rename = "Refund")]
    refund: Decimal,
}

fn main() -> Result<()> {
    env_logger::init();

    let start = Instant::now();
    let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());
    let output_path = env::var("OUTPUT").unwrap_or_else(|_| "refund_quotes.csv".to_string());
    let as_of: NaiveDate = match env::var("AS_OF") {
        Ok(s) => s.parse().with_context(|| format!("AS_OF is not a date: {}", s))?,
        Err(_) => Local::now().date_naive(),
    };

    let policy = RefundPolicy::load(None)?;
    let calculator = RefundCalculator::new(policy);

    let store = JsonStore::open(&data_dir)?;
    let investors: Vec<_> = store.list_investors()?.into_iter().filter(|i| i.is_active()).collect();
    let series = store.list_series()?;
    let rules = LockInRules::from_series(&series, policy.default_lock_in_months);
    println!("Loaded {} active investors and {} series in {:?}", investors.len(), series.len(), start.elapsed());

    // Quote in parallel; an investor with bad data is skipped, not fatal
    let quote_start = Instant::now();
    let mut rows: Vec<QuoteRow> = investors
        .par_iter()
        .filter_map(|investor| {
            match calculator.compute_summary(&investor.investments, &rules, as_of) {
                Ok(summary) => Some(QuoteRow {
                    investor_id: investor.id.clone(),
                    name: investor.name.clone(),
                    investments: summary.line_items.len(),
                    early_exits: summary.line_items.iter().filter(|i| !i.lock_in_satisfied).count(),
                    original: summary.total_original(),
                    penalty: summary.total_penalty,
                    refund: summary.total_refund,
                }),
                Err(err) => {
                    log::warn!("Skipping investor {}: {}", investor.id, err);
                    None
                }
            }
        })
        .collect();
    rows.sort_by(|a, b| a.investor_id.cmp(&b.investor_id));
    println!("Quoted {} investors in {:?}", rows.len(), quote_start.elapsed());

    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("Failed to create {}", output_path))?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    let total_refund: Decimal = rows.iter().map(|r| r.refund).sum();
    let total_penalty: Decimal = rows.iter().map(|r| r.penalty).sum();

    println!("\nBlock Summary (as of {}):", as_of);
    println!("  Investors:     {}", rows.len());
    println!("  Total refund:  {}", total_refund);
    println!("  Total penalty: {}", total_penalty);
    println!("Output written to {}", output_path);
    println!("\nTotal time: {:?}", start.elapsed());

    Ok(())
}
