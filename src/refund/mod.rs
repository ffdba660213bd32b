//! Lock-in refund calculation
//!
//! Given an investor's investments, the series lock-in rules and an evaluation
//! date, the calculator produces per-investment line items:
//! - **Months elapsed**: whole months since investment (30-day or calendar rule)
//! - **Lock-in check**: satisfied when months elapsed reach the series lock-in
//! - **Penalty**: policy rate (2% by default) on early exits, rounded half-up
//! - **Refund**: original principal less penalty
//!
//! Series aggregates (funds raised, investor count) are then adjusted from the
//! summary. Everything here is pure; persistence lives in the exit workflow.
//!
//! # Example
//!
//! ```rust,ignore
//! use ncd_exit::refund::{RefundCalculator, RefundPolicy};
//!
//! let calculator = RefundCalculator::new(RefundPolicy::default());
//! let summary = calculator.compute_summary(&investor.investments, &rules, as_of)?;
//! println!("Refund: {} (penalty {})", summary.total_refund, summary.total_penalty);
//! ```

mod types;
mod elapsed;
mod policy;
mod calculator;
mod adjustments;

pub use types::{RefundLineItem, RefundSummary, SeriesBreakdown, SeriesAdjustment};
pub use elapsed::{months_elapsed, DAYS_PER_MONTH};
pub use policy::{RefundPolicy, MonthRule, DEFAULT_PENALTY_RATE};
pub use calculator::{RefundCalculator, MONEY_DP};
pub use adjustments::{series_adjustments, adjust_aggregate, apply_series_adjustments};

use crate::series::SeriesAggregate;
use std::collections::BTreeMap;

impl RefundCalculator {
    /// Updated series aggregates after the exits in `summary`
    pub fn apply_series_adjustments(
        &self,
        summary: &RefundSummary,
        aggregates: &BTreeMap<String, SeriesAggregate>,
    ) -> BTreeMap<String, SeriesAggregate> {
        apply_series_adjustments(summary, aggregates)
    }
}
