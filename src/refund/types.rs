//! Computed refund results. Never persisted; recomputed on every request.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Refund outcome for one investment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundLineItem {
    pub series_id: String,

    /// Date the investment was made (for display)
    pub invested_at: NaiveDate,

    /// Principal originally invested
    pub original_amount: Decimal,

    pub months_elapsed: u32,

    /// Lock-in months required by the series
    pub months_required: u32,

    pub lock_in_satisfied: bool,

    /// Rate applied; zero when lock-in is satisfied
    pub penalty_rate: Decimal,

    pub penalty_amount: Decimal,

    /// original_amount - penalty_amount
    pub refund_amount: Decimal,
}

/// Per-investor refund across all investments being exited
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundSummary {
    /// One entry per exited investment, in input order
    pub line_items: Vec<RefundLineItem>,
    pub total_refund: Decimal,
    pub total_penalty: Decimal,
}

impl RefundSummary {
    /// Build a summary from line items, totalling exactly
    pub fn from_line_items(line_items: Vec<RefundLineItem>) -> Self {
        let total_refund = line_items.iter().map(|item| item.refund_amount).sum();
        let total_penalty = line_items.iter().map(|item| item.penalty_amount).sum();
        Self { line_items, total_refund, total_penalty }
    }

    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }

    /// Sum of principal leaving the series pools
    pub fn total_original(&self) -> Decimal {
        self.line_items.iter().map(|item| item.original_amount).sum()
    }

    /// Distinct series touched, in order of first appearance
    pub fn series_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for item in &self.line_items {
            if !ids.contains(&item.series_id.as_str()) {
                ids.push(&item.series_id);
            }
        }
        ids
    }

    /// Group line items per series for the confirmation display
    pub fn series_breakdown(&self) -> Vec<SeriesBreakdown> {
        self.series_ids()
            .into_iter()
            .map(|series_id| {
                let items: Vec<&RefundLineItem> = self
                    .line_items
                    .iter()
                    .filter(|item| item.series_id == series_id)
                    .collect();
                SeriesBreakdown {
                    series_id: series_id.to_string(),
                    original_amount: items.iter().map(|i| i.original_amount).sum(),
                    penalty_amount: items.iter().map(|i| i.penalty_amount).sum(),
                    refund_amount: items.iter().map(|i| i.refund_amount).sum(),
                    min_months_elapsed: items.iter().map(|i| i.months_elapsed).min().unwrap_or(0),
                    months_required: items.iter().map(|i| i.months_required).max().unwrap_or(0),
                    investment_count: items.len() as u32,
                }
            })
            .collect()
    }
}

/// Line items of one series rolled up for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesBreakdown {
    pub series_id: String,
    pub original_amount: Decimal,
    pub penalty_amount: Decimal,
    pub refund_amount: Decimal,
    /// Shortest holding among the series' investments
    pub min_months_elapsed: u32,
    pub months_required: u32,
    pub investment_count: u32,
}

/// Change to one series' aggregates caused by an exit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesAdjustment {
    pub series_id: String,
    /// Original principal leaving the pool
    pub funds_released: Decimal,
    /// Investors leaving the series (one per investor, not per investment)
    pub investors_leaving: u32,
}
