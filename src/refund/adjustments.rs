//! Series aggregate adjustments driven by a refund summary

use super::types::{RefundSummary, SeriesAdjustment};
use crate::series::SeriesAggregate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// One adjustment per distinct series in the summary, in order of first appearance.
///
/// Funds released are the full original principal. Each series loses exactly
/// one investor however many investment records the investor held in it.
pub fn series_adjustments(summary: &RefundSummary) -> Vec<SeriesAdjustment> {
    summary
        .series_ids()
        .into_iter()
        .map(|series_id| SeriesAdjustment {
            series_id: series_id.to_string(),
            funds_released: summary
                .line_items
                .iter()
                .filter(|item| item.series_id == series_id)
                .map(|item| item.original_amount)
                .sum(),
            investors_leaving: 1,
        })
        .collect()
}

/// Apply one adjustment to an aggregate, flooring both counters at zero
pub fn adjust_aggregate(aggregate: SeriesAggregate, adjustment: &SeriesAdjustment) -> SeriesAggregate {
    let funds_raised = (aggregate.funds_raised - adjustment.funds_released).max(Decimal::ZERO);
    let investor_count = aggregate.investor_count.saturating_sub(adjustment.investors_leaving);

    if funds_raised.is_zero() && aggregate.funds_raised < adjustment.funds_released {
        log::warn!(
            "Series {} funds raised {} is below released principal {}; clamped to zero",
            adjustment.series_id,
            aggregate.funds_raised,
            adjustment.funds_released
        );
    }

    SeriesAggregate { funds_raised, investor_count }
}

/// Return updated aggregates after the summary's exits.
///
/// Series absent from `aggregates` are skipped; untouched series pass through.
pub fn apply_series_adjustments(
    summary: &RefundSummary,
    aggregates: &BTreeMap<String, SeriesAggregate>,
) -> BTreeMap<String, SeriesAggregate> {
    let mut updated = aggregates.clone();

    for adjustment in series_adjustments(summary) {
        match updated.get_mut(&adjustment.series_id) {
            Some(aggregate) => *aggregate = adjust_aggregate(*aggregate, &adjustment),
            None => log::warn!("No aggregate for series {}; adjustment skipped", adjustment.series_id),
        }
    }

    updated
}
