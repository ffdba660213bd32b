//! Lock-in refund calculator
//!
//! Pure computation: no I/O and no clock reads. The evaluation date is always
//! passed in, so identical inputs give identical summaries.

use super::elapsed::months_elapsed;
use super::policy::RefundPolicy;
use super::types::{RefundLineItem, RefundSummary};
use crate::error::RefundError;
use crate::investor::Investment;
use crate::series::{LockInRules, SeriesLockInRule};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places of the currency's minor unit
pub const MONEY_DP: u32 = 2;

/// Refund calculator configured with a refund policy
#[derive(Debug, Clone, Copy, Default)]
pub struct RefundCalculator {
    policy: RefundPolicy,
}

impl RefundCalculator {
    pub fn new(policy: RefundPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RefundPolicy {
        &self.policy
    }

    /// Refund for a single investment under `rule`, evaluated at `as_of`
    pub fn compute_line_item(
        &self,
        investment: &Investment,
        rule: &SeriesLockInRule,
        as_of: NaiveDate,
    ) -> Result<RefundLineItem, RefundError> {
        validate(investment)?;

        let elapsed = months_elapsed(self.policy.month_rule, investment.invested_at, as_of);
        let lock_in_satisfied = elapsed >= rule.lock_in_months;

        let penalty_rate = if lock_in_satisfied { Decimal::ZERO } else { self.policy.penalty_rate };
        let penalty_amount = penalty_for(investment.amount, penalty_rate);

        Ok(RefundLineItem {
            series_id: investment.series_id.clone(),
            invested_at: investment.invested_at,
            original_amount: investment.amount,
            months_elapsed: elapsed,
            months_required: rule.lock_in_months,
            lock_in_satisfied,
            penalty_rate,
            penalty_amount,
            refund_amount: investment.amount - penalty_amount,
        })
    }

    /// Refund across one investor's investments.
    ///
    /// Already-exited investments are skipped. Series without a rule use the
    /// policy's default lock-in.
    pub fn compute_summary(
        &self,
        investments: &[Investment],
        rules: &LockInRules,
        as_of: NaiveDate,
    ) -> Result<RefundSummary, RefundError> {
        let mut line_items = Vec::with_capacity(investments.len());

        for investment in investments.iter().filter(|inv| !inv.is_exited()) {
            let rule = match rules.get(&investment.series_id) {
                Some(rule) => rule.clone(),
                None => {
                    log::debug!(
                        "No lock-in rule for series {}, using default of {} months",
                        investment.series_id,
                        self.policy.default_lock_in_months
                    );
                    SeriesLockInRule::new(investment.series_id.clone(), self.policy.default_lock_in_months)
                }
            };
            line_items.push(self.compute_line_item(investment, &rule, as_of)?);
        }

        let summary = RefundSummary::from_line_items(line_items);
        log::debug!(
            "Refund summary as of {}: {} line items, refund {}, penalty {}",
            as_of,
            summary.line_items.len(),
            summary.total_refund,
            summary.total_penalty
        );
        Ok(summary)
    }
}

fn validate(investment: &Investment) -> Result<(), RefundError> {
    if investment.series_id.trim().is_empty() {
        return Err(RefundError::MissingSeriesId {
            amount: investment.amount,
            invested_at: investment.invested_at,
        });
    }
    if investment.amount < Decimal::ZERO {
        return Err(RefundError::NegativeAmount {
            series_id: investment.series_id.clone(),
            amount: investment.amount,
        });
    }
    Ok(())
}

/// amount * rate rounded half-up to the minor unit, kept within [0, amount]
fn penalty_for(amount: Decimal, rate: Decimal) -> Decimal {
    if rate.is_zero() {
        return Decimal::ZERO;
    }
    (amount * rate)
        .round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
        .clamp(Decimal::ZERO, amount)
}
