//! Exit workflow: plan, confirm, commit, audit
//!
//! Reads records from the stores, runs the pure refund calculator, shows the
//! plan to a confirmation step, then writes one investor update and one update
//! per affected series. A failed series write restores whatever was already
//! written. The audit record is emitted last and never fails the exit.

use crate::audit::{record_best_effort, AuditAction, AuditEvent, AuditSink};
use crate::error::ExitError;
use crate::investor::{Investment, Investor, InvestorStatus};
use crate::refund::{adjust_aggregate, series_adjustments, RefundCalculator, RefundSummary, SeriesAdjustment};
use crate::series::{LockInRules, Series, SeriesAggregate};
use crate::store::{InvestorPatch, InvestorStore, SeriesPatch, SeriesStore};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;

/// Which of the investor's holdings are being exited
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ExitScope {
    /// Every active investment; the investor is soft-deleted
    Investor,
    /// Every active investment in one series
    #[serde(rename_all = "camelCase")]
    Series { series_id: String },
}

impl ExitScope {
    fn covers(&self, series_id: &str) -> bool {
        match self {
            ExitScope::Investor => true,
            ExitScope::Series { series_id: target } => target == series_id,
        }
    }
}

/// Everything the operator sees before confirming an exit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitPlan {
    pub investor_id: String,
    pub investor_name: String,
    pub scope: ExitScope,
    pub as_of: NaiveDate,
    /// Active investments in scope when the plan was prepared
    pub investments: Vec<Investment>,
    pub summary: RefundSummary,
    pub adjustments: Vec<SeriesAdjustment>,
    /// Aggregates each affected series will have after the exit
    pub series_after: BTreeMap<String, SeriesAggregate>,
    pub series_names: BTreeMap<String, String>,
}

impl ExitPlan {
    /// True while the investor's in-scope active investments are exactly the
    /// ones this plan was computed from
    fn matches(&self, investor: &Investor) -> bool {
        if !investor.is_active() {
            return false;
        }
        let current: Vec<&Investment> = investor
            .active_investments()
            .filter(|inv| self.scope.covers(&inv.series_id))
            .collect();
        current.len() == self.investments.len() && current.iter().zip(&self.investments).all(|(a, b)| *a == b)
    }
}

impl fmt::Display for ExitPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            ExitScope::Investor => writeln!(f, "Delete investor {} ({})", self.investor_name, self.investor_id)?,
            ExitScope::Series { series_id } => writeln!(
                f,
                "Exit {} ({}) from series {}",
                self.investor_name, self.investor_id, series_id
            )?,
        }
        writeln!(f, "Evaluated as of {}", self.as_of)?;
        writeln!(
            f,
            "{:<24} {:>5} {:>16} {:>9} {:>14} {:>16}",
            "Series", "Count", "Original", "Months", "Penalty", "Refund"
        )?;
        writeln!(f, "{}", "-".repeat(89))?;

        // Months shows the shortest holding against the series lock-in
        for row in self.summary.series_breakdown() {
            let name = self.series_names.get(&row.series_id).unwrap_or(&row.series_id);
            writeln!(
                f,
                "{:<24} {:>5} {:>16} {:>9} {:>14} {:>16}",
                name,
                row.investment_count,
                row.original_amount,
                format!("{}/{}", row.min_months_elapsed, row.months_required),
                row.penalty_amount,
                row.refund_amount
            )?;
        }

        writeln!(f, "{}", "-".repeat(89))?;
        writeln!(f, "Total penalty: {}", self.summary.total_penalty)?;
        write!(f, "Total refund:  {}", self.summary.total_refund)
    }
}

/// Operator decision on a plan. Closures returning `bool` work directly.
pub trait Confirmation {
    fn confirm(&mut self, plan: &ExitPlan) -> bool;
}

impl<F> Confirmation for F
where
    F: FnMut(&ExitPlan) -> bool,
{
    fn confirm(&mut self, plan: &ExitPlan) -> bool {
        self(plan)
    }
}

/// Records as stored after a committed exit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitReceipt {
    pub investor: Investor,
    pub series: Vec<Series>,
    pub summary: RefundSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExitOutcome {
    /// Operator declined; nothing was written
    Declined,
    Committed(ExitReceipt),
}

/// Drives exits against a store and an audit sink
pub struct ExitWorkflow<S, A> {
    store: S,
    audit: A,
    calculator: RefundCalculator,
    rule_overrides: LockInRules,
}

impl<S, A> ExitWorkflow<S, A>
where
    S: InvestorStore + SeriesStore,
    A: AuditSink,
{
    pub fn new(store: S, audit: A, calculator: RefundCalculator) -> Self {
        Self {
            store,
            audit,
            calculator,
            rule_overrides: LockInRules::new(),
        }
    }

    /// Lock-in rules that take precedence over the series records
    pub fn with_rule_overrides(mut self, overrides: LockInRules) -> Self {
        self.rule_overrides = overrides;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn audit(&self) -> &A {
        &self.audit
    }

    /// Plan exiting every active investment and soft-deleting the investor
    pub fn plan_investor_deletion(&self, investor_id: &str, as_of: NaiveDate) -> Result<ExitPlan, ExitError> {
        let investor = self.store.get_investor(investor_id)?;
        if !investor.is_active() {
            return Err(ExitError::NothingToExit { investor_id: investor.id });
        }
        self.plan(investor, ExitScope::Investor, as_of)
    }

    /// Plan exiting the investor's active investments in one series
    pub fn plan_series_exit(
        &self,
        investor_id: &str,
        series_id: &str,
        as_of: NaiveDate,
    ) -> Result<ExitPlan, ExitError> {
        let investor = self.store.get_investor(investor_id)?;
        if investor.active_in_series(series_id).next().is_none() {
            return Err(ExitError::NothingToExit { investor_id: investor.id });
        }
        self.plan(investor, ExitScope::Series { series_id: series_id.to_string() }, as_of)
    }

    fn plan(&self, investor: Investor, scope: ExitScope, as_of: NaiveDate) -> Result<ExitPlan, ExitError> {
        let in_scope: Vec<_> = investor
            .active_investments()
            .filter(|inv| scope.covers(&inv.series_id))
            .cloned()
            .collect();

        let mut series: Vec<Series> = Vec::new();
        for inv in &in_scope {
            if !series.iter().any(|s| s.id == inv.series_id) {
                series.push(self.store.get_series(&inv.series_id)?);
            }
        }

        let mut rules = LockInRules::from_series(&series, self.calculator.policy().default_lock_in_months);
        rules.merge(&self.rule_overrides);

        let summary = self.calculator.compute_summary(&in_scope, &rules, as_of)?;
        let adjustments = series_adjustments(&summary);
        let aggregates: BTreeMap<String, SeriesAggregate> =
            series.iter().map(|s| (s.id.clone(), s.aggregate())).collect();
        let series_after = self.calculator.apply_series_adjustments(&summary, &aggregates);
        let series_names = series.iter().map(|s| (s.id.clone(), s.name.clone())).collect();

        log::debug!(
            "Planned {:?} exit for investor {}: {} investments, refund {}",
            scope,
            investor.id,
            summary.line_items.len(),
            summary.total_refund
        );

        Ok(ExitPlan {
            investor_id: investor.id,
            investor_name: investor.name,
            scope,
            as_of,
            investments: in_scope,
            summary,
            adjustments,
            series_after,
            series_names,
        })
    }

    /// Ask for confirmation, then commit. A decline discards the plan.
    pub fn execute<C>(&mut self, plan: ExitPlan, confirmation: &mut C) -> Result<ExitOutcome, ExitError>
    where
        C: Confirmation + ?Sized,
    {
        if !confirmation.confirm(&plan) {
            log::info!("Exit for investor {} declined by operator", plan.investor_id);
            return Ok(ExitOutcome::Declined);
        }
        self.commit(&plan).map(ExitOutcome::Committed)
    }

    /// Write the investor and series updates for a confirmed plan.
    ///
    /// Fails with `ExitError::Stale` if the investor no longer holds exactly
    /// the investments the plan was computed from, which also rejects
    /// committing the same plan twice.
    pub fn commit(&mut self, plan: &ExitPlan) -> Result<ExitReceipt, ExitError> {
        // Read everything first so a missing record aborts before any write
        let investor_before = self.store.get_investor(&plan.investor_id)?;
        if !plan.matches(&investor_before) {
            log::warn!("Exit plan for investor {} no longer matches the stored record", plan.investor_id);
            return Err(ExitError::Stale { investor_id: plan.investor_id.clone() });
        }
        let mut series_before = Vec::with_capacity(plan.adjustments.len());
        for adjustment in &plan.adjustments {
            series_before.push(self.store.get_series(&adjustment.series_id)?);
        }

        let investor_patch = investor_exit_patch(&investor_before, plan);
        let investor_after = self
            .store
            .update_investor(&plan.investor_id, &investor_patch)
            .map_err(ExitError::Persistence)?;

        let mut series_after: Vec<Series> = Vec::with_capacity(series_before.len());
        for (before, adjustment) in series_before.iter().zip(&plan.adjustments) {
            let patch = SeriesPatch::from_aggregate(adjust_aggregate(before.aggregate(), adjustment));
            match self.store.update_series(&before.id, &patch) {
                Ok(updated) => series_after.push(updated),
                Err(err) => {
                    log::warn!(
                        "Series {} update failed for investor {}: {}; rolling back",
                        before.id,
                        plan.investor_id,
                        err
                    );
                    self.roll_back(&investor_before, &series_before[..series_after.len()]);
                    return Err(ExitError::Persistence(err));
                }
            }
        }

        log::info!(
            "Committed exit for investor {}: {} series, refund {}, penalty {}",
            plan.investor_id,
            series_after.len(),
            plan.summary.total_refund,
            plan.summary.total_penalty
        );

        let event = audit_event(plan, &investor_before, &investor_after, &series_before, &series_after);
        record_best_effort(&self.audit, &event);

        Ok(ExitReceipt {
            investor: investor_after,
            series: series_after,
            summary: plan.summary.clone(),
        })
    }

    fn roll_back(&mut self, investor: &Investor, applied_series: &[Series]) {
        for series in applied_series.iter().rev() {
            if let Err(err) = self.store.update_series(&series.id, &SeriesPatch::restore(series)) {
                log::warn!("Rollback of series {} failed: {}", series.id, err);
            }
        }
        if let Err(err) = self.store.update_investor(&investor.id, &InvestorPatch::restore(investor)) {
            log::warn!("Rollback of investor {} failed: {}", investor.id, err);
        }
    }

    pub fn into_parts(self) -> (S, A) {
        (self.store, self.audit)
    }
}

fn investor_exit_patch(investor: &Investor, plan: &ExitPlan) -> InvestorPatch {
    let mut updated = investor.clone();
    for inv in updated.investments.iter_mut() {
        if plan.investments.contains(&*inv) {
            inv.mark_exited(plan.as_of);
        }
    }

    InvestorPatch {
        total_investment: Some(updated.active_principal()),
        investments: Some(updated.investments),
        status: match plan.scope {
            ExitScope::Investor => Some(InvestorStatus::Exited),
            ExitScope::Series { .. } => None,
        },
        kyc_status: None,
    }
}

fn audit_event(
    plan: &ExitPlan,
    investor_before: &Investor,
    investor_after: &Investor,
    series_before: &[Series],
    series_after: &[Series],
) -> AuditEvent {
    let (action, details) = match &plan.scope {
        ExitScope::Investor => (
            AuditAction::DeleteInvestor,
            format!(
                "Deleted investor {} ({}); refund {}, penalty {}",
                plan.investor_name, plan.investor_id, plan.summary.total_refund, plan.summary.total_penalty
            ),
        ),
        ExitScope::Series { series_id } => (
            AuditAction::ExitSeries,
            format!(
                "Investor {} ({}) exited series {}; refund {}, penalty {}",
                plan.investor_name, plan.investor_id, series_id, plan.summary.total_refund, plan.summary.total_penalty
            ),
        ),
    };

    let series_changes: Vec<_> = series_before
        .iter()
        .zip(series_after)
        .map(|(before, after)| {
            json!({
                "seriesId": before.id,
                "before": before.aggregate(),
                "after": after.aggregate(),
            })
        })
        .collect();

    AuditEvent {
        action,
        entity_type: "investor".to_string(),
        entity_id: plan.investor_id.clone(),
        details,
        changes: json!({
            "asOf": plan.as_of,
            "summary": plan.summary,
            "investor": {
                "before": { "totalInvestment": investor_before.total_investment, "status": investor_before.status },
                "after": { "totalInvestment": investor_after.total_investment, "status": investor_after.status },
            },
            "series": series_changes,
        }),
        recorded_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::error::{AuditError, StoreError};
    use crate::investor::Investment;
    use crate::series::SeriesLockInRule;
    use crate::store::MemoryStore;
    use chrono::Days;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    /// Store wrapper used in tests to fail writes to chosen series
    struct FailingSeriesStore {
        inner: crate::store::MemoryStore,
        fail_series: Vec<String>,
    }

    impl InvestorStore for FailingSeriesStore {
        fn get_investor(&self, id: &str) -> Result<Investor, StoreError> {
            self.inner.get_investor(id)
        }
        fn update_investor(&mut self, id: &str, patch: &InvestorPatch) -> Result<Investor, StoreError> {
            self.inner.update_investor(id, patch)
        }
        fn list_investors(&self) -> Result<Vec<Investor>, StoreError> {
            self.inner.list_investors()
        }
    }

    impl SeriesStore for FailingSeriesStore {
        fn get_series(&self, id: &str) -> Result<Series, StoreError> {
            self.inner.get_series(id)
        }
        fn update_series(&mut self, id: &str, patch: &SeriesPatch) -> Result<Series, StoreError> {
            if self.fail_series.iter().any(|s| s == id) {
                return Err(StoreError::Rejected(format!("series {} is read-only", id)));
            }
            self.inner.update_series(id, patch)
        }
        fn list_series(&self) -> Result<Vec<Series>, StoreError> {
            self.inner.list_series()
        }
    }

    fn series(id: &str, lock_in: Option<u32>, funds: Decimal, count: u32) -> Series {
        let mut s = Series::new(id, format!("Series {}", id));
        s.lock_in_months = lock_in;
        s.funds_raised = funds;
        s.investor_count = count;
        s
    }

    fn test_store() -> MemoryStore {
        let investor = Investor::new("INV-1", "Asha Rao")
            .with_investment(Investment::new("NCD-A", dec!(500000), as_of() - Days::new(400)))
            .with_investment(Investment::new("NCD-A", dec!(1000000), as_of() - Days::new(200)))
            .with_investment(Investment::new("NCD-B", dec!(200000), as_of() - Days::new(100)));

        MemoryStore::with_records(
            vec![investor, Investor::new("INV-2", "No Holdings")],
            vec![
                series("NCD-A", Some(12), dec!(10000000), 40),
                series("NCD-B", None, dec!(3000000), 12),
            ],
        )
    }

    fn workflow() -> ExitWorkflow<MemoryStore, MemoryAuditSink> {
        ExitWorkflow::new(test_store(), MemoryAuditSink::new(), RefundCalculator::default())
    }

    #[test]
    fn test_plan_investor_deletion() {
        let wf = workflow();
        let plan = wf.plan_investor_deletion("INV-1", as_of()).unwrap();

        assert_eq!(plan.summary.line_items.len(), 3);
        // 1000000 and 200000 exit early: 20000 + 4000
        assert_eq!(plan.summary.total_penalty, dec!(24000));
        assert_eq!(plan.summary.total_refund, dec!(1676000));

        assert_eq!(plan.series_after["NCD-A"].funds_raised, dec!(8500000));
        assert_eq!(plan.series_after["NCD-A"].investor_count, 39);
        assert_eq!(plan.series_after["NCD-B"].funds_raised, dec!(2800000));
        assert_eq!(plan.series_after["NCD-B"].investor_count, 11);

        let rendered = plan.to_string();
        assert!(rendered.contains("Total refund:  1676000"));
    }

    fn breakdown_row(rendered: &str, name: &str) -> Vec<String> {
        let line = rendered
            .lines()
            .find(|line| line.starts_with(name))
            .unwrap_or_else(|| panic!("no row for {name} in:\n{rendered}"));
        line[name.len()..].split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_plan_display_groups_by_series() {
        let wf = workflow();
        let plan = wf.plan_investor_deletion("INV-1", as_of()).unwrap();
        let rendered = plan.to_string();

        // count, original, shortest months / lock-in, penalty, refund
        let a = breakdown_row(&rendered, "Series NCD-A");
        assert_eq!(a[0], "2");
        assert_eq!(a[1].parse::<Decimal>().unwrap(), dec!(1500000));
        assert_eq!(a[2], "6/12");
        assert_eq!(a[3].parse::<Decimal>().unwrap(), dec!(20000));
        assert_eq!(a[4].parse::<Decimal>().unwrap(), dec!(1480000));

        let b = breakdown_row(&rendered, "Series NCD-B");
        assert_eq!(b[0], "1");
        assert_eq!(b[2], "3/12");
        assert_eq!(b[3].parse::<Decimal>().unwrap(), dec!(4000));

        assert_eq!(rendered.lines().filter(|line| line.starts_with("Series NCD-")).count(), 2);
    }

    #[test]
    fn test_plan_series_exit_scopes_investments() {
        let wf = workflow();
        let plan = wf.plan_series_exit("INV-1", "NCD-B", as_of()).unwrap();

        assert_eq!(plan.summary.line_items.len(), 1);
        assert_eq!(plan.summary.line_items[0].months_required, 12);
        assert_eq!(plan.adjustments.len(), 1);
        assert!(!plan.series_after.contains_key("NCD-A"));
    }

    #[test]
    fn test_plan_errors() {
        let wf = workflow();
        assert!(matches!(
            wf.plan_investor_deletion("INV-404", as_of()),
            Err(ExitError::NotFound { entity: "investor", .. })
        ));
        assert!(matches!(
            wf.plan_series_exit("INV-1", "NCD-Z", as_of()),
            Err(ExitError::NothingToExit { .. })
        ));

        let mut store = test_store();
        store.insert_investor(
            Investor::new("INV-3", "Orphan")
                .with_investment(Investment::new("NCD-GONE", dec!(100), as_of())),
        );
        let wf = ExitWorkflow::new(store, MemoryAuditSink::new(), RefundCalculator::default());
        assert!(matches!(
            wf.plan_investor_deletion("INV-3", as_of()),
            Err(ExitError::NotFound { entity: "series", .. })
        ));
    }

    #[test]
    fn test_rule_overrides_apply() {
        let overrides: LockInRules = [SeriesLockInRule::new("NCD-A", 3)].into_iter().collect();
        let wf = workflow().with_rule_overrides(overrides);
        let plan = wf.plan_series_exit("INV-1", "NCD-A", as_of()).unwrap();

        assert!(plan.summary.line_items.iter().all(|item| item.lock_in_satisfied));
        assert_eq!(plan.summary.total_penalty, Decimal::ZERO);
    }

    #[test]
    fn test_declined_exit_writes_nothing() {
        let mut wf = workflow();
        let plan = wf.plan_investor_deletion("INV-1", as_of()).unwrap();

        let outcome = wf.execute(plan, &mut |_: &ExitPlan| false).unwrap();
        assert_eq!(outcome, ExitOutcome::Declined);

        assert_eq!(wf.store().get_investor("INV-1").unwrap(), test_store().get_investor("INV-1").unwrap());
        assert_eq!(wf.store().get_series("NCD-A").unwrap().investor_count, 40);
        assert!(wf.audit().events().is_empty());
    }

    #[test]
    fn test_committed_deletion() {
        let mut wf = workflow();
        let plan = wf.plan_investor_deletion("INV-1", as_of()).unwrap();

        let outcome = wf.execute(plan, &mut |_: &ExitPlan| true).unwrap();
        let receipt = match outcome {
            ExitOutcome::Committed(receipt) => receipt,
            other => panic!("unexpected outcome: {other:?}"),
        };

        assert_eq!(receipt.investor.status, InvestorStatus::Exited);
        assert_eq!(receipt.investor.total_investment, Decimal::ZERO);
        assert!(receipt.investor.investments.iter().all(|inv| inv.exited_at == Some(as_of())));
        assert_eq!(receipt.series.len(), 2);

        let stored = wf.store().get_series("NCD-A").unwrap();
        assert_eq!(stored.funds_raised, dec!(8500000));
        assert_eq!(stored.investor_count, 39);

        let events = wf.audit().events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, AuditAction::DeleteInvestor);
        assert_eq!(events[0].entity_id, "INV-1");
        assert_eq!(events[0].changes["series"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_committed_series_exit_keeps_other_holdings() {
        let mut wf = workflow();
        let plan = wf.plan_series_exit("INV-1", "NCD-A", as_of()).unwrap();
        let receipt = wf.commit(&plan).unwrap();

        assert_eq!(receipt.investor.status, InvestorStatus::Active);
        assert_eq!(receipt.investor.total_investment, dec!(200000));
        assert_eq!(receipt.investor.holdings().len(), 1);
        assert_eq!(wf.store().get_series("NCD-B").unwrap().investor_count, 12);
        assert_eq!(wf.audit().events()[0].action, AuditAction::ExitSeries);

        // Second exit of the same series has nothing left to do
        assert!(matches!(
            wf.plan_series_exit("INV-1", "NCD-A", as_of()),
            Err(ExitError::NothingToExit { .. })
        ));
    }

    #[test]
    fn test_same_plan_commits_once() {
        let mut wf = workflow();
        let plan = wf.plan_series_exit("INV-1", "NCD-A", as_of()).unwrap();
        wf.commit(&plan).unwrap();

        assert!(matches!(wf.commit(&plan), Err(ExitError::Stale { .. })));

        let stored = wf.store().get_series("NCD-A").unwrap();
        assert_eq!(stored.funds_raised, dec!(8500000));
        assert_eq!(stored.investor_count, 39);
        assert_eq!(wf.audit().events().len(), 1);
    }

    #[test]
    fn test_commit_rejects_plan_after_new_investment() {
        let wf = workflow();
        let plan = wf.plan_series_exit("INV-1", "NCD-A", as_of()).unwrap();

        let (mut store, audit) = wf.into_parts();
        let topped_up = store
            .get_investor("INV-1")
            .unwrap()
            .with_investment(Investment::new("NCD-A", dec!(300000), as_of()));
        store.insert_investor(topped_up.clone());
        let mut wf = ExitWorkflow::new(store, audit, RefundCalculator::default());

        assert!(matches!(wf.commit(&plan), Err(ExitError::Stale { .. })));
        assert_eq!(wf.store().get_investor("INV-1").unwrap(), topped_up);
        assert_eq!(wf.store().get_series("NCD-A").unwrap().investor_count, 40);
        assert!(wf.audit().events().is_empty());

        // A fresh quote covers the new investment
        let plan = wf.plan_series_exit("INV-1", "NCD-A", as_of()).unwrap();
        assert_eq!(plan.summary.line_items.len(), 3);
        let receipt = wf.commit(&plan).unwrap();
        assert_eq!(receipt.investor.total_investment, dec!(200000));
        assert_eq!(wf.store().get_series("NCD-A").unwrap().funds_raised, dec!(8200000));
    }

    #[test]
    fn test_deletion_without_investments() {
        let mut wf = workflow();
        let plan = wf.plan_investor_deletion("INV-2", as_of()).unwrap();
        assert!(plan.summary.is_empty());

        let receipt = wf.commit(&plan).unwrap();
        assert_eq!(receipt.investor.status, InvestorStatus::Exited);
        assert!(receipt.series.is_empty());
        assert!(matches!(wf.commit(&plan), Err(ExitError::Stale { .. })));

        assert!(matches!(
            wf.plan_investor_deletion("INV-2", as_of()),
            Err(ExitError::NothingToExit { .. })
        ));
    }

    #[test]
    fn test_failed_series_write_rolls_back() {
        let store = FailingSeriesStore {
            inner: test_store(),
            fail_series: vec!["NCD-B".to_string()],
        };
        let mut wf = ExitWorkflow::new(store, MemoryAuditSink::new(), RefundCalculator::default());
        let plan = wf.plan_investor_deletion("INV-1", as_of()).unwrap();

        let result = wf.commit(&plan);
        assert!(matches!(result, Err(ExitError::Persistence(StoreError::Rejected(_)))));

        let original = test_store();
        assert_eq!(wf.store().get_investor("INV-1").unwrap(), original.get_investor("INV-1").unwrap());
        assert_eq!(wf.store().get_series("NCD-A").unwrap(), original.get_series("NCD-A").unwrap());
        assert!(wf.audit().events().is_empty());
    }

    struct OfflineAudit;

    impl AuditSink for OfflineAudit {
        fn record(&self, _event: &AuditEvent) -> Result<(), AuditError> {
            Err(AuditError::Unavailable("audit service down".to_string()))
        }
    }

    #[test]
    fn test_audit_failure_does_not_fail_exit() {
        let mut wf = ExitWorkflow::new(test_store(), OfflineAudit, RefundCalculator::default());
        let plan = wf.plan_series_exit("INV-1", "NCD-B", as_of()).unwrap();

        let receipt = wf.commit(&plan).unwrap();
        assert_eq!(receipt.series[0].funds_raised, dec!(2800000));
        assert_eq!(wf.store().get_series("NCD-B").unwrap().investor_count, 11);
    }
}
