//! Investor and series stores
//!
//! The exit workflow only talks to these traits. `MemoryStore` backs tests and
//! embedding; `JsonStore` persists the console's collections as JSON files.

mod memory;
mod json;

pub use memory::MemoryStore;
pub use json::{JsonStore, INVESTORS_FILE, SERIES_FILE};

use crate::error::StoreError;
use crate::investor::{Investment, Investor, InvestorStatus, KycStatus};
use crate::series::{Series, SeriesAggregate};
use rust_decimal::Decimal;

/// Field replacements for an investor record; `None` leaves a field as is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvestorPatch {
    pub investments: Option<Vec<Investment>>,
    pub total_investment: Option<Decimal>,
    pub status: Option<InvestorStatus>,
    pub kyc_status: Option<KycStatus>,
}

impl InvestorPatch {
    /// Patch that puts every mutable field back to `snapshot`
    pub fn restore(snapshot: &Investor) -> Self {
        Self {
            investments: Some(snapshot.investments.clone()),
            total_investment: Some(snapshot.total_investment),
            status: Some(snapshot.status),
            kyc_status: Some(snapshot.kyc_status),
        }
    }

    pub fn apply(&self, investor: &mut Investor) {
        if let Some(investments) = &self.investments {
            investor.investments = investments.clone();
        }
        if let Some(total) = self.total_investment {
            investor.total_investment = total;
        }
        if let Some(status) = self.status {
            investor.status = status;
        }
        if let Some(kyc) = self.kyc_status {
            investor.kyc_status = kyc;
        }
    }
}

/// Field replacements for a series record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeriesPatch {
    pub funds_raised: Option<Decimal>,
    pub investor_count: Option<u32>,
}

impl SeriesPatch {
    pub fn from_aggregate(aggregate: SeriesAggregate) -> Self {
        Self {
            funds_raised: Some(aggregate.funds_raised),
            investor_count: Some(aggregate.investor_count),
        }
    }

    pub fn restore(snapshot: &Series) -> Self {
        Self::from_aggregate(snapshot.aggregate())
    }

    pub fn apply(&self, series: &mut Series) {
        if let Some(funds) = self.funds_raised {
            series.funds_raised = funds;
        }
        if let Some(count) = self.investor_count {
            series.investor_count = count;
        }
    }
}

/// Investor collection
pub trait InvestorStore {
    fn get_investor(&self, id: &str) -> Result<Investor, StoreError>;

    /// Apply `patch` and return the stored record
    fn update_investor(&mut self, id: &str, patch: &InvestorPatch) -> Result<Investor, StoreError>;

    fn list_investors(&self) -> Result<Vec<Investor>, StoreError>;
}

/// Series collection
pub trait SeriesStore {
    fn get_series(&self, id: &str) -> Result<Series, StoreError>;

    /// Apply `patch` and return the stored record
    fn update_series(&mut self, id: &str, patch: &SeriesPatch) -> Result<Series, StoreError>;

    fn list_series(&self) -> Result<Vec<Series>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_investor_patch_restore_roundtrip() {
        let original = Investor::new("INV-1", "Asha Rao").with_investment(Investment::new(
            "NCD-A",
            dec!(1000),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        ));
        let snapshot = InvestorPatch::restore(&original);

        let mut changed = original.clone();
        InvestorPatch {
            investments: Some(Vec::new()),
            total_investment: Some(Decimal::ZERO),
            status: Some(InvestorStatus::Exited),
            kyc_status: None,
        }
        .apply(&mut changed);
        assert_eq!(changed.status, InvestorStatus::Exited);
        assert!(changed.investments.is_empty());

        snapshot.apply(&mut changed);
        assert_eq!(changed, original);
    }

    #[test]
    fn test_empty_series_patch_is_noop() {
        let mut series = Series::new("NCD-A", "A");
        series.funds_raised = dec!(5000);
        series.investor_count = 3;
        let before = series.clone();

        SeriesPatch::default().apply(&mut series);
        assert_eq!(series, before);
    }
}
