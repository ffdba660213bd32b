//! Investor and investment records matching the console's JSON format

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// KYC verification state of an investor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KycStatus {
    #[default]
    Pending,
    Completed,
    Rejected,
}

/// Whether the investor is still on the books
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InvestorStatus {
    #[default]
    Active,
    /// Soft-deleted after a full exit; kept for the audit trail
    Exited,
}

/// A single subscription to a series.
///
/// Immutable once recorded except for the exit marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    /// Series invested in
    pub series_id: String,

    /// Principal invested
    pub amount: Decimal,

    /// Date the investment was recorded
    pub invested_at: NaiveDate,

    /// Set once the investment has been exited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exited_at: Option<NaiveDate>,
}

impl Investment {
    pub fn new(series_id: impl Into<String>, amount: Decimal, invested_at: NaiveDate) -> Self {
        Self {
            series_id: series_id.into(),
            amount,
            invested_at,
            exited_at: None,
        }
    }

    pub fn is_exited(&self) -> bool {
        self.exited_at.is_some()
    }

    /// Move ACTIVE -> EXITED. Exit is terminal, so a second call keeps the first date.
    pub fn mark_exited(&mut self, on: NaiveDate) {
        if self.exited_at.is_none() {
            self.exited_at = Some(on);
        }
    }
}

/// Active principal held in one series, derived from the investment list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub series_id: String,
    pub amount: Decimal,
    pub investment_count: u32,
}

/// Investor record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investor {
    /// Unique investor identifier
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Permanent account number (tax id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pan: Option<String>,

    /// Older console builds wrote this as `bankAccount`
    #[serde(default, alias = "bankAccount", skip_serializing_if = "Option::is_none")]
    pub bank_account_number: Option<String>,

    #[serde(default)]
    pub kyc_status: KycStatus,

    #[serde(default)]
    pub status: InvestorStatus,

    #[serde(default)]
    pub investments: Vec<Investment>,

    /// Sum of active principal across all series
    #[serde(default)]
    pub total_investment: Decimal,
}

impl Investor {
    /// Create an active investor with no investments
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
            phone: None,
            pan: None,
            bank_account_number: None,
            kyc_status: KycStatus::Pending,
            status: InvestorStatus::Active,
            investments: Vec::new(),
            total_investment: Decimal::ZERO,
        }
    }

    /// Builder-style helper used when onboarding and in tests
    pub fn with_investment(mut self, investment: Investment) -> Self {
        self.investments.push(investment);
        self.total_investment = self.active_principal();
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == InvestorStatus::Active
    }

    /// Investments that have not been exited, in recorded order
    pub fn active_investments(&self) -> impl Iterator<Item = &Investment> {
        self.investments.iter().filter(|inv| !inv.is_exited())
    }

    /// Active investments in one series
    pub fn active_in_series<'a>(&'a self, series_id: &'a str) -> impl Iterator<Item = &'a Investment> {
        self.active_investments().filter(move |inv| inv.series_id == series_id)
    }

    /// Sum of principal still invested
    pub fn active_principal(&self) -> Decimal {
        self.active_investments().map(|inv| inv.amount).sum()
    }

    /// Group active investments by series, ordered by first appearance
    pub fn holdings(&self) -> Vec<Holding> {
        let mut holdings: Vec<Holding> = Vec::new();
        for inv in self.active_investments() {
            match holdings.iter_mut().find(|h| h.series_id == inv.series_id) {
                Some(holding) => {
                    holding.amount += inv.amount;
                    holding.investment_count += 1;
                }
                None => holdings.push(Holding {
                    series_id: inv.series_id.clone(),
                    amount: inv.amount,
                    investment_count: 1,
                }),
            }
        }
        holdings
    }
}
