//! Series records, lock-in rules and the aggregates an exit adjusts

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lock-in applied when a series record does not carry one
pub const DEFAULT_LOCK_IN_MONTHS: u32 = 12;

/// Lifecycle status of a series, derived from its dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesStatus {
    /// Issue date not reached yet
    Upcoming,
    /// Open or running
    Active,
    /// Maturity date reached
    Matured,
}

/// NCD series record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub id: String,

    pub name: String,

    /// Annual coupon rate (e.g. 0.095 for 9.5%)
    #[serde(default)]
    pub interest_rate: Decimal,

    /// Minimum holding in months before a penalty-free exit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_in_months: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maturity_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_amount: Option<Decimal>,

    /// Running principal collected from investors
    #[serde(default)]
    pub funds_raised: Decimal,

    #[serde(default)]
    pub investor_count: u32,
}

impl Series {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            interest_rate: Decimal::ZERO,
            lock_in_months: None,
            issue_date: None,
            maturity_date: None,
            target_amount: None,
            funds_raised: Decimal::ZERO,
            investor_count: 0,
        }
    }

    /// Status at a given date. Missing dates never block the series.
    pub fn status(&self, as_of: NaiveDate) -> SeriesStatus {
        if let Some(issue) = self.issue_date {
            if as_of < issue {
                return SeriesStatus::Upcoming;
            }
        }
        match self.maturity_date {
            Some(maturity) if as_of >= maturity => SeriesStatus::Matured,
            _ => SeriesStatus::Active,
        }
    }

    /// Lock-in rule for this series, falling back to `default_months`
    pub fn lock_in_rule(&self, default_months: u32) -> SeriesLockInRule {
        SeriesLockInRule {
            series_id: self.id.clone(),
            lock_in_months: self.lock_in_months.unwrap_or(default_months),
        }
    }

    pub fn aggregate(&self) -> SeriesAggregate {
        SeriesAggregate {
            funds_raised: self.funds_raised,
            investor_count: self.investor_count,
        }
    }
}

/// Lock-in requirement for one series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesLockInRule {
    pub series_id: String,
    pub lock_in_months: u32,
}

impl SeriesLockInRule {
    pub fn new(series_id: impl Into<String>, lock_in_months: u32) -> Self {
        Self { series_id: series_id.into(), lock_in_months }
    }
}

/// Lookup from series id to lock-in rule
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockInRules {
    rules: BTreeMap<String, SeriesLockInRule>,
}

impl LockInRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build rules from series records, applying `default_months` where unset
    pub fn from_series<'a, I>(series: I, default_months: u32) -> Self
    where
        I: IntoIterator<Item = &'a Series>,
    {
        series.into_iter().map(|s| s.lock_in_rule(default_months)).collect()
    }

    pub fn insert(&mut self, rule: SeriesLockInRule) {
        self.rules.insert(rule.series_id.clone(), rule);
    }

    pub fn get(&self, series_id: &str) -> Option<&SeriesLockInRule> {
        self.rules.get(series_id)
    }

    /// Overlay another rule set; entries in `overrides` win
    pub fn merge(&mut self, overrides: &LockInRules) {
        for rule in overrides.rules.values() {
            self.insert(rule.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<SeriesLockInRule> for LockInRules {
    fn from_iter<T: IntoIterator<Item = SeriesLockInRule>>(iter: T) -> Self {
        let mut rules = LockInRules::new();
        for rule in iter {
            rules.insert(rule);
        }
        rules
    }
}

/// The per-series counters an exit decrements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesAggregate {
    pub funds_raised: Decimal,
    pub investor_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_series_status_by_date() {
        let mut series = Series::new("NCD-A", "Series A 2024");
        series.issue_date = Some(date(2024, 1, 1));
        series.maturity_date = Some(date(2027, 1, 1));

        assert_eq!(series.status(date(2023, 12, 31)), SeriesStatus::Upcoming);
        assert_eq!(series.status(date(2024, 1, 1)), SeriesStatus::Active);
        assert_eq!(series.status(date(2026, 12, 31)), SeriesStatus::Active);
        assert_eq!(series.status(date(2027, 1, 1)), SeriesStatus::Matured);

        let open_ended = Series::new("NCD-B", "Series B");
        assert_eq!(open_ended.status(date(2030, 1, 1)), SeriesStatus::Active);
    }

    #[test]
    fn test_lock_in_rule_defaults() {
        let mut with_rule = Series::new("NCD-A", "A");
        with_rule.lock_in_months = Some(24);
        let without_rule = Series::new("NCD-B", "B");

        let rules = LockInRules::from_series([&with_rule, &without_rule], DEFAULT_LOCK_IN_MONTHS);
        assert_eq!(rules.get("NCD-A").unwrap().lock_in_months, 24);
        assert_eq!(rules.get("NCD-B").unwrap().lock_in_months, 12);
        assert!(rules.get("NCD-C").is_none());
    }

    #[test]
    fn test_merge_overrides_win() {
        let mut base: LockInRules = [
            SeriesLockInRule::new("NCD-A", 12),
            SeriesLockInRule::new("NCD-B", 18),
        ]
        .into_iter()
        .collect();
        let overrides: LockInRules = [SeriesLockInRule::new("NCD-B", 6)].into_iter().collect();

        base.merge(&overrides);
        assert_eq!(base.len(), 2);
        assert_eq!(base.get("NCD-B").unwrap().lock_in_months, 6);
    }

    #[test]
    fn test_series_json_defaults() {
        let json = r#"{"id": "NCD-A", "name": "Series A", "fundsRaised": "1500000.00"}"#;
        let series: Series = serde_json::from_str(json).unwrap();
        assert_eq!(series.lock_in_months, None);
        assert_eq!(series.investor_count, 0);
        assert_eq!(series.aggregate().funds_raised, dec!(1500000.00));
    }
}
