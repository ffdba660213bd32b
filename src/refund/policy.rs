//! Refund policy: penalty rate, default lock-in and month-counting rule
//!
//! Loaded from an optional JSON file, then overridden by environment variables:
//!   NCD_PENALTY_RATE, NCD_DEFAULT_LOCK_IN_MONTHS, NCD_MONTH_RULE

use crate::error::ConfigError;
use crate::series::DEFAULT_LOCK_IN_MONTHS;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Penalty applied to early exits when nothing else is configured (2%)
pub const DEFAULT_PENALTY_RATE: Decimal = dec!(0.02);

/// How elapsed whole months are counted between two dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthRule {
    /// floor(days / 30), the console's historical behavior
    #[default]
    ThirtyDay,
    /// Difference in year*12 + month, less one if the day of month is not yet
    /// reached. A start day past the end of a shorter month is clamped to its
    /// last day.
    Calendar,
}

impl FromStr for MonthRule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "thirty_day" | "30day" | "30_day" => Ok(MonthRule::ThirtyDay),
            "calendar" => Ok(MonthRule::Calendar),
            other => Err(ConfigError::UnknownMonthRule(other.to_string())),
        }
    }
}

fn default_penalty_rate() -> Decimal { DEFAULT_PENALTY_RATE }
fn default_lock_in_months() -> u32 { DEFAULT_LOCK_IN_MONTHS }

/// Tunables for the refund calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundPolicy {
    /// Fraction of principal withheld on an early exit
    #[serde(default = "default_penalty_rate")]
    pub penalty_rate: Decimal,

    /// Lock-in used for series without a rule
    #[serde(default = "default_lock_in_months")]
    pub default_lock_in_months: u32,

    #[serde(default)]
    pub month_rule: MonthRule,
}

impl Default for RefundPolicy {
    fn default() -> Self {
        Self {
            penalty_rate: DEFAULT_PENALTY_RATE,
            default_lock_in_months: DEFAULT_LOCK_IN_MONTHS,
            month_rule: MonthRule::ThirtyDay,
        }
    }
}

impl RefundPolicy {
    /// Read a policy from a JSON file; absent fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let policy: RefundPolicy = serde_json::from_str(&text)?;
        policy.validate()
    }

    /// File (if given) then environment overrides, validated
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(p) => Self::from_json_file(p)?,
            None => Self::default(),
        };
        base.with_env_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from a variable lookup (the process environment in production)
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("NCD_PENALTY_RATE") {
            self.penalty_rate = Decimal::from_str(value.trim()).map_err(|_| ConfigError::InvalidEnv {
                var: "NCD_PENALTY_RATE",
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup("NCD_DEFAULT_LOCK_IN_MONTHS") {
            self.default_lock_in_months = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: "NCD_DEFAULT_LOCK_IN_MONTHS",
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup("NCD_MONTH_RULE") {
            self.month_rule = value.parse()?;
        }

        self.validate()
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.penalty_rate < Decimal::ZERO || self.penalty_rate > Decimal::ONE {
            return Err(ConfigError::PenaltyRateOutOfRange(self.penalty_rate));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_policy() {
        let policy = RefundPolicy::default();
        assert_eq!(policy.penalty_rate, dec!(0.02));
        assert_eq!(policy.default_lock_in_months, 12);
        assert_eq!(policy.month_rule, MonthRule::ThirtyDay);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let policy: RefundPolicy = serde_json::from_str(r#"{"monthRule": "calendar"}"#).unwrap();
        assert_eq!(policy.month_rule, MonthRule::Calendar);
        assert_eq!(policy.penalty_rate, DEFAULT_PENALTY_RATE);
        assert_eq!(policy.default_lock_in_months, 12);
    }

    #[test]
    fn test_env_overrides() {
        let policy = RefundPolicy::default()
            .with_env_overrides(lookup(&[
                ("NCD_PENALTY_RATE", "0.015"),
                ("NCD_DEFAULT_LOCK_IN_MONTHS", "18"),
                ("NCD_MONTH_RULE", "Calendar"),
            ]))
            .unwrap();

        assert_eq!(policy.penalty_rate, dec!(0.015));
        assert_eq!(policy.default_lock_in_months, 18);
        assert_eq!(policy.month_rule, MonthRule::Calendar);
    }

    #[test]
    fn test_invalid_env_values_rejected() {
        let bad_rate = RefundPolicy::default().with_env_overrides(lookup(&[("NCD_PENALTY_RATE", "two")]));
        assert!(matches!(bad_rate, Err(ConfigError::InvalidEnv { var: "NCD_PENALTY_RATE", .. })));

        let too_high = RefundPolicy::default().with_env_overrides(lookup(&[("NCD_PENALTY_RATE", "1.5")]));
        assert!(matches!(too_high, Err(ConfigError::PenaltyRateOutOfRange(_))));

        let bad_rule = RefundPolicy::default().with_env_overrides(lookup(&[("NCD_MONTH_RULE", "lunar")]));
        assert!(matches!(bad_rule, Err(ConfigError::UnknownMonthRule(_))));
    }

    #[test]
    fn test_from_json_file() {
        let path = env::temp_dir().join(format!("ncd_policy_{}.json", std::process::id()));
        fs::write(&path, r#"{"penaltyRate": "0.03", "defaultLockInMonths": 6}"#).unwrap();

        let policy = RefundPolicy::from_json_file(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(policy.penalty_rate, dec!(0.03));
        assert_eq!(policy.default_lock_in_months, 6);
        assert_eq!(policy.month_rule, MonthRule::ThirtyDay);
    }
}
