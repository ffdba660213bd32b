//! Error types shared across the refund engine, stores and exit workflow

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Malformed input handed to the refund calculator.
///
/// These indicate an upstream data-integrity bug, not a business edge case,
/// so the calculator refuses to produce a line item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefundError {
    /// Investment carries no series identifier
    #[error("invalid input: investment of {amount} made on {invested_at} has no series id")]
    MissingSeriesId { amount: Decimal, invested_at: NaiveDate },

    /// Investment principal is below zero
    #[error("invalid input: negative amount {amount} for series {series_id}")]
    NegativeAmount { series_id: String, amount: Decimal },
}

/// Failures raised by investor and series stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store rejected write: {0}")]
    Rejected(String),
}

impl StoreError {
    pub fn investor_not_found(id: &str) -> Self {
        StoreError::NotFound { entity: "investor", id: id.to_string() }
    }

    pub fn series_not_found(id: &str) -> Self {
        StoreError::NotFound { entity: "series", id: id.to_string() }
    }
}

/// Audit sink failures. Never surfaced to the operator.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit log I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit event could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Failures of the exit workflow as seen by the caller
#[derive(Debug, Error)]
pub enum ExitError {
    /// Investor or series record absent; nothing was computed or written
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error(transparent)]
    Invalid(#[from] RefundError),

    /// A store write failed; any writes already applied were restored
    #[error("persistence failed: {0}")]
    Persistence(#[source] StoreError),

    /// Investor has no active investment in the requested scope
    #[error("investor {investor_id} has no active investments to exit")]
    NothingToExit { investor_id: String },

    /// Investor record changed after the plan was prepared; nothing was written
    #[error("exit plan for investor {investor_id} is out of date, quote it again")]
    Stale { investor_id: String },
}

impl From<StoreError> for ExitError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => ExitError::NotFound { entity, id },
            other => ExitError::Persistence(other),
        }
    }
}

/// Invalid refund policy configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("config file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("penalty rate must be between 0 and 1, got {0}")]
    PenaltyRateOutOfRange(Decimal),

    #[error("unknown month rule: {0} (expected thirty_day or calendar)")]
    UnknownMonthRule(String),

    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}
