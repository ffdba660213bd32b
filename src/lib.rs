//! NCD Exit - Lock-in refund engine for NCD series investor administration
//!
//! This library provides:
//! - Lock-in and early-exit penalty calculation per investment
//! - Refund summaries and series aggregate (funds raised, investor count) adjustments
//! - Typed investor and series records with holdings and status derivation
//! - Investor/series store abstraction with in-memory and JSON-file backends
//! - An exit workflow that confirms, commits with rollback, and audits

pub mod error;
pub mod investor;
pub mod series;
pub mod refund;
pub mod store;
pub mod audit;
pub mod exit;

// Re-export commonly used types
pub use error::{RefundError, StoreError, ExitError, AuditError, ConfigError};
pub use investor::{Investor, Investment, Holding};
pub use series::{Series, SeriesLockInRule, LockInRules, SeriesAggregate};
pub use refund::{RefundCalculator, RefundPolicy, RefundLineItem, RefundSummary, MonthRule};
pub use store::{InvestorStore, SeriesStore, MemoryStore, JsonStore};
pub use audit::{AuditSink, AuditEvent, JsonlAuditSink};
pub use exit::{ExitWorkflow, ExitPlan, ExitOutcome, ExitScope};
