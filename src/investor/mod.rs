//! Investor records and holdings derivation

mod data;

pub use data::{Investor, Investment, InvestorStatus, KycStatus, Holding};
