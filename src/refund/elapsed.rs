//! Whole months elapsed between an investment date and an evaluation date

use super::policy::MonthRule;
use chrono::{Datelike, NaiveDate};

/// Days per month under the thirty-day rule
pub const DAYS_PER_MONTH: i64 = 30;

/// Whole months from `from` to `to` under `rule`.
///
/// An evaluation date before the investment date clamps to 0.
pub fn months_elapsed(rule: MonthRule, from: NaiveDate, to: NaiveDate) -> u32 {
    if to <= from {
        return 0;
    }
    match rule {
        MonthRule::ThirtyDay => thirty_day_months(from, to),
        MonthRule::Calendar => calendar_months(from, to),
    }
}

fn thirty_day_months(from: NaiveDate, to: NaiveDate) -> u32 {
    let days = (to - from).num_days().max(0);
    (days / DAYS_PER_MONTH) as u32
}

fn calendar_months(from: NaiveDate, to: NaiveDate) -> u32 {
    let mut months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    // Month not complete until the same day of month is reached, or the last
    // day of a month too short to have it
    if to.day() < from.day() && !is_last_day_of_month(to) {
        months -= 1;
    }
    months.max(0) as u32
}

fn is_last_day_of_month(date: NaiveDate) -> bool {
    date.succ_opt().map_or(true, |next| next.month() != date.month())
}
