//! The single place where report numbers and dates become text.
//!
//! Every numeric value shown in a report or an API summary passes through
//! one of these helpers so rounding and wording stay consistent.

use chrono::NaiveDate;

/// Render a completion rate as a percentage string.
///
/// Empty task sets render as `"0%"`; everything else carries exactly one
/// decimal place (`"66.7%"`, `"100.0%"`).
#[must_use]
pub fn percentage(rate: f64, total: usize) -> String {
    if total == 0 {
        return "0%".to_owned();
    }
    format!("{rate:.1}%")
}

/// Render a count as a plain decimal integer.
#[must_use]
pub fn count(value: usize) -> String {
    value.to_string()
}

/// Render a whole number of days with the matching noun (`"1 day"`, `"3 days"`).
#[must_use]
pub fn days(value: i64) -> String {
    if value == 1 {
        "1 day".to_owned()
    } else {
        format!("{value} days")
    }
}

/// Render a report date as `Friday, January 05, 2024`.
#[must_use]
pub fn report_date(date: NaiveDate) -> String {
    date.format("%A, %B %d, %Y").to_string()
}
