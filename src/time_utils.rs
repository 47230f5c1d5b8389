use crate::domain::models::ReviewCycle;
use chrono::NaiveDate;

/// Days left before the cycle's review date, clamped at zero once the
/// date has passed.
pub fn days_until_review(cycle: &ReviewCycle, today: NaiveDate) -> i64 {
    (cycle.review_date - today).num_days().max(0)
}

pub fn format_short_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}
