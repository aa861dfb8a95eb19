//! Owner-scoped expense aggregation: today's list, the trailing seven days,
//! and the recent calendar months.
//!
//! All bucketing happens on the expense's calendar date in the configured
//! local timezone, derived from the stored UTC timestamp at read time. The
//! month bucketing is one shared routine ([bucket_by_month]) used both by
//! the recent-months read and by month-name resolution.

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::Serialize;
use time::{Date, Duration, Month, OffsetDateTime, Time, UtcOffset};

use crate::{Error, database_id::ExpenseId, user::UserID};

use super::store::{Expense, get_expenses, get_expenses_in_range};

/// One expense row in the today list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseEntry {
    /// The ID of the expense, used by the client to delete it.
    pub id: ExpenseId,
    /// What the money was spent on.
    pub reason: Option<String>,
    /// How much money was spent.
    pub amount: Option<f64>,
}

/// One expense inside a day group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayDetail {
    /// What the money was spent on.
    pub reason: Option<String>,
    /// How much money was spent.
    pub amount: Option<f64>,
}

/// The expenses recorded on a single calendar date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayGroup {
    /// The calendar date as an ISO `YYYY-MM-DD` string.
    pub date: String,
    /// The float sum of the day's expense amounts.
    #[serde(rename = "totalAmount")]
    pub total_amount: f64,
    /// The day's expenses in the order they were recorded.
    pub details: Vec<DayDetail>,
}

/// One expense inside a month bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthDetail {
    /// The local calendar date the expense was recorded on, `YYYY-MM-DD`.
    pub date: String,
    /// What the money was spent on.
    pub reason: Option<String>,
    /// How much money was spent.
    pub amount: Option<f64>,
}

/// The expenses recorded in a single calendar month, with their total.
///
/// Buckets are computed on demand from the store; they are never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBucket {
    /// The calendar year of the bucket.
    #[serde(skip)]
    pub year: i32,
    /// The calendar month of the bucket.
    #[serde(skip)]
    pub month: Month,
    /// Display label, e.g. "January 2024".
    #[serde(rename = "month")]
    pub label: String,
    /// The float sum of the month's expense amounts.
    #[serde(rename = "totalAmount")]
    pub total_amount: f64,
    /// The month's expenses sorted ascending by date.
    pub details: Vec<MonthDetail>,
    /// Vestigial flag carried over from the original client contract.
    /// Always `false`; kept in the payload pending a product decision.
    #[serde(rename = "showRemoveButton")]
    pub show_remove_button: bool,
}

/// The display name for a calendar month, from the fixed 1-12 name table.
pub fn month_display_name(month: Month) -> &'static str {
    match month {
        Month::January => "January",
        Month::February => "February",
        Month::March => "March",
        Month::April => "April",
        Month::May => "May",
        Month::June => "June",
        Month::July => "July",
        Month::August => "August",
        Month::September => "September",
        Month::October => "October",
        Month::November => "November",
        Month::December => "December",
    }
}

/// The start of the calendar day containing `now` in the given timezone.
pub(crate) fn start_of_day(now: OffsetDateTime, local_offset: UtcOffset) -> OffsetDateTime {
    now.to_offset(local_offset).replace_time(Time::MIDNIGHT)
}

/// Group expenses into calendar-month buckets, newest month first.
///
/// Within each bucket the details are sorted ascending by timestamp (ties
/// broken by insertion order). The bucket month is the local calendar month
/// of each expense's timestamp.
pub fn bucket_by_month(expenses: &[Expense], local_offset: UtcOffset) -> Vec<MonthBucket> {
    let mut sorted: Vec<&Expense> = expenses.iter().collect();
    sorted.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));

    let mut buckets: BTreeMap<(i32, u8), MonthBucket> = BTreeMap::new();

    for expense in sorted {
        let local_date = expense.timestamp.to_offset(local_offset).date();

        let bucket = buckets
            .entry((local_date.year(), u8::from(local_date.month())))
            .or_insert_with(|| MonthBucket {
                year: local_date.year(),
                month: local_date.month(),
                label: format!(
                    "{} {}",
                    month_display_name(local_date.month()),
                    local_date.year()
                ),
                total_amount: 0.0,
                details: Vec::new(),
                show_remove_button: false,
            });

        bucket.total_amount += expense.amount.unwrap_or(0.0);
        bucket.details.push(MonthDetail {
            date: local_date.to_string(),
            reason: expense.reason.clone(),
            amount: expense.amount,
        });
    }

    buckets.into_values().rev().collect()
}

/// Get the expenses `user_id` recorded since the start of the current local
/// day, oldest first.
///
/// The store returns rows newest-first; this read reverses them for display.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn today_expenses(
    user_id: UserID,
    now: OffsetDateTime,
    local_offset: UtcOffset,
    connection: &Connection,
) -> Result<Vec<ExpenseEntry>, Error> {
    let today_start = start_of_day(now, local_offset);
    let newest_first = get_expenses(user_id, Some(today_start), connection)?;

    Ok(newest_first
        .into_iter()
        .rev()
        .map(|expense| ExpenseEntry {
            id: expense.id,
            reason: expense.reason,
            amount: expense.amount,
        })
        .collect())
}

/// Get the expenses `user_id` recorded in the seven days before the current
/// local day, grouped by calendar date, newest date first.
///
/// The window is `[start_of_today - 7 days, start_of_today)`: today's
/// expenses are excluded. Within each group the details keep the order the
/// expenses were recorded in.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn last_seven_days(
    user_id: UserID,
    now: OffsetDateTime,
    local_offset: UtcOffset,
    connection: &Connection,
) -> Result<Vec<DayGroup>, Error> {
    let today_start = start_of_day(now, local_offset);
    let window_start = today_start - Duration::days(7);
    let expenses = get_expenses_in_range(user_id, window_start, today_start, connection)?;

    let mut groups: BTreeMap<Date, DayGroup> = BTreeMap::new();

    for expense in expenses {
        let local_date = expense.timestamp.to_offset(local_offset).date();

        let group = groups.entry(local_date).or_insert_with(|| DayGroup {
            date: local_date.to_string(),
            total_amount: 0.0,
            details: Vec::new(),
        });

        group.total_amount += expense.amount.unwrap_or(0.0);
        group.details.push(DayDetail {
            reason: expense.reason,
            amount: expense.amount,
        });
    }

    Ok(groups.into_values().rev().collect())
}

/// Get the `max_months` most recent calendar-month buckets for `user_id`,
/// newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn recent_months(
    user_id: UserID,
    local_offset: UtcOffset,
    max_months: usize,
    connection: &Connection,
) -> Result<Vec<MonthBucket>, Error> {
    let expenses = get_expenses(user_id, None, connection)?;

    let mut buckets = bucket_by_month(&expenses, local_offset);
    buckets.truncate(max_months);

    Ok(buckets)
}

#[cfg(test)]
mod bucket_tests {
    use time::{UtcOffset, macros::datetime};

    use crate::{expense::store::Expense, user::UserID};

    use super::bucket_by_month;

    fn expense(id: i64, amount: f64, timestamp: time::OffsetDateTime) -> Expense {
        Expense {
            id,
            user_id: UserID::new(1),
            reason: Some(format!("expense #{id}")),
            amount: Some(amount),
            timestamp,
        }
    }

    #[test]
    fn buckets_sum_amounts_and_sort_newest_first() {
        let expenses = vec![
            expense(1, 10.0, datetime!(2024-01-05 12:00:00 UTC)),
            expense(2, 5.0, datetime!(2024-01-20 12:00:00 UTC)),
            expense(3, 7.0, datetime!(2024-02-01 12:00:00 UTC)),
        ];

        let buckets = bucket_by_month(&expenses, UtcOffset::UTC);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].label, "February 2024");
        assert_eq!(buckets[0].total_amount, 7.0);
        assert_eq!(buckets[1].label, "January 2024");
        assert_eq!(buckets[1].total_amount, 15.0);
    }

    #[test]
    fn bucket_details_are_sorted_by_date_regardless_of_input_order() {
        let expenses = vec![
            expense(1, 5.0, datetime!(2024-01-20 12:00:00 UTC)),
            expense(2, 10.0, datetime!(2024-01-05 12:00:00 UTC)),
        ];

        let buckets = bucket_by_month(&expenses, UtcOffset::UTC);

        assert_eq!(buckets.len(), 1);
        let dates: Vec<&str> = buckets[0]
            .details
            .iter()
            .map(|detail| detail.date.as_str())
            .collect();
        assert_eq!(dates, vec!["2024-01-05", "2024-01-20"]);
    }

    #[test]
    fn buckets_use_the_local_calendar_month() {
        // Late on 31 January in UTC is already February two hours east.
        let expenses = vec![expense(1, 3.0, datetime!(2024-01-31 23:00:00 UTC))];

        let buckets = bucket_by_month(&expenses, UtcOffset::from_hms(2, 0, 0).unwrap());

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].label, "February 2024");
        assert_eq!(buckets[0].details[0].date, "2024-02-01");
    }

    #[test]
    fn same_month_in_different_years_stays_separate() {
        let expenses = vec![
            expense(1, 1.0, datetime!(2023-03-10 12:00:00 UTC)),
            expense(2, 2.0, datetime!(2024-03-10 12:00:00 UTC)),
        ];

        let buckets = bucket_by_month(&expenses, UtcOffset::UTC);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].label, "March 2024");
        assert_eq!(buckets[1].label, "March 2023");
    }

    #[test]
    fn unset_amounts_do_not_change_the_total() {
        let mut unset = expense(1, 0.0, datetime!(2024-01-05 12:00:00 UTC));
        unset.amount = None;
        let expenses = vec![unset, expense(2, 5.0, datetime!(2024-01-06 12:00:00 UTC))];

        let buckets = bucket_by_month(&expenses, UtcOffset::UTC);

        assert_eq!(buckets[0].total_amount, 5.0);
        assert_eq!(buckets[0].details.len(), 2);
    }
}
