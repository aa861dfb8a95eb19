//! Bounds expense history to a rolling window of calendar months.
//!
//! The sweep runs in the same database transaction as each expense insert
//! rather than on the read path, so reads never mutate the store and two
//! concurrent sweeps cannot interleave mid-delete: the deletion itself is a
//! single owner-scoped statement.

use rusqlite::Connection;
use time::{Date, Month, OffsetDateTime, UtcOffset};

use crate::{Error, user::UserID};

use super::store::{count_distinct_months, delete_expenses_before};

/// The default number of most-recent calendar months of expense history to
/// retain per user.
pub const DEFAULT_RETENTION_MONTHS: usize = 6;

/// Delete `user_id`'s expenses that fall outside the retention window.
///
/// If the user's expenses span more than `retention_months` distinct
/// calendar months, every expense older than `retention_months` calendar
/// months before `now` (in the local timezone) is deleted. Otherwise nothing
/// happens. Returns the number of deleted expenses.
///
/// Running the sweep twice in a row changes nothing the second time.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
/// Partial deletion is acceptable: a failed sweep may be retried on the next
/// write.
pub fn sweep_expired_months(
    user_id: UserID,
    now: OffsetDateTime,
    local_offset: UtcOffset,
    retention_months: usize,
    connection: &Connection,
) -> Result<usize, Error> {
    let unique_months = count_distinct_months(user_id, connection)?;

    if unique_months <= retention_months {
        return Ok(0);
    }

    let cutoff = months_earlier(now.to_offset(local_offset), retention_months as u32);
    let deleted = delete_expenses_before(user_id, cutoff, connection)?;

    if deleted > 0 {
        tracing::debug!("retention sweep deleted {deleted} expenses for user {user_id}");
    }

    Ok(deleted)
}

/// The instant `months` calendar months before `date_time`, keeping the
/// time of day.
///
/// The day of month is clamped to the length of the target month, so one
/// month before 31 March is 28 (or 29) February.
pub(crate) fn months_earlier(date_time: OffsetDateTime, months: u32) -> OffsetDateTime {
    let date = date_time.date();
    let month_index = date.year() * 12 + i32::from(u8::from(date.month())) - 1 - months as i32;

    let year = month_index.div_euclid(12);
    let month = Month::try_from((month_index.rem_euclid(12) + 1) as u8)
        .expect("euclidean remainder is in 1..=12");
    let day = date.day().min(month.length(year));

    let date = Date::from_calendar_date(year, month, day).expect("clamped day is valid");
    date_time.replace_date(date)
}

#[cfg(test)]
mod months_earlier_tests {
    use time::macros::datetime;

    use super::months_earlier;

    #[test]
    fn steps_back_within_a_year() {
        let result = months_earlier(datetime!(2024-08-15 12:00:00 UTC), 6);

        assert_eq!(result, datetime!(2024-02-15 12:00:00 UTC));
    }

    #[test]
    fn crosses_year_boundaries() {
        let result = months_earlier(datetime!(2024-02-15 12:00:00 UTC), 6);

        assert_eq!(result, datetime!(2023-08-15 12:00:00 UTC));
    }

    #[test]
    fn clamps_the_day_to_the_target_month() {
        let result = months_earlier(datetime!(2024-03-31 12:00:00 UTC), 1);

        assert_eq!(result, datetime!(2024-02-29 12:00:00 UTC));
    }

    #[test]
    fn keeps_the_time_of_day() {
        let result = months_earlier(datetime!(2024-08-15 23:59:59 UTC), 12);

        assert_eq!(result, datetime!(2023-08-15 23:59:59 UTC));
    }
}
