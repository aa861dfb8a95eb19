//! Resolves a human month label back to a concrete month bucket.

use rusqlite::Connection;
use time::UtcOffset;

use crate::{Error, user::UserID};

use super::{
    aggregation::{MonthDetail, bucket_by_month},
    store::get_expenses,
};

/// Get the expense details for the month whose display name matches `label`.
///
/// The label is sanitized first: anything after a `%` is dropped (clients
/// have historically sent URL-encoded labels such as `March%202024`), then
/// the first whitespace-delimited token is taken, so "March 2024" matches
/// the same as "March".
///
/// Only the month name is matched, never the year. When the same month name
/// occurs in two different years, the most recent year wins. This is a
/// known limitation of the lookup contract, kept because callers depend on
/// name-only labels; it is not a bug to fix here.
///
/// Returns an empty list when no bucket matches.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn resolve_month_by_name(
    user_id: UserID,
    label: &str,
    local_offset: UtcOffset,
    connection: &Connection,
) -> Result<Vec<MonthDetail>, Error> {
    let month_name = sanitize_month_label(label);

    let expenses = get_expenses(user_id, None, connection)?;
    let buckets = bucket_by_month(&expenses, local_offset);

    // Buckets come back newest first, so the first name match is the most
    // recent year with that month name.
    Ok(buckets
        .into_iter()
        .find(|bucket| super::aggregation::month_display_name(bucket.month) == month_name)
        .map(|bucket| bucket.details)
        .unwrap_or_default())
}

/// Strip the upstream format artifacts from a month label: drop anything
/// after a `%` and keep only the first whitespace-delimited token.
fn sanitize_month_label(label: &str) -> &str {
    label
        .split('%')
        .next()
        .unwrap_or("")
        .split_whitespace()
        .next()
        .unwrap_or("")
}

#[cfg(test)]
mod sanitize_tests {
    use super::sanitize_month_label;

    #[test]
    fn plain_name_passes_through() {
        assert_eq!(sanitize_month_label("March"), "March");
    }

    #[test]
    fn url_encoding_artifact_is_dropped() {
        assert_eq!(sanitize_month_label("March%202024"), "March");
    }

    #[test]
    fn trailing_year_is_dropped() {
        assert_eq!(sanitize_month_label("March 2024"), "March");
    }

    #[test]
    fn empty_label_stays_empty() {
        assert_eq!(sanitize_month_label(""), "");
        assert_eq!(sanitize_month_label("%20"), "");
    }
}

#[cfg(test)]
mod resolve_tests {
    use time::{UtcOffset, macros::datetime};

    use crate::expense::store::test_utils::{
        create_test_user, get_test_connection, insert_test_expense,
    };

    use super::resolve_month_by_name;

    #[test]
    fn resolves_a_month_to_its_details() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);

        insert_test_expense(user_id, "groceries", 10.0, datetime!(2024-01-05 12:00:00 UTC), &conn);
        insert_test_expense(user_id, "petrol", 5.0, datetime!(2024-01-20 12:00:00 UTC), &conn);
        insert_test_expense(user_id, "rent", 7.0, datetime!(2024-02-01 12:00:00 UTC), &conn);

        let details =
            resolve_month_by_name(user_id, "January", UtcOffset::UTC, &conn).unwrap();

        assert_eq!(details.len(), 2);
        assert_eq!(details[0].date, "2024-01-05");
        assert_eq!(details[0].amount, Some(10.0));
        assert_eq!(details[1].date, "2024-01-20");
        assert_eq!(details[1].amount, Some(5.0));
    }

    #[test]
    fn ambiguous_name_resolves_to_the_most_recent_year() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);

        insert_test_expense(user_id, "old march", 1.0, datetime!(2023-03-10 12:00:00 UTC), &conn);
        insert_test_expense(user_id, "new march", 2.0, datetime!(2024-03-10 12:00:00 UTC), &conn);

        let details = resolve_month_by_name(user_id, "March", UtcOffset::UTC, &conn).unwrap();

        assert_eq!(details.len(), 1);
        assert_eq!(details[0].reason.as_deref(), Some("new march"));
    }

    #[test]
    fn unknown_month_returns_an_empty_list() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);

        insert_test_expense(user_id, "january", 1.0, datetime!(2024-01-10 12:00:00 UTC), &conn);

        let details = resolve_month_by_name(user_id, "August", UtcOffset::UTC, &conn).unwrap();

        assert!(details.is_empty());
    }

    #[test]
    fn url_encoded_label_still_resolves() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);

        insert_test_expense(user_id, "january", 1.0, datetime!(2024-01-10 12:00:00 UTC), &conn);

        let details =
            resolve_month_by_name(user_id, "January%202024", UtcOffset::UTC, &conn).unwrap();

        assert_eq!(details.len(), 1);
    }
}
