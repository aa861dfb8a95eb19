//! Defines the core data model and database queries for expenses.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, database_id::ExpenseId, user::UserID};

/// A single recorded expense.
///
/// The calendar month and year an expense falls in are always derived from
/// `timestamp` at read time, never stored alongside it, so the two can never
/// disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The ID of the expense in the application database.
    pub id: ExpenseId,
    /// The user the expense belongs to.
    pub user_id: UserID,
    /// What the money was spent on. `None` means the reason was never set.
    pub reason: Option<String>,
    /// How much money was spent. `None` means the amount was never set.
    ///
    /// Amounts are plain `f64`s summed with float addition, matching the
    /// stored data this application inherits. Do not rely on cent-exact
    /// totals.
    pub amount: Option<f64>,
    /// When the expense was recorded, in UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// The data needed to insert an expense into the database.
///
/// Use [crate::expense::record_expense] instead to create an expense on
/// behalf of a user: it validates the fields and triggers the retention
/// sweep. This type is the raw store contract.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// The user the expense will belong to.
    pub user_id: UserID,
    /// What the money was spent on.
    pub reason: Option<String>,
    /// How much money was spent.
    pub amount: Option<f64>,
    /// When the expense was recorded. Stored in UTC.
    pub timestamp: OffsetDateTime,
}

/// Create the expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL
/// error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                reason TEXT,
                amount REAL,
                date TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Composite index used by every owner-scoped read and the retention sweep.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Insert an expense into the database.
///
/// The timestamp is normalised to UTC before storage so that date
/// comparisons in SQL stay consistent.
///
/// # Errors
/// This function will return a [Error::SqlError] if `user_id` does not refer
/// to a registered user or if there is some other SQL error.
pub fn insert_expense(
    new_expense: NewExpense,
    connection: &Connection,
) -> Result<Expense, Error> {
    let timestamp = new_expense.timestamp.to_offset(time::UtcOffset::UTC);

    let expense = connection
        .prepare(
            "INSERT INTO expense (user_id, reason, amount, date)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, user_id, reason, amount, date",
        )?
        .query_one(
            (
                new_expense.user_id.as_i64(),
                new_expense.reason,
                new_expense.amount,
                timestamp,
            ),
            map_expense_row,
        )?;

    Ok(expense)
}

/// Retrieve the expenses belonging to `user_id`, newest first.
///
/// `since` restricts the result to expenses recorded at or after the given
/// instant. Callers that want oldest-first display order should reverse the
/// result.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_expenses(
    user_id: UserID,
    since: Option<OffsetDateTime>,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    match since {
        Some(since) => connection
            .prepare(
                "SELECT id, user_id, reason, amount, date FROM expense
                 WHERE user_id = :user_id AND date >= :since
                 ORDER BY date DESC, id DESC",
            )?
            .query_map(
                rusqlite::named_params! {
                    ":user_id": user_id.as_i64(),
                    ":since": since.to_offset(time::UtcOffset::UTC),
                },
                map_expense_row,
            )?
            .map(|expense_result| expense_result.map_err(Error::SqlError))
            .collect(),
        None => connection
            .prepare(
                "SELECT id, user_id, reason, amount, date FROM expense
                 WHERE user_id = :user_id
                 ORDER BY date DESC, id DESC",
            )?
            .query_map(
                rusqlite::named_params! { ":user_id": user_id.as_i64() },
                map_expense_row,
            )?
            .map(|expense_result| expense_result.map_err(Error::SqlError))
            .collect(),
    }
}

/// Retrieve the expenses belonging to `user_id` recorded in `[start, end)`,
/// in insertion order.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub(crate) fn get_expenses_in_range(
    user_id: UserID,
    start: OffsetDateTime,
    end: OffsetDateTime,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, reason, amount, date FROM expense
             WHERE user_id = :user_id AND date >= :start AND date < :end
             ORDER BY id ASC",
        )?
        .query_map(
            rusqlite::named_params! {
                ":user_id": user_id.as_i64(),
                ":start": start.to_offset(time::UtcOffset::UTC),
                ":end": end.to_offset(time::UtcOffset::UTC),
            },
            map_expense_row,
        )?
        .map(|expense_result| expense_result.map_err(Error::SqlError))
        .collect()
}

/// Delete the expense with `id` if it belongs to `user_id`.
///
/// Returns `true` if a matching expense existed and was deleted. An
/// ownership mismatch is not an error: it is a no-op reported as `false`, so
/// the caller cannot tell "not found" and "not owned" apart.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_expense(
    id: ExpenseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<bool, Error> {
    let rows_affected = connection.execute(
        "DELETE FROM expense WHERE id = :id AND user_id = :user_id",
        rusqlite::named_params! { ":id": id, ":user_id": user_id.as_i64() },
    )?;

    Ok(rows_affected == 1)
}

/// Delete all of `user_id`'s expenses recorded before `cutoff`, returning
/// how many were deleted.
///
/// Runs as a single statement, so a concurrent sweep over the same owner
/// cannot observe a partially deleted range.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub(crate) fn delete_expenses_before(
    user_id: UserID,
    cutoff: OffsetDateTime,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "DELETE FROM expense WHERE user_id = :user_id AND date < :cutoff",
            rusqlite::named_params! {
                ":user_id": user_id.as_i64(),
                ":cutoff": cutoff.to_offset(time::UtcOffset::UTC),
            },
        )
        .map_err(|error| error.into())
}

/// Count the distinct calendar months (year + month pairs) that `user_id`
/// has expenses in.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub(crate) fn count_distinct_months(
    user_id: UserID,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .query_row(
            // Stored dates start with "YYYY-MM-DD", so the first seven bytes
            // identify the calendar month.
            "SELECT COUNT(DISTINCT substr(date, 1, 7)) FROM expense WHERE user_id = :user_id",
            rusqlite::named_params! { ":user_id": user_id.as_i64() },
            |row| row.get::<_, i64>(0).map(|count| count as usize),
        )
        .map_err(|error| error.into())
}

/// Map a database row to an [Expense].
pub fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_user_id = row.get(1)?;
    let reason = row.get(2)?;
    let amount = row.get(3)?;
    let timestamp = row.get(4)?;

    Ok(Expense {
        id,
        user_id: UserID::new(raw_user_id),
        reason,
        amount,
        timestamp,
    })
}


#[cfg(test)]
mod store_tests {
    use time::macros::datetime;

    use crate::Error;

    use super::{
        count_distinct_months, delete_expense, delete_expenses_before, get_expenses,
        get_expenses_in_range,
        test_utils::{
            create_second_test_user, create_test_user, get_test_connection, insert_test_expense,
        },
    };

    #[test]
    fn insert_and_fetch_round_trips() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);

        let inserted = insert_test_expense(
            user_id,
            "groceries",
            42.5,
            datetime!(2024-01-05 12:30:00 UTC),
            &conn,
        );

        let fetched = get_expenses(user_id, None, &conn).unwrap();

        assert_eq!(fetched, vec![inserted]);
    }

    #[test]
    fn get_expenses_returns_newest_first() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);

        let oldest = insert_test_expense(
            user_id,
            "coffee",
            4.0,
            datetime!(2024-01-05 08:00:00 UTC),
            &conn,
        );
        let newest = insert_test_expense(
            user_id,
            "lunch",
            12.0,
            datetime!(2024-01-05 13:00:00 UTC),
            &conn,
        );

        let fetched = get_expenses(user_id, None, &conn).unwrap();

        assert_eq!(fetched, vec![newest, oldest]);
    }

    #[test]
    fn get_expenses_applies_since_bound() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);

        insert_test_expense(
            user_id,
            "yesterday",
            5.0,
            datetime!(2024-01-04 23:59:00 UTC),
            &conn,
        );
        let today = insert_test_expense(
            user_id,
            "today",
            6.0,
            datetime!(2024-01-05 00:00:00 UTC),
            &conn,
        );

        let fetched =
            get_expenses(user_id, Some(datetime!(2024-01-05 00:00:00 UTC)), &conn).unwrap();

        assert_eq!(fetched, vec![today]);
    }

    #[test]
    fn get_expenses_does_not_leak_other_owners() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let other_user_id = create_second_test_user(&conn);

        insert_test_expense(
            other_user_id,
            "not yours",
            99.0,
            datetime!(2024-01-05 12:00:00 UTC),
            &conn,
        );

        let fetched = get_expenses(user_id, None, &conn).unwrap();

        assert_eq!(fetched, vec![]);
    }

    #[test]
    fn range_query_excludes_end_bound() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);

        let inside = insert_test_expense(
            user_id,
            "inside",
            1.0,
            datetime!(2024-01-04 12:00:00 UTC),
            &conn,
        );
        insert_test_expense(
            user_id,
            "at end",
            2.0,
            datetime!(2024-01-05 00:00:00 UTC),
            &conn,
        );

        let fetched = get_expenses_in_range(
            user_id,
            datetime!(2024-01-04 00:00:00 UTC),
            datetime!(2024-01-05 00:00:00 UTC),
            &conn,
        )
        .unwrap();

        assert_eq!(fetched, vec![inside]);
    }

    #[test]
    fn delete_expense_succeeds_for_owner() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let expense = insert_test_expense(
            user_id,
            "mistake",
            10.0,
            datetime!(2024-01-05 12:00:00 UTC),
            &conn,
        );

        let deleted = delete_expense(expense.id, user_id, &conn).unwrap();

        assert!(deleted);
        assert_eq!(get_expenses(user_id, None, &conn).unwrap(), vec![]);
    }

    #[test]
    fn delete_expense_is_noop_for_other_owner() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let other_user_id = create_second_test_user(&conn);
        let expense = insert_test_expense(
            user_id,
            "keep me",
            10.0,
            datetime!(2024-01-05 12:00:00 UTC),
            &conn,
        );

        let deleted = delete_expense(expense.id, other_user_id, &conn).unwrap();

        assert!(!deleted, "deleting another user's expense must report failure");
        assert_eq!(
            get_expenses(user_id, None, &conn).unwrap(),
            vec![expense],
            "the expense must still exist after the failed delete"
        );
    }

    #[test]
    fn delete_expense_reports_failure_for_missing_id() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);

        let deleted = delete_expense(1337, user_id, &conn).unwrap();

        assert!(!deleted);
    }

    #[test]
    fn delete_expenses_before_only_affects_owner() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let other_user_id = create_second_test_user(&conn);

        insert_test_expense(
            user_id,
            "old",
            1.0,
            datetime!(2023-06-01 12:00:00 UTC),
            &conn,
        );
        let kept = insert_test_expense(
            user_id,
            "recent",
            2.0,
            datetime!(2024-01-05 12:00:00 UTC),
            &conn,
        );
        let other_old = insert_test_expense(
            other_user_id,
            "someone else's old",
            3.0,
            datetime!(2023-06-01 12:00:00 UTC),
            &conn,
        );

        let deleted_count =
            delete_expenses_before(user_id, datetime!(2024-01-01 00:00:00 UTC), &conn).unwrap();

        assert_eq!(deleted_count, 1);
        assert_eq!(get_expenses(user_id, None, &conn).unwrap(), vec![kept]);
        assert_eq!(
            get_expenses(other_user_id, None, &conn).unwrap(),
            vec![other_old]
        );
    }

    #[test]
    fn counts_distinct_months() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);

        insert_test_expense(user_id, "a", 1.0, datetime!(2024-01-05 12:00:00 UTC), &conn);
        insert_test_expense(user_id, "b", 2.0, datetime!(2024-01-20 12:00:00 UTC), &conn);
        insert_test_expense(user_id, "c", 3.0, datetime!(2024-02-01 12:00:00 UTC), &conn);
        insert_test_expense(user_id, "d", 4.0, datetime!(2023-02-01 12:00:00 UTC), &conn);

        let count = count_distinct_months(user_id, &conn).unwrap();

        assert_eq!(count, 3);
    }

    #[test]
    fn count_distinct_months_is_zero_for_unknown_user() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);

        let count = count_distinct_months(user_id, &conn).unwrap();

        assert_eq!(count, 0);
    }

    #[test]
    fn insert_fails_for_unregistered_user() {
        let conn = get_test_connection();

        let result = super::insert_expense(
            super::NewExpense {
                user_id: crate::user::UserID::new(42),
                reason: Some("no such user".to_owned()),
                amount: Some(1.0),
                timestamp: datetime!(2024-01-05 12:00:00 UTC),
            },
            &conn,
        );

        assert!(matches!(result, Err(Error::SqlError(_))));
    }
}
