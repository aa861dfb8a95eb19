//! Creating and removing individual expenses on behalf of a user.

use rusqlite::{Connection, TransactionBehavior};
use time::{OffsetDateTime, UtcOffset};

use crate::{Error, database_id::ExpenseId, user::UserID};

use super::{
    retention::sweep_expired_months,
    store::{Expense, NewExpense, delete_expense, insert_expense},
};

/// Validate and record a new expense for `user_id`, stamped with `now`.
///
/// The owner comes from the authenticated request context, so the only
/// fields left to validate are the reason and the amount: if either is
/// missing nothing is persisted and a [Error::MissingField] describes which
/// one.
///
/// The insert and the retention sweep run in a single database transaction,
/// so a reader can never observe the new expense without retention having
/// been applied, and a failed sweep rolls the insert back.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingField] if `reason` or `amount` is `None`,
/// - [Error::SqlError] if there is an SQL error.
pub fn record_expense(
    user_id: UserID,
    reason: Option<String>,
    amount: Option<f64>,
    now: OffsetDateTime,
    local_offset: UtcOffset,
    retention_months: usize,
    connection: &Connection,
) -> Result<Expense, Error> {
    let reason = reason.ok_or(Error::MissingField("reason"))?;
    let amount = amount.ok_or(Error::MissingField("amount"))?;

    let transaction =
        rusqlite::Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let expense = insert_expense(
        NewExpense {
            user_id,
            reason: Some(reason),
            amount: Some(amount),
            timestamp: now,
        },
        &transaction,
    )?;

    sweep_expired_months(user_id, now, local_offset, retention_months, &transaction)?;

    transaction.commit()?;

    Ok(expense)
}

/// Remove the expense with `expense_id` if it belongs to `user_id`.
///
/// Returns `false` when the expense does not exist or belongs to another
/// user; the two cases are deliberately indistinguishable so the caller
/// learns nothing about other users' data.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn remove_expense(
    expense_id: ExpenseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<bool, Error> {
    delete_expense(expense_id, user_id, connection)
}


#[cfg(test)]
mod remove_expense_tests {
    use time::macros::datetime;

    use crate::expense::store::test_utils::{
        create_second_test_user, create_test_user, get_test_connection, insert_test_expense,
    };

    use super::remove_expense;

    #[test]
    fn removes_an_owned_expense() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let expense = insert_test_expense(
            user_id,
            "mistake",
            10.0,
            datetime!(2024-01-05 12:00:00 UTC),
            &conn,
        );

        assert!(remove_expense(expense.id, user_id, &conn).unwrap());
    }

    #[test]
    fn reports_failure_for_someone_elses_expense() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let other_user_id = create_second_test_user(&conn);
        let expense = insert_test_expense(
            user_id,
            "not yours",
            10.0,
            datetime!(2024-01-05 12:00:00 UTC),
            &conn,
        );

        assert!(!remove_expense(expense.id, other_user_id, &conn).unwrap());
    }
}
