//! The API endpoint for removing an expense.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};

use crate::{database_id::ExpenseId, user::UserID};

use super::{ExpenseState, api_failure, api_success, lifecycle::remove_expense};

/// A route handler for deleting one of the logged-in user's expenses.
///
/// Whether the expense does not exist or belongs to another user, the
/// response is the same generic failure: the client must not be able to
/// probe for other users' expense IDs.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn delete_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<ExpenseId>,
) -> Response {
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    match remove_expense(expense_id, user_id, &connection) {
        Ok(true) => api_success(),
        Ok(false) => api_failure(
            StatusCode::FORBIDDEN,
            Some("Expense not found or unauthorized to remove."),
        ),
        Err(error) => {
            tracing::error!("Could not delete expense {expense_id}: {error}");
            api_failure(StatusCode::INTERNAL_SERVER_ERROR, None)
        }
    }
}
