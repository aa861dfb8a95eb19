//! The API endpoints serving the dashboard's aggregated reads.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use time::{OffsetDateTime, UtcOffset};

use crate::{timezone::get_local_offset, user::UserID};

use super::{
    ExpenseState, api_failure,
    aggregation::{last_seven_days, recent_months, today_expenses},
    expenses_payload,
    resolve::resolve_month_by_name,
};

/// Look up the configured local offset, or respond with a generic failure.
fn local_offset_or_failure(state: &ExpenseState) -> Result<UtcOffset, Response> {
    get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("invalid local timezone {:?}", state.local_timezone);
        api_failure(StatusCode::INTERNAL_SERVER_ERROR, None)
    })
}

/// A route handler for the logged-in user's expenses since the start of the
/// local day, oldest first.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn today_expenses_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let local_offset = match local_offset_or_failure(&state) {
        Ok(offset) => offset,
        Err(response) => return response,
    };
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    match today_expenses(user_id, OffsetDateTime::now_utc(), local_offset, &connection) {
        Ok(entries) => expenses_payload(entries),
        Err(error) => {
            tracing::error!("Could not fetch today's expenses for user {user_id}: {error}");
            api_failure(StatusCode::INTERNAL_SERVER_ERROR, None)
        }
    }
}

/// A route handler for the logged-in user's last seven days of expenses,
/// grouped by date, newest date first.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn last_seven_days_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let local_offset = match local_offset_or_failure(&state) {
        Ok(offset) => offset,
        Err(response) => return response,
    };
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    match last_seven_days(user_id, OffsetDateTime::now_utc(), local_offset, &connection) {
        Ok(groups) => expenses_payload(groups),
        Err(error) => {
            tracing::error!("Could not fetch weekly expenses for user {user_id}: {error}");
            api_failure(StatusCode::INTERNAL_SERVER_ERROR, None)
        }
    }
}

/// A route handler for the logged-in user's recent month buckets, newest
/// first, bounded to the retention window.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn recent_months_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let local_offset = match local_offset_or_failure(&state) {
        Ok(offset) => offset,
        Err(response) => return response,
    };
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    match recent_months(user_id, local_offset, state.retention_months, &connection) {
        Ok(buckets) => expenses_payload(buckets),
        Err(error) => {
            tracing::error!("Could not fetch month buckets for user {user_id}: {error}");
            api_failure(StatusCode::INTERNAL_SERVER_ERROR, None)
        }
    }
}

/// A route handler resolving a month label to that month's expense details.
///
/// An unknown label is not an error: the response carries an empty list.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn month_detail_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Path(month_name): Path<String>,
) -> Response {
    let local_offset = match local_offset_or_failure(&state) {
        Ok(offset) => offset,
        Err(response) => return response,
    };
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    match resolve_month_by_name(user_id, &month_name, local_offset, &connection) {
        Ok(details) => expenses_payload(details),
        Err(error) => {
            tracing::error!(
                "Could not resolve month {month_name:?} for user {user_id}: {error}"
            );
            api_failure(StatusCode::INTERNAL_SERVER_ERROR, None)
        }
    }
}
