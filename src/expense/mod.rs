//! Expense tracking for the application.
//!
//! This module contains everything related to expenses:
//! - The `Expense` model and the SQLite queries that store it
//! - The retention sweep that bounds history to a rolling month window
//! - Aggregation into day and calendar-month buckets
//! - Month-name resolution back to a concrete bucket
//! - The JSON API handlers the dashboard talks to

use std::sync::{Arc, Mutex};

use axum::{Json, extract::FromRef, http::StatusCode, response::{IntoResponse, Response}};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;

use crate::AppState;

mod aggregation;
mod create_endpoint;
mod delete_endpoint;
mod lifecycle;
mod read_endpoints;
mod resolve;
mod retention;
mod store;

pub use aggregation::{
    DayDetail, DayGroup, ExpenseEntry, MonthBucket, MonthDetail, bucket_by_month,
    last_seven_days, month_display_name, recent_months, today_expenses,
};
pub use create_endpoint::create_expense_endpoint;
pub use delete_endpoint::delete_expense_endpoint;
pub use lifecycle::{record_expense, remove_expense};
pub use read_endpoints::{
    last_seven_days_endpoint, month_detail_endpoint, recent_months_endpoint,
    today_expenses_endpoint,
};
pub use resolve::resolve_month_by_name;
pub use retention::{DEFAULT_RETENTION_MONTHS, sweep_expired_months};
pub use store::{
    Expense, NewExpense, create_expense_table, delete_expense, get_expenses, insert_expense,
    map_expense_row,
};

/// The state needed by the expense API handlers.
#[derive(Debug, Clone)]
pub struct ExpenseState {
    /// The database connection for reading and writing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// How many most-recent calendar months of history to retain.
    pub retention_months: usize,
}

impl FromRef<AppState> for ExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            retention_months: state.retention_months,
        }
    }
}

/// A `{"success": true}` JSON response.
pub(crate) fn api_success() -> Response {
    Json(json!({ "success": true })).into_response()
}

/// A `{"success": false}` JSON response, optionally with a message for the
/// client.
pub(crate) fn api_failure(status_code: StatusCode, message: Option<&str>) -> Response {
    let body = match message {
        Some(message) => json!({ "success": false, "message": message }),
        None => json!({ "success": false }),
    };

    (status_code, Json(body)).into_response()
}

/// A `{"expenses": ...}` JSON response wrapping an aggregation result.
pub(crate) fn expenses_payload(expenses: impl Serialize) -> Response {
    Json(json!({ "expenses": expenses })).into_response()
}
