//! The API endpoint for recording a new expense.

use axum::{Extension, Json, extract::State, http::StatusCode, response::Response};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{Error, timezone::get_local_offset, user::UserID};

use super::{ExpenseState, api_failure, api_success, lifecycle::record_expense};

/// The JSON body for creating an expense.
///
/// Both fields are optional at the wire level so a missing field can be
/// reported as a validation failure instead of a deserialization error.
#[derive(Debug, Deserialize)]
pub struct CreateExpenseBody {
    /// What the money was spent on.
    pub reason: Option<String>,
    /// How much money was spent.
    pub amount: Option<f64>,
}

/// A route handler for recording a new expense for the logged-in user.
///
/// The owner is taken from the request extensions put there by the auth
/// middleware, never from the request body.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn create_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Json(body): Json<CreateExpenseBody>,
) -> Response {
    let local_offset = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => {
            tracing::error!("invalid local timezone {:?}", state.local_timezone);
            return api_failure(StatusCode::INTERNAL_SERVER_ERROR, None);
        }
    };

    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    match record_expense(
        user_id,
        body.reason,
        body.amount,
        OffsetDateTime::now_utc(),
        local_offset,
        state.retention_months,
        &connection,
    ) {
        Ok(_) => api_success(),
        Err(error @ Error::MissingField(_)) => {
            api_failure(StatusCode::BAD_REQUEST, Some(&error.to_string()))
        }
        Err(error) => {
            tracing::error!("Could not record expense for user {user_id}: {error}");
            api_failure(StatusCode::INTERNAL_SERVER_ERROR, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, middleware, routing::post};
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{
        expense::{ExpenseState, get_expenses},
        user::UserID,
    };

    use super::create_expense_endpoint;

    use crate::expense::store::test_utils::{create_test_user, get_test_connection};

    fn get_test_server(state: ExpenseState, user_id: UserID) -> TestServer {
        // Stand-in for the auth guard: inject the owner directly.
        let app = Router::new()
            .route("/api/expenses", post(create_expense_endpoint))
            .layer(middleware::from_fn(
                move |mut request: axum::extract::Request, next: middleware::Next| async move {
                    request.extensions_mut().insert(user_id);
                    next.run(request).await
                },
            ))
            .with_state(state);

        TestServer::new(app)
    }

    fn get_test_state() -> (ExpenseState, UserID) {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);

        (
            ExpenseState {
                db_connection: Arc::new(Mutex::new(conn)),
                local_timezone: "Etc/UTC".to_owned(),
                retention_months: 6,
            },
            user_id,
        )
    }

    #[tokio::test]
    async fn create_succeeds_with_valid_body() {
        let (state, user_id) = get_test_state();
        let db_connection = state.db_connection.clone();
        let server = get_test_server(state, user_id);

        let response = server
            .post("/api/expenses")
            .json(&json!({ "reason": "groceries", "amount": 42.5 }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], json!(true));

        let connection = db_connection.lock().unwrap();
        let expenses = get_expenses(user_id, None, &connection).unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].reason.as_deref(), Some("groceries"));
    }

    #[tokio::test]
    async fn create_fails_with_missing_amount() {
        let (state, user_id) = get_test_state();
        let db_connection = state.db_connection.clone();
        let server = get_test_server(state, user_id);

        let response = server
            .post("/api/expenses")
            .json(&json!({ "reason": "groceries" }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["success"], json!(false));
        assert!(body["message"].as_str().unwrap().contains("amount"));

        let connection = db_connection.lock().unwrap();
        assert_eq!(
            get_expenses(user_id, None, &connection).unwrap(),
            vec![],
            "a rejected expense must not be persisted"
        );
    }

    #[tokio::test]
    async fn create_fails_with_missing_reason() {
        let (state, user_id) = get_test_state();
        let server = get_test_server(state, user_id);

        let response = server
            .post("/api/expenses")
            .json(&json!({ "amount": 1.0 }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert!(body["message"].as_str().unwrap().contains("reason"));
    }
}
