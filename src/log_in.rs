//! The log in page and endpoint for authenticating a user.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error, endpoints,
    auth::set_auth_cookie,
    html::{BUTTON_PRIMARY_STYLE, LINK_STYLE, account_form_page, base, password_input, text_input},
    internal_server_error::render_internal_server_error,
    user::get_user_by_email,
};

const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

fn log_in_form(email: &str, redirect_url: Option<&str>, error_message: Option<&str>) -> Markup {
    html! {
        form method="post" action=(endpoints::LOG_IN_API) class="space-y-4 md:space-y-6"
        {
            (text_input("Email", "email", "email", email, None))
            (password_input(None))

            @if let Some(redirect_url) = redirect_url
            {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }

            button type="submit" tabindex="0" class=(BUTTON_PRIMARY_STYLE) { "Log In" }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Don't have an account? "

                a href=(endpoints::REGISTER_VIEW) tabindex="0" class=(LINK_STYLE) { "Register here" }
            }
        }
    }
}

/// The query parameters for the log in page.
#[derive(Deserialize)]
pub struct LogInQuery {
    /// Where to send the user after a successful log in.
    pub redirect_url: Option<String>,
}

/// Display the log in page.
pub async fn get_log_in_page(Query(query): Query<LogInQuery>) -> Response {
    let form = log_in_form("", query.redirect_url.as_deref(), None);
    let content = account_form_page("Log In", &form);
    base("Log In", &[], &content).into_response()
}

/// The state needed for logging in a user.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

/// The form data for logging in.
#[derive(Serialize, Deserialize)]
pub struct LogInForm {
    /// The email the user registered with.
    pub email: String,
    /// The user's raw password.
    pub password: String,
    /// Where to send the user after a successful log in.
    pub redirect_url: Option<String>,
}

/// A route handler for authenticating a user and starting a session.
///
/// An unknown email and a wrong password produce the same error message, so
/// the form cannot be used to probe which emails are registered.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn post_log_in(
    State(state): State<LogInState>,
    jar: PrivateCookieJar,
    Form(log_in_data): Form<LogInForm>,
) -> Response {
    let user = {
        let connection = state
            .db_connection
            .lock()
            .expect("Could not acquire database lock");

        match get_user_by_email(&log_in_data.email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return invalid_credentials_page(&log_in_data),
            Err(error) => {
                tracing::error!("An error occurred while looking up a user: {error}");

                return render_internal_server_error(
                    "Sorry, something went wrong.",
                    "Try again later or check the server logs.",
                );
            }
        }
    };

    match user.password_hash.verify(&log_in_data.password) {
        Ok(true) => {}
        Ok(false) => return invalid_credentials_page(&log_in_data),
        Err(error) => {
            tracing::error!("An error occurred while verifying a password: {error}");

            return render_internal_server_error(
                "Sorry, something went wrong.",
                "Try again later or check the server logs.",
            );
        }
    }

    let jar = match set_auth_cookie(jar, user.id, state.cookie_duration) {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("An error occurred while setting the auth cookie: {error}");

            return render_internal_server_error(
                "Sorry, something went wrong.",
                "Try again later or check the server logs.",
            );
        }
    };

    // Only same-site redirect targets are honoured.
    let redirect_target = match log_in_data.redirect_url.as_deref() {
        Some(url) if url.starts_with('/') => url,
        _ => endpoints::DASHBOARD_VIEW,
    };

    (jar, Redirect::to(redirect_target)).into_response()
}

fn invalid_credentials_page(log_in_data: &LogInForm) -> Response {
    let form = log_in_form(
        &log_in_data.email,
        log_in_data.redirect_url.as_deref(),
        Some(INVALID_CREDENTIALS_MESSAGE),
    );
    let content = account_form_page("Log In", &form);
    base("Log In", &[], &content).into_response()
}
