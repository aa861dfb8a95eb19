//! The registration page and endpoint for creating a new user.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword, endpoints,
    html::{BUTTON_PRIMARY_STYLE, LINK_STYLE, account_form_page, base, password_input, text_input},
    internal_server_error::render_internal_server_error,
    user::create_user,
};

/// Which fields of the registration form to attach an error message to.
#[derive(Default)]
struct RegistrationErrors<'a> {
    name: Option<&'a str>,
    email: Option<&'a str>,
    password: Option<&'a str>,
}

fn registration_form(name: &str, email: &str, errors: RegistrationErrors) -> Markup {
    html! {
        form method="post" action=(endpoints::USERS) class="space-y-4 md:space-y-6"
        {
            (text_input("Name", "name", "text", name, errors.name))
            (text_input("Email", "email", "email", email, errors.email))
            (password_input(errors.password))

            button type="submit" tabindex="0" class=(BUTTON_PRIMARY_STYLE) { "Create Account" }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a href=(endpoints::LOG_IN_VIEW) tabindex="0" class=(LINK_STYLE) { "Log in here" }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let form = registration_form("", "", RegistrationErrors::default());
    let content = account_form_page("Create an Account", &form);
    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The database connection for storing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for registering a new user.
#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    /// The display name the user wants to register with.
    pub name: String,
    /// The email address the user wants to register with.
    pub email: String,
    /// The user's raw password.
    pub password: String,
}

/// A route handler for creating a new user.
///
/// Duplicate names or emails and weak passwords re-render the form with an
/// inline error; success redirects to the log in page.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn post_register(
    State(state): State<RegistrationState>,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let validated_password = match ValidatedPassword::new(&user_data.password) {
        Ok(password) => password,
        Err(error) => {
            return registration_page_with_errors(
                &user_data,
                RegistrationErrors {
                    password: Some(&error.to_string()),
                    ..Default::default()
                },
            );
        }
    };

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");

            return render_internal_server_error(
                "Sorry, something went wrong.",
                "Try again later or check the server logs.",
            );
        }
    };

    let result = create_user(
        &user_data.name,
        &user_data.email,
        password_hash,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    );

    match result {
        Ok(_) => Redirect::to(endpoints::LOG_IN_VIEW).into_response(),
        Err(error @ Error::DuplicateEmail) => registration_page_with_errors(
            &user_data,
            RegistrationErrors {
                email: Some(&error.to_string()),
                ..Default::default()
            },
        ),
        Err(error @ Error::DuplicateUsername) => registration_page_with_errors(
            &user_data,
            RegistrationErrors {
                name: Some(&error.to_string()),
                ..Default::default()
            },
        ),
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");

            render_internal_server_error(
                "Sorry, something went wrong.",
                "Try again later or check the server logs.",
            )
        }
    }
}

fn registration_page_with_errors(user_data: &RegisterForm, errors: RegistrationErrors) -> Response {
    let form = registration_form(&user_data.name, &user_data.email, errors);
    let content = account_form_page("Create an Account", &form);
    base("Register", &[], &content).into_response()
}

#[cfg(test)]
mod register_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Router,
        routing::{get, post},
    };
    use axum_test::TestServer;
    use rusqlite::Connection;
    use scraper::{Html, Selector};

    use crate::{db::initialize, endpoints, user::get_user_by_email};

    use super::{RegistrationState, get_register_page, post_register};

    const STRONG_PASSWORD: &str = "correct-llama-battery-staple";

    fn get_test_server() -> (TestServer, RegistrationState) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let state = RegistrationState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let app = Router::new()
            .route(endpoints::REGISTER_VIEW, get(get_register_page))
            .route(endpoints::USERS, post(post_register))
            .with_state(state.clone());

        (
            TestServer::new(app),
            state,
        )
    }

    #[tokio::test]
    async fn register_page_renders_the_form() {
        let (server, _) = get_test_server();

        let response = server.get(endpoints::REGISTER_VIEW).await;

        response.assert_status_ok();
        let document = Html::parse_document(&response.text());
        for name in ["name", "email", "password"] {
            let selector = Selector::parse(&format!("input[name='{name}']")).unwrap();
            assert!(
                document.select(&selector).next().is_some(),
                "form is missing the {name} input"
            );
        }
    }

    #[tokio::test]
    async fn registering_creates_a_user_and_redirects_to_log_in() {
        let (server, state) = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("name", "alice"),
                ("email", "alice@example.com"),
                ("password", STRONG_PASSWORD),
            ])
            .await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::LOG_IN_VIEW);

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_email("alice@example.com", &connection).unwrap();
        assert_eq!(user.name, "alice");
        assert!(user.password_hash.verify(STRONG_PASSWORD).unwrap());
    }

    #[tokio::test]
    async fn registering_a_duplicate_email_rerenders_with_an_error() {
        let (server, _) = get_test_server();
        server
            .post(endpoints::USERS)
            .form(&[
                ("name", "alice"),
                ("email", "alice@example.com"),
                ("password", STRONG_PASSWORD),
            ])
            .await
            .assert_status_see_other();

        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("name", "bob"),
                ("email", "alice@example.com"),
                ("password", STRONG_PASSWORD),
            ])
            .await;

        response.assert_status_ok();
        assert!(response.text().contains("Email already exists"));
    }

    #[tokio::test]
    async fn registering_a_weak_password_rerenders_with_an_error() {
        let (server, state) = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("name", "alice"),
                ("email", "alice@example.com"),
                ("password", "hunter2"),
            ])
            .await;

        response.assert_status_ok();
        assert!(response.text().contains("password is too weak"));

        let connection = state.db_connection.lock().unwrap();
        assert!(
            get_user_by_email("alice@example.com", &connection).is_err(),
            "a user with a weak password must not be created"
        );
    }
}
