//! The dashboard page for logged in users.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::html;
use rusqlite::Connection;
use time::{Date, OffsetDateTime, Weekday, macros::format_description};

use crate::{
    AppState, endpoints,
    html::{FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base},
    timezone::get_local_offset,
    user::{UserID, get_user_by_id},
};

/// The state needed to display the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for looking up the logged-in user.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Format a date the way the dashboard greeting shows it, e.g.
/// "05-08-2026: Wed".
fn format_greeting_date(date: Date) -> String {
    let formatted_date = date
        .format(format_description!("[day]-[month]-[year]"))
        .unwrap_or_default();

    format!("{}: {}", formatted_date, short_weekday(date.weekday()))
}

fn short_weekday(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Monday => "Mon",
        Weekday::Tuesday => "Tue",
        Weekday::Wednesday => "Wed",
        Weekday::Thursday => "Thu",
        Weekday::Friday => "Fri",
        Weekday::Saturday => "Sat",
        Weekday::Sunday => "Sun",
    }
}

/// Display the dashboard page.
///
/// The page is a shell: the aggregated expense data is fetched by
/// `static/dashboard.js` through the JSON API.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let user = {
        let connection = state
            .db_connection
            .lock()
            .expect("Could not acquire database lock");

        match get_user_by_id(user_id, &connection) {
            Ok(user) => user,
            Err(error) => return error.into_response(),
        }
    };

    let local_offset = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => {
            return crate::Error::InvalidTimezoneError(state.local_timezone).into_response();
        }
    };
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let content = html! {
        main class=(PAGE_CONTAINER_STYLE)
        {
            header class="w-full max-w-2xl flex items-center justify-between"
            {
                div
                {
                    h1 class="text-2xl font-bold" { "Hello, " (user.name) "!" }
                    p class="text-sm text-gray-500 dark:text-gray-400" { (format_greeting_date(today)) }
                }

                a href=(endpoints::LOG_OUT) class=(LINK_STYLE) { "Log out" }
            }

            section class="w-full max-w-2xl mt-6"
            {
                h2 class="text-lg font-semibold" { "Add an expense" }

                div class="flex gap-2 items-end"
                {
                    div class="grow"
                    {
                        label for="reason" class=(FORM_LABEL_STYLE) { "Reason" }
                        input type="text" id="reason" name="reason" class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div
                    {
                        label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }
                        input type="number" id="amount" name="amount" step="0.01" min="0" class=(FORM_TEXT_INPUT_STYLE);
                    }

                    button
                        type="button" id="add-expense-button"
                        class="px-4 py-2 bg-blue-500 dark:bg-blue-600 hover:bg-blue-600 text-white rounded"
                    {
                        "Add"
                    }
                }
            }

            section class="w-full max-w-2xl mt-6"
            {
                h2 class="text-lg font-semibold" { "Today" }
                ul id="today-expenses" class="divide-y divide-gray-200 dark:divide-gray-700" {}
            }

            section class="w-full max-w-2xl mt-6"
            {
                h2 class="text-lg font-semibold" { "Last 7 days" }
                div id="last-seven-days" {}
            }

            section class="w-full max-w-2xl mt-6"
            {
                h2 class="text-lg font-semibold" { "Recent months" }
                div id="recent-months" {}
                div id="month-detail" {}
            }
        }
    };

    base("Dashboard", &["/static/dashboard.js"], &content).into_response()
}
