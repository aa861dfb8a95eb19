//! The 500 internal server error page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::html;

use crate::html::{PAGE_CONTAINER_STYLE, base};

/// Render the internal server error page with a `description` of what went
/// wrong and a suggested `fix`.
pub fn render_internal_server_error(description: &str, fix: &str) -> Response {
    let content = html! {
        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold" { "500 Internal Server Error" }

            p { (description) }
            p { (fix) }
        }
    };

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        base("Error", &[], &content),
    )
        .into_response()
}

/// A route handler for displaying the generic internal server error page.
pub async fn get_internal_server_error_page() -> Response {
    render_internal_server_error(
        "Sorry, something went wrong.",
        "Try again later or check the server logs.",
    )
}
