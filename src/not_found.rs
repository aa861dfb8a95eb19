//! The 404 not found page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::html;

use crate::{
    endpoints,
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, base},
};

/// A fallback route handler that renders the 404 not found page.
pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

/// Get a response containing the rendered 404 not found page.
pub fn get_404_not_found_response() -> Response {
    let content = html! {
        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold" { "404 Not Found" }

            p
            {
                "The page you were looking for does not exist. "

                a href=(endpoints::DASHBOARD_VIEW) class=(LINK_STYLE) { "Back to the dashboard" }
            }
        }
    };

    (StatusCode::NOT_FOUND, base("Not Found", &[], &content)).into_response()
}
