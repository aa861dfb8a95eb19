//! Shared maud templates and style constants used across views.

use maud::{DOCTYPE, Markup, html};

/// Link styles.
pub const LINK_STYLE: &str = "text-blue-600 hover:text-blue-500 \
    dark:text-blue-500 dark:hover:text-blue-400 underline";

/// Primary button styles.
pub const BUTTON_PRIMARY_STYLE: &str = "w-full px-4 py-2 bg-blue-500 \
    dark:bg-blue-600 disabled:bg-blue-700 hover:enabled:bg-blue-600 \
    hover:enabled:dark:bg-blue-700 text-white rounded";

/// Form label styles.
pub const FORM_LABEL_STYLE: &str = "block mb-2 text-sm font-medium text-gray-900 dark:text-white";

/// Form text input styles.
pub const FORM_TEXT_INPUT_STYLE: &str = "block w-full p-2.5 rounded text-sm \
    text-gray-900 dark:text-white bg-gray-50 dark:bg-gray-700 border \
    border-gray-300 dark:border-gray-600 dark:placeholder-gray-400 \
    focus:ring-blue-600 focus:border-blue-600";

/// Page container styles.
pub const PAGE_CONTAINER_STYLE: &str =
    "flex flex-col items-center px-6 py-8 mx-auto lg:py-5 text-gray-900 dark:text-white";

/// The shared page skeleton.
///
/// `scripts` is a list of script URLs to load with `defer` in the head.
pub fn base(title: &str, scripts: &[&str], content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - Spendlog" }
                link href="/static/style.css" rel="stylesheet";

                @for script in scripts
                {
                    script src=(script) defer {}
                }
            }

            body class="container max-w-full min-h-screen bg-gray-50 dark:bg-gray-900"
            {
                (content)
            }
        }
    }
}

/// A labelled text-like input with an optional inline error message.
pub fn text_input(
    label: &str,
    name: &str,
    input_type: &str,
    value: &str,
    error_message: Option<&str>,
) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            input
                type=(input_type)
                name=(name)
                id=(name)
                value=(value)
                class=(FORM_TEXT_INPUT_STYLE)
                required
                autofocus[error_message.is_some()]
            ;

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

/// A labelled password input with an optional inline error message.
pub fn password_input(error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label for="password" class=(FORM_LABEL_STYLE) { "Password" }

            input
                type="password"
                name="password"
                id="password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                autofocus[error_message.is_some()]
            ;

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

/// The centred single-form layout used by the log in and register pages.
pub fn account_form_page(heading: &str, form: &Markup) -> Markup {
    html! {
        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-md bg-white rounded shadow dark:border dark:bg-gray-800 dark:border-gray-700 p-6 space-y-4"
            {
                h1 class="text-xl font-bold leading-tight tracking-tight md:text-2xl" { (heading) }

                (form)
            }
        }
    }
}

#[cfg(test)]
mod base_tests {
    use scraper::{Html, Selector};

    use super::{base, html};

    #[test]
    fn base_includes_title_and_scripts() {
        let markup = base(
            "Dashboard",
            &["/static/dashboard.js"],
            &html! { p { "hello" } },
        );

        let document = Html::parse_document(&markup.into_string());

        let title_selector = Selector::parse("title").unwrap();
        let title = document.select(&title_selector).next().unwrap();
        assert_eq!(title.inner_html(), "Dashboard - Spendlog");

        let script_selector = Selector::parse("script[src='/static/dashboard.js']").unwrap();
        assert!(document.select(&script_selector).next().is_some());
    }
}
