//! The landing page shown after logging in.

use axum::{
    Extension,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    auth::Session,
    endpoints,
    html::{PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
};

fn shortcut_card(url: &str, title: &str, description: &str) -> Markup {
    html! {
        a
            href=(url)
            class="block p-6 bg-white border border-gray-200 rounded-lg shadow-sm
                hover:bg-gray-100 dark:bg-gray-800 dark:border-gray-700
                dark:hover:bg-gray-700"
        {
            h2 class="mb-2 text-xl font-bold tracking-tight text-gray-900 dark:text-white"
            {
                (title)
            }

            p class="font-normal text-gray-700 dark:text-gray-400" { (description) }
        }
    }
}

/// Display a page greeting the logged in user.
pub async fn get_dashboard_page(Extension(session): Extension<Session>) -> Response {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-2xl space-y-8"
            {
                h1 class="text-2xl font-bold" { "Welcome, " (session.username) "!" }

                div class="grid gap-4 sm:grid-cols-2"
                {
                    (shortcut_card(
                        endpoints::MANAGE_FINANCE_VIEW,
                        "Manage finance",
                        "Record your income, interest, losses and loans."
                    ))
                    (shortcut_card(
                        endpoints::WRITE_REPORT_VIEW,
                        "Write report",
                        "See the totals for a day and the average for its month."
                    ))
                }
            }
        }
    };

    base("Dashboard", &[], &content).into_response()
}
