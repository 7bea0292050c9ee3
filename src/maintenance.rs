//! A static page telling the user which features are still being worked on.

use axum::{
    Extension,
    response::{IntoResponse, Response},
};
use maud::html;

use crate::{
    auth::Session,
    endpoints,
    html::{PAGE_CONTAINER_STYLE, base, link},
    navigation::NavBar,
};

/// Display the maintenance page.
pub async fn get_maintenance_page(Extension(session): Extension<Session>) -> Response {
    let nav_bar = NavBar::new(endpoints::MAINTENANCE_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-2xl space-y-4"
            {
                h1 class="text-2xl font-bold" { "Maintenance" }

                p
                {
                    "Sorry " (session.username) ", this part of Fintrack is under maintenance. "
                    "In the meantime you can still "
                    (link(endpoints::MANAGE_FINANCE_VIEW, "record your finances"))
                    "."
                }
            }
        }
    };

    base("Maintenance", &[], &content).into_response()
}
