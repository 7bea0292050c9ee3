//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    extract::FromRef,
    middleware,
    response::Redirect,
    routing::get,
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    account::get_account_page,
    auth::{
        AuthState, auth_guard, get_log_in_page, get_log_out, get_register_page, post_log_in,
        register_user,
    },
    dashboard::get_dashboard_page,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    maintenance::get_maintenance_page,
    not_found::get_404_not_found,
    report::{get_report_page, post_report},
    transaction::{get_finance_page, post_finance},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(
            endpoints::LOG_IN_VIEW,
            get(get_log_in_page).post(post_log_in),
        )
        .route(
            endpoints::REGISTER_VIEW,
            get(get_register_page).post(register_user),
        )
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::MANAGE_ACCOUNT_VIEW, get(get_account_page))
        .route(
            endpoints::MANAGE_FINANCE_VIEW,
            get(get_finance_page).post(post_finance),
        )
        .route(
            endpoints::WRITE_REPORT_VIEW,
            get(get_report_page).post(post_report),
        )
        .route(endpoints::MAINTENANCE_VIEW, get(get_maintenance_page))
        .layer(middleware::from_fn_with_state(
            AuthState::from_ref(&state),
            auth_guard,
        ));

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the log-in page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::LOG_IN_VIEW)
}
