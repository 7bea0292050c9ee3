//! The URIs of every page and form handler.
//!
//! Forms post back to the same path as the page that displays them.

/// The root route which redirects to the log in page.
pub const ROOT: &str = "/";
/// The route for getting the log in page and submitting the log-in form.
pub const LOG_IN_VIEW: &str = "/login";
/// The route for getting the registration page and submitting the registration form.
pub const REGISTER_VIEW: &str = "/register";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/logout";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page showing the user's account details.
pub const MANAGE_ACCOUNT_VIEW: &str = "/manage_account";
/// The page for recording a net profit entry and viewing the transaction history.
pub const MANAGE_FINANCE_VIEW: &str = "/manage_finance";
/// The page for the daily totals and monthly average report.
pub const WRITE_REPORT_VIEW: &str = "/write_report";
/// A placeholder page for maintenance tasks.
pub const MAINTENANCE_VIEW: &str = "/maintenance";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";
