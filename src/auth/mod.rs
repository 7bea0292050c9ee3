//! Everything to do with who the user is: accounts, passwords, the session
//! cookie and the middleware that guards protected pages.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod redirect;
mod register_user;
mod session;
mod token;
mod user;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{AuthState, auth_guard};
pub use password::{PasswordHash, ValidatedPassword};
pub use register_user::{get_register_page, register_user};
pub use session::Session;
pub use user::{
    DEFAULT_PASSWORD, DEFAULT_USERNAME, User, UserID, Username, create_user, create_user_table,
    seed_default_user, verify,
};

#[cfg(test)]
pub use cookie::COOKIE_TOKEN;
#[cfg(test)]
pub use user::{count_users, get_user_by_username};
