//! Fintrack is a web app for recording income and expenses and viewing
//! simple daily and monthly reports.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::response::{IntoResponse, Redirect, Response};
use axum_server::Handle;
use tokio::signal;

mod account;
mod app_state;
mod auth;
mod dashboard;
mod db;
mod endpoints;
mod html;
mod internal_server_error;
mod logging;
mod maintenance;
mod navigation;
mod not_found;
mod report;
mod routing;
#[cfg(test)]
mod test_utils;
mod timezone;
mod transaction;

pub use app_state::AppState;
pub use auth::{
    DEFAULT_PASSWORD, DEFAULT_USERNAME, PasswordHash, User, UserID, Username, ValidatedPassword,
    create_user, seed_default_user, verify,
};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use timezone::get_timezone;
pub use transaction::{NewTransaction, Transaction, record_transaction};

use crate::{internal_server_error::InternalServerError, not_found::get_404_not_found_response};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The username and password pair did not match a registered user.
    ///
    /// The message is the same whether or not the username exists.
    #[error("Invalid username or password.")]
    InvalidCredentials,

    /// Tried to register a username that is already taken.
    #[error("The username \"{0}\" is already taken.")]
    DuplicateUsername(String),

    /// The request did not carry a valid session.
    ///
    /// Route handlers should redirect the client to the log-in page instead
    /// of running the requested operation.
    #[error("You must be logged in to do that.")]
    Unauthenticated,

    /// A form field that should hold a number could not be parsed as a
    /// finite number.
    ///
    /// The string is the name of the offending field.
    #[error("{0} must be a number.")]
    InvalidAmount(String),

    /// A date or date-time string could not be parsed.
    #[error("Could not understand the date \"{0}\".")]
    InvalidDate(String),

    /// An empty (or whitespace only) string was used as a username.
    #[error("Username cannot be empty.")]
    EmptyUsername,

    /// The username is longer than [Username::MAX_LENGTH] characters.
    #[error("Username cannot be longer than {max} characters.", max = Username::MAX_LENGTH)]
    UsernameTooLong,

    /// An empty string was used as a password.
    #[error("Password cannot be empty.")]
    EmptyPassword,

    /// Either the token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error formatting the date in the cookie or creating the
    /// new expiry date time.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not format expiry cookie date-time string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows or a
    /// foreign key does not refer to an existing row.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::Unauthenticated => Redirect::to(endpoints::LOG_IN_VIEW).into_response(),
            Error::InvalidTimezoneError(timezone) => {
                let fix = format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                );

                InternalServerError {
                    description: "Invalid Timezone Settings",
                    fix: &fix,
                }
                .into_response()
            }
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}
