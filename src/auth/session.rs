//! Resolving credentials and auth cookies to the user making a request.

use axum_extra::extract::PrivateCookieJar;
use rusqlite::Connection;

use crate::{
    Error,
    auth::{
        User, UserID, Username,
        cookie::get_token_from_cookies,
        user::{get_user_by_id, verify_credentials},
    },
};

/// The logged in user, inserted into the request extensions by the auth guard.
///
/// Route handlers behind the guard can take `Extension(session): Extension<Session>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// The ID of the logged in user.
    pub user_id: UserID,
    /// The name of the logged in user.
    pub username: Username,
}

impl From<User> for Session {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
        }
    }
}

/// Check a username and password pair submitted at log-in.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] for an unknown user or wrong password.
pub fn authenticate(username: &str, password: &str, connection: &Connection) -> Result<User, Error> {
    let result = verify_credentials(username, password, connection);

    if let Err(Error::InvalidCredentials) = result {
        tracing::warn!("Failed log-in attempt for the username \"{}\"", username.trim());
    }

    result
}

/// Get the session for the auth cookie in `jar`.
///
/// # Errors
///
/// Returns [Error::Unauthenticated] if the cookie is missing, cannot be decrypted,
/// has expired or names a user that does not exist.
pub fn require_session(jar: &PrivateCookieJar, connection: &Connection) -> Result<Session, Error> {
    let token = get_token_from_cookies(jar).map_err(|_| Error::Unauthenticated)?;

    match get_user_by_id(token.user_id, connection) {
        Ok(user) => Ok(user.into()),
        Err(Error::NotFound) => {
            tracing::warn!(
                "Got a valid token for the user ID {} which does not exist",
                token.user_id
            );
            Err(Error::Unauthenticated)
        }
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod session_tests {
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use rusqlite::Connection;
    use sha2::{Digest, Sha512};
    use time::Duration;

    use crate::{
        Error,
        auth::{
            DEFAULT_COOKIE_DURATION, PasswordHash, UserID, Username, create_user,
            invalidate_auth_cookie, set_auth_cookie,
            session::{Session, authenticate, require_session},
            user::create_user_table,
        },
    };

    fn get_jar() -> PrivateCookieJar {
        PrivateCookieJar::new(Key::from(&Sha512::digest(b"session-tests")))
    }

    fn get_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_user_table(&connection).unwrap();
        connection
    }

    #[test]
    fn authenticate_returns_user() {
        let connection = get_db_connection();
        let user = create_user(
            Username::new_unchecked("alice"),
            PasswordHash::from_raw_password("correcthorse", 4).unwrap(),
            &connection,
        )
        .unwrap();

        assert_eq!(authenticate("alice", "correcthorse", &connection), Ok(user));
    }

    #[test]
    fn authenticate_rejects_wrong_password() {
        let connection = get_db_connection();
        create_user(
            Username::new_unchecked("alice"),
            PasswordHash::from_raw_password("correcthorse", 4).unwrap(),
            &connection,
        )
        .unwrap();

        assert_eq!(
            authenticate("alice", "batterystaple", &connection),
            Err(Error::InvalidCredentials)
        );
    }

    #[test]
    fn require_session_resolves_user() {
        let connection = get_db_connection();
        let user = create_user(
            Username::new_unchecked("alice"),
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();
        let jar = set_auth_cookie(get_jar(), user.id, DEFAULT_COOKIE_DURATION).unwrap();

        let session = require_session(&jar, &connection).unwrap();

        assert_eq!(
            session,
            Session {
                user_id: user.id,
                username: Username::new_unchecked("alice"),
            }
        );
    }

    #[test]
    fn require_session_fails_without_cookie() {
        let connection = get_db_connection();

        assert_eq!(
            require_session(&get_jar(), &connection),
            Err(Error::Unauthenticated)
        );
    }

    #[test]
    fn require_session_fails_for_deleted_cookie() {
        let connection = get_db_connection();
        let user = create_user(
            Username::new_unchecked("alice"),
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();
        let jar = set_auth_cookie(get_jar(), user.id, DEFAULT_COOKIE_DURATION).unwrap();
        let jar = invalidate_auth_cookie(jar);

        assert_eq!(
            require_session(&jar, &connection),
            Err(Error::Unauthenticated)
        );
    }

    #[test]
    fn require_session_fails_for_expired_cookie() {
        let connection = get_db_connection();
        let user = create_user(
            Username::new_unchecked("alice"),
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();
        let jar = set_auth_cookie(get_jar(), user.id, Duration::seconds(-1)).unwrap();

        assert_eq!(
            require_session(&jar, &connection),
            Err(Error::Unauthenticated)
        );
    }

    #[test]
    fn require_session_fails_for_unknown_user() {
        let connection = get_db_connection();
        let jar = set_auth_cookie(get_jar(), UserID::new(42), DEFAULT_COOKIE_DURATION).unwrap();

        assert_eq!(
            require_session(&jar, &connection),
            Err(Error::Unauthenticated)
        );
    }
}
