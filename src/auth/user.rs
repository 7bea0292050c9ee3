//! Code for creating the user table, registering users and checking their credentials.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::{PasswordHash, ValidatedPassword},
};

/// The username of the account created when the server first starts.
pub const DEFAULT_USERNAME: &str = "me";

/// The password of the account created when the server first starts.
///
/// This account exists for demonstration only.
pub const DEFAULT_PASSWORD: &str = "12345678";

/// A bcrypt hash that is checked against when a username does not exist, so that a
/// missing user costs the same amount of work as a wrong password.
const DUMMY_PASSWORD_HASH: &str = "$2b$12$Gwf0uvxH3L7JLfo0CC/NCOoijK2vQ/wbgP.LeNup8vj6gg31IiFkm";

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The name a user logs in with.
///
/// Usernames have leading and trailing whitespace removed, must not be empty
/// and can be at most [Username::MAX_LENGTH] characters long.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Username(String);

impl Username {
    /// The maximum number of characters in a username.
    pub const MAX_LENGTH: usize = 80;

    /// Create a username from user input.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyUsername] if `raw_username` is empty after trimming
    /// or [Error::UsernameTooLong] if it is longer than [Username::MAX_LENGTH].
    pub fn new(raw_username: &str) -> Result<Self, Error> {
        let username = raw_username.trim();

        if username.is_empty() {
            return Err(Error::EmptyUsername);
        }

        if username.chars().count() > Self::MAX_LENGTH {
            return Err(Error::UsernameTooLong);
        }

        Ok(Self(username.to_owned()))
    }

    /// Create a username without any validation.
    ///
    /// The caller should ensure that `raw_username` is a valid username.
    pub fn new_unchecked(raw_username: &str) -> Self {
        Self(raw_username.to_owned())
    }

    /// The username as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The unique name the user logs in with.
    pub username: Username,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateUsername] if `username` is already taken,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(
    username: Username,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    connection
        .execute(
            "INSERT INTO user (username, password) VALUES (?1, ?2)",
            (username.as_str(), password_hash.to_string()),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateUsername(username.to_string()),
            error => error.into(),
        })?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        username,
        password_hash,
    })
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let raw_username: String = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;

    Ok(User {
        id: UserID::new(raw_id),
        username: Username::new_unchecked(&raw_username),
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, password FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user from the database with the name `username`.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has that name.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, password FROM user WHERE username = :username")?
        .query_row(&[(":username", &username)], map_user_row)
        .map_err(|error| error.into())
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    let count: i64 = connection.query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))?;

    Ok(count as usize)
}

/// Look up `username` and check `password` against the stored hash.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if the user does not exist or the password is wrong.
/// The two cases are not distinguished.
pub fn verify_credentials(
    username: &str,
    password: &str,
    connection: &Connection,
) -> Result<User, Error> {
    let user = match get_user_by_username(username.trim(), connection) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            let _ = PasswordHash::new_unchecked(DUMMY_PASSWORD_HASH).verify(password);
            return Err(Error::InvalidCredentials);
        }
        Err(error) => return Err(error),
    };

    match user.password_hash.verify(password) {
        Ok(true) => Ok(user),
        Ok(false) => Err(Error::InvalidCredentials),
        Err(error) => Err(Error::HashingError(error.to_string())),
    }
}

/// Whether `password` is the password of the user called `username`.
///
/// Unknown users and internal errors both give `false`, the latter is logged.
pub fn verify(username: &str, password: &str, connection: &Connection) -> bool {
    match verify_credentials(username, password, connection) {
        Ok(_) => true,
        Err(Error::InvalidCredentials) => false,
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            false
        }
    }
}

/// Create the demonstration user [DEFAULT_USERNAME] if it does not exist yet.
///
/// Returns the new user, or `None` if the user already existed.
///
/// # Errors
///
/// Returns an error if the password could not be hashed or there was an SQL error.
pub fn seed_default_user(connection: &Connection, cost: u32) -> Result<Option<User>, Error> {
    match get_user_by_username(DEFAULT_USERNAME, connection) {
        Ok(_) => return Ok(None),
        Err(Error::NotFound) => {}
        Err(error) => return Err(error),
    }

    let password_hash = PasswordHash::new(ValidatedPassword::new_unchecked(DEFAULT_PASSWORD), cost)?;
    let user = create_user(
        Username::new_unchecked(DEFAULT_USERNAME),
        password_hash,
        connection,
    )?;

    tracing::warn!(
        "Created the demonstration user \"{DEFAULT_USERNAME}\" with the default password. \
        Do not expose this server publicly with this account."
    );

    Ok(Some(user))
}


#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        auth::{
            PasswordHash, Username,
            user::{
                DEFAULT_PASSWORD, DEFAULT_USERNAME, UserID, count_users, create_user,
                create_user_table, get_user_by_id, get_user_by_username, seed_default_user,
                verify, verify_credentials,
            },
        },
    };

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    fn create_test_user(username: &str, password: &str, connection: &Connection) {
        create_user(
            Username::new_unchecked(username),
            PasswordHash::from_raw_password(password, 4).unwrap(),
            connection,
        )
        .expect("Could not create test user");
    }

    #[test]
    fn insert_user_succeeds() {
        let db_connection = get_db_connection();
        let password_hash = PasswordHash::new_unchecked("hunter2");

        let inserted_user = create_user(
            Username::new_unchecked("alice"),
            password_hash.clone(),
            &db_connection,
        )
        .unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.username.as_str(), "alice");
        assert_eq!(inserted_user.password_hash, password_hash);
    }

    #[test]
    fn insert_duplicate_username_fails() {
        let db_connection = get_db_connection();
        let first_user = create_user(
            Username::new_unchecked("alice"),
            PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        )
        .unwrap();

        let result = create_user(
            Username::new_unchecked("alice"),
            PasswordHash::new_unchecked("hunter3"),
            &db_connection,
        );

        assert_eq!(result, Err(Error::DuplicateUsername("alice".to_owned())));
        assert_eq!(count_users(&db_connection).unwrap(), 1);
        assert_eq!(
            get_user_by_id(first_user.id, &db_connection).unwrap(),
            first_user,
            "the first user should be unaffected by the failed registration"
        );
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let db_connection = get_db_connection();

        let id = UserID::new(42);

        assert_eq!(get_user_by_id(id, &db_connection), Err(Error::NotFound));
    }

    #[test]
    fn get_user_succeeds_with_existing_id() {
        let db_connection = get_db_connection();
        let test_user = create_user(
            Username::new_unchecked("alice"),
            PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        )
        .unwrap();

        let retrieved_user = get_user_by_id(test_user.id, &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_by_username_succeeds() {
        let db_connection = get_db_connection();
        let test_user = create_user(
            Username::new_unchecked("alice"),
            PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        )
        .unwrap();

        let retrieved_user = get_user_by_username("alice", &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn returns_correct_count() {
        let db_connection = get_db_connection();

        let count = count_users(&db_connection).expect("Could not get user count");
        assert_eq!(0, count, "Want zero users before insertion, got {count}");

        create_user(
            Username::new_unchecked("alice"),
            PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        )
        .unwrap();

        let count = count_users(&db_connection).expect("Could not get user count");
        assert_eq!(1, count, "Want one user after insertion, got {count}");
    }

    #[test]
    fn verify_accepts_correct_password() {
        let db_connection = get_db_connection();
        create_test_user("alice", "correcthorse", &db_connection);

        assert!(verify("alice", "correcthorse", &db_connection));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let db_connection = get_db_connection();
        create_test_user("alice", "correcthorse", &db_connection);

        for wrong_password in ["", "correcthors", "CORRECTHORSE", "correcthorse "] {
            assert!(
                !verify("alice", wrong_password, &db_connection),
                "want {wrong_password:?} to be rejected"
            );
        }
    }

    #[test]
    fn verify_rejects_unknown_user() {
        let db_connection = get_db_connection();
        create_test_user("alice", "correcthorse", &db_connection);

        assert!(!verify("bob", "correcthorse", &db_connection));
    }

    #[test]
    fn unknown_user_and_wrong_password_give_same_error() {
        let db_connection = get_db_connection();
        create_test_user("alice", "correcthorse", &db_connection);

        let wrong_password = verify_credentials("alice", "batterystaple", &db_connection);
        let unknown_user = verify_credentials("bob", "correcthorse", &db_connection);

        assert_eq!(wrong_password, Err(Error::InvalidCredentials));
        assert_eq!(unknown_user, Err(Error::InvalidCredentials));
    }

    #[test]
    fn seed_creates_default_user_once() {
        let db_connection = get_db_connection();

        let first_run = seed_default_user(&db_connection, 4).unwrap();
        let second_run = seed_default_user(&db_connection, 4).unwrap();

        assert!(first_run.is_some());
        assert_eq!(second_run, None);
        assert_eq!(count_users(&db_connection).unwrap(), 1);
        assert!(verify(DEFAULT_USERNAME, DEFAULT_PASSWORD, &db_connection));
    }

    #[test]
    fn seed_keeps_existing_users() {
        let db_connection = get_db_connection();
        create_test_user("alice", "correcthorse", &db_connection);

        seed_default_user(&db_connection, 4).unwrap();

        assert_eq!(count_users(&db_connection).unwrap(), 2);
        assert!(get_user_by_username(DEFAULT_USERNAME, &db_connection).is_ok());
    }
}
