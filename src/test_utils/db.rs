use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    auth::{PasswordHash, User, Username, ValidatedPassword, create_user},
    db::initialize,
};

/// An initialized in-memory database without any users.
pub(crate) fn get_test_connection() -> Arc<Mutex<Connection>> {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");
    initialize(&connection).expect("Could not initialize database.");

    Arc::new(Mutex::new(connection))
}

/// Register `username` with `password`, using a cheap hash cost to keep tests fast.
#[track_caller]
pub(crate) fn create_test_user(
    username: &str,
    password: &str,
    db_connection: &Mutex<Connection>,
) -> User {
    let password_hash = PasswordHash::new(ValidatedPassword::new_unchecked(password), 4)
        .expect("Could not hash password");
    let connection = db_connection.lock().unwrap();

    create_user(Username::new_unchecked(username), password_hash, &connection)
        .expect("Could not create test user")
}
