use rusqlite::Connection;

use crate::{
    auth::{Email, PasswordHash, UserID, create_user},
    db::initialize,
};

/// An in-memory database with all of the tables created.
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    connection
}

/// Insert a user with `email` and a dummy password hash.
#[track_caller]
pub(crate) fn create_test_user(email: &str, connection: &Connection) -> UserID {
    create_user(
        Email::new_unchecked(email),
        PasswordHash::new_unchecked("hunter2"),
        connection,
    )
    .expect("Could not create test user")
    .id
}
