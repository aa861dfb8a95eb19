//! Database initialization for the application.

use rusqlite::Connection;

use crate::{Error, expense::create_expense_table, user::create_user_table};

/// Add the tables for the application's domain models to the database.
///
/// The tables are created inside one exclusive transaction so a half
/// initialized schema is never left behind.
///
/// # Errors
/// Returns a [Error::SqlError] if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = rusqlite::Transaction::new_unchecked(
        connection,
        rusqlite::TransactionBehavior::Exclusive,
    )?;

    create_user_table(&transaction)?;
    create_expense_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).expect("Could not initialize database");

        let mut statement = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap();
        let table_names: Vec<String> = statement
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(|name| name.unwrap())
            .collect();

        assert!(table_names.contains(&"user".to_owned()));
        assert!(table_names.contains(&"expense".to_owned()));
    }

    #[test]
    fn is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).expect("Could not initialize database");
        initialize(&conn).expect("Initializing twice should not fail");
    }
}
