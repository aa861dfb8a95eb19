use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use spendlog::{
    NewExpense, PasswordHash, ValidatedPassword, create_user, initialize_db, insert_expense,
};

/// A utility for creating a test database for the spendlog server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;

    let user = create_user("test", "test@example.com", password_hash, &conn)?;

    println!("Creating sample expenses...");

    let now = OffsetDateTime::now_utc();
    let sample_expenses = [
        ("Coffee", 4.5, now - Duration::hours(2)),
        ("Groceries", 62.3, now - Duration::hours(5)),
        ("Bus fare", 3.2, now - Duration::days(1)),
        ("Lunch", 15.0, now - Duration::days(3)),
        ("Petrol", 80.0, now - Duration::days(6)),
        ("Rent", 450.0, now - Duration::weeks(4)),
        ("Power bill", 120.0, now - Duration::weeks(8)),
        ("Car service", 340.0, now - Duration::weeks(13)),
        ("Concert tickets", 95.0, now - Duration::weeks(17)),
    ];

    for (reason, amount, timestamp) in sample_expenses {
        insert_expense(
            NewExpense {
                user_id: user.id,
                reason: Some(reason.to_owned()),
                amount: Some(amount),
                timestamp,
            },
            &conn,
        )?;
    }

    println!("Success!");

    Ok(())
}
