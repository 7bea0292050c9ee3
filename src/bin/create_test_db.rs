use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use fintrack::{
    DEFAULT_PASSWORD, DEFAULT_USERNAME, NewTransaction, PasswordHash, initialize_db,
    record_transaction, seed_default_user,
};

/// A utility for creating a test database for the fintrack server.
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

    println!("Creating test user \"{DEFAULT_USERNAME}\" with password \"{DEFAULT_PASSWORD}\"...");

    let Some(user) = seed_default_user(&conn, PasswordHash::DEFAULT_COST)? else {
        eprintln!("The test user already exists!");
        exit(1);
    };

    println!("Creating sample transactions...");

    let now = OffsetDateTime::now_utc();
    let sample_amounts = [120.0, -45.5, 80.0, -12.0, 250.0, -99.99, 33.3];

    for day in 0..60_i64 {
        let amount = sample_amounts[day as usize % sample_amounts.len()];
        let transaction_type = if amount < 0.0 { "expense" } else { "financial_data" };
        let transaction = NewTransaction::new(user.id, amount)
            .transaction_type(transaction_type)
            .transaction_date(Some(now - Duration::days(day)));

        record_transaction(transaction, &conn)?;
    }

    println!("Success!");

    Ok(())
}
