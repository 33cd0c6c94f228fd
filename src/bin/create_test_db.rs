use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::macros::date;

use expense_tracker::{
    Email, PasswordHash, Transaction, TransactionKind, Username, ValidatedPassword,
    create_transaction, create_user, initialize_db,
};

/// A utility for creating a test database for the REST API server of the expense tracker.
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
    let user = create_user(
        Username::new("test")?,
        Email::new("test@example.com")?,
        password_hash,
        &conn,
    )?;

    println!("Creating sample transactions...");

    let samples = [
        (2500.0, date!(2025 - 01 - 01), "Salary", TransactionKind::Income),
        (1200.0, date!(2025 - 01 - 02), "Rent", TransactionKind::Expense),
        (85.4, date!(2025 - 01 - 05), "Groceries", TransactionKind::Expense),
        (12.5, date!(2025 - 01 - 06), "Coffee", TransactionKind::Expense),
        (150.0, date!(2025 - 01 - 10), "Freelance", TransactionKind::Income),
    ];

    for (amount, date, category, kind) in samples {
        let transaction = Transaction::build(amount, date, category)
            .kind(kind)
            .finalise()?;
        create_transaction(transaction, user.id, &conn)?;
    }

    println!("Success!");

    Ok(())
}
