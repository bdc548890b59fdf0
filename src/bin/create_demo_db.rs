use std::{
    error::Error,
    path::Path,
    process::exit,
    sync::{Arc, Mutex},
};

use clap::Parser;
use rusqlite::Connection;

use minibank::{
    PasswordHash,
    models::{Amount, NewTransaction, Role, TransactionKind},
    stores::{
        LedgerStore, UserStore,
        sqlite::{SQLiteLedgerStore, SQLiteUserStore, initialize},
    },
};

/// A utility for creating and seeding a demo database.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path for the new SQLite database.
    #[arg(long)]
    db_path: String,
}

const BANKER_EMAIL: &str = "banker@minibank.test";
const DEMO_PASSWORD: &str = "quiet-lantern-march-42";

const DEMO_CUSTOMERS: [&str; 2] = ["alice@minibank.test", "bob@minibank.test"];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    if Path::new(&args.db_path).exists() {
        eprintln!("A file already exists at {}, aborting.", args.db_path);
        exit(1);
    }

    let conn = Connection::open(&args.db_path)?;
    initialize(&conn)?;
    let connection = Arc::new(Mutex::new(conn));

    let mut user_store = SQLiteUserStore::new(connection.clone());
    let mut ledger_store = SQLiteLedgerStore::new(connection);

    let password_hash = PasswordHash::from_raw_password(DEMO_PASSWORD, PasswordHash::DEFAULT_COST)?;

    user_store.create_user(BANKER_EMAIL, password_hash.clone(), Role::Banker)?;
    println!("Created banker {BANKER_EMAIL}");

    // Every seeded history goes through the ledger so the balances and
    // snapshots satisfy the same invariants as live data.
    let seed_transactions = [
        (TransactionKind::Deposit, 5_000.0, "Opening deposit"),
        (TransactionKind::Deposit, 2_000.0, "Paycheck"),
        (TransactionKind::Withdrawal, 500.0, "Groceries"),
    ];

    for email in DEMO_CUSTOMERS {
        let user = user_store.create_user(email, password_hash.clone(), Role::Customer)?;
        let account = ledger_store.create_account(user.id)?;

        for (kind, amount, description) in seed_transactions {
            ledger_store.post_transaction(
                account.id,
                NewTransaction {
                    kind,
                    amount: Amount::new(amount)?,
                    description: Some(description.to_owned()),
                },
            )?;
        }

        let balance = ledger_store.balance(account.id)?;
        println!("Created customer {email} with balance {balance}");
    }

    println!();
    println!("Demo database written to {}", args.db_path);
    println!("All demo users share the password: {DEMO_PASSWORD}");

    Ok(())
}
