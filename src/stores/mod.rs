//! Contains traits and implementations for objects that store the domain
//! [models](crate::models).

mod ledger;
mod memory;
mod user;

pub mod sqlite;

pub use ledger::{LedgerStore, SortOrder, TransactionFilter};
pub use memory::{InMemoryLedgerStore, InMemoryUserStore};
pub use user::UserStore;
