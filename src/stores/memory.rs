//! Implements in-memory backed stores.
//!
//! The stores are explicit objects holding their data behind shared handles,
//! so tests get isolation by creating a fresh store per test. The inner
//! mutex is held across the whole read-validate-write sequence of
//! [LedgerStore::post_transaction], which serializes concurrent posts.

use std::sync::{Arc, Mutex};

use crate::{
    Error,
    models::{
        Account, AccountID, DatabaseID, NewTransaction, PasswordHash, Role, Transaction, User,
        UserID, balance_after, next_timestamp,
    },
    stores::{LedgerStore, SortOrder, TransactionFilter, UserStore},
};

/// Stores accounts and their transactions in memory.
///
/// Cloning the store produces a handle to the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    inner: Arc<Mutex<LedgerData>>,
}

#[derive(Debug, Default)]
struct LedgerData {
    accounts: Vec<Account>,
    transactions: Vec<Transaction>,
}

impl InMemoryLedgerStore {
    /// Create a new, empty in-memory ledger store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn create_account(&mut self, owner: UserID) -> Result<Account, Error> {
        let mut data = self.inner.lock().unwrap();

        if data.accounts.iter().any(|account| account.user_id == owner) {
            return Err(Error::DuplicateAccount);
        }

        let account = Account {
            id: AccountID::new(data.accounts.len() as i64 + 1),
            user_id: owner,
            balance: 0.0,
        };
        data.accounts.push(account.clone());

        Ok(account)
    }

    fn account(&self, id: AccountID) -> Result<Account, Error> {
        self.inner
            .lock()
            .unwrap()
            .accounts
            .iter()
            .find(|account| account.id == id)
            .cloned()
            .ok_or(Error::NotFound)
    }

    fn account_of(&self, owner: UserID) -> Result<Account, Error> {
        self.inner
            .lock()
            .unwrap()
            .accounts
            .iter()
            .find(|account| account.user_id == owner)
            .cloned()
            .ok_or(Error::NotFound)
    }

    fn accounts(&self) -> Result<Vec<Account>, Error> {
        Ok(self.inner.lock().unwrap().accounts.clone())
    }

    fn post_transaction(
        &mut self,
        account_id: AccountID,
        new_transaction: NewTransaction,
    ) -> Result<Transaction, Error> {
        // The lock is held for the whole read-validate-write sequence.
        let mut data = self.inner.lock().unwrap();

        let account_index = data
            .accounts
            .iter()
            .position(|account| account.id == account_id)
            .ok_or(Error::NotFound)?;

        let new_balance = balance_after(
            data.accounts[account_index].balance,
            new_transaction.kind,
            new_transaction.amount,
        )?;
        let last_created_at = data
            .transactions
            .iter()
            .rev()
            .find(|transaction| transaction.account_id == account_id)
            .map(|transaction| transaction.created_at);

        let transaction = Transaction {
            id: data.transactions.len() as DatabaseID + 1,
            account_id,
            kind: new_transaction.kind,
            amount: new_transaction.amount.as_f64(),
            description: new_transaction.description,
            balance_after: new_balance,
            created_at: next_timestamp(last_created_at),
        };

        data.accounts[account_index].balance = new_balance;
        data.transactions.push(transaction.clone());

        Ok(transaction)
    }

    fn balance(&self, account_id: AccountID) -> Result<f64, Error> {
        self.account(account_id).map(|account| account.balance)
    }

    fn transactions(
        &self,
        account_id: AccountID,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, Error> {
        let data = self.inner.lock().unwrap();

        let mut transactions: Vec<Transaction> = data
            .transactions
            .iter()
            .filter(|transaction| transaction.account_id == account_id)
            .filter(|transaction| {
                filter
                    .kind
                    .is_none_or(|kind| transaction.kind == kind)
            })
            .cloned()
            .collect();

        if filter.order == SortOrder::Descending {
            transactions.reverse();
        }

        Ok(transactions)
    }
}

/// Stores users in memory.
///
/// Cloning the store produces a handle to the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<Mutex<Vec<User>>>,
}

impl InMemoryUserStore {
    /// Create a new, empty in-memory user store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for InMemoryUserStore {
    fn create_user(
        &mut self,
        email: &str,
        password_hash: PasswordHash,
        role: Role,
    ) -> Result<User, Error> {
        let mut users = self.users.lock().unwrap();

        if users.iter().any(|user| user.email == email) {
            return Err(Error::DuplicateEmail);
        }

        let user = User {
            id: UserID::new(users.len() as i64 + 1),
            email: email.to_owned(),
            password_hash,
            role,
        };
        users.push(user.clone());

        Ok(user)
    }

    fn get_user_by_id(&self, id: UserID) -> Result<User, Error> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.id == id)
            .cloned()
            .ok_or(Error::NotFound)
    }

    fn get_user_by_email(&self, email: &str) -> Result<User, Error> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.email == email)
            .cloned()
            .ok_or(Error::NotFound)
    }

    fn set_password(&mut self, id: UserID, password_hash: PasswordHash) -> Result<(), Error> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or(Error::NotFound)?;

        user.password_hash = password_hash;

        Ok(())
    }
}

#[cfg(test)]
mod in_memory_ledger_store_tests {
    use std::{
        sync::{Arc, Barrier},
        thread,
    };

    use crate::{
        Error,
        models::{
            Account, AccountID, Amount, NewTransaction, PasswordHash, Role, TransactionKind,
            UserID,
        },
        stores::{
            InMemoryUserStore, LedgerStore, SortOrder, TransactionFilter, UserStore,
            memory::InMemoryLedgerStore,
        },
    };

    fn deposit(amount: f64) -> NewTransaction {
        NewTransaction {
            kind: TransactionKind::Deposit,
            amount: Amount::new(amount).unwrap(),
            description: None,
        }
    }

    fn withdrawal(amount: f64) -> NewTransaction {
        NewTransaction {
            kind: TransactionKind::Withdrawal,
            amount: Amount::new(amount).unwrap(),
            description: None,
        }
    }

    fn get_test_account() -> (InMemoryLedgerStore, Account) {
        let mut user_store = InMemoryUserStore::new();
        let user = user_store
            .create_user(
                "customer@example.com",
                PasswordHash::new_unchecked("hash"),
                Role::Customer,
            )
            .unwrap();

        let mut store = InMemoryLedgerStore::new();
        let account = store.create_account(user.id).unwrap();

        (store, account)
    }

    #[test]
    fn new_account_starts_at_zero() {
        let (store, account) = get_test_account();

        assert_eq!(account.balance, 0.0);
        assert_eq!(store.balance(account.id), Ok(0.0));
    }

    #[test]
    fn create_account_fails_for_second_account() {
        let (mut store, account) = get_test_account();

        let result = store.create_account(account.user_id);

        assert_eq!(result, Err(Error::DuplicateAccount));
    }

    #[test]
    fn deposits_and_withdrawals_keep_the_running_balance() {
        let (mut store, account) = get_test_account();

        let first = store.post_transaction(account.id, deposit(5_000.0)).unwrap();
        assert_eq!(first.balance_after, 5_000.0);
        assert_eq!(store.balance(account.id), Ok(5_000.0));

        let second = store.post_transaction(account.id, deposit(2_000.0)).unwrap();
        assert_eq!(second.balance_after, 7_000.0);

        let third = store
            .post_transaction(account.id, withdrawal(500.0))
            .unwrap();
        assert_eq!(third.balance_after, 6_500.0);
        assert_eq!(store.balance(account.id), Ok(6_500.0));
    }

    #[test]
    fn over_withdrawal_leaves_state_unchanged() {
        let (mut store, account) = get_test_account();
        store.post_transaction(account.id, deposit(6_500.0)).unwrap();

        let result = store.post_transaction(account.id, withdrawal(10_000.0));

        assert_eq!(
            result,
            Err(Error::InsufficientFunds {
                requested: 10_000.0,
                available: 6_500.0,
            })
        );
        assert_eq!(store.balance(account.id), Ok(6_500.0));
        let transactions = store
            .transactions(account.id, TransactionFilter::default())
            .unwrap();
        assert_eq!(transactions.len(), 1);
    }

    #[test]
    fn post_transaction_fails_on_unknown_account() {
        let (mut store, _account) = get_test_account();

        let result = store.post_transaction(AccountID::new(999), deposit(1.0));

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn balance_equals_sum_of_deposits_minus_withdrawals() {
        let (mut store, account) = get_test_account();
        let posts = [
            deposit(100.0),
            deposit(250.5),
            withdrawal(50.0),
            deposit(10.0),
            withdrawal(110.5),
        ];

        for post in posts {
            store.post_transaction(account.id, post).unwrap();
        }

        let transactions = store
            .transactions(account.id, TransactionFilter::default())
            .unwrap();
        let want: f64 = transactions
            .iter()
            .map(|transaction| match transaction.kind {
                TransactionKind::Deposit => transaction.amount,
                TransactionKind::Withdrawal => -transaction.amount,
            })
            .sum();

        assert_eq!(store.balance(account.id), Ok(want));
    }

    #[test]
    fn repeated_reads_return_the_same_values() {
        let (mut store, account) = get_test_account();
        store.post_transaction(account.id, deposit(123.0)).unwrap();

        let first_balance = store.balance(account.id).unwrap();
        let first_list = store
            .transactions(account.id, TransactionFilter::default())
            .unwrap();

        assert_eq!(store.balance(account.id), Ok(first_balance));
        assert_eq!(
            store
                .transactions(account.id, TransactionFilter::default())
                .unwrap(),
            first_list
        );
    }

    #[test]
    fn history_is_append_only_and_ordered() {
        let (mut store, account) = get_test_account();

        let mut want = vec![];
        for amount in [100.0, 200.0, 300.0] {
            want.push(store.post_transaction(account.id, deposit(amount)).unwrap());
        }

        let ascending = store
            .transactions(account.id, TransactionFilter::default())
            .unwrap();
        assert_eq!(ascending, want);
        assert!(
            ascending
                .windows(2)
                .all(|pair| pair[0].created_at <= pair[1].created_at),
            "created_at must be non-decreasing in insertion order"
        );

        let descending = store
            .transactions(
                account.id,
                TransactionFilter {
                    order: SortOrder::Descending,
                    ..Default::default()
                },
            )
            .unwrap();
        want.reverse();
        assert_eq!(descending, want);
    }

    #[test]
    fn filters_by_kind() {
        let (mut store, account) = get_test_account();
        store.post_transaction(account.id, deposit(100.0)).unwrap();
        store
            .post_transaction(account.id, withdrawal(40.0))
            .unwrap();
        store.post_transaction(account.id, deposit(10.0)).unwrap();

        let withdrawals = store
            .transactions(
                account.id,
                TransactionFilter {
                    kind: Some(TransactionKind::Withdrawal),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(withdrawals.len(), 1);
        assert_eq!(withdrawals[0].amount, 40.0);
    }

    #[test]
    fn transactions_on_different_accounts_are_independent() {
        let mut user_store = InMemoryUserStore::new();
        let mut store = InMemoryLedgerStore::new();

        let first_user = user_store
            .create_user(
                "first@example.com",
                PasswordHash::new_unchecked("hash"),
                Role::Customer,
            )
            .unwrap();
        let second_user = user_store
            .create_user(
                "second@example.com",
                PasswordHash::new_unchecked("hash2"),
                Role::Customer,
            )
            .unwrap();
        let first = store.create_account(first_user.id).unwrap();
        let second = store.create_account(second_user.id).unwrap();

        store.post_transaction(first.id, deposit(100.0)).unwrap();
        store.post_transaction(second.id, deposit(9.0)).unwrap();

        assert_eq!(store.balance(first.id), Ok(100.0));
        assert_eq!(store.balance(second.id), Ok(9.0));
    }

    #[test]
    fn concurrent_withdrawals_never_double_deduct() {
        let (mut store, account) = get_test_account();
        store.post_transaction(account.id, deposit(6_500.0)).unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let mut store = store.clone();
                let barrier = barrier.clone();
                let account_id = account.id;
                thread::spawn(move || {
                    barrier.wait();
                    store.post_transaction(account_id, withdrawal(4_000.0))
                })
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        let successes = results.iter().filter(|result| result.is_ok()).count();
        assert_eq!(successes, 1, "exactly one withdrawal must succeed");
        assert!(results.iter().any(|result| matches!(
            result,
            Err(Error::InsufficientFunds { .. })
        )));
        assert_eq!(store.balance(account.id), Ok(2_500.0));
    }

    #[test]
    fn account_of_finds_the_owner() {
        let (store, account) = get_test_account();

        assert_eq!(store.account_of(account.user_id), Ok(account));
        assert_eq!(store.account_of(UserID::new(999)), Err(Error::NotFound));
    }
}
