//! In-memory stores of record.
//!
//! Intended for tests/dev. They enforce the same constraints the Postgres
//! schema does (unique email, known accounts for transactions) so store
//! semantics can be exercised without a database.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use emoney_core::{Account, AccountId, Email, PageRequest, ServiceError, Transaction};

use super::records::{AccountRecords, TransactionRecords};

fn poisoned() -> ServiceError {
    ServiceError::infrastructure("in-memory records", "lock poisoned")
}

fn check_reachable(unreachable: &AtomicBool, what: &'static str) -> Result<(), ServiceError> {
    if unreachable.load(Ordering::SeqCst) {
        return Err(ServiceError::infrastructure(what, "store of record unreachable"));
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct InMemoryAccountRecords {
    accounts: RwLock<HashMap<AccountId, Account>>,
    unreachable: AtomicBool,
    reads: AtomicUsize,
}

impl InMemoryAccountRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every call fails as if the database were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.accounts.read().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of lookups that reached the records (by id or by email).
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn check_reachable(&self) -> Result<(), ServiceError> {
        check_reachable(&self.unreachable, "account records")
    }
}

#[async_trait]
impl AccountRecords for InMemoryAccountRecords {
    async fn insert(&self, account: &Account) -> Result<(), ServiceError> {
        self.check_reachable()?;
        let mut accounts = self.accounts.write().map_err(|_| poisoned())?;

        if accounts.contains_key(&account.id) {
            return Err(ServiceError::conflict("account id already exists"));
        }
        if accounts.values().any(|a| a.email == account.email) {
            return Err(ServiceError::conflict("email already registered"));
        }
        accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, ServiceError> {
        self.check_reachable()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        let accounts = self.accounts.read().map_err(|_| poisoned())?;
        Ok(accounts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, ServiceError> {
        self.check_reachable()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        let accounts = self.accounts.read().map_err(|_| poisoned())?;
        Ok(accounts.values().find(|a| &a.email == email).cloned())
    }
}

#[derive(Debug, Default)]
struct TransactionState {
    mirrored: HashSet<AccountId>,
    /// Insertion order; the index doubles as the tie-break sequence.
    transactions: Vec<Transaction>,
}

#[derive(Debug, Default)]
pub struct InMemoryTransactionRecords {
    state: RwLock<TransactionState>,
    unreachable: AtomicBool,
}

impl InMemoryTransactionRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every call fails as if the database were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> Result<(), ServiceError> {
        check_reachable(&self.unreachable, "transaction records")
    }

    pub fn is_mirrored(&self, id: AccountId) -> bool {
        self.state
            .read()
            .map(|s| s.mirrored.contains(&id))
            .unwrap_or(false)
    }
}

#[async_trait]
impl TransactionRecords for InMemoryTransactionRecords {
    async fn insert(&self, tx: &Transaction) -> Result<(), ServiceError> {
        self.check_reachable()?;
        let mut state = self.state.write().map_err(|_| poisoned())?;

        let referenced = tx.from_account_id.into_iter().chain([tx.to_account_id]);
        for account in referenced {
            if !state.mirrored.contains(&account) {
                return Err(ServiceError::validation(format!(
                    "insert transaction: account {account} does not exist"
                )));
            }
        }
        if state.transactions.iter().any(|t| t.id == tx.id) {
            return Err(ServiceError::conflict("transaction id already exists"));
        }
        state.transactions.push(tx.clone());
        Ok(())
    }

    async fn find_history(
        &self,
        account: AccountId,
        page: PageRequest,
    ) -> Result<Vec<Transaction>, ServiceError> {
        self.check_reachable()?;
        let state = self.state.read().map_err(|_| poisoned())?;

        let mut matching: Vec<(usize, &Transaction)> = state
            .transactions
            .iter()
            .enumerate()
            .filter(|(_, t)| t.involves(account))
            .collect();
        matching.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a))
        });

        Ok(matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.limit() as usize)
            .map(|(_, t)| t.clone())
            .collect())
    }

    async fn count_history(&self, account: AccountId) -> Result<u64, ServiceError> {
        self.check_reachable()?;
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state
            .transactions
            .iter()
            .filter(|t| t.involves(account))
            .count() as u64)
    }

    async fn mirror_account(
        &self,
        id: AccountId,
        _name: &str,
        _email: &Email,
    ) -> Result<bool, ServiceError> {
        self.check_reachable()?;
        let mut state = self.state.write().map_err(|_| poisoned())?;
        Ok(state.mirrored.insert(id))
    }
}
