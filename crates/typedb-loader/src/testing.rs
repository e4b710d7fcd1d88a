//! In-memory driver for tests.
//!
//! [`MemoryDriver`] records every committed transaction instead of talking to
//! a server, tracks open sessions and transactions, and can be told to reject
//! specific statements or refuse sessions.

use crate::driver::{DriverSession, GraphDriver, SessionType, Transaction, TransactionType};
use anyhow::{bail, Result};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Statements committed together by one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedBatch {
    /// Sequence number of the session that committed the batch
    pub session_id: usize,
    pub database: String,
    pub statements: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    sessions_opened: usize,
    sessions_closed: usize,
    open_per_session: HashMap<usize, usize>,
    max_open_per_session: usize,
    discarded: usize,
    leaked: usize,
    commit_attempts: usize,
    commits: Vec<CommittedBatch>,
}

impl State {
    fn transaction_finished(&mut self, session_id: usize) {
        if let Some(open) = self.open_per_session.get_mut(&session_id) {
            *open = open.saturating_sub(1);
        }
    }
}

/// Driver that keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    state: Arc<Mutex<State>>,
    rejected: Arc<HashSet<String>>,
    failing_commit: Option<usize>,
    unavailable: bool,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject `statement` whenever it is executed.
    pub fn fail_on_statement(mut self, statement: &str) -> Self {
        let mut rejected = (*self.rejected).clone();
        rejected.insert(statement.to_string());
        self.rejected = Arc::new(rejected);
        self
    }

    /// Fail the `n`th commit attempt (1-based, counted across all sessions).
    pub fn fail_on_commit(mut self, n: usize) -> Self {
        self.failing_commit = Some(n);
        self
    }

    /// Refuse to open sessions.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Every committed transaction, in commit order.
    pub fn commits(&self) -> Vec<CommittedBatch> {
        self.lock().commits.clone()
    }

    /// Committed transactions of one session, in commit order.
    pub fn commits_for_session(&self, session_id: usize) -> Vec<CommittedBatch> {
        self.lock()
            .commits
            .iter()
            .filter(|c| c.session_id == session_id)
            .cloned()
            .collect()
    }

    /// Every committed statement, in commit order.
    pub fn committed_statements(&self) -> Vec<String> {
        self.lock()
            .commits
            .iter()
            .flat_map(|c| c.statements.iter().cloned())
            .collect()
    }

    pub fn sessions_opened(&self) -> usize {
        self.lock().sessions_opened
    }

    pub fn sessions_closed(&self) -> usize {
        self.lock().sessions_closed
    }

    /// Transactions currently open across all sessions.
    pub fn open_transactions(&self) -> usize {
        self.lock().open_per_session.values().sum()
    }

    /// Highest number of transactions ever open at once within one session.
    pub fn max_open_transactions_per_session(&self) -> usize {
        self.lock().max_open_per_session
    }

    /// Transactions closed without committing.
    pub fn discarded_transactions(&self) -> usize {
        self.lock().discarded
    }

    /// Transactions dropped without being committed or closed.
    pub fn leaked_transactions(&self) -> usize {
        self.lock().leaked
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl GraphDriver for MemoryDriver {
    async fn session(
        &self,
        database: &str,
        _session_type: SessionType,
    ) -> Result<Box<dyn DriverSession>> {
        if self.unavailable {
            bail!("connection refused");
        }

        let mut state = self.lock();
        let session_id = state.sessions_opened;
        state.sessions_opened += 1;
        state.open_per_session.insert(session_id, 0);

        Ok(Box::new(MemorySession {
            session_id,
            database: database.to_string(),
            driver: self.clone(),
        }))
    }
}

struct MemorySession {
    session_id: usize,
    database: String,
    driver: MemoryDriver,
}

#[async_trait::async_trait]
impl DriverSession for MemorySession {
    async fn transaction(
        &mut self,
        _transaction_type: TransactionType,
    ) -> Result<Box<dyn Transaction>> {
        let mut state = self.driver.lock();
        let open = state.open_per_session.entry(self.session_id).or_insert(0);
        *open += 1;
        let open = *open;
        state.max_open_per_session = state.max_open_per_session.max(open);

        Ok(Box::new(MemoryTransaction {
            session_id: self.session_id,
            database: self.database.clone(),
            statements: Vec::new(),
            finished: false,
            driver: self.driver.clone(),
        }))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.driver.lock().sessions_closed += 1;
        Ok(())
    }
}

struct MemoryTransaction {
    session_id: usize,
    database: String,
    statements: Vec<String>,
    finished: bool,
    driver: MemoryDriver,
}

#[async_trait::async_trait]
impl Transaction for MemoryTransaction {
    async fn insert(&mut self, statement: &str) -> Result<()> {
        // Let other workers interleave as they would on a real connection.
        tokio::task::yield_now().await;

        if self.driver.rejected.contains(statement) {
            bail!("statement rejected by server: {statement}");
        }
        self.statements.push(statement.to_string());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut this = self;
        this.finished = true;
        let batch = CommittedBatch {
            session_id: this.session_id,
            database: this.database.clone(),
            statements: std::mem::take(&mut this.statements),
        };

        let mut state = this.driver.lock();
        state.commit_attempts += 1;
        state.transaction_finished(this.session_id);
        if this.driver.failing_commit == Some(state.commit_attempts) {
            bail!("commit failed on server");
        }
        state.commits.push(batch);
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let mut this = self;
        this.finished = true;
        let mut state = this.driver.lock();
        state.discarded += 1;
        state.transaction_finished(this.session_id);
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if !self.finished {
            let mut state = self.driver.lock();
            state.leaked += 1;
            state.transaction_finished(self.session_id);
        }
    }
}
