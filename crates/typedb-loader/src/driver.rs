//! Database driver abstraction.
//!
//! The loader never talks to a database directly. It drives these traits,
//! which a driver crate implements for a concrete TypeDB client. The
//! in-memory [`crate::testing::MemoryDriver`] implements them for tests.

use anyhow::Result;

/// Kind of session to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionType {
    Data,
    Schema,
}

/// Kind of transaction to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Read,
    Write,
}

/// Entry point to a database server.
///
/// Workers share one driver through an `Arc` and each opens its own session,
/// so implementations must be safe to use from several tasks at once.
#[async_trait::async_trait]
pub trait GraphDriver: Send + Sync + 'static {
    /// Open a session against the named database.
    async fn session(
        &self,
        database: &str,
        session_type: SessionType,
    ) -> Result<Box<dyn DriverSession>>;
}

/// A session owned by a single worker.
#[async_trait::async_trait]
pub trait DriverSession: Send {
    /// Open a transaction within this session.
    async fn transaction(
        &mut self,
        transaction_type: TransactionType,
    ) -> Result<Box<dyn Transaction>>;

    /// Close the session.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// An open transaction.
#[async_trait::async_trait]
pub trait Transaction: Send {
    /// Execute an insert statement within the transaction.
    async fn insert(&mut self, statement: &str) -> Result<()>;

    /// Commit all statements executed so far and close the transaction.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Close the transaction without committing.
    async fn close(self: Box<Self>) -> Result<()>;
}
