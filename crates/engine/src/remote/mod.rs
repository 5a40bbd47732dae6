//! Remote store port.
//!
//! The batch store mirrors each local mutation through a [`RemotePort`]. The
//! port is shaped after the two remote tables, so adapters only translate
//! rows:
//!
//! - [`Offline`]: no remote configured, every call is a no-op.
//! - [`MemoryRemote`]: in-process tables, used by tests.
//! - [`DatabaseRemote`]: relational database through `sea-orm`.
//! - [`RestRemote`]: PostgREST-style HTTP API through `reqwest`.

use std::fmt;

use api_types::{
    batch::{BatchPatch, BatchRow},
    transaction::{TransactionPatch, TransactionRow},
};
use uuid::Uuid;

use crate::RemoteError;

pub use database::DatabaseRemote;
pub use memory::MemoryRemote;
pub use rest::{RestRemote, RestSession};

mod database;
mod memory;
mod rest;

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Request/response access to the remote `batches` and `transactions` tables.
///
/// Calls are independent of each other: a failure never undoes a call that
/// already succeeded, and nothing is retried.
#[allow(async_fn_in_trait)]
pub trait RemotePort {
    /// `false` when no remote is configured and the local snapshot is the
    /// only persistence.
    fn is_configured(&self) -> bool {
        true
    }

    async fn list_batches_for_user(&self, user_id: &str) -> RemoteResult<Vec<BatchRow>>;

    async fn list_transactions_for_batches(
        &self,
        batch_ids: &[Uuid],
    ) -> RemoteResult<Vec<TransactionRow>>;

    async fn insert_batch(&self, row: BatchRow) -> RemoteResult<BatchRow>;

    async fn update_batch(&self, id: Uuid, patch: BatchPatch) -> RemoteResult<()>;

    async fn delete_batch(&self, id: Uuid) -> RemoteResult<()>;

    async fn insert_transaction(&self, row: TransactionRow) -> RemoteResult<TransactionRow>;

    async fn update_transaction(&self, id: Uuid, patch: TransactionPatch) -> RemoteResult<()>;

    async fn delete_transaction(&self, id: Uuid) -> RemoteResult<()>;
}

/// The remote is not configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct Offline;

impl RemotePort for Offline {
    fn is_configured(&self) -> bool {
        false
    }

    async fn list_batches_for_user(&self, _user_id: &str) -> RemoteResult<Vec<BatchRow>> {
        Ok(Vec::new())
    }

    async fn list_transactions_for_batches(
        &self,
        _batch_ids: &[Uuid],
    ) -> RemoteResult<Vec<TransactionRow>> {
        Ok(Vec::new())
    }

    async fn insert_batch(&self, row: BatchRow) -> RemoteResult<BatchRow> {
        Ok(row)
    }

    async fn update_batch(&self, _id: Uuid, _patch: BatchPatch) -> RemoteResult<()> {
        Ok(())
    }

    async fn delete_batch(&self, _id: Uuid) -> RemoteResult<()> {
        Ok(())
    }

    async fn insert_transaction(&self, row: TransactionRow) -> RemoteResult<TransactionRow> {
        Ok(row)
    }

    async fn update_transaction(&self, _id: Uuid, _patch: TransactionPatch) -> RemoteResult<()> {
        Ok(())
    }

    async fn delete_transaction(&self, _id: Uuid) -> RemoteResult<()> {
        Ok(())
    }
}

/// The mirror call that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOperation {
    InsertBatch,
    UpdateBatch,
    DeleteBatch,
    InsertTransaction,
    UpdateTransaction,
    DeleteTransaction,
    WriteSnapshot,
}

impl SyncOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InsertBatch => "insert_batch",
            Self::UpdateBatch => "update_batch",
            Self::DeleteBatch => "delete_batch",
            Self::InsertTransaction => "insert_transaction",
            Self::UpdateTransaction => "update_transaction",
            Self::DeleteTransaction => "delete_transaction",
            Self::WriteSnapshot => "write_snapshot",
        }
    }
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mirror call failed after the local mutation was applied. The local
/// state is kept as is.
#[derive(Debug)]
pub struct SyncWarning {
    pub operation: SyncOperation,
    pub error: RemoteError,
}

impl fmt::Display for SyncWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} not synced: {}", self.operation, self.error)
    }
}

/// Result of a store mutation: the applied value plus the sync failures it
/// produced, if any.
#[derive(Debug)]
#[must_use]
pub struct Applied<T> {
    pub value: T,
    pub warnings: Vec<SyncWarning>,
}

impl<T> Applied<T> {
    /// `true` when every mirror call succeeded.
    pub fn is_synced(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}
