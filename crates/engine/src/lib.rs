//! Expense batch engine.
//!
//! A [`Batch`] groups dated expenses under an opening balance; its total
//! expense and closing balance are always derived by [`recompute`]. The
//! [`BatchStore`] owns the batches of the signed-in user and mirrors every
//! change through a [`RemotePort`] adapter.

pub use batches::{Batch, BatchDraft};
pub use error::{EngineError, FieldError, FieldErrors, RemoteError};
pub use ledger::{LedgerTotals, recompute};
pub use money::MoneyCents;
pub use remote::{
    Applied, DatabaseRemote, MemoryRemote, Offline, RemotePort, RemoteResult, RestRemote,
    RestSession, SyncOperation, SyncWarning,
};
pub use snapshot::{LocalSnapshot, SnapshotState};
pub use store::{BatchOrder, BatchQuery, BatchStore, BatchStoreBuilder, Overview};
pub use transactions::{Transaction, TransactionDraft};
pub use users::{SessionEvent, User};

pub mod batches;
mod error;
mod ledger;
mod money;
pub mod remote;
mod snapshot;
mod store;
pub mod transactions;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
