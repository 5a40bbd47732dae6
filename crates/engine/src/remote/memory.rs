//! In-process remote tables.

use std::{
    collections::BTreeMap,
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
};

use api_types::{
    batch::{BatchPatch, BatchRow},
    transaction::{TransactionPatch, TransactionRow},
};
use uuid::Uuid;

use super::{RemotePort, RemoteResult};
use crate::RemoteError;

#[derive(Debug, Default)]
struct Tables {
    batches: BTreeMap<Uuid, BatchRow>,
    transactions: BTreeMap<Uuid, TransactionRow>,
}

/// Remote store kept in memory.
///
/// [`set_reachable(false)`](MemoryRemote::set_reachable) makes every call
/// fail with [`RemoteError::Unreachable`] without touching the tables.
#[derive(Debug)]
pub struct MemoryRemote {
    tables: Mutex<Tables>,
    reachable: AtomicBool,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            reachable: AtomicBool::new(true),
        }
    }
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn batch_row(&self, id: Uuid) -> Option<BatchRow> {
        self.tables().batches.get(&id).cloned()
    }

    pub fn transaction_row(&self, id: Uuid) -> Option<TransactionRow> {
        self.tables().transactions.get(&id).cloned()
    }

    pub fn batch_count(&self) -> usize {
        self.tables().batches.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.tables().transactions.len()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn reach(&self) -> RemoteResult<MutexGuard<'_, Tables>> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(self.tables())
        } else {
            Err(RemoteError::Unreachable("memory remote is offline".to_string()))
        }
    }
}

impl RemotePort for MemoryRemote {
    async fn list_batches_for_user(&self, user_id: &str) -> RemoteResult<Vec<BatchRow>> {
        let tables = self.reach()?;
        let mut rows: Vec<BatchRow> = tables
            .batches
            .values()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.created_at);
        Ok(rows)
    }

    async fn list_transactions_for_batches(
        &self,
        batch_ids: &[Uuid],
    ) -> RemoteResult<Vec<TransactionRow>> {
        let tables = self.reach()?;
        let mut rows: Vec<TransactionRow> = tables
            .transactions
            .values()
            .filter(|row| batch_ids.contains(&row.batch_id))
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.created_at);
        Ok(rows)
    }

    async fn insert_batch(&self, row: BatchRow) -> RemoteResult<BatchRow> {
        let mut tables = self.reach()?;
        if tables.batches.contains_key(&row.id) {
            return Err(RemoteError::Rejected(format!("duplicate batch {}", row.id)));
        }
        tables.batches.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_batch(&self, id: Uuid, patch: BatchPatch) -> RemoteResult<()> {
        let mut tables = self.reach()?;
        let row = tables
            .batches
            .get_mut(&id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        row.name = patch.name;
        row.opening_balance = patch.opening_balance;
        row.start_date = patch.start_date;
        row.end_date = patch.end_date;
        row.total_expense = patch.total_expense;
        row.closing_balance = patch.closing_balance;
        row.updated_at = patch.updated_at;
        Ok(())
    }

    async fn delete_batch(&self, id: Uuid) -> RemoteResult<()> {
        let mut tables = self.reach()?;
        if tables.batches.remove(&id).is_none() {
            return Err(RemoteError::NotFound(id.to_string()));
        }
        tables.transactions.retain(|_, row| row.batch_id != id);
        Ok(())
    }

    async fn insert_transaction(&self, row: TransactionRow) -> RemoteResult<TransactionRow> {
        let mut tables = self.reach()?;
        if !tables.batches.contains_key(&row.batch_id) {
            return Err(RemoteError::Rejected(format!(
                "unknown batch {}",
                row.batch_id
            )));
        }
        tables.transactions.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_transaction(&self, id: Uuid, patch: TransactionPatch) -> RemoteResult<()> {
        let mut tables = self.reach()?;
        let row = tables
            .transactions
            .get_mut(&id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        row.date = patch.date;
        row.particulars = patch.particulars;
        row.amount = patch.amount;
        row.place = patch.place;
        row.remarks = patch.remarks;
        row.updated_at = patch.updated_at;
        Ok(())
    }

    async fn delete_transaction(&self, id: Uuid) -> RemoteResult<()> {
        let mut tables = self.reach()?;
        tables
            .transactions
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))
    }
}
