//! The batch store.
//!
//! Owns every batch of the signed-in user plus the selection. Mutations are
//! applied locally first and then mirrored through the [`RemotePort`]; a
//! failed mirror call is reported as a [`SyncWarning`] and never undoes the
//! local change. [`BatchStore::load_batches`] is the only way local and
//! remote state are brought back in line.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    Applied, Batch, BatchDraft, EngineError, LocalSnapshot, MoneyCents, RemoteError, RemotePort,
    ResultEngine, SessionEvent, SnapshotState, SyncOperation, SyncWarning, Transaction,
    TransactionDraft, User, util::fold_case,
};

const RECENT_BATCHES: usize = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BatchOrder {
    /// The order batches were created or loaded in.
    #[default]
    Inserted,
    /// Most recently updated first.
    RecentlyUpdated,
}

/// Filter for [`BatchStore::list_batches`].
#[derive(Clone, Debug, Default)]
pub struct BatchQuery {
    /// Case-insensitive substring of the batch name.
    pub name: Option<String>,
    pub order: BatchOrder,
    pub limit: Option<usize>,
}

/// Dashboard totals across every batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Overview {
    pub batch_count: usize,
    pub transaction_count: usize,
    pub total_expense: MoneyCents,
    pub closing_balance: MoneyCents,
}

/// A remote call mirroring a local mutation.
enum Mirror<'a> {
    InsertBatch(&'a Batch),
    UpdateBatch(&'a Batch),
    DeleteBatch(Uuid),
    InsertTransaction(Uuid, &'a Transaction),
    UpdateTransaction(&'a Transaction),
    DeleteTransaction(Uuid),
}

impl Mirror<'_> {
    fn operation(&self) -> SyncOperation {
        match self {
            Self::InsertBatch(_) => SyncOperation::InsertBatch,
            Self::UpdateBatch(_) => SyncOperation::UpdateBatch,
            Self::DeleteBatch(_) => SyncOperation::DeleteBatch,
            Self::InsertTransaction(..) => SyncOperation::InsertTransaction,
            Self::UpdateTransaction(_) => SyncOperation::UpdateTransaction,
            Self::DeleteTransaction(_) => SyncOperation::DeleteTransaction,
        }
    }
}

#[derive(Debug)]
pub struct BatchStore<R> {
    remote: R,
    snapshot: Option<LocalSnapshot>,
    user: Option<User>,
    batches: Vec<Batch>,
    selected: Option<Uuid>,
}

impl<R: RemotePort> BatchStore<R> {
    /// Return a builder for `BatchStore`.
    pub fn builder(remote: R) -> BatchStoreBuilder<R> {
        BatchStoreBuilder {
            remote,
            snapshot: None,
            user: None,
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Validates `draft`, adds the batch and selects it.
    pub async fn create_batch(&mut self, draft: BatchDraft) -> ResultEngine<Applied<Batch>> {
        let batch = Batch::new(Uuid::new_v4(), draft, Utc::now())?;
        self.batches.push(batch.clone());
        self.selected = Some(batch.id());
        tracing::info!(batch = %batch.id(), name = batch.name(), "batch created");

        let mut warnings = Vec::new();
        self.mirror(Mirror::InsertBatch(&batch), batch.created_at(), &mut warnings)
            .await;
        self.persist(&mut warnings);
        Ok(Applied {
            value: batch,
            warnings,
        })
    }

    /// Replaces name, opening balance and period of a batch. The totals are
    /// re-derived from the transactions it already holds.
    pub async fn update_batch(
        &mut self,
        id: Uuid,
        draft: BatchDraft,
    ) -> ResultEngine<Applied<Batch>> {
        draft.validate()?;
        let now = Utc::now();
        let batch = self.batch_mut(id)?;
        batch.replace_details(draft, now)?;
        let batch = batch.clone();
        tracing::info!(batch = %id, "batch updated");

        let mut warnings = Vec::new();
        self.mirror(Mirror::UpdateBatch(&batch), now, &mut warnings)
            .await;
        self.persist(&mut warnings);
        Ok(Applied {
            value: batch,
            warnings,
        })
    }

    /// Removes a batch with its transactions.
    pub async fn delete_batch(&mut self, id: Uuid) -> ResultEngine<Applied<Batch>> {
        let index = self
            .batches
            .iter()
            .position(|batch| batch.id() == id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        let batch = self.batches.remove(index);
        if self.selected == Some(id) {
            self.selected = None;
        }
        tracing::info!(batch = %id, "batch deleted");

        let mut warnings = Vec::new();
        self.mirror(Mirror::DeleteBatch(id), Utc::now(), &mut warnings)
            .await;
        self.persist(&mut warnings);
        Ok(Applied {
            value: batch,
            warnings,
        })
    }

    pub async fn add_transaction(
        &mut self,
        batch_id: Uuid,
        draft: TransactionDraft,
    ) -> ResultEngine<Applied<Transaction>> {
        let tx = draft.into_transaction(Uuid::new_v4())?;
        let now = Utc::now();
        let batch = self.batch_mut(batch_id)?;
        batch.push_transaction(tx.clone(), now)?;
        let batch = batch.clone();
        tracing::info!(batch = %batch_id, transaction = %tx.id, amount = %tx.amount, "transaction added");

        let mut warnings = Vec::new();
        self.mirror(Mirror::InsertTransaction(batch_id, &tx), now, &mut warnings)
            .await;
        self.mirror(Mirror::UpdateBatch(&batch), now, &mut warnings)
            .await;
        self.persist(&mut warnings);
        Ok(Applied {
            value: tx,
            warnings,
        })
    }

    /// Replaces a transaction by id with the record built from `draft`.
    pub async fn update_transaction(
        &mut self,
        batch_id: Uuid,
        transaction_id: Uuid,
        draft: TransactionDraft,
    ) -> ResultEngine<Applied<Transaction>> {
        let tx = draft.into_transaction(transaction_id)?;
        let now = Utc::now();
        let batch = self.batch_mut(batch_id)?;
        batch.replace_transaction(tx.clone(), now)?;
        let batch = batch.clone();
        tracing::info!(batch = %batch_id, transaction = %transaction_id, "transaction updated");

        let mut warnings = Vec::new();
        self.mirror(Mirror::UpdateTransaction(&tx), now, &mut warnings)
            .await;
        self.mirror(Mirror::UpdateBatch(&batch), now, &mut warnings)
            .await;
        self.persist(&mut warnings);
        Ok(Applied {
            value: tx,
            warnings,
        })
    }

    pub async fn delete_transaction(
        &mut self,
        batch_id: Uuid,
        transaction_id: Uuid,
    ) -> ResultEngine<Applied<Transaction>> {
        let now = Utc::now();
        let batch = self.batch_mut(batch_id)?;
        let tx = batch.remove_transaction(transaction_id, now)?;
        let batch = batch.clone();
        tracing::info!(batch = %batch_id, transaction = %transaction_id, "transaction deleted");

        let mut warnings = Vec::new();
        self.mirror(Mirror::DeleteTransaction(transaction_id), now, &mut warnings)
            .await;
        self.mirror(Mirror::UpdateBatch(&batch), now, &mut warnings)
            .await;
        self.persist(&mut warnings);
        Ok(Applied {
            value: tx,
            warnings,
        })
    }

    pub fn find_batch(&self, id: Uuid) -> Option<&Batch> {
        self.batches.iter().find(|batch| batch.id() == id)
    }

    pub fn find_transaction(&self, batch_id: Uuid, transaction_id: Uuid) -> Option<&Transaction> {
        self.find_batch(batch_id)?.transaction(transaction_id)
    }

    /// Batches in insertion order.
    pub fn batches(&self) -> impl Iterator<Item = &Batch> {
        self.batches.iter()
    }

    pub fn list_batches(&self, query: &BatchQuery) -> Vec<&Batch> {
        let needle = query.name.as_deref().map(fold_case);
        let mut batches: Vec<&Batch> = self
            .batches
            .iter()
            .filter(|batch| match &needle {
                Some(needle) => fold_case(batch.name()).contains(needle.as_str()),
                None => true,
            })
            .collect();

        if query.order == BatchOrder::RecentlyUpdated {
            batches.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
        }
        if let Some(limit) = query.limit {
            batches.truncate(limit);
        }
        batches
    }

    /// The five most recently updated batches.
    pub fn recent_batches(&self) -> Vec<&Batch> {
        self.list_batches(&BatchQuery {
            order: BatchOrder::RecentlyUpdated,
            limit: Some(RECENT_BATCHES),
            ..BatchQuery::default()
        })
    }

    pub fn overview(&self) -> Overview {
        Overview {
            batch_count: self.batches.len(),
            transaction_count: self
                .batches
                .iter()
                .map(|batch| batch.transactions().len())
                .sum(),
            total_expense: self.batches.iter().map(Batch::total_expense).sum(),
            closing_balance: self.batches.iter().map(Batch::closing_balance).sum(),
        }
    }

    pub fn select_batch(&mut self, id: Uuid) -> ResultEngine<&Batch> {
        let index = self
            .batches
            .iter()
            .position(|batch| batch.id() == id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        self.selected = Some(id);
        Ok(&self.batches[index])
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&Batch> {
        self.find_batch(self.selected?)
    }

    /// Replaces the local batches with the signed-in user's remote batches.
    ///
    /// Totals stored remotely are not trusted: every batch is re-derived
    /// from its transactions. With no remote configured the local batches are
    /// kept. Returns the number of batches held afterwards.
    pub async fn load_batches(&mut self) -> ResultEngine<usize> {
        if !self.remote.is_configured() {
            tracing::debug!("no remote configured, keeping local batches");
            return Ok(self.batches.len());
        }
        let user_id = self
            .user
            .as_ref()
            .map(|user| user.id.clone())
            .ok_or(EngineError::Remote(RemoteError::Unauthorized))?;

        let rows = self.remote.list_batches_for_user(&user_id).await?;
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut by_batch: HashMap<Uuid, Vec<Transaction>> = HashMap::new();
        for row in self.remote.list_transactions_for_batches(&ids).await? {
            by_batch
                .entry(row.batch_id)
                .or_default()
                .push(Transaction::from(row));
        }

        let mut batches = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id;
            let stored_total = row.total_expense;
            let stored_closing = row.closing_balance;
            let transactions = by_batch.remove(&id).unwrap_or_default();
            let batch = Batch::from_parts(row, transactions)
                .map_err(|err| RemoteError::Server(format!("batch {id}: {err}")))?;
            if batch.total_expense().cents() != stored_total
                || batch.closing_balance().cents() != stored_closing
            {
                tracing::warn!(
                    batch = %id,
                    stored_total,
                    stored_closing,
                    total = %batch.total_expense(),
                    closing = %batch.closing_balance(),
                    "remote totals disagree with transactions, re-derived"
                );
            }
            batches.push(batch);
        }

        tracing::info!(user = %user_id, batches = batches.len(), "batches loaded");
        self.batches = batches;
        if let Some(id) = self.selected
            && self.find_batch(id).is_none()
        {
            self.selected = None;
        }
        self.persist(&mut Vec::new());
        Ok(self.batches.len())
    }

    /// Applies a session change reported by the auth side.
    pub async fn on_session_event(&mut self, event: SessionEvent) -> ResultEngine<()> {
        let loaded = match event {
            SessionEvent::SignedIn(user) => {
                tracing::info!(user = %user.id, "session started");
                self.user = Some(user);
                self.load_batches().await.map(drop)
            }
            SessionEvent::SignedOut => {
                tracing::info!("session ended");
                self.user = None;
                self.selected = None;
                // Offline, the snapshot is the only copy of the batches.
                if self.remote.is_configured() {
                    self.batches.clear();
                }
                Ok(())
            }
        };
        // Snapshot failures are already logged.
        self.persist(&mut Vec::new());
        loaded
    }

    fn batch_mut(&mut self, id: Uuid) -> ResultEngine<&mut Batch> {
        self.batches
            .iter_mut()
            .find(|batch| batch.id() == id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))
    }

    async fn mirror(
        &self,
        call: Mirror<'_>,
        now: DateTime<Utc>,
        warnings: &mut Vec<SyncWarning>,
    ) {
        if !self.remote.is_configured() {
            return;
        }
        let operation = call.operation();
        if let Err(error) = self.send(call, now).await {
            tracing::warn!(%operation, %error, "remote sync failed, local change kept");
            warnings.push(SyncWarning { operation, error });
        }
    }

    async fn send(&self, call: Mirror<'_>, now: DateTime<Utc>) -> Result<(), RemoteError> {
        let user = self.user.as_ref().ok_or(RemoteError::Unauthorized)?;
        match call {
            Mirror::InsertBatch(batch) => self
                .remote
                .insert_batch(batch.to_row(&user.id))
                .await
                .map(drop),
            Mirror::UpdateBatch(batch) => {
                self.remote
                    .update_batch(batch.id(), batch.to_patch())
                    .await
            }
            Mirror::DeleteBatch(id) => self.remote.delete_batch(id).await,
            Mirror::InsertTransaction(batch_id, tx) => self
                .remote
                .insert_transaction(tx.to_row(batch_id, now))
                .await
                .map(drop),
            Mirror::UpdateTransaction(tx) => {
                self.remote
                    .update_transaction(tx.id, tx.to_patch(now))
                    .await
            }
            Mirror::DeleteTransaction(id) => self.remote.delete_transaction(id).await,
        }
    }

    /// Rewrites the local snapshot, when one is configured.
    fn persist(&self, warnings: &mut Vec<SyncWarning>) {
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        let state = SnapshotState {
            user: self.user.clone(),
            batches: self.batches.clone(),
        };
        if let Err(err) = snapshot.save(&state) {
            let error = RemoteError::Snapshot(err.to_string());
            tracing::warn!(path = %snapshot.path().display(), %error, "snapshot not written");
            warnings.push(SyncWarning {
                operation: SyncOperation::WriteSnapshot,
                error,
            });
        }
    }
}

pub struct BatchStoreBuilder<R> {
    remote: R,
    snapshot: Option<LocalSnapshot>,
    user: Option<User>,
}

impl<R: RemotePort> BatchStoreBuilder<R> {
    /// Persist the store to a local snapshot, restoring it on build.
    pub fn snapshot(mut self, snapshot: LocalSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    /// Start with a signed-in user. Overrides the user kept in the snapshot.
    pub fn user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    /// Construct `BatchStore`
    pub fn build(self) -> ResultEngine<BatchStore<R>> {
        let state = match &self.snapshot {
            Some(snapshot) => snapshot.load()?,
            None => SnapshotState::default(),
        };
        tracing::debug!(batches = state.batches.len(), "store restored");

        Ok(BatchStore {
            remote: self.remote,
            snapshot: self.snapshot,
            user: self.user.or(state.user),
            batches: state.batches,
            selected: None,
        })
    }
}
