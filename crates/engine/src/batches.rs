//! The module contains the `Batch` struct and its implementation.
//!
//! A batch is a named, date-bounded container of expenses. Its
//! `total_expense` and `closing_balance` are derived: they are private and
//! recomputed through [`recompute`](crate::recompute) after every change of
//! the transaction set or of the opening balance, including when a batch is
//! rebuilt from remote rows or from the local snapshot.

use api_types::batch::{BatchPatch, BatchRow};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, FieldErrors, LedgerTotals, MoneyCents, ResultEngine, Transaction,
    ledger::recompute,
};

/// A batch of expenses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredBatch")]
pub struct Batch {
    id: Uuid,
    name: String,
    opening_balance: MoneyCents,
    start_date: NaiveDate,
    end_date: NaiveDate,
    transactions: Vec<Transaction>,
    total_expense: MoneyCents,
    closing_balance: MoneyCents,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Batch {
    /// Validates `draft` and creates an empty batch.
    pub fn new(id: Uuid, draft: BatchDraft, now: DateTime<Utc>) -> ResultEngine<Self> {
        let details = draft.into_details()?;
        let totals = recompute(details.opening_balance, &[])?;
        Ok(Self {
            id,
            name: details.name,
            opening_balance: details.opening_balance,
            start_date: details.start_date,
            end_date: details.end_date,
            transactions: Vec::new(),
            total_expense: totals.total_expense,
            closing_balance: totals.closing_balance,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds a batch from its stored row and transactions.
    ///
    /// The derived columns of `row` are ignored. Fails when the transactions
    /// overflow the totals.
    pub fn from_parts(row: BatchRow, transactions: Vec<Transaction>) -> ResultEngine<Self> {
        let opening_balance = MoneyCents::new(row.opening_balance);
        let totals = recompute(opening_balance, &transactions)?;
        Ok(Self {
            id: row.id,
            name: row.name,
            opening_balance,
            start_date: row.start_date,
            end_date: row.end_date,
            transactions,
            total_expense: totals.total_expense,
            closing_balance: totals.closing_balance,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn opening_balance(&self) -> MoneyCents {
        self.opening_balance
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Transactions in the order they were added.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Transactions sorted by date, newest first. Same-day entries keep the
    /// order they were added in.
    pub fn transactions_by_date(&self) -> Vec<&Transaction> {
        let mut sorted: Vec<&Transaction> = self.transactions.iter().collect();
        sorted.sort_by(|a, b| b.date.cmp(&a.date));
        sorted
    }

    pub fn transaction(&self, id: Uuid) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.id == id)
    }

    pub fn total_expense(&self) -> MoneyCents {
        self.total_expense
    }

    pub fn closing_balance(&self) -> MoneyCents {
        self.closing_balance
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Row sent to the remote store on insert.
    pub fn to_row(&self, user_id: &str) -> BatchRow {
        BatchRow {
            id: self.id,
            user_id: user_id.to_string(),
            name: self.name.clone(),
            opening_balance: self.opening_balance.cents(),
            start_date: self.start_date,
            end_date: self.end_date,
            total_expense: self.total_expense.cents(),
            closing_balance: self.closing_balance.cents(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn to_patch(&self) -> BatchPatch {
        BatchPatch {
            name: self.name.clone(),
            opening_balance: self.opening_balance.cents(),
            start_date: self.start_date,
            end_date: self.end_date,
            total_expense: self.total_expense.cents(),
            closing_balance: self.closing_balance.cents(),
            updated_at: self.updated_at,
        }
    }

    // Each mutation computes the new totals before touching any field, so a
    // rejected change leaves the batch as it was.

    /// Replaces name, opening balance and period, keeping the transactions.
    pub(crate) fn replace_details(&mut self, draft: BatchDraft, now: DateTime<Utc>) -> ResultEngine<()> {
        let details = draft.into_details()?;
        let totals = recompute(details.opening_balance, &self.transactions)?;
        self.name = details.name;
        self.opening_balance = details.opening_balance;
        self.start_date = details.start_date;
        self.end_date = details.end_date;
        self.settle(totals, now);
        Ok(())
    }

    pub(crate) fn push_transaction(&mut self, tx: Transaction, now: DateTime<Utc>) -> ResultEngine<()> {
        let totals = recompute(self.opening_balance, self.transactions.iter().chain([&tx]))?;
        self.transactions.push(tx);
        self.settle(totals, now);
        Ok(())
    }

    /// Swaps the stored transaction with the same id for `tx`.
    pub(crate) fn replace_transaction(
        &mut self,
        tx: Transaction,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let index = self
            .transactions
            .iter()
            .position(|stored| stored.id == tx.id)
            .ok_or_else(|| EngineError::NotFound(tx.id.to_string()))?;
        let totals = recompute(
            self.opening_balance,
            self.transactions
                .iter()
                .map(|stored| if stored.id == tx.id { &tx } else { stored }),
        )?;
        self.transactions[index] = tx;
        self.settle(totals, now);
        Ok(())
    }

    pub(crate) fn remove_transaction(
        &mut self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<Transaction> {
        let index = self
            .transactions
            .iter()
            .position(|tx| tx.id == id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        let totals = recompute(
            self.opening_balance,
            self.transactions.iter().filter(|tx| tx.id != id),
        )?;
        let tx = self.transactions.remove(index);
        self.settle(totals, now);
        Ok(tx)
    }

    fn settle(&mut self, totals: LedgerTotals, now: DateTime<Utc>) {
        self.total_expense = totals.total_expense;
        self.closing_balance = totals.closing_balance;
        self.updated_at = now;
    }
}

/// Serialized shape of a batch. Converting it back always re-derives the
/// totals, so a stale or hand-edited snapshot cannot break the invariant.
#[derive(Deserialize)]
struct StoredBatch {
    id: Uuid,
    name: String,
    opening_balance: MoneyCents,
    start_date: NaiveDate,
    end_date: NaiveDate,
    #[serde(default)]
    transactions: Vec<Transaction>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StoredBatch> for Batch {
    type Error = EngineError;

    fn try_from(stored: StoredBatch) -> ResultEngine<Self> {
        let totals = recompute(stored.opening_balance, &stored.transactions)?;
        Ok(Self {
            id: stored.id,
            name: stored.name,
            opening_balance: stored.opening_balance,
            start_date: stored.start_date,
            end_date: stored.end_date,
            transactions: stored.transactions,
            total_expense: totals.total_expense,
            closing_balance: totals.closing_balance,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        })
    }
}

/// The batch form, before validation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchDraft {
    pub name: String,
    pub opening_balance: MoneyCents,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

struct BatchDetails {
    name: String,
    opening_balance: MoneyCents,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl BatchDraft {
    /// Checks every field rule and collects all failures.
    pub fn validate(&self) -> ResultEngine<()> {
        let mut errors = FieldErrors::default();
        if self.name.trim().is_empty() {
            errors.push("name", "Batch name is required");
        }
        if self.opening_balance.is_negative() {
            errors.push("opening_balance", "Valid opening balance is required");
        }
        if self.start_date.is_none() {
            errors.push("start_date", "Start date is required");
        }
        if self.end_date.is_none() {
            errors.push("end_date", "End date is required");
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && start > end
        {
            errors.push("end_date", "End date must be after start date");
        }
        errors.into_result()
    }

    fn into_details(self) -> ResultEngine<BatchDetails> {
        self.validate()?;
        match (self.start_date, self.end_date) {
            (Some(start_date), Some(end_date)) => Ok(BatchDetails {
                name: self.name.trim().to_string(),
                opening_balance: self.opening_balance,
                start_date,
                end_date,
            }),
            _ => {
                let mut errors = FieldErrors::default();
                errors.push("start_date", "Start date is required");
                Err(EngineError::Validation(errors))
            }
        }
    }
}

impl From<&Batch> for BatchDraft {
    fn from(batch: &Batch) -> Self {
        Self {
            name: batch.name.clone(),
            opening_balance: batch.opening_balance,
            start_date: Some(batch.start_date),
            end_date: Some(batch.end_date),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "batches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub opening_balance: i64,
    pub start_date: Date,
    pub end_date: Date,
    pub total_expense: i64,
    pub closing_balance: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&BatchRow> for ActiveModel {
    fn from(row: &BatchRow) -> Self {
        Self {
            id: ActiveValue::Set(row.id.to_string()),
            user_id: ActiveValue::Set(row.user_id.clone()),
            name: ActiveValue::Set(row.name.clone()),
            opening_balance: ActiveValue::Set(row.opening_balance),
            start_date: ActiveValue::Set(row.start_date),
            end_date: ActiveValue::Set(row.end_date),
            total_expense: ActiveValue::Set(row.total_expense),
            closing_balance: ActiveValue::Set(row.closing_balance),
            created_at: ActiveValue::Set(row.created_at),
            updated_at: ActiveValue::Set(row.updated_at),
        }
    }
}

impl ActiveModel {
    /// Active model updating every replaceable column of `id`.
    pub(crate) fn from_patch(id: Uuid, patch: &BatchPatch) -> Self {
        Self {
            id: ActiveValue::Unchanged(id.to_string()),
            user_id: ActiveValue::NotSet,
            name: ActiveValue::Set(patch.name.clone()),
            opening_balance: ActiveValue::Set(patch.opening_balance),
            start_date: ActiveValue::Set(patch.start_date),
            end_date: ActiveValue::Set(patch.end_date),
            total_expense: ActiveValue::Set(patch.total_expense),
            closing_balance: ActiveValue::Set(patch.closing_balance),
            created_at: ActiveValue::NotSet,
            updated_at: ActiveValue::Set(patch.updated_at),
        }
    }
}
