//! Transaction primitives.
//!
//! A `Transaction` is a single dated expense belonging to exactly one batch.
//! It is never edited in place: an edit builds a new record from a
//! [`TransactionDraft`] and replaces the old one by id.

use api_types::transaction::{TransactionPatch, TransactionRow};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, FieldErrors, MoneyCents, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub date: NaiveDate,
    pub particulars: String,
    pub amount: MoneyCents,
    pub place: String,
    /// Empty when the user left no remarks.
    pub remarks: String,
}

impl Transaction {
    /// Row sent to the remote store on insert.
    pub fn to_row(&self, batch_id: Uuid, now: DateTime<Utc>) -> TransactionRow {
        TransactionRow {
            id: self.id,
            batch_id,
            date: self.date,
            particulars: self.particulars.clone(),
            amount: self.amount.cents(),
            place: self.place.clone(),
            remarks: remarks_column(&self.remarks),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_patch(&self, now: DateTime<Utc>) -> TransactionPatch {
        TransactionPatch {
            date: self.date,
            particulars: self.particulars.clone(),
            amount: self.amount.cents(),
            place: self.place.clone(),
            remarks: remarks_column(&self.remarks),
            updated_at: now,
        }
    }
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Self {
            id: row.id,
            date: row.date,
            particulars: row.particulars,
            amount: MoneyCents::new(row.amount),
            place: row.place,
            remarks: row.remarks.unwrap_or_default(),
        }
    }
}

fn remarks_column(remarks: &str) -> Option<String> {
    (!remarks.is_empty()).then(|| remarks.to_string())
}

/// The transaction form, before validation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionDraft {
    pub date: Option<NaiveDate>,
    pub particulars: String,
    pub amount: MoneyCents,
    pub place: String,
    pub remarks: Option<String>,
}

impl TransactionDraft {
    /// Checks every field rule and collects all failures.
    pub fn validate(&self) -> ResultEngine<()> {
        let mut errors = FieldErrors::default();
        if self.date.is_none() {
            errors.push("date", "Date is required");
        }
        if self.particulars.trim().is_empty() {
            errors.push("particulars", "Particulars is required");
        }
        if !self.amount.is_positive() {
            errors.push("amount", "Valid amount is required");
        }
        if self.place.trim().is_empty() {
            errors.push("place", "Place is required");
        }
        errors.into_result()
    }

    /// Validates the draft and builds the record stored under `id`.
    pub fn into_transaction(self, id: Uuid) -> ResultEngine<Transaction> {
        self.validate()?;
        let date = self.date.ok_or_else(|| {
            let mut errors = FieldErrors::default();
            errors.push("date", "Date is required");
            EngineError::Validation(errors)
        })?;
        Ok(Transaction {
            id,
            date,
            particulars: self.particulars.trim().to_string(),
            amount: self.amount,
            place: self.place.trim().to_string(),
            remarks: self
                .remarks
                .map(|remarks| remarks.trim().to_string())
                .unwrap_or_default(),
        })
    }
}

impl From<&Transaction> for TransactionDraft {
    fn from(tx: &Transaction) -> Self {
        Self {
            date: Some(tx.date),
            particulars: tx.particulars.clone(),
            amount: tx.amount,
            place: tx.place.clone(),
            remarks: Some(tx.remarks.clone()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub batch_id: String,
    pub date: Date,
    pub particulars: String,
    pub amount: i64,
    pub place: String,
    pub remarks: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::batches::Entity",
        from = "Column::BatchId",
        to = "super::batches::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Batches,
}

impl Related<super::batches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&TransactionRow> for ActiveModel {
    fn from(row: &TransactionRow) -> Self {
        Self {
            id: ActiveValue::Set(row.id.to_string()),
            batch_id: ActiveValue::Set(row.batch_id.to_string()),
            date: ActiveValue::Set(row.date),
            particulars: ActiveValue::Set(row.particulars.clone()),
            amount: ActiveValue::Set(row.amount),
            place: ActiveValue::Set(row.place.clone()),
            remarks: ActiveValue::Set(row.remarks.clone()),
            created_at: ActiveValue::Set(row.created_at),
            updated_at: ActiveValue::Set(row.updated_at),
        }
    }
}

impl ActiveModel {
    /// Active model updating every replaceable column of `id`.
    pub(crate) fn from_patch(id: Uuid, patch: &TransactionPatch) -> Self {
        Self {
            id: ActiveValue::Unchanged(id.to_string()),
            batch_id: ActiveValue::NotSet,
            date: ActiveValue::Set(patch.date),
            particulars: ActiveValue::Set(patch.particulars.clone()),
            amount: ActiveValue::Set(patch.amount),
            place: ActiveValue::Set(patch.place.clone()),
            remarks: ActiveValue::Set(patch.remarks.clone()),
            created_at: ActiveValue::NotSet,
            updated_at: ActiveValue::Set(patch.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> TransactionDraft {
        TransactionDraft {
            date: NaiveDate::from_ymd_opt(2024, 1, 5),
            particulars: "  Fuel ".to_string(),
            amount: MoneyCents::new(25_000),
            place: "Pune ".to_string(),
            remarks: None,
        }
    }

    #[test]
    fn into_transaction_trims_text_fields() {
        let id = Uuid::new_v4();
        let tx = draft().into_transaction(id).unwrap();

        assert_eq!(tx.id, id);
        assert_eq!(tx.particulars, "Fuel");
        assert_eq!(tx.place, "Pune");
        assert_eq!(tx.remarks, "");
    }

    #[test]
    fn validate_collects_every_broken_rule() {
        let draft = TransactionDraft {
            date: None,
            particulars: "   ".to_string(),
            amount: MoneyCents::ZERO,
            place: String::new(),
            remarks: Some("note".to_string()),
        };

        let Err(EngineError::Validation(errors)) = draft.validate() else {
            panic!("expected a validation error");
        };
        assert_eq!(errors.iter().count(), 4);
        assert_eq!(errors.message("date"), Some("Date is required"));
        assert_eq!(errors.message("amount"), Some("Valid amount is required"));
    }

    #[test]
    fn negative_amount_is_rejected() {
        let mut draft = draft();
        draft.amount = MoneyCents::new(-1);
        assert!(draft.validate().is_err());
    }

    #[test]
    fn empty_remarks_map_to_null_column() {
        let tx = draft().into_transaction(Uuid::new_v4()).unwrap();
        let row = tx.to_row(Uuid::new_v4(), Utc::now());
        assert_eq!(row.remarks, None);

        let back = Transaction::from(row);
        assert_eq!(back, tx);
    }
}
