//! Remote tables in a relational database, through `sea-orm`.
//!
//! The schema comes from the `migration` crate; run it before handing the
//! connection over.

use api_types::{
    batch::{BatchPatch, BatchRow},
    transaction::{TransactionPatch, TransactionRow},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use uuid::Uuid;

use super::{RemotePort, RemoteResult};
use crate::{RemoteError, batches, transactions, util::parse_uuid};

#[derive(Clone, Debug)]
pub struct DatabaseRemote {
    database: DatabaseConnection,
}

impl DatabaseRemote {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

fn batch_row(model: batches::Model) -> RemoteResult<BatchRow> {
    Ok(BatchRow {
        id: parse_uuid(&model.id, "batch")?,
        user_id: model.user_id,
        name: model.name,
        opening_balance: model.opening_balance,
        start_date: model.start_date,
        end_date: model.end_date,
        total_expense: model.total_expense,
        closing_balance: model.closing_balance,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

fn transaction_row(model: transactions::Model) -> RemoteResult<TransactionRow> {
    Ok(TransactionRow {
        id: parse_uuid(&model.id, "transaction")?,
        batch_id: parse_uuid(&model.batch_id, "batch")?,
        date: model.date,
        particulars: model.particulars,
        amount: model.amount,
        place: model.place,
        remarks: model.remarks,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

/// Maps "no row matched the update" to a not-found error.
fn updated(result: Result<impl Sized, DbErr>, id: Uuid) -> RemoteResult<()> {
    match result {
        Ok(_) => Ok(()),
        Err(DbErr::RecordNotUpdated) => Err(RemoteError::NotFound(id.to_string())),
        Err(err) => Err(err.into()),
    }
}

impl RemotePort for DatabaseRemote {
    async fn list_batches_for_user(&self, user_id: &str) -> RemoteResult<Vec<BatchRow>> {
        batches::Entity::find()
            .filter(batches::Column::UserId.eq(user_id))
            .order_by_asc(batches::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(batch_row)
            .collect()
    }

    async fn list_transactions_for_batches(
        &self,
        batch_ids: &[Uuid],
    ) -> RemoteResult<Vec<TransactionRow>> {
        if batch_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = batch_ids.iter().map(Uuid::to_string).collect();
        transactions::Entity::find()
            .filter(transactions::Column::BatchId.is_in(ids))
            .order_by_asc(transactions::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(transaction_row)
            .collect()
    }

    async fn insert_batch(&self, row: BatchRow) -> RemoteResult<BatchRow> {
        let model = batches::ActiveModel::from(&row)
            .insert(&self.database)
            .await?;
        batch_row(model)
    }

    async fn update_batch(&self, id: Uuid, patch: BatchPatch) -> RemoteResult<()> {
        let result = batches::ActiveModel::from_patch(id, &patch)
            .update(&self.database)
            .await;
        updated(result, id)
    }

    async fn delete_batch(&self, id: Uuid) -> RemoteResult<()> {
        let db_tx = self.database.begin().await?;
        transactions::Entity::delete_many()
            .filter(transactions::Column::BatchId.eq(id.to_string()))
            .exec(&db_tx)
            .await?;
        let deleted = batches::Entity::delete_by_id(id.to_string())
            .exec(&db_tx)
            .await?;
        if deleted.rows_affected == 0 {
            db_tx.rollback().await?;
            return Err(RemoteError::NotFound(id.to_string()));
        }
        db_tx.commit().await?;
        Ok(())
    }

    async fn insert_transaction(&self, row: TransactionRow) -> RemoteResult<TransactionRow> {
        let model = transactions::ActiveModel::from(&row)
            .insert(&self.database)
            .await?;
        transaction_row(model)
    }

    async fn update_transaction(&self, id: Uuid, patch: TransactionPatch) -> RemoteResult<()> {
        let result = transactions::ActiveModel::from_patch(id, &patch)
            .update(&self.database)
            .await;
        updated(result, id)
    }

    async fn delete_transaction(&self, id: Uuid) -> RemoteResult<()> {
        let deleted = transactions::Entity::delete_by_id(id.to_string())
            .exec(&self.database)
            .await?;
        if deleted.rows_affected == 0 {
            return Err(RemoteError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
