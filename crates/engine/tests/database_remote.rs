use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    BatchDraft, BatchStore, DatabaseRemote, EngineError, LocalSnapshot, MoneyCents, Offline,
    RemoteError, RemotePort, SessionEvent, TransactionDraft, User,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn database() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

async fn store_with_db() -> (BatchStore<DatabaseRemote>, DatabaseConnection) {
    let db = database().await;
    let store = BatchStore::builder(DatabaseRemote::new(db.clone()))
        .user(User::new("alice", "alice@example.com", "Alice"))
        .build()
        .unwrap();
    (store, db)
}

async fn count(db: &DatabaseConnection, table: &str) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            format!("SELECT COUNT(*) AS n FROM {table}"),
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "n").unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn batch_draft(name: &str, opening: i64) -> BatchDraft {
    BatchDraft {
        name: name.to_string(),
        opening_balance: MoneyCents::new(opening),
        start_date: Some(date(2024, 3, 1)),
        end_date: Some(date(2024, 3, 31)),
    }
}

fn expense(particulars: &str, amount: i64, day: u32, remarks: Option<&str>) -> TransactionDraft {
    TransactionDraft {
        date: Some(date(2024, 3, day)),
        particulars: particulars.to_string(),
        amount: MoneyCents::new(amount),
        place: "Kochi".to_string(),
        remarks: remarks.map(str::to_string),
    }
}

#[tokio::test]
async fn reload_reproduces_local_state() {
    let (mut store, _db) = store_with_db().await;
    let batch = store
        .create_batch(batch_draft("March", 200_000))
        .await
        .unwrap()
        .into_inner();
    for (name, amount, day, remarks) in [
        ("Rent", 120_000, 1, Some("paid early")),
        ("Groceries", 8_450, 4, None),
        ("Fuel", 3_200, 9, None),
    ] {
        let applied = store
            .add_transaction(batch.id(), expense(name, amount, day, remarks))
            .await
            .unwrap();
        assert!(applied.is_synced(), "{:?}", applied.warnings);
    }
    let local = store.find_batch(batch.id()).unwrap().clone();

    store.load_batches().await.unwrap();
    let reloaded = store.find_batch(batch.id()).unwrap();

    assert_eq!(reloaded.name(), local.name());
    assert_eq!(reloaded.transactions(), local.transactions());
    assert_eq!(reloaded.total_expense(), MoneyCents::new(131_650));
    assert_eq!(reloaded.closing_balance(), MoneyCents::new(68_350));
    assert_eq!(reloaded.transactions()[0].remarks, "paid early");
    assert_eq!(reloaded.transactions()[1].remarks, "");
}

#[tokio::test]
async fn deleting_a_batch_removes_its_rows() {
    let (mut store, db) = store_with_db().await;
    let keep = store
        .create_batch(batch_draft("Keep", 10_000))
        .await
        .unwrap()
        .into_inner();
    let gone = store
        .create_batch(batch_draft("Gone", 10_000))
        .await
        .unwrap()
        .into_inner();
    store
        .add_transaction(keep.id(), expense("Tea", 500, 2, None))
        .await
        .unwrap()
        .into_inner();
    store
        .add_transaction(gone.id(), expense("Bus", 700, 3, None))
        .await
        .unwrap()
        .into_inner();
    store
        .add_transaction(gone.id(), expense("Lunch", 1_200, 3, None))
        .await
        .unwrap()
        .into_inner();

    let applied = store.delete_batch(gone.id()).await.unwrap();
    assert!(applied.is_synced());

    assert_eq!(count(&db, "batches").await, 1);
    assert_eq!(count(&db, "transactions").await, 1);
}

#[tokio::test]
async fn edits_update_stored_totals() {
    let (mut store, db) = store_with_db().await;
    let batch = store
        .create_batch(batch_draft("March", 50_000))
        .await
        .unwrap()
        .into_inner();
    let tx = store
        .add_transaction(batch.id(), expense("Taxi", 4_000, 5, None))
        .await
        .unwrap()
        .into_inner();

    let mut edit = TransactionDraft::from(&tx);
    edit.amount = MoneyCents::new(6_500);
    edit.remarks = Some("airport".to_string());
    store
        .update_transaction(batch.id(), tx.id, edit)
        .await
        .unwrap()
        .into_inner();

    let remote = DatabaseRemote::new(db);
    let rows = remote.list_batches_for_user("alice").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].total_expense, 6_500);
    assert_eq!(rows[0].closing_balance, 43_500);

    let tx_rows = remote
        .list_transactions_for_batches(&[batch.id()])
        .await
        .unwrap();
    assert_eq!(tx_rows[0].remarks.as_deref(), Some("airport"));
}

#[tokio::test]
async fn batches_are_scoped_by_user() {
    let db = database().await;
    let mut alice = BatchStore::builder(DatabaseRemote::new(db.clone()))
        .user(User::new("alice", "alice@example.com", ""))
        .build()
        .unwrap();
    alice
        .create_batch(batch_draft("Alice", 1_000))
        .await
        .unwrap()
        .into_inner();

    let mut bob = BatchStore::builder(DatabaseRemote::new(db))
        .build()
        .unwrap();
    bob.on_session_event(SessionEvent::SignedIn(User::new("bob", "bob@example.com", "")))
        .await
        .unwrap();
    assert_eq!(bob.batches().count(), 0);
}

#[tokio::test]
async fn missing_rows_are_reported() {
    let remote = DatabaseRemote::new(database().await);

    let err = remote.delete_batch(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, RemoteError::NotFound(_)));

    let err = remote.delete_transaction(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, RemoteError::NotFound(_)));
}

#[tokio::test]
async fn remote_not_found_surfaces_as_warning() {
    let (mut store, db) = store_with_db().await;
    let batch = store
        .create_batch(batch_draft("March", 50_000))
        .await
        .unwrap()
        .into_inner();
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "DELETE FROM batches".to_string(),
    ))
    .await
    .unwrap();

    let applied = store
        .update_batch(batch.id(), batch_draft("Renamed", 50_000))
        .await
        .unwrap();
    assert_eq!(applied.warnings.len(), 1);
    assert!(matches!(applied.warnings[0].error, RemoteError::NotFound(_)));
    assert_eq!(store.find_batch(batch.id()).unwrap().name(), "Renamed");
}

#[tokio::test]
async fn snapshot_round_trip_rederives_totals() {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_state");
    let path = root.join(format!("snapshot_{}.json", Uuid::new_v4()));

    let mut store = BatchStore::builder(Offline)
        .snapshot(LocalSnapshot::new(&path))
        .build()
        .unwrap();
    let batch = store
        .create_batch(batch_draft("Offline", 10_000))
        .await
        .unwrap()
        .into_inner();
    store
        .add_transaction(batch.id(), expense("Snacks", 1_250, 6, None))
        .await
        .unwrap()
        .into_inner();

    // Stale totals in the file are ignored on load.
    let raw = std::fs::read_to_string(&path).unwrap();
    let mut state: serde_json::Value = serde_json::from_str(&raw).unwrap();
    state["batches"][0]["closing_balance"] = serde_json::json!(0);
    std::fs::write(&path, serde_json::to_string(&state).unwrap()).unwrap();

    let restored = BatchStore::builder(Offline)
        .snapshot(LocalSnapshot::new(&path))
        .build()
        .unwrap();
    let restored = restored.find_batch(batch.id()).unwrap();
    assert_eq!(restored.total_expense(), MoneyCents::new(1_250));
    assert_eq!(restored.closing_balance(), MoneyCents::new(8_750));

    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn corrupt_snapshot_fails_to_build() {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_state");
    std::fs::create_dir_all(&root).unwrap();
    let path = root.join(format!("corrupt_{}.json", Uuid::new_v4()));
    std::fs::write(&path, "{ not json").unwrap();

    let err = BatchStore::builder(Offline)
        .snapshot(LocalSnapshot::new(&path))
        .build()
        .unwrap_err();
    assert!(matches!(err, EngineError::Json(_)));

    std::fs::remove_file(&path).unwrap();
}
