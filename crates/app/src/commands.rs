//! Command handlers over a [`BatchStore`].

use engine::{
    Applied, Batch, BatchDraft, BatchOrder, BatchQuery, BatchStore, EngineError, RemotePort,
    Transaction, TransactionDraft,
};
use report::ReportOptions;
use uuid::Uuid;

use crate::{
    cli::{BatchAction, BatchFields, Command, ListArgs, TxAction, TxCommand, TxFields},
    error::{AppError, Result},
    session::ViewState,
    settings::Settings,
};

pub struct Context<'a> {
    pub settings: &'a Settings,
    pub view: ViewState,
}

/// Prints sync warnings and hands back the applied value.
fn report_warnings<T>(applied: Applied<T>) -> T {
    for warning in &applied.warnings {
        eprintln!("warning: {warning}");
    }
    applied.into_inner()
}

/// Finds a batch by id, or by case-insensitive name.
fn resolve<R: RemotePort>(store: &BatchStore<R>, reference: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(reference)
        && store.find_batch(id).is_some()
    {
        return Ok(id);
    }
    let wanted = reference.trim().to_lowercase();
    let mut matches = store
        .batches()
        .filter(|batch| batch.name().to_lowercase() == wanted);
    match (matches.next(), matches.next()) {
        (Some(batch), None) => Ok(batch.id()),
        (Some(_), Some(_)) => Err(AppError::Usage(format!(
            "more than one batch is named {reference:?}; use its id"
        ))),
        (None, _) => Err(EngineError::NotFound(reference.to_string()).into()),
    }
}

fn resolve_or_selected<R: RemotePort>(
    store: &BatchStore<R>,
    reference: Option<&str>,
) -> Result<Uuid> {
    match reference {
        Some(reference) => resolve(store, reference),
        None => store
            .selected()
            .map(Batch::id)
            .ok_or_else(|| AppError::Usage("no batch selected; pass --batch".to_string())),
    }
}

fn merge_batch(base: BatchDraft, fields: BatchFields) -> BatchDraft {
    BatchDraft {
        name: fields.name.unwrap_or(base.name),
        opening_balance: fields.opening.unwrap_or(base.opening_balance),
        start_date: fields.start.or(base.start_date),
        end_date: fields.end.or(base.end_date),
    }
}

fn merge_transaction(base: TransactionDraft, fields: TxFields) -> TransactionDraft {
    TransactionDraft {
        date: fields.date.or(base.date),
        particulars: fields.particulars.unwrap_or(base.particulars),
        amount: fields.amount.unwrap_or(base.amount),
        place: fields.place.unwrap_or(base.place),
        remarks: fields.remarks.or(base.remarks),
    }
}

fn print_batch_line(batch: &Batch, symbol: &str) {
    println!(
        "{}  {:<24} {} - {}  opening {}  spent {}  closing {}",
        batch.id(),
        batch.name(),
        report::format_date(batch.start_date()),
        report::format_date(batch.end_date()),
        batch.opening_balance().localized(symbol),
        batch.total_expense().localized(symbol),
        batch.closing_balance().localized(symbol),
    );
}

fn print_transaction(tx: &Transaction, symbol: &str) {
    let remarks = if tx.remarks.is_empty() { "-" } else { &tx.remarks };
    println!(
        "  {}  {:<12} {:<24} {:>14}  {:<16} {}",
        tx.id,
        report::format_date(tx.date),
        tx.particulars,
        tx.amount.localized(symbol),
        tx.place,
        remarks,
    );
}

pub async fn run<R: RemotePort>(
    store: &mut BatchStore<R>,
    command: Command,
    ctx: &mut Context<'_>,
) -> Result<()> {
    let symbol = ctx.settings.currency_symbol.clone();
    match command {
        Command::Login(_) => {
            let name = store.user().map(|user| user.name.clone()).unwrap_or_default();
            println!("signed in as {name}; {} batches", store.batches().count());
        }
        Command::Logout => println!("signed out"),
        Command::Batch(batch) => run_batch(store, batch.command, ctx, &symbol).await?,
        Command::Tx(tx) => run_tx(store, tx, &symbol).await?,
        Command::Overview => {
            let overview = store.overview();
            println!("batches       {}", overview.batch_count);
            println!("transactions  {}", overview.transaction_count);
            println!("spent         {}", overview.total_expense.localized(&symbol));
            println!("remaining     {}", overview.closing_balance.localized(&symbol));
            println!();
            println!("recent:");
            for batch in store.recent_batches() {
                print_batch_line(batch, &symbol);
            }
        }
        Command::Export(args) => {
            let id = resolve(store, &args.batch)?;
            let batch = store
                .find_batch(id)
                .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
            let options = ReportOptions {
                currency_symbol: symbol,
            };
            let rendered = report::export(batch, &options, args.format)?;
            let dir = args.out.unwrap_or_else(|| ctx.settings.export_dir.clone());
            let path = report::write_to(&dir, &rendered)?;
            println!("wrote {}", path.display());
        }
    }
    ctx.view.selected_batch = store.selected().map(Batch::id);
    Ok(())
}

async fn run_batch<R: RemotePort>(
    store: &mut BatchStore<R>,
    action: BatchAction,
    ctx: &mut Context<'_>,
    symbol: &str,
) -> Result<()> {
    match action {
        BatchAction::New(fields) => {
            let draft = merge_batch(BatchDraft::default(), fields);
            let batch = report_warnings(store.create_batch(draft).await?);
            println!("created batch {} ({})", batch.name(), batch.id());
        }
        BatchAction::Edit { batch, fields } => {
            let id = resolve(store, &batch)?;
            let base = store
                .find_batch(id)
                .map(BatchDraft::from)
                .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
            let batch = report_warnings(store.update_batch(id, merge_batch(base, fields)).await?);
            print_batch_line(&batch, symbol);
        }
        BatchAction::Rm { batch } => {
            let id = resolve(store, &batch)?;
            let batch = report_warnings(store.delete_batch(id).await?);
            println!(
                "deleted batch {} with {} transactions",
                batch.name(),
                batch.transactions().len()
            );
        }
        BatchAction::Ls(ListArgs {
            filter,
            recent,
            limit,
        }) => {
            let query = BatchQuery {
                name: filter,
                order: if recent {
                    BatchOrder::RecentlyUpdated
                } else {
                    BatchOrder::Inserted
                },
                limit,
            };
            let selected = store.selected().map(Batch::id);
            for batch in store.list_batches(&query) {
                let marker = if Some(batch.id()) == selected { "*" } else { " " };
                print!("{marker} ");
                print_batch_line(batch, symbol);
            }
        }
        BatchAction::Show { batch } => {
            let id = resolve_or_selected(store, batch.as_deref())?;
            let batch = store
                .find_batch(id)
                .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
            print_batch_line(batch, symbol);
            for tx in batch.transactions_by_date() {
                print_transaction(tx, symbol);
            }
        }
        BatchAction::Select { batch } => {
            let id = resolve(store, &batch)?;
            let batch = store.select_batch(id)?;
            println!("selected {}", batch.name());
        }
    }
    ctx.view.selected_batch = store.selected().map(Batch::id);
    Ok(())
}

async fn run_tx<R: RemotePort>(
    store: &mut BatchStore<R>,
    command: TxCommand,
    symbol: &str,
) -> Result<()> {
    let batch_id = resolve_or_selected(store, command.batch.as_deref())?;
    match command.command {
        TxAction::Add(fields) => {
            let draft = merge_transaction(TransactionDraft::default(), fields);
            let tx = report_warnings(store.add_transaction(batch_id, draft).await?);
            print_transaction(&tx, symbol);
        }
        TxAction::Edit { id, fields } => {
            let base = store
                .find_transaction(batch_id, id)
                .map(TransactionDraft::from)
                .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
            let tx = report_warnings(
                store
                    .update_transaction(batch_id, id, merge_transaction(base, fields))
                    .await?,
            );
            print_transaction(&tx, symbol);
        }
        TxAction::Rm { id } => {
            let tx = report_warnings(store.delete_transaction(batch_id, id).await?);
            println!("deleted {} ({})", tx.particulars, tx.id);
        }
    }
    if let Some(batch) = store.find_batch(batch_id) {
        print_batch_line(batch, symbol);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use engine::{MoneyCents, Offline};

    use super::*;

    async fn store_with(names: &[&str]) -> BatchStore<Offline> {
        let mut store = BatchStore::builder(Offline).build().unwrap();
        for name in names {
            let draft = BatchDraft {
                name: name.to_string(),
                opening_balance: MoneyCents::new(10_000),
                start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
                end_date: NaiveDate::from_ymd_opt(2024, 1, 31),
            };
            store.create_batch(draft).await.unwrap().into_inner();
        }
        store
    }

    #[tokio::test]
    async fn batches_resolve_by_name_or_id() {
        let store = store_with(&["Goa", "Office"]).await;
        let office = store.batches().nth(1).unwrap().id();

        assert_eq!(resolve(&store, "office").unwrap(), office);
        assert_eq!(resolve(&store, &office.to_string()).unwrap(), office);
        assert!(matches!(
            resolve(&store, "nope"),
            Err(AppError::Engine(EngineError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn ambiguous_names_need_an_id() {
        let store = store_with(&["Goa", "goa"]).await;
        assert!(matches!(resolve(&store, "GOA"), Err(AppError::Usage(_))));
    }

    #[test]
    fn edits_keep_unspecified_fields() {
        let base = TransactionDraft {
            date: NaiveDate::from_ymd_opt(2024, 1, 2),
            particulars: "Taxi".to_string(),
            amount: MoneyCents::new(5_000),
            place: "Panaji".to_string(),
            remarks: Some("airport".to_string()),
        };
        let merged = merge_transaction(
            base.clone(),
            TxFields {
                amount: Some(MoneyCents::new(6_000)),
                ..TxFields::default()
            },
        );

        assert_eq!(merged.amount, MoneyCents::new(6_000));
        assert_eq!(merged.particulars, base.particulars);
        assert_eq!(merged.remarks, base.remarks);
    }
}
