use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use engine::MoneyCents;
use report::ExportFormat;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "batchbook")]
#[command(about = "Track expenses in date-bounded batches")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Override the log level (error, warn, info, debug, trace).
    #[arg(long, global = true)]
    pub level: Option<String>,
    /// Override the directory holding the snapshot, session and state files.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and load the user's batches.
    Login(LoginArgs),
    /// Sign out. Offline batches stay in the local snapshot.
    Logout,
    Batch(BatchCommand),
    Tx(TxCommand),
    /// Totals across every batch.
    Overview,
    /// Write a batch report file.
    Export(ExportArgs),
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,
    /// Display name; defaults to the email local part.
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args, Debug)]
pub struct BatchCommand {
    #[command(subcommand)]
    pub command: BatchAction,
}

#[derive(Subcommand, Debug)]
pub enum BatchAction {
    New(BatchFields),
    Edit {
        /// Batch id or name.
        batch: String,
        #[command(flatten)]
        fields: BatchFields,
    },
    Rm {
        batch: String,
    },
    Ls(ListArgs),
    Show {
        batch: Option<String>,
    },
    Select {
        batch: String,
    },
}

#[derive(Args, Debug, Default)]
pub struct BatchFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub opening: Option<MoneyCents>,
    /// First day, YYYY-MM-DD.
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// Last day, YYYY-MM-DD.
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Case-insensitive part of the batch name.
    #[arg(long)]
    pub filter: Option<String>,
    /// Most recently updated first.
    #[arg(long)]
    pub recent: bool,
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct TxCommand {
    /// Batch id or name; defaults to the selected batch.
    #[arg(long)]
    pub batch: Option<String>,

    #[command(subcommand)]
    pub command: TxAction,
}

#[derive(Subcommand, Debug)]
pub enum TxAction {
    Add(TxFields),
    Edit {
        id: Uuid,
        #[command(flatten)]
        fields: TxFields,
    },
    Rm {
        id: Uuid,
    },
}

#[derive(Args, Debug, Default)]
pub struct TxFields {
    /// Day of the expense, YYYY-MM-DD.
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[arg(long)]
    pub particulars: Option<String>,
    #[arg(long)]
    pub amount: Option<MoneyCents>,
    #[arg(long)]
    pub place: Option<String>,
    #[arg(long)]
    pub remarks: Option<String>,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Batch id or name.
    pub batch: String,
    #[arg(long, default_value = "xlsx")]
    pub format: ExportFormat,
    /// Target directory; defaults to the configured export directory.
    #[arg(long)]
    pub out: Option<PathBuf>,
}
