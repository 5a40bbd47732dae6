use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Engine(#[from] engine::EngineError),
    #[error("remote error: {0}")]
    Remote(#[from] engine::RemoteError),
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("report error: {0}")]
    Report(#[from] report::ReportError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("terminal error: {0}")]
    Terminal(String),
    #[error("{0}")]
    Usage(String),
}
