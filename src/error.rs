use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error: status {status} on {endpoint}")]
    Api { status: u16, endpoint: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Dataframe error: {0}")]
    Dataframe(#[from] polars::prelude::PolarsError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
