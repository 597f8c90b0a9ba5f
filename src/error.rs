#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("CSV file is empty or invalid")]
    EmptyCsv,

    #[error("CSV file must contain either a \"cardIdentifier\" or \"uuid\" column")]
    MissingIdentityColumn,

    #[error("No valid cards found in the CSV file")]
    NoValidCards,

    #[error("No cards to export")]
    NothingToExport,

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, InventoryError>;
