use thiserror::Error;

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database {0} does not exist (run `shipdash init` or `shipdash import` first)")]
    DatabaseMissing(String),

    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    #[error("Unknown ride type: {0}")]
    UnknownRideType(String),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, FleetError>;
