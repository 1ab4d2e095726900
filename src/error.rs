use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("No financial data found: {0}")]
    NoData(String),

    #[error("Insufficient history: at least {required} months are required, found {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Resource not found: {0}")]
    UnknownResource(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Language model error (status {status:?}): {message}")]
    Llm { status: Option<u16>, message: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[cfg(feature = "gemini")]
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[cfg(feature = "server")]
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[cfg(feature = "server")]
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}

impl AdvisorError {
    /// True for failures caused by the caller's input or by missing data,
    /// as opposed to infrastructure failures.
    pub fn is_domain_error(&self) -> bool {
        matches!(
            self,
            AdvisorError::NoData(_)
                | AdvisorError::InsufficientHistory { .. }
                | AdvisorError::InvalidParameter(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AdvisorError>;
