use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("document has no readable text: {0}")]
    EmptyDocument(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("store not initialized: {0}")]
    NotInitialized(String),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    #[error("invalid model output: {0}")]
    InvalidOutput(String),

    #[error("provider rate limited the request")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("provider request failed: {0}")]
    Provider(String),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
