use std::path::PathBuf;

/// Errors surfaced by the harvesting pipeline.
///
/// Malformed capabilities content is never an error here: extraction degrades
/// to defaults. Only I/O, decoding and report serialization can fail.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("xlsx error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Which request of the login → GetCapabilities flow failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    Login,
    GetCapabilities,
}

impl std::fmt::Display for FetchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStage::Login => write!(f, "Login"),
            FetchStage::GetCapabilities => write!(f, "GetCapabilities"),
        }
    }
}

/// Per-environment fetch failure. These are reported and skipped, never fatal.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{0} is missing from .env file")]
    MissingKey(&'static str),

    #[error("{stage} failed HTTP {status}: {reason}")]
    Http {
        stage: FetchStage,
        status: u16,
        reason: String,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{stage} connection error: {source}")]
    Connection {
        stage: FetchStage,
        #[source]
        source: reqwest::Error,
    },

    #[error("{stage} response is not valid JSON")]
    InvalidJson { stage: FetchStage },

    #[error("No JWT token found in login response (keys present: {keys:?})")]
    NoToken { keys: Vec<String> },

    #[error("Could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, HarvestError>;
