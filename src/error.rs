use thiserror::Error;

/// Main error type for the account mirror
#[derive(Error, Debug)]
pub enum MirrorError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Startup credential errors (fatal)
    #[error("Credential error: {0}")]
    Credential(String),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Account data errors
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    // Lookup errors
    #[error("Unknown cluster: {0}")]
    UnknownCluster(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for MirrorError
pub type Result<T> = std::result::Result<T, MirrorError>;

impl MirrorError {
    /// Whether the error came from talking to the remote node rather than from
    /// the account contents.
    pub fn is_transient(&self) -> bool {
        matches!(self, MirrorError::Http(_) | MirrorError::Rpc { .. })
    }
}
