use thiserror::Error;

pub type Result<T, E = BlockClientError> = std::result::Result<T, E>;

/// Errors produced while resolving blocks and transactions.
#[derive(Debug, Error)]
pub enum BlockClientError {
    #[error("an identifier: '{0}' is invalid")]
    InvalidIdentifier(String),
    #[error("upstream request error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),
    /// The node answered with a JSON-RPC error object.
    #[error("Ethereum node has returned an error with message: {message} (code {code})")]
    Upstream { code: i64, message: String },
    /// The node answered with neither a result nor an error.
    #[error("a resulting block in a response is empty because of unknown reason")]
    EmptyResult,
    #[error("the transaction with Hash={hash} not found in a requested block (blockHash={block_hash})")]
    TransactionHashNotFound { block_hash: String, hash: String },
    #[error("the transaction with ID={index:#x} not found in a requested block (blockHash={block_hash})")]
    TransactionIndexNotFound { block_hash: String, index: u64 },
    #[error("malformed block number '{0}' in upstream response")]
    MalformedBlockNumber(String),
    #[error("failed to initialize block client: {0}")]
    ClientInit(#[source] Box<BlockClientError>),
}

impl BlockClientError {
    pub fn invalid_identifier(raw: impl Into<String>) -> Self {
        Self::InvalidIdentifier(raw.into())
    }

    /// Whether the error was caused by the caller rather than the proxy or the node.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidIdentifier(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TransactionHashNotFound { .. } | Self::TransactionIndexNotFound { .. }
        )
    }
}

/// Errors raised while assembling or running the proxy process.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("bind or socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to build upstream HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error(transparent)]
    Client(#[from] BlockClientError),
}
