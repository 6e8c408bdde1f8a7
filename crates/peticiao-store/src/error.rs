/// Failure of a single store request or of store configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode store response: {0}")]
    Decode(String),

    #[error("invalid store configuration: {0}")]
    Config(String),

    #[error("table unavailable: {table}")]
    Unavailable { table: String },
}

/// A multi-request read failed; nothing fetched by that call is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fetch from `{table}` failed: {source}")]
pub struct FetchError {
    pub table: String,
    #[source]
    pub source: StoreError,
}

impl FetchError {
    pub fn new(table: impl Into<String>, source: StoreError) -> Self {
        Self {
            table: table.into(),
            source,
        }
    }
}
