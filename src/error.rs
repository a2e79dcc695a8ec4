use thiserror::Error;

/// Failure classes for the observation store.
///
/// The library never recovers locally: every error propagates to the
/// caller, who decides whether to retry or abort.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("table operation failed: {0}")]
    Table(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("write failed: {0}")]
    Write(String),

    #[error("read failed: {0}")]
    Read(String),

    #[error("record has no `{0}` block")]
    MissingBlock(&'static str),

    #[error("key attribute `{0}` is empty")]
    EmptyKey(&'static str),

    #[error("timed out waiting for table `{table}` to become {target}")]
    Timeout {
        table: String,
        target: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;
