use thiserror::Error;

/// Failures inside the persistence adapter. These never escape the adapter:
/// they are logged and the operation degrades to "no persisted data".
#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
