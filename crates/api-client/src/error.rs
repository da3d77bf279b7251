use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to build the API client: {0}")]
    ClientBuildError(String),
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Service returned HTTP {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    #[error("Service error: code {code}, msg: {msg}")]
    ApiError { code: i64, msg: String },
    #[error("Service response carried no payload")]
    EmptyPayload,
}

pub type Result<T> = std::result::Result<T, Error>;
