use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A second start while a run is in flight. The existing session is
    /// left untouched; there is no mid-flight cancellation.
    #[error("A backtest run is already in progress")]
    AlreadyRunning,
    /// Network or HTTP-level failure. No automatic retry.
    #[error("Request failed: {0}")]
    Transport(#[source] api_client::Error),
    /// The service answered but reported a business failure (or an
    /// unusable payload). The message is surfaced verbatim.
    #[error("Backtest rejected: {0}")]
    Rejected(String),
}

impl Error {
    /// Splits transport failures from business rejections at the client
    /// boundary. Anything the service said about the run itself becomes
    /// `Rejected`; only failures to talk to it at all stay `Transport`.
    pub(crate) fn from_api(e: api_client::Error) -> Self {
        match e {
            api_client::Error::ApiError { msg, .. } => Error::Rejected(msg),
            api_client::Error::DeserializationFailed(e) => {
                Error::Rejected(format!("unexpected response shape: {e}"))
            }
            api_client::Error::EmptyPayload => {
                Error::Rejected("service response carried no payload".to_string())
            }
            other => Error::Transport(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
