use thiserror::Error;

use crate::core::task::TaskId;

/// Every way a task operation can fail. None of these are fatal; the shell
/// shows the message and keeps the last good collection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("Not logged in or session expired")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
    #[error("Task {0} no longer exists")]
    NotFound(TaskId),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Unexpected response from server: {0}")]
    Malformed(String),
    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },
    #[error("Keyring error: {0}")]
    Keyring(String),
}

impl TaskError {
    /// The credential is missing or was rejected; the user has to log in again.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// The local collection is out of date with the server.
    pub fn suggests_refresh(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<reqwest::Error> for TaskError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Malformed(e.to_string())
        } else if e.is_timeout() {
            Self::Network(format!("request timed out: {}", e))
        } else {
            Self::Network(e.to_string())
        }
    }
}
