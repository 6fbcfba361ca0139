use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session id contains a null byte")]
    NullByte,

    #[error("session id '{0}' contains a path separator")]
    PathSeparator(String),

    #[error("session id '{0}' does not match debug-<14 digits>-<8 hex>")]
    InvalidFormat(String),

    #[error("session path {} escapes the sessions directory", .0.display())]
    PathEscape(PathBuf),

    #[error("session '{0}' not found")]
    NotFound(String),

    #[error("session '{0}' already exists")]
    AlreadyExists(String),

    #[error("session file {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize session '{id}': {source}")]
    Serialize {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SessionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SessionError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the identifier contract violations, as opposed to missing or
    /// damaged data.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            SessionError::NullByte
                | SessionError::PathSeparator(_)
                | SessionError::InvalidFormat(_)
                | SessionError::PathEscape(_)
        )
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
