use std::io;
use thiserror::Error;

/// Error taxonomy. Every `QuestDropError` maps to exactly one kind,
/// and callers branch on the kind rather than on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Collaborator temporarily unreachable. Bounded retry with backoff is safe;
    /// no state mutation may be assumed to have happened.
    Transient,
    /// Outcome unknown (finality deadline expired, or a concurrent claim holds the
    /// key). Re-query ledger state before any resubmission.
    Retryable,
    /// The ledger rejected a duplicate mutation. Success path, never escalated.
    AlreadyClaimed,
    /// Rejected at the boundary with zero side effects.
    Validation,
    /// Misconfiguration or authorization failure. Aborts the current unit of work.
    Fatal,
}

impl ErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Retryable => "retryable",
            Self::AlreadyClaimed => "already_claimed",
            Self::Validation => "validation",
            Self::Fatal => "fatal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum QuestDropError {
    #[error("objective store unavailable during {operation}: {details}")]
    StoreUnavailable { operation: String, details: String },

    #[error("ledger unavailable during {operation}: {details}")]
    LedgerUnavailable { operation: String, details: String },

    #[error("seal deadline expired for tx {tx_id} after {waited_ms}ms; outcome unknown")]
    SealDeadlineExpired { tx_id: String, waited_ms: u64 },

    #[error("objective {objective} already registered for {identity}")]
    AlreadyRegistered { identity: String, objective: String },

    #[error("airdrop already claimed by {identity}")]
    AlreadyClaimed { identity: String },

    #[error("sync already in flight for {identity}/{objective}")]
    SyncInFlight { identity: String, objective: String },

    #[error("airdrop already in flight for {identity}")]
    AirdropInFlight { identity: String },

    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("unrecognized objective code: {0}")]
    UnrecognizedObjective(String),

    #[error("ledger authorization rejected: {details}")]
    Unauthorized { details: String },

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("storage error during {operation}: {details}")]
    StorageError { operation: String, details: String },

    #[error("{format} serialization error: {details}")]
    SerializationError { format: String, details: String },

    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, QuestDropError>;

impl QuestDropError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QuestDropError::StoreUnavailable { .. } | QuestDropError::LedgerUnavailable { .. } => ErrorKind::Transient,
            QuestDropError::SealDeadlineExpired { .. }
            | QuestDropError::SyncInFlight { .. }
            | QuestDropError::AirdropInFlight { .. } => ErrorKind::Retryable,
            QuestDropError::AlreadyRegistered { .. } | QuestDropError::AlreadyClaimed { .. } => ErrorKind::AlreadyClaimed,
            QuestDropError::InvalidIdentity(_) | QuestDropError::UnrecognizedObjective(_) => ErrorKind::Validation,
            QuestDropError::Unauthorized { .. }
            | QuestDropError::ConfigError(_)
            | QuestDropError::StorageError { .. }
            | QuestDropError::SerializationError { .. }
            | QuestDropError::Message(_) => ErrorKind::Fatal,
        }
    }

    /// True for the error classes a caller may retry after backoff without
    /// first re-querying ledger state.
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

impl From<io::Error> for QuestDropError {
    fn from(err: io::Error) -> Self {
        QuestDropError::StorageError { operation: "io".to_string(), details: err.to_string() }
    }
}

impl From<serde_json::Error> for QuestDropError {
    fn from(err: serde_json::Error) -> Self {
        QuestDropError::SerializationError { format: "json".to_string(), details: err.to_string() }
    }
}

impl From<bincode::Error> for QuestDropError {
    fn from(err: bincode::Error) -> Self {
        QuestDropError::SerializationError { format: "bincode".to_string(), details: err.to_string() }
    }
}

impl From<rocksdb::Error> for QuestDropError {
    fn from(err: rocksdb::Error) -> Self {
        QuestDropError::StorageError { operation: "rocksdb".to_string(), details: err.to_string() }
    }
}

// NOTE: reqwest errors are converted at the call site so the operation name and
// collaborator (store vs ledger) are preserved in the variant.
