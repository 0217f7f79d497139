use serde::Serialize;
use thiserror::Error;

/// Domain errors surfaced by repositories, the kanban engine and the dashboard.
///
/// `NotFound`, `Conflict` and `Validation` are user errors: the input referenced
/// something missing, collided with a unique row, or was malformed. `Internal`
/// wraps any other database failure with its underlying message.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CrmError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Internal(String),
}

pub type CrmResult<T> = std::result::Result<T, CrmError>;

impl CrmError {
    pub fn not_found(what: &str, id: i64) -> Self {
        CrmError::NotFound(format!("{} {}", what, id))
    }

    pub fn is_user_error(&self) -> bool {
        !matches!(self, CrmError::Internal(_))
    }
}

impl From<rusqlite::Error> for CrmError {
    fn from(err: rusqlite::Error) -> Self {
        CrmError::Internal(err.to_string())
    }
}

/// True when the error is a UNIQUE (or primary key) constraint failure.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        }
        _ => false,
    }
}

/// Map a unique-constraint failure to `Conflict(message)`, anything else to `Internal`.
pub fn conflict_on_unique(err: rusqlite::Error, message: &str) -> CrmError {
    if is_unique_violation(&err) {
        CrmError::Conflict(message.to_string())
    } else {
        CrmError::from(err)
    }
}

/// Result object handed back at the action boundary:
/// `{"success": true}` or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ActionOutcome {
    Success { success: bool },
    Failure { error: String },
}

impl ActionOutcome {
    pub fn success() -> Self {
        ActionOutcome::Success { success: true }
    }

    pub fn from_result<T>(result: &CrmResult<T>) -> Self {
        match result {
            Ok(_) => Self::success(),
            Err(e) => ActionOutcome::Failure { error: e.to_string() },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Success { .. })
    }
}
