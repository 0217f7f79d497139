// Error classification and argument validation for the command line

use crate::error::CrmError;
use crate::models::{LeadStatus, Priority};

/// How a failed command is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid input, missing records, conflicts (exit code 1)
    User,
    /// Database or filesystem failure (exit code 2)
    Internal,
}

impl ErrorKind {
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::User => 1,
            ErrorKind::Internal => 2,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            ErrorKind::User => "Error",
            ErrorKind::Internal => "Internal error",
        }
    }
}

/// Classify an error by the first domain, database or I/O error in its chain.
/// Anything else (argument parsing, config values) is a user error.
pub fn classify(err: &anyhow::Error) -> ErrorKind {
    for cause in err.chain() {
        if let Some(crm) = cause.downcast_ref::<CrmError>() {
            return if crm.is_user_error() { ErrorKind::User } else { ErrorKind::Internal };
        }
        if cause.downcast_ref::<rusqlite::Error>().is_some() || cause.downcast_ref::<std::io::Error>().is_some() {
            return ErrorKind::Internal;
        }
    }
    ErrorKind::User
}

/// Validate that an ID is a positive integer
pub fn parse_id(value: &str, what: &str) -> Result<i64, CrmError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| CrmError::Validation(format!("Invalid {} ID: '{}'. {} ID must be a number.", what.to_lowercase(), value, what)))
        .and_then(|id| {
            if id > 0 {
                Ok(id)
            } else {
                Err(CrmError::Validation(format!("Invalid {} ID: {}. {} ID must be positive.", what.to_lowercase(), id, what)))
            }
        })
}

/// Parse a move target: a stage ID, or `none` to take the lead off the board
pub fn parse_stage_target(value: &str) -> Result<Option<i64>, CrmError> {
    match value.trim().to_lowercase().as_str() {
        "none" | "null" | "-" => Ok(None),
        _ => parse_id(value, "Stage").map(Some),
    }
}

/// Parse a comma-separated list of IDs (e.g. `3,1,2`)
pub fn parse_id_list(value: &str, what: &str) -> Result<Vec<i64>, CrmError> {
    value
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| parse_id(part, what))
        .collect()
}

pub fn parse_status(value: &str) -> Result<LeadStatus, CrmError> {
    LeadStatus::from_str(value.trim()).ok_or_else(|| {
        CrmError::Validation(format!("Invalid status: '{}'. Use cold, warm or hot.", value))
    })
}

pub fn parse_priority(value: &str) -> Result<Priority, CrmError> {
    Priority::from_str(value.trim()).ok_or_else(|| {
        CrmError::Validation(format!("Invalid priority: '{}'. Use low, medium or high.", value))
    })
}

/// Parse an optional field value where `none` clears the field
pub fn parse_clearable<T: std::str::FromStr>(value: &str, field: &str) -> Result<Option<T>, CrmError> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("none") || value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<T>()
        .map(Some)
        .map_err(|_| CrmError::Validation(format!("Invalid {}: '{}'", field, value)))
}
