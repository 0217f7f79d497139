// Input validation shared by repositories and the CLI.
// Failures surface as CrmError::Validation before anything touches the database.

use crate::error::{CrmError, CrmResult};

/// Trim a required text field, rejecting blank values
pub fn required_text(value: &str, field_name: &str) -> CrmResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(CrmError::Validation(format!("{} is required", field_name)))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Trim an optional text field; blank becomes `None`
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Minimal address check: one '@', non-empty local part, dotted domain, no whitespace.
/// Addresses are stored lowercased.
pub fn validate_email(email: &str) -> CrmResult<String> {
    let email = email.trim();
    let invalid = || CrmError::Validation(format!("Invalid email address: '{}'", email));

    if email.is_empty() {
        return Err(CrmError::Validation("Email is required".to_string()));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }

    Ok(email.to_lowercase())
}

/// Instagram handles: letters, digits, dots and underscores; a leading '@' is dropped
pub fn normalize_instagram(handle: Option<&str>) -> CrmResult<Option<String>> {
    let Some(handle) = optional_text(handle) else {
        return Ok(None);
    };
    let handle = handle.trim_start_matches('@').to_string();
    if handle.is_empty()
        || !handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
    {
        return Err(CrmError::Validation(format!("Invalid Instagram user: '{}'", handle)));
    }
    Ok(Some(handle))
}

/// Stage colors are `#rrggbb` hex strings
pub fn validate_color(color: Option<&str>) -> CrmResult<Option<String>> {
    let Some(color) = optional_text(color) else {
        return Ok(None);
    };
    let hex = color.strip_prefix('#').unwrap_or("");
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(Some(color.to_lowercase()))
    } else {
        Err(CrmError::Validation(format!(
            "Invalid color: '{}'. Use the #rrggbb form.",
            color
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("  Sales ", "Name").unwrap(), "Sales");
        assert_eq!(
            required_text("   ", "Pipeline name"),
            Err(CrmError::Validation("Pipeline name is required".to_string()))
        );
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(Some(" x ")), Some("x".to_string()));
        assert_eq!(optional_text(Some("  ")), None);
        assert_eq!(optional_text(None), None);
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(" Ana@Example.com ").unwrap(), "ana@example.com");
        assert!(validate_email("").is_err());
        assert!(validate_email("ana").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ana@example").is_err());
        assert!(validate_email("ana@ex..com").is_err());
        assert!(validate_email("a na@example.com").is_err());
        assert!(validate_email("a@b@example.com").is_err());
    }

    #[test]
    fn test_normalize_instagram() {
        assert_eq!(normalize_instagram(Some("@ana.g")).unwrap(), Some("ana.g".to_string()));
        assert_eq!(normalize_instagram(Some("")).unwrap(), None);
        assert!(normalize_instagram(Some("ana g")).is_err());
    }

    #[test]
    fn test_validate_color() {
        assert_eq!(validate_color(Some("#FF8800")).unwrap(), Some("#ff8800".to_string()));
        assert_eq!(validate_color(None).unwrap(), None);
        assert!(validate_color(Some("red")).is_err());
        assert!(validate_color(Some("#12345")).is_err());
    }
}
