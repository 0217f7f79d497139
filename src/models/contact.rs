use serde::{Deserialize, Serialize};

/// A person or account the CRM tracks. Owns at most one lead,
/// plus any number of tasks and messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
    pub instagram: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub created_ts: i64,
    pub modified_ts: i64,
}

impl Contact {
    /// Name if present, otherwise the email
    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.trim().is_empty()).unwrap_or(self.email.as_str())
    }
}

/// Editable contact fields, used for both create and update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactInput {
    pub name: Option<String>,
    pub email: String,
    pub instagram: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl ContactInput {
    pub fn new(email: &str) -> Self {
        Self {
            email: email.to_string(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

/// Minimal contact projection used in pickers and activity lists
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactRef {
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_email() {
        let mut contact = Contact {
            id: 1,
            name: None,
            email: "ana@example.com".to_string(),
            instagram: None,
            phone: None,
            company: None,
            city: None,
            country: None,
            created_ts: 0,
            modified_ts: 0,
        };
        assert_eq!(contact.display_name(), "ana@example.com");

        contact.name = Some("  ".to_string());
        assert_eq!(contact.display_name(), "ana@example.com");

        contact.name = Some("Ana".to_string());
        assert_eq!(contact.display_name(), "Ana");
    }
}
