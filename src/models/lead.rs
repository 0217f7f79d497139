use serde::{Deserialize, Serialize};

/// Lead temperature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    Cold,
    Warm,
    Hot,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 3] = [LeadStatus::Cold, LeadStatus::Warm, LeadStatus::Hot];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Cold => "cold",
            LeadStatus::Warm => "warm",
            LeadStatus::Hot => "hot",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cold" => Some(LeadStatus::Cold),
            "warm" => Some(LeadStatus::Warm),
            "hot" => Some(LeadStatus::Hot),
            _ => None,
        }
    }
}

impl Default for LeadStatus {
    fn default() -> Self {
        LeadStatus::Cold
    }
}

/// Lead priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// A sales opportunity tied to exactly one contact.
///
/// `stage_id` and `position` are either both set (the lead sits on a kanban
/// column) or both `None` (unstaged). Within a stage, positions run 0..n-1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub contact_id: i64,
    pub pipeline_id: Option<i64>,
    pub stage_id: Option<i64>,
    pub position: Option<i64>,
    pub status: LeadStatus,
    pub priority: Priority,
    pub score: Option<i64>,
    pub value: Option<f64>,
    pub source: Option<String>,
    pub last_interaction_ts: Option<i64>,
    pub created_ts: i64,
    pub modified_ts: i64,
}

/// Fields accepted when creating a lead
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewLead {
    pub contact_id: i64,
    pub status: Option<LeadStatus>,
    pub priority: Option<Priority>,
    pub score: Option<i64>,
    pub value: Option<f64>,
    pub source: Option<String>,
    /// Stage to append the lead to
    pub stage_id: Option<i64>,
}

impl NewLead {
    pub fn for_contact(contact_id: i64) -> Self {
        Self {
            contact_id,
            ..Default::default()
        }
    }
}

/// Partial lead update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadUpdate {
    pub status: Option<LeadStatus>,
    pub priority: Option<Priority>,
    pub score: Option<Option<i64>>,
    pub value: Option<Option<f64>>,
    pub source: Option<Option<String>>,
}

/// Filter for lead listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub priority: Option<Priority>,
}
