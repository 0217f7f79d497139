use serde::{Deserialize, Serialize};

/// Follow-up item for a contact or lead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub pending: bool,
    pub due_ts: Option<i64>,
    pub contact_id: Option<i64>,
    pub lead_id: Option<i64>,
    pub created_ts: i64,
}

impl Task {
    /// Pending and due at or before `now`
    pub fn is_due(&self, now: i64) -> bool {
        self.pending && self.due_ts.map_or(false, |due| due <= now)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub pending: bool,
    pub due_ts: Option<i64>,
    pub contact_id: Option<i64>,
    pub lead_id: Option<i64>,
}
