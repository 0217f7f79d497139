use serde::{Deserialize, Serialize};
use crate::models::ContactRef;

/// A message exchanged with a contact on some channel (email, instagram, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub contact_id: i64,
    pub channel: String,
    pub content: String,
    pub ts: i64,
}

/// Message joined with the contact it belongs to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageActivity {
    pub message: Message,
    pub contact: ContactRef,
}
