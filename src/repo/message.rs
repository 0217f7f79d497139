use rusqlite::Connection;
use crate::error::CrmResult;
use crate::models::{ContactRef, Message, MessageActivity};
use crate::repo::ContactRepo;
use crate::validate::required_text;

/// Message repository for database operations
pub struct MessageRepo;

impl MessageRepo {
    /// Record a message for a contact; `ts` defaults to now
    pub fn create(
        conn: &Connection,
        contact_id: i64,
        channel: &str,
        content: &str,
        ts: Option<i64>,
    ) -> CrmResult<Message> {
        let channel = required_text(channel, "Channel")?.to_lowercase();
        let content = required_text(content, "Message content")?;
        ContactRepo::require(conn, contact_id)?;

        let ts = ts.unwrap_or_else(|| chrono::Utc::now().timestamp());
        conn.execute(
            "INSERT INTO messages (contact_id, channel, content, ts) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![contact_id, channel, content, ts],
        )?;

        Ok(Message {
            id: conn.last_insert_rowid(),
            contact_id,
            channel,
            content,
            ts,
        })
    }

    /// Messages of one contact, newest first
    pub fn list_for_contact(conn: &Connection, contact_id: i64) -> CrmResult<Vec<Message>> {
        let mut stmt = conn.prepare(
            "SELECT id, contact_id, channel, content, ts FROM messages
             WHERE contact_id = ?1 ORDER BY ts DESC, id DESC",
        )?;
        let rows = stmt.query_map([contact_id], |row| {
            Ok(Message {
                id: row.get(0)?,
                contact_id: row.get(1)?,
                channel: row.get(2)?,
                content: row.get(3)?,
                ts: row.get(4)?,
            })
        })?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// Most recent `limit` messages across all contacts
    pub fn recent(conn: &Connection, limit: usize) -> CrmResult<Vec<MessageActivity>> {
        let mut stmt = conn.prepare(
            "SELECT m.id, m.contact_id, m.channel, m.content, m.ts, c.name, c.email
             FROM messages m JOIN contacts c ON c.id = m.contact_id
             ORDER BY m.ts DESC, m.id DESC
             LIMIT ?1",
        )?;
        // SQLite treats a negative LIMIT as unlimited
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map([limit], |row| {
            let message = Message {
                id: row.get(0)?,
                contact_id: row.get(1)?,
                channel: row.get(2)?,
                content: row.get(3)?,
                ts: row.get(4)?,
            };
            let contact = ContactRef {
                id: message.contact_id,
                name: row.get(5)?,
                email: row.get(6)?,
            };
            Ok(MessageActivity { message, contact })
        })?;

        let mut activity = Vec::new();
        for row in rows {
            activity.push(row?);
        }
        Ok(activity)
    }
}
