use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use crate::error::{conflict_on_unique, CrmError, CrmResult};
use crate::models::{ContactRef, Lead, LeadFilter, LeadStatus, LeadUpdate, NewLead, Priority};
use crate::repo::{ContactRepo, KanbanRepo, StageRepo};
use crate::validate::optional_text;

pub(crate) const LEAD_COLUMNS: &str =
    "id, contact_id, pipeline_id, stage_id, position, status, priority, score, value, source,
     last_interaction_ts, created_ts, modified_ts";

const DUPLICATE_LEAD: &str = "This contact already has a lead";

pub(crate) fn row_to_lead(row: &Row) -> rusqlite::Result<Lead> {
    let status: String = row.get(5)?;
    let priority: String = row.get(6)?;
    Ok(Lead {
        id: row.get(0)?,
        contact_id: row.get(1)?,
        pipeline_id: row.get(2)?,
        stage_id: row.get(3)?,
        position: row.get(4)?,
        status: LeadStatus::from_str(&status).unwrap_or_default(),
        priority: Priority::from_str(&priority).unwrap_or_default(),
        score: row.get(7)?,
        value: row.get(8)?,
        source: row.get(9)?,
        last_interaction_ts: row.get(10)?,
        created_ts: row.get(11)?,
        modified_ts: row.get(12)?,
    })
}

/// Lead repository for database operations
///
/// Placement on the kanban board (stage and position) is owned by
/// [`KanbanRepo`]; this repository only appends on create and closes the
/// gap on delete.
pub struct LeadRepo;

impl LeadRepo {
    /// Create a lead for a contact.
    ///
    /// Status defaults to cold and priority to medium. When `stage_id` is
    /// given the lead is appended to the end of that stage.
    pub fn create(conn: &Connection, new_lead: &NewLead) -> CrmResult<Lead> {
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

        ContactRepo::require(&tx, new_lead.contact_id)?;
        if Self::get_by_contact(&tx, new_lead.contact_id)?.is_some() {
            return Err(CrmError::Conflict(DUPLICATE_LEAD.to_string()));
        }

        let (pipeline_id, position) = match new_lead.stage_id {
            Some(stage_id) => {
                let stage = StageRepo::require(&tx, stage_id)?;
                (Some(stage.pipeline_id), Some(KanbanRepo::next_position(&tx, stage_id)?))
            }
            None => (None, None),
        };

        let now = chrono::Utc::now().timestamp();
        tx.execute(
            "INSERT INTO leads (contact_id, pipeline_id, stage_id, position, status, priority,
                    score, value, source, created_ts, modified_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                new_lead.contact_id,
                pipeline_id,
                new_lead.stage_id,
                position,
                new_lead.status.unwrap_or_default().as_str(),
                new_lead.priority.unwrap_or_default().as_str(),
                new_lead.score,
                new_lead.value,
                optional_text(new_lead.source.as_deref()),
                now,
                now
            ],
        )
        .map_err(|e| conflict_on_unique(e, DUPLICATE_LEAD))?;

        let id = tx.last_insert_rowid();
        let lead = Self::require(&tx, id)?;
        tx.commit()?;

        log::debug!("Created lead {} for contact {}", id, new_lead.contact_id);
        Ok(lead)
    }

    /// Get lead by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> CrmResult<Option<Lead>> {
        let sql = format!("SELECT {} FROM leads WHERE id = ?1", LEAD_COLUMNS);
        let lead = conn.query_row(&sql, [id], row_to_lead).optional()?;
        Ok(lead)
    }

    /// Get lead by ID or fail with `NotFound`
    pub fn require(conn: &Connection, id: i64) -> CrmResult<Lead> {
        Self::get_by_id(conn, id)?.ok_or_else(|| CrmError::not_found("Lead", id))
    }

    pub fn get_by_contact(conn: &Connection, contact_id: i64) -> CrmResult<Option<Lead>> {
        let sql = format!("SELECT {} FROM leads WHERE contact_id = ?1", LEAD_COLUMNS);
        let lead = conn.query_row(&sql, [contact_id], row_to_lead).optional()?;
        Ok(lead)
    }

    /// Apply a partial update. Any edit counts as an interaction and stamps
    /// `last_interaction_ts`.
    pub fn update(conn: &Connection, id: i64, update: &LeadUpdate) -> CrmResult<Lead> {
        let mut lead = Self::require(conn, id)?;

        if let Some(status) = update.status {
            lead.status = status;
        }
        if let Some(priority) = update.priority {
            lead.priority = priority;
        }
        if let Some(score) = update.score {
            lead.score = score;
        }
        if let Some(value) = update.value {
            lead.value = value;
        }
        if let Some(source) = &update.source {
            lead.source = optional_text(source.as_deref());
        }

        let now = chrono::Utc::now().timestamp();
        conn.execute(
            "UPDATE leads
             SET status = ?1, priority = ?2, score = ?3, value = ?4, source = ?5,
                 last_interaction_ts = ?6, modified_ts = ?6
             WHERE id = ?7",
            rusqlite::params![
                lead.status.as_str(),
                lead.priority.as_str(),
                lead.score,
                lead.value,
                lead.source,
                now,
                id
            ],
        )?;

        Self::require(conn, id)
    }

    /// Delete a lead and renumber the stage it sat in
    pub fn delete(conn: &Connection, id: i64) -> CrmResult<()> {
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        let lead = Self::require(&tx, id)?;

        tx.execute("DELETE FROM leads WHERE id = ?1", [id])?;
        if let (Some(stage_id), Some(position)) = (lead.stage_id, lead.position) {
            KanbanRepo::close_gap(&tx, stage_id, position)?;
        }

        tx.commit()?;
        log::debug!("Deleted lead {}", id);
        Ok(())
    }

    /// Leads with their contacts, newest first, optionally filtered
    pub fn list(conn: &Connection, filter: &LeadFilter) -> CrmResult<Vec<(Lead, ContactRef)>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<&'static str> = Vec::new();

        if let Some(status) = filter.status {
            clauses.push("l.status = ?");
            params.push(status.as_str());
        }
        if let Some(priority) = filter.priority {
            clauses.push("l.priority = ?");
            params.push(priority.as_str());
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            let numbered: Vec<String> = clauses
                .iter()
                .enumerate()
                .map(|(i, clause)| clause.replace('?', &format!("?{}", i + 1)))
                .collect();
            format!("WHERE {}", numbered.join(" AND "))
        };

        let columns: Vec<String> = LEAD_COLUMNS
            .split(',')
            .map(|c| format!("l.{}", c.trim()))
            .collect();
        let sql = format!(
            "SELECT {}, c.name, c.email
             FROM leads l JOIN contacts c ON c.id = l.contact_id
             {}
             ORDER BY l.created_ts DESC, l.id DESC",
            columns.join(", "),
            where_sql
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| {
            let lead = row_to_lead(row)?;
            let contact = ContactRef {
                id: lead.contact_id,
                name: row.get(13)?,
                email: row.get(14)?,
            };
            Ok((lead, contact))
        })?;

        let mut leads = Vec::new();
        for row in rows {
            leads.push(row?);
        }
        Ok(leads)
    }

    pub fn count(conn: &Connection) -> CrmResult<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM leads", [], |row| row.get(0))?;
        Ok(count)
    }
}
