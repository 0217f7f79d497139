use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use crate::error::{conflict_on_unique, CrmError, CrmResult};
use crate::models::{Contact, ContactInput, ContactRef};
use crate::repo::KanbanRepo;
use crate::validate::{normalize_instagram, optional_text, validate_email};

const CONTACT_COLUMNS: &str =
    "id, name, email, instagram, phone, company, city, country, created_ts, modified_ts";

const DUPLICATE_CONTACT: &str = "Email or Instagram user already exists";

fn row_to_contact(row: &Row) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        instagram: row.get(3)?,
        phone: row.get(4)?,
        company: row.get(5)?,
        city: row.get(6)?,
        country: row.get(7)?,
        created_ts: row.get(8)?,
        modified_ts: row.get(9)?,
    })
}

/// Contact repository for database operations
pub struct ContactRepo;

impl ContactRepo {
    /// Trim fields, drop blanks, check email and instagram formats
    fn normalize(input: &ContactInput) -> CrmResult<ContactInput> {
        Ok(ContactInput {
            name: optional_text(input.name.as_deref()),
            email: validate_email(&input.email)?,
            instagram: normalize_instagram(input.instagram.as_deref())?,
            phone: optional_text(input.phone.as_deref()),
            company: optional_text(input.company.as_deref()),
            city: optional_text(input.city.as_deref()),
            country: optional_text(input.country.as_deref()),
        })
    }

    /// Create a contact. Duplicate email or instagram handle is a `Conflict`.
    pub fn create(conn: &Connection, input: &ContactInput) -> CrmResult<Contact> {
        let input = Self::normalize(input)?;
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "INSERT INTO contacts (name, email, instagram, phone, company, city, country,
                    created_ts, modified_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                input.name,
                input.email,
                input.instagram,
                input.phone,
                input.company,
                input.city,
                input.country,
                now,
                now
            ],
        )
        .map_err(|e| conflict_on_unique(e, DUPLICATE_CONTACT))?;

        let id = conn.last_insert_rowid();
        log::debug!("Created contact {} <{}>", id, input.email);
        Self::require(conn, id)
    }

    /// Get contact by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> CrmResult<Option<Contact>> {
        let sql = format!("SELECT {} FROM contacts WHERE id = ?1", CONTACT_COLUMNS);
        let contact = conn.query_row(&sql, [id], row_to_contact).optional()?;
        Ok(contact)
    }

    /// Get contact by ID or fail with `NotFound`
    pub fn require(conn: &Connection, id: i64) -> CrmResult<Contact> {
        Self::get_by_id(conn, id)?.ok_or_else(|| CrmError::not_found("Contact", id))
    }

    /// Replace all editable fields of a contact
    pub fn update(conn: &Connection, id: i64, input: &ContactInput) -> CrmResult<Contact> {
        let input = Self::normalize(input)?;
        Self::require(conn, id)?;
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "UPDATE contacts
             SET name = ?1, email = ?2, instagram = ?3, phone = ?4, company = ?5,
                 city = ?6, country = ?7, modified_ts = ?8
             WHERE id = ?9",
            rusqlite::params![
                input.name,
                input.email,
                input.instagram,
                input.phone,
                input.company,
                input.city,
                input.country,
                now,
                id
            ],
        )
        .map_err(|e| conflict_on_unique(e, DUPLICATE_CONTACT))?;

        Self::require(conn, id)
    }

    /// Delete a contact together with its lead, tasks and messages.
    /// The lead's former stage is renumbered so no position gap remains.
    pub fn delete(conn: &Connection, id: i64) -> CrmResult<()> {
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        Self::require(&tx, id)?;

        let placement: Option<(Option<i64>, Option<i64>)> = tx
            .query_row(
                "SELECT stage_id, position FROM leads WHERE contact_id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        tx.execute("DELETE FROM contacts WHERE id = ?1", [id])?;

        if let Some((Some(stage_id), Some(position))) = placement {
            KanbanRepo::close_gap(&tx, stage_id, position)?;
        }

        tx.commit()?;
        log::debug!("Deleted contact {}", id);
        Ok(())
    }

    /// All contacts, newest first
    pub fn list(conn: &Connection) -> CrmResult<Vec<Contact>> {
        let sql = format!(
            "SELECT {} FROM contacts ORDER BY created_ts DESC, id DESC",
            CONTACT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_contact)?;

        let mut contacts = Vec::new();
        for row in rows {
            contacts.push(row?);
        }
        Ok(contacts)
    }

    /// Contacts that do not have a lead yet, ordered by name (unnamed last)
    pub fn list_without_lead(conn: &Connection) -> CrmResult<Vec<ContactRef>> {
        let mut stmt = conn.prepare(
            "SELECT c.id, c.name, c.email
             FROM contacts c
             WHERE NOT EXISTS (SELECT 1 FROM leads l WHERE l.contact_id = c.id)
             ORDER BY c.name IS NULL, c.name, c.id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ContactRef {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
            })
        })?;

        let mut contacts = Vec::new();
        for row in rows {
            contacts.push(row?);
        }
        Ok(contacts)
    }

    pub fn count(conn: &Connection) -> CrmResult<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))?;
        Ok(count)
    }
}
