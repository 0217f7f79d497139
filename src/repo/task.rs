use rusqlite::{Connection, OptionalExtension, Row};
use crate::error::{CrmError, CrmResult};
use crate::models::{NewTask, Task};
use crate::repo::{ContactRepo, LeadRepo};
use crate::validate::required_text;

const TASK_COLUMNS: &str = "id, title, pending, due_ts, contact_id, lead_id, created_ts";

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        pending: row.get(2)?,
        due_ts: row.get(3)?,
        contact_id: row.get(4)?,
        lead_id: row.get(5)?,
        created_ts: row.get(6)?,
    })
}

/// Task repository for database operations
pub struct TaskRepo;

impl TaskRepo {
    /// Create a task. Referenced contact and lead must exist.
    pub fn create(conn: &Connection, new_task: &NewTask) -> CrmResult<Task> {
        let title = required_text(&new_task.title, "Task title")?;
        if let Some(contact_id) = new_task.contact_id {
            ContactRepo::require(conn, contact_id)?;
        }
        if let Some(lead_id) = new_task.lead_id {
            LeadRepo::require(conn, lead_id)?;
        }

        let now = chrono::Utc::now().timestamp();
        conn.execute(
            "INSERT INTO tasks (title, pending, due_ts, contact_id, lead_id, created_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                title,
                new_task.pending,
                new_task.due_ts,
                new_task.contact_id,
                new_task.lead_id,
                now
            ],
        )?;

        Self::require(conn, conn.last_insert_rowid())
    }

    /// Get task by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> CrmResult<Option<Task>> {
        let sql = format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS);
        let task = conn.query_row(&sql, [id], row_to_task).optional()?;
        Ok(task)
    }

    /// Get task by ID or fail with `NotFound`
    pub fn require(conn: &Connection, id: i64) -> CrmResult<Task> {
        Self::get_by_id(conn, id)?.ok_or_else(|| CrmError::not_found("Task", id))
    }

    /// Set the pending flag
    pub fn set_pending(conn: &Connection, id: i64, pending: bool) -> CrmResult<Task> {
        let updated = conn.execute(
            "UPDATE tasks SET pending = ?1 WHERE id = ?2",
            rusqlite::params![pending, id],
        )?;
        if updated == 0 {
            return Err(CrmError::not_found("Task", id));
        }
        Self::require(conn, id)
    }

    /// Flip the pending flag
    pub fn toggle(conn: &Connection, id: i64) -> CrmResult<Task> {
        let task = Self::require(conn, id)?;
        Self::set_pending(conn, id, !task.pending)
    }

    /// Pending tasks first, then by due date (undated last)
    pub fn list(conn: &Connection, pending_only: bool) -> CrmResult<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks {} ORDER BY pending DESC, due_ts IS NULL, due_ts, id",
            TASK_COLUMNS,
            if pending_only { "WHERE pending = 1" } else { "" }
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_task)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    /// Number of pending tasks due at or before `now`
    pub fn count_due(conn: &Connection, now: i64) -> CrmResult<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE pending = 1 AND due_ts IS NOT NULL AND due_ts <= ?1",
            [now],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;

    fn new_task(title: &str, due_ts: Option<i64>) -> NewTask {
        NewTask {
            title: title.to_string(),
            pending: true,
            due_ts,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_requires_title() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let err = TaskRepo::create(&conn, &new_task("   ", None)).unwrap_err();
        assert_eq!(err, CrmError::Validation("Task title is required".to_string()));
    }

    #[test]
    fn test_create_checks_references() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let mut task = new_task("Call", None);
        task.contact_id = Some(5);
        assert_eq!(
            TaskRepo::create(&conn, &task).unwrap_err(),
            CrmError::NotFound("Contact 5".to_string())
        );
    }

    #[test]
    fn test_toggle() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let task = TaskRepo::create(&conn, &new_task("Call", None)).unwrap();
        assert!(task.pending);

        assert!(!TaskRepo::toggle(&conn, task.id).unwrap().pending);
        assert!(TaskRepo::toggle(&conn, task.id).unwrap().pending);
        assert!(matches!(TaskRepo::toggle(&conn, 99), Err(CrmError::NotFound(_))));
    }

    #[test]
    fn test_count_due_and_list_order() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let late = TaskRepo::create(&conn, &new_task("Late", Some(100))).unwrap();
        let exact = TaskRepo::create(&conn, &new_task("Exact", Some(200))).unwrap();
        let future = TaskRepo::create(&conn, &new_task("Future", Some(300))).unwrap();
        let undated = TaskRepo::create(&conn, &new_task("Undated", None)).unwrap();
        let done = TaskRepo::create(&conn, &new_task("Done", Some(50))).unwrap();
        TaskRepo::set_pending(&conn, done.id, false).unwrap();

        assert_eq!(TaskRepo::count_due(&conn, 200).unwrap(), 2);

        let ids: Vec<i64> = TaskRepo::list(&conn, false).unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![late.id, exact.id, future.id, undated.id, done.id]);
        assert_eq!(TaskRepo::list(&conn, true).unwrap().len(), 4);
    }
}
