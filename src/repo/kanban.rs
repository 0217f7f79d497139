use rusqlite::{Connection, Transaction, TransactionBehavior};
use crate::error::CrmResult;
use crate::models::{Board, BoardCard, BoardColumn, LeadStatus, Priority};
use crate::repo::{LeadRepo, PipelineRepo, StageRepo};
use crate::views::{self, View};

/// What a call to [`KanbanRepo::move_lead`] did
#[derive(Debug, Clone, PartialEq)]
pub struct MoveReport {
    pub lead_id: i64,
    /// False when the lead was already at the target (nothing written)
    pub moved: bool,
    pub from_stage: Option<i64>,
    pub to_stage: Option<i64>,
    /// Position actually written, after clamping
    pub position: Option<i64>,
    pub invalidated: Vec<View>,
}

/// Kanban board operations: lead placement within and across stages.
///
/// Every stage keeps its leads at positions `0..n-1` with no gaps or
/// duplicates. Moves shift the affected siblings and write the moved lead
/// inside one immediate transaction, so concurrent writers on the same
/// database file queue on SQLite's write lock instead of interleaving.
///
/// # Example
///
/// ```no_run
/// use leadline::db::DbConnection;
/// use leadline::repo::KanbanRepo;
///
/// let conn = DbConnection::connect_in_memory().unwrap();
/// // move lead 3 to the top of stage 2
/// KanbanRepo::move_lead(&conn, 3, Some(2), 0).unwrap();
/// ```
pub struct KanbanRepo;

impl KanbanRepo {
    /// Move a lead to `target_position` in `target_stage_id`, or off the board
    /// when the target stage is `None`.
    ///
    /// Out-of-range positions are clamped: to `[0, n]` when entering a stage
    /// with `n` leads, to `[0, n-1]` when reordering inside the lead's own stage.
    pub fn move_lead(
        conn: &Connection,
        lead_id: i64,
        target_stage_id: Option<i64>,
        target_position: i64,
    ) -> CrmResult<MoveReport> {
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        let report = Self::apply_move(&tx, lead_id, target_stage_id, target_position)?;
        tx.commit()?;

        if report.moved {
            log::debug!(
                "Moved lead {} from stage {:?} to stage {:?} at {:?}",
                lead_id, report.from_stage, report.to_stage, report.position
            );
            views::invalidate(&report.invalidated);
        }
        Ok(report)
    }

    fn apply_move(
        conn: &Connection,
        lead_id: i64,
        target_stage_id: Option<i64>,
        target_position: i64,
    ) -> CrmResult<MoveReport> {
        let target_stage = match target_stage_id {
            Some(stage_id) => Some(StageRepo::require(conn, stage_id)?),
            None => None,
        };
        let lead = LeadRepo::require(conn, lead_id)?;

        let old_stage_id = lead.stage_id;
        let same_stage = old_stage_id == target_stage_id;

        let new_position = match target_stage_id {
            Some(stage_id) => {
                let siblings = Self::count_in_stage(conn, stage_id)?;
                let max = if same_stage { siblings - 1 } else { siblings };
                Some(target_position.clamp(0, max.max(0)))
            }
            None => None,
        };
        let new_pipeline_id = target_stage.as_ref().map(|s| s.pipeline_id);

        let mut report = MoveReport {
            lead_id,
            moved: false,
            from_stage: old_stage_id,
            to_stage: target_stage_id,
            position: new_position,
            invalidated: Vec::new(),
        };

        if same_stage && lead.position == new_position {
            return Ok(report);
        }

        if same_stage {
            // Both positions are Some: the stage is the same and not None
            if let (Some(stage_id), Some(old), Some(new)) =
                (target_stage_id, lead.position, new_position)
            {
                if old < new {
                    conn.execute(
                        "UPDATE leads SET position = position - 1
                         WHERE stage_id = ?1 AND position > ?2 AND position <= ?3 AND id != ?4",
                        rusqlite::params![stage_id, old, new, lead_id],
                    )?;
                } else {
                    conn.execute(
                        "UPDATE leads SET position = position + 1
                         WHERE stage_id = ?1 AND position >= ?2 AND position < ?3 AND id != ?4",
                        rusqlite::params![stage_id, new, old, lead_id],
                    )?;
                }
            }
        } else {
            if let (Some(stage_id), Some(old)) = (old_stage_id, lead.position) {
                Self::close_gap(conn, stage_id, old)?;
            }
            if let (Some(stage_id), Some(new)) = (target_stage_id, new_position) {
                conn.execute(
                    "UPDATE leads SET position = position + 1
                     WHERE stage_id = ?1 AND position >= ?2 AND id != ?3",
                    rusqlite::params![stage_id, new, lead_id],
                )?;
            }
        }

        let now = chrono::Utc::now().timestamp();
        conn.execute(
            "UPDATE leads SET pipeline_id = ?1, stage_id = ?2, position = ?3, modified_ts = ?4
             WHERE id = ?5",
            rusqlite::params![new_pipeline_id, target_stage_id, new_position, now, lead_id],
        )?;

        report.moved = true;
        report.invalidated = views::collect(
            [
                Some(View::Pipelines),
                lead.pipeline_id.map(View::Pipeline),
                new_pipeline_id.map(View::Pipeline),
                Some(View::Lead(lead_id)),
            ]
            .into_iter()
            .flatten(),
        );
        Ok(report)
    }

    /// Shift every lead after `position` in the stage back by one.
    /// Call after the lead at `position` has left the stage.
    pub fn close_gap(conn: &Connection, stage_id: i64, position: i64) -> CrmResult<()> {
        conn.execute(
            "UPDATE leads SET position = position - 1 WHERE stage_id = ?1 AND position > ?2",
            rusqlite::params![stage_id, position],
        )?;
        Ok(())
    }

    /// Position for a lead appended to the end of the stage
    pub fn next_position(conn: &Connection, stage_id: i64) -> CrmResult<i64> {
        let next = conn.query_row(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM leads WHERE stage_id = ?1",
            [stage_id],
            |row| row.get(0),
        )?;
        Ok(next)
    }

    pub fn count_in_stage(conn: &Connection, stage_id: i64) -> CrmResult<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM leads WHERE stage_id = ?1",
            [stage_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// `(lead_id, position)` pairs of a stage in board order
    pub fn stage_positions(conn: &Connection, stage_id: i64) -> CrmResult<Vec<(i64, i64)>> {
        let mut stmt = conn.prepare(
            "SELECT id, position FROM leads WHERE stage_id = ?1
             ORDER BY position ASC, created_ts DESC, id DESC",
        )?;
        let rows = stmt.query_map([stage_id], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut positions = Vec::new();
        for row in rows {
            positions.push(row?);
        }
        Ok(positions)
    }

    /// True when the stage's lead positions are exactly `0..n-1`
    pub fn is_contiguous(conn: &Connection, stage_id: i64) -> CrmResult<bool> {
        let positions = Self::stage_positions(conn, stage_id)?;
        Ok(positions
            .iter()
            .enumerate()
            .all(|(expected, (_, position))| *position == expected as i64))
    }

    /// Pipeline detail view: stages by position, leads by position with
    /// ties broken newest first.
    pub fn board(conn: &Connection, pipeline_id: i64) -> CrmResult<Board> {
        let pipeline = PipelineRepo::require(conn, pipeline_id)?;
        let stages = StageRepo::list_for_pipeline(conn, pipeline_id)?;

        let mut stmt = conn.prepare(
            "SELECT l.id, l.position, l.status, l.priority, l.value, l.last_interaction_ts,
                    c.id, c.name, c.email, c.company
             FROM leads l JOIN contacts c ON c.id = l.contact_id
             WHERE l.stage_id = ?1
             ORDER BY l.position ASC, l.created_ts DESC, l.id DESC",
        )?;

        let mut columns = Vec::with_capacity(stages.len());
        for stage in stages {
            let rows = stmt.query_map([stage.id], |row| {
                let status: String = row.get(2)?;
                let priority: String = row.get(3)?;
                Ok(BoardCard {
                    lead_id: row.get(0)?,
                    position: row.get(1)?,
                    status: LeadStatus::from_str(&status).unwrap_or_default(),
                    priority: Priority::from_str(&priority).unwrap_or_default(),
                    value: row.get(4)?,
                    last_interaction_ts: row.get(5)?,
                    contact_id: row.get(6)?,
                    contact_name: row.get(7)?,
                    contact_email: row.get(8)?,
                    company: row.get(9)?,
                })
            })?;

            let mut cards = Vec::new();
            for row in rows {
                cards.push(row?);
            }
            columns.push(BoardColumn { stage, cards });
        }

        Ok(Board { pipeline, columns })
    }
}
