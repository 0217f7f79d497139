use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::HashSet;
use crate::error::{CrmError, CrmResult};
use crate::models::Stage;
use crate::repo::{KanbanRepo, PipelineRepo};
use crate::validate::{required_text, validate_color};

const STAGE_COLUMNS: &str = "id, pipeline_id, name, color, position, created_ts";

fn row_to_stage(row: &Row) -> rusqlite::Result<Stage> {
    Ok(Stage {
        id: row.get(0)?,
        pipeline_id: row.get(1)?,
        name: row.get(2)?,
        color: row.get(3)?,
        position: row.get(4)?,
        created_ts: row.get(5)?,
    })
}

/// Stage repository. Stage positions within a pipeline run `0..n-1`.
pub struct StageRepo;

impl StageRepo {
    /// Append a stage to the end of a pipeline
    pub fn create(conn: &Connection, pipeline_id: i64, name: &str, color: Option<&str>) -> CrmResult<Stage> {
        let name = required_text(name, "Stage name")?;
        let color = validate_color(color)?;

        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        PipelineRepo::require(&tx, pipeline_id)?;

        let position: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM stages WHERE pipeline_id = ?1",
            [pipeline_id],
            |row| row.get(0),
        )?;
        let now = chrono::Utc::now().timestamp();
        tx.execute(
            "INSERT INTO stages (pipeline_id, name, color, position, created_ts)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![pipeline_id, name, color, position, now],
        )?;

        let id = tx.last_insert_rowid();
        let stage = Self::require(&tx, id)?;
        tx.commit()?;
        Ok(stage)
    }

    /// Get stage by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> CrmResult<Option<Stage>> {
        let sql = format!("SELECT {} FROM stages WHERE id = ?1", STAGE_COLUMNS);
        let stage = conn.query_row(&sql, [id], row_to_stage).optional()?;
        Ok(stage)
    }

    /// Get stage by ID or fail with `NotFound`
    pub fn require(conn: &Connection, id: i64) -> CrmResult<Stage> {
        Self::get_by_id(conn, id)?.ok_or_else(|| CrmError::not_found("Stage", id))
    }

    /// Stages of a pipeline in display order
    pub fn list_for_pipeline(conn: &Connection, pipeline_id: i64) -> CrmResult<Vec<Stage>> {
        let sql = format!(
            "SELECT {} FROM stages WHERE pipeline_id = ?1 ORDER BY position, id",
            STAGE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([pipeline_id], row_to_stage)?;

        let mut stages = Vec::new();
        for row in rows {
            stages.push(row?);
        }
        Ok(stages)
    }

    /// Update a stage's name and/or color.
    /// `color: Some(None)` clears the color.
    pub fn update(conn: &Connection, id: i64, name: Option<&str>, color: Option<Option<&str>>) -> CrmResult<Stage> {
        let mut sets = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(n) = name {
            sets.push("name = ?");
            params.push(Box::new(required_text(n, "Stage name")?));
        }
        if let Some(c) = color {
            sets.push("color = ?");
            params.push(Box::new(validate_color(c)?));
        }

        Self::require(conn, id)?;
        if sets.is_empty() {
            return Self::require(conn, id);
        }

        let numbered_sets: Vec<String> = sets
            .iter()
            .enumerate()
            .map(|(i, set)| set.replace('?', &format!("?{}", i + 1)))
            .collect();
        let sql = format!(
            "UPDATE stages SET {} WHERE id = ?{}",
            numbered_sets.join(", "),
            params.len() + 1
        );
        params.push(Box::new(id));

        let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, param_refs.as_slice())?;

        Self::require(conn, id)
    }

    /// Delete an empty stage and renumber the remaining stages of its pipeline
    pub fn delete(conn: &Connection, id: i64) -> CrmResult<Stage> {
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        let stage = Self::require(&tx, id)?;

        if KanbanRepo::count_in_stage(&tx, id)? > 0 {
            return Err(CrmError::Conflict("Cannot delete stage with leads".to_string()));
        }

        tx.execute("DELETE FROM stages WHERE id = ?1", [id])?;
        Self::renumber(&tx, stage.pipeline_id)?;
        tx.commit()?;

        log::debug!("Deleted stage {} from pipeline {}", id, stage.pipeline_id);
        Ok(stage)
    }

    /// Reorder a pipeline's stages. `stage_ids` must list every stage of the
    /// pipeline exactly once; stage `stage_ids[i]` gets position `i`.
    pub fn reorder(conn: &Connection, pipeline_id: i64, stage_ids: &[i64]) -> CrmResult<()> {
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        PipelineRepo::require(&tx, pipeline_id)?;

        let current: HashSet<i64> = Self::list_for_pipeline(&tx, pipeline_id)?
            .into_iter()
            .map(|s| s.id)
            .collect();
        let requested: HashSet<i64> = stage_ids.iter().copied().collect();

        if requested.len() != stage_ids.len() {
            return Err(CrmError::Validation("Stage list contains duplicates".to_string()));
        }
        if requested != current {
            return Err(CrmError::Validation(format!(
                "Stage list must contain exactly the {} stage(s) of pipeline {}",
                current.len(),
                pipeline_id
            )));
        }

        for (position, stage_id) in stage_ids.iter().enumerate() {
            tx.execute(
                "UPDATE stages SET position = ?1 WHERE id = ?2",
                rusqlite::params![position as i64, stage_id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Renumber stage positions to ensure clean positions (0, 1, 2, ...)
    fn renumber(conn: &Connection, pipeline_id: i64) -> CrmResult<()> {
        let stages = Self::list_for_pipeline(conn, pipeline_id)?;

        for (position, stage) in stages.iter().enumerate() {
            conn.execute(
                "UPDATE stages SET position = ?1 WHERE id = ?2",
                rusqlite::params![position as i64, stage.id],
            )?;
        }
        Ok(())
    }
}
