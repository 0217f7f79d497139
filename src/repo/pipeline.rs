use rusqlite::{Connection, OptionalExtension, Row};
use crate::error::{conflict_on_unique, CrmError, CrmResult};
use crate::models::{Pipeline, PipelineSummary};
use crate::repo::StageRepo;
use crate::validate::{optional_text, required_text};

const DUPLICATE_PIPELINE: &str = "A pipeline with this name already exists";

fn row_to_pipeline(row: &Row) -> rusqlite::Result<Pipeline> {
    Ok(Pipeline {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_ts: row.get(3)?,
    })
}

/// Pipeline repository for database operations
pub struct PipelineRepo;

impl PipelineRepo {
    /// Create a pipeline. Names are trimmed and must be unique.
    pub fn create(conn: &Connection, name: &str, description: Option<&str>) -> CrmResult<Pipeline> {
        let name = required_text(name, "Pipeline name")?;
        let description = optional_text(description);
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "INSERT INTO pipelines (name, description, created_ts) VALUES (?1, ?2, ?3)",
            rusqlite::params![name, description, now],
        )
        .map_err(|e| conflict_on_unique(e, DUPLICATE_PIPELINE))?;

        let id = conn.last_insert_rowid();
        log::debug!("Created pipeline {} '{}'", id, name);
        Self::require(conn, id)
    }

    /// Get pipeline by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> CrmResult<Option<Pipeline>> {
        let pipeline = conn
            .query_row(
                "SELECT id, name, description, created_ts FROM pipelines WHERE id = ?1",
                [id],
                row_to_pipeline,
            )
            .optional()?;
        Ok(pipeline)
    }

    /// Get pipeline by ID or fail with `NotFound`
    pub fn require(conn: &Connection, id: i64) -> CrmResult<Pipeline> {
        Self::get_by_id(conn, id)?.ok_or_else(|| CrmError::not_found("Pipeline", id))
    }

    /// Rename a pipeline and replace its description (blank clears it)
    pub fn update(conn: &Connection, id: i64, name: &str, description: Option<&str>) -> CrmResult<Pipeline> {
        let name = required_text(name, "Pipeline name")?;
        let description = optional_text(description);
        Self::require(conn, id)?;

        conn.execute(
            "UPDATE pipelines SET name = ?1, description = ?2 WHERE id = ?3",
            rusqlite::params![name, description, id],
        )
        .map_err(|e| conflict_on_unique(e, DUPLICATE_PIPELINE))?;

        Self::require(conn, id)
    }

    /// All pipelines, newest first, with ordered stages and lead counts
    pub fn list(conn: &Connection) -> CrmResult<Vec<PipelineSummary>> {
        let mut stmt = conn.prepare(
            "SELECT p.id, p.name, p.description, p.created_ts,
                    (SELECT COUNT(*) FROM leads l WHERE l.pipeline_id = p.id)
             FROM pipelines p
             ORDER BY p.created_ts DESC, p.id DESC",
        )?;
        let rows = stmt.query_map([], |row| Ok((row_to_pipeline(row)?, row.get::<_, i64>(4)?)))?;

        let mut summaries = Vec::new();
        for row in rows {
            let (pipeline, lead_count) = row?;
            let stages = StageRepo::list_for_pipeline(conn, pipeline.id)?;
            summaries.push(PipelineSummary { pipeline, stages, lead_count });
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;

    #[test]
    fn test_create_trims_and_rejects_duplicates() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let pipeline = PipelineRepo::create(&conn, "  Sales ", Some("  ")).unwrap();
        assert_eq!(pipeline.name, "Sales");
        assert_eq!(pipeline.description, None);

        let err = PipelineRepo::create(&conn, "Sales", None).unwrap_err();
        assert_eq!(err, CrmError::Conflict(DUPLICATE_PIPELINE.to_string()));

        let err = PipelineRepo::create(&conn, "", None).unwrap_err();
        assert_eq!(err, CrmError::Validation("Pipeline name is required".to_string()));
    }

    #[test]
    fn test_update() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let sales = PipelineRepo::create(&conn, "Sales", Some("B2B")).unwrap();
        PipelineRepo::create(&conn, "Partners", None).unwrap();

        let updated = PipelineRepo::update(&conn, sales.id, "Enterprise", None).unwrap();
        assert_eq!(updated.name, "Enterprise");
        assert_eq!(updated.description, None);

        let err = PipelineRepo::update(&conn, sales.id, "Partners", None).unwrap_err();
        assert!(matches!(err, CrmError::Conflict(_)));
        assert!(matches!(
            PipelineRepo::update(&conn, 99, "X", None),
            Err(CrmError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_includes_stages() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let sales = PipelineRepo::create(&conn, "Sales", None).unwrap();
        StageRepo::create(&conn, sales.id, "New", None).unwrap();
        StageRepo::create(&conn, sales.id, "Won", None).unwrap();
        let partners = PipelineRepo::create(&conn, "Partners", None).unwrap();

        let summaries = PipelineRepo::list(&conn).unwrap();

        assert_eq!(summaries.len(), 2);
        // same created_ts within a test run: id DESC breaks the tie
        assert_eq!(summaries[0].pipeline.id, partners.id);
        let sales_summary = &summaries[1];
        assert_eq!(sales_summary.stages.len(), 2);
        assert_eq!(sales_summary.stages[0].name, "New");
        assert_eq!(sales_summary.lead_count, 0);
    }
}
