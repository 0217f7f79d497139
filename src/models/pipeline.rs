use serde::{Deserialize, Serialize};
use crate::models::{LeadStatus, Priority};

/// Named container for an ordered set of stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_ts: i64,
}

/// Kanban column within a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: i64,
    pub pipeline_id: i64,
    pub name: String,
    pub color: Option<String>,
    pub position: i64,
    pub created_ts: i64,
}

/// Pipeline with its stages in order and the number of leads assigned to it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSummary {
    pub pipeline: Pipeline,
    pub stages: Vec<Stage>,
    pub lead_count: i64,
}

/// One lead card on the board
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardCard {
    pub lead_id: i64,
    pub position: i64,
    pub status: LeadStatus,
    pub priority: Priority,
    pub value: Option<f64>,
    pub last_interaction_ts: Option<i64>,
    pub contact_id: i64,
    pub contact_name: Option<String>,
    pub contact_email: String,
    pub company: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardColumn {
    pub stage: Stage,
    pub cards: Vec<BoardCard>,
}

/// Pipeline detail view: stages by position, each with its leads by position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Board {
    pub pipeline: Pipeline,
    pub columns: Vec<BoardColumn>,
}
