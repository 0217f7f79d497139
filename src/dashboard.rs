//! Read-only summary of the CRM as of a given moment.

use std::collections::{BTreeMap, HashMap};
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};
use rusqlite::Connection;
use serde::Serialize;
use crate::error::CrmResult;
use crate::models::{LeadStatus, MessageActivity};
use crate::repo::{ContactRepo, LeadRepo, MessageRepo, TaskRepo};

/// Window for the leads-per-day series
pub const TRAILING_DAYS: i64 = 30;
/// Maximum number of day buckets reported
pub const MAX_DAY_BUCKETS: usize = 14;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub status: LeadStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCount {
    /// e.g. `Oct 3`
    pub label: String,
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageCount {
    pub stage_id: i64,
    pub stage_name: String,
    pub pipeline_name: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub generated_ts: i64,
    pub total_contacts: i64,
    pub leads_by_status: Vec<StatusCount>,
    pub total_leads: i64,
    pub due_tasks: i64,
    pub recent_messages: Vec<MessageActivity>,
    pub leads_per_day: Vec<DayCount>,
    pub leads_per_stage: Vec<StageCount>,
    pub avg_messages_per_lead: f64,
}

impl Dashboard {
    pub fn compute(conn: &Connection, recent_limit: usize) -> CrmResult<Dashboard> {
        Self::compute_at(conn, Local::now(), recent_limit)
    }

    /// Compute the dashboard as seen at `now`
    pub fn compute_at(conn: &Connection, now: DateTime<Local>, recent_limit: usize) -> CrmResult<Dashboard> {
        let total_leads = LeadRepo::count(conn)?;
        let total_messages: i64 = conn.query_row(
            "SELECT COUNT(*) FROM messages m JOIN leads l ON l.contact_id = m.contact_id",
            [],
            |row| row.get(0),
        )?;
        let avg_messages_per_lead = if total_leads == 0 {
            0.0
        } else {
            total_messages as f64 / total_leads as f64
        };

        Ok(Dashboard {
            generated_ts: now.timestamp(),
            total_contacts: ContactRepo::count(conn)?,
            leads_by_status: leads_by_status(conn)?,
            total_leads,
            due_tasks: TaskRepo::count_due(conn, now.timestamp())?,
            recent_messages: MessageRepo::recent(conn, recent_limit)?,
            leads_per_day: leads_per_day(conn, now)?,
            leads_per_stage: leads_per_stage(conn)?,
            avg_messages_per_lead,
        })
    }
}

fn leads_by_status(conn: &Connection) -> CrmResult<Vec<StatusCount>> {
    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM leads GROUP BY status")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;

    let mut counts: HashMap<LeadStatus, i64> = HashMap::new();
    for row in rows {
        let (status, count) = row?;
        if let Some(status) = LeadStatus::from_str(&status) {
            *counts.entry(status).or_insert(0) += count;
        }
    }

    Ok(LeadStatus::ALL
        .iter()
        .map(|status| StatusCount {
            status: *status,
            count: counts.get(status).copied().unwrap_or(0),
        })
        .collect())
}

fn leads_per_day(conn: &Connection, now: DateTime<Local>) -> CrmResult<Vec<DayCount>> {
    let since = (now - Duration::days(TRAILING_DAYS)).timestamp();
    let mut stmt = conn.prepare("SELECT created_ts FROM leads WHERE created_ts >= ?1 AND created_ts <= ?2")?;
    let rows = stmt.query_map([since, now.timestamp()], |row| row.get::<_, i64>(0))?;

    let mut buckets: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for row in rows {
        let created_ts = row?;
        if let Some(created) = Local.timestamp_opt(created_ts, 0).single() {
            *buckets.entry(created.date_naive()).or_insert(0) += 1;
        }
    }

    let skip = buckets.len().saturating_sub(MAX_DAY_BUCKETS);
    Ok(buckets
        .into_iter()
        .skip(skip)
        .map(|(date, count)| DayCount {
            label: date.format("%b %-d").to_string(),
            date,
            count,
        })
        .collect())
}

fn leads_per_stage(conn: &Connection) -> CrmResult<Vec<StageCount>> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.name, p.name, COUNT(l.id)
         FROM stages s
         JOIN pipelines p ON p.id = s.pipeline_id
         LEFT JOIN leads l ON l.stage_id = s.id
         GROUP BY s.id, s.name, p.name, s.position
         ORDER BY s.position, p.name, s.id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(StageCount {
            stage_id: row.get(0)?,
            stage_name: row.get(1)?,
            pipeline_name: row.get(2)?,
            count: row.get(3)?,
        })
    })?;

    let mut counts = Vec::new();
    for row in rows {
        counts.push(row?);
    }
    Ok(counts)
}
