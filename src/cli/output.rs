// Output formatting utilities

use chrono::{Local, TimeZone};
use std::io::IsTerminal;
use crate::dashboard::Dashboard;
use crate::models::{Board, Contact, ContactRef, Lead, Message, PipelineSummary, Task};
use crate::repo::MoveReport;

const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Apply bold formatting if in TTY mode
fn bold_if_tty(text: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", ANSI_BOLD, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

/// Format timestamp for display
pub fn format_timestamp(ts: i64) -> String {
    Local
        .timestamp_opt(ts, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Format date for display (date only, no time)
pub fn format_date(ts: i64) -> String {
    Local
        .timestamp_opt(ts, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Deal value with two decimals, `-` when unset
pub fn format_value(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

/// Cut `text` to `width` characters, marking the cut with `~`
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('~');
        cut
    }
}

pub fn format_contact_list(contacts: &[Contact]) -> String {
    if contacts.is_empty() {
        return "No contacts found.\n".to_string();
    }
    let mut output = String::new();
    output.push_str(&format!("{:<6} {:<24} {:<32} {:<20}\n", "ID", "Name", "Email", "Company"));
    output.push_str(&format!("{}\n", "-".repeat(85)));
    for contact in contacts {
        output.push_str(&format!(
            "{:<6} {:<24} {:<32} {:<20}\n",
            contact.id,
            truncate(or_dash(contact.name.as_deref()), 24),
            truncate(&contact.email, 32),
            truncate(or_dash(contact.company.as_deref()), 20),
        ));
    }
    output
}

pub fn format_contact_refs(contacts: &[ContactRef]) -> String {
    if contacts.is_empty() {
        return "Every contact has a lead.\n".to_string();
    }
    let mut output = String::new();
    output.push_str(&format!("{:<6} {:<24} {:<32}\n", "ID", "Name", "Email"));
    output.push_str(&format!("{}\n", "-".repeat(64)));
    for contact in contacts {
        output.push_str(&format!(
            "{:<6} {:<24} {:<32}\n",
            contact.id,
            truncate(or_dash(contact.name.as_deref()), 24),
            truncate(&contact.email, 32),
        ));
    }
    output
}

pub fn format_contact_detail(contact: &Contact, lead: Option<&Lead>, messages: &[Message]) -> String {
    let tty = is_tty();
    let mut output = String::new();
    output.push_str(&format!("{}\n", bold_if_tty(&format!("Contact {}: {}", contact.id, contact.display_name()), tty)));
    output.push_str(&format!("  Email:     {}\n", contact.email));
    output.push_str(&format!("  Instagram: {}\n", contact.instagram.as_deref().map(|h| format!("@{}", h)).unwrap_or_else(|| "-".to_string())));
    output.push_str(&format!("  Phone:     {}\n", or_dash(contact.phone.as_deref())));
    output.push_str(&format!("  Company:   {}\n", or_dash(contact.company.as_deref())));
    output.push_str(&format!("  Location:  {}\n", match (contact.city.as_deref(), contact.country.as_deref()) {
        (Some(city), Some(country)) => format!("{}, {}", city, country),
        (Some(place), None) | (None, Some(place)) => place.to_string(),
        (None, None) => "-".to_string(),
    }));
    output.push_str(&format!("  Created:   {}\n", format_timestamp(contact.created_ts)));

    match lead {
        Some(lead) => output.push_str(&format!(
            "  Lead:      {} ({}, {}, {})\n",
            lead.id,
            lead.status.as_str(),
            lead.priority.as_str(),
            lead.stage_id.map(|s| format!("stage {}", s)).unwrap_or_else(|| "unstaged".to_string())
        )),
        None => output.push_str("  Lead:      -\n"),
    }

    if !messages.is_empty() {
        output.push_str("\nMessages:\n");
        output.push_str(&format_message_list(messages));
    }
    output
}

pub fn format_lead_list(leads: &[(Lead, ContactRef)]) -> String {
    if leads.is_empty() {
        return "No leads found.\n".to_string();
    }
    let mut output = String::new();
    output.push_str(&format!(
        "{:<6} {:<28} {:<6} {:<8} {:<8} {:>12} {:<10}\n",
        "ID", "Contact", "Status", "Priority", "Stage", "Value", "Created"
    ));
    output.push_str(&format!("{}\n", "-".repeat(84)));
    for (lead, contact) in leads {
        let name = contact.name.as_deref().unwrap_or(contact.email.as_str());
        let stage = match (lead.stage_id, lead.position) {
            (Some(stage_id), Some(position)) => format!("{}#{}", stage_id, position),
            _ => "-".to_string(),
        };
        output.push_str(&format!(
            "{:<6} {:<28} {:<6} {:<8} {:<8} {:>12} {:<10}\n",
            lead.id,
            truncate(name, 28),
            lead.status.as_str(),
            lead.priority.as_str(),
            stage,
            format_value(lead.value),
            format_date(lead.created_ts),
        ));
    }
    output
}

pub fn format_lead_detail(lead: &Lead, contact: &Contact) -> String {
    let tty = is_tty();
    let mut output = String::new();
    output.push_str(&format!("{}\n", bold_if_tty(&format!("Lead {}: {}", lead.id, contact.display_name()), tty)));
    output.push_str(&format!("  Contact:   {} <{}>\n", contact.id, contact.email));
    output.push_str(&format!("  Status:    {}\n", lead.status.as_str()));
    output.push_str(&format!("  Priority:  {}\n", lead.priority.as_str()));
    output.push_str(&format!("  Score:     {}\n", lead.score.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string())));
    output.push_str(&format!("  Value:     {}\n", format_value(lead.value)));
    output.push_str(&format!("  Source:    {}\n", or_dash(lead.source.as_deref())));
    match (lead.pipeline_id, lead.stage_id, lead.position) {
        (Some(pipeline_id), Some(stage_id), Some(position)) => output.push_str(&format!(
            "  Board:     pipeline {}, stage {}, position {}\n",
            pipeline_id, stage_id, position
        )),
        _ => output.push_str("  Board:     unstaged\n"),
    }
    output.push_str(&format!(
        "  Last interaction: {}\n",
        lead.last_interaction_ts.map(format_timestamp).unwrap_or_else(|| "-".to_string())
    ));
    output.push_str(&format!("  Created:   {}\n", format_timestamp(lead.created_ts)));
    output
}

pub fn format_pipeline_list(pipelines: &[PipelineSummary]) -> String {
    if pipelines.is_empty() {
        return "No pipelines found.\n".to_string();
    }
    let mut output = String::new();
    output.push_str(&format!("{:<6} {:<24} {:>6}  {}\n", "ID", "Name", "Leads", "Stages"));
    output.push_str(&format!("{}\n", "-".repeat(70)));
    for summary in pipelines {
        let stages: Vec<String> = summary
            .stages
            .iter()
            .map(|s| format!("{}:{}", s.id, s.name))
            .collect();
        output.push_str(&format!(
            "{:<6} {:<24} {:>6}  {}\n",
            summary.pipeline.id,
            truncate(&summary.pipeline.name, 24),
            summary.lead_count,
            if stages.is_empty() { "-".to_string() } else { stages.join(" > ") }
        ));
    }
    output
}

/// Render the board one stage per block, cards in position order
pub fn format_board(board: &Board) -> String {
    let tty = is_tty();
    let mut output = String::new();
    output.push_str(&format!(
        "{}\n",
        bold_if_tty(&format!("=== {} (pipeline {}) ===", board.pipeline.name, board.pipeline.id), tty)
    ));
    if let Some(description) = &board.pipeline.description {
        output.push_str(&format!("{}\n", description));
    }
    if board.columns.is_empty() {
        output.push_str("No stages.\n");
        return output;
    }

    for column in &board.columns {
        output.push('\n');
        output.push_str(&format!(
            "{}\n",
            bold_if_tty(&format!("[{}] {} ({})", column.stage.id, column.stage.name, column.cards.len()), tty)
        ));
        if column.cards.is_empty() {
            output.push_str("  (empty)\n");
        }
        for card in &column.cards {
            let name = card.contact_name.as_deref().unwrap_or(card.contact_email.as_str());
            output.push_str(&format!(
                "  {:>3}. lead {:<5} {:<24} {:<6} {:<6} {:>12}  {}\n",
                card.position,
                card.lead_id,
                truncate(name, 24),
                card.status.as_str(),
                card.priority.as_str(),
                format_value(card.value),
                or_dash(card.company.as_deref()),
            ));
        }
    }
    output
}

pub fn format_task_list(tasks: &[Task], now: i64) -> String {
    if tasks.is_empty() {
        return "No tasks found.\n".to_string();
    }
    let mut output = String::new();
    output.push_str(&format!("{:<6} {:<4} {:<40} {:<12} {:<8} {:<8}\n", "ID", "Done", "Title", "Due", "Contact", "Lead"));
    output.push_str(&format!("{}\n", "-".repeat(82)));
    for task in tasks {
        let due = match task.due_ts {
            Some(due) if task.is_due(now) => format!("{}!", format_date(due)),
            Some(due) => format_date(due),
            None => "-".to_string(),
        };
        output.push_str(&format!(
            "{:<6} {:<4} {:<40} {:<12} {:<8} {:<8}\n",
            task.id,
            if task.pending { "[ ]" } else { "[x]" },
            truncate(&task.title, 40),
            due,
            task.contact_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
            task.lead_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
        ));
    }
    output
}

pub fn format_message_list(messages: &[Message]) -> String {
    if messages.is_empty() {
        return "No messages found.\n".to_string();
    }
    let mut output = String::new();
    for message in messages {
        output.push_str(&format!(
            "  {}  {:<10} {}\n",
            format_timestamp(message.ts),
            message.channel,
            message.content
        ));
    }
    output
}

pub fn format_move_report(report: &MoveReport) -> String {
    if !report.moved {
        return format!("Lead {} already in place.\n", report.lead_id);
    }
    match (report.to_stage, report.position) {
        (Some(stage_id), Some(position)) => {
            format!("Moved lead {} to stage {} at position {}.\n", report.lead_id, stage_id, position)
        }
        _ => format!("Removed lead {} from the board.\n", report.lead_id),
    }
}

pub fn format_dashboard(dashboard: &Dashboard) -> String {
    let mut output = String::new();

    output.push_str("=== Overview ===\n");
    output.push_str(&format!("Contacts: {}\n", dashboard.total_contacts));
    let by_status: Vec<String> = dashboard
        .leads_by_status
        .iter()
        .map(|s| format!("{} {}", s.count, s.status.as_str()))
        .collect();
    output.push_str(&format!("Leads:    {} ({})\n", dashboard.total_leads, by_status.join(", ")));
    output.push_str(&format!("Due tasks: {}\n", dashboard.due_tasks));
    output.push_str(&format!("Avg messages per lead: {:.1}\n", dashboard.avg_messages_per_lead));
    output.push('\n');

    output.push_str("=== Leads per Stage ===\n");
    if dashboard.leads_per_stage.is_empty() {
        output.push_str("No stages.\n");
    }
    for stage in &dashboard.leads_per_stage {
        output.push_str(&format!(
            "{:<20} {:<20} {:>5}\n",
            truncate(&stage.pipeline_name, 20),
            truncate(&stage.stage_name, 20),
            stage.count
        ));
    }
    output.push('\n');

    output.push_str("=== New Leads per Day ===\n");
    if dashboard.leads_per_day.is_empty() {
        output.push_str("No new leads in the last 30 days.\n");
    }
    for day in &dashboard.leads_per_day {
        output.push_str(&format!("{:<8} {:>4} {}\n", day.label, day.count, "#".repeat(day.count.min(50) as usize)));
    }
    output.push('\n');

    output.push_str("=== Recent Messages ===\n");
    if dashboard.recent_messages.is_empty() {
        output.push_str("No messages.\n");
    }
    for activity in &dashboard.recent_messages {
        let who = activity.contact.name.as_deref().unwrap_or(activity.contact.email.as_str());
        output.push_str(&format!(
            "{}  {:<20} {:<10} {}\n",
            format_timestamp(activity.message.ts),
            truncate(who, 20),
            activity.message.channel,
            truncate(&activity.message.content, 60)
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoardCard, BoardColumn, LeadStatus, Pipeline, Priority, Stage};

    fn stage(id: i64, name: &str, position: i64) -> Stage {
        Stage { id, pipeline_id: 1, name: name.to_string(), color: None, position, created_ts: 0 }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer name", 8), "a much ~");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(Some(1500.0)), "1500.00");
        assert_eq!(format_value(None), "-");
    }

    #[test]
    fn test_format_board() {
        let board = Board {
            pipeline: Pipeline { id: 1, name: "Sales".to_string(), description: None, created_ts: 0 },
            columns: vec![
                BoardColumn {
                    stage: stage(10, "New", 0),
                    cards: vec![BoardCard {
                        lead_id: 7,
                        position: 0,
                        status: LeadStatus::Hot,
                        priority: Priority::High,
                        value: Some(250.0),
                        last_interaction_ts: None,
                        contact_id: 3,
                        contact_name: Some("Ana".to_string()),
                        contact_email: "ana@example.com".to_string(),
                        company: Some("Acme".to_string()),
                    }],
                },
                BoardColumn { stage: stage(11, "Won", 1), cards: vec![] },
            ],
        };

        let text = format_board(&board);
        assert!(text.contains("[10] New (1)"));
        assert!(text.contains("lead 7"));
        assert!(text.contains("Acme"));
        assert!(text.contains("[11] Won (0)"));
        assert!(text.contains("(empty)"));
        assert!(text.find("New").unwrap() < text.find("Won").unwrap());
    }

    #[test]
    fn test_format_move_report() {
        let report = MoveReport {
            lead_id: 4,
            moved: true,
            from_stage: Some(1),
            to_stage: None,
            position: None,
            invalidated: vec![],
        };
        assert_eq!(format_move_report(&report), "Removed lead 4 from the board.\n");

        let noop = MoveReport { moved: false, ..report };
        assert_eq!(format_move_report(&noop), "Lead 4 already in place.\n");
    }
}
