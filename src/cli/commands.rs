use clap::{Parser, Subcommand};
use rusqlite::Connection;
use anyhow::{Context, Result};
use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::db::DbConnection;
use crate::error::{ActionOutcome, CrmError, CrmResult};
use crate::models::{ContactInput, LeadFilter, LeadUpdate, NewLead, NewTask};
use crate::repo::{ContactRepo, KanbanRepo, LeadRepo, MessageRepo, MoveReport, PipelineRepo, StageRepo, TaskRepo};
use crate::cli::error::{parse_clearable, parse_id, parse_id_list, parse_priority, parse_stage_target, parse_status};
use crate::cli::output::{
    format_board, format_contact_detail, format_contact_list, format_contact_refs, format_dashboard,
    format_lead_detail, format_lead_list, format_message_list, format_move_report, format_pipeline_list,
    format_task_list,
};
use crate::utils::parse_date_expr;
use crate::views::{self, View};

#[derive(Parser)]
#[command(name = "leadline")]
#[command(about = "Leadline - contacts, leads and kanban pipelines from the command line")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Contact management commands
    Contacts {
        #[command(subcommand)]
        subcommand: ContactCommands,
    },
    /// Lead management and kanban moves
    Leads {
        #[command(subcommand)]
        subcommand: LeadCommands,
    },
    /// Pipeline management commands
    Pipelines {
        #[command(subcommand)]
        subcommand: PipelineCommands,
    },
    /// Stage (kanban column) management commands
    Stages {
        #[command(subcommand)]
        subcommand: StageCommands,
    },
    /// Follow-up tasks
    Tasks {
        #[command(subcommand)]
        subcommand: TaskCommands,
    },
    /// Message log per contact
    Messages {
        #[command(subcommand)]
        subcommand: MessageCommands,
    },
    /// Show dashboard with CRM summary
    Dashboard {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ContactCommands {
    /// Create a new contact
    Add {
        /// Email address (must be unique)
        email: String,
        #[arg(long)]
        name: Option<String>,
        /// Instagram handle, with or without the leading @
        #[arg(long)]
        instagram: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        country: Option<String>,
    },
    /// List contacts, newest first
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// List contacts that have no lead yet
    Unleaded {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show a contact with its lead and messages
    Show {
        id: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Modify a contact (pass an empty value to clear an optional field)
    Modify {
        id: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        instagram: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        country: Option<String>,
    },
    /// Delete a contact with its lead, tasks and messages
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum LeadCommands {
    /// Create a lead for a contact
    Add {
        /// Contact ID
        contact: String,
        /// Stage to append the lead to
        #[arg(long)]
        stage: Option<String>,
        /// cold, warm or hot (default: cold)
        #[arg(long)]
        status: Option<String>,
        /// low, medium or high (default: medium)
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        score: Option<i64>,
        /// Deal value
        #[arg(long)]
        value: Option<f64>,
        /// Origin channel (e.g. instagram, referral)
        #[arg(long)]
        source: Option<String>,
    },
    /// List leads, newest first
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show lead details
    Show {
        id: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Modify a lead (`none` clears score, value or source)
    Modify {
        id: String,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        score: Option<String>,
        #[arg(long)]
        value: Option<String>,
        #[arg(long)]
        source: Option<String>,
    },
    /// Move a lead to a position in a stage, or off the board with `none`
    Move {
        /// Lead ID
        lead: String,
        /// Target stage ID, or `none`
        stage: String,
        /// Zero-based target position (clamped to the stage bounds)
        #[arg(allow_negative_numbers = true)]
        position: String,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a lead
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum PipelineCommands {
    /// Create a new pipeline
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List pipelines with their stages
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show the kanban board of a pipeline
    Show {
        id: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Rename a pipeline or change its description
    Modify {
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// New description (empty clears it)
        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum StageCommands {
    /// Append a stage to a pipeline
    Add {
        /// Pipeline ID
        pipeline: String,
        name: String,
        /// Color as #rrggbb
        #[arg(long)]
        color: Option<String>,
    },
    /// List the stages of a pipeline
    List {
        /// Pipeline ID
        pipeline: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Rename a stage or change its color (`none` clears the color)
    Modify {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Set the stage order of a pipeline
    Reorder {
        /// Pipeline ID
        pipeline: String,
        /// Every stage ID of the pipeline, comma-separated, in the new order
        ids: String,
    },
    /// Delete an empty stage
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Create a task
    Add {
        /// Task title
        #[arg(required = true)]
        title: Vec<String>,
        /// Due date (YYYY-MM-DD, YYYY-MM-DDTHH:MM, today, tomorrow, +Nd)
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        contact: Option<String>,
        #[arg(long)]
        lead: Option<String>,
        /// Create the task already done
        #[arg(long)]
        done: bool,
    },
    /// List tasks
    List {
        /// Only pending tasks
        #[arg(long)]
        pending: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Flip a task between pending and done
    Toggle {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum MessageCommands {
    /// Record a message exchanged with a contact
    Add {
        /// Contact ID
        contact: String,
        /// Channel (email, instagram, phone, ...)
        channel: String,
        /// Message content
        #[arg(required = true)]
        content: Vec<String>,
        /// When the message was sent (defaults to now)
        #[arg(long)]
        at: Option<String>,
    },
    /// List messages of a contact, newest first
    List {
        /// Contact ID
        contact: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

pub fn run() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // help and version go to stdout and are not failures
            let code = if e.use_stderr() { 1 } else { 0 };
            e.print()?;
            std::process::exit(code);
        }
    };

    handle_command(cli)
}

fn handle_command(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let conn = DbConnection::connect(&config)
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Contacts { subcommand } => handle_contacts(&conn, subcommand),
        Commands::Leads { subcommand } => handle_leads(&conn, subcommand),
        Commands::Pipelines { subcommand } => handle_pipelines(&conn, subcommand),
        Commands::Stages { subcommand } => handle_stages(&conn, subcommand),
        Commands::Tasks { subcommand } => handle_tasks(&conn, subcommand),
        Commands::Messages { subcommand } => handle_messages(&conn, subcommand),
        Commands::Dashboard { json } => handle_dashboard(&conn, &config, json),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_contacts(conn: &Connection, cmd: ContactCommands) -> Result<()> {
    match cmd {
        ContactCommands::Add { email, name, instagram, phone, company, city, country } => {
            let input = ContactInput { name, email, instagram, phone, company, city, country };
            let contact = ContactRepo::create(conn, &input)?;
            views::invalidate(&[View::Contacts, View::Dashboard]);
            println!("Created contact {} <{}>", contact.id, contact.email);
            Ok(())
        }
        ContactCommands::List { json } => {
            let contacts = ContactRepo::list(conn)?;
            if json {
                print_json(&contacts)
            } else {
                print!("{}", format_contact_list(&contacts));
                Ok(())
            }
        }
        ContactCommands::Unleaded { json } => {
            let contacts = ContactRepo::list_without_lead(conn)?;
            if json {
                print_json(&contacts)
            } else {
                print!("{}", format_contact_refs(&contacts));
                Ok(())
            }
        }
        ContactCommands::Show { id, json } => {
            let id = parse_id(&id, "Contact")?;
            let contact = ContactRepo::require(conn, id)?;
            let lead = LeadRepo::get_by_contact(conn, id)?;
            let messages = MessageRepo::list_for_contact(conn, id)?;
            if json {
                print_json(&serde_json::json!({
                    "contact": contact,
                    "lead": lead,
                    "messages": messages,
                }))
            } else {
                print!("{}", format_contact_detail(&contact, lead.as_ref(), &messages));
                Ok(())
            }
        }
        ContactCommands::Modify { id, email, name, instagram, phone, company, city, country } => {
            let id = parse_id(&id, "Contact")?;
            let existing = ContactRepo::require(conn, id)?;
            let input = ContactInput {
                name: name.or(existing.name),
                email: email.unwrap_or(existing.email),
                instagram: instagram.or(existing.instagram),
                phone: phone.or(existing.phone),
                company: company.or(existing.company),
                city: city.or(existing.city),
                country: country.or(existing.country),
            };
            let contact = ContactRepo::update(conn, id, &input)?;
            views::invalidate(&[View::Contacts, View::Contact(id)]);
            println!("Modified contact {} <{}>", contact.id, contact.email);
            Ok(())
        }
        ContactCommands::Delete { id } => {
            let id = parse_id(&id, "Contact")?;
            ContactRepo::delete(conn, id)?;
            views::invalidate(&[View::Contacts, View::Leads, View::Pipelines, View::Dashboard]);
            println!("Deleted contact {}", id);
            Ok(())
        }
    }
}

fn handle_leads(conn: &Connection, cmd: LeadCommands) -> Result<()> {
    match cmd {
        LeadCommands::Add { contact, stage, status, priority, score, value, source } => {
            let new_lead = NewLead {
                contact_id: parse_id(&contact, "Contact")?,
                status: status.as_deref().map(parse_status).transpose()?,
                priority: priority.as_deref().map(parse_priority).transpose()?,
                score,
                value,
                source,
                stage_id: stage.as_deref().map(|s| parse_id(s, "Stage")).transpose()?,
            };
            let lead = LeadRepo::create(conn, &new_lead)?;

            let mut touched = vec![View::Leads, View::Contact(lead.contact_id), View::Dashboard];
            if let Some(pipeline_id) = lead.pipeline_id {
                touched.push(View::Pipeline(pipeline_id));
            }
            views::invalidate(&touched);

            match (lead.stage_id, lead.position) {
                (Some(stage_id), Some(position)) => println!(
                    "Created lead {} in stage {} at position {}",
                    lead.id, stage_id, position
                ),
                _ => println!("Created lead {}", lead.id),
            }
            Ok(())
        }
        LeadCommands::List { status, priority, json } => {
            let filter = LeadFilter {
                status: status.as_deref().map(parse_status).transpose()?,
                priority: priority.as_deref().map(parse_priority).transpose()?,
            };
            let leads = LeadRepo::list(conn, &filter)?;
            if json {
                let rows: Vec<serde_json::Value> = leads
                    .iter()
                    .map(|(lead, contact)| serde_json::json!({ "lead": lead, "contact": contact }))
                    .collect();
                print_json(&rows)
            } else {
                print!("{}", format_lead_list(&leads));
                Ok(())
            }
        }
        LeadCommands::Show { id, json } => {
            let id = parse_id(&id, "Lead")?;
            let lead = LeadRepo::require(conn, id)?;
            let contact = ContactRepo::require(conn, lead.contact_id)?;
            if json {
                print_json(&serde_json::json!({ "lead": lead, "contact": contact }))
            } else {
                print!("{}", format_lead_detail(&lead, &contact));
                Ok(())
            }
        }
        LeadCommands::Modify { id, status, priority, score, value, source } => {
            let id = parse_id(&id, "Lead")?;
            let update = LeadUpdate {
                status: status.as_deref().map(parse_status).transpose()?,
                priority: priority.as_deref().map(parse_priority).transpose()?,
                score: score.as_deref().map(|s| parse_clearable::<i64>(s, "score")).transpose()?,
                value: value.as_deref().map(|v| parse_clearable::<f64>(v, "value")).transpose()?,
                source: source.map(|s| if s.trim().eq_ignore_ascii_case("none") { None } else { Some(s) }),
            };
            let lead = LeadRepo::update(conn, id, &update)?;

            let mut touched = vec![View::Leads, View::Lead(id), View::Dashboard];
            if let Some(pipeline_id) = lead.pipeline_id {
                touched.push(View::Pipeline(pipeline_id));
            }
            views::invalidate(&touched);
            println!("Modified lead {}", lead.id);
            Ok(())
        }
        LeadCommands::Move { lead, stage, position, json } => handle_lead_move(conn, &lead, &stage, &position, json),
        LeadCommands::Delete { id } => {
            let id = parse_id(&id, "Lead")?;
            let lead = LeadRepo::require(conn, id)?;
            LeadRepo::delete(conn, id)?;

            let mut touched = vec![View::Leads, View::Contact(lead.contact_id), View::Dashboard];
            if let Some(pipeline_id) = lead.pipeline_id {
                touched.push(View::Pipeline(pipeline_id));
            }
            views::invalidate(&touched);
            println!("Deleted lead {}", id);
            Ok(())
        }
    }
}

fn handle_lead_move(conn: &Connection, lead: &str, stage: &str, position: &str, json: bool) -> Result<()> {
    let result: CrmResult<MoveReport> = (|| {
        let lead_id = parse_id(lead, "Lead")?;
        let stage_id = parse_stage_target(stage)?;
        let position = position.trim().parse::<i64>().map_err(|_| {
            CrmError::Validation(format!("Invalid position: '{}'. Position must be a number.", position))
        })?;
        KanbanRepo::move_lead(conn, lead_id, stage_id, position)
    })();

    if json {
        println!("{}", serde_json::to_string(&ActionOutcome::from_result(&result))?);
        result?;
    } else {
        print!("{}", format_move_report(&result?));
    }
    Ok(())
}

fn handle_pipelines(conn: &Connection, cmd: PipelineCommands) -> Result<()> {
    match cmd {
        PipelineCommands::Add { name, description } => {
            let pipeline = PipelineRepo::create(conn, &name, description.as_deref())?;
            views::invalidate(&[View::Pipelines]);
            println!("Created pipeline '{}' (id: {})", pipeline.name, pipeline.id);
            Ok(())
        }
        PipelineCommands::List { json } => {
            let pipelines = PipelineRepo::list(conn)?;
            if json {
                print_json(&pipelines)
            } else {
                print!("{}", format_pipeline_list(&pipelines));
                Ok(())
            }
        }
        PipelineCommands::Show { id, json } => {
            let id = parse_id(&id, "Pipeline")?;
            let board = KanbanRepo::board(conn, id)?;
            if json {
                print_json(&board)
            } else {
                print!("{}", format_board(&board));
                Ok(())
            }
        }
        PipelineCommands::Modify { id, name, description } => {
            let id = parse_id(&id, "Pipeline")?;
            let existing = PipelineRepo::require(conn, id)?;
            let name = name.unwrap_or(existing.name);
            let description = description.or(existing.description);
            let pipeline = PipelineRepo::update(conn, id, &name, description.as_deref())?;
            views::invalidate(&[View::Pipelines, View::Pipeline(id)]);
            println!("Modified pipeline '{}' (id: {})", pipeline.name, pipeline.id);
            Ok(())
        }
    }
}

fn handle_stages(conn: &Connection, cmd: StageCommands) -> Result<()> {
    match cmd {
        StageCommands::Add { pipeline, name, color } => {
            let pipeline_id = parse_id(&pipeline, "Pipeline")?;
            let stage = StageRepo::create(conn, pipeline_id, &name, color.as_deref())?;
            views::invalidate(&[View::Pipelines, View::Pipeline(pipeline_id), View::Dashboard]);
            println!("Created stage '{}' (id: {}) at position {}", stage.name, stage.id, stage.position);
            Ok(())
        }
        StageCommands::List { pipeline, json } => {
            let pipeline_id = parse_id(&pipeline, "Pipeline")?;
            PipelineRepo::require(conn, pipeline_id)?;
            let stages = StageRepo::list_for_pipeline(conn, pipeline_id)?;
            if json {
                return print_json(&stages);
            }
            if stages.is_empty() {
                println!("No stages found.");
            } else {
                println!("{:<6} {:<4} {:<24} {:<8} {:>6}", "ID", "Pos", "Name", "Color", "Leads");
                println!("{}", "-".repeat(52));
                for stage in stages {
                    println!(
                        "{:<6} {:<4} {:<24} {:<8} {:>6}",
                        stage.id,
                        stage.position,
                        stage.name,
                        stage.color.as_deref().unwrap_or("-"),
                        KanbanRepo::count_in_stage(conn, stage.id)?
                    );
                }
            }
            Ok(())
        }
        StageCommands::Modify { id, name, color } => {
            let id = parse_id(&id, "Stage")?;
            let color = color.as_deref().map(|c| {
                if c.trim().eq_ignore_ascii_case("none") { None } else { Some(c) }
            });
            let stage = StageRepo::update(conn, id, name.as_deref(), color)?;
            views::invalidate(&[View::Pipeline(stage.pipeline_id), View::Dashboard]);
            println!("Modified stage '{}' (id: {})", stage.name, stage.id);
            Ok(())
        }
        StageCommands::Reorder { pipeline, ids } => {
            let pipeline_id = parse_id(&pipeline, "Pipeline")?;
            let stage_ids = parse_id_list(&ids, "Stage")?;
            StageRepo::reorder(conn, pipeline_id, &stage_ids)?;
            views::invalidate(&[View::Pipelines, View::Pipeline(pipeline_id), View::Dashboard]);
            println!("Reordered {} stage(s) of pipeline {}", stage_ids.len(), pipeline_id);
            Ok(())
        }
        StageCommands::Delete { id } => {
            let id = parse_id(&id, "Stage")?;
            let stage = StageRepo::delete(conn, id)?;
            views::invalidate(&[View::Pipelines, View::Pipeline(stage.pipeline_id), View::Dashboard]);
            println!("Deleted stage '{}' (id: {})", stage.name, stage.id);
            Ok(())
        }
    }
}

fn handle_tasks(conn: &Connection, cmd: TaskCommands) -> Result<()> {
    match cmd {
        TaskCommands::Add { title, due, contact, lead, done } => {
            let new_task = NewTask {
                title: title.join(" "),
                pending: !done,
                due_ts: due.as_deref().map(parse_date_expr).transpose()?,
                contact_id: contact.as_deref().map(|c| parse_id(c, "Contact")).transpose()?,
                lead_id: lead.as_deref().map(|l| parse_id(l, "Lead")).transpose()?,
            };
            let task = TaskRepo::create(conn, &new_task)?;
            views::invalidate(&[View::Tasks, View::Dashboard]);
            println!("Created task {}: {}", task.id, task.title);
            Ok(())
        }
        TaskCommands::List { pending, json } => {
            let tasks = TaskRepo::list(conn, pending)?;
            if json {
                print_json(&tasks)
            } else {
                print!("{}", format_task_list(&tasks, chrono::Utc::now().timestamp()));
                Ok(())
            }
        }
        TaskCommands::Toggle { id } => {
            let id = parse_id(&id, "Task")?;
            let task = TaskRepo::toggle(conn, id)?;
            views::invalidate(&[View::Tasks, View::Dashboard]);
            println!(
                "Task {} is now {}",
                task.id,
                if task.pending { "pending" } else { "done" }
            );
            Ok(())
        }
    }
}

fn handle_messages(conn: &Connection, cmd: MessageCommands) -> Result<()> {
    match cmd {
        MessageCommands::Add { contact, channel, content, at } => {
            let contact_id = parse_id(&contact, "Contact")?;
            let ts = at.as_deref().map(parse_date_expr).transpose()?;
            let message = MessageRepo::create(conn, contact_id, &channel, &content.join(" "), ts)?;
            views::invalidate(&[View::Contact(contact_id), View::Dashboard]);
            println!("Recorded {} message {} for contact {}", message.channel, message.id, contact_id);
            Ok(())
        }
        MessageCommands::List { contact, json } => {
            let contact_id = parse_id(&contact, "Contact")?;
            ContactRepo::require(conn, contact_id)?;
            let messages = MessageRepo::list_for_contact(conn, contact_id)?;
            if json {
                print_json(&messages)
            } else {
                print!("{}", format_message_list(&messages));
                Ok(())
            }
        }
    }
}

fn handle_dashboard(conn: &Connection, config: &Config, json: bool) -> Result<()> {
    let dashboard = Dashboard::compute(conn, config.recent_messages)?;
    if json {
        print_json(&dashboard)
    } else {
        print!("{}", format_dashboard(&dashboard));
        Ok(())
    }
}
