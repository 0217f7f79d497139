//! Leadline - a small CRM with kanban lead pipelines
//!
//! This library provides the core functionality for Leadline, including:
//! - Database connection, configuration and schema migrations
//! - Data models for contacts, leads, pipelines, stages, tasks and messages
//! - Repository layer for data access, with the kanban position engine
//! - Dashboard aggregation
//! - CLI command parsing and execution
//!
//! # Example
//!
//! ```no_run
//! use leadline::db::DbConnection;
//! use leadline::repo::{KanbanRepo, PipelineRepo, StageRepo};
//!
//! let conn = DbConnection::connect_in_memory().unwrap();
//! let pipeline = PipelineRepo::create(&conn, "Sales", None).unwrap();
//! let stage = StageRepo::create(&conn, pipeline.id, "New", None).unwrap();
//! let board = KanbanRepo::board(&conn, pipeline.id).unwrap();
//! assert_eq!(board.columns[0].stage.id, stage.id);
//! ```

pub mod config;
pub mod error;
pub mod validate;
pub mod views;
pub mod db;
pub mod models;
pub mod repo;
pub mod dashboard;
pub mod cli;
pub mod utils;
