// Core data models for leadline
// These structs represent the CRM entities stored in SQLite

pub mod contact;
pub mod lead;
pub mod pipeline;
pub mod task;
pub mod message;

pub use contact::*;
pub use lead::*;
pub use pipeline::*;
pub use task::*;
pub use message::*;
