pub mod contact;
pub mod lead;
pub mod pipeline;
pub mod stage;
pub mod kanban;
pub mod task;
pub mod message;

pub use contact::*;
pub use lead::*;
pub use pipeline::*;
pub use stage::*;
pub use kanban::*;
pub use task::*;
pub use message::*;
