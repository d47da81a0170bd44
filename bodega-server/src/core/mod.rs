//! Core infrastructure: configuration, server state, background tasks

pub mod config;
pub mod state;
pub mod tasks;

pub use config::{Config, MailConfig, TemplateFlags};
pub use state::ServerState;
pub use tasks::{BackgroundTasks, TaskKind};
