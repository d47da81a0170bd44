//! Supporting services

pub mod cleanup;

pub use cleanup::CleanupScheduler;
