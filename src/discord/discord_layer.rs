// Discord layer - commands and event handlers.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "topic_filter/mod.rs"]
pub mod topic_filter;

// Re-export command types for convenience
pub use commands::{Context, Data, Error};
