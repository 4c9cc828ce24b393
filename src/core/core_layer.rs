// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "topic_filter/mod.rs"]
pub mod topic_filter;
