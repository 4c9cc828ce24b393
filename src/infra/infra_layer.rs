// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "topic_filter/mod.rs"]
pub mod topic_filter;
