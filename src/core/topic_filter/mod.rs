// Core topic filter module - per-channel topic moderation.
// Same layout as the other core features: models, ports, service.

pub mod topic_classifier;
pub mod topic_filter_service;
pub mod topic_models;
pub mod topic_registry;

pub use topic_classifier::*;
pub use topic_filter_service::*;
pub use topic_models::*;
