// Discord adapters for the topic filter.

pub mod gateway;
pub mod message_handler;

pub use message_handler::handle_message_for_topic;
