// Rejection intake: record model, LLM extraction adapter, HTTP handlers.

pub mod extraction;
pub mod handlers;
pub mod models;
pub mod prompts;
