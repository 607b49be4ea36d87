//! LLM integration module

pub mod message;
pub mod client;
pub mod streaming;
pub mod prompts;

pub use client::{CompletionClient, Completion, CompletionRequest, TextStream};
pub use message::{Message, Role};
