//! LLM integration module.
//!
//! Provides an OpenAI-compatible vision client and the prompts used to ask
//! a model where a photograph was taken.

mod client;
mod prompts;

pub use client::{LlmClient, LlmResponse, Message, image_data_url};
pub use prompts::Prompts;
