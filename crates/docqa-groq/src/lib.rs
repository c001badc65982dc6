//! Groq integration for DocQA
//!
//! This crate provides the Groq implementation of the LLMProvider trait,
//! speaking Groq's OpenAI-compatible chat completions API with bounded
//! retries for transient failures.

mod client;
mod config;
mod retry;


pub use client::GroqClient;
pub use config::GroqConfig;

// Re-export core types for convenience
pub use docqa_core::{
    ChatMessage, Error, GenerationConfig, GenerationResult, LLMProvider, Result, RetryConfig,
};
