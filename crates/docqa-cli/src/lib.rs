//! Terminal interface for DocQA

mod chat_log;
mod commands;
mod ui;

pub use chat_log::{ChatHistory, ChatRecord, FeedbackRecord};
pub use commands::{Command, parse_command};
pub use ui::{display_banner, format_history, format_result, print_help, print_result, read_query};

// Re-export core types
pub use docqa_core::{Error, Result};
