//! Terminal rendering and line input

use colored::*;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, size},
};
use std::io::{self, IsTerminal, Write};

use docqa_core::{PipelineState, Result, Verdict};

use crate::chat_log::ChatRecord;

const PROMPT: &str = "docqa>";

/// Display startup banner
pub fn display_banner(index_description: &str, model_id: &str) {
    let terminal_width = size().map(|(w, _)| w as usize).unwrap_or(80);
    let banner_width = std::cmp::min(67, terminal_width.saturating_sub(4)).max(20);
    let inner = banner_width - 2;

    let boxed = |text: &str| {
        let pad = inner.saturating_sub(text.chars().count() + 2);
        format!("│  {}{}│", text, " ".repeat(pad))
    };

    println!();
    println!("{}", format!("┌{}┐", "─".repeat(inner)).blue());
    println!("{}", boxed("DocQA - Ask your documents").blue().bold());
    println!("{}", boxed("").blue());
    println!("{}", boxed(&format!("Index: {}", index_description)).blue());
    println!("{}", boxed(&format!("Model: {}", model_id)).blue());
    println!("{}", boxed("Answers come only from the indexed documents").blue());
    println!("{}", format!("└{}┘", "─".repeat(inner)).blue());
    println!();
    println!("{}", "Tip: type a question, or 'help' for commands".dimmed());
    println!();
}

/// Read one line, with ↑/↓ navigation through `history` on a terminal
pub fn read_query(history: &mut Vec<String>) -> Result<String> {
    if !io::stdin().is_terminal() {
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok("exit".to_string());
        }
        return Ok(input.trim().to_string());
    }

    enable_raw_mode()?;
    let result = read_raw_line(history);
    disable_raw_mode()?;
    println!();

    let input = result?;
    if !input.trim().is_empty() {
        history.push(input.clone());
    }
    Ok(input)
}

fn redraw(input: &str) -> io::Result<()> {
    print!("\r{} {}\x1b[K", PROMPT.green().bold(), input);
    io::stdout().flush()
}

fn read_raw_line(history: &[String]) -> Result<String> {
    let mut input = String::new();
    let mut history_index: Option<usize> = None;

    redraw(&input)?;

    loop {
        let Event::Key(key_event) = event::read()? else {
            continue;
        };

        match key_event.code {
            KeyCode::Enter => return Ok(input),
            KeyCode::Char('c' | 'd') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok("exit".to_string());
            }
            KeyCode::Char(c) => input.push(c),
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Up if !history.is_empty() => {
                let index = match history_index {
                    None => history.len() - 1,
                    Some(idx) => idx.saturating_sub(1),
                };
                history_index = Some(index);
                input = history[index].clone();
            }
            KeyCode::Down => {
                if let Some(idx) = history_index {
                    if idx + 1 < history.len() {
                        history_index = Some(idx + 1);
                        input = history[idx + 1].clone();
                    } else {
                        history_index = None;
                        input.clear();
                    }
                }
            }
            KeyCode::Esc => input.clear(),
            _ => {}
        }

        redraw(&input)?;
    }
}

/// Render the answer, its evaluation and the cited sources
pub fn format_result(state: &PipelineState) -> String {
    let mut out = String::new();

    let answer = state.answer_text();
    let answer = if state.answer().is_some_and(|a| a.is_failed()) {
        answer.red().to_string()
    } else {
        answer
    };

    let evaluation = state.evaluation_text();
    let evaluation = match state.evaluation() {
        Some(Verdict::Yes) => evaluation.green().bold(),
        Some(Verdict::No) => evaluation.yellow().bold(),
        Some(Verdict::Error) => evaluation.red().bold(),
        _ => evaluation.normal(),
    };

    out.push_str(&format!("{}\n{}\n\n", "Answer".bold(), answer));
    out.push_str(&format!("{} {}\n\n", "Grounded:".bold(), evaluation));
    out.push_str(&format!("{}\n", "Sources".bold()));

    if state.sources().is_empty() {
        out.push_str(&format!("{}\n", "No sources found".dimmed()));
    } else {
        for source in state.sources() {
            out.push_str(&format!("- {}\n", source));
        }
    }

    out
}

pub fn print_result(state: &PipelineState) {
    print!("{}", format_result(state));
    println!();
}

/// Render past conversations, oldest first
pub fn format_history(records: &[ChatRecord]) -> String {
    if records.is_empty() {
        return format!("{}\n", "No questions asked yet".dimmed());
    }

    let mut out = String::new();
    for record in records {
        out.push_str(&format!(
            "{} {}\n",
            record.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            record.question.bold()
        ));
        out.push_str(&format!("  {}\n", record.answer));
        out.push_str(&format!("  Grounded: {}\n", record.evaluation));
    }
    out
}

/// Display help message
pub fn print_help() {
    println!("{}", "Available commands:".bold());
    println!("  {} - Ask a question about the indexed documents", "<question>".green());
    println!("  {} - Show questions asked so far", "history".green());
    println!("  {} - Rate the last answer", "feedback <1-5> [comment]".green());
    println!("  {} - Show this help message", "help".green());
    println!("  {} - Exit the application", "exit/quit".green());
    println!();
    println!("{}", "Examples:".bold());
    println!("  What is the refund policy?");
    println!("  feedback 5 exactly what I needed");
}
