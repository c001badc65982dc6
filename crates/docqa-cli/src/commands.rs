//! Parsing of interactive input lines

use docqa_core::{Error, Result};

/// What the user asked for at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Feedback { rating: u8, comment: Option<String> },
    History,
    Help,
    Exit,
    Empty,
}

/// Interpret one input line
///
/// Anything that is not a known command is a question. Blank input is
/// reported as [`Command::Empty`] and never reaches the pipeline.
pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Empty);
    }

    match line.to_lowercase().as_str() {
        "exit" | "quit" => return Ok(Command::Exit),
        "help" => return Ok(Command::Help),
        "history" => return Ok(Command::History),
        _ => {}
    }

    let mut parts = line.splitn(2, char::is_whitespace);
    let head = parts.next().unwrap_or_default();
    if head.eq_ignore_ascii_case("feedback") {
        let rest = parts.next().unwrap_or_default().trim();
        let mut args = rest.splitn(2, char::is_whitespace);
        let raw_rating = args.next().unwrap_or_default();
        let rating = raw_rating.parse::<u8>().map_err(|_| {
            Error::InvalidInput(format!(
                "Usage: feedback <1-5> [comment] (got '{}')",
                raw_rating
            ))
        })?;
        let comment = args
            .next()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_owned);

        return Ok(Command::Feedback { rating, comment });
    }

    Ok(Command::Ask(line.to_string()))
}
