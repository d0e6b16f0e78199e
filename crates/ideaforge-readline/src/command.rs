//! REPL input parsing.

use anyhow::{Result, bail};
use ideaforge_core::workspace::FeatureStatus;

/// Slash commands offered for completion.
pub const COMMANDS: &[&str] = &[
    "/status",
    "/timeline",
    "/approve ",
    "/reject ",
    "/help",
    "/quit",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    Timeline,
    Review {
        feature: String,
        status: FeatureStatus,
    },
    Help,
    Quit,
    /// Anything that is not a command goes to the conversation.
    Message(String),
}

pub fn parse(line: &str) -> Result<Command> {
    let trimmed = line.trim();
    if !trimmed.starts_with('/') {
        return Ok(match trimmed {
            "quit" | "exit" => Command::Quit,
            _ => Command::Message(trimmed.to_string()),
        });
    }

    let mut parts = trimmed.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let argument = parts.next();

    let command = match (name, argument) {
        ("/status", _) => Command::Status,
        ("/timeline", _) => Command::Timeline,
        ("/help", _) => Command::Help,
        ("/quit" | "/exit", _) => Command::Quit,
        ("/approve", Some(id)) => Command::Review {
            feature: id.to_string(),
            status: FeatureStatus::Approved,
        },
        ("/reject", Some(id)) => Command::Review {
            feature: id.to_string(),
            status: FeatureStatus::Rejected,
        },
        ("/approve" | "/reject", None) => bail!("Usage: {} <feature-id>", name),
        _ => bail!("Unknown command: {}", name),
    };
    Ok(command)
}
