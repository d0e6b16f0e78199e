mod command;

use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tracing_subscriber::EnvFilter;

use ideaforge_application::{ConversationPipeline, PipelineError, TurnOutcome, WorkspaceStore};
use ideaforge_core::broadcast::WorkspaceEvent;
use ideaforge_core::readiness::{ActionStatus, ReadinessReport};
use ideaforge_core::workspace::{FeatureStatus, WorkspaceState};
use ideaforge_infrastructure::{ConfigService, MemoryTier};
use ideaforge_interaction::GeminiExtractionClient;

use command::{COMMANDS, Command};

/// Completion, highlighting, and hints for slash commands.
#[derive(Clone)]
struct CliHelper;

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }

        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.trim_end().to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return None;
        }
        COMMANDS
            .iter()
            .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
            .map(|cmd| cmd[line.len()..].trim_end().to_string())
    }
}

impl Validator for CliHelper {}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_service = ConfigService::new();
    let config = config_service.get_config();
    tracing::debug!(
        "[main] Loaded configuration (model={}, snapshot_key={})",
        config.extraction.model,
        config.workspace.snapshot_key
    );
    let extractor = GeminiExtractionClient::from_config(&config.extraction)
        .context("Cannot start without an extraction service")?;

    let store = Arc::new(
        WorkspaceStore::open(&config.workspace, Arc::new(MemoryTier::session()))
            .context("Failed to open workspace storage")?,
    );
    let _printer = store.subscribe(print_event);

    let pipeline = Arc::new(
        ConversationPipeline::new(store.clone(), Arc::new(extractor)).with_config(&config.workspace),
    );

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper));

    println!("{}", "=== IdeaForge ===".bright_magenta().bold());
    println!(
        "{}",
        "Describe your business idea. Type /help for commands.".bright_black()
    );
    if !store.with_state(WorkspaceState::is_empty) {
        println!("{}", "Restored your previous workspace.".bright_black());
        store.with_state(print_status);
    }
    println!();

    loop {
        let line = match rl.readline(">> ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line.as_str());

        let command = match command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e.to_string().yellow());
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => print_help(),
            Command::Status => {
                store.with_state(print_status);
                print_readiness(&pipeline.readiness());
            }
            Command::Timeline => store.with_state(print_timeline),
            Command::Review { feature, status } => {
                let Some(feature_id) = store.with_state(|s| resolve_feature_id(s, &feature)) else {
                    println!("{}", format!("No single feature matches '{}'", feature).yellow());
                    continue;
                };
                match pipeline.review_feature(&feature_id, status) {
                    Ok(()) => print_readiness(&pipeline.readiness()),
                    Err(e) => println!("{}", e.to_string().red()),
                }
            }
            Command::Message(text) => {
                println!("{}", format!("> {}", text).green());
                match pipeline.send(text).await {
                    Ok(outcome) => {
                        print_reply(outcome.reply());
                        if let TurnOutcome::Fallback { error } = &outcome {
                            println!("{}", format!("({})", error).bright_black());
                        }
                        print_readiness(&pipeline.readiness());
                    }
                    Err(PipelineError::Persistence(e)) => {
                        print_reply(ideaforge_application::PERSISTENCE_FAILURE_MESSAGE);
                        println!("{}", format!("({})", e).bright_black());
                    }
                    Err(e) => println!("{}", e.to_string().red()),
                }
            }
        }
    }

    println!("{}", "Goodbye!".bright_green());
    Ok(())
}

fn print_event(event: &WorkspaceEvent) {
    match event {
        WorkspaceEvent::AutoPopulate(data) => {
            if let Some(concept) = &data.business_concept {
                println!("{}", format!("  * Concept: {}", concept).bright_yellow());
            }
            if let Some(market) = &data.target_market {
                println!("{}", format!("  * Target market: {}", market).bright_yellow());
            }
            if let Some(features) = &data.key_features {
                println!(
                    "{}",
                    format!("  * New features: {}", features.join(", ")).bright_yellow()
                );
            }
            if let Some(steps) = &data.next_steps {
                println!(
                    "{}",
                    format!("  * Next steps: {}", steps.join("; ")).bright_yellow()
                );
            }
        }
        WorkspaceEvent::FeatureReviewed { feature_id, status } => {
            println!(
                "{}",
                format!("  * Feature {} {}", short_id(feature_id), status).bright_yellow()
            );
        }
    }
}

fn print_reply(reply: &str) {
    for line in reply.lines() {
        println!("{}", line.bright_blue());
    }
}

fn print_help() {
    println!("{}", "Commands:".bright_black());
    println!("{}", "  /status          workspace overview and stage readiness".bright_black());
    println!("{}", "  /timeline        how the concept evolved, newest first".bright_black());
    println!("{}", "  /approve <id>    approve a feature (id prefix is enough)".bright_black());
    println!("{}", "  /reject <id>     reject a feature".bright_black());
    println!("{}", "  /quit            exit".bright_black());
}

fn print_status(state: &WorkspaceState) {
    let summary = state.session_summary();
    println!(
        "{} {}",
        "Dream:".bold(),
        state.dream_statement().unwrap_or("(not yet captured)")
    );
    println!(
        "{} {}",
        "Market:".bold(),
        state.target_market().unwrap_or("(not yet captured)")
    );
    println!(
        "{} {} dream elements, {} user personas, {} general ideas",
        "Mind map:".bold(),
        summary.dream_elements,
        summary.user_personas,
        summary.general_ideas
    );
    for feature in state.features() {
        let status = match feature.status {
            FeatureStatus::Pending => feature.status.to_string().yellow(),
            FeatureStatus::Approved => feature.status.to_string().green(),
            FeatureStatus::Rejected => feature.status.to_string().red(),
        };
        println!("  [{}] {} ({})", short_id(&feature.id), feature.name, status);
    }
    for step in state.next_steps() {
        println!("  - {}", step);
    }
}

fn print_timeline(state: &WorkspaceState) {
    if state.idea_evolution().is_empty() {
        println!("{}", "No concept recorded yet.".bright_black());
        return;
    }
    for entry in state.idea_evolution().newest_first() {
        println!("{} {}", entry.timestamp().bright_black(), entry.concept().bold());
        println!("    {}", format!("\"{}\"", entry.trigger_display()).italic());
        if !entry.changes().is_empty() {
            println!("    + {}", entry.changes().join(", "));
        }
    }
}

fn print_readiness(report: &ReadinessReport) {
    let badges: Vec<String> = report
        .actions
        .iter()
        .map(|action| match action.status {
            ActionStatus::Ready => format!("{} ✓", action.action_id).green().to_string(),
            ActionStatus::Needed => format!("{} !", action.action_id).yellow().to_string(),
            ActionStatus::Neutral => action.action_id.bright_black().to_string(),
        })
        .collect();
    println!("{} {}", "Stages:".bold(), badges.join("  "));
    if report.is_ready_for_validation {
        println!("{}", "Ready for validation.".green());
    }
}

/// Accepts a full feature id or a prefix matching exactly one feature.
fn resolve_feature_id(state: &WorkspaceState, input: &str) -> Option<String> {
    if let Some(feature) = state.feature(input) {
        return Some(feature.id.clone());
    }
    let mut matches = state.features().iter().filter(|f| f.id.starts_with(input));
    match (matches.next(), matches.next()) {
        (Some(feature), None) => Some(feature.id.clone()),
        _ => None,
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
