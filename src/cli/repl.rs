//! REPL implementation
//!
//! This module implements the interactive Read-Eval-Print Loop for Record-Forge.

use crate::cli::commands::{self, format_error, Command, CommandType};
use crate::config::SharedState;
use crate::error::{RecordForgeError, Result};
use rustyline::completion::Completer;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::Context;
use rustyline::Helper;
use rustyline::{CompletionType, Config, Editor};
use std::path::PathBuf;
use tracing::debug;

/// Commands offered for completion
const COMMANDS: &[&str] = &[
    "/demo",
    "/demos",
    "/validate",
    "/extract",
    "/schema",
    "/config",
    "/model",
    "/help",
    "/quit",
    "/exit",
];

/// Record-Forge command completer
struct RecordForgeCompleter;

impl Completer for RecordForgeCompleter {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &Context<'_>,
    ) -> std::result::Result<(usize, Vec<String>), ReadlineError> {
        Ok((0, complete_command(line)))
    }
}

fn complete_command(line: &str) -> Vec<String> {
    if !line.starts_with('/') || line.contains(char::is_whitespace) {
        return Vec::new();
    }
    COMMANDS
        .iter()
        .filter(|cmd| cmd.starts_with(line))
        .map(|s| s.to_string())
        .collect()
}

impl Hinter for RecordForgeCompleter {
    type Hint = String;
}

impl Highlighter for RecordForgeCompleter {}

impl Validator for RecordForgeCompleter {}

impl Helper for RecordForgeCompleter {}

/// Record-Forge REPL
pub struct Repl {
    /// The rustyline editor
    editor: Editor<RecordForgeCompleter, DefaultHistory>,
    /// Whether the REPL should continue running
    running: bool,
    /// Shared application state
    state: SharedState,
    /// Where history is loaded from and saved to
    history_path: PathBuf,
}

impl Repl {
    /// Create a new REPL instance
    pub fn new(state: SharedState) -> Result<Self> {
        let config = Config::builder()
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .auto_add_history(true)
            .build();

        let mut editor = Editor::<RecordForgeCompleter, DefaultHistory>::with_config(config)
            .map_err(|e| {
                RecordForgeError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Failed to initialize editor: {}", e),
                ))
            })?;

        editor.set_helper(Some(RecordForgeCompleter));

        let history_path = dirs::home_dir()
            .map(|p| p.join(".record-forge").join("history"))
            .unwrap_or_else(|| ".record-forge-history".into());

        if let Err(e) = editor.load_history(&history_path) {
            debug!(error = %e, "no REPL history loaded");
        }

        Ok(Self {
            editor,
            running: true,
            state,
            history_path,
        })
    }

    /// Run the REPL loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        while self.running {
            match self.editor.readline("> ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    match Command::parse(line) {
                        Ok(command) => self.handle_command(command).await,
                        Err(e) => println!("{}", format_error(&e)),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    self.running = false;
                }
                Err(err) => {
                    println!("Error: {:?}", err);
                    self.running = false;
                }
            }
        }

        self.save_history();
        Ok(())
    }

    fn save_history(&mut self) {
        if let Some(parent) = self.history_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = self.editor.save_history(&self.history_path) {
            debug!(error = %e, "could not save REPL history");
        }
    }

    /// Print welcome message
    fn print_welcome(&self) {
        println!();
        println!("Record-Forge v{}", env!("CARGO_PKG_VERSION"));
        println!("Typed records, validated. Structured extraction from text.");
        println!();
        println!("Type /help for available commands, or describe a user in plain text.");
        println!();
    }

    /// Handle a command
    async fn handle_command(&mut self, command: Command) {
        if command.command_type == CommandType::Quit {
            self.running = false;
        }
        match commands::handle_command(&command, self.state.clone()).await {
            Ok(msg) => println!("{}", msg),
            Err(e) => println!("{}", format_error(&e)),
        }
    }
}
