//! Command handlers for CLI
//!
//! This module implements all `/` commands for the Record-Forge REPL.

use crate::config::{ModelSpec, SharedState};
use crate::demos::{self, Demo, SYSTEM_PROMPT};
use crate::error::{RecordForgeError, Result};
use crate::extract::{Agent, Extractor, ToolCallExtractor};
use crate::schema::{Model, Schema};
use crate::user::User;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

/// Command types
#[derive(Debug, Clone, PartialEq)]
pub enum CommandType {
    /// Run a named demo
    Demo { name: String },
    /// List demos
    Demos,
    /// Validate JSON text as a User
    Validate { json: String },
    /// Extract a User from text with a single tool call
    Extract { text: String },
    /// Show the User schema
    Schema,
    /// Set configuration (API keys)
    Config { provider: String, key: String },
    /// Select a model, as `provider:model` or `provider model`
    Model { spec: String },
    /// Show help message
    Help,
    /// Exit the application
    Quit,
    /// Free text, run through the agent
    Query { text: String },
}

/// Parsed command
#[derive(Debug, Clone)]
pub struct Command {
    /// The type of command
    pub command_type: CommandType,
}

impl Command {
    fn new(command_type: CommandType) -> Self {
        Self { command_type }
    }

    /// Parse a command from user input
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        if !input.starts_with('/') {
            return Ok(Self::new(CommandType::Query {
                text: input.to_string(),
            }));
        }

        let (cmd, rest) = match input.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (input, ""),
        };
        let require = |expected: &str| -> Result<String> {
            if rest.is_empty() {
                Err(RecordForgeError::InvalidCommandSyntax {
                    command: cmd.to_string(),
                    expected: expected.to_string(),
                })
            } else {
                Ok(rest.to_string())
            }
        };

        let command_type = match cmd {
            "/demo" => CommandType::Demo {
                name: require("/demo <name>")?,
            },
            "/demos" => CommandType::Demos,
            "/validate" => CommandType::Validate {
                json: require("/validate <json>")?,
            },
            "/extract" => CommandType::Extract {
                text: require("/extract <text>")?,
            },
            "/schema" => CommandType::Schema,
            "/config" => {
                let args = require("/config <provider> <api_key>")?;
                match args.split_once(char::is_whitespace) {
                    Some((provider, key)) if !key.trim().is_empty() => CommandType::Config {
                        provider: provider.to_string(),
                        key: key.trim().to_string(),
                    },
                    _ => {
                        return Err(RecordForgeError::InvalidCommandSyntax {
                            command: cmd.to_string(),
                            expected: "/config <provider> <api_key>".to_string(),
                        })
                    }
                }
            }
            "/model" => {
                let args = require("/model <provider>:<model>")?;
                let spec = match args.split_once(char::is_whitespace) {
                    Some((provider, model)) => format!("{}:{}", provider, model.trim()),
                    None => args,
                };
                CommandType::Model { spec }
            }
            "/help" => CommandType::Help,
            "/quit" | "/exit" => CommandType::Quit,
            _ => return Err(RecordForgeError::UnknownCommand(cmd.to_string())),
        };

        Ok(Self::new(command_type))
    }
}

/// Handle a command and return the result message
pub async fn handle_command(command: &Command, state: SharedState) -> Result<String> {
    match &command.command_type {
        CommandType::Demo { name } => {
            let demo: Demo = name.parse()?;
            let provider = state.read().await.build_provider();
            demos::run(demo, move || provider).await
        }
        CommandType::Demos => Ok(format_demo_list()),
        CommandType::Validate { json } => {
            let user = User::model_validate_json(json)?;
            Ok(user.to_string())
        }
        CommandType::Extract { text } => {
            let provider = state.read().await.build_provider()?;
            let user = ToolCallExtractor::new(provider)
                .extract::<User>(SYSTEM_PROMPT, text)
                .await?;
            Ok(format!("{:?}", user))
        }
        CommandType::Schema => Ok(format_schema(&User::schema())),
        CommandType::Config { provider, key } => {
            state
                .write()
                .await
                .set_api_key(provider.clone(), key.clone())?;
            Ok(format!(
                "✓ API key configured for provider: {} ({})",
                provider.to_lowercase(),
                mask_key(key)
            ))
        }
        CommandType::Model { spec } => {
            let spec: ModelSpec = spec.parse()?;
            state.write().await.use_model(&spec)?;
            Ok(format!("✓ Using {}:{}", spec.provider, spec.model))
        }
        CommandType::Help => Ok(HELP.to_string()),
        CommandType::Quit => Ok("Goodbye!".to_string()),
        CommandType::Query { text } => {
            let provider = state.read().await.build_provider()?;
            let result = Agent::<_, User>::new(provider)
                .with_system_prompt(SYSTEM_PROMPT)
                .run(text)
                .await?;
            Ok(result.data.to_string())
        }
    }
}

const HELP: &str = r#"
Record-Forge Commands

Validation:
  /validate <json>   Validate JSON as a User, e.g. {"id": "1", "name": "x", "dob": "1987-01-28"}
  /schema            Show the User schema and its JSON Schema export

Demos:
  /demos             List demos
  /demo <name>       Run a demo (literal, invalid, bad-date, openai, agent)

Extraction:
  /extract <text>    Extract a User from text with a single tool call
  Any text without a / prefix is sent to the agent.

Configuration:
  /config <provider> <key>   Set API key for LLM provider
  /model <provider>:<model>  Select a model, e.g. openai:gpt-4o

Session:
  /help              Show this help message
  /quit, /exit       Exit Record-Forge
"#;

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "***".to_string()
    }
}

/// Render a schema's fields as a table followed by its JSON Schema
pub fn format_schema(schema: &Schema) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Field", "Type", "Required", "Description"]);
    for field in schema.fields() {
        table.add_row(vec![
            field.name.clone(),
            field.field_type.as_str().to_string(),
            "yes".to_string(),
            field.description.clone().unwrap_or_default(),
        ]);
    }

    let json_schema = serde_json::to_string_pretty(&schema.json_schema())
        .unwrap_or_else(|e| format!("<unserializable schema: {}>", e));

    let mut out = String::new();
    out.push_str(schema.title());
    if let Some(description) = schema.description() {
        out.push_str(&format!(" - {}", description));
    }
    out.push('\n');
    out.push_str(&table.to_string());
    out.push_str("\n\nJSON Schema:\n");
    out.push_str(&json_schema);
    out
}

/// Render the demo list as a table
pub fn format_demo_list() -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Demo", "Uses LLM", "Description"]);
    for demo in Demo::all() {
        table.add_row(vec![
            demo.name(),
            if demo.needs_provider() { "yes" } else { "no" },
            demo.description(),
        ]);
    }
    table.to_string()
}

/// Format an error for display
pub fn format_error(error: &RecordForgeError) -> String {
    match error {
        RecordForgeError::Validation(err) => err.to_string(),
        other => format!("Error: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppState;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::RwLock;

    fn state() -> SharedState {
        Arc::new(RwLock::new(AppState::ephemeral()))
    }

    #[test]
    fn test_parse_demo_command() {
        let cmd = Command::parse("/demo literal").unwrap();
        assert_eq!(
            cmd.command_type,
            CommandType::Demo {
                name: "literal".to_string()
            }
        );
    }

    #[test]
    fn test_parse_validate_keeps_json_intact() {
        let cmd = Command::parse(r#"/validate {"id": "1", "name": "John Doe"}"#).unwrap();
        assert_eq!(
            cmd.command_type,
            CommandType::Validate {
                json: r#"{"id": "1", "name": "John Doe"}"#.to_string()
            }
        );
    }

    #[test]
    fn test_parse_config_command() {
        let cmd = Command::parse("/config openai sk-test-123").unwrap();
        assert_eq!(
            cmd.command_type,
            CommandType::Config {
                provider: "openai".to_string(),
                key: "sk-test-123".to_string()
            }
        );
    }

    #[test]
    fn test_parse_model_command_forms() {
        let colon = Command::parse("/model openai:gpt-4o").unwrap();
        let spaced = Command::parse("/model openai gpt-4o").unwrap();
        assert_eq!(colon.command_type, spaced.command_type);
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("/schema").unwrap().command_type, CommandType::Schema);
        assert_eq!(Command::parse("/demos").unwrap().command_type, CommandType::Demos);
        assert_eq!(Command::parse("/help").unwrap().command_type, CommandType::Help);
        assert_eq!(Command::parse("/quit").unwrap().command_type, CommandType::Quit);
        assert_eq!(Command::parse("/exit").unwrap().command_type, CommandType::Quit);
    }

    #[test]
    fn test_parse_query() {
        let cmd = Command::parse("The user with ID 7 is Ada").unwrap();
        assert_eq!(
            cmd.command_type,
            CommandType::Query {
                text: "The user with ID 7 is Ada".to_string()
            }
        );
    }

    #[test]
    fn test_parse_invalid_command() {
        assert!(matches!(
            Command::parse("/invalid"),
            Err(RecordForgeError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_parse_missing_args() {
        assert!(Command::parse("/demo").is_err());
        assert!(Command::parse("/validate   ").is_err());
        assert!(Command::parse("/config openai").is_err());
        assert!(Command::parse("/extract").is_err());
    }

    #[tokio::test]
    async fn test_handle_validate() {
        let cmd = Command::parse(r#"/validate {"id": "1", "name": "John Doe", "dob": "1987-01-28"}"#)
            .unwrap();
        let output = handle_command(&cmd, state()).await.unwrap();
        assert_eq!(output, "id=1 name='John Doe' dob=1987-01-28");

        let cmd = Command::parse(r#"/validate {"id": "x", "name": "John Doe", "dob": [1, 2]}"#)
            .unwrap();
        let err = handle_command(&cmd, state()).await.unwrap_err();
        assert!(format_error(&err).starts_with("2 validation errors for User"));
    }

    #[tokio::test]
    async fn test_handle_demo_without_key() {
        let cmd = Command::parse("/demo literal").unwrap();
        assert!(handle_command(&cmd, state()).await.is_ok());

        let cmd = Command::parse("/demo openai").unwrap();
        let err = handle_command(&cmd, state()).await.unwrap_err();
        assert!(matches!(err, RecordForgeError::LLMApiKeyMissing(_)));
    }

    #[tokio::test]
    async fn test_demo_leaves_state_writable_during_request() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());

        let mut app = AppState::ephemeral().with_base_url(endpoint);
        app.set_api_key("openai".to_string(), "sk-test".to_string())
            .unwrap();
        let state = Arc::new(RwLock::new(app));

        let pending = tokio::spawn({
            let state = state.clone();
            async move {
                let cmd = Command::parse("/demo openai").unwrap();
                handle_command(&cmd, state).await
            }
        });

        // Request is in flight once the connection is accepted
        let (_socket, _) = listener.accept().await.unwrap();
        let guard = tokio::time::timeout(Duration::from_secs(2), state.write()).await;
        assert!(guard.is_ok());
        drop(guard);
        pending.abort();
    }

    #[tokio::test]
    async fn test_handle_config_masks_key() {
        let state = state();
        let cmd = Command::parse("/config openai sk-abcdefghijkl").unwrap();
        let output = handle_command(&cmd, state.clone()).await.unwrap();
        assert!(output.contains("sk-a...ijkl"));
        assert_eq!(
            state.read().await.get_api_key("openai"),
            Some(&"sk-abcdefghijkl".to_string())
        );
    }

    #[tokio::test]
    async fn test_handle_model() {
        let state = state();
        let cmd = Command::parse("/model openai:gpt-4o-mini").unwrap();
        handle_command(&cmd, state.clone()).await.unwrap();
        assert_eq!(
            state.read().await.get_model("openai"),
            Some("gpt-4o-mini".to_string())
        );

        let cmd = Command::parse("/model other:thing").unwrap();
        assert!(handle_command(&cmd, state).await.is_err());
    }

    #[test]
    fn test_format_schema() {
        let text = format_schema(&User::schema());
        assert!(text.starts_with("User - Definition of a user"));
        assert!(text.contains("dob"));
        assert!(text.contains("\"format\": \"date\""));
    }

    #[test]
    fn test_format_demo_list() {
        let text = format_demo_list();
        for demo in Demo::all() {
            assert!(text.contains(demo.name()));
        }
    }
}
