// Record-Forge: typed record validation and structured extraction
//
// This is the main entry point for the Record-Forge application.

use anyhow::Result;
use clap::{Parser, Subcommand};
use record_forge::cli::commands::{format_demo_list, format_error, format_schema};
use record_forge::cli::Repl;
use record_forge::config::{AppState, ModelSpec};
use record_forge::demos::{self, Demo};
use record_forge::schema::Model;
use record_forge::user::User;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "record-forge", version, about = "Validate typed records and extract them from text")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Model to use for extraction, as provider:model
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a named demo
    Demo {
        /// literal, invalid, bad-date, openai or agent
        name: String,
    },
    /// List available demos
    Demos,
    /// Validate JSON text as a User
    Validate {
        /// JSON object with id, name and dob
        json: String,
    },
    /// Print the User schema
    Schema,
    /// Start the interactive REPL (default)
    Repl,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("record_forge={}", default_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut state = AppState::new();
    if let Some(model) = &cli.model {
        let spec: ModelSpec = model.parse()?;
        state.select_model(&spec)?;
    }

    match cli.command.unwrap_or(Commands::Repl) {
        Commands::Demo { name } => {
            let demo: Demo = name.parse()?;
            match demos::run(demo, || state.build_provider()).await {
                Ok(output) => println!("{}", output),
                Err(e) => {
                    eprintln!("{}", format_error(&e));
                    std::process::exit(1);
                }
            }
        }
        Commands::Demos => println!("{}", format_demo_list()),
        Commands::Validate { json } => match User::model_validate_json(&json) {
            Ok(user) => println!("{}", user),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        },
        Commands::Schema => println!("{}", format_schema(&User::schema())),
        Commands::Repl => {
            let mut repl = Repl::new(Arc::new(RwLock::new(state)))?;
            repl.run().await?;
        }
    }

    Ok(())
}
