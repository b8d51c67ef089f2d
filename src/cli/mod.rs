//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod connectivity;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::warn;

use crate::cli::connectivity::run_connectivity_test;
use crate::core::app::session::api_key_from_env;
use crate::core::app::{SessionContext, SessionOverrides};
use crate::core::config::{Config, ConfigKey};
use crate::core::constants::API_KEY_ENV_VARS;
use crate::ui::chat_loop::run_chat;
use crate::ui::theme::Theme;
use crate::utils::logging::init_file_logging;

#[derive(Parser)]
#[command(name = "sidenote")]
#[command(version)]
#[command(about = "A terminal chat client with highlight-to-explain side chats")]
#[command(
    long_about = "Sidenote is a full-screen terminal chat interface for OpenAI-compatible APIs \
(Gemini by default). Replies stream in and are revealed character by character. Highlight \
any text in the transcript with the mouse and press Ctrl+Shift+E to open a side chat that \
explains it, without disturbing the main conversation.\n\n\
Environment Variables:\n\
  GOOGLE_GENERATIVE_AI_API_KEY   API key (preferred)\n\
  OPENAI_API_KEY                 API key (fallback)\n\
  SIDENOTE_BASE_URL              Custom API base URL\n\
  SIDENOTE_LOG                   Log filter when logging to a file (default sidenote=info)\n\n\
Controls:\n\
  Enter                  Send the message\n\
  Alt+Enter/Shift+Enter  Insert a newline\n\
  Ctrl+Shift+E           Explain the highlighted text in a side chat\n\
  Tab                    Switch between the main and side inputs\n\
  Esc                    Stop the reply / close the side chat\n\
  F2                     Toggle the dark and light themes\n\
  PageUp/PageDown/Mouse  Scroll through chat history\n\
  Ctrl+C                 Quit the application"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for chat
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// OpenAI-compatible API root, e.g. https://api.openai.com/v1
    #[arg(short = 'b', long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Write diagnostic logs to the specified file
    #[arg(short = 'l', long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send a short prompt to check that the API is reachable
    Test,
    /// Show the current configuration
    Config,
    /// Set a configuration value
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set for the key (can be multiple words)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        value: Vec<String>,
    },
    /// Unset a configuration value
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let mut config = Config::load()?;

    if let Some(path) = args.log_file.as_ref().or(config.log_file.as_ref()) {
        if let Err(err) = init_file_logging(path) {
            eprintln!("⚠️  Could not open log file {}: {err}", path.display());
        }
    }

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Config => {
            config.print_all();
            Ok(())
        }
        Commands::Set { key, value } => {
            let key: ConfigKey = key.parse()?;
            let value = value.join(" ");
            config.set(key, &value)?;
            config.save()?;
            println!("✅ Set {key} to: {value}");
            Ok(())
        }
        Commands::Unset { key } => {
            let key: ConfigKey = key.parse()?;
            config.unset(key);
            config.save()?;
            println!("✅ Unset {key}");
            Ok(())
        }
        Commands::Test => {
            let session = resolve_session(&config, args.model, args.base_url)?;
            run_connectivity_test(session).await
        }
        Commands::Chat => {
            let session = resolve_session(&config, args.model, args.base_url)?;
            run_chat(session, Theme::for_kind(config.theme())).await
        }
    }
}

fn resolve_session(
    config: &Config,
    model: Option<String>,
    base_url: Option<String>,
) -> Result<SessionContext, Box<dyn Error>> {
    let Some(api_key) = api_key_from_env() else {
        warn!("no API key found in the environment");
        eprintln!("{}", missing_api_key_message());
        std::process::exit(1);
    };
    let session = SessionContext::resolve(config, SessionOverrides { model, base_url }, api_key)?;
    Ok(session)
}

fn missing_api_key_message() -> String {
    format!(
        "❌ No API key found.\n\n\
Set one of these environment variables:\n  {}\n\n\
For example:\n  export {}=\"your-api-key-here\"\n\n\
Optionally point at another OpenAI-compatible API:\n  sidenote set base-url https://api.openai.com/v1",
        API_KEY_ENV_VARS.join("\n  "),
        API_KEY_ENV_VARS[0],
    )
}
