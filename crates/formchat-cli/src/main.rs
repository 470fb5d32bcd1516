//! formchat - drive form-filling conversations from the command line
//!
//! Every command reads the form definition and message history from JSON
//! files, so a host application (or a shell script) owns the conversation
//! state and calls in for each step.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use formchat::{ConversationService, Form, FormFieldData, Message, OpenAIClient};
use formchat_cli::{AppConfig, FileStore};

mod commands;
mod display;

#[derive(Parser, Debug)]
#[command(name = "formchat", author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (default: ~/.config/formchat/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model to use, overriding the configuration
    #[arg(long, global = true)]
    model: Option<String>,

    /// Base URL for the API endpoint, overriding the configuration
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask the model for the next question of the conversation
    Next {
        /// Form definition (JSON)
        #[arg(long)]
        form: PathBuf,
        /// Message history (JSON array), `-` for stdin
        #[arg(long)]
        messages: PathBuf,
        /// Print the full response instead of streaming the text
        #[arg(long)]
        no_stream: bool,
    },
    /// Extract the form field data from a finished conversation
    Extract {
        /// Form definition (JSON)
        #[arg(long)]
        form: PathBuf,
        /// Message history (JSON array), `-` for stdin
        #[arg(long)]
        messages: PathBuf,
    },
    /// Generate a display name from extracted field data
    Name {
        /// Form definition (JSON)
        #[arg(long)]
        form: PathBuf,
        /// Field data (JSON object), `-` for stdin
        #[arg(long)]
        data: PathBuf,
    },
    /// Extract, name, sanitize and store a finished conversation
    Save {
        /// Form definition (JSON)
        #[arg(long)]
        form: PathBuf,
        /// Message history (JSON array), `-` for stdin
        #[arg(long)]
        messages: PathBuf,
    },
    /// Strip the conversation markers from a transcript (no network access)
    Sanitize {
        /// Message history (JSON array), `-` for stdin
        #[arg(long)]
        messages: PathBuf,
        /// Print a readable transcript instead of JSON
        #[arg(long)]
        pretty: bool,
    },
    /// List saved conversations
    List,
    /// Show a saved conversation
    Show {
        /// Conversation id
        id: String,
        /// Print the raw record as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Initializes the tracing subscriber.
///
/// `FORMCHAT_LOG_FORMAT=json` selects JSON output; anything else is pretty.
/// Output goes to stderr so command results on stdout stay pipeable.
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let format = std::env::var("FORMCHAT_LOG_FORMAT")
        .unwrap_or_else(|_| "pretty".to_string())
        .to_lowercase();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("formchat=info,formchat_cli=info"));

    match format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .init();
        }
        _ => {
            fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .init();
        }
    }
}

/// Loads the configuration and applies command-line overrides.
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref())?;

    if let Some(model) = &cli.model {
        config.model.model.clone_from(model);
    }
    if let Some(base_url) = &cli.base_url {
        config.model.base_url = Some(base_url.clone());
    }
    config.validate()?;

    Ok(config)
}

fn open_store(config: &AppConfig) -> Result<FileStore> {
    let data_dir = config.data_dir()?;
    FileStore::new(&data_dir)
        .with_context(|| format!("Failed to open storage at {}", data_dir.display()))
}

/// Builds a conversation service for the form at `form_path`.
fn build_service(config: &AppConfig, form_path: &Path) -> Result<ConversationService> {
    let form: Form = commands::read_json(form_path)?;
    let client = OpenAIClient::new(config.client_config()?)?;
    let store = open_store(config)?;

    tracing::info!(
        form_id = %form.id,
        form = %form.name,
        model = %config.model.model,
        "Conversation service ready"
    );

    Ok(
        ConversationService::new(Arc::new(form), Arc::new(client), Arc::new(store))
            .with_markers(config.markers.clone()),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Next {
            form,
            messages,
            no_stream,
        } => {
            let service = build_service(&config, &form)?;
            let messages: Vec<Message> = commands::read_json(&messages)?;
            commands::next(&service, &messages, !no_stream).await?;
        }
        Commands::Extract { form, messages } => {
            let service = build_service(&config, &form)?;
            let messages: Vec<Message> = commands::read_json(&messages)?;
            commands::extract(&service, &messages).await?;
        }
        Commands::Name { form, data } => {
            let service = build_service(&config, &form)?;
            let data: FormFieldData = commands::read_json(&data)?;
            commands::name(&service, &data).await?;
        }
        Commands::Save { form, messages } => {
            let service = build_service(&config, &form)?;
            let messages: Vec<Message> = commands::read_json(&messages)?;
            commands::save(&service, messages).await?;
        }
        Commands::Sanitize { messages, pretty } => {
            let messages: Vec<Message> = commands::read_json(&messages)?;
            commands::sanitize(&config.markers, messages, pretty)?;
        }
        Commands::List => {
            let store = open_store(&config)?;
            commands::list(&store).await?;
        }
        Commands::Show { id, json } => {
            let store = open_store(&config)?;
            commands::show(&store, &id, json).await?;
        }
    }

    Ok(())
}
