//! Command implementations for the CLI.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use formchat::store::ConversationStore;
use formchat::{
    ConversationMarkers, ConversationService, FormFieldData, Message, NextQuestion, QuestionStream,
};
use formchat_cli::{CliError, FileStore};

use crate::display::{
    display_assistant_header, display_message, display_record, display_record_summary,
};

/// Reads JSON from a file, or from stdin when `path` is `-`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?
    };

    serde_json::from_str(&contents).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Asks for the next question and prints it.
pub async fn next(service: &ConversationService, messages: &[Message], stream: bool) -> Result<()> {
    match service.get_next_question(messages, stream).await? {
        NextQuestion::Streaming(fragments) => {
            display_assistant_header();
            write_fragments(fragments, &mut std::io::stdout()).await?;
        }
        NextQuestion::Response(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }
    Ok(())
}

/// Copies streamed text to `out` as it arrives and ends it with a newline.
async fn write_fragments<W: Write>(mut fragments: QuestionStream, out: &mut W) -> Result<()> {
    while let Some(fragment) = fragments.next().await {
        out.write_all(fragment?.as_bytes())?;
        out.flush()?;
    }
    writeln!(out)?;
    Ok(())
}

/// Extracts and prints the field data of a conversation.
pub async fn extract(service: &ConversationService, messages: &[Message]) -> Result<()> {
    let data = service.get_form_fields_data_from_conversation(messages).await?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

/// Generates and prints a conversation name.
pub async fn name(service: &ConversationService, data: &FormFieldData) -> Result<()> {
    let name = service.generate_conversation_name(data).await?;
    println!("{name}");
    Ok(())
}

/// Saves a conversation and prints the new record id.
pub async fn save(service: &ConversationService, messages: Vec<Message>) -> Result<()> {
    let record = service.save_conversation(messages).await?;
    println!(
        "{} {} {}",
        "Saved".bright_green(),
        record.id,
        format!("({})", record.name).bright_black()
    );
    Ok(())
}

/// Prints a sanitized transcript, as JSON unless `pretty` is set.
pub fn sanitize(
    markers: &ConversationMarkers,
    mut messages: Vec<Message>,
    pretty: bool,
) -> Result<()> {
    formchat::sanitize::sanitize_messages(&mut messages, markers);

    if pretty {
        for message in &messages {
            display_message(message);
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&messages)?);
    }
    Ok(())
}

/// Lists stored conversations.
pub async fn list(store: &FileStore) -> Result<()> {
    let records = store.list().await?;

    if records.is_empty() {
        println!("{}", "No saved conversations".bright_black());
        return Ok(());
    }

    for record in &records {
        display_record_summary(record);
    }
    Ok(())
}

/// Shows one stored conversation.
pub async fn show(store: &FileStore, id: &str, json: bool) -> Result<()> {
    let id = Uuid::parse_str(id).map_err(|_| CliError::InvalidConversationId(id.to_string()))?;
    let record = store.get(id).await.map_err(CliError::from)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        display_record(&record);
    }
    Ok(())
}
