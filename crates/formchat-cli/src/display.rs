//! Display utilities for CLI output formatting

use colored::Colorize;
use formchat::{ConversationRecord, Message, MessageRole};

/// Display assistant response header
///
/// Goes to stderr so the streamed text on stdout can be piped as is.
pub fn display_assistant_header() {
    eprintln!("{}", "Assistant:".bright_green().bold());
}

/// Display a single transcript message with a role label
pub fn display_message(message: &Message) {
    let label = format!("{:>9}", message.role.to_string());
    let label = match message.role {
        MessageRole::System => label.bright_black(),
        MessageRole::User => label.bright_cyan(),
        MessageRole::Assistant => label.bright_green(),
    };
    println!("{} {}", label.bold(), message.content);
}

/// One-line summary used by `list`
pub fn display_record_summary(record: &ConversationRecord) {
    println!(
        "{} {} {} ({} messages)",
        record.id.to_string().bright_blue(),
        record.created_at.format("%Y-%m-%d %H:%M").to_string().bright_black(),
        record.name.bold(),
        record.transcript.len()
    );
}

/// Full record used by `show`
pub fn display_record(record: &ConversationRecord) {
    println!("{} {}", "Name:".bold(), record.name);
    println!("{} {}", "Id:".bold(), record.id);
    println!("{} {}", "Form:".bold(), record.form_id);
    println!("{} {}", "Created:".bold(), record.created_at.to_rfc3339());

    println!("\n{}", "Fields".bright_blue().bold());
    for (key, value) in &record.form_fields_data {
        println!("  {}: {value}", key.bright_cyan());
    }

    println!("\n{}", "Transcript".bright_blue().bold());
    for message in &record.transcript {
        display_message(message);
    }
}
