//! Transcript cleanup before persistence.
//!
//! Rules, applied in this order:
//! 1. drop the first message if its content is the start marker
//! 2. drop the last message if its content is the end marker
//! 3. truncate the last assistant message at the first bracketed end token

use formchat_common::{ConversationMarkers, Message};

/// Removes synthetic markers from a transcript in place.
///
/// Only the last assistant message is inspected for the end token, and only
/// the text before its first occurrence is kept (which may be empty).
///
/// # Examples
///
/// ```
/// use formchat::sanitize::sanitize_messages;
/// use formchat_common::{ConversationMarkers, Message};
///
/// let mut messages = vec![
///     Message::user("hello, i want to fill the form"),
///     Message::assistant("Q1?"),
///     Message::user("A1"),
///     Message::assistant("Thanks![END]"),
///     Message::user("finish"),
/// ];
///
/// sanitize_messages(&mut messages, &ConversationMarkers::default());
///
/// assert_eq!(messages, vec![
///     Message::assistant("Q1?"),
///     Message::user("A1"),
///     Message::assistant("Thanks!"),
/// ]);
/// ```
pub fn sanitize_messages(messages: &mut Vec<Message>, markers: &ConversationMarkers) {
    if messages
        .first()
        .is_some_and(|m| m.content == markers.start_message)
    {
        messages.remove(0);
    }

    if messages
        .last()
        .is_some_and(|m| m.content == markers.end_message)
    {
        messages.pop();
    }

    let end_token = markers.bracketed_end_token();
    if let Some(last_assistant) = messages.iter_mut().rev().find(|m| m.is_assistant())
        && let Some(index) = last_assistant.content.find(&end_token)
    {
        last_assistant.content.truncate(index);
    }
}
