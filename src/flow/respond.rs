use tracing::debug;

use super::FlowResult;
use crate::components::ResponsePayload;
use crate::interaction::{AckState, Interaction, Message};
use crate::platform::Platform;

/// Placeholder content for otherwise empty responses.
pub const BLANK_CONTENT: &str = "** **";

/// Fills every absent field so the response replaces whatever was shown
/// before instead of merging with it.
pub fn normalize_payload(payload: ResponsePayload) -> ResponsePayload {
    let has_attachments = payload.embeds.as_ref().is_some_and(|embeds| !embeds.is_empty())
        || payload.files.as_ref().is_some_and(|files| !files.is_empty())
        || payload.components.as_ref().is_some_and(|rows| !rows.is_empty());
    let content = match payload.content {
        Some(content) if !content.is_empty() => content,
        _ if has_attachments => String::new(),
        _ => BLANK_CONTENT.to_string(),
    };

    ResponsePayload {
        content: Some(content),
        embeds: Some(payload.embeds.unwrap_or_default()),
        files: Some(payload.files.unwrap_or_default()),
        components: Some(payload.components.unwrap_or_default()),
    }
}

/// Shows `payload` for `interaction` using whichever call its
/// acknowledgment state allows: edit after a defer or reply, in-place
/// update for a fresh component activation, ephemeral reply otherwise.
pub async fn respond(
    platform: &dyn Platform,
    interaction: &mut Interaction,
    payload: ResponsePayload,
    reset_payload: bool,
) -> FlowResult<Message> {
    let payload = if reset_payload {
        normalize_payload(payload)
    } else {
        payload
    };

    let message = match interaction.ack {
        AckState::Deferred | AckState::Replied => {
            debug!("Editing reply of interaction {}", interaction.id);
            platform.edit_reply(interaction, payload).await?
        }
        AckState::Unacknowledged if interaction.is_component() => {
            debug!("Updating message for component interaction {}", interaction.id);
            platform.update_message(interaction, payload).await?
        }
        AckState::Unacknowledged => {
            debug!("Replying to interaction {}", interaction.id);
            platform.send_reply(interaction, payload).await?
        }
    };

    interaction.ack = AckState::Replied;
    Ok(message)
}
