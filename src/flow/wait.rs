use std::time::Duration;
use tracing::{debug, warn};

use super::{FlowError, FlowResult};
use crate::interaction::{Interaction, Message};
use crate::platform::Platform;

/// How long a prompt waits for its user before it is torn down.
pub const INPUT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// What a component wait is anchored to. Decides which message is watched,
/// which user may answer, and how the prompt is removed on timeout.
#[derive(Debug, Clone, Copy)]
pub enum WaitOrigin<'a> {
    /// A button or select activation; waits on the message that hosted it.
    Component(&'a Interaction),
    /// The fetched reply to a command invocation.
    CommandReply {
        reply: &'a Message,
        command: &'a Interaction,
    },
    /// A message sent outside any tracked interaction.
    Message(&'a Message),
}

impl<'a> WaitOrigin<'a> {
    fn target(&self) -> FlowResult<(&'a Message, poise::serenity_prelude::UserId)> {
        match *self {
            WaitOrigin::Component(interaction) => {
                let message = interaction.message().ok_or(FlowError::NotAComponent)?;
                Ok((message, interaction.user_id))
            }
            WaitOrigin::CommandReply { reply, command } => {
                Ok((reply, reply.interaction_user.unwrap_or(command.user_id)))
            }
            WaitOrigin::Message(message) => {
                let user_id = message
                    .interaction_user
                    .ok_or(FlowError::UnknownAuthor(message.id))?;
                Ok((message, user_id))
            }
        }
    }

    async fn clean_up(&self, platform: &dyn Platform) {
        let result = match *self {
            WaitOrigin::Component(interaction) => platform.delete_reply(interaction).await,
            WaitOrigin::CommandReply { command, .. } => platform.delete_reply(command).await,
            WaitOrigin::Message(message) => platform.delete_message(message).await,
        };
        if let Err(e) = result {
            warn!("Failed to remove timed out prompt: {}", e);
        }
    }
}

/// Waits for the originating user to activate a component on the origin's
/// message. Returns `Ok(None)` after [`INPUT_TIMEOUT`], once the prompt has
/// been removed.
pub async fn await_component(platform: &dyn Platform, origin: WaitOrigin<'_>) -> FlowResult<Option<Interaction>> {
    let (message, user_id) = origin.target()?;
    debug!("Waiting for input from user {} on message {}", user_id, message.id);

    match platform.await_component(message, user_id, INPUT_TIMEOUT).await? {
        Some(interaction) => Ok(Some(interaction)),
        None => {
            debug!("No input on message {} before timeout", message.id);
            origin.clean_up(platform).await;
            Ok(None)
        }
    }
}
