use tracing::debug;

use super::FlowResult;
use crate::interaction::{AckState, Interaction, InteractionKind};
use crate::platform::Platform;

/// Acknowledges `interaction` without content. Commands (or any
/// interaction when `force_reply` is set) get an ephemeral deferred reply;
/// component and modal interactions get a deferred update of their message.
///
/// Discord only accepts this within a few seconds of the interaction.
pub async fn defer(platform: &dyn Platform, interaction: &mut Interaction, force_reply: bool) -> FlowResult<()> {
    let is_command = matches!(interaction.kind, InteractionKind::Command { .. });
    if is_command || force_reply {
        debug!("Deferring reply for interaction {}", interaction.id);
        platform.defer_reply(interaction, true).await?;
    } else {
        debug!("Deferring update for interaction {}", interaction.id);
        platform.defer_update(interaction).await?;
    }
    interaction.ack = AckState::Deferred;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{button_click, command, Call, MockPlatform};

    #[tokio::test]
    async fn test_command_defers_ephemeral_reply() {
        let platform = MockPlatform::new();
        let mut interaction = command(1, "ping");

        defer(&platform, &mut interaction, false).await.unwrap();

        assert!(interaction.is_deferred());
        assert!(matches!(platform.calls()[..], [Call::DeferReply { ephemeral: true, .. }]));
    }

    #[tokio::test]
    async fn test_component_defers_update_unless_forced() {
        let platform = MockPlatform::new();
        let mut click = button_click(1, 7, "go");
        defer(&platform, &mut click, false).await.unwrap();
        assert!(matches!(platform.calls()[..], [Call::DeferUpdate { .. }]));

        let platform = MockPlatform::new();
        let mut click = button_click(1, 7, "go");
        defer(&platform, &mut click, true).await.unwrap();
        assert!(matches!(platform.calls()[..], [Call::DeferReply { .. }]));
    }

    #[tokio::test]
    async fn test_deferring_twice_is_a_protocol_error() {
        let platform = MockPlatform::new();
        let mut interaction = command(1, "ping");
        defer(&platform, &mut interaction, false).await.unwrap();

        let err = defer(&platform, &mut interaction, false).await.unwrap_err();
        assert!(matches!(err, crate::flow::FlowError::Protocol(_)));
    }
}
