use tracing::{debug, warn};

use super::{respond, FlowError, FlowResult, INPUT_TIMEOUT};
use crate::components::{self, Modal, ModalSpec, ResponsePayload};
use crate::interaction::{AckState, Interaction, ModalField};
use crate::platform::Platform;

/// A submitted modal together with the modal that was shown, so inputs can
/// be read back by position as well as by their generated ids.
#[derive(Debug, Clone)]
pub struct ModalSubmission {
    pub interaction: Interaction,
    pub modal: Modal,
}

impl ModalSubmission {
    pub fn fields(&self) -> &[ModalField] {
        self.interaction.fields().unwrap_or_default()
    }

    pub fn value(&self, custom_id: &str) -> Option<&str> {
        self.fields()
            .iter()
            .find(|field| field.custom_id == custom_id)
            .map(|field| field.value.as_str())
    }

    /// Value of the `index`-th input of the shown modal.
    pub fn value_at(&self, index: usize) -> Option<&str> {
        let input = self.modal.inputs.get(index)?;
        self.value(&input.custom_id)
    }
}

/// Shows a freshly built modal on `parent` and waits for the same user to
/// submit it. With `remove_button`, the parent's components are cleared as
/// soon as the modal is open so the trigger cannot be pressed twice.
/// A command parent has no message of its own, so there is nothing to clear
/// or delete for it.
///
/// Returns `Ok(None)` after [`INPUT_TIMEOUT`], once the parent's reply has
/// been deleted.
pub async fn use_modal(
    platform: &dyn Platform,
    parent: &mut Interaction,
    spec: ModalSpec,
    remove_button: bool,
) -> FlowResult<Option<ModalSubmission>> {
    if parent.ack != AckState::Unacknowledged {
        return Err(FlowError::Protocol(format!(
            "interaction {} was already acknowledged and cannot open a modal",
            parent.id
        )));
    }

    let modal = components::modal(spec);
    platform.show_modal(parent, &modal).await?;
    parent.ack = AckState::Replied;
    debug!("Opened modal {} for user {}", modal.custom_id, parent.user_id);

    let hosts_message = parent.is_component();
    if remove_button && hosts_message {
        respond(platform, parent, ResponsePayload::new(), true).await?;
    }

    match platform
        .await_modal_submit(&modal.custom_id, parent.user_id, INPUT_TIMEOUT)
        .await?
    {
        Some(interaction) => Ok(Some(ModalSubmission { interaction, modal })),
        None => {
            debug!("Modal {} was not submitted before timeout", modal.custom_id);
            if hosts_message {
                if let Err(e) = platform.delete_reply(parent).await {
                    warn!("Failed to remove prompt after modal timeout: {}", e);
                }
            }
            Ok(None)
        }
    }
}
