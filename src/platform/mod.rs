//! The narrow slice of the messaging platform that flows talk to.

use async_trait::async_trait;
use poise::serenity_prelude::{ChannelId, UserId};
use std::time::Duration;

use crate::components::{Modal, ResponsePayload};
use crate::flow::FlowError;
use crate::interaction::{Interaction, Message};

pub mod discord;

pub use discord::SerenityPlatform;

pub type PlatformResult<T> = Result<T, FlowError>;

/// Raw platform calls. Implementations do not track acknowledgment state;
/// the flow primitives in [`crate::flow`] decide which call is legal.
#[async_trait]
pub trait Platform: Send + Sync {
    /// First, ephemeral reply to a fresh interaction.
    async fn send_reply(&self, interaction: &Interaction, payload: ResponsePayload) -> PlatformResult<Message>;

    /// Edit the original response of a deferred or replied interaction.
    async fn edit_reply(&self, interaction: &Interaction, payload: ResponsePayload) -> PlatformResult<Message>;

    /// Update the message hosting the activated component and return it.
    async fn update_message(&self, interaction: &Interaction, payload: ResponsePayload) -> PlatformResult<Message>;

    async fn fetch_reply(&self, interaction: &Interaction) -> PlatformResult<Message>;

    async fn defer_reply(&self, interaction: &Interaction, ephemeral: bool) -> PlatformResult<()>;

    async fn defer_update(&self, interaction: &Interaction) -> PlatformResult<()>;

    async fn show_modal(&self, interaction: &Interaction, modal: &Modal) -> PlatformResult<()>;

    /// Next component activation on `message` by `user_id`, or `None` once
    /// `timeout` elapses. Activations by other users are skipped.
    async fn await_component(
        &self,
        message: &Message,
        user_id: UserId,
        timeout: Duration,
    ) -> PlatformResult<Option<Interaction>>;

    /// Next submission of the modal `custom_id` by `user_id`, or `None` on timeout.
    async fn await_modal_submit(
        &self,
        custom_id: &str,
        user_id: UserId,
        timeout: Duration,
    ) -> PlatformResult<Option<Interaction>>;

    async fn delete_reply(&self, interaction: &Interaction) -> PlatformResult<()>;

    async fn delete_message(&self, message: &Message) -> PlatformResult<()>;

    /// Ephemeral follow-up message on an acknowledged interaction.
    async fn follow_up(&self, interaction: &Interaction, payload: ResponsePayload) -> PlatformResult<Message>;

    async fn send_channel_message(&self, channel_id: ChannelId, payload: ResponsePayload) -> PlatformResult<Message>;

    async fn send_direct_message(&self, user_id: UserId, payload: ResponsePayload) -> PlatformResult<Message>;
}
