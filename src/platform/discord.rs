use ::serenity::builder::Builder;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use serenity::{
    ChannelId, ComponentInteractionCollector, CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, CreateMessage, EditInteractionResponse, ModalInteractionCollector, UserId,
};
use std::time::Duration;
use tracing::debug;

use super::{Platform, PlatformResult};
use crate::components::{ComponentRow, Modal, ResponsePayload};
use crate::interaction::{Interaction, Message};

fn action_rows(rows: &[ComponentRow]) -> Vec<serenity::CreateActionRow> {
    rows.iter().map(ComponentRow::to_action_row).collect()
}

fn response_message(payload: ResponsePayload) -> CreateInteractionResponseMessage {
    let mut message = CreateInteractionResponseMessage::new();
    if let Some(content) = payload.content {
        message = message.content(content);
    }
    if let Some(embeds) = payload.embeds {
        message = message.embeds(embeds);
    }
    if let Some(files) = payload.files {
        message = message.add_files(files);
    }
    if let Some(rows) = payload.components {
        message = message.components(action_rows(&rows));
    }
    message
}

fn edit_response(payload: ResponsePayload) -> EditInteractionResponse {
    let mut edit = EditInteractionResponse::new();
    if let Some(content) = payload.content {
        edit = edit.content(content);
    }
    if let Some(embeds) = payload.embeds {
        edit = edit.embeds(embeds);
    }
    if let Some(files) = payload.files {
        edit = edit.clear_attachments();
        for file in files {
            edit = edit.new_attachment(file);
        }
    }
    if let Some(rows) = payload.components {
        edit = edit.components(action_rows(&rows));
    }
    edit
}

fn follow_up_message(payload: ResponsePayload) -> CreateInteractionResponseFollowup {
    let mut message = CreateInteractionResponseFollowup::new().ephemeral(true);
    if let Some(content) = payload.content {
        message = message.content(content);
    }
    if let Some(embeds) = payload.embeds {
        message = message.embeds(embeds);
    }
    if let Some(files) = payload.files {
        message = message.add_files(files);
    }
    if let Some(rows) = payload.components {
        message = message.components(action_rows(&rows));
    }
    message
}

fn create_message(payload: ResponsePayload) -> CreateMessage {
    let mut message = CreateMessage::new();
    if let Some(content) = payload.content {
        message = message.content(content);
    }
    if let Some(embeds) = payload.embeds {
        message = message.embeds(embeds);
    }
    if let Some(files) = payload.files {
        message = message.add_files(files);
    }
    if let Some(rows) = payload.components {
        message = message.components(action_rows(&rows));
    }
    message
}

/// [`Platform`] backed by a live serenity client.
#[derive(Clone)]
pub struct SerenityPlatform {
    ctx: serenity::Context,
}

impl SerenityPlatform {
    pub fn new(ctx: &serenity::Context) -> Self {
        Self { ctx: ctx.clone() }
    }

    fn guild_owner(&self, guild_id: Option<serenity::GuildId>) -> Option<UserId> {
        guild_id
            .and_then(|id| id.to_guild_cached(&self.ctx.cache).map(|guild| guild.owner_id))
    }

    pub fn interaction_from_command(&self, command: &serenity::CommandInteraction) -> Interaction {
        Interaction::from_command(command, self.guild_owner(command.guild_id))
    }

    pub fn interaction_from_component(&self, component: &serenity::ComponentInteraction) -> Interaction {
        Interaction::from_component(component, self.guild_owner(component.guild_id))
    }

    pub fn interaction_from_modal(&self, modal: &serenity::ModalInteraction) -> Interaction {
        Interaction::from_modal(modal, self.guild_owner(modal.guild_id))
    }

    async fn original_response(&self, interaction: &Interaction) -> PlatformResult<Message> {
        let message = self
            .ctx
            .http
            .get_original_interaction_response(&interaction.token)
            .await?;
        Ok(Message::from_serenity(&message))
    }

    async fn create_response(
        &self,
        interaction: &Interaction,
        response: CreateInteractionResponse,
    ) -> PlatformResult<()> {
        response
            .execute(&self.ctx, (interaction.id, interaction.token.as_str()))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Platform for SerenityPlatform {
    async fn send_reply(&self, interaction: &Interaction, payload: ResponsePayload) -> PlatformResult<Message> {
        let message = response_message(payload).ephemeral(true);
        self.create_response(interaction, CreateInteractionResponse::Message(message))
            .await?;
        self.original_response(interaction).await
    }

    async fn edit_reply(&self, interaction: &Interaction, payload: ResponsePayload) -> PlatformResult<Message> {
        let message = edit_response(payload)
            .execute(&self.ctx, &interaction.token)
            .await?;
        Ok(Message::from_serenity(&message))
    }

    async fn update_message(&self, interaction: &Interaction, payload: ResponsePayload) -> PlatformResult<Message> {
        self.create_response(interaction, CreateInteractionResponse::UpdateMessage(response_message(payload)))
            .await?;
        self.original_response(interaction).await
    }

    async fn fetch_reply(&self, interaction: &Interaction) -> PlatformResult<Message> {
        self.original_response(interaction).await
    }

    async fn defer_reply(&self, interaction: &Interaction, ephemeral: bool) -> PlatformResult<()> {
        let message = CreateInteractionResponseMessage::new().ephemeral(ephemeral);
        self.create_response(interaction, CreateInteractionResponse::Defer(message))
            .await
    }

    async fn defer_update(&self, interaction: &Interaction) -> PlatformResult<()> {
        self.create_response(interaction, CreateInteractionResponse::Acknowledge)
            .await
    }

    async fn show_modal(&self, interaction: &Interaction, modal: &Modal) -> PlatformResult<()> {
        self.create_response(interaction, CreateInteractionResponse::Modal(modal.to_create_modal()))
            .await
    }

    async fn await_component(
        &self,
        message: &Message,
        user_id: UserId,
        timeout: Duration,
    ) -> PlatformResult<Option<Interaction>> {
        let activation = ComponentInteractionCollector::new(&self.ctx)
            .message_id(message.id)
            .author_id(user_id)
            .timeout(timeout)
            .await;
        Ok(activation.map(|component| self.interaction_from_component(&component)))
    }

    async fn await_modal_submit(
        &self,
        custom_id: &str,
        user_id: UserId,
        timeout: Duration,
    ) -> PlatformResult<Option<Interaction>> {
        let custom_id = custom_id.to_string();
        let submission = ModalInteractionCollector::new(&self.ctx)
            .author_id(user_id)
            .filter(move |modal| modal.data.custom_id == custom_id)
            .timeout(timeout)
            .await;
        Ok(submission.map(|modal| self.interaction_from_modal(&modal)))
    }

    async fn delete_reply(&self, interaction: &Interaction) -> PlatformResult<()> {
        debug!("Deleting reply of interaction {}", interaction.id);
        self.ctx
            .http
            .delete_original_interaction_response(&interaction.token)
            .await?;
        Ok(())
    }

    async fn delete_message(&self, message: &Message) -> PlatformResult<()> {
        debug!("Deleting message {} in channel {}", message.id, message.channel_id);
        message
            .channel_id
            .delete_message(&self.ctx.http, message.id)
            .await?;
        Ok(())
    }

    async fn follow_up(&self, interaction: &Interaction, payload: ResponsePayload) -> PlatformResult<Message> {
        let message = follow_up_message(payload)
            .execute(&self.ctx, (None, interaction.token.as_str()))
            .await?;
        Ok(Message::from_serenity(&message))
    }

    async fn send_channel_message(&self, channel_id: ChannelId, payload: ResponsePayload) -> PlatformResult<Message> {
        let message = channel_id
            .send_message(&self.ctx.http, create_message(payload))
            .await?;
        Ok(Message::from_serenity(&message))
    }

    async fn send_direct_message(&self, user_id: UserId, payload: ResponsePayload) -> PlatformResult<Message> {
        let message = user_id.direct_message(&self.ctx, create_message(payload)).await?;
        Ok(Message::from_serenity(&message))
    }
}
