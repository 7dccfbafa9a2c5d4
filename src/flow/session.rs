use chrono::{DateTime, Utc};
use poise::serenity_prelude::{ChannelId, GuildId, UserId};
use tracing::debug;

use super::{await_component, defer, respond, use_modal, FlowError, FlowResult, ModalSubmission, WaitOrigin};
use crate::components::{
    button_row, select_row, Button, ButtonStyle, ModalSpec, ResponsePayload, SelectMenu, SUBMIT_BUTTON_ID,
};
use crate::interaction::{AckState, Interaction, InteractionKind, InteractionType, Message, ModalField};
use crate::platform::Platform;

/// Facts about the interaction that opened the flow. They never change,
/// however many steps the conversation takes.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowIdentity {
    pub user_id: UserId,
    pub user_tag: String,
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub guild_owner_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    /// Set when the flow was opened by a command
    pub command_name: Option<String>,
    /// Set when the flow was opened by a button
    pub custom_id: Option<String>,
}

impl FlowIdentity {
    fn capture(interaction: &Interaction) -> Self {
        Self {
            user_id: interaction.user_id,
            user_tag: interaction.user_tag.clone(),
            guild_id: interaction.guild_id,
            channel_id: interaction.channel_id,
            guild_owner_id: interaction.guild_owner_id,
            created_at: interaction.created_at,
            command_name: interaction.command_name().map(str::to_string),
            custom_id: match &interaction.kind {
                InteractionKind::Button { custom_id, .. } => Some(custom_id.clone()),
                _ => None,
            },
        }
    }

    /// True when the flow's user owns the guild it runs in.
    pub fn is_guild_owner(&self) -> bool {
        self.guild_owner_id == Some(self.user_id)
    }
}

/// One conversation with one user, driven by the handler that owns it.
///
/// The session tracks the latest interaction (replaced after every
/// successful [`on_input`](Self::on_input)) and the latest modal
/// submission, and routes responses to whichever of the two can still take
/// them. `S` is flow-specific state carried between steps.
pub struct FlowSession<'p, S = ()> {
    platform: &'p dyn Platform,
    identity: FlowIdentity,
    current: Interaction,
    modal: Option<Interaction>,
    state: S,
}

impl<'p> FlowSession<'p, ()> {
    pub fn new(platform: &'p dyn Platform, interaction: Interaction) -> Self {
        Self::with_state(platform, interaction, ())
    }
}

impl<'p, S> FlowSession<'p, S> {
    pub fn with_state(platform: &'p dyn Platform, interaction: Interaction, state: S) -> Self {
        Self {
            platform,
            identity: FlowIdentity::capture(&interaction),
            current: interaction,
            modal: None,
            state,
        }
    }

    pub async fn respond(&mut self, payload: ResponsePayload) -> FlowResult<Message> {
        self.respond_with(payload, true).await
    }

    /// Responds through the pending modal submission until it has been
    /// replied to, and through the current interaction afterwards.
    pub async fn respond_with(&mut self, payload: ResponsePayload, reset_payload: bool) -> FlowResult<Message> {
        let platform = self.platform;
        let target = match &mut self.modal {
            Some(modal) if modal.ack != AckState::Replied => modal,
            _ => &mut self.current,
        };
        respond(platform, target, payload, reset_payload).await
    }

    pub async fn defer(&mut self) -> FlowResult<()> {
        self.defer_with(false).await
    }

    /// Defers the pending modal submission if it was not acknowledged yet,
    /// otherwise the current interaction.
    pub async fn defer_with(&mut self, force_reply: bool) -> FlowResult<()> {
        let platform = self.platform;
        let target = match &mut self.modal {
            Some(modal) if modal.ack == AckState::Unacknowledged => modal,
            _ => &mut self.current,
        };
        defer(platform, target, force_reply).await
    }

    /// Waits for the user to activate a component on the current
    /// interaction's message and makes that activation current.
    ///
    /// A timeout removes the prompt and yields [`FlowError::Abandoned`].
    pub async fn on_input(&mut self) -> FlowResult<&Interaction> {
        let next = match &self.current.kind {
            InteractionKind::Command { .. } => {
                let reply = self.platform.fetch_reply(&self.current).await?;
                let origin = WaitOrigin::CommandReply {
                    reply: &reply,
                    command: &self.current,
                };
                await_component(self.platform, origin).await?
            }
            InteractionKind::Button { .. } | InteractionKind::SelectMenu { .. } => {
                await_component(self.platform, WaitOrigin::Component(&self.current)).await?
            }
            InteractionKind::ModalSubmit { .. } => return Err(FlowError::NotAComponent),
        };
        self.advance(next)
    }

    /// Like [`on_input`](Self::on_input), but waits on `message` instead of
    /// the current interaction's message.
    pub async fn on_input_from(&mut self, message: &Message) -> FlowResult<&Interaction> {
        let next = await_component(self.platform, WaitOrigin::Message(message)).await?;
        self.advance(next)
    }

    fn advance(&mut self, next: Option<Interaction>) -> FlowResult<&Interaction> {
        let next = next.ok_or(FlowError::Abandoned)?;
        debug!(
            "Flow for user {} advanced to {:?} {}",
            self.identity.user_id,
            next.interaction_type(),
            next.custom_id().unwrap_or_default()
        );
        self.current = next;
        Ok(&self.current)
    }

    pub async fn use_modal(&mut self, spec: ModalSpec) -> FlowResult<ModalSubmission> {
        self.use_modal_with(spec, true).await
    }

    /// Opens a modal on the current interaction. The submission becomes the
    /// target of the next `respond`/`defer`.
    pub async fn use_modal_with(&mut self, spec: ModalSpec, remove_button: bool) -> FlowResult<ModalSubmission> {
        let submission = use_modal(self.platform, &mut self.current, spec, remove_button)
            .await?
            .ok_or(FlowError::Abandoned)?;
        self.modal = Some(submission.interaction.clone());
        Ok(submission)
    }

    /// Shows `menus` with a submit button and collects selections until the
    /// user submits. Returns every selected value once, in order of first
    /// appearance. Submitting right away returns the flattened `seeds`.
    pub async fn use_menus(&mut self, menus: Vec<SelectMenu>, seeds: Vec<Vec<String>>) -> FlowResult<Vec<String>> {
        Ok(self.menu_loop(menus, seeds, true).await?.merged)
    }

    /// Same loop as [`use_menus`](Self::use_menus), keeping one value list
    /// per menu.
    pub async fn use_menus_by_row(
        &mut self,
        menus: Vec<SelectMenu>,
        seeds: Vec<Vec<String>>,
    ) -> FlowResult<Vec<Vec<String>>> {
        Ok(self.menu_loop(menus, seeds, true).await?.per_row)
    }

    /// [`use_menus`](Self::use_menus) with control over payload reset. Without
    /// a reset, content and embeds already on the message stay in place.
    pub async fn use_menus_with(
        &mut self,
        menus: Vec<SelectMenu>,
        seeds: Vec<Vec<String>>,
        reset_payload: bool,
    ) -> FlowResult<Vec<String>> {
        Ok(self.menu_loop(menus, seeds, reset_payload).await?.merged)
    }

    async fn menu_loop(
        &mut self,
        menus: Vec<SelectMenu>,
        seeds: Vec<Vec<String>>,
        reset_payload: bool,
    ) -> FlowResult<MenuSelection> {
        let menu_ids: Vec<String> = menus.iter().map(|menu| menu.custom_id.clone()).collect();
        let mut rows: Vec<_> = menus.into_iter().map(select_row).collect();
        rows.push(button_row(vec![Button::new("Submit")
            .id(SUBMIT_BUTTON_ID)
            .style(ButtonStyle::Primary)]));
        self.respond_with(ResponsePayload::new().components(rows), reset_payload)
            .await?;

        let mut selection = MenuSelection::seeded(seeds, menu_ids.len());
        loop {
            self.on_input().await?;
            self.defer().await?;

            match &self.current.kind {
                InteractionKind::Button { custom_id, .. } if custom_id == SUBMIT_BUTTON_ID => break,
                InteractionKind::SelectMenu { custom_id, values, .. } => {
                    match menu_ids.iter().position(|id| id == custom_id) {
                        Some(index) => selection.record(index, values.clone()),
                        None => debug!("Ignoring unknown select menu {}", custom_id),
                    }
                }
                other => debug!("Ignoring activation {:?} while collecting menus", other),
            }
        }
        Ok(selection)
    }

    /// Sends an ephemeral follow-up on the current interaction.
    pub async fn follow_up(&self, payload: ResponsePayload) -> FlowResult<Message> {
        self.platform.follow_up(&self.current, payload).await
    }

    pub fn current_custom_id(&self) -> Option<&str> {
        self.current.custom_id()
    }

    pub fn current_values(&self) -> &[String] {
        self.current.values()
    }

    /// Fields of the latest modal submission.
    pub fn current_fields(&self) -> Option<&[ModalField]> {
        self.modal.as_ref().and_then(Interaction::fields)
    }

    pub fn current_type(&self) -> InteractionType {
        self.current.interaction_type()
    }

    pub fn current(&self) -> &Interaction {
        &self.current
    }

    pub fn identity(&self) -> &FlowIdentity {
        &self.identity
    }

    pub fn platform(&self) -> &'p dyn Platform {
        self.platform
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }
}

struct MenuSelection {
    per_row: Vec<Vec<String>>,
    merged: Vec<String>,
}

impl MenuSelection {
    fn seeded(mut seeds: Vec<Vec<String>>, rows: usize) -> Self {
        let merged = seeds.iter().flatten().cloned().collect();
        if seeds.len() < rows {
            seeds.resize(rows, Vec::new());
        }
        Self { per_row: seeds, merged }
    }

    fn record(&mut self, index: usize, values: Vec<String>) {
        self.per_row[index] = values;
        let mut merged: Vec<String> = Vec::new();
        for value in self.per_row.iter().flatten() {
            if !merged.contains(value) {
                merged.push(value.clone());
            }
        }
        self.merged = merged;
    }
}
