//! In-memory platform for driving flows in tests.
//!
//! [`MockPlatform`] records every outbound call, enforces the
//! acknowledgment rules Discord enforces, and lets a test script the
//! component clicks and modal submissions a user would produce.

use async_trait::async_trait;
use chrono::Utc;
use poise::serenity_prelude::{ChannelId, GuildId, InteractionId, MessageId, UserId};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::components::{Modal, ResponsePayload};
use crate::flow::FlowError;
use crate::interaction::{AckState, Interaction, InteractionKind, Message, ModalField};
use crate::platform::{Platform, PlatformResult};

pub const TEST_GUILD_ID: u64 = 10;
pub const TEST_CHANNEL_ID: u64 = 20;

/// Id of the first message a fresh [`MockPlatform`] creates.
pub const FIRST_MESSAGE_ID: u64 = 1000;

static NEXT_INTERACTION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone)]
pub enum Call {
    SendReply { interaction: InteractionId, payload: ResponsePayload },
    EditReply { interaction: InteractionId, payload: ResponsePayload },
    UpdateMessage { interaction: InteractionId, payload: ResponsePayload },
    FetchReply { interaction: InteractionId },
    DeferReply { interaction: InteractionId, ephemeral: bool },
    DeferUpdate { interaction: InteractionId },
    ShowModal { interaction: InteractionId, modal: Modal },
    DeleteReply { interaction: InteractionId },
    DeleteMessage { message: MessageId },
    FollowUp { interaction: InteractionId, payload: ResponsePayload },
    ChannelMessage { channel: ChannelId, payload: ResponsePayload },
    DirectMessage { user: UserId, payload: ResponsePayload },
}

struct ModalAnswer {
    user_id: Option<UserId>,
    values: Vec<String>,
}

pub struct MockPlatform {
    calls: Mutex<Vec<Call>>,
    replies: Mutex<HashMap<InteractionId, Message>>,
    next_message_id: AtomicU64,
    modal_answers: Mutex<VecDeque<ModalAnswer>>,
    fail_direct_messages: AtomicBool,
    components_tx: mpsc::UnboundedSender<Interaction>,
    components_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Interaction>>,
    modals_tx: mpsc::UnboundedSender<Interaction>,
    modals_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Interaction>>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    pub fn new() -> Self {
        let (components_tx, components_rx) = mpsc::unbounded_channel();
        let (modals_tx, modals_rx) = mpsc::unbounded_channel();
        Self {
            calls: Mutex::new(Vec::new()),
            replies: Mutex::new(HashMap::new()),
            next_message_id: AtomicU64::new(FIRST_MESSAGE_ID),
            modal_answers: Mutex::new(VecDeque::new()),
            fail_direct_messages: AtomicBool::new(false),
            components_tx,
            components_rx: tokio::sync::Mutex::new(components_rx),
            modals_tx,
            modals_rx: tokio::sync::Mutex::new(modals_rx),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Queues a component activation for the next waits.
    pub fn push_component(&self, event: Interaction) {
        let _ = self.components_tx.send(event);
    }

    /// Delivers a component activation once `delay` has passed.
    pub fn push_component_after(&self, delay: Duration, event: Interaction) {
        let tx = self.components_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event);
        });
    }

    /// The next modal shown gets submitted by its own user with `values`,
    /// one per input in order.
    pub fn answer_next_modal(&self, values: &[&str]) {
        self.queue_modal_answer(None, values);
    }

    /// Like [`answer_next_modal`](Self::answer_next_modal), but submitted by `user`.
    pub fn answer_next_modal_as(&self, user: u64, values: &[&str]) {
        self.queue_modal_answer(Some(UserId::new(user)), values);
    }

    fn queue_modal_answer(&self, user_id: Option<UserId>, values: &[&str]) {
        self.modal_answers.lock().unwrap().push_back(ModalAnswer {
            user_id,
            values: values.iter().map(|v| v.to_string()).collect(),
        });
    }

    pub fn fail_direct_messages(&self) {
        self.fail_direct_messages.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn new_message(&self, channel_id: ChannelId, interaction_user: Option<UserId>) -> Message {
        Message {
            id: MessageId::new(self.next_message_id.fetch_add(1, Ordering::SeqCst)),
            channel_id,
            interaction_user,
        }
    }

    fn reply_for(&self, interaction: &Interaction) -> Message {
        self.replies
            .lock()
            .unwrap()
            .entry(interaction.id)
            .or_insert_with(|| self.new_message(interaction.channel_id, Some(interaction.user_id)))
            .clone()
    }

    fn require_fresh(interaction: &Interaction, call: &str) -> PlatformResult<()> {
        if interaction.ack != AckState::Unacknowledged {
            return Err(FlowError::Protocol(format!(
                "{} on interaction {} that was already acknowledged",
                call, interaction.id
            )));
        }
        Ok(())
    }

    fn require_acknowledged(interaction: &Interaction, call: &str) -> PlatformResult<()> {
        if interaction.ack == AckState::Unacknowledged {
            return Err(FlowError::Protocol(format!(
                "{} on interaction {} that was never acknowledged",
                call, interaction.id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn send_reply(&self, interaction: &Interaction, payload: ResponsePayload) -> PlatformResult<Message> {
        Self::require_fresh(interaction, "send_reply")?;
        self.record(Call::SendReply {
            interaction: interaction.id,
            payload,
        });
        Ok(self.reply_for(interaction))
    }

    async fn edit_reply(&self, interaction: &Interaction, payload: ResponsePayload) -> PlatformResult<Message> {
        Self::require_acknowledged(interaction, "edit_reply")?;
        self.record(Call::EditReply {
            interaction: interaction.id,
            payload,
        });
        let existing = self.replies.lock().unwrap().get(&interaction.id).cloned();
        match (existing, interaction.message()) {
            (Some(reply), _) => Ok(reply),
            (None, Some(hosting)) => Ok(hosting.clone()),
            (None, None) => Ok(self.reply_for(interaction)),
        }
    }

    async fn update_message(&self, interaction: &Interaction, payload: ResponsePayload) -> PlatformResult<Message> {
        Self::require_fresh(interaction, "update_message")?;
        let hosting = interaction.message().cloned().ok_or(FlowError::NotAComponent)?;
        self.record(Call::UpdateMessage {
            interaction: interaction.id,
            payload,
        });
        Ok(hosting)
    }

    async fn fetch_reply(&self, interaction: &Interaction) -> PlatformResult<Message> {
        self.record(Call::FetchReply {
            interaction: interaction.id,
        });
        self.replies
            .lock()
            .unwrap()
            .get(&interaction.id)
            .cloned()
            .ok_or_else(|| FlowError::Protocol(format!("interaction {} has no reply", interaction.id)))
    }

    async fn defer_reply(&self, interaction: &Interaction, ephemeral: bool) -> PlatformResult<()> {
        Self::require_fresh(interaction, "defer_reply")?;
        self.record(Call::DeferReply {
            interaction: interaction.id,
            ephemeral,
        });
        self.reply_for(interaction);
        Ok(())
    }

    async fn defer_update(&self, interaction: &Interaction) -> PlatformResult<()> {
        Self::require_fresh(interaction, "defer_update")?;
        self.record(Call::DeferUpdate {
            interaction: interaction.id,
        });
        Ok(())
    }

    async fn show_modal(&self, interaction: &Interaction, modal: &Modal) -> PlatformResult<()> {
        Self::require_fresh(interaction, "show_modal")?;
        self.record(Call::ShowModal {
            interaction: interaction.id,
            modal: modal.clone(),
        });

        let answer = self.modal_answers.lock().unwrap().pop_front();
        if let Some(answer) = answer {
            let fields: Vec<(&str, &str)> = modal
                .inputs
                .iter()
                .zip(answer.values.iter())
                .map(|(input, value)| (input.custom_id.as_str(), value.as_str()))
                .collect();
            let user = answer.user_id.unwrap_or(interaction.user_id);
            let _ = self.modals_tx.send(modal_submit(user.get(), &modal.custom_id, &fields));
        }
        Ok(())
    }

    async fn await_component(
        &self,
        message: &Message,
        user_id: UserId,
        timeout: Duration,
    ) -> PlatformResult<Option<Interaction>> {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut rx = self.components_rx.lock().await;
        loop {
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Some(event)) => {
                    let on_message = event.message().map(|m| m.id) == Some(message.id);
                    if on_message && event.user_id == user_id {
                        return Ok(Some(event));
                    }
                }
                Ok(None) | Err(_) => return Ok(None),
            }
        }
    }

    async fn await_modal_submit(
        &self,
        custom_id: &str,
        user_id: UserId,
        timeout: Duration,
    ) -> PlatformResult<Option<Interaction>> {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut rx = self.modals_rx.lock().await;
        loop {
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Some(event)) => {
                    if event.custom_id() == Some(custom_id) && event.user_id == user_id {
                        return Ok(Some(event));
                    }
                }
                Ok(None) | Err(_) => return Ok(None),
            }
        }
    }

    async fn delete_reply(&self, interaction: &Interaction) -> PlatformResult<()> {
        self.record(Call::DeleteReply {
            interaction: interaction.id,
        });
        Ok(())
    }

    async fn delete_message(&self, message: &Message) -> PlatformResult<()> {
        self.record(Call::DeleteMessage { message: message.id });
        Ok(())
    }

    async fn follow_up(&self, interaction: &Interaction, payload: ResponsePayload) -> PlatformResult<Message> {
        Self::require_acknowledged(interaction, "follow_up")?;
        self.record(Call::FollowUp {
            interaction: interaction.id,
            payload,
        });
        Ok(self.new_message(interaction.channel_id, Some(interaction.user_id)))
    }

    async fn send_channel_message(&self, channel_id: ChannelId, payload: ResponsePayload) -> PlatformResult<Message> {
        self.record(Call::ChannelMessage {
            channel: channel_id,
            payload,
        });
        Ok(self.new_message(channel_id, None))
    }

    async fn send_direct_message(&self, user_id: UserId, payload: ResponsePayload) -> PlatformResult<Message> {
        if self.fail_direct_messages.load(Ordering::SeqCst) {
            return Err(FlowError::Protocol(format!("user {} does not accept direct messages", user_id)));
        }
        self.record(Call::DirectMessage { user: user_id, payload });
        Ok(self.new_message(ChannelId::new(TEST_CHANNEL_ID + user_id.get()), None))
    }
}

fn interaction(user: u64, kind: InteractionKind) -> Interaction {
    let id = NEXT_INTERACTION_ID.fetch_add(1, Ordering::SeqCst);
    Interaction {
        id: InteractionId::new(id),
        token: format!("token-{}", id),
        user_id: UserId::new(user),
        user_tag: format!("user{}", user),
        guild_id: Some(GuildId::new(TEST_GUILD_ID)),
        guild_owner_id: None,
        channel_id: ChannelId::new(TEST_CHANNEL_ID),
        created_at: Utc::now(),
        ack: AckState::Unacknowledged,
        kind,
    }
}

fn hosting_message(user: u64, message_id: u64) -> Message {
    Message {
        id: MessageId::new(message_id),
        channel_id: ChannelId::new(TEST_CHANNEL_ID),
        interaction_user: Some(UserId::new(user)),
    }
}

pub fn command(user: u64, name: &str) -> Interaction {
    interaction(user, InteractionKind::Command { name: name.to_string() })
}

pub fn button_click(user: u64, message_id: u64, custom_id: &str) -> Interaction {
    interaction(
        user,
        InteractionKind::Button {
            custom_id: custom_id.to_string(),
            message: hosting_message(user, message_id),
        },
    )
}

pub fn select(user: u64, message_id: u64, custom_id: &str, values: &[&str]) -> Interaction {
    interaction(
        user,
        InteractionKind::SelectMenu {
            custom_id: custom_id.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
            message: hosting_message(user, message_id),
        },
    )
}

pub fn modal_submit(user: u64, custom_id: &str, fields: &[(&str, &str)]) -> Interaction {
    interaction(
        user,
        InteractionKind::ModalSubmit {
            custom_id: custom_id.to_string(),
            fields: fields
                .iter()
                .map(|(id, value)| ModalField {
                    custom_id: id.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        },
    )
}
