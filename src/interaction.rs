//! Platform-neutral view of inbound interactions.
//!
//! Serenity hands us three unrelated structs (commands, components, modal
//! submissions). Flows only care about a handful of facts, so they are
//! folded into one [`Interaction`] with an explicit [`InteractionKind`] tag.
//! Discord does not report whether an interaction was already acknowledged,
//! so [`AckState`] is tracked here as responses are sent.

use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;
use serenity::{ChannelId, GuildId, InteractionId, MessageId, UserId};

/// Which platform call is legal next for an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckState {
    #[default]
    Unacknowledged,
    Deferred,
    Replied,
}

/// Coarse interaction type exposed to flow authors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionType {
    Command,
    Button,
    SelectMenu,
    ModalSubmit,
}

/// A message that hosts components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub channel_id: ChannelId,
    /// User whose interaction produced this message
    pub interaction_user: Option<UserId>,
}

impl Message {
    pub fn from_serenity(message: &serenity::Message) -> Self {
        Self {
            id: message.id,
            channel_id: message.channel_id,
            interaction_user: interaction_user(message),
        }
    }
}

/// Reads the interaction metadata first; older payloads only carry the
/// deprecated `interaction` field.
fn interaction_user(message: &serenity::Message) -> Option<UserId> {
    let from_metadata = message.interaction_metadata.as_deref().and_then(|meta| match meta {
        serenity::MessageInteractionMetadata::Command(meta) => Some(meta.user.id),
        serenity::MessageInteractionMetadata::Component(meta) => Some(meta.user.id),
        serenity::MessageInteractionMetadata::ModalSubmit(meta) => Some(meta.user.id),
        _ => None,
    });
    #[allow(deprecated)]
    let legacy = message.interaction.as_ref().map(|meta| meta.user.id);
    from_metadata.or(legacy)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalField {
    pub custom_id: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InteractionKind {
    Command {
        name: String,
    },
    Button {
        custom_id: String,
        message: Message,
    },
    SelectMenu {
        custom_id: String,
        values: Vec<String>,
        message: Message,
    },
    ModalSubmit {
        custom_id: String,
        fields: Vec<ModalField>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub id: InteractionId,
    pub token: String,
    pub user_id: UserId,
    pub user_tag: String,
    pub guild_id: Option<GuildId>,
    pub guild_owner_id: Option<UserId>,
    pub channel_id: ChannelId,
    pub created_at: DateTime<Utc>,
    pub ack: AckState,
    pub kind: InteractionKind,
}

impl Interaction {
    pub fn interaction_type(&self) -> InteractionType {
        match self.kind {
            InteractionKind::Command { .. } => InteractionType::Command,
            InteractionKind::Button { .. } => InteractionType::Button,
            InteractionKind::SelectMenu { .. } => InteractionType::SelectMenu,
            InteractionKind::ModalSubmit { .. } => InteractionType::ModalSubmit,
        }
    }

    /// True for button clicks and select submissions.
    pub fn is_component(&self) -> bool {
        matches!(
            self.kind,
            InteractionKind::Button { .. } | InteractionKind::SelectMenu { .. }
        )
    }

    pub fn custom_id(&self) -> Option<&str> {
        match &self.kind {
            InteractionKind::Command { .. } => None,
            InteractionKind::Button { custom_id, .. }
            | InteractionKind::SelectMenu { custom_id, .. }
            | InteractionKind::ModalSubmit { custom_id, .. } => Some(custom_id),
        }
    }

    pub fn command_name(&self) -> Option<&str> {
        match &self.kind {
            InteractionKind::Command { name } => Some(name),
            _ => None,
        }
    }

    /// Selected values; empty for anything but a select menu.
    pub fn values(&self) -> &[String] {
        match &self.kind {
            InteractionKind::SelectMenu { values, .. } => values,
            _ => &[],
        }
    }

    pub fn fields(&self) -> Option<&[ModalField]> {
        match &self.kind {
            InteractionKind::ModalSubmit { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// The message hosting the activated component.
    pub fn message(&self) -> Option<&Message> {
        match &self.kind {
            InteractionKind::Button { message, .. } | InteractionKind::SelectMenu { message, .. } => {
                Some(message)
            }
            _ => None,
        }
    }

    pub fn is_deferred(&self) -> bool {
        self.ack == AckState::Deferred
    }

    pub fn is_replied(&self) -> bool {
        self.ack == AckState::Replied
    }

    pub fn from_command(command: &serenity::CommandInteraction, guild_owner_id: Option<UserId>) -> Self {
        Self {
            id: command.id,
            token: command.token.clone(),
            user_id: command.user.id,
            user_tag: command.user.tag(),
            guild_id: command.guild_id,
            guild_owner_id,
            channel_id: command.channel_id,
            created_at: created_at(command.id),
            ack: AckState::Unacknowledged,
            kind: InteractionKind::Command {
                name: command.data.name.clone(),
            },
        }
    }

    pub fn from_component(component: &serenity::ComponentInteraction, guild_owner_id: Option<UserId>) -> Self {
        use serenity::ComponentInteractionDataKind as Kind;

        let custom_id = component.data.custom_id.clone();
        let message = Message::from_serenity(&component.message);
        let values = match &component.data.kind {
            Kind::Button => None,
            Kind::StringSelect { values } => Some(values.clone()),
            Kind::UserSelect { values } => Some(values.iter().map(ToString::to_string).collect()),
            Kind::RoleSelect { values } => Some(values.iter().map(ToString::to_string).collect()),
            Kind::ChannelSelect { values } => Some(values.iter().map(ToString::to_string).collect()),
            Kind::MentionableSelect { values } => Some(values.iter().map(ToString::to_string).collect()),
            _ => None,
        };
        let kind = match values {
            Some(values) => InteractionKind::SelectMenu {
                custom_id,
                values,
                message,
            },
            None => InteractionKind::Button { custom_id, message },
        };

        Self {
            id: component.id,
            token: component.token.clone(),
            user_id: component.user.id,
            user_tag: component.user.tag(),
            guild_id: component.guild_id,
            guild_owner_id,
            channel_id: component.channel_id,
            created_at: created_at(component.id),
            ack: AckState::Unacknowledged,
            kind,
        }
    }

    pub fn from_modal(modal: &serenity::ModalInteraction, guild_owner_id: Option<UserId>) -> Self {
        let fields = modal
            .data
            .components
            .iter()
            .flat_map(|row| row.components.iter())
            .filter_map(|component| match component {
                serenity::ActionRowComponent::InputText(input) => Some(ModalField {
                    custom_id: input.custom_id.clone(),
                    value: input.value.clone().unwrap_or_default(),
                }),
                _ => None,
            })
            .collect();

        Self {
            id: modal.id,
            token: modal.token.clone(),
            user_id: modal.user.id,
            user_tag: modal.user.tag(),
            guild_id: modal.guild_id,
            guild_owner_id,
            channel_id: modal.channel_id,
            created_at: created_at(modal.id),
            ack: AckState::Unacknowledged,
            kind: InteractionKind::ModalSubmit {
                custom_id: modal.data.custom_id.clone(),
                fields,
            },
        }
    }
}

fn created_at(id: InteractionId) -> DateTime<Utc> {
    DateTime::from_timestamp(id.created_at().unix_timestamp(), 0).unwrap_or_else(Utc::now)
}
