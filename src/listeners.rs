//! Handlers for components that outlive the flow that sent them.
//!
//! A durable component's custom id is the id of a resume record. When such
//! a component fires, the record names the listener to run and carries the
//! context it needs.

use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::interaction::{Interaction, InteractionKind};
use crate::platform::Platform;
use crate::services::ResumeService;
use crate::{Data, Error};

/// What a listener gets to work with besides the interaction itself.
#[derive(Clone, Copy)]
pub struct ListenerContext<'a> {
    pub platform: &'a dyn Platform,
    pub data: &'a Data,
    /// Gateway latency of the shard that received the event
    pub latency: Option<Duration>,
}

pub type ListenerHandler = for<'a> fn(ListenerContext<'a>, Interaction, Value) -> BoxFuture<'a, Result<(), Error>>;

pub struct GlobalListener {
    pub name: String,
    pub handler: ListenerHandler,
}

impl GlobalListener {
    pub fn new(name: impl Into<String>, handler: ListenerHandler) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

/// Listeners by event name. Built once at startup.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: HashMap<String, ListenerHandler>,
}

impl ListenerRegistry {
    pub fn new(listeners: Vec<GlobalListener>) -> Self {
        Self {
            listeners: listeners
                .into_iter()
                .map(|listener| (listener.name, listener.handler))
                .collect(),
        }
    }

    /// Runs the listener recorded for a button or select activation.
    /// Returns `false` when the activation is not a durable component or
    /// no listener is registered for its event.
    pub async fn dispatch(&self, ctx: ListenerContext<'_>, interaction: Interaction) -> Result<bool, Error> {
        let custom_id = match &interaction.kind {
            InteractionKind::Button { custom_id, .. } | InteractionKind::SelectMenu { custom_id, .. } => {
                custom_id.clone()
            }
            InteractionKind::Command { .. } | InteractionKind::ModalSubmit { .. } => return Ok(false),
        };

        let resume = ResumeService::new(ctx.data.db.clone());
        let Some((event, context)) = resume.consume(&custom_id).await? else {
            debug!("No resume record for component {}", custom_id);
            return Ok(false);
        };
        let Some(handler) = self.listeners.get(&event) else {
            debug!("No listener registered for event {}", event);
            return Ok(false);
        };

        info!("Resuming event {} for user {}", event, interaction.user_id);
        handler(ctx, interaction, context).await?;
        Ok(true)
    }
}
