use futures::future::BoxFuture;
use poise::serenity_prelude as serenity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::info;

use super::flow_start;
use crate::components::{button_row, Button, ComponentRow, ResponsePayload};
use crate::flow::{respond, FlowSession};
use crate::interaction::Interaction;
use crate::listeners::{GlobalListener, ListenerContext};
use crate::services::ResumeService;
use crate::{Context, Error};

pub const PING_AGAIN_EVENT: &str = "ping-again";

#[derive(Debug, Serialize, Deserialize)]
struct PingContext {
    requested_by: u64,
}

/// Shards report no heartbeat latency until their first heartbeat is acked.
fn pong(latency: Option<Duration>) -> String {
    match latency {
        Some(latency) => format!("🏓 Pong! My latency is currently `{}ms`.", latency.as_millis()),
        None => "🏓 Pong! My latency is not measured yet.".to_string(),
    }
}

/// Poise reports an unknown shard latency as zero.
fn known(latency: Duration) -> Option<Duration> {
    Some(latency).filter(|latency| !latency.is_zero())
}

fn pong_payload(latency: Option<Duration>, again_id: &str) -> ResponsePayload {
    ResponsePayload::new()
        .content(pong(latency))
        .components(vec![button_row(vec![Button::new("Ping again").id(again_id)])])
}

/// Get the bot's latency
#[poise::command(slash_command, prefix_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    info!("Ping requested by user {}", ctx.author().id);
    let latency = known(ctx.ping().await);
    let again_id = ResumeService::new(ctx.data().db.clone())
        .create(
            PING_AGAIN_EVENT,
            &PingContext {
                requested_by: ctx.author().id.get(),
            },
        )
        .await?;
    let payload = pong_payload(latency, &again_id);

    match ctx {
        poise::Context::Application(_) => {
            let (platform, mut interaction) = flow_start(ctx)?;
            respond(&platform, &mut interaction, payload, true).await?;
        }
        poise::Context::Prefix(_) => {
            let rows = payload
                .components
                .unwrap_or_default()
                .iter()
                .map(ComponentRow::to_action_row)
                .collect();
            ctx.send(
                poise::CreateReply::default()
                    .content(pong(latency))
                    .components(rows),
            )
            .await?;
        }
    }
    Ok(())
}

/// Get the bot's latency
#[poise::command(context_menu_command = "Ping")]
pub async fn ping_message(ctx: Context<'_>, _message: serenity::Message) -> Result<(), Error> {
    let latency = known(ctx.ping().await);
    let (platform, mut interaction) = flow_start(ctx)?;
    respond(&platform, &mut interaction, ResponsePayload::new().content(pong(latency)), true).await?;
    Ok(())
}

pub fn ping_again_listener() -> GlobalListener {
    GlobalListener::new(PING_AGAIN_EVENT, ping_again)
}

fn ping_again(ctx: ListenerContext<'_>, interaction: Interaction, context: Value) -> BoxFuture<'_, Result<(), Error>> {
    Box::pin(async move {
        let context: PingContext = serde_json::from_value(context)?;
        let again_id = interaction.custom_id().unwrap_or_default().to_string();
        info!(
            "Ping again by user {} (first asked by {})",
            interaction.user_id, context.requested_by
        );

        let mut flow = FlowSession::new(ctx.platform, interaction);
        flow.respond(pong_payload(ctx.latency, &again_id)).await?;
        Ok(())
    })
}
