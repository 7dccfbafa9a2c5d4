use poise::serenity_prelude as serenity;
use tracing::{debug, info};

use super::flow_start;
use crate::components::{button_row, select_row, Button, ResponsePayload, SelectMenu, SelectOption};
use crate::db::LogRouteRecord;
use crate::embeds::{error_embed, success_embed};
use crate::flow::FlowSession;
use crate::interaction::Interaction;
use crate::platform::Platform;
use crate::services::{log_type_label, LogService, LOG_TYPES};
use crate::{Context, Data, Error};

pub const SET_BUTTON_ID: &str = "set";
pub const TOGGLE_BUTTON_ID: &str = "toggle-logs";
pub const LOG_TYPES_MENU_ID: &str = "log-types";

fn bullet_list(logs: &[String]) -> String {
    logs.iter()
        .map(|log| format!("- {}", log_type_label(log)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn describe_route(route: &LogRouteRecord) -> String {
    let logs = match &route.logs {
        None => "All logs are enabled.".to_string(),
        Some(logs) if logs.is_empty() => "Logs are disabled.".to_string(),
        Some(logs) => format!("The following logs are enabled:\n{}", bullet_list(logs)),
    };
    format!("The current logging channel is <#{}>.\n\n{}", route.channel_id, logs)
}

/// Configure the logging channel
#[poise::command(slash_command, rename = "logging-channel", guild_only)]
pub async fn logging_channel(ctx: Context<'_>) -> Result<(), Error> {
    let (platform, interaction) = flow_start(ctx)?;
    run(&platform, ctx.data(), interaction).await
}

pub async fn run(platform: &dyn Platform, data: &Data, interaction: Interaction) -> Result<(), Error> {
    let mut flow = FlowSession::new(platform, interaction);
    let guild_id = flow
        .identity()
        .guild_id
        .ok_or("This command only works in a server")?
        .get();
    let color = data.config.embed_color;
    let logs = LogService::new(data.db.clone());
    let route = logs.route(guild_id).await?;

    let embed = match &route {
        Some(route) => success_embed(color, &describe_route(route)),
        None => error_embed(color, "No logging channel is set for this server!"),
    };
    let mut buttons = vec![Button::new("Set logging channel").id(SET_BUTTON_ID)];
    if route.is_some() {
        buttons.push(Button::new("Toggle logs").id(TOGGLE_BUTTON_ID));
    }
    flow.respond(ResponsePayload::new().embed(embed).components(vec![button_row(buttons)]))
        .await?;
    flow.on_input().await?;

    let action = flow.current_custom_id().map(str::to_string);
    match action.as_deref() {
        Some(SET_BUTTON_ID) => {
            let current = route.map(|route| vec![route.channel_id]).unwrap_or_default();
            let menu = SelectMenu::channel("Select a channel", vec![serenity::ChannelType::Text])
                .default_values(current);
            flow.respond(ResponsePayload::new().components(vec![select_row(menu)]))
                .await?;
            flow.on_input().await?;

            let Some(channel_id) = flow.current_values().first().and_then(|id| id.parse::<u64>().ok()) else {
                debug!("Channel select for guild {} came back empty", guild_id);
                return Ok(());
            };
            let (saved, deferred) = tokio::join!(logs.set_channel(guild_id, channel_id), flow.defer());
            deferred?;
            saved?;
            info!("Guild {} now logs to channel {}", guild_id, channel_id);

            flow.respond(ResponsePayload::new().embed(success_embed(
                color,
                &format!("Successfully set the logging channel to <#{}>!", channel_id),
            )))
            .await?;
        }
        Some(TOGGLE_BUTTON_ID) => {
            let stored = route.and_then(|route| route.logs);
            let all_enabled = stored.is_none();
            let enabled = stored.unwrap_or_else(|| LOG_TYPES.iter().map(|t| t.to_string()).collect());
            let options = LOG_TYPES
                .iter()
                .map(|log_type| SelectOption::new(log_type_label(log_type), *log_type))
                .collect();
            let menu = SelectMenu::string("Select logs to enable", options)
                .id(LOG_TYPES_MENU_ID)
                .min_values(0)
                .max_values(LOG_TYPES.len() as u8)
                .default_values(enabled.clone());

            let selected = flow.use_menus(vec![menu], vec![enabled]).await?;
            // Stay on "every type" so types added later start enabled too
            let keeps_all = all_enabled && LOG_TYPES.iter().all(|t| selected.iter().any(|s| s == t));
            let logs_to_store = if keeps_all { None } else { Some(selected.clone()) };
            logs.set_enabled_logs(guild_id, logs_to_store).await?;
            info!("Guild {} enabled logs {:?}", guild_id, selected);

            let message = if keeps_all {
                "All logs are enabled.".to_string()
            } else if selected.is_empty() {
                "Logs are now disabled.".to_string()
            } else {
                format!("Enabled logs are now as follows:\n\n{}", bullet_list(&selected))
            };
            flow.respond(ResponsePayload::new().embed(success_embed(color, &message)))
                .await?;
        }
        other => debug!("Ignoring logging-channel action {:?}", other),
    }
    Ok(())
}
