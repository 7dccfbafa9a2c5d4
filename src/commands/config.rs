use tracing::info;

use super::flow_start;
use crate::components::ResponsePayload;
use crate::embeds::{error_embed, reply_embed, success_embed};
use crate::flow::{FlowIdentity, FlowSession};
use crate::interaction::Interaction;
use crate::platform::Platform;
use crate::services::{ConfigService, LogService, CONFIG_CHANGE_LOG};
use crate::{Context, Data, Error};

const MAX_KEY_CHARS: usize = 64;

/// Server owners and the bot owner may touch settings.
fn may_configure(identity: &FlowIdentity, data: &Data) -> bool {
    identity.is_guild_owner() || data.config.owner_id == Some(identity.user_id.get())
}

fn normalize_key(key: &str) -> Option<String> {
    let key = key.trim();
    if key.is_empty() || key.chars().count() > MAX_KEY_CHARS {
        return None;
    }
    Some(key.to_lowercase())
}

/// Read or change server settings
#[poise::command(slash_command, subcommands("get", "set"), subcommand_required, guild_only)]
pub async fn config(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Show a server setting
#[poise::command(slash_command, guild_only)]
pub async fn get(ctx: Context<'_>, #[description = "Setting name"] key: String) -> Result<(), Error> {
    let (platform, interaction) = flow_start(ctx)?;
    run_get(&platform, ctx.data(), interaction, &key).await
}

/// Change a server setting (true/false, a number, or text)
#[poise::command(slash_command, guild_only)]
pub async fn set(
    ctx: Context<'_>,
    #[description = "Setting name"] key: String,
    #[description = "New value"] value: String,
) -> Result<(), Error> {
    let (platform, interaction) = flow_start(ctx)?;
    run_set(&platform, ctx.data(), interaction, &key, &value).await
}

/// Opens the session and answers with an error when the user may not
/// configure the server or the key is unusable.
async fn authorize<'p>(
    platform: &'p dyn Platform,
    data: &Data,
    interaction: Interaction,
    key: &str,
) -> Result<Option<(FlowSession<'p>, u64, String)>, Error> {
    let mut flow = FlowSession::new(platform, interaction);
    let color = data.config.embed_color;
    let guild_id = flow
        .identity()
        .guild_id
        .ok_or("This command only works in a server")?
        .get();

    if !may_configure(flow.identity(), data) {
        flow.respond(ResponsePayload::new().embed(error_embed(color, "Only the server owner can manage settings.")))
            .await?;
        return Ok(None);
    }
    let Some(key) = normalize_key(key) else {
        flow.respond(ResponsePayload::new().embed(error_embed(
            color,
            &format!("Setting names must be 1 to {} characters long.", MAX_KEY_CHARS),
        )))
        .await?;
        return Ok(None);
    };
    Ok(Some((flow, guild_id, key)))
}

pub async fn run_get(platform: &dyn Platform, data: &Data, interaction: Interaction, key: &str) -> Result<(), Error> {
    let Some((mut flow, guild_id, key)) = authorize(platform, data, interaction, key).await? else {
        return Ok(());
    };
    let color = data.config.embed_color;

    let embed = match ConfigService::new(data.db.clone()).get_one(guild_id, &key).await? {
        Some(value) => reply_embed(color, &format!("`{}` is `{}` ({})", key, value, value.type_name())),
        None => error_embed(color, &format!("`{}` is not set.", key)),
    };
    flow.respond(ResponsePayload::new().embed(embed)).await?;
    Ok(())
}

pub async fn run_set(
    platform: &dyn Platform,
    data: &Data,
    interaction: Interaction,
    key: &str,
    raw_value: &str,
) -> Result<(), Error> {
    let Some((mut flow, guild_id, key)) = authorize(platform, data, interaction, key).await? else {
        return Ok(());
    };
    let color = data.config.embed_color;
    let value = ConfigService::parse_value(raw_value);

    flow.defer().await?;
    ConfigService::new(data.db.clone())
        .set(guild_id, vec![(key.clone(), value.clone())])
        .await?;
    info!("Guild {} set {} = {} by user {}", guild_id, key, value, flow.identity().user_id);

    flow.respond(ResponsePayload::new().embed(success_embed(
        color,
        &format!("Set `{}` to `{}` ({}).", key, value, value.type_name()),
    )))
    .await?;

    if let Some(sink) = LogService::new(data.db.clone())
        .sink(guild_id, CONFIG_CHANGE_LOG, None)
        .await?
    {
        let entry = reply_embed(
            color,
            &format!("<@{}> set `{}` to `{}`.", flow.identity().user_id, key, value),
        );
        sink.send(platform, ResponsePayload::new().embed(entry)).await;
    }
    Ok(())
}
