use flowcord::components::ResponsePayload;
use flowcord::config::Config;
use flowcord::db::Database;
use flowcord::embeds::error_embed;
use flowcord::flow::FlowError;
use flowcord::listeners::ListenerContext;
use flowcord::platform::SerenityPlatform;
use flowcord::services::{LogService, COMMAND_ERROR_LOG};
use flowcord::{commands, Context, Data, Error};
use poise::serenity_prelude as serenity;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Sends a failed command to the guild's log channel when one is routed.
async fn report_command_error(ctx: Context<'_>, error: &Error) {
    let Some(guild_id) = ctx.guild_id() else {
        return;
    };
    let sink = match LogService::new(ctx.data().db.clone())
        .sink(guild_id.get(), COMMAND_ERROR_LOG, None)
        .await
    {
        Ok(Some(sink)) => sink,
        Ok(None) => return,
        Err(e) => {
            warn!("Failed to look up log route for guild {}: {}", guild_id, e);
            return;
        }
    };
    let platform = SerenityPlatform::new(ctx.serenity_context());
    let entry = error_embed(
        ctx.data().config.embed_color,
        &format!(
            "`/{}` failed for <@{}>: {}",
            ctx.command().qualified_name,
            ctx.author().id,
            error
        ),
    );
    sink.send(&platform, ResponsePayload::new().embed(entry)).await;
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            if error.downcast_ref::<FlowError>().is_some_and(FlowError::is_abandoned) {
                debug!("`{}` flow for user {} was abandoned", ctx.command().name, ctx.author().id);
                return;
            }
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
            report_command_error(ctx, &error).await;
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e)
            }
        }
    }
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::InteractionCreate {
        interaction: serenity::Interaction::Component(component),
    } = event
    {
        let latency = framework
            .shard_manager()
            .runners
            .lock()
            .await
            .get(&ctx.shard_id)
            .and_then(|runner| runner.latency);
        let platform = SerenityPlatform::new(ctx);
        let listener_ctx = ListenerContext {
            platform: &platform,
            data,
            latency,
        };
        let interaction = platform.interaction_from_component(component);
        if let Err(e) = data.listeners.dispatch(listener_ctx, interaction).await {
            error!("Listener for component {} failed: {:?}", component.data.custom_id, e);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    info!("Loaded configuration: {:?}", config);
    let discord_token = config.discord_token.clone();

    let db = Database::new(&config)?;
    db.execute_init()?;

    let mut intents = serenity::GatewayIntents::non_privileged();
    if config.command_prefix.is_some() {
        intents |= serenity::GatewayIntents::MESSAGE_CONTENT;
    }

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: config.command_prefix.clone(),
                ..Default::default()
            },
            owners: config
                .owner_id
                .map(|id| HashSet::from([serenity::UserId::new(id)]))
                .unwrap_or_default(),
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| Box::pin(event_handler(ctx, event, framework, data)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                if config.register_commands {
                    match config.dev_guild_id {
                        Some(guild_id) => {
                            poise::builtins::register_in_guild(
                                ctx,
                                &framework.options().commands,
                                serenity::GuildId::new(guild_id),
                            )
                            .await?;
                            info!("Registered commands in guild {}", guild_id);
                        }
                        None => {
                            poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                            info!("Registered commands globally");
                        }
                    }
                }

                ctx.set_activity(Some(serenity::ActivityData::custom(&config.status_message)));

                Ok(Data::new(config, db))
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&discord_token, intents)
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    info!("Starting bot...");
    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }

    Ok(())
}
