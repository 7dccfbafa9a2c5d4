pub mod config;
pub mod logging_channel;
pub mod ping;

use crate::interaction::Interaction;
use crate::listeners::ListenerRegistry;
use crate::platform::SerenityPlatform;
use crate::{Context, Data, Error};

/// Every command the bot registers.
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        ping::ping(),
        ping::ping_message(),
        logging_channel::logging_channel(),
        config::config(),
    ]
}

/// Every listener for durable components.
pub fn listeners() -> ListenerRegistry {
    ListenerRegistry::new(vec![ping::ping_again_listener()])
}

/// Platform handle and flow interaction for an application command.
/// Prefix invocations have no interaction to drive a flow with.
pub fn flow_start(ctx: Context<'_>) -> Result<(SerenityPlatform, Interaction), Error> {
    match ctx {
        poise::Context::Application(app) => {
            let platform = SerenityPlatform::new(ctx.serenity_context());
            let interaction = platform.interaction_from_command(app.interaction);
            Ok((platform, interaction))
        }
        poise::Context::Prefix(_) => Err("This command can only be used as a slash command".into()),
    }
}
