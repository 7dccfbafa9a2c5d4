use poise::serenity_prelude::{ChannelId, RoleId, UserId};
use tracing::{debug, warn};

use crate::components::ResponsePayload;
use crate::db::{Database, LogRouteRecord};
use crate::flow::FlowResult;
use crate::interaction::Message;
use crate::platform::Platform;

pub const CONFIG_CHANGE_LOG: &str = "config-change";
pub const COMMAND_ERROR_LOG: &str = "command-error";

/// Every log type a guild can route to its log channel.
pub const LOG_TYPES: &[&str] = &[CONFIG_CHANGE_LOG, COMMAND_ERROR_LOG];

/// Human readable label for a log type, e.g. `config-change` -> `Config change`.
pub fn log_type_label(log_type: &str) -> String {
    let spaced = log_type.replace(['-', '_'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub struct LogService {
    db: Database,
}

impl LogService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn route(&self, guild_id: u64) -> anyhow::Result<Option<LogRouteRecord>> {
        let guild_id = guild_id.to_string();
        self.db
            .run_blocking(move |db| db.find_log_route(&guild_id))
            .await
    }

    pub async fn set_channel(&self, guild_id: u64, channel_id: u64) -> anyhow::Result<()> {
        let guild_id = guild_id.to_string();
        let channel_id = channel_id.to_string();
        self.db
            .run_blocking(move |db| db.set_log_channel(&guild_id, &channel_id))
            .await
    }

    /// `None` enables every log type. Returns zero when the guild has no
    /// log channel yet.
    pub async fn set_enabled_logs(&self, guild_id: u64, logs: Option<Vec<String>>) -> anyhow::Result<usize> {
        let guild_id = guild_id.to_string();
        self.db
            .run_blocking(move |db| db.set_enabled_logs(&guild_id, logs.as_deref()))
            .await
    }

    pub async fn set_mention(&self, guild_id: u64, log_type: &str, role_id: Option<u64>) -> anyhow::Result<usize> {
        let guild_id = guild_id.to_string();
        let log_type = log_type.to_string();
        let role_id = role_id.map(|id| id.to_string());
        self.db
            .run_blocking(move |db| db.set_log_mention(&guild_id, &log_type, role_id.as_deref()))
            .await
    }

    /// Where a `log_type` entry for the guild should go, or `None` when the
    /// guild has no log channel or has that type disabled. `dm_user` also
    /// receives a copy.
    pub async fn sink(
        &self,
        guild_id: u64,
        log_type: &str,
        dm_user: Option<UserId>,
    ) -> anyhow::Result<Option<LogSink>> {
        let Some(route) = self.route(guild_id).await? else {
            debug!("No log channel configured for guild {}", guild_id);
            return Ok(None);
        };
        if let Some(enabled) = &route.logs {
            if !enabled.iter().any(|enabled| enabled == log_type) {
                debug!("Log type {} disabled for guild {}", log_type, guild_id);
                return Ok(None);
            }
        }
        let Some(channel_id) = parse_id(&route.channel_id).map(ChannelId::new) else {
            warn!("Invalid log channel id {:?} for guild {}", route.channel_id, guild_id);
            return Ok(None);
        };
        let mention = route
            .log_mentions
            .get(log_type)
            .and_then(|id| parse_id(id))
            .map(RoleId::new);

        Ok(Some(LogSink {
            channel_id,
            mention,
            dm_user,
        }))
    }
}

fn parse_id(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok().filter(|id| *id != 0)
}

/// A resolved log destination.
#[derive(Debug, Clone, PartialEq)]
pub struct LogSink {
    pub channel_id: ChannelId,
    pub mention: Option<RoleId>,
    pub dm_user: Option<UserId>,
}

/// Outcome of each delivery of one log entry.
#[derive(Debug)]
pub struct LogDelivery {
    pub channel: FlowResult<Message>,
    pub direct: Option<FlowResult<Message>>,
}

impl LogSink {
    /// Posts `payload` to the log channel, pinging the configured role, and
    /// to the DM recipient if any. One failing delivery does not stop the other.
    pub async fn send(&self, platform: &dyn Platform, payload: ResponsePayload) -> LogDelivery {
        let mut channel_payload = payload.clone();
        if let Some(role) = self.mention {
            let content = match channel_payload.content.take() {
                Some(content) if !content.is_empty() => format!("<@&{}> {}", role, content),
                _ => format!("<@&{}>", role),
            };
            channel_payload.content = Some(content);
        }

        let channel = platform.send_channel_message(self.channel_id, channel_payload);
        let (channel, direct) = match self.dm_user {
            Some(user_id) => {
                let (channel, direct) = futures::join!(channel, platform.send_direct_message(user_id, payload));
                (channel, Some(direct))
            }
            None => (channel.await, None),
        };

        if let Err(e) = &channel {
            warn!("Failed to post log to channel {}: {}", self.channel_id, e);
        }
        if let Some(Err(e)) = &direct {
            warn!("Failed to send log copy by DM: {}", e);
        }
        LogDelivery { channel, direct }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test_utils::{Call, MockPlatform};

    fn service() -> LogService {
        let db = Database::new(&Config::for_tests()).unwrap();
        db.execute_init().unwrap();
        LogService::new(db)
    }

    #[test]
    fn test_log_type_label() {
        assert_eq!(log_type_label("config-change"), "Config change");
        assert_eq!(log_type_label("command-error"), "Command error");
        assert_eq!(log_type_label(""), "");
    }

    #[tokio::test]
    async fn test_sink_requires_route_and_enabled_type() {
        let service = service();
        assert!(service.sink(1, "config-change", None).await.unwrap().is_none());

        service.set_channel(1, 77).await.unwrap();
        let sink = service.sink(1, "config-change", None).await.unwrap().unwrap();
        assert_eq!(sink.channel_id, ChannelId::new(77));
        assert_eq!(sink.mention, None);

        service
            .set_enabled_logs(1, Some(vec!["command-error".to_string()]))
            .await
            .unwrap();
        assert!(service.sink(1, "config-change", None).await.unwrap().is_none());
        assert!(service.sink(1, "command-error", None).await.unwrap().is_some());

        service.set_enabled_logs(1, Some(Vec::new())).await.unwrap();
        assert!(service.sink(1, "command-error", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_send_mentions_role_and_copies_to_dm() {
        let service = service();
        service.set_channel(1, 77).await.unwrap();
        service.set_mention(1, "config-change", Some(55)).await.unwrap();
        let platform = MockPlatform::new();

        let sink = service
            .sink(1, "config-change", Some(UserId::new(9)))
            .await
            .unwrap()
            .unwrap();
        let delivery = sink
            .send(&platform, ResponsePayload::new().content("prefix changed"))
            .await;

        assert!(delivery.channel.is_ok());
        assert!(matches!(delivery.direct, Some(Ok(_))));
        let calls = platform.calls();
        assert!(calls.iter().any(|call| matches!(
            call,
            Call::ChannelMessage { channel, payload }
                if channel.get() == 77 && payload.content.as_deref() == Some("<@&55> prefix changed")
        )));
        assert!(calls.iter().any(|call| matches!(
            call,
            Call::DirectMessage { user, payload }
                if user.get() == 9 && payload.content.as_deref() == Some("prefix changed")
        )));
    }

    #[tokio::test]
    async fn test_failed_dm_does_not_block_channel_post() {
        let service = service();
        service.set_channel(1, 77).await.unwrap();
        let platform = MockPlatform::new();
        platform.fail_direct_messages();

        let sink = service
            .sink(1, "command-error", Some(UserId::new(9)))
            .await
            .unwrap()
            .unwrap();
        let delivery = sink.send(&platform, ResponsePayload::new().content("boom")).await;

        assert!(delivery.channel.is_ok());
        assert!(matches!(delivery.direct, Some(Err(_))));
        assert!(matches!(platform.calls()[..], [Call::ChannelMessage { .. }]));
    }
}
