use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

#[derive(Clone, Deserialize)]
pub struct Config {
    pub discord_token: String,
    pub owner_id: Option<u64>,
    pub database_url: String,
    pub status_message: String,
    pub dev_guild_id: Option<u64>,
    pub register_commands: bool,
    /// Enables prefix invocation of text-capable commands when set
    pub command_prefix: Option<String>,
    pub embed_color: u32,
}

const DEFAULT_EMBED_COLOR: u32 = 0x5865F2;

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::build()
    }

    fn build() -> anyhow::Result<Self> {
        Ok(Config {
            discord_token: env::var("DISCORD_TOKEN")
                .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN must be set"))?,
            owner_id: env::var("OWNER_ID").ok().and_then(|id| id.parse().ok()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "data/flowcord.db".to_string()),
            status_message: env::var("STATUS_MESSAGE")
                .unwrap_or_else(|_| "Ready to serve!".to_string()),
            dev_guild_id: env::var("DEV_GUILD_ID").ok().and_then(|id| id.parse().ok()),
            register_commands: env::var("REGISTER_COMMANDS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            command_prefix: env::var("COMMAND_PREFIX")
                .ok()
                .filter(|prefix| !prefix.trim().is_empty()),
            embed_color: env::var("EMBED_COLOR")
                .ok()
                .and_then(|raw| parse_color(&raw))
                .unwrap_or(DEFAULT_EMBED_COLOR),
        })
    }
}

/// Accepts `#5865F2`, `0x5865F2` or bare hex digits.
fn parse_color(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix('#')
        .or_else(|| trimmed.strip_prefix("0x"))
        .unwrap_or(trimmed);
    u32::from_str_radix(digits, 16).ok()
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"[REDACTED]")
            .field("owner_id", &self.owner_id)
            .field("database_url", &self.database_url)
            .field("status_message", &self.status_message)
            .field("dev_guild_id", &self.dev_guild_id)
            .field("register_commands", &self.register_commands)
            .field("command_prefix", &self.command_prefix)
            .field("embed_color", &format_args!("{:#08X}", self.embed_color))
            .finish()
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            discord_token: "test".to_string(),
            owner_id: Some(1),
            database_url: ":memory:".to_string(),
            status_message: "test".to_string(),
            dev_guild_id: None,
            register_commands: false,
            command_prefix: None,
            embed_color: DEFAULT_EMBED_COLOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#5865F2"), Some(0x5865F2));
        assert_eq!(parse_color("0xff0000"), Some(0xFF0000));
        assert_eq!(parse_color("00ff00"), Some(0x00FF00));
        assert_eq!(parse_color("blurple"), None);
    }

    #[test]
    fn test_config_logic() {
        // 1. Test missing vars
        env::remove_var("DISCORD_TOKEN");
        let result = Config::build();
        assert!(result.is_err(), "Should fail when required vars are missing");

        // 2. Test defaults
        env::set_var("DISCORD_TOKEN", "test_token");
        env::remove_var("EMBED_COLOR");
        env::remove_var("COMMAND_PREFIX");
        let config = Config::build().unwrap();
        assert_eq!(config.discord_token, "test_token");
        assert_eq!(config.embed_color, DEFAULT_EMBED_COLOR);
        assert!(config.register_commands);
        assert!(config.command_prefix.is_none());

        // 3. Test debug redaction
        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("test_token"));
        assert!(debug_output.contains("[REDACTED]"));

        // Cleanup
        env::remove_var("DISCORD_TOKEN");
    }
}
