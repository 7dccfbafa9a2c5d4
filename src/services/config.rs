use crate::db::{ConfigValue, Database};
use std::collections::HashMap;

/// Per-guild typed settings.
pub struct ConfigService {
    db: Database,
}

impl ConfigService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Values for the requested keys; keys that were never set are absent.
    pub async fn get(&self, guild_id: u64, keys: &[&str]) -> anyhow::Result<HashMap<String, ConfigValue>> {
        let guild_id = guild_id.to_string();
        let keys: Vec<String> = keys.iter().map(|key| key.to_string()).collect();
        self.db
            .run_blocking(move |db| db.get_config(&guild_id, &keys))
            .await
    }

    pub async fn get_one(&self, guild_id: u64, key: &str) -> anyhow::Result<Option<ConfigValue>> {
        Ok(self.get(guild_id, &[key]).await?.remove(key))
    }

    pub async fn set(&self, guild_id: u64, entries: Vec<(String, ConfigValue)>) -> anyhow::Result<()> {
        let guild_id = guild_id.to_string();
        self.db
            .run_blocking(move |db| db.set_config(&guild_id, &entries))
            .await
    }

    /// Reads user input as a boolean or a number when it looks like one,
    /// and as a string otherwise.
    pub fn parse_value(raw: &str) -> ConfigValue {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => return ConfigValue::Bool(true),
            "false" => return ConfigValue::Bool(false),
            _ => {}
        }
        match trimmed.parse::<f64>() {
            Ok(number) if number.is_finite() => ConfigValue::Number(number),
            _ => ConfigValue::String(raw.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn service() -> ConfigService {
        let db = Database::new(&Config::for_tests()).unwrap();
        db.execute_init().unwrap();
        ConfigService::new(db)
    }

    #[tokio::test]
    async fn test_set_then_get_keeps_types() {
        let service = service();
        service
            .set(
                1,
                vec![
                    ("flag".to_string(), true.into()),
                    ("label".to_string(), "x".into()),
                    ("count".to_string(), 3i64.into()),
                ],
            )
            .await
            .unwrap();

        let config = service.get(1, &["flag", "label", "count", "unset"]).await.unwrap();
        assert_eq!(config.len(), 3);
        assert_eq!(config["flag"], ConfigValue::Bool(true));
        assert_eq!(config["label"], ConfigValue::String("x".to_string()));
        assert_eq!(config["count"], ConfigValue::Number(3.0));

        assert_eq!(service.get_one(1, "flag").await.unwrap(), Some(ConfigValue::Bool(true)));
        assert_eq!(service.get_one(2, "flag").await.unwrap(), None);
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(ConfigService::parse_value("True"), ConfigValue::Bool(true));
        assert_eq!(ConfigService::parse_value(" false "), ConfigValue::Bool(false));
        assert_eq!(ConfigService::parse_value("3"), ConfigValue::Number(3.0));
        assert_eq!(ConfigService::parse_value("-0.5"), ConfigValue::Number(-0.5));
        assert_eq!(ConfigService::parse_value("NaN"), ConfigValue::String("NaN".to_string()));
        assert_eq!(ConfigService::parse_value("hello"), ConfigValue::String("hello".to_string()));
    }
}
