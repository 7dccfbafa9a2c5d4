use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use crate::config::Config;
use tracing::{info, debug};

pub mod schema;

/// A typed per-guild setting value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl ConfigValue {
    /// The tag stored in the `type` column.
    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Bool(_) => "boolean",
            ConfigValue::Number(_) => "number",
            ConfigValue::String(_) => "string",
        }
    }
}

impl std::fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigValue::Bool(value) => write!(f, "{}", value),
            ConfigValue::Number(value) => write!(f, "{}", value),
            ConfigValue::String(value) => f.write_str(value),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Number(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Number(value as f64)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogRouteRecord {
    pub guild_id: String,
    pub channel_id: String,
    /// `None` means every log type is enabled
    pub logs: Option<Vec<String>>,
    pub log_mentions: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResumeRecord {
    pub id: String,
    pub event: String,
    pub context: String,
}

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(config: &Config) -> rusqlite::Result<Self> {
        let conn = Connection::open(&config.database_url)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Database connection lock poisoned"))
    }

    pub fn execute_init(&self) -> anyhow::Result<()> {
        info!("Database: Initializing schema...");
        let conn = self.conn()?;
        conn.execute_batch(schema::SCHEMA)?;
        debug!("Database: Schema initialized successfully");
        Ok(())
    }

    /// Runs a synchronous database closure on the blocking thread pool.
    pub async fn run_blocking<F, T>(&self, f: F) -> anyhow::Result<T>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| anyhow::anyhow!("Database task failed: {}", e))?
    }

    // --- Guild Config ---

    pub fn get_config(&self, guild_id: &str, keys: &[String]) -> anyhow::Result<HashMap<String, ConfigValue>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        let conn = self.conn()?;
        let sql = format!(
            "SELECT key, type, boolean_value, string_value, number_value
             FROM guild_config WHERE guild_id = ? AND key IN ({})",
            vec!["?"; keys.len()].join(", ")
        );

        let mut params: Vec<&dyn rusqlite::ToSql> = Vec::with_capacity(keys.len() + 1);
        params.push(&guild_id);
        for key in keys {
            params.push(key);
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(&params[..], |row| {
            let key: String = row.get(0)?;
            let kind: Option<String> = row.get(1)?;
            let value = match kind.as_deref() {
                Some("boolean") => row.get::<_, Option<bool>>(2)?.map(ConfigValue::Bool),
                Some("string") => row.get::<_, Option<String>>(3)?.map(ConfigValue::String),
                Some("number") => row.get::<_, Option<f64>>(4)?.map(ConfigValue::Number),
                _ => None,
            };
            Ok((key, value))
        })?;

        let mut config = HashMap::new();
        for row in rows {
            if let (key, Some(value)) = row? {
                config.insert(key, value);
            }
        }
        debug!("Database: Loaded {} config values for guild {}", config.len(), guild_id);
        Ok(config)
    }

    pub fn set_config(&self, guild_id: &str, entries: &[(String, ConfigValue)]) -> anyhow::Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for (key, value) in entries {
            let (boolean_value, string_value, number_value) = match value {
                ConfigValue::Bool(b) => (Some(*b), None, None),
                ConfigValue::String(s) => (None, Some(s.as_str()), None),
                ConfigValue::Number(n) => (None, None, Some(*n)),
            };
            tx.execute(
                "INSERT INTO guild_config (guild_id, key, type, boolean_value, string_value, number_value)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(guild_id, key) DO UPDATE SET
                    type = ?3, boolean_value = ?4, string_value = ?5, number_value = ?6",
                (guild_id, key, value.type_name(), boolean_value, string_value, number_value),
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // --- Log Routes ---

    pub fn find_log_route(&self, guild_id: &str) -> anyhow::Result<Option<LogRouteRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT guild_id, channel_id, logs, log_mentions FROM log_channel_config WHERE guild_id = ?1",
        )?;
        let row = stmt
            .query_row([guild_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })
            .optional()?;

        let Some((guild_id, channel_id, logs, mentions)) = row else {
            return Ok(None);
        };

        let log_mentions = match mentions {
            Some(raw) => serde_json::from_str(&raw)?,
            None => HashMap::new(),
        };

        Ok(Some(LogRouteRecord {
            guild_id,
            channel_id,
            logs: logs.map(|raw| split_log_list(&raw)),
            log_mentions,
        }))
    }

    pub fn set_log_channel(&self, guild_id: &str, channel_id: &str) -> anyhow::Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO log_channel_config (guild_id, channel_id) VALUES (?1, ?2)
             ON CONFLICT(guild_id) DO UPDATE SET channel_id = ?2",
            (guild_id, channel_id),
        )?;
        Ok(())
    }

    /// Returns the number of routes touched; zero when the guild has no log channel.
    pub fn set_enabled_logs(&self, guild_id: &str, logs: Option<&[String]>) -> anyhow::Result<usize> {
        let conn = self.conn()?;
        let joined = logs.map(|logs| logs.join(","));
        let count = conn.execute(
            "UPDATE log_channel_config SET logs = ?1 WHERE guild_id = ?2",
            (joined, guild_id),
        )?;
        Ok(count)
    }

    pub fn set_log_mention(&self, guild_id: &str, log_type: &str, role_id: Option<&str>) -> anyhow::Result<usize> {
        let Some(route) = self.find_log_route(guild_id)? else {
            return Ok(0);
        };
        let mut mentions = route.log_mentions;
        match role_id {
            Some(role_id) => {
                mentions.insert(log_type.to_string(), role_id.to_string());
            }
            None => {
                mentions.remove(log_type);
            }
        }
        let encoded = serde_json::to_string(&mentions)?;
        let conn = self.conn()?;
        let count = conn.execute(
            "UPDATE log_channel_config SET log_mentions = ?1 WHERE guild_id = ?2",
            (encoded, guild_id),
        )?;
        Ok(count)
    }

    // --- Resume Records ---

    pub fn create_resume_record(&self, id: &str, event: &str, context: &str) -> anyhow::Result<()> {
        debug!("Database: Saving resume record {} for event {}", id, event);
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO resume_records (id, event, context) VALUES (?1, ?2, ?3)",
            (id, event, context),
        )?;
        Ok(())
    }

    pub fn find_resume_record(&self, id: &str) -> anyhow::Result<Option<ResumeRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, event, context FROM resume_records WHERE id = ?1")?;
        let record = stmt
            .query_row([id], |row| {
                Ok(ResumeRecord {
                    id: row.get(0)?,
                    event: row.get(1)?,
                    context: row.get(2)?,
                })
            })
            .optional()?;
        Ok(record)
    }
}

fn split_log_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
