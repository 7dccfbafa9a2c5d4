pub mod commands;
pub mod components;
pub mod config;
pub mod db;
pub mod embeds;
pub mod flow;
pub mod interaction;
pub mod listeners;
pub mod platform;
pub mod services;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;

/// Custom data passed to all commands
pub struct Data {
    pub config: config::Config,
    pub db: db::Database,
    /// Handlers for durable components, by event name
    pub listeners: Arc<listeners::ListenerRegistry>,
}

impl Data {
    pub fn new(config: config::Config, db: db::Database) -> Self {
        Self {
            config,
            db,
            listeners: Arc::new(commands::listeners()),
        }
    }
}

#[cfg(test)]
impl Data {
    pub fn for_tests() -> Self {
        let config = config::Config::for_tests();
        let db = db::Database::new(&config).expect("in-memory database");
        db.execute_init().expect("schema");
        Self::new(config, db)
    }
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
