/// Schema applied by [`super::Database::execute_init`].
pub const SCHEMA: &str = "
    -- Typed per-guild key/value settings
    CREATE TABLE IF NOT EXISTS guild_config (
        guild_id TEXT NOT NULL,
        key TEXT NOT NULL,
        type TEXT,
        boolean_value BOOLEAN,
        string_value TEXT,
        number_value REAL,
        PRIMARY KEY (guild_id, key)
    );

    -- Where guild logs are routed; logs NULL means every type is enabled
    CREATE TABLE IF NOT EXISTS log_channel_config (
        guild_id TEXT PRIMARY KEY,
        channel_id TEXT NOT NULL,
        logs TEXT,
        log_mentions TEXT
    );

    -- Components that must stay actionable across restarts
    CREATE TABLE IF NOT EXISTS resume_records (
        id TEXT PRIMARY KEY,
        event TEXT NOT NULL,
        context TEXT NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
";
