pub mod connection;
pub mod event;

pub const CREATE_EVENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    row_key TEXT PRIMARY KEY,
    emitter_chain TEXT NOT NULL,
    emitter_address TEXT NOT NULL,
    sequence TEXT NOT NULL,
    initiating_tx_id TEXT,
    payload TEXT,
    created_at INTEGER NOT NULL
)
"#;

pub const CREATE_CREATED_AT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_events_created_at ON events(created_at)";
