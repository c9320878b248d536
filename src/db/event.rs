use crate::models::Event;
use sqlx::{Pool, Row, Sqlite};

/// Point lookup by composed row key.
pub async fn read_event(pool: &Pool<Sqlite>, row_key: &str) -> Result<Option<Event>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT row_key, emitter_chain, emitter_address, sequence,
                  initiating_tx_id, payload, created_at
           FROM events WHERE row_key = ?"#,
    )
    .bind(row_key)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| Event {
        row_key: row.get("row_key"),
        emitter_chain: row.get("emitter_chain"),
        emitter_address: row.get("emitter_address"),
        sequence: row.get("sequence"),
        initiating_tx_id: row.get("initiating_tx_id"),
        payload: row.get("payload"),
        created_at: row.get("created_at"),
    }))
}

/// Row keys with the given prefix whose insertion timestamp falls within
/// [start, end], both bounds in epoch seconds, both inclusive. Only keys
/// are read; counting never looks at cell values.
pub async fn keys_in_range(
    pool: &Pool<Sqlite>,
    prefix: &str,
    start: i64,
    end: i64,
) -> Result<Vec<String>, sqlx::Error> {
    // substr comparison instead of LIKE, so prefixes need no escaping;
    // sqlite's substr counts characters, not bytes
    let rows = sqlx::query(
        r#"SELECT row_key FROM events
           WHERE substr(row_key, 1, ?) = ?
           AND created_at >= ? AND created_at <= ?"#,
    )
    .bind(prefix.chars().count() as i64)
    .bind(prefix)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(|row| row.get("row_key")).collect())
}

pub async fn insert_event(pool: &Pool<Sqlite>, event: &Event) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO events
           (row_key, emitter_chain, emitter_address, sequence, initiating_tx_id, payload, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT(row_key) DO NOTHING"#,
    )
    .bind(&event.row_key)
    .bind(&event.emitter_chain)
    .bind(&event.emitter_address)
    .bind(&event.sequence)
    .bind(&event.initiating_tx_id)
    .bind(&event.payload)
    .bind(event.created_at)
    .execute(pool)
    .await?;

    Ok(())
}
