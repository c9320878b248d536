use crate::db::{CREATE_CREATED_AT_INDEX, CREATE_EVENTS_TABLE};
use sqlx::{migrate::MigrateDatabase, Pool, Sqlite, SqlitePool};

pub async fn establish_connection(database_url: &str) -> Result<Pool<Sqlite>, sqlx::Error> {
    // Create database if it doesn't exist
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        Sqlite::create_database(database_url).await?;
    }

    let pool = SqlitePool::connect(database_url).await?;

    // Enable WAL mode for better concurrency
    sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;

    init_schema(&pool).await?;

    Ok(pool)
}

pub async fn init_schema(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_EVENTS_TABLE).execute(pool).await?;
    sqlx::query(CREATE_CREATED_AT_INDEX).execute(pool).await?;
    Ok(())
}
