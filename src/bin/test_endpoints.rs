use chrono::Local;
use event_data_service::{api, config::Config, db, models::Event, rowkey, state::AppState};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::sleep;
use tracing::{error, info, Level};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup tracing
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Starting endpoint smoke tests...");

    // 1. Setup
    let mut config = Config::from_env();
    config.database_url = "sqlite:smoke_test.db".to_string();
    let db_pool = db::connection::establish_connection(&config.database_url).await?;

    info!("Cleaning store before tests...");
    sqlx::query("DELETE FROM events").execute(&db_pool).await?;

    // Seed a few events
    let now = Local::now().timestamp();
    let seeds = [
        ("ethereum", "0xabc", "7", now),
        ("solana", "solAddr", "1", now - 3600),
        ("solana", "solAddr", "2", now - 3 * 24 * 3600),
    ];
    for (chain, address, sequence, created_at) in seeds {
        let sequence = rowkey::pad_sequence(sequence);
        let event = Event {
            row_key: rowkey::compose_row_key(chain, address, &sequence),
            emitter_chain: rowkey::normalize_chain(chain),
            emitter_address: address.to_string(),
            sequence,
            initiating_tx_id: None,
            payload: None,
            created_at,
        };
        db::event::insert_event(&db_pool, &event).await?;
    }
    info!("✅ Seeded test events");

    // 2. Start API server in a background task
    let app_state = Arc::new(AppState {
        config,
        db_pool: db_pool.clone(),
    });

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let app = api::create_router(app_state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    info!("Starting test server on {}", addr);

    let server_handle = tokio::spawn(async move {
        tokio::select! {
            result = axum::serve(listener, app) => {
                if let Err(e) = result {
                    error!("Server error: {}", e);
                }
            }
            _ = shutdown_rx => {
                info!("Server shutdown received");
            }
        }
    });

    sleep(Duration::from_millis(200)).await;

    // 3. Exercise the endpoints
    let client = reqwest::Client::new();
    let base_url = format!("http://{}", addr);

    let response = client
        .get(format!("{}/readrow?readyCheck=1", base_url))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    info!("✅ readyCheck answers ready");

    let response = client
        .get(format!(
            "{}/readrow?emitterChain=Ethereum&emitterAddress=0xabc&sequence=7",
            base_url
        ))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let summary: serde_json::Value = response.json().await?;
    assert_eq!(summary["EmitterChain"], "2");
    info!("✅ Row lookup resolves chain names and padded sequences");

    let response = client
        .get(format!(
            "{}/readrow?emitterChain=2&emitterAddress=0xabc&sequence=999",
            base_url
        ))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    info!("✅ Missing row reported as 404");

    let response = client
        .get(format!("{}/readrow?emitterChain=2", base_url))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    info!("✅ Missing params rejected");

    let response = client
        .get(format!("{}/totals?numDays=7&groupBy=chain", base_url))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let totals: serde_json::Value = response.json().await?;
    assert_eq!(totals["TotalCount"]["*"], 3);
    assert_eq!(totals["DailyTotals"].as_object().map(|m| m.len()), Some(8));
    info!("✅ Totals grouped by chain: {}", totals["TotalCount"]);

    let response = client
        .get(format!("{}/totals?numDays=abc", base_url))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    info!("✅ Malformed numDays rejected");

    let response = client.put(format!("{}/totals", base_url)).send().await?;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    info!("✅ Unknown method rejected");

    // Shutdown the server
    let _ = shutdown_tx.send(());
    let _ = server_handle.await;

    info!("All endpoint smoke tests completed successfully!");
    Ok(())
}
