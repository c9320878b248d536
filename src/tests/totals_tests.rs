//! tests for the interval-counting service against an in-memory store

#[cfg(test)]
mod tests {
    use crate::{
        db::{connection, event},
        models::Event,
        rowkey,
        totals::{self, compute_totals, count_in_range, daily_counts},
    };
    use chrono::{Local, TimeDelta};
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;
    use std::collections::BTreeSet;
    use std::time::Duration;

    /// In-memory store; a single connection so every query sees one database.
    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory database");
        connection::init_schema(&pool).await.expect("Failed to initialize schema");
        pool
    }

    fn make_event(chain: &str, address: &str, sequence: &str, created_at: i64) -> Event {
        let sequence = rowkey::pad_sequence(sequence);
        Event {
            row_key: rowkey::compose_row_key(chain, address, &sequence),
            emitter_chain: rowkey::normalize_chain(chain),
            emitter_address: address.to_string(),
            sequence,
            initiating_tx_id: None,
            payload: None,
            created_at,
        }
    }

    async fn seed(pool: &SqlitePool, events: &[Event]) {
        for e in events {
            event::insert_event(pool, e).await.expect("Failed to insert event");
        }
    }

    #[tokio::test]
    async fn test_count_in_range_without_grouping() {
        let pool = test_pool().await;
        let now = Local::now().timestamp();

        seed(
            &pool,
            &[
                make_event("1", "solAddr", "1", now),
                make_event("1", "solAddr", "2", now),
                make_event("2", "0xabc", "1", now),
            ],
        )
        .await;

        let counts = count_in_range(&pool, "", now - 100, now + 100, 0)
            .await
            .unwrap();

        // zero segments means only the grand-total bucket
        assert_eq!(counts.len(), 1);
        assert_eq!(counts["*"], 3);
    }

    #[tokio::test]
    async fn test_count_in_range_grouped_by_chain() {
        let pool = test_pool().await;
        let now = Local::now().timestamp();

        seed(
            &pool,
            &[
                make_event("1", "solAddr", "1", now),
                make_event("1", "solAddr", "2", now),
                make_event("2", "0xabc", "1", now),
            ],
        )
        .await;

        let counts = count_in_range(&pool, "", now - 100, now + 100, 1)
            .await
            .unwrap();

        assert_eq!(counts["*"], 3);
        assert_eq!(counts["1"], 2);
        assert_eq!(counts["2"], 1);
    }

    #[tokio::test]
    async fn test_count_in_range_grouped_by_address() {
        let pool = test_pool().await;
        let now = Local::now().timestamp();

        seed(
            &pool,
            &[
                make_event("2", "0xabc", "1", now),
                make_event("2", "0xabc", "2", now),
                make_event("2", "0xdef", "1", now),
            ],
        )
        .await;

        let counts = count_in_range(&pool, "", now - 100, now + 100, 2)
            .await
            .unwrap();

        assert_eq!(counts["*"], 3);
        assert_eq!(counts["2:0xabc"], 2);
        assert_eq!(counts["2:0xdef"], 1);
    }

    #[tokio::test]
    async fn test_prefix_filter_restricts_counts() {
        let pool = test_pool().await;
        let now = Local::now().timestamp();

        seed(
            &pool,
            &[
                make_event("1", "solAddr", "1", now),
                make_event("2", "0xabc", "1", now),
                make_event("2", "0xdef", "1", now),
            ],
        )
        .await;

        let chain_prefix = rowkey::scan_prefix("2", "");
        let counts = count_in_range(&pool, &chain_prefix, now - 100, now + 100, 0)
            .await
            .unwrap();
        assert_eq!(counts["*"], 2);

        let address_prefix = rowkey::scan_prefix("2", "0xabc");
        let counts = count_in_range(&pool, &address_prefix, now - 100, now + 100, 0)
            .await
            .unwrap();
        assert_eq!(counts["*"], 1);
    }

    #[tokio::test]
    async fn test_time_window_excludes_out_of_range_rows() {
        let pool = test_pool().await;
        let now = Local::now().timestamp();

        seed(
            &pool,
            &[
                make_event("1", "solAddr", "1", now),
                make_event("1", "solAddr", "2", now - 10 * 24 * 3600),
            ],
        )
        .await;

        let counts = count_in_range(&pool, "", now - 24 * 3600, now + 100, 0)
            .await
            .unwrap();
        assert_eq!(counts["*"], 1);
    }

    #[tokio::test]
    async fn test_daily_counts_key_uniformity() {
        let pool = test_pool().await;
        let now = Local::now();
        let two_days_ago = (now - TimeDelta::days(2)).timestamp();

        // chain 2 only appears today, chain 1 only two days ago
        seed(
            &pool,
            &[
                make_event("2", "0xabc", "1", now.timestamp()),
                make_event("1", "solAddr", "1", two_days_ago),
            ],
        )
        .await;

        let days = daily_counts(&pool, "", 3, 1, now).await.unwrap();
        assert_eq!(days.len(), 4, "expected one entry per day offset 0..=3");

        // every day's map has the same key set, zeros filled in
        let key_sets: Vec<BTreeSet<&String>> =
            days.values().map(|day| day.keys().collect()).collect();
        for pair in key_sets.windows(2) {
            assert_eq!(pair[0], pair[1]);
        }
        for day in days.values() {
            assert!(day.contains_key("*"));
            assert!(day.contains_key("1"));
            assert!(day.contains_key("2"));
        }

        let today = now.format("%Y-%m-%d").to_string();
        assert_eq!(days[&today]["2"], 1);
        assert_eq!(days[&today]["1"], 0);
        assert_eq!(days[&today]["*"], 1);
    }

    #[tokio::test]
    async fn test_daily_counts_always_carry_star() {
        let pool = test_pool().await;

        // empty store: every day still has the "*" bucket at zero
        let days = daily_counts(&pool, "", 2, 0, Local::now()).await.unwrap();
        assert_eq!(days.len(), 3);
        for day in days.values() {
            assert_eq!(day.len(), 1);
            assert_eq!(day["*"], 0);
        }
    }

    #[tokio::test]
    async fn test_compute_totals_joins_all_three() {
        let pool = test_pool().await;
        let now = Local::now();

        seed(
            &pool,
            &[
                make_event("1", "solAddr", "1", now.timestamp()),
                make_event("2", "0xabc", "1", (now - TimeDelta::days(2)).timestamp()),
            ],
        )
        .await;

        let result = compute_totals(&pool, "", 1, 7, Duration::from_secs(10)).await;

        let last_day = result.last_day_count.expect("last day count absent");
        let total = result.total_count.expect("period count absent");
        let daily = result.daily_totals.expect("daily totals absent");

        assert_eq!(last_day["*"], 1);
        assert_eq!(total["*"], 2);
        assert_eq!(total["1"], 1);
        assert_eq!(total["2"], 1);
        assert_eq!(daily.len(), 8);
    }

    #[tokio::test]
    async fn test_compute_totals_zero_days_is_today_only() {
        let pool = test_pool().await;
        let now = Local::now();

        seed(&pool, &[make_event("1", "solAddr", "1", now.timestamp())]).await;

        let result = compute_totals(&pool, "", 0, 0, Duration::from_secs(10)).await;
        let daily = result.daily_totals.expect("daily totals absent");
        assert_eq!(daily.len(), 1);
        let today = now.format("%Y-%m-%d").to_string();
        assert_eq!(daily[&today]["*"], 1);
    }

    #[tokio::test]
    async fn test_default_query_days() {
        assert_eq!(totals::DEFAULT_QUERY_DAYS, 30);
    }

    #[tokio::test]
    async fn test_prefix_filter_handles_multibyte_addresses() {
        let pool = test_pool().await;
        let now = Local::now().timestamp();

        seed(
            &pool,
            &[
                make_event("2", "héllo", "1", now),
                make_event("2", "0xabc", "1", now),
            ],
        )
        .await;

        let prefix = rowkey::scan_prefix("2", "héllo");
        let counts = count_in_range(&pool, &prefix, now - 100, now + 100, 0)
            .await
            .unwrap();
        assert_eq!(counts["*"], 1);
    }

    #[tokio::test]
    async fn test_failed_sub_queries_reported_absent() {
        let pool = test_pool().await;
        // every scan fails against a closed pool
        pool.close().await;

        let result = compute_totals(&pool, "", 1, 2, Duration::from_secs(10)).await;

        assert!(result.last_day_count.is_none());
        assert!(result.total_count.is_none());
        assert!(result.daily_totals.is_none());
        // absent fields are omitted from the JSON, not zeroed
        assert_eq!(serde_json::to_string(&result).unwrap(), "{}");
    }
}
