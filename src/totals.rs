//! Time-windowed event counts.
//!
//! Three sub-queries back the totals endpoint: a last-24-hours count, a
//! rolling N-day count, and a per-calendar-day breakdown. They run
//! concurrently and share one deadline; a sub-query that fails or runs out
//! of time is logged and reported absent, the others still answer.

use crate::db::event;
use crate::models::{GroupCounts, TotalsResult};
use crate::rowkey::group_key;
use chrono::{DateTime, Local, LocalResult, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use sqlx::SqlitePool;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tokio::time::{error::Elapsed, timeout_at, Instant};
use tracing::error;

pub const DEFAULT_QUERY_DAYS: u32 = 30;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

fn to_local_timestamp(naive: NaiveDateTime) -> i64 {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.timestamp(),
        LocalResult::Ambiguous(earliest, _) => earliest.timestamp(),
        // wall-clock time skipped by a DST transition, read it as UTC
        LocalResult::None => Utc.from_utc_datetime(&naive).timestamp(),
    }
}

/// Local-time bounds of the calendar day `days_ago` days back, as inclusive
/// [00:00:00, 23:59:59] epoch seconds, plus the day's `YYYY-MM-DD` label.
fn day_bounds(now: DateTime<Local>, days_ago: i64) -> (i64, i64, String) {
    let date = (now - TimeDelta::days(days_ago)).date_naive();
    let start = to_local_timestamp(date.and_time(NaiveTime::MIN));
    let next_midnight = to_local_timestamp((date + TimeDelta::days(1)).and_time(NaiveTime::MIN));
    (start, next_midnight - 1, date.format("%Y-%m-%d").to_string())
}

/// Count rows matching `prefix` inside [start, end], bucketed by the first
/// `key_segments` segments of the row key. The `"*"` bucket always carries
/// the total, alongside the per-group buckets when grouping is active.
pub async fn count_in_range(
    pool: &SqlitePool,
    prefix: &str,
    start: i64,
    end: i64,
    key_segments: usize,
) -> Result<GroupCounts, sqlx::Error> {
    let keys = event::keys_in_range(pool, prefix, start, end).await?;

    let mut counts = GroupCounts::new();
    counts.insert("*".to_string(), keys.len() as i64);
    if key_segments != 0 {
        for key in &keys {
            *counts.entry(group_key(key_segments, key)).or_insert(0) += 1;
        }
    }
    Ok(counts)
}

/// Per-day counts for day offsets 0..=num_days (today back to N days ago),
/// keyed by `YYYY-MM-DD`. Every day's map carries `"*"` even with zero
/// matches, and after the scan every group key observed in any day is
/// present in every day, missing entries filled with 0.
pub async fn daily_counts(
    pool: &SqlitePool,
    prefix: &str,
    num_days: u32,
    key_segments: usize,
    now: DateTime<Local>,
) -> Result<BTreeMap<String, GroupCounts>, sqlx::Error> {
    let mut results: BTreeMap<String, GroupCounts> = BTreeMap::new();
    let mut seen_keys: BTreeSet<String> = BTreeSet::new();

    for days_ago in 0..=i64::from(num_days) {
        let (start, end, date) = day_bounds(now, days_ago);
        let keys = event::keys_in_range(pool, prefix, start, end).await?;

        let day = results.entry(date).or_default();
        day.entry("*".to_string()).or_insert(0);
        for key in &keys {
            let bucket = group_key(key_segments, key);
            if key_segments != 0 {
                // the "all" bucket is tracked alongside the groups
                *day.entry("*".to_string()).or_insert(0) += 1;
            }
            *day.entry(bucket.clone()).or_insert(0) += 1;
            seen_keys.insert(bucket);
        }
    }

    // uniform key set across the whole date range
    for day in results.values_mut() {
        for key in &seen_keys {
            day.entry(key.clone()).or_insert(0);
        }
    }

    Ok(results)
}

/// Run the three interval sub-queries concurrently under one shared
/// deadline and join them all before producing a result.
pub async fn compute_totals(
    pool: &SqlitePool,
    prefix: &str,
    key_segments: usize,
    num_days: u32,
    timeout: Duration,
) -> TotalsResult {
    let now = Local::now();
    let deadline = Instant::now() + timeout;
    let (_, end_of_today, _) = day_bounds(now, 0);

    let last_day = async {
        let start = now.timestamp() - SECONDS_PER_DAY;
        count_in_range(pool, prefix, start, end_of_today, key_segments).await
    };
    let period = async {
        let (start, _, _) = day_bounds(now, i64::from(num_days));
        count_in_range(pool, prefix, start, end_of_today, key_segments).await
    };
    let daily = daily_counts(pool, prefix, num_days, key_segments, now);

    let (last_day, period, daily) = futures::join!(
        timeout_at(deadline, last_day),
        timeout_at(deadline, period),
        timeout_at(deadline, daily),
    );

    TotalsResult {
        last_day_count: or_absent("last 24h count", last_day),
        total_count: or_absent("period count", period),
        daily_totals: or_absent("daily totals", daily),
    }
}

fn or_absent<T>(what: &str, outcome: Result<Result<T, sqlx::Error>, Elapsed>) -> Option<T> {
    match outcome {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            error!("{} query failed: {}", what, err);
            None
        }
        Err(_) => {
            error!("{} query exceeded the request deadline", what);
            None
        }
    }
}
