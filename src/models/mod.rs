use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the event store. `created_at` is the insertion timestamp in
/// epoch seconds; it is what all interval scans filter on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub row_key: String,
    pub emitter_chain: String,
    pub emitter_address: String,
    pub sequence: String,
    pub initiating_tx_id: Option<String>,
    pub payload: Option<String>,
    pub created_at: i64,
}

/// Response shape for a single-row lookup. Field names follow the JSON
/// contract of the upstream explorer clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct EventSummary {
    #[serde(rename = "EmitterChain")]
    pub emitter_chain: String,
    #[serde(rename = "EmitterAddress")]
    pub emitter_address: String,
    #[serde(rename = "Sequence")]
    pub sequence: String,
    #[serde(rename = "InitiatingTxId")]
    pub initiating_tx_id: Option<String>,
    #[serde(rename = "Payload")]
    pub payload: Option<String>,
    #[serde(rename = "Timestamp")]
    pub timestamp: i64,
}

impl EventSummary {
    pub fn from_event(event: Event) -> Self {
        Self {
            emitter_chain: event.emitter_chain,
            emitter_address: event.emitter_address,
            sequence: event.sequence,
            initiating_tx_id: event.initiating_tx_id,
            payload: event.payload,
            timestamp: event.created_at,
        }
    }
}

/// Counts bucketed by group key. Keys are `"*"` (grand total) and, when
/// grouping is active, row-key prefixes.
pub type GroupCounts = BTreeMap<String, i64>;

/// Result of the three interval sub-queries. A sub-query that failed or
/// timed out is reported absent rather than zeroed.
#[derive(Debug, Serialize, Deserialize)]
pub struct TotalsResult {
    #[serde(rename = "LastDayCount", skip_serializing_if = "Option::is_none")]
    pub last_day_count: Option<GroupCounts>,
    #[serde(rename = "TotalCount", skip_serializing_if = "Option::is_none")]
    pub total_count: Option<GroupCounts>,
    #[serde(rename = "DailyTotals", skip_serializing_if = "Option::is_none")]
    pub daily_totals: Option<BTreeMap<String, GroupCounts>>,
}
