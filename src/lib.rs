pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod rowkey;
pub mod state;
pub mod totals;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use api::error::ApiError;
pub use api::route::create_router;
pub use config::Config;
pub use db::connection;
pub use db::event;
pub use models::{Event, EventSummary, TotalsResult};
pub use rowkey::{compose_row_key, group_key, scan_prefix};
pub use state::AppState;
