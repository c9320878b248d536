use crate::{
    api::error::ApiError,
    db::event,
    models::EventSummary,
    rowkey::{compose_row_key, scan_prefix},
    state::AppState,
    totals,
};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

// /readrow parameters, shared by querystring and JSON body. Missing fields
// deserialize to empty strings and are rejected before any store call.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RowParams {
    #[serde(rename = "emitterChain")]
    pub emitter_chain: String,
    #[serde(rename = "emitterAddress")]
    pub emitter_address: String,
    pub sequence: String,
    #[serde(rename = "readyCheck")]
    pub ready_check: String,
}

// /totals parameters; everything is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TotalsParams {
    #[serde(rename = "numDays")]
    pub num_days: String,
    #[serde(rename = "groupBy")]
    pub group_by: String,
    #[serde(rename = "forChain")]
    pub for_chain: String,
    #[serde(rename = "forAddress")]
    pub for_address: String,
    #[serde(rename = "readyCheck")]
    pub ready_check: String,
}

// Create router with all routes. Unregistered methods get 405 from axum;
// CORS preflights are answered by the layer.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route(
            "/readrow",
            get(read_row_get).post(read_row_post).options(preflight),
        )
        .route(
            "/totals",
            get(totals_get).post(totals_post).options(preflight),
        )
        .layer(cors)
        .with_state(app_state)
}

// Bare OPTIONS requests (no Access-Control-Request-Method, so the cors
// layer lets them through) still get the preflight headers; the layer
// stamps the allow-origin.
async fn preflight() -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
            (header::ACCESS_CONTROL_MAX_AGE, "3600"),
        ],
    )
        .into_response()
}

fn json_response<T: Serialize>(value: &T) -> Result<Response, ApiError> {
    let body = serde_json::to_string(value)
        .map_err(|err| ApiError::Internal(format!("serializing response: {}", err)))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response())
}

// plain liveness response, used when running in devnet
fn ready() -> Response {
    (StatusCode::OK, "ready").into_response()
}

// GET /readrow handler
async fn read_row_get(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RowParams>,
) -> Result<Response, ApiError> {
    if !params.ready_check.is_empty() {
        return Ok(ready());
    }
    fetch_row(&state, &params).await
}

// POST /readrow handler; all three body fields are required
async fn read_row_post(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("request body required".to_string()));
    }
    let params: RowParams = serde_json::from_slice(&body)
        .map_err(|err| ApiError::BadRequest(format!("invalid request body: {}", err)))?;
    fetch_row(&state, &params).await
}

async fn fetch_row(state: &AppState, params: &RowParams) -> Result<Response, ApiError> {
    if params.emitter_chain.is_empty()
        || params.emitter_address.is_empty()
        || params.sequence.is_empty()
    {
        return Err(ApiError::BadRequest(
            "params ['emitterChain', 'emitterAddress', 'sequence'] cannot be empty".to_string(),
        ));
    }

    let row_key = compose_row_key(
        &params.emitter_chain,
        &params.emitter_address,
        &params.sequence,
    );
    info!("reading row {}", row_key);

    match event::read_event(&state.db_pool, &row_key).await? {
        Some(event) => json_response(&EventSummary::from_event(event)),
        None => Err(ApiError::NotFound(format!("no row for key {}", row_key))),
    }
}

// GET /totals handler
async fn totals_get(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TotalsParams>,
) -> Result<Response, ApiError> {
    if !params.ready_check.is_empty() {
        return Ok(ready());
    }
    run_totals(&state, params).await
}

// POST /totals handler; an empty body means all defaults
async fn totals_post(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let params: TotalsParams = if body.is_empty() {
        TotalsParams::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|err| ApiError::BadRequest(format!("invalid request body: {}", err)))?
    };
    run_totals(&state, params).await
}

async fn run_totals(state: &AppState, params: TotalsParams) -> Result<Response, ApiError> {
    let num_days = if params.num_days.is_empty() {
        totals::DEFAULT_QUERY_DAYS
    } else {
        params.num_days.parse::<u32>().map_err(|_| {
            ApiError::BadRequest("numDays must be a non-negative integer".to_string())
        })?
    };

    // groupBy decides how many row-key segments form the bucket
    let key_segments = match params.group_by.as_str() {
        "chain" => 1,
        "address" => 2,
        _ => 0,
    };
    let prefix = scan_prefix(&params.for_chain, &params.for_address);

    info!(
        "computing totals: prefix={:?} key_segments={} num_days={}",
        prefix, key_segments, num_days
    );

    let result = totals::compute_totals(
        &state.db_pool,
        &prefix,
        key_segments,
        num_days,
        state.config.query_timeout,
    )
    .await;

    json_response(&result)
}
