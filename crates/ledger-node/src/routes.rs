//! HTTP surface over the shared chain handle.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use ledger_core::{constants::HASH_SIZE, Block, Hash, Record};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::constants::DEFAULT_PAGE_SIZE;
use crate::error::ApiError;
use crate::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Serialize)]
pub(crate) struct Health {
    status: &'static str,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct Head {
    pub height: u64,
    pub fingerprint: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct Validation {
    pub valid: bool,
    pub errors: Vec<String>,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct ChallengeOut {
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct SubmitIn {
    pub address: String,
    pub message: String,
    pub signature: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Deserialize)]
pub(crate) struct RangeQuery {
    #[serde(default)]
    from: u64,
    limit: Option<u32>,
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/chain/head", get(head))
        .route("/chain/validate", get(validate))
        .route("/chain/blocks", get(blocks_range))
        .route("/blocks/{position}", get(block_by_position))
        .route("/blocks/by-fingerprint/{fingerprint}", get(block_by_fingerprint))
        .route("/owners/{address}/records", get(records_by_owner))
        .route("/challenge/{address}", get(challenge))
        .route("/submit", post(submit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// GET /chain/head
pub(crate) async fn head(State(state): State<AppState>) -> Json<Head> {
    let tip = state.chain.tip();
    Json(Head {
        height: state.chain.height(),
        fingerprint: tip.and_then(|b| b.fingerprint_hex()),
    })
}

/// GET /chain/validate
pub(crate) async fn validate(State(state): State<AppState>) -> Json<Validation> {
    let errors = state.chain.validate();
    Json(Validation {
        valid: errors.is_empty(),
        errors,
    })
}

/// GET /chain/blocks?from=&limit=
async fn blocks_range(
    State(state): State<AppState>,
    Query(q): Query<RangeQuery>,
) -> Json<Vec<Block>> {
    Json(
        state
            .chain
            .blocks_range(q.from, q.limit.unwrap_or(DEFAULT_PAGE_SIZE)),
    )
}

/// GET /blocks/{position}
pub(crate) async fn block_by_position(
    State(state): State<AppState>,
    Path(position): Path<u64>,
) -> ApiResult<Block> {
    state
        .chain
        .get_by_position(position)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no block at position {position}")))
}

/// GET /blocks/by-fingerprint/{fingerprint}
pub(crate) async fn block_by_fingerprint(
    State(state): State<AppState>,
    Path(fingerprint): Path<String>,
) -> ApiResult<Block> {
    let mut fp: Hash = [0u8; HASH_SIZE];
    hex::decode_to_slice(&fingerprint, &mut fp)
        .map_err(|e| ApiError::BadRequest(format!("fingerprint: {e}")))?;
    state
        .chain
        .get_by_fingerprint(&fp)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no block with fingerprint {fingerprint}")))
}

/// GET /owners/{address}/records
pub(crate) async fn records_by_owner(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<Vec<Record>> {
    Ok(Json(state.chain.get_by_owner(&address)?))
}

/// GET /challenge/{address}
pub(crate) async fn challenge(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Json<ChallengeOut> {
    Json(ChallengeOut {
        message: state.workflow.issue_challenge(&address),
    })
}

/// POST /submit
///
/// The append flushes sled under the chain's write lock, so it runs on the
/// blocking pool rather than a runtime worker.
pub(crate) async fn submit(
    State(state): State<AppState>,
    Json(input): Json<SubmitIn>,
) -> ApiResult<Block> {
    let AppState { chain, workflow } = state;
    let block = tokio::task::spawn_blocking(move || {
        chain.submit(
            &workflow,
            &input.address,
            &input.message,
            &input.signature,
            input.data,
        )
    })
    .await
    .map_err(|e| ApiError::Internal(format!("submit task failed: {e}")))??;
    Ok(Json(block))
}
