use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ledger_core::{
    constants::BLOCK_COMMAND, Block, Blockchain, ChainIterator, ChainStore, LedgerError,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::constants::{BLOCKS_PER_BATCH, MAX_BLOCKS_PER_REQUEST};
use crate::network::Network;

/// Shared node state. Appends go through the mutex so only one mining run
/// touches the tip at a time; readers use the published tip and never wait
/// on that lock.
pub struct AppState<S: ChainStore> {
    pub chain: Arc<Mutex<Blockchain<S>>>,
    pub network: Network,
    store: Arc<S>,
    difficulty: u32,
    tip: Arc<watch::Sender<String>>,
}

impl<S: ChainStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            chain: self.chain.clone(),
            network: self.network.clone(),
            store: self.store.clone(),
            difficulty: self.difficulty,
            tip: self.tip.clone(),
        }
    }
}

impl<S: ChainStore> AppState<S> {
    pub fn new(chain: Blockchain<S>, network: Network) -> Self {
        let store = chain.store().clone();
        let difficulty = chain.difficulty();
        let (tip, _) = watch::channel(chain.tip().to_string());
        Self {
            chain: Arc::new(Mutex::new(chain)),
            network,
            store,
            difficulty,
            tip: Arc::new(tip),
        }
    }

    /// Last published tip, difficulty and store handle.
    fn snapshot(&self) -> (String, u32, Arc<S>) {
        (
            self.tip.borrow().clone(),
            self.difficulty,
            self.store.clone(),
        )
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Head {
    pub index: u64,
    pub hash: String,
    pub difficulty: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct BlocksQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct NewBlock {
    pub payload: String,
    pub producer: String,
}

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Internal(String),
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::BlockNotFound(_) => ApiError::NotFound(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub fn router<S: ChainStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(Health { status: "ok" }) }))
        .route("/chain/head", get(head::<S>))
        .route("/chain/blocks", get(blocks::<S>))
        .route("/blocks", post(create_block::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn head<S: ChainStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<Head>, ApiError> {
    let (tip, difficulty, store) = state.snapshot();
    let block = store.load_block(&tip)?;
    Ok(Json(Head {
        index: block.index,
        hash: tip,
        difficulty,
    }))
}

/// Newest-first page of blocks starting at the tip.
pub async fn blocks<S: ChainStore + 'static>(
    State(state): State<AppState<S>>,
    Query(query): Query<BlocksQuery>,
) -> Result<Json<Vec<Block>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(BLOCKS_PER_BATCH)
        .min(MAX_BLOCKS_PER_REQUEST) as usize;
    let (tip, _, store) = state.snapshot();
    let blocks = ChainIterator::new(store, tip)
        .take(limit)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(blocks))
}

/// Mines a block on the blocking pool, then hands it to the peers.
pub async fn create_block<S: ChainStore + 'static>(
    State(state): State<AppState<S>>,
    Json(req): Json<NewBlock>,
) -> Result<Json<Block>, ApiError> {
    let chain = state.chain.clone();
    let tip = state.tip.clone();
    let block = tokio::task::spawn_blocking(move || -> Result<Block, ApiError> {
        let mut chain = chain
            .lock()
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        let block = chain.add_block(req.payload, req.producer)?;
        tip.send_replace(block.hash.clone());
        Ok(block)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    let bytes = block.serialize()?;
    if let Err(e) = state.network.broadcast(BLOCK_COMMAND, &bytes).await {
        warn!(hash = %block.hash, error = %e, "failed to broadcast block");
    }
    Ok(Json(block))
}
